//! End-to-end frames: sources in, geometry out.

use approx::assert_relative_eq;
use voltaic_core::{MeshBounds, SimulationParams, SimulationSession, SourceExpressions};

fn point_charge() -> SimulationSession {
    let sources = SourceExpressions {
        charge_position: "r < 0.5".into(),
        charge_strength: "1".into(),
        ..SourceExpressions::default()
    };
    // 7 points per axis on [-3, 3], spacing 1.
    SimulationSession::new(MeshBounds::cube(3.0), 0.85, sources, SimulationParams::default()).unwrap()
}

#[test]
fn test_point_charge_potential_is_symmetric_and_peaked() {
    let mut session = point_charge();
    let fields = session.compute_fields().unwrap();
    let v = &fields.potential;

    let peak = v
        .indexed_iter()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(idx, _)| idx)
        .unwrap();
    assert_eq!(peak, (3, 3, 3));

    for ((i, j, k), &value) in v.indexed_iter() {
        assert_relative_eq!(value, v[[j, i, k]], epsilon = 1e-12);
        assert_relative_eq!(value, v[[i, k, j]], epsilon = 1e-12);
        assert_relative_eq!(value, v[[6 - i, j, k]], epsilon = 1e-12);
        assert_relative_eq!(value, v[[i, 6 - j, 6 - k]], epsilon = 1e-12);
    }
}

#[test]
fn test_point_charge_field_points_outward() {
    let mut session = point_charge();
    let fields = session.compute_fields().unwrap();
    let grid = session.grid();

    let mut outward = 0;
    for (idx, _) in fields.potential.indexed_iter() {
        let r = grid.position(idx);
        let distance = (r[0] * r[0] + r[1] * r[1] + r[2] * r[2]).sqrt();
        if distance <= 0.6 {
            continue;
        }
        let e = fields.electric.at(idx);
        let radial = e[0] * r[0] + e[1] * r[1] + e[2] * r[2];
        let strength = (e[0] * e[0] + e[1] * e[1] + e[2] * e[2]).sqrt();
        if strength > 0.0 {
            assert!(radial > 0.0, "field at {r:?} points inward: {e:?}");
            outward += 1;
        }
    }
    // Only the eight corners are out of reach after eight passes.
    assert_eq!(outward, 343 - 1 - 8);
}

#[test]
fn test_frame_arrows_point_away_from_charge() {
    let mut session = point_charge();
    let geometry = session.compute_frame().unwrap();
    assert!(!geometry.is_empty());
    assert!(geometry.segment_count() < session.grid().len());
    for arrow in &geometry.arrows {
        let d = [arrow[3] - arrow[0], arrow[4] - arrow[1], arrow[5] - arrow[2]];
        let radial = d[0] * arrow[0] + d[1] * arrow[1] + d[2] * arrow[2];
        assert!(radial >= -1e-12);
    }
    for &m in &geometry.magnitudes {
        assert!(m >= session.params().significance_threshold);
    }
}

#[test]
fn test_wire_magnetic_field_circulates() {
    let sources = SourceExpressions {
        current_position: "s < 0.5 and z > -2 and z < 2".into(),
        current_strength: "0, 0, 1".into(),
        ..SourceExpressions::default()
    };
    let mut session =
        SimulationSession::new(MeshBounds::cube(3.0), 0.85, sources, SimulationParams::default())
            .unwrap();
    let fields = session.compute_fields().unwrap();
    let b = &fields.magnetic;

    // (x, y, z) = (1, 0, 0): B along +y.
    let east = b.at((3, 4, 3));
    assert!(east[1] > 0.0);
    assert_relative_eq!(east[0], 0.0, epsilon = 1e-12);
    // (0, 1, 0): B along -x.
    let north = b.at((4, 3, 3));
    assert!(north[0] < 0.0);
    assert_relative_eq!(north[1], 0.0, epsilon = 1e-12);
    // No field along the wire itself.
    assert!(b.w.iter().all(|w| w.abs() < 1e-12));
}

#[test]
fn test_normalized_frame_has_uniform_lengths() {
    let mut session = point_charge();
    session.set_params(SimulationParams {
        normalize: true,
        scale: 0.3,
        ..SimulationParams::default()
    });
    let geometry = session.compute_frame().unwrap();
    for arrow in &geometry.arrows {
        let d = [arrow[3] - arrow[0], arrow[4] - arrow[1], arrow[5] - arrow[2]];
        assert_relative_eq!((d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt(), 0.3, epsilon = 1e-9);
    }
}

#[test]
fn test_independent_sessions_on_threads() {
    let handles: Vec<_> = (0..2)
        .map(|_| {
            std::thread::spawn(|| {
                let mut session = point_charge();
                session.compute_frame().unwrap().segment_count()
            })
        })
        .collect();
    let counts: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(counts[0], counts[1]);
}
