//! Vector field encoding: combine, scale, colour by relative magnitude,
//! optionally normalise, cull insignificant vectors, and emit segments.
//!
//! Magnitudes are min-max normalised over the whole grid into `[0, 1]`; the
//! normalised value `m` drives both the hue (`m * hue_range` degrees, full
//! saturation and value) and the culling test `m < significance_threshold`.
//! Colour therefore shows relative strength within one frame, never absolute
//! field strength.

use ndarray::{Array3, Zip};

use crate::mesh::Grid;
use crate::types::{RenderGeometry, SimulationParams, VectorField};

const WHITE: [f64; 3] = [1.0, 1.0, 1.0];

/// Display controls for [`encode`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeOptions {
    pub scale: f64,
    pub normalize: bool,
    pub colorize: bool,
    pub significance_threshold: f64,
    pub hue_range: f64,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self::from(&SimulationParams::default())
    }
}

impl From<&SimulationParams> for EncodeOptions {
    fn from(params: &SimulationParams) -> Self {
        Self {
            scale: params.scale,
            normalize: params.normalize,
            colorize: params.colorize,
            significance_threshold: params.significance_threshold,
            hue_range: params.hue_range,
        }
    }
}

/// Sum `fields`, scale, and turn every significant vector into a segment
/// starting at its grid point.
///
/// Cells are visited in array order. Culled cells are left out entirely, so
/// the output may hold fewer segments than the grid has cells.
pub fn encode(grid: &Grid, fields: &[&VectorField], options: &EncodeOptions) -> RenderGeometry {
    let combined = VectorField::sum(fields).scaled(options.scale);
    let magnitude = combined.magnitude();
    let relative = normalized_magnitudes(&magnitude);

    let mut geometry = RenderGeometry::default();
    for (idx, &m) in relative.indexed_iter() {
        if m < options.significance_threshold {
            continue;
        }

        let mut vector = combined.at(idx);
        let length = magnitude[idx];
        if options.normalize && length > 0.0 {
            for c in &mut vector {
                *c *= options.scale / length;
            }
        }

        let start = grid.position(idx);
        let end = [start[0] + vector[0], start[1] + vector[1], start[2] + vector[2]];
        let color = if options.colorize {
            hsv_to_rgb(m * options.hue_range, 1.0, 1.0)
        } else {
            WHITE
        };

        geometry.lines.push(start);
        geometry.lines.push(end);
        geometry.arrows.push([start[0], start[1], start[2], end[0], end[1], end[2]]);
        geometry.colors.push(color);
        geometry.magnitudes.push(m);
    }

    log::debug!(
        "encoded {} of {} vectors (threshold {})",
        geometry.segment_count(),
        grid.len(),
        options.significance_threshold
    );
    geometry
}

/// Min-max normalise `magnitude` into `[0, 1]`.
///
/// A grid with no spread has no meaningful relative scale: it maps to all
/// ones when the field is non-zero and to all zeros otherwise.
pub fn normalized_magnitudes(magnitude: &Array3<f64>) -> Array3<f64> {
    let min = magnitude.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = magnitude.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if !(range > 0.0) {
        let fill = if max > 0.0 { 1.0 } else { 0.0 };
        if fill > 0.0 {
            log::warn!("field magnitude is uniform ({max:.3e}); every vector gets full colour");
        }
        return Array3::from_elem(magnitude.dim(), fill);
    }

    let mut out = Array3::zeros(magnitude.dim());
    Zip::from(&mut out)
        .and(magnitude)
        .for_each(|o, &m| *o = (m - min) / range);
    out
}

/// Convert an HSV colour (hue in degrees) to RGB components in `[0, 1]`.
///
/// Hues from 300 up wrap to negative sectors so the red end is continuous.
/// Hues below -60 match no sector and give white; they are not folded into
/// the red-to-yellow sector.
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [f64; 3] {
    let max = v;
    let chroma = s * v;
    let min = max - chroma;
    let h_prime = if h >= 300.0 { (h - 360.0) / 60.0 } else { h / 60.0 };

    match h_prime {
        hp if (-1.0..0.0).contains(&hp) => [max, min, min - hp * chroma],
        hp if (0.0..1.0).contains(&hp) => [max, min + hp * chroma, min],
        hp if (1.0..2.0).contains(&hp) => [min - (hp - 2.0) * chroma, max, min],
        hp if (2.0..3.0).contains(&hp) => [min, max, min + (hp - 2.0) * chroma],
        hp if (3.0..4.0).contains(&hp) => [min, min - (hp - 4.0) * chroma, max],
        hp if (4.0..5.0).contains(&hp) => [min + (hp - 4.0) * chroma, min, max],
        _ => WHITE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MeshBounds;
    use approx::assert_relative_eq;

    fn grid() -> Grid {
        Grid::new(MeshBounds::cube(3.0), 0.85).unwrap()
    }

    /// `(x, 0, 0)` at every cell: magnitudes 0..=3 along x.
    fn x_field(g: &Grid) -> VectorField {
        let mut f = VectorField::zeros(g.shape());
        f.u = g.x().clone();
        f
    }

    fn length(arrow: &[f64; 6]) -> f64 {
        let d = [arrow[3] - arrow[0], arrow[4] - arrow[1], arrow[5] - arrow[2]];
        (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
    }

    #[test]
    fn test_primary_hues() {
        let red = hsv_to_rgb(0.0, 1.0, 1.0);
        let green = hsv_to_rgb(120.0, 1.0, 1.0);
        let blue = hsv_to_rgb(240.0, 1.0, 1.0);
        for (got, want) in [(red, [1.0, 0.0, 0.0]), (green, [0.0, 1.0, 0.0]), (blue, [0.0, 0.0, 1.0])] {
            for c in 0..3 {
                assert_relative_eq!(got[c], want[c], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_hue_sectors() {
        assert_eq!(hsv_to_rgb(60.0, 1.0, 1.0), [1.0, 1.0, 0.0]);
        assert_eq!(hsv_to_rgb(180.0, 1.0, 1.0), [0.0, 1.0, 1.0]);
        assert_eq!(hsv_to_rgb(300.0, 1.0, 1.0), [1.0, 0.0, 1.0]);
        let pink = hsv_to_rgb(330.0, 1.0, 1.0);
        assert_relative_eq!(pink[2], 0.5, epsilon = 1e-12);
        assert_eq!(hsv_to_rgb(700.0, 1.0, 1.0), WHITE);
        assert_eq!(hsv_to_rgb(-90.0, 1.0, 1.0), WHITE);
    }

    #[test]
    fn test_negative_hues_stop_at_magenta() {
        assert_eq!(hsv_to_rgb(-30.0, 1.0, 1.0), [1.0, 0.0, 0.5]);
        assert_eq!(hsv_to_rgb(-60.0, 1.0, 1.0), [1.0, 0.0, 1.0]);
        // Past -60 nothing matches; no yellow or orange leaks through.
        for h in [-60.5, -120.0, -300.0] {
            assert_eq!(hsv_to_rgb(h, 1.0, 1.0), WHITE);
        }
    }

    #[test]
    fn test_min_max_normalisation() {
        let mut mag = Array3::zeros((1, 1, 3));
        mag[[0, 0, 0]] = 2.0;
        mag[[0, 0, 1]] = 4.0;
        mag[[0, 0, 2]] = 6.0;
        let m = normalized_magnitudes(&mag);
        assert_relative_eq!(m[[0, 0, 0]], 0.0);
        assert_relative_eq!(m[[0, 0, 1]], 0.5);
        assert_relative_eq!(m[[0, 0, 2]], 1.0);

        assert!(normalized_magnitudes(&Array3::zeros((2, 2, 2))).iter().all(|&v| v == 0.0));
        assert!(normalized_magnitudes(&Array3::from_elem((2, 2, 2), 3.0)).iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_segments_start_on_grid_and_follow_the_scaled_vector() {
        let g = grid();
        let field = x_field(&g);
        let options = EncodeOptions { scale: 2.0, ..EncodeOptions::default() };
        let geometry = encode(&g, &[&field], &options);

        // The x = 0 plane has zero magnitude and is culled.
        assert_eq!(geometry.segment_count(), 343 - 49);
        assert_eq!(geometry.lines.len(), 2 * geometry.segment_count());
        assert_eq!(geometry.colors.len(), geometry.segment_count());

        for (n, arrow) in geometry.arrows.iter().enumerate() {
            let start = geometry.lines[2 * n];
            let end = geometry.lines[2 * n + 1];
            assert_eq!(arrow[..3], start);
            assert_eq!(arrow[3..], end);
            assert_relative_eq!(end[0], 3.0 * start[0], epsilon = 1e-12);
            assert_eq!(end[1], start[1]);
        }
    }

    #[test]
    fn test_fields_are_summed_before_encoding() {
        let g = grid();
        let field = x_field(&g);
        let half = field.clone().scaled(0.5);
        let summed = encode(&g, &[&half, &half], &EncodeOptions::default());
        let single = encode(&g, &[&field], &EncodeOptions::default());
        assert_eq!(summed.segment_count(), single.segment_count());
        for (a, b) in summed.arrows.iter().zip(&single.arrows) {
            for c in 0..6 {
                assert_relative_eq!(a[c], b[c], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_no_emitted_segment_is_below_threshold() {
        let g = grid();
        let field = x_field(&g);
        let options = EncodeOptions { significance_threshold: 0.5, ..EncodeOptions::default() };
        let geometry = encode(&g, &[&field], &options);
        // Only |x| = 2 and |x| = 3 survive (m = 2/3 and 1).
        assert_eq!(geometry.segment_count(), 4 * 49);
        assert!(geometry.magnitudes.iter().all(|&m| m >= 0.5));
    }

    #[test]
    fn test_normalised_segments_have_scale_length() {
        let g = grid();
        let field = x_field(&g);
        let options = EncodeOptions { scale: 0.4, normalize: true, ..EncodeOptions::default() };
        let geometry = encode(&g, &[&field], &options);
        assert!(!geometry.is_empty());
        for arrow in &geometry.arrows {
            assert_relative_eq!(length(arrow), 0.4, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_colour_tracks_relative_magnitude() {
        let g = grid();
        let field = x_field(&g);
        let geometry = encode(&g, &[&field], &EncodeOptions::default());
        let strongest = geometry
            .magnitudes
            .iter()
            .position(|&m| m == 1.0)
            .unwrap();
        // Hue 255 lies in the blue-magenta sector.
        let c = geometry.colors[strongest];
        assert_relative_eq!(c[0], 0.25, epsilon = 1e-12);
        assert_eq!(c[1], 0.0);
        assert_eq!(c[2], 1.0);

        let plain = encode(&g, &[&field], &EncodeOptions { colorize: false, ..EncodeOptions::default() });
        assert!(plain.colors.iter().all(|&c| c == WHITE));
    }

    #[test]
    fn test_zero_field_emits_nothing() {
        let g = grid();
        let zero = VectorField::zeros(g.shape());
        let geometry = encode(&g, &[&zero], &EncodeOptions { normalize: true, ..EncodeOptions::default() });
        assert!(geometry.is_empty());
        assert!(geometry.lines.is_empty());
    }

    #[test]
    fn test_uniform_field_is_fully_coloured() {
        let g = grid();
        let mut field = VectorField::zeros(g.shape());
        field.w.fill(1.0);
        let geometry = encode(&g, &[&field], &EncodeOptions::default());
        assert_eq!(geometry.segment_count(), g.len());
        assert!(geometry.magnitudes.iter().all(|&m| m == 1.0));
    }
}
