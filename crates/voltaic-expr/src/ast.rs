//! Expression trees and their per-cell evaluation.
//!
//! Values are plain `f64`. Comparisons produce `1.0`/`0.0` and any non-zero
//! value counts as true, so a position predicate and a strength formula are
//! the same kind of tree.

use std::f64::consts::PI;

/// The variables an expression may reference at each grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Var {
    X,
    Y,
    Z,
    /// Distance from the origin.
    R,
    /// Distance from the z axis.
    S,
    /// Azimuth in degrees, `atan2(y, x) + 180` so it spans [0, 360].
    Phi,
    /// Polar angle from +z in degrees.
    Theta,
    /// Simulation time.
    T,
}

impl Var {
    pub const NAMES: [&'static str; 8] = ["x", "y", "z", "r", "s", "phi", "theta", "t"];

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "x" => Var::X,
            "y" => Var::Y,
            "z" => Var::Z,
            "r" => Var::R,
            "s" => Var::S,
            "phi" => Var::Phi,
            "theta" => Var::Theta,
            "t" => Var::T,
            _ => return None,
        })
    }
}

/// Values bound to every [`Var`] at a single cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellVars {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub r: f64,
    pub s: f64,
    pub phi: f64,
    pub theta: f64,
    pub t: f64,
}

impl CellVars {
    /// Derive the convenience scalars from a cell position and the time.
    pub fn at(x: f64, y: f64, z: f64, t: f64) -> Self {
        let s = (x * x + y * y).sqrt();
        Self {
            x,
            y,
            z,
            r: (x * x + y * y + z * z).sqrt(),
            s,
            phi: y.atan2(x) * 180.0 / PI + 180.0,
            theta: s.atan2(z) * 180.0 / PI,
            t,
        }
    }

    fn get(&self, var: Var) -> f64 {
        match var {
            Var::X => self.x,
            Var::Y => self.y,
            Var::Z => self.z,
            Var::R => self.r,
            Var::S => self.s,
            Var::Phi => self.phi,
            Var::Theta => self.theta,
            Var::T => self.t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    /// Floored remainder, sign follows the divisor.
    Rem,
    Pow,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    fn test(self, a: f64, b: f64) -> bool {
        match self {
            CompareOp::Lt => a < b,
            CompareOp::Le => a <= b,
            CompareOp::Gt => a > b,
            CompareOp::Ge => a >= b,
            CompareOp::Eq => a == b,
            CompareOp::Ne => a != b,
        }
    }
}

/// Built-in functions. Names follow numpy so that expressions written
/// as `np.sin(t)` keep working once the prefix is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sqrt,
    Exp,
    Log,
    Log10,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Abs,
    Floor,
    Ceil,
    Sign,
    Min,
    Max,
    Atan2,
    Pow,
    Heaviside,
}

impl Function {
    /// Canonical names; `np.` prefixed and `arc` spellings are also accepted.
    pub const NAMES: [&'static str; 22] = [
        "sqrt", "exp", "log", "log10", "sin", "cos", "tan", "asin", "acos", "atan", "sinh",
        "cosh", "tanh", "abs", "floor", "ceil", "sign", "min", "max", "atan2", "pow",
        "heaviside",
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.strip_prefix("np.").unwrap_or(name);
        Some(match name {
            "sqrt" => Function::Sqrt,
            "exp" => Function::Exp,
            "log" => Function::Log,
            "log10" => Function::Log10,
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "asin" | "arcsin" => Function::Asin,
            "acos" | "arccos" => Function::Acos,
            "atan" | "arctan" => Function::Atan,
            "sinh" => Function::Sinh,
            "cosh" => Function::Cosh,
            "tanh" => Function::Tanh,
            "abs" | "absolute" => Function::Abs,
            "floor" => Function::Floor,
            "ceil" => Function::Ceil,
            "sign" => Function::Sign,
            "min" | "minimum" => Function::Min,
            "max" | "maximum" => Function::Max,
            "atan2" | "arctan2" => Function::Atan2,
            "pow" | "power" => Function::Pow,
            "heaviside" => Function::Heaviside,
            _ => return None,
        })
    }

    pub fn arity(self) -> usize {
        match self {
            Function::Min | Function::Max | Function::Atan2 | Function::Pow | Function::Heaviside => 2,
            _ => 1,
        }
    }

    fn apply(self, args: &[f64]) -> f64 {
        let a = args[0];
        match self {
            Function::Sqrt => a.sqrt(),
            Function::Exp => a.exp(),
            Function::Log => a.ln(),
            Function::Log10 => a.log10(),
            Function::Sin => a.sin(),
            Function::Cos => a.cos(),
            Function::Tan => a.tan(),
            Function::Asin => a.asin(),
            Function::Acos => a.acos(),
            Function::Atan => a.atan(),
            Function::Sinh => a.sinh(),
            Function::Cosh => a.cosh(),
            Function::Tanh => a.tanh(),
            Function::Abs => a.abs(),
            Function::Floor => a.floor(),
            Function::Ceil => a.ceil(),
            Function::Sign => {
                if a > 0.0 {
                    1.0
                } else if a < 0.0 {
                    -1.0
                } else {
                    a
                }
            }
            Function::Min => {
                let b = args[1];
                if a.is_nan() || b.is_nan() { f64::NAN } else { a.min(b) }
            }
            Function::Max => {
                let b = args[1];
                if a.is_nan() || b.is_nan() { f64::NAN } else { a.max(b) }
            }
            Function::Atan2 => a.atan2(args[1]),
            Function::Pow => a.powf(args[1]),
            Function::Heaviside => {
                if a < 0.0 {
                    0.0
                } else if a > 0.0 {
                    1.0
                } else if a == 0.0 {
                    args[1]
                } else {
                    f64::NAN
                }
            }
        }
    }
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Var(Var),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `a < b <= c` is `a < b and b <= c`, with `b` evaluated once.
    Compare {
        first: Box<Expr>,
        rest: Vec<(CompareOp, Expr)>,
    },
    Call {
        func: Function,
        args: Vec<Expr>,
    },
}

#[inline]
fn truthy(v: f64) -> bool {
    v != 0.0
}

#[inline]
fn from_bool(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

impl Expr {
    /// Evaluate the tree at one cell.
    ///
    /// Never fails: domain errors surface as NaN or infinities, which the
    /// caller checks against the cell that produced them.
    pub fn eval(&self, vars: &CellVars) -> f64 {
        match self {
            Expr::Number(v) => *v,
            Expr::Var(var) => vars.get(*var),
            Expr::Unary { op, operand } => {
                let v = operand.eval(vars);
                match op {
                    UnaryOp::Neg => -v,
                    UnaryOp::Pos => v,
                    UnaryOp::Not => from_bool(!truthy(v)),
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                let a = lhs.eval(vars);
                match op {
                    // Python semantics: return the deciding operand.
                    BinaryOp::And => {
                        if truthy(a) {
                            rhs.eval(vars)
                        } else {
                            a
                        }
                    }
                    BinaryOp::Or => {
                        if truthy(a) {
                            a
                        } else {
                            rhs.eval(vars)
                        }
                    }
                    _ => {
                        let b = rhs.eval(vars);
                        match op {
                            BinaryOp::Add => a + b,
                            BinaryOp::Sub => a - b,
                            BinaryOp::Mul => a * b,
                            BinaryOp::Div => a / b,
                            BinaryOp::Rem => a - b * (a / b).floor(),
                            BinaryOp::Pow => a.powf(b),
                            BinaryOp::And | BinaryOp::Or => unreachable!(),
                        }
                    }
                }
            }
            Expr::Compare { first, rest } => {
                let mut left = first.eval(vars);
                for (op, operand) in rest {
                    let right = operand.eval(vars);
                    if !op.test(left, right) {
                        return 0.0;
                    }
                    left = right;
                }
                1.0
            }
            Expr::Call { func, args } => {
                let mut values = [0.0; 2];
                for (slot, arg) in values.iter_mut().zip(args) {
                    *slot = arg.eval(vars);
                }
                func.apply(&values[..args.len()])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_listed_names_resolve() {
        assert!(Var::NAMES.iter().all(|n| Var::from_name(n).is_some()));
        for name in Function::NAMES {
            assert!(Function::from_name(name).is_some(), "{name}");
            assert!(Function::from_name(&format!("np.{name}")).is_some());
        }
    }

    #[test]
    fn test_cell_vars_angles() {
        let v = CellVars::at(0.0, 1.0, 0.0, 2.5);
        assert_relative_eq!(v.r, 1.0);
        assert_relative_eq!(v.s, 1.0);
        assert_relative_eq!(v.phi, 270.0);
        assert_relative_eq!(v.theta, 90.0);
        assert_relative_eq!(v.t, 2.5);

        // On the negative x axis atan2 gives +180 degrees.
        let w = CellVars::at(-1.0, 0.0, 0.0, 0.0);
        assert_relative_eq!(w.phi, 360.0);
        let up = CellVars::at(0.0, 0.0, 2.0, 0.0);
        assert_relative_eq!(up.theta, 0.0);
    }

    #[test]
    fn test_floored_remainder_follows_divisor() {
        let vars = CellVars::at(0.0, 0.0, 0.0, 0.0);
        let rem = |a: f64, b: f64| Expr::Binary {
            op: BinaryOp::Rem,
            lhs: Box::new(Expr::Number(a)),
            rhs: Box::new(Expr::Number(b)),
        };
        assert_relative_eq!(rem(-1.0, 3.0).eval(&vars), 2.0);
        assert_relative_eq!(rem(1.0, -3.0).eval(&vars), -2.0);
        assert_relative_eq!(rem(7.0, 3.0).eval(&vars), 1.0);
    }

    #[test]
    fn test_function_lookup_accepts_numpy_prefix() {
        assert_eq!(Function::from_name("np.sin"), Some(Function::Sin));
        assert_eq!(Function::from_name("arctan2"), Some(Function::Atan2));
        assert_eq!(Function::from_name("np.bogus"), None);
        assert_eq!(Function::Atan2.arity(), 2);
    }

    #[test]
    fn test_heaviside_uses_second_argument_at_zero() {
        assert_eq!(Function::Heaviside.apply(&[0.0, 0.5]), 0.5);
        assert_eq!(Function::Heaviside.apply(&[-2.0, 0.5]), 0.0);
        assert_eq!(Function::Heaviside.apply(&[3.0, 0.5]), 1.0);
    }
}
