/// CSS style cubic-bezier timing curve with fixed end points (0,0) and (1,1).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezier {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

/// Fade in/out curve of background items.
pub const FADE_CURVE: CubicBezier = CubicBezier::new(0.22, 1.0, 0.36, 1.0);

impl CubicBezier {
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    fn component(p1: f32, p2: f32, t: f32) -> f32 {
        let u = 1.0 - t;
        3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t
    }

    /// Eased progress for linear progress `x` in [0, 1].
    pub fn apply(&self, x: f32) -> f32 {
        let x = x.clamp(0.0, 1.0);
        if x == 0.0 || x == 1.0 {
            return x;
        }

        // x(t) is monotonic for control points inside [0, 1]
        let (mut low, mut high) = (0.0_f32, 1.0_f32);
        let mut t = x;
        for _ in 0..32 {
            let estimate = Self::component(self.x1, self.x2, t);
            if (estimate - x).abs() < 1e-5 {
                break;
            }
            if estimate < x {
                low = t;
            } else {
                high = t;
            }
            t = (low + high) / 2.0;
        }
        Self::component(self.y1, self.y2, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_stable() {
        assert_eq!(FADE_CURVE.apply(0.0), 0.0);
        assert_eq!(FADE_CURVE.apply(1.0), 1.0);
        assert_eq!(FADE_CURVE.apply(-3.0), 0.0);
        assert_eq!(FADE_CURVE.apply(4.0), 1.0);
    }

    #[test]
    fn fade_curve_eases_out() {
        let a = FADE_CURVE.apply(0.25);
        let b = FADE_CURVE.apply(0.5);
        let c = FADE_CURVE.apply(0.75);
        assert!(a < b && b < c);
        assert!(a > 0.5, "front-loaded curve, got {a}");
    }

    #[test]
    fn linear_control_points_are_identity() {
        let linear = CubicBezier::new(1.0 / 3.0, 1.0 / 3.0, 2.0 / 3.0, 2.0 / 3.0);
        for x in [0.1, 0.4, 0.8] {
            assert!((linear.apply(x) - x).abs() < 1e-3);
        }
    }
}
