use std::error::Error;
use std::f64::consts::PI;

use num_complex::Complex;

pub type DynError = Box<dyn Error + Send + Sync>;

/// Angle of `z` via `atan2(im, re)` in `(-PI, PI]`, with the all-zero
/// sample pinned to `0.0` instead of whatever `atan2(0, 0)` yields.
pub fn safe_arg(z: &Complex<f64>) -> f64 {
    if z.re == 0.0 && z.im == 0.0 {
        0.0
    } else {
        z.arg()
    }
}

/// Fold an angle into `[-PI, PI]` by repeated full turns.
pub fn normalize_angle(mut angle: f64) -> f64 {
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_arg_pins_zero_sample_to_zero() {
        assert_eq!(safe_arg(&Complex::new(0.0, 0.0)), 0.0);
        assert!((safe_arg(&Complex::new(0.0, 1.0)) - PI / 2.0).abs() < 1e-12);
        assert!((safe_arg(&Complex::new(-1.0, 0.0)) - PI).abs() < 1e-12);
    }

    #[test]
    fn normalize_angle_folds_full_turns() {
        assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-12);
        assert!((normalize_angle(-3.0 * PI) + PI).abs() < 1e-12);
        assert_eq!(normalize_angle(0.25), 0.25);
        assert!((normalize_angle(2.0 * PI + 0.1) - 0.1).abs() < 1e-12);
    }
}
