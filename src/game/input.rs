use super::math::{angle_of, length, sub};
use super::types::{Aim, Point};

const MIN_AIM_LENGTH: f64 = 1e-6;

/// Turns raw aim input into a heading. Non-finite or zero-length input yields `None` so the
/// caller keeps its previous aim.
pub fn aim_heading(aim: Aim, head: Point) -> Option<f64> {
    let vector = match aim {
        Aim::Direction(direction) => direction,
        Aim::Point(target) => {
            if !target.is_finite() {
                return None;
            }
            sub(target, head)
        }
    };
    if !vector.is_finite() || length(vector) < MIN_AIM_LENGTH {
        return None;
    }
    Some(angle_of(vector))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn direction_aim_maps_to_angle() {
        let heading = aim_heading(Aim::Direction(Point::new(0.0, 3.0)), Point::ZERO);
        assert!((heading.unwrap() - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn point_aim_is_relative_to_head() {
        let heading = aim_heading(Aim::Point(Point::new(10.0, 5.0)), Point::new(10.0, 0.0));
        assert!((heading.unwrap() - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn bad_input_is_ignored() {
        assert_eq!(aim_heading(Aim::Direction(Point::new(f64::NAN, 1.0)), Point::ZERO), None);
        assert_eq!(aim_heading(Aim::Direction(Point::ZERO), Point::ZERO), None);
        assert_eq!(aim_heading(Aim::Point(Point::new(2.0, 2.0)), Point::new(2.0, 2.0)), None);
        assert_eq!(
            aim_heading(Aim::Point(Point::new(f64::INFINITY, 0.0)), Point::ZERO),
            None
        );
    }
}
