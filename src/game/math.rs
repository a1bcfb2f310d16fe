use super::types::Point;
use rand::Rng;
use std::f64::consts::{PI, TAU};

pub fn add(a: Point, b: Point) -> Point {
  Point {
    x: a.x + b.x,
    y: a.y + b.y,
  }
}

pub fn sub(a: Point, b: Point) -> Point {
  Point {
    x: a.x - b.x,
    y: a.y - b.y,
  }
}

pub fn scale(point: Point, factor: f64) -> Point {
  Point {
    x: point.x * factor,
    y: point.y * factor,
  }
}

pub fn dot(a: Point, b: Point) -> f64 {
  a.x * b.x + a.y * b.y
}

pub fn length_sq(point: Point) -> f64 {
  dot(point, point)
}

pub fn length(point: Point) -> f64 {
  length_sq(point).sqrt()
}

pub fn distance_sq(a: Point, b: Point) -> f64 {
  length_sq(sub(a, b))
}

pub fn distance(a: Point, b: Point) -> f64 {
  distance_sq(a, b).sqrt()
}

pub fn normalize(point: Point) -> Point {
  let len = length(point);
  if !len.is_finite() || len == 0.0 {
    return Point::ZERO;
  }
  Point {
    x: point.x / len,
    y: point.y / len,
  }
}

pub fn from_angle(angle: f64) -> Point {
  Point {
    x: angle.cos(),
    y: angle.sin(),
  }
}

pub fn angle_of(point: Point) -> f64 {
  point.y.atan2(point.x)
}

pub fn lerp(a: Point, b: Point, t: f64) -> Point {
  Point {
    x: a.x + (b.x - a.x) * t,
    y: a.y + (b.y - a.y) * t,
  }
}

/// Wraps into `(-PI, PI]`.
pub fn wrap_angle(angle: f64) -> f64 {
  if !angle.is_finite() {
    return 0.0;
  }
  let mut wrapped = angle.rem_euclid(TAU);
  if wrapped > PI {
    wrapped -= TAU;
  }
  wrapped
}

/// Signed shortest rotation from `from` to `to`.
pub fn angle_diff(from: f64, to: f64) -> f64 {
  wrap_angle(to - from)
}

pub fn rotate_toward(current: f64, target: f64, max_step: f64) -> f64 {
  let diff = angle_diff(current, target);
  if diff.abs() <= max_step {
    return wrap_angle(target);
  }
  wrap_angle(current + max_step.copysign(diff))
}

/// Squared distance from `point` to the segment `a..b`. A zero-length segment degrades to
/// point distance.
pub fn point_segment_distance_sq(point: Point, a: Point, b: Point) -> f64 {
  let ab = sub(b, a);
  let len_sq = length_sq(ab);
  if len_sq <= f64::EPSILON {
    return distance_sq(point, a);
  }
  let t = clamp(dot(sub(point, a), ab) / len_sq, 0.0, 1.0);
  distance_sq(point, add(a, scale(ab, t)))
}

pub fn random_angle<R: Rng + ?Sized>(rng: &mut R) -> f64 {
  rng.gen::<f64>() * TAU
}

/// Uniform over the disc of `radius` centred on the origin.
pub fn random_in_disc<R: Rng + ?Sized>(rng: &mut R, radius: f64) -> Point {
  let r = radius * rng.gen::<f64>().sqrt();
  scale(from_angle(random_angle(rng)), r)
}

pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
  value.min(max).max(min)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn wrap_angle_stays_in_half_open_range() {
    for raw in [-10.0, -PI, -0.5, 0.0, 0.5, PI, 3.5, 10.0] {
      let wrapped = wrap_angle(raw);
      assert!(wrapped > -PI - 1e-12 && wrapped <= PI + 1e-12, "{raw} -> {wrapped}");
      assert!((wrapped.sin() - f64::sin(raw)).abs() < 1e-9);
    }
  }

  #[test]
  fn rotate_toward_caps_step_and_takes_short_way() {
    let next = rotate_toward(0.1, -3.0, 0.2);
    assert!((next - (-0.1)).abs() < 1e-9);
    let wrap = rotate_toward(3.0, -3.0, 0.1);
    assert!(wrap > 3.0 || wrap < -3.1);
    assert_eq!(rotate_toward(1.0, 1.05, 0.2), 1.05);
  }

  #[test]
  fn segment_distance_handles_degenerate_segment() {
    let a = Point::new(1.0, 1.0);
    let d = point_segment_distance_sq(Point::new(4.0, 5.0), a, a);
    assert!((d - 25.0).abs() < 1e-9);
  }

  #[test]
  fn segment_distance_projects_onto_interior() {
    let d = point_segment_distance_sq(
      Point::new(5.0, 3.0),
      Point::new(0.0, 0.0),
      Point::new(10.0, 0.0),
    );
    assert!((d - 9.0).abs() < 1e-9);
  }
}
