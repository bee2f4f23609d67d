//! Elementary point geometry shared by the extractor and the overlay.

use crate::types::Point;

/// Euclidean distance between two points. NaN inputs propagate.
#[inline]
pub fn distance(p1: Point, p2: Point) -> f32 {
    p1.distance(&p2)
}

#[inline]
pub fn midpoint(p1: Point, p2: Point) -> Point {
    (p1 + p2) * 0.5
}

/// Continue the line from `from` through `through` by `factor` times its length.
///
/// `extrapolate(chin, bridge, 0.25)` yields a point a quarter of the
/// chin-to-bridge distance beyond the bridge.
#[inline]
pub fn extrapolate(from: Point, through: Point, factor: f32) -> Point {
    through + (through - from) * factor
}

/// Angle of the vector `from -> to` in degrees, in (-180, 180].
#[inline]
pub fn angle_degrees(from: Point, to: Point) -> f32 {
    let d = to - from;
    d.y.atan2(d.x).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        for p in [
            Point::zero(),
            Point::new(3.5, -2.0),
            Point::new(1e4, 7.25),
        ] {
            assert_eq!(distance(p, p), 0.0);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(4.0, 6.0);
        assert_eq!(distance(a, b), distance(b, a));
        assert!((distance(a, b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn distance_propagates_nan() {
        let a = Point::new(f32::NAN, 0.0);
        assert!(distance(a, Point::zero()).is_nan());
    }

    #[test]
    fn midpoint_and_extrapolate() {
        let m = midpoint(Point::new(0.0, 0.0), Point::new(4.0, 2.0));
        assert_eq!(m, Point::new(2.0, 1.0));

        // Chin at y=100, bridge at y=20: a quarter of 80 px above the bridge.
        let p = extrapolate(Point::new(50.0, 100.0), Point::new(50.0, 20.0), 0.25);
        assert!((p.x - 50.0).abs() < 1e-6);
        assert!((p.y - 0.0).abs() < 1e-6);
    }

    #[test]
    fn angle_of_eye_line() {
        let origin = Point::new(0.0, 0.0);
        assert_eq!(angle_degrees(origin, Point::new(10.0, 0.0)), 0.0);
        assert!((angle_degrees(origin, Point::new(10.0, 10.0)) - 45.0).abs() < 1e-4);
        assert!((angle_degrees(origin, Point::new(10.0, -10.0)) + 45.0).abs() < 1e-4);
    }
}
