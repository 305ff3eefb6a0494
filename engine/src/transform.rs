use crate::viewport::ViewportPoint;

/// Mapping between integer world coordinates (origin top-left) and the host
/// map's projected space (`y` grows upward).
///
/// Starts as an identity placeholder; `finalize` swaps in the real mapping
/// once the world image dimensions are known.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CoordTransform {
    #[default]
    Pending,
    Ready {
        world_width: f64,
        world_height: f64,
        invert_y: bool,
    },
}

#[inline]
fn sanitize(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v }
}

impl CoordTransform {
    pub fn finalize(world_width: f64, world_height: f64, invert_y: bool) -> Self {
        Self::Ready {
            world_width: sanitize(world_width).max(0.0),
            world_height: sanitize(world_height).max(0.0),
            invert_y,
        }
    }

    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// World dimensions, or `None` before `finalize`.
    pub const fn world_size(&self) -> Option<(f64, f64)> {
        match *self {
            Self::Pending => None,
            Self::Ready {
                world_width,
                world_height,
                ..
            } => Some((world_width, world_height)),
        }
    }

    pub fn to_viewport(&self, world_x: f64, world_y: f64) -> ViewportPoint {
        match *self {
            Self::Pending => ViewportPoint::new(world_x, world_y),
            Self::Ready {
                world_height,
                invert_y,
                ..
            } => {
                let y = if invert_y {
                    world_height - world_y
                } else {
                    world_y
                };
                ViewportPoint::new(world_x, y)
            }
        }
    }

    /// Inverse of `to_viewport`, rounded and clamped into the world rectangle.
    pub fn to_world(&self, point: ViewportPoint) -> (i64, i64) {
        let x = sanitize(point.x).round();
        let y = sanitize(point.y).round();
        match *self {
            Self::Pending => (x as i64, y as i64),
            Self::Ready {
                world_width,
                world_height,
                invert_y,
            } => {
                let x = x.clamp(0.0, world_width);
                let y_top = y.clamp(0.0, world_height);
                let y = if invert_y { world_height - y_top } else { y_top };
                (x as i64, y as i64)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_is_identity() {
        let t = CoordTransform::default();
        assert!(!t.is_ready());
        assert_eq!(t.to_viewport(3.0, 4.0), ViewportPoint::new(3.0, 4.0));
        assert_eq!(t.to_world(ViewportPoint::new(3.4, 4.6)), (3, 5));
        assert_eq!(t.world_size(), None);
    }

    #[test]
    fn invert_y_flips_vertical_axis() {
        let t = CoordTransform::finalize(1000.0, 800.0, true);
        assert_eq!(t.to_viewport(10.0, 0.0), ViewportPoint::new(10.0, 800.0));
        assert_eq!(t.to_viewport(10.0, 800.0), ViewportPoint::new(10.0, 0.0));

        let plain = CoordTransform::finalize(1000.0, 800.0, false);
        assert_eq!(plain.to_viewport(10.0, 30.0), ViewportPoint::new(10.0, 30.0));
    }

    #[test]
    fn to_world_clamps_out_of_range_points() {
        let t = CoordTransform::finalize(1000.0, 800.0, true);
        assert_eq!(t.to_world(ViewportPoint::new(-50.0, 900.0)), (0, 0));
        assert_eq!(t.to_world(ViewportPoint::new(2000.0, -10.0)), (1000, 800));
        assert_eq!(t.to_world(ViewportPoint::new(f64::NAN, f64::INFINITY)), (0, 0));
    }

    #[test]
    fn round_trip_recovers_world_points() {
        for invert_y in [true, false] {
            let t = CoordTransform::finalize(1000.0, 1000.0, invert_y);
            for x in (0..=1000).step_by(37) {
                for y in (0..=1000).step_by(41) {
                    let p = t.to_viewport(x as f64, y as f64);
                    assert_eq!(t.to_world(p), (x, y), "invert_y={invert_y}");
                }
            }
        }
    }

    #[test]
    fn round_trip_tolerates_fractional_input() {
        let t = CoordTransform::finalize(1000.0, 1000.0, true);
        let (x, y) = t.to_world(t.to_viewport(12.3, 45.6));
        assert!((x - 12).abs() <= 1);
        assert!((y - 46).abs() <= 1);
    }
}
