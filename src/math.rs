use crate::vec::{Vec2, Vec3, Vec4};

/// Below this, plane coefficients and normal projections are treated as zero.
pub const ZERO_LIMIT: f32 = 1e-3;
/// Two x coordinates closer than this land on the same pixel.
pub const SAME_PIXEL_LIMIT: f32 = 0.5;
/// Screen space depth is stored as `DEPTH_SCALE / w`.
pub const DEPTH_SCALE: f32 = 10.0;

/// Plane coefficients `(a, b, c, d)` such that `ax + by + cz + d = 0`.
pub type Plane = Vec4;

/// Unit normal of the triangle `a, b, c`. Degenerate triangles yield NaN components.
pub fn compute_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (c - b).cross(a - b).normalize()
}

pub fn compute_plane(normal: Vec3, point: Vec3) -> Plane {
    Vec4::from([normal.x, normal.y, normal.z, -normal.dot(point)])
}

/// Solves the plane for `z` at `(x, y)`. Planes nearly perpendicular to the screen yield `0`.
pub fn compute_z(plane: Plane, x: f32, y: f32) -> f32 {
    if plane.z.abs() < ZERO_LIMIT {
        return 0.0;
    }
    -(plane.x * x + plane.y * y + plane.w) / plane.z
}

/// Wraps a texture coordinate into `[0, 1]`, leaving values already in range untouched (so `1.0`
/// stays `1.0`).
pub fn wrap_uv(s: f32) -> f32 {
    if (0.0..=1.0).contains(&s) {
        s
    } else {
        s.rem_euclid(1.0)
    }
}

const INSIDE: u8 = 0b0000;
const LEFT: u8 = 0b0001;
const RIGHT: u8 = 0b0010;
const BOTTOM: u8 = 0b0100;
const TOP: u8 = 0b1000;

const MAX_CLIP_ITERATIONS: usize = 8;

/// The closed rectangle `[0, max_x] x [0, max_y]` covered by the pixel grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRect {
    pub max_x: f32,
    pub max_y: f32,
}

impl ClipRect {
    pub fn new(width: usize, height: usize) -> Self {
        ClipRect {
            max_x: width.saturating_sub(1) as f32,
            max_y: height.saturating_sub(1) as f32,
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        self.outcode(p) == INSIDE
    }

    /// Clamps `p` into the rectangle.
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::from([p.x.clamp(0.0, self.max_x), p.y.clamp(0.0, self.max_y)])
    }

    fn outcode(&self, p: Vec2) -> u8 {
        let mut code = INSIDE;
        if p.x < 0.0 {
            code |= LEFT;
        } else if p.x > self.max_x {
            code |= RIGHT;
        }
        if p.y < 0.0 {
            code |= BOTTOM;
        } else if p.y > self.max_y {
            code |= TOP;
        }
        code
    }

    /// Cohen-Sutherland clip of the segment `p0 -> p1`. Returns the surviving part with its
    /// orientation preserved, or `None` if the segment lies entirely outside.
    pub fn clip_segment(&self, mut p0: Vec2, mut p1: Vec2) -> Option<(Vec2, Vec2)> {
        if !(p0.x.is_finite() && p0.y.is_finite() && p1.x.is_finite() && p1.y.is_finite()) {
            return None;
        }

        let mut code0 = self.outcode(p0);
        let mut code1 = self.outcode(p1);

        for _ in 0..MAX_CLIP_ITERATIONS {
            if code0 | code1 == INSIDE {
                return Some((p0, p1));
            }
            if code0 & code1 != INSIDE {
                return None;
            }

            let out = if code0 != INSIDE { code0 } else { code1 };
            let (dx, dy) = (p1.x - p0.x, p1.y - p0.y);
            let moved = if out & TOP != 0 {
                Vec2::from([p0.x + dx * (self.max_y - p0.y) / dy, self.max_y])
            } else if out & BOTTOM != 0 {
                Vec2::from([p0.x + dx * (0.0 - p0.y) / dy, 0.0])
            } else if out & RIGHT != 0 {
                Vec2::from([self.max_x, p0.y + dy * (self.max_x - p0.x) / dx])
            } else {
                Vec2::from([0.0, p0.y + dy * (0.0 - p0.x) / dx])
            };

            if out == code0 {
                p0 = moved;
                code0 = self.outcode(p0);
            } else {
                p1 = moved;
                code1 = self.outcode(p1);
            }
        }

        // Rounding can leave a point hovering right on the border.
        (code0 | code1 == INSIDE).then_some((p0, p1))
    }

    fn perimeter(&self) -> f32 {
        2.0 * (self.max_x + self.max_y)
    }

    /// Position of `p` along the border, measured counter-clockwise from the origin (with y
    /// pointing up). Points off the border are first snapped to the closest side.
    pub fn perimeter_param(&self, p: Vec2) -> f32 {
        let (w, h) = (self.max_x, self.max_y);
        let p = self.clamp(p);
        let sides = [p.y, w - p.x, h - p.y, p.x];
        let mut closest = 0;
        for (i, &dist) in sides.iter().enumerate() {
            if dist < sides[closest] {
                closest = i;
            }
        }
        match closest {
            0 => p.x,
            1 => w + p.y,
            2 => w + h + (w - p.x),
            _ => 2.0 * w + h + (h - p.y),
        }
    }

    fn corners(&self) -> [(f32, Vec2); 4] {
        let (w, h) = (self.max_x, self.max_y);
        [
            (0.0, Vec2::from([0.0, 0.0])),
            (w, Vec2::from([w, 0.0])),
            (w + h, Vec2::from([w, h])),
            (2.0 * w + h, Vec2::from([0.0, h])),
        ]
    }

    /// Rectangle corners passed when walking along the border from `from` to `to`, in walking
    /// order. The walk is counter-clockwise if `counter_clockwise`, clockwise otherwise.
    pub fn corners_between(&self, from: Vec2, to: Vec2, counter_clockwise: bool) -> Vec<Vec2> {
        let perimeter = self.perimeter();
        if perimeter <= 0.0 {
            return Vec::new();
        }

        let s_from = self.perimeter_param(from);
        let s_to = self.perimeter_param(to);
        let offset = |s: f32| {
            let delta = if counter_clockwise { s - s_from } else { s_from - s };
            delta.rem_euclid(perimeter)
        };
        let span = offset(s_to);

        let mut passed: Vec<(f32, Vec2)> = self
            .corners()
            .into_iter()
            .map(|(s, corner)| (offset(s), corner))
            .filter(|&(dist, _)| dist > 0.0 && dist < span)
            .collect();
        passed.sort_by(|a, b| a.0.total_cmp(&b.0));
        passed.into_iter().map(|(_, corner)| corner).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v2(x: f32, y: f32) -> Vec2 {
        Vec2::from([x, y])
    }

    #[test]
    fn plane_reproduces_triangle_depths() {
        let a = Vec3::from([10., 10., 1.]);
        let b = Vec3::from([50., 10., 2.]);
        let c = Vec3::from([30., 40., 3.]);
        let plane = compute_plane(compute_normal(a, b, c), a);
        for p in [a, b, c] {
            assert!((compute_z(plane, p.x, p.y) - p.z).abs() < 1e-3);
        }
    }

    #[test]
    fn counter_clockwise_triangle_faces_the_screen() {
        let n = compute_normal(
            Vec3::from([10., 10., 1.]),
            Vec3::from([50., 10., 1.]),
            Vec3::from([30., 40., 1.]),
        );
        assert!((n.z - 1.).abs() < 1e-6);
    }

    #[test]
    fn degenerate_triangle_has_nan_normal() {
        let p = Vec3::from([1., 1., 1.]);
        let n = compute_normal(p, p, p);
        assert!(n.z.is_nan());
    }

    #[test]
    fn vertical_plane_has_zero_depth() {
        let plane = Vec4::from([1., 0., 0., -3.]);
        assert_eq!(compute_z(plane, 3., 4.), 0.);
    }

    #[test]
    fn wrap_keeps_unit_interval() {
        assert_eq!(wrap_uv(0.), 0.);
        assert_eq!(wrap_uv(1.), 1.);
        assert_eq!(wrap_uv(0.25), 0.25);
        assert!((wrap_uv(1.25) - 0.25).abs() < 1e-6);
        assert!((wrap_uv(-0.25) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn segment_inside_is_untouched() {
        let rect = ClipRect::new(64, 64);
        let (a, b) = rect.clip_segment(v2(1., 2.), v2(30., 40.)).unwrap();
        assert_eq!((a, b), (v2(1., 2.), v2(30., 40.)));
    }

    #[test]
    fn segment_outside_is_rejected() {
        let rect = ClipRect::new(64, 64);
        assert!(rect.clip_segment(v2(-10., 2.), v2(-1., 40.)).is_none());
        assert!(rect.clip_segment(v2(70., 70.), v2(100., 65.)).is_none());
        assert!(rect.clip_segment(v2(f32::NAN, 0.), v2(1., 1.)).is_none());
    }

    #[test]
    fn crossing_segment_is_cut_at_border() {
        let rect = ClipRect::new(64, 64);
        let (a, b) = rect.clip_segment(v2(10., 10.), v2(640., 20.)).unwrap();
        assert_eq!(a, v2(10., 10.));
        assert_eq!(b.x, 63.);
        assert!((b.y - (10. + 10. * 53. / 630.)).abs() < 1e-4);

        let (a, b) = rect.clip_segment(v2(-32., 32.), v2(96., 32.)).unwrap();
        assert_eq!((a, b), (v2(0., 32.), v2(63., 32.)));
    }

    #[test]
    fn perimeter_runs_counter_clockwise() {
        let rect = ClipRect::new(11, 21);
        assert_eq!(rect.perimeter_param(v2(4., 0.)), 4.);
        assert_eq!(rect.perimeter_param(v2(10., 5.)), 15.);
        assert_eq!(rect.perimeter_param(v2(6., 20.)), 34.);
        assert_eq!(rect.perimeter_param(v2(0., 15.)), 45.);
        assert_eq!(rect.perimeter_param(v2(0., 0.)), 0.);
    }

    #[test]
    fn walk_collects_corners_in_order() {
        let rect = ClipRect::new(11, 21);
        let ccw = rect.corners_between(v2(4., 0.), v2(6., 20.), true);
        assert_eq!(ccw, vec![v2(10., 0.), v2(10., 20.)]);

        let cw = rect.corners_between(v2(4., 0.), v2(6., 20.), false);
        assert_eq!(cw, vec![v2(0., 0.), v2(0., 20.)]);

        let wrapped = rect.corners_between(v2(0., 5.), v2(5., 0.), true);
        assert_eq!(wrapped, vec![v2(0., 0.)]);

        assert!(rect.corners_between(v2(10., 2.), v2(10., 8.), true).is_empty());
    }
}
