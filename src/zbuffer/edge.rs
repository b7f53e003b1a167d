use crate::vec::{Vec2, Vec3};

/// How an edge's x moves between rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeStep {
    /// Change of x per row, going down.
    Sloped(f32),
    /// Edge within a single row. Holds the x where it ends.
    Horizontal(f32),
}

/// One boundary segment of a polygon's outline, walked from its upper end downwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// x on the current row.
    pub x: f32,
    /// Row the edge starts on.
    pub y: usize,
    /// Reciprocal depth at the upper end.
    pub z: f32,
    pub step: EdgeStep,
    /// Rows left to walk.
    pub dy: i32,
    /// Texture coordinate at the upper end.
    pub tex: Vec2,
    /// Change of `tex * z` per row.
    pub dtex: Vec2,
}

impl Edge {
    /// Builds the edge between `p1` and `p2` (screen x, y and reciprocal depth). `tex` carries
    /// the texture coordinates of `p1` and `p2` for textured polygons.
    ///
    /// Both points must be inside the viewport.
    pub fn new(p1: Vec3, p2: Vec3, tex: Option<[Vec2; 2]>) -> Self {
        let (upper, lower, tex) = if p1.y < p2.y {
            (p2, p1, tex.map(|[t1, t2]| [t2, t1]))
        } else {
            (p1, p2, tex)
        };

        let top = upper.y as i32;
        let bottom = lower.y as i32;
        let dy = top - bottom + 1;

        let step = if dy != 1 {
            EdgeStep::Sloped(-(upper.x - lower.x) / dy as f32)
        } else {
            EdgeStep::Horizontal(lower.x)
        };

        let (tex, dtex) = match tex {
            Some([t_upper, t_lower]) => (
                t_upper,
                (t_lower * lower.z - t_upper * upper.z) / dy as f32,
            ),
            None => (Vec2::zero(), Vec2::zero()),
        };

        Edge {
            x: upper.x,
            y: top.max(0) as usize,
            z: upper.z,
            step,
            dy,
            tex,
            dtex,
        }
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self.step, EdgeStep::Horizontal(_))
    }

    /// Per row x step. Horizontal edges never move.
    pub fn dx(&self) -> f32 {
        match self.step {
            EdgeStep::Sloped(dx) => dx,
            EdgeStep::Horizontal(_) => 0.0,
        }
    }

    /// Last row covered by the edge.
    pub fn bottom(&self) -> i32 {
        self.y as i32 - self.dy + 1
    }

    /// Moves down one row. Returns `false`, leaving the edge in place, once it ran out of rows.
    pub fn advance(&mut self) -> bool {
        if self.dy > 0 {
            self.dy -= 1;
            self.x += self.dx();
            true
        } else {
            false
        }
    }

    /// Undoes one [`Edge::advance`].
    pub fn retreat(&mut self) {
        self.dy += 1;
        self.x -= self.dx();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32, z: f32) -> Vec3 {
        Vec3::from([x, y, z])
    }

    #[test]
    fn edge_starts_at_upper_end() {
        let edge = Edge::new(p(50., 10., 1.), p(30., 40., 2.), None);
        assert_eq!(edge.x, 30.);
        assert_eq!(edge.y, 40);
        assert_eq!(edge.z, 2.);
        assert_eq!(edge.dy, 31);
        assert_eq!(edge.bottom(), 10);
        assert_eq!(edge.step, EdgeStep::Sloped(20. / 31.));
    }

    #[test]
    fn single_row_edge_is_horizontal() {
        let edge = Edge::new(p(10., 10.2, 1.), p(50., 10.7, 1.), None);
        assert!(edge.is_horizontal());
        assert_eq!(edge.x, 50.);
        assert_eq!(edge.step, EdgeStep::Horizontal(10.));
        assert_eq!(edge.dx(), 0.);

        let flat = Edge::new(p(10., 10., 1.), p(50., 10., 1.), None);
        assert_eq!((flat.x, flat.step), (10., EdgeStep::Horizontal(50.)));
    }

    #[test]
    fn texture_step_is_in_reciprocal_depth_space() {
        let t1 = Vec2::from([0., 0.]);
        let t2 = Vec2::from([1., 1.]);
        let edge = Edge::new(p(0., 0., 2.), p(0., 9., 4.), Some([t1, t2]));
        assert_eq!(edge.tex, t2);
        assert_eq!(edge.dtex, Vec2::from([-0.4, -0.4]));
    }

    #[test]
    fn edge_stalls_when_exhausted() {
        let mut edge = Edge::new(p(0., 1., 1.), p(2., 0., 1.), None);
        assert_eq!(edge.dy, 2);
        assert!(edge.advance());
        assert!(edge.advance());
        assert_eq!(edge.x, 2.);
        assert!(!edge.advance());
        assert_eq!((edge.x, edge.dy), (2., 0));
        edge.retreat();
        assert_eq!((edge.x, edge.dy), (1., 1));
    }
}
