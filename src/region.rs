//! Rectangles that can be picked up and moved around.

use nalgebra::Point2;

use crate::image::{Color, Rect};

/// Width and height of a region unless specified otherwise.
pub const DEFAULT_SIZE: (u32, u32) = (200, 200);

/// Largest width or height of a region, so that its extents fit into pixel coordinates.
pub const MAX_SIZE: u32 = i32::MAX as u32;

/// Color regions are drawn in unless specified otherwise.
pub const DEFAULT_COLOR: Color = Color::MAGENTA;

/// An on-screen rectangle that snaps to the cursor when the cursor is inside of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraggableRegion {
    center: Point2<i32>,
    width: u32,
    height: u32,
    color: Color,
}

impl DraggableRegion {
    /// Creates a region of [`DEFAULT_SIZE`] and [`DEFAULT_COLOR`] centered at `center`.
    pub fn new(center: Point2<i32>) -> Self {
        Self::with_size(center, DEFAULT_SIZE.0, DEFAULT_SIZE.1)
    }

    /// Creates a region of the given size centered at `center`.
    ///
    /// Sizes are clamped to [`MAX_SIZE`].
    pub fn with_size(center: Point2<i32>, width: u32, height: u32) -> Self {
        Self {
            center,
            width: width.min(MAX_SIZE),
            height: height.min(MAX_SIZE),
            color: DEFAULT_COLOR,
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// The default layout: `count` regions in a row along the top of the frame.
    ///
    /// Region `i` is centered at `(i * 250 + 150, 150)`.
    pub fn row(count: usize) -> Vec<Self> {
        (0..count as i32)
            .map(|i| Self::new(Point2::new(i * 250 + 150, 150)))
            .collect()
    }

    #[inline]
    pub fn center(&self) -> Point2<i32> {
        self.center
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    fn half_extents(&self) -> (i32, i32) {
        // Lossless, sizes never exceed `MAX_SIZE`.
        ((self.width / 2) as i32, (self.height / 2) as i32)
    }

    /// Returns whether `cursor` lies strictly inside the region.
    ///
    /// Cursors exactly on the boundary (`center ± size / 2`, with integer halving) are outside.
    pub fn contains(&self, cursor: Point2<i32>) -> bool {
        let (hw, hh) = self.half_extents();
        let (hw, hh) = (i64::from(hw), i64::from(hh));
        let (cx, cy) = (i64::from(self.center.x), i64::from(self.center.y));
        let (x, y) = (i64::from(cursor.x), i64::from(cursor.y));
        cx - hw < x && x < cx + hw && cy - hh < y && y < cy + hh
    }

    /// Moves the region's center onto `cursor` if the cursor is inside of it.
    ///
    /// Returns whether the region moved.
    pub fn update(&mut self, cursor: Point2<i32>) -> bool {
        if self.contains(cursor) {
            self.center = cursor;
            true
        } else {
            false
        }
    }

    /// The rectangle to draw, spanning `center - size / 2` to `center + size / 2` inclusive.
    ///
    /// Corners beyond the range of pixel coordinates are clamped to it.
    pub fn rect(&self) -> Rect {
        let (hw, hh) = self.half_extents();
        let (cx, cy) = (self.center.x, self.center.y);
        Rect::from_corners(
            (cx.saturating_sub(hw), cy.saturating_sub(hh)),
            (cx.saturating_add(hw), cy.saturating_add(hh)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout() {
        let regions = DraggableRegion::row(5);
        let centers = regions.iter().map(|r| r.center()).collect::<Vec<_>>();
        assert_eq!(
            centers,
            [
                Point2::new(150, 150),
                Point2::new(400, 150),
                Point2::new(650, 150),
                Point2::new(900, 150),
                Point2::new(1150, 150),
            ]
        );
        assert!(regions.iter().all(|r| r.size() == (200, 200)));
    }

    #[test]
    fn snaps_to_cursor_inside() {
        let mut region = DraggableRegion::new(Point2::new(150, 150));
        assert!(region.update(Point2::new(200, 120)));
        assert_eq!(region.center(), Point2::new(200, 120));

        // Just inside the edges.
        let mut region = DraggableRegion::new(Point2::new(150, 150));
        assert!(region.update(Point2::new(51, 249)));
        assert_eq!(region.center(), Point2::new(51, 249));
    }

    #[test]
    fn boundary_is_outside() {
        let start = Point2::new(150, 150);
        for cursor in [
            Point2::new(50, 150),
            Point2::new(250, 150),
            Point2::new(150, 50),
            Point2::new(150, 250),
            Point2::new(50, 50),
            Point2::new(400, 400),
        ] {
            let mut region = DraggableRegion::new(start);
            assert!(!region.update(cursor), "{:?}", cursor);
            assert_eq!(region.center(), start);
        }
    }

    #[test]
    fn odd_size_halves_round_down() {
        let region = DraggableRegion::with_size(Point2::new(0, 0), 5, 3);
        assert!(region.contains(Point2::new(1, 0)));
        assert!(!region.contains(Point2::new(2, 0)));
        assert!(!region.contains(Point2::new(0, 1)));
        assert_eq!(region.rect(), Rect::from_corners((-2, -1), (2, 1)));
    }

    #[test]
    fn rect_corners_are_inclusive() {
        let region = DraggableRegion::new(Point2::new(150, 150));
        let rect = region.rect();
        assert_eq!((rect.x(), rect.y()), (50, 50));
        assert_eq!((rect.x_max(), rect.y_max()), (250, 250));
    }

    #[test]
    fn extreme_geometry_does_not_overflow() {
        let far = Point2::new(i32::MAX - 10, i32::MIN + 10);
        let region = DraggableRegion::with_size(far, 200, 200);
        assert!(region.contains(Point2::new(i32::MAX - 5, i32::MIN + 5)));
        assert!(region.contains(far));
        assert!(!region.contains(Point2::new(0, 0)));

        let rect = region.rect();
        assert_eq!((rect.x(), rect.y()), (i32::MAX - 110, i32::MIN));
        assert_eq!((rect.width(), rect.height()), (111, 111));

        let huge = DraggableRegion::with_size(Point2::new(0, 0), u32::MAX, u32::MAX);
        assert_eq!(huge.size(), (MAX_SIZE, MAX_SIZE));
        assert!(huge.contains(Point2::new(1_000_000_000, -1_000_000_000)));
        assert!(!huge.contains(Point2::new(i32::MAX, 0)));
        assert_eq!(huge.rect().x(), -(MAX_SIZE as i32 / 2));
    }

    #[test]
    fn random_cursors() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        for _ in 0..1000 {
            let center = Point2::new(rng.i32(-500..500), rng.i32(-500..500));
            let (w, h) = (rng.u32(0..300), rng.u32(0..300));
            let cursor = Point2::new(rng.i32(-900..900), rng.i32(-900..900));

            let mut region = DraggableRegion::with_size(center, w, h);
            let expected = (center.x - cursor.x).unsigned_abs() < w / 2
                && (center.y - cursor.y).unsigned_abs() < h / 2;

            assert_eq!(region.update(cursor), expected);
            let expected_center = if expected { cursor } else { center };
            assert_eq!(region.center(), expected_center);
            assert_eq!(region.size(), (w, h));
        }
    }
}
