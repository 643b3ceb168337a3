use std::fmt;

use embedded_graphics::prelude::*;
use itertools::{Itertools, MinMaxResult};

use crate::image::AspectRatio;

/// An axis-aligned rectangle.
///
/// This rectangle type uses (signed) integer pixel coordinates and is meant to be used with the
/// [`crate::image`] module.
///
/// Rectangles are allowed to have zero height and/or width.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub(crate) rect: embedded_graphics::primitives::Rectangle,
}

impl Rect {
    /// Creates a rectangle extending outwards from a center point.
    pub fn from_center(x_center: i32, y_center: i32, width: u32, height: u32) -> Self {
        Self::from_top_left(
            x_center - (width / 2) as i32,
            y_center - (height / 2) as i32,
            width,
            height,
        )
    }

    /// Creates a rectangle extending downwards and right from a point.
    #[inline]
    pub fn from_top_left(top_left_x: i32, top_left_y: i32, width: u32, height: u32) -> Self {
        Self {
            rect: embedded_graphics::primitives::Rectangle {
                top_left: Point {
                    x: top_left_x,
                    y: top_left_y,
                },
                size: Size { width, height },
            },
        }
    }

    /// Creates a rectangle from two opposing corner points.
    ///
    /// Both corners are *inclusive*: the pixels at `top_left` and `bottom_right` are part of the
    /// rectangle.
    pub fn from_corners(top_left: (i32, i32), bottom_right: (i32, i32)) -> Self {
        Self::span_inner(top_left.0, top_left.1, bottom_right.0, bottom_right.1)
    }

    /// Computes the (axis-aligned) bounding rectangle that encompasses `points`.
    ///
    /// Returns `None` if `points` is an empty iterator.
    pub fn bounding<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (i32, i32)>,
        I::IntoIter: Clone,
    {
        let points = points.into_iter();
        let (x_min, x_max) = min_max(points.clone().map(|(x, _)| x))?;
        let (y_min, y_max) = min_max(points.map(|(_, y)| y))?;

        Some(Self::span_inner(x_min, y_min, x_max, y_max))
    }

    fn span_inner(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        assert!(x_min <= x_max, "x_min={}, x_max={}", x_min, x_max);
        assert!(y_min <= y_max, "y_min={}, y_max={}", y_min, y_max);
        Self::from_top_left(
            x_min,
            y_min,
            (x_max - x_min + 1) as u32,
            (y_max - y_min + 1) as u32,
        )
    }

    /// Grows each side of this rectangle by `margin` pixels.
    #[must_use]
    pub fn grow(&self, margin: u32) -> Self {
        Self::from_top_left(
            self.x() - margin as i32,
            self.y() - margin as i32,
            self.width() + 2 * margin,
            self.height() + 2 * margin,
        )
    }

    /// Grows each side of this rectangle by a fraction of its width (left and right) or height (top
    /// and bottom).
    ///
    /// A value of `0.5` doubles the width and height of the rectangle.
    #[must_use]
    pub fn grow_rel(&self, amount: f32) -> Self {
        let dx = (self.width() as f32 * amount) as i32;
        let dy = (self.height() as f32 * amount) as i32;
        Self::from_top_left(
            self.x() - dx,
            self.y() - dy,
            self.width() + 2 * dx as u32,
            self.height() + 2 * dy as u32,
        )
    }

    /// Symmetrically extends one dimension of `self` so that the resulting rectangle has the given
    /// aspect ratio.
    ///
    /// The result always contains `self`.
    #[must_use]
    pub fn grow_to_fit_aspect(&self, target_aspect: AspectRatio) -> Self {
        let mut res = *self;
        let target_width = (self.height() as f32 * target_aspect.as_f32() + 0.5) as u32;
        if target_width >= self.width() {
            let inc_w = target_width - self.width();
            res.rect.top_left.x -= (inc_w / 2) as i32;
            res.rect.size.width += inc_w;
        } else {
            let target_height = (self.width() as f32 / target_aspect.as_f32() + 0.5) as u32;
            let inc_h = target_height.saturating_sub(self.height());
            res.rect.top_left.y -= (inc_h / 2) as i32;
            res.rect.size.height += inc_h;
        }
        res
    }

    /// Returns the X coordinate of the left side of the rectangle.
    #[inline]
    pub fn x(&self) -> i32 {
        self.rect.top_left.x
    }

    /// Returns the Y coordinate of the top side of the rectangle.
    #[inline]
    pub fn y(&self) -> i32 {
        self.rect.top_left.y
    }

    /// Returns the X coordinate of the right-most column of pixels inside the rectangle.
    #[inline]
    pub fn x_max(&self) -> i32 {
        self.x() + self.width() as i32 - 1
    }

    /// Returns the Y coordinate of the bottom-most row of pixels inside the rectangle.
    #[inline]
    pub fn y_max(&self) -> i32 {
        self.y() + self.height() as i32 - 1
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.rect.size.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.rect.size.height
    }

    pub fn center(&self) -> (i32, i32) {
        (
            self.x() + (self.width() / 2) as i32,
            self.y() + (self.height() / 2) as i32,
        )
    }

    /// Computes the intersection of `self` and `other`.
    ///
    /// Returns `None` when the intersection is empty (ie. the rectangles do not overlap).
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if self.width() == 0 || self.height() == 0 || other.width() == 0 || other.height() == 0 {
            return None;
        }

        let x_min = self.x().max(other.x());
        let y_min = self.y().max(other.y());
        let x_max = self.x_max().min(other.x_max());
        let y_max = self.y_max().min(other.y_max());
        if x_min > x_max || y_min > y_max {
            return None;
        }
        Some(Rect::from_corners((x_min, y_min), (x_max, y_max)))
    }

    /// Returns the number of pixels covered by this rectangle.
    #[inline]
    pub fn area(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    /// Computes the Intersection over Union (IOU) of `self` and `other`.
    ///
    /// Returns 0.0 if either rectangle is empty.
    pub fn iou(&self, other: &Rect) -> f32 {
        let intersection = self.intersection(other).map_or(0, |rect| rect.area());
        let union = self.area() + other.area() - intersection;
        if union == 0 {
            return 0.0;
        }
        intersection as f32 / union as f32
    }

    /// Returns whether the pixel at `(x, y)` lies inside of this rectangle.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x() && x <= self.x_max() && y >= self.y() && y <= self.y_max()
    }
}

fn min_max(values: impl Iterator<Item = i32>) -> Option<(i32, i32)> {
    match values.minmax() {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(v) => Some((v, v)),
        MinMaxResult::MinMax(min, max) => Some((min, max)),
    }
}

impl fmt::Debug for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y) = (self.x(), self.y());
        let (w, h) = (self.width(), self.height());
        write!(f, "Rect @ ({x},{y})-({},{})/{w}x{h}", self.x_max(), self.y_max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_center() {
        let rect = Rect::from_center(150, 150, 200, 200);
        assert_eq!(rect.x(), 50);
        assert_eq!(rect.y(), 50);
        assert_eq!(rect.x_max(), 249);
        assert_eq!(rect.center(), (150, 150));
    }

    #[test]
    fn test_intersection() {
        assert_eq!(
            Rect::from_corners((0, 0), (10, 10)).intersection(&Rect::from_corners((5, 5), (5, 5))),
            Some(Rect::from_corners((5, 5), (5, 5)))
        );
        assert_eq!(
            Rect::from_corners((5, 5), (5, 5)).intersection(&Rect::from_corners((6, 0), (10, 10))),
            None,
        );
        assert_eq!(
            Rect::from_corners((-20, -5), (20, 5)).intersection(&Rect::from_top_left(0, 0, 8, 8)),
            Some(Rect::from_corners((0, 0), (7, 5)))
        );
    }

    #[test]
    fn test_bounding() {
        assert_eq!(
            Rect::bounding([(0, 0), (1, 1), (-1, -1)]).unwrap(),
            Rect::from_corners((-1, -1), (1, 1)),
        );
        assert_eq!(
            Rect::bounding([(1, 2)]).unwrap(),
            Rect::from_corners((1, 2), (1, 2)),
        );
        assert_eq!(Rect::bounding(std::iter::empty()), None);
    }

    #[test]
    fn test_grow() {
        assert_eq!(
            Rect::from_corners((10, 10), (20, 30)).grow(5),
            Rect::from_corners((5, 5), (25, 35)),
        );
    }

    #[test]
    fn test_grow_rel() {
        assert_eq!(
            Rect::from_top_left(10, 10, 20, 10).grow_rel(0.5),
            Rect::from_top_left(0, 5, 40, 20),
        );
    }

    #[test]
    fn test_grow_to_fit_aspect() {
        // Landscape frame padded above and below.
        let frame = Rect::from_top_left(0, 0, 1280, 720);
        assert_eq!(
            frame.grow_to_fit_aspect(AspectRatio::SQUARE),
            Rect::from_top_left(0, -280, 1280, 1280),
        );
        // Portrait rectangle padded left and right.
        assert_eq!(
            Rect::from_top_left(10, 10, 10, 20).grow_to_fit_aspect(AspectRatio::SQUARE),
            Rect::from_top_left(5, 10, 20, 20),
        );
    }

    #[test]
    fn test_iou() {
        let a = Rect::from_top_left(0, 0, 10, 10);
        assert_eq!(a.iou(&a), 1.0);
        assert_eq!(a.iou(&Rect::from_top_left(10, 0, 10, 10)), 0.0);
        // 50 pixels shared out of 150 covered.
        let iou = a.iou(&Rect::from_top_left(5, 0, 10, 10));
        approx::assert_relative_eq!(iou, 1.0 / 3.0);
        assert_eq!(a.iou(&Rect::from_top_left(0, 0, 0, 0)), 0.0);
    }
}
