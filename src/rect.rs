use imageproc::point::Point;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

/// An axis-aligned box in image pixel space.
///
/// Coordinates follow the image convention: `y` grows downward, so a well-formed
/// box has `left < right` and `top < bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoxRect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Center of the box, with `x` horizontal and `y` vertical.
    pub fn center(&self) -> Point<f32> {
        Point::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    /// Strict separating-axis intersection test.
    ///
    /// Boxes that only share an edge do not overlap.
    ///
    /// # Examples
    ///
    /// ```
    /// use block_sequence::rect::BoxRect;
    ///
    /// let a = BoxRect::new(0.0, 0.0, 10.0, 10.0);
    /// let b = BoxRect::new(5.0, 5.0, 15.0, 15.0);
    /// let touching = BoxRect::new(10.0, 0.0, 20.0, 10.0);
    ///
    /// assert!(a.overlaps(&b));
    /// assert!(!a.overlaps(&touching));
    /// ```
    pub fn overlaps(&self, other: &BoxRect) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.top < other.bottom
            && self.bottom > other.top
    }

    /// Smallest box containing every vertex, e.g. the corners of a rotated detection.
    ///
    /// Accepts any numeric coordinate type. Returns `None` for an empty slice or when a
    /// coordinate is not a finite `f32`.
    ///
    /// # Examples
    ///
    /// ```
    /// use block_sequence::rect::BoxRect;
    /// use imageproc::point::Point;
    ///
    /// let diamond = [
    ///     Point { x: 50, y: 10 },
    ///     Point { x: 90, y: 50 },
    ///     Point { x: 50, y: 90 },
    ///     Point { x: 10, y: 50 },
    /// ];
    ///
    /// let bbox = BoxRect::enclosing(&diamond).unwrap();
    /// assert_eq!(bbox, BoxRect::new(10.0, 10.0, 90.0, 90.0));
    /// ```
    pub fn enclosing<T>(vertices: &[Point<T>]) -> Option<BoxRect>
    where
        T: Copy + ToPrimitive,
    {
        let mut corners = vertices.iter().map(|p| {
            let (x, y) = (p.x.to_f32()?, p.y.to_f32()?);
            (x.is_finite() && y.is_finite()).then_some((x, y))
        });
        let (x, y) = corners.next()??;
        corners.try_fold(BoxRect::new(x, y, x, y), |acc, corner| {
            let (x, y) = corner?;
            Some(BoxRect::new(
                acc.left.min(x),
                acc.top.min(y),
                acc.right.max(x),
                acc.bottom.max(y),
            ))
        })
    }

    /// Converts to an `imageproc` rect for drawing, rounded to whole pixels.
    ///
    /// Degenerate boxes are widened to 1x1 since `imageproc` rects cannot be empty.
    pub fn to_pixel_rect(&self) -> imageproc::rect::Rect {
        let x = self.left.round() as i32;
        let y = self.top.round() as i32;
        let width = (self.right.round() as i32).saturating_sub(x).max(1) as u32;
        let height = (self.bottom.round() as i32).saturating_sub(y).max(1) as u32;
        imageproc::rect::Rect::at(x, y).of_size(width, height)
    }
}
