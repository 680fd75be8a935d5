//! Axis-aligned rectangles in pixel space

use glam::Vec2;

/// Pixel-space rectangle (origin + extent)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rect anchored at the origin
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Zero-size rect at a point
    pub fn empty_at(point: Vec2) -> Self {
        Self::new(point.x, point.y, 0.0, 0.0)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// True if the rect covers no area (also for NaN extents)
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Get aspect ratio (width / height)
    pub fn aspect_ratio(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// Overlap of two rects. Disjoint rects yield a zero-size rect inside `other`.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.top().min(other.top());

        if x1 <= x0 || y1 <= y0 {
            let px = x0.clamp(other.x, other.right().max(other.x));
            let py = y0.clamp(other.y, other.top().max(other.y));
            return Rect::empty_at(Vec2::new(px, py));
        }

        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Largest rect with this aspect ratio centered inside `target`
    pub fn fit_into(&self, target: &Rect) -> Rect {
        if self.is_empty() || target.is_empty() {
            return Rect::empty_at(target.center());
        }

        let scale = (target.width / self.width).min(target.height / self.height);
        let width = self.width * scale;
        let height = self.height * scale;

        Rect::new(
            target.x + (target.width - width) * 0.5,
            target.y + (target.height - height) * 0.5,
            width,
            height,
        )
    }

    /// Does `other` lie fully inside this rect
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x && other.y >= self.y && other.right() <= self.right() && other.top() <= self.top()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersect_overlapping() {
        let a = Rect::new(-10.0, 20.0, 100.0, 100.0);
        let b = Rect::from_size(50.0, 80.0);
        assert_eq!(a.intersect(&b), Rect::new(0.0, 20.0, 50.0, 60.0));
    }

    #[test]
    fn test_intersect_disjoint_is_empty_inside_bounds() {
        let a = Rect::new(500.0, 500.0, 10.0, 10.0);
        let b = Rect::from_size(100.0, 100.0);
        let r = a.intersect(&b);
        assert!(r.is_empty());
        assert!(b.contains_rect(&r));
    }

    #[test]
    fn test_fit_wide_into_4_3() {
        let image = Rect::from_size(1920.0, 1080.0);
        let viewport = Rect::from_size(640.0, 480.0);
        let fitted = image.fit_into(&viewport);
        assert_eq!(fitted, Rect::new(0.0, 60.0, 640.0, 360.0));
    }

    #[test]
    fn test_fit_tall_into_wide() {
        let image = Rect::from_size(100.0, 200.0);
        let viewport = Rect::new(10.0, 0.0, 400.0, 100.0);
        let fitted = image.fit_into(&viewport);
        assert_eq!(fitted, Rect::new(185.0, 0.0, 50.0, 100.0));
    }

    #[test]
    fn test_fit_degenerate() {
        let image = Rect::from_size(0.0, 1080.0);
        let viewport = Rect::from_size(640.0, 480.0);
        let fitted = image.fit_into(&viewport);
        assert!(fitted.is_empty());
        assert_eq!(fitted.origin(), Vec2::new(320.0, 240.0));
    }
}
