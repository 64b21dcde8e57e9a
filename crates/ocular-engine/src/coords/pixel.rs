/// Size of a render target or presentation surface in physical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `true` when either extent is zero; nothing can be drawn into it.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub const fn contains(self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }
}

/// Integer pixel rectangle (top-left origin, half-open).
///
/// Origin is signed so a query window may hang over the target edge before it
/// is clipped.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    #[inline]
    pub const fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Square `size × size` window whose center cell is `(cx, cy)`.
    ///
    /// `size` is expected to be odd so the center is a real cell.
    #[inline]
    pub fn centered(cx: i64, cy: i64, size: u32) -> Self {
        let half = i64::from(size / 2);
        Self::new(cx.saturating_sub(half), cy.saturating_sub(half), size, size)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersection with `[0, bounds)`; `None` when nothing overlaps.
    pub fn clip_to(self, bounds: PixelSize) -> Option<PixelRect> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = self.x.saturating_add(i64::from(self.width)).min(i64::from(bounds.width));
        let y1 = self.y.saturating_add(i64::from(self.height)).min(i64::from(bounds.height));

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(PixelRect::new(x0, y0, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_window_places_center_cell_in_the_middle() {
        let w = PixelRect::centered(50, 50, 5);
        assert_eq!(w, PixelRect::new(48, 48, 5, 5));

        let single = PixelRect::centered(7, 3, 1);
        assert_eq!(single, PixelRect::new(7, 3, 1, 1));
    }

    #[test]
    fn clip_keeps_interior_windows_untouched() {
        let w = PixelRect::new(10, 10, 3, 3);
        assert_eq!(w.clip_to(PixelSize::new(100, 100)), Some(w));
    }

    #[test]
    fn clip_trims_windows_hanging_over_the_corner() {
        let w = PixelRect::centered(0, 0, 5);
        assert_eq!(w.clip_to(PixelSize::new(100, 100)), Some(PixelRect::new(0, 0, 3, 3)));

        let w = PixelRect::centered(99, 99, 5);
        assert_eq!(w.clip_to(PixelSize::new(100, 100)), Some(PixelRect::new(97, 97, 3, 3)));
    }

    #[test]
    fn clip_outside_returns_none() {
        let w = PixelRect::new(200, 5, 3, 3);
        assert_eq!(w.clip_to(PixelSize::new(100, 100)), None);
    }

    #[test]
    fn clip_bounds_windows_wider_than_the_target() {
        let w = PixelRect::centered(50, 50, u32::MAX);
        assert_eq!(w.clip_to(PixelSize::new(100, 100)), Some(PixelRect::new(0, 0, 100, 100)));

        let far = PixelRect::centered(i64::MAX, i64::MIN, 9);
        assert_eq!(far.clip_to(PixelSize::new(100, 100)), None);
    }

    #[test]
    fn size_containment() {
        let s = PixelSize::new(4, 2);
        assert!(s.contains(0, 0));
        assert!(s.contains(3, 1));
        assert!(!s.contains(4, 1));
        assert!(!s.contains(-1, 0));
        assert!(PixelSize::new(0, 3).is_empty());
    }
}
