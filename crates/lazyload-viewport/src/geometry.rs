//! Rectangles and the pre-trigger margin

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Rect {
    /// Create rectangle
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge
    #[inline]
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Zero or negative area
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Grow (or shrink, for negative margins) on every side
    #[must_use]
    pub fn expand(&self, margin: RootMargin) -> Self {
        let m = margin.px();
        Self {
            x: self.x - m,
            y: self.y - m,
            width: (self.width + 2.0 * m).max(0.0),
            height: (self.height + 2.0 * m).max(0.0),
        }
    }

    /// Overlap test; touching edges count as overlapping
    ///
    /// An empty rectangle never overlaps anything.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }
}

/// Distance around the viewport that already counts as visible
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootMargin(f64);

impl RootMargin {
    /// Margin used when none is configured
    pub const DEFAULT_PX: f64 = 50.0;

    /// Create margin; non-finite values fall back to zero
    #[inline]
    #[must_use]
    pub fn new(px: f64) -> Self {
        if px.is_finite() {
            Self(px)
        } else {
            Self(0.0)
        }
    }

    /// Margin in pixels
    #[inline]
    #[must_use]
    pub fn px(self) -> f64 {
        self.0
    }
}

impl Default for RootMargin {
    fn default() -> Self {
        Self(Self::DEFAULT_PX)
    }
}

impl From<&lazyload_core::LoaderConfig> for RootMargin {
    fn from(config: &lazyload_core::LoaderConfig) -> Self {
        Self::new(config.root_margin_px)
    }
}
