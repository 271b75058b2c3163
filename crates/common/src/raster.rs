use serde::{Deserialize, Serialize};

/// Index of a layer within a terrain raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub u16);

/// Axis-aligned rectangle of raster cells, `[x, x + width) x [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RegionRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RegionRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Number of cells covered.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x
            && y >= self.y
            && (x - self.x) < self.width
            && (y - self.y) < self.height
    }

    /// Clip against a `width x height` raster. Returns an empty rect when fully outside.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let x0 = self.x.min(width);
        let y0 = self.y.min(height);
        let x1 = self.x.saturating_add(self.width).min(width);
        let y1 = self.y.saturating_add(self.height).min(height);
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }
}

/// Row-major samples of one layer over a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRegion {
    pub layer: LayerId,
    pub samples: Vec<f32>,
}

/// Captured contents of a rectangle across a set of layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterSnapshot {
    pub rect: RegionRect,
    pub layers: Vec<LayerRegion>,
}

impl RasterSnapshot {
    /// Whether every layer holds exactly one sample per cell of `rect`.
    pub fn is_well_formed(&self) -> bool {
        let area = self.rect.area();
        self.layers.iter().all(|l| l.samples.len() == area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_clips_to_bounds() {
        let r = RegionRect::new(60, 10, 10, 4).clamp_to(64, 64);
        assert_eq!(r, RegionRect::new(60, 10, 4, 4));
        assert!(RegionRect::new(100, 100, 5, 5).clamp_to(64, 64).is_empty());
    }

    #[test]
    fn contains_is_half_open() {
        let r = RegionRect::new(2, 2, 3, 3);
        assert!(r.contains(2, 2));
        assert!(r.contains(4, 4));
        assert!(!r.contains(5, 4));
        assert!(!r.contains(1, 3));
    }

    #[test]
    fn well_formed_checks_sample_counts() {
        let mut snap = RasterSnapshot {
            rect: RegionRect::new(0, 0, 2, 2),
            layers: vec![LayerRegion {
                layer: LayerId(0),
                samples: vec![0.0; 4],
            }],
        };
        assert!(snap.is_well_formed());
        snap.layers[0].samples.pop();
        assert!(!snap.is_well_formed());
    }
}
