use scenery_common::{LayerId, LayerRegion, RasterSnapshot, RegionRect};
use scenery_history::{RasterError, TerrainSnapshotProvider};
use serde::{Deserialize, Serialize};

/// Terrain dimensions and layer names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub width: u32,
    pub height: u32,
    pub layers: Vec<String>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            layers: vec!["height".into(), "grass".into(), "rock".into()],
        }
    }
}

/// Errors from constructing or painting a terrain raster.
#[derive(Debug, thiserror::Error)]
pub enum TerrainError {
    #[error("terrain must be at least 1x1, got {width}x{height}")]
    EmptyRaster { width: u32, height: u32 },
    #[error("terrain needs at least one layer")]
    NoLayers,
    #[error("too many layers: {0}")]
    TooManyLayers(usize),
    #[error("unknown layer {0:?}")]
    UnknownLayer(String),
    #[error(transparent)]
    Raster(#[from] RasterError),
}

#[derive(Debug, Clone)]
struct Layer {
    name: String,
    samples: Vec<f32>,
}

/// A stack of same-sized sample layers.
#[derive(Debug, Clone)]
pub struct TerrainRaster {
    width: u32,
    height: u32,
    layers: Vec<Layer>,
}

impl TerrainRaster {
    pub fn new(config: &TerrainConfig) -> Result<Self, TerrainError> {
        if config.width == 0 || config.height == 0 {
            return Err(TerrainError::EmptyRaster {
                width: config.width,
                height: config.height,
            });
        }
        if config.layers.is_empty() {
            return Err(TerrainError::NoLayers);
        }
        if config.layers.len() > u16::MAX as usize {
            return Err(TerrainError::TooManyLayers(config.layers.len()));
        }
        let cells = config.width as usize * config.height as usize;
        let layers = config
            .layers
            .iter()
            .map(|name| Layer {
                name: name.clone(),
                samples: vec![0.0; cells],
            })
            .collect();
        Ok(Self {
            width: config.width,
            height: config.height,
            layers,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer_id(&self, name: &str) -> Option<LayerId> {
        self.layers
            .iter()
            .position(|l| l.name == name)
            .map(|i| LayerId(i as u16))
    }

    pub fn layer_name(&self, layer: LayerId) -> Option<&str> {
        self.layers.get(layer.0 as usize).map(|l| l.name.as_str())
    }

    pub fn sample(&self, layer: LayerId, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.layers
            .get(layer.0 as usize)
            .map(|l| l.samples[self.index(x, y)])
    }

    /// Full contents of one layer, row-major.
    pub fn layer_samples(&self, layer: LayerId) -> Option<&[f32]> {
        self.layers.get(layer.0 as usize).map(|l| l.samples.as_slice())
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Fill `rect` on one layer with `value`.
    ///
    /// Returns the pre-paint state of the clipped rect across all layers, ready
    /// to be registered as a paint record.
    pub fn paint(
        &mut self,
        layer: &str,
        rect: RegionRect,
        value: f32,
    ) -> Result<RasterSnapshot, TerrainError> {
        let id = self
            .layer_id(layer)
            .ok_or_else(|| TerrainError::UnknownLayer(layer.to_string()))?;
        let before = self.capture_region(rect)?;
        let rect = before.rect;
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                let i = self.index(x, y);
                self.layers[id.0 as usize].samples[i] = value;
            }
        }
        tracing::debug!(layer, ?rect, value, "painted terrain");
        Ok(before)
    }
}

impl TerrainSnapshotProvider for TerrainRaster {
    /// Captures every layer. The rect is clipped to the raster first.
    fn capture_region(&self, rect: RegionRect) -> Result<RasterSnapshot, RasterError> {
        let clipped = rect.clamp_to(self.width, self.height);
        if clipped.is_empty() && !rect.is_empty() {
            return Err(RasterError::OutOfBounds(rect));
        }
        let layers = self
            .layers
            .iter()
            .enumerate()
            .map(|(i, layer)| {
                let mut samples = Vec::with_capacity(clipped.area());
                for y in clipped.y..clipped.y + clipped.height {
                    let row = self.index(clipped.x, y);
                    samples.extend_from_slice(&layer.samples[row..row + clipped.width as usize]);
                }
                LayerRegion {
                    layer: LayerId(i as u16),
                    samples,
                }
            })
            .collect();
        Ok(RasterSnapshot {
            rect: clipped,
            layers,
        })
    }

    /// Validates the whole snapshot before writing anything.
    fn apply_region(&mut self, snapshot: &RasterSnapshot) -> Result<(), RasterError> {
        let rect = snapshot.rect;
        if rect.clamp_to(self.width, self.height) != rect {
            return Err(RasterError::OutOfBounds(rect));
        }
        if !snapshot.is_well_formed() {
            return Err(RasterError::Malformed(rect));
        }
        if let Some(bad) = snapshot
            .layers
            .iter()
            .find(|l| l.layer.0 as usize >= self.layers.len())
        {
            return Err(RasterError::UnknownLayer(bad.layer.0));
        }
        let width = rect.width as usize;
        for region in &snapshot.layers {
            for (row, y) in (rect.y..rect.y + rect.height).enumerate() {
                let dst = self.index(rect.x, y);
                let src = row * width;
                self.layers[region.layer.0 as usize].samples[dst..dst + width]
                    .copy_from_slice(&region.samples[src..src + width]);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenery_history::{ActionRecord, HistoryController, StepOutcome};
    use scenery_kernel::Scene;

    fn small() -> TerrainRaster {
        TerrainRaster::new(&TerrainConfig {
            width: 16,
            height: 12,
            layers: vec!["height".into(), "grass".into()],
        })
        .unwrap()
    }

    fn bits(raster: &TerrainRaster) -> Vec<Vec<u32>> {
        (0..raster.layer_count())
            .map(|i| {
                raster
                    .layer_samples(LayerId(i as u16))
                    .unwrap()
                    .iter()
                    .map(|f| f.to_bits())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn default_config_has_three_layers() {
        let raster = TerrainRaster::new(&TerrainConfig::default()).unwrap();
        assert_eq!(raster.layer_count(), 3);
        assert_eq!(raster.layer_id("rock"), Some(LayerId(2)));
        assert_eq!(raster.layer_name(LayerId(1)), Some("grass"));
    }

    #[test]
    fn rejects_degenerate_configs() {
        let cfg = TerrainConfig {
            width: 0,
            ..TerrainConfig::default()
        };
        assert!(matches!(
            TerrainRaster::new(&cfg),
            Err(TerrainError::EmptyRaster { .. })
        ));
        let cfg = TerrainConfig {
            layers: Vec::new(),
            ..TerrainConfig::default()
        };
        assert!(matches!(TerrainRaster::new(&cfg), Err(TerrainError::NoLayers)));
    }

    #[test]
    fn paint_returns_pre_state_and_fills_rect() {
        let mut raster = small();
        let rect = RegionRect::new(2, 3, 4, 2);
        let before = raster.paint("grass", rect, 0.75).unwrap();
        assert_eq!(before.rect, rect);
        assert_eq!(before.layers.len(), 2);
        assert!(before.layers.iter().all(|l| l.samples.iter().all(|s| *s == 0.0)));

        let grass = raster.layer_id("grass").unwrap();
        assert_eq!(raster.sample(grass, 2, 3), Some(0.75));
        assert_eq!(raster.sample(grass, 5, 4), Some(0.75));
        assert_eq!(raster.sample(grass, 6, 4), Some(0.0));
        assert_eq!(raster.sample(LayerId(0), 2, 3), Some(0.0));
    }

    #[test]
    fn paint_unknown_layer_fails() {
        let mut raster = small();
        assert!(matches!(
            raster.paint("snow", RegionRect::new(0, 0, 1, 1), 1.0),
            Err(TerrainError::UnknownLayer(_))
        ));
    }

    #[test]
    fn capture_clips_to_bounds() {
        let raster = small();
        let snap = raster.capture_region(RegionRect::new(14, 10, 5, 5)).unwrap();
        assert_eq!(snap.rect, RegionRect::new(14, 10, 2, 2));
        assert!(snap.is_well_formed());
        assert!(matches!(
            raster.capture_region(RegionRect::new(40, 40, 2, 2)),
            Err(RasterError::OutOfBounds(_))
        ));
    }

    #[test]
    fn apply_rejects_malformed_snapshots_without_writing() {
        let mut raster = small();
        let mut snap = raster.capture_region(RegionRect::new(0, 0, 2, 2)).unwrap();
        snap.layers[0].samples = vec![9.0; 4];
        snap.layers[1].samples.pop();
        let before = bits(&raster);
        assert!(matches!(
            raster.apply_region(&snap),
            Err(RasterError::Malformed(_))
        ));
        assert_eq!(bits(&raster), before);

        let outside = RasterSnapshot {
            rect: RegionRect::new(15, 0, 2, 1),
            layers: Vec::new(),
        };
        assert!(matches!(
            raster.apply_region(&outside),
            Err(RasterError::OutOfBounds(_))
        ));
    }

    #[test]
    fn paint_undo_redo_only_touches_rect() {
        let mut raster = small();
        raster.paint("height", RegionRect::new(0, 0, 16, 12), 1.5).unwrap();
        let original = bits(&raster);

        let mut scene = Scene::new();
        let mut history = HistoryController::new();
        let rect = RegionRect::new(3, 4, 5, 3);
        let before = raster.paint("grass", rect, 0.5).unwrap();
        history.register(ActionRecord::paint_terrain(before));
        let painted = bits(&raster);

        let outcome = pollster::block_on(history.undo(&mut scene, &mut raster)).unwrap();
        assert!(matches!(outcome, StepOutcome::Applied { .. }));
        assert_eq!(bits(&raster), original);

        pollster::block_on(history.redo(&mut scene, &mut raster)).unwrap();
        assert_eq!(bits(&raster), painted);

        let w = raster.width();
        for (layer, samples) in bits(&raster).iter().enumerate() {
            for (i, s) in samples.iter().enumerate() {
                let (x, y) = (i as u32 % w, i as u32 / w);
                if !rect.contains(x, y) {
                    assert_eq!(*s, original[layer][i], "cell ({x},{y}) changed");
                }
            }
        }
    }
}
