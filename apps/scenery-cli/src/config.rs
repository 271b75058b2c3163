use anyhow::Context;
use scenery_common::ContentRef;
use scenery_history::HistoryConfig;
use scenery_kernel::ContentCatalog;
use scenery_terrain::TerrainConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Session configuration, loaded from YAML.
///
/// ```yaml
/// history:
///   capacity: 100
/// terrain:
///   width: 64
///   height: 64
///   layers: [height, grass, rock]
/// content: [forest/oak, forest/pine]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub history: HistoryConfig,
    pub terrain: TerrainConfig,
    /// Known content. Empty accepts any reference.
    pub content: Vec<ContentRef>,
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.history.validate()?;
        Ok(config)
    }

    pub fn catalog(&self) -> ContentCatalog {
        if self.content.is_empty() {
            ContentCatalog::open()
        } else {
            ContentCatalog::from_refs(self.content.iter().cloned())
        }
    }
}
