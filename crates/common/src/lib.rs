//! Shared types for the scenery editor: entity ids, object snapshots and raster regions.

pub mod raster;
pub mod types;

pub use raster::{LayerId, LayerRegion, RasterSnapshot, RegionRect};
pub use types::{
    ContentBinding, ContentRef, ContentRefError, EntityId, ObjectSnapshot, OptionValue,
    Orientation, ShapeKind,
};
