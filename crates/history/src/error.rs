use scenery_common::{ContentRef, EntityId, RegionRect};

use crate::record::ActionKind;

/// Failures reported by an entity's capability surface or by the factory.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EntityError {
    #[error("handle index {index} out of range (handle count {count})")]
    HandleOutOfRange { index: usize, count: usize },
    #[error("entity has no editable handles")]
    HandlesUnsupported,
    #[error("shape must keep at least {min} handles")]
    TooFewHandles { min: usize },
    #[error("scale {0} must be finite and positive")]
    InvalidScale(f32),
    #[error("unknown content {0}")]
    UnknownContent(ContentRef),
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Failures reported by a terrain snapshot provider.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RasterError {
    #[error("region {0:?} lies outside the raster")]
    OutOfBounds(RegionRect),
    #[error("snapshot samples do not match region {0:?}")]
    Malformed(RegionRect),
    #[error("unknown layer {0}")]
    UnknownLayer(u16),
}

/// Errors from undo/redo. The record that triggered the error has already been
/// removed from its stack and is not restored.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("another undo/redo step is still in flight")]
    Busy,
    #[error("failed to rehydrate entity {entity}")]
    Rehydration {
        entity: EntityId,
        #[source]
        source: EntityError,
    },
    #[error("{kind} on entity {entity} failed")]
    Entity {
        entity: EntityId,
        kind: ActionKind,
        #[source]
        source: EntityError,
    },
    #[error("terrain region swap failed")]
    Terrain(#[from] RasterError),
}

/// Errors from validating a [`crate::HistoryConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("history capacity must be at least 1")]
    ZeroCapacity,
}
