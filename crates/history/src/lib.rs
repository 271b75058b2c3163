//! Linear undo/redo history for the scene editor.
//!
//! Editor commands mutate the scene and then register the pre-mutation state
//! as an [`ActionRecord`]. The [`HistoryController`] replays those records
//! backwards and forwards through the capability traits in [`capability`].
//!
//! # Invariants
//! - Registering an edit clears the redo stack.
//! - Each stack holds at most `capacity` records; the oldest are evicted.
//! - A record is consumed exactly once, or discarded.
//! - At most one undo/redo step is in flight at a time.

pub mod capability;
pub mod config;
pub mod controller;
pub mod error;
pub mod record;
pub mod stack;

pub use capability::{
    EntityFactory, EntityLocator, HandleEditable, SceneEntity, TerrainSnapshotProvider,
};
pub use config::HistoryConfig;
pub use controller::{FlightMonitor, HistoryController, StepOutcome};
pub use error::{ConfigError, EntityError, HistoryError, RasterError};
pub use record::{Action, ActionKind, ActionRecord};
pub use stack::{DEFAULT_CAPACITY, HistoryStack};
