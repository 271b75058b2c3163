//! Scene kernel: the authoritative set of placed world objects.
//!
//! # Invariants
//! - Object ids are never reused; rehydrating a destroyed object allocates a new one.
//! - Only freeform areas and polygon boundaries expose handles.
//! - All lifecycle and selection changes are recorded in the scene event log.

pub mod catalog;
pub mod scene;
pub mod shapes;

pub use catalog::ContentCatalog;
pub use scene::{Scene, SceneError, SceneEvent, WorldObject, check_scale};
pub use shapes::{FreeformArea, PolygonBoundary, MIN_AREA_HANDLES};
