//! The surfaces history replays edits through. The scene and terrain
//! implementations live outside this crate.

use glam::Vec3;
use scenery_common::{
    ContentBinding, EntityId, ObjectSnapshot, OptionValue, Orientation, RasterSnapshot,
    RegionRect,
};

use crate::error::{EntityError, RasterError};

/// Editable handles (vertices or control points) of area-like shapes.
pub trait HandleEditable {
    fn handle_count(&self) -> usize;

    fn handle_position(&self, index: usize) -> Option<Vec3>;

    /// Insert a handle so that it ends up at `index`. `index == handle_count()` appends.
    fn add_handle(&mut self, index: usize, position: Vec3) -> Result<(), EntityError>;

    /// Remove the handle at `index`, returning where it was.
    fn remove_handle(&mut self, index: usize) -> Result<Vec3, EntityError>;

    fn move_handle(&mut self, index: usize, position: Vec3) -> Result<(), EntityError>;
}

/// What history needs from a live entity.
#[allow(async_fn_in_trait)]
pub trait SceneEntity {
    fn id(&self) -> EntityId;

    /// Full state, sufficient for [`EntityFactory::create`] to rebuild the entity.
    fn snapshot(&self) -> ObjectSnapshot;

    fn name(&self) -> &str;
    fn rename(&mut self, name: &str);

    fn orientation(&self) -> Orientation;
    fn set_rotation_x(&mut self, degrees: f32);
    fn set_rotation_y(&mut self, degrees: f32);
    fn set_rotation_z(&mut self, degrees: f32);

    fn elevation(&self) -> f32;
    fn set_elevation(&mut self, height: f32);

    fn uniform_scale(&self) -> f32;
    fn set_uniform_scale(&mut self, scale: f32);

    fn content(&self) -> ContentBinding;
    /// May suspend while the new content is fetched.
    async fn replace_content(&mut self, binding: &ContentBinding) -> Result<(), EntityError>;

    fn position(&self) -> Vec3;
    fn move_to(&mut self, position: Vec3);

    fn option(&self, key: &str) -> Option<OptionValue>;
    /// `None` clears the option.
    fn set_option(&mut self, key: &str, value: Option<OptionValue>);

    /// Handle surface, for shapes that have one.
    fn handles_mut(&mut self) -> Option<&mut dyn HandleEditable>;
}

/// Resolves ids to live entities and owns the editor selection.
pub trait EntityLocator {
    type Entity: SceneEntity;

    fn resolve(&mut self, id: EntityId) -> Option<&mut Self::Entity>;

    fn current_selection(&self) -> Option<EntityId>;

    fn select(&mut self, id: EntityId);
}

/// Creates and destroys whole entities.
#[allow(async_fn_in_trait)]
pub trait EntityFactory {
    /// Rebuild an entity from a snapshot. Always allocates a fresh id.
    async fn create(&mut self, snapshot: &ObjectSnapshot) -> Result<EntityId, EntityError>;

    /// Returns whether the entity existed.
    fn destroy(&mut self, id: EntityId) -> bool;
}

/// Captures and restores rectangular regions of a layered raster.
pub trait TerrainSnapshotProvider {
    fn capture_region(&self, rect: RegionRect) -> Result<RasterSnapshot, RasterError>;

    fn apply_region(&mut self, snapshot: &RasterSnapshot) -> Result<(), RasterError>;
}
