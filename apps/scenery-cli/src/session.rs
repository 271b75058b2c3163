use glam::Vec3;
use scenery_common::{ContentBinding, EntityId, ObjectSnapshot, OptionValue, Orientation, RegionRect};
use scenery_history::{
    Action, ActionRecord, EntityError, HistoryController, HistoryError, SceneEntity, StepOutcome,
};
use scenery_kernel::{Scene, SceneError, WorldObject, check_scale};
use scenery_terrain::{TerrainError, TerrainRaster};
use std::fmt;

use crate::config::AppConfig;

/// Errors from editor commands.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Entity(#[from] EntityError),
    #[error(transparent)]
    Terrain(#[from] TerrainError),
    #[error(transparent)]
    History(#[from] HistoryError),
}

/// One editing session: the scene, its terrain, and their shared history.
///
/// Every command mutates first and then registers the state it replaced.
pub struct EditorSession {
    pub scene: Scene,
    pub terrain: TerrainRaster,
    pub history: HistoryController,
}

impl EditorSession {
    pub fn new(config: &AppConfig) -> Result<Self, SessionError> {
        Ok(Self {
            scene: Scene::with_catalog(config.catalog()),
            terrain: TerrainRaster::new(&config.terrain)?,
            history: HistoryController::with_config(&config.history),
        })
    }

    fn object(&mut self, id: EntityId) -> Result<&mut WorldObject, SessionError> {
        self.scene
            .get_mut(id)
            .ok_or(SessionError::Scene(SceneError::EntityNotFound(id)))
    }

    pub fn spawn(&mut self, snapshot: &ObjectSnapshot) -> Result<EntityId, SessionError> {
        let id = self.scene.spawn(snapshot)?;
        self.history.register(ActionRecord::created(id));
        Ok(id)
    }

    pub fn delete(&mut self, id: EntityId) -> Result<(), SessionError> {
        let snapshot = self
            .scene
            .despawn(id)
            .ok_or(SceneError::EntityNotFound(id))?;
        self.history.register(ActionRecord::deleted(id, snapshot));
        Ok(())
    }

    pub fn rename(&mut self, id: EntityId, name: &str) -> Result<(), SessionError> {
        let object = self.object(id)?;
        let previous = object.name().to_string();
        object.rename(name);
        self.history
            .register_action(id, Action::Rename { name: previous });
        Ok(())
    }

    pub fn rotate(&mut self, id: EntityId, orientation: Orientation) -> Result<(), SessionError> {
        let object = self.object(id)?;
        let previous = object.orientation();
        object.set_rotation_x(orientation.x);
        object.set_rotation_y(orientation.y);
        object.set_rotation_z(orientation.z);
        self.history.register_action(
            id,
            Action::Rotate {
                orientation: previous,
            },
        );
        Ok(())
    }

    pub fn elevate(&mut self, id: EntityId, height: f32) -> Result<(), SessionError> {
        let object = self.object(id)?;
        let previous = object.elevation();
        object.set_elevation(height);
        self.history
            .register_action(id, Action::Elevate { height: previous });
        Ok(())
    }

    pub fn scale(&mut self, id: EntityId, scale: f32) -> Result<(), SessionError> {
        check_scale(scale)?;
        let object = self.object(id)?;
        let previous = object.uniform_scale();
        object.set_uniform_scale(scale);
        self.history
            .register_action(id, Action::Scale { scale: previous });
        Ok(())
    }

    pub fn move_to(&mut self, id: EntityId, position: Vec3) -> Result<(), SessionError> {
        let object = self.object(id)?;
        let previous = object.position();
        object.move_to(position);
        self.history
            .register_action(id, Action::Move { position: previous });
        Ok(())
    }

    pub async fn replace_content(
        &mut self,
        id: EntityId,
        binding: &ContentBinding,
    ) -> Result<(), SessionError> {
        let object = self.object(id)?;
        let previous = object.content();
        object.replace_content(binding).await?;
        self.history
            .register_action(id, Action::ReplaceContent { binding: previous });
        Ok(())
    }

    pub fn set_option(
        &mut self,
        id: EntityId,
        key: &str,
        value: Option<OptionValue>,
    ) -> Result<(), SessionError> {
        let object = self.object(id)?;
        let previous = object.option(key);
        object.set_option(key, value);
        self.history.register_action(
            id,
            Action::SetOption {
                key: key.to_string(),
                value: previous,
            },
        );
        Ok(())
    }

    pub fn add_handle(
        &mut self,
        id: EntityId,
        index: usize,
        position: Vec3,
    ) -> Result<(), SessionError> {
        let handles = self
            .object(id)?
            .handles_mut()
            .ok_or(EntityError::HandlesUnsupported)?;
        handles.add_handle(index, position)?;
        self.history
            .register_action(id, Action::AddHandle { index, position });
        Ok(())
    }

    pub fn remove_handle(&mut self, id: EntityId, index: usize) -> Result<(), SessionError> {
        let handles = self
            .object(id)?
            .handles_mut()
            .ok_or(EntityError::HandlesUnsupported)?;
        let position = handles.remove_handle(index)?;
        self.history
            .register_action(id, Action::RemoveHandle { index, position });
        Ok(())
    }

    pub fn move_handle(
        &mut self,
        id: EntityId,
        index: usize,
        position: Vec3,
    ) -> Result<(), SessionError> {
        let handles = self
            .object(id)?
            .handles_mut()
            .ok_or(EntityError::HandlesUnsupported)?;
        let previous = handles
            .handle_position(index)
            .ok_or_else(|| EntityError::HandleOutOfRange {
                index,
                count: handles.handle_count(),
            })?;
        handles.move_handle(index, position)?;
        self.history.register_action(
            id,
            Action::MoveHandle {
                index,
                position: previous,
            },
        );
        Ok(())
    }

    pub fn paint(&mut self, layer: &str, rect: RegionRect, value: f32) -> Result<(), SessionError> {
        let before = self.terrain.paint(layer, rect, value)?;
        self.history.register(ActionRecord::paint_terrain(before));
        Ok(())
    }

    pub async fn undo(&mut self) -> Result<StepOutcome, SessionError> {
        Ok(self.history.undo(&mut self.scene, &mut self.terrain).await?)
    }

    pub async fn redo(&mut self) -> Result<StepOutcome, SessionError> {
        Ok(self.history.redo(&mut self.scene, &mut self.terrain).await?)
    }

    pub fn save_completed(&mut self, success: bool) {
        self.history.save_completed(success);
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            objects: self.scene.entity_count(),
            selection: self.scene.selection(),
            undo: self.history.undo_len(),
            redo: self.history.redo_len(),
            changes: self.history.change_count(),
        }
    }
}

/// Snapshot of session state for printing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub objects: usize,
    pub selection: Option<EntityId>,
    pub undo: usize,
    pub redo: usize,
    pub changes: i64,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "objects={} undo={} redo={} changes={}",
            self.objects, self.undo, self.redo, self.changes
        )?;
        if let Some(id) = self.selection {
            write!(f, " selected={id}")?;
        }
        Ok(())
    }
}
