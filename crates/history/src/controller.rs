use std::cell::Cell;
use std::rc::Rc;

use scenery_common::{EntityId, ObjectSnapshot};
use tracing::Instrument;

use crate::capability::{
    EntityFactory, EntityLocator, HandleEditable, SceneEntity, TerrainSnapshotProvider,
};
use crate::config::HistoryConfig;
use crate::error::{EntityError, HistoryError};
use crate::record::{Action, ActionKind, ActionRecord};
use crate::stack::HistoryStack;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Undo,
    Redo,
}

/// What a single undo or redo call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The source stack was empty.
    Idle,
    /// A record was applied. `entity` is the id the opposite record targets,
    /// which differs from the recorded one after a rehydration.
    Applied {
        kind: ActionKind,
        entity: EntityId,
        skipped: usize,
    },
    /// Every record popped was an orphan; nothing was applied.
    Exhausted { skipped: usize },
}

/// Read-only view of whether an undo/redo step is in flight.
///
/// The editor's input loop keeps one of these to drop undo/redo key presses
/// while a step is suspended on rehydration or content replacement.
#[derive(Debug, Clone)]
pub struct FlightMonitor(Rc<Cell<bool>>);

impl FlightMonitor {
    /// Whether an undo or redo step is currently running.
    pub fn is_busy(&self) -> bool {
        self.0.get()
    }
}

/// Held for the duration of one step. Released on completion or when the
/// step's future is dropped.
struct FlightToken(Rc<Cell<bool>>);

impl FlightToken {
    fn acquire(flag: &Rc<Cell<bool>>) -> Result<Self, HistoryError> {
        if flag.replace(true) {
            return Err(HistoryError::Busy);
        }
        Ok(Self(Rc::clone(flag)))
    }
}

impl Drop for FlightToken {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

enum Replay {
    /// Applied; carries the record for the opposite stack.
    Done(ActionRecord),
    /// Target no longer resolves. Carries the discarded record.
    Orphaned(ActionRecord),
}

/// Linear undo/redo history for one editing session.
///
/// Callers mutate the scene first, then [`register`](Self::register) the
/// pre-mutation state. [`undo`](Self::undo) scans past records whose entity has
/// since vanished; [`redo`](Self::redo) never scans.
#[derive(Debug)]
pub struct HistoryController {
    undo_stack: HistoryStack<ActionRecord>,
    redo_stack: HistoryStack<ActionRecord>,
    /// Edits since the last successful save. Not clamped at zero.
    changes: i64,
    in_flight: Rc<Cell<bool>>,
}

impl HistoryController {
    /// Controller with the default capacity of 100 records per stack.
    pub fn new() -> Self {
        Self::with_config(&HistoryConfig::default())
    }

    /// Controller whose stacks each hold `config.capacity` records.
    pub fn with_config(config: &HistoryConfig) -> Self {
        Self {
            undo_stack: HistoryStack::with_capacity(config.capacity),
            redo_stack: HistoryStack::with_capacity(config.capacity),
            changes: 0,
            in_flight: Rc::new(Cell::new(false)),
        }
    }

    /// Record an edit that has already been applied. Clears the redo stack.
    pub fn register(&mut self, record: ActionRecord) {
        tracing::debug!(kind = %record.kind(), entity = %record.entity, "registered edit");
        if let Some(evicted) = self.undo_stack.push(record) {
            tracing::debug!(kind = %evicted.kind(), entity = %evicted.entity, "undo history full, dropped oldest record");
        }
        self.redo_stack.clear();
        self.changes += 1;
    }

    /// Shorthand for registering `action` against `entity`.
    pub fn register_action(&mut self, entity: EntityId, action: Action) {
        self.register(ActionRecord::new(entity, action));
    }

    /// Undo the most recent edit whose target can still be acted on.
    ///
    /// Orphaned records on the way are discarded. Each popped record, applied
    /// or discarded, decrements the change counter.
    pub async fn undo<S, T>(
        &mut self,
        scene: &mut S,
        terrain: &mut T,
    ) -> Result<StepOutcome, HistoryError>
    where
        S: EntityLocator + EntityFactory,
        T: TerrainSnapshotProvider,
    {
        let _flight = FlightToken::acquire(&self.in_flight)?;
        self.undo_scan(scene, terrain)
            .instrument(tracing::info_span!("undo"))
            .await
    }

    /// Redo the most recently undone edit. An orphan is discarded without effect.
    pub async fn redo<S, T>(
        &mut self,
        scene: &mut S,
        terrain: &mut T,
    ) -> Result<StepOutcome, HistoryError>
    where
        S: EntityLocator + EntityFactory,
        T: TerrainSnapshotProvider,
    {
        let _flight = FlightToken::acquire(&self.in_flight)?;
        self.redo_once(scene, terrain)
            .instrument(tracing::info_span!("redo"))
            .await
    }

    async fn undo_scan<S, T>(
        &mut self,
        scene: &mut S,
        terrain: &mut T,
    ) -> Result<StepOutcome, HistoryError>
    where
        S: EntityLocator + EntityFactory,
        T: TerrainSnapshotProvider,
    {
        let mut skipped = 0;
        while let Some(record) = self.undo_stack.pop_last() {
            self.changes -= 1;
            let kind = record.kind();
            match replay(record, Direction::Undo, scene, terrain).await? {
                Replay::Done(opposite) => {
                    let entity = opposite.entity;
                    tracing::info!(%kind, %entity, skipped, "undo");
                    self.redo_stack.push(opposite);
                    return Ok(StepOutcome::Applied {
                        kind,
                        entity,
                        skipped,
                    });
                }
                Replay::Orphaned(discarded) => {
                    tracing::debug!(%kind, entity = %discarded.entity, "skipping orphaned record");
                    skipped += 1;
                }
            }
        }
        if skipped == 0 {
            Ok(StepOutcome::Idle)
        } else {
            Ok(StepOutcome::Exhausted { skipped })
        }
    }

    async fn redo_once<S, T>(
        &mut self,
        scene: &mut S,
        terrain: &mut T,
    ) -> Result<StepOutcome, HistoryError>
    where
        S: EntityLocator + EntityFactory,
        T: TerrainSnapshotProvider,
    {
        let Some(record) = self.redo_stack.pop_last() else {
            return Ok(StepOutcome::Idle);
        };
        self.changes += 1;
        let kind = record.kind();
        match replay(record, Direction::Redo, scene, terrain).await? {
            Replay::Done(opposite) => {
                let entity = opposite.entity;
                tracing::info!(%kind, %entity, "redo");
                if let Some(evicted) = self.undo_stack.push(opposite) {
                    tracing::debug!(kind = %evicted.kind(), "undo history full, dropped oldest record");
                }
                Ok(StepOutcome::Applied {
                    kind,
                    entity,
                    skipped: 0,
                })
            }
            Replay::Orphaned(discarded) => {
                tracing::debug!(%kind, entity = %discarded.entity, "discarding orphaned redo record");
                Ok(StepOutcome::Exhausted { skipped: 1 })
            }
        }
    }

    /// Save-completed notification. A successful save resets the change counter.
    pub fn save_completed(&mut self, success: bool) {
        if success {
            self.changes = 0;
        } else {
            tracing::warn!(changes = self.changes, "save failed, keeping change count");
        }
    }

    /// Edits since the last successful save. May be negative.
    pub fn change_count(&self) -> i64 {
        self.changes
    }

    /// Whether the change counter is non-zero.
    pub fn has_unsaved_changes(&self) -> bool {
        self.changes != 0
    }

    /// Number of records on the undo stack.
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of records on the redo stack.
    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Whether the undo stack holds any record, live or orphaned.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether the redo stack holds any record.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Maximum records per stack.
    pub fn capacity(&self) -> usize {
        self.undo_stack.capacity()
    }

    /// Undo records, oldest first.
    pub fn undo_records(&self) -> impl DoubleEndedIterator<Item = &ActionRecord> {
        self.undo_stack.iter()
    }

    /// Redo records, oldest first.
    pub fn redo_records(&self) -> impl DoubleEndedIterator<Item = &ActionRecord> {
        self.redo_stack.iter()
    }

    /// Shared view of the single-flight guard.
    pub fn flight_monitor(&self) -> FlightMonitor {
        FlightMonitor(Rc::clone(&self.in_flight))
    }
}

impl Default for HistoryController {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply one record in `direction` and build the record for the opposite stack.
async fn replay<S, T>(
    record: ActionRecord,
    direction: Direction,
    scene: &mut S,
    terrain: &mut T,
) -> Result<Replay, HistoryError>
where
    S: EntityLocator + EntityFactory,
    T: TerrainSnapshotProvider,
{
    let ActionRecord { entity, action } = record;
    let kind = action.kind();
    match action {
        Action::PaintTerrain { snapshot } => {
            let current = terrain.capture_region(snapshot.rect)?;
            terrain.apply_region(&snapshot)?;
            Ok(Replay::Done(ActionRecord::paint_terrain(current)))
        }
        Action::Delete {
            snapshot: Some(snapshot),
        } if direction == Direction::Undo => {
            let id = rehydrate(scene, entity, &snapshot).await?;
            Ok(Replay::Done(ActionRecord::new(
                id,
                Action::Delete { snapshot: None },
            )))
        }
        Action::Create {
            snapshot: Some(snapshot),
        } if direction == Direction::Redo => {
            let id = rehydrate(scene, entity, &snapshot).await?;
            Ok(Replay::Done(ActionRecord::created(id)))
        }
        Action::Create { snapshot: None } | Action::Delete { snapshot: None } => {
            if !focus(scene, entity) {
                return Ok(Replay::Orphaned(ActionRecord::new(entity, action)));
            }
            let Some(target) = scene.resolve(entity) else {
                return Ok(Replay::Orphaned(ActionRecord::new(entity, action)));
            };
            let snapshot = target.snapshot();
            scene.destroy(entity);
            let opposite = match kind {
                ActionKind::Create => Action::Create {
                    snapshot: Some(snapshot),
                },
                _ => Action::Delete {
                    snapshot: Some(snapshot),
                },
            };
            Ok(Replay::Done(ActionRecord::new(entity, opposite)))
        }
        // A snapshot facing the wrong direction: its entity was never live here.
        action @ (Action::Create { .. } | Action::Delete { .. }) => {
            Ok(Replay::Orphaned(ActionRecord::new(entity, action)))
        }
        action => {
            if !focus(scene, entity) {
                return Ok(Replay::Orphaned(ActionRecord::new(entity, action)));
            }
            let Some(target) = scene.resolve(entity) else {
                return Ok(Replay::Orphaned(ActionRecord::new(entity, action)));
            };
            let opposite = swap_value(target, action, direction)
                .await
                .map_err(|source| HistoryError::Entity {
                    entity,
                    kind,
                    source,
                })?;
            Ok(Replay::Done(ActionRecord::new(entity, opposite)))
        }
    }
}

/// Select a live entity unless it already is. Returns false when it does not resolve.
fn focus<S: EntityLocator>(scene: &mut S, id: EntityId) -> bool {
    if scene.resolve(id).is_none() {
        return false;
    }
    if scene.current_selection() != Some(id) {
        scene.select(id);
    }
    true
}

async fn rehydrate<S>(
    scene: &mut S,
    entity: EntityId,
    snapshot: &ObjectSnapshot,
) -> Result<EntityId, HistoryError>
where
    S: EntityLocator + EntityFactory,
{
    let id = match scene.create(snapshot).await {
        Ok(id) => id,
        Err(source) => {
            tracing::warn!(%entity, error = %source, "rehydration failed, history step lost");
            return Err(HistoryError::Rehydration { entity, source });
        }
    };
    scene.select(id);
    tracing::debug!(old = %entity, new = %id, "rehydrated entity");
    Ok(id)
}

fn handles_of<E: SceneEntity>(target: &mut E) -> Result<&mut dyn HandleEditable, EntityError> {
    target.handles_mut().ok_or(EntityError::HandlesUnsupported)
}

/// Write the stored value onto `target` and return an action holding the value it replaced.
async fn swap_value<E: SceneEntity>(
    target: &mut E,
    action: Action,
    direction: Direction,
) -> Result<Action, EntityError> {
    match action {
        Action::Rename { name } => {
            let previous = target.name().to_string();
            target.rename(&name);
            Ok(Action::Rename { name: previous })
        }
        Action::Rotate { orientation } => {
            let previous = target.orientation();
            target.set_rotation_x(orientation.x);
            target.set_rotation_y(orientation.y);
            target.set_rotation_z(orientation.z);
            Ok(Action::Rotate {
                orientation: previous,
            })
        }
        Action::Elevate { height } => {
            let previous = target.elevation();
            target.set_elevation(height);
            Ok(Action::Elevate { height: previous })
        }
        Action::Scale { scale } => {
            let previous = target.uniform_scale();
            target.set_uniform_scale(scale);
            Ok(Action::Scale { scale: previous })
        }
        Action::ReplaceContent { binding } => {
            let previous = target.content();
            target.replace_content(&binding).await?;
            Ok(Action::ReplaceContent { binding: previous })
        }
        Action::Move { position } => {
            let previous = target.position();
            target.move_to(position);
            Ok(Action::Move { position: previous })
        }
        Action::SetOption { key, value } => {
            let previous = target.option(&key);
            target.set_option(&key, value);
            Ok(Action::SetOption {
                key,
                value: previous,
            })
        }
        Action::MoveHandle { index, position } => {
            let handles = handles_of(target)?;
            let previous =
                handles
                    .handle_position(index)
                    .ok_or(EntityError::HandleOutOfRange {
                        index,
                        count: handles.handle_count(),
                    })?;
            handles.move_handle(index, position)?;
            Ok(Action::MoveHandle {
                index,
                position: previous,
            })
        }
        Action::AddHandle { index, position } => {
            let handles = handles_of(target)?;
            let position = match direction {
                Direction::Undo => handles.remove_handle(index)?,
                Direction::Redo => {
                    handles.add_handle(index, position)?;
                    position
                }
            };
            Ok(Action::AddHandle { index, position })
        }
        Action::RemoveHandle { index, position } => {
            let handles = handles_of(target)?;
            let position = match direction {
                Direction::Undo => {
                    handles.add_handle(index, position)?;
                    position
                }
                Direction::Redo => handles.remove_handle(index)?,
            };
            Ok(Action::RemoveHandle { index, position })
        }
        Action::Create { .. } | Action::Delete { .. } | Action::PaintTerrain { .. } => {
            unreachable!("lifecycle and terrain records are replayed without a live target")
        }
    }
}
