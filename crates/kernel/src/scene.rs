use glam::Vec3;
use scenery_common::{
    ContentBinding, EntityId, ObjectSnapshot, OptionValue, Orientation, ShapeKind,
};
use scenery_history::{EntityError, EntityFactory, EntityLocator, HandleEditable, SceneEntity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::catalog::ContentCatalog;
use crate::shapes::{FreeformArea, MIN_AREA_HANDLES, PolygonBoundary};

/// Lifecycle and selection changes, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SceneEvent {
    Spawned { id: EntityId },
    Destroyed { id: EntityId },
    Selected { id: EntityId },
    Deselected { id: EntityId },
}

/// Errors from direct scene edits.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
    #[error(transparent)]
    Entity(#[from] EntityError),
}

#[derive(Debug, Clone, PartialEq)]
enum Body {
    Prop,
    Freeform(FreeformArea),
    Polygon(PolygonBoundary),
}

/// Uniform scale an object may hold: finite and above zero.
pub fn check_scale(scale: f32) -> Result<(), EntityError> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(EntityError::InvalidScale(scale));
    }
    Ok(())
}

/// A placed object in the scene.
#[derive(Debug, Clone)]
pub struct WorldObject {
    id: EntityId,
    name: String,
    position: Vec3,
    orientation: Orientation,
    elevation: f32,
    scale: f32,
    content: ContentBinding,
    options: BTreeMap<String, OptionValue>,
    body: Body,
    catalog: Rc<ContentCatalog>,
}

impl WorldObject {
    fn from_snapshot(id: EntityId, snapshot: &ObjectSnapshot, catalog: Rc<ContentCatalog>) -> Self {
        let body = match snapshot.shape {
            ShapeKind::Prop => Body::Prop,
            ShapeKind::FreeformArea => Body::Freeform(FreeformArea::new(snapshot.handles.clone())),
            ShapeKind::PolygonBoundary => {
                Body::Polygon(PolygonBoundary::new(snapshot.handles.clone()))
            }
        };
        Self {
            id,
            name: snapshot.name.clone(),
            position: snapshot.position,
            orientation: snapshot.orientation,
            elevation: snapshot.elevation,
            scale: snapshot.scale,
            content: snapshot.content.clone(),
            options: snapshot.options.clone(),
            body,
            catalog,
        }
    }

    /// Shape kind, derived from the object's body.
    pub fn shape(&self) -> ShapeKind {
        match self.body {
            Body::Prop => ShapeKind::Prop,
            Body::Freeform(_) => ShapeKind::FreeformArea,
            Body::Polygon(_) => ShapeKind::PolygonBoundary,
        }
    }

    /// Handle positions in order. Empty for props.
    pub fn handles(&self) -> &[Vec3] {
        match &self.body {
            Body::Prop => &[],
            Body::Freeform(area) => area.points(),
            Body::Polygon(boundary) => boundary.vertices(),
        }
    }

    /// All options currently set on the object.
    pub fn options(&self) -> &BTreeMap<String, OptionValue> {
        &self.options
    }
}

impl SceneEntity for WorldObject {
    fn id(&self) -> EntityId {
        self.id
    }

    fn snapshot(&self) -> ObjectSnapshot {
        ObjectSnapshot {
            shape: self.shape(),
            name: self.name.clone(),
            position: self.position,
            orientation: self.orientation,
            elevation: self.elevation,
            scale: self.scale,
            content: self.content.clone(),
            options: self.options.clone(),
            handles: self.handles().to_vec(),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn rename(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn orientation(&self) -> Orientation {
        self.orientation
    }

    fn set_rotation_x(&mut self, degrees: f32) {
        self.orientation.x = degrees;
    }

    fn set_rotation_y(&mut self, degrees: f32) {
        self.orientation.y = degrees;
    }

    fn set_rotation_z(&mut self, degrees: f32) {
        self.orientation.z = degrees;
    }

    fn elevation(&self) -> f32 {
        self.elevation
    }

    fn set_elevation(&mut self, height: f32) {
        self.elevation = height;
    }

    fn uniform_scale(&self) -> f32 {
        self.scale
    }

    fn set_uniform_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    fn content(&self) -> ContentBinding {
        self.content.clone()
    }

    async fn replace_content(&mut self, binding: &ContentBinding) -> Result<(), EntityError> {
        if !self.catalog.contains(&binding.content) {
            return Err(EntityError::UnknownContent(binding.content.clone()));
        }
        tracing::debug!(id = %self.id, content = %binding.content, "replacing content");
        self.content = binding.clone();
        Ok(())
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn move_to(&mut self, position: Vec3) {
        self.position = position;
    }

    fn option(&self, key: &str) -> Option<OptionValue> {
        self.options.get(key).cloned()
    }

    fn set_option(&mut self, key: &str, value: Option<OptionValue>) {
        match value {
            Some(value) => {
                self.options.insert(key.to_string(), value);
            }
            None => {
                self.options.remove(key);
            }
        }
    }

    fn handles_mut(&mut self) -> Option<&mut dyn HandleEditable> {
        match &mut self.body {
            Body::Prop => None,
            Body::Freeform(area) => Some(area),
            Body::Polygon(boundary) => Some(boundary),
        }
    }
}

/// The authoritative set of world objects plus the editor selection.
///
/// Uses BTreeMap for deterministic iteration order.
#[derive(Debug, Default)]
pub struct Scene {
    objects: BTreeMap<EntityId, WorldObject>,
    selection: Option<EntityId>,
    catalog: Rc<ContentCatalog>,
    event_log: Vec<SceneEvent>,
}

impl Scene {
    /// Empty scene with an open content catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty scene that only accepts content listed in `catalog`.
    pub fn with_catalog(catalog: ContentCatalog) -> Self {
        Self {
            catalog: Rc::new(catalog),
            ..Default::default()
        }
    }

    /// Number of live objects.
    pub fn entity_count(&self) -> usize {
        self.objects.len()
    }

    /// Look up a live object by id.
    pub fn get(&self, id: EntityId) -> Option<&WorldObject> {
        self.objects.get(&id)
    }

    /// Mutable access to a live object by id.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut WorldObject> {
        self.objects.get_mut(&id)
    }

    /// Live objects in id order.
    pub fn objects(&self) -> impl Iterator<Item = &WorldObject> {
        self.objects.values()
    }

    /// The currently selected object, if any.
    pub fn selection(&self) -> Option<EntityId> {
        self.selection
    }

    /// Lifecycle and selection events since the last drain.
    pub fn events(&self) -> &[SceneEvent] {
        &self.event_log
    }

    /// Take all recorded events, leaving the log empty.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Check that a snapshot describes an object this scene can hold.
    pub fn validate(&self, snapshot: &ObjectSnapshot) -> Result<(), EntityError> {
        if !self.catalog.contains(&snapshot.content.content) {
            return Err(EntityError::UnknownContent(snapshot.content.content.clone()));
        }
        check_scale(snapshot.scale)?;
        match (snapshot.shape.has_handles(), snapshot.handles.len()) {
            (false, 0) => Ok(()),
            (false, n) => Err(EntityError::InvalidSnapshot(format!(
                "prop carries {n} handles"
            ))),
            (true, n) if n < MIN_AREA_HANDLES => Err(EntityError::InvalidSnapshot(format!(
                "{:?} needs at least {MIN_AREA_HANDLES} handles, got {n}",
                snapshot.shape
            ))),
            (true, _) => Ok(()),
        }
    }

    /// Place a new object. Returns its id.
    pub fn spawn(&mut self, snapshot: &ObjectSnapshot) -> Result<EntityId, SceneError> {
        Ok(self.insert(snapshot)?)
    }

    fn insert(&mut self, snapshot: &ObjectSnapshot) -> Result<EntityId, EntityError> {
        self.validate(snapshot)?;
        let id = EntityId::new();
        self.objects.insert(
            id,
            WorldObject::from_snapshot(id, snapshot, Rc::clone(&self.catalog)),
        );
        self.event_log.push(SceneEvent::Spawned { id });
        tracing::debug!(%id, name = %snapshot.name, "spawned object");
        Ok(id)
    }

    /// Remove an object, returning its final state.
    pub fn despawn(&mut self, id: EntityId) -> Option<ObjectSnapshot> {
        let object = self.objects.remove(&id)?;
        if self.selection == Some(id) {
            self.selection = None;
            self.event_log.push(SceneEvent::Deselected { id });
        }
        self.event_log.push(SceneEvent::Destroyed { id });
        tracing::debug!(%id, "despawned object");
        Some(object.snapshot())
    }

    /// Clear the selection.
    pub fn deselect(&mut self) {
        if let Some(id) = self.selection.take() {
            self.event_log.push(SceneEvent::Deselected { id });
        }
    }
}

impl EntityLocator for Scene {
    type Entity = WorldObject;

    fn resolve(&mut self, id: EntityId) -> Option<&mut WorldObject> {
        self.objects.get_mut(&id)
    }

    fn current_selection(&self) -> Option<EntityId> {
        self.selection
    }

    fn select(&mut self, id: EntityId) {
        if !self.objects.contains_key(&id) {
            tracing::warn!(%id, "ignoring selection of unknown entity");
            return;
        }
        match self.selection.replace(id) {
            Some(previous) if previous == id => return,
            Some(previous) => self.event_log.push(SceneEvent::Deselected { id: previous }),
            None => {}
        }
        self.event_log.push(SceneEvent::Selected { id });
    }
}

impl EntityFactory for Scene {
    async fn create(&mut self, snapshot: &ObjectSnapshot) -> Result<EntityId, EntityError> {
        self.insert(snapshot)
    }

    fn destroy(&mut self, id: EntityId) -> bool {
        self.despawn(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenery_common::ContentRef;
    use scenery_history::{
        Action, ActionKind, ActionRecord, HistoryController, HistoryError, RasterError,
        StepOutcome, TerrainSnapshotProvider,
    };
    use scenery_common::{RasterSnapshot, RegionRect};

    /// Scenes in these tests have no terrain.
    struct NoTerrain;

    impl TerrainSnapshotProvider for NoTerrain {
        fn capture_region(&self, rect: RegionRect) -> Result<RasterSnapshot, RasterError> {
            Err(RasterError::OutOfBounds(rect))
        }

        fn apply_region(&mut self, snapshot: &RasterSnapshot) -> Result<(), RasterError> {
            Err(RasterError::OutOfBounds(snapshot.rect))
        }
    }

    fn binding(item: &str) -> ContentBinding {
        ContentBinding {
            content: ContentRef::parse(&format!("forest/{item}")).unwrap(),
            address: format!("https://packs.example/forest/{item}"),
        }
    }

    fn oak() -> ObjectSnapshot {
        ObjectSnapshot::prop("Oak", binding("oak"))
    }

    fn boundary() -> ObjectSnapshot {
        oak().with_handles(
            ShapeKind::PolygonBoundary,
            vec![Vec3::ZERO, Vec3::X, Vec3::Z],
        )
    }

    #[test]
    fn scene_starts_empty() {
        let scene = Scene::new();
        assert_eq!(scene.entity_count(), 0);
        assert_eq!(scene.selection(), None);
    }

    #[test]
    fn spawn_and_despawn() {
        let mut scene = Scene::new();
        let id = scene.spawn(&oak()).unwrap();
        assert_eq!(scene.entity_count(), 1);
        let snap = scene.despawn(id).unwrap();
        assert_eq!(snap, oak());
        assert_eq!(scene.entity_count(), 0);
        assert!(scene.despawn(id).is_none());
        assert_eq!(
            scene.events(),
            &[SceneEvent::Spawned { id }, SceneEvent::Destroyed { id }]
        );
    }

    #[test]
    fn snapshot_round_trips_through_object() {
        let mut scene = Scene::new();
        let mut snap = boundary();
        snap.options
            .insert("closed".into(), OptionValue::Bool(true));
        let id = scene.spawn(&snap).unwrap();
        assert_eq!(scene.get(id).unwrap().snapshot(), snap);
        assert_eq!(scene.get(id).unwrap().shape(), ShapeKind::PolygonBoundary);
    }

    #[test]
    fn create_allocates_fresh_ids() {
        let mut scene = Scene::new();
        let a = pollster::block_on(scene.create(&oak())).unwrap();
        let b = pollster::block_on(scene.create(&oak())).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn validation_rejects_bad_snapshots() {
        let scene = Scene::with_catalog(ContentCatalog::from_refs([binding("oak").content]));
        assert!(scene.validate(&oak()).is_ok());

        let unknown = ObjectSnapshot::prop("Pine", binding("pine"));
        assert!(matches!(
            scene.validate(&unknown),
            Err(EntityError::UnknownContent(_))
        ));

        let mut prop_with_handles = oak();
        prop_with_handles.handles.push(Vec3::ONE);
        assert!(matches!(
            scene.validate(&prop_with_handles),
            Err(EntityError::InvalidSnapshot(_))
        ));

        let thin = oak().with_handles(ShapeKind::FreeformArea, vec![Vec3::ZERO, Vec3::X]);
        assert!(scene.validate(&thin).is_err());

        let mut flat = oak();
        flat.scale = 0.0;
        assert!(scene.validate(&flat).is_err());
    }

    #[test]
    fn only_area_shapes_expose_handles() {
        let mut scene = Scene::new();
        let prop = scene.spawn(&oak()).unwrap();
        let area = scene.spawn(&boundary()).unwrap();
        assert!(scene.resolve(prop).unwrap().handles_mut().is_none());
        let handles = scene.resolve(area).unwrap().handles_mut().unwrap();
        assert_eq!(handles.handle_count(), 3);
    }

    #[test]
    fn replace_content_checks_catalog() {
        let mut scene = Scene::with_catalog(ContentCatalog::from_refs([binding("oak").content]));
        let id = scene.spawn(&oak()).unwrap();
        let err = pollster::block_on(scene.resolve(id).unwrap().replace_content(&binding("pine")))
            .unwrap_err();
        assert_eq!(err, EntityError::UnknownContent(binding("pine").content));
        assert_eq!(scene.get(id).unwrap().content(), binding("oak"));
    }

    #[test]
    fn selection_follows_lifecycle() {
        let mut scene = Scene::new();
        let a = scene.spawn(&oak()).unwrap();
        let b = scene.spawn(&oak()).unwrap();
        scene.select(a);
        scene.select(b);
        assert_eq!(scene.current_selection(), Some(b));
        scene.despawn(b);
        assert_eq!(scene.current_selection(), None);
        scene.select(b);
        assert_eq!(scene.current_selection(), None);
    }

    #[test]
    fn reselecting_records_no_event() {
        let mut scene = Scene::new();
        let a = scene.spawn(&oak()).unwrap();
        scene.drain_events();
        scene.select(a);
        scene.select(a);
        assert_eq!(scene.events(), &[SceneEvent::Selected { id: a }]);
        assert_eq!(scene.current_selection(), Some(a));
    }

    #[test]
    fn scale_must_be_finite_and_positive() {
        assert!(check_scale(0.5).is_ok());
        assert_eq!(check_scale(0.0), Err(EntityError::InvalidScale(0.0)));
        assert!(check_scale(-1.0).is_err());
        assert!(check_scale(f32::INFINITY).is_err());
        assert!(check_scale(f32::NAN).is_err());
    }

    #[test]
    fn undo_selects_the_edited_object() {
        let mut scene = Scene::new();
        let mut history = HistoryController::new();
        let a = scene.spawn(&oak()).unwrap();
        let b = scene.spawn(&oak()).unwrap();
        scene.select(b);

        scene.get_mut(a).unwrap().rename("Big Oak");
        history.register_action(a, Action::Rename { name: "Oak".into() });

        pollster::block_on(history.undo(&mut scene, &mut NoTerrain)).unwrap();
        assert_eq!(scene.selection(), Some(a));
        assert_eq!(scene.get(a).unwrap().name(), "Oak");
    }

    #[test]
    fn delete_undo_redo_through_scene() {
        let mut scene = Scene::new();
        let mut history = HistoryController::new();
        let id = scene.spawn(&boundary()).unwrap();
        let snapshot = scene.despawn(id).unwrap();
        history.register(ActionRecord::deleted(id, snapshot.clone()));

        let outcome = pollster::block_on(history.undo(&mut scene, &mut NoTerrain)).unwrap();
        let StepOutcome::Applied { kind, entity, .. } = outcome else {
            panic!("expected applied, got {outcome:?}");
        };
        assert_eq!(kind, ActionKind::Delete);
        assert_ne!(entity, id);
        assert_eq!(scene.get(entity).unwrap().snapshot(), snapshot);
        assert_eq!(scene.selection(), Some(entity));

        pollster::block_on(history.redo(&mut scene, &mut NoTerrain)).unwrap();
        assert_eq!(scene.entity_count(), 0);
    }

    #[test]
    fn rehydrating_unknown_content_fails() {
        let mut scene = Scene::with_catalog(ContentCatalog::from_refs([binding("oak").content]));
        let mut history = HistoryController::new();
        history.register(ActionRecord::deleted(
            EntityId::new(),
            ObjectSnapshot::prop("Pine", binding("pine")),
        ));
        let err = pollster::block_on(history.undo(&mut scene, &mut NoTerrain)).unwrap_err();
        assert!(matches!(
            err,
            HistoryError::Rehydration {
                source: EntityError::UnknownContent(_),
                ..
            }
        ));
        assert_eq!(scene.entity_count(), 0);
        assert!(!history.can_undo());
    }
}
