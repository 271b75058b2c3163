use glam::Vec3;
use scenery_common::{
    ContentBinding, EntityId, ObjectSnapshot, OptionValue, Orientation, RasterSnapshot,
};
use std::fmt;

/// The closed set of reversible edit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Create,
    Delete,
    Rename,
    Rotate,
    Elevate,
    Scale,
    ReplaceContent,
    AddHandle,
    RemoveHandle,
    MoveHandle,
    Move,
    SetOption,
    PaintTerrain,
}

impl ActionKind {
    /// Short human-readable label for history panels and logs.
    pub fn label(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Rename => "rename",
            Self::Rotate => "rotate",
            Self::Elevate => "elevate",
            Self::Scale => "scale",
            Self::ReplaceContent => "replace content",
            Self::AddHandle => "add handle",
            Self::RemoveHandle => "remove handle",
            Self::MoveHandle => "move handle",
            Self::Move => "move",
            Self::SetOption => "set option",
            Self::PaintTerrain => "paint terrain",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The state needed to reverse one edit, one variant per [`ActionKind`].
///
/// Values are always the state *before* the edit this record reverses, except
/// for the handle add/remove pair, which store the handle that was added or
/// removed so it can be put back.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// `None`: the entity is live and reversing destroys it.
    /// `Some`: the entity was destroyed and reversing rehydrates it.
    Create { snapshot: Option<ObjectSnapshot> },
    /// Same payload contract as [`Action::Create`].
    Delete { snapshot: Option<ObjectSnapshot> },
    Rename { name: String },
    Rotate { orientation: Orientation },
    Elevate { height: f32 },
    Scale { scale: f32 },
    ReplaceContent { binding: ContentBinding },
    AddHandle { index: usize, position: Vec3 },
    RemoveHandle { index: usize, position: Vec3 },
    MoveHandle { index: usize, position: Vec3 },
    Move { position: Vec3 },
    /// `None` means the option was unset.
    SetOption {
        key: String,
        value: Option<OptionValue>,
    },
    PaintTerrain { snapshot: RasterSnapshot },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Create { .. } => ActionKind::Create,
            Self::Delete { .. } => ActionKind::Delete,
            Self::Rename { .. } => ActionKind::Rename,
            Self::Rotate { .. } => ActionKind::Rotate,
            Self::Elevate { .. } => ActionKind::Elevate,
            Self::Scale { .. } => ActionKind::Scale,
            Self::ReplaceContent { .. } => ActionKind::ReplaceContent,
            Self::AddHandle { .. } => ActionKind::AddHandle,
            Self::RemoveHandle { .. } => ActionKind::RemoveHandle,
            Self::MoveHandle { .. } => ActionKind::MoveHandle,
            Self::Move { .. } => ActionKind::Move,
            Self::SetOption { .. } => ActionKind::SetOption,
            Self::PaintTerrain { .. } => ActionKind::PaintTerrain,
        }
    }
}

/// One reversible edit: what changed, on which entity, and how to put it back.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRecord {
    pub entity: EntityId,
    pub action: Action,
}

impl ActionRecord {
    pub fn new(entity: EntityId, action: Action) -> Self {
        Self { entity, action }
    }

    /// Record for a freshly created, still live entity.
    pub fn created(entity: EntityId) -> Self {
        Self::new(entity, Action::Create { snapshot: None })
    }

    /// Record for an entity that was just destroyed; `snapshot` is its last state.
    pub fn deleted(entity: EntityId, snapshot: ObjectSnapshot) -> Self {
        Self::new(
            entity,
            Action::Delete {
                snapshot: Some(snapshot),
            },
        )
    }

    /// Terrain paint is global and targets the nil id.
    pub fn paint_terrain(snapshot: RasterSnapshot) -> Self {
        Self::new(EntityId::nil(), Action::PaintTerrain { snapshot })
    }

    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }
}

impl fmt::Display for ActionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entity.is_nil() {
            write!(f, "{}", self.kind())
        } else {
            write!(f, "{} {}", self.kind(), self.entity)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenery_common::{ContentRef, RegionRect};

    #[test]
    fn paint_terrain_targets_nil() {
        let rec = ActionRecord::paint_terrain(RasterSnapshot {
            rect: RegionRect::new(0, 0, 1, 1),
            layers: Vec::new(),
        });
        assert!(rec.entity.is_nil());
        assert_eq!(rec.kind(), ActionKind::PaintTerrain);
        assert_eq!(rec.to_string(), "paint terrain");
    }

    #[test]
    fn lifecycle_constructors_carry_expected_payloads() {
        let id = EntityId::new();
        assert_eq!(
            ActionRecord::created(id).action,
            Action::Create { snapshot: None }
        );

        let binding = ContentBinding {
            content: ContentRef::parse("forest/oak").unwrap(),
            address: "packs/forest".into(),
        };
        let snap = ObjectSnapshot::prop("Oak", binding);
        let rec = ActionRecord::deleted(id, snap.clone());
        assert_eq!(rec.kind(), ActionKind::Delete);
        assert_eq!(
            rec.action,
            Action::Delete {
                snapshot: Some(snap)
            }
        );
    }

    #[test]
    fn kind_matches_variant() {
        let rec = ActionRecord::new(
            EntityId::new(),
            Action::MoveHandle {
                index: 2,
                position: Vec3::X,
            },
        );
        assert_eq!(rec.kind(), ActionKind::MoveHandle);
        assert_eq!(ActionKind::ReplaceContent.to_string(), "replace content");
    }
}
