use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a placeable object in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The nil id, used by edits that target no entity (terrain paint).
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Orientation as three independent per-axis angles, in degrees.
///
/// Each axis is edited on its own.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Orientation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Orientation {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Reference to a piece of placeable content inside a content pack, `pack/item`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentRef(String);

/// Errors from parsing a content reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentRefError {
    #[error("content reference is empty")]
    Empty,
    #[error("content reference {0:?} is not of the form pack/item")]
    Malformed(String),
}

impl ContentRef {
    pub fn parse(raw: &str) -> Result<Self, ContentRefError> {
        if raw.is_empty() {
            return Err(ContentRefError::Empty);
        }
        match raw.split_once('/') {
            Some((pack, item)) if !pack.is_empty() && !item.is_empty() => {
                Ok(Self(raw.to_string()))
            }
            _ => Err(ContentRefError::Malformed(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The content pack this reference points into.
    pub fn pack(&self) -> &str {
        self.0.split_once('/').map(|(pack, _)| pack).unwrap_or(&self.0)
    }
}

impl TryFrom<String> for ContentRef {
    type Error = ContentRefError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<ContentRef> for String {
    fn from(content: ContentRef) -> Self {
        content.0
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content an object displays plus the address it was sourced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBinding {
    pub content: ContentRef,
    pub address: String,
}

/// Value of a per-object option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
        }
    }
}

/// The concrete shape of a world object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// A single placed piece of content.
    Prop,
    /// A painted area bounded by freeform control handles.
    FreeformArea,
    /// A closed polygon boundary defined by vertex handles.
    PolygonBoundary,
}

impl ShapeKind {
    /// Whether objects of this shape carry editable handles.
    pub fn has_handles(self) -> bool {
        !matches!(self, Self::Prop)
    }
}

/// Full state of a world object, enough to recreate it after deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub shape: ShapeKind,
    pub name: String,
    pub position: Vec3,
    pub orientation: Orientation,
    pub elevation: f32,
    pub scale: f32,
    pub content: ContentBinding,
    #[serde(default)]
    pub options: BTreeMap<String, OptionValue>,
    #[serde(default)]
    pub handles: Vec<Vec3>,
}

impl ObjectSnapshot {
    /// A prop at the origin with default orientation and unit scale.
    pub fn prop(name: impl Into<String>, content: ContentBinding) -> Self {
        Self {
            shape: ShapeKind::Prop,
            name: name.into(),
            position: Vec3::ZERO,
            orientation: Orientation::default(),
            elevation: 0.0,
            scale: 1.0,
            content,
            options: BTreeMap::new(),
            handles: Vec::new(),
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_handles(mut self, shape: ShapeKind, handles: Vec<Vec3>) -> Self {
        self.shape = shape;
        self.handles = handles;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_uniqueness() {
        let a = EntityId::new();
        let b = EntityId::new();
        assert_ne!(a, b);
        assert!(!a.is_nil());
    }

    #[test]
    fn nil_id_is_nil() {
        assert!(EntityId::nil().is_nil());
        assert_eq!(EntityId::nil(), EntityId::nil());
    }

    #[test]
    fn content_ref_requires_pack_and_item() {
        let c = ContentRef::parse("forest/oak_large").unwrap();
        assert_eq!(c.pack(), "forest");
        assert_eq!(ContentRef::parse(""), Err(ContentRefError::Empty));
        assert!(matches!(
            ContentRef::parse("oak"),
            Err(ContentRefError::Malformed(_))
        ));
        assert!(ContentRef::parse("forest/").is_err());
    }

    #[test]
    fn only_props_lack_handles() {
        assert!(!ShapeKind::Prop.has_handles());
        assert!(ShapeKind::FreeformArea.has_handles());
        assert!(ShapeKind::PolygonBoundary.has_handles());
    }

    #[test]
    fn option_values_deserialize_untagged() {
        let v: OptionValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, OptionValue::Bool(true));
        let v: OptionValue = serde_json::from_str("3").unwrap();
        assert_eq!(v, OptionValue::Integer(3));
        let v: OptionValue = serde_json::from_str("\"dense\"").unwrap();
        assert_eq!(v, OptionValue::Text("dense".into()));
    }
}
