use glam::Vec3;
use scenery_common::{
    ContentBinding, ContentRef, EntityId, ObjectSnapshot, OptionValue, Orientation, RegionRect,
    ShapeKind,
};
use scenery_history::StepOutcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::session::{EditorSession, SessionError};

/// A scripted editing session.
///
/// ```json
/// { "steps": [
///   { "op": "spawn", "label": "oak", "name": "Oak", "content": "forest/oak",
///     "position": [5.0, 0.0, 5.0] },
///   { "op": "move", "target": "oak", "position": [0.0, 0.0, 0.0] },
///   { "op": "undo" }
/// ] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub steps: Vec<Step>,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// One scripted command. Objects are addressed by the label given at spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Spawn {
        label: String,
        name: String,
        content: ContentRef,
        /// Defaults to `packs/<content>`.
        #[serde(default)]
        address: Option<String>,
        #[serde(default)]
        position: Vec3,
        #[serde(default)]
        shape: Option<ShapeKind>,
        #[serde(default)]
        handles: Vec<Vec3>,
    },
    Delete {
        target: String,
    },
    Rename {
        target: String,
        name: String,
    },
    Rotate {
        target: String,
        orientation: Orientation,
    },
    Elevate {
        target: String,
        height: f32,
    },
    Scale {
        target: String,
        scale: f32,
    },
    Move {
        target: String,
        position: Vec3,
    },
    ReplaceContent {
        target: String,
        content: ContentRef,
        #[serde(default)]
        address: Option<String>,
    },
    SetOption {
        target: String,
        key: String,
        /// `null` clears the option.
        value: Option<OptionValue>,
    },
    AddHandle {
        target: String,
        index: usize,
        position: Vec3,
    },
    RemoveHandle {
        target: String,
        index: usize,
    },
    MoveHandle {
        target: String,
        index: usize,
        position: Vec3,
    },
    Paint {
        layer: String,
        rect: RegionRect,
        value: f32,
    },
    Undo,
    Redo,
    Save {
        #[serde(default = "save_succeeds")]
        success: bool,
    },
}

fn save_succeeds() -> bool {
    true
}

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("reading script: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("step {step}: unknown label {label:?}")]
    UnknownLabel { step: usize, label: String },
    #[error("step {step}: label {label:?} already in use")]
    DuplicateLabel { step: usize, label: String },
    #[error("step {step}: {source}")]
    Session {
        step: usize,
        #[source]
        source: SessionError,
    },
}

fn binding(content: &ContentRef, address: &Option<String>) -> ContentBinding {
    ContentBinding {
        content: content.clone(),
        address: address
            .clone()
            .unwrap_or_else(|| format!("packs/{content}")),
    }
}

/// Runs script steps against a session.
///
/// Labels keep the id assigned at spawn. An object recreated by undo or redo
/// gets a fresh id, so its label goes stale.
pub struct ScriptRunner {
    session: EditorSession,
    labels: BTreeMap<String, EntityId>,
}

impl ScriptRunner {
    pub fn new(session: EditorSession) -> Self {
        Self {
            session,
            labels: BTreeMap::new(),
        }
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub fn into_session(self) -> EditorSession {
        self.session
    }

    pub fn label(&self, label: &str) -> Option<EntityId> {
        self.labels.get(label).copied()
    }

    fn resolve(&self, step: usize, label: &str) -> Result<EntityId, ScriptError> {
        self.label(label).ok_or_else(|| ScriptError::UnknownLabel {
            step,
            label: label.to_string(),
        })
    }

    /// Run every step in order, stopping at the first failure.
    pub async fn run(&mut self, script: &Script) -> Result<(), ScriptError> {
        for (index, step) in script.steps.iter().enumerate() {
            let report = self.run_step(index, step).await?;
            tracing::info!(step = index, "{report}; {}", self.session.summary());
        }
        Ok(())
    }

    /// Run one step and describe what it did.
    pub async fn run_step(&mut self, index: usize, step: &Step) -> Result<String, ScriptError> {
        let at = |source: SessionError| ScriptError::Session {
            step: index,
            source,
        };
        let report = match step {
            Step::Spawn {
                label,
                name,
                content,
                address,
                position,
                shape,
                handles,
            } => {
                if self.labels.contains_key(label) {
                    return Err(ScriptError::DuplicateLabel {
                        step: index,
                        label: label.clone(),
                    });
                }
                let snapshot = ObjectSnapshot::prop(name.clone(), binding(content, address))
                    .with_position(*position)
                    .with_handles(shape.unwrap_or(ShapeKind::Prop), handles.clone());
                let id = self.session.spawn(&snapshot).map_err(at)?;
                self.labels.insert(label.clone(), id);
                format!("spawned {label} as {id}")
            }
            Step::Delete { target } => {
                let id = self.resolve(index, target)?;
                self.session.delete(id).map_err(at)?;
                format!("deleted {target}")
            }
            Step::Rename { target, name } => {
                let id = self.resolve(index, target)?;
                self.session.rename(id, name).map_err(at)?;
                format!("renamed {target} to {name:?}")
            }
            Step::Rotate {
                target,
                orientation,
            } => {
                let id = self.resolve(index, target)?;
                self.session.rotate(id, *orientation).map_err(at)?;
                format!("rotated {target}")
            }
            Step::Elevate { target, height } => {
                let id = self.resolve(index, target)?;
                self.session.elevate(id, *height).map_err(at)?;
                format!("elevated {target} to {height}")
            }
            Step::Scale { target, scale } => {
                let id = self.resolve(index, target)?;
                self.session.scale(id, *scale).map_err(at)?;
                format!("scaled {target} to {scale}")
            }
            Step::Move { target, position } => {
                let id = self.resolve(index, target)?;
                self.session.move_to(id, *position).map_err(at)?;
                format!("moved {target} to {position}")
            }
            Step::ReplaceContent {
                target,
                content,
                address,
            } => {
                let id = self.resolve(index, target)?;
                self.session
                    .replace_content(id, &binding(content, address))
                    .await
                    .map_err(at)?;
                format!("replaced content of {target} with {content}")
            }
            Step::SetOption { target, key, value } => {
                let id = self.resolve(index, target)?;
                self.session
                    .set_option(id, key, value.clone())
                    .map_err(at)?;
                match value {
                    Some(value) => format!("set {target}.{key} = {value}"),
                    None => format!("cleared {target}.{key}"),
                }
            }
            Step::AddHandle {
                target,
                index: at_index,
                position,
            } => {
                let id = self.resolve(index, target)?;
                self.session
                    .add_handle(id, *at_index, *position)
                    .map_err(at)?;
                format!("added handle {at_index} to {target}")
            }
            Step::RemoveHandle {
                target,
                index: at_index,
            } => {
                let id = self.resolve(index, target)?;
                self.session.remove_handle(id, *at_index).map_err(at)?;
                format!("removed handle {at_index} from {target}")
            }
            Step::MoveHandle {
                target,
                index: at_index,
                position,
            } => {
                let id = self.resolve(index, target)?;
                self.session
                    .move_handle(id, *at_index, *position)
                    .map_err(at)?;
                format!("moved handle {at_index} of {target}")
            }
            Step::Paint { layer, rect, value } => {
                self.session.paint(layer, *rect, *value).map_err(at)?;
                format!("painted {layer} over {rect:?}")
            }
            Step::Undo => describe("undo", self.session.undo().await.map_err(at)?),
            Step::Redo => describe("redo", self.session.redo().await.map_err(at)?),
            Step::Save { success } => {
                self.session.save_completed(*success);
                if *success {
                    "saved".to_string()
                } else {
                    "save failed".to_string()
                }
            }
        };
        Ok(report)
    }
}

fn describe(verb: &str, outcome: StepOutcome) -> String {
    match outcome {
        StepOutcome::Idle => format!("{verb}: nothing to do"),
        StepOutcome::Applied {
            kind,
            entity,
            skipped: 0,
        } => format!("{verb}: {kind} on {entity}"),
        StepOutcome::Applied {
            kind,
            entity,
            skipped,
        } => format!("{verb}: {kind} on {entity} (skipped {skipped} stale)"),
        StepOutcome::Exhausted { skipped } => {
            format!("{verb}: skipped {skipped} stale, nothing applied")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use scenery_history::SceneEntity;
    use std::io::Write;

    fn runner() -> ScriptRunner {
        ScriptRunner::new(EditorSession::new(&AppConfig::default()).unwrap())
    }

    fn parse(json: &str) -> Script {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_every_step_shape() {
        let script = parse(
            r#"{ "steps": [
                { "op": "spawn", "label": "a", "name": "Area", "content": "forest/moss",
                  "shape": "freeform_area", "handles": [[0,0,0],[1,0,0],[0,0,1]] },
                { "op": "set_option", "target": "a", "key": "density", "value": 2.5 },
                { "op": "set_option", "target": "a", "key": "density", "value": null },
                { "op": "rotate", "target": "a", "orientation": { "x": 0, "y": 45, "z": 0 } },
                { "op": "paint", "layer": "grass", "rect": { "x": 0, "y": 0, "width": 2, "height": 2 }, "value": 1 },
                { "op": "save" },
                { "op": "save", "success": false }
            ] }"#,
        );
        assert_eq!(script.steps.len(), 7);
        assert_eq!(
            script.steps[1],
            Step::SetOption {
                target: "a".into(),
                key: "density".into(),
                value: Some(OptionValue::Number(2.5)),
            }
        );
        assert_eq!(script.steps[5], Step::Save { success: true });
        assert_eq!(script.steps[6], Step::Save { success: false });
    }

    #[test]
    fn move_then_undo_script() {
        let mut runner = runner();
        let script = parse(
            r#"{ "steps": [
                { "op": "spawn", "label": "oak", "name": "Oak", "content": "forest/oak",
                  "position": [5, 0, 5] },
                { "op": "move", "target": "oak", "position": [0, 0, 0] },
                { "op": "undo" }
            ] }"#,
        );
        pollster::block_on(runner.run(&script)).unwrap();
        let id = runner.label("oak").unwrap();
        let object = runner.session().scene.get(id).unwrap();
        assert_eq!(object.position(), Vec3::new(5.0, 0.0, 5.0));
        assert_eq!(object.content().address, "packs/forest/oak");
        assert_eq!(runner.session().history.redo_len(), 1);
        assert_eq!(runner.session().history.change_count(), 1);
    }

    #[test]
    fn unknown_label_stops_the_run() {
        let mut runner = runner();
        let script = parse(r#"{ "steps": [ { "op": "rename", "target": "ghost", "name": "x" } ] }"#);
        let err = pollster::block_on(runner.run(&script)).unwrap_err();
        assert!(matches!(err, ScriptError::UnknownLabel { step: 0, .. }));
    }

    #[test]
    fn duplicate_label_is_rejected() {
        let mut runner = runner();
        let script = parse(
            r#"{ "steps": [
                { "op": "spawn", "label": "oak", "name": "Oak", "content": "forest/oak" },
                { "op": "spawn", "label": "oak", "name": "Oak", "content": "forest/oak" }
            ] }"#,
        );
        let err = pollster::block_on(runner.run(&script)).unwrap_err();
        assert!(matches!(err, ScriptError::DuplicateLabel { step: 1, .. }));
        assert_eq!(runner.session().scene.entity_count(), 1);
    }

    #[test]
    fn session_errors_carry_the_step_index() {
        let mut runner = runner();
        let script = parse(
            r#"{ "steps": [
                { "op": "spawn", "label": "oak", "name": "Oak", "content": "forest/oak" },
                { "op": "remove_handle", "target": "oak", "index": 0 }
            ] }"#,
        );
        let err = pollster::block_on(runner.run(&script)).unwrap_err();
        assert!(matches!(err, ScriptError::Session { step: 1, .. }));
    }

    #[test]
    fn labels_go_stale_after_rehydration() {
        let mut runner = runner();
        let script = parse(
            r#"{ "steps": [
                { "op": "spawn", "label": "oak", "name": "Oak", "content": "forest/oak" },
                { "op": "delete", "target": "oak" },
                { "op": "undo" }
            ] }"#,
        );
        pollster::block_on(runner.run(&script)).unwrap();
        let stale = runner.label("oak").unwrap();
        assert!(runner.session().scene.get(stale).is_none());
        assert_eq!(runner.session().scene.entity_count(), 1);

        let step = Step::Rename {
            target: "oak".into(),
            name: "Again".into(),
        };
        let err = pollster::block_on(runner.run_step(3, &step)).unwrap_err();
        assert!(matches!(err, ScriptError::Session { step: 3, .. }));
    }

    #[test]
    fn describes_outcomes() {
        let mut runner = runner();
        let report = pollster::block_on(runner.run_step(0, &Step::Undo)).unwrap();
        assert_eq!(report, "undo: nothing to do");
        assert_eq!(
            describe("redo", StepOutcome::Exhausted { skipped: 2 }),
            "redo: skipped 2 stale, nothing applied"
        );
    }

    #[test]
    fn loads_script_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "steps": [ {{ "op": "redo" }} ] }}"#).unwrap();
        let script = Script::load(file.path()).unwrap();
        assert_eq!(script.steps, vec![Step::Redo]);

        let mut broken = tempfile::NamedTempFile::new().unwrap();
        write!(broken, r#"{{ "steps": [ {{ "op": "fly" }} ] }}"#).unwrap();
        assert!(matches!(
            Script::load(broken.path()),
            Err(ScriptError::Parse(_))
        ));
    }
}
