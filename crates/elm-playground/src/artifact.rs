//! Loading compiled artifacts and assembling the rendered result.

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::driver::Artifact;
use crate::error::{PlaygroundError, Result};
use crate::statement::Statement;

/// A compiled module whose entry point can be embedded in the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddableComponent {
    pub module: String,
    /// Exported name the runtime looks the component up by
    pub entry: String,
    pub script: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlotContent {
    Component(EmbeddableComponent),
    /// The artifact loaded but its export had the wrong shape
    Placeholder,
}

/// Output for one playground expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderSlot {
    pub index: usize,
    pub expression: String,
    pub content: SlotContent,
}

impl RenderSlot {
    /// Stable identity for the UI, unique within one result.
    pub fn key(&self) -> String {
        format!("{}_{}", self.expression, self.index)
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.content, SlotContent::Placeholder)
    }
}

/// Why an artifact could not be bound to an entry point.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeMismatch {
    #[error("artifact is not valid UTF-8")]
    NotText,

    #[error("artifact does not export '{0}'")]
    MissingEntryPoint(String),

    #[error("export '{entry}' has no '{marker}' capability")]
    MissingMarker { entry: String, marker: String },
}

/// Binds the text of a compiled artifact to the expected entry-point contract.
pub trait EntryPointBinder: Send + Sync {
    fn bind(&self, entry: &str, script: &str) -> std::result::Result<(), ShapeMismatch>;
}

/// Entry-point contract of scripts produced by `elm-make`: the module is
/// registered on the global `Elm` object and exposes an `embed` function.
#[derive(Debug, Clone)]
pub struct ElmEntryPoint {
    marker: String,
}

impl ElmEntryPoint {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl Default for ElmEntryPoint {
    fn default() -> Self {
        Self::new("embed")
    }
}

impl EntryPointBinder for ElmEntryPoint {
    fn bind(&self, entry: &str, script: &str) -> std::result::Result<(), ShapeMismatch> {
        let exports = [
            format!("Elm.{}", entry),
            format!("Elm['{}']", entry),
            format!("Elm[\"{}\"]", entry),
        ];
        let export_at = exports
            .iter()
            .filter_map(|export| script.find(export.as_str()))
            .min()
            .ok_or_else(|| ShapeMismatch::MissingEntryPoint(entry.to_string()))?;

        if script[export_at..].contains(self.marker.as_str()) {
            Ok(())
        } else {
            Err(ShapeMismatch::MissingMarker {
                entry: entry.to_string(),
                marker: self.marker.clone(),
            })
        }
    }
}

/// Exported entry name for a module: its identifier with a capital first letter.
pub fn entry_name(module: &str) -> String {
    let mut chars = module.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turns a batch of artifacts into render slots
pub struct Assembler<B = ElmEntryPoint> {
    binder: B,
}

impl<B: EntryPointBinder> Assembler<B> {
    pub fn new(binder: B) -> Self {
        Self { binder }
    }

    /// Load a single artifact. Shape problems become a placeholder slot.
    pub async fn load(&self, artifact: &Artifact, expression: &Statement) -> Result<RenderSlot> {
        let bytes = tokio::fs::read(&artifact.path)
            .await
            .map_err(|e| PlaygroundError::workspace(&artifact.path, e))?;

        let entry = entry_name(&artifact.module);
        let bound = String::from_utf8(bytes)
            .map_err(|_| ShapeMismatch::NotText)
            .and_then(|script| self.binder.bind(&entry, &script).map(|()| script));

        let content = match bound {
            Ok(script) => SlotContent::Component(EmbeddableComponent {
                module: artifact.module.clone(),
                entry,
                script,
            }),
            Err(mismatch) => {
                warn!("{}: {}, rendering an empty slot", artifact.path.display(), mismatch);
                SlotContent::Placeholder
            }
        };

        Ok(RenderSlot {
            index: artifact.index,
            expression: expression.text.clone(),
            content,
        })
    }

    /// Pair artifacts with the expressions they were synthesized from, in order.
    pub async fn assemble(
        &self,
        artifacts: &[Artifact],
        expressions: &[&Statement],
    ) -> Result<Vec<RenderSlot>> {
        let mut slots = Vec::with_capacity(artifacts.len());
        for (artifact, expression) in artifacts.iter().zip(expressions) {
            slots.push(self.load(artifact, expression).await?);
        }
        slots.sort_by_key(|slot| slot.index);
        Ok(slots)
    }
}

impl Default for Assembler<ElmEntryPoint> {
    fn default() -> Self {
        Self::new(ElmEntryPoint::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::classify;
    use std::path::Path;

    const EMBEDDABLE: &str = "var Elm = {};\nElm['Main0'] = Elm['Main0'] || {};\nElm['Main0'].embed = function (node) {};\n";

    fn artifact(dir: &Path, module: &str, index: usize, script: &[u8]) -> Artifact {
        let path = dir.join(format!("{}.js", module));
        std::fs::write(&path, script).unwrap();
        Artifact {
            module: module.to_string(),
            index,
            path,
        }
    }

    #[test]
    fn test_entry_name() {
        assert_eq!(entry_name("main0"), "Main0");
        assert_eq!(entry_name("Main12"), "Main12");
        assert_eq!(entry_name(""), "");
    }

    #[test]
    fn test_bind_accepts_all_export_spellings() {
        let binder = ElmEntryPoint::default();
        assert!(binder.bind("Main0", EMBEDDABLE).is_ok());
        assert!(binder.bind("Main1", "Elm.Main1 = { embed: f };").is_ok());
        assert!(binder.bind("Main2", "Elm[\"Main2\"] = { embed: f };").is_ok());
    }

    #[test]
    fn test_bind_rejects_wrong_shapes() {
        let binder = ElmEntryPoint::default();
        assert_eq!(
            binder.bind("Main3", EMBEDDABLE),
            Err(ShapeMismatch::MissingEntryPoint("Main3".to_string()))
        );
        assert_eq!(
            binder.bind("Main0", "function embed() {}\nElm['Main0'] = {};"),
            Err(ShapeMismatch::MissingMarker {
                entry: "Main0".to_string(),
                marker: "embed".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_assemble_degrades_per_slot() {
        let dir = tempfile::tempdir().unwrap();
        let statements = classify("1 + 1\n\"two\"\n3");
        let expressions: Vec<_> = statements.iter().collect();

        let artifacts = vec![
            artifact(dir.path(), "Main0", 0, EMBEDDABLE.as_bytes()),
            artifact(dir.path(), "Main1", 1, b"Elm['Main1'] = {};"),
            artifact(dir.path(), "Main2", 2, &[0xff, 0xfe, 0x00]),
        ];

        let slots = Assembler::new(ElmEntryPoint::default()).assemble(&artifacts, &expressions).await.unwrap();

        assert_eq!(slots.len(), 3);
        assert!(matches!(
            &slots[0].content,
            SlotContent::Component(c) if c.entry == "Main0" && c.script == EMBEDDABLE
        ));
        assert!(slots[1].is_placeholder());
        assert!(slots[2].is_placeholder());
        assert_eq!(slots[1].expression, "\"two\"");
        assert_eq!(slots[2].key(), "3_2");
    }

    #[tokio::test]
    async fn test_missing_artifact_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let statements = classify("1");
        let missing = Artifact {
            module: "Main0".to_string(),
            index: 0,
            path: dir.path().join("Main0.js"),
        };

        let err = Assembler::new(ElmEntryPoint::default())
            .assemble(&[missing], &[&statements[0]])
            .await
            .unwrap_err();
        assert!(matches!(err, PlaygroundError::Workspace { .. }));
    }
}
