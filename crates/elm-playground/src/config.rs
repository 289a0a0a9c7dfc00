/// Playground configuration
///
/// Everything that used to be a path or naming constant lives here and is
/// handed to each component explicitly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PlaygroundError, Result};

/// How the external compiler is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Compiler executable, resolved through `PATH` when relative
    pub program: PathBuf,
    /// Arguments placed before the source file name
    pub args: Vec<String>,
    /// Flag prefix that carries the artifact file name, e.g. `--output=`
    pub output_flag: String,
    /// Text prepended to the echoed command line in raw diagnostics
    pub echo_prefix: String,
    /// Per-subprocess budget; `None` waits forever
    pub timeout_ms: Option<u64>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("elm-make"),
            args: Vec::new(),
            output_flag: "--output=".to_string(),
            echo_prefix: "Command failed: ".to_string(),
            timeout_ms: Some(60_000),
        }
    }
}

impl CompilerConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Options shared by every stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaygroundConfig {
    /// Scratch directory holding the primary module and generated files
    pub workspace_dir: PathBuf,
    /// Extension of synthesized sources (without the dot)
    pub source_extension: String,
    /// Extension of compiled artifacts (without the dot)
    pub artifact_extension: String,
    /// Name given to the user's code when it has no module declaration
    pub default_module: String,
    /// Imports every synthesized module needs regardless of user code
    pub framework_imports: Vec<String>,
    /// Marker an artifact's entry point must carry to be embeddable
    pub embed_marker: String,
    pub compiler: CompilerConfig,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            workspace_dir: PathBuf::from("temp"),
            source_extension: "elm".to_string(),
            artifact_extension: "js".to_string(),
            default_module: "UserCode".to_string(),
            framework_imports: vec![
                "import Html.App as Html".to_string(),
                "import Html.App exposing (beginnerProgram, program)".to_string(),
                "import Html exposing (..)".to_string(),
            ],
            embed_marker: "embed".to_string(),
            compiler: CompilerConfig::default(),
        }
    }
}

impl PlaygroundConfig {
    pub fn new(workspace_dir: impl Into<PathBuf>) -> Self {
        Self {
            workspace_dir: workspace_dir.into(),
            ..Self::default()
        }
    }

    /// Load a JSON configuration file. Missing keys fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PlaygroundError::config(path, e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| PlaygroundError::config(path, e.to_string()))
    }

    pub fn workspace_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workspace_dir = dir.into();
        self
    }

    pub fn compiler(mut self, compiler: CompilerConfig) -> Self {
        self.compiler = compiler;
        self
    }

    /// Number of header lines a synthesized module carries before user content:
    /// the module declaration, the framework imports and the primary import.
    ///
    /// The error translator subtracts exactly this from reported line numbers.
    pub fn boilerplate_lines(&self) -> usize {
        self.framework_imports.len() + 2
    }

    pub fn source_file_name(&self, module: &str) -> String {
        format!("{}.{}", module, self.source_extension)
    }

    pub fn artifact_file_name(&self, module: &str) -> String {
        format!("{}.{}", module, self.artifact_extension)
    }

    /// File name of the primary module written when the user declares none.
    pub fn default_primary_file_name(&self) -> String {
        self.source_file_name(&self.default_module)
    }
}
