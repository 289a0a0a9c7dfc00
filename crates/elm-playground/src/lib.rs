//! Elm playground compiler
//!
//! Turns a buffer of playground snippets into one compiled module per
//! top-level expression and assembles the results for display.

pub mod artifact;
pub mod config;
pub mod diagnostic;
pub mod driver;
pub mod error;
pub mod module;
pub mod playground;
pub mod statement;
pub mod workspace;

pub use artifact::{Assembler, ElmEntryPoint, EntryPointBinder, RenderSlot, ShapeMismatch, SlotContent};
pub use config::{CompilerConfig, PlaygroundConfig};
pub use diagnostic::{Diagnostic, ErrorTranslator};
pub use driver::{Artifact, BuildOutcome, CompileResult, CompilerDriver};
pub use error::{PlaygroundError, Result};
pub use module::{ModuleSynthesizer, PrimaryModule, SynthesizedModule, Synthesis, is_module_name};
pub use playground::{CompileOutcome, Playground};
pub use statement::{Statement, StatementKind, classify};
pub use workspace::{CleanReport, Workspace};
