//! The compile and cleanup entry points used by the playground UI.
//!
//! A `Playground` owns one scratch workspace. Compiles and cleanups take the
//! same lock, so they never touch the workspace at the same time, and every
//! new compile request cancels the one before it.

use std::sync::{Arc, Mutex as StdMutex};

use serde::Serialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::artifact::{Assembler, ElmEntryPoint, EntryPointBinder, RenderSlot};
use crate::config::PlaygroundConfig;
use crate::diagnostic::{Diagnostic, ErrorTranslator};
use crate::driver::{BuildOutcome, CompilerDriver};
use crate::error::{PlaygroundError, Result};
use crate::module::ModuleSynthesizer;
use crate::statement::{Statement, classify};
use crate::workspace::{CleanReport, Workspace};

/// What the UI displays for one compile request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CompileOutcome {
    /// One slot per expression, in source order
    Rendered(Vec<RenderSlot>),
    /// The first compiler error, with line numbers shifted past the synthesized header
    Diagnostic(Diagnostic),
}

pub struct Playground<B = ElmEntryPoint> {
    config: Arc<PlaygroundConfig>,
    workspace: Workspace,
    driver: CompilerDriver,
    assembler: Assembler<B>,
    translator: ErrorTranslator,
    /// Held for the whole of a compile or cleanup
    busy: Mutex<()>,
    /// Token of the most recent compile request
    current: StdMutex<CancellationToken>,
}

impl Playground<ElmEntryPoint> {
    pub fn new(config: PlaygroundConfig) -> Self {
        let binder = ElmEntryPoint::new(config.embed_marker.clone());
        Self::with_binder(config, binder)
    }
}

impl<B: EntryPointBinder> Playground<B> {
    pub fn with_binder(config: PlaygroundConfig, binder: B) -> Self {
        let config = Arc::new(config);
        Self {
            workspace: Workspace::new(&config),
            driver: CompilerDriver::new(Arc::clone(&config)),
            assembler: Assembler::new(binder),
            translator: ErrorTranslator::new(&config),
            busy: Mutex::new(()),
            current: StdMutex::new(CancellationToken::new()),
            config,
        }
    }

    /// Cancel whatever request is in flight and register a new one.
    fn supersede(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let mut current = match self.current.lock() {
            Ok(current) => current,
            Err(poisoned) => poisoned.into_inner(),
        };
        current.cancel();
        *current = token.clone();
        token
    }

    /// Compile the user's code together with every playground expression.
    ///
    /// Returns `PlaygroundError::Superseded` if another call to `compile`
    /// started before this one finished.
    pub async fn compile(&self, primary_code: &str, playground_code: &str) -> Result<CompileOutcome> {
        let cancel = self.supersede();

        let _busy = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PlaygroundError::Superseded),
            guard = self.busy.lock() => guard,
        };

        let statements = classify(playground_code);
        let synthesis = ModuleSynthesizer::new(&self.config).synthesize(primary_code, &statements);
        info!(
            "Compiling {} statements into {} modules (primary: {})",
            statements.len(),
            synthesis.modules.len(),
            synthesis.primary.name
        );

        self.workspace.prepare().await?;
        self.workspace.write_primary(&synthesis.primary).await?;

        let outcome = match self.driver.compile_all(&synthesis.modules, &cancel).await? {
            BuildOutcome::Failed(failure) => {
                debug!("Translating diagnostic from {}", failure.module);
                CompileOutcome::Diagnostic(self.translator.translate(&failure.diagnostic))
            }
            BuildOutcome::Compiled(artifacts) => {
                let expressions: Vec<&Statement> =
                    statements.iter().filter(|s| s.is_displayable()).collect();
                let slots = self.assembler.assemble(&artifacts, &expressions).await?;
                info!("Rendered {} slots", slots.len());
                CompileOutcome::Rendered(slots)
            }
        };

        // a newer request may have arrived while the artifacts were loading
        if cancel.is_cancelled() {
            return Err(PlaygroundError::Superseded);
        }
        Ok(outcome)
    }

    /// Remove generated files, keeping the primary module.
    ///
    /// Waits for an in-flight compile to settle first.
    pub async fn clean(&self) -> Result<CleanReport> {
        let _busy = self.busy.lock().await;
        self.workspace.clean().await
    }

    /// Fire-and-forget variant of [`Playground::clean`]; failures are logged.
    pub async fn clean_up(&self) {
        info!("Cleaning up {}", self.workspace.root().display());
        if let Err(e) = self.clean().await {
            warn!("Cleanup failed: {}", e);
        }
    }
}
