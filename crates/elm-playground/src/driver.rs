/// Compiler driver that runs the external compiler over synthesized modules

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::PlaygroundConfig;
use crate::error::{PlaygroundError, Result};
use crate::module::SynthesizedModule;

/// Result of compiling a single module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileResult {
    Success { artifact: PathBuf },
    Failure { diagnostic: String },
}

/// A compiled module ready to be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub module: String,
    pub index: usize,
    pub path: PathBuf,
}

/// The failure that stopped a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFailure {
    pub module: String,
    pub index: usize,
    /// Raw compiler output, starting with the echoed command line
    pub diagnostic: String,
}

/// All-or-nothing result of compiling every module of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// One artifact per module, in input order
    Compiled(Vec<Artifact>),
    Failed(CompileFailure),
}

/// Runs one compiler subprocess per module
pub struct CompilerDriver {
    config: Arc<PlaygroundConfig>,
}

impl CompilerDriver {
    pub fn new(config: Arc<PlaygroundConfig>) -> Self {
        Self { config }
    }

    /// Write and compile a single module.
    pub async fn compile_module(&self, module: &SynthesizedModule) -> Result<CompileResult> {
        compile_in(&self.config, module).await
    }

    /// Compile every module concurrently.
    ///
    /// The first failure to arrive aborts the rest of the batch; in-flight
    /// compilers are killed when their task is dropped. Cancelling `cancel`
    /// does the same and reports `Superseded`.
    pub async fn compile_all(
        &self,
        modules: &[SynthesizedModule],
        cancel: &CancellationToken,
    ) -> Result<BuildOutcome> {
        let mut tasks = JoinSet::new();
        for (slot, module) in modules.iter().enumerate() {
            let config = Arc::clone(&self.config);
            let module = module.clone();
            tasks.spawn(async move { (slot, compile_in(&config, &module).await) });
        }

        let mut artifacts: Vec<Option<PathBuf>> = vec![None; modules.len()];

        loop {
            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    return Err(PlaygroundError::Superseded);
                }
                joined = tasks.join_next() => joined,
            };

            let Some(joined) = joined else {
                break;
            };
            let (slot, result) = joined.map_err(|e| PlaygroundError::Task(e.to_string()))?;

            match result? {
                CompileResult::Success { artifact } => artifacts[slot] = Some(artifact),
                CompileResult::Failure { diagnostic } => {
                    tasks.abort_all();
                    let module = &modules[slot];
                    info!("{} failed to compile, dropping the rest of the batch", module.name);
                    return Ok(BuildOutcome::Failed(CompileFailure {
                        module: module.name.clone(),
                        index: module.index,
                        diagnostic,
                    }));
                }
            }
        }

        let artifacts = artifacts
            .into_iter()
            .zip(modules)
            .map(|(path, module)| {
                path.map(|path| Artifact {
                    module: module.name.clone(),
                    index: module.index,
                    path,
                })
                .ok_or_else(|| PlaygroundError::Task(format!("no result for {}", module.name)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BuildOutcome::Compiled(artifacts))
    }
}

async fn compile_in(config: &PlaygroundConfig, module: &SynthesizedModule) -> Result<CompileResult> {
    let root = &config.workspace_dir;
    let source_name = config.source_file_name(&module.name);
    let artifact_name = config.artifact_file_name(&module.name);
    let source_path = root.join(&source_name);
    let artifact_path = root.join(&artifact_name);

    tokio::fs::write(&source_path, &module.source)
        .await
        .map_err(|e| PlaygroundError::workspace(&source_path, e))?;

    // A leftover artifact from an earlier request must not pass for this one
    match tokio::fs::remove_file(&artifact_path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            return Err(PlaygroundError::workspace(&artifact_path, e));
        }
        _ => {}
    }

    let compiler = &config.compiler;
    let output_arg = format!("{}{}", compiler.output_flag, artifact_name);

    let mut command = Command::new(&compiler.program);
    command
        .args(&compiler.args)
        .arg(&source_name)
        .arg(&output_arg)
        .current_dir(root)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    let command_line = {
        let mut parts = vec![compiler.program.display().to_string()];
        parts.extend(compiler.args.iter().cloned());
        parts.push(source_name);
        parts.push(output_arg);
        parts.join(" ")
    };
    debug!("Running: {}", command_line);

    let output = match compiler.timeout() {
        Some(limit) => tokio::time::timeout(limit, command.output())
            .await
            .map_err(|_| PlaygroundError::Timeout {
                module: module.name.clone(),
                timeout_ms: compiler.timeout_ms.unwrap_or_default(),
            })?,
        None => command.output().await,
    }
    .map_err(|source| PlaygroundError::Spawn {
        program: compiler.program.display().to_string(),
        source,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        debug!("{} exited with {}", module.name, output.status);
        return Ok(CompileResult::Failure {
            diagnostic: format!("{}{}\n{}{}", compiler.echo_prefix, command_line, stderr, stdout),
        });
    }

    let produced = tokio::fs::try_exists(&artifact_path)
        .await
        .map_err(|e| PlaygroundError::workspace(&artifact_path, e))?;
    if !produced {
        return Ok(CompileResult::Failure {
            diagnostic: format!(
                "{}{}\n{}{}Compiler exited successfully but did not produce {}",
                compiler.echo_prefix, command_line, stderr, stdout, artifact_name
            ),
        });
    }

    debug!("{} compiled to {}", module.name, artifact_path.display());
    Ok(CompileResult::Success {
        artifact: artifact_path,
    })
}
