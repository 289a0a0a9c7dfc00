/// The scratch directory shared by every compile request

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::PlaygroundConfig;
use crate::error::{PlaygroundError, Result};
use crate::module::PrimaryModule;

/// Outcome of a cleanup pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanReport {
    pub removed: usize,
    pub failed: usize,
}

/// Records which primary module file the last compile wrote.
const PRIMARY_RECORD: &str = ".primary";

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    source_extension: String,
    artifact_extension: String,
    default_primary: String,
}

impl Workspace {
    pub fn new(config: &PlaygroundConfig) -> Self {
        Self {
            root: config.workspace_dir.clone(),
            source_extension: config.source_extension.clone(),
            artifact_extension: config.artifact_extension.clone(),
            default_primary: config.default_primary_file_name(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the workspace directory if needed.
    pub async fn prepare(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| PlaygroundError::workspace(&self.root, e))
    }

    /// Overwrite the primary module file and record its name. Returns the file name.
    pub async fn write_primary(&self, primary: &PrimaryModule) -> Result<String> {
        let file_name = format!("{}.{}", primary.name, self.source_extension);
        let path = self.root.join(&file_name);
        tokio::fs::write(&path, &primary.source)
            .await
            .map_err(|e| PlaygroundError::workspace(&path, e))?;

        let record = self.root.join(PRIMARY_RECORD);
        tokio::fs::write(&record, &file_name)
            .await
            .map_err(|e| PlaygroundError::workspace(&record, e))?;

        debug!("Wrote primary module {}", path.display());
        Ok(file_name)
    }

    /// File name of the primary module, as recorded by the last `write_primary`
    /// in this directory. Falls back to the default module's file.
    pub async fn primary_file(&self) -> Result<String> {
        let record = self.root.join(PRIMARY_RECORD);
        match tokio::fs::read_to_string(&record).await {
            Ok(name) if !name.trim().is_empty() => Ok(name.trim().to_string()),
            Ok(_) => Ok(self.default_primary.clone()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(self.default_primary.clone()),
            Err(e) => Err(PlaygroundError::workspace(&record, e)),
        }
    }

    fn is_generated(&self, path: &Path) -> bool {
        let extension = path.extension().and_then(OsStr::to_str);
        extension == Some(self.source_extension.as_str())
            || extension == Some(self.artifact_extension.as_str())
    }

    /// Delete generated sources and artifacts, keeping the primary module file.
    ///
    /// A file that cannot be removed is logged and skipped.
    pub async fn clean(&self) -> Result<CleanReport> {
        let mut report = CleanReport::default();
        let reserved = self.primary_file().await?;

        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(report),
            Err(e) => return Err(PlaygroundError::workspace(&self.root, e)),
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => return Err(PlaygroundError::workspace(&self.root, e)),
            };

            let path = entry.path();
            if entry.file_name().as_os_str() == OsStr::new(&reserved) || !self.is_generated(&path) {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => report.removed += 1,
                Err(e) => {
                    warn!("Failed to remove {}: {}", path.display(), e);
                    report.failed += 1;
                }
            }
        }

        debug!(
            "Cleaned {}: {} removed, {} failed",
            self.root.display(),
            report.removed,
            report.failed
        );
        Ok(report)
    }
}
