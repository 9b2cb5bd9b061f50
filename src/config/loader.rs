//! Workflow file discovery and loading.

use crate::config::schema::WorkflowConfig;
use crate::config::validator::validate;
use crate::error::{HostprepError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Workflow file looked up in the working directory.
pub const LOCAL_CONFIG_NAME: &str = "hostprep.yml";

/// System-wide workflow file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/hostprep/workflow.yml";

/// Candidate workflow file locations in priority order.
///
/// 1. An explicit path (`--config` / `HOSTPREP_CONFIG`)
/// 2. `./hostprep.yml`
/// 3. `/etc/hostprep/workflow.yml`
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Explicitly requested file; when set, nothing else is considered.
    pub explicit: Option<PathBuf>,

    /// Workflow file in the working directory.
    pub local: PathBuf,

    /// System-wide workflow file.
    pub system: PathBuf,
}

impl ConfigPaths {
    /// Build the candidate list for a working directory.
    pub fn new(explicit: Option<&Path>, cwd: &Path) -> Self {
        Self {
            explicit: explicit.map(Path::to_path_buf),
            local: cwd.join(LOCAL_CONFIG_NAME),
            system: PathBuf::from(SYSTEM_CONFIG_PATH),
        }
    }

    /// Resolve the workflow file to load.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` naming the explicit path, or the local
    /// candidate when nothing exists.
    pub fn resolve(&self) -> Result<PathBuf> {
        if let Some(path) = &self.explicit {
            if path.is_file() {
                return Ok(path.clone());
            }
            return Err(HostprepError::ConfigNotFound { path: path.clone() });
        }

        [&self.local, &self.system]
            .into_iter()
            .find(|p| p.is_file())
            .cloned()
            .ok_or_else(|| HostprepError::ConfigNotFound {
                path: self.local.clone(),
            })
    }
}

/// Load a single workflow file without validating it.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<WorkflowConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            HostprepError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            HostprepError::Io(e)
        }
    })?;

    parse_config(&content, path)
}

/// Parse YAML content into a `WorkflowConfig`.
///
/// # Arguments
///
/// * `content` - The YAML content to parse
/// * `source_path` - Path for error reporting
pub fn parse_config(content: &str, source_path: &Path) -> Result<WorkflowConfig> {
    // An empty file is an empty workflow, not a parse error.
    if content.trim().is_empty() {
        return Ok(WorkflowConfig::default());
    }

    serde_yaml::from_str(content).map_err(|e| HostprepError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Discover, load and validate the workflow file.
///
/// Returns the path that was loaded alongside the config.
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<(PathBuf, WorkflowConfig)> {
    let path = ConfigPaths::new(explicit, cwd).resolve()?;
    tracing::debug!("Loading workflow from {}", path.display());

    let config = load_config_file(&path)?;
    validate(&config)?;

    Ok((path, config))
}
