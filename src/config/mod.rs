//! Workflow file loading, parsing, and validation.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use hostprep::config::{parse_config, validate};
//! use std::path::Path;
//!
//! let yaml = r#"
//! steps:
//!   - name: update
//!     command: apt-get update -y
//!   - name: docker
//!     command: sh /opt/bootstrap/docker.sh
//!     skip_if: { type: command_succeeds, command: "command -v docker" }
//! "#;
//!
//! let config = parse_config(yaml, Path::new("hostprep.yml")).unwrap();
//! validate(&config).unwrap();
//! assert_eq!(config.steps.len(), 2);
//! ```
//!
//! # Workflow File Locations
//!
//! 1. `--config <path>` or `HOSTPREP_CONFIG`
//! 2. `./hostprep.yml`
//! 3. `/etc/hostprep/workflow.yml`

pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::{
    load_config, load_config_file, parse_config, ConfigPaths, LOCAL_CONFIG_NAME,
    SYSTEM_CONFIG_PATH,
};
pub use schema::{Settings, SkipCheck, StepConfig, WorkflowConfig, DEFAULT_HOOK_PATH};
pub use validator::{validate, validate_config, ValidationError};
