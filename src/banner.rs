//! Login-time banner.
//!
//! `install-hook` drops a small profile script that runs `hostprep summary`
//! for interactive login shells, so the last run's outcome is shown at the
//! next login without re-running anything. The summary itself is rebuilt
//! from the durable log on every login.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::runner::summarize_log;

/// Build the profile script that prints the summary at login.
pub fn hook_script(binary: &Path, log_path: &Path) -> String {
    format!(
        "# Installed by hostprep. Shows the last provisioning summary at login.\n\
         case \"$-\" in\n  \
           *i*) [ -x {bin} ] && {bin} --log {log} summary 2>/dev/null || true ;;\n\
         esac\n",
        bin = shell_quote(&binary.to_string_lossy()),
        log = shell_quote(&log_path.to_string_lossy()),
    )
}

/// Write the login hook to `hook_path`, creating parent directories.
///
/// Returns the path written. An existing hook is replaced.
pub fn install_login_hook(hook_path: &Path, binary: &Path, log_path: &Path) -> Result<PathBuf> {
    if let Some(parent) = hook_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(hook_path, hook_script(binary, log_path))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(hook_path, fs::Permissions::from_mode(0o644))?;
    }

    tracing::debug!("Installed login hook at {}", hook_path.display());
    Ok(hook_path.to_path_buf())
}

/// The banner text for the most recent run in the log, if any.
pub fn login_banner(log_path: &Path) -> Result<Option<String>> {
    Ok(summarize_log(log_path)?.map(|report| report.render()))
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
