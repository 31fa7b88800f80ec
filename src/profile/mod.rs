//! Profile discovery — which user folders to look at.
//!
//! Triage rules:
//! - `CurrentUser`: the running user's home folder.
//! - `UserFolder`: exactly the folder given.
//! - `AllUsers`: every real user folder under the users root, but only
//!   when master keys were supplied (otherwise nothing could be
//!   decrypted, so nothing is returned).
//! - `RemoteHost`: the given folder on that host, or every folder under
//!   its administrative `C$\Users` share.

pub mod browser;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::errors::{ChromeSyncError, Result};

pub use browser::Browser;

/// Folders under a users root that never belong to a real account.
const SKIPPED_USER_FOLDERS: &[&str] = &["Public", "Default", "Default User", "All Users"];

/// Which set of profiles to triage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriageContext {
    CurrentUser,
    UserFolder(PathBuf),
    AllUsers,
    RemoteHost {
        host: String,
        user_folder: Option<PathBuf>,
    },
}

/// Supplies candidate user folders for a triage context.
pub trait ProfileLocator {
    fn enumerate(&self, context: &TriageContext) -> Result<Vec<PathBuf>>;
}

/// Filesystem-backed locator.
#[derive(Debug, Clone)]
pub struct FsProfileLocator {
    users_root: PathBuf,
    master_keys_supplied: bool,
}

impl FsProfileLocator {
    pub fn new(users_root: impl Into<PathBuf>) -> Self {
        Self {
            users_root: users_root.into(),
            master_keys_supplied: false,
        }
    }

    /// Whether the operator passed master keys (enables `AllUsers`).
    pub fn with_master_keys_supplied(mut self, supplied: bool) -> Self {
        self.master_keys_supplied = supplied;
        self
    }

    fn list_user_folders(root: &Path) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(root).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ChromeSyncError::NotFound(root.to_path_buf()),
            ErrorKind::PermissionDenied => ChromeSyncError::AccessDenied(root.to_path_buf()),
            _ => ChromeSyncError::Io(e),
        })?;

        let mut folders = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            if SKIPPED_USER_FOLDERS.iter().any(|s| name == *s) {
                continue;
            }
            folders.push(entry.path());
        }

        folders.sort();
        Ok(folders)
    }
}

impl ProfileLocator for FsProfileLocator {
    fn enumerate(&self, context: &TriageContext) -> Result<Vec<PathBuf>> {
        match context {
            TriageContext::CurrentUser => {
                tracing::info!("triaging logins for current user");
                Ok(vec![current_user_dir()?])
            }
            TriageContext::UserFolder(path) => Ok(vec![path.clone()]),
            TriageContext::AllUsers => {
                if !self.master_keys_supplied {
                    tracing::warn!("all-users triage requested but no master keys supplied");
                    return Ok(Vec::new());
                }
                tracing::info!(root = %self.users_root.display(), "triaging logins for all users");
                Self::list_user_folders(&self.users_root)
            }
            TriageContext::RemoteHost { host, user_folder } => match user_folder {
                Some(folder) => Ok(vec![folder.clone()]),
                None => {
                    let share = PathBuf::from(format!(r"\\{host}\C$\Users"));
                    tracing::info!(host = %host, "triaging logins on remote host");
                    Self::list_user_folders(&share)
                }
            },
        }
    }
}

/// The running user's home folder.
pub fn current_user_dir() -> Result<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| {
            ChromeSyncError::ConfigError("cannot determine the current user's home folder".into())
        })
}

/// Platform default for where user folders live.
pub fn default_users_root() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\Users")
    } else {
        PathBuf::from("/home")
    }
}
