//! Chromium-family browsers and where they keep their profile files.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{ChromeSyncError, Result};

/// A supported Chromium-family browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    Chrome,
    Edge,
    Brave,
}

impl Browser {
    /// Vendor directory under `AppData/Local`.
    pub fn vendor(self) -> &'static str {
        match self {
            Self::Chrome => "Google",
            Self::Edge => "Microsoft",
            Self::Brave => "BraveSoftware",
        }
    }

    /// Product directory under the vendor directory.
    pub fn product(self) -> &'static str {
        match self {
            Self::Chrome => "Chrome",
            Self::Edge => "Edge",
            Self::Brave => "Brave-Browser",
        }
    }

    /// `<user>/AppData/Local/<vendor>/<product>/User Data`
    pub fn user_data_dir(self, user_dir: &Path) -> PathBuf {
        user_dir
            .join("AppData")
            .join("Local")
            .join(self.vendor())
            .join(self.product())
            .join("User Data")
    }

    /// Locate the `Login Data` database for `dir`.
    ///
    /// `dir` may be a user's home folder, a copied `User Data` folder,
    /// or a folder holding a loose `Login Data` file.
    pub fn login_data_path(self, dir: &Path) -> Result<PathBuf> {
        first_existing(&[
            self.user_data_dir(dir).join("Default").join("Login Data"),
            dir.join("Default").join("Login Data"),
            dir.join("Login Data"),
        ])
    }

    /// Locate the `Local State` file for `dir`, same rules as above.
    pub fn local_state_path(self, dir: &Path) -> Result<PathBuf> {
        first_existing(&[
            self.user_data_dir(dir).join("Local State"),
            dir.join("Local State"),
        ])
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.vendor(), self.product())
    }
}

/// Return the first candidate that exists, else `NotFound` on the last.
fn first_existing(candidates: &[PathBuf]) -> Result<PathBuf> {
    candidates
        .iter()
        .find(|p| p.is_file())
        .cloned()
        .ok_or_else(|| {
            ChromeSyncError::NotFound(candidates.last().cloned().unwrap_or_default())
        })
}
