//! Saving exported payloads.

use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PhotonError, Result};
use crate::export::NamedPayload;

/// Hands a finished payload to the user.
pub trait FileDelivery {
    /// Save `payload` and return where it ended up.
    fn deliver(&self, payload: &NamedPayload) -> Result<PathBuf>;
}

/// Writes payloads into a directory, creating it when missing.
/// Existing files with the same name are overwritten.
#[derive(Debug, Clone)]
pub struct DirectoryDelivery {
    dir: PathBuf,
}

impl DirectoryDelivery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileDelivery for DirectoryDelivery {
    fn deliver(&self, payload: &NamedPayload) -> Result<PathBuf> {
        let failed = |e: std::io::Error| PhotonError::DeliveryFailed {
            name: payload.name.clone(),
            reason: e.to_string(),
        };

        // Names are generated, but never let one escape the directory.
        let file_name = Path::new(&payload.name)
            .file_name()
            .ok_or_else(|| PhotonError::DeliveryFailed {
                name: payload.name.clone(),
                reason: "not a file name".to_string(),
            })?;

        fs::create_dir_all(&self.dir).map_err(failed)?;
        let path = self.dir.join(file_name);
        fs::write(&path, &payload.bytes).map_err(failed)?;
        info!("Saved {} ({} bytes)", path.display(), payload.bytes.len());
        Ok(path)
    }
}
