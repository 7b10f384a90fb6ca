//! Remote publishing of the rendered page
//!
//! Single best-effort `scp` of the output file. Shells out to the system
//! binary; a failed transfer never touches the build result on disk.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::types::{Result, ShelfError};

/// Where the rendered collection page gets uploaded
#[derive(Debug, Clone)]
pub struct PublishTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub remote_path: String,
    pub identity: Option<PathBuf>,
}

impl PublishTarget {
    /// `user@host:path` destination string for scp
    pub fn destination(&self) -> String {
        format!("{}@{}:{}", self.user, self.host, self.remote_path)
    }

    /// Argument list for the scp invocation
    fn scp_args(&self, file: &Path, identity: Option<&Path>) -> Vec<String> {
        let mut args = vec![
            "-P".to_string(),
            self.port.to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
        ];
        if let Some(key) = identity {
            args.push("-i".to_string());
            args.push(key.to_string_lossy().into_owned());
        }
        args.push(file.to_string_lossy().into_owned());
        args.push(self.destination());
        args
    }

    /// Stage the identity key as a 0600 temp copy.
    ///
    /// The key usually lives on a FAT32 SD card which cannot hold the
    /// permissions ssh insists on.
    fn staged_identity(&self) -> Result<Option<PathBuf>> {
        let Some(source) = &self.identity else {
            return Ok(None);
        };

        let staged = std::env::temp_dir().join("retroshelf_publish_key");
        std::fs::copy(source, &staged)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&staged, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(Some(staged))
    }

    /// Copy `file` to the remote host. One attempt, no retries.
    pub fn publish(&self, file: &Path) -> Result<()> {
        let identity = self.staged_identity()?;
        let args = self.scp_args(file, identity.as_deref());

        let output = Command::new("scp")
            .args(&args)
            .output()
            .map_err(|e| ShelfError::Publish(format!("failed to run scp: {}", e)))?;

        if !output.status.success() {
            return Err(ShelfError::Publish(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(())
    }
}
