#[cfg(test)]
#[path = "file_test.rs"]
mod tests;

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::CredentialProvider;

/// Persists the token as a single line in `token-file`, so a login survives
/// between runs.
pub struct FileCredentials {
    path: PathBuf,
}

impl Default for FileCredentials {
    fn default() -> FileCredentials {
        return FileCredentials::new(PathBuf::from(Config::get(ConfigKey::TokenFile)));
    }
}

impl FileCredentials {
    pub fn new(path: PathBuf) -> FileCredentials {
        return FileCredentials { path };
    }
}

impl CredentialProvider for FileCredentials {
    fn get_token(&self) -> Option<String> {
        let token = match fs::read_to_string(&self.path) {
            Ok(token) => token,
            Err(err) => {
                if err.kind() != ErrorKind::NotFound {
                    tracing::warn!(error = ?err, path = ?self.path, "unable to read token file");
                }
                return None;
            }
        };

        let token = token.trim();
        if token.is_empty() {
            return None;
        }

        return Some(token.to_string());
    }

    fn set_token(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| return format!("Could not create {}", parent.display()))?;
        }

        fs::write(&self.path, format!("{token}\n"))
            .with_context(|| return format!("Could not write {}", self.path.display()))?;

        return Ok(());
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(err) => {
                return Err(err)
                    .with_context(|| return format!("Could not remove {}", self.path.display()))
            }
        }
    }
}
