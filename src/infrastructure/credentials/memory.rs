use std::sync::Mutex;

use anyhow::Result;

use crate::domain::models::CredentialProvider;

/// Keeps the token for the life of the process only.
#[derive(Default)]
pub struct MemoryCredentials {
    token: Mutex<Option<String>>,
}

impl CredentialProvider for MemoryCredentials {
    fn get_token(&self) -> Option<String> {
        return self
            .token
            .lock()
            .unwrap_or_else(|e| return e.into_inner())
            .clone();
    }

    fn set_token(&self, token: &str) -> Result<()> {
        *self.token.lock().unwrap_or_else(|e| return e.into_inner()) = Some(token.to_string());
        return Ok(());
    }

    fn clear(&self) -> Result<()> {
        *self.token.lock().unwrap_or_else(|e| return e.into_inner()) = None;
        return Ok(());
    }
}
