use crate::domain::auth::AuthSession;
use crate::domain::ports::CredentialStore;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Credential store that lives only as long as the process.
///
/// `Clone` shares the slot, so a test can keep a handle and inspect what the
/// context saved.
#[derive(Default, Clone)]
pub struct InMemoryCredentialStore {
    slot: Arc<RwLock<Option<AuthSession>>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: AuthSession) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(session))),
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn save(&self, session: &AuthSession) -> Result<()> {
        *self.slot.write().await = Some(session.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<AuthSession>> {
        Ok(self.slot.read().await.clone())
    }

    async fn clear(&self) -> Result<()> {
        self.slot.write().await.take();
        Ok(())
    }
}
