//! Detached persistence of provider tokens.
//!
//! Login responses never wait on this work. Jobs are queued to a worker task
//! and any failure ends up in the log instead of the caller.

use std::sync::Arc;
use tokio::sync::mpsc;

use super::provider::ProviderToken;
use crate::auth::UserId;
use crate::db::CredentialStore;

/// Work the persistence worker accepts
#[derive(Debug)]
pub enum PersistenceJob {
    /// Keep the provider token for later API calls on the user's behalf
    SaveOAuthToken {
        user_id: UserId,
        token: ProviderToken,
    },
}

/// Handle for queueing persistence jobs
#[derive(Clone)]
pub struct PersistenceHandle {
    sender: mpsc::UnboundedSender<PersistenceJob>,
}

impl PersistenceHandle {
    /// Queue a job without waiting for it
    pub fn enqueue(&self, job: PersistenceJob) {
        if self.sender.send(job).is_err() {
            log::warn!("Persistence worker is gone, dropping job");
        }
    }
}

/// Worker draining the persistence queue
pub struct PersistenceWorker {
    inbox: mpsc::UnboundedReceiver<PersistenceJob>,
    store: Arc<dyn CredentialStore>,
}

impl PersistenceWorker {
    /// Create a worker and its handle
    pub fn new(store: Arc<dyn CredentialStore>) -> (Self, PersistenceHandle) {
        let (sender, inbox) = mpsc::unbounded_channel();
        (Self { inbox, store }, PersistenceHandle { sender })
    }

    /// Create a worker and run it on the current tokio runtime
    pub fn spawn(store: Arc<dyn CredentialStore>) -> PersistenceHandle {
        let (worker, handle) = Self::new(store);
        tokio::spawn(worker.run());
        handle
    }

    /// Process jobs until every handle is dropped
    pub async fn run(mut self) {
        log::debug!("Persistence worker started");

        while let Some(job) = self.inbox.recv().await {
            match job {
                PersistenceJob::SaveOAuthToken { user_id, token } => {
                    if let Err(e) = self.store.save_oauth_token(user_id, &token).await {
                        log::warn!("Failed to save OAuth token for user {}: {}", user_id, e);
                    }
                }
            }
        }

        log::debug!("Persistence worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_worker_saves_token() {
        let store = Arc::new(MemoryStore::new());
        let (worker, handle) = PersistenceWorker::new(store.clone());
        let user_id = Uuid::now_v7();
        let token = ProviderToken {
            access_token: "gho_abc".to_string(),
            token_type: "bearer".to_string(),
            scope: "read:user".to_string(),
        };

        handle.enqueue(PersistenceJob::SaveOAuthToken {
            user_id,
            token: token.clone(),
        });
        drop(handle);
        worker.run().await;

        assert_eq!(store.oauth_token(user_id).await, Some(token));
    }

    #[tokio::test]
    async fn test_enqueue_after_worker_stopped_does_not_panic() {
        let (worker, handle) = PersistenceWorker::new(Arc::new(MemoryStore::new()));
        drop(worker);

        handle.enqueue(PersistenceJob::SaveOAuthToken {
            user_id: Uuid::now_v7(),
            token: ProviderToken {
                access_token: "gho_abc".to_string(),
                token_type: "bearer".to_string(),
                scope: String::new(),
            },
        });
    }
}
