use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::quiz::controller::QuizController;

/// In-memory registry of running quiz controllers, keyed by a handle
/// independent of the database session id (which may be absent when the
/// session insert degraded). The database stays the source of truth
/// between sessions; this map only exists while a quiz is being driven.
#[derive(Clone, Default)]
pub struct ActiveSessions {
    inner: Arc<RwLock<HashMap<Uuid, Arc<Mutex<QuizController>>>>>,
}

impl ActiveSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, controller: QuizController) -> Uuid {
        let practice_id = Uuid::new_v4();
        self.inner
            .write()
            .await
            .insert(practice_id, Arc::new(Mutex::new(controller)));
        practice_id
    }

    pub async fn get(&self, practice_id: Uuid) -> Option<Arc<Mutex<QuizController>>> {
        self.inner.read().await.get(&practice_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// One clock tick for every live controller; driven by a 1-second
    /// interval from main.
    pub async fn tick_all(&self) {
        let controllers: Vec<Arc<Mutex<QuizController>>> =
            self.inner.read().await.values().cloned().collect();
        for controller in controllers {
            controller.lock().await.tick();
        }
    }

    /// Drops finished controllers and controllers idle past the limit. An
    /// abandoned quiz is evicted without finalizing: its database row
    /// simply stays in_progress, exactly as when a browser tab is closed.
    pub async fn evict(&self, idle_limit: Duration) {
        let mut stale: Vec<Uuid> = Vec::new();
        {
            let map = self.inner.read().await;
            for (practice_id, controller) in map.iter() {
                let guard = controller.lock().await;
                if guard.is_finished() || guard.is_idle(idle_limit) {
                    stale.push(*practice_id);
                }
            }
        }
        if stale.is_empty() {
            return;
        }
        let mut map = self.inner.write().await;
        for practice_id in stale {
            if map.remove(&practice_id).is_some() {
                tracing::info!(%practice_id, "evicted practice session from registry");
            }
        }
    }
}
