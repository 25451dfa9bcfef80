use std::sync::Mutex;
use std::time::Duration;

use tauri::async_runtime::JoinHandle;

use crate::db::models::Chat;
use crate::db::{repos, settings_keys, DbPool};
use crate::error::AppError;

/// Quiet period between the last chat mutation and the actual write.
const SAVE_DEBOUNCE: Duration = Duration::from_millis(250);

/// Persistence adapter for chat session state.
///
/// The chat collection is written debounced: a burst of mutations costs a
/// single write. The active-chat and model slots are tiny and written
/// immediately.
pub struct ChatStorage {
    pool: DbPool,
    debounce: Duration,
    pending_save: Mutex<Option<JoinHandle<()>>>,
}

impl ChatStorage {
    pub fn new(pool: DbPool) -> Self {
        Self::with_debounce(pool, SAVE_DEBOUNCE)
    }

    /// Storage with a custom debounce window. Tests use short ones.
    pub fn with_debounce(pool: DbPool, debounce: Duration) -> Self {
        Self {
            pool,
            debounce,
            pending_save: Mutex::new(None),
        }
    }

    // ------------------------------------------------------------------
    // Chat collection (debounced)
    // ------------------------------------------------------------------

    /// Queue a write of the full chat collection.
    ///
    /// The task runs on the shared Tauri runtime, so callers need no async
    /// context of their own. The write lands `debounce` after the most
    /// recent call; any earlier queued write is cancelled first. A write
    /// still queued at shutdown is dropped, losing at most the final
    /// debounce window of changes.
    pub fn schedule_save_chats(&self, chats: Vec<Chat>) {
        let pool = self.pool.clone();
        let delay = self.debounce;

        let handle = tauri::async_runtime::spawn(async move {
            tokio::time::sleep(delay).await;
            match serde_json::to_string(&chats) {
                Ok(json) => {
                    if let Err(e) = repos::settings::set(&pool, settings_keys::CHATS, &json) {
                        tracing::warn!(error = %e, "Failed to persist chats");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Failed to encode chats"),
            }
        });

        let mut pending = self.pending_save.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(prev) = pending.take() {
            prev.abort();
        }
        *pending = Some(handle);
    }

    /// Stored chat collection, or empty when absent or unreadable.
    pub fn load_chats(&self) -> Vec<Chat> {
        let raw = match repos::settings::get(&self.pool, settings_keys::CHATS) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored chats, starting empty");
                return Vec::new();
            }
        };

        match raw {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Stored chats are unreadable, starting empty");
                Vec::new()
            }),
            None => Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Small slots (immediate)
    // ------------------------------------------------------------------

    pub fn save_active_chat_id(&self, chat_id: &str) -> Result<(), AppError> {
        repos::settings::set(&self.pool, settings_keys::ACTIVE_CHAT_ID, chat_id)
    }

    pub fn load_active_chat_id(&self) -> Option<String> {
        repos::settings::get(&self.pool, settings_keys::ACTIVE_CHAT_ID)
            .ok()
            .flatten()
    }

    pub fn save_selected_model_id(&self, model_id: &str) -> Result<(), AppError> {
        repos::settings::set(&self.pool, settings_keys::SELECTED_MODEL_ID, model_id)
    }

    pub fn load_selected_model_id(&self) -> Option<String> {
        repos::settings::get(&self.pool, settings_keys::SELECTED_MODEL_ID)
            .ok()
            .flatten()
    }
}
