pub mod storage;
pub mod title;

use std::sync::{Arc, Mutex, MutexGuard};

use tauri::{AppHandle, Emitter};

use crate::api::{AnswerRequest, AnswerResponse, InferenceApi};
use crate::db::models::{
    now_ms, Chat, ChatMessage, ChatSnapshot, HealthInfo, MessageMetadata, ModelInfo,
};
use crate::error::AppError;
use storage::ChatStorage;
use title::{derive_title, PLACEHOLDER_TITLE};

/// Event carrying a full `ChatSnapshot`, emitted when async work
/// (sending, health probing) changes state outside a command response.
pub const STATE_EVENT: &str = "chat-state-changed";

/// Event carrying a `ChatErrorEvent`, emitted when a send fails.
pub const ERROR_EVENT: &str = "chat-error";

/// The model the bundled inference service hosts.
pub const DEFAULT_MODEL_ID: &str = "tinyllama-1.1b-chat";

/// Static catalog shown in the model picker.
pub fn default_models() -> Vec<ModelInfo> {
    vec![ModelInfo {
        id: DEFAULT_MODEL_ID.to_string(),
        label: "TinyLlama 1.1B Chat".to_string(),
        description: Some("Fast and efficient chat model".to_string()),
    }]
}

/// Payload for `chat-error` events, rendered as a transient toast.
#[derive(Debug, Clone, serde::Serialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ChatErrorEvent {
    pub message: String,
}

// ============================================================================
// State
// ============================================================================

struct ChatState {
    chats: Vec<Chat>,
    active_chat_id: Option<String>,
    selected_model_id: String,
    is_loading: bool,
    health: Option<HealthInfo>,
}

fn active_index(state: &ChatState) -> Option<usize> {
    state
        .active_chat_id
        .as_ref()
        .and_then(|id| state.chats.iter().position(|c| c.id == *id))
}

fn new_chat_record(model_id: String) -> Chat {
    let now = now_ms();
    Chat {
        id: uuid::Uuid::new_v4().to_string(),
        title: PLACEHOLDER_TITLE.to_string(),
        model_id,
        created_at: now,
        updated_at: now,
        messages: Vec::new(),
    }
}

/// Toast and transcript wording for a failed send.
///
/// Remote failures keep their status in the text, with `0` standing in
/// for "never got an HTTP response". Anything else gets a generic line.
fn send_failure_text(err: &AppError) -> String {
    match err {
        AppError::Api { .. } => err.to_string(),
        AppError::Transport(_) => format!("API Error (0): {}", err),
        _ => "Failed to send message. Please try again.".to_string(),
    }
}

/// The synchronous half of a send, handed to the inference call.
struct SendBegin {
    chat_id: String,
    question: String,
}

// ============================================================================
// ChatManager
// ============================================================================

/// Owns all chat session state and coordinates inference and persistence.
///
/// Every mutation goes through one mutex. The lock is only held for
/// synchronous sections, never across an await: sends split into a
/// locked begin step, the unlocked HTTP call, and a locked complete step.
pub struct ChatManager {
    state: Mutex<ChatState>,
    storage: ChatStorage,
    api: Arc<dyn InferenceApi>,
}

impl ChatManager {
    pub fn new(storage: ChatStorage, api: Arc<dyn InferenceApi>) -> Self {
        Self {
            state: Mutex::new(ChatState {
                chats: Vec::new(),
                active_chat_id: None,
                selected_model_id: DEFAULT_MODEL_ID.to_string(),
                is_loading: false,
                health: None,
            }),
            storage,
            api,
        }
    }

    fn state(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ------------------------------------------------------------------
    // Startup
    // ------------------------------------------------------------------

    /// Restore chats, selection, and model choice from the database.
    ///
    /// A stored active id that no longer matches any chat falls back to
    /// the first chat in the list; unreadable stored chats fall back to
    /// an empty session rather than failing startup. The restored
    /// selection is written back, so a stale stored id is replaced at
    /// once instead of lingering until the next selection change.
    pub fn load_persisted(&self) {
        let chats = self.storage.load_chats();
        let saved_active = self.storage.load_active_chat_id();
        let model = self
            .storage
            .load_selected_model_id()
            .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());

        let mut state = self.state();
        state.active_chat_id = match saved_active {
            Some(id) if chats.iter().any(|c| c.id == id) => Some(id),
            _ => chats.first().map(|c| c.id.clone()),
        };
        state.chats = chats;
        state.selected_model_id = model;
        self.persist_active(&state);

        tracing::info!(
            chats = state.chats.len(),
            active = ?state.active_chat_id,
            model = %state.selected_model_id,
            "Session restored"
        );
    }

    /// Ask the service for its health once, at startup.
    ///
    /// Failure leaves the health slot empty and is otherwise silent; the
    /// app works offline until the first send fails visibly.
    pub async fn probe_health(&self, app: Option<&AppHandle>) {
        match self.api.health().await {
            Ok(health) => {
                tracing::info!(
                    status = %health.status,
                    model_path = %health.model_path,
                    "Inference service reachable"
                );
                {
                    let mut state = self.state();
                    state.health = Some(HealthInfo {
                        device: health.status,
                        model_path: health.model_path,
                    });
                }
                self.emit_state(app);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Inference service health check failed");
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Full state snapshot for the presentation layer.
    pub fn snapshot(&self) -> ChatSnapshot {
        let state = self.state();
        ChatSnapshot {
            chats: state.chats.clone(),
            active_chat_id: state.active_chat_id.clone(),
            selected_model_id: state.selected_model_id.clone(),
            is_loading: state.is_loading,
            health: state.health.clone(),
            models: default_models(),
        }
    }

    /// The chat with the given id, cloned for export.
    pub fn chat_by_id(&self, chat_id: &str) -> Result<Chat, AppError> {
        let state = self.state();
        state
            .chats
            .iter()
            .find(|c| c.id == chat_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("chat {chat_id}")))
    }

    /// All chats in list order, cloned for export.
    pub fn all_chats(&self) -> Vec<Chat> {
        self.state().chats.clone()
    }

    // ------------------------------------------------------------------
    // Chat lifecycle
    // ------------------------------------------------------------------

    /// Create an empty chat bound to `model_id` (or the selected model)
    /// and make it active. New chats go to the front of the list.
    pub fn create_chat(&self, model_id: Option<String>) -> Chat {
        let mut state = self.state();
        let chat = new_chat_record(model_id.unwrap_or_else(|| state.selected_model_id.clone()));
        state.active_chat_id = Some(chat.id.clone());
        state.chats.insert(0, chat.clone());

        self.persist_chats(&state);
        self.persist_active(&state);
        chat
    }

    /// Rename a chat. Unknown ids are ignored.
    pub fn rename_chat(&self, chat_id: &str, title: &str) {
        let mut state = self.state();
        let Some(chat) = state.chats.iter_mut().find(|c| c.id == chat_id) else {
            return;
        };

        chat.title = title.to_string();
        chat.touch();
        self.persist_chats(&state);
    }

    /// Make the given chat active. Unknown ids are rejected.
    pub fn set_active_chat(&self, chat_id: &str) -> Result<(), AppError> {
        let mut state = self.state();
        if !state.chats.iter().any(|c| c.id == chat_id) {
            return Err(AppError::NotFound(format!("chat {chat_id}")));
        }

        state.active_chat_id = Some(chat_id.to_string());
        self.persist_active(&state);
        Ok(())
    }

    /// Delete a chat, ignoring ids that are already gone. Deleting the
    /// active chat activates the first remaining one, or clears the
    /// selection when none are left.
    pub fn delete_chat(&self, chat_id: &str) {
        let mut state = self.state();
        let before = state.chats.len();
        state.chats.retain(|c| c.id != chat_id);
        if state.chats.len() == before {
            return;
        }

        if state.active_chat_id.as_deref() == Some(chat_id) {
            state.active_chat_id = state.chats.first().map(|c| c.id.clone());
        }

        self.persist_chats(&state);
        self.persist_active(&state);
    }

    /// Change the selected model. Selecting the current model is a no-op.
    ///
    /// An active chat with history keeps its transcript: a fresh chat is
    /// created for the new model and activated. An empty active chat is
    /// rebound in place.
    pub fn switch_model(&self, model_id: &str) {
        let mut state = self.state();
        if state.selected_model_id == model_id {
            return;
        }

        state.selected_model_id = model_id.to_string();
        if let Err(e) = self.storage.save_selected_model_id(model_id) {
            tracing::warn!(error = %e, "Failed to persist model choice");
        }

        match active_index(&state) {
            Some(idx) if !state.chats[idx].messages.is_empty() => {
                tracing::info!(model = %model_id, "Model switched, forking a fresh chat");
                let chat = new_chat_record(model_id.to_string());
                state.active_chat_id = Some(chat.id.clone());
                state.chats.insert(0, chat);
                self.persist_chats(&state);
                self.persist_active(&state);
            }
            Some(idx) => {
                state.chats[idx].model_id = model_id.to_string();
                state.chats[idx].touch();
                self.persist_chats(&state);
            }
            None => {}
        }
    }

    /// Drop every message in the active chat and reset its title.
    /// No-op when no chat is active.
    pub fn clear_chat(&self) {
        let mut state = self.state();
        let Some(idx) = active_index(&state) else {
            return;
        };

        let chat = &mut state.chats[idx];
        chat.messages.clear();
        chat.title = PLACEHOLDER_TITLE.to_string();
        chat.touch();
        self.persist_chats(&state);
    }

    // ------------------------------------------------------------------
    // Sending
    // ------------------------------------------------------------------

    /// Deliver `content` to the active chat (creating one when none is
    /// active), ask the inference service, and append its reply.
    ///
    /// Blank input and sends issued while one is in flight are ignored.
    /// A failed call appends an `Error:` line to the transcript and
    /// emits a `chat-error` event; this method never returns an error.
    pub async fn send_message(&self, app: Option<&AppHandle>, content: &str) {
        let Some(begin) = self.begin_send(content) else {
            return;
        };
        self.emit_state(app);

        tracing::debug!(chat_id = %begin.chat_id, "Asking inference service");
        let result = self.api.answer(AnswerRequest::question(begin.question)).await;
        if let Err(e) = &result {
            tracing::warn!(chat_id = %begin.chat_id, error = %e, "Inference request failed");
        }

        if let Some(toast) = self.complete_send(&begin.chat_id, result) {
            self.emit_error(app, toast);
        }
        self.emit_state(app);
    }

    /// Send the active chat's most recent user message again.
    ///
    /// The question is appended as a new turn rather than replacing the
    /// failed exchange. No-op when there is no user turn to repeat.
    pub async fn retry_last_message(&self, app: Option<&AppHandle>) {
        let question = {
            let state = self.state();
            active_index(&state)
                .and_then(|idx| state.chats[idx].last_user_message())
                .map(|m| m.content.clone())
        };

        if let Some(question) = question {
            self.send_message(app, &question).await;
        }
    }

    /// Guards, chat setup, and the user-turn append, all under one lock.
    ///
    /// Returns None when the send should be silently dropped.
    fn begin_send(&self, content: &str) -> Option<SendBegin> {
        let question = content.trim();

        let mut state = self.state();
        if question.is_empty() || state.is_loading {
            return None;
        }

        let mut created = false;
        let idx = match active_index(&state) {
            Some(idx) => idx,
            None => {
                let chat = new_chat_record(state.selected_model_id.clone());
                state.active_chat_id = Some(chat.id.clone());
                state.chats.insert(0, chat);
                created = true;
                0
            }
        };

        let chat = &mut state.chats[idx];
        if chat.messages.is_empty() {
            chat.title = derive_title(question);
        }
        chat.messages.push(ChatMessage::user(question));
        chat.touch();

        let begin = SendBegin {
            chat_id: chat.id.clone(),
            question: question.to_string(),
        };

        state.is_loading = true;
        self.persist_chats(&state);
        if created {
            self.persist_active(&state);
        }
        Some(begin)
    }

    /// Append the service's reply (or an error line) and stop loading.
    ///
    /// Returns the toast text when the send failed. A chat deleted while
    /// its request was in flight swallows the reply.
    fn complete_send(
        &self,
        chat_id: &str,
        result: Result<AnswerResponse, AppError>,
    ) -> Option<String> {
        let mut state = self.state();
        state.is_loading = false;

        let (message, toast) = match result {
            Ok(response) => (
                ChatMessage::assistant(
                    response.answer,
                    Some(MessageMetadata {
                        elapsed_sec: Some(response.elapsed_sec),
                        device: Some(response.device),
                    }),
                ),
                None,
            ),
            Err(e) => {
                let text = send_failure_text(&e);
                (
                    ChatMessage::assistant(format!("Error: {}", text), None),
                    Some(text),
                )
            }
        };

        if let Some(chat) = state.chats.iter_mut().find(|c| c.id == chat_id) {
            chat.messages.push(message);
            chat.touch();
            self.persist_chats(&state);
        }
        toast
    }

    // ------------------------------------------------------------------
    // Persistence triggers
    // ------------------------------------------------------------------

    /// Written only when the list is non-empty: an emptied list never
    /// overwrites the stored document.
    fn persist_chats(&self, state: &ChatState) {
        if !state.chats.is_empty() {
            self.storage.schedule_save_chats(state.chats.clone());
        }
    }

    /// Written immediately, and only while some chat is selected.
    fn persist_active(&self, state: &ChatState) {
        if let Some(id) = &state.active_chat_id {
            if let Err(e) = self.storage.save_active_chat_id(id) {
                tracing::warn!(error = %e, "Failed to persist active chat id");
            }
        }
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    fn emit_state(&self, app: Option<&AppHandle>) {
        if let Some(app) = app {
            let _ = app.emit(STATE_EVENT, self.snapshot());
        }
    }

    fn emit_error(&self, app: Option<&AppHandle>, message: String) {
        if let Some(app) = app {
            let _ = app.emit(ERROR_EVENT, ChatErrorEvent { message });
        }
    }
}
