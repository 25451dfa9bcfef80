use std::sync::Arc;

use tauri::{AppHandle, State};

use crate::chat::default_models;
use crate::db::models::{ChatSnapshot, ModelInfo};
use crate::error::AppError;
use crate::AppState;

#[tauri::command]
pub fn get_chat_state(state: State<'_, Arc<AppState>>) -> ChatSnapshot {
    state.chat.snapshot()
}

#[tauri::command]
pub fn list_models() -> Vec<ModelInfo> {
    default_models()
}

#[tauri::command]
pub fn create_chat(state: State<'_, Arc<AppState>>, model_id: Option<String>) -> ChatSnapshot {
    state.chat.create_chat(model_id);
    state.chat.snapshot()
}

#[tauri::command]
pub fn set_active_chat(
    state: State<'_, Arc<AppState>>,
    chat_id: String,
) -> Result<ChatSnapshot, AppError> {
    state.chat.set_active_chat(&chat_id)?;
    Ok(state.chat.snapshot())
}

#[tauri::command]
pub fn rename_chat(
    state: State<'_, Arc<AppState>>,
    chat_id: String,
    title: String,
) -> ChatSnapshot {
    state.chat.rename_chat(&chat_id, &title);
    state.chat.snapshot()
}

#[tauri::command]
pub fn delete_chat(state: State<'_, Arc<AppState>>, chat_id: String) -> ChatSnapshot {
    state.chat.delete_chat(&chat_id);
    state.chat.snapshot()
}

#[tauri::command]
pub fn switch_model(state: State<'_, Arc<AppState>>, model_id: String) -> ChatSnapshot {
    state.chat.switch_model(&model_id);
    state.chat.snapshot()
}

#[tauri::command]
pub fn clear_chat(state: State<'_, Arc<AppState>>) -> ChatSnapshot {
    state.chat.clear_chat();
    state.chat.snapshot()
}

#[tauri::command]
pub async fn send_message(
    state: State<'_, Arc<AppState>>,
    app: AppHandle,
    content: String,
) -> Result<ChatSnapshot, AppError> {
    state.chat.send_message(Some(&app), &content).await;
    Ok(state.chat.snapshot())
}

#[tauri::command]
pub async fn retry_last_message(
    state: State<'_, Arc<AppState>>,
    app: AppHandle,
) -> Result<ChatSnapshot, AppError> {
    state.chat.retry_last_message(Some(&app)).await;
    Ok(state.chat.snapshot())
}
