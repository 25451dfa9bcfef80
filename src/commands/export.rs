use std::sync::Arc;

use tauri::{AppHandle, State};
use tauri_plugin_dialog::DialogExt;

use crate::db::models::now_ms;
use crate::error::AppError;
use crate::AppState;

/// Lowercased alphanumeric form of a chat title, for filenames.
/// Everything outside `[a-z0-9]` becomes an underscore.
fn filename_fragment(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Prompt for a save location and write `json` there.
/// Returns false when the user cancels the dialog.
async fn save_json_via_dialog(
    app: AppHandle,
    file_name: String,
    json: String,
) -> Result<bool, AppError> {
    let save_path = tokio::task::spawn_blocking(move || {
        app.dialog()
            .file()
            .set_file_name(&file_name)
            .add_filter("Chat Export", &["json"])
            .blocking_save_file()
    })
    .await
    .map_err(|e| AppError::Internal(format!("Dialog task failed: {e}")))?;

    if let Some(file_path) = save_path {
        let path = file_path
            .into_path()
            .map_err(|e| AppError::Internal(format!("Invalid file path: {e}")))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write file: {e}")))?;
        return Ok(true);
    }

    Ok(false)
}

#[tauri::command]
pub async fn export_chat(
    state: State<'_, Arc<AppState>>,
    app: AppHandle,
    chat_id: String,
) -> Result<bool, AppError> {
    let chat = state.chat.chat_by_id(&chat_id)?;
    let json = serde_json::to_string_pretty(&chat)?;

    let file_name = format!("chat-{}-{}.json", filename_fragment(&chat.title), now_ms());
    save_json_via_dialog(app, file_name, json).await
}

#[tauri::command]
pub async fn export_all_chats(
    state: State<'_, Arc<AppState>>,
    app: AppHandle,
) -> Result<bool, AppError> {
    let chats = state.chat.all_chats();
    let json = serde_json::to_string_pretty(&chats)?;

    let file_name = format!("all-chats-{}.json", now_ms());
    save_json_via_dialog(app, file_name, json).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Chat, ChatMessage};

    #[test]
    fn test_filename_fragment_lowercases_and_masks() {
        assert_eq!(filename_fragment("Explain Recursion!"), "explain_recursion_");
        assert_eq!(filename_fragment("Rust & Go"), "rust___go");
        assert_eq!(filename_fragment("New Chat"), "new_chat");
    }

    #[test]
    fn test_export_document_round_trips() {
        let chat = Chat {
            id: "c1".into(),
            title: "Explain recursion".into(),
            model_id: "tinyllama-1.1b-chat".into(),
            created_at: 1000,
            updated_at: 2000,
            messages: vec![
                ChatMessage::user("Explain recursion"),
                ChatMessage::assistant("Recursion is...", None),
            ],
        };

        let json = serde_json::to_string_pretty(&chat).unwrap();
        let parsed: Chat = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, chat);
    }
}
