pub mod api;
pub mod chat;
mod commands;
pub mod db;
pub mod error;
mod logging;

use std::sync::Arc;

use tauri::Manager;

/// Shared application state accessible from all Tauri commands.
pub struct AppState {
    pub chat: Arc<chat::ChatManager>,
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    dotenvy::dotenv().ok();

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let app_data_dir = app
                .path()
                .app_data_dir()
                .expect("Failed to resolve app data directory");

            logging::init(&app_data_dir.join("logs"));
            tracing::info!("Starting TinyChat v{}", env!("CARGO_PKG_VERSION"));

            let pool = db::init_db(&app_data_dir)?;
            tracing::info!("Database pool ready (max_size=4)");

            let config = api::ApiConfig::from_env();
            tracing::info!(base_url = %config.base_url, "Inference service configured");
            let client = Arc::new(api::InferenceClient::new(config));

            let manager = Arc::new(chat::ChatManager::new(
                chat::storage::ChatStorage::new(pool),
                client,
            ));
            manager.load_persisted();

            app.manage(Arc::new(AppState {
                chat: manager.clone(),
            }));

            // One-shot probe; the UI shows the result whenever it lands.
            let handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                manager.probe_health(Some(&handle)).await;
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Chat state
            commands::chat::get_chat_state,
            commands::chat::list_models,
            commands::chat::create_chat,
            commands::chat::set_active_chat,
            commands::chat::rename_chat,
            commands::chat::delete_chat,
            commands::chat::switch_model,
            commands::chat::clear_chat,
            commands::chat::send_message,
            commands::chat::retry_last_message,
            // Export
            commands::export::export_chat,
            commands::export::export_all_chats,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
