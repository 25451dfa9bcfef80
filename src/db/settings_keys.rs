/// Canonical settings key constants for the `app_settings` table.
///
/// Use these instead of raw string literals to prevent typo-based key mismatches.

/// Full chat collection, stored as one JSON document (ordered array of
/// `Chat` records). Overwritten whole on every save.
pub const CHATS: &str = "chats";

/// Identifier of the chat shown in the transcript pane.
pub const ACTIVE_CHAT_ID: &str = "active_chat_id";

/// Identifier of the model new chats are bound to.
pub const SELECTED_MODEL_ID: &str = "selected_model_id";
