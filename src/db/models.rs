use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Current time as epoch milliseconds, the unit used for all chat timestamps.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ============================================================================
// Messages
// ============================================================================

/// Author of one transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Performance details reported by the inference service for one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_sec: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

/// One turn in a chat. Immutable once created; never edited, only appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    /// Creation time, epoch milliseconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: MessageRole::User,
            content: content.into(),
            timestamp: now_ms(),
            metadata: None,
        }
    }

    pub fn assistant(content: impl Into<String>, metadata: Option<MessageMetadata>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: now_ms(),
            metadata,
        }
    }
}

// ============================================================================
// Chats
// ============================================================================

/// A titled, ordered sequence of messages bound to one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub title: String,
    pub model_id: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds, bumped on every mutation. Invariant: >= created_at.
    pub updated_at: i64,
    pub messages: Vec<ChatMessage>,
}

impl Chat {
    /// Bump `updated_at` to now.
    pub fn touch(&mut self) {
        self.updated_at = now_ms();
    }

    /// Most recent user-authored message, scanning from the end.
    pub fn last_user_message(&self) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
    }
}

// ============================================================================
// Models / health
// ============================================================================

/// Static descriptor of a selectable model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Last known state of the inference service, from the startup probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct HealthInfo {
    pub device: String,
    pub model_path: String,
}

// ============================================================================
// Snapshot handed to the webview
// ============================================================================

/// Full session state consumed by the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ChatSnapshot {
    pub chats: Vec<Chat>,
    pub active_chat_id: Option<String>,
    pub selected_model_id: String,
    pub is_loading: bool,
    pub health: Option<HealthInfo>,
    pub models: Vec<ModelInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_serializes_camel_case() {
        let chat = Chat {
            id: "c1".into(),
            title: "New Chat".into(),
            model_id: "tinyllama-1.1b-chat".into(),
            created_at: 1000,
            updated_at: 2000,
            messages: vec![ChatMessage {
                id: "m1".into(),
                role: MessageRole::Assistant,
                content: "hi".into(),
                timestamp: 1500,
                metadata: Some(MessageMetadata {
                    elapsed_sec: Some(0.42),
                    device: Some("cpu".into()),
                }),
            }],
        };

        let json = serde_json::to_value(&chat).unwrap();
        assert_eq!(json["modelId"], "tinyllama-1.1b-chat");
        assert_eq!(json["createdAt"], 1000);
        assert_eq!(json["messages"][0]["role"], "assistant");
        assert_eq!(json["messages"][0]["metadata"]["elapsedSec"], 0.42);
        assert_eq!(json["messages"][0]["metadata"]["device"], "cpu");
    }

    #[test]
    fn test_message_metadata_omitted_when_absent() {
        let msg = ChatMessage::user("hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn test_last_user_message_scans_backward() {
        let mut chat = Chat {
            id: "c1".into(),
            title: "New Chat".into(),
            model_id: "m".into(),
            created_at: 0,
            updated_at: 0,
            messages: vec![],
        };
        assert!(chat.last_user_message().is_none());

        chat.messages.push(ChatMessage::user("first"));
        chat.messages.push(ChatMessage::assistant("reply", None));
        chat.messages.push(ChatMessage::user("second"));
        chat.messages.push(ChatMessage::assistant("reply two", None));

        assert_eq!(chat.last_user_message().unwrap().content, "second");
    }
}
