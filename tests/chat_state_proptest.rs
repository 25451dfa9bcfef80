//! Property tests for chat session bookkeeping.
//!
//! Whatever sequence of lifecycle operations runs, the selection must
//! never point at a chat that does not exist, a non-empty list must
//! always have a selection, and completed sends must leave transcripts
//! as clean user/assistant pairs.

use std::sync::Arc;

use proptest::prelude::*;

use app_lib::api::{AnswerRequest, AnswerResponse, HealthResponse, InferenceApi};
use app_lib::chat::storage::ChatStorage;
use app_lib::chat::ChatManager;
use app_lib::db;
use app_lib::db::models::MessageRole;
use app_lib::error::AppError;

const MODELS: &[&str] = &["tinyllama-1.1b-chat", "phi-2", "mistral-7b-instruct"];

/// Inference double that answers every question immediately.
struct EchoApi;

#[async_trait::async_trait]
impl InferenceApi for EchoApi {
    async fn health(&self) -> Result<HealthResponse, AppError> {
        Err(AppError::Transport("offline".into()))
    }

    async fn answer(&self, request: AnswerRequest) -> Result<AnswerResponse, AppError> {
        Ok(AnswerResponse {
            answer: format!("echo: {}", request.question),
            elapsed_sec: 0.01,
            device: "cpu".into(),
        })
    }
}

#[derive(Debug, Clone)]
enum Op {
    Create,
    Delete(usize),
    Select(usize),
    Rename(usize),
    SwitchModel(usize),
    Clear,
    Send(String),
    Retry,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Create),
        2 => (0usize..8).prop_map(Op::Delete),
        2 => (0usize..8).prop_map(Op::Select),
        1 => (0usize..8).prop_map(Op::Rename),
        1 => (0usize..8).prop_map(Op::SwitchModel),
        1 => Just(Op::Clear),
        3 => "[a-zA-Z0-9 ]{0,20}".prop_map(Op::Send),
        1 => Just(Op::Retry),
    ]
}

/// Pick the id of the chat at `i` (wrapping), if any exist.
fn nth_chat_id(manager: &ChatManager, i: usize) -> Option<String> {
    let chats = manager.snapshot().chats;
    if chats.is_empty() {
        None
    } else {
        Some(chats[i % chats.len()].id.clone())
    }
}

async fn apply(manager: &ChatManager, op: &Op) {
    match op {
        Op::Create => {
            manager.create_chat(None);
        }
        Op::Delete(i) => {
            if let Some(id) = nth_chat_id(manager, *i) {
                manager.delete_chat(&id);
            }
        }
        Op::Select(i) => {
            if let Some(id) = nth_chat_id(manager, *i) {
                manager.set_active_chat(&id).unwrap();
            }
        }
        Op::Rename(i) => {
            if let Some(id) = nth_chat_id(manager, *i) {
                manager.rename_chat(&id, "renamed");
            }
        }
        Op::SwitchModel(i) => manager.switch_model(MODELS[i % MODELS.len()]),
        Op::Clear => manager.clear_chat(),
        Op::Send(text) => manager.send_message(None, text).await,
        Op::Retry => manager.retry_last_message(None).await,
    }
}

fn assert_selection_consistent(manager: &ChatManager) {
    let snap = manager.snapshot();
    match &snap.active_chat_id {
        Some(id) => assert!(
            snap.chats.iter().any(|c| c.id == *id),
            "selection points at missing chat {id}"
        ),
        None => assert!(
            snap.chats.is_empty(),
            "chats exist but nothing is selected"
        ),
    }
}

fn assert_transcripts_are_paired(manager: &ChatManager) {
    for chat in manager.snapshot().chats {
        assert_eq!(
            chat.messages.len() % 2,
            0,
            "chat {} has a dangling turn",
            chat.id
        );
        for pair in chat.messages.chunks(2) {
            assert_eq!(pair[0].role, MessageRole::User);
            assert_eq!(pair[1].role, MessageRole::Assistant);
        }
    }
}

fn run_ops(ops: &[Op], check: impl Fn(&ChatManager)) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    rt.block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let pool = db::init_db(dir.path()).unwrap();
        let manager = ChatManager::new(ChatStorage::new(pool), Arc::new(EchoApi));

        for op in ops {
            apply(&manager, op).await;
            check(&manager);
        }
    });
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_selection_never_dangles(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        run_ops(&ops, assert_selection_consistent);
    }

    #[test]
    fn test_completed_sends_leave_paired_transcripts(
        ops in proptest::collection::vec(op_strategy(), 1..40),
    ) {
        run_ops(&ops, assert_transcripts_are_paired);
    }
}
