// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete Minerva turn pipeline.
//!
//! Each test assembles an isolated gateway state with a temp SQLite
//! database, a scripted provider, and in-memory retrieval doubles, then
//! drives full turns and asserts on the emitted event sequence and the
//! persisted rows.

use std::sync::Arc;

use tokio::sync::mpsc;

use minerva_agent::TurnEvent;
use minerva_config::model::RouterConfig;
use minerva_core::{Role, ToolCallStatus};
use minerva_gateway::{run_turn, AppState, HeaderSessionAuth, TurnSettings};
use minerva_router::ModelRouter;
use minerva_test_utils::{temp_database, FixedEmbedder, MemoryVectorIndex, MockProvider};
use minerva_tools::{register_builtins, ToolRegistry};

struct Env {
    state: AppState,
    _dir: tempfile::TempDir,
}

async fn env_with(provider: MockProvider, index: MemoryVectorIndex, step_cap: u32) -> Env {
    let (db, dir) = temp_database().await;

    let mut registry = ToolRegistry::new();
    register_builtins(
        &mut registry,
        vec!["本金".into(), "利率".into(), "贷款".into(), "月供".into()],
    );

    let router = ModelRouter::new(
        &RouterConfig {
            percentage_remote: 0,
            ..RouterConfig::default()
        },
        "mock-model".into(),
        None,
    )
    .unwrap();

    let state = AppState {
        db: Arc::new(db),
        router: Arc::new(router),
        local: Arc::new(provider),
        remote: None,
        registry: Arc::new(registry),
        embedder: Arc::new(FixedEmbedder),
        vector: Arc::new(index),
        auth: Arc::new(HeaderSessionAuth::new()),
        settings: TurnSettings {
            context_window: 10,
            step_cap,
            allowed_directory: dir.path().to_path_buf(),
            vector_max_results: 5,
            vector_min_score: 0.5,
        },
    };
    Env { state, _dir: dir }
}

async fn drive(env: &Env, conversation_id: &str, message: &str) -> Vec<TurnEvent> {
    let (tx, mut rx) = mpsc::channel(64);
    run_turn(
        env.state.clone(),
        "u1".to_string(),
        conversation_id.to_string(),
        message.to_string(),
        tx,
    )
    .await;
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

fn assistant_text(events: &[TurnEvent]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            TurnEvent::Segment(s) => Some(s.clone()),
            _ => None,
        })
        .collect()
}

fn history_records(events: &[TurnEvent]) -> Vec<minerva_core::ToolCallRecord> {
    events
        .iter()
        .find_map(|e| match e {
            TurnEvent::History(records) => Some(records.clone()),
            _ => None,
        })
        .expect("agent-history event present")
}

fn assert_success_sequence(events: &[TurnEvent]) {
    // message* agent-history done
    let mut seen_history = false;
    for (i, event) in events.iter().enumerate() {
        match event {
            TurnEvent::Segment(_) => assert!(!seen_history, "segment after history"),
            TurnEvent::History(_) => {
                assert!(!seen_history, "duplicate history event");
                seen_history = true;
                assert_eq!(i, events.len() - 2, "history must immediately precede done");
            }
            TurnEvent::Done(_) => assert_eq!(i, events.len() - 1, "done must be last"),
            TurnEvent::Error(_) => panic!("unexpected error event"),
        }
    }
    assert!(seen_history);
}

// ---- Scenario: pure chat, no retrieval ----

#[tokio::test]
async fn pure_chat_routes_local_and_persists_two_rows() {
    let env = env_with(
        MockProvider::with_text_responses(vec!["你好！很高兴见到你。"]),
        MemoryVectorIndex::new(),
        8,
    )
    .await;

    let events = drive(&env, "agent-e2e-1", "你好").await;
    assert_success_sequence(&events);

    assert!(history_records(&events).is_empty(), "zero tool calls");
    assert!(!assistant_text(&events).is_empty());
    match events.last().unwrap() {
        TurnEvent::Done(id) => assert!(id.starts_with("agent-")),
        other => panic!("expected done, got {other:?}"),
    }

    let rows = minerva_storage::history(&env.state.db, "agent-e2e-1")
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].role, Role::User);
    assert_eq!(rows[1].role, Role::Assistant);
    assert_eq!(rows[0].user_id.as_deref(), Some("u1"));
    assert_eq!(rows[1].user_id.as_deref(), Some("u1"));
    assert!(rows[0].created_at <= rows[1].created_at);
}

// ---- Scenario: retrieval-grounded answer ----

#[tokio::test]
async fn retrieval_grounded_answer_references_source() {
    let index = MemoryVectorIndex::new();
    index.seed(
        "三国演义第三十四章主要讲述刘备跃马檀溪脱险",
        "三国演义34章.txt",
        0.92,
    );

    let env = env_with(
        MockProvider::with_replies(vec![
            MockProvider::tool_call(
                "searchKnowledge",
                serde_json::json!({"query": "刘备跃马檀溪"}),
            ),
            MockProvider::text("根据知识库，刘备跃马檀溪出自三国演义第三十四回。"),
        ]),
        index,
        8,
    )
    .await;

    let events = drive(&env, "agent-e2e-2", "刘备跃马檀溪是哪一回？").await;
    assert_success_sequence(&events);

    let records = history_records(&events);
    assert_eq!(records.len(), 1, "searchKnowledge invoked exactly once");
    assert_eq!(records[0].tool_name, "searchKnowledge");
    assert_eq!(records[0].status, ToolCallStatus::Completed);
    assert!(records[0]
        .result
        .as_deref()
        .unwrap()
        .contains("三国演义34章.txt"));

    assert!(assistant_text(&events).contains("三十四"));
}

// ---- Scenario: path-escape refusal ----

#[tokio::test]
async fn path_escape_is_refused_inside_the_tool() {
    let env = env_with(
        MockProvider::with_replies(vec![
            MockProvider::tool_call(
                "readFile",
                serde_json::json!({"path": "../../../etc/passwd"}),
            ),
            MockProvider::text("抱歉，该路径超出允许的访问范围，无法读取。"),
        ]),
        MemoryVectorIndex::new(),
        8,
    )
    .await;

    let events = drive(&env, "agent-e2e-3", "请读取 ../../../etc/passwd").await;
    assert_success_sequence(&events);

    let records = history_records(&events);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, ToolCallStatus::Failed);
    assert!(records[0]
        .result
        .as_deref()
        .unwrap()
        .contains("超出允许的目录范围"));

    let text = assistant_text(&events);
    assert!(text.contains("无法读取"));
    assert!(!text.contains("root:"), "no file content leaked");
}

// ---- Scenario: amortisation delegation ----

#[tokio::test]
async fn amortization_delegation_records_arguments_and_figure() {
    let env = env_with(
        MockProvider::with_replies(vec![
            MockProvider::tool_call(
                "calculateAmortization",
                serde_json::json!({"principal": 100000, "annualRate": 0.05, "termYears": 10}),
            ),
            MockProvider::text("按等额本息计算，每月还款约 1060.66 元。"),
        ]),
        MemoryVectorIndex::new(),
        8,
    )
    .await;

    let events = drive(&env, "agent-e2e-4", "本金100000元，年利率5%，10年，每月还款多少？").await;
    assert_success_sequence(&events);

    let records = history_records(&events);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].tool_name, "calculateAmortization");
    assert_eq!(records[0].input["principal"], 100000);
    assert_eq!(records[0].input["annualRate"], 0.05);
    assert_eq!(records[0].input["termYears"], 10);
    assert!(records[0].result.as_deref().unwrap().contains("1060.66"));

    assert!(assistant_text(&events).contains("1060.66"));
}

// ---- Scenario: step cap ----

#[tokio::test]
async fn step_cap_produces_two_records_then_apology() {
    let env = env_with(
        MockProvider::with_replies(vec![
            MockProvider::tool_call("getCurrentTime", serde_json::json!({})),
            MockProvider::tool_call("getCurrentTime", serde_json::json!({})),
            MockProvider::tool_call("getCurrentTime", serde_json::json!({})),
        ]),
        MemoryVectorIndex::new(),
        2,
    )
    .await;

    let events = drive(&env, "agent-e2e-5", "现在几点？").await;
    assert_success_sequence(&events);

    let records = history_records(&events);
    assert_eq!(records.len(), 2, "exactly two tool invocations under cap 2");
    assert_eq!(assistant_text(&events), minerva_agent::STEP_CAP_APOLOGY);

    // The degraded turn still persists normally.
    let rows = minerva_storage::history(&env.state.db, "agent-e2e-5")
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].content, minerva_agent::STEP_CAP_APOLOGY);
}

// ---- Multi-turn context and conversation listing ----

#[tokio::test]
async fn second_turn_sees_prior_history() {
    let env = env_with(
        MockProvider::with_text_responses(vec!["我叫小敏。", "你刚才问了我的名字。"]),
        MemoryVectorIndex::new(),
        8,
    )
    .await;

    drive(&env, "agent-e2e-6", "你叫什么名字？").await;
    let events = drive(&env, "agent-e2e-6", "我刚才问了什么？").await;
    assert_success_sequence(&events);

    let rows = minerva_storage::history(&env.state.db, "agent-e2e-6")
        .await
        .unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(
        rows.iter().map(|m| m.role).collect::<Vec<_>>(),
        vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
}

#[tokio::test]
async fn conversations_list_is_user_scoped_and_agent_prefixed() {
    let env = env_with(
        MockProvider::with_text_responses(vec!["一", "二"]),
        MemoryVectorIndex::new(),
        8,
    )
    .await;

    drive(&env, "agent-list-a", "第一个问题").await;
    drive(&env, "agent-list-b", "第二个问题").await;

    let ids = minerva_storage::conversations_for(&env.state.db, "u1", "agent-")
        .await
        .unwrap();
    assert_eq!(ids.len(), 2);
    // Newest activity first.
    assert_eq!(ids[0], "agent-list-b");

    let none = minerva_storage::conversations_for(&env.state.db, "stranger", "agent-")
        .await
        .unwrap();
    assert!(none.is_empty());
}

// ---- Deletion round trip ----

#[tokio::test]
async fn delete_then_history_is_empty() {
    let env = env_with(
        MockProvider::with_text_responses(vec!["好的。"]),
        MemoryVectorIndex::new(),
        8,
    )
    .await;

    drive(&env, "agent-e2e-7", "记住这句话").await;
    assert_eq!(
        minerva_storage::history(&env.state.db, "agent-e2e-7")
            .await
            .unwrap()
            .len(),
        2
    );

    minerva_storage::delete_conversation(&env.state.db, "agent-e2e-7")
        .await
        .unwrap();
    assert!(minerva_storage::history(&env.state.db, "agent-e2e-7")
        .await
        .unwrap()
        .is_empty());
}
