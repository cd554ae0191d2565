use concierge_agent::{CustomAgentBuilder, LlmAgentBuilder, SequentialAgent};
use concierge_core::{
    Agent, Content, ConciergeError, Event, EventStream, IncludeContents, Session,
};
use concierge_model::MockLlm;
use concierge_runner::{Runner, RunnerConfig};
use futures::{StreamExt, stream};
use serde_json::json;
use std::sync::Arc;

fn runner(agent: Arc<dyn Agent>) -> Runner {
    Runner::new(RunnerConfig::new("concierge-test", agent)).unwrap()
}

async fn turn(runner: &Runner, session: &str, text: &str) -> Vec<Event> {
    let stream = runner
        .run("user-1".to_string(), session.to_string(), Content::new("user").with_text(text))
        .await
        .unwrap();
    stream.map(|r| r.unwrap()).collect().await
}

fn writer(name: &'static str, key: &'static str, value: serde_json::Value) -> Arc<dyn Agent> {
    Arc::new(
        CustomAgentBuilder::new(name)
            .handler(move |ctx| {
                let value = value.clone();
                async move {
                    let mut event = Event::new(ctx.invocation_id()).with_author(name);
                    event.actions.state_delta.insert(key.to_string(), value);
                    Ok(Box::pin(stream::iter(vec![Ok(event)])) as EventStream)
                }
            })
            .build()
            .unwrap(),
    )
}

#[test]
fn empty_app_name_is_rejected() {
    let agent = writer("w", "k", json!(1));
    assert!(Runner::new(RunnerConfig::new("  ", agent)).is_err());
}

#[tokio::test]
async fn invocation_ids_are_prefixed_and_unique_per_turn() {
    let r = runner(writer("w", "k", json!(1)));
    let first = turn(&r, "s1", "one").await;
    let second = turn(&r, "s1", "two").await;

    assert!(first[0].invocation_id.starts_with("inv-"));
    assert_ne!(first[0].invocation_id, second[0].invocation_id);
}

#[tokio::test]
async fn state_deltas_persist_and_temp_keys_are_dropped() {
    let seq = SequentialAgent::new(
        "pipeline",
        vec![
            writer("parser", "parsed_query", json!({"origin": "LA"})),
            writer("scratch", "temp:raw_html", json!("<html>")),
        ],
    );
    let r = runner(Arc::new(seq));
    turn(&r, "s1", "LA to Boston").await;

    let state = r.session_state("s1").unwrap();
    assert_eq!(state["parsed_query"]["origin"], "LA");
    assert!(!state.contains_key("temp:raw_html"));
    assert!(r.session_state("unknown").is_none());
}

#[tokio::test]
async fn temp_state_is_visible_within_the_turn() {
    let reader: Arc<dyn Agent> = Arc::new(
        CustomAgentBuilder::new("reader")
            .handler(|ctx| async move {
                let seen = concierge_core::InvocationContext::session(ctx.as_ref())
                    .state()
                    .get("temp:raw_html");
                let mut event = Event::new(ctx.invocation_id()).with_author("reader");
                event.set_content(Content::new("model").with_text(format!("{seen:?}")));
                Ok(Box::pin(stream::iter(vec![Ok(event)])) as EventStream)
            })
            .build()
            .unwrap(),
    );
    let seq = SequentialAgent::new(
        "pipeline",
        vec![writer("scratch", "temp:raw_html", json!("<html>")), reader],
    );
    let r = runner(Arc::new(seq));
    let events = turn(&r, "s1", "go").await;

    assert_eq!(events[1].content().unwrap().text(), r#"Some(String("<html>"))"#);
}

#[tokio::test]
async fn history_keeps_user_turns_ahead_of_replies() {
    let model = Arc::new(MockLlm::new("mock").with_text("Hello!").with_text("Still here."));
    let agent = LlmAgentBuilder::new("assistant").model(model.clone()).build().unwrap();
    let r = runner(Arc::new(agent));

    turn(&r, "s1", "hi").await;
    turn(&r, "s1", "are you there?").await;

    // second request: prior user turn, prior reply, current user turn
    let second = &model.requests()[1];
    let texts: Vec<String> = second.contents.iter().map(|c| c.text()).collect();
    assert_eq!(texts, vec!["hi", "Hello!", "are you there?"]);

    let session = r.session_service().get("s1").unwrap();
    let roles: Vec<String> = session.conversation_history().iter().map(|c| c.role.clone()).collect();
    assert_eq!(roles, vec!["user", "model", "user", "model"]);
}

#[tokio::test]
async fn workflow_history_is_not_recorded_twice() {
    let model = Arc::new(MockLlm::new("mock").with_text("summary"));
    let summarizer = LlmAgentBuilder::new("summarizer")
        .model(model)
        .include_contents(IncludeContents::None)
        .build()
        .unwrap();
    let seq = SequentialAgent::new("pipeline", vec![Arc::new(summarizer)]);
    let r = runner(Arc::new(seq));
    turn(&r, "s1", "go").await;

    let session = r.session_service().get("s1").unwrap();
    assert_eq!(session.conversation_history().len(), 2);
    assert_eq!(session.events().len(), 1);
}

#[tokio::test]
async fn sessions_are_isolated() {
    let r = runner(writer("w", "counter", json!(1)));
    turn(&r, "a", "x").await;

    assert!(r.session_state("a").unwrap().contains_key("counter"));
    assert!(r.session_state("b").is_none());
}

#[tokio::test]
async fn another_users_session_is_refused() {
    let r = runner(writer("w", "k", json!(1)));
    turn(&r, "s1", "x").await;

    let result = r
        .run("user-2".to_string(), "s1".to_string(), Content::new("user").with_text("y"))
        .await;
    assert!(matches!(result, Err(ConciergeError::Session(_))));
}

#[tokio::test]
async fn agent_errors_are_yielded_and_end_the_turn() {
    let failing: Arc<dyn Agent> = Arc::new(
        CustomAgentBuilder::new("failing")
            .handler(|_ctx| async move {
                Ok(Box::pin(stream::iter(vec![Err(ConciergeError::Agent("boom".to_string()))]))
                    as EventStream)
            })
            .build()
            .unwrap(),
    );
    let r = runner(failing);
    let results: Vec<_> = r
        .run("user-1".to_string(), "s1".to_string(), Content::new("user").with_text("x"))
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(results.len(), 1);
    assert!(results[0].is_err());
    let session = r.session_service().get("s1").unwrap();
    assert_eq!(session.conversation_history()[0].text(), "x");
}
