//! Span helpers for agent, model, tool and pipeline operations.

use tracing::Span;

/// Create a span for agent execution
///
/// # Example
/// ```
/// use concierge_telemetry::agent_run_span;
/// let span = agent_run_span("query_parser", "inv-123");
/// let _enter = span.enter();
/// ```
pub fn agent_run_span(agent_name: &str, invocation_id: &str) -> Span {
    tracing::info_span!(
        "agent.run",
        agent.name = agent_name,
        invocation.id = invocation_id,
        otel.kind = "internal"
    )
}

/// Create a span for a chat-completions call.
pub fn model_call_span(provider: &str, model_name: &str) -> Span {
    tracing::info_span!(
        "model.call",
        model.provider = provider,
        model.name = model_name,
        otel.kind = "client"
    )
}

pub fn tool_execute_span(tool_name: &str) -> Span {
    tracing::info_span!("tool.execute", tool.name = tool_name, otel.kind = "internal")
}

/// Create a span for one stage of an application pipeline, e.g.
/// `hr.generate_sql` or `flight.search`.
pub fn pipeline_stage_span(stage: &str) -> Span {
    tracing::info_span!("pipeline.stage", stage = stage, otel.kind = "internal")
}
