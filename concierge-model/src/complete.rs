use concierge_core::{FinishReason, Llm, LlmRequest, Result, UsageMetadata};
use futures::StreamExt;

/// A finished, non-streamed model reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: UsageMetadata,
    pub finish_reason: Option<FinishReason>,
}

/// Run a single request to completion and collect its text and usage.
///
/// Partial chunks are skipped; the final response of a stream already carries
/// the whole turn.
pub async fn complete(llm: &dyn Llm, request: LlmRequest) -> Result<Completion> {
    let mut stream = llm.generate_content(request, false).await?;
    let mut completion = Completion::default();

    while let Some(response) = stream.next().await {
        let response = response?;
        if response.partial {
            continue;
        }
        if let Some(content) = &response.content {
            completion.text.push_str(&content.text());
        }
        if let Some(usage) = response.usage_metadata {
            completion.usage += usage;
        }
        if response.finish_reason.is_some() {
            completion.finish_reason = response.finish_reason;
        }
    }

    Ok(completion)
}
