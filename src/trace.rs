//! Run tracing sink.
//!
//! The run loop notifies an optional [`RunTrace`] sink at well-defined
//! points: round start, recorded messages, each tool call and its outcome,
//! and final usage. The sink is injected at agent construction and owned by
//! the caller; when none is attached the loop constructs no trace payloads
//! at all.

use crate::conversation::{ToolCall, ToolOutcome, Usage};
use crate::providers::ChatOptions;

/// Observer for the notification points of one run.
///
/// Notifications for a single run arrive in order; implementations shared
/// across concurrent runs must tolerate interleaving between runs.
pub trait RunTrace: Send + Sync {
    /// A provider round is about to start.
    fn round_start(&self, provider: &str, model: &str, options: &ChatOptions);

    /// The caller's message was recorded into the conversation.
    fn user_message(&self, content: &str);

    /// Assistant text was recorded into the conversation.
    fn assistant_message(&self, content: &str);

    /// The model requested a tool invocation.
    fn tool_call(&self, call: &ToolCall);

    /// A tool invocation finished (successfully or not).
    fn tool_result(&self, outcome: &ToolOutcome);

    /// Final accumulated usage for the run.
    fn usage(&self, usage: &Usage);
}

/// A [`RunTrace`] that forwards every notification to `tracing` events,
/// using GenAI semantic-convention field names.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use femtoagent::trace::{LogTrace, RunTrace};
///
/// let sink: Arc<dyn RunTrace> = Arc::new(LogTrace);
/// sink.user_message("hello");
/// ```
pub struct LogTrace;

impl RunTrace for LogTrace {
    fn round_start(&self, provider: &str, model: &str, options: &ChatOptions) {
        tracing::info!(
            gen_ai.system = provider,
            gen_ai.request.model = model,
            gen_ai.request.max_tokens = options.max_tokens,
            gen_ai.request.temperature = options.temperature,
            "llm.chat"
        );
    }

    fn user_message(&self, content: &str) {
        tracing::info!(content, "gen_ai.user.message");
    }

    fn assistant_message(&self, content: &str) {
        tracing::info!(content, "gen_ai.assistant.message");
    }

    fn tool_call(&self, call: &ToolCall) {
        tracing::info!(
            name = %call.name,
            id = %call.id,
            input = %call.arguments,
            "gen_ai.tool.call"
        );
    }

    fn tool_result(&self, outcome: &ToolOutcome) {
        tracing::info!(
            name = %outcome.name,
            id = %outcome.id,
            is_error = outcome.is_error,
            output = %outcome.content,
            "gen_ai.tool.result"
        );
    }

    fn usage(&self, usage: &Usage) {
        tracing::info!(
            gen_ai.usage.input_tokens = usage.input_tokens,
            gen_ai.usage.output_tokens = usage.output_tokens,
            "gen_ai.usage"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records event labels for ordering assertions.
    pub(crate) struct RecordingTrace(pub Mutex<Vec<String>>);

    impl RunTrace for RecordingTrace {
        fn round_start(&self, provider: &str, _model: &str, _options: &ChatOptions) {
            self.0.lock().unwrap().push(format!("round:{}", provider));
        }

        fn user_message(&self, _content: &str) {
            self.0.lock().unwrap().push("user".into());
        }

        fn assistant_message(&self, _content: &str) {
            self.0.lock().unwrap().push("assistant".into());
        }

        fn tool_call(&self, call: &ToolCall) {
            self.0.lock().unwrap().push(format!("call:{}", call.name));
        }

        fn tool_result(&self, outcome: &ToolOutcome) {
            self.0
                .lock()
                .unwrap()
                .push(format!("result:{}", outcome.name));
        }

        fn usage(&self, _usage: &Usage) {
            self.0.lock().unwrap().push("usage".into());
        }
    }

    #[test]
    fn test_recording_trace_collects_in_order() {
        let trace = RecordingTrace(Mutex::new(vec![]));
        trace.user_message("hi");
        trace.round_start("stub", "m1", &ChatOptions::new());
        trace.tool_call(&ToolCall::new("c1", "echo", json!({})));
        trace.tool_result(&ToolOutcome::ok("c1", "echo", "hi"));
        trace.usage(&Usage::new(1, 2));

        let events = trace.0.lock().unwrap();
        assert_eq!(
            *events,
            vec!["user", "round:stub", "call:echo", "result:echo", "usage"]
        );
    }

    #[test]
    fn test_log_trace_is_object_safe() {
        let sink: Box<dyn RunTrace> = Box::new(LogTrace);
        sink.usage(&Usage::new(0, 0));
    }
}
