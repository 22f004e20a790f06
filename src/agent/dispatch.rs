//! Tool dispatcher.
//!
//! Executes the tool calls of a single round concurrently and returns their
//! outcomes in the original request order. Completion order is
//! nondeterministic, so ordering is restored by indexing results back rather
//! than by submission order. Every failure mode (unknown tool, execution
//! error, timeout) becomes a textual outcome; a tool can never abort the
//! round or the run.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, error};

use crate::conversation::{ToolCall, ToolOutcome};
use crate::tools::{Tool, ToolRegistry};

/// Upper bound on tool calls executing concurrently within one round.
const MAX_CONCURRENT_TOOLS: usize = 10;

/// Execute one round's tool calls and return outcomes in request order.
pub(crate) async fn dispatch(
    registry: &ToolRegistry,
    calls: &[ToolCall],
    timeout: Option<Duration>,
) -> Vec<ToolOutcome> {
    if calls.is_empty() {
        return Vec::new();
    }

    let limit = calls.len().min(MAX_CONCURRENT_TOOLS);
    let tasks: Vec<_> = calls
        .iter()
        .cloned()
        .enumerate()
        .map(|(index, call)| {
            let tool = registry.get(&call.name);
            async move { (index, execute_one(tool, call, timeout).await) }
        })
        .collect();

    let mut slots: Vec<Option<ToolOutcome>> = vec![None; calls.len()];
    let mut completions = stream::iter(tasks).buffer_unordered(limit);
    while let Some((index, outcome)) = completions.next().await {
        slots[index] = Some(outcome);
    }

    slots.into_iter().flatten().collect()
}

async fn execute_one(
    tool: Option<Arc<dyn Tool>>,
    call: ToolCall,
    timeout: Option<Duration>,
) -> ToolOutcome {
    let Some(tool) = tool else {
        debug!(tool = %call.name, id = %call.id, "unknown tool requested");
        return ToolOutcome::error(
            &call.id,
            &call.name,
            format!("Error: Unknown tool '{}'", call.name),
        );
    };

    let started = std::time::Instant::now();
    let execution = tool.execute(call.arguments.clone());
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, execution).await {
            Ok(result) => result,
            Err(_) => {
                error!(tool = %call.name, timeout_ms = limit.as_millis() as u64, "tool timed out");
                return ToolOutcome::error(
                    &call.id,
                    &call.name,
                    format!(
                        "Error executing tool '{}': timed out after {}ms",
                        call.name,
                        limit.as_millis()
                    ),
                );
            }
        },
        None => execution.await,
    };

    let duration_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(content) => {
            debug!(tool = %call.name, duration_ms, "tool executed");
            ToolOutcome::ok(&call.id, &call.name, content)
        }
        Err(e) => {
            error!(tool = %call.name, duration_ms, error = %e, "tool execution failed");
            ToolOutcome::error(
                &call.id,
                &call.name,
                format!("Error executing tool '{}': {}", call.name, e),
            )
        }
    }
}
