//! The agent run loop.
//!
//! `Agent::run` drives a multi-round conversation with an LLM provider:
//! each round calls the provider, dispatches any requested tool calls
//! concurrently, folds the outcomes back into the conversation, and repeats
//! until the model answers with text, commits a structured output, or the
//! iteration budget runs out. An optional post-run sub-conversation extracts
//! an updated memory record for the supplied scope.
//!
//! The conversation, usage totals, and iteration counter are owned by one
//! `run` invocation; the provider and memory collaborators may be shared
//! across concurrent runs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::conversation::{Message, Usage};
use crate::error::{AgentError, Result};
use crate::memory::MemoryStore;
use crate::providers::{ChatOptions, LLMProvider, ToolChoice};
use crate::template::{self, TemplateMode};
use crate::tools::{Tool, ToolRegistry};
use crate::trace::RunTrace;

use super::dispatch;
use super::structured::OutputContract;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Delimiters wrapping a loaded memory record inside the system prompt, so
/// the model can tell memory from instructions.
const MEMORY_OPEN: &str = "<memory>";
const MEMORY_CLOSE: &str = "</memory>";

/// Per-run inputs for [`Agent::run`].
///
/// # Example
/// ```
/// use femtoagent::agent::RunOptions;
///
/// let opts = RunOptions::new()
///     .with_var("user_name", "Alice")
///     .with_memory_scope("user-123");
/// assert!(opts.memory_update);
/// ```
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Variables substituted into the system-prompt template
    pub vars: HashMap<String, String>,
    /// Identifier of the memory record to load and update
    pub memory_scope: Option<String>,
    /// Whether the post-run memory update may run (default true)
    pub memory_update: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            vars: HashMap::new(),
            memory_scope: None,
            memory_update: true,
        }
    }
}

impl RunOptions {
    /// Create default run options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one template variable.
    pub fn with_var(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }

    /// Replace the full template variable map.
    pub fn with_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.vars = vars;
        self
    }

    /// Load and update the memory record under this scope.
    pub fn with_memory_scope(mut self, scope: &str) -> Self {
        self.memory_scope = Some(scope.to_string());
        self
    }

    /// Suppress the post-run memory update (read-only memory use).
    pub fn without_memory_update(mut self) -> Self {
        self.memory_update = false;
        self
    }
}

/// The final output of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutput {
    /// Free-text answer (possibly empty on the iteration-exhausted exit)
    Text(String),
    /// Schema-validated structured output
    Structured(Value),
}

/// Result of one [`Agent::run`] invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// The run's output
    pub output: RunOutput,
    /// Token usage accumulated across every provider call of the run
    pub usage: Usage,
    /// Number of completed provider calls (retries not counted)
    pub provider_calls: u32,
}

impl RunResult {
    /// The output text, if this run produced text.
    pub fn text(&self) -> Option<&str> {
        match &self.output {
            RunOutput::Text(s) => Some(s),
            RunOutput::Structured(_) => None,
        }
    }

    /// Deserialize a structured output into the caller's type.
    ///
    /// The value already passed contract validation during the run, so this
    /// only fails when called with a different type (or on a text output).
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        match &self.output {
            RunOutput::Structured(value) => serde_json::from_value(value.clone())
                .map_err(|e| AgentError::Validation(e.to_string())),
            RunOutput::Text(_) => Err(AgentError::Validation(
                "run produced text, not structured output".into(),
            )),
        }
    }
}

/// Memory wiring: where records live, what shape they have, and how the
/// update call is instructed.
struct MemoryBinding {
    store: Arc<dyn MemoryStore>,
    contract: OutputContract,
    instruction: Option<String>,
}

/// An LLM-powered agent supporting tools, structured output, and memory.
///
/// Construct through [`Agent::builder`]; the agent is immutable afterwards
/// and can serve concurrent runs.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use femtoagent::{Agent, AgentBuilder, RunOptions};
/// use femtoagent::providers::AnthropicProvider;
///
/// let agent = Agent::builder(Arc::new(AnthropicProvider::new("api-key")))
///     .system("You are a concise assistant helping {{user_name}}.")
///     .build();
///
/// let result = agent
///     .run("What is Rust?", RunOptions::new().with_var("user_name", "Alice"))
///     .await?;
/// println!("{:?}", result.output);
/// ```
pub struct Agent {
    provider: Arc<dyn LLMProvider>,
    registry: ToolRegistry,
    system_template: String,
    template_mode: TemplateMode,
    output: Option<OutputContract>,
    memory: Option<MemoryBinding>,
    trace: Option<Arc<dyn RunTrace>>,
    model: Option<String>,
    max_tokens: u32,
    temperature: Option<f32>,
    max_iterations: usize,
    tool_timeout: Option<Duration>,
}

/// Builder for [`Agent`].
pub struct AgentBuilder {
    provider: Arc<dyn LLMProvider>,
    tools: Vec<Arc<dyn Tool>>,
    system_template: String,
    template_mode: TemplateMode,
    output: Option<OutputContract>,
    memory: Option<MemoryBinding>,
    trace: Option<Arc<dyn RunTrace>>,
    model: Option<String>,
    max_tokens: u32,
    temperature: Option<f32>,
    max_iterations: usize,
    tool_timeout: Option<Duration>,
}

impl AgentBuilder {
    /// Set the system-prompt template (`{{name}}` placeholders allowed).
    pub fn system(mut self, template: &str) -> Self {
        self.system_template = template.to_string();
        self
    }

    /// How unresolved template placeholders are handled (default strict).
    pub fn template_mode(mut self, mode: TemplateMode) -> Self {
        self.template_mode = mode;
        self
    }

    /// Add one tool.
    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Add a batch of tools.
    pub fn tools(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    /// Force every run of this agent to produce output of type `T`.
    pub fn output<T: JsonSchema + DeserializeOwned + 'static>(mut self) -> Self {
        self.output = Some(OutputContract::of::<T>());
        self
    }

    /// Attach a memory store whose records have shape `T`.
    pub fn memory<T: JsonSchema + DeserializeOwned + 'static>(
        mut self,
        store: Arc<dyn MemoryStore>,
    ) -> Self {
        self.memory = Some(MemoryBinding {
            store,
            contract: OutputContract::of::<T>(),
            instruction: None,
        });
        self
    }

    /// Custom instruction appended to the memory-update prompt. No effect
    /// unless a memory store is attached.
    pub fn memory_instruction(mut self, instruction: &str) -> Self {
        if let Some(binding) = &mut self.memory {
            binding.instruction = Some(instruction.to_string());
        }
        self
    }

    /// Attach a trace sink notified at run milestones.
    pub fn trace(mut self, sink: Arc<dyn RunTrace>) -> Self {
        self.trace = Some(sink);
        self
    }

    /// Override the provider's default model.
    pub fn model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    /// Maximum tokens per provider response (default 4096).
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sampling temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Maximum provider rounds per run (default 10, floor 1). Bounds every
    /// run even when the model keeps requesting tools.
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Bound each tool execution; a timed-out call becomes an error outcome.
    pub fn tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = Some(timeout);
        self
    }

    /// Build the agent.
    pub fn build(self) -> Agent {
        Agent {
            provider: self.provider,
            registry: ToolRegistry::new(self.tools),
            system_template: self.system_template,
            template_mode: self.template_mode,
            output: self.output,
            memory: self.memory,
            trace: self.trace,
            model: self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            max_iterations: self.max_iterations,
            tool_timeout: self.tool_timeout,
        }
    }
}

impl Agent {
    /// Start building an agent around a provider.
    pub fn builder(provider: Arc<dyn LLMProvider>) -> AgentBuilder {
        AgentBuilder {
            provider,
            tools: Vec::new(),
            system_template: DEFAULT_SYSTEM_PROMPT.to_string(),
            template_mode: TemplateMode::default(),
            output: None,
            memory: None,
            trace: None,
            model: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tool_timeout: None,
        }
    }

    /// Run the agent with a user message.
    ///
    /// Returns free text, or a validated structured value when an output
    /// type is configured and the model commits to it. The conversation
    /// exists only for the duration of this call.
    ///
    /// # Errors
    /// Configuration and template errors fail fast before any provider
    /// call. Provider errors surface after the retry wrapper gives up.
    /// A structured-output commit with non-conforming arguments is a
    /// `Validation` error. Tool failures never error a run.
    pub async fn run(&self, message: &str, opts: RunOptions) -> Result<RunResult> {
        if message.trim().is_empty() {
            return Err(AgentError::Config("user message must be non-empty".into()));
        }

        // Fail fast: a memory scope is only meaningful with a store attached.
        let memory = match &opts.memory_scope {
            Some(scope) => match &self.memory {
                Some(binding) => Some((scope.as_str(), binding)),
                None => {
                    return Err(AgentError::Config(format!(
                        "memory scope '{}' given but no memory store is configured",
                        scope
                    )));
                }
            },
            None => None,
        };

        let mut system = template::render(&self.system_template, &opts.vars, self.template_mode)?;

        // Prepend the stored record, delimited so the model can tell memory
        // from instructions.
        if let Some((scope, binding)) = &memory {
            if let Some(record) = binding.store.get(scope).await? {
                let serialized = serde_json::to_string(&record)?;
                system = format!(
                    "{}\n{}\n{}\n\n{}",
                    MEMORY_OPEN, serialized, MEMORY_CLOSE, system
                );
            }
        }

        let mut tools = self.registry.definitions();
        let mut tool_choice = ToolChoice::Auto;
        if let Some(contract) = &self.output {
            tools.push(contract.definition());
            // Forced on the first round only; reverts to auto after any
            // round that produced tool calls.
            tool_choice = ToolChoice::forced(contract.name());
        }

        let model = self
            .model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
            .to_string();

        let mut conversation = vec![Message::user(message)];
        if let Some(trace) = &self.trace {
            trace.user_message(message);
        }

        let mut usage = Usage::default();
        let mut provider_calls: u32 = 0;
        let mut last_text = String::new();
        let mut final_output: Option<RunOutput> = None;

        for iteration in 0..self.max_iterations {
            let mut options = ChatOptions::new()
                .with_max_tokens(self.max_tokens)
                .with_system(&system)
                .with_tool_choice(tool_choice.clone());
            if let Some(temperature) = self.temperature {
                options = options.with_temperature(temperature);
            }

            if let Some(trace) = &self.trace {
                trace.round_start(self.provider.name(), &model, &options);
            }
            debug!(iteration, forced = tool_choice.is_forced(), "starting round");

            let response = self
                .provider
                .chat(conversation.clone(), tools.clone(), Some(&model), options)
                .await?;
            provider_calls += 1;
            if let Some(sample) = &response.usage {
                usage.add(sample);
            }

            // No tool calls: the round's text is the final output.
            if response.tool_calls.is_empty() {
                last_text = response.content;
                if let Some(trace) = &self.trace {
                    trace.assistant_message(&last_text);
                }
                conversation.push(Message::assistant(&last_text));
                final_output = Some(RunOutput::Text(last_text.clone()));
                break;
            }

            last_text = response.content.clone();
            if let Some(trace) = &self.trace {
                if !response.content.is_empty() {
                    trace.assistant_message(&response.content);
                }
                for call in &response.tool_calls {
                    trace.tool_call(call);
                }
            }
            conversation.push(Message::assistant_with_tools(
                &response.content,
                response.tool_calls.clone(),
            ));

            // An output commit ends the run before anything executes.
            // Remaining calls in the same round are dropped.
            if let Some(contract) = &self.output {
                if let Some(call) = response
                    .tool_calls
                    .iter()
                    .find(|call| contract.matches(&call.name))
                {
                    contract.validate(&call.arguments)?;
                    if response.tool_calls.len() > 1 {
                        debug!(
                            dropped = response.tool_calls.len() - 1,
                            "output committed; dropping remaining tool calls in round"
                        );
                    }
                    final_output = Some(RunOutput::Structured(call.arguments.clone()));
                    break;
                }
            }

            let outcomes =
                dispatch::dispatch(&self.registry, &response.tool_calls, self.tool_timeout).await;
            if let Some(trace) = &self.trace {
                for outcome in &outcomes {
                    trace.tool_result(outcome);
                }
            }
            conversation.push(Message::tool_results(outcomes));

            tool_choice = ToolChoice::Auto;
        }

        // Iteration budget exhausted: degraded but valid, never an error.
        let output = final_output.unwrap_or_else(|| {
            info!(
                iterations = self.max_iterations,
                "iteration budget exhausted; returning last observed text"
            );
            RunOutput::Text(last_text.clone())
        });

        if let Some((scope, binding)) = &memory {
            if opts.memory_update {
                if let Err(e) = self
                    .update_memory(scope, binding, &conversation, &model, &mut usage, &mut provider_calls)
                    .await
                {
                    // Non-fatal: the run result stands, only the write is skipped.
                    warn!(scope, error = %e, "memory update failed; record left unchanged");
                }
            }
        }

        if let Some(trace) = &self.trace {
            trace.usage(&usage);
        }

        Ok(RunResult {
            output,
            usage,
            provider_calls,
        })
    }

    /// One extra provider call that asks the model to rewrite the stored
    /// record for this scope. Only text-bearing messages are carried over;
    /// tool-use and tool-result structure is dropped to condense context.
    async fn update_memory(
        &self,
        scope: &str,
        binding: &MemoryBinding,
        conversation: &[Message],
        model: &str,
        usage: &mut Usage,
        provider_calls: &mut u32,
    ) -> Result<()> {
        let contract = &binding.contract;

        let current = binding
            .store
            .get(scope)
            .await?
            .unwrap_or_else(|| serde_json::json!({}));

        let mut prompt = format!(
            "You maintain a persistent memory record for this conversation.\n\n\
             Current record:\n{}\n\n\
             Record schema:\n{}\n\n\
             Review the conversation and call the '{}' tool with the complete \
             updated record. Carry over still-valid fields from the current record.",
            serde_json::to_string(&current)?,
            serde_json::to_string(contract.parameters())?,
            contract.name(),
        );
        if let Some(instruction) = &binding.instruction {
            prompt.push_str("\n\n");
            prompt.push_str(instruction);
        }

        let messages: Vec<Message> = conversation
            .iter()
            .filter(|m| m.is_text() && !m.content.is_empty())
            .cloned()
            .collect();

        let options = ChatOptions::new()
            .with_max_tokens(self.max_tokens)
            .with_system(&prompt)
            .with_tool_choice(ToolChoice::forced(contract.name()));

        let response = self
            .provider
            .chat(messages, vec![contract.definition()], Some(model), options)
            .await?;
        *provider_calls += 1;
        if let Some(sample) = &response.usage {
            usage.add(sample);
        }

        let Some(call) = response
            .tool_calls
            .iter()
            .find(|call| contract.matches(&call.name))
        else {
            debug!(scope, "memory update returned no matching tool call; skipping write");
            return Ok(());
        };

        contract.validate(&call.arguments)?;
        binding.store.put(scope, call.arguments.clone()).await?;
        info!(scope, "memory record updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_options_defaults() {
        let opts = RunOptions::new();
        assert!(opts.vars.is_empty());
        assert!(opts.memory_scope.is_none());
        assert!(opts.memory_update);
    }

    #[test]
    fn test_run_options_builders() {
        let opts = RunOptions::new()
            .with_var("name", "Alice")
            .with_memory_scope("u1")
            .without_memory_update();

        assert_eq!(opts.vars.get("name").map(String::as_str), Some("Alice"));
        assert_eq!(opts.memory_scope.as_deref(), Some("u1"));
        assert!(!opts.memory_update);
    }

    #[test]
    fn test_run_result_text_accessor() {
        let result = RunResult {
            output: RunOutput::Text("hello".into()),
            usage: Usage::new(1, 2),
            provider_calls: 1,
        };
        assert_eq!(result.text(), Some("hello"));
        assert!(result.parse::<serde_json::Value>().is_err());
    }

    #[test]
    fn test_run_result_parse_structured() {
        #[derive(serde::Deserialize, PartialEq, Debug)]
        struct Out {
            n: u32,
        }

        let result = RunResult {
            output: RunOutput::Structured(serde_json::json!({"n": 7})),
            usage: Usage::default(),
            provider_calls: 1,
        };
        assert_eq!(result.parse::<Out>().unwrap(), Out { n: 7 });
        assert!(result.text().is_none());
    }
}
