//! FemtoAgent - lightweight LLM agent runtime
//!
//! An agent drives a multi-round conversation with an LLM provider,
//! dispatching provider-requested tool calls concurrently within each round,
//! enforcing structured-output contracts, and optionally augmenting the
//! conversation with a persistent per-scope memory record. Transient
//! provider failures are absorbed by a retry decorator so the run loop sees
//! each provider call as atomic.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use femtoagent::{Agent, RunOptions};
//! use femtoagent::providers::AnthropicProvider;
//!
//! let provider = Arc::new(AnthropicProvider::new("api-key"));
//! let agent = Agent::builder(provider)
//!     .system("You are a concise assistant.")
//!     .build();
//!
//! let result = agent.run("What is Rust?", RunOptions::new()).await?;
//! println!("{:?}", result.output);
//! ```

pub mod agent;
pub mod config;
pub mod conversation;
pub mod error;
pub mod memory;
pub mod providers;
pub mod template;
pub mod tools;
pub mod trace;
pub mod utils;

pub use agent::{Agent, AgentBuilder, OutputContract, RunOptions, RunOutput, RunResult};
pub use config::Config;
pub use conversation::{Message, Role, ToolCall, ToolOutcome, Usage};
pub use error::{AgentError, ProviderError, Result};
pub use providers::{
    AnthropicProvider, ChatOptions, LLMProvider, LLMResponse, OpenAIProvider, RetryProvider,
    ToolChoice, ToolDefinition,
};
pub use memory::{FileMemory, MemoryStore};
pub use template::TemplateMode;
pub use tools::{Tool, ToolRegistry};
pub use trace::{LogTrace, RunTrace};
