//! Agent - one conversation with the model and its tool-calling loop
//!
//! Each turn:
//! 1. Records a checkpoint and appends the user's message
//! 2. Calls the model with the full history and the tool registry
//! 3. Executes any requested tools, appending one result per call in order
//! 4. Repeats until the model answers without tools or the round limit is hit
//!
//! Loop-level failures (model error, cancellation, round limit) roll history
//! back to the checkpoint, so a failed turn leaves no trace.

mod prompt;

pub use prompt::SYSTEM_PROMPT;

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::error::{CinebotError, Result};
use crate::llm::{LlmClient, Message, Response, Usage};
use crate::services::Services;
use crate::session::Release;
use crate::tools::{ToolContext, ToolRegistry};

/// Default bound on consecutive tool-call rounds per message
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Stored in place of an empty final answer; the API rejects empty assistant turns
pub const EMPTY_REPLY: &str = "(no reply)";

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum tool-call rounds before a message fails
    pub max_iterations: usize,
    pub system_prompt: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }
}

pub struct Agent {
    llm: Arc<dyn LlmClient>,
    services: Services,
    registry: Arc<ToolRegistry>,
    config: AgentConfig,
    /// Always starts with exactly one system message
    history: Vec<Message>,
    usage: Usage,
}

impl Agent {
    /// Create an agent with the default prompt and round limit
    pub fn new(llm: Arc<dyn LlmClient>, services: Services) -> Self {
        Self::with_config(llm, services, AgentConfig::default())
    }

    pub fn with_config(llm: Arc<dyn LlmClient>, services: Services, config: AgentConfig) -> Self {
        let config = AgentConfig {
            max_iterations: config.max_iterations.max(1),
            ..config
        };
        let history = vec![Message::system(config.system_prompt.clone())];

        Self {
            llm,
            services,
            registry: Arc::new(ToolRegistry::standard()),
            config,
            history,
            usage: Usage::default(),
        }
    }

    /// Share one registry across agents
    pub fn with_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn max_iterations(&self) -> usize {
        self.config.max_iterations
    }

    /// Tokens used across all turns of this conversation
    pub fn usage(&self) -> Usage {
        self.usage
    }

    /// Handle one user message and return the model's final reply
    ///
    /// Not safe to call concurrently for the same agent; callers serialize
    /// access per user (the session manager hands out one agent per user).
    pub async fn handle_message(&mut self, text: &str, cancel: &CancellationToken) -> Result<String> {
        let checkpoint = self.history.len();
        self.history.push(Message::user(text));

        match self.run_loop(cancel).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                warn!(
                    "Turn failed, rolling back {} message(s): {}",
                    self.history.len() - checkpoint,
                    e
                );
                self.history.truncate(checkpoint);
                Err(e)
            }
        }
    }

    async fn run_loop(&mut self, cancel: &CancellationToken) -> Result<String> {
        let ctx = ToolContext::new(self.services.clone(), cancel.clone());

        for round in 1..=self.config.max_iterations {
            let response = self.call_model(cancel).await?;

            if !response.wants_tools() {
                debug!("Final answer after {} round(s)", round);
                let reply = if response.content.trim().is_empty() {
                    warn!("Model returned an empty answer");
                    EMPTY_REPLY.to_string()
                } else {
                    response.content
                };
                self.history.push(Message::assistant(reply.clone()));
                return Ok(reply);
            }

            let calls = response.tool_calls;
            debug!(
                "Round {}: model requested {:?}",
                round,
                calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
            );
            self.history
                .push(Message::assistant_tool_calls(response.content, calls.clone()));

            for call in &calls {
                let output = self.registry.execute(call, &ctx).await;
                if output.is_error {
                    info!("Tool {} failed: {}", call.name, output.content);
                }
                self.history
                    .push(Message::tool_result(call.id.clone(), output.content, output.is_error));
            }
        }

        Err(CinebotError::MaxIterations {
            limit: self.config.max_iterations,
        })
    }

    async fn call_model(&mut self, cancel: &CancellationToken) -> Result<Response> {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CinebotError::Cancelled),
            result = self.llm.chat(&self.history, self.registry.definitions()) => result?,
        };

        self.usage.add(&response.usage);
        Ok(response)
    }

    /// Drop the conversation, keeping only the system prompt
    pub fn reset(&mut self) {
        self.history.truncate(1);
    }
}

#[async_trait]
impl Release for Agent {
    /// Close this agent's collaborators; the shared model client is left alone
    async fn release(&self) {
        debug!("Releasing agent collaborators: {:?}", self.services.configured());
        self.services.close().await;
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("model", &self.llm.model())
            .field("services", &self.services)
            .field("history_len", &self.history.len())
            .field("max_iterations", &self.config.max_iterations)
            .finish()
    }
}
