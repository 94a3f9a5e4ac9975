//! Governance wrapper for async agent tools.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use warden_primitives::Payload;

use crate::enforcer::Enforcer;
use crate::error::AdapterResult;

/// Action name used when governing tool input.
const TOOL_START: &str = "tool_start";
/// Action name used when governing tool output.
const TOOL_END: &str = "tool_end";

/// Async tool an agent can call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool name.
    fn name(&self) -> &str;

    /// Runs the tool.
    async fn invoke(&self, input: Value) -> AdapterResult<Value>;
}

/// Tool wrapper that governs both the input and the output of `T`.
///
/// Input is evaluated as `{"tool": name, "input": input}` under the
/// `tool_start` action and output as `{"tool": name, "output": output}` under
/// `tool_end`. Redacted values are forwarded; a DENY on either side fails the
/// call with [`AdapterError::Violation`](crate::AdapterError::Violation).
#[derive(Debug)]
pub struct GovernedTool<T> {
    inner: T,
    enforcer: Enforcer,
}

impl<T: Tool> GovernedTool<T> {
    /// Wraps `inner`, enforcing decisions through `enforcer`.
    #[must_use]
    pub fn new(inner: T, enforcer: Enforcer) -> Self {
        Self { inner, enforcer }
    }

    /// Returns the wrapped tool.
    #[must_use]
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Returns the enforcer, for example to collect receipts.
    #[must_use]
    pub fn enforcer(&self) -> &Enforcer {
        &self.enforcer
    }

    fn govern(&self, action: &str, key: &str, value: Value) -> AdapterResult<Value> {
        let mut payload = Payload::new();
        payload.insert("tool".to_owned(), Value::String(self.inner.name().to_owned()));
        payload.insert(key.to_owned(), value);

        let mut allowed = self.enforcer.enforce(action, payload, None)?;
        Ok(allowed.remove(key).unwrap_or(Value::Null))
    }
}

#[async_trait]
impl<T: Tool> Tool for GovernedTool<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn invoke(&self, input: Value) -> AdapterResult<Value> {
        let input = self.govern(TOOL_START, "input", input)?;
        debug!(tool = self.inner.name(), "governed tool input accepted");
        let output = self.inner.invoke(input).await?;
        self.govern(TOOL_END, "output", output)
    }
}
