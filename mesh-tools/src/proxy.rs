//! The Tool Invocation Proxy: a per-wiring-entry handle whose
//! method invocations are translated into outbound MCP-over-HTTP calls
//! against the peer's `endpoint`.

use std::time::Duration;

use mesh_types::WiringCandidate;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, ToolError, Transport};

/// Default per-call timeout when the tool declares no `performance_profile`
/// hint.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Outbound handle bound to a single ranked peer. Method names and argument
/// maps are relayed verbatim as MCP tool-call requests; the proxy has no
/// knowledge of the peer's schema.
#[derive(Clone, Debug)]
pub struct ToolInvocationProxy {
    http: reqwest::Client,
    endpoint: String,
    capability_name: String,
    capability_version: String,
    peer_agent_id: mesh_types::AgentId,
    timeout: Duration,
    transport: Transport,
}

impl ToolInvocationProxy {
    /// Builds a proxy targeting the given wiring candidate.
    ///
    /// `transport` is the *local* agent's transport, not the peer's: a
    /// stdio-only agent cannot dial out regardless of what the peer offers.
    #[must_use]
    pub fn new(candidate: &WiringCandidate, transport: Transport) -> Self {
        Self::with_timeout(candidate, transport, DEFAULT_TIMEOUT)
    }

    /// Builds a proxy with an explicit timeout, derived by the caller from
    /// the tool's declared `performance_profile` if present.
    #[must_use]
    pub fn with_timeout(candidate: &WiringCandidate, transport: Transport, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: candidate.endpoint.clone(),
            capability_name: candidate.capability_name.clone(),
            capability_version: candidate.capability_version.clone(),
            peer_agent_id: candidate.agent_id,
            timeout,
            transport,
        }
    }

    /// The peer agent this proxy is bound to.
    #[must_use]
    pub const fn peer_agent_id(&self) -> mesh_types::AgentId {
        self.peer_agent_id
    }

    /// The capability name/version that satisfied the dependency.
    #[must_use]
    pub fn matched_capability(&self) -> (&str, &str) {
        (&self.capability_name, &self.capability_version)
    }

    /// Endpoint this proxy calls.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Translates `method` and `args` into an MCP tool-call request against
    /// the wired peer's endpoint, and returns its JSON result.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::ProxyUnsupportedTransport`] eagerly, before any
    /// I/O, if the local agent's transport cannot carry outbound calls.
    /// Returns [`ToolError::PeerUnreachable`] on transport failure, or
    /// [`ToolError::PeerRejected`] on a non-2xx response.
    pub async fn invoke(&self, method: &str, args: Value) -> Result<Value> {
        if !self.transport.supports_outbound() {
            return Err(ToolError::ProxyUnsupportedTransport(self.transport));
        }

        let request_body = serde_json::json!({
            "method": method,
            "params": args,
        });

        debug!(endpoint = %self.endpoint, method, "dispatching tool invocation proxy call");

        let response = self
            .http
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&request_body)
            .send()
            .await
            .map_err(|source| ToolError::PeerUnreachable {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ToolError::PeerRejected {
                endpoint: self.endpoint.clone(),
                method: method.to_owned(),
                status,
                message,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|source| ToolError::PeerUnreachable {
                endpoint: self.endpoint.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::AgentId;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn candidate(endpoint: String) -> WiringCandidate {
        WiringCandidate {
            agent_id: AgentId::random(),
            endpoint,
            capability_name: "greet".into(),
            capability_version: "1.0.0".into(),
        }
    }

    #[tokio::test]
    async fn forwards_call_and_returns_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let proxy = ToolInvocationProxy::new(&candidate(server.uri()), Transport::Http);
        let result = proxy.invoke("greet", serde_json::json!({"name": "a"})).await.unwrap();
        assert_eq!(result, serde_json::json!({"ok": true}));
    }

    #[tokio::test]
    async fn stdio_transport_fails_eagerly_without_io() {
        let proxy = ToolInvocationProxy::new(&candidate("http://unreachable.invalid".into()), Transport::Stdio);
        let err = proxy.invoke("greet", Value::Null).await.unwrap_err();
        assert!(matches!(err, ToolError::ProxyUnsupportedTransport(Transport::Stdio)));
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let proxy = ToolInvocationProxy::new(&candidate(server.uri()), Transport::Http);
        let err = proxy.invoke("greet", Value::Null).await.unwrap_err();
        assert!(matches!(err, ToolError::PeerRejected { status: 500, .. }));
    }
}
