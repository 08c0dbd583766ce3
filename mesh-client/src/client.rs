//! The Registry Client: issues registration and heartbeat
//! requests against `mesh-registry` and maintains the agent's wiring cache.

use mesh_types::{AgentId, ResourceVersion};
use mesh_wire::{HeartbeatRequest, HeartbeatResponse, RegisterRequest, RegisterResponse};
use tracing::{info, warn};

use crate::backoff::{jittered, next_delay, BASE_DELAY};
use crate::error::{ClientError, Result};
use crate::wiring_cache::WiringCache;

/// Outcome of a single heartbeat attempt.
#[derive(Debug)]
pub enum HeartbeatOutcome {
    /// The registry's resource version matched what we last saw; wiring is
    /// unchanged and the cache was left alone.
    Unchanged,
    /// A newer wiring snapshot was returned and has been installed.
    Updated,
    /// The registry does not know this agent; the caller must re-register.
    NotFound,
}

/// HTTP client for the Registry API, plus the wiring cache it maintains.
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
    cache: std::sync::Arc<WiringCache>,
}

impl RegistryClient {
    /// Builds a client targeting `base_url` (e.g. `http://registry.mesh:8080`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            cache: std::sync::Arc::new(WiringCache::new()),
        }
    }

    /// The wiring cache this client maintains.
    #[must_use]
    pub fn cache(&self) -> &WiringCache {
        &self.cache
    }

    /// Returns a shared handle to the wiring cache, so a Dependency Injector
    /// can read the same live snapshot the Heartbeat Loop keeps fresh
    /// without the two owning separate copies.
    #[must_use]
    pub fn cache_handle(&self) -> std::sync::Arc<WiringCache> {
        std::sync::Arc::clone(&self.cache)
    }

    async fn register_once(&self, request: &RegisterRequest) -> Result<RegisterResponse> {
        let response = self
            .http
            .post(format!("{}/agents/register_with_metadata", self.base_url))
            .json(request)
            .send()
            .await?;

        if response.status().is_client_error() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Rejected { status, message });
        }

        let response = response.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Registers with the mesh, retrying transport failures and `5xx`
    /// responses indefinitely with exponential backoff and jitter (spec
    /// §4.5). Installs the returned wiring into the cache before returning.
    ///
    /// Callers are expected to spawn this rather than await it inline: a
    /// boot sequence must not block on registry availability.
    pub async fn register_with_retry(&self, request: RegisterRequest) -> RegisterResponse {
        let mut delay = BASE_DELAY;
        let mut rng = rand::thread_rng();

        loop {
            match self.register_once(&request).await {
                Ok(response) => {
                    self.cache.store(response.resource_version, response.wiring.clone());
                    info!(agent_id = %response.agent_id, "registered with mesh");
                    return response;
                }
                Err(err) if err.is_retryable() => {
                    let sleep_for = jittered(delay, &mut rng);
                    warn!(?err, ?sleep_for, "registration failed, retrying");
                    tokio::time::sleep(sleep_for).await;
                    delay = next_delay(delay);
                }
                Err(err) => {
                    // A non-retryable rejection (e.g. malformed request) would
                    // retry forever to no effect; log loudly and keep trying
                    // anyway, since register_with_retry's contract is to never
                    // give up — the caller has nothing else to fall back to.
                    warn!(?err, "registration rejected by registry, retrying anyway");
                    let sleep_for = jittered(delay, &mut rng);
                    tokio::time::sleep(sleep_for).await;
                    delay = next_delay(delay);
                }
            }
        }
    }

    /// Sends a single heartbeat. Never retries internally: a transport
    /// failure is returned to the caller, which logs it and
    /// waits for the next cadence tick.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] or [`ClientError::Decode`] on
    /// failure; a `404` from the registry is reported as
    /// `Ok(HeartbeatOutcome::NotFound)`, not an error, since it is an
    /// expected, actionable outcome rather than a transport fault.
    pub async fn heartbeat(&self, agent_id: AgentId) -> Result<HeartbeatOutcome> {
        let known_resource_version = Some(self.cache.resource_version());
        let request = HeartbeatRequest {
            agent_id,
            status_hint: None,
            metadata: None,
            known_resource_version,
        };

        let response = self
            .http
            .post(format!("{}/heartbeat", self.base_url))
            .json(&request)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(HeartbeatOutcome::NotFound);
        }

        let response = response.error_for_status()?;
        let body: HeartbeatResponse = response.json().await?;

        match body.wiring {
            Some(wiring) => {
                self.cache.store(body.resource_version, wiring);
                Ok(HeartbeatOutcome::Updated)
            }
            None => Ok(HeartbeatOutcome::Unchanged),
        }
    }

    /// Convenience accessor for the cache's current resource version, used
    /// by the Heartbeat Loop to decide whether to log a transition.
    #[must_use]
    pub fn cached_resource_version(&self) -> ResourceVersion {
        self.cache.resource_version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            id: None,
            name: "agent".into(),
            namespace: "default".into(),
            agent_type: "worker".into(),
            endpoint: "http://agent.local".into(),
            capabilities: vec![],
            dependencies: vec![],
            labels: Default::default(),
            security_context: String::new(),
            health_interval_seconds: 5,
            timeout_threshold_seconds: None,
            eviction_threshold_seconds: None,
        }
    }

    #[tokio::test]
    async fn register_succeeds_on_first_try_and_populates_cache() {
        let server = MockServer::start().await;
        let agent_id = AgentId::random();

        Mock::given(method("POST"))
            .and(path("/agents/register_with_metadata"))
            .respond_with(ResponseTemplate::new(200).set_body_json(RegisterResponse {
                agent_id,
                resource_version: ResourceVersion::from(1),
                wiring: vec![],
            }))
            .mount(&server)
            .await;

        let client = RegistryClient::new(server.uri());
        let response = client.register_with_retry(register_request()).await;

        assert_eq!(response.agent_id, agent_id);
        assert_eq!(client.cache().resource_version(), ResourceVersion::from(1));
    }

    #[tokio::test]
    async fn heartbeat_not_found_is_reported_not_erred() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/heartbeat"))
            .respond_with(ResponseTemplate::new(404).set_body_json(mesh_wire::ErrorResponse {
                error: "unknown_agent".into(),
                message: "nope".into(),
            }))
            .mount(&server)
            .await;

        let client = RegistryClient::new(server.uri());
        let outcome = client.heartbeat(AgentId::random()).await.unwrap();
        assert!(matches!(outcome, HeartbeatOutcome::NotFound));
    }

    #[tokio::test]
    async fn heartbeat_unchanged_leaves_cache_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/heartbeat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(HeartbeatResponse {
                resource_version: ResourceVersion::from(5),
                wiring: None,
            }))
            .mount(&server)
            .await;

        let client = RegistryClient::new(server.uri());
        let outcome = client.heartbeat(AgentId::random()).await.unwrap();
        assert!(matches!(outcome, HeartbeatOutcome::Unchanged));
        assert_eq!(client.cached_resource_version(), ResourceVersion::zero());
    }
}
