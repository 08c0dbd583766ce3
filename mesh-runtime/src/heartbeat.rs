//! The Heartbeat Loop: periodically reports liveness to the
//! registry on the interval the agent registered with, installs any updated
//! wiring into the Registry Client's cache, and transparently re-registers
//! if the registry reports this agent unknown — e.g. after an eviction or a
//! registry restart that lost unpersisted state.

use std::sync::Arc;
use std::time::Duration;

use mesh_client::{HeartbeatOutcome, RegistryClient};
use mesh_types::AgentId;
use mesh_wire::RegisterRequest;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Drives periodic heartbeats against the registry until stopped.
///
/// Registration itself is folded into the loop: if `request.id` is absent
/// when [`Self::spawn`] runs, the loop performs the initial
/// `register_with_retry` before entering its steady-state cadence.
pub struct HeartbeatLoop {
    client: Arc<RegistryClient>,
    request: RegisterRequest,
    interval: Duration,
}

impl HeartbeatLoop {
    /// Builds a heartbeat loop over `client`. `interval` should match the
    /// `health_interval_seconds` the agent is registering (or registered)
    /// with.
    #[must_use]
    pub fn new(client: Arc<RegistryClient>, request: RegisterRequest, interval: Duration) -> Self {
        Self { client, request, interval }
    }

    /// Returns the agent identifier this loop will heartbeat as, once
    /// registered (`None` before the initial registration completes).
    #[must_use]
    pub fn agent_id(&self) -> Option<AgentId> {
        self.request.id
    }

    /// Spawns the loop on the current runtime. Returns its join handle and a
    /// `watch` sender: send `true` (or drop the sender) to stop the loop
    /// after its current tick.
    pub fn spawn(self) -> (JoinHandle<()>, watch::Sender<bool>) {
        let (tx, mut rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let Self { client, mut request, interval } = self;

            let mut agent_id = match request.id {
                Some(id) => id,
                None => {
                    let response = client.register_with_retry(request.clone()).await;
                    request.id = Some(response.agent_id);
                    response.agent_id
                }
            };

            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match client.heartbeat(agent_id).await {
                            Ok(HeartbeatOutcome::Unchanged) => {
                                debug!(%agent_id, "heartbeat ok, wiring unchanged");
                            }
                            Ok(HeartbeatOutcome::Updated) => {
                                info!(%agent_id, "heartbeat ok, wiring updated");
                            }
                            Ok(HeartbeatOutcome::NotFound) => {
                                warn!(%agent_id, "registry reports this agent unknown, re-registering");
                                request.id = None;
                                let response = client.register_with_retry(request.clone()).await;
                                agent_id = response.agent_id;
                                request.id = Some(agent_id);
                            }
                            Err(err) => {
                                warn!(%agent_id, %err, "heartbeat failed, retrying on next cadence tick");
                            }
                        }
                    }
                    _ = rx.changed() => {
                        if *rx.borrow() {
                            info!(%agent_id, "heartbeat loop stopping");
                            break;
                        }
                    }
                }
            }
        });

        (handle, tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::ResourceVersion;
    use mesh_wire::RegisterResponse;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate, Respond};

    fn request() -> RegisterRequest {
        RegisterRequest {
            id: None,
            name: "heartbeat-agent".into(),
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

    struct CountingRegister {
        agent_id: AgentId,
        calls: Arc<AtomicUsize>,
    }

    impl Respond for CountingRegister {
        fn respond(&self, _req: &Request) -> ResponseTemplate {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ResponseTemplate::new(200).set_body_json(RegisterResponse {
                agent_id: self.agent_id,
                resource_version: ResourceVersion::from(1),
                wiring: vec![],
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn registers_once_then_heartbeats_on_cadence() {
        let server = MockServer::start().await;
        let agent_id = AgentId::random();
        let register_calls = Arc::new(AtomicUsize::new(0));

        Mock::given(method("POST"))
            .and(path("/agents/register_with_metadata"))
            .respond_with(CountingRegister { agent_id, calls: Arc::clone(&register_calls) })
            .mount(&server)
            .await;

        let heartbeat_calls = Arc::new(AtomicUsize::new(0));
        Mock::given(method("POST"))
            .and(path("/heartbeat"))
            .respond_with(move |_req: &Request| {
                heartbeat_calls.fetch_add(1, Ordering::SeqCst);
                ResponseTemplate::new(200).set_body_json(mesh_wire::HeartbeatResponse {
                    resource_version: ResourceVersion::from(1),
                    wiring: None,
                })
            })
            .mount(&server)
            .await;

        let client = Arc::new(RegistryClient::new(server.uri()));
        let loop_ = HeartbeatLoop::new(client, request(), Duration::from_millis(10));
        let (handle, tx) = loop_.spawn();

        tokio::time::advance(Duration::from_millis(35)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(register_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reregisters_when_registry_reports_unknown_agent() {
        let server = MockServer::start().await;
        let agent_id = AgentId::random();
        let register_calls = Arc::new(AtomicUsize::new(0));

        Mock::given(method("POST"))
            .and(path("/agents/register_with_metadata"))
            .respond_with(CountingRegister { agent_id, calls: Arc::clone(&register_calls) })
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/heartbeat"))
            .respond_with(ResponseTemplate::new(404).set_body_json(mesh_wire::ErrorResponse {
                error: "unknown_agent".into(),
                message: "nope".into(),
            }))
            .mount(&server)
            .await;

        let client = Arc::new(RegistryClient::new(server.uri()));
        let loop_ = HeartbeatLoop::new(client, request(), Duration::from_millis(10));
        let (handle, tx) = loop_.spawn();

        tokio::time::advance(Duration::from_millis(25)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(register_calls.load(Ordering::SeqCst) >= 2);
    }
}
