//! Agent-side runtime glue: the lifecycle
//! state machine, a cooperative task scheduler, and the Heartbeat Loop that
//! ties an agent process to a registry over `mesh-client`.
//!
//! This crate is the facade an agent binary constructs once at boot; the
//! Dependency Injector and Tool Invocation Proxy it hands tool bodies live
//! in `mesh-tools`, built from the same wiring cache this runtime keeps
//! alive via its heartbeat loop.

#![warn(missing_docs, clippy::pedantic)]

mod heartbeat;
mod lifecycle;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use mesh_client::RegistryClient;
use mesh_tools::DependencyInjector;
use mesh_types::{AgentId, DependencyDescriptor};
use mesh_wire::RegisterRequest;
use thiserror::Error;

pub use heartbeat::HeartbeatLoop;
pub use lifecycle::{AgentState, Lifecycle, LifecycleError, LifecycleEvent, LifecycleResult};
pub use scheduler::{SchedulerConfig, SchedulerError, SchedulerResult, TaskScheduler};

/// Owns an agent process's lifecycle, scheduler, Registry Client, and
/// Dependency Injector, and drives the Heartbeat Loop that keeps its wiring
/// cache fresh.
pub struct AgentRuntime {
    lifecycle: Lifecycle,
    scheduler: TaskScheduler,
    client: Arc<RegistryClient>,
    heartbeat: Option<tokio::sync::watch::Sender<bool>>,
    heartbeat_handle: Option<tokio::task::JoinHandle<()>>,
}

impl AgentRuntime {
    /// Constructs a runtime for an agent that has not yet registered.
    /// `agent_id` seeds the lifecycle controller only; the identifier the
    /// agent actually heartbeats under is whatever the registry assigns
    /// during [`Self::start`].
    #[must_use]
    pub fn new(agent_id: AgentId, registry_base_url: impl Into<String>, scheduler: TaskScheduler) -> Self {
        Self {
            lifecycle: Lifecycle::new(agent_id),
            scheduler,
            client: Arc::new(RegistryClient::new(registry_base_url)),
            heartbeat: None,
            heartbeat_handle: None,
        }
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> AgentState {
        self.lifecycle.state()
    }

    /// Applies a lifecycle event.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] when the transition is not permitted from
    /// the current state.
    pub fn transition(&mut self, event: LifecycleEvent) -> RuntimeResult<AgentState> {
        Ok(self.lifecycle.transition(event)?)
    }

    /// Returns a reference to the underlying scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    /// Returns the Registry Client backing this runtime, shared with
    /// whatever spawns the Heartbeat Loop.
    #[must_use]
    pub fn registry_client(&self) -> Arc<RegistryClient> {
        Arc::clone(&self.client)
    }

    /// Registers with the mesh and starts the Heartbeat Loop at the cadence
    /// named in `request.health_interval_seconds`. Transitions the lifecycle
    /// through `Boot` and `Activate` once the initial registration lands.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Lifecycle`] if the agent is not in a state
    /// from which booting is permitted.
    pub async fn start(&mut self, request: RegisterRequest) -> RuntimeResult<AgentId> {
        self.transition(LifecycleEvent::Boot)?;

        let interval = Duration::from_secs(request.health_interval_seconds.max(1));
        let heartbeat_loop = HeartbeatLoop::new(Arc::clone(&self.client), request, interval);
        let (handle, tx) = heartbeat_loop.spawn();
        self.heartbeat = Some(tx);
        self.heartbeat_handle = Some(handle);

        self.transition(LifecycleEvent::Activate)?;

        // The agent_id assigned by the registry surfaces through the
        // Registry Client's cache only after the loop's first registration
        // completes; callers that need it immediately should await the
        // first successful heartbeat or read it from their own copy of the
        // registration response.
        Ok(self.lifecycle.agent_id())
    }

    /// Builds a [`DependencyInjector`] over this runtime's live wiring cache
    /// for the given dependency descriptors, so wiring changes observed by
    /// the Heartbeat Loop take effect on an agent's very next tool call.
    #[must_use]
    pub fn dependency_injector(
        &self,
        descriptors: Vec<DependencyDescriptor>,
        transport: mesh_tools::Transport,
    ) -> DependencyInjector {
        DependencyInjector::new(self.client.cache_handle(), descriptors, transport)
    }

    /// Signals the Heartbeat Loop to stop and transitions the lifecycle
    /// through `Retire` then `Terminate`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Lifecycle`] if either transition is not
    /// permitted from the current state.
    pub async fn shutdown(&mut self) -> RuntimeResult<()> {
        self.transition(LifecycleEvent::Retire)?;

        if let Some(tx) = self.heartbeat.take() {
            let _ = tx.send(true);
        }
        if let Some(handle) = self.heartbeat_handle.take() {
            let _ = handle.await;
        }

        self.transition(LifecycleEvent::Terminate)?;
        Ok(())
    }
}

/// Errors produced by [`AgentRuntime`] operations.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Lifecycle transition failure.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Result alias for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn scheduler() -> TaskScheduler {
        TaskScheduler::new(SchedulerConfig::new(NonZeroUsize::new(4).unwrap()))
    }

    fn request() -> RegisterRequest {
        RegisterRequest {
            id: None,
            name: "runtime-agent".into(),
            namespace: "default".into(),
            agent_type: "worker".into(),
            endpoint: "http://agent.local".into(),
            capabilities: vec![],
            dependencies: vec![],
            labels: Default::default(),
            security_context: String::new(),
            health_interval_seconds: 1,
            timeout_threshold_seconds: None,
            eviction_threshold_seconds: None,
        }
    }

    #[tokio::test]
    async fn start_activates_lifecycle_and_shutdown_terminates() {
        let server = MockServer::start().await;
        let agent_id = AgentId::random();

        Mock::given(method("POST"))
            .and(path("/agents/register_with_metadata"))
            .respond_with(ResponseTemplate::new(200).set_body_json(mesh_wire::RegisterResponse {
                agent_id,
                resource_version: mesh_types::ResourceVersion::from(1),
                wiring: vec![],
            }))
            .mount(&server)
            .await;

        let mut runtime = AgentRuntime::new(AgentId::random(), server.uri(), scheduler());
        runtime.start(request()).await.unwrap();
        assert_eq!(runtime.state(), AgentState::Active);

        runtime.shutdown().await.unwrap();
        assert_eq!(runtime.state(), AgentState::Terminated);
    }
}
