//! The Dependency Injector: resolves each of a tool's declared
//! dependencies, per invocation, to either a remote [`ToolInvocationProxy`]
//! bound to the top-ranked wiring candidate, a configured local fallback, or
//! a null sentinel for graceful degradation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use mesh_client::WiringCache;
use mesh_types::DependencyDescriptor;
use serde_json::Value;

use crate::error::{Result, ToolError, Transport};
use crate::proxy::ToolInvocationProxy;
use crate::registry::Tool;

/// The outcome of resolving a single declared dependency for one invocation.
pub enum ResolvedDependency {
    /// Bound to the top-ranked peer from the current wiring snapshot.
    Proxy(ToolInvocationProxy),
    /// No peer was wired; a local fallback implementation was configured
    /// instead.
    Fallback(Arc<dyn Tool>),
    /// No peer was wired and no fallback was configured. Contractually, the
    /// tool body is expected to tolerate this for optional dependencies.
    Null,
}

impl ResolvedDependency {
    /// Dispatches a call through whichever resolution this is: a real
    /// outbound proxy call, a local fallback invocation, or a no-op that
    /// returns `Value::Null`.
    ///
    /// # Errors
    ///
    /// Propagates [`ToolError::PeerUnreachable`], [`ToolError::PeerRejected`],
    /// or [`ToolError::ProxyUnsupportedTransport`] from a bound proxy, and
    /// [`ToolError::Execution`] from a failing fallback.
    pub async fn invoke(&self, method: &str, args: Value) -> Result<Value> {
        match self {
            Self::Proxy(proxy) => proxy.invoke(method, args).await,
            Self::Fallback(tool) => tool.invoke(args).await,
            Self::Null => Ok(Value::Null),
        }
    }

    /// `true` if this resolution is backed by neither a peer nor a fallback.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Resolves an agent's declared dependencies against its current wiring
/// cache. Constructed once at tool-registration time but re-consulted on
/// every invocation: wiring changes take effect on the next call without
/// restart.
pub struct DependencyInjector {
    cache: Arc<WiringCache>,
    descriptors: Vec<DependencyDescriptor>,
    fallbacks: HashMap<usize, Arc<dyn Tool>>,
    transport: Transport,
    timeout: Duration,
}

impl DependencyInjector {
    /// Creates an injector over the agent's declared dependency list, backed
    /// by its Registry Client's wiring cache.
    #[must_use]
    pub fn new(cache: Arc<WiringCache>, descriptors: Vec<DependencyDescriptor>, transport: Transport) -> Self {
        Self {
            cache,
            descriptors,
            fallbacks: HashMap::new(),
            transport,
            timeout: crate::proxy::DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the default per-call proxy timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Registers a local fallback for the dependency at `index`, used
    /// whenever the wiring cache has no candidates for it.
    pub fn set_fallback(&mut self, index: usize, tool: Arc<dyn Tool>) {
        self.fallbacks.insert(index, tool);
    }

    /// Builder-style variant of [`Self::set_fallback`].
    #[must_use]
    pub fn with_fallback(mut self, index: usize, tool: Arc<dyn Tool>) -> Self {
        self.set_fallback(index, tool);
        self
    }

    /// Resolves the dependency declared at `index` against the current
    /// wiring snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::DependencyUnsatisfied`] when the dependency is
    /// `required`, has no wiring candidates, and no fallback was configured.
    pub fn resolve(&self, index: usize) -> Result<ResolvedDependency> {
        let descriptor = self
            .descriptors
            .get(index)
            .ok_or_else(|| ToolError::DependencyUnsatisfied {
                index,
                reference: "<out of range>".into(),
            })?;

        let snapshot = self.cache.load();
        let candidates = snapshot
            .wiring
            .iter()
            .find(|entry| entry.dependency_index == index)
            .map(|entry| entry.candidates.as_slice())
            .unwrap_or_default();

        if let Some(top) = candidates.first() {
            return Ok(ResolvedDependency::Proxy(ToolInvocationProxy::with_timeout(
                top,
                self.transport,
                self.timeout,
            )));
        }

        if let Some(fallback) = self.fallbacks.get(&index) {
            return Ok(ResolvedDependency::Fallback(Arc::clone(fallback)));
        }

        if descriptor.required() {
            return Err(ToolError::DependencyUnsatisfied {
                index,
                reference: descriptor.kind().reference().to_owned(),
            });
        }

        Ok(ResolvedDependency::Null)
    }

    /// Resolves every declared dependency in order, for callers that want
    /// the full set up front rather than resolving lazily per access.
    ///
    /// # Errors
    ///
    /// Returns the first [`ToolError::DependencyUnsatisfied`] encountered.
    pub fn resolve_all(&self) -> Result<Vec<ResolvedDependency>> {
        (0..self.descriptors.len()).map(|i| self.resolve(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::{AgentId, DependencyKind, ResourceVersion, WiringCandidate, WiringEntry};

    fn descriptor(required: bool) -> DependencyDescriptor {
        DependencyDescriptor::builder(DependencyKind::ByName("greet".into()))
            .required(required)
            .build()
            .unwrap()
    }

    fn candidate() -> WiringCandidate {
        WiringCandidate {
            agent_id: AgentId::random(),
            endpoint: "http://peer.local".into(),
            capability_name: "greet".into(),
            capability_version: "1.0.0".into(),
        }
    }

    #[test]
    fn binds_to_top_ranked_candidate_when_wired() {
        let cache = Arc::new(WiringCache::new());
        cache.store(
            ResourceVersion::from(1),
            vec![WiringEntry {
                dependency_index: 0,
                candidates: vec![candidate()],
            }],
        );

        let injector = DependencyInjector::new(cache, vec![descriptor(true)], Transport::Http);
        let resolved = injector.resolve(0).unwrap();
        assert!(matches!(resolved, ResolvedDependency::Proxy(_)));
    }

    #[test]
    fn required_unsatisfied_without_fallback_errors() {
        let cache = Arc::new(WiringCache::new());
        let injector = DependencyInjector::new(cache, vec![descriptor(true)], Transport::Http);
        let err = injector.resolve(0).unwrap_err();
        assert!(matches!(err, ToolError::DependencyUnsatisfied { index: 0, .. }));
    }

    #[test]
    fn optional_unsatisfied_without_fallback_is_null() {
        let cache = Arc::new(WiringCache::new());
        let injector = DependencyInjector::new(cache, vec![descriptor(false)], Transport::Http);
        let resolved = injector.resolve(0).unwrap();
        assert!(resolved.is_null());
    }

    #[tokio::test]
    async fn fallback_used_when_unwired() {
        let cache = Arc::new(WiringCache::new());
        let fallback: Arc<dyn Tool> = Arc::new(|input: Value| async move { Ok(input) });
        let injector =
            DependencyInjector::new(cache, vec![descriptor(true)], Transport::Http).with_fallback(0, fallback);

        let resolved = injector.resolve(0).unwrap();
        assert!(matches!(resolved, ResolvedDependency::Fallback(_)));
        let result = resolved.invoke("unused", serde_json::json!(7)).await.unwrap();
        assert_eq!(result, serde_json::json!(7));
    }

    #[test]
    fn takes_effect_on_next_invocation_without_restart() {
        let cache = Arc::new(WiringCache::new());
        let injector = DependencyInjector::new(Arc::clone(&cache), vec![descriptor(false)], Transport::Http);

        assert!(injector.resolve(0).unwrap().is_null());

        cache.store(
            ResourceVersion::from(1),
            vec![WiringEntry {
                dependency_index: 0,
                candidates: vec![candidate()],
            }],
        );

        assert!(matches!(injector.resolve(0).unwrap(), ResolvedDependency::Proxy(_)));
    }
}
