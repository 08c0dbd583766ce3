//! Discovery-query filter predicates, shared by `mesh-store::list_agents`
//! and the `GET /agents` / `GET /capabilities` handlers in `mesh-registry`.

use std::collections::BTreeMap;

use mesh_types::{AgentRecord, AgentStatus, Capability, Stability};
use semver::VersionReq;

use crate::fuzzy_score;

/// Filter applied to the agent table by `GET /agents` (and internally by
/// `Store::list_agents`). Every populated field narrows the result; absent
/// fields impose no constraint.
#[derive(Clone, Debug, Default)]
pub struct AgentFilter {
    /// Restrict to a single namespace.
    pub namespace: Option<String>,
    /// Restrict to agents in this status.
    pub status: Option<AgentStatus>,
    /// Conjunction of `key=value` predicates against the agent's labels.
    pub label_selector: BTreeMap<String, String>,
    /// Restrict to agents offering at least one capability matching these
    /// capability-level predicates.
    pub capability: CapabilityFilter,
    /// Case-insensitive substring/edit-distance matching instead of exact
    /// equality, applied to name fields (agent name, capability name).
    pub fuzzy_match: bool,
    /// Substring/fuzzy match against the agent's display name.
    pub name: Option<String>,
}

/// Capability-level predicates, narrowed from [`AgentFilter`] for
/// `GET /capabilities` or embedded within it for `GET /agents`.
#[derive(Clone, Debug, Default)]
pub struct CapabilityFilter {
    /// Restrict to a capability with this name.
    pub name: Option<String>,
    /// Restrict to a capability in this category.
    pub category: Option<String>,
    /// Restrict to capabilities whose version satisfies this constraint.
    pub version_constraint: Option<VersionReq>,
    /// Restrict to capabilities carrying all of these tags.
    pub tags: Vec<String>,
    /// Whether `stability: deprecated` capabilities are included.
    pub include_deprecated: bool,
}

impl AgentFilter {
    /// Returns `true` if `agent` satisfies every populated predicate.
    #[must_use]
    pub fn matches(&self, agent: &AgentRecord) -> bool {
        if let Some(namespace) = &self.namespace {
            if agent.namespace() != namespace {
                return false;
            }
        }

        if let Some(status) = self.status {
            if agent.status() != status {
                return false;
            }
        }

        for (key, value) in &self.label_selector {
            if agent.labels().get(key) != Some(value) {
                return false;
            }
        }

        if let Some(name) = &self.name {
            let matched = if self.fuzzy_match {
                fuzzy_score(agent.name(), name).is_some()
            } else {
                agent.name().eq_ignore_ascii_case(name)
            };
            if !matched {
                return false;
            }
        }

        if self.capability.is_empty() {
            return true;
        }

        agent
            .capabilities()
            .iter()
            .any(|cap| self.capability.matches(cap, self.fuzzy_match))
    }
}

impl CapabilityFilter {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.version_constraint.is_none()
            && self.tags.is_empty()
    }

    /// Returns `true` if `capability` satisfies every populated predicate.
    #[must_use]
    pub fn matches(&self, capability: &Capability, fuzzy: bool) -> bool {
        if !self.include_deprecated && capability.stability() == Stability::Deprecated {
            return false;
        }

        if let Some(name) = &self.name {
            let matched = if fuzzy {
                fuzzy_score(capability.name(), name).is_some()
            } else {
                capability.name() == name
            };
            if !matched {
                return false;
            }
        }

        if let Some(category) = &self.category {
            if capability.category() != category {
                return false;
            }
        }

        if let Some(constraint) = &self.version_constraint {
            if !constraint.matches(capability.version()) {
                return false;
            }
        }

        if !self.tags.iter().all(|tag| capability.has_tag(tag)) {
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap as Map;

    use chrono::Utc;
    use mesh_types::{AgentId, AgentRecord, Stability};

    use super::*;

    fn sample_agent() -> AgentRecord {
        let capability = Capability::builder("greet")
            .version("1.2.0")
            .unwrap()
            .category("text")
            .stability(Stability::Stable)
            .add_tag("demo")
            .build()
            .unwrap();

        let mut labels = Map::new();
        labels.insert("region".to_string(), "us-east".to_string());

        AgentRecord::new(
            AgentId::random(),
            "greeter".into(),
            "prod".into(),
            "worker".into(),
            "http://greeter.local".into(),
            vec![capability],
            vec![],
            labels,
            String::new(),
            10,
            30,
            90,
            Utc::now(),
        )
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = AgentFilter::default();
        assert!(filter.matches(&sample_agent()));
    }

    #[test]
    fn namespace_filter_excludes_mismatch() {
        let mut filter = AgentFilter::default();
        filter.namespace = Some("staging".into());
        assert!(!filter.matches(&sample_agent()));
    }

    #[test]
    fn label_selector_requires_all_pairs() {
        let mut filter = AgentFilter::default();
        filter
            .label_selector
            .insert("region".into(), "us-east".into());
        assert!(filter.matches(&sample_agent()));

        filter
            .label_selector
            .insert("tier".into(), "gold".into());
        assert!(!filter.matches(&sample_agent()));
    }

    #[test]
    fn capability_filter_excludes_deprecated_by_default() {
        let deprecated = Capability::builder("old")
            .version("0.9.0")
            .unwrap()
            .category("text")
            .stability(Stability::Deprecated)
            .build()
            .unwrap();
        assert!(!CapabilityFilter::default().matches(&deprecated, false));

        let mut filter = CapabilityFilter::default();
        filter.include_deprecated = true;
        assert!(filter.matches(&deprecated, false));
    }
}
