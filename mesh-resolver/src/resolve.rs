//! The Resolver: maps a dependency descriptor plus the current
//! healthy-agent set to a deterministically ranked candidate list.

use mesh_types::{
    AgentRecord, Capability, DependencyDescriptor, DependencyKind, WiringCandidate,
};
use semver::Version;

use crate::fuzzy_score;

/// Resolves `descriptor` against `agents`, returning a ranked candidate list.
///
/// Only agents with `status().is_resolvable()` (i.e. `Healthy`) are
/// considered. When `fuzzy` is set, exact-match steps become a
/// case-insensitive substring match and the ranking gains an
/// edit-distance factor; fuzzy matching is intended for discovery queries
/// only and must never be used to compute wiring.
#[must_use]
pub fn resolve_dependency(
    descriptor: &DependencyDescriptor,
    agents: &[AgentRecord],
    fuzzy: bool,
) -> Vec<WiringCandidate> {
    let mut ranked: Vec<(RankKey, WiringCandidate)> = Vec::new();

    for agent in agents {
        if !agent.status().is_resolvable() {
            continue;
        }

        for capability in agent.capabilities() {
            let Some(fuzzy_factor) = matches_kind(descriptor.kind(), capability, fuzzy) else {
                continue;
            };

            if !matches_modifiers(descriptor, agent, capability) {
                continue;
            }

            let key = RankKey {
                fuzzy_factor,
                version: capability.version().clone(),
                stability_rank: capability.stability().rank(),
                first_seen_at: agent.first_seen_at(),
                agent_id: agent.agent_id(),
            };

            ranked.push((
                key,
                WiringCandidate {
                    agent_id: agent.agent_id(),
                    endpoint: agent.endpoint().to_string(),
                    capability_name: capability.name().to_string(),
                    capability_version: capability.version().to_string(),
                },
            ));
        }
    }

    ranked.sort_by(|(a, _), (b, _)| a.cmp(b));
    ranked.into_iter().map(|(_, candidate)| candidate).collect()
}

/// Returns `Some(fuzzy_factor)` when `capability` satisfies `kind`, where the
/// fuzzy factor is `0` for exact matches and a negative edit-distance-derived
/// score for fuzzy ones (lower sorts first in [`RankKey`]'s ordering, so we
/// negate it again there — see its `Ord` impl).
fn matches_kind(kind: &DependencyKind, capability: &Capability, fuzzy: bool) -> Option<i64> {
    let reference = kind.reference();
    match kind {
        DependencyKind::ByName(_) | DependencyKind::ByConcrete(_) => {
            if fuzzy {
                fuzzy_score(capability.name(), reference)
            } else if capability.name() == reference {
                Some(0)
            } else {
                None
            }
        }
        DependencyKind::ByInterface(_) => {
            // Requires an explicit `interface_id` tag on the capability.
            // No fallback to name matching.
            if capability.has_tag(reference) {
                Some(0)
            } else if fuzzy {
                capability
                    .tags()
                    .iter()
                    .filter_map(|tag| fuzzy_score(tag, reference))
                    .max()
            } else {
                None
            }
        }
    }
}

fn matches_modifiers(
    descriptor: &DependencyDescriptor,
    agent: &AgentRecord,
    capability: &Capability,
) -> bool {
    if let Some(constraint) = descriptor.version_constraint() {
        if !constraint.matches(capability.version()) {
            return false;
        }
    }

    if let Some(selector) = descriptor.label_selector() {
        for (key, value) in selector {
            if agent.labels().get(key) != Some(value) {
                return false;
            }
        }
    }

    if let Some(tags) = descriptor.tag_set() {
        if !tags.iter().all(|tag| capability.has_tag(tag)) {
            return false;
        }
    }

    true
}

/// Total order used to rank surviving `(agent, capability)` pairs, per spec
/// §4.3 step 4: fuzzy closeness first (discovery only; always `0` for exact
/// matches), then version descending, stability ascending (`stable` first),
/// `first_seen_at` ascending, `agent_id` ascending as the final tie-break.
#[derive(Eq, PartialEq)]
struct RankKey {
    fuzzy_factor: i64,
    version: Version,
    stability_rank: u8,
    first_seen_at: chrono::DateTime<chrono::Utc>,
    agent_id: mesh_types::AgentId,
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // fuzzy_factor: higher (closer to 0) is a better match, so sort descending.
        other
            .fuzzy_factor
            .cmp(&self.fuzzy_factor)
            .then_with(|| other.version.cmp(&self.version))
            .then_with(|| self.stability_rank.cmp(&other.stability_rank))
            .then_with(|| self.first_seen_at.cmp(&other.first_seen_at))
            .then_with(|| self.agent_id.as_uuid().cmp(&other.agent_id.as_uuid()))
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use mesh_types::{AgentId, AgentStatus, Capability, DependencyDescriptor, DependencyKind, Stability};

    use super::*;

    fn agent_with_capability(
        id: AgentId,
        name: &str,
        cap_version: &str,
        stability: Stability,
        first_seen_at: chrono::DateTime<Utc>,
    ) -> AgentRecord {
        let capability = Capability::builder("greet")
            .version(cap_version)
            .unwrap()
            .category("text")
            .stability(stability)
            .build()
            .unwrap();

        let mut record = AgentRecord::new(
            id,
            name.to_string(),
            "default".to_string(),
            "worker".to_string(),
            format!("http://{name}.local"),
            vec![capability],
            vec![],
            BTreeMap::new(),
            String::new(),
            10,
            30,
            90,
            first_seen_at,
        );
        record.set_status(AgentStatus::Healthy);
        record
    }

    #[test]
    fn filters_out_non_healthy_agents() {
        let now = Utc::now();
        let mut expired = agent_with_capability(AgentId::random(), "a", "1.0.0", Stability::Stable, now);
        expired.set_status(AgentStatus::Expired);

        let descriptor = DependencyDescriptor::builder(DependencyKind::ByName("greet".into()))
            .build()
            .unwrap();

        let candidates = resolve_dependency(&descriptor, &[expired], false);
        assert!(candidates.is_empty());
    }

    #[test]
    fn version_constraint_excludes_non_matching_versions() {
        let now = Utc::now();
        let a = agent_with_capability(AgentId::random(), "a", "1.2.0", Stability::Stable, now);
        let c = agent_with_capability(AgentId::random(), "c", "2.0.0", Stability::Stable, now);

        let descriptor = DependencyDescriptor::builder(DependencyKind::ByName("greet".into()))
            .version_constraint("^1.0.0")
            .unwrap()
            .build()
            .unwrap();

        let candidates = resolve_dependency(&descriptor, &[a, c], false);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].capability_version, "1.2.0");
    }

    #[test]
    fn tie_break_prefers_smaller_agent_id() {
        let now = Utc::now();
        let mut ids = [AgentId::random(), AgentId::random()];
        ids.sort_by_key(AgentId::as_uuid);
        let [smaller, larger] = ids;

        let x = agent_with_capability(larger, "x", "1.0.0", Stability::Stable, now);
        let y = agent_with_capability(smaller, "y", "1.0.0", Stability::Stable, now);

        let descriptor = DependencyDescriptor::builder(DependencyKind::ByName("greet".into()))
            .build()
            .unwrap();

        let first = resolve_dependency(&descriptor, &[x.clone(), y.clone()], false);
        let second = resolve_dependency(&descriptor, &[y, x], false);
        assert_eq!(first[0].agent_id, smaller);
        assert_eq!(first[0].agent_id, second[0].agent_id);
    }

    #[test]
    fn by_interface_requires_explicit_tag() {
        let now = Utc::now();
        let capability = Capability::builder("anything")
            .version("1.0.0")
            .unwrap()
            .category("text")
            .build()
            .unwrap();
        let record = AgentRecord::new(
            AgentId::random(),
            "a".into(),
            "default".into(),
            "worker".into(),
            "http://a.local".into(),
            vec![capability],
            vec![],
            BTreeMap::new(),
            String::new(),
            10,
            30,
            90,
            now,
        );

        let descriptor = DependencyDescriptor::builder(DependencyKind::ByInterface("greeter".into()))
            .build()
            .unwrap();

        // Status is Pending (not resolvable) and the capability carries no
        // `greeter` tag either way, so this must resolve to nothing.
        let candidates = resolve_dependency(&descriptor, &[record], false);
        assert!(candidates.is_empty());
    }
}
