//! Translates the wire-level [`DiscoverQuery`] into the [`AgentFilter`] /
//! [`CapabilityFilter`] predicates `mesh-resolver` and `mesh-store` operate
//! on.

use std::collections::BTreeMap;

use mesh_resolver::{AgentFilter, CapabilityFilter};
use mesh_wire::DiscoverQuery;
use semver::VersionReq;

use crate::error::RegistryError;

fn parse_label_selector(raw: &str) -> Result<BTreeMap<String, String>, RegistryError> {
    let mut selector = BTreeMap::new();
    for pair in raw.split(',').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').ok_or_else(|| RegistryError::InvalidQuery {
            field: "label_selector",
            reason: format!("expected k=v, got {pair:?}"),
        })?;
        selector.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(selector)
}

fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Builds an [`AgentFilter`] from a discovery query, as used by `GET /agents`.
pub fn agent_filter(query: &DiscoverQuery) -> Result<AgentFilter, RegistryError> {
    let capability = capability_filter(query)?;

    let label_selector = match &query.label_selector {
        Some(raw) => parse_label_selector(raw)?,
        None => BTreeMap::new(),
    };

    Ok(AgentFilter {
        namespace: query.namespace.clone(),
        status: query.status,
        label_selector,
        capability,
        fuzzy_match: query.fuzzy_match,
        name: None,
    })
}

/// Builds a [`CapabilityFilter`] from a discovery query, as used by both
/// `GET /agents` (nested) and `GET /capabilities` (top-level).
pub fn capability_filter(query: &DiscoverQuery) -> Result<CapabilityFilter, RegistryError> {
    let version_constraint = match &query.version_constraint {
        Some(raw) => Some(VersionReq::parse(raw).map_err(|err| RegistryError::InvalidQuery {
            field: "version_constraint",
            reason: err.to_string(),
        })?),
        None => None,
    };

    let tags = query.tags.as_deref().map(parse_tags).unwrap_or_default();

    Ok(CapabilityFilter {
        name: query.capability.clone(),
        category: query.capability_category.clone(),
        version_constraint,
        tags,
        include_deprecated: query.include_deprecated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_selector_parses_pairs() {
        let parsed = parse_label_selector("region=us-east,tier=gold").unwrap();
        assert_eq!(parsed.get("region"), Some(&"us-east".to_string()));
        assert_eq!(parsed.get("tier"), Some(&"gold".to_string()));
    }

    #[test]
    fn malformed_label_selector_errors() {
        assert!(parse_label_selector("not-a-pair").is_err());
    }

    #[test]
    fn tags_split_on_comma_and_trim() {
        assert_eq!(parse_tags(" a, b ,c"), vec!["a", "b", "c"]);
    }
}
