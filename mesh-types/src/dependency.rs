//! Dependency descriptors: an agent's declaration that it wishes to consume
//! a capability matching some criteria.

use std::collections::{BTreeMap, BTreeSet};

use semver::VersionReq;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which field of a candidate capability a [`DependencyDescriptor`] matches against.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "ref")]
pub enum DependencyKind {
    /// Match a capability whose name equals a literal string.
    ByName(String),
    /// Match a capability whose name equals a declared interface identifier,
    /// or which tags itself with that identifier (see `interface_id` tag
    /// convention enforced by `mesh-resolver`).
    ByInterface(String),
    /// Match a capability whose name equals a specific concrete type identifier.
    ByConcrete(String),
}

impl DependencyKind {
    /// The literal reference string carried by any variant.
    #[must_use]
    pub fn reference(&self) -> &str {
        match self {
            Self::ByName(r) | Self::ByInterface(r) | Self::ByConcrete(r) => r,
        }
    }
}

/// A declaration by an agent that it wishes to consume a capability matching
/// some criteria, with optional narrowing modifiers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DependencyDescriptor {
    #[serde(flatten)]
    kind: DependencyKind,
    required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version_constraint: Option<VersionReq>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label_selector: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "tags")]
    tag_set: Option<BTreeSet<String>>,
}

impl DependencyDescriptor {
    /// Starts building a dependency descriptor for the given match kind.
    #[must_use]
    pub fn builder(kind: DependencyKind) -> DependencyDescriptorBuilder {
        DependencyDescriptorBuilder {
            kind,
            required: true,
            version_constraint: None,
            label_selector: None,
            tag_set: None,
        }
    }

    /// The match kind and literal reference.
    #[must_use]
    pub const fn kind(&self) -> &DependencyKind {
        &self.kind
    }

    /// Whether a tool invocation should fail when this dependency is unsatisfied.
    #[must_use]
    pub const fn required(&self) -> bool {
        self.required
    }

    /// Optional semver range a candidate capability's version must satisfy.
    #[must_use]
    pub const fn version_constraint(&self) -> Option<&VersionReq> {
        self.version_constraint.as_ref()
    }

    /// Optional conjunction of `key=value` predicates against the candidate
    /// agent's labels.
    #[must_use]
    pub fn label_selector(&self) -> Option<&BTreeMap<String, String>> {
        self.label_selector.as_ref()
    }

    /// Optional set of tags that must all be present on the candidate capability.
    #[must_use]
    pub fn tag_set(&self) -> Option<&BTreeSet<String>> {
        self.tag_set.as_ref()
    }
}

/// Builder for [`DependencyDescriptor`].
#[derive(Debug)]
pub struct DependencyDescriptorBuilder {
    kind: DependencyKind,
    required: bool,
    version_constraint: Option<VersionReq>,
    label_selector: Option<BTreeMap<String, String>>,
    tag_set: Option<BTreeSet<String>>,
}

impl DependencyDescriptorBuilder {
    /// Sets whether the dependency is required (default: `true`).
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets a semver range the candidate's capability version must satisfy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVersionConstraint`] if `constraint` is not a
    /// valid semver range.
    pub fn version_constraint(mut self, constraint: impl AsRef<str>) -> Result<Self> {
        let raw = constraint.as_ref();
        let parsed = VersionReq::parse(raw).map_err(|source| Error::InvalidVersionConstraint {
            value: raw.to_string(),
            source,
        })?;
        self.version_constraint = Some(parsed);
        Ok(self)
    }

    /// Sets the label selector (conjunction of `key=value` predicates).
    #[must_use]
    pub fn label_selector(mut self, selector: BTreeMap<String, String>) -> Self {
        self.label_selector = Some(selector);
        self
    }

    /// Sets the required tag set.
    #[must_use]
    pub fn tag_set(mut self, tags: BTreeSet<String>) -> Self {
        self.tag_set = Some(tags);
        self
    }

    /// Finalises the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDependency`] if the match reference is empty.
    pub fn build(self) -> Result<DependencyDescriptor> {
        if self.kind.reference().trim().is_empty() {
            return Err(Error::InvalidDependency {
                reason: "match reference cannot be empty".into(),
            });
        }
        Ok(DependencyDescriptor {
            kind: self.kind,
            required: self.required,
            version_constraint: self.version_constraint,
            label_selector: self.label_selector,
            tag_set: self.tag_set,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_by_name_dependency() {
        let dep = DependencyDescriptor::builder(DependencyKind::ByName("greet".into()))
            .required(true)
            .version_constraint("^1.0.0")
            .expect("constraint")
            .build()
            .expect("build");

        assert_eq!(dep.kind().reference(), "greet");
        assert!(dep.required());
        assert!(dep.version_constraint().unwrap().matches(&"1.2.0".parse().unwrap()));
    }

    #[test]
    fn rejects_empty_reference() {
        let err = DependencyDescriptor::builder(DependencyKind::ByName(String::new()))
            .build()
            .expect_err("should fail");
        assert!(matches!(err, Error::InvalidDependency { .. }));
    }
}
