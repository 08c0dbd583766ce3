//! Capability descriptors advertised by an agent.

use std::collections::BTreeMap;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MAX_NAME_LEN: usize = 96;

/// Maturity of a capability, used by the resolver as a ranking tie-break.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stability {
    /// Production-grade, preferred over other stability levels.
    Stable,
    /// Under active development; ranked below `Stable`.
    Experimental,
    /// Scheduled for removal; ranked last.
    Deprecated,
}

impl Stability {
    /// Ranking weight used by the resolver: lower sorts first.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Stable => 0,
            Self::Experimental => 1,
            Self::Deprecated => 2,
        }
    }
}

/// A named, versioned unit of functionality an agent offers.
///
/// Within one agent record, capability names must be unique; this is
/// enforced by [`crate::AgentRecord`], not by `Capability` itself.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Capability {
    name: String,
    version: Version,
    #[serde(default)]
    category: String,
    stability: Stability,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    input_schema: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    performance_profile: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    security_level: Option<String>,
}

impl Capability {
    /// Starts building a capability descriptor.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> CapabilityBuilder {
        CapabilityBuilder {
            name: name.into(),
            version: None,
            category: None,
            stability: Stability::Stable,
            tags: Vec::new(),
            input_schema: None,
            performance_profile: None,
            security_level: None,
        }
    }

    /// Capability name, unique within its owning agent.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Semantic version of the capability's contract.
    #[must_use]
    pub const fn version(&self) -> &Version {
        &self.version
    }

    /// Free-form grouping used by discovery filters (e.g. `"llm"`, `"storage"`).
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Maturity level, used as a resolver ranking tie-break.
    #[must_use]
    pub const fn stability(&self) -> Stability {
        self.stability
    }

    /// Free-form labels. The Resolver treats `interface_id` as a reserved tag
    /// that makes a capability eligible for by-interface dependency matching.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns `true` if `tag` is present, case-sensitively.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Optional JSON schema describing the capability's invocation payload.
    #[must_use]
    pub fn input_schema(&self) -> Option<&serde_json::Value> {
        self.input_schema.as_ref()
    }

    /// Optional free-form numeric performance hints (e.g. `latency_ms`).
    #[must_use]
    pub fn performance_profile(&self) -> Option<&BTreeMap<String, f64>> {
        self.performance_profile.as_ref()
    }

    /// Optional declared security level (e.g. `"public"`, `"internal"`).
    #[must_use]
    pub fn security_level(&self) -> Option<&str> {
        self.security_level.as_deref()
    }
}

/// Builder for [`Capability`].
#[derive(Debug)]
pub struct CapabilityBuilder {
    name: String,
    version: Option<Version>,
    category: Option<String>,
    stability: Stability,
    tags: Vec<String>,
    input_schema: Option<serde_json::Value>,
    performance_profile: Option<BTreeMap<String, f64>>,
    security_level: Option<String>,
}

impl CapabilityBuilder {
    /// Sets the semantic version string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVersion`] if `version` is not valid semver.
    pub fn version(mut self, version: impl AsRef<str>) -> Result<Self> {
        let raw = version.as_ref();
        let parsed = Version::parse(raw).map_err(|source| Error::InvalidVersion {
            value: raw.to_string(),
            source,
        })?;
        self.version = Some(parsed);
        Ok(self)
    }

    /// Sets the capability category.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the stability level (defaults to [`Stability::Stable`]).
    #[must_use]
    pub const fn stability(mut self, stability: Stability) -> Self {
        self.stability = stability;
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn add_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Sets the full tag list, replacing any previously added tags.
    #[must_use]
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Sets the optional input schema.
    #[must_use]
    pub fn input_schema(mut self, schema: serde_json::Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Sets the optional performance profile.
    #[must_use]
    pub fn performance_profile(mut self, profile: BTreeMap<String, f64>) -> Self {
        self.performance_profile = Some(profile);
        self
    }

    /// Sets the optional security level.
    #[must_use]
    pub fn security_level(mut self, level: impl Into<String>) -> Self {
        self.security_level = Some(level.into());
        self
    }

    /// Finalises the capability descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapability`] if the name is empty or too long,
    /// or if `version`/`category` were never supplied.
    pub fn build(self) -> Result<Capability> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidCapability {
                reason: "name cannot be empty".into(),
            });
        }
        if self.name.len() > MAX_NAME_LEN {
            return Err(Error::InvalidCapability {
                reason: format!("name length must be <= {MAX_NAME_LEN}"),
            });
        }
        let version = self.version.ok_or_else(|| Error::InvalidCapability {
            reason: "version must be provided".into(),
        })?;
        let category = self.category.ok_or_else(|| Error::InvalidCapability {
            reason: "category must be provided".into(),
        })?;

        Ok(Capability {
            name: self.name,
            version,
            category,
            stability: self.stability,
            tags: self.tags,
            input_schema: self.input_schema,
            performance_profile: self.performance_profile,
            security_level: self.security_level,
        })
    }
}
