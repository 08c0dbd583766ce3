//! Local tool registry: metadata and execution for tool functions registered
//! via [`crate::mesh_tool`], plus the [`Tool`] trait used for Dependency
//! Injector fallbacks.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ToolError};

/// Future alias produced by generated tool bindings.
pub type ToolFuture = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;

/// Declarative binding registered via [`crate::mesh_tool`] and collected at
/// startup through `inventory::submit!` (decorator/builder
/// pattern).
#[derive(Clone)]
pub struct ToolBinding {
    metadata: ToolMetadata,
    executor: fn(Value) -> ToolFuture,
}

impl ToolBinding {
    /// Creates a new tool binding from metadata and an executor function.
    #[must_use]
    pub fn new(metadata: ToolMetadata, executor: fn(Value) -> ToolFuture) -> Self {
        Self { metadata, executor }
    }

    /// Returns the metadata associated with this binding.
    #[must_use]
    pub fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    /// Registers the binding with the provided registry.
    ///
    /// # Errors
    ///
    /// Propagates [`ToolError::DuplicateTool`] if a tool with the same name
    /// has already been registered.
    pub fn register(self, registry: &ToolRegistry) -> Result<()> {
        let ToolBinding { metadata, executor } = self;
        registry.register_tool(metadata, executor)
    }
}

inventory::collect!(ToolBinding);

/// Metadata describing a registered tool, including the dependency
/// references it declared (by-name, matched positionally against the
/// agent's `dependencies` registration list).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolMetadata {
    name: String,
    version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    dependencies: Vec<String>,
}

impl ToolMetadata {
    /// Creates metadata for the supplied identifier and version.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Execution`] if either field is empty.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ToolError::execution("tool name cannot be empty"));
        }

        let version = version.into();
        if version.trim().is_empty() {
            return Err(ToolError::execution("tool version cannot be empty"));
        }

        Ok(Self {
            name,
            version,
            description: None,
            dependencies: Vec::new(),
        })
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches the dependency references this tool declared, in
    /// declaration order; index `i` here corresponds to `dependency_index`
    /// `i` in the agent's wiring responses.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the semantic version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the declared dependency references, in declaration order.
    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

/// Trait implemented by tool executors — both user-authored tool bodies and
/// Dependency Injector fallback implementations.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Invokes the tool with the given JSON input, returning JSON output.
    async fn invoke(&self, input: Value) -> Result<Value>;
}

#[async_trait]
impl<F, Fut> Tool for F
where
    F: Send + Sync + Fn(Value) -> Fut,
    Fut: Future<Output = Result<Value>> + Send,
{
    async fn invoke(&self, input: Value) -> Result<Value> {
        (self)(input).await
    }
}

/// Handle returned by the registry for direct invocation.
#[derive(Clone)]
pub struct ToolHandle {
    metadata: ToolMetadata,
    executor: Arc<dyn Tool>,
}

impl ToolHandle {
    /// Returns the associated metadata.
    #[must_use]
    pub fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    /// Executes the underlying tool implementation.
    ///
    /// # Errors
    ///
    /// Propagates any [`ToolError::Execution`] returned by the underlying
    /// implementation.
    pub async fn invoke(&self, input: Value) -> Result<Value> {
        self.executor.invoke(input).await
    }
}

/// Registry of this agent's own locally-implemented tools, keyed by name.
/// Populated explicitly or from [`ToolBinding`]s collected via
/// `inventory::iter`.
#[derive(Default)]
pub struct ToolRegistry {
    inner: RwLock<HashMap<String, ToolHandle>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().expect("tool registry poisoned");
        let names: Vec<_> = inner.keys().cloned().collect();
        f.debug_struct("ToolRegistry")
            .field("registered", &names)
            .finish()
    }
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated from every [`ToolBinding`] submitted
    /// via `inventory::submit!` across the linked binary — the deferred
    /// initialization pass.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::DuplicateTool`] if two collected bindings share a
    /// name.
    pub fn from_inventory() -> Result<Self> {
        let registry = Self::new();
        for binding in inventory::iter::<ToolBinding> {
            registry.register_binding(binding.clone())?;
        }
        Ok(registry)
    }

    /// Registers a tool implementation.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::DuplicateTool`] if the name is already present.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    pub fn register_tool<T>(&self, metadata: ToolMetadata, tool: T) -> Result<()>
    where
        T: Tool + 'static,
    {
        let mut inner = self.inner.write().expect("tool registry poisoned");
        let name = metadata.name().to_owned();
        if inner.contains_key(&name) {
            return Err(ToolError::DuplicateTool(name));
        }

        inner.insert(
            name,
            ToolHandle {
                metadata,
                executor: Arc::new(tool),
            },
        );

        Ok(())
    }

    /// Registers a binding produced by the [`crate::mesh_tool`] macro.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::DuplicateTool`] if the binding name already
    /// exists within the registry.
    pub fn register_binding(&self, binding: ToolBinding) -> Result<()> {
        binding.register(self)
    }

    /// Returns a handle to the tool matching the supplied name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ToolHandle> {
        let inner = self.inner.read().ok()?;
        inner.get(name).cloned()
    }

    /// Invokes a registered tool directly.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] when the tool is not found or
    /// propagates [`ToolError::Execution`] when the implementation fails.
    pub async fn invoke(&self, name: &str, input: Value) -> Result<Value> {
        let handle = self.get(name).ok_or_else(|| ToolError::UnknownTool(name.to_owned()))?;
        handle.invoke(input).await
    }

    /// Lists the metadata of all registered tools.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn list(&self) -> Vec<ToolMetadata> {
        let inner = self.inner.read().expect("tool registry poisoned");
        inner.values().map(|handle| handle.metadata.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> ToolMetadata {
        ToolMetadata::new("echo", "1.0.0")
            .unwrap()
            .with_description("Echo incoming payload")
            .with_dependencies(vec!["greet".into()])
    }

    #[tokio::test]
    async fn register_and_invoke_tool() {
        let registry = ToolRegistry::new();
        registry
            .register_tool(metadata(), |input: Value| async move { Ok(input) })
            .unwrap();

        let payload = serde_json::json!({ "message": "hello" });
        let output = registry.invoke("echo", payload.clone()).await.unwrap();
        assert_eq!(output, payload);
    }

    #[tokio::test]
    async fn register_binding_invokes_executor() {
        let registry = ToolRegistry::new();
        let binding = ToolBinding::new(metadata(), |input: Value| -> ToolFuture {
            Box::pin(async move { Ok(input) })
        });

        registry.register_binding(binding).unwrap();

        let payload = serde_json::json!({ "message": "binding" });
        let output = registry.invoke("echo", payload.clone()).await.unwrap();
        assert_eq!(output, payload);
    }

    #[tokio::test]
    async fn duplicate_registration_errors() {
        let registry = ToolRegistry::new();

        registry
            .register_tool(metadata(), |input: Value| async move { Ok(input) })
            .unwrap();

        let err = registry
            .register_tool(ToolMetadata::new("echo", "1.0.1").unwrap(), |v: Value| async move {
                Ok(v)
            })
            .expect_err("duplicate registration should fail");

        assert!(matches!(err, ToolError::DuplicateTool(name) if name == "echo"));
    }

    #[tokio::test]
    async fn unknown_tool_errors() {
        let registry = ToolRegistry::new();
        let err = registry
            .invoke("missing", Value::Null)
            .await
            .expect_err("unknown tool should error");

        assert!(matches!(err, ToolError::UnknownTool(name) if name == "missing"));
    }

    #[test]
    fn invalid_metadata_errors() {
        let err = ToolMetadata::new("", "1.0.0").expect_err("empty name should error");
        assert!(matches!(err, ToolError::Execution(_)));

        let err = ToolMetadata::new("echo", " ").expect_err("empty version should error");
        assert!(matches!(err, ToolError::Execution(_)));
    }
}
