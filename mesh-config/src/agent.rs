//! Agent-side configuration, resolved from the environment variables listed
//! from the process environment.

use std::env;

use crate::ConfigError;

/// Resolved agent-runtime configuration: where the registry lives, what
/// name and endpoint this agent advertises, and whether verbose logging is
/// requested.
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Base URL of the registry, e.g. `http://registry.mesh:8080`.
    pub registry_url: String,
    /// Logical agent name; defaults to the binary's own process name when
    /// `MCP_MESH_AGENT_NAME` is unset.
    pub agent_name: Option<String>,
    /// Host/interface hint for binding this agent's own endpoint, from
    /// `HOST` or `POD_IP`.
    pub bind_host: Option<String>,
    /// Verbose logging toggle (`MCP_MESH_DEBUG`).
    pub debug: bool,
}

impl AgentConfig {
    /// Resolves configuration from the current process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRegistryLocation`] if none of
    /// `MCP_MESH_REGISTRY_URL`, or `MCP_MESH_REGISTRY_HOST` combined with
    /// `MCP_MESH_REGISTRY_PORT`, are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let registry_url = if let Ok(url) = env::var("MCP_MESH_REGISTRY_URL") {
            url
        } else {
            let host = env::var("MCP_MESH_REGISTRY_HOST").map_err(|_| ConfigError::MissingRegistryLocation)?;
            let port = env::var("MCP_MESH_REGISTRY_PORT").map_err(|_| ConfigError::MissingRegistryLocation)?;
            let port: u16 = port.parse().map_err(|_| ConfigError::InvalidValue {
                field: "MCP_MESH_REGISTRY_PORT",
                value: port,
            })?;
            format!("http://{host}:{port}")
        };

        let agent_name = env::var("MCP_MESH_AGENT_NAME").ok();
        let bind_host = env::var("HOST").or_else(|_| env::var("POD_IP")).ok();
        let debug = env::var("MCP_MESH_DEBUG")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Ok(Self {
            registry_url,
            agent_name,
            bind_host,
            debug,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            "MCP_MESH_REGISTRY_URL",
            "MCP_MESH_REGISTRY_HOST",
            "MCP_MESH_REGISTRY_PORT",
            "MCP_MESH_AGENT_NAME",
            "HOST",
            "POD_IP",
            "MCP_MESH_DEBUG",
        ] {
            unsafe { env::remove_var(key) };
        }
    }

    #[test]
    fn missing_registry_location_errors() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        let err = AgentConfig::from_env().expect_err("should require a registry location");
        assert!(matches!(err, ConfigError::MissingRegistryLocation));
    }

    #[test]
    fn host_and_port_compose_a_url() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var("MCP_MESH_REGISTRY_HOST", "registry.mesh");
            env::set_var("MCP_MESH_REGISTRY_PORT", "8080");
        }
        let config = AgentConfig::from_env().unwrap();
        assert_eq!(config.registry_url, "http://registry.mesh:8080");
        clear_env();
    }

    #[test]
    fn explicit_url_takes_precedence() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var("MCP_MESH_REGISTRY_URL", "http://override:9999");
            env::set_var("MCP_MESH_REGISTRY_HOST", "ignored");
            env::set_var("MCP_MESH_REGISTRY_PORT", "1");
        }
        let config = AgentConfig::from_env().unwrap();
        assert_eq!(config.registry_url, "http://override:9999");
        clear_env();
    }
}
