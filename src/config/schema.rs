use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::agent::{AgentKind, AgentNode, AgentTree};

// ── Top-level config ──────────────────────────────────────────────

/// Top-level configuration, loaded from a TOML file.
///
/// Every section is optional; missing sections take their defaults.
/// `AGENT_STATE_LOG` and `AGENT_STATE_USER_AUTHOR` override the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration (`[logging]`).
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Session service settings (`[sessions]`).
    #[serde(default)]
    pub sessions: SessionsConfig,

    /// Root of the agent tree (`[agents]`), with nested `[[agents.sub_agents]]`.
    #[serde(default)]
    pub agents: Option<AgentSpec>,
}

/// Logging configuration (`[logging]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset. Default: `"info"`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Colored terminal output. Default: `true`.
    #[serde(default = "default_true")]
    pub ansi: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            ansi: true,
        }
    }
}

/// Session service configuration (`[sessions]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Author value that marks an event as written by the end user. Default: `"user"`.
    #[serde(default = "default_user_author")]
    pub user_author: String,
    /// Assign a fresh id when `create` is called without one. Default: `true`.
    #[serde(default = "default_true")]
    pub generate_ids: bool,
}

fn default_user_author() -> String {
    "user".to_string()
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            user_author: default_user_author(),
            generate_ids: true,
        }
    }
}

/// Agent variant as written in config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKindConfig {
    #[default]
    Llm,
    Custom,
}

/// One agent node as written in config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    #[serde(default)]
    pub kind: AgentKindConfig,
    /// Only meaningful for `llm` agents.
    #[serde(default)]
    pub disallow_transfer_to_parent: bool,
    #[serde(default)]
    pub sub_agents: Vec<AgentSpec>,
}

impl AgentSpec {
    fn to_node(&self) -> AgentNode {
        let kind = match self.kind {
            AgentKindConfig::Llm => AgentKind::Llm {
                disallow_transfer_to_parent: self.disallow_transfer_to_parent,
            },
            AgentKindConfig::Custom => AgentKind::Custom,
        };
        AgentNode::new(self.name.clone(), kind)
            .with_sub_agents(self.sub_agents.iter().map(AgentSpec::to_node))
    }
}

impl Config {
    /// Read and parse a TOML config file, then apply env overrides.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("AGENT_STATE_LOG") {
            if !level.trim().is_empty() {
                self.logging.level = level.trim().to_string();
            }
        }
        if let Ok(author) = std::env::var("AGENT_STATE_USER_AUTHOR") {
            if !author.trim().is_empty() {
                self.sessions.user_author = author.trim().to_string();
            }
        }
    }

    /// Build and validate the configured agent tree.
    pub fn agent_tree(&self) -> Result<AgentTree> {
        let spec = self
            .agents
            .as_ref()
            .context("no [agents] section configured")?;
        AgentTree::new(spec.to_node()).context("invalid agent tree in config")
    }
}
