pub mod schema;

pub use schema::{AgentKindConfig, AgentSpec, Config, LoggingConfig, SessionsConfig};
