//! Agent hierarchy: the static tree of cooperating agents a runtime dispatches to.

pub mod node;
pub mod tree;

pub use node::{AgentKind, AgentNode};
pub use tree::{find_agent, AgentTree, AgentTreeError};
