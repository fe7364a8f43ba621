//! Routing traits and types for resolving which agent handles the next turn.

use serde::{Deserialize, Serialize};

use crate::agent::AgentNode;
use crate::sessions::Session;

/// Which rule picked the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteState {
    /// No event in the history was authored by an agent of the tree.
    NoPriorAgentEvents,
    /// The last agent to speak may keep the conversation.
    LastAgentTransferable,
    /// The last agent to speak cannot hand control back, so the root takes over.
    LastAgentNotTransferable,
}

/// The agent selected for the next turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDecision<'a> {
    pub agent: &'a AgentNode,
    pub state: RouteState,
    /// Author of the event that decided the route, if any.
    pub last_agent: Option<&'a AgentNode>,
}

/// Picks the agent to run for a session. Implementations are pure reads.
pub trait Router: Send + Sync {
    /// Decide from the session history which agent runs next.
    fn find_agent_to_run<'a>(&'a self, session: &Session) -> RouteDecision<'a>;

    /// The name of this router implementation.
    fn name(&self) -> &str;
}
