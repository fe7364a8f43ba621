//! Router that walks an agent tree using the session's event history.

use tracing::debug;

use super::traits::{RouteDecision, RouteState, Router};
use crate::agent::{AgentNode, AgentTree};
use crate::sessions::{GetRequest, Result, Session, SessionId, SessionService};

/// Routes each turn to the most recent agent that may keep control,
/// falling back to the tree root.
pub struct AgentTreeRouter {
    tree: AgentTree,
    user_author: String,
}

impl AgentTreeRouter {
    pub fn new(tree: AgentTree, user_author: &str) -> Self {
        Self {
            tree,
            user_author: user_author.to_string(),
        }
    }

    pub fn tree(&self) -> &AgentTree {
        &self.tree
    }

    /// Fetch the session from `sessions` and route it.
    ///
    /// A missing session is returned to the caller as `NotFound`.
    pub async fn route<'a>(
        &'a self,
        sessions: &dyn SessionService,
        id: &SessionId,
    ) -> Result<RouteDecision<'a>> {
        let session = sessions.get(&GetRequest::new(id.clone())).await?;
        Ok(self.find_agent_to_run(&session))
    }

    /// The most recent event author that names a node of the tree.
    fn last_agent(&self, session: &Session) -> Option<&AgentNode> {
        session
            .events
            .iter()
            .rev()
            .filter(|event| event.author != self.user_author)
            .find_map(|event| self.tree.find(&event.author))
    }
}

impl Router for AgentTreeRouter {
    fn find_agent_to_run<'a>(&'a self, session: &Session) -> RouteDecision<'a> {
        let root = self.tree.root();
        let last_agent = self.last_agent(session);

        let (agent, state) = match last_agent {
            None => (root, RouteState::NoPriorAgentEvents),
            Some(agent) if agent.is_transferable() => (agent, RouteState::LastAgentTransferable),
            Some(_) => (root, RouteState::LastAgentNotTransferable),
        };

        debug!(
            session = %session.id,
            agent = agent.name(),
            state = ?state,
            "routed turn"
        );

        RouteDecision {
            agent,
            state,
            last_agent,
        }
    }

    fn name(&self) -> &str {
        "agent_tree"
    }
}
