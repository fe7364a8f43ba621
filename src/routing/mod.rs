//! Turn routing: resolves which agent of the tree handles the next turn.

pub mod default;
pub mod traits;

pub use default::AgentTreeRouter;
pub use traits::{RouteDecision, RouteState, Router};

use crate::agent::AgentTree;

/// Create a router over `tree`, treating events by `user_author` as end-user turns.
pub fn create_router(tree: AgentTree, user_author: &str) -> Box<dyn Router> {
    Box::new(AgentTreeRouter::new(tree, user_author))
}
