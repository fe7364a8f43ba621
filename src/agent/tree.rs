//! Immutable agent hierarchy with name lookup.

use std::collections::HashSet;
use thiserror::Error;

use super::node::AgentNode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentTreeError {
    #[error("agent name must not be empty")]
    EmptyName,
    #[error("agent name {0:?} appears more than once in the tree")]
    DuplicateName(String),
}

/// A validated tree of agents: one root, non-empty names unique within the tree.
#[derive(Debug, Clone)]
pub struct AgentTree {
    root: AgentNode,
}

impl AgentTree {
    pub fn new(root: AgentNode) -> Result<Self, AgentTreeError> {
        validate(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &AgentNode {
        &self.root
    }

    pub fn find(&self, name: &str) -> Option<&AgentNode> {
        find_agent(Some(&self.root), name)
    }

    /// Every node, depth-first, parents before children.
    pub fn iter(&self) -> impl Iterator<Item = &AgentNode> {
        Walk::new(&self.root)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }
}

/// Depth-first search for `target` starting at `root`.
///
/// Returns the first match in pre-order. An absent root or an unknown name
/// yields `None`.
pub fn find_agent<'a>(root: Option<&'a AgentNode>, target: &str) -> Option<&'a AgentNode> {
    root.and_then(|root| Walk::new(root).find(|node| node.name() == target))
}

fn validate(root: &AgentNode) -> Result<(), AgentTreeError> {
    let mut seen = HashSet::new();
    for node in Walk::new(root) {
        if node.name().is_empty() {
            return Err(AgentTreeError::EmptyName);
        }
        if !seen.insert(node.name()) {
            return Err(AgentTreeError::DuplicateName(node.name().to_string()));
        }
    }
    Ok(())
}

/// Pre-order traversal with an explicit stack.
struct Walk<'a> {
    stack: Vec<&'a AgentNode>,
}

impl<'a> Walk<'a> {
    fn new(root: &'a AgentNode) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a AgentNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.sub_agents().iter().rev());
        Some(node)
    }
}
