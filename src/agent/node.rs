//! Agent descriptors forming the nodes of an [`AgentTree`](super::AgentTree).

/// The variant of an agent, which decides whether it can hand control back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentKind {
    /// Model-backed agent, able to delegate.
    Llm { disallow_transfer_to_parent: bool },
    /// Agent with hand-written behavior. Never delegates.
    Custom,
}

impl AgentKind {
    /// Whether control may flow from an agent of this kind back up the tree.
    pub fn can_transfer_to_parent(&self) -> bool {
        match self {
            Self::Llm {
                disallow_transfer_to_parent,
            } => !disallow_transfer_to_parent,
            Self::Custom => false,
        }
    }
}

/// One agent in the tree. Owns its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentNode {
    name: String,
    kind: AgentKind,
    children: Vec<AgentNode>,
}

impl AgentNode {
    pub fn new(name: impl Into<String>, kind: AgentKind) -> Self {
        Self {
            name: name.into(),
            kind,
            children: Vec::new(),
        }
    }

    /// An LLM agent that allows transfer to its parent.
    pub fn llm(name: impl Into<String>) -> Self {
        Self::new(
            name,
            AgentKind::Llm {
                disallow_transfer_to_parent: false,
            },
        )
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self::new(name, AgentKind::Custom)
    }

    /// Set the disallow-transfer-to-parent flag. No effect on non-LLM agents.
    pub fn disallow_transfer_to_parent(mut self, disallow: bool) -> Self {
        if let AgentKind::Llm {
            disallow_transfer_to_parent,
        } = &mut self.kind
        {
            *disallow_transfer_to_parent = disallow;
        }
        self
    }

    pub fn with_sub_agents(mut self, children: impl IntoIterator<Item = AgentNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &AgentKind {
        &self.kind
    }

    pub fn sub_agents(&self) -> &[AgentNode] {
        &self.children
    }

    pub fn is_transferable(&self) -> bool {
        self.kind.can_transfer_to_parent()
    }
}
