use std::{collections::HashSet, fmt::Display};

use secrecy::SecretString;

#[derive(
    Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(transparent)]
pub struct NodeId(String);

/// One relay node the user may route through
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub address: String,
    pub port: u16,
    pub auth: NodeAuth,
}

/// Parameters needed by the relay client to connect to a node
#[derive(Debug, Clone)]
pub struct NodeAuth {
    pub method: String,
    pub protocol: String,
    pub obfs: String,
    pub password: SecretString,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub uploaded_bytes: u64,
    pub downloaded_bytes: u64,
    pub quota_bytes: u64,
}

/// The node list and traffic usage for one service.
///
/// Node ids are unique within one snapshot, this is checked on construction
#[derive(Debug, Clone, Default)]
pub struct SsrInfo {
    nodes: Vec<Node>,
    pub usage: Usage,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("Node id '{0}' is reported more than once")]
pub struct DuplicateNodeError(pub NodeId);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl SsrInfo {
    pub fn new(nodes: Vec<Node>, usage: Usage) -> Result<Self, DuplicateNodeError> {
        let mut seen = HashSet::with_capacity(nodes.len());
        if let Some(duplicate) = nodes.iter().find(|node| !seen.insert(&node.id)) {
            return Err(DuplicateNodeError(duplicate.id.clone()));
        }
        Ok(Self { nodes, usage })
    }

    /// Nodes in the order the portal reported them
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn first(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().map(|node| &node.id)
    }
}

impl Usage {
    pub fn used(&self) -> u64 {
        self.uploaded_bytes.saturating_add(self.downloaded_bytes)
    }

    pub fn remaining(&self) -> u64 {
        self.quota_bytes.saturating_sub(self.used())
    }

    /// Returns `None` when there is no quota to compare against
    pub fn percent_used(&self) -> Option<f64> {
        if self.quota_bytes == 0 {
            None
        } else {
            Some(self.used() as f64 * 100.0 / self.quota_bytes as f64)
        }
    }
}

impl Node {
    pub fn new<I, N, A>(id: I, name: N, address: A, port: u16, auth: NodeAuth) -> Self
    where
        I: Into<NodeId>,
        N: Into<String>,
        A: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
            port,
            auth,
        }
    }
}

impl Default for NodeAuth {
    fn default() -> Self {
        Self {
            method: "aes-256-cfb".to_string(),
            protocol: "origin".to_string(),
            obfs: "plain".to_string(),
            password: SecretString::from(String::new()),
        }
    }
}
