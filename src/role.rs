use bytes::Bytes;

/// Credentials presented to a remote broker or cluster peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteIdentity {
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<Bytes>,
}

impl RemoteIdentity {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self { client_id: client_id.into(), username: None, password: None }
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<Bytes>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// A connection made by a bridge to a remote broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeContext {
    pub name: String,
    pub remote: RemoteIdentity,

    /// Ask the remote broker to treat this connection as a bridge.
    pub try_private: bool,

    /// Cleared once the remote broker has refused a private connection.
    pub try_private_accepted: bool,
}

impl BridgeContext {
    pub fn new(name: impl Into<String>, remote: RemoteIdentity) -> Self {
        Self { name: name.into(), remote, try_private: true, try_private_accepted: true }
    }

    /// Whether the private bridge bit goes on the protocol level byte.
    pub fn requests_private(&self) -> bool {
        self.try_private && self.try_private_accepted
    }
}

/// A connection made by a cluster node to one of its peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeContext {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub remote: RemoteIdentity,
}

impl NodeContext {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        port: u16,
        remote: RemoteIdentity,
    ) -> Self {
        Self { name: name.into(), address: address.into(), port, remote }
    }
}

/// What a connection is used for. Fixed when the connection is built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Plain,
    Bridge(BridgeContext),
    ClusterNode(NodeContext),
}

impl Role {
    pub fn remote(&self) -> Option<&RemoteIdentity> {
        match self {
            Self::Plain => None,
            Self::Bridge(bridge) => Some(&bridge.remote),
            Self::ClusterNode(node) => Some(&node.remote),
        }
    }
}

/// The client id, username and password written into a CONNECT packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Identity<'a> {
    pub client_id: &'a str,
    pub username: Option<&'a str>,
    pub password: Option<&'a [u8]>,
}

impl<'a> From<&'a RemoteIdentity> for Identity<'a> {
    fn from(remote: &'a RemoteIdentity) -> Self {
        Self {
            client_id: &remote.client_id,
            username: remote.username.as_deref(),
            password: remote.password.as_deref(),
        }
    }
}

/// Pick the identity to present: the role's remote identity if there is one,
/// otherwise the connection's own.
pub(crate) fn resolve_identity<'a>(own: Identity<'a>, role: &'a Role) -> Identity<'a> {
    role.remote().map(Identity::from).unwrap_or(own)
}
