use std::fmt;

use bytes::Bytes;
use log::debug;

use crate::{
    codec::fits_length_prefix,
    constants::{BRIDGE_PRIVATE_FLAG, NODE_MEET_FLAG},
    packets::{
        connect_packet::{ConnectError, ConnectPacket},
        EncodablePacket, HeapAllocator, PacketAllocator,
    },
    protocol::ProtocolVersion,
    queue::OutboundQueue,
    role::{resolve_identity, Identity, RemoteIdentity, Role},
    time::{time_to_hex, Clock, SystemClock},
    will::Will,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    New,
    ConnectPending,
    Connected,
    Disconnecting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionBuildError {
    EmptyClientId,
    EmptyWillTopic,
    FieldTooLong(&'static str),
}

impl std::error::Error for ConnectionBuildError {}

impl fmt::Display for ConnectionBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyClientId => write!(f, "Client identifier must not be empty"),
            Self::EmptyWillTopic => write!(f, "Will topic must not be empty"),
            Self::FieldTooLong(field) => {
                write!(f, "Field {field} is longer than 65535 bytes")
            }
        }
    }
}

/// One network connection's CONNECT-relevant state and its outbound queue.
///
/// `send_connect` takes `&mut self`: a connection cannot be encoded from two
/// places at once.
pub struct Connection<Q> {
    client_id: String,
    username: Option<String>,
    password: Option<Bytes>,
    protocol: ProtocolVersion,
    will: Option<Will>,
    role: Role,
    state: ConnectionState,
    keep_alive: u16,
    queue: Q,
    allocator: Box<dyn PacketAllocator>,
    clock: Box<dyn Clock>,
}

impl<Q> fmt::Debug for Connection<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("protocol", &self.protocol)
            .field("will", &self.will)
            .field("role", &self.role)
            .field("state", &self.state)
            .field("keep_alive", &self.keep_alive)
            .finish_non_exhaustive()
    }
}

impl Connection<()> {
    pub fn builder() -> ConnectionBuilder<NeedsClientId> {
        ConnectionBuilder(NeedsClientId(()))
    }
}

impl<Q: OutboundQueue> Connection<Q> {
    /// Encode a CONNECT packet for this connection and hand it to the outbound queue.
    ///
    /// On success the keep alive is recorded on the connection. On failure
    /// nothing is enqueued and the connection is left unchanged.
    ///
    /// # Errors
    /// - `ConnectError::InvalidProtocolVersion` if the connection is not MQTT 3.1 or 3.1.1.
    /// - `ConnectError::OutOfMemory` if the packet or its buffer cannot be allocated.
    /// - `ConnectError::Queue` if the outbound queue refuses the packet.
    pub fn send_connect(
        &mut self,
        keep_alive: u16,
        clean_session: bool,
    ) -> Result<(), ConnectError> {
        let packet = ConnectPacket {
            protocol: self.protocol,
            version_flags: self.version_flags(),
            clean_session,
            keep_alive,
            identity: self.identity(),
            will: self.will.as_ref(),
            timestamp: None,
        };

        let now = matches!(self.role, Role::ClusterNode(_)).then(|| self.clock.now_secs());
        debug!("{}", connect_diagnostic(&self.role, packet.identity.client_id, now));

        let packet = match now {
            Some(now) => ConnectPacket { timestamp: Some(time_to_hex(now)), ..packet },
            None => packet,
        };

        let outgoing = packet.encode(self.allocator.as_ref())?;

        self.queue.enqueue(outgoing).map_err(ConnectError::Queue)?;
        self.keep_alive = keep_alive;

        Ok(())
    }
}

/// The per-role debug line logged before a CONNECT is encoded.
fn connect_diagnostic(role: &Role, client_id: &str, now: Option<i64>) -> String {
    match role {
        Role::ClusterNode(node) => format!(
            "[CLUSTER] Sending CONNECT to node: {} addr({}:{}), localtime: {}",
            node.name,
            node.address,
            node.port,
            now.unwrap_or_default()
        ),
        Role::Bridge(_) => format!("Bridge {client_id} sending CONNECT"),
        Role::Plain => format!("Client {client_id} sending CONNECT"),
    }
}

impl<Q> Connection<Q> {
    /// The client id, username and password this connection presents.
    pub(crate) fn identity(&self) -> Identity<'_> {
        let own = Identity {
            client_id: &self.client_id,
            username: self.username.as_deref(),
            password: self.password.as_deref(),
        };

        resolve_identity(own, &self.role)
    }

    /// Extension bits for the protocol level byte.
    fn version_flags(&self) -> u8 {
        match &self.role {
            Role::Bridge(bridge) if bridge.requests_private() => BRIDGE_PRIVATE_FLAG,
            Role::ClusterNode(_)
                if matches!(self.state, ConnectionState::New | ConnectionState::ConnectPending) =>
            {
                NODE_MEET_FLAG
            }
            _ => 0,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn protocol(&self) -> ProtocolVersion {
        self.protocol
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    /// Stop asking the remote broker for a private bridge connection.
    ///
    /// Called once the remote broker has refused one. No effect for other roles.
    pub fn refuse_private_bridge(&mut self) {
        if let Role::Bridge(bridge) = &mut self.role {
            bridge.try_private_accepted = false;
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
    }

    /// Keep alive recorded by the last successful `send_connect`.
    pub fn keep_alive(&self) -> u16 {
        self.keep_alive
    }

    pub fn will(&self) -> Option<&Will> {
        self.will.as_ref()
    }

    pub fn set_will(&mut self, will: Option<Will>) -> Result<(), ConnectionBuildError> {
        if let Some(will) = &will {
            validate_will(will)?;
        }

        self.will = will;
        Ok(())
    }
}

pub struct ConnectionBuilder<State>(State);

pub struct NeedsClientId(());

pub struct ReadyToBuild {
    client_id: String,
    username: Option<String>,
    password: Option<Bytes>,
    protocol: ProtocolVersion,
    will: Option<Will>,
    role: Role,
    allocator: Box<dyn PacketAllocator>,
    clock: Box<dyn Clock>,
}

impl ConnectionBuilder<NeedsClientId> {
    pub fn client_id(self, client_id: impl Into<String>) -> ConnectionBuilder<ReadyToBuild> {
        ConnectionBuilder(ReadyToBuild {
            client_id: client_id.into(),
            username: None,
            password: None,
            protocol: ProtocolVersion::default(),
            will: None,
            role: Role::Plain,
            allocator: Box::new(HeapAllocator::default()),
            clock: Box::new(SystemClock),
        })
    }
}

impl ConnectionBuilder<ReadyToBuild> {
    pub fn username(self, username: impl Into<String>) -> Self {
        ConnectionBuilder(ReadyToBuild { username: Some(username.into()), ..self.0 })
    }

    /// Only sent when a username is also set.
    pub fn password(self, password: impl Into<Bytes>) -> Self {
        ConnectionBuilder(ReadyToBuild { password: Some(password.into()), ..self.0 })
    }

    pub fn protocol(self, protocol: ProtocolVersion) -> Self {
        ConnectionBuilder(ReadyToBuild { protocol, ..self.0 })
    }

    pub fn will(self, will: Will) -> Self {
        ConnectionBuilder(ReadyToBuild { will: Some(will), ..self.0 })
    }

    pub fn role(self, role: Role) -> Self {
        ConnectionBuilder(ReadyToBuild { role, ..self.0 })
    }

    pub fn allocator(self, allocator: impl PacketAllocator + 'static) -> Self {
        ConnectionBuilder(ReadyToBuild { allocator: Box::new(allocator), ..self.0 })
    }

    pub fn clock(self, clock: impl Clock + 'static) -> Self {
        ConnectionBuilder(ReadyToBuild { clock: Box::new(clock), ..self.0 })
    }

    /// Validate the configured fields and attach the outbound queue.
    ///
    /// # Errors
    /// - `ConnectionBuildError::EmptyClientId` if the client id or the role's remote client id
    ///   is empty.
    /// - `ConnectionBuildError::EmptyWillTopic` if a will has an empty topic.
    /// - `ConnectionBuildError::FieldTooLong` if any field does not fit a 2-byte length prefix.
    pub fn build<Q: OutboundQueue>(self, queue: Q) -> Result<Connection<Q>, ConnectionBuildError> {
        let ReadyToBuild { client_id, username, password, protocol, will, role, allocator, clock } =
            self.0;

        validate_identity(&client_id, username.as_deref(), password.as_deref())?;

        if let Some(remote) = role.remote() {
            validate_remote(remote)?;
        }

        if let Some(will) = &will {
            validate_will(will)?;
        }

        Ok(Connection {
            client_id,
            username,
            password,
            protocol,
            will,
            role,
            state: ConnectionState::New,
            keep_alive: 0,
            queue,
            allocator,
            clock,
        })
    }
}

fn validate_identity(
    client_id: &str,
    username: Option<&str>,
    password: Option<&[u8]>,
) -> Result<(), ConnectionBuildError> {
    if client_id.is_empty() {
        return Err(ConnectionBuildError::EmptyClientId);
    }

    if !fits_length_prefix(client_id.as_bytes()) {
        return Err(ConnectionBuildError::FieldTooLong("client_id"));
    }

    if username.is_some_and(|username| !fits_length_prefix(username.as_bytes())) {
        return Err(ConnectionBuildError::FieldTooLong("username"));
    }

    if password.is_some_and(|password| !fits_length_prefix(password)) {
        return Err(ConnectionBuildError::FieldTooLong("password"));
    }

    Ok(())
}

fn validate_remote(remote: &RemoteIdentity) -> Result<(), ConnectionBuildError> {
    validate_identity(&remote.client_id, remote.username.as_deref(), remote.password.as_deref())
}

fn validate_will(will: &Will) -> Result<(), ConnectionBuildError> {
    if will.topic.is_empty() {
        return Err(ConnectionBuildError::EmptyWillTopic);
    }

    if !fits_length_prefix(will.topic.as_bytes()) {
        return Err(ConnectionBuildError::FieldTooLong("will_topic"));
    }

    if !fits_length_prefix(&will.payload) {
        return Err(ConnectionBuildError::FieldTooLong("will_payload"));
    }

    Ok(())
}
