use std::fmt;

use crate::{
    connection::{Connection, ConnectionBuilder, ReadyToBuild},
    protocol::ProtocolVersion,
};

const DEFAULT_BROKER_ADDR: &str = "127.0.0.1:1883";
const DEFAULT_CLIENT_ID: &str = "mqtt-connect";
const DEFAULT_KEEP_ALIVE: u16 = 60;

/// Settings for the command line client, read from `MQTT_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub broker_addr: String,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive: u16,
    pub protocol: ProtocolVersion,
    pub clean_session: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidKeepAlive(String),
    InvalidProtocol(String),
    InvalidCleanSession(String),
}

impl std::error::Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKeepAlive(value) => {
                write!(f, "MQTT_KEEP_ALIVE must be between 0 and 65535. Got: {value}")
            }
            Self::InvalidProtocol(value) => {
                write!(f, "MQTT_PROTOCOL must be 3.1 or 3.1.1. Got: {value}")
            }
            Self::InvalidCleanSession(value) => {
                write!(f, "MQTT_CLEAN_SESSION must be true or false. Got: {value}")
            }
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let keep_alive = match lookup("MQTT_KEEP_ALIVE") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidKeepAlive(value))?,
            None => DEFAULT_KEEP_ALIVE,
        };

        let protocol = match lookup("MQTT_PROTOCOL").as_deref() {
            None | Some("3.1.1") => ProtocolVersion::V311,
            Some("3.1") => ProtocolVersion::V31,
            Some(other) => return Err(ConfigError::InvalidProtocol(other.to_string())),
        };

        let clean_session = match lookup("MQTT_CLEAN_SESSION") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidCleanSession(value))?,
            None => true,
        };

        Ok(Self {
            broker_addr: lookup("MQTT_BROKER_ADDR")
                .unwrap_or_else(|| DEFAULT_BROKER_ADDR.to_string()),
            client_id: lookup("MQTT_CLIENT_ID").unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string()),
            username: lookup("MQTT_USERNAME"),
            password: lookup("MQTT_PASSWORD"),
            keep_alive,
            protocol,
            clean_session,
        })
    }

    /// A connection builder carrying this config's identity and dialect.
    pub fn connection(&self) -> ConnectionBuilder<ReadyToBuild> {
        let mut builder =
            Connection::builder().client_id(self.client_id.clone()).protocol(self.protocol);

        if let Some(username) = &self.username {
            builder = builder.username(username.clone());
        }

        if let Some(password) = &self.password {
            builder = builder.password(password.clone());
        }

        builder
    }
}
