//! Manifest written alongside an exported session.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Running,
    Done,
}

/// Describes an exported session.
///
/// Message counts are only set for `Done`; server addresses only for
/// `Running`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub name: String,
    pub num_messages: Option<usize>,
    pub first_delta_index: Option<usize>,
    pub num_deltas: Option<usize>,
    pub server_status: ServerStatus,
    pub configured_server_address: Option<String>,
    #[serde(rename = "externalServerIP")]
    pub external_server_ip: Option<String>,
    #[serde(rename = "internalServerIP")]
    pub internal_server_ip: Option<String>,
    pub server_port: u16,
}

impl Manifest {
    pub fn done(
        name: impl Into<String>,
        num_messages: usize,
        first_delta_index: usize,
        num_deltas: usize,
        server_port: u16,
    ) -> Self {
        Self {
            name: name.into(),
            num_messages: Some(num_messages),
            first_delta_index: Some(first_delta_index),
            num_deltas: Some(num_deltas),
            server_status: ServerStatus::Done,
            configured_server_address: None,
            external_server_ip: None,
            internal_server_ip: None,
            server_port,
        }
    }

    pub fn running(
        name: impl Into<String>,
        configured_server_address: Option<String>,
        external_server_ip: Option<String>,
        internal_server_ip: Option<String>,
        server_port: u16,
    ) -> Self {
        Self {
            name: name.into(),
            num_messages: None,
            first_delta_index: None,
            num_deltas: None,
            server_status: ServerStatus::Running,
            configured_server_address,
            external_server_ip,
            internal_server_ip,
            server_port,
        }
    }
}
