use std::fmt;

use crate::error::{WifiError, WifiResult};

/// Longest SSID 802.11 allows, in bytes
pub const MAX_SSID_BYTES: usize = 32;

/// WPA2-PSK passphrase length bounds (printable ASCII)
pub const MIN_PASSPHRASE_LEN: usize = 8;
pub const MAX_PASSPHRASE_LEN: usize = 63;

/// SSID plus WPA2 passphrase, validated on construction.
#[derive(Clone, PartialEq, Eq)]
pub struct NetworkCredential {
    ssid: String,
    passphrase: String,
}

impl NetworkCredential {
    pub fn new(ssid: impl Into<String>, passphrase: impl Into<String>) -> WifiResult<Self> {
        let ssid = ssid.into();
        let passphrase = passphrase.into();

        if ssid.trim().is_empty() {
            return Err(WifiError::InvalidCredential("SSID is blank".into()));
        }
        if ssid.len() > MAX_SSID_BYTES {
            return Err(WifiError::InvalidCredential(format!(
                "SSID is {} bytes, at most {MAX_SSID_BYTES} allowed",
                ssid.len()
            )));
        }
        if passphrase.trim().is_empty() {
            return Err(WifiError::InvalidCredential(format!(
                "passphrase for \"{ssid}\" is blank"
            )));
        }
        if !passphrase.chars().all(|c| c.is_ascii_graphic() || c == ' ') {
            return Err(WifiError::InvalidCredential(format!(
                "passphrase for \"{ssid}\" must be printable ASCII"
            )));
        }
        if !(MIN_PASSPHRASE_LEN..=MAX_PASSPHRASE_LEN).contains(&passphrase.len()) {
            return Err(WifiError::InvalidCredential(format!(
                "passphrase for \"{ssid}\" must be {MIN_PASSPHRASE_LEN}-{MAX_PASSPHRASE_LEN} characters"
            )));
        }

        Ok(Self { ssid, passphrase })
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }
}

impl fmt::Debug for NetworkCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkCredential")
            .field("ssid", &self.ssid)
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// What the UI asks the connection manager to join
#[derive(Debug, Clone)]
pub enum JoinRequest {
    /// Typed credentials, validated by the manager
    Credentials { ssid: String, passphrase: String },
    /// Key into the preset table
    Preset(String),
}

impl JoinRequest {
    /// Short description for the event log; never includes the passphrase.
    pub fn describe(&self) -> String {
        match self {
            Self::Credentials { ssid, .. } => format!("typed, ssid: \"{ssid}\""),
            Self::Preset(key) => format!("preset: \"{key}\""),
        }
    }
}

/// Opaque identifier of one association request, allocated by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestHandle(u64);

impl RequestHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Registration state of a single SSID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    Unregistered,
    Registered,
}

/// Kinds of asynchronous outcome reported by the association backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssociationEventKind {
    /// Network is usable
    Available,
    /// Association failed or was declared unsatisfiable
    Unavailable(Option<String>),
    /// Network was usable and has disconnected
    Lost,
}

/// Event delivered by the backend, keyed by request handle and SSID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationEvent {
    pub handle: RequestHandle,
    pub ssid: String,
    pub kind: AssociationEventKind,
}

/// Lifecycle events surfaced to the event sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Requested { ssid: String },
    Available { ssid: String },
    Unavailable { ssid: String, reason: Option<String> },
    Lost { ssid: String },
}

impl ConnectionEvent {
    pub fn ssid(&self) -> &str {
        match self {
            Self::Requested { ssid }
            | Self::Available { ssid }
            | Self::Unavailable { ssid, .. }
            | Self::Lost { ssid } => ssid,
        }
    }
}

impl fmt::Display for ConnectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested { ssid } => write!(f, "[{ssid}] requested"),
            Self::Available { ssid } => write!(f, "[{ssid}] available"),
            Self::Unavailable { ssid, reason: Some(reason) } => {
                write!(f, "[{ssid}] unavailable: {reason}")
            }
            Self::Unavailable { ssid, reason: None } => write!(f, "[{ssid}] unavailable"),
            Self::Lost { ssid } => write!(f, "[{ssid}] lost"),
        }
    }
}

/// NMActiveConnectionState
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveConnectionState {
    Unknown,
    Activating,
    Activated,
    Deactivating,
    Deactivated,
}

impl ActiveConnectionState {
    pub fn from_nm(val: u32) -> Self {
        match val {
            1 => Self::Activating,
            2 => Self::Activated,
            3 => Self::Deactivating,
            4 => Self::Deactivated,
            _ => Self::Unknown,
        }
    }
}

/// Human-readable NMActiveConnectionStateReason
pub fn state_reason(reason: u32) -> &'static str {
    match reason {
        1 => "no reason given",
        2 => "disconnected by user",
        3 => "device disconnected",
        4 => "VPN service stopped",
        5 => "IP configuration invalid",
        6 => "connection attempt timed out",
        7 => "service start timed out",
        8 => "service failed to start",
        9 => "secrets were required but not provided",
        10 => "authentication failed",
        11 => "connection was removed",
        12 => "dependency failed",
        13 => "device could not be realized",
        14 => "device was removed",
        _ => "unknown reason",
    }
}
