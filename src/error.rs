//! Error taxonomy.
//!
//! None of these terminate a message path. Decode errors drop the message,
//! lookup errors degrade to the `VID&PID` fallback name, and
//! [`UnexpectedStatus`] is the one fault class reported to a
//! [`FaultSink`](crate::escalation::FaultSink).

use crate::hidp::HidpStatus;
use std::fmt;
use thiserror::Error;

/// Which HIDP query produced an unexpected status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaultContext {
    /// `HidP_GetCaps`.
    Caps,
    /// `HidP_GetButtonCaps` with the declared cap count.
    ButtonCaps { count: u16 },
    /// `HidP_GetUsages` for one page with the buffer capacity used.
    Usages { usage_page: u16, capacity: u32 },
}

impl fmt::Display for FaultContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultContext::Caps => f.write_str("GetCaps"),
            FaultContext::ButtonCaps { count } => write!(f, "GetButtonCaps(count={count})"),
            FaultContext::Usages {
                usage_page,
                capacity,
            } => write!(f, "GetUsages(page=0x{usage_page:04x}, capacity={capacity})"),
        }
    }
}

/// Undocumented status from a capability query. The value itself is the
/// deduplication signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
#[error("unexpected HIDP status {status} from {context}")]
pub struct UnexpectedStatus {
    pub status: HidpStatus,
    pub context: FaultContext,
}

/// Why a report could not be decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Preparsed data could not be obtained for the device.
    #[error("capability descriptor unavailable")]
    Unavailable,

    /// The OS marked the preparsed data invalid.
    #[error("capability descriptor is malformed")]
    MalformedDescriptor,

    #[error(transparent)]
    UnexpectedStatus(#[from] UnexpectedStatus),
}

/// Name store could not be read. Never leaves the identity resolver.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("name store unreachable: {0}")]
    Unreachable(String),

    #[error("name store returned unreadable data for {0}")]
    InvalidData(String),
}

/// The OS refused a delivery subscription.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("subscription for 0x{usage_page:04x}:0x{usage_id:04x} rejected (os error {code})")]
    Rejected {
        usage_page: u16,
        usage_id: u16,
        code: u32,
    },
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
}
