//! Resolved device identity.
//!
//! [`DeviceIdentity`] is the user-facing view of a device once its handle and
//! interface path have been resolved. It is cheap to clone and serializable for
//! UI display and logging.
//!
//! # Conventions
//! - `path` is the Raw Input interface path. Treat it as opaque; it changes
//!   across ports and driver reinstalls.
//! - `display_name` is the OEM name from the joystick OEM store when one is
//!   registered, otherwise the `VID_xxxx&PID_xxxx` pair parsed from the path.
//!
//! ## Persistence notes
//! Identities are cached for the lifetime of the owning
//! [`IdentityResolver`](crate::identity::IdentityResolver). Renaming a device in
//! the control panel while the process runs is not picked up until
//! [`IdentityResolver::reset`](crate::identity::IdentityResolver::reset).

use crate::device::DeviceKind;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Raw Input interface path.
    pub path: String,

    /// OEM name, or the `VID&PID` fallback.
    pub display_name: String,

    /// Raw Input device class.
    pub kind: DeviceKind,
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.path)
    }
}
