//! Device handles and the host-provided device directory.
//!
//! Raw Input identifies devices by an opaque `HANDLE`. RawPad carries it as a
//! [`DeviceHandle`] and asks a [`DeviceDirectory`] for the interface path and
//! device class the first time a handle is seen.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque OS identifier for a connected input device.
///
/// `DeviceHandle(0)` means the message carried no device (e.g. injected input).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceHandle(pub isize);

impl DeviceHandle {
    /// The "no device" handle.
    pub const NULL: DeviceHandle = DeviceHandle(0);

    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Window that receives `WM_INPUT` for registered usages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

/// Raw Input device class (`RIM_TYPEMOUSE`, `RIM_TYPEKEYBOARD`, `RIM_TYPEHID`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    Mouse,
    Keyboard,
    #[default]
    Hid,
}

impl DeviceKind {
    /// Map a Raw Input `dwType` value.
    pub fn from_raw_type(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(DeviceKind::Mouse),
            1 => Some(DeviceKind::Keyboard),
            2 => Some(DeviceKind::Hid),
            _ => None,
        }
    }
}

/// Device record returned by the directory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub handle: DeviceHandle,
    /// Interface path, e.g. `\\?\HID#VID_044F&PID_B10A#8&27a93c19&0&0000#{4d1e55b2-...}`.
    pub path: String,
    pub kind: DeviceKind,
}

impl DeviceInfo {
    /// Sentinel returned for handles the directory does not know.
    pub fn unknown() -> Self {
        Self {
            handle: DeviceHandle::NULL,
            path: String::new(),
            kind: DeviceKind::Hid,
        }
    }

    #[inline]
    pub fn is_unknown(&self) -> bool {
        self.path.is_empty()
    }
}

/// Host collaborator that knows the path and class of a device handle.
///
/// On Windows this is `GetRawInputDeviceInfoW`; tests substitute a map.
pub trait DeviceDirectory {
    fn device_info(&self, handle: DeviceHandle) -> Option<DeviceInfo>;
}
