//! Device identity resolution.
//!
//! Two lookups, both cached for the lifetime of the owning [`IdentityResolver`]:
//!
//! - **Handle → [`DeviceInfo`]** through the host [`DeviceDirectory`]. Only
//!   non-empty answers are cached; unknown handles get [`DeviceInfo::unknown`].
//! - **Interface path → display name** through a layered name-store lookup:
//!   1. parse `VID_xxxx&PID_xxxx` from the path,
//!   2. joystick OEM store (per user) keyed by that pair,
//!   3. for `HIDCLASS` paths, the enumeration store's `HardwareID` gives the
//!      real VID/PID, retried against the OEM store,
//!   4. otherwise the `VID&PID` string itself.
//!
//! Name resolution never fails. Store errors degrade to the `VID&PID` fallback.
//!
//! The cache is an owned [`IdentityCache`] value rather than process-global
//! state; build the resolver with [`IdentityResolver::with_cache`] to seed it and
//! call [`IdentityResolver::reset`] to start over.

use crate::device::{DeviceDirectory, DeviceHandle, DeviceInfo};
use crate::error::LookupError;
use std::collections::HashMap;

/// Interface path prefix for HID devices.
const HID_PATH_PREFIX: &str = r"\\?\HID#";
/// Marker for generic HID-class collections that hide the real VID/PID.
const HID_CLASS_MARKER: &str = "HIDCLASS";
/// Prefix of a `HardwareID` entry.
const HARDWARE_ID_PREFIX: &str = r"HID\";

const OEM_KEY_ROOT: &str =
    r"System\CurrentControlSet\Control\MediaProperties\PrivateProperties\Joystick\OEM";
const OEM_NAME_VALUE: &str = "OEMName";
const HID_ENUM_ROOT: &str = r"System\CurrentControlSet\Enum\HID";
const HARDWARE_ID_VALUE: &str = "HardwareID";

/// Root of a name-store path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hive {
    CurrentUser,
    LocalMachine,
}

/// Opened name-store key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StoreKey {
    pub hive: Hive,
    pub path: String,
}

/// A value read from the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreValue {
    String(String),
    MultiString(Vec<String>),
}

impl StoreValue {
    /// The value as one string; multi-strings yield their first entry.
    pub fn first(&self) -> Option<&str> {
        match self {
            StoreValue::String(s) => Some(s),
            StoreValue::MultiString(v) => v.first().map(String::as_str),
        }
    }
}

/// Hierarchical key/value store holding OEM names (the registry on Windows).
pub trait NameStore {
    /// `Ok(None)` when the key does not exist.
    fn open(&self, hive: Hive, path: &str) -> Result<Option<StoreKey>, LookupError>;

    /// `Ok(None)` when the value does not exist.
    fn value(&self, key: &StoreKey, name: &str) -> Result<Option<StoreValue>, LookupError>;
}

/// Vendor/product token pair parsed from a path, e.g. `VID_044F` / `PID_B10A`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VidPid {
    pub vid: String,
    pub pid: String,
}

impl VidPid {
    /// First `VID*` and first `PID*` token of `&`-separated `segment`.
    pub fn from_tokens(segment: &str) -> Self {
        let tokens: Vec<&str> = segment.split('&').collect();
        let pick = |prefix: &str| {
            tokens
                .iter()
                .find(|t| t.starts_with(prefix))
                .map(|t| t.to_string())
                .unwrap_or_default()
        };
        Self {
            vid: pick("VID"),
            pid: pick("PID"),
        }
    }

    /// Parse from an interface path's leading segment.
    pub fn from_interface_path(path: &str) -> Self {
        let stripped = path.replace(HID_PATH_PREFIX, "");
        let first = stripped.split('#').next().unwrap_or_default();
        Self::from_tokens(first)
    }

    /// Parse from a `HardwareID` entry like `HID\VID_1234&PID_BEAD&REV_0219&Col02`.
    pub fn from_hardware_id(id: &str) -> Self {
        Self::from_tokens(&id.replace(HARDWARE_ID_PREFIX, ""))
    }

    /// `VID_xxxx&PID_xxxx`: the OEM store key and the fallback display name.
    pub fn key(&self) -> String {
        format!("{}&{}", self.vid, self.pid)
    }
}

/// Resolved identities kept for the process lifetime (or until cleared).
#[derive(Clone, Debug, Default)]
pub struct IdentityCache {
    devices: HashMap<DeviceHandle, DeviceInfo>,
    oem_names: HashMap<String, String>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device(&self, handle: DeviceHandle) -> Option<&DeviceInfo> {
        self.devices.get(&handle)
    }

    pub fn oem_name(&self, path: &str) -> Option<&str> {
        self.oem_names.get(path).map(String::as_str)
    }

    pub fn insert_device(&mut self, info: DeviceInfo) {
        self.devices.insert(info.handle, info);
    }

    pub fn insert_oem_name(&mut self, path: impl Into<String>, name: impl Into<String>) {
        self.oem_names.insert(path.into(), name.into());
    }

    pub fn len(&self) -> usize {
        self.devices.len() + self.oem_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty() && self.oem_names.is_empty()
    }

    pub fn clear(&mut self) {
        self.devices.clear();
        self.oem_names.clear();
    }
}

pub struct IdentityResolver {
    directory: Box<dyn DeviceDirectory>,
    names: Box<dyn NameStore>,
    cache: IdentityCache,
}

impl IdentityResolver {
    pub fn new(directory: Box<dyn DeviceDirectory>, names: Box<dyn NameStore>) -> Self {
        Self::with_cache(directory, names, IdentityCache::new())
    }

    pub fn with_cache(
        directory: Box<dyn DeviceDirectory>,
        names: Box<dyn NameStore>,
        cache: IdentityCache,
    ) -> Self {
        Self {
            directory,
            names,
            cache,
        }
    }

    pub fn cache(&self) -> &IdentityCache {
        &self.cache
    }

    /// Forget every cached identity.
    pub fn reset(&mut self) {
        self.cache.clear();
    }

    /// Look up a device handle. Returns [`DeviceInfo::unknown`] on a miss.
    pub fn resolve_device_handle(&mut self, handle: DeviceHandle) -> DeviceInfo {
        if let Some(info) = self.cache.device(handle) {
            return info.clone();
        }

        match self.directory.device_info(handle) {
            Some(info) if !info.path.is_empty() => {
                tracing::debug!(%handle, path = %info.path, kind = ?info.kind, "device resolved");
                let info = DeviceInfo { handle, ..info };
                self.cache.insert_device(info.clone());
                info
            }
            _ => {
                tracing::trace!(%handle, "device handle not found");
                DeviceInfo::unknown()
            }
        }
    }

    /// Display name for an interface path. Never fails; cached by exact path.
    pub fn resolve_name(&mut self, path: &str) -> String {
        if let Some(name) = self.cache.oem_name(path) {
            return name.to_string();
        }

        let fallback = VidPid::from_interface_path(path).key();
        let name = match self.lookup(path, &fallback) {
            Ok(Some(name)) => name,
            Ok(None) => {
                tracing::trace!(%path, %fallback, "no OEM name; using VID&PID");
                fallback
            }
            Err(e) => {
                tracing::debug!(%path, %fallback, error = %e, "OEM name lookup failed");
                fallback
            }
        };

        self.cache.insert_oem_name(path, name.clone());
        name
    }

    fn lookup(&self, path: &str, vid_pid: &str) -> Result<Option<String>, LookupError> {
        if let Some(name) = self.oem_name_for(vid_pid)? {
            tracing::debug!(%path, %name, "OEM name from joystick store");
            return Ok(Some(name));
        }

        if let Some(name) = self.oem_name_via_hid_class(path)? {
            tracing::debug!(%path, %name, "OEM name via HIDCLASS hardware id");
            return Ok(Some(name));
        }

        Ok(None)
    }

    fn oem_name_for(&self, vid_pid: &str) -> Result<Option<String>, LookupError> {
        let key_path = format!(r"{OEM_KEY_ROOT}\{vid_pid}");
        let Some(key) = self.names.open(Hive::CurrentUser, &key_path)? else {
            return Ok(None);
        };
        let value = self.names.value(&key, OEM_NAME_VALUE)?;
        Ok(value.and_then(|v| v.first().map(str::to_string)))
    }

    fn oem_name_via_hid_class(&self, path: &str) -> Result<Option<String>, LookupError> {
        if !path.contains(HID_CLASS_MARKER) {
            return Ok(None);
        }

        // \\?\HID#HIDCLASS&Col02#1&4784345&1&0001#{4d1e55b2-...}
        let stripped = path.replace(HID_PATH_PREFIX, "");
        let mut segments = stripped.split('#');
        let (Some(class), Some(instance)) = (segments.next(), segments.next()) else {
            return Ok(None);
        };

        let key_path = format!(r"{HID_ENUM_ROOT}\{class}\{instance}");
        let Some(key) = self.names.open(Hive::LocalMachine, &key_path)? else {
            return Ok(None);
        };

        let hardware_id = match self.names.value(&key, HARDWARE_ID_VALUE)? {
            Some(StoreValue::MultiString(ids)) => match ids.into_iter().next() {
                Some(id) => id,
                None => return Ok(None),
            },
            Some(StoreValue::String(_)) => {
                return Err(LookupError::InvalidData(format!(
                    r"{key_path}\{HARDWARE_ID_VALUE}"
                )))
            }
            None => return Ok(None),
        };

        let real = VidPid::from_hardware_id(&hardware_id).key();
        self.oem_name_for(&real)
    }
}
