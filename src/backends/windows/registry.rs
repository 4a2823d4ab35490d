#![cfg(target_os = "windows")]
//! Registry-backed [`NameStore`].
//!
//! Keys are opened read-only and closed before returning; [`StoreKey`] only
//! remembers the hive and path, and values are read with `RegGetValueW`.

use core::ffi::c_void;
use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;

use windows_sys::Win32::Foundation::{ERROR_FILE_NOT_FOUND, ERROR_PATH_NOT_FOUND, ERROR_SUCCESS};
use windows_sys::Win32::System::Registry::{
    RegCloseKey, RegGetValueW, RegOpenKeyExW, HKEY, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE,
    KEY_READ, REG_MULTI_SZ, REG_SZ, REG_VALUE_TYPE, RRF_RT_REG_MULTI_SZ, RRF_RT_REG_SZ,
};

use crate::error::LookupError;
use crate::identity::{Hive, NameStore, StoreKey, StoreValue};

#[derive(Clone, Copy, Debug, Default)]
pub struct RegistryNameStore;

fn wide(s: &str) -> Vec<u16> {
    OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
}

fn root(hive: Hive) -> HKEY {
    match hive {
        Hive::CurrentUser => HKEY_CURRENT_USER,
        Hive::LocalMachine => HKEY_LOCAL_MACHINE,
    }
}

fn is_missing(code: u32) -> bool {
    code == ERROR_FILE_NOT_FOUND || code == ERROR_PATH_NOT_FOUND
}

/// Split a `REG_MULTI_SZ` buffer into its strings.
fn split_multi(buf: &[u16]) -> Vec<String> {
    buf.split(|&c| c == 0)
        .filter(|s| !s.is_empty())
        .map(String::from_utf16_lossy)
        .collect()
}

impl NameStore for RegistryNameStore {
    fn open(&self, hive: Hive, path: &str) -> Result<Option<StoreKey>, LookupError> {
        let subkey = wide(path);
        let mut key: HKEY = core::ptr::null_mut();
        let code = unsafe { RegOpenKeyExW(root(hive), subkey.as_ptr(), 0, KEY_READ, &mut key) };
        if is_missing(code) {
            return Ok(None);
        }
        if code != ERROR_SUCCESS {
            return Err(LookupError::Unreachable(format!("{path} (error {code})")));
        }
        unsafe { RegCloseKey(key) };
        Ok(Some(StoreKey {
            hive,
            path: path.to_string(),
        }))
    }

    fn value(&self, key: &StoreKey, name: &str) -> Result<Option<StoreValue>, LookupError> {
        let subkey = wide(&key.path);
        let value = wide(name);
        let flags = RRF_RT_REG_SZ | RRF_RT_REG_MULTI_SZ;

        // Size in bytes
        let mut kind: REG_VALUE_TYPE = 0;
        let mut size: u32 = 0;
        let code = unsafe {
            RegGetValueW(
                root(key.hive),
                subkey.as_ptr(),
                value.as_ptr(),
                flags,
                &mut kind,
                core::ptr::null_mut(),
                &mut size,
            )
        };
        if is_missing(code) {
            return Ok(None);
        }
        if code != ERROR_SUCCESS {
            return Err(LookupError::Unreachable(format!(
                r"{}\{name} (error {code})",
                key.path
            )));
        }

        let mut buf = vec![0u16; (size as usize).div_ceil(2)];
        let code = unsafe {
            RegGetValueW(
                root(key.hive),
                subkey.as_ptr(),
                value.as_ptr(),
                flags,
                &mut kind,
                buf.as_mut_ptr() as *mut c_void,
                &mut size,
            )
        };
        if code != ERROR_SUCCESS {
            return Err(LookupError::Unreachable(format!(
                r"{}\{name} (error {code})",
                key.path
            )));
        }
        buf.truncate(size as usize / 2);

        match kind {
            REG_SZ => {
                while buf.last() == Some(&0) {
                    buf.pop();
                }
                Ok(Some(StoreValue::String(String::from_utf16_lossy(&buf))))
            }
            REG_MULTI_SZ => Ok(Some(StoreValue::MultiString(split_multi(&buf)))),
            other => Err(LookupError::InvalidData(format!(
                r"{}\{name} (type {other})",
                key.path
            ))),
        }
    }
}
