//! Windows Raw Input plumbing.
//!
//! - [`read_wm_input`] copies a `WM_INPUT` payload out of the OS buffer into a
//!   [`RawMessage`] (HID report bytes, mouse button flags, or keyboard VKey and
//!   message).
//! - [`RawInputDirectory`] answers handle lookups with the interface path
//!   (`RIDI_DEVICENAME`) and device class (`RIDI_DEVICEINFO`).
//! - [`handle_window_message`] is the one call a host window procedure needs.
//!
//! ## Conventions
//! - The payload must be read while handling `WM_INPUT`; the `lparam` handle is
//!   invalid afterwards. Everything returned here is owned.
//! - HID payloads carry all `dwCount` reports back to back.

#![cfg(target_os = "windows")]

use core::ffi::c_void;
use core::mem::size_of;
use windows_sys::Win32::Foundation::{HANDLE, HWND, LPARAM};
use windows_sys::Win32::UI::Input::*;

use crate::device::{DeviceDirectory, DeviceHandle, DeviceInfo, DeviceKind, WindowHandle};
use crate::dispatcher::{Dispatch, DropReason, EventDispatcher};
use crate::event::MouseButtonFlags;
use crate::message::{HidInput, KeyboardInput, MouseInput, RawMessage, WM_INPUT};

/// Parse a `WM_INPUT` lparam into an owned message.
pub fn read_wm_input(lparam: LPARAM) -> Option<RawMessage> {
    let header_size = size_of::<RAWINPUTHEADER>() as u32;
    unsafe {
        // Query size
        let mut size: u32 = 0;
        let r0 = GetRawInputData(
            lparam as _,
            RID_INPUT,
            core::ptr::null_mut(),
            &mut size,
            header_size,
        );
        if r0 == u32::MAX || size == 0 {
            return None;
        }

        // Read buffer
        let mut buf = vec![0u8; size as usize];
        let r1 = GetRawInputData(
            lparam as _,
            RID_INPUT,
            buf.as_mut_ptr() as *mut c_void,
            &mut size,
            header_size,
        );
        if r1 == u32::MAX {
            return None;
        }

        read_raw_input_bytes(&buf)
    }
}

/// Parse a raw `RID_INPUT` payload (bytes returned by `GetRawInputData`).
pub fn read_raw_input_bytes(buf: &[u8]) -> Option<RawMessage> {
    let hdr_sz = size_of::<RAWINPUTHEADER>();
    if buf.len() < hdr_sz {
        return None;
    }

    unsafe {
        let hdr: RAWINPUTHEADER = core::ptr::read_unaligned(buf.as_ptr() as *const RAWINPUTHEADER);
        let device = DeviceHandle(hdr.hDevice as isize);
        let body = &buf[hdr_sz..];

        match hdr.dwType {
            RIM_TYPEHID => {
                // RAWHID: dwSizeHid, dwCount, bRawData[]
                if body.len() < 8 {
                    return None;
                }
                let size_hid = u32::from_ne_bytes([body[0], body[1], body[2], body[3]]) as usize;
                let count = u32::from_ne_bytes([body[4], body[5], body[6], body[7]]) as usize;
                let total = size_hid.saturating_mul(count);
                let data = &body[8..];
                let report = data[..total.min(data.len())].to_vec();
                Some(RawMessage::Hid(HidInput { device, report }))
            }

            RIM_TYPEMOUSE => {
                if body.len() < size_of::<RAWMOUSE>() {
                    return None;
                }
                let m: RAWMOUSE = core::ptr::read_unaligned(body.as_ptr() as *const RAWMOUSE);
                let flags = m.Anonymous.Anonymous.usButtonFlags;
                Some(RawMessage::Mouse(MouseInput {
                    device,
                    buttons: MouseButtonFlags::from_bits_truncate(flags),
                }))
            }

            RIM_TYPEKEYBOARD => {
                if body.len() < size_of::<RAWKEYBOARD>() {
                    return None;
                }
                let k: RAWKEYBOARD = core::ptr::read_unaligned(body.as_ptr() as *const RAWKEYBOARD);
                Some(RawMessage::Keyboard(KeyboardInput {
                    device,
                    virtual_key: k.VKey,
                    message: k.Message,
                }))
            }

            _ => None,
        }
    }
}

/// RawInput device interface path for a given `hDevice` (RIDI_DEVICENAME).
pub fn device_name(hdev: HANDLE) -> Option<String> {
    unsafe {
        // Query required size (in WCHARs, including NUL).
        let mut size: u32 = 0;
        let r0 = GetRawInputDeviceInfoW(hdev, RIDI_DEVICENAME, core::ptr::null_mut(), &mut size);
        if r0 == u32::MAX || size == 0 {
            return None;
        }

        let mut wide: Vec<u16> = vec![0u16; size as usize];
        let r1 = GetRawInputDeviceInfoW(
            hdev,
            RIDI_DEVICENAME,
            wide.as_mut_ptr() as *mut c_void,
            &mut size,
        );
        if r1 == u32::MAX {
            return None;
        }

        while wide.last() == Some(&0) {
            wide.pop();
        }
        Some(String::from_utf16_lossy(&wide))
    }
}

/// Raw Input device class for a given `hDevice` (RIDI_DEVICEINFO).
pub fn device_kind(hdev: HANDLE) -> Option<DeviceKind> {
    unsafe {
        let mut info: RID_DEVICE_INFO = core::mem::zeroed();
        info.cbSize = size_of::<RID_DEVICE_INFO>() as u32;
        let mut size = info.cbSize;
        let r = GetRawInputDeviceInfoW(
            hdev,
            RIDI_DEVICEINFO,
            &mut info as *mut RID_DEVICE_INFO as *mut c_void,
            &mut size,
        );
        if r == u32::MAX {
            return None;
        }
        DeviceKind::from_raw_type(info.dwType)
    }
}

/// [`DeviceDirectory`] backed by `GetRawInputDeviceInfoW`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawInputDirectory;

impl DeviceDirectory for RawInputDirectory {
    fn device_info(&self, handle: DeviceHandle) -> Option<DeviceInfo> {
        let hdev = handle.0 as HANDLE;
        let path = device_name(hdev)?;
        let kind = device_kind(hdev).unwrap_or_default();
        Some(DeviceInfo { handle, path, kind })
    }
}

/// Forward a window message to `dispatcher`.
///
/// Non-`WM_INPUT` messages return immediately without touching the payload.
pub fn handle_window_message(
    dispatcher: &mut EventDispatcher,
    hwnd: HWND,
    msg: u32,
    lparam: LPARAM,
) -> Dispatch {
    if msg != WM_INPUT {
        return Dispatch::Dropped(DropReason::NotRawInput);
    }
    match read_wm_input(lparam) {
        Some(message) => {
            dispatcher.deliver_raw_message(WindowHandle(hwnd as isize), msg, &message)
        }
        None => {
            tracing::trace!("unreadable WM_INPUT payload");
            Dispatch::Dropped(DropReason::UnreadablePayload)
        }
    }
}
