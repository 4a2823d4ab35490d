#![cfg(target_os = "windows")]
//! Raw Input delivery subscriptions.

use core::mem::size_of;
use windows_sys::Win32::Foundation::{GetLastError, HWND};
use windows_sys::Win32::UI::Input::{RegisterRawInputDevices, RAWINPUTDEVICE, RIDEV_INPUTSINK};

use crate::catalog::DeliveryRegistrar;
use crate::device::WindowHandle;
use crate::error::RegistrationError;

/// Subscribes one window with `RIDEV_INPUTSINK`, so reports arrive while the
/// window is in the background too.
#[derive(Clone, Copy, Debug)]
pub struct WindowRegistrar {
    window: WindowHandle,
}

impl WindowRegistrar {
    pub fn new(window: WindowHandle) -> Self {
        Self { window }
    }
}

impl DeliveryRegistrar for WindowRegistrar {
    fn subscribe(&mut self, usage_page: u16, usage_id: u16) -> Result<(), RegistrationError> {
        let device = RAWINPUTDEVICE {
            usUsagePage: usage_page,
            usUsage: usage_id,
            dwFlags: RIDEV_INPUTSINK,
            hwndTarget: self.window.0 as HWND,
        };
        let ok = unsafe {
            RegisterRawInputDevices(&device, 1, size_of::<RAWINPUTDEVICE>() as u32)
        };
        if ok == 0 {
            let code = unsafe { GetLastError() };
            return Err(RegistrationError::Rejected {
                usage_page,
                usage_id,
                code,
            });
        }
        Ok(())
    }
}
