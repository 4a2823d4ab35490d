#![cfg(target_os = "windows")]

//! Windows collaborators.
//!
//! This module contains the Windows implementations of every collaborator the
//! dispatcher needs:
//! - **HIDP** capability queries on Raw Input preparsed data ([`WinHidParser`])
//! - **Raw Input** payload parsing and handle lookups ([`RawInputDirectory`])
//! - **Registry** OEM name lookups ([`RegistryNameStore`])
//! - **Delivery** subscriptions for one window ([`WindowRegistrar`])
//!
//! A host that owns the Win32 message loop builds a dispatcher from
//! [`platform_collaborators`] and forwards messages with
//! [`handle_window_message`]:
//!
//! ```ignore
//! let mut dispatcher = EventDispatcher::from_config(
//!     platform_collaborators(WindowHandle(hwnd as isize)),
//!     &ListenerConfig::default(),
//! );
//! // in the window procedure:
//! handle_window_message(&mut dispatcher, hwnd, msg, lparam);
//! ```

pub mod hidp_parser;
pub mod raw_input;
pub mod registrar;
pub mod registry;

pub use hidp_parser::WinHidParser;
pub use raw_input::{handle_window_message, read_wm_input, RawInputDirectory};
pub use registrar::WindowRegistrar;
pub use registry::RegistryNameStore;

use crate::device::WindowHandle;
use crate::dispatcher::Collaborators;

/// Collaborators backed by the live OS, delivering to `window`.
pub fn platform_collaborators(window: WindowHandle) -> Collaborators {
    Collaborators::new(
        Box::new(RawInputDirectory),
        Box::new(RegistryNameStore),
        Box::new(WinHidParser::new()),
        Box::new(WindowRegistrar::new(window)),
    )
}
