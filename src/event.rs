//! Outbound events.
//!
//! RawPad reports what a device is doing *right now*, not edges:
//! - [`GamepadEvent`] carries the full list of active usages of one report,
//!   in decode order (duplicates kept). Consumers debounce on that order.
//! - [`MouseEvent`] carries the Raw Input button transition flags.
//! - [`KeyEvent`] carries the logical key for a key-down or key-up.
//!
//! ## Device names
//! `device_name` is always the Raw Input interface path. For gamepads,
//! `oem_name` is the friendly name (or `VID_xxxx&PID_xxxx` when none is
//! registered).

use crate::keys::Key;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// `RAWMOUSE.usButtonFlags` (`RI_MOUSE_*`).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct MouseButtonFlags: u16 {
        const LEFT_DOWN = 0x0001;
        const LEFT_UP = 0x0002;
        const RIGHT_DOWN = 0x0004;
        const RIGHT_UP = 0x0008;
        const MIDDLE_DOWN = 0x0010;
        const MIDDLE_UP = 0x0020;
        const BUTTON_4_DOWN = 0x0040;
        const BUTTON_4_UP = 0x0080;
        const BUTTON_5_DOWN = 0x0100;
        const BUTTON_5_UP = 0x0200;
        const WHEEL = 0x0400;
        const HWHEEL = 0x0800;
    }
}

/// Active usages of one HID report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamepadEvent {
    pub usages: Vec<u16>,
    pub device_name: String,
    pub oem_name: String,
    /// Device declares output values (force-feedback motors).
    pub force_feedback: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseEvent {
    pub device_name: String,
    pub buttons: MouseButtonFlags,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub device_name: String,
    pub key: Key,
}

/// Event delivered to listeners.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    Gamepad(GamepadEvent),
    Mouse(MouseEvent),
    KeyDown(KeyEvent),
    KeyUp(KeyEvent),
}

/// Event category, used for subscriptions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventClass {
    Gamepad,
    Mouse,
    KeyDown,
    KeyUp,
}

impl InputEvent {
    pub fn class(&self) -> EventClass {
        match self {
            InputEvent::Gamepad(_) => EventClass::Gamepad,
            InputEvent::Mouse(_) => EventClass::Mouse,
            InputEvent::KeyDown(_) => EventClass::KeyDown,
            InputEvent::KeyUp(_) => EventClass::KeyUp,
        }
    }

    /// Interface path of the originating device.
    pub fn device_name(&self) -> &str {
        match self {
            InputEvent::Gamepad(e) => &e.device_name,
            InputEvent::Mouse(e) => &e.device_name,
            InputEvent::KeyDown(e) | InputEvent::KeyUp(e) => &e.device_name,
        }
    }
}
