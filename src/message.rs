//! Inbound Raw Input messages.
//!
//! The host owns the message loop. For every `WM_INPUT` it copies the payload
//! out of the OS buffer (see `backends::windows::raw_input`) into a
//! [`RawMessage`] and passes it to
//! [`EventDispatcher::deliver_raw_message`](crate::dispatcher::EventDispatcher::deliver_raw_message).

use crate::device::DeviceHandle;
use crate::event::MouseButtonFlags;

/// `WM_INPUT`.
pub const WM_INPUT: u32 = 0x00FF;
/// `WM_KEYDOWN`.
pub const WM_KEYDOWN: u32 = 0x0100;
/// `WM_KEYUP`.
pub const WM_KEYUP: u32 = 0x0101;
/// `WM_SYSKEYDOWN`.
pub const WM_SYSKEYDOWN: u32 = 0x0104;
/// `WM_SYSKEYUP`.
pub const WM_SYSKEYUP: u32 = 0x0105;

/// HID report payload (`RAWHID.bRawData`, all `dwCount` reports).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HidInput {
    pub device: DeviceHandle,
    pub report: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MouseInput {
    pub device: DeviceHandle,
    pub buttons: MouseButtonFlags,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyboardInput {
    pub device: DeviceHandle,
    /// `RAWKEYBOARD.VKey`.
    pub virtual_key: u16,
    /// `RAWKEYBOARD.Message` (`WM_KEYDOWN`, `WM_SYSKEYUP`, ...).
    pub message: u32,
}

/// Key transition carried by a keyboard packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyState {
    KeyDown,
    KeyUp,
    SystemKeyDown,
    SystemKeyUp,
    Other(u32),
}

impl KeyState {
    pub fn from_message(message: u32) -> Self {
        match message {
            WM_KEYDOWN => KeyState::KeyDown,
            WM_KEYUP => KeyState::KeyUp,
            WM_SYSKEYDOWN => KeyState::SystemKeyDown,
            WM_SYSKEYUP => KeyState::SystemKeyUp,
            other => KeyState::Other(other),
        }
    }
}

impl KeyboardInput {
    pub fn state(&self) -> KeyState {
        KeyState::from_message(self.message)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawMessage {
    Hid(HidInput),
    Mouse(MouseInput),
    Keyboard(KeyboardInput),
}

impl RawMessage {
    pub fn device(&self) -> DeviceHandle {
        match self {
            RawMessage::Hid(m) => m.device,
            RawMessage::Mouse(m) => m.device,
            RawMessage::Keyboard(m) => m.device,
        }
    }
}
