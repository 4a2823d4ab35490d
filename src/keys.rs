//! Virtual-key code to logical key mapping.
//!
//! Generic modifier codes (`VK_SHIFT`, `VK_CONTROL`, `VK_MENU`) map to the left
//! variant. Codes without a named key come through as [`Key::Other`].

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Cancel,
    Back,
    Tab,
    Clear,
    Return,
    Pause,
    CapsLock,
    Escape,
    Space,
    PageUp,
    PageDown,
    End,
    Home,
    Left,
    Up,
    Right,
    Down,
    Select,
    Print,
    Execute,
    PrintScreen,
    Insert,
    Delete,
    Help,
    /// Top-row digit `0..=9`.
    Digit(u8),
    /// Letter `A..=Z`, upper case.
    Letter(char),
    LeftWin,
    RightWin,
    Apps,
    Sleep,
    /// Numeric keypad digit `0..=9`.
    NumPad(u8),
    Multiply,
    Add,
    Separator,
    Subtract,
    Decimal,
    Divide,
    /// Function key `F1..=F24`.
    F(u8),
    NumLock,
    Scroll,
    LeftShift,
    RightShift,
    LeftCtrl,
    RightCtrl,
    LeftAlt,
    RightAlt,
    BrowserBack,
    BrowserForward,
    BrowserRefresh,
    BrowserStop,
    BrowserSearch,
    BrowserFavorites,
    BrowserHome,
    VolumeMute,
    VolumeDown,
    VolumeUp,
    MediaNextTrack,
    MediaPreviousTrack,
    MediaStop,
    MediaPlayPause,
    LaunchMail,
    SelectMedia,
    LaunchApplication1,
    LaunchApplication2,
    OemSemicolon,
    OemPlus,
    OemComma,
    OemMinus,
    OemPeriod,
    OemQuestion,
    OemTilde,
    OemOpenBrackets,
    OemPipe,
    OemCloseBrackets,
    OemQuotes,
    Oem8,
    OemBackslash,
    /// Unmapped virtual-key code.
    Other(u16),
}

pub fn key_from_virtual_key(vk: u16) -> Key {
    match vk {
        0x03 => Key::Cancel,
        0x08 => Key::Back,
        0x09 => Key::Tab,
        0x0C => Key::Clear,
        0x0D => Key::Return,
        0x10 => Key::LeftShift,
        0x11 => Key::LeftCtrl,
        0x12 => Key::LeftAlt,
        0x13 => Key::Pause,
        0x14 => Key::CapsLock,
        0x1B => Key::Escape,
        0x20 => Key::Space,
        0x21 => Key::PageUp,
        0x22 => Key::PageDown,
        0x23 => Key::End,
        0x24 => Key::Home,
        0x25 => Key::Left,
        0x26 => Key::Up,
        0x27 => Key::Right,
        0x28 => Key::Down,
        0x29 => Key::Select,
        0x2A => Key::Print,
        0x2B => Key::Execute,
        0x2C => Key::PrintScreen,
        0x2D => Key::Insert,
        0x2E => Key::Delete,
        0x2F => Key::Help,
        0x30..=0x39 => Key::Digit((vk - 0x30) as u8),
        0x41..=0x5A => Key::Letter(char::from(vk as u8)),
        0x5B => Key::LeftWin,
        0x5C => Key::RightWin,
        0x5D => Key::Apps,
        0x5F => Key::Sleep,
        0x60..=0x69 => Key::NumPad((vk - 0x60) as u8),
        0x6A => Key::Multiply,
        0x6B => Key::Add,
        0x6C => Key::Separator,
        0x6D => Key::Subtract,
        0x6E => Key::Decimal,
        0x6F => Key::Divide,
        0x70..=0x87 => Key::F((vk - 0x6F) as u8),
        0x90 => Key::NumLock,
        0x91 => Key::Scroll,
        0xA0 => Key::LeftShift,
        0xA1 => Key::RightShift,
        0xA2 => Key::LeftCtrl,
        0xA3 => Key::RightCtrl,
        0xA4 => Key::LeftAlt,
        0xA5 => Key::RightAlt,
        0xA6 => Key::BrowserBack,
        0xA7 => Key::BrowserForward,
        0xA8 => Key::BrowserRefresh,
        0xA9 => Key::BrowserStop,
        0xAA => Key::BrowserSearch,
        0xAB => Key::BrowserFavorites,
        0xAC => Key::BrowserHome,
        0xAD => Key::VolumeMute,
        0xAE => Key::VolumeDown,
        0xAF => Key::VolumeUp,
        0xB0 => Key::MediaNextTrack,
        0xB1 => Key::MediaPreviousTrack,
        0xB2 => Key::MediaStop,
        0xB3 => Key::MediaPlayPause,
        0xB4 => Key::LaunchMail,
        0xB5 => Key::SelectMedia,
        0xB6 => Key::LaunchApplication1,
        0xB7 => Key::LaunchApplication2,
        0xBA => Key::OemSemicolon,
        0xBB => Key::OemPlus,
        0xBC => Key::OemComma,
        0xBD => Key::OemMinus,
        0xBE => Key::OemPeriod,
        0xBF => Key::OemQuestion,
        0xC0 => Key::OemTilde,
        0xDB => Key::OemOpenBrackets,
        0xDC => Key::OemPipe,
        0xDD => Key::OemCloseBrackets,
        0xDE => Key::OemQuotes,
        0xDF => Key::Oem8,
        0xE2 => Key::OemBackslash,
        other => Key::Other(other),
    }
}
