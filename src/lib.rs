//! # rawpad
//!
//! Descriptor-driven decoding of Windows Raw Input HID reports.
//!
//! A host window receives `WM_INPUT`; RawPad turns each message into at most
//! one typed [`InputEvent`]:
//! - HID reports are decoded with the device's own capability descriptor
//!   (HIDP preparsed data), not fixed offsets, into the list of pressed usages.
//! - Device handles are resolved to interface paths and OEM display names,
//!   cached per dispatcher.
//! - Known vendor quirks (spurious sentinel and empty reports) are filtered
//!   per device.
//!
//! ## Layout
//! - [`dispatcher`] is the entry point ([`EventDispatcher::deliver_raw_message`]).
//! - [`capabilities`] and [`usages`] decode reports through a [`HidParser`].
//! - [`identity`] resolves names through a [`DeviceDirectory`] and a [`NameStore`].
//! - [`catalog`] tracks registered usages and per-device poll lists.
//! - [`backends`] provides the Windows implementations of every collaborator.

pub mod backends;
pub mod capabilities;
pub mod catalog;
pub mod config;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod escalation;
pub mod event;
pub mod eventbus;
pub mod filtered_listener;
pub mod hidp;
pub mod identity;
pub mod keys;
pub mod logger;
pub mod message;
pub mod metadata;
pub mod quirks;
pub mod usages;

pub use catalog::{DeliveryRegistrar, DeviceCatalog, UsageRegistration};
pub use config::ListenerConfig;
pub use device::*;
pub use dispatcher::{Collaborators, Dispatch, DropReason, EventDispatcher};
pub use error::*;
pub use escalation::{FaultSink, TracingFaultSink};
pub use event::*;
pub use eventbus::{EventFilter, InputEventBus, InputListener};
pub use hidp::HidParser;
pub use identity::{IdentityCache, IdentityResolver, NameStore};
pub use keys::Key;
pub use message::*;
pub use metadata::DeviceIdentity;
