//! Platform backends for `rawpad`.
//!
//! Implementations of the collaborator traits ([`HidParser`](crate::hidp::HidParser),
//! [`DeviceDirectory`](crate::device::DeviceDirectory),
//! [`NameStore`](crate::identity::NameStore),
//! [`DeliveryRegistrar`](crate::catalog::DeliveryRegistrar)) for real input stacks.
//!
//! # Feature flags
//! - **`hid`** enables the Windows Raw Input / HIDP backend (default).
//!
//! On other platforms the core still builds; hosts supply their own collaborators.

#[cfg(all(feature = "hid", target_os = "windows"))]
#[cfg_attr(docsrs, doc(cfg(all(feature = "hid", target_os = "windows"))))]
pub mod windows;
