//! Usage subscriptions and per-device poll lists.
//!
//! The catalog owns three things:
//! - the set of `(usage_page, usage_id)` pairs the window is subscribed to
//!   (grows only; duplicates and the undefined page are rejected),
//! - an allow-list and a deny-list of lower-cased interface-path substrings,
//! - the observe-all switch, which bypasses the allow-list only.
//!
//! A path matching both lists is denied.

use crate::error::RegistrationError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// The HID "Undefined" usage page.
pub const USAGE_PAGE_UNDEFINED: u16 = 0x00;

/// One `(usage_page, usage_id)` subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UsageRegistration {
    pub usage_page: u16,
    pub usage_id: u16,
}

impl UsageRegistration {
    pub const fn new(usage_page: u16, usage_id: u16) -> Self {
        Self {
            usage_page,
            usage_id,
        }
    }
}

/// Subscribes the owning window to Raw Input delivery for a usage pair.
pub trait DeliveryRegistrar {
    fn subscribe(&mut self, usage_page: u16, usage_id: u16) -> Result<(), RegistrationError>;
}

pub struct DeviceCatalog {
    registrar: Box<dyn DeliveryRegistrar>,
    registered: BTreeSet<UsageRegistration>,
    allow: HashSet<String>,
    deny: HashSet<String>,
    observe_all: bool,
}

impl DeviceCatalog {
    pub fn new(registrar: Box<dyn DeliveryRegistrar>) -> Self {
        Self {
            registrar,
            registered: BTreeSet::new(),
            allow: HashSet::new(),
            deny: HashSet::new(),
            observe_all: false,
        }
    }

    /// Subscribe to a usage pair. `false` for the undefined page, for a pair
    /// already present, or when the OS refuses the subscription.
    pub fn register_usage(&mut self, usage_page: u16, usage_id: u16) -> bool {
        if usage_page == USAGE_PAGE_UNDEFINED {
            return false;
        }

        let entry = UsageRegistration::new(usage_page, usage_id);
        if self.registered.contains(&entry) {
            tracing::trace!(usage_page, usage_id, "usage already registered");
            return false;
        }

        if let Err(e) = self.registrar.subscribe(usage_page, usage_id) {
            tracing::warn!(error = %e, "raw input subscription failed");
            return false;
        }

        self.registered.insert(entry);
        tracing::debug!(usage_page, usage_id, "usage registered");
        true
    }

    /// Add an interface path to the deny-list (`ignore`) or the allow-list.
    pub fn register_interface_poll(&mut self, path: &str, ignore: bool) {
        let lowered = path.to_lowercase();
        if ignore {
            tracing::debug!(path = %lowered, "device ignored from polling");
            self.deny.insert(lowered);
        } else {
            self.allow.insert(lowered);
        }
    }

    /// Combined registration: optional poll-list entry, then the usage pair.
    ///
    /// An ignored path is only added to the deny-list; the call returns `false`
    /// and leaves the usage set alone.
    pub fn register_device(
        &mut self,
        usage_page: u16,
        usage_id: u16,
        path: Option<&str>,
        ignore: bool,
    ) -> bool {
        if let Some(path) = path {
            self.register_interface_poll(path, ignore);
            if ignore {
                return false;
            }
        }
        self.register_usage(usage_page, usage_id)
    }

    /// Toggle a path on the allow-list. Idempotent.
    pub fn set_polling_enabled(&mut self, path: &str, enabled: bool) {
        let lowered = path.to_lowercase();
        if enabled {
            self.allow.insert(lowered);
        } else {
            self.allow.remove(&lowered);
        }
    }

    pub fn enable_observe_all(&mut self, enabled: bool) {
        self.observe_all = enabled;
    }

    pub fn observe_all(&self) -> bool {
        self.observe_all
    }

    pub fn is_denied(&self, path: &str) -> bool {
        let lowered = path.to_lowercase();
        self.deny.iter().any(|d| lowered.contains(d.as_str()))
    }

    pub fn is_polled(&self, path: &str) -> bool {
        let lowered = path.to_lowercase();
        self.allow.iter().any(|a| lowered.contains(a.as_str()))
    }

    /// Deny-list first, then allow-list unless observing everything.
    pub fn admits(&self, path: &str) -> bool {
        !self.is_denied(path) && (self.observe_all || self.is_polled(path))
    }

    pub fn is_registered(&self, usage_page: u16, usage_id: u16) -> bool {
        self.registered
            .contains(&UsageRegistration::new(usage_page, usage_id))
    }

    pub fn registered(&self) -> impl Iterator<Item = &UsageRegistration> {
        self.registered.iter()
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Recording {
        calls: Rc<RefCell<Vec<(u16, u16)>>>,
        refuse: bool,
    }

    impl DeliveryRegistrar for Recording {
        fn subscribe(&mut self, usage_page: u16, usage_id: u16) -> Result<(), RegistrationError> {
            if self.refuse {
                return Err(RegistrationError::Rejected {
                    usage_page,
                    usage_id,
                    code: 87,
                });
            }
            self.calls.borrow_mut().push((usage_page, usage_id));
            Ok(())
        }
    }

    fn catalog() -> (DeviceCatalog, Recording) {
        let rec = Recording::default();
        (DeviceCatalog::new(Box::new(rec.clone())), rec)
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let (mut c, rec) = catalog();
        assert!(c.register_usage(0x01, 0x04));
        assert!(!c.register_usage(0x01, 0x04));
        assert_eq!(c.len(), 1);
        assert_eq!(*rec.calls.borrow(), vec![(0x01, 0x04)]);
    }

    #[test]
    fn undefined_page_is_rejected() {
        let (mut c, rec) = catalog();
        assert!(!c.register_usage(USAGE_PAGE_UNDEFINED, 0x04));
        assert!(c.is_empty());
        assert!(rec.calls.borrow().is_empty());
    }

    #[test]
    fn refused_subscription_is_not_recorded() {
        let rec = Recording {
            refuse: true,
            ..Default::default()
        };
        let mut c = DeviceCatalog::new(Box::new(rec));
        assert!(!c.register_usage(0x01, 0x05));
        assert!(!c.is_registered(0x01, 0x05));
    }

    #[test]
    fn deny_wins_over_allow() {
        let (mut c, _) = catalog();
        c.register_interface_poll("VID_28DE&PID_2300", false);
        c.register_interface_poll("vid_28de&pid_2300", true);

        let path = r"\\?\HID#VID_28DE&PID_2300#7&1&0&0000#{guid}";
        assert!(c.is_polled(path));
        assert!(c.is_denied(path));
        assert!(!c.admits(path));
    }

    #[test]
    fn observe_all_bypasses_allow_but_not_deny() {
        let (mut c, _) = catalog();
        c.register_interface_poll("pid_0001", true);
        c.enable_observe_all(true);

        assert!(c.admits(r"\\?\HID#VID_1111&PID_2222#x"));
        assert!(!c.admits(r"\\?\HID#VID_1111&PID_0001#x"));

        c.enable_observe_all(false);
        assert!(!c.admits(r"\\?\HID#VID_1111&PID_2222#x"));
    }

    #[test]
    fn ignored_device_registration_skips_usage_set() {
        let (mut c, rec) = catalog();
        assert!(!c.register_device(0x01, 0x04, Some("VID_044F"), true));
        assert!(c.is_empty());
        assert!(rec.calls.borrow().is_empty());
        assert!(c.is_denied(r"\\?\HID#VID_044F&PID_B10A#x"));

        assert!(c.register_device(0x01, 0x05, Some("VID_046D"), false));
        assert!(c.is_polled(r"\\?\HID#VID_046D&PID_C24F#x"));
    }

    #[test]
    fn polling_toggle_is_idempotent() {
        let (mut c, _) = catalog();
        c.set_polling_enabled("VID_AAAA", true);
        c.set_polling_enabled("VID_AAAA", true);
        assert!(c.is_polled("x#vid_aaaa#y"));
        c.set_polling_enabled("VID_AAAA", false);
        c.set_polling_enabled("VID_AAAA", false);
        assert!(!c.is_polled("x#vid_aaaa#y"));
    }

    proptest! {
        #[test]
        fn registering_twice_never_grows_the_set(page in 1u16..=u16::MAX,usage in any::<u16>()) {
            let (mut c, _) = catalog();
            prop_assert!(c.register_usage(page, usage));
            prop_assert!(!c.register_usage(page, usage));
            prop_assert_eq!(c.len(), 1);
        }
    }
}
