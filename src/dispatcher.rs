//! Per-message pipeline.
//!
//! [`EventDispatcher::deliver_raw_message`] is the single inbound entry point.
//! Each message yields at most one [`InputEvent`], which is fanned out to the
//! subscribed listeners and also returned to the caller. Every early exit is
//! reported as a [`DropReason`] so hosts and tests can see why nothing came out.
//!
//! Gamepad reports go through, in order: listener check, handle resolution,
//! deny/allow lists, top-level caps, registered-usage check, usage decode,
//! OEM name, vendor quirks. Mouse and keyboard packets skip the decode stages.

use crate::capabilities::{CapabilityResolver, DecodeOutcome};
use crate::catalog::{DeliveryRegistrar, DeviceCatalog};
use crate::config::ListenerConfig;
use crate::device::{DeviceDirectory, DeviceHandle, DeviceInfo, WindowHandle};
use crate::error::DecodeError;
use crate::escalation::{FaultSink, TracingFaultSink};
use crate::event::{EventClass, GamepadEvent, InputEvent, KeyEvent, MouseEvent};
use crate::eventbus::{EventFilter, InputEventBus, InputListener};
use crate::hidp::HidParser;
use crate::identity::{IdentityCache, IdentityResolver, NameStore};
use crate::keys::key_from_virtual_key;
use crate::message::{HidInput, KeyState, KeyboardInput, MouseInput, RawMessage, WM_INPUT};
use crate::metadata::DeviceIdentity;
use crate::quirks::{QuirkFilter, QuirkVerdict};

/// Host-provided services the dispatcher runs on.
pub struct Collaborators {
    pub devices: Box<dyn DeviceDirectory>,
    pub names: Box<dyn NameStore>,
    pub parser: Box<dyn HidParser>,
    pub registrar: Box<dyn DeliveryRegistrar>,
    pub faults: Box<dyn FaultSink>,
}

impl Collaborators {
    /// Bundle with the default [`TracingFaultSink`].
    pub fn new(
        devices: Box<dyn DeviceDirectory>,
        names: Box<dyn NameStore>,
        parser: Box<dyn HidParser>,
        registrar: Box<dyn DeliveryRegistrar>,
    ) -> Self {
        Self {
            devices,
            names,
            parser,
            registrar,
            faults: Box::new(TracingFaultSink),
        }
    }

    pub fn with_fault_sink(mut self, faults: Box<dyn FaultSink>) -> Self {
        self.faults = faults;
        self
    }
}

/// Why a message produced no event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// Message code was not `WM_INPUT`.
    NotRawInput,
    /// The OS payload could not be read.
    UnreadablePayload,
    /// No enabled listener for this event class.
    NoSubscriber,
    /// Message carried a null device handle.
    NoDeviceHandle,
    /// The directory does not know the handle.
    UnknownDevice,
    /// Path is on the deny-list.
    Denied,
    /// Path is not on the allow-list and observe-all is off.
    NotPolled,
    /// Report could not be decoded.
    DecodeFailed(DecodeError),
    /// Device's top-level collection is not a registered usage.
    UnregisteredUsage { usage_page: u16, usage_id: u16 },
    /// Vendor quirk filter swallowed the report.
    Quirk(QuirkVerdict),
    /// Mouse packet without button transitions (pure motion).
    NoMouseButtons,
    /// Keyboard packet that is neither a plain key-down nor key-up.
    IgnoredKeyState,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatch {
    Dropped(DropReason),
    Delivered(InputEvent),
}

impl Dispatch {
    pub fn event(&self) -> Option<&InputEvent> {
        match self {
            Dispatch::Delivered(e) => Some(e),
            Dispatch::Dropped(_) => None,
        }
    }

    pub fn drop_reason(&self) -> Option<DropReason> {
        match self {
            Dispatch::Dropped(r) => Some(*r),
            Dispatch::Delivered(_) => None,
        }
    }
}

pub struct EventDispatcher {
    bus: InputEventBus,
    identity: IdentityResolver,
    catalog: DeviceCatalog,
    decoder: CapabilityResolver,
    quirks: QuirkFilter,
}

impl EventDispatcher {
    pub fn new(collaborators: Collaborators) -> Self {
        Self::with_cache(collaborators, IdentityCache::new())
    }

    /// Start from a pre-seeded identity cache.
    pub fn with_cache(collaborators: Collaborators, cache: IdentityCache) -> Self {
        let Collaborators {
            devices,
            names,
            parser,
            registrar,
            faults,
        } = collaborators;

        Self {
            bus: InputEventBus::new(),
            identity: IdentityResolver::with_cache(devices, names, cache),
            catalog: DeviceCatalog::new(registrar),
            decoder: CapabilityResolver::new(parser, faults),
            quirks: QuirkFilter::default(),
        }
    }

    /// Build and apply `config`: registrations, poll lists, observe-all and
    /// quirk devices.
    pub fn from_config(collaborators: Collaborators, config: &ListenerConfig) -> Self {
        let mut dispatcher = Self::new(collaborators);
        dispatcher.apply_config(config);
        dispatcher
    }

    pub fn apply_config(&mut self, config: &ListenerConfig) {
        for r in &config.registrations {
            self.register_usage(r.usage_page, r.usage_id);
        }
        for path in &config.poll {
            self.catalog.register_interface_poll(path, false);
        }
        for path in &config.ignore {
            self.catalog.register_interface_poll(path, true);
        }
        self.catalog.enable_observe_all(config.observe_all);
        self.quirks = config.quirks.build();
        tracing::debug!(
            registered = self.catalog.len(),
            observe_all = config.observe_all,
            "listener config applied"
        );
    }

    // ---- registration surface ----

    pub fn register_usage(&mut self, usage_page: u16, usage_id: u16) -> bool {
        self.catalog.register_usage(usage_page, usage_id)
    }

    pub fn register_device(
        &mut self,
        usage_page: u16,
        usage_id: u16,
        path: Option<&str>,
        ignore: bool,
    ) -> bool {
        self.catalog.register_device(usage_page, usage_id, path, ignore)
    }

    pub fn register_interface_poll(&mut self, path: &str, ignore: bool) {
        self.catalog.register_interface_poll(path, ignore);
    }

    pub fn set_polling(&mut self, path: &str, enabled: bool) {
        self.catalog.set_polling_enabled(path, enabled);
    }

    pub fn enable_observe_all(&mut self, enabled: bool) {
        self.catalog.enable_observe_all(enabled);
    }

    pub fn set_quirk_filter(&mut self, quirks: QuirkFilter) {
        self.quirks = quirks;
    }

    pub fn subscribe(&mut self, filter: EventFilter, listener: impl InputListener + 'static) -> u64 {
        self.bus.add_listener(listener, filter, None)
    }

    /// Subscribe to events from one interface path only.
    pub fn subscribe_device(
        &mut self,
        filter: EventFilter,
        path: impl Into<String>,
        listener: impl InputListener + 'static,
    ) -> u64 {
        self.bus.add_listener(listener, filter, Some(path.into()))
    }

    pub fn unsubscribe(&mut self, id: u64) -> bool {
        self.bus.remove_listener(id)
    }

    /// Remove every listener. Registrations and caches are kept.
    pub fn clear(&mut self) {
        self.bus.clear();
    }

    /// Forget resolved handles and names, and the quirk states keyed by them.
    pub fn reset_identity_cache(&mut self) {
        self.identity.reset();
        self.quirks.reset();
    }

    pub fn catalog(&self) -> &DeviceCatalog {
        &self.catalog
    }

    pub fn identity_cache(&self) -> &IdentityCache {
        self.identity.cache()
    }

    pub fn bus_mut(&mut self) -> &mut InputEventBus {
        &mut self.bus
    }

    /// Number of distinct faults escalated so far.
    pub fn escalated_faults(&self) -> usize {
        self.decoder.escalation().reported()
    }

    /// Resolved identity of a device handle, if the directory knows it.
    pub fn identify(&mut self, device: DeviceHandle) -> Option<DeviceIdentity> {
        let info = self.identity.resolve_device_handle(device);
        if info.is_unknown() {
            return None;
        }
        let display_name = self.identity.resolve_name(&info.path);
        Some(DeviceIdentity {
            path: info.path,
            display_name,
            kind: info.kind,
        })
    }

    // ---- inbound ----

    pub fn deliver_raw_message(
        &mut self,
        window: WindowHandle,
        message_code: u32,
        message: &RawMessage,
    ) -> Dispatch {
        if message_code != WM_INPUT {
            return Dispatch::Dropped(DropReason::NotRawInput);
        }

        let outcome = match message {
            RawMessage::Hid(input) => self.dispatch_hid(input),
            RawMessage::Mouse(input) => self.dispatch_mouse(input),
            RawMessage::Keyboard(input) => self.dispatch_keyboard(input),
        };

        match outcome {
            Ok(event) => {
                self.bus.emit(&event);
                Dispatch::Delivered(event)
            }
            Err(reason) => {
                tracing::trace!(
                    window = window.0,
                    device = %message.device(),
                    ?reason,
                    "raw input dropped"
                );
                Dispatch::Dropped(reason)
            }
        }
    }

    fn require_subscriber(&self, class: EventClass) -> Result<(), DropReason> {
        if self.bus.has_subscriber(class) {
            Ok(())
        } else {
            Err(DropReason::NoSubscriber)
        }
    }

    fn resolve(&mut self, device: DeviceHandle) -> Result<DeviceInfo, DropReason> {
        if device.is_null() {
            return Err(DropReason::NoDeviceHandle);
        }
        let info = self.identity.resolve_device_handle(device);
        if info.is_unknown() {
            return Err(DropReason::UnknownDevice);
        }
        Ok(info)
    }

    fn dispatch_hid(&mut self, input: &HidInput) -> Result<InputEvent, DropReason> {
        self.require_subscriber(EventClass::Gamepad)?;
        let info = self.resolve(input.device)?;

        if self.catalog.is_denied(&info.path) {
            return Err(DropReason::Denied);
        }
        if !self.catalog.admits(&info.path) {
            return Err(DropReason::NotPolled);
        }

        let catalog = &self.catalog;
        let outcome = self
            .decoder
            .decode(input.device, &input.report, |caps| {
                catalog.is_registered(caps.usage_page, caps.usage)
            })
            .map_err(DropReason::DecodeFailed)?;
        let decoded = match outcome {
            DecodeOutcome::Decoded(decoded) => decoded,
            DecodeOutcome::Rejected(caps) => {
                return Err(DropReason::UnregisteredUsage {
                    usage_page: caps.usage_page,
                    usage_id: caps.usage,
                })
            }
        };

        let identity = DeviceIdentity {
            display_name: self.identity.resolve_name(&info.path),
            path: info.path,
            kind: info.kind,
        };

        match self.quirks.filter(&identity.display_name, &decoded.report.usages) {
            QuirkVerdict::Pass => {}
            verdict => return Err(DropReason::Quirk(verdict)),
        }

        Ok(InputEvent::Gamepad(GamepadEvent {
            usages: decoded.report.usages,
            device_name: identity.path,
            oem_name: identity.display_name,
            force_feedback: decoded.report.force_feedback,
        }))
    }

    fn dispatch_mouse(&mut self, input: &MouseInput) -> Result<InputEvent, DropReason> {
        self.require_subscriber(EventClass::Mouse)?;
        let info = self.resolve(input.device)?;

        if input.buttons.is_empty() {
            return Err(DropReason::NoMouseButtons);
        }

        Ok(InputEvent::Mouse(MouseEvent {
            device_name: info.path,
            buttons: input.buttons,
        }))
    }

    fn dispatch_keyboard(&mut self, input: &KeyboardInput) -> Result<InputEvent, DropReason> {
        let class = match input.state() {
            KeyState::KeyDown => EventClass::KeyDown,
            KeyState::KeyUp => EventClass::KeyUp,
            _ => return Err(DropReason::IgnoredKeyState),
        };
        self.require_subscriber(class)?;
        let info = self.resolve(input.device)?;

        let event = KeyEvent {
            device_name: info.path,
            key: key_from_virtual_key(input.virtual_key),
        };
        Ok(match class {
            EventClass::KeyDown => InputEvent::KeyDown(event),
            _ => InputEvent::KeyUp(event),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::UsageRegistration;
    use crate::device::DeviceKind;
    use crate::error::{LookupError, RegistrationError};
    use crate::event::MouseButtonFlags;
    use crate::hidp::{ButtonCapRange, HidCaps, HidpStatus, PreparsedData, ReportType};
    use crate::identity::{Hive, StoreKey, StoreValue};
    use crate::keys::Key;
    use crate::message::{WM_KEYDOWN, WM_SYSKEYDOWN};

    const PATH: &str = r"\\?\HID#VID_046D&PID_C24F#7&1&0&0000#{4d1e55b2}";

    struct OneDevice;
    impl DeviceDirectory for OneDevice {
        fn device_info(&self, handle: DeviceHandle) -> Option<DeviceInfo> {
            (handle == DeviceHandle(7)).then(|| DeviceInfo {
                handle,
                path: PATH.into(),
                kind: DeviceKind::Hid,
            })
        }
    }

    struct NoNames;
    impl NameStore for NoNames {
        fn open(&self, _: Hive, _: &str) -> Result<Option<StoreKey>, LookupError> {
            Ok(None)
        }
        fn value(&self, _: &StoreKey, _: &str) -> Result<Option<StoreValue>, LookupError> {
            Ok(None)
        }
    }

    /// One button page (0x09), first report byte is a bitmask of buttons 1..=8.
    struct BitmaskPad;
    impl HidParser for BitmaskPad {
        fn preparsed_size(&self, _: DeviceHandle) -> Option<u32> {
            Some(4)
        }
        fn read_preparsed(&self, _: DeviceHandle, buffer: &mut [u8]) -> Option<u32> {
            Some(buffer.len() as u32)
        }
        fn caps(&self, _: &PreparsedData, caps: &mut HidCaps) -> HidpStatus {
            *caps = HidCaps {
                usage_page: 0x01,
                usage: 0x05,
                number_input_button_caps: 1,
                ..Default::default()
            };
            HidpStatus::Success
        }
        fn button_caps(
            &self,
            _: ReportType,
            caps: &mut [ButtonCapRange],
            len: &mut u16,
            _: &PreparsedData,
        ) -> HidpStatus {
            caps[0] = ButtonCapRange {
                usage_page: 0x09,
                ..Default::default()
            };
            *len = 1;
            HidpStatus::Success
        }
        fn max_usage_list_length(&self, _: ReportType, _: u16, _: &PreparsedData) -> u32 {
            8
        }
        fn usages(
            &self,
            _: ReportType,
            _: u16,
            _: u16,
            list: &mut [u16],
            len: &mut u32,
            _: &PreparsedData,
            report: &[u8],
        ) -> HidpStatus {
            let mask = report.first().copied().unwrap_or(0);
            let mut n = 0;
            for bit in 0..8u16 {
                if mask & (1 << bit) != 0 {
                    list[n] = bit + 1;
                    n += 1;
                }
            }
            *len = n as u32;
            HidpStatus::Success
        }
    }

    struct AcceptAll;
    impl DeliveryRegistrar for AcceptAll {
        fn subscribe(&mut self, _: u16, _: u16) -> Result<(), RegistrationError> {
            Ok(())
        }
    }

    fn dispatcher() -> EventDispatcher {
        EventDispatcher::new(Collaborators::new(
            Box::new(OneDevice),
            Box::new(NoNames),
            Box::new(BitmaskPad),
            Box::new(AcceptAll),
        ))
    }

    fn hid(mask: u8) -> RawMessage {
        RawMessage::Hid(HidInput {
            device: DeviceHandle(7),
            report: vec![mask],
        })
    }

    #[test]
    fn non_raw_input_codes_are_ignored() {
        let mut d = dispatcher();
        d.subscribe(EventFilter::All, |_: &InputEvent| {});
        assert_eq!(
            d.deliver_raw_message(WindowHandle(1), 0x0200, &hid(1)),
            Dispatch::Dropped(DropReason::NotRawInput)
        );
        assert!(d.identity_cache().is_empty());
    }

    #[test]
    fn gamepad_report_is_decoded_and_named() {
        let mut d = dispatcher();
        d.register_usage(0x01, 0x05);
        d.enable_observe_all(true);
        d.subscribe(EventFilter::Gamepad, |_: &InputEvent| {});

        let out = d.deliver_raw_message(WindowHandle(1), WM_INPUT, &hid(0b0000_0101));
        assert_eq!(
            out,
            Dispatch::Delivered(InputEvent::Gamepad(GamepadEvent {
                usages: vec![1, 3],
                device_name: PATH.into(),
                oem_name: "VID_046D&PID_C24F".into(),
                force_feedback: false,
            }))
        );
    }

    #[test]
    fn unregistered_top_level_usage_is_dropped() {
        let mut d = dispatcher();
        d.register_usage(0x01, 0x04);
        d.enable_observe_all(true);
        d.subscribe(EventFilter::All, |_: &InputEvent| {});

        assert_eq!(
            d.deliver_raw_message(WindowHandle(1), WM_INPUT, &hid(1)).drop_reason(),
            Some(DropReason::UnregisteredUsage {
                usage_page: 0x01,
                usage_id: 0x05
            })
        );
    }

    #[test]
    fn config_seeds_catalog_and_poll_list() {
        let config = ListenerConfig {
            registrations: vec![UsageRegistration::new(0x01, 0x05)],
            poll: vec!["vid_046d&pid_c24f".into()],
            ..Default::default()
        };
        let mut d = EventDispatcher::from_config(
            Collaborators::new(
                Box::new(OneDevice),
                Box::new(NoNames),
                Box::new(BitmaskPad),
                Box::new(AcceptAll),
            ),
            &config,
        );
        d.subscribe(EventFilter::Gamepad, |_: &InputEvent| {});

        assert!(d.catalog().is_registered(0x01, 0x05));
        assert!(d
            .deliver_raw_message(WindowHandle(1), WM_INPUT, &hid(2))
            .event()
            .is_some());
    }

    #[test]
    fn mouse_needs_button_flags() {
        let mut d = dispatcher();
        d.subscribe(EventFilter::Mouse, |_: &InputEvent| {});

        let motion = RawMessage::Mouse(MouseInput {
            device: DeviceHandle(7),
            buttons: MouseButtonFlags::empty(),
        });
        assert_eq!(
            d.deliver_raw_message(WindowHandle(1), WM_INPUT, &motion),
            Dispatch::Dropped(DropReason::NoMouseButtons)
        );

        let click = RawMessage::Mouse(MouseInput {
            device: DeviceHandle(7),
            buttons: MouseButtonFlags::RIGHT_DOWN,
        });
        assert!(matches!(
            d.deliver_raw_message(WindowHandle(1), WM_INPUT, &click),
            Dispatch::Delivered(InputEvent::Mouse(MouseEvent { buttons, .. })) if buttons == MouseButtonFlags::RIGHT_DOWN
        ));
    }

    #[test]
    fn system_keys_are_ignored_and_plain_keys_mapped() {
        let mut d = dispatcher();
        d.subscribe(EventFilter::KeyDown, |_: &InputEvent| {});

        let sys = RawMessage::Keyboard(KeyboardInput {
            device: DeviceHandle(7),
            virtual_key: 0x12,
            message: WM_SYSKEYDOWN,
        });
        assert_eq!(
            d.deliver_raw_message(WindowHandle(1), WM_INPUT, &sys),
            Dispatch::Dropped(DropReason::IgnoredKeyState)
        );

        let a = RawMessage::Keyboard(KeyboardInput {
            device: DeviceHandle(7),
            virtual_key: 0x41,
            message: WM_KEYDOWN,
        });
        assert_eq!(
            d.deliver_raw_message(WindowHandle(1), WM_INPUT, &a),
            Dispatch::Delivered(InputEvent::KeyDown(KeyEvent {
                device_name: PATH.into(),
                key: Key::Letter('A'),
            }))
        );
    }

    #[test]
    fn identify_builds_display_identity() {
        let mut d = dispatcher();
        let id = d.identify(DeviceHandle(7)).unwrap();
        assert_eq!(id.display_name, "VID_046D&PID_C24F");
        assert_eq!(id.kind, DeviceKind::Hid);
        assert!(d.identify(DeviceHandle(8)).is_none());
    }
}
