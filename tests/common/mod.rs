//! Fake collaborators shared by the integration tests.
//!
//! `FakeParser` serializes each device's [`FakeLayout`] to JSON and hands those
//! bytes out as the preparsed data, so every HIDP query works from the acquired
//! descriptor exactly like the OS parser does. Button state is read from a
//! bitfield in the report.

#![allow(dead_code)]

use rawpad::error::{LookupError, RegistrationError, UnexpectedStatus};
use rawpad::escalation::FaultSink;
use rawpad::hidp::{ButtonCapRange, HidCaps, HidParser, HidpStatus, PreparsedData, ReportType};
use rawpad::identity::{Hive, NameStore, StoreKey, StoreValue};
use rawpad::{
    Collaborators, DeliveryRegistrar, DeviceDirectory, DeviceHandle, DeviceInfo, DeviceKind,
    EventDispatcher, HidInput, RawMessage,
};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

pub const OEM_ROOT: &str =
    r"System\CurrentControlSet\Control\MediaProperties\PrivateProperties\Joystick\OEM";

pub fn hid_path(vid: &str, pid: &str) -> String {
    format!(r"\\?\HID#VID_{vid}&PID_{pid}#8&27a93c19&0&0000#{{4d1e55b2-f16f-11cf-88cb-001111000030}}")
}

// ---- device directory ----

#[derive(Clone, Default)]
pub struct FakeDirectory {
    devices: Rc<RefCell<HashMap<DeviceHandle, DeviceInfo>>>,
    pub queries: Rc<Cell<u32>>,
}

impl FakeDirectory {
    pub fn add(&self, handle: DeviceHandle, path: &str) {
        self.devices.borrow_mut().insert(
            handle,
            DeviceInfo {
                handle,
                path: path.to_string(),
                kind: DeviceKind::Hid,
            },
        );
    }
}

impl DeviceDirectory for FakeDirectory {
    fn device_info(&self, handle: DeviceHandle) -> Option<DeviceInfo> {
        self.queries.set(self.queries.get() + 1);
        self.devices.borrow().get(&handle).cloned()
    }
}

// ---- name store ----

#[derive(Clone, Default)]
pub struct FakeNames {
    keys: Rc<RefCell<HashMap<(Hive, String), HashMap<String, StoreValue>>>>,
    pub opens: Rc<Cell<u32>>,
    pub unreachable: Rc<Cell<bool>>,
}

impl FakeNames {
    pub fn set(&self, hive: Hive, path: &str, name: &str, value: StoreValue) {
        self.keys
            .borrow_mut()
            .entry((hive, path.to_string()))
            .or_default()
            .insert(name.to_string(), value);
    }

    pub fn set_oem_name(&self, vid_pid: &str, oem: &str) {
        self.set(
            Hive::CurrentUser,
            &format!(r"{OEM_ROOT}\{vid_pid}"),
            "OEMName",
            StoreValue::String(oem.to_string()),
        );
    }
}

impl NameStore for FakeNames {
    fn open(&self, hive: Hive, path: &str) -> Result<Option<StoreKey>, LookupError> {
        self.opens.set(self.opens.get() + 1);
        if self.unreachable.get() {
            return Err(LookupError::Unreachable(path.to_string()));
        }
        let exists = self.keys.borrow().contains_key(&(hive, path.to_string()));
        Ok(exists.then(|| StoreKey {
            hive,
            path: path.to_string(),
        }))
    }

    fn value(&self, key: &StoreKey, name: &str) -> Result<Option<StoreValue>, LookupError> {
        Ok(self
            .keys
            .borrow()
            .get(&(key.hive, key.path.clone()))
            .and_then(|values| values.get(name).cloned()))
    }
}

// ---- HID parser ----

/// One declared button cap and where its bits sit in the report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FakeButtons {
    pub cap: ButtonCapRange,
    /// `HidP_MaxUsageListLength` answer for the page.
    pub max_len: u32,
    /// Bit offset of the first button in the report.
    pub bit_offset: usize,
    pub count: u16,
    pub first_usage: u16,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FakeLayout {
    pub caps: HidCaps,
    pub buttons: Vec<FakeButtons>,
}

impl FakeLayout {
    /// Generic gamepad (page 1 / usage 5) with one button page.
    pub fn gamepad(buttons: Vec<FakeButtons>) -> Self {
        Self {
            caps: HidCaps {
                usage_page: 0x01,
                usage: 0x05,
                number_input_button_caps: buttons.len() as u16,
                ..Default::default()
            },
            buttons,
        }
    }

    pub fn with_output_values(mut self, n: u16) -> Self {
        self.caps.number_output_value_caps = n;
        self
    }

    pub fn with_top_level(mut self, usage_page: u16, usage: u16) -> Self {
        self.caps.usage_page = usage_page;
        self.caps.usage = usage;
        self
    }
}

/// `count` buttons on the Button page (0x09) starting at usage 1.
pub fn button_page(count: u16) -> FakeButtons {
    FakeButtons {
        cap: ButtonCapRange {
            usage_page: 0x09,
            usage: 1,
            capacity_hint: count,
            ..Default::default()
        },
        max_len: u32::from(count),
        bit_offset: 0,
        count,
        first_usage: 1,
    }
}

/// Report whose bitfield has exactly `usages` set (1-based, Button page).
pub fn report_with(usages: &[u16], len: usize) -> Vec<u8> {
    let mut report = vec![0u8; len];
    for &u in usages {
        let bit = usize::from(u - 1);
        report[bit / 8] |= 1 << (bit % 8);
    }
    report
}

#[derive(Clone, Default)]
pub struct FakeParser {
    layouts: Rc<RefCell<HashMap<DeviceHandle, FakeLayout>>>,
    /// Forced `GetUsages` status per page.
    pub page_status: Rc<RefCell<HashMap<u16, HidpStatus>>>,
    /// Status reported alongside the caps.
    pub caps_status: Rc<Cell<HidpStatus>>,
    pub failing_size: Rc<RefCell<Vec<DeviceHandle>>>,
    pub acquired: Rc<Cell<u32>>,
    pub released: Rc<Cell<u32>>,
}

impl FakeParser {
    pub fn add(&self, handle: DeviceHandle, layout: FakeLayout) {
        self.layouts.borrow_mut().insert(handle, layout);
    }

    fn encoded(&self, handle: DeviceHandle) -> Option<Vec<u8>> {
        let layouts = self.layouts.borrow();
        let layout = layouts.get(&handle)?;
        serde_json::to_vec(layout).ok()
    }

    fn layout(data: &PreparsedData) -> Option<FakeLayout> {
        serde_json::from_slice(data.as_bytes()).ok()
    }
}

impl HidParser for FakeParser {
    fn preparsed_size(&self, device: DeviceHandle) -> Option<u32> {
        if self.failing_size.borrow().contains(&device) {
            return None;
        }
        self.encoded(device).map(|b| b.len() as u32)
    }

    fn read_preparsed(&self, device: DeviceHandle, buffer: &mut [u8]) -> Option<u32> {
        let bytes = self.encoded(device)?;
        if bytes.len() != buffer.len() {
            return None;
        }
        buffer.copy_from_slice(&bytes);
        self.acquired.set(self.acquired.get() + 1);
        Some(bytes.len() as u32)
    }

    fn release(&self, _data: &mut PreparsedData) {
        self.released.set(self.released.get() + 1);
    }

    fn caps(&self, data: &PreparsedData, caps: &mut HidCaps) -> HidpStatus {
        match Self::layout(data) {
            Some(layout) => {
                *caps = layout.caps;
                self.caps_status.get()
            }
            None => HidpStatus::InvalidPreparsedData,
        }
    }

    fn button_caps(
        &self,
        report_type: ReportType,
        caps: &mut [ButtonCapRange],
        len: &mut u16,
        data: &PreparsedData,
    ) -> HidpStatus {
        let Some(layout) = Self::layout(data) else {
            return HidpStatus::InvalidPreparsedData;
        };
        if report_type != ReportType::Input {
            *len = 0;
            return HidpStatus::Success;
        }
        let n = layout.buttons.len().min(caps.len());
        for (dst, b) in caps.iter_mut().zip(&layout.buttons) {
            *dst = b.cap;
        }
        *len = n as u16;
        HidpStatus::Success
    }

    fn max_usage_list_length(&self, _: ReportType, usage_page: u16, data: &PreparsedData) -> u32 {
        Self::layout(data)
            .map(|l| {
                l.buttons
                    .iter()
                    .filter(|b| b.cap.usage_page == usage_page)
                    .map(|b| b.max_len)
                    .sum::<u32>()
            })
            .unwrap_or(0)
    }

    fn usages(
        &self,
        _: ReportType,
        usage_page: u16,
        _link_collection: u16,
        usages: &mut [u16],
        len: &mut u32,
        data: &PreparsedData,
        report: &[u8],
    ) -> HidpStatus {
        if let Some(status) = self.page_status.borrow().get(&usage_page) {
            *len = 0;
            return *status;
        }
        let Some(layout) = Self::layout(data) else {
            return HidpStatus::InvalidPreparsedData;
        };

        let mut pressed = Vec::new();
        let mut declared = false;
        for b in layout.buttons.iter().filter(|b| b.cap.usage_page == usage_page) {
            declared = true;
            for i in 0..usize::from(b.count) {
                let bit = b.bit_offset + i;
                let Some(byte) = report.get(bit / 8) else {
                    *len = 0;
                    return HidpStatus::InvalidReportLength;
                };
                if byte & (1 << (bit % 8)) != 0 {
                    pressed.push(b.first_usage + i as u16);
                }
            }
        }
        if !declared {
            *len = 0;
            return HidpStatus::UsageNotFound;
        }

        let n = pressed.len().min(usages.len());
        usages[..n].copy_from_slice(&pressed[..n]);
        *len = n as u32;
        HidpStatus::Success
    }
}

// ---- registrar / fault sink ----

#[derive(Clone, Default)]
pub struct FakeRegistrar {
    pub calls: Rc<RefCell<Vec<(u16, u16)>>>,
}

impl DeliveryRegistrar for FakeRegistrar {
    fn subscribe(&mut self, usage_page: u16, usage_id: u16) -> Result<(), RegistrationError> {
        self.calls.borrow_mut().push((usage_page, usage_id));
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordingSink {
    pub faults: Rc<RefCell<Vec<UnexpectedStatus>>>,
}

impl FaultSink for RecordingSink {
    fn escalate(&self, fault: &UnexpectedStatus) {
        self.faults.borrow_mut().push(*fault);
    }
}

// ---- harness ----

#[derive(Clone, Default)]
pub struct Harness {
    pub directory: FakeDirectory,
    pub names: FakeNames,
    pub parser: FakeParser,
    pub registrar: FakeRegistrar,
    pub sink: RecordingSink,
}

impl Harness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(
            Box::new(self.directory.clone()),
            Box::new(self.names.clone()),
            Box::new(self.parser.clone()),
            Box::new(self.registrar.clone()),
        )
        .with_fault_sink(Box::new(self.sink.clone()))
    }

    pub fn dispatcher(&self) -> EventDispatcher {
        EventDispatcher::new(self.collaborators())
    }

    /// Register a HID device with a directory entry and a descriptor.
    pub fn add_device(&self, handle: isize, path: &str, layout: FakeLayout) -> DeviceHandle {
        let handle = DeviceHandle(handle);
        self.directory.add(handle, path);
        self.parser.add(handle, layout);
        handle
    }

    pub fn escalations(&self) -> usize {
        self.sink.faults.borrow().len()
    }
}

pub fn hid(device: DeviceHandle, report: Vec<u8>) -> RawMessage {
    RawMessage::Hid(HidInput { device, report })
}
