#![cfg(target_os = "windows")]
//! Windows HIDP capability queries.
//!
//! [`WinHidParser`] implements [`HidParser`] on top of Raw Input and the HID
//! Parser (HIDP) API:
//! - preparsed data comes from `GetRawInputDeviceInfoW(RIDI_PREPARSEDDATA)`
//!   into a caller-owned buffer (no file handle is opened),
//! - caps, button caps and usage lists come from `HidP_*` on that buffer.
//!
//! The buffer is owned by [`PreparsedData`], so there is nothing to free on
//! release.
//!
//! ## Notes
//! - `HidP_GetUsages` takes a mutable report pointer, so the report is copied
//!   into a scratch buffer per call.
//! - For range caps `NotRange.Reserved1` overlays `Range.UsageMax`; it is
//!   reported as the capacity hint either way.

use core::ffi::c_void;
use core::mem::MaybeUninit;

use windows_sys::Win32::Devices::HumanInterfaceDevice::*;
use windows_sys::Win32::Foundation::NTSTATUS;
use windows_sys::Win32::UI::Input::{GetRawInputDeviceInfoW, RIDI_PREPARSEDDATA};

use crate::device::DeviceHandle;
use crate::hidp::{ButtonCapRange, HidCaps, HidParser, HidpStatus, PreparsedData, ReportType};

/// HIDP-backed capability parser.
#[derive(Clone, Copy, Debug, Default)]
pub struct WinHidParser;

impl WinHidParser {
    pub fn new() -> Self {
        WinHidParser
    }
}

#[inline]
fn report_type(t: ReportType) -> HIDP_REPORT_TYPE {
    match t {
        ReportType::Input => HidP_Input,
        ReportType::Output => HidP_Output,
        ReportType::Feature => HidP_Feature,
    }
}

/// HIDP takes the preparsed data as an opaque pointer-sized value. The
/// buffer behind it is word aligned.
#[inline]
fn ppd(data: &PreparsedData) -> PHIDP_PREPARSED_DATA {
    data.as_ptr() as PHIDP_PREPARSED_DATA
}

#[inline]
fn status(raw: NTSTATUS) -> HidpStatus {
    HidpStatus::from_raw(raw)
}

impl HidParser for WinHidParser {
    fn preparsed_size(&self, device: DeviceHandle) -> Option<u32> {
        let mut size: u32 = 0;
        let r = unsafe {
            GetRawInputDeviceInfoW(
                device.0 as _,
                RIDI_PREPARSEDDATA,
                core::ptr::null_mut(),
                &mut size,
            )
        };
        (r != u32::MAX).then_some(size)
    }

    fn read_preparsed(&self, device: DeviceHandle, buffer: &mut [u8]) -> Option<u32> {
        let mut size = buffer.len() as u32;
        let r = unsafe {
            GetRawInputDeviceInfoW(
                device.0 as _,
                RIDI_PREPARSEDDATA,
                buffer.as_mut_ptr() as *mut c_void,
                &mut size,
            )
        };
        (r != u32::MAX).then_some(r)
    }

    fn caps(&self, data: &PreparsedData, caps: &mut HidCaps) -> HidpStatus {
        let mut raw = MaybeUninit::<HIDP_CAPS>::zeroed();
        let s = status(unsafe { HidP_GetCaps(ppd(data), raw.as_mut_ptr()) });
        // Zero-initialized, so reading it is sound whatever GetCaps wrote.
        let c = unsafe { raw.assume_init() };
        *caps = HidCaps {
            usage: c.Usage,
            usage_page: c.UsagePage,
            input_report_byte_length: c.InputReportByteLength,
            number_input_button_caps: c.NumberInputButtonCaps,
            number_input_value_caps: c.NumberInputValueCaps,
            number_output_button_caps: c.NumberOutputButtonCaps,
            number_output_value_caps: c.NumberOutputValueCaps,
            number_feature_button_caps: c.NumberFeatureButtonCaps,
            number_feature_value_caps: c.NumberFeatureValueCaps,
        };
        s
    }

    fn button_caps(
        &self,
        t: ReportType,
        caps: &mut [ButtonCapRange],
        len: &mut u16,
        data: &PreparsedData,
    ) -> HidpStatus {
        let mut raw: Vec<HIDP_BUTTON_CAPS> =
            vec![unsafe { core::mem::zeroed() }; (*len as usize).min(caps.len())];
        let mut n = raw.len() as u16;
        let s = status(unsafe {
            HidP_GetButtonCaps(report_type(t), raw.as_mut_ptr(), &mut n, ppd(data))
        });

        let filled = (n as usize).min(raw.len());
        for (dst, c) in caps.iter_mut().zip(&raw[..filled]) {
            let (usage, capacity_hint) = unsafe {
                if c.IsRange != 0 {
                    (c.Anonymous.Range.UsageMin, c.Anonymous.Range.UsageMax)
                } else {
                    (c.Anonymous.NotRange.Usage, c.Anonymous.NotRange.Reserved1)
                }
            };
            *dst = ButtonCapRange {
                usage_page: c.UsagePage,
                report_id: c.ReportID,
                link_collection: c.LinkCollection,
                usage,
                capacity_hint,
            };
        }
        *len = n;
        s
    }

    fn max_usage_list_length(&self, t: ReportType, usage_page: u16, data: &PreparsedData) -> u32 {
        unsafe { HidP_MaxUsageListLength(report_type(t), usage_page, ppd(data)) }
    }

    fn usages(
        &self,
        t: ReportType,
        usage_page: u16,
        link_collection: u16,
        usages: &mut [u16],
        len: &mut u32,
        data: &PreparsedData,
        report: &[u8],
    ) -> HidpStatus {
        let mut scratch = report.to_vec();
        let mut n = (*len).min(usages.len() as u32);
        let s = status(unsafe {
            HidP_GetUsages(
                report_type(t),
                usage_page,
                link_collection,
                usages.as_mut_ptr(),
                &mut n,
                ppd(data),
                scratch.as_mut_ptr(),
                scratch.len() as u32,
            )
        });
        *len = n;
        s
    }
}
