//! HID parser (HIDP) interface.
//!
//! The OS hands out a per-device *preparsed data* blob describing the report
//! layout. Every query below is answered from that blob, never from fixed
//! report offsets. The trait mirrors the `HidP_*` / `GetRawInputDeviceInfoW`
//! calls closely so that the decode logic in [`usages`](crate::usages) keeps the
//! exact call sequence real hardware needs:
//!
//! - two-phase descriptor fetch (size query with no buffer, then fill),
//! - button caps fetched with a caller-sized array,
//! - per-page `MaxUsageListLength` sizing before `GetUsages`.
//!
//! The Windows implementation lives in
//! `backends::windows::hidp_parser`; tests provide synthetic parsers.

use crate::device::DeviceHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

// NTSTATUS values from <hidpi.h>. Kept local so the core builds on every target.
pub const HIDP_STATUS_SUCCESS: i32 = 0x0011_0000;
pub const HIDP_STATUS_INVALID_PREPARSED_DATA: i32 = 0xC011_0001_u32 as i32;
pub const HIDP_STATUS_INVALID_REPORT_LENGTH: i32 = 0xC011_0003_u32 as i32;
pub const HIDP_STATUS_USAGE_NOT_FOUND: i32 = 0xC011_0004_u32 as i32;
pub const HIDP_STATUS_INCOMPATIBLE_REPORT_ID: i32 = 0xC011_000A_u32 as i32;

/// Status returned by a HIDP query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HidpStatus {
    #[default]
    Success,
    /// The page exists, but not in the report ID of this buffer.
    IncompatibleReportId,
    /// The page has no controls in any report of this type.
    UsageNotFound,
    /// The buffer length does not match the report type.
    InvalidReportLength,
    /// The preparsed data is malformed.
    InvalidPreparsedData,
    /// Anything else, raw NTSTATUS kept.
    Other(i32),
}

impl HidpStatus {
    pub fn from_raw(code: i32) -> Self {
        match code {
            HIDP_STATUS_SUCCESS => HidpStatus::Success,
            HIDP_STATUS_INCOMPATIBLE_REPORT_ID => HidpStatus::IncompatibleReportId,
            HIDP_STATUS_USAGE_NOT_FOUND => HidpStatus::UsageNotFound,
            HIDP_STATUS_INVALID_REPORT_LENGTH => HidpStatus::InvalidReportLength,
            HIDP_STATUS_INVALID_PREPARSED_DATA => HidpStatus::InvalidPreparsedData,
            other => HidpStatus::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            HidpStatus::Success => HIDP_STATUS_SUCCESS,
            HidpStatus::IncompatibleReportId => HIDP_STATUS_INCOMPATIBLE_REPORT_ID,
            HidpStatus::UsageNotFound => HIDP_STATUS_USAGE_NOT_FOUND,
            HidpStatus::InvalidReportLength => HIDP_STATUS_INVALID_REPORT_LENGTH,
            HidpStatus::InvalidPreparsedData => HIDP_STATUS_INVALID_PREPARSED_DATA,
            HidpStatus::Other(code) => code,
        }
    }

    /// Statuses meaning "this page is not in this particular report".
    #[inline]
    pub fn is_page_absent(self) -> bool {
        matches!(
            self,
            HidpStatus::IncompatibleReportId
                | HidpStatus::UsageNotFound
                | HidpStatus::InvalidReportLength
        )
    }

    /// Statuses a capability query may return without being treated as a fault.
    ///
    /// `InvalidReportLength` is deliberately absent: it only makes sense for
    /// calls that take a report buffer.
    #[inline]
    pub fn is_tolerated(self) -> bool {
        matches!(
            self,
            HidpStatus::Success | HidpStatus::IncompatibleReportId | HidpStatus::UsageNotFound
        )
    }
}

impl fmt::Display for HidpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} (0x{:08x})", self, self.code() as u32)
    }
}

/// HIDP report type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReportType {
    Input,
    Output,
    Feature,
}

/// Top-level collection capabilities (`HIDP_CAPS`), trimmed to what we read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HidCaps {
    pub usage: u16,
    pub usage_page: u16,
    pub input_report_byte_length: u16,
    pub number_input_button_caps: u16,
    pub number_input_value_caps: u16,
    pub number_output_button_caps: u16,
    pub number_output_value_caps: u16,
    pub number_feature_button_caps: u16,
    pub number_feature_value_caps: u16,
}

/// One declared button capability (`HIDP_BUTTON_CAPS`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonCapRange {
    pub usage_page: u16,
    pub report_id: u8,
    pub link_collection: u16,
    /// `NotRange.Usage` (or `Range.UsageMin` for ranges).
    pub usage: u16,
    /// `NotRange.Reserved1`; overlays `Range.UsageMax`, so for range caps this is
    /// the highest usage and a usable upper bound on simultaneous presses.
    pub capacity_hint: u16,
}

/// Owned bytes of a device's preparsed data.
///
/// Stored in 8-byte words so the buffer can be handed to `HidP_*` as a
/// `PHIDP_PREPARSED_DATA`, which expects the alignment of a heap allocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreparsedData {
    words: Vec<u64>,
    len: usize,
}

const WORD: usize = std::mem::size_of::<u64>();

impl PreparsedData {
    pub fn zeroed(len: usize) -> Self {
        Self {
            words: vec![0u64; len.div_ceil(WORD)],
            len,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: `words` holds at least `len` initialized bytes and u8 has no
        // alignment requirement.
        unsafe { std::slice::from_raw_parts(self.words.as_ptr().cast::<u8>(), self.len) }
    }

    #[inline]
    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        // SAFETY: as above, and the borrow is exclusive.
        unsafe { std::slice::from_raw_parts_mut(self.words.as_mut_ptr().cast::<u8>(), self.len) }
    }

    /// Start of the buffer, aligned for `u64`.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.words.as_ptr().cast()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl From<Vec<u8>> for PreparsedData {
    fn from(bytes: Vec<u8>) -> Self {
        let mut data = Self::zeroed(bytes.len());
        data.as_mut_bytes().copy_from_slice(&bytes);
        data
    }
}

/// OS capability-query collaborator.
///
/// All methods take `&self`; implementations with bookkeeping use interior
/// mutability. Out-parameters follow the OS convention: `len` carries the
/// buffer capacity in and the filled count out.
pub trait HidParser {
    /// Phase 1: bytes needed for the device's preparsed data.
    /// `None` when the query itself fails.
    fn preparsed_size(&self, device: DeviceHandle) -> Option<u32>;

    /// Phase 2: copy the preparsed data into `buffer` (sized from phase 1).
    /// Returns the number of bytes written, `None` on failure.
    fn read_preparsed(&self, device: DeviceHandle, buffer: &mut [u8]) -> Option<u32>;

    /// Called exactly once per acquired descriptor, when it goes out of scope.
    fn release(&self, _data: &mut PreparsedData) {}

    /// `HidP_GetCaps`. `caps` is written even when the status is not
    /// `Success`; the caller decides whether to use it.
    fn caps(&self, data: &PreparsedData, caps: &mut HidCaps) -> HidpStatus;

    fn button_caps(
        &self,
        report_type: ReportType,
        caps: &mut [ButtonCapRange],
        len: &mut u16,
        data: &PreparsedData,
    ) -> HidpStatus;

    fn max_usage_list_length(
        &self,
        report_type: ReportType,
        usage_page: u16,
        data: &PreparsedData,
    ) -> u32;

    #[allow(clippy::too_many_arguments)]
    fn usages(
        &self,
        report_type: ReportType,
        usage_page: u16,
        link_collection: u16,
        usages: &mut [u16],
        len: &mut u32,
        data: &PreparsedData,
        report: &[u8],
    ) -> HidpStatus;
}

/// Preparsed data scoped to a single decode call.
///
/// Released through [`HidParser::release`] when dropped, on success and on
/// every early return.
pub struct Descriptor<'p> {
    parser: &'p dyn HidParser,
    data: PreparsedData,
}

impl<'p> Descriptor<'p> {
    pub(crate) fn new(parser: &'p dyn HidParser, data: PreparsedData) -> Self {
        Self { parser, data }
    }

    pub(crate) fn data_mut(&mut self) -> &mut PreparsedData {
        &mut self.data
    }
}

impl Deref for Descriptor<'_> {
    type Target = PreparsedData;

    fn deref(&self) -> &PreparsedData {
        &self.data
    }
}

impl Drop for Descriptor<'_> {
    fn drop(&mut self) {
        self.parser.release(&mut self.data);
    }
}
