//! Capability descriptor acquisition.
//!
//! Wraps the two-phase preparsed-data fetch and `HidP_GetCaps`, and composes
//! them with [`extract_pressed_usages`] into a single decode call. The
//! descriptor never outlives [`CapabilityResolver::decode`].
//!
//! The caller sees the top-level caps before any usage is extracted, so a
//! device it is not interested in never reaches `GetUsages` and cannot raise
//! a fault.

use crate::device::DeviceHandle;
use crate::error::{DecodeError, FaultContext, UnexpectedStatus};
use crate::escalation::{EscalationLog, FaultSink};
use crate::hidp::{Descriptor, HidCaps, HidParser, HidpStatus, PreparsedData};
use crate::usages::{extract_pressed_usages, DecodedReport};

/// Acquire the device's preparsed data.
///
/// Phase 1 asks for the size with no buffer, phase 2 fills a buffer of exactly
/// that size. The returned guard releases the data when dropped; it is created
/// before phase 2 so a failed fill is released too.
pub fn get_capabilities(
    parser: &dyn HidParser,
    device: DeviceHandle,
) -> Result<Descriptor<'_>, DecodeError> {
    let size = match parser.preparsed_size(device) {
        Some(n) if n > 0 => n,
        _ => {
            tracing::trace!(%device, "no preparsed data size");
            return Err(DecodeError::Unavailable);
        }
    };

    let mut descriptor = Descriptor::new(parser, PreparsedData::zeroed(size as usize));
    if parser
        .read_preparsed(device, descriptor.data_mut().as_mut_bytes())
        .is_none()
    {
        tracing::trace!(%device, size, "preparsed data fetch failed");
        return Err(DecodeError::Unavailable);
    }
    Ok(descriptor)
}

/// Read the top-level caps.
///
/// `IncompatibleReportId` and `UsageNotFound` are accepted like `Success` and
/// the caps are used as written. An invalid descriptor is dropped silently.
/// Other unrecognized statuses are escalated once per signature and still
/// fail the call.
pub fn get_caps(
    parser: &dyn HidParser,
    escalation: &mut EscalationLog,
    data: &PreparsedData,
) -> Result<HidCaps, DecodeError> {
    let mut caps = HidCaps::default();
    match parser.caps(data, &mut caps) {
        HidpStatus::Success => Ok(caps),
        status if status.is_tolerated() => {
            tracing::trace!(%status, "GetCaps returned a tolerated status");
            Ok(caps)
        }
        HidpStatus::InvalidPreparsedData => {
            tracing::trace!("preparsed data marked invalid");
            Err(DecodeError::MalformedDescriptor)
        }
        status => {
            let fault = UnexpectedStatus {
                status,
                context: FaultContext::Caps,
            };
            escalation.escalate(fault);
            Err(fault.into())
        }
    }
}

/// Caps and pressed usages of one report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedCapabilities {
    pub caps: HidCaps,
    pub report: DecodedReport,
}

/// Result of a decode that got as far as the top-level caps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeOutcome {
    Decoded(DecodedCapabilities),
    /// The caller turned the device down on its caps; the report was not read.
    Rejected(HidCaps),
}

impl DecodeOutcome {
    pub fn decoded(self) -> Option<DecodedCapabilities> {
        match self {
            DecodeOutcome::Decoded(d) => Some(d),
            DecodeOutcome::Rejected(_) => None,
        }
    }
}

/// Owns the OS parser and the fault log shared by every decode.
pub struct CapabilityResolver {
    parser: Box<dyn HidParser>,
    escalation: EscalationLog,
}

impl CapabilityResolver {
    pub fn new(parser: Box<dyn HidParser>, faults: Box<dyn FaultSink>) -> Self {
        Self {
            parser,
            escalation: EscalationLog::new(faults),
        }
    }

    /// Acquire, query caps, ask `admit`, decode, release.
    ///
    /// Usages are only extracted when `admit` accepts the caps.
    pub fn decode(
        &mut self,
        device: DeviceHandle,
        report: &[u8],
        admit: impl FnOnce(&HidCaps) -> bool,
    ) -> Result<DecodeOutcome, DecodeError> {
        let parser = self.parser.as_ref();
        let descriptor = get_capabilities(parser, device)?;
        let caps = get_caps(parser, &mut self.escalation, &descriptor)?;
        if !admit(&caps) {
            return Ok(DecodeOutcome::Rejected(caps));
        }
        let decoded =
            extract_pressed_usages(parser, &mut self.escalation, &caps, &descriptor, report);
        drop(descriptor);

        Ok(DecodeOutcome::Decoded(DecodedCapabilities {
            caps,
            report: decoded,
        }))
    }

    pub fn escalation(&self) -> &EscalationLog {
        &self.escalation
    }
}
