//! Pressed-usage extraction.
//!
//! Decodes which button usages are active in one input report, page by page,
//! following the declared input button capabilities:
//!
//! 1. fetch the button caps (count taken from `HidCaps`),
//! 2. for every cap in declared order, size a usage buffer with
//!    `MaxUsageListLength`, falling back to the cap's capacity hint,
//! 3. call `GetUsages` and append the returned prefix.
//!
//! Caps are **not** merged by usage page. Wheel bases and button boxes repeat
//! pages across report IDs, and consumers debounce on the raw order, so results
//! keep declaration order and keep duplicates.
//!
//! Pages that are simply absent from this report (other report ID, no such
//! usage, length mismatch) are skipped. Any other status is escalated once per
//! signature and ends the decode with what was collected so far.

use crate::error::{FaultContext, UnexpectedStatus};
use crate::escalation::EscalationLog;
use crate::hidp::{ButtonCapRange, HidCaps, HidParser, HidpStatus, PreparsedData, ReportType};
use serde::{Deserialize, Serialize};

/// Result of decoding one report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedReport {
    /// Active usage codes, declaration order, duplicates kept.
    pub usages: Vec<u16>,
    /// Device declares output values (force-feedback motors).
    pub force_feedback: bool,
}

/// Decode the pressed usages of `report` using `data`.
pub fn extract_pressed_usages(
    parser: &dyn HidParser,
    escalation: &mut EscalationLog,
    caps: &HidCaps,
    data: &PreparsedData,
    report: &[u8],
) -> DecodedReport {
    let force_feedback = caps.number_output_value_caps > 0;
    let mut out = DecodedReport {
        usages: Vec::new(),
        force_feedback,
    };

    let ranges = match input_button_caps(parser, escalation, caps, data) {
        Some(r) => r,
        None => return out,
    };

    for range in &ranges {
        let capacity = usage_capacity(parser, range, data);
        if capacity == 0 {
            tracing::trace!(page = range.usage_page, "no usage capacity; skipping cap");
            continue;
        }

        let mut buf = vec![0u16; capacity as usize];
        let mut len = capacity;
        // Link collection 0 matches the page in every collection; some stacks
        // report usages only that way.
        let status = parser.usages(
            ReportType::Input,
            range.usage_page,
            0,
            &mut buf,
            &mut len,
            data,
            report,
        );

        if status.is_page_absent() {
            tracing::trace!(
                %status,
                page = range.usage_page,
                capacity,
                report_len = report.len(),
                "page not present in this report"
            );
            continue;
        }

        if status != HidpStatus::Success {
            escalation.escalate(UnexpectedStatus {
                status,
                context: FaultContext::Usages {
                    usage_page: range.usage_page,
                    capacity,
                },
            });
            return out;
        }

        let filled = (len.min(capacity)) as usize;
        out.usages.extend_from_slice(&buf[..filled]);
    }

    if force_feedback {
        tracing::trace!(usages = ?out.usages, "decoded report from force-feedback device");
    }
    out
}

/// Fetch the declared input button caps. `None` after an escalated failure.
fn input_button_caps(
    parser: &dyn HidParser,
    escalation: &mut EscalationLog,
    caps: &HidCaps,
    data: &PreparsedData,
) -> Option<Vec<ButtonCapRange>> {
    let declared = caps.number_input_button_caps;
    if declared == 0 {
        return Some(Vec::new());
    }
    let mut ranges = vec![ButtonCapRange::default(); declared as usize];
    let mut len = declared;

    let status = parser.button_caps(ReportType::Input, &mut ranges, &mut len, data);
    if !status.is_tolerated() {
        escalation.escalate(UnexpectedStatus {
            status,
            context: FaultContext::ButtonCaps { count: declared },
        });
        return None;
    }

    ranges.truncate(len.min(declared) as usize);
    Some(ranges)
}

/// Buffer size for one cap: OS maximum for the page, else the cap's hint.
fn usage_capacity(parser: &dyn HidParser, range: &ButtonCapRange, data: &PreparsedData) -> u32 {
    let max = parser.max_usage_list_length(ReportType::Input, range.usage_page, data);
    if max > 0 {
        max
    } else {
        u32::from(range.capacity_hint)
    }
}
