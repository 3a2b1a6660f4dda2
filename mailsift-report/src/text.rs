use std::fmt::{self, Write};

use chrono::{DateTime, TimeZone};
use mailsift_verify::{BatchStatus, Summary};

/// Human readable report of a batch.
///
/// ```text
/// EMAIL VALIDATION REPORT
/// Generated: 2025-03-14 09:26:53
/// API: Kickbox
///
/// SUMMARY:
/// - Total emails processed: 3
/// - Deliverable emails: 1
/// - Undeliverable emails: 2
///
/// DELIVERABLE EMAILS:
/// a@test.com
///
/// UNDELIVERABLE EMAILS:
/// - bad: invalid-syntax
/// - c@test.com: risky
/// ```
///
/// An aborted or cancelled batch gets an extra summary line saying how many
/// addresses were never reached.
#[must_use]
pub fn render_text<Tz>(summary: &Summary, generated: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_report(&mut out, summary, generated);
    out
}

fn write_report<W, Tz>(out: &mut W, summary: &Summary, generated: &DateTime<Tz>) -> fmt::Result
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    writeln!(out, "EMAIL VALIDATION REPORT")?;
    writeln!(out, "Generated: {}", generated.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out, "API: Kickbox")?;
    writeln!(out)?;

    writeln!(out, "SUMMARY:")?;
    writeln!(out, "- Total emails processed: {}", summary.total)?;
    writeln!(out, "- Deliverable emails: {}", summary.deliverable_count)?;
    writeln!(out, "- Undeliverable emails: {}", summary.undeliverable_count)?;

    match &summary.status {
        BatchStatus::Complete => {}
        BatchStatus::Aborted {
            reason,
            unprocessed,
        } => writeln!(
            out,
            "- Batch aborted: {reason} ({unprocessed} of {} emails not processed)",
            summary.requested
        )?,
        BatchStatus::Cancelled { unprocessed } => writeln!(
            out,
            "- Batch cancelled: {unprocessed} of {} emails not processed",
            summary.requested
        )?,
    }

    writeln!(out)?;
    writeln!(out, "DELIVERABLE EMAILS:")?;
    if summary.deliverable.is_empty() {
        writeln!(out, "None")?;
    }
    for address in &summary.deliverable {
        writeln!(out, "{address}")?;
    }

    writeln!(out)?;
    writeln!(out, "UNDELIVERABLE EMAILS:")?;
    if summary.undeliverable.is_empty() {
        writeln!(out, "None")?;
    }
    for entry in &summary.undeliverable {
        writeln!(out, "- {}: {}", entry.email, entry.reason)?;
    }

    Ok(())
}
