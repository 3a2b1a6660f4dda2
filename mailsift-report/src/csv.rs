//! CSV exports of the two partitions
//!
//! Rows end in CRLF. A field is quoted when it contains a comma, a quote or a
//! line break, with embedded quotes doubled.

use std::borrow::Cow;

use mailsift_verify::Summary;

const LINE_END: &str = "\r\n";

fn field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// `Email` column of every deliverable address
#[must_use]
pub fn deliverable_csv(summary: &Summary) -> String {
    let mut out = String::from("Email");
    out.push_str(LINE_END);

    for address in &summary.deliverable {
        out.push_str(&field(address));
        out.push_str(LINE_END);
    }

    out
}

/// `Email,Reason` rows of every undeliverable address
#[must_use]
pub fn undeliverable_csv(summary: &Summary) -> String {
    let mut out = String::from("Email,Reason");
    out.push_str(LINE_END);

    for entry in &summary.undeliverable {
        out.push_str(&field(&entry.email));
        out.push(',');
        out.push_str(&field(&entry.reason));
        out.push_str(LINE_END);
    }

    out
}
