//! Rendering of batch summaries
//!
//! Everything here is a pure function of a [`Summary`] plus a timestamp;
//! [`write_outputs`] is the only function that touches the filesystem.

pub mod csv;
pub mod error;
mod text;

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use mailsift_common::internal;
use mailsift_verify::Summary;

pub use self::{error::ReportError, text::render_text};

/// Newline separated deliverable addresses, one per line
#[must_use]
pub fn deliverable_list(summary: &Summary) -> String {
    summary
        .deliverable
        .iter()
        .fold(String::new(), |mut out, address| {
            out.push_str(address);
            out.push('\n');
            out
        })
}

/// `{prefix}_YYYYmmdd_HHMMSS.{extension}`
#[must_use]
pub fn stamped_filename<Tz>(prefix: &str, extension: &str, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{prefix}_{}.{extension}", at.format("%Y%m%d_%H%M%S"))
}

/// Where the CLI writes its three outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub report: PathBuf,
    pub deliverable: PathBuf,
    pub undeliverable: PathBuf,
}

/// Write the text report, the deliverable list and the undeliverable CSV.
///
/// # Errors
///
/// Returns [`ReportError::Write`] naming the first file that could not be
/// written.
pub fn write_outputs<Tz>(
    summary: &Summary,
    paths: &OutputPaths,
    generated: &DateTime<Tz>,
) -> Result<(), ReportError>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    write(&paths.report, &render_text(summary, generated))?;
    write(&paths.deliverable, &deliverable_list(summary))?;
    write(&paths.undeliverable, &csv::undeliverable_csv(summary))?;

    internal!(
        level = INFO,
        report = %paths.report.display(),
        deliverable = %paths.deliverable.display(),
        undeliverable = %paths.undeliverable.display(),
        "Reports written"
    );

    Ok(())
}

fn write(path: &Path, contents: &str) -> Result<(), ReportError> {
    std::fs::write(path, contents).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod tests {
    use chrono::{NaiveDate, Utc};
    use mailsift_verify::{BatchStatus, UndeliverableEntry};
    use pretty_assertions::assert_eq;

    use super::*;

    pub fn summary(status: BatchStatus) -> Summary {
        Summary {
            deliverable: vec!["a@test.com".to_string(), "b@test.com".to_string()],
            undeliverable: vec![
                UndeliverableEntry {
                    email: "bad".to_string(),
                    reason: "invalid-syntax".to_string(),
                },
                UndeliverableEntry {
                    email: "c@test.com".to_string(),
                    reason: "risky".to_string(),
                },
            ],
            total: 4,
            deliverable_count: 2,
            undeliverable_count: 2,
            requested: 4 + status.unprocessed(),
            status,
        }
    }

    pub fn fixed_time() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(9, 26, 53)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_deliverable_list() {
        assert_eq!(
            deliverable_list(&summary(BatchStatus::Complete)),
            "a@test.com\nb@test.com\n"
        );
    }

    #[test]
    fn test_stamped_filename() {
        assert_eq!(
            stamped_filename("deliverable_emails", "csv", &fixed_time()),
            "deliverable_emails_20250314_092653.csv"
        );
    }

    #[test]
    fn test_write_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths {
            report: dir.path().join("report.txt"),
            deliverable: dir.path().join("deliverable.txt"),
            undeliverable: dir.path().join("undeliverable.csv"),
        };

        write_outputs(&summary(BatchStatus::Complete), &paths, &fixed_time()).unwrap();

        let report = std::fs::read_to_string(&paths.report).unwrap();
        assert!(report.starts_with("EMAIL VALIDATION REPORT\n"));
        assert_eq!(
            std::fs::read_to_string(&paths.deliverable).unwrap(),
            "a@test.com\nb@test.com\n"
        );
        assert!(
            std::fs::read_to_string(&paths.undeliverable)
                .unwrap()
                .starts_with("Email,Reason\r\n")
        );
    }

    #[test]
    fn test_write_outputs_names_failing_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing").join("report.txt");
        let paths = OutputPaths {
            report: missing.clone(),
            deliverable: dir.path().join("deliverable.txt"),
            undeliverable: dir.path().join("undeliverable.csv"),
        };

        let error =
            write_outputs(&summary(BatchStatus::Complete), &paths, &fixed_time()).unwrap_err();

        match error {
            ReportError::Write { path, .. } => assert_eq!(path, missing),
        }
    }
}
