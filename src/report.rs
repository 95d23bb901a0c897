use std::fmt::Write;
use std::time::Duration;

use crate::fetcher::{DownloadResult, Outcome};

const KILOBYTE: u64 = 1024;
const MEGABYTE: u64 = 1024 * 1024;

/// `H:MM:SS`, sub-second remainder dropped.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

pub fn describe_size(size: Option<u64>) -> String {
    match size {
        None => "Unknown".to_string(),
        Some(bytes) if bytes < KILOBYTE => format!("{bytes} bytes"),
        Some(bytes) if bytes <= MEGABYTE => {
            format!("{:.2} Kilobytes", bytes as f64 / KILOBYTE as f64)
        }
        Some(bytes) => format!("{:.2} Megabytes", bytes as f64 / MEGABYTE as f64),
    }
}

/// Summary table, one row per result in the order given.
pub fn render(results: &[DownloadResult]) -> String {
    let width = results
        .iter()
        .map(|r| r.identifier.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(out, "{:^width$}   {}", "FILE", "DURATION");
    let _ = writeln!(out, "{}   {}", "-".repeat(width), "-".repeat(8));
    for result in results {
        let status = match result.outcome {
            Outcome::Success(elapsed) => format_elapsed(elapsed),
            Outcome::Failed => "FAILED".to_string(),
        };
        let _ = writeln!(out, "{:width$} : {}", result.identifier, status);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(id: &str, secs: u64) -> DownloadResult {
        DownloadResult {
            identifier: id.to_string(),
            outcome: Outcome::Success(Duration::from_secs(secs)),
        }
    }

    fn failed(id: &str) -> DownloadResult {
        DownloadResult {
            identifier: id.to_string(),
            outcome: Outcome::Failed,
        }
    }

    #[test]
    fn elapsed_is_hours_minutes_seconds() {
        assert_eq!(format_elapsed(Duration::from_millis(999)), "0:00:00");
        assert_eq!(format_elapsed(Duration::from_secs(65)), "0:01:05");
        assert_eq!(format_elapsed(Duration::from_secs(3 * 3600 + 7)), "3:00:07");
        assert_eq!(format_elapsed(Duration::from_secs(30 * 3600)), "30:00:00");
    }

    #[test]
    fn size_classes() {
        assert_eq!(describe_size(None), "Unknown");
        assert_eq!(describe_size(Some(1023)), "1023 bytes");
        assert_eq!(describe_size(Some(1024)), "1.00 Kilobytes");
        assert_eq!(describe_size(Some(1536)), "1.50 Kilobytes");
        assert_eq!(describe_size(Some(1_048_576)), "1024.00 Kilobytes");
        assert_eq!(describe_size(Some(1_048_577)), "1.00 Megabytes");
        assert_eq!(describe_size(Some(5 * 1_048_576 + 524_288)), "5.50 Megabytes");
    }

    #[test]
    fn mixed_results_share_one_column_width() {
        let table = render(&[
            ok("/tmp/a.txt", 2),
            failed("http://example.com/missing.bin"),
        ]);
        let lines: Vec<&str> = table.lines().collect();
        let width = "http://example.com/missing.bin".len();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], format!("{0}FILE{0}   DURATION", " ".repeat(13)));
        assert_eq!(lines[1], format!("{}   --------", "-".repeat(width)));
        assert_eq!(lines[2], format!("{:width$} : 0:00:02", "/tmp/a.txt"));
        assert_eq!(lines[3], "http://example.com/missing.bin : FAILED");
    }

    #[test]
    fn header_centres_file_label() {
        let table = render(&[ok("/abcdefghij", 0)]);
        let header = table.lines().next().unwrap();
        assert_eq!(header, format!("{}FILE{}   DURATION", " ".repeat(3), " ".repeat(4)));
    }

    #[test]
    fn all_failed_uses_urls_as_identifiers() {
        let table = render(&[failed("ftp://host/x"), failed("s3://bucket/key")]);
        assert!(table.lines().skip(2).all(|l| l.ends_with(" : FAILED")));
        assert_eq!(table.lines().count(), 4);
    }
}
