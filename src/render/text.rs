//! Plain-text summaries of decoded content.

use std::path::{Path, PathBuf};

use crate::model::content::DecodedContent;

/// Headers, a rule, then the text body (or a note when only HTML exists).
pub fn summary(content: &DecodedContent) -> String {
    let mut out = String::new();

    if let Some(date) = content.date {
        out.push_str(&format!(
            "Date:    {}\n",
            date.format("%a, %d %b %Y %H:%M:%S %z")
        ));
    }
    if let Some(from) = &content.from {
        out.push_str(&format!("From:    {from}\n"));
    }
    if let Some(to) = &content.to {
        out.push_str(&format!("To:      {to}\n"));
    }
    out.push_str(&format!(
        "Subject: {}\n",
        content.subject.as_deref().unwrap_or("")
    ));
    out.push_str(&format!("\n{}\n", "-".repeat(72)));

    if !content.text_body.is_empty() {
        out.push('\n');
        out.push_str(&content.text_body);
        out.push('\n');
    } else if !content.html_body.is_empty() {
        let size = humansize::format_size(content.html_body.len(), humansize::BINARY);
        out.push_str(&format!("\n[HTML body only: {size}]\n"));
    }

    out
}

/// Write the summary of `content` into `output_dir` and return the path.
///
/// The file is named after `stem`, the date and the subject.
pub fn export_text(content: &DecodedContent, stem: &str, output_dir: &Path) -> anyhow::Result<PathBuf> {
    let path = output_dir.join(text_filename(content, stem));
    std::fs::write(&path, summary(content))?;
    Ok(path)
}

fn text_filename(content: &DecodedContent, stem: &str) -> String {
    let mut name = sanitize_filename_part(stem, 60);
    if let Some(date) = content.date {
        name.push('_');
        name.push_str(&date.format("%Y%m%d_%H%M%S").to_string());
    }
    if let Some(subject) = content.subject.as_deref().filter(|s| !s.is_empty()) {
        name.push('_');
        name.push_str(&sanitize_filename_part(subject, 80));
    }
    format!("{name}.txt")
}

/// Replace anything but alphanumerics and `- . _ @` with `_`.
pub fn sanitize_filename_part(s: &str, max_len: usize) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '.' | '_' | '@') {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect();

    if sanitized.is_empty() {
        "unknown".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> DecodedContent {
        DecodedContent {
            subject: Some("Quarterly report".into()),
            from: Some("alice@example.com".into()),
            to: None,
            date: chrono::Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).single(),
            text_body: "Numbers attached.".into(),
            html_body: String::new(),
        }
    }

    #[test]
    fn test_summary_layout() {
        let text = summary(&sample());
        assert!(text.starts_with("Date:    Tue, 05 Mar 2024 09:30:00 +0000\n"));
        assert!(text.contains("From:    alice@example.com\n"));
        assert!(!text.contains("To:"));
        assert!(text.contains("Subject: Quarterly report\n"));
        assert!(text.ends_with("\nNumbers attached.\n"));
    }

    #[test]
    fn test_summary_html_only() {
        let content = DecodedContent {
            html_body: "<p>hi</p>".into(),
            ..Default::default()
        };
        assert!(summary(&content).contains("[HTML body only: 9 B]"));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename_part("hello world", 20), "hello_world");
        assert_eq!(sanitize_filename_part("a/b\\c", 20), "a_b_c");
        assert_eq!(sanitize_filename_part("", 20), "unknown");
        assert_eq!(sanitize_filename_part("abcdef", 3), "abc");
    }

    #[test]
    fn test_export_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_text(&sample(), "msg 1", dir.path()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "msg_1_20240305_093000_Quarterly_report.txt"
        );
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.contains("Numbers attached."));
    }
}
