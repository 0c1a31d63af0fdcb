//! Runner file commands.
//!
//! The runner hands out one file per command kind (`GITHUB_PATH`,
//! `GITHUB_ENV`, `GITHUB_OUTPUT`) and reads them back after the step ends.
//! Path entries are plain lines; key/value records use a heredoc:
//!
//! ```text
//! HEIM_HOME<<ghadelimiter_5b0c...
//! /opt/hostedtoolcache/heim/1.1.1/x86_64/heim
//! ghadelimiter_5b0c...
//! ```

use std::io::Write;
use std::path::Path;

use uuid::Uuid;

use crate::errors::{Result, SetupError};

/// Appends `message` plus a newline to the command file at `path`.
///
/// # Errors
///
/// Returns [`SetupError::Io`] if the file cannot be opened or written.
pub fn issue(path: &Path, message: &str) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| SetupError::io(format!("failed to open {}", path.display()), e))?;
    writeln!(file, "{message}")
        .map_err(|e| SetupError::io(format!("failed to write {}", path.display()), e))
}

/// Builds a heredoc record for `key` and `value`.
///
/// # Errors
///
/// Returns [`SetupError::Io`] if the generated delimiter occurs in the key or
/// value.
pub fn key_value_message(key: &str, value: &str) -> Result<String> {
    key_value_message_with(key, value, &new_delimiter())
}

/// Appends one heredoc record per pair to `path` in a single write.
///
/// Every record is built before the file is touched, so a failure leaves the
/// file unchanged.
///
/// # Errors
///
/// See [`key_value_message`] and [`issue`].
pub fn issue_key_values(path: &Path, pairs: &[(&str, &str)]) -> Result<()> {
    issue_key_values_with(path, pairs, new_delimiter)
}

fn issue_key_values_with(
    path: &Path,
    pairs: &[(&str, &str)],
    delimiter: impl Fn() -> String,
) -> Result<()> {
    let records = pairs
        .iter()
        .map(|(key, value)| key_value_message_with(key, value, &delimiter()))
        .collect::<Result<Vec<_>>>()?;
    issue(path, &records.join("\n"))
}

fn new_delimiter() -> String {
    format!("ghadelimiter_{}", Uuid::new_v4())
}

fn key_value_message_with(key: &str, value: &str, delimiter: &str) -> Result<String> {
    for (what, text) in [("name", key), ("value", value)] {
        if text.contains(delimiter) {
            return Err(SetupError::io(
                format!("unexpected input: {what} should not contain the delimiter \"{delimiter}\""),
                std::io::Error::from(std::io::ErrorKind::InvalidInput),
            ));
        }
    }
    Ok(format!("{key}<<{delimiter}\n{value}\n{delimiter}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heredoc_layout() {
        let message = key_value_message_with("bin", "/opt/heim/bin", "EOF").unwrap();
        assert_eq!(message, "bin<<EOF\n/opt/heim/bin\nEOF");
    }

    #[test]
    fn generated_delimiter_wraps_value() {
        let message = key_value_message("heimHome", "/opt/heim").unwrap();
        let lines: Vec<&str> = message.lines().collect();

        assert_eq!(lines.len(), 3);
        let delimiter = lines[0].strip_prefix("heimHome<<").unwrap();
        assert!(delimiter.starts_with("ghadelimiter_"));
        assert_eq!(lines[1], "/opt/heim");
        assert_eq!(lines[2], delimiter);
    }

    #[test]
    fn delimiter_in_value_is_rejected() {
        let err = key_value_message_with("k", "a EOF b", "EOF").unwrap_err();
        assert!(err.to_string().contains("value should not contain the delimiter"));
    }

    #[test]
    fn delimiter_in_name_is_rejected() {
        assert!(key_value_message_with("EOF", "v", "EOF").is_err());
    }

    #[test]
    fn key_values_are_appended_together() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("output.txt");

        issue_key_values_with(&file, &[("heimHome", "/opt/heim"), ("bin", "/opt/heim/bin")], || {
            "EOF".to_string()
        })
        .unwrap();

        assert_eq!(
            std::fs::read_to_string(&file).unwrap(),
            "heimHome<<EOF\n/opt/heim\nEOF\nbin<<EOF\n/opt/heim/bin\nEOF\n"
        );
    }

    #[test]
    fn failing_record_leaves_file_untouched() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("output.txt");

        let result = issue_key_values_with(
            &file,
            &[("heimHome", "/opt/heim"), ("bin", "/opt/EOF/bin")],
            || "EOF".to_string(),
        );

        assert!(result.is_err());
        assert!(!file.exists());
    }

    #[test]
    fn issue_appends_lines() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("path.txt");

        issue(&file, "/first").unwrap();
        issue(&file, "/second").unwrap();

        assert_eq!(std::fs::read_to_string(&file).unwrap(), "/first\n/second\n");
    }
}
