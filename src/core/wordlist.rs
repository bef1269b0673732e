// src/core/wordlist.rs

use std::path::Path;
use tracing::{debug, info};

/// Labels tried when no wordlist file is given.
pub const DEFAULT_WORDLIST: &[&str] = &[
    "www", "mail", "ftp", "dev", "test", "api", "admin", "blog", "shop", "staging", "vpn", "portal", "m",
];

pub fn default_wordlist() -> Vec<String> {
    DEFAULT_WORDLIST.iter().map(|w| w.to_string()).collect()
}

/// Splits raw file contents into entries: one per line, trimmed, blank lines
/// dropped. Bytes that aren't valid UTF-8 are skipped.
pub fn parse_wordlist(bytes: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    text.lines()
        .map(|line| line.replace(char::REPLACEMENT_CHARACTER, ""))
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Reads a wordlist file. Line order is kept.
pub async fn load_wordlist(path: &Path) -> std::io::Result<Vec<String>> {
    debug!(path = %path.display(), "Reading wordlist.");
    let bytes = tokio::fs::read(path).await?;
    let words = parse_wordlist(&bytes);
    info!(path = %path.display(), entries = %words.len(), "Loaded wordlist.");
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_list_has_thirteen_labels() {
        assert_eq!(default_wordlist().len(), 13);
        assert_eq!(default_wordlist()[0], "www");
    }

    #[test]
    fn blank_lines_and_whitespace_are_dropped() {
        let words = parse_wordlist(b"  www \n\n\t\nmail\r\n api\n");
        assert_eq!(words, vec!["www", "mail", "api"]);
    }

    #[test]
    fn undecodable_bytes_are_skipped() {
        let words = parse_wordlist(b"de\xffv\n\xfe\xfe\nstaging\n");
        assert_eq!(words, vec!["dev", "staging"]);
    }

    #[tokio::test]
    async fn loads_from_file_in_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "zeta\nalpha\n\nbeta").unwrap();

        let words = load_wordlist(file.path()).await.unwrap();
        assert_eq!(words, vec!["zeta", "alpha", "beta"]);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_wordlist(&dir.path().join("nope.txt")).await.is_err());
    }
}
