//! Data file discovery for the local backend.
//!
//! A missing or empty data directory must be reported as "no data
//! available" before any query text is built, so an empty filtered result
//! stays distinguishable from a backend with no data at all.

use std::path::{Path, PathBuf};

/// Lists the files in `dir` whose names match `pattern`.
///
/// A missing or unreadable directory yields an empty list — the caller
/// treats that the same as a directory with no matching files. Results are
/// sorted for reproducibility.
#[must_use]
pub fn matching_files(dir: &Path, pattern: &str) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| wildcard_match(pattern, n))
        })
        .collect();

    files.sort();
    files
}

/// Matches a file name against a glob pattern supporting `*` wildcards.
///
/// `*` matches any run of characters (including none); everything else
/// matches literally. This covers the patterns used for Parquet data sets
/// (`*.parquet`, `stormevents_*.parquet`).
#[must_use]
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == name,
        Some((prefix, rest)) => {
            let Some(remainder) = name.strip_prefix(prefix) else {
                return false;
            };
            if rest.is_empty() {
                return true;
            }
            // Try every position the next literal segment could start at.
            (0..=remainder.len())
                .filter(|i| remainder.is_char_boundary(*i))
                .any(|i| wildcard_match(rest, &remainder[i..]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_extension_pattern() {
        assert!(wildcard_match("*.parquet", "stormevents_2023.parquet"));
        assert!(!wildcard_match("*.parquet", "stormevents_2023.csv"));
        assert!(!wildcard_match("*.parquet", "parquet"));
    }

    #[test]
    fn matches_prefix_and_suffix_pattern() {
        assert!(wildcard_match(
            "stormevents_*.parquet",
            "stormevents_2023.parquet"
        ));
        assert!(!wildcard_match("stormevents_*.parquet", "other_2023.parquet"));
    }

    #[test]
    fn matches_literal_pattern() {
        assert!(wildcard_match("data.parquet", "data.parquet"));
        assert!(!wildcard_match("data.parquet", "data2.parquet"));
    }

    #[test]
    fn multiple_wildcards() {
        assert!(wildcard_match("*_d2023_*.csv.gz", "StormEvents_d2023_c20250110.csv.gz"));
        assert!(!wildcard_match("*_d2023_*.csv.gz", "StormEvents_d2022_c20250110.csv.gz"));
    }

    #[test]
    fn missing_directory_yields_no_files() {
        let files = matching_files(Path::new("/nonexistent/storm-data"), "*.parquet");
        assert!(files.is_empty());
    }

    #[test]
    fn lists_only_matching_files() {
        let dir = std::env::temp_dir().join(format!("storm-files-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("a.parquet"), b"").unwrap();
        std::fs::write(dir.join("b.parquet"), b"").unwrap();
        std::fs::write(dir.join("notes.txt"), b"").unwrap();

        let files = matching_files(&dir, "*.parquet");
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| {
            p.extension().is_some_and(|e| e == "parquet")
        }));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
