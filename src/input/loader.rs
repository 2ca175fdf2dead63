use crate::input::InputError;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// A target URL and the selector of its navigation container
pub type TargetPair = (String, String);

/// Lists the CSV files of `dir`, sorted by file name
///
/// The extension match is case-insensitive.
pub fn find_csv_files(dir: &Path) -> Result<Vec<PathBuf>, InputError> {
    if !dir.is_dir() {
        return Err(InputError::MissingDirectory(dir.to_path_buf()));
    }

    let entries = fs::read_dir(dir).map_err(|source| InputError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();

    if files.is_empty() {
        tracing::warn!("No CSV files found in {}", dir.display());
    }

    Ok(files)
}

/// Returns true for absolute http(s) URLs with a host
pub fn validate_url(candidate: &str) -> bool {
    let Ok(url) = Url::parse(candidate) else {
        return false;
    };

    matches!(url.scheme(), "http" | "https")
        && url
            .host_str()
            .is_some_and(|host| !host.is_empty() && !host.starts_with('.'))
}

/// Reads the valid pairs of one CSV file
///
/// Cells are trimmed. The first row is taken as a header when its first cell
/// is not a valid URL. Rows without a selector or with an invalid URL are
/// skipped with a warning.
pub fn load_csv_file(path: &Path) -> Result<Vec<TargetPair>, InputError> {
    let csv_error = |source| InputError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut pairs = Vec::new();
    let mut first_row = true;

    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let line = record.position().map_or(0, |p| p.line());
        let url = record.get(0).unwrap_or("");
        let selector = record.get(1).unwrap_or("");

        if url.is_empty() && selector.is_empty() {
            continue;
        }

        if std::mem::take(&mut first_row) && !validate_url(url) {
            tracing::debug!("Treating {}:{} as a header row", file_name, line);
            continue;
        }

        if selector.is_empty() {
            tracing::warn!(
                "Missing CSS selector in {}:{} for URL '{}', skipping row",
                file_name,
                line,
                url
            );
            continue;
        }

        if !validate_url(url) {
            tracing::warn!("Invalid URL in {}:{}: '{}', skipping row", file_name, line, url);
            continue;
        }

        pairs.push((url.to_string(), selector.to_string()));
    }

    tracing::debug!("Loaded {} pair(s) from {}", pairs.len(), path.display());
    Ok(pairs)
}

/// Loads every CSV file in `dir`, keeping the first selector seen per URL
///
/// Unreadable files are logged and skipped.
pub fn load_all_valid_urls(dir: &Path) -> Result<Vec<TargetPair>, InputError> {
    let files = find_csv_files(dir)?;

    let mut seen = HashSet::new();
    let mut pairs = Vec::new();

    for file in &files {
        tracing::info!("Processing CSV file: {}", file.display());
        let rows = match load_csv_file(file) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("{}", e);
                continue;
            }
        };

        for (url, selector) in rows {
            if seen.insert(url.clone()) {
                pairs.push((url, selector));
            } else {
                tracing::debug!(
                    "Duplicate URL '{}' in {}, keeping the first selector",
                    url,
                    file.display()
                );
            }
        }
    }

    tracing::info!(
        "Loaded {} unique pair(s) from {} CSV file(s)",
        pairs.len(),
        files.len()
    );
    Ok(pairs)
}
