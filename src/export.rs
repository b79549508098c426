//! Plain-text export of a finished summary.

use crate::summary::SummaryResult;
use std::fs;
use std::path::Path;

/// Write the summary text to `path`, creating parent directories as needed
pub fn write_summary(result: &SummaryResult, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut text = result.text.clone();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    fs::write(path, text)
}
