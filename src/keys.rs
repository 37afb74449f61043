//! Row key list files.

use anyhow::Context;
use row_types::{decode_bytes, RowKey};
use std::path::Path;

/// Parse a key list: one key per line, surrounding whitespace trimmed,
/// blank lines skipped. Binary keys may be given as `base64:<payload>`.
pub fn parse_rowkeys(content: &str) -> anyhow::Result<Vec<RowKey>> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(line_no, line)| {
            decode_bytes(line)
                .map(RowKey::from)
                .with_context(|| format!("Invalid row key on line {line_no}"))
        })
        .collect()
}

/// Load a key list file. An empty file is an error.
pub async fn load_rowkeys(path: &Path) -> anyhow::Result<Vec<RowKey>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read row key file {}", path.display()))?;

    let keys = parse_rowkeys(&content)
        .with_context(|| format!("Failed to parse row key file {}", path.display()))?;
    if keys.is_empty() {
        anyhow::bail!("No row keys found in {}", path.display());
    }

    tracing::info!("Loaded {} row keys from {}", keys.len(), path.display());
    Ok(keys)
}
