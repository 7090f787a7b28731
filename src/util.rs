use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use filing_items::ExtractorConfig;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Debug, Clone)]
pub struct FilingSource {
    pub path: PathBuf,
    pub html: String,
    pub sha256: String,
}

pub fn read_filing(path: &Path) -> Result<FilingSource> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read filing: {}", path.display()))?;

    Ok(FilingSource {
        path: path.to_path_buf(),
        sha256: sha256_hex(&bytes),
        html: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

pub fn load_config(path: Option<&Path>) -> Result<ExtractorConfig> {
    let Some(path) = path else {
        return Ok(ExtractorConfig::default());
    };

    let raw = fs::read(path).with_context(|| format!("failed to read config: {}", path.display()))?;
    serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;

    let mut file = File::create(path)
        .with_context(|| format!("failed to create json file: {}", path.display()))?;
    file.write_all(&data)
        .with_context(|| format!("failed to write json file: {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("failed to finalize json file: {}", path.display()))?;

    Ok(())
}

pub fn emit_json<T: Serialize>(output: Option<&Path>, value: &T) -> Result<()> {
    if let Some(path) = output {
        write_json_pretty(path, value)?;
        info!(path = %path.display(), "wrote json output");
        return Ok(());
    }

    let data = serde_json::to_string_pretty(value).context("failed to serialize json")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{data}").context("failed to write json to stdout")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_matches_known_digest() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn missing_config_path_means_defaults() {
        let config = load_config(None).expect("defaults should load");
        assert_eq!(config, ExtractorConfig::default());
    }
}
