//! CLI command implementations

pub mod apply;
pub mod hdr10plus;
pub mod parse;
pub mod template;

use anyhow::{Context, Result, bail};
use grain_bitstream::{T35Payload, split_t35};
use serde::Serialize;
use std::path::Path;

/// Reads a whole payload file.
pub fn read_payload(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read: {}", path.display()))
}

/// Renders `value` as pretty JSON or YAML.
pub fn render<T: Serialize>(value: &T, json: bool) -> Result<String> {
    if json {
        let mut s = serde_json::to_string_pretty(value).context("Failed to encode JSON")?;
        s.push('\n');
        Ok(s)
    } else {
        serde_yaml::to_string(value).context("Failed to encode YAML")
    }
}

/// Strips a T.35 header, requiring the AOM film grain provider.
pub fn afgs1_body(data: &[u8]) -> Result<&[u8]> {
    match split_t35(data).context("Invalid T.35 header")? {
        T35Payload::AomFilmGrain(body) => Ok(body),
        T35Payload::HdrPlus(_) => bail!("T.35 payload carries HDR10+ metadata, not film grain"),
        T35Payload::Unknown {
            country_code,
            provider_code,
        } => bail!(
            "Unsupported T.35 payload: country 0x{:02X}, provider 0x{:04X}",
            country_code,
            provider_code
        ),
    }
}
