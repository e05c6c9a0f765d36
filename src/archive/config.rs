use crate::archive::locale::Locale;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: String,
    pub table: String,
    pub bucket: String,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            table: "newspapers".to_string(),
            bucket: "newspapers".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Shared static passcode gating the upload form. Not a credential.
    pub passcode: String,
    pub first_year: i32,
    pub year_count: u32,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            passcode: String::new(),
            first_year: 2020,
            year_count: 21,
        }
    }
}

pub const MAX_YEAR_COUNT: u32 = 1000;

impl UploadConfig {
    /// Last year the picker offers, or `None` when the window is empty or
    /// does not fit in an `i32`.
    pub fn last_year(&self) -> Option<i32> {
        let span = i32::try_from(self.year_count.checked_sub(1)?).ok()?;
        self.first_year.checked_add(span)
    }

    pub fn year_options(&self) -> Vec<i32> {
        match self.last_year() {
            Some(last) => (self.first_year..=last).collect(),
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub locale: String,
    pub link_prefix: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            locale: Locale::Hebrew.code().to_string(),
            link_prefix: "/newspapers".to_string(),
        }
    }
}

impl DisplayConfig {
    pub fn locale(&self) -> Locale {
        Locale::parse(&self.locale).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArchiveConfig {
    pub remote: RemoteConfig,
    pub upload: UploadConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialArchiveConfig {
    remote: Option<RemoteConfig>,
    upload: Option<UploadConfig>,
    display: Option<DisplayConfig>,
}

fn env_or_u64(var: &str, fallback: u64) -> u64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_u32(var: &str, fallback: u32) -> u32 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u32>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_i32(var: &str, fallback: i32) -> i32 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<i32>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

/// The passcode is compared verbatim, so only surrounding newlines are dropped.
fn env_or_secret(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.is_empty() => v.trim_end_matches(['\r', '\n']).to_string(),
        _ => fallback.to_string(),
    }
}

fn validate(cfg: &ArchiveConfig) -> Result<()> {
    if cfg.remote.timeout_secs == 0 {
        return Err(anyhow!("invalid remote timeout: must be >= 1 second"));
    }
    if cfg.remote.table.trim().is_empty() {
        return Err(anyhow!("invalid remote table: cannot be empty"));
    }
    if cfg.remote.bucket.trim().is_empty() {
        return Err(anyhow!("invalid storage bucket: cannot be empty"));
    }
    if cfg.upload.year_count == 0 || cfg.upload.year_count > MAX_YEAR_COUNT {
        return Err(anyhow!(
            "invalid upload year count: require 1 <= count <= {MAX_YEAR_COUNT}"
        ));
    }
    if cfg.upload.last_year().is_none() {
        return Err(anyhow!(
            "invalid upload year window: {} plus {} years overflows",
            cfg.upload.first_year,
            cfg.upload.year_count
        ));
    }
    Locale::parse(&cfg.display.locale)?;
    if !cfg.display.link_prefix.starts_with('/') {
        return Err(anyhow!("invalid link prefix: must start with `/`"));
    }
    Ok(())
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var("NEWSARCHIVE_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let home = dirs::home_dir()?;
    Some(home.join(".newsarchive").join("newsarchive.toml"))
}

fn merge_file_config(base: &mut ArchiveConfig) -> Result<Option<PathBuf>> {
    let Some(path) = resolve_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(&path)?;
    let parsed: PartialArchiveConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse archive config {}: {err}", path.display()))?;
    if let Some(remote) = parsed.remote {
        base.remote = remote;
    }
    if let Some(upload) = parsed.upload {
        base.upload = upload;
    }
    if let Some(display) = parsed.display {
        base.display = display;
    }
    Ok(Some(path))
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ArchiveConfig,
    pub source_file: Option<PathBuf>,
}

pub fn load_config_with_source() -> Result<LoadedConfig> {
    let mut cfg = ArchiveConfig::default();
    let source_file = merge_file_config(&mut cfg)?;

    cfg.remote.base_url = env_or_string("NEWSARCHIVE_BASE_URL", &cfg.remote.base_url);
    cfg.remote.api_key = env_or_string("NEWSARCHIVE_API_KEY", &cfg.remote.api_key);
    cfg.remote.table = env_or_string("NEWSARCHIVE_TABLE", &cfg.remote.table);
    cfg.remote.bucket = env_or_string("NEWSARCHIVE_BUCKET", &cfg.remote.bucket);
    cfg.remote.timeout_secs = env_or_u64("NEWSARCHIVE_TIMEOUT_SECS", cfg.remote.timeout_secs);
    cfg.upload.passcode = env_or_secret("NEWSARCHIVE_UPLOAD_PASSCODE", &cfg.upload.passcode);
    cfg.upload.first_year = env_or_i32("NEWSARCHIVE_FIRST_YEAR", cfg.upload.first_year);
    cfg.upload.year_count = env_or_u32("NEWSARCHIVE_YEAR_COUNT", cfg.upload.year_count);
    cfg.display.locale = env_or_string("NEWSARCHIVE_LOCALE", &cfg.display.locale);
    cfg.display.link_prefix = env_or_string("NEWSARCHIVE_LINK_PREFIX", &cfg.display.link_prefix);

    validate(&cfg)?;
    Ok(LoadedConfig {
        config: cfg,
        source_file,
    })
}

pub fn load_config() -> Result<ArchiveConfig> {
    Ok(load_config_with_source()?.config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_site_layout() {
        let cfg = ArchiveConfig::default();
        assert_eq!(cfg.remote.table, "newspapers");
        assert_eq!(cfg.remote.bucket, "newspapers");
        assert_eq!(cfg.display.locale(), Locale::Hebrew);
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn year_options_span_the_configured_window() {
        let cfg = UploadConfig::default();
        let years = cfg.year_options();
        assert_eq!(years.len(), 21);
        assert_eq!(years.first(), Some(&2020));
        assert_eq!(years.last(), Some(&2040));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = ArchiveConfig::default();
        cfg.remote.timeout_secs = 0;
        assert!(validate(&cfg).is_err());

        let mut cfg = ArchiveConfig::default();
        cfg.display.locale = "xx".to_string();
        assert!(validate(&cfg).is_err());

        let mut cfg = ArchiveConfig::default();
        cfg.display.link_prefix = "newspapers".to_string();
        assert!(validate(&cfg).is_err());

        let mut cfg = ArchiveConfig::default();
        cfg.upload.first_year = i32::MAX;
        assert!(validate(&cfg).is_err());
        assert!(cfg.upload.year_options().is_empty());

        let mut cfg = ArchiveConfig::default();
        cfg.upload.year_count = 3_000_000_000;
        assert!(validate(&cfg).is_err());

        let mut cfg = ArchiveConfig::default();
        cfg.upload.year_count = MAX_YEAR_COUNT + 1;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn year_window_may_end_exactly_at_i32_max() {
        let cfg = UploadConfig {
            passcode: String::new(),
            first_year: i32::MAX - 1,
            year_count: 2,
        };
        assert_eq!(cfg.last_year(), Some(i32::MAX));
        assert_eq!(cfg.year_options(), vec![i32::MAX - 1, i32::MAX]);
    }

    #[test]
    fn partial_file_config_keeps_section_defaults() {
        let parsed: PartialArchiveConfig = toml::from_str(
            r#"
            [remote]
            base_url = "https://archive.example.test"
            "#,
        )
        .expect("parse");
        let remote = parsed.remote.expect("remote section");
        assert_eq!(remote.base_url, "https://archive.example.test");
        assert_eq!(remote.table, "newspapers");
        assert_eq!(remote.timeout_secs, 30);
        assert!(parsed.upload.is_none());
    }
}
