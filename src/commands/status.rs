use anyhow::Result;
use std::env;

use crate::archive::audit::audit_log_path;
use crate::archive::config::load_config_with_source;
use crate::archive::paths::resolve_paths;
use crate::archive::util::redact;
use crate::commands::CommandReport;

mod generated {
    include!(concat!(env!("OUT_DIR"), "/env_allowlist.rs"));
}

pub fn known_env_keys() -> &'static [&'static str] {
    generated::GENERATED_ENV_ALLOWLIST
}

pub fn run() -> Result<CommandReport> {
    let loaded = load_config_with_source()?;
    let cfg = &loaded.config;
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("status");

    report.detail(format!("build_id={}", env!("BUILD_UUID")));
    report.detail(format!(
        "config_file={}",
        loaded
            .source_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".to_string())
    ));
    report.detail(format!("remote.base_url={}", cfg.remote.base_url));
    report.detail(format!("remote.api_key={}", redact(&cfg.remote.api_key)));
    report.detail(format!("remote.table={}", cfg.remote.table));
    report.detail(format!("remote.bucket={}", cfg.remote.bucket));
    report.detail(format!("remote.timeout_secs={}", cfg.remote.timeout_secs));
    report.detail(format!("upload.passcode={}", redact(&cfg.upload.passcode)));
    report.detail(format!(
        "upload.years={}..={}",
        cfg.upload.first_year,
        cfg.upload.last_year().unwrap_or(cfg.upload.first_year)
    ));
    report.detail(format!("display.locale={}", cfg.display.locale().code()));
    report.detail(format!("display.link_prefix={}", cfg.display.link_prefix));
    report.detail(format!("archive_home={}", paths.archive_home.display()));
    report.detail(format!("audit_log={}", audit_log_path(&paths).display()));

    let set_keys: Vec<&str> = known_env_keys()
        .iter()
        .copied()
        .filter(|key| env::var_os(key).is_some())
        .collect();
    report.detail(format!("env.set={}", set_keys.join(",")));

    if cfg.remote.base_url.trim().is_empty() {
        report.issue("remote base URL missing (NEWSARCHIVE_BASE_URL or [remote].base_url)");
    }
    if cfg.upload.passcode.is_empty() {
        report.issue("upload passcode missing (NEWSARCHIVE_UPLOAD_PASSCODE or [upload].passcode)");
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::known_env_keys;

    #[test]
    fn allowlist_covers_the_documented_keys() {
        let keys = known_env_keys();
        for key in [
            "NEWSARCHIVE_BASE_URL",
            "NEWSARCHIVE_API_KEY",
            "NEWSARCHIVE_UPLOAD_PASSCODE",
            "NEWSARCHIVE_CONFIG_PATH",
            "NEWSARCHIVE_HOME",
        ] {
            assert!(keys.contains(&key), "missing {key}");
        }
        assert!(!keys.contains(&"NEWSARCHIVE_WARN"));
    }
}
