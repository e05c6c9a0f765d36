use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ArchivePaths {
    pub archive_home: PathBuf,
    pub logs_dir: PathBuf,
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<ArchivePaths> {
    let home = required_home_dir()?;
    let archive_home = env_or_default_path("NEWSARCHIVE_HOME", home.join(".newsarchive"));
    let logs_dir = env_or_default_path("NEWSARCHIVE_LOGS_DIR", archive_home.join("logs"));

    Ok(ArchivePaths {
        archive_home,
        logs_dir,
    })
}
