use anyhow::Result;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_epoch_secs() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Milliseconds since the epoch, used to keep storage keys unique.
pub fn now_epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Show that a secret is set without echoing it.
pub fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "unset" } else { "set" }
}

#[cfg(test)]
mod tests {
    use super::redact;

    #[test]
    fn redact_never_echoes_the_value() {
        assert_eq!(redact(""), "unset");
        assert_eq!(redact("1234"), "set");
    }
}
