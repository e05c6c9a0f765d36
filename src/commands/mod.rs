pub mod browse;
pub mod menu;
pub mod status;
pub mod upload;

use serde::Serialize;

use crate::archive::config::ArchiveConfig;
use crate::archive::remote::HostedArchive;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }

    pub fn render_text(&self) -> String {
        let mut out = format!(
            "{}: {}\n",
            self.command,
            if self.ok { "ok" } else { "failed" }
        );
        for line in &self.details {
            out.push_str(line);
            out.push('\n');
        }
        for line in &self.issues {
            out.push_str(&format!("issue: {line}\n"));
        }
        out
    }
}

/// Build the hosted client, or record why it cannot be built.
pub fn connect(cfg: &ArchiveConfig, report: &mut CommandReport) -> Option<HostedArchive> {
    match HostedArchive::from_config(&cfg.remote) {
        Ok(service) => Some(service),
        Err(err) => {
            report.issue(format!("{err}; set it in the environment or the config file"));
            None
        }
    }
}
