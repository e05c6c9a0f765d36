use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::archive::config::load_config;
use crate::archive::locale::Notice;
use crate::archive::paths::resolve_paths;
use crate::archive::upload::{PickedFile, SubmitOutcome, UploadFlow};
use crate::commands::{CommandReport, connect};

#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub file: Option<PathBuf>,
    pub passcode: Option<String>,
}

fn prompt_passcode() -> Result<String> {
    eprint!("passcode: ");
    io::stderr().flush().ok();
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read passcode from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub fn run(opts: &UploadOptions) -> Result<CommandReport> {
    let cfg = load_config()?;
    let paths = resolve_paths()?;
    let locale = cfg.display.locale();
    let mut report = CommandReport::new("upload");
    let Some(service) = connect(&cfg, &mut report) else {
        return Ok(report);
    };

    let mut flow = UploadFlow::new(
        service,
        cfg.upload.passcode.clone(),
        cfg.upload.year_options(),
        locale,
    )
    .with_audit(paths);

    let entered = match &opts.passcode {
        Some(passcode) => passcode.clone(),
        None => prompt_passcode()?,
    };
    if !flow.login(&entered) {
        report.issue(Notice::WrongPasscode.text(locale));
        return Ok(report);
    }

    if let Some(year) = opts.year
        && !flow.select_year(year)
    {
        report.detail(format!(
            "year {year} is outside the offered range {}..={}",
            cfg.upload.first_year,
            cfg.upload.last_year().unwrap_or(cfg.upload.first_year)
        ));
    }
    if let Some(month) = opts.month
        && !flow.select_month(month)
    {
        report.detail(format!("month {month} is not between 1 and 12"));
    }
    if let Some(path) = &opts.file {
        match PickedFile::pick(path) {
            Ok(file) => {
                report.detail(format!("file={} bytes={}", file.name(), file.len()));
                flow.choose_file(file);
            }
            Err(err) => report.detail(format!("{err:#}")),
        }
    }

    if !flow.can_submit() {
        report.issue("upload form is not accepting submissions");
        return Ok(report);
    }
    let outcome = flow.submit();
    let status = flow.status_text().unwrap_or_default();
    match &outcome {
        SubmitOutcome::Uploaded { path, issue } => {
            report.detail(status);
            report.detail(format!("storage_path={path}"));
            report.detail(format!("file_url={}", issue.file_url));
        }
        SubmitOutcome::SaveFailed { orphaned_path } => {
            report.issue(status);
            report.issue(format!("orphaned_object={orphaned_path}"));
        }
        SubmitOutcome::Locked | SubmitOutcome::Busy | SubmitOutcome::Cancelled => {
            report.issue(format!("upload not submitted ({outcome:?})"));
        }
        SubmitOutcome::MissingFields => {
            report.issue(status);
            let years = flow.year_options();
            if let (Some(first), Some(last)) = (years.first(), years.last()) {
                report.detail(format!("years offered: {first}..={last}"));
            }
            let months = flow
                .month_options()
                .into_iter()
                .map(|(n, label)| format!("{n}={label}"))
                .collect::<Vec<_>>();
            report.detail(format!("months offered: {}", months.join(", ")));
        }
        SubmitOutcome::UploadFailed => {
            report.issue(status);
        }
    }
    flow.teardown();
    Ok(report)
}
