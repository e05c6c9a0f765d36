use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{self, CommandReport};

#[derive(Debug, Parser)]
#[command(name = "newsarchive")]
#[command(about = "Browse and upload archived newspaper issues by year and month")]
#[command(version)]
struct Cli {
    /// Print the command report as JSON.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the year/month navigation menu.
    Menu {
        /// Click a year entry; repeat to click several in order.
        #[arg(long = "open", value_name = "YEAR")]
        open: Vec<i32>,
        /// Render as a narrow viewport where the menu starts collapsed.
        #[arg(long)]
        narrow: bool,
        /// Press the mobile menu toggle before rendering.
        #[arg(long)]
        toggle_menu: bool,
    },
    /// Interactive navigation driven by commands on stdin.
    Browse {
        #[arg(long)]
        narrow: bool,
    },
    /// Upload one issue PDF behind the shared passcode.
    Upload {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        file: Option<PathBuf>,
        /// Read from stdin when omitted.
        #[arg(long)]
        passcode: Option<String>,
    },
    /// Show resolved configuration with secrets redacted.
    Status,
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let report = match cli.command {
        Commands::Menu {
            open,
            narrow,
            toggle_menu,
        } => commands::menu::run(&commands::menu::MenuOptions {
            open,
            narrow,
            toggle_menu,
        })?,
        Commands::Browse { narrow } => {
            commands::browse::run(&commands::browse::BrowseOptions { narrow })?
        }
        Commands::Upload {
            year,
            month,
            file,
            passcode,
        } => commands::upload::run(&commands::upload::UploadOptions {
            year,
            month,
            file,
            passcode,
        })?,
        Commands::Status => commands::status::run()?,
    };

    print_report(&report, cli.json)?;
    if !report.ok {
        anyhow::bail!(
            "{} reported {} issue(s)",
            report.command,
            report.issues.len()
        );
    }
    Ok(())
}
