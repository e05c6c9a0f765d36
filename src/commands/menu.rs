use anyhow::Result;

use crate::archive::catalog::{ExpandOutcome, NavigationCatalog, Viewport};
use crate::archive::config::load_config;
use crate::commands::{CommandReport, connect};

#[derive(Debug, Clone, Default)]
pub struct MenuOptions {
    pub open: Vec<i32>,
    pub narrow: bool,
    pub toggle_menu: bool,
}

pub fn run(opts: &MenuOptions) -> Result<CommandReport> {
    let cfg = load_config()?;
    let mut report = CommandReport::new("menu");
    let Some(service) = connect(&cfg, &mut report) else {
        return Ok(report);
    };

    let mut catalog =
        NavigationCatalog::new(service, cfg.display.locale(), cfg.display.link_prefix.clone());
    catalog.load_years();
    if opts.toggle_menu {
        catalog.toggle_mobile_menu();
    }
    for &year in &opts.open {
        if catalog.expand_year(year) == ExpandOutcome::UnknownYear {
            report.detail(format!("year {year} is not in the archive"));
        }
    }

    let viewport = if opts.narrow {
        Viewport::Narrow
    } else {
        Viewport::Wide
    };
    for line in catalog.render(viewport).to_lines() {
        report.detail(line);
    }
    Ok(report)
}
