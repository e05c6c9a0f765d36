use anyhow::Result;
use std::io::{self, BufRead, Write};

use crate::archive::catalog::{ExpandOutcome, NavigationCatalog, Viewport};
use crate::archive::config::load_config;
use crate::archive::remote::ArchiveService;
use crate::commands::{CommandReport, connect};

#[derive(Debug, Clone, Default)]
pub struct BrowseOptions {
    pub narrow: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseEvent {
    Open(i32),
    Select(i32, u32),
    Toggle,
    Refresh(Option<i32>),
    Show,
    Quit,
}

const HELP: &str = "commands: open <year> | select <year> <month> | toggle | refresh [year] | show | quit";

fn parse_arg<T: std::str::FromStr>(token: Option<&str>, what: &str) -> Result<T, String> {
    token
        .ok_or_else(|| format!("missing {what}"))?
        .parse::<T>()
        .map_err(|_| format!("invalid {what}"))
}

pub fn parse_event(line: &str) -> Result<BrowseEvent, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Err(HELP.to_string());
    };
    let event = match verb.to_ascii_lowercase().as_str() {
        "open" => BrowseEvent::Open(parse_arg(parts.next(), "year")?),
        "select" => {
            let year = parse_arg(parts.next(), "year")?;
            let month = parse_arg(parts.next(), "month")?;
            BrowseEvent::Select(year, month)
        }
        "toggle" => BrowseEvent::Toggle,
        "refresh" => match parts.next() {
            None => BrowseEvent::Refresh(None),
            year => BrowseEvent::Refresh(Some(parse_arg(year, "year")?)),
        },
        "show" => BrowseEvent::Show,
        "quit" | "exit" => BrowseEvent::Quit,
        _ => return Err(HELP.to_string()),
    };
    Ok(event)
}

fn print_menu<S: ArchiveService, W: Write>(
    catalog: &NavigationCatalog<S>,
    viewport: Viewport,
    out: &mut W,
) -> io::Result<()> {
    for line in catalog.render(viewport).to_lines() {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Feed stdin-style events into the catalog until `quit` or end of input.
/// Returns how many events were applied.
pub fn run_loop<S, R, W>(
    catalog: &mut NavigationCatalog<S>,
    viewport: Viewport,
    input: R,
    out: &mut W,
) -> Result<usize>
where
    S: ArchiveService,
    R: BufRead,
    W: Write,
{
    print_menu(catalog, viewport, out)?;
    let mut applied = 0usize;
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event = match parse_event(&line) {
            Ok(event) => event,
            Err(msg) => {
                writeln!(out, "{msg}")?;
                continue;
            }
        };
        applied += 1;
        match event {
            BrowseEvent::Quit => break,
            BrowseEvent::Open(year) => {
                if catalog.expand_year(year) == ExpandOutcome::UnknownYear {
                    writeln!(out, "year {year} is not in the archive")?;
                }
            }
            BrowseEvent::Select(year, month) => match catalog.select_month(year, month) {
                Some(link) => writeln!(out, "navigate: {link}")?,
                None => writeln!(out, "no visible link for {year}/{month}")?,
            },
            BrowseEvent::Toggle => {
                catalog.toggle_mobile_menu();
            }
            BrowseEvent::Refresh(Some(year)) => {
                catalog.months_mut().invalidate(year);
            }
            BrowseEvent::Refresh(None) => {
                catalog.months_mut().invalidate_all();
                catalog.load_years();
            }
            BrowseEvent::Show => {}
        }
        print_menu(catalog, viewport, out)?;
    }
    catalog.teardown();
    Ok(applied)
}

pub fn run(opts: &BrowseOptions) -> Result<CommandReport> {
    let cfg = load_config()?;
    let mut report = CommandReport::new("browse");
    let Some(service) = connect(&cfg, &mut report) else {
        return Ok(report);
    };

    let mut catalog =
        NavigationCatalog::new(service, cfg.display.locale(), cfg.display.link_prefix.clone());
    catalog.load_years();

    let viewport = if opts.narrow {
        Viewport::Narrow
    } else {
        Viewport::Wide
    };
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let applied = run_loop(&mut catalog, viewport, stdin.lock(), &mut stdout)?;
    report.detail(format!("events={applied}"));
    report.detail(format!(
        "cached_years={}",
        catalog
            .months()
            .cached_years()
            .map(|y| y.to_string())
            .collect::<Vec<_>>()
            .join(",")
    ));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::locale::Locale;
    use crate::archive::remote::fake::FakeArchive;
    use std::io::Cursor;

    #[test]
    fn parse_event_reads_each_command() {
        assert_eq!(parse_event("open 2022"), Ok(BrowseEvent::Open(2022)));
        assert_eq!(parse_event("SELECT 2022 4"), Ok(BrowseEvent::Select(2022, 4)));
        assert_eq!(parse_event("refresh"), Ok(BrowseEvent::Refresh(None)));
        assert_eq!(parse_event("refresh 2021"), Ok(BrowseEvent::Refresh(Some(2021))));
        assert_eq!(parse_event("toggle"), Ok(BrowseEvent::Toggle));
        assert!(parse_event("open").is_err());
        assert!(parse_event("select 2022 -1").is_err());
        assert!(parse_event("dance").is_err());
    }

    #[test]
    fn parse_event_rejects_out_of_range_and_malformed_years() {
        assert_eq!(
            parse_event("open 4294969318"),
            Err("invalid year".to_string())
        );
        assert_eq!(
            parse_event("select 2022 4294967297"),
            Err("invalid month".to_string())
        );
        assert_eq!(parse_event("refresh abc"), Err("invalid year".to_string()));
        assert_eq!(parse_event("refresh   "), Ok(BrowseEvent::Refresh(None)));
    }

    #[test]
    fn loop_applies_events_and_stops_at_quit() {
        let fake = FakeArchive {
            years: vec![2023, 2022],
            months: [(2022, vec![1, 2])].into_iter().collect(),
            ..FakeArchive::default()
        };
        let mut catalog = NavigationCatalog::new(&fake, Locale::English, "/newspapers");
        catalog.load_years();

        let input = Cursor::new("open 2022\nselect 2022 2\nbogus\nquit\nopen 2023\n");
        let mut out = Vec::new();
        let applied = run_loop(&mut catalog, Viewport::Wide, input, &mut out).expect("loop");

        assert_eq!(applied, 3);
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("February -> /newspapers/2022/2"));
        assert!(text.contains("navigate: /newspapers/2022/2"));
        assert!(text.contains("commands:"));
        assert_eq!(fake.month_calls.borrow().as_slice(), &[2022]);
        assert!(catalog.cancel_token().is_cancelled());
    }

    #[test]
    fn refresh_year_requeries_on_next_open() {
        let fake = FakeArchive {
            years: vec![2022],
            months: [(2022, vec![1])].into_iter().collect(),
            ..FakeArchive::default()
        };
        let mut catalog = NavigationCatalog::new(&fake, Locale::Hebrew, "/newspapers");
        catalog.load_years();

        let input = Cursor::new("open 2022\nopen 2022\nrefresh 2022\nopen 2022\n");
        let mut out = Vec::new();
        run_loop(&mut catalog, Viewport::Wide, input, &mut out).expect("loop");
        assert_eq!(fake.month_calls.borrow().len(), 2);
    }
}
