//! Year → month navigation over the archive, fetched lazily.
//!
//! Years are loaded once per mount. Months for a year are fetched on the
//! first expansion of that year and then served from [`MonthIndex`] for the
//! rest of the session; nothing refreshes them unless [`MonthIndex::invalidate`]
//! is called. Remote failures are logged and rendered as "no data".

use crate::archive::cancel::CancelToken;
use crate::archive::locale::{Locale, Notice, month_label};
use crate::archive::remote::ArchiveService;
use crate::archive::warn;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearsState {
    /// Not loaded yet, or the load failed. Rendered as the loading placeholder.
    Loading,
    Loaded(Vec<i32>),
}

/// At most one year dropdown is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dropdown {
    Closed,
    Open(i32),
}

#[derive(Debug, Clone, Default)]
pub struct MonthIndex {
    by_year: BTreeMap<i32, Vec<u32>>,
}

impl MonthIndex {
    pub fn get(&self, year: i32) -> Option<&[u32]> {
        self.by_year.get(&year).map(Vec::as_slice)
    }

    pub fn contains(&self, year: i32) -> bool {
        self.by_year.contains_key(&year)
    }

    pub fn insert(&mut self, year: i32, months: Vec<u32>) {
        self.by_year.insert(year, months);
    }

    /// Forget the cached months of `year`; the next expansion queries again.
    pub fn invalidate(&mut self, year: i32) -> bool {
        self.by_year.remove(&year).is_some()
    }

    pub fn invalidate_all(&mut self) {
        self.by_year.clear();
    }

    pub fn cached_years(&self) -> impl Iterator<Item = i32> + '_ {
        self.by_year.keys().copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandOutcome {
    Opened { queried: bool },
    Closed,
    UnknownYear,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Viewport {
    #[default]
    Wide,
    Narrow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthLink {
    pub month: u32,
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearEntry {
    pub year: i32,
    pub open: bool,
    pub months: Vec<MonthLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuView {
    pub title: String,
    pub nav_visible: bool,
    pub placeholder: Option<String>,
    pub years: Vec<YearEntry>,
}

impl MenuView {
    pub fn to_lines(&self) -> Vec<String> {
        let mut out = vec![self.title.clone()];
        if !self.nav_visible {
            out.push("  [menu collapsed]".to_string());
            return out;
        }
        if let Some(placeholder) = &self.placeholder {
            out.push(format!("  {placeholder}"));
        }
        for entry in &self.years {
            let marker = if entry.open { "▾" } else { "▸" };
            out.push(format!("  {marker} {}", entry.year));
            for link in &entry.months {
                out.push(format!("      {} -> {}", link.label, link.href));
            }
        }
        out
    }
}

pub fn issue_link(prefix: &str, year: i32, month: u32) -> String {
    format!("{}/{year}/{month}", prefix.trim_end_matches('/'))
}

pub struct NavigationCatalog<S> {
    service: S,
    locale: Locale,
    link_prefix: String,
    years: YearsState,
    months: MonthIndex,
    dropdown: Dropdown,
    mobile_menu_open: bool,
    cancel: CancelToken,
}

impl<S: ArchiveService> NavigationCatalog<S> {
    pub fn new(service: S, locale: Locale, link_prefix: impl Into<String>) -> Self {
        Self {
            service,
            locale,
            link_prefix: link_prefix.into(),
            years: YearsState::Loading,
            months: MonthIndex::default(),
            dropdown: Dropdown::Closed,
            mobile_menu_open: false,
            cancel: CancelToken::new(),
        }
    }

    pub fn years(&self) -> &YearsState {
        &self.years
    }

    pub fn year_index(&self) -> &[i32] {
        match &self.years {
            YearsState::Loaded(years) => years,
            YearsState::Loading => &[],
        }
    }

    pub fn dropdown(&self) -> Dropdown {
        self.dropdown
    }

    pub fn months(&self) -> &MonthIndex {
        &self.months
    }

    pub fn months_mut(&mut self) -> &mut MonthIndex {
        &mut self.months
    }

    pub fn mobile_menu_open(&self) -> bool {
        self.mobile_menu_open
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Stop applying remote results; the view is gone.
    pub fn teardown(&self) {
        self.cancel.cancel();
    }

    /// Fetch the year index. Backend duplicates are kept; only the order is fixed.
    pub fn load_years(&mut self) {
        if self.cancel.is_cancelled() {
            return;
        }
        let result = self.service.list_distinct_years();
        if self.cancel.is_cancelled() {
            return;
        }
        match result {
            Ok(mut years) => {
                years.sort_unstable();
                self.years = YearsState::Loaded(years);
            }
            Err(err) => {
                warn::emit(err.code(), "catalog", "load-years", "", &err.to_string());
            }
        }
    }

    pub fn expand_year(&mut self, year: i32) -> ExpandOutcome {
        if self.cancel.is_cancelled() {
            return ExpandOutcome::Cancelled;
        }
        if self.dropdown == Dropdown::Open(year) {
            self.dropdown = Dropdown::Closed;
            return ExpandOutcome::Closed;
        }
        if !self.year_index().contains(&year) {
            return ExpandOutcome::UnknownYear;
        }

        self.dropdown = Dropdown::Open(year);
        if self.months.contains(year) {
            return ExpandOutcome::Opened { queried: false };
        }

        let result = self.service.list_distinct_months(year);
        if self.cancel.is_cancelled() {
            return ExpandOutcome::Cancelled;
        }
        match result {
            Ok(mut months) => {
                months.sort_unstable();
                self.months.insert(year, months);
            }
            Err(err) => {
                warn::emit(
                    err.code(),
                    "catalog",
                    "load-months",
                    &year.to_string(),
                    &err.to_string(),
                );
            }
        }
        ExpandOutcome::Opened { queried: true }
    }

    pub fn toggle_mobile_menu(&mut self) -> bool {
        self.mobile_menu_open = !self.mobile_menu_open;
        self.mobile_menu_open
    }

    /// Follow a rendered month link. Returns its path and closes the mobile menu.
    pub fn select_month(&mut self, year: i32, month: u32) -> Option<String> {
        if self.dropdown != Dropdown::Open(year) {
            return None;
        }
        let visible = self
            .months
            .get(year)
            .is_some_and(|months| months.contains(&month));
        if !visible {
            return None;
        }
        self.mobile_menu_open = false;
        Some(issue_link(&self.link_prefix, year, month))
    }

    pub fn render(&self, viewport: Viewport) -> MenuView {
        let nav_visible = match viewport {
            Viewport::Wide => true,
            Viewport::Narrow => self.mobile_menu_open,
        };
        let years = self.year_index();
        let placeholder = years
            .is_empty()
            .then(|| Notice::LoadingYears.text(self.locale).to_string());

        let entries = years
            .iter()
            .map(|&year| {
                let open = self.dropdown == Dropdown::Open(year);
                let months = match (open, self.months.get(year)) {
                    (true, Some(months)) => months
                        .iter()
                        .map(|&month| MonthLink {
                            month,
                            label: month_label(self.locale, month).into_owned(),
                            href: issue_link(&self.link_prefix, year, month),
                        })
                        .collect(),
                    _ => Vec::new(),
                };
                YearEntry { year, open, months }
            })
            .collect();

        MenuView {
            title: Notice::SiteTitle.text(self.locale).to_string(),
            nav_visible,
            placeholder,
            years: entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::remote::fake::FakeArchive;

    fn fake_with(years: Vec<i32>, months: &[(i32, Vec<u32>)]) -> FakeArchive {
        FakeArchive {
            years,
            months: months.iter().cloned().collect(),
            ..FakeArchive::default()
        }
    }

    fn catalog(fake: &FakeArchive) -> NavigationCatalog<&FakeArchive> {
        NavigationCatalog::new(fake, Locale::Hebrew, "/newspapers")
    }

    #[test]
    fn load_years_sorts_ascending() {
        let fake = fake_with(vec![2021, 2023, 2022], &[]);
        let mut nav = catalog(&fake);
        nav.load_years();
        assert_eq!(nav.year_index(), &[2021, 2022, 2023]);
        let rendered: Vec<i32> = nav.render(Viewport::Wide).years.iter().map(|e| e.year).collect();
        assert_eq!(rendered, vec![2021, 2022, 2023]);
    }

    #[test]
    fn load_years_passes_backend_duplicates_through() {
        let fake = fake_with(vec![2022, 2021, 2022], &[]);
        let mut nav = catalog(&fake);
        nav.load_years();
        assert_eq!(nav.year_index(), &[2021, 2022, 2022]);
    }

    #[test]
    fn failed_year_load_leaves_loading_placeholder() {
        let fake = FakeArchive {
            fail_years: true,
            ..FakeArchive::default()
        };
        let mut nav = catalog(&fake);
        nav.load_years();
        assert_eq!(nav.years(), &YearsState::Loading);
        let view = nav.render(Viewport::Wide);
        assert_eq!(view.placeholder.as_deref(), Some("טוען שנים..."));
        assert!(view.years.is_empty());
    }

    #[test]
    fn second_expansion_of_a_year_hits_the_cache() {
        let fake = fake_with(vec![2022], &[(2022, vec![3, 1])]);
        let mut nav = catalog(&fake);
        nav.load_years();

        assert_eq!(nav.expand_year(2022), ExpandOutcome::Opened { queried: true });
        assert_eq!(nav.months().get(2022), Some(&[1, 3][..]));
        assert_eq!(nav.expand_year(2022), ExpandOutcome::Closed);
        assert_eq!(nav.expand_year(2022), ExpandOutcome::Opened { queried: false });
        assert_eq!(fake.month_calls.borrow().as_slice(), &[2022]);
    }

    #[test]
    fn opening_another_year_closes_the_previous_one() {
        let fake = fake_with(vec![2021, 2022], &[(2021, vec![1]), (2022, vec![2])]);
        let mut nav = catalog(&fake);
        nav.load_years();

        nav.expand_year(2021);
        nav.expand_year(2022);
        assert_eq!(nav.dropdown(), Dropdown::Open(2022));

        let view = nav.render(Viewport::Wide);
        let open: Vec<i32> = view.years.iter().filter(|e| e.open).map(|e| e.year).collect();
        assert_eq!(open, vec![2022]);
        assert!(view.years[0].months.is_empty());
        assert_eq!(view.years[1].months[0].label, "פברואר");
        assert_eq!(view.years[1].months[0].href, "/newspapers/2022/2");
    }

    #[test]
    fn failed_month_load_opens_empty_dropdown_and_retries_next_time() {
        let mut fake = fake_with(vec![2022], &[(2022, vec![5])]);
        fake.fail_months = true;
        let mut nav = catalog(&fake);
        nav.load_years();

        assert_eq!(nav.expand_year(2022), ExpandOutcome::Opened { queried: true });
        assert!(!nav.months().contains(2022));
        assert!(nav.render(Viewport::Wide).years[0].months.is_empty());

        nav.expand_year(2022);
        nav.expand_year(2022);
        assert_eq!(fake.month_calls.borrow().len(), 2);
    }

    #[test]
    fn invalidate_forces_a_fresh_months_query() {
        let fake = fake_with(vec![2022], &[(2022, vec![1])]);
        let mut nav = catalog(&fake);
        nav.load_years();
        nav.expand_year(2022);
        nav.expand_year(2022);

        assert!(nav.months_mut().invalidate(2022));
        assert!(!nav.months_mut().invalidate(2022));
        assert_eq!(nav.expand_year(2022), ExpandOutcome::Opened { queried: true });
        assert_eq!(fake.month_calls.borrow().len(), 2);
    }

    #[test]
    fn expanding_an_unlisted_year_does_nothing() {
        let fake = fake_with(vec![2022], &[]);
        let mut nav = catalog(&fake);
        nav.load_years();
        assert_eq!(nav.expand_year(1999), ExpandOutcome::UnknownYear);
        assert_eq!(nav.dropdown(), Dropdown::Closed);
        assert!(fake.month_calls.borrow().is_empty());
    }

    #[test]
    fn selecting_a_month_closes_the_mobile_menu() {
        let fake = fake_with(vec![2024], &[(2024, vec![7])]);
        let mut nav = catalog(&fake);
        nav.load_years();
        assert!(nav.toggle_mobile_menu());
        assert!(nav.render(Viewport::Narrow).nav_visible);

        nav.expand_year(2024);
        assert_eq!(nav.select_month(2024, 7).as_deref(), Some("/newspapers/2024/7"));
        assert!(!nav.mobile_menu_open());
        assert!(!nav.render(Viewport::Narrow).nav_visible);
        assert!(nav.render(Viewport::Wide).nav_visible);
    }

    #[test]
    fn selecting_a_hidden_month_is_ignored() {
        let fake = fake_with(vec![2024], &[(2024, vec![7])]);
        let mut nav = catalog(&fake);
        nav.load_years();
        nav.toggle_mobile_menu();
        assert_eq!(nav.select_month(2024, 7), None);
        nav.expand_year(2024);
        assert_eq!(nav.select_month(2024, 8), None);
        assert!(nav.mobile_menu_open());
    }

    #[test]
    fn results_arriving_after_teardown_are_dropped() {
        let fake = fake_with(vec![2021], &[(2021, vec![1])]);
        let mut nav = catalog(&fake);
        let token = nav.cancel_token();
        *fake.on_call.borrow_mut() = Some(Box::new(move || token.cancel()));

        nav.load_years();
        assert_eq!(fake.year_calls.get(), 1);
        assert_eq!(nav.years(), &YearsState::Loading);

        nav.load_years();
        assert_eq!(fake.year_calls.get(), 1);
    }

    #[test]
    fn month_labels_fall_back_to_numbers() {
        let fake = fake_with(vec![2020], &[(2020, vec![0, 13])]);
        let mut nav = NavigationCatalog::new(&fake, Locale::English, "/issues/");
        nav.load_years();
        nav.expand_year(2020);
        let view = nav.render(Viewport::Wide);
        let labels: Vec<&str> = view.years[0].months.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["0", "13"]);
        assert_eq!(view.years[0].months[1].href, "/issues/2020/13");
        assert_eq!(view.title, "Bnei Yosef Network");
    }
}
