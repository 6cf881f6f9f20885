//! In-memory rendered table for tests.
//!
//! [`SimulatedTablePage`] is a [`PageDriver`] that behaves like a sortable,
//! paginated table page honouring a [`TableContract`]: clicking a header
//! cycles its sort state and re-orders the rows, the page-size control opens
//! a list of options, and clicking a row opens a detail page for that value.
//! Defects can be switched on to exercise every failure path of the engine.

use crate::driver::PageDriver;
use crate::locator::{Selector, TableContract};
use crate::result::{TableCheckError, TableCheckResult};
use crate::schema::ColumnSpec;
use crate::sort::{SortDirection, SortState};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    Blank,
    Table,
    Detail(String),
    Other(String),
}

#[derive(Debug, Default)]
struct Defects {
    unsorted_columns: HashSet<String>,
    frozen_sort_columns: HashSet<String>,
    lagging_sort_columns: HashMap<String, usize>,
    hidden_rows: usize,
    lagging_reads: usize,
    cell_overrides: HashMap<(String, String), String>,
    broken_links: HashSet<String>,
    unreadable_hrefs: HashSet<String>,
    reset_page_size_on_return: bool,
    unreachable: bool,
}

#[derive(Debug)]
struct PageState {
    url: String,
    contract: TableContract,
    columns: Vec<ColumnSpec>,
    header_names: HashMap<String, String>,
    identifier: String,
    rows: Vec<HashMap<String, String>>,
    order: Vec<usize>,
    sorted_by: Option<(String, SortDirection)>,
    /// Column, attribute it still reports, reads left
    stale_sort: Option<(String, String, usize)>,
    page_size_options: Vec<usize>,
    page_size: usize,
    dropdown_open: bool,
    location: Location,
    history: Vec<String>,
    closed: bool,
    defects: Defects,
}

/// Simulated table page; clones share the same page state
#[derive(Debug, Clone)]
pub struct SimulatedTablePage {
    state: Rc<RefCell<PageState>>,
}

impl SimulatedTablePage {
    /// Create an empty table at `url` with the given columns.
    ///
    /// The first column is the row identifier.
    #[must_use]
    pub fn new(url: impl Into<String>, columns: Vec<ColumnSpec>) -> Self {
        let identifier = columns.first().map(|c| c.key.clone()).unwrap_or_default();
        let header_names = columns
            .iter()
            .map(|c| (c.key.clone(), c.name.clone()))
            .collect();
        let page_size_options = crate::context::DEFAULT_PAGE_SIZE_OPTIONS.to_vec();
        Self {
            state: Rc::new(RefCell::new(PageState {
                url: url.into(),
                contract: TableContract::default(),
                columns,
                header_names,
                identifier,
                rows: Vec::new(),
                order: Vec::new(),
                sorted_by: None,
                stale_sort: None,
                page_size: page_size_options[0],
                page_size_options,
                dropdown_open: false,
                location: Location::Blank,
                history: Vec::new(),
                closed: false,
                defects: Defects::default(),
            })),
        }
    }

    fn configure(self, f: impl FnOnce(&mut PageState)) -> Self {
        f(&mut self.state.borrow_mut());
        self
    }

    /// Append one row of `(column key, rendered text)` pairs
    #[must_use]
    pub fn with_row<K, V>(self, cells: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let row = cells
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.configure(|s| {
            s.order.push(s.rows.len());
            s.rows.push(row);
        })
    }

    /// Append several rows
    #[must_use]
    pub fn with_rows<R, K, V>(self, rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        rows.into_iter().fold(self, |page, row| page.with_row(row))
    }

    /// Use a different rendered-table contract
    #[must_use]
    pub fn with_contract(self, contract: TableContract) -> Self {
        self.configure(|s| s.contract = contract)
    }

    /// Offer different page-size options; the first is selected initially
    #[must_use]
    pub fn with_page_size_options(self, options: Vec<usize>) -> Self {
        self.configure(|s| {
            s.page_size = options.first().copied().unwrap_or(0);
            s.page_size_options = options;
        })
    }

    /// Render a different header text for a column
    #[must_use]
    pub fn with_header_name(self, key: &str, name: &str) -> Self {
        self.configure(|s| {
            s.header_names.insert(key.to_string(), name.to_string());
        })
    }

    /// Header clicks on `key` update the sort state but leave the rows alone
    #[must_use]
    pub fn with_unsorted_column(self, key: &str) -> Self {
        self.configure(|s| {
            s.defects.unsorted_columns.insert(key.to_string());
        })
    }

    /// Header clicks on `key` never change its reported sort state
    #[must_use]
    pub fn with_frozen_sort_state(self, key: &str) -> Self {
        self.configure(|s| {
            s.defects.frozen_sort_columns.insert(key.to_string());
        })
    }

    /// After a header click on `key`, the next `reads` sort-attribute reads
    /// still report the state from before the click
    #[must_use]
    pub fn with_lagging_sort_state(self, key: &str, reads: usize) -> Self {
        self.configure(|s| {
            s.defects.lagging_sort_columns.insert(key.to_string(), reads);
        })
    }

    /// Never render the last `count` rows
    #[must_use]
    pub fn with_hidden_rows(self, count: usize) -> Self {
        self.configure(|s| s.defects.hidden_rows = count)
    }

    /// The first `reads` cell reads return one row fewer than rendered
    #[must_use]
    pub fn with_lagging_reads(self, reads: usize) -> Self {
        self.configure(|s| s.defects.lagging_reads = reads)
    }

    /// Render `text` instead of the real cell of row `row_id`
    #[must_use]
    pub fn with_cell_override(self, row_id: &str, key: &str, text: &str) -> Self {
        self.configure(|s| {
            s.defects
                .cell_overrides
                .insert((row_id.to_string(), key.to_string()), text.to_string());
        })
    }

    /// The detail page of `value` does not mention it
    #[must_use]
    pub fn with_broken_link(self, value: &str) -> Self {
        self.configure(|s| {
            s.defects.broken_links.insert(value.to_string());
        })
    }

    /// The link in the row of `value` has no readable `href`
    #[must_use]
    pub fn with_unreadable_href(self, value: &str) -> Self {
        self.configure(|s| {
            s.defects.unreadable_hrefs.insert(value.to_string());
        })
    }

    /// Returning from a detail page resets the page size
    #[must_use]
    pub fn with_page_size_reset_on_return(self) -> Self {
        self.configure(|s| s.defects.reset_page_size_on_return = true)
    }

    /// Navigating to the table URL fails
    #[must_use]
    pub fn with_unreachable_table(self) -> Self {
        self.configure(|s| s.defects.unreachable = true)
    }

    /// Selected page size
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.state.borrow().page_size
    }

    /// Every URL navigated to, in order
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state.borrow().history.clone()
    }

    /// Sort state a header currently reports
    #[must_use]
    pub fn sort_state(&self, key: &str) -> SortState {
        let state = self.state.borrow();
        SortState::from_attribute(Some(state.sort_attribute_of(key).as_str()))
    }

    /// True once the session was closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }
}

impl PageState {
    fn detail_prefix(&self) -> String {
        format!("{}#/details/", self.url)
    }

    fn visible_rows(&mut self) -> Vec<usize> {
        let mut count = self
            .order
            .len()
            .min(self.page_size)
            .saturating_sub(self.defects.hidden_rows);
        if self.defects.lagging_reads > 0 {
            self.defects.lagging_reads -= 1;
            count = count.saturating_sub(1);
        }
        self.order.iter().copied().take(count).collect()
    }

    fn cell(&self, row: usize, key: &str) -> String {
        let id = self.rows[row]
            .get(&self.identifier)
            .cloned()
            .unwrap_or_default();
        self.defects
            .cell_overrides
            .get(&(id, key.to_string()))
            .or_else(|| self.rows[row].get(key))
            .cloned()
            .unwrap_or_default()
    }

    fn sort_attribute_of(&self, key: &str) -> String {
        match &self.sorted_by {
            Some((sorted, direction)) if sorted == key => direction.to_string(),
            _ => "none".to_string(),
        }
    }

    fn reported_sort_attribute(&mut self, key: &str) -> String {
        if let Some((stale_key, previous, reads)) = &mut self.stale_sort {
            if stale_key.as_str() == key && *reads > 0 {
                *reads -= 1;
                return previous.clone();
            }
        }
        self.sort_attribute_of(key)
    }

    fn toggle_sort(&mut self, key: &str) {
        if self.defects.frozen_sort_columns.contains(key) {
            return;
        }
        if let Some(&reads) = self.defects.lagging_sort_columns.get(key) {
            self.stale_sort = Some((key.to_string(), self.sort_attribute_of(key), reads));
        }
        let direction = match &self.sorted_by {
            Some((sorted, direction)) if sorted == key => direction.flip(),
            _ => SortDirection::Ascending,
        };
        self.sorted_by = Some((key.to_string(), direction));
        if self.defects.unsorted_columns.contains(key) {
            return;
        }
        let rows = &self.rows;
        self.order.sort_by(|&a, &b| {
            let left = rows[a].get(key).map_or("", String::as_str);
            let right = rows[b].get(key).map_or("", String::as_str);
            direction.apply(compare_rendered(left, right))
        });
    }

    fn row_with_text(&mut self, text: &str) -> Option<usize> {
        let keys: Vec<String> = self.columns.iter().map(|c| c.key.clone()).collect();
        let visible = self.visible_rows();
        visible
            .into_iter()
            .find(|&row| keys.iter().any(|k| self.cell(row, k).contains(text)))
    }

    fn is_option(&self, css: &str) -> bool {
        css == self.contract.page_size_option
    }

    fn texts(&mut self, selector: &Selector) -> Vec<String> {
        if self.location != Location::Table {
            return Vec::new();
        }
        let cell_tag = self.contract.cell_tag.clone();
        match selector {
            Selector::Text(text) => self
                .header_names
                .values()
                .filter(|name| *name == text)
                .cloned()
                .collect(),
            Selector::Attribute { tag, name, value } if *tag == cell_tag => {
                if *name == self.contract.cell_attribute {
                    let visible = self.visible_rows();
                    visible.into_iter().map(|row| self.cell(row, value)).collect()
                } else if *name == self.contract.header_attribute {
                    self.header_names.get(value).cloned().into_iter().collect()
                } else {
                    Vec::new()
                }
            }
            Selector::Id(id) if *id == self.contract.page_size_id => {
                vec![self.page_size.to_string()]
            }
            Selector::Css(css) if self.is_option(css) && self.dropdown_open => self
                .page_size_options
                .iter()
                .map(ToString::to_string)
                .collect(),
            Selector::CssWithText { css, text } if self.is_option(css) && self.dropdown_open => {
                if self.page_size_options.iter().any(|o| o.to_string() == *text) {
                    vec![text.clone()]
                } else {
                    Vec::new()
                }
            }
            Selector::ParentOfText { text, .. } => match self.row_with_text(text) {
                Some(row) => {
                    let keys: Vec<String> = self.columns.iter().map(|c| c.key.clone()).collect();
                    vec![keys
                        .iter()
                        .map(|k| self.cell(row, k))
                        .collect::<Vec<_>>()
                        .join(" ")]
                }
                None => Vec::new(),
            },
            Selector::Within { scope, tag } if *tag == self.contract.link_tag => {
                match scope.as_ref() {
                    Selector::ParentOfText { text, .. } if self.row_with_text(text).is_some() => {
                        vec![text.clone()]
                    }
                    _ => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }

    fn attribute(&mut self, selector: &Selector, attribute: &str) -> Option<Option<String>> {
        if self.location != Location::Table {
            return None;
        }
        match selector {
            Selector::Attribute { name, value, .. } if *name == self.contract.header_attribute => {
                if !self.header_names.contains_key(value) {
                    return None;
                }
                if attribute == self.contract.sort_attribute {
                    Some(Some(self.reported_sort_attribute(value)))
                } else {
                    Some(None)
                }
            }
            Selector::Within { scope, .. } => match scope.as_ref() {
                Selector::ParentOfText { text, .. } => {
                    self.row_with_text(text)?;
                    if attribute == "href" && self.defects.unreadable_hrefs.contains(text) {
                        None
                    } else if attribute == "href" {
                        Some(Some(format!("{}{text}", self.detail_prefix())))
                    } else {
                        Some(None)
                    }
                }
                _ => None,
            },
            other => (!self.texts(other).is_empty()).then_some(None),
        }
    }

    fn click(&mut self, selector: &Selector) -> bool {
        if self.location != Location::Table {
            return false;
        }
        match selector {
            Selector::Attribute { name, value, .. }
                if *name == self.contract.header_attribute
                    && self.header_names.contains_key(value) =>
            {
                self.toggle_sort(value);
                true
            }
            Selector::Id(id) if *id == self.contract.page_size_id => {
                self.dropdown_open = !self.dropdown_open;
                true
            }
            Selector::CssWithText { css, text } if self.is_option(css) && self.dropdown_open => {
                match self.page_size_options.iter().find(|o| o.to_string() == *text) {
                    Some(&size) => {
                        self.page_size = size;
                        self.dropdown_open = false;
                        true
                    }
                    None => false,
                }
            }
            Selector::ParentOfText { .. } | Selector::Within { .. }
                if self.row_for_click(selector).is_some() =>
            {
                self.location = Location::Detail(text_of(selector));
                self.history.push(format!("{}{}", self.detail_prefix(), text_of(selector)));
                true
            }
            _ => false,
        }
    }

    fn row_for_click(&mut self, selector: &Selector) -> Option<usize> {
        match selector {
            Selector::ParentOfText { text, .. } => self.row_with_text(text),
            Selector::Within { scope, .. } => self.row_for_click(scope),
            _ => None,
        }
    }

    fn navigate(&mut self, url: &str) -> TableCheckResult<()> {
        if url == self.url {
            if self.defects.unreachable {
                return Err(TableCheckError::NavigationError {
                    url: url.to_string(),
                    message: "connection refused".to_string(),
                });
            }
            let returning = matches!(self.location, Location::Detail(_));
            if returning && self.defects.reset_page_size_on_return {
                self.page_size = self.page_size_options.first().copied().unwrap_or(0);
            }
            self.location = Location::Table;
        } else if let Some(value) = url.strip_prefix(&self.detail_prefix()) {
            self.location = Location::Detail(value.to_string());
        } else {
            self.location = Location::Other(url.to_string());
        }
        self.dropdown_open = false;
        self.history.push(url.to_string());
        Ok(())
    }

    fn current_url(&self) -> String {
        match &self.location {
            Location::Blank => "about:blank".to_string(),
            Location::Table => self.url.clone(),
            Location::Detail(value) => format!("{}{value}", self.detail_prefix()),
            Location::Other(url) => url.clone(),
        }
    }

    fn page_source(&self) -> String {
        match &self.location {
            Location::Blank | Location::Other(_) => "<html><body></body></html>".to_string(),
            Location::Table => {
                let cells: Vec<String> = self
                    .order
                    .iter()
                    .flat_map(|&row| self.columns.iter().map(move |c| self.cell(row, &c.key)))
                    .collect();
                format!("<html><body>{}</body></html>", cells.join(" "))
            }
            Location::Detail(value) if self.defects.broken_links.contains(value) => {
                "<html><body><h1>Not Found</h1></body></html>".to_string()
            }
            Location::Detail(value) => {
                format!("<html><body><h1>Details</h1><p>{value}</p></body></html>")
            }
        }
    }
}

fn text_of(selector: &Selector) -> String {
    match selector {
        Selector::ParentOfText { text, .. } => text.clone(),
        Selector::Within { scope, .. } => text_of(scope),
        _ => String::new(),
    }
}

/// Numeric when both sides parse as numbers, lexicographic otherwise
fn compare_rendered(left: &str, right: &str) -> Ordering {
    match (left.trim().parse::<f64>(), right.trim().parse::<f64>()) {
        (Ok(a), Ok(b)) => a.total_cmp(&b),
        _ => left.cmp(right),
    }
}

impl PageDriver for SimulatedTablePage {
    fn navigate(&mut self, url: &str) -> TableCheckResult<()> {
        self.state.borrow_mut().navigate(url)
    }

    fn refresh(&mut self) -> TableCheckResult<()> {
        self.state.borrow_mut().dropdown_open = false;
        Ok(())
    }

    fn current_url(&self) -> TableCheckResult<String> {
        Ok(self.state.borrow().current_url())
    }

    fn page_source(&self) -> TableCheckResult<String> {
        Ok(self.state.borrow().page_source())
    }

    fn texts(&self, selector: &Selector) -> TableCheckResult<Vec<String>> {
        Ok(self.state.borrow_mut().texts(selector))
    }

    fn attribute(&self, selector: &Selector, name: &str) -> TableCheckResult<Option<String>> {
        self.state
            .borrow_mut()
            .attribute(selector, name)
            .ok_or_else(|| TableCheckError::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    fn click(&mut self, selector: &Selector) -> TableCheckResult<()> {
        if self.state.borrow_mut().click(selector) {
            Ok(())
        } else {
            Err(TableCheckError::ElementNotFound {
                selector: selector.to_string(),
            })
        }
    }

    fn close(&mut self) -> TableCheckResult<()> {
        let mut state = self.state.borrow_mut();
        state.closed = true;
        state.location = Location::Blank;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn table() -> SimulatedTablePage {
        SimulatedTablePage::new(
            "http://localhost/jobs",
            vec![ColumnSpec::new("id", "ID"), ColumnSpec::new("size", "Size")],
        )
        .with_rows([
            [("id", "A"), ("size", "10")],
            [("id", "B"), ("size", "9")],
            [("id", "C"), ("size", "100")],
        ])
    }

    fn opened(page: SimulatedTablePage) -> SimulatedTablePage {
        let mut page = page;
        page.navigate("http://localhost/jobs").unwrap();
        page
    }

    fn column(page: &SimulatedTablePage, key: &str) -> Vec<String> {
        page.texts(&TableContract::default().cells(key)).unwrap()
    }

    #[test]
    fn test_nothing_rendered_before_navigation() {
        let page = table();
        assert!(column(&page, "id").is_empty());
        assert_eq!(page.current_url().unwrap(), "about:blank");
    }

    #[test]
    fn test_header_click_cycles_sort() {
        let mut page = opened(table());
        let contract = TableContract::default();
        assert_eq!(page.sort_state("size"), SortState::Unsorted);

        page.click(&contract.header("size")).unwrap();
        assert_eq!(page.sort_state("size"), SortState::Ascending);
        assert_eq!(column(&page, "size"), vec!["9", "10", "100"]);

        page.click(&contract.header("size")).unwrap();
        assert_eq!(page.sort_state("size"), SortState::Descending);
        assert_eq!(column(&page, "id"), vec!["C", "A", "B"]);

        page.click(&contract.header("id")).unwrap();
        assert_eq!(page.sort_state("size"), SortState::Unsorted);
        assert_eq!(page.sort_state("id"), SortState::Ascending);
    }

    #[test]
    fn test_lagging_sort_state() {
        let mut page = opened(table().with_lagging_sort_state("size", 2));
        let contract = TableContract::default();
        let header = contract.header("size");
        page.click(&header).unwrap();

        let read = |page: &SimulatedTablePage| page.attribute(&header, "aria-sort").unwrap();
        assert_eq!(read(&page).as_deref(), Some("none"));
        assert_eq!(read(&page).as_deref(), Some("none"));
        assert_eq!(read(&page).as_deref(), Some("ascending"));
        assert_eq!(column(&page, "size"), vec!["9", "10", "100"]);

        page.click(&header).unwrap();
        assert_eq!(read(&page).as_deref(), Some("ascending"));
        assert_eq!(read(&page).as_deref(), Some("ascending"));
        assert_eq!(read(&page).as_deref(), Some("descending"));
    }

    #[test]
    fn test_unreadable_href() {
        let page = opened(table().with_unreadable_href("B"));
        let contract = TableContract::default();
        assert!(page.attribute(&contract.row_link("B"), "href").is_err());
        assert_eq!(
            page.attribute(&contract.row_link("A"), "href").unwrap().as_deref(),
            Some("http://localhost/jobs#/details/A")
        );
    }

    #[test]
    fn test_page_size_dropdown() {
        let mut page = opened(table().with_page_size_options(vec![2, 5]));
        let contract = TableContract::default();
        assert_eq!(column(&page, "id").len(), 2);
        assert!(page.texts(&contract.page_size_options()).unwrap().is_empty());

        page.click(&contract.page_size_control()).unwrap();
        assert_eq!(
            page.texts(&contract.page_size_options()).unwrap(),
            vec!["2", "5"]
        );
        page.click(&contract.page_size_option(5)).unwrap();
        assert_eq!(page.page_size(), 5);
        assert!(page.texts(&contract.page_size_options()).unwrap().is_empty());
        assert_eq!(column(&page, "id").len(), 3);
        assert_eq!(page.text(&contract.page_size_control()).unwrap(), "5");
    }

    #[test]
    fn test_row_click_opens_detail() {
        let mut page = opened(table());
        let contract = TableContract::default();
        assert_eq!(
            page.attribute(&contract.row_link("B"), "href").unwrap(),
            Some("http://localhost/jobs#/details/B".to_string())
        );
        page.click(&contract.row_containing("B")).unwrap();
        assert!(page.page_source().unwrap().contains('B'));
        assert_eq!(
            page.current_url().unwrap(),
            "http://localhost/jobs#/details/B"
        );
        assert!(column(&page, "id").is_empty());
    }

    #[test]
    fn test_defects() {
        let mut page = opened(
            table()
                .with_hidden_rows(1)
                .with_cell_override("A", "size", "11")
                .with_broken_link("A")
                .with_page_size_reset_on_return()
                .with_page_size_options(vec![2, 5]),
        );
        let contract = TableContract::default();
        page.click(&contract.page_size_control()).unwrap();
        page.click(&contract.page_size_option(5)).unwrap();
        assert_eq!(column(&page, "size"), vec!["11", "9"]);

        page.click(&contract.row_containing("A")).unwrap();
        assert!(!page.page_source().unwrap().contains("<p>A</p>"));
        page.navigate("http://localhost/jobs").unwrap();
        assert_eq!(page.page_size(), 2);
    }

    #[test]
    fn test_lagging_reads() {
        let page = opened(table().with_lagging_reads(1));
        assert_eq!(column(&page, "id").len(), 2);
        assert_eq!(column(&page, "id").len(), 3);
    }

    #[test]
    fn test_missing_elements() {
        let mut page = opened(table());
        assert!(page.click(&Selector::css("#nope")).is_err());
        assert!(page
            .attribute(&TableContract::default().header("nope"), "aria-sort")
            .is_err());
        assert!(page.text(&Selector::css("#nope")).is_err());
    }

    #[test]
    fn test_clones_share_state_and_close() {
        let page = table();
        let mut handle = page.clone();
        handle.navigate("http://localhost/jobs").unwrap();
        handle.close().unwrap();
        assert!(page.is_closed());
        assert_eq!(page.history(), vec!["http://localhost/jobs".to_string()]);
    }

    #[test]
    fn test_compare_rendered() {
        assert_eq!(compare_rendered("9", "10"), Ordering::Less);
        assert_eq!(compare_rendered("b", "a"), Ordering::Greater);
    }
}
