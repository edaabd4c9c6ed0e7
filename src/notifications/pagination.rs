//! Page navigation for the current-competitions view
//!
//! Pagination is a small state machine over `{page_index, total_pages}`.
//! Transitions are pure and clamp at both ends; the set of enabled controls
//! is derived from the state alone.

/// Default number of competitions per page
pub const DEFAULT_PAGE_SIZE: usize = 3;

/// Enabled state of the four navigation controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub first: bool,
    pub previous: bool,
    pub next: bool,
    pub last: bool,
}

impl Controls {
    /// True when every control is disabled
    pub fn all_disabled(&self) -> bool {
        !(self.first || self.previous || self.next || self.last)
    }

    pub fn is_enabled(&self, control: Control) -> bool {
        match control {
            Control::First => self.first,
            Control::Previous => self.previous,
            Control::Next => self.next,
            Control::Last => self.last,
        }
    }
}

/// Navigation control, used for labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    First,
    Previous,
    Next,
    Last,
}

impl Control {
    pub const ALL: [Control; 4] = [Control::First, Control::Previous, Control::Next, Control::Last];

    /// Translation key for the control label
    pub fn label_key(&self) -> &'static str {
        match self {
            Control::First => "First",
            Control::Previous => "Previous",
            Control::Next => "Next",
            Control::Last => "Last",
        }
    }
}

/// Pagination state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_index: usize,
    total_pages: usize,
    page_size: usize,
}

impl Paginator {
    /// Paginator on the first page of `total_items` items
    ///
    /// An empty list still has one (empty) page. A zero page size is
    /// treated as one.
    pub fn new(total_items: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            page_index: 0,
            total_pages: total_items.div_ceil(page_size).max(1),
            page_size,
        }
    }

    /// Paginator with the default page size
    pub fn with_default_size(total_items: usize) -> Self {
        Self::new(total_items, DEFAULT_PAGE_SIZE)
    }

    /// Jump to `page_index`, clamped to the last page
    #[must_use]
    pub fn at(self, page_index: usize) -> Self {
        Self {
            page_index: page_index.min(self.total_pages - 1),
            ..self
        }
    }

    #[must_use]
    pub fn first(self) -> Self {
        self.at(0)
    }

    #[must_use]
    pub fn prev(self) -> Self {
        self.at(self.page_index.saturating_sub(1))
    }

    #[must_use]
    pub fn next(self) -> Self {
        self.at(self.page_index + 1)
    }

    #[must_use]
    pub fn last(self) -> Self {
        self.at(self.total_pages - 1)
    }

    /// Zero-based current page
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// One-based current page, for display
    pub fn page_number(&self) -> usize {
        self.page_index + 1
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Enabled controls for the current state
    pub fn controls(&self) -> Controls {
        if self.total_pages <= 1 {
            return Controls {
                first: false,
                previous: false,
                next: false,
                last: false,
            };
        }

        let at_start = self.page_index == 0;
        let at_end = self.page_index + 1 >= self.total_pages;
        Controls {
            first: !at_start,
            previous: !at_start,
            next: !at_end,
            last: !at_end,
        }
    }

    /// Enabled controls in display order
    pub fn enabled_controls(&self) -> Vec<Control> {
        let controls = self.controls();
        Control::ALL
            .into_iter()
            .filter(|c| controls.is_enabled(*c))
            .collect()
    }

    /// Items shown on the current page
    pub fn page_slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.page_index * self.page_size).min(items.len());
        let end = (start + self.page_size).min(items.len());
        &items[start..end]
    }
}
