//! Paging for long lists such as the journal and the sales register.

use maud::{Markup, html};
use serde::Deserialize;

use crate::html::LINK_STYLE;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The maximum rows to display per page when not specified in a request.
    pub default_page_size: u64,
    /// The maximum number of pages to show in the pagination indicator.
    pub max_pages: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_pages: 5,
        }
    }
}

/// Query string parameters for a paged list.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// A resolved page request with the limit/offset to use in SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub per_page: u64,
    pub page_count: u64,
}

impl PageWindow {
    /// Resolve `query` against `config` and the number of rows available.
    ///
    /// Out of range pages are clamped to the last page.
    pub fn new(query: &PageQuery, config: &PaginationConfig, row_count: u64) -> Self {
        let per_page = query.per_page.unwrap_or(config.default_page_size).max(1);
        let page_count = row_count.div_ceil(per_page).max(1);
        let page = query
            .page
            .unwrap_or(config.default_page)
            .clamp(1, page_count);

        Self {
            page,
            per_page,
            page_count,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum PaginationIndicator {
    Page(u64),
    CurrPage(u64),
    Ellipsis,
    NextButton(u64),
    BackButton(u64),
}

pub fn create_pagination_indicators(
    curr_page: u64,
    page_count: u64,
    max_pages: u64,
) -> Vec<PaginationIndicator> {
    let half = max_pages / 2;
    let map_page = |page| {
        if page == curr_page {
            PaginationIndicator::CurrPage(page)
        } else {
            PaginationIndicator::Page(page)
        }
    };

    let visible = if page_count <= max_pages {
        1..=page_count
    } else if curr_page <= half {
        1..=max_pages
    } else if curr_page > page_count - half {
        (page_count - max_pages + 1)..=page_count
    } else {
        (curr_page - half)..=(curr_page + half)
    };

    let mut indicators: Vec<_> = visible.map(map_page).collect();

    if page_count > max_pages {
        if curr_page > half + 1 {
            indicators.insert(0, PaginationIndicator::Page(1));
            indicators.insert(1, PaginationIndicator::Ellipsis);
        }

        if curr_page < page_count - half {
            indicators.push(PaginationIndicator::Ellipsis);
            indicators.push(PaginationIndicator::Page(page_count));
        }
    }

    if curr_page > 1 {
        indicators.insert(0, PaginationIndicator::BackButton(curr_page - 1));
    }

    if curr_page < page_count {
        indicators.push(PaginationIndicator::NextButton(curr_page + 1));
    }

    indicators
}

/// Render page links for `window`, linking to `base_url?page=N&per_page=M`.
pub fn pagination_view(base_url: &str, window: &PageWindow, max_pages: u64) -> Markup {
    let indicators = create_pagination_indicators(window.page, window.page_count, max_pages);
    let href = |page: u64| format!("{base_url}?page={page}&per_page={}", window.per_page);

    html! {
        nav class="flex justify-center mt-4" aria-label="Pagination"
        {
            ul class="inline-flex gap-3 text-sm"
            {
                @for indicator in indicators {
                    li
                    {
                        @match indicator {
                            PaginationIndicator::Page(page) => a href=(href(page)) class=(LINK_STYLE) { (page) },
                            PaginationIndicator::CurrPage(page) => span aria-current="page" class="font-bold" { (page) },
                            PaginationIndicator::Ellipsis => span { "…" },
                            PaginationIndicator::BackButton(page) => a href=(href(page)) class=(LINK_STYLE) { "Back" },
                            PaginationIndicator::NextButton(page) => a href=(href(page)) class=(LINK_STYLE) { "Next" },
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod page_window_tests {
    use crate::pagination::{PageQuery, PageWindow, PaginationConfig};

    #[test]
    fn defaults_to_first_page() {
        let window = PageWindow::new(&PageQuery::default(), &PaginationConfig::default(), 45);

        assert_eq!(window.page, 1);
        assert_eq!(window.page_count, 3);
        assert_eq!(window.offset(), 0);
    }

    #[test]
    fn clamps_page_past_the_end() {
        let query = PageQuery {
            page: Some(99),
            per_page: Some(10),
        };

        let window = PageWindow::new(&query, &PaginationConfig::default(), 25);

        assert_eq!(window.page, 3);
        assert_eq!(window.offset(), 20);
    }

    #[test]
    fn empty_list_has_one_page() {
        let window = PageWindow::new(&PageQuery::default(), &PaginationConfig::default(), 0);

        assert_eq!(window.page_count, 1);
        assert_eq!(window.page, 1);
    }
}

#[cfg(test)]
mod indicator_tests {
    use crate::pagination::{PaginationIndicator, create_pagination_indicators};

    #[test]
    fn shows_every_page_when_there_are_few() {
        let got = create_pagination_indicators(2, 3, 5);

        assert_eq!(
            got,
            [
                PaginationIndicator::BackButton(1),
                PaginationIndicator::Page(1),
                PaginationIndicator::CurrPage(2),
                PaginationIndicator::Page(3),
                PaginationIndicator::NextButton(3),
            ]
        );
    }

    #[test]
    fn centres_current_page_with_ellipses_on_both_sides() {
        let got = create_pagination_indicators(5, 10, 5);

        assert_eq!(
            got,
            [
                PaginationIndicator::BackButton(4),
                PaginationIndicator::Page(1),
                PaginationIndicator::Ellipsis,
                PaginationIndicator::Page(3),
                PaginationIndicator::Page(4),
                PaginationIndicator::CurrPage(5),
                PaginationIndicator::Page(6),
                PaginationIndicator::Page(7),
                PaginationIndicator::Ellipsis,
                PaginationIndicator::Page(10),
                PaginationIndicator::NextButton(6),
            ]
        );
    }
}
