use serde::Serialize;
use std::str::FromStr;

use crate::filters::AppliedFilters;
use crate::home::HomeSections;
use crate::models::ContentItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    All,
    Movies,
    Series,
}

impl FromStr for Category {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(Category::All),
            "movies" | "movie" => Ok(Category::Movies),
            "series" | "tv" => Ok(Category::Series),
            other => Err(anyhow::anyhow!(
                "category must be 'all', 'movies' or 'series', got '{}'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "category", rename_all = "lowercase")]
pub enum Source {
    Search,
    Filtered,
    Category(Category),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection<'a> {
    #[serde(flatten)]
    pub source: Source,
    pub items: &'a [ContentItem],
}

/// Filtered results together with the filters that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredResults {
    pub applied: AppliedFilters,
    pub items: Vec<ContentItem>,
}

/// A non-blank query wins, then active filters, then the category.
pub fn resolve_source(
    query: &str,
    applied: Option<&AppliedFilters>,
    category: Category,
) -> Source {
    if !query.trim().is_empty() {
        Source::Search
    } else if applied.is_some_and(|a| a.filters.is_active()) {
        Source::Filtered
    } else {
        Source::Category(category)
    }
}

pub fn select<'a>(
    query: &str,
    search_results: &'a [ContentItem],
    filtered: Option<&'a FilteredResults>,
    category: Category,
    home: &'a HomeSections,
) -> Selection<'a> {
    let source = resolve_source(query, filtered.map(|f| &f.applied), category);
    let items: &[ContentItem] = match source {
        Source::Search => search_results,
        Source::Filtered => filtered.map(|f| f.items.as_slice()).unwrap_or(&[]),
        Source::Category(Category::All) => &home.trending,
        Source::Category(Category::Movies) => &home.popular_movies,
        Source::Category(Category::Series) => &home.popular_series,
    };
    Selection { source, items }
}

/// Page-level state feeding `select`.
#[derive(Debug, Clone, Default)]
pub struct BrowseState {
    home: HomeSections,
    category: Category,
    query: String,
    search_results: Vec<ContentItem>,
    filtered: Option<FilteredResults>,
}

impl BrowseState {
    pub fn new(home: HomeSections) -> Self {
        Self {
            home,
            ..Self::default()
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn filtered(&self) -> Option<&FilteredResults> {
        self.filtered.as_ref()
    }

    /// Leaves any applied filter untouched; its media type stays pinned.
    pub fn set_category(&mut self, category: Category) {
        self.category = category;
    }

    /// A blank query clears search results at once.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        if query.trim().is_empty() {
            self.search_results.clear();
        }
    }

    /// Stores results for `query` only if it still matches the current input.
    pub fn set_search_results(&mut self, query: &str, items: Vec<ContentItem>) -> bool {
        if self.query.trim() != query.trim() {
            return false;
        }
        self.search_results = items;
        true
    }

    pub fn apply_filters(&mut self, applied: AppliedFilters, items: Vec<ContentItem>) {
        self.filtered = Some(FilteredResults { applied, items });
    }

    pub fn reset_filters(&mut self) {
        self.filtered = None;
    }

    pub fn displayed(&self) -> Selection<'_> {
        select(
            &self.query,
            &self.search_results,
            self.filtered.as_ref(),
            self.category,
            &self.home,
        )
    }
}
