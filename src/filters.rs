//! Discovery filters: the filter set, the panel that edits it, and the
//! translation into discover-endpoint query parameters.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::error::FilterError;
use crate::models::{Genre, MediaType};
use crate::tmdb::TmdbApi;

pub const YEAR_FLOOR: i32 = 1950;
pub const DEFAULT_YEAR_FROM: i32 = 1990;
pub const MAX_RATING: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSet {
    pub genre_ids: BTreeSet<u32>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub min_rating: f64,
}

impl FilterSet {
    pub fn new(
        genre_ids: BTreeSet<u32>,
        year_from: Option<i32>,
        year_to: Option<i32>,
        min_rating: f64,
    ) -> Result<Self, FilterError> {
        if let (Some(from), Some(to)) = (year_from, year_to) {
            if from > to {
                return Err(FilterError::YearOrder { from, to });
            }
        }
        validate_rating(min_rating)?;
        Ok(Self {
            genre_ids,
            year_from,
            year_to,
            min_rating,
        })
    }

    /// No genres, no rating floor, years `1990..=current_year`.
    pub fn unfiltered(current_year: i32) -> Self {
        Self {
            genre_ids: BTreeSet::new(),
            year_from: Some(DEFAULT_YEAR_FROM),
            year_to: Some(current_year),
            min_rating: 0.0,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.genre_ids.is_empty() || self.min_rating > 0.0
    }

    /// Rejects any set year outside `1950..=current_year`.
    pub fn check_year_bounds(&self, current_year: i32) -> Result<(), FilterError> {
        for year in [self.year_from, self.year_to].into_iter().flatten() {
            check_year(year, current_year)?;
        }
        Ok(())
    }
}

fn check_year(year: i32, current_year: i32) -> Result<(), FilterError> {
    if (YEAR_FLOOR..=current_year).contains(&year) {
        Ok(())
    } else {
        Err(FilterError::YearOutOfRange(year, YEAR_FLOOR, current_year))
    }
}

fn validate_rating(rating: f64) -> Result<(), FilterError> {
    let in_range = (0.0..=MAX_RATING).contains(&rating);
    let on_step = (rating * 2.0).fract() == 0.0;
    if in_range && on_step {
        Ok(())
    } else {
        Err(FilterError::Rating(rating))
    }
}

/// Query parameters for `discover/{media_type}`, excluding credentials.
pub fn compose_discover_params(media_type: MediaType, filters: &FilterSet) -> Vec<(String, String)> {
    let mut params = vec![
        ("sort_by".to_string(), "popularity.desc".to_string()),
        ("page".to_string(), "1".to_string()),
    ];

    if !filters.genre_ids.is_empty() {
        let joined = filters
            .genre_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        params.push(("with_genres".to_string(), joined));
    }

    let date_field = match media_type {
        MediaType::Movie => "primary_release_date",
        MediaType::Tv => "first_air_date",
    };
    if let Some(from) = filters.year_from {
        params.push((format!("{date_field}.gte"), format!("{from:04}-01-01")));
    }
    if let Some(to) = filters.year_to {
        params.push((format!("{date_field}.lte"), format!("{to:04}-12-31")));
    }

    if filters.min_rating > 0.0 {
        // f64 Display prints 7.0 as "7" and 7.5 as "7.5".
        params.push(("vote_average.gte".to_string(), filters.min_rating.to_string()));
    }

    debug!(media_type = %media_type, ?params, "Composed discover params");
    params
}

/// Filters handed to the page on apply. The media type stays pinned to the
/// one the panel was opened for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedFilters {
    pub media_type: MediaType,
    pub filters: FilterSet,
}

#[derive(Debug, Clone)]
pub struct FilterPanel {
    media_type: MediaType,
    current_year: i32,
    genres: Vec<Genre>,
    draft: FilterSet,
}

impl FilterPanel {
    pub fn new(media_type: MediaType, current_year: i32) -> Self {
        Self {
            media_type,
            current_year,
            genres: Vec::new(),
            draft: FilterSet::unfiltered(current_year),
        }
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn genres(&self) -> &[Genre] {
        &self.genres
    }

    pub fn draft(&self) -> &FilterSet {
        &self.draft
    }

    pub fn year_bounds(&self) -> (i32, i32) {
        (YEAR_FLOOR, self.current_year)
    }

    /// Genre lists are fetched per panel session and not cached.
    pub async fn load_genres(&mut self, tmdb: &dyn TmdbApi) {
        self.genres = tmdb.genres(self.media_type).await;
        info!(
            "Loaded {} {} genres for filter panel",
            self.genres.len(),
            self.media_type
        );
    }

    pub fn toggle_genre(&mut self, genre_id: u32) {
        if !self.draft.genre_ids.remove(&genre_id) {
            self.draft.genre_ids.insert(genre_id);
        }
    }

    pub fn set_year_range(&mut self, from: i32, to: i32) -> Result<(), FilterError> {
        for year in [from, to] {
            check_year(year, self.current_year)?;
        }
        if from > to {
            return Err(FilterError::YearOrder { from, to });
        }
        self.draft.year_from = Some(from);
        self.draft.year_to = Some(to);
        Ok(())
    }

    pub fn set_min_rating(&mut self, rating: f64) -> Result<(), FilterError> {
        validate_rating(rating)?;
        self.draft.min_rating = rating;
        Ok(())
    }

    /// Badge count: one per selected genre plus one for a rating floor.
    pub fn active_count(&self) -> usize {
        self.draft.genre_ids.len() + usize::from(self.draft.min_rating > 0.0)
    }

    pub fn apply(&self) -> AppliedFilters {
        AppliedFilters {
            media_type: self.media_type,
            filters: self.draft.clone(),
        }
    }

    pub fn reset(&mut self) -> AppliedFilters {
        self.draft = FilterSet::unfiltered(self.current_year);
        self.apply()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn no_filter_state_only_sorts_and_pages() {
        let filters = FilterSet::new(BTreeSet::new(), None, None, 0.0).unwrap();
        let params = compose_discover_params(MediaType::Movie, &filters);
        assert_eq!(
            params,
            vec![
                ("sort_by".to_string(), "popularity.desc".to_string()),
                ("page".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn unfiltered_defaults_carry_no_genre_or_rating_bounds() {
        let params = compose_discover_params(MediaType::Movie, &FilterSet::unfiltered(2026));
        assert!(param(&params, "with_genres").is_none());
        assert!(param(&params, "vote_average.gte").is_none());
        assert_eq!(param(&params, "primary_release_date.gte"), Some("1990-01-01"));
        assert_eq!(param(&params, "primary_release_date.lte"), Some("2026-12-31"));
    }

    #[test]
    fn tv_filters_use_first_air_date_bounds() {
        let filters =
            FilterSet::new(BTreeSet::from([16]), Some(2010), Some(2020), 7.0).unwrap();
        let params = compose_discover_params(MediaType::Tv, &filters);
        assert_eq!(param(&params, "with_genres"), Some("16"));
        assert_eq!(param(&params, "first_air_date.gte"), Some("2010-01-01"));
        assert_eq!(param(&params, "first_air_date.lte"), Some("2020-12-31"));
        assert_eq!(param(&params, "vote_average.gte"), Some("7"));
        assert_eq!(param(&params, "sort_by"), Some("popularity.desc"));
        assert_eq!(param(&params, "page"), Some("1"));
    }

    #[test]
    fn multiple_genres_are_comma_joined_and_half_ratings_kept() {
        let filters = FilterSet::new(BTreeSet::from([35, 16]), None, None, 6.5).unwrap();
        let params = compose_discover_params(MediaType::Movie, &filters);
        assert_eq!(param(&params, "with_genres"), Some("16,35"));
        assert_eq!(param(&params, "vote_average.gte"), Some("6.5"));
    }

    #[test]
    fn composition_is_deterministic() {
        let filters =
            FilterSet::new(BTreeSet::from([18, 80]), Some(1999), Some(2005), 8.0).unwrap();
        let first = compose_discover_params(MediaType::Movie, &filters);
        let _ = compose_discover_params(MediaType::Tv, &FilterSet::unfiltered(2026));
        assert_eq!(first, compose_discover_params(MediaType::Movie, &filters));
    }

    #[test]
    fn date_bounds_stay_ordered_for_every_valid_range() {
        for from in [1950, 1990, 2019, 2020] {
            for to in [2020, 2021, 2026] {
                let filters = FilterSet::new(BTreeSet::new(), Some(from), Some(to), 0.0).unwrap();
                let params = compose_discover_params(MediaType::Movie, &filters);
                let gte = param(&params, "primary_release_date.gte").unwrap();
                let lte = param(&params, "primary_release_date.lte").unwrap();
                assert!(gte <= lte, "{gte} > {lte}");
            }
        }
    }

    #[test]
    fn rejects_inverted_years_and_off_step_ratings() {
        assert_eq!(
            FilterSet::new(BTreeSet::new(), Some(2020), Some(2010), 0.0),
            Err(FilterError::YearOrder {
                from: 2020,
                to: 2010
            })
        );
        assert_eq!(
            FilterSet::new(BTreeSet::new(), None, None, 7.3),
            Err(FilterError::Rating(7.3))
        );
        assert!(FilterSet::new(BTreeSet::new(), None, None, 10.5).is_err());
    }

    #[test]
    fn panel_counts_and_resets() {
        let mut panel = FilterPanel::new(MediaType::Tv, 2026);
        panel.toggle_genre(16);
        panel.toggle_genre(35);
        panel.toggle_genre(35);
        panel.set_min_rating(7.5).unwrap();
        panel.set_year_range(2000, 2010).unwrap();
        assert_eq!(panel.active_count(), 2);

        let applied = panel.apply();
        assert_eq!(applied.media_type, MediaType::Tv);
        assert!(applied.filters.is_active());
        assert_eq!(applied.filters.year_from, Some(2000));

        let reset = panel.reset();
        assert!(!reset.filters.is_active());
        assert_eq!(reset.filters, FilterSet::unfiltered(2026));
        assert_eq!(panel.active_count(), 0);
    }

    #[test]
    fn panel_rejects_years_outside_slider_bounds() {
        let mut panel = FilterPanel::new(MediaType::Movie, 2026);
        assert_eq!(
            panel.set_year_range(1900, 2000),
            Err(FilterError::YearOutOfRange(1900, YEAR_FLOOR, 2026))
        );
        assert!(panel.set_year_range(2000, 2027).is_err());
        assert_eq!(panel.draft().year_from, Some(DEFAULT_YEAR_FROM));
    }

    #[test]
    fn year_bounds_check_covers_both_ends() {
        let negative = FilterSet::new(BTreeSet::new(), Some(-5), None, 0.0).unwrap();
        assert_eq!(
            negative.check_year_bounds(2026),
            Err(FilterError::YearOutOfRange(-5, YEAR_FLOOR, 2026))
        );
        let future = FilterSet::new(BTreeSet::new(), Some(2000), Some(2030), 0.0).unwrap();
        assert!(future.check_year_bounds(2026).is_err());
        assert!(FilterSet::unfiltered(2026).check_year_bounds(2026).is_ok());
        let open = FilterSet::new(BTreeSet::from([16]), None, None, 0.0).unwrap();
        assert!(open.check_year_bounds(2026).is_ok());
    }
}
