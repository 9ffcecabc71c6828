//! Row filters for observation tables.
//!
//! A [`FilterSet`] is a conjunction of [`InclusionFilter`]s (value ∈ allowed set)
//! and [`RangeFilter`]s (inclusive numeric bounds). Filters are translated into
//! Polars expressions, so their order never changes the result.

use crate::analysis::error::AnalysisError;
use crate::types::columns::{ENSO_PHASE, MONTH, STATION, YEAR};
use crate::types::enso_phase::EnsoPhase;
use crate::types::station::Station;
use crate::utils::{ensure_column, i32_values, string_values};
use chrono::Month;
use polars::prelude::*;
use std::collections::BTreeSet;

/// The values an [`InclusionFilter`] lets through.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValues {
    Integers(Vec<i32>),
    Text(Vec<String>),
}

impl FilterValues {
    fn is_empty(&self) -> bool {
        match self {
            FilterValues::Integers(v) => v.is_empty(),
            FilterValues::Text(v) => v.is_empty(),
        }
    }

    fn to_series(&self) -> Series {
        match self {
            FilterValues::Integers(v) => Series::new("allowed".into(), v.as_slice()),
            FilterValues::Text(v) => {
                let values: Vec<&str> = v.iter().map(String::as_str).collect();
                Series::new("allowed".into(), values)
            }
        }
    }
}

/// Keeps rows whose `column` value is one of the allowed values.
#[derive(Debug, Clone, PartialEq)]
pub struct InclusionFilter {
    pub column: String,
    pub values: FilterValues,
}

impl InclusionFilter {
    pub fn integers(column: &str, values: impl IntoIterator<Item = i32>) -> Self {
        Self {
            column: column.to_string(),
            values: FilterValues::Integers(values.into_iter().collect()),
        }
    }

    pub fn text<S: Into<String>>(column: &str, values: impl IntoIterator<Item = S>) -> Self {
        Self {
            column: column.to_string(),
            values: FilterValues::Text(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn years(years: impl IntoIterator<Item = i32>) -> Self {
        Self::integers(YEAR, years)
    }

    /// Month names as stored in the month column ("January", ...).
    pub fn months<S: Into<String>>(months: impl IntoIterator<Item = S>) -> Self {
        Self::text(MONTH, months)
    }

    pub fn phases(phases: impl IntoIterator<Item = EnsoPhase>) -> Self {
        Self::text(ENSO_PHASE, phases.into_iter().map(|p| p.label()))
    }

    pub fn stations(stations: impl IntoIterator<Item = Station>) -> Self {
        Self::text(STATION, stations.into_iter().map(Station::label))
    }

    pub fn to_expr(&self) -> Expr {
        if self.values.is_empty() {
            return lit(false);
        }
        col(self.column.as_str()).is_in(lit(self.values.to_series()))
    }
}

/// Keeps rows whose `column` value lies in `[min, max]`, both ends included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeFilter<'a> {
    pub column: &'a str,
    pub min: f64,
    pub max: f64,
}

impl RangeFilter<'_> {
    pub fn to_expr(&self) -> Expr {
        let value = col(self.column).cast(DataType::Float64);
        value
            .clone()
            .gt_eq(lit(self.min))
            .and(value.lt_eq(lit(self.max)))
    }
}

/// A conjunction of inclusion filters. The empty set keeps every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    filters: Vec<InclusionFilter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter, replacing any earlier filter on the same column.
    pub fn with(mut self, filter: InclusionFilter) -> Self {
        self.filters.retain(|f| f.column != filter.column);
        self.filters.push(filter);
        self
    }

    pub fn filters(&self) -> &[InclusionFilter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Drops filters on columns the table does not have. Useful when one filter
    /// selection is shared by tables with different layouts.
    pub fn restricted_to(&self, df: &DataFrame) -> FilterSet {
        FilterSet {
            filters: self
                .filters
                .iter()
                .filter(|f| df.get_column_index(&f.column).is_some())
                .cloned()
                .collect(),
        }
    }

    /// Combined predicate, or `None` when there is nothing to filter on.
    pub fn to_expr(&self) -> Option<Expr> {
        self.filters
            .iter()
            .map(InclusionFilter::to_expr)
            .reduce(|acc, e| acc.and(e))
    }

    /// Applies every filter to `df`. Fails with `UnknownColumn` when a filter
    /// names a column the table does not have.
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame, AnalysisError> {
        for filter in &self.filters {
            ensure_column(df, &filter.column)?;
        }
        match self.to_expr() {
            None => Ok(df.clone()),
            Some(predicate) => Ok(df.clone().lazy().filter(predicate).collect()?),
        }
    }
}

/// Filtering helpers on any `LazyFrame` holding observation columns.
pub trait EnsoFrameFilterExt {
    /// Keeps rows accepted by every filter in `filters`.
    fn filter_set(self, filters: &FilterSet) -> LazyFrame;

    /// Keeps rows with a year in `[start_year, end_year]`.
    fn filter_years(self, start_year: i32, end_year: i32) -> LazyFrame;

    /// Keeps rows whose `column` lies within an inclusive range.
    fn filter_range(self, range: RangeFilter<'_>) -> LazyFrame;
}

impl EnsoFrameFilterExt for LazyFrame {
    fn filter_set(self, filters: &FilterSet) -> LazyFrame {
        match filters.to_expr() {
            Some(predicate) => self.filter(predicate),
            None => self,
        }
    }

    fn filter_years(self, start_year: i32, end_year: i32) -> LazyFrame {
        self.filter(
            col(YEAR)
                .gt_eq(lit(start_year))
                .and(col(YEAR).lt_eq(lit(end_year))),
        )
    }

    fn filter_range(self, range: RangeFilter<'_>) -> LazyFrame {
        self.filter(range.to_expr())
    }
}

/// Projects a table onto the given columns, in the given order.
pub fn select_variables(df: &DataFrame, variables: &[&str]) -> Result<DataFrame, AnalysisError> {
    if variables.is_empty() {
        return Err(AnalysisError::EmptySelection("no variables selected".to_string()));
    }
    for variable in variables {
        ensure_column(df, variable)?;
    }
    Ok(df.select(variables.iter().copied())?)
}

/// The values a table offers for each filterable column. Filter widgets default
/// to everything selected, which [`FilterOptions::all_selected`] reproduces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    /// Distinct years, ascending.
    pub years: Vec<i32>,
    /// Distinct month names, in calendar order.
    pub months: Vec<String>,
    /// Distinct ENSO phase labels: known phases first, in phase order.
    pub phases: Vec<String>,
    /// Distinct station labels, ascending.
    pub stations: Vec<String>,
}

impl FilterOptions {
    pub fn from_frame(df: &DataFrame) -> Result<Self, AnalysisError> {
        let mut options = FilterOptions::default();

        if df.get_column_index(YEAR).is_some() {
            let years: BTreeSet<i32> = i32_values(df, YEAR)?.into_iter().flatten().collect();
            options.years = years.into_iter().collect();
        }

        if df.get_column_index(MONTH).is_some() {
            let present: BTreeSet<String> =
                string_values(df, MONTH)?.into_iter().flatten().collect();
            options.months = (1..=12u8)
                .filter_map(|n| Month::try_from(n).ok())
                .map(|m| m.name().to_string())
                .filter(|name| present.contains(name))
                .collect();
        }

        if df.get_column_index(ENSO_PHASE).is_some() {
            let present: BTreeSet<String> =
                string_values(df, ENSO_PHASE)?.into_iter().flatten().collect();
            let mut phases: Vec<String> = EnsoPhase::ALL
                .iter()
                .map(|p| p.label().to_string())
                .filter(|label| present.contains(label))
                .collect();
            phases.extend(
                present
                    .iter()
                    .filter(|label| EnsoPhase::ALL.iter().all(|p| p.label() != label.as_str()))
                    .cloned(),
            );
            options.phases = phases;
        }

        if df.get_column_index(STATION).is_some() {
            let present: BTreeSet<String> =
                string_values(df, STATION)?.into_iter().flatten().collect();
            options.stations = present.into_iter().collect();
        }

        Ok(options)
    }

    /// A filter set allowing every offered value.
    pub fn all_selected(&self) -> FilterSet {
        let mut set = FilterSet::new();
        if !self.years.is_empty() {
            set = set.with(InclusionFilter::years(self.years.iter().copied()));
        }
        if !self.months.is_empty() {
            set = set.with(InclusionFilter::months(self.months.iter().cloned()));
        }
        if !self.phases.is_empty() {
            set = set.with(InclusionFilter::text(ENSO_PHASE, self.phases.iter().cloned()));
        }
        if !self.stations.is_empty() {
            set = set.with(InclusionFilter::text(STATION, self.stations.iter().cloned()));
        }
        set
    }
}
