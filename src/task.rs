use chrono::{Duration, NaiveDate};
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// One task of the plan: a three-point duration estimate plus the schedule
/// columns computed by the CPM passes. Offsets are working-day indices
/// relative to the project start, never calendar dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    /// Optimistic duration estimate, in working days.
    pub low: f64,
    /// Most-likely duration estimate, in working days.
    pub likely: f64,
    /// Pessimistic duration estimate, in working days.
    pub high: f64,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_date: Option<NaiveDate>,
    #[serde(default)]
    pub predecessors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early_start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early_finish: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub late_start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub late_finish: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_float: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_critical: Option<bool>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        low: f64,
        likely: f64,
        high: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            low,
            likely,
            high,
            done: false,
            done_date: None,
            predecessors: Vec::new(),
            duration_days: None,
            early_start: None,
            early_finish: None,
            late_start: None,
            late_finish: None,
            total_float: None,
            is_critical: None,
        }
    }

    pub fn with_predecessors(mut self, predecessors: Vec<String>) -> Self {
        self.predecessors = predecessors;
        self
    }

    pub fn completed(mut self, date: Option<NaiveDate>) -> Self {
        self.done = true;
        self.done_date = date;
        self
    }

    pub fn to_dataframe_row(&self) -> PolarsResult<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(15);

        let id_data: [&str; 1] = [self.id.as_str()];
        columns.push(Series::new(PlSmallStr::from_static("id"), id_data).into_column());

        let name_data: [&str; 1] = [self.name.as_str()];
        columns.push(Series::new(PlSmallStr::from_static("name"), name_data).into_column());

        let low_data: [f64; 1] = [self.low];
        columns.push(Series::new(PlSmallStr::from_static("low"), low_data).into_column());

        let likely_data: [f64; 1] = [self.likely];
        columns.push(Series::new(PlSmallStr::from_static("likely"), likely_data).into_column());

        let high_data: [f64; 1] = [self.high];
        columns.push(Series::new(PlSmallStr::from_static("high"), high_data).into_column());

        let done_data: [bool; 1] = [self.done];
        columns.push(Series::new(PlSmallStr::from_static("done"), done_data).into_column());

        columns.push(Self::series_from_date("done_date", self.done_date)?.into_column());
        columns
            .push(Self::series_from_string_list("predecessors", &self.predecessors).into_column());

        columns.push(Self::series_from_opt_i64("duration_days", self.duration_days).into_column());
        columns.push(Self::series_from_opt_i64("early_start", self.early_start).into_column());
        columns.push(Self::series_from_opt_i64("early_finish", self.early_finish).into_column());
        columns.push(Self::series_from_opt_i64("late_start", self.late_start).into_column());
        columns.push(Self::series_from_opt_i64("late_finish", self.late_finish).into_column());
        columns.push(Self::series_from_opt_i64("total_float", self.total_float).into_column());

        let critical: [Option<bool>; 1] = [self.is_critical];
        columns.push(Series::new(PlSmallStr::from_static("is_critical"), critical).into_column());

        DataFrame::new(columns)
    }

    pub fn from_dataframe_row(df: &DataFrame, row_idx: usize) -> PolarsResult<Self> {
        let id = df
            .column("id")?
            .str()?
            .get(row_idx)
            .ok_or_else(|| PolarsError::ComputeError("task row missing id".into()))?
            .to_string();

        let name = df
            .column("name")?
            .str()?
            .get(row_idx)
            .unwrap_or("")
            .to_string();

        let predecessors = Self::vec_from_string_list(df.column("predecessors")?.list()?, row_idx)?;

        Ok(Self {
            id,
            name,
            low: df.column("low")?.f64()?.get(row_idx).unwrap_or(0.0),
            likely: df.column("likely")?.f64()?.get(row_idx).unwrap_or(0.0),
            high: df.column("high")?.f64()?.get(row_idx).unwrap_or(0.0),
            done: df.column("done")?.bool()?.get(row_idx).unwrap_or(false),
            done_date: Self::date_from_series(df.column("done_date")?.date()?, row_idx),
            predecessors,
            duration_days: df.column("duration_days")?.i64()?.get(row_idx),
            early_start: df.column("early_start")?.i64()?.get(row_idx),
            early_finish: df.column("early_finish")?.i64()?.get(row_idx),
            late_start: df.column("late_start")?.i64()?.get(row_idx),
            late_finish: df.column("late_finish")?.i64()?.get(row_idx),
            total_float: df.column("total_float")?.i64()?.get(row_idx),
            is_critical: df.column("is_critical")?.bool()?.get(row_idx),
        })
    }

    fn series_from_string_list(name: &str, values: &[String]) -> Series {
        let inner_values: Vec<&str> = values.iter().map(|s| s.as_str()).collect();
        let inner = Series::new(PlSmallStr::from_static(""), inner_values);
        Series::new(name.into(), &[inner])
    }

    fn series_from_opt_i64(name: &str, value: Option<i64>) -> Series {
        let data: [Option<i64>; 1] = [value];
        Series::new(name.into(), data)
    }

    fn series_from_date(name: &str, date: Option<NaiveDate>) -> PolarsResult<Series> {
        let data: [Option<i32>; 1] = [date.map(Self::date_to_i32)];
        Series::new(name.into(), data).cast(&DataType::Date)
    }

    pub(crate) fn date_from_series(chunked: &DateChunked, row_idx: usize) -> Option<NaiveDate> {
        chunked.get(row_idx).map(Self::date_from_i32)
    }

    fn vec_from_string_list(list: &ListChunked, row_idx: usize) -> PolarsResult<Vec<String>> {
        if let Some(series) = list.get_as_series(row_idx) {
            Ok(series
                .str()?
                .into_iter()
                .flatten()
                .map(ToOwned::to_owned)
                .collect())
        } else {
            Ok(Vec::new())
        }
    }

    pub(crate) fn date_to_i32(date: NaiveDate) -> i32 {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        (date - epoch).num_days() as i32
    }

    pub(crate) fn date_from_i32(days: i32) -> NaiveDate {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        epoch + Duration::days(days as i64)
    }
}
