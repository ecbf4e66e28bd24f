use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Date32Type, Int32Type, Int64Type, TimeUnit, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType,
};
use arrow::record_batch::RecordBatch;
use chrono::{NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::model::{BikeShareData, DailyRecord, HourlyRecord};
use crate::config::DataSource;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Loaded datasets, one per source, kept for the life of the process.
static CACHE: OnceLock<Mutex<BTreeMap<DataSource, Arc<BikeShareData>>>> = OnceLock::new();

/// Load both tables of `source`, reusing an earlier result for the same
/// source without touching storage again.
pub fn load(source: &DataSource) -> Result<Arc<BikeShareData>> {
    let cache = CACHE.get_or_init(Default::default);

    if let Some(data) = cache
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(source)
    {
        log::debug!("Reusing cached dataset for {source:?}");
        return Ok(Arc::clone(data));
    }

    let data = Arc::new(load_uncached(source)?);
    cache
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(source.clone(), Arc::clone(&data));
    Ok(data)
}

fn load_uncached(source: &DataSource) -> Result<BikeShareData> {
    let daily = load_daily(&source.day)
        .with_context(|| format!("loading daily table {}", source.day.display()))?;
    if daily.is_empty() {
        bail!("Daily table {} contains no rows", source.day.display());
    }
    let hourly = load_hourly(&source.hour)
        .with_context(|| format!("loading hourly table {}", source.hour.display()))?;

    let data = BikeShareData::new(daily, hourly);

    let inconsistent = data.inconsistent_daily_rows();
    if inconsistent > 0 {
        log::warn!("{inconsistent} daily rows have cnt != registered + casual");
    }

    log::info!(
        "Loaded {} daily rows from {} and {} hourly rows from {}",
        data.daily.len(),
        source.day.display(),
        data.hourly.len(),
        source.hour.display()
    );
    Ok(data)
}

/// Load the daily table. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one record per line (primary format)
/// * `.json`    – `[{ "date": "2011-01-01", "year": 2011, ... }, ...]`
/// * `.parquet` – one column per field
pub fn load_daily(path: &Path) -> Result<Vec<DailyRecord>> {
    match Format::of(path)? {
        Format::Csv => convert_rows(read_csv::<DailyRow>(path)?),
        Format::Json => convert_rows(read_json::<DailyRow>(path)?),
        Format::Parquet => read_parquet(path, daily_from_batch),
    }
}

/// Load the hourly table. Same formats as [`load_daily`].
pub fn load_hourly(path: &Path) -> Result<Vec<HourlyRecord>> {
    match Format::of(path)? {
        Format::Csv => convert_rows(read_csv::<HourlyRow>(path)?),
        Format::Json => convert_rows(read_json::<HourlyRow>(path)?),
        Format::Parquet => read_parquet(path, hourly_from_batch),
    }
}

enum Format {
    Csv,
    Json,
    Parquet,
}

impl Format {
    fn of(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            "parquet" | "pq" => Ok(Format::Parquet),
            other => bail!("Unsupported file extension: .{other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Cell parsing shared by every format
// ---------------------------------------------------------------------------

/// Parse a date column value, keeping only the calendar date.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and
/// `MM/DD/YYYY`.
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(dt.date());
        }
    }
    NaiveDate::parse_from_str(text, "%m/%d/%Y")
        .with_context(|| format!("'{text}' is not a recognised date"))
}

/// `registered + casual` must fit in a count, whatever `cnt` says.
fn check_user_counts(registered: u64, casual: u64) -> Result<()> {
    if registered.checked_add(casual).is_none() {
        bail!("registered {registered} + casual {casual} overflows");
    }
    Ok(())
}

fn check_hour(hour: u8) -> Result<u8> {
    if hour > 23 {
        bail!("hour {hour} is outside 0-23");
    }
    Ok(hour)
}

// ---------------------------------------------------------------------------
// CSV / JSON loaders (serde rows)
// ---------------------------------------------------------------------------

/// A deserialized storage row that still needs validation.
trait RawRow: DeserializeOwned {
    type Record;

    fn into_record(self) -> Result<Self::Record>;
}

/// Season labels are text in cleaned data but numeric codes in the raw
/// release; both are kept as text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Label {
    Number(i64),
    Text(String),
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        match label {
            Label::Number(n) => n.to_string(),
            Label::Text(s) => s,
        }
    }
}

/// `0/1` or `true/false`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Number(i64),
}

impl Flag {
    fn into_bool(self) -> Result<bool> {
        match self {
            Flag::Bool(b) => Ok(b),
            Flag::Number(0) => Ok(false),
            Flag::Number(1) => Ok(true),
            Flag::Number(n) => bail!("{n} is not a 0/1 flag"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DailyRow {
    date: String,
    year: i32,
    season: Label,
    workingday: Flag,
    registered: u64,
    casual: u64,
    cnt: u64,
}

impl RawRow for DailyRow {
    type Record = DailyRecord;

    fn into_record(self) -> Result<DailyRecord> {
        check_user_counts(self.registered, self.casual)?;
        Ok(DailyRecord {
            date: parse_date(&self.date).context("column 'date'")?,
            year: self.year,
            season: self.season.into(),
            working_day: self.workingday.into_bool().context("column 'workingday'")?,
            registered: self.registered,
            casual: self.casual,
            cnt: self.cnt,
        })
    }
}

#[derive(Debug, Deserialize)]
struct HourlyRow {
    date: String,
    year: i32,
    hour: u8,
    cnt: u64,
}

impl RawRow for HourlyRow {
    type Record = HourlyRecord;

    fn into_record(self) -> Result<HourlyRecord> {
        Ok(HourlyRecord {
            date: parse_date(&self.date).context("column 'date'")?,
            year: self.year,
            hour: check_hour(self.hour).context("column 'hour'")?,
            cnt: self.cnt,
        })
    }
}

fn convert_rows<R: RawRow>(rows: Vec<R>) -> Result<Vec<R::Record>> {
    rows.into_iter()
        .enumerate()
        .map(|(row, raw)| raw.into_record().with_context(|| format!("Row {row}")))
        .collect()
}

/// CSV layout: header row with column names; extra columns are ignored.
fn read_csv<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    reader
        .deserialize()
        .enumerate()
        .map(|(row, result)| result.with_context(|| format!("Row {row}")))
        .collect()
}

/// Records-oriented JSON, the layout of `df.to_json(orient='records')`.
fn read_json<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    serde_json::from_str(&text).context("parsing JSON")
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Read every record batch of a Parquet file through `convert`.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`); `date` may be Utf8, Date32 or a
/// Timestamp of any unit.
///
/// `convert` appends to `out`, so `out.len()` is the 0-based row number
/// across batches, matching the CSV/JSON row numbering.
fn read_parquet<T>(
    path: &Path,
    convert: fn(&RecordBatch, &mut Vec<T>) -> Result<()>,
) -> Result<Vec<T>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        convert(&batch, &mut rows)?;
    }
    Ok(rows)
}

fn daily_from_batch(batch: &RecordBatch, out: &mut Vec<DailyRecord>) -> Result<()> {
    let date = column(batch, "date")?;
    let year = column(batch, "year")?;
    let season = column(batch, "season")?;
    let workingday = column(batch, "workingday")?;
    let registered = column(batch, "registered")?;
    let casual = column(batch, "casual")?;
    let cnt = column(batch, "cnt")?;

    for row in 0..batch.num_rows() {
        let row_no = out.len();
        let record = (|| -> Result<DailyRecord> {
            let registered = count_cell(registered, row, "registered")?;
            let casual = count_cell(casual, row, "casual")?;
            check_user_counts(registered, casual)?;
            Ok(DailyRecord {
                date: date_cell(date, row, "date")?,
                year: year_cell(year, row)?,
                season: label_cell(season, row, "season")?,
                working_day: flag_cell(workingday, row, "workingday")?,
                registered,
                casual,
                cnt: count_cell(cnt, row, "cnt")?,
            })
        })()
        .with_context(|| format!("Row {row_no}"))?;
        out.push(record);
    }
    Ok(())
}

fn hourly_from_batch(batch: &RecordBatch, out: &mut Vec<HourlyRecord>) -> Result<()> {
    let date = column(batch, "date")?;
    let year = column(batch, "year")?;
    let hour = column(batch, "hour")?;
    let cnt = column(batch, "cnt")?;

    for row in 0..batch.num_rows() {
        let row_no = out.len();
        let record = (|| -> Result<HourlyRecord> {
            let raw_hour = int_cell(hour, row, "hour")?;
            let hour_of_day = u8::try_from(raw_hour)
                .ok()
                .and_then(|h| check_hour(h).ok())
                .with_context(|| format!("hour {raw_hour} is outside 0-23"))?;
            Ok(HourlyRecord {
                date: date_cell(date, row, "date")?,
                year: year_cell(year, row)?,
                hour: hour_of_day,
                cnt: count_cell(cnt, row, "cnt")?,
            })
        })()
        .with_context(|| format!("Row {row_no}"))?;
        out.push(record);
    }
    Ok(())
}

// -- Arrow helpers --

fn column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b ArrayRef> {
    batch
        .column_by_name(name)
        .with_context(|| format!("Parquet file missing '{name}' column"))
}

fn non_null(col: &ArrayRef, row: usize, name: &str) -> Result<()> {
    if col.is_null(row) {
        bail!("null value in '{name}'");
    }
    Ok(())
}

fn int_cell(col: &ArrayRef, row: usize, name: &str) -> Result<i64> {
    non_null(col, row, name)?;
    match col.data_type() {
        DataType::Int32 => Ok(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => Ok(col.as_primitive::<Int64Type>().value(row)),
        other => bail!("Column '{name}' is {other:?}, expected Int32 or Int64"),
    }
}

fn count_cell(col: &ArrayRef, row: usize, name: &str) -> Result<u64> {
    let value = int_cell(col, row, name)?;
    u64::try_from(value).with_context(|| format!("negative count {value} in '{name}'"))
}

fn year_cell(col: &ArrayRef, row: usize) -> Result<i32> {
    let value = int_cell(col, row, "year")?;
    i32::try_from(value).with_context(|| format!("year {value} out of range"))
}

fn date_cell(col: &ArrayRef, row: usize, name: &str) -> Result<NaiveDate> {
    non_null(col, row, name)?;
    match col.data_type() {
        DataType::Date32 => col
            .as_primitive::<Date32Type>()
            .value_as_date(row)
            .with_context(|| format!("'{name}' holds an out-of-range date")),
        DataType::Utf8 => parse_date(col.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => parse_date(col.as_string::<i64>().value(row)),
        DataType::Timestamp(unit, _) => {
            let datetime = match unit {
                TimeUnit::Second => col
                    .as_primitive::<TimestampSecondType>()
                    .value_as_datetime(row),
                TimeUnit::Millisecond => col
                    .as_primitive::<TimestampMillisecondType>()
                    .value_as_datetime(row),
                TimeUnit::Microsecond => col
                    .as_primitive::<TimestampMicrosecondType>()
                    .value_as_datetime(row),
                TimeUnit::Nanosecond => col
                    .as_primitive::<TimestampNanosecondType>()
                    .value_as_datetime(row),
            };
            datetime
                .map(|dt| dt.date())
                .with_context(|| format!("'{name}' holds an out-of-range timestamp"))
        }
        other => bail!("Column '{name}' is {other:?}, expected Date32, Timestamp or Utf8"),
    }
}

fn label_cell(col: &ArrayRef, row: usize, name: &str) -> Result<String> {
    non_null(col, row, name)?;
    match col.data_type() {
        DataType::Utf8 => Ok(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 | DataType::Int64 => Ok(int_cell(col, row, name)?.to_string()),
        other => bail!("Column '{name}' is {other:?}, expected text or integer"),
    }
}

fn flag_cell(col: &ArrayRef, row: usize, name: &str) -> Result<bool> {
    non_null(col, row, name)?;
    match col.data_type() {
        DataType::Boolean => Ok(col.as_boolean().value(row)),
        _ => Flag::Number(int_cell(col, row, name)?).into_bool(),
    }
}
