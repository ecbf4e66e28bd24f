use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, BooleanArray, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate, Weekday};
use parquet::arrow::ArrowWriter;
use serde::Serialize;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform noise factor in `[1 - spread, 1 + spread]`.
    fn jitter(&mut self, spread: f64) -> f64 {
        1.0 + spread * (2.0 * self.next_f64() - 1.0)
    }
}

#[derive(Debug, Serialize)]
struct DayRow {
    date: String,
    year: i32,
    month: u32,
    season: &'static str,
    weekday: String,
    workingday: u8,
    casual: u64,
    registered: u64,
    cnt: u64,
}

#[derive(Debug, Serialize)]
struct HourRow {
    date: String,
    year: i32,
    hour: u8,
    workingday: u8,
    casual: u64,
    registered: u64,
    cnt: u64,
}

fn season_of(month: u32) -> &'static str {
    match month {
        3..=5 => "Spring",
        6..=8 => "Summer",
        9..=11 => "Fall",
        _ => "Winter",
    }
}

/// Fixed-date federal holidays; enough to put some weekdays in the
/// weekend/holiday group.
fn is_holiday(date: NaiveDate) -> bool {
    matches!(
        (date.month(), date.day()),
        (1, 1) | (7, 4) | (11, 11) | (12, 25)
    )
}

fn season_factor(season: &str) -> f64 {
    match season {
        "Summer" => 1.4,
        "Fall" => 1.2,
        "Spring" => 1.0,
        _ => 0.5,
    }
}

/// Relative demand per hour: commute peaks on working days, an afternoon
/// hump otherwise.
fn hour_profile(hour: u8, working: bool) -> (f64, f64) {
    let h = f64::from(hour);
    let bump = |centre: f64, width: f64| (-(h - centre).powi(2) / (2.0 * width * width)).exp();
    if working {
        let registered = 0.05 + 1.0 * bump(8.0, 1.2) + 1.2 * bump(17.5, 1.5) + 0.3 * bump(12.5, 2.0);
        let casual = 0.02 + 0.25 * bump(15.0, 3.0);
        (registered, casual)
    } else {
        let registered = 0.05 + 0.6 * bump(13.5, 3.5);
        let casual = 0.03 + 0.7 * bump(14.0, 3.0);
        (registered, casual)
    }
}

fn generate(rng: &mut SimpleRng) -> Result<(Vec<DayRow>, Vec<HourRow>)> {
    let first = NaiveDate::from_ymd_opt(2011, 1, 1).context("start date")?;
    let last = NaiveDate::from_ymd_opt(2012, 12, 31).context("end date")?;

    let mut days = Vec::new();
    let mut hours = Vec::new();

    for date in first.iter_days().take_while(|d| *d <= last) {
        let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
        let working = !weekend && !is_holiday(date);
        let season = season_of(date.month());
        // Ridership grows in the second year.
        let growth = if date.year() == 2012 { 1.6 } else { 1.0 };
        let scale = 180.0 * season_factor(season) * growth * rng.jitter(0.25);

        let mut day_registered = 0;
        let mut day_casual = 0;
        for hour in 0..24u8 {
            let (reg_w, cas_w) = hour_profile(hour, working);
            let registered = (scale * reg_w * rng.jitter(0.2)).round() as u64;
            let casual = (scale * cas_w * rng.jitter(0.3)).round() as u64;
            day_registered += registered;
            day_casual += casual;
            hours.push(HourRow {
                date: date.to_string(),
                year: date.year(),
                hour,
                workingday: u8::from(working),
                casual,
                registered,
                cnt: registered + casual,
            });
        }

        days.push(DayRow {
            date: date.to_string(),
            year: date.year(),
            month: date.month(),
            season,
            weekday: date.weekday().to_string(),
            workingday: u8::from(working),
            casual: day_casual,
            registered: day_registered,
            cnt: day_registered + day_casual,
        });
    }

    Ok((days, hours))
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(path: &Path, schema: Arc<Schema>, columns: Vec<ArrayRef>) -> Result<()> {
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file =
        std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn counts<T>(rows: &[T], f: impl Fn(&T) -> u64) -> ArrayRef {
    Arc::new(Int64Array::from(
        rows.iter().map(|r| f(r) as i64).collect::<Vec<_>>(),
    ))
}

fn write_day_parquet(path: &Path, days: &[DayRow]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("date", DataType::Utf8, false),
        Field::new("year", DataType::Int64, false),
        Field::new("season", DataType::Utf8, false),
        Field::new("workingday", DataType::Boolean, false),
        Field::new("casual", DataType::Int64, false),
        Field::new("registered", DataType::Int64, false),
        Field::new("cnt", DataType::Int64, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(
            days.iter().map(|d| d.date.as_str()).collect::<Vec<_>>(),
        )),
        counts(days, |d| d.year as u64),
        Arc::new(StringArray::from(
            days.iter().map(|d| d.season).collect::<Vec<_>>(),
        )),
        Arc::new(BooleanArray::from(
            days.iter().map(|d| d.workingday == 1).collect::<Vec<_>>(),
        )),
        counts(days, |d| d.casual),
        counts(days, |d| d.registered),
        counts(days, |d| d.cnt),
    ];
    write_parquet(path, schema, columns)
}

fn write_hour_parquet(path: &Path, hours: &[HourRow]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("date", DataType::Utf8, false),
        Field::new("year", DataType::Int64, false),
        Field::new("hour", DataType::Int64, false),
        Field::new("cnt", DataType::Int64, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(
            hours.iter().map(|h| h.date.as_str()).collect::<Vec<_>>(),
        )),
        counts(hours, |h| h.year as u64),
        counts(hours, |h| u64::from(h.hour)),
        counts(hours, |h| h.cnt),
    ];
    write_parquet(path, schema, columns)
}

/// Usage: `generate_sample [OUTPUT_DIR] [--parquet]`
fn main() -> Result<()> {
    let mut out_dir = PathBuf::from(".");
    let mut parquet = false;
    for arg in std::env::args().skip(1) {
        if arg == "--parquet" {
            parquet = true;
        } else {
            out_dir = PathBuf::from(arg);
        }
    }
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let (days, hours) = generate(&mut rng)?;

    write_csv(&out_dir.join("day_cleaned.csv"), &days)?;
    write_csv(&out_dir.join("hour_cleaned.csv"), &hours)?;
    println!(
        "Wrote {} daily and {} hourly rows to {}",
        days.len(),
        hours.len(),
        out_dir.display()
    );

    if parquet {
        write_day_parquet(&out_dir.join("day_cleaned.parquet"), &days)?;
        write_hour_parquet(&out_dir.join("hour_cleaned.parquet"), &hours)?;
        println!("Wrote Parquet copies to {}", out_dir.display());
    }

    Ok(())
}
