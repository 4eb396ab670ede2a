use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::{DateParseError, LoadError, LoadResult};
use crate::models::PropertyRecord;

pub const OWNER_COLUMN: &str = "OWNER";
pub const SALE_DATE_COLUMN: &str = "SALE_DATE";
pub const LATITUDE_COLUMN: &str = "LATITUDE";
pub const LONGITUDE_COLUMN: &str = "LONGITUDE";

pub const SALE_PRICE_COLUMN: &str = "SALE_PRICE";
pub const YEAR_BUILT_COLUMN: &str = "YEAR_BUILT";
pub const ADDRESS_COLUMN: &str = "ADDRESS";

// Four-digit-year forms come first; `%y` only gets a string they rejected.
const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%m/%d/%y",
    "%m-%d-%y",
];
const TIME_SUFFIXES: [&str; 7] = [
    " %H:%M:%S",
    " %H:%M:%S%.f",
    " %H:%M",
    " %I:%M:%S %p",
    " %I:%M %p",
    "T%H:%M:%S",
    "T%H:%M:%S%.f",
];
// chrono's `%Y` takes one to four digits, so "03/15/21" would otherwise
// land in year 21.
const EARLIEST_PLAUSIBLE_YEAR: i32 = 1000;

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadStats {
    pub rows_read: usize,
    pub skipped_blank_owner: usize,
    pub unparsed_dates: usize,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub source: PathBuf,
    pub columns: Vec<String>,
    pub records: Vec<PropertyRecord>,
    pub stats: LoadStats,
}

impl Dataset {
    pub fn from_records(columns: Vec<String>, records: Vec<PropertyRecord>) -> Self {
        let stats = LoadStats {
            rows_read: records.len(),
            ..LoadStats::default()
        };
        Self {
            source: PathBuf::new(),
            columns,
            records,
            stats,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    pub fn has_coordinates(&self) -> bool {
        self.has_column(LATITUDE_COLUMN) && self.has_column(LONGITUDE_COLUMN)
    }

    pub fn filter<F>(&self, predicate: F) -> Vec<&PropertyRecord>
    where
        F: Fn(&PropertyRecord) -> bool,
    {
        self.records.iter().filter(|record| predicate(record)).collect()
    }

    pub fn owned_by(&self, owner: &str) -> Vec<&PropertyRecord> {
        self.filter(|record| record.owner == owner)
    }
}

pub fn load(path: &Path) -> LoadResult<Dataset> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = read_from(file, path)?;

    log::info!(
        "loaded {} properties from {} ({} columns)",
        dataset.len(),
        path.display(),
        dataset.columns.len()
    );
    if dataset.stats.skipped_blank_owner > 0 {
        log::warn!(
            "skipped {} rows with an empty {} value",
            dataset.stats.skipped_blank_owner,
            OWNER_COLUMN
        );
    }
    if dataset.stats.unparsed_dates > 0 {
        log::warn!(
            "{} sale dates could not be parsed and were treated as missing",
            dataset.stats.unparsed_dates
        );
    }

    Ok(dataset)
}

pub fn read_from<R: Read>(input: R, path: &Path) -> LoadResult<Dataset> {
    let csv_error = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let columns: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();

    let position = |name: &str| columns.iter().position(|column| column == name);
    let owner_idx = position(OWNER_COLUMN).ok_or_else(|| LoadError::MissingColumn {
        path: path.to_path_buf(),
        column: OWNER_COLUMN.to_string(),
    })?;
    let sale_date_idx = position(SALE_DATE_COLUMN);
    let latitude_idx = position(LATITUDE_COLUMN);
    let longitude_idx = position(LONGITUDE_COLUMN);

    let mut stats = LoadStats::default();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        stats.rows_read += 1;

        let owner = row.get(owner_idx).unwrap_or_default();
        if owner.is_empty() {
            stats.skipped_blank_owner += 1;
            continue;
        }

        let sale_date = match sale_date_idx.and_then(|idx| row.get(idx)) {
            Some(raw) if !raw.trim().is_empty() => match parse_sale_date(raw) {
                Ok(date) => Some(date),
                Err(err) => {
                    log::debug!("row {}: {err}", stats.rows_read);
                    stats.unparsed_dates += 1;
                    None
                }
            },
            _ => None,
        };

        let extra = columns
            .iter()
            .enumerate()
            .filter(|(idx, _)| {
                *idx != owner_idx
                    && Some(*idx) != sale_date_idx
                    && Some(*idx) != latitude_idx
                    && Some(*idx) != longitude_idx
            })
            .map(|(idx, column)| {
                (
                    column.clone(),
                    row.get(idx).unwrap_or_default().to_string(),
                )
            })
            .collect::<BTreeMap<_, _>>();

        records.push(PropertyRecord {
            owner: owner.to_string(),
            sale_date,
            latitude: latitude_idx.and_then(|idx| parse_coordinate(row.get(idx))),
            longitude: longitude_idx.and_then(|idx| parse_coordinate(row.get(idx))),
            extra,
        });
    }

    let mut dataset = Dataset::from_records(columns, records);
    dataset.source = path.to_path_buf();
    dataset.stats = stats;
    Ok(dataset)
}

/// Parses the date formats commonly found in assessor exports, with or
/// without a trailing time of day. The time component is discarded.
pub fn parse_sale_date(raw: &str) -> Result<NaiveDate, DateParseError> {
    let value = raw.trim();

    if value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()) {
        let year = value[0..4].parse::<i32>().ok();
        let month = value[4..6].parse::<u32>().ok();
        let day = value[6..8].parse::<u32>().ok();
        if let (Some(year), Some(month), Some(day)) = (year, month, day) {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Ok(date);
            }
        }
        return Err(DateParseError(raw.to_string()));
    }

    let plausible = |date: NaiveDate| date.year() >= EARLIEST_PLAUSIBLE_YEAR;
    for format in DATE_FORMATS {
        if let Some(date) = NaiveDate::parse_from_str(value, format)
            .ok()
            .filter(|date| plausible(*date))
        {
            return Ok(date);
        }
        for suffix in TIME_SUFFIXES {
            let with_time = format!("{format}{suffix}");
            if let Some(date) = NaiveDateTime::parse_from_str(value, &with_time)
                .ok()
                .map(|datetime| datetime.date())
                .filter(|date| plausible(*date))
            {
                return Ok(date);
            }
        }
    }

    DateTime::parse_from_rfc3339(value)
        .map(|datetime| datetime.date_naive())
        .map_err(|_| DateParseError(raw.to_string()))
}

fn parse_coordinate(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}
