//! Archive periods and zip table extraction.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use zip::ZipArchive;

use super::bulk_errors::BulkError;

/// One monthly disclosure period (the regulator archives by month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArchivePeriod {
    pub year: i32,
    pub month: u32,
}

impl ArchivePeriod {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Cache/lookup key, e.g. `2024-01`.
    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Compact token used in archive file names, e.g. `202401`.
    pub fn file_token(&self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }

    /// Whole months between this period and `asof` (0 for the current
    /// month, negative when the period lies in the future).
    pub fn age_in_months(&self, asof: NaiveDate) -> i32 {
        (asof.year() - self.year) * 12 + asof.month() as i32 - self.month as i32
    }

    fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// The `count` periods ending at `asof`'s month, ascending.
    pub fn trailing(asof: NaiveDate, count: usize) -> Vec<Self> {
        let mut periods = Vec::with_capacity(count);
        let mut current = Self::from_date(asof);
        for _ in 0..count {
            periods.push(current);
            current = current.previous();
        }
        periods.reverse();
        periods
    }
}

impl fmt::Display for ArchivePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Extracts the first entry whose name contains `fragment` from a zip
/// archive. `Ok(None)` means the archive simply does not carry that table.
pub fn read_archive_entry(bytes: &[u8], fragment: &str) -> Result<Option<Vec<u8>>, BulkError> {
    let cursor = std::io::Cursor::new(bytes);
    let mut archive = ZipArchive::new(cursor).map_err(|e| BulkError::Archive(e.to_string()))?;

    let entry_name = archive
        .file_names()
        .find(|name| name.contains(fragment))
        .map(str::to_string);

    match entry_name {
        Some(name) => {
            let mut entry = archive
                .by_name(&name)
                .map_err(|e| BulkError::Archive(e.to_string()))?;
            let mut buffer = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut buffer)
                .map_err(|e| BulkError::Archive(e.to_string()))?;
            Ok(Some(buffer))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn trailing_periods_cross_year_boundaries() {
        let periods = ArchivePeriod::trailing(date(2024, 2, 15), 4);
        let keys: Vec<String> = periods.iter().map(|p| p.key()).collect();
        assert_eq!(keys, vec!["2023-11", "2023-12", "2024-01", "2024-02"]);
    }

    #[test]
    fn age_in_months_is_calendar_based() {
        let period = ArchivePeriod::new(2023, 11).unwrap();
        assert_eq!(period.age_in_months(date(2024, 2, 1)), 3);
        assert_eq!(period.age_in_months(date(2023, 11, 30)), 0);
        assert_eq!(period.age_in_months(date(2023, 10, 1)), -1);
    }

    #[test]
    fn rejects_invalid_months() {
        assert!(ArchivePeriod::new(2024, 0).is_none());
        assert!(ArchivePeriod::new(2024, 13).is_none());
        assert!(ArchivePeriod::new(2024, 12).is_some());
    }

    #[test]
    fn garbage_bytes_are_an_archive_error() {
        assert!(read_archive_entry(b"not a zip", "table").is_err());
    }
}
