//! Aggregation output models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::OTHER_LABEL;

/// Date-indexed table of weight columns (one per asset or sector) for one
/// fund. Missing (date, column) combinations hold zero, so a stacked
/// composition over the columns sums to the captured total at every date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightPivot {
    /// Ascending, unique.
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<String>,
    /// One row per date, one cell per column.
    pub rows: Vec<Vec<Decimal>>,
}

impl WeightPivot {
    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Mean weight of every column across the full date range.
    pub fn column_means(&self) -> Vec<Decimal> {
        if self.dates.is_empty() {
            return vec![Decimal::ZERO; self.columns.len()];
        }
        let len = Decimal::from(self.dates.len() as i64);
        (0..self.columns.len())
            .map(|col| {
                let sum: Decimal = self.rows.iter().map(|row| row[col]).sum();
                sum / len
            })
            .collect()
    }

    /// Keeps the `n` columns with the highest mean weight and folds the
    /// rest into one "Other" column, bounding series cardinality no matter
    /// how many distinct assets appear historically. Ranking ties break on
    /// column name so the result is stable.
    pub fn collapse_top_n(&self, n: usize) -> WeightPivot {
        if self.columns.len() <= n {
            return self.clone();
        }

        let means = self.column_means();
        let mut ranked: Vec<usize> = (0..self.columns.len()).collect();
        ranked.sort_by(|&a, &b| {
            means[b]
                .cmp(&means[a])
                .then_with(|| self.columns[a].cmp(&self.columns[b]))
        });

        let kept = &ranked[..n];
        let folded = &ranked[n..];

        let mut columns: Vec<String> = kept.iter().map(|&i| self.columns[i].clone()).collect();
        columns.push(OTHER_LABEL.to_string());

        let rows: Vec<Vec<Decimal>> = self
            .rows
            .iter()
            .map(|row| {
                let mut out: Vec<Decimal> = kept.iter().map(|&i| row[i]).collect();
                out.push(folded.iter().map(|&i| row[i]).sum());
                out
            })
            .collect();

        WeightPivot {
            dates: self.dates.clone(),
            columns,
            rows,
        }
    }
}

/// One line of a fund's current-portfolio view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub asset_id: String,
    pub sector: String,
    pub value: Decimal,
    pub weight_pct: Decimal,
}

/// A fund's holdings restricted to its single most recent date, sorted
/// descending by weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundSnapshot {
    pub fund_id: String,
    pub date: NaiveDate,
    pub entries: Vec<SnapshotEntry>,
}

/// One point of a historical overlap series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapPoint {
    pub date: NaiveDate,
    pub overlap: Decimal,
}

/// One asset held in the current top holdings of every compared fund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonHolding {
    pub asset_id: String,
    pub sector: String,
    /// Current weight per compared fund, parallel to the queried fund ids.
    pub weights: Vec<Decimal>,
}
