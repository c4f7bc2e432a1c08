//! Partition naming and range bounds
//!
//! Layout:
//! - base table: `log` (partitioned by range on `created`)
//! - partitions: `log_{YYYYMMDDHHMM}`, one per calendar minute
//!
//! The minute stamp is fixed-width and most-significant-first, so comparing
//! two partition names as strings orders them the same way as the minutes
//! they cover. Every name also sorts after the base table.
use chrono::{Datelike, Duration, NaiveDateTime, Timelike};

use super::error::{RepositoryError, Result};

pub const BASE_TABLE: &str = "log";
pub const PARTITION_PREFIX: &str = "log_";

const MINUTE_STAMP: &str = "%Y%m%d%H%M";
const STAMP_WIDTH: usize = 12;
const BOUND_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One minute-wide partition of the log table
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Partition {
    name: String,
    start: NaiveDateTime,
}

impl Partition {
    /// Partition that owns rows created at `created`
    pub fn for_timestamp(created: NaiveDateTime) -> Result<Self> {
        if !(0..=9999).contains(&created.year()) {
            return Err(RepositoryError::TimestampOutOfRange(created));
        }

        let start = truncate_to_minute(created);
        Ok(Self {
            name: format!("{PARTITION_PREFIX}{}", start.format(MINUTE_STAMP)),
            start,
        })
    }

    /// Parse `log_{YYYYMMDDHHMM}` back into a partition
    pub fn from_name(name: &str) -> Option<Self> {
        let stamp = name.strip_prefix(PARTITION_PREFIX)?;
        if stamp.len() != STAMP_WIDTH || !stamp.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // chrono needs a seconds field to build a full datetime
        let start = NaiveDateTime::parse_from_str(&format!("{stamp}00"), "%Y%m%d%H%M%S").ok()?;
        Some(Self {
            name: name.to_string(),
            start,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inclusive lower bound (`minute:00`)
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Exclusive upper bound (the next minute)
    pub fn end(&self) -> NaiveDateTime {
        self.start + Duration::minutes(1)
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start <= ts && ts < self.end()
    }

    /// Lower bound as a SQL timestamp literal body
    pub fn start_literal(&self) -> String {
        self.start.format(BOUND_FORMAT).to_string()
    }

    pub fn end_literal(&self) -> String {
        self.end().format(BOUND_FORMAT).to_string()
    }
}

/// Name of the partition holding rows created at `created`
pub fn partition_name(created: NaiveDateTime) -> Result<String> {
    Partition::for_timestamp(created).map(|p| p.name)
}

/// True for the base table and for well-formed partition names
pub fn is_log_table(name: &str) -> bool {
    name == BASE_TABLE || Partition::from_name(name).is_some()
}

fn truncate_to_minute(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}
