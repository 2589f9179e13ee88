//! Monthly award budgets for staff members.
//!
//! Budgets reset lazily: a counter stamped with an older month reads as zero,
//! and the stored counter is only rewritten when an award goes through.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Calendar month used to stamp budget counters (`YYYY-MM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a YYYY-MM month")]
pub struct YearMonthParseError(String);

impl FromStr for YearMonth {
    type Err = YearMonthParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || YearMonthParseError(raw.to_string());
        let (year, month) = raw.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        YearMonth::new(year, month).ok_or_else(invalid)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// An admin's monthly award allowance and what has been spent from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminBudget {
    pub monthly_award_limit: i64,
    pub points_awarded_this_month: i64,
    pub last_reset_month: YearMonth,
}

impl AdminBudget {
    pub fn new(monthly_award_limit: i64, current_month: YearMonth) -> Self {
        Self {
            monthly_award_limit,
            points_awarded_this_month: 0,
            last_reset_month: current_month,
        }
    }

    /// Points already awarded in `current_month`; a stale stamp reads as zero.
    pub fn effective_used(&self, current_month: YearMonth) -> i64 {
        if self.last_reset_month == current_month {
            self.points_awarded_this_month
        } else {
            0
        }
    }

    pub fn remaining(&self, current_month: YearMonth) -> i64 {
        self.monthly_award_limit
            .saturating_sub(self.effective_used(current_month))
            .max(0)
    }

    pub fn check_award(&self, requested: i64, current_month: YearMonth) -> AwardDecision {
        let used = self.effective_used(current_month);
        let total = match used.checked_add(requested) {
            Some(total) if total <= self.monthly_award_limit => total,
            _ => {
                return AwardDecision::Denied {
                    remaining_points: self.monthly_award_limit.saturating_sub(used),
                };
            }
        };

        AwardDecision::Allowed {
            updated: AdminBudget {
                monthly_award_limit: self.monthly_award_limit,
                points_awarded_this_month: total,
                last_reset_month: current_month,
            },
        }
    }
}

/// Outcome of checking an award request against a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwardDecision {
    /// Caller persists `updated` once the award is applied.
    Allowed { updated: AdminBudget },
    Denied { remaining_points: i64 },
}
