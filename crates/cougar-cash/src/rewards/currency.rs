//! Points are the stored unit; students and staff see dollars.

use serde::{Deserialize, Serialize};

/// Fixed display rate: one Cougar Buck dollar is ten points.
pub const POINTS_PER_DOLLAR: i64 = 10;

/// Converts a staff-entered dollar amount into whole points.
pub fn dollars_to_points(dollars: f64) -> i64 {
    (dollars * POINTS_PER_DOLLAR as f64).round() as i64
}

/// Amount typed by staff, either in raw points or in dollars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Amount {
    Points(i64),
    Dollars(f64),
}

impl Amount {
    pub fn points(self) -> i64 {
        match self {
            Amount::Points(points) => points,
            Amount::Dollars(dollars) => dollars_to_points(dollars),
        }
    }
}

/// Renders points as `$D.CC`, keeping the sign for deductions.
pub fn format_dollars(points: i64) -> String {
    let sign = if points < 0 { "-" } else { "" };
    let cents = u128::from(points.unsigned_abs()) * (100 / POINTS_PER_DOLLAR as u128);
    format!("{sign}${}.{:02}", cents / 100, cents % 100)
}
