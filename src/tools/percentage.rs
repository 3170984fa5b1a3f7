//! Percentage calculator.
//!
//! Three modes: X% of Y, X is what percent of Y, and percentage change.
//! Division by zero yields 0 rather than an error, as the calculator shows "0%".

use serde::Serialize;

/// Round to two decimals and drop trailing zeros ("12.5", "3", "-0.33").
pub fn format_number(value: f64) -> String {
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// What is `percent`% of `number`?
pub fn percent_of(percent: f64, number: f64) -> f64 {
    percent / 100.0 * number
}

/// `part` is what percent of `whole`?
pub fn what_percent(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    part / whole * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increase,
    Decrease,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentChange {
    pub value: f64,
    pub trend: Trend,
    /// Signed display, e.g. "+25%" or "-10%".
    pub display: String,
}

/// Relative change from `original` to `new`.
pub fn percent_change(original: f64, new: f64) -> PercentChange {
    if original == 0.0 {
        return PercentChange {
            value: 0.0,
            trend: Trend::Unchanged,
            display: "0%".to_string(),
        };
    }

    let change = (new - original) / original * 100.0;
    let trend = if change > 0.0 {
        Trend::Increase
    } else if change < 0.0 {
        Trend::Decrease
    } else {
        Trend::Unchanged
    };
    let sign = if change >= 0.0 { "+" } else { "" };

    PercentChange {
        value: change,
        trend,
        display: format!("{sign}{}%", format_number(change)),
    }
}

/// Calculator input, one variant per mode.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PercentageQuery {
    PercentOf { percent: f64, number: f64 },
    WhatPercent { part: f64, whole: f64 },
    Change { original: f64, new: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentageAnswer {
    pub value: f64,
    pub display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
}

impl PercentageQuery {
    pub fn evaluate(&self) -> PercentageAnswer {
        match *self {
            PercentageQuery::PercentOf { percent, number } => {
                let value = percent_of(percent, number);
                PercentageAnswer {
                    value,
                    display: format_number(value),
                    trend: None,
                }
            }
            PercentageQuery::WhatPercent { part, whole } => {
                let value = what_percent(part, whole);
                PercentageAnswer {
                    value,
                    display: format!("{}%", format_number(value)),
                    trend: None,
                }
            }
            PercentageQuery::Change { original, new } => {
                let change = percent_change(original, new);
                PercentageAnswer {
                    value: change.value,
                    display: change.display,
                    trend: Some(change.trend),
                }
            }
        }
    }
}
