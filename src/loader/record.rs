//! One row of the sample-data CSV.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::schema::{CHANNELS, COUNTRIES, OPERATING_SYSTEMS};
use crate::value::Value;

/// `date,channel,country,os,impressions,clicks,installs,spend,revenue`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CsvRecord {
    pub date: NaiveDate,
    pub channel: String,
    pub country: String,
    #[serde(rename = "os", alias = "operating_system")]
    pub operating_system: String,
    pub impressions: i64,
    pub clicks: i64,
    pub installs: i64,
    pub spend: f64,
    pub revenue: f64,
}

impl CsvRecord {
    /// Reject values the fact table must never hold.
    pub fn validate(&self) -> Result<(), String> {
        for (name, n) in [
            ("impressions", self.impressions),
            ("clicks", self.clicks),
            ("installs", self.installs),
        ] {
            if n < 0 {
                return Err(format!("{} must not be negative, got {}", name, n));
            }
        }
        for (name, x) in [("spend", self.spend), ("revenue", self.revenue)] {
            if !x.is_finite() || x < 0.0 {
                return Err(format!("{} must be a non-negative number, got {}", name, x));
            }
        }
        for (name, s) in [
            ("channel", &self.channel),
            ("country", &self.country),
            ("os", &self.operating_system),
        ] {
            if s.trim().is_empty() {
                return Err(format!("{} must not be empty", name));
            }
        }
        Ok(())
    }

    /// The attribute value this record carries for a dimension table.
    pub fn dimension_value(&self, table: &str) -> Option<&str> {
        match table {
            CHANNELS => Some(&self.channel),
            COUNTRIES => Some(&self.country),
            OPERATING_SYSTEMS => Some(&self.operating_system),
            _ => None,
        }
    }

    /// The value this record carries for a fact measure or the date column.
    pub fn fact_value(&self, column: &str) -> Option<Value> {
        Some(match column {
            "date" => Value::Date(self.date),
            "impressions" => Value::Integer(self.impressions),
            "clicks" => Value::Integer(self.clicks),
            "installs" => Value::Integer(self.installs),
            "spend" => Value::Real(self.spend),
            "revenue" => Value::Real(self.revenue),
            _ => return None,
        })
    }
}
