//! Monitored table contract.
//!
//! The energy and weather tables are owned by the ingestion side of the
//! system. This module describes the parts of their schema the quality
//! engine depends on: column types, required columns, the natural key used
//! for duplicate detection, and the evaluation window.

use std::collections::BTreeMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::rules::{ColumnRule, RuleKind};
use crate::types::{DbId, Timestamp};

pub const ENERGY_CONSUMPTION: &str = "energy_consumption";
pub const WEATHER_DATA: &str = "weather_data";

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

pub const COL_REGION: &str = "region";
pub const COL_TIMESTAMP: &str = "timestamp";
pub const COL_CONSUMPTION_MWH: &str = "consumption_mwh";
pub const COL_ENERGY_TYPE: &str = "energy_type";
pub const COL_DATA_SOURCE: &str = "data_source";
pub const COL_TEMPERATURE: &str = "temperature";
pub const COL_HUMIDITY: &str = "humidity";
pub const COL_WIND_SPEED: &str = "wind_speed";
pub const COL_PRESSURE: &str = "pressure";

/// Storage type of a monitored column, used to decide which rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Number,
    Text,
    Timestamp,
}

/// A column of a monitored table.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const ENERGY_COLUMNS: &[ColumnDef] = &[
    ColumnDef { name: COL_REGION, kind: ColumnKind::Text },
    ColumnDef { name: COL_TIMESTAMP, kind: ColumnKind::Timestamp },
    ColumnDef { name: COL_CONSUMPTION_MWH, kind: ColumnKind::Number },
    ColumnDef { name: COL_ENERGY_TYPE, kind: ColumnKind::Text },
    ColumnDef { name: COL_DATA_SOURCE, kind: ColumnKind::Text },
];

const WEATHER_COLUMNS: &[ColumnDef] = &[
    ColumnDef { name: COL_REGION, kind: ColumnKind::Text },
    ColumnDef { name: COL_TIMESTAMP, kind: ColumnKind::Timestamp },
    ColumnDef { name: COL_TEMPERATURE, kind: ColumnKind::Number },
    ColumnDef { name: COL_HUMIDITY, kind: ColumnKind::Number },
    ColumnDef { name: COL_WIND_SPEED, kind: ColumnKind::Number },
    ColumnDef { name: COL_PRESSURE, kind: ColumnKind::Number },
];

// ---------------------------------------------------------------------------
// MonitoredTable
// ---------------------------------------------------------------------------

/// One of the external datasets evaluated by the quality engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitoredTable {
    EnergyConsumption,
    WeatherData,
}

/// Every monitored table, in evaluation order.
pub const ALL_TABLES: &[MonitoredTable] =
    &[MonitoredTable::EnergyConsumption, MonitoredTable::WeatherData];

impl MonitoredTable {
    /// Physical table name.
    pub fn name(self) -> &'static str {
        match self {
            Self::EnergyConsumption => ENERGY_CONSUMPTION,
            Self::WeatherData => WEATHER_DATA,
        }
    }

    /// Resolve a table name. Unknown names are a configuration error.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            ENERGY_CONSUMPTION => Ok(Self::EnergyConsumption),
            WEATHER_DATA => Ok(Self::WeatherData),
            _ => Err(CoreError::Validation(format!(
                "Unknown table: '{name}'. Monitored tables: {ENERGY_CONSUMPTION}, {WEATHER_DATA}"
            ))),
        }
    }

    /// How far back each pass looks. Weather goes stale on a shorter horizon.
    pub fn window(self) -> Duration {
        match self {
            Self::EnergyConsumption => Duration::days(30),
            Self::WeatherData => Duration::days(7),
        }
    }

    pub fn columns(self) -> &'static [ColumnDef] {
        match self {
            Self::EnergyConsumption => ENERGY_COLUMNS,
            Self::WeatherData => WEATHER_COLUMNS,
        }
    }

    pub fn column(self, name: &str) -> Option<&'static ColumnDef> {
        self.columns().iter().find(|c| c.name == name)
    }

    /// Columns that must all be non-null for a record to count as complete.
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            Self::EnergyConsumption => &[COL_CONSUMPTION_MWH, COL_REGION, COL_ENERGY_TYPE],
            Self::WeatherData => &[COL_TEMPERATURE, COL_REGION],
        }
    }

    /// Natural key: records sharing all of these values are duplicates.
    pub fn key_columns(self) -> &'static [&'static str] {
        match self {
            Self::EnergyConsumption => &[COL_REGION, COL_TIMESTAMP, COL_ENERGY_TYPE],
            Self::WeatherData => &[COL_REGION, COL_TIMESTAMP],
        }
    }

    /// Accuracy rules used when no active rule is configured for the table.
    pub fn default_rules(self) -> Vec<ColumnRule> {
        match self {
            Self::EnergyConsumption => vec![
                ColumnRule::new(COL_CONSUMPTION_MWH, RuleKind::Range { min: 0.0, max: 1_000_000.0 }),
                ColumnRule::new(COL_TIMESTAMP, RuleKind::NotNull),
            ],
            Self::WeatherData => vec![
                ColumnRule::new(COL_TEMPERATURE, RuleKind::Range { min: -50.0, max: 150.0 }),
                ColumnRule::new(COL_HUMIDITY, RuleKind::Range { min: 0.0, max: 100.0 }),
                ColumnRule::new(COL_PRESSURE, RuleKind::Positive),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A non-null value read from a monitored column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Time(Timestamp),
}

impl FieldValue {
    /// Stable string form used when grouping records by natural key.
    fn key_fragment(&self) -> String {
        match self {
            Self::Number(n) => n.to_bits().to_string(),
            Self::Text(s) => s.clone(),
            Self::Time(t) => t.to_rfc3339(),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Timestamp> for FieldValue {
    fn from(value: Timestamp) -> Self {
        Self::Time(value)
    }
}

/// One row of a monitored table. Absent columns are NULL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitoredRecord {
    pub id: DbId,
    pub fields: BTreeMap<&'static str, FieldValue>,
}

impl MonitoredRecord {
    pub fn new(id: DbId) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    /// Set a column value.
    pub fn with(mut self, column: &'static str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(column, value.into());
        self
    }

    /// Set a nullable column value; `None` leaves the column NULL.
    pub fn with_opt<V: Into<FieldValue>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(column, v),
            None => self,
        }
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.get(column)
    }

    pub fn is_null(&self, column: &str) -> bool {
        !self.fields.contains_key(column)
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        match self.get(column) {
            Some(FieldValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        match self.get(column) {
            Some(FieldValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Natural-key tuple for duplicate grouping. NULLs group together.
    pub fn natural_key(&self, table: MonitoredTable) -> Vec<Option<String>> {
        table
            .key_columns()
            .iter()
            .map(|c| self.get(c).map(FieldValue::key_fragment))
            .collect()
    }
}
