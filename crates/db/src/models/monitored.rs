//! Row shapes of the monitored datasets.
//!
//! Numeric columns are `NUMERIC` in storage and selected as
//! `DOUBLE PRECISION`; every non-key column may be NULL.

use gridwatch_core::monitored::{
    MonitoredRecord, COL_CONSUMPTION_MWH, COL_DATA_SOURCE, COL_ENERGY_TYPE, COL_HUMIDITY,
    COL_PRESSURE, COL_REGION, COL_TEMPERATURE, COL_TIMESTAMP, COL_WIND_SPEED,
};
use gridwatch_core::types::{DbId, Timestamp};
use serde::Deserialize;
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Energy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow)]
pub struct EnergyRow {
    pub id: DbId,
    pub region: Option<String>,
    pub timestamp: Option<Timestamp>,
    pub consumption_mwh: Option<f64>,
    pub energy_type: Option<String>,
    pub data_source: Option<String>,
}

impl From<EnergyRow> for MonitoredRecord {
    fn from(row: EnergyRow) -> Self {
        MonitoredRecord::new(row.id)
            .with_opt(COL_REGION, row.region)
            .with_opt(COL_TIMESTAMP, row.timestamp)
            .with_opt(COL_CONSUMPTION_MWH, row.consumption_mwh)
            .with_opt(COL_ENERGY_TYPE, row.energy_type)
            .with_opt(COL_DATA_SOURCE, row.data_source)
    }
}

/// DTO for inserting an energy row (ingestion fixtures and tests).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateEnergyRow {
    pub region: Option<String>,
    pub timestamp: Option<Timestamp>,
    pub consumption_mwh: Option<f64>,
    pub energy_type: Option<String>,
    pub data_source: Option<String>,
}

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow)]
pub struct WeatherRow {
    pub id: DbId,
    pub region: Option<String>,
    pub timestamp: Option<Timestamp>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub pressure: Option<f64>,
}

impl From<WeatherRow> for MonitoredRecord {
    fn from(row: WeatherRow) -> Self {
        MonitoredRecord::new(row.id)
            .with_opt(COL_REGION, row.region)
            .with_opt(COL_TIMESTAMP, row.timestamp)
            .with_opt(COL_TEMPERATURE, row.temperature)
            .with_opt(COL_HUMIDITY, row.humidity)
            .with_opt(COL_WIND_SPEED, row.wind_speed)
            .with_opt(COL_PRESSURE, row.pressure)
    }
}

/// DTO for inserting a weather row (ingestion fixtures and tests).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateWeatherRow {
    pub region: Option<String>,
    pub timestamp: Option<Timestamp>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub pressure: Option<f64>,
}
