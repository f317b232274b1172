//! Read access to the monitored datasets.
//!
//! The quality engine never writes these tables; the insert helpers exist
//! for fixtures and integration tests.

use gridwatch_core::monitored::{MonitoredRecord, MonitoredTable};
use gridwatch_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::monitored::{CreateEnergyRow, CreateWeatherRow, EnergyRow, WeatherRow};

const ENERGY_COLUMNS: &str = "\
    id, region, timestamp, consumption_mwh::DOUBLE PRECISION AS consumption_mwh, \
    energy_type, data_source";

const WEATHER_COLUMNS: &str = "\
    id, region, timestamp, \
    temperature::DOUBLE PRECISION AS temperature, \
    humidity::DOUBLE PRECISION AS humidity, \
    wind_speed::DOUBLE PRECISION AS wind_speed, \
    pressure::DOUBLE PRECISION AS pressure";

pub struct MonitoredTableRepo;

impl MonitoredTableRepo {
    /// Load every record with `timestamp >= since`, in insertion order.
    pub async fn load_window(
        pool: &PgPool,
        table: MonitoredTable,
        since: Timestamp,
    ) -> Result<Vec<MonitoredRecord>, sqlx::Error> {
        match table {
            MonitoredTable::EnergyConsumption => {
                let query = format!(
                    "SELECT {ENERGY_COLUMNS} FROM energy_consumption \
                     WHERE timestamp >= $1 ORDER BY id"
                );
                let rows = sqlx::query_as::<_, EnergyRow>(&query)
                    .bind(since)
                    .fetch_all(pool)
                    .await?;
                Ok(rows.into_iter().map(MonitoredRecord::from).collect())
            }
            MonitoredTable::WeatherData => {
                let query = format!(
                    "SELECT {WEATHER_COLUMNS} FROM weather_data \
                     WHERE timestamp >= $1 ORDER BY id"
                );
                let rows = sqlx::query_as::<_, WeatherRow>(&query)
                    .bind(since)
                    .fetch_all(pool)
                    .await?;
                Ok(rows.into_iter().map(MonitoredRecord::from).collect())
            }
        }
    }

    /// When the newest record of `table` was ingested, if any.
    pub async fn latest_ingested_at(
        pool: &PgPool,
        table: MonitoredTable,
    ) -> Result<Option<Timestamp>, sqlx::Error> {
        let query = format!("SELECT MAX(created_at) FROM {}", table.name());
        sqlx::query_scalar::<_, Option<Timestamp>>(&query)
            .fetch_one(pool)
            .await
    }

    pub async fn insert_energy(pool: &PgPool, row: &CreateEnergyRow) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO energy_consumption \
                (region, timestamp, consumption_mwh, energy_type, data_source) \
             VALUES ($1, $2, $3::NUMERIC, $4, $5) \
             RETURNING id",
        )
        .bind(&row.region)
        .bind(row.timestamp)
        .bind(row.consumption_mwh)
        .bind(&row.energy_type)
        .bind(&row.data_source)
        .fetch_one(pool)
        .await
    }

    pub async fn insert_weather(
        pool: &PgPool,
        row: &CreateWeatherRow,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO weather_data \
                (region, timestamp, temperature, humidity, wind_speed, pressure) \
             VALUES ($1, $2, $3::NUMERIC, $4::NUMERIC, $5::NUMERIC, $6::NUMERIC) \
             RETURNING id",
        )
        .bind(&row.region)
        .bind(row.timestamp)
        .bind(row.temperature)
        .bind(row.humidity)
        .bind(row.wind_speed)
        .bind(row.pressure)
        .fetch_one(pool)
        .await
    }
}
