//! Metric calculator: completeness, accuracy and consistency of a record
//! population.
//!
//! The calculator is pure. The caller loads the records inside the table's
//! evaluation window and supplies the active rules; the calculator returns
//! scores, the counts behind them, per-rule pass rates and the
//! pass/warning/error breakdown shown on the dashboard.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::error::CoreError;
use crate::monitored::{MonitoredRecord, MonitoredTable};
use crate::rules::{ColumnRule, CompiledRule};
use crate::scoring::{percentage, round1};

// ---------------------------------------------------------------------------
// Metric names
// ---------------------------------------------------------------------------

pub const METRIC_COMPLETENESS: &str = "completeness";
pub const METRIC_ACCURACY: &str = "accuracy";
pub const METRIC_CONSISTENCY: &str = "consistency";
pub const METRIC_OVERALL: &str = "overall_quality_score";

/// Pseudo table name under which the overall score is recorded.
pub const SYSTEM_OVERALL_TABLE: &str = "system_overall";

/// `issues_by_type` key for records missing a required column.
pub const ISSUE_KEY_MISSING_REQUIRED: &str = "missing_required";
/// `issues_by_type` key for duplicate extras under the natural key.
pub const ISSUE_KEY_DUPLICATES: &str = "duplicates";

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Pass count for a single rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleOutcome {
    pub rule: String,
    pub column: String,
    pub rule_type: String,
    pub valid_count: i64,
    pub validity_percentage: f64,
}

/// Per-table pass/warning/error breakdown.
///
/// - errors: records failing at least one rule
/// - warnings: records passing every rule but incomplete or duplicated
/// - passed: everything else
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationBreakdown {
    pub total_records: i64,
    pub passed: i64,
    pub warnings: i64,
    pub errors: i64,
    pub pass_rate: f64,
    pub issues_by_type: BTreeMap<String, i64>,
}

/// Scores and supporting counts for one table over one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableScores {
    pub table_name: String,
    pub total_records: i64,
    pub complete_records: i64,
    pub accurate_records: i64,
    pub duplicate_count: i64,
    pub completeness_score: f64,
    pub accuracy_score: f64,
    pub consistency_score: f64,
    pub rule_outcomes: Vec<RuleOutcome>,
    pub validation: ValidationBreakdown,
}

impl TableScores {
    /// `(metric_name, score, valid_records)` for each dimension.
    pub fn dimensions(&self) -> [(&'static str, f64, i64); 3] {
        [
            (METRIC_COMPLETENESS, self.completeness_score, self.complete_records),
            (METRIC_ACCURACY, self.accuracy_score, self.accurate_records),
            (
                METRIC_CONSISTENCY,
                self.consistency_score,
                self.total_records - self.duplicate_count,
            ),
        ]
    }
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// Evaluates a monitored table's population against its rules.
#[derive(Debug)]
pub struct MetricCalculator {
    table: MonitoredTable,
    rules: Vec<CompiledRule>,
}

impl MetricCalculator {
    /// Prepare a calculator. Every rule must fit the table schema.
    pub fn new(table: MonitoredTable, rules: &[ColumnRule]) -> Result<Self, CoreError> {
        let rules = rules
            .iter()
            .map(|r| {
                r.validate_for(table)?;
                r.compile()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { table, rules })
    }

    pub fn table(&self) -> MonitoredTable {
        self.table
    }

    fn is_complete(&self, record: &MonitoredRecord) -> bool {
        self.table
            .required_columns()
            .iter()
            .all(|c| !record.is_null(c))
    }

    /// Compute all three scores in a single pass over `records`.
    pub fn evaluate(&self, records: &[MonitoredRecord]) -> TableScores {
        let total = records.len() as i64;
        let mut complete = 0i64;
        let mut accurate = 0i64;
        let mut rule_valid = vec![0i64; self.rules.len()];
        let mut seen_keys: HashMap<Vec<Option<String>>, i64> = HashMap::new();
        let mut duplicates = 0i64;
        let mut errors = 0i64;
        let mut warnings = 0i64;

        for record in records {
            let is_complete = self.is_complete(record);
            if is_complete {
                complete += 1;
            }

            let mut all_pass = true;
            for (i, rule) in self.rules.iter().enumerate() {
                if rule.passes(record) {
                    rule_valid[i] += 1;
                } else {
                    all_pass = false;
                }
            }
            if all_pass {
                accurate += 1;
            }

            let seen = seen_keys.entry(record.natural_key(self.table)).or_insert(0);
            let is_duplicate = *seen > 0;
            *seen += 1;
            if is_duplicate {
                duplicates += 1;
            }

            if !all_pass {
                errors += 1;
            } else if !is_complete || is_duplicate {
                warnings += 1;
            }
        }

        let rule_outcomes: Vec<RuleOutcome> = self
            .rules
            .iter()
            .zip(&rule_valid)
            .map(|(r, &valid)| RuleOutcome {
                rule: r.rule.label(),
                column: r.rule.column.clone(),
                rule_type: r.rule.rule_type().to_string(),
                valid_count: valid,
                validity_percentage: percentage(valid, total),
            })
            .collect();

        let mut issues_by_type: BTreeMap<String, i64> = rule_outcomes
            .iter()
            .map(|o| (o.rule.clone(), total - o.valid_count))
            .collect();
        issues_by_type.insert(ISSUE_KEY_MISSING_REQUIRED.to_string(), total - complete);
        issues_by_type.insert(ISSUE_KEY_DUPLICATES.to_string(), duplicates);

        let passed = total - errors - warnings;
        let pass_rate = if total > 0 {
            round1(passed as f64 / total as f64 * 100.0)
        } else {
            0.0
        };

        let consistency_score = if total > 0 {
            percentage(total - duplicates, total)
        } else {
            0.0
        };

        TableScores {
            table_name: self.table.name().to_string(),
            total_records: total,
            complete_records: complete,
            accurate_records: accurate,
            duplicate_count: duplicates,
            completeness_score: percentage(complete, total),
            accuracy_score: percentage(accurate, total),
            consistency_score,
            rule_outcomes,
            validation: ValidationBreakdown {
                total_records: total,
                passed,
                warnings,
                errors,
                pass_rate,
                issues_by_type,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::monitored::{
        COL_CONSUMPTION_MWH, COL_ENERGY_TYPE, COL_HUMIDITY, COL_PRESSURE, COL_REGION,
        COL_TEMPERATURE, COL_TIMESTAMP,
    };
    use crate::rules::RuleKind;

    fn energy_record(id: i64, hour: i64, consumption: Option<f64>) -> MonitoredRecord {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        MonitoredRecord::new(id)
            .with(COL_REGION, "CAL")
            .with(COL_TIMESTAMP, base + Duration::hours(hour))
            .with(COL_ENERGY_TYPE, "electricity")
            .with_opt(COL_CONSUMPTION_MWH, consumption)
    }

    fn energy_calculator() -> MetricCalculator {
        let table = MonitoredTable::EnergyConsumption;
        MetricCalculator::new(table, &table.default_rules()).unwrap()
    }

    #[test]
    fn empty_population_scores_zero() {
        let scores = energy_calculator().evaluate(&[]);
        assert_eq!(scores.total_records, 0);
        assert_eq!(scores.completeness_score, 0.0);
        assert_eq!(scores.accuracy_score, 0.0);
        assert_eq!(scores.consistency_score, 0.0);
        assert_eq!(scores.validation.pass_rate, 0.0);
        assert!(scores.rule_outcomes.iter().all(|o| o.validity_percentage == 0.0));
    }

    #[test]
    fn one_group_of_three_among_ten_gives_eighty_consistency() {
        let mut records: Vec<_> = (0..7).map(|i| energy_record(i, i, Some(10.0))).collect();
        for id in 7..10 {
            records.push(energy_record(id, 100, Some(10.0)));
        }
        let scores = energy_calculator().evaluate(&records);
        assert_eq!(scores.duplicate_count, 2);
        assert_eq!(scores.consistency_score, 80.0);
    }

    #[test]
    fn reference_energy_population() {
        // 100 records: 10 with null consumption (incomplete, out of range),
        // 5 more with out-of-range consumption, 85 clean.
        let mut records = Vec::new();
        for i in 0..100 {
            let consumption = match i {
                0..=9 => None,
                10..=14 => Some(2_000_000.0),
                _ => Some(500.0),
            };
            records.push(energy_record(i, i, consumption));
        }
        let scores = energy_calculator().evaluate(&records);
        assert_eq!(scores.completeness_score, 90.0);
        assert_eq!(scores.accuracy_score, 85.0);
        assert_eq!(scores.consistency_score, 100.0);
        assert_eq!(scores.complete_records, 90);
        assert_eq!(scores.accurate_records, 85);
    }

    fn weather_record(id: i64, region: &str, temperature: f64, humidity: f64) -> MonitoredRecord {
        MonitoredRecord::new(id)
            .with(COL_REGION, region)
            .with(COL_TIMESTAMP, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
            .with(COL_TEMPERATURE, temperature)
            .with(COL_HUMIDITY, humidity)
            .with(COL_PRESSURE, 1013.0)
    }

    fn weather_calculator() -> MetricCalculator {
        let table = MonitoredTable::WeatherData;
        MetricCalculator::new(table, &table.default_rules()).unwrap()
    }

    #[test]
    fn accuracy_is_conjunction_of_rules() {
        let records = vec![
            weather_record(1, "CAL", 70.0, 40.0),
            // fails humidity only
            weather_record(2, "TEX", 70.0, 140.0),
            // fails temperature only
            weather_record(3, "NY", 200.0, 40.0),
            weather_record(4, "FLA", -10.0, 90.0),
        ];
        let scores = weather_calculator().evaluate(&records);
        // Temperature and humidity each pass 3 of 4, but only 2 pass both.
        let outcome = |label: &str| {
            scores
                .rule_outcomes
                .iter()
                .find(|o| o.rule == label)
                .unwrap()
                .valid_count
        };
        assert_eq!(outcome("temperature_range_check"), 3);
        assert_eq!(outcome("humidity_range_check"), 3);
        assert_eq!(outcome("pressure_positive_check"), 4);
        assert_eq!(scores.accuracy_score, 50.0);
        assert_eq!(scores.validation.errors, 2);
        assert_eq!(scores.validation.passed, 2);
    }

    #[test]
    fn weather_accuracy_requires_positive_pressure() {
        let zero = weather_record(1, "CAL", 70.0, 40.0).with(COL_PRESSURE, 0.0);
        let mut missing = weather_record(2, "TEX", 70.0, 40.0);
        missing.fields.remove(COL_PRESSURE);
        let scores = weather_calculator().evaluate(&[zero, missing]);
        assert_eq!(scores.completeness_score, 100.0);
        assert_eq!(scores.accuracy_score, 0.0);
        assert_eq!(scores.validation.issues_by_type["pressure_positive_check"], 2);
    }

    #[test]
    fn validation_breakdown_separates_warnings_from_errors() {
        let table = MonitoredTable::EnergyConsumption;
        let calc = MetricCalculator::new(
            table,
            &[ColumnRule::new(COL_CONSUMPTION_MWH, RuleKind::Range { min: 0.0, max: 100.0 })],
        )
        .unwrap();
        let records = vec![
            energy_record(1, 0, Some(10.0)),
            energy_record(2, 0, Some(10.0)), // duplicate -> warning
            energy_record(3, 1, Some(500.0)), // out of range -> error
            MonitoredRecord::new(4)
                .with(COL_TIMESTAMP, Utc::now())
                .with(COL_CONSUMPTION_MWH, 5.0), // missing region/type -> warning
        ];
        let scores = calc.evaluate(&records);
        let v = &scores.validation;
        assert_eq!((v.passed, v.warnings, v.errors), (1, 2, 1));
        assert_eq!(v.pass_rate, 25.0);
        assert_eq!(v.issues_by_type["consumption_mwh_range_check"], 1);
        assert_eq!(v.issues_by_type[ISSUE_KEY_DUPLICATES], 1);
        assert_eq!(v.issues_by_type[ISSUE_KEY_MISSING_REQUIRED], 1);
    }

    #[test]
    fn scores_stay_within_bounds() {
        let records: Vec<_> = (0..37)
            .map(|i| energy_record(i, i % 5, if i % 3 == 0 { None } else { Some(-1.0) }))
            .collect();
        let scores = energy_calculator().evaluate(&records);
        for (_, score, valid) in scores.dimensions() {
            assert!((0.0..=100.0).contains(&score));
            assert!(valid >= 0 && valid <= scores.total_records);
        }
    }

    #[test]
    fn rule_for_wrong_table_is_rejected() {
        let rules = [ColumnRule::new(COL_HUMIDITY, RuleKind::NotNull)];
        assert!(MetricCalculator::new(MonitoredTable::EnergyConsumption, &rules).is_err());
    }

    #[test]
    fn evaluation_is_deterministic() {
        let records: Vec<_> = (0..20).map(|i| energy_record(i, i / 2, Some(i as f64))).collect();
        let calc = energy_calculator();
        assert_eq!(calc.evaluate(&records), calc.evaluate(&records));
    }
}
