//! Evaluation analysis: quality metrics over a record set.
//!
//! This is a reporting aid for the presentation layer. It never influences
//! the rollup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregator::RollupStats;
use crate::status::StatusValue;
use crate::types::EvaluationRecord;

/// Failure rate (percent) above which the record set is flagged as failing.
pub const HIGH_FAILURE_RATE: f64 = 50.0;

/// Failure rate (percent) above which the record set needs attention.
pub const MODERATE_FAILURE_RATE: f64 = 30.0;

/// Record count below which coverage is considered limited.
pub const MIN_EVALUATIONS: usize = 20;

const HIGH_FAILURE_PENALTY: u8 = 30;
const MODERATE_FAILURE_PENALTY: u8 = 15;
const LIMITED_DATA_PENALTY: u8 = 10;

/// Summary of a record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationAnalysis {
    pub total_evaluations: usize,

    /// Records per status; N/A records are not counted
    pub status_distribution: BTreeMap<StatusValue, usize>,

    /// Share of RED among applicable records, in percent
    pub failure_rate: Option<f64>,

    /// 0-100, starting at 100 and reduced by each finding
    pub quality_score: u8,

    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
}

impl EvaluationAnalysis {
    pub fn count(&self, status: StatusValue) -> usize {
        self.status_distribution.get(&status).copied().unwrap_or(0)
    }
}

/// Analyze a record set.
pub fn analyze(records: &[EvaluationRecord]) -> EvaluationAnalysis {
    let mut status_distribution = BTreeMap::new();
    for record in records.iter().filter(|r| r.status.is_applicable()) {
        *status_distribution.entry(record.status).or_insert(0) += 1;
    }

    let mut recommendations = Vec::new();
    let mut warnings = Vec::new();
    let mut quality_score: u8 = 100;

    let applicable: usize = status_distribution.values().sum();
    let failure_rate = (applicable > 0).then(|| {
        let red = status_distribution
            .get(&StatusValue::Red)
            .copied()
            .unwrap_or(0);
        red as f64 * 100.0 / applicable as f64
    });

    if let Some(rate) = failure_rate {
        if rate > HIGH_FAILURE_RATE {
            recommendations.push(format!(
                "High failure rate detected ({:.1}%). Consider reviewing test procedures or requirements.",
                rate
            ));
            quality_score = quality_score.saturating_sub(HIGH_FAILURE_PENALTY);
        } else if rate > MODERATE_FAILURE_RATE {
            recommendations.push(format!(
                "Moderate failure rate ({:.1}%). Some operations may need attention.",
                rate
            ));
            quality_score = quality_score.saturating_sub(MODERATE_FAILURE_PENALTY);
        } else {
            recommendations.push(format!(
                "Good test performance ({:.1}% pass rate).",
                100.0 - rate
            ));
        }
    }

    if records.len() < MIN_EVALUATIONS {
        warnings.push("Limited evaluation data. Consider testing more operations.".to_string());
        quality_score = quality_score.saturating_sub(LIMITED_DATA_PENALTY);
    }

    EvaluationAnalysis {
        total_evaluations: records.len(),
        status_distribution,
        failure_rate,
        quality_score,
        recommendations,
        warnings,
    }
}

/// Summary lines describing an aggregation run.
pub fn insights(stats: &RollupStats) -> Vec<String> {
    let mut lines = Vec::new();

    let sub_operations = stats.sub_operations_resolved;
    let parents = stats.parents_resolved();

    if sub_operations > 0 || parents > 0 {
        lines.push(format!(
            "Updated {} sub-operations and {} parent operations",
            sub_operations, parents
        ));
    } else {
        lines.push("No operations could be resolved from the supplied records".to_string());
    }

    if stats.parents_from_children > 0 {
        lines.push(format!(
            "{} parent statuses were calculated from sub-operation results",
            stats.parents_from_children
        ));
    }

    if stats.parents_from_direct > 0 {
        lines.push(format!(
            "{} parent statuses fell back to their own evaluation",
            stats.parents_from_direct
        ));
    }

    if stats.unlinked_sub_operations > 0 {
        lines.push(format!(
            "{} sub-operations could not be linked to a parent",
            stats.unlinked_sub_operations
        ));
    }

    if stats.records_skipped > 0 {
        lines.push(format!(
            "{} records were skipped because their code could not be read",
            stats.records_skipped
        ));
    }

    if !stats.unmatched_codes.is_empty() {
        let codes: Vec<&str> = stats.unmatched_codes.iter().map(|c| c.as_str()).collect();
        lines.push(format!(
            "{} evaluated codes are not in the catalog: {}",
            codes.len(),
            codes.join(", ")
        ));
    }

    lines
}
