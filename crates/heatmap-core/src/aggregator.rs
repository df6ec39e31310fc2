//! Aggregator: rolls evaluation records up through the operation hierarchy.
//!
//! The aggregator applies strict, order-independent rules:
//! 1. A sub-operation's status is the worst of its own records
//! 2. A parent's status is the worst of its resolved sub-operations
//! 3. Else a parent falls back to the worst of its own records
//! 4. Else the parent is unresolved
//!
//! Sub-operations are always reported at their own level, even when they
//! cannot be linked to a parent in the catalog. Only the rollup contribution
//! is lost, and it is counted in [`RollupStats::unlinked_sub_operations`].

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::HeatmapConfig;
use crate::presenter::Presenter;
use crate::status::{worst, StatusValue};
use crate::types::{
    EvaluationRecord, OperationCode, RawRecord, ResolutionSource, ResolvedNode, Role,
    RollupResult,
};

/// Counts describing one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupStats {
    /// Rows handed to the aggregator, including skipped ones
    pub records_total: usize,

    /// Rows dropped because their code could not be normalized
    pub records_skipped: usize,

    pub sub_operations_resolved: usize,
    pub sub_operations_unresolved: usize,

    /// Resolved sub-operations with no parent in the catalog
    pub unlinked_sub_operations: usize,

    pub parents_from_children: usize,
    pub parents_from_direct: usize,
    pub parents_unresolved: usize,

    /// Record codes that are not in the catalog, sorted
    pub unmatched_codes: Vec<OperationCode>,
}

impl RollupStats {
    pub fn parents_resolved(&self) -> usize {
        self.parents_from_children + self.parents_from_direct
    }

    pub fn nodes_resolved(&self) -> usize {
        self.sub_operations_resolved + self.parents_resolved()
    }

    pub fn nodes_unresolved(&self) -> usize {
        self.sub_operations_unresolved + self.parents_unresolved
    }
}

/// Symbolic result of an aggregation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rollup {
    pub nodes: BTreeMap<OperationCode, ResolvedNode>,
    pub stats: RollupStats,
}

impl Rollup {
    pub fn get(&self, code: &str) -> Option<&ResolvedNode> {
        self.nodes.get(code)
    }

    /// Render every resolved node with `presenter`.
    pub fn render(&self, presenter: &dyn Presenter) -> Heatmap {
        let results = self
            .nodes
            .iter()
            .map(|(code, node)| {
                let display = presenter.present(node.status, node.role);
                let result = RollupResult {
                    code: code.clone(),
                    name: node.name.clone(),
                    role: node.role,
                    status: node.status,
                    source: node.source,
                    display_text: display.as_ref().map(|d| d.text.clone()),
                    display_color: display.map(|d| d.color),
                };
                (code.clone(), result)
            })
            .collect();

        Heatmap {
            results,
            stats: self.stats.clone(),
        }
    }
}

/// Rendered heat map: one result per resolved node, keyed by code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heatmap {
    pub results: BTreeMap<OperationCode, RollupResult>,
    pub stats: RollupStats,
}

impl Heatmap {
    pub fn get(&self, code: &str) -> Option<&RollupResult> {
        self.results.get(code)
    }

    /// Results in code order.
    pub fn iter(&self) -> impl Iterator<Item = &RollupResult> {
        self.results.values()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// The Aggregator resolves catalog nodes from evaluation records.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    emit_unresolved_parents: bool,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &HeatmapConfig) -> Self {
        Self::new().with_emit_unresolved_parents(config.emit_unresolved_parents)
    }

    /// Emit N/A results for parents with neither child nor direct data.
    pub fn with_emit_unresolved_parents(mut self, emit: bool) -> Self {
        self.emit_unresolved_parents = emit;
        self
    }

    /// Normalize raw rows, then aggregate them.
    ///
    /// Rows whose code cannot be normalized are skipped and counted.
    pub fn aggregate_raw(&self, catalog: &Catalog, rows: &[RawRecord]) -> Rollup {
        let records: Vec<EvaluationRecord> = rows
            .iter()
            .filter_map(|row| {
                let record = EvaluationRecord::from_raw(row);
                if record.is_none() {
                    debug!(
                        code = ?row.code,
                        operation = ?row.operation,
                        "Skipping record with unusable code"
                    );
                }
                record
            })
            .collect();

        let mut rollup = self.aggregate(catalog, &records);
        rollup.stats.records_total = rows.len();
        rollup.stats.records_skipped = rows.len() - records.len();
        rollup
    }

    /// Aggregate normalized records against `catalog`.
    ///
    /// # Arguments
    ///
    /// * `catalog` - The operations to resolve
    /// * `records` - Evaluation records; any number may share a code
    ///
    /// # Returns
    ///
    /// A [`Rollup`] with one node per resolved operation (plus unresolved
    /// parents when configured) and the run statistics.
    pub fn aggregate(&self, catalog: &Catalog, records: &[EvaluationRecord]) -> Rollup {
        let mut stats = RollupStats {
            records_total: records.len(),
            ..Default::default()
        };

        let records_by_code = group_by_code(records);

        let mut unmatched: Vec<OperationCode> = records_by_code
            .keys()
            .filter(|code| !catalog.contains(code.as_str()))
            .map(|code| (*code).clone())
            .collect();
        unmatched.sort();
        stats.unmatched_codes = unmatched;

        let mut nodes = BTreeMap::new();
        let mut child_statuses: HashMap<&OperationCode, Vec<StatusValue>> = HashMap::new();

        // Pass 1: sub-operations
        for node in catalog.sub_operations() {
            let status = records_by_code
                .get(&node.code)
                .map(|statuses| worst(statuses.iter().copied()))
                .unwrap_or(StatusValue::NotApplicable);

            if !status.is_applicable() {
                debug!(code = %node.code, "Sub-operation has no usable status");
                stats.sub_operations_unresolved += 1;
                continue;
            }

            stats.sub_operations_resolved += 1;

            match node
                .parent_code
                .as_ref()
                .filter(|parent| catalog.is_parent_code(parent.as_str()))
            {
                Some(parent) => child_statuses.entry(parent).or_default().push(status),
                None => {
                    warn!(
                        code = %node.code,
                        parent = ?node.parent_code,
                        "Sub-operation has no parent in catalog; reported without rollup"
                    );
                    stats.unlinked_sub_operations += 1;
                }
            }

            nodes.insert(
                node.code.clone(),
                ResolvedNode {
                    code: node.code.clone(),
                    name: node.name.clone(),
                    role: Role::SubOperation,
                    status,
                    source: ResolutionSource::Direct,
                },
            );
        }

        // Pass 2: parents
        for node in catalog.parents() {
            let (status, source) = match child_statuses.get(&node.code) {
                Some(children) => (worst(children.iter().copied()), ResolutionSource::Children),
                None => {
                    let own = records_by_code
                        .get(&node.code)
                        .map(|statuses| worst(statuses.iter().copied()))
                        .unwrap_or(StatusValue::NotApplicable);

                    if own.is_applicable() {
                        (own, ResolutionSource::Direct)
                    } else {
                        (StatusValue::NotApplicable, ResolutionSource::Unresolved)
                    }
                }
            };

            match source {
                ResolutionSource::Children => stats.parents_from_children += 1,
                ResolutionSource::Direct => stats.parents_from_direct += 1,
                ResolutionSource::Unresolved => {
                    debug!(code = %node.code, "Parent has neither child nor direct status");
                    stats.parents_unresolved += 1;
                    if !self.emit_unresolved_parents {
                        continue;
                    }
                }
            }

            nodes.insert(
                node.code.clone(),
                ResolvedNode {
                    code: node.code.clone(),
                    name: node.name.clone(),
                    role: Role::Parent,
                    status,
                    source,
                },
            );
        }

        info!(
            catalog = catalog.name(),
            records = stats.records_total,
            sub_operations = stats.sub_operations_resolved,
            parents = stats.parents_resolved(),
            unresolved = stats.nodes_unresolved(),
            unmatched = stats.unmatched_codes.len(),
            "Aggregation complete"
        );

        Rollup { nodes, stats }
    }
}

fn group_by_code(records: &[EvaluationRecord]) -> HashMap<&OperationCode, Vec<StatusValue>> {
    let mut grouped: HashMap<&OperationCode, Vec<StatusValue>> = HashMap::new();
    for record in records {
        grouped.entry(&record.code).or_default().push(record.status);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::{DisplayColor, MarkerPresenter};
    use crate::types::OperationNode;
    use proptest::prelude::*;

    fn code(text: &str) -> OperationCode {
        OperationCode::parse(text).unwrap()
    }

    fn record(text: &str, status: StatusValue) -> EvaluationRecord {
        EvaluationRecord::new(code(text), "test", status)
    }

    fn drive_away() -> Catalog {
        Catalog::new(
            "drive away",
            vec![
                OperationNode::parent(code("10100000")).with_name("Drive away"),
                OperationNode::sub_operation(code("10101300"), Some(code("10100000")))
                    .with_name("Creep"),
                OperationNode::sub_operation(code("10101100"), Some(code("10100000")))
                    .with_name("Standing start"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_sub_operation_takes_worst_record() {
        let records = vec![
            record("10101300", StatusValue::Red),
            record("10101300", StatusValue::Green),
        ];

        let rollup = Aggregator::new().aggregate(&drive_away(), &records);

        assert_eq!(rollup.get("10101300").unwrap().status, StatusValue::Red);
        assert_eq!(rollup.get("10100000").unwrap().status, StatusValue::Red);
        assert_eq!(
            rollup.get("10100000").unwrap().source,
            ResolutionSource::Children
        );
    }

    #[test]
    fn test_parent_takes_worst_child() {
        let records = vec![
            record("10101300", StatusValue::Green),
            record("10101100", StatusValue::Yellow),
        ];

        let rollup = Aggregator::new().aggregate(&drive_away(), &records);

        assert_eq!(rollup.get("10100000").unwrap().status, StatusValue::Yellow);
        assert_eq!(rollup.stats.parents_from_children, 1);
        assert_eq!(rollup.stats.sub_operations_resolved, 2);
    }

    #[test]
    fn test_children_win_over_direct_records() {
        let records = vec![
            record("10101300", StatusValue::Green),
            record("10100000", StatusValue::Red),
        ];

        let rollup = Aggregator::new().aggregate(&drive_away(), &records);

        let parent = rollup.get("10100000").unwrap();
        assert_eq!(parent.status, StatusValue::Green);
        assert_eq!(parent.source, ResolutionSource::Children);
    }

    #[test]
    fn test_parent_falls_back_to_direct_records() {
        let records = vec![record("10100000", StatusValue::Yellow)];

        let rollup = Aggregator::new().aggregate(&drive_away(), &records);

        let parent = rollup.get("10100000").unwrap();
        assert_eq!(parent.status, StatusValue::Yellow);
        assert_eq!(parent.source, ResolutionSource::Direct);
        assert_eq!(rollup.stats.parents_from_direct, 1);
    }

    #[test]
    fn test_not_applicable_children_do_not_count() {
        let records = vec![
            record("10101300", StatusValue::NotApplicable),
            record("10100000", StatusValue::Green),
        ];

        let rollup = Aggregator::new().aggregate(&drive_away(), &records);

        assert!(rollup.get("10101300").is_none());
        assert_eq!(rollup.stats.sub_operations_unresolved, 2);
        assert_eq!(
            rollup.get("10100000").unwrap().source,
            ResolutionSource::Direct
        );
    }

    #[test]
    fn test_unresolved_parent_omitted_by_default() {
        let rollup = Aggregator::new().aggregate(&drive_away(), &[]);

        assert!(rollup.nodes.is_empty());
        assert_eq!(rollup.stats.parents_unresolved, 1);
    }

    #[test]
    fn test_unresolved_parent_emitted_when_configured() {
        let rollup = Aggregator::new()
            .with_emit_unresolved_parents(true)
            .aggregate(&drive_away(), &[]);

        let parent = rollup.get("10100000").unwrap();
        assert_eq!(parent.status, StatusValue::NotApplicable);
        assert_eq!(parent.source, ResolutionSource::Unresolved);

        let heatmap = rollup.render(&MarkerPresenter::default());
        let result = heatmap.get("10100000").unwrap();
        assert_eq!(result.display_text, None);
        assert_eq!(result.display_color, None);
    }

    #[test]
    fn test_unlinked_sub_operation_still_reported() {
        let catalog = Catalog::new(
            "unlinked",
            vec![
                OperationNode::parent(code("10100000")),
                OperationNode::infer(code("101")),
                OperationNode::infer(code("10201300")),
            ],
        )
        .unwrap();
        let records = vec![
            record("101", StatusValue::Red),
            record("10201300", StatusValue::Yellow),
        ];

        let rollup = Aggregator::new().aggregate(&catalog, &records);

        assert_eq!(rollup.get("101").unwrap().status, StatusValue::Red);
        assert_eq!(rollup.get("10201300").unwrap().status, StatusValue::Yellow);
        assert!(rollup.get("10100000").is_none());
        assert_eq!(rollup.stats.unlinked_sub_operations, 2);
    }

    #[test]
    fn test_unmatched_codes_are_reported_sorted() {
        let records = vec![
            record("99990100", StatusValue::Red),
            record("10101300", StatusValue::Green),
            record("55550100", StatusValue::Red),
            record("99990100", StatusValue::Green),
        ];

        let rollup = Aggregator::new().aggregate(&drive_away(), &records);

        assert_eq!(
            rollup.stats.unmatched_codes,
            vec![code("55550100"), code("99990100")]
        );
        assert!(rollup.get("99990100").is_none());
    }

    #[test]
    fn test_aggregate_raw_counts_skipped_rows() {
        let rows = vec![
            RawRecord::new(10101300, "Creep", "RED"),
            RawRecord::new("not a code", "Broken", "RED"),
            RawRecord::new(10101100.0, "Standing start", "green"),
        ];

        let rollup = Aggregator::new().aggregate_raw(&drive_away(), &rows);

        assert_eq!(rollup.stats.records_total, 3);
        assert_eq!(rollup.stats.records_skipped, 1);
        assert_eq!(rollup.get("10101100").unwrap().status, StatusValue::Green);
        assert_eq!(rollup.get("10100000").unwrap().status, StatusValue::Red);
    }

    #[test]
    fn test_render_uses_presenter() {
        let records = vec![record("10101300", StatusValue::Green)];
        let heatmap = Aggregator::new()
            .aggregate(&drive_away(), &records)
            .render(&MarkerPresenter::default());

        let parent = heatmap.get("10100000").unwrap();
        assert_eq!(parent.display_text.as_deref(), Some("OK"));
        assert_eq!(parent.display_color, Some(DisplayColor::Green));
        assert_eq!(parent.name.as_deref(), Some("Drive away"));

        let creep = heatmap.get("10101300").unwrap();
        assert_eq!(creep.display_text.as_deref(), Some("●"));
        assert_eq!(heatmap.len(), 2);
    }

    fn status_strategy() -> impl Strategy<Value = StatusValue> {
        prop_oneof![
            Just(StatusValue::Red),
            Just(StatusValue::Yellow),
            Just(StatusValue::Green),
            Just(StatusValue::NotApplicable),
        ]
    }

    fn record_strategy() -> impl Strategy<Value = EvaluationRecord> {
        let codes = prop_oneof![
            Just("10100000"),
            Just("10101300"),
            Just("10101100"),
            Just("99990100"),
        ];
        (codes, status_strategy()).prop_map(|(text, status)| record(text, status))
    }

    proptest! {
        #[test]
        fn aggregate_is_idempotent(records in prop::collection::vec(record_strategy(), 0..24)) {
            let aggregator = Aggregator::new();
            let catalog = drive_away();
            prop_assert_eq!(
                aggregator.aggregate(&catalog, &records),
                aggregator.aggregate(&catalog, &records)
            );
        }

        #[test]
        fn aggregate_ignores_record_order(mut records in prop::collection::vec(record_strategy(), 0..24)) {
            let aggregator = Aggregator::new();
            let catalog = drive_away();
            let forward = aggregator.aggregate(&catalog, &records);
            records.reverse();
            prop_assert_eq!(forward, aggregator.aggregate(&catalog, &records));
        }

        #[test]
        fn parent_is_never_better_than_a_child(records in prop::collection::vec(record_strategy(), 0..24)) {
            let rollup = Aggregator::new().aggregate(&drive_away(), &records);
            if let Some(parent) = rollup.get("10100000") {
                for child in ["10101300", "10101100"] {
                    if let Some(child) = rollup.get(child) {
                        prop_assert!(parent.status <= child.status);
                    }
                }
            }
        }
    }
}
