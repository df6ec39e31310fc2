//! # heatmap-core
//!
//! Deterministic worst-status rollup for operation heat maps.
//!
//! Evaluation results arrive as loose `(code, operation, status)` rows. This
//! crate answers, for every operation in a catalog:
//! - What is the worst status recorded against this sub-operation?
//! - What is the worst status across a parent family?
//! - How should that status be rendered on the heat map?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same catalog and records always produce the same heat map
//! 2. **Total**: Malformed codes and unknown statuses degrade by omission, never by error
//! 3. **Stateless**: No global catalog, every run takes its catalog and config explicitly
//! 4. **Accountable**: Every run reports what it resolved, skipped and could not match
//!
//! ## Example
//!
//! ```rust,ignore
//! use heatmap_core::{generate_heatmap, Catalog, HeatmapConfig, RawRecord};
//!
//! let catalog = Catalog::avl_drive();
//! let records = vec![RawRecord::new(10101300, "Creep", "RED")];
//! let heatmap = generate_heatmap(&catalog, &records, &HeatmapConfig::default());
//!
//! for result in heatmap.iter() {
//!     println!("{} {:?}", result.code, result.display_text);
//! }
//! ```

pub mod aggregator;
pub mod analysis;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod normalizer;
pub mod presenter;
pub mod records;
pub mod status;
pub mod types;

// Re-export main types at crate root
pub use aggregator::{Aggregator, Heatmap, Rollup, RollupStats};
pub use analysis::{analyze, insights, EvaluationAnalysis};
pub use catalog::{Catalog, CatalogError, SchemaError};
pub use config::{ConfigError, HeatmapConfig};
pub use normalizer::normalize;
pub use presenter::{Display, DisplayColor, MarkerFormat, MarkerPresenter, Presenter};
pub use records::{load_records, normalize_records, RecordError};
pub use status::{worst, StatusValue};
pub use types::{
    EvaluationRecord, InvalidCode, OperationCode, OperationNode, RawCode, RawRecord,
    ResolutionSource, ResolvedNode, Role, RollupResult,
};

use std::path::Path;

use thiserror::Error;

/// Errors raised while loading the inputs of a heat map run.
///
/// The rollup itself never fails; these cover the files around it.
#[derive(Error, Debug)]
pub enum HeatmapError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Record error: {0}")]
    Records(#[from] RecordError),
}

/// Where the catalog of a run comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource<'a> {
    /// Built-in AVL-DRIVE catalog
    AvlDrive,
    /// Derived from the codes and labels of the loaded records
    Inferred,
    /// Catalog file (.json, .yaml, .yml)
    File(&'a Path),
}

/// Everything a heat map run reads from disk.
#[derive(Debug, Clone)]
pub struct HeatmapInputs {
    pub catalog: Catalog,
    pub records: Vec<RawRecord>,
    pub config: HeatmapConfig,
}

/// Load records, catalog and config for one run.
///
/// A missing `config` path means the default config.
pub fn load_inputs(
    records_path: &Path,
    catalog_source: CatalogSource<'_>,
    config_path: Option<&Path>,
) -> Result<HeatmapInputs, HeatmapError> {
    let records = load_records(records_path)?;

    let catalog = match catalog_source {
        CatalogSource::AvlDrive => Catalog::avl_drive(),
        CatalogSource::Inferred => {
            Catalog::infer_from_records("inferred", &normalize_records(&records))
        }
        CatalogSource::File(path) => Catalog::from_file(path)?,
    };

    let config = match config_path {
        Some(path) => HeatmapConfig::from_yaml_file(path)?,
        None => HeatmapConfig::default(),
    };

    Ok(HeatmapInputs {
        catalog,
        records,
        config,
    })
}

/// Generate a heat map from raw evaluation rows.
///
/// This is the main entry point: rows are normalized, aggregated against the
/// catalog and rendered with a [`MarkerPresenter`] built from `config`.
///
/// # Arguments
///
/// * `catalog` - The operations to report on
/// * `records` - Raw evaluation rows as supplied by the data source
/// * `config` - Rollup and marker options
pub fn generate_heatmap(
    catalog: &Catalog,
    records: &[RawRecord],
    config: &HeatmapConfig,
) -> Heatmap {
    let aggregator = Aggregator::from_config(config);
    let presenter = MarkerPresenter::from_config(config);

    aggregator.aggregate_raw(catalog, records).render(&presenter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_generation() {
        let catalog = Catalog::avl_drive();
        let records = vec![
            RawRecord::new(10101300, "Creep", "RED"),
            RawRecord::new(10101100, "Standing start", "GREEN"),
        ];

        let heatmap = generate_heatmap(&catalog, &records, &HeatmapConfig::default());

        let parent = heatmap.get("10100000").unwrap();
        assert_eq!(parent.status, StatusValue::Red);
        assert_eq!(parent.display_text.as_deref(), Some("NOK"));
        assert_eq!(parent.display_color, Some(DisplayColor::Red));

        let creep = heatmap.get("10101300").unwrap();
        assert_eq!(creep.display_text.as_deref(), Some("●"));
    }

    #[test]
    fn test_empty_records_yield_empty_heatmap() {
        let heatmap = generate_heatmap(&Catalog::avl_drive(), &[], &HeatmapConfig::default());

        assert!(heatmap.is_empty());
        assert_eq!(heatmap.stats.parents_unresolved, Catalog::avl_drive().parents().count());
    }

    #[test]
    fn test_load_inputs_infers_named_catalog() {
        let dir = std::env::temp_dir().join(format!("heatmap-inputs-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let records = dir.join("records.json");
        std::fs::write(
            &records,
            r#"[{"code": 20301100, "operation": "Launch", "status": "YELLOW"}]"#,
        )
        .unwrap();

        let inputs = load_inputs(&records, CatalogSource::Inferred, None).unwrap();

        assert_eq!(inputs.records.len(), 1);
        assert_eq!(inputs.config, HeatmapConfig::default());
        assert_eq!(
            inputs.catalog.get("20301100").unwrap().name.as_deref(),
            Some("Launch")
        );
        assert!(inputs.catalog.is_parent_code("20300000"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_inputs_reports_failing_file() {
        let missing = Path::new("does-not-exist/records.yaml");
        let result = load_inputs(missing, CatalogSource::AvlDrive, None);
        assert!(matches!(result, Err(HeatmapError::Records(RecordError::IoError(_)))));

        let unsupported = Path::new("catalog.toml");
        let dir = std::env::temp_dir().join(format!("heatmap-catalog-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let records = dir.join("records.yaml");
        std::fs::write(&records, "").unwrap();

        let result = load_inputs(&records, CatalogSource::File(unsupported), None);
        assert!(matches!(
            result,
            Err(HeatmapError::Catalog(CatalogError::UnsupportedFormat(_)))
        ));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_dot_plus_word_config() {
        let config = HeatmapConfig {
            marker_format: MarkerFormat::DotPlusWord,
            ..Default::default()
        };
        let records = vec![RawRecord::new("10120100", "Full load", "yellow")];

        let heatmap = generate_heatmap(&Catalog::avl_drive(), &records, &config);

        let full_load = heatmap.get("10120100").unwrap();
        assert_eq!(full_load.display_text.as_deref(), Some("● acceptable"));
    }
}
