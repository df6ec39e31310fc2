//! Report documents and their text rendering.

use chrono::{DateTime, Utc};
use serde::Serialize;

use heatmap_core::{
    Catalog, EvaluationAnalysis, Heatmap, HeatmapConfig, RollupResult, RollupStats,
};

/// Output of `heatmap generate`.
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapReport {
    pub generated_at: DateTime<Utc>,
    pub catalog: String,
    pub config: HeatmapConfig,
    pub results: Vec<RollupResult>,
    pub stats: RollupStats,
    pub insights: Vec<String>,
}

impl HeatmapReport {
    pub fn new(catalog: &Catalog, config: &HeatmapConfig, heatmap: Heatmap) -> Self {
        let insights = heatmap_core::insights(&heatmap.stats);
        Self {
            generated_at: Utc::now(),
            catalog: catalog.name().to_string(),
            config: config.clone(),
            results: heatmap.results.into_values().collect(),
            stats: heatmap.stats,
            insights,
        }
    }

    /// Plain-text table, one row per result.
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "HeatMap ({}) generated {}\n\n",
            if self.catalog.is_empty() {
                "unnamed catalog"
            } else {
                self.catalog.as_str()
            },
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        out.push_str(&format!(
            "{:<10} {:<36} {:<16} {:<8} {:<12} {}\n",
            "OpCode", "Operation", "Type", "Status", "Display", "Color"
        ));
        for result in &self.results {
            out.push_str(&format!(
                "{:<10} {:<36} {:<16} {:<8} {:<12} {}\n",
                result.code.as_str(),
                truncate(result.name.as_deref().unwrap_or("-"), 36),
                result.role.label(),
                result.status.as_str(),
                result.display_text.as_deref().unwrap_or("-"),
                result.display_color.map(|c| c.hex()).unwrap_or("-"),
            ));
        }

        out.push('\n');
        for line in &self.insights {
            out.push_str(&format!("- {}\n", line));
        }

        out
    }
}

/// Plain-text rendering of an evaluation analysis.
pub fn analysis_to_text(analysis: &EvaluationAnalysis) -> String {
    let mut out = String::new();

    out.push_str(&format!("Total evaluations: {}\n", analysis.total_evaluations));
    out.push_str(&format!("Quality score:     {}/100\n", analysis.quality_score));
    if let Some(rate) = analysis.failure_rate {
        out.push_str(&format!("Failure rate:      {:.1}%\n", rate));
    }

    out.push_str("\nStatus distribution:\n");
    for (status, count) in &analysis.status_distribution {
        out.push_str(&format!("  {:<8} {}\n", status.as_str(), count));
    }

    if !analysis.recommendations.is_empty() {
        out.push_str("\nRecommendations:\n");
        for line in &analysis.recommendations {
            out.push_str(&format!("  - {}\n", line));
        }
    }

    if !analysis.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for line in &analysis.warnings {
            out.push_str(&format!("  - {}\n", line));
        }
    }

    out
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
