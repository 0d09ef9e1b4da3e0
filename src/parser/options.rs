//! Parsing options and configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::DEFAULT_INTERSECTION_THRESHOLD;
use crate::render::PageSelection;

/// Options for assembling documents from page images.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Whether to process pages in parallel
    pub parallel: bool,

    /// Page selection (which pages to process)
    pub pages: PageSelection,

    /// Equation containment settings
    pub containment: ContainmentConfig,

    /// Table reconstruction settings
    pub table_grid: TableGridConfig,

    /// Provenance tag stamped on every produced element
    pub pipeline_step: Option<u32>,

    /// Layout detections scoring below this are dropped
    pub min_score: Option<f32>,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (skip invalid content).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Set containment settings.
    pub fn with_containment(mut self, config: ContainmentConfig) -> Self {
        self.containment = config;
        self
    }

    /// Set table reconstruction settings.
    pub fn with_table_grid(mut self, config: TableGridConfig) -> Self {
        self.table_grid = config;
        self
    }

    /// Tag every produced element with a pipeline step.
    pub fn with_pipeline_step(mut self, step: u32) -> Self {
        self.pipeline_step = Some(step);
        self
    }

    /// Drop layout detections whose confidence is below `score`.
    pub fn with_min_score(mut self, score: f32) -> Self {
        self.min_score = Some(score);
        self
    }

    /// Check the nested configs.
    pub fn validate(&self) -> Result<()> {
        if let Some(score) = self.min_score {
            if !(0.0..=1.0).contains(&score) {
                return Err(Error::Config(format!(
                    "min_score must be in [0, 1], got {}",
                    score
                )));
            }
        }
        self.containment.validate()?;
        self.table_grid.validate()
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            parallel: false,
            pages: PageSelection::All,
            containment: ContainmentConfig::default(),
            table_grid: TableGridConfig::default(),
            pipeline_step: None,
            min_score: None,
        }
    }
}

/// Error handling mode during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any error
    #[default]
    Strict,
    /// Skip invalid detections and failed extractions, and continue
    Lenient,
}

/// How to pick a host when an embedded equation lies inside several elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostSelection {
    /// First qualifying element in page insertion order
    #[default]
    FirstMatch,
    /// Qualifying element with the smallest area; ties go to the earlier one
    SmallestArea,
}

/// Containment resolver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainmentConfig {
    /// Percentage of an equation that must lie inside a host (exclusive)
    pub intersection_threshold: f64,
    /// Tie-break between several qualifying hosts
    pub host_selection: HostSelection,
}

impl Default for ContainmentConfig {
    fn default() -> Self {
        Self {
            intersection_threshold: DEFAULT_INTERSECTION_THRESHOLD,
            host_selection: HostSelection::FirstMatch,
        }
    }
}

impl ContainmentConfig {
    /// Set the intersection threshold in percent.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.intersection_threshold = threshold;
        self
    }

    /// Set the host selection policy.
    pub fn with_host_selection(mut self, selection: HostSelection) -> Self {
        self.host_selection = selection;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let t = self.intersection_threshold;
        if !t.is_finite() || !(0.0..100.0).contains(&t) {
            return Err(Error::Config(format!(
                "intersection_threshold must be in [0, 100), got {}",
                t
            )));
        }
        Ok(())
    }
}

/// Largest white padding the OCR ladder may add around a cell (pixels).
pub const MAX_CELL_PADDING: u32 = 1024;

/// Table grid reconstruction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableGridConfig {
    /// Row gap threshold as a fraction of the mean cell height
    pub row_threshold_percentage: f64,
    /// White padding amounts tried in order until OCR returns text (pixels)
    pub padding_ladder: Vec<u32>,
    /// Margin added around a table box before cropping it (pixels)
    pub expansion_margin: u32,
    /// Pixels added to the bottom edge of every structure box
    pub row_bottom_extension: f64,
    /// Minimum Hough votes for a grid line
    pub line_vote_threshold: u32,
    /// Non-maximum suppression radius for grid lines
    pub line_suppression_radius: u32,
    /// Stroke width used to paint grid lines out (pixels)
    pub line_stroke: u32,
}

impl Default for TableGridConfig {
    fn default() -> Self {
        Self {
            row_threshold_percentage: 0.10,
            padding_ladder: vec![3, 8, 13, 20],
            expansion_margin: 10,
            row_bottom_extension: 5.0,
            line_vote_threshold: 150,
            line_suppression_radius: 8,
            line_stroke: 6,
        }
    }
}

impl TableGridConfig {
    /// Set the row gap threshold fraction.
    pub fn with_row_threshold(mut self, fraction: f64) -> Self {
        self.row_threshold_percentage = fraction;
        self
    }

    /// Set the OCR padding ladder.
    pub fn with_padding_ladder(mut self, ladder: Vec<u32>) -> Self {
        self.padding_ladder = ladder;
        self
    }

    /// Set the crop expansion margin.
    pub fn with_expansion_margin(mut self, margin: u32) -> Self {
        self.expansion_margin = margin;
        self
    }

    /// Set the structure box bottom extension.
    pub fn with_row_bottom_extension(mut self, pixels: f64) -> Self {
        self.row_bottom_extension = pixels;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.row_threshold_percentage.is_finite() || self.row_threshold_percentage < 0.0 {
            return Err(Error::Config(format!(
                "row_threshold_percentage must be a non-negative number, got {}",
                self.row_threshold_percentage
            )));
        }
        if !self.row_bottom_extension.is_finite() || self.row_bottom_extension < 0.0 {
            return Err(Error::Config(format!(
                "row_bottom_extension must be a non-negative number, got {}",
                self.row_bottom_extension
            )));
        }
        if self.padding_ladder.is_empty() {
            return Err(Error::Config("padding_ladder must not be empty".to_string()));
        }
        if let Some(pad) = self.padding_ladder.iter().find(|&&pad| pad > MAX_CELL_PADDING) {
            return Err(Error::Config(format!(
                "padding_ladder entries must be at most {}, got {}",
                MAX_CELL_PADDING, pad
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .lenient()
            .with_parallel(true)
            .with_pipeline_step(4)
            .with_containment(ContainmentConfig::default().with_threshold(80.0));

        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert!(options.parallel);
        assert_eq!(options.pipeline_step, Some(4));
        assert_eq!(options.containment.intersection_threshold, 80.0);
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert!(!options.parallel);
        assert_eq!(options.containment.host_selection, HostSelection::FirstMatch);
        assert_eq!(options.table_grid.padding_ladder, vec![3, 8, 13, 20]);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        assert!(ContainmentConfig::default()
            .with_threshold(100.0)
            .validate()
            .is_err());
        assert!(TableGridConfig::default()
            .with_padding_ladder(vec![])
            .validate()
            .is_err());
        assert!(TableGridConfig::default()
            .with_row_threshold(f64::NAN)
            .validate()
            .is_err());
        assert!(ParseOptions::new().with_min_score(1.5).validate().is_err());
        assert!(ParseOptions::new().with_min_score(f32::NAN).validate().is_err());
    }

    #[test]
    fn test_padding_ladder_upper_bound() {
        assert!(TableGridConfig::default()
            .with_padding_ladder(vec![3, MAX_CELL_PADDING])
            .validate()
            .is_ok());

        let config: TableGridConfig =
            serde_json::from_str(r#"{"padding_ladder": [3, 4294967295]}"#).unwrap();
        match config.validate() {
            Err(Error::Config(message)) => assert!(message.contains("4294967295")),
            other => panic!("expected a config error, got {:?}", other),
        }

        let options = ParseOptions::new().with_table_grid(config);
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_table_grid_config_from_json() {
        let config: TableGridConfig =
            serde_json::from_str(r#"{"padding_ladder": [5, 10]}"#).unwrap();
        assert_eq!(config.padding_ladder, vec![5, 10]);
        assert_eq!(config.expansion_margin, 10);
    }
}
