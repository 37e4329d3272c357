//! Pipeline runner for composing and executing transform steps.

use crate::data::{CompositionTable, LogRatioTable};
use crate::error::{CodaError, Result};
use crate::transform::alr::AlrReference;
use crate::transform::boxcox::BoxCoxConfig;
use crate::transform::mean::LogRatioKind;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// A step in the transform pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PipelineStep {
    // === Closure ===
    /// Renormalise to `scale`, optionally restricted to `components`.
    Renormalise { components: Vec<String>, scale: f64 },
    /// Close rows to sum to one.
    Close,

    // === Transforms ===
    /// Additive log-ratio.
    Alr {
        reference: AlrReference,
        null_col: bool,
    },
    /// Centred log-ratio.
    Clr,
    /// Isometric log-ratio.
    Ilr,
    /// Box-Cox; `lambda: None` searches the grid.
    BoxCox {
        lambda: Option<f64>,
        search_min: f64,
        search_max: f64,
        search_steps: usize,
    },

    // === Back to compositions ===
    /// Invert the most recent transform.
    Invert,
    /// Collapse all rows into their log-ratio mean.
    LogRatioMean { transform: LogRatioKind },
}

/// Pipeline configuration for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Name of the pipeline.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Steps to execute.
    pub steps: Vec<PipelineStep>,
}

impl PipelineConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(CodaError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(CodaError::from)
    }
}

/// Builder for constructing and running transform pipelines.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<PipelineStep>,
    name: String,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            name: "unnamed".to_string(),
        }
    }

    /// Create from a config.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            steps: config.steps.clone(),
            name: config.name.clone(),
        }
    }

    /// Set the pipeline name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    /// Renormalise to `scale`; an empty `components` list uses every column.
    pub fn renormalise(mut self, components: &[&str], scale: f64) -> Self {
        self.steps.push(PipelineStep::Renormalise {
            components: components.iter().map(|c| c.to_string()).collect(),
            scale,
        });
        self
    }

    /// Close rows to sum to one.
    pub fn close(mut self) -> Self {
        self.steps.push(PipelineStep::Close);
        self
    }

    /// Add an ALR transform.
    pub fn alr(mut self, reference: AlrReference, null_col: bool) -> Self {
        self.steps.push(PipelineStep::Alr {
            reference,
            null_col,
        });
        self
    }

    /// Add a CLR transform.
    pub fn clr(mut self) -> Self {
        self.steps.push(PipelineStep::Clr);
        self
    }

    /// Add an ILR transform.
    pub fn ilr(mut self) -> Self {
        self.steps.push(PipelineStep::Ilr);
        self
    }

    /// Add a Box-Cox transform.
    pub fn boxcox(mut self, config: &BoxCoxConfig) -> Self {
        self.steps.push(PipelineStep::BoxCox {
            lambda: config.lambda,
            search_min: config.search_space.0,
            search_max: config.search_space.1,
            search_steps: config.search_steps,
        });
        self
    }

    /// Invert the preceding transform.
    pub fn invert(mut self) -> Self {
        self.steps.push(PipelineStep::Invert);
        self
    }

    /// Collapse rows into their log-ratio mean.
    pub fn logratiomean(mut self, transform: LogRatioKind) -> Self {
        self.steps.push(PipelineStep::LogRatioMean { transform });
        self
    }

    /// Convert to config for serialization.
    pub fn to_config(&self, description: Option<&str>) -> PipelineConfig {
        PipelineConfig {
            name: self.name.clone(),
            description: description.map(String::from),
            steps: self.steps.clone(),
        }
    }

    /// Run the pipeline on a table.
    pub fn run(&self, table: &CompositionTable) -> Result<PipelineOutput> {
        info!(
            pipeline = %self.name,
            steps = self.steps.len(),
            rows = table.n_rows(),
            cols = table.n_cols(),
            "running pipeline"
        );
        let mut state = PipelineOutput::Composition(table.clone());

        for (i, step) in self.steps.iter().enumerate() {
            debug!(step = i + 1, ?step, "applying step");
            // AmbiguousLambda passes through untouched
            state = state.apply(step).map_err(|e| match e {
                CodaError::AmbiguousLambda { .. } => e,
                e => CodaError::Pipeline(format!("Step {} ({:?}) failed: {}", i + 1, step, e)),
            })?;
        }

        Ok(state)
    }
}

/// The table produced by a pipeline: either compositional or transformed.
#[derive(Debug, Clone)]
pub enum PipelineOutput {
    Composition(CompositionTable),
    Transformed(LogRatioTable),
}

impl PipelineOutput {
    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        match self {
            PipelineOutput::Composition(table) => table.n_rows(),
            PipelineOutput::Transformed(table) => table.n_rows(),
        }
    }

    /// Column labels.
    pub fn columns(&self) -> &[String] {
        match self {
            PipelineOutput::Composition(table) => table.columns(),
            PipelineOutput::Transformed(table) => &table.columns,
        }
    }

    /// The compositional table, if the pipeline ended in compositional space.
    pub fn as_composition(&self) -> Option<&CompositionTable> {
        match self {
            PipelineOutput::Composition(table) => Some(table),
            PipelineOutput::Transformed(_) => None,
        }
    }

    /// The transformed table, if the pipeline ended in transformed space.
    pub fn as_transformed(&self) -> Option<&LogRatioTable> {
        match self {
            PipelineOutput::Composition(_) => None,
            PipelineOutput::Transformed(table) => Some(table),
        }
    }

    /// Write whichever table the pipeline produced to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        match self {
            PipelineOutput::Composition(table) => table.to_tsv(path),
            PipelineOutput::Transformed(table) => table.to_tsv(path),
        }
    }

    fn composition(&self, step: &str) -> Result<&CompositionTable> {
        self.as_composition().ok_or_else(|| {
            CodaError::Pipeline(format!(
                "{} needs compositional data; invert the previous transform first",
                step
            ))
        })
    }

    fn apply(self, step: &PipelineStep) -> Result<Self> {
        let next = match step {
            PipelineStep::Renormalise { components, scale } => PipelineOutput::Composition(
                self.composition("Renormalise")?.renormalise(components, *scale),
            ),
            PipelineStep::Close => PipelineOutput::Composition(self.composition("Close")?.close()),
            PipelineStep::Alr {
                reference,
                null_col,
            } => PipelineOutput::Transformed(self.composition("ALR")?.alr(reference, *null_col)?),
            PipelineStep::Clr => PipelineOutput::Transformed(self.composition("CLR")?.clr()?),
            PipelineStep::Ilr => PipelineOutput::Transformed(self.composition("ILR")?.ilr()?),
            PipelineStep::BoxCox {
                lambda,
                search_min,
                search_max,
                search_steps,
            } => {
                let config = BoxCoxConfig {
                    lambda: *lambda,
                    search_space: (*search_min, *search_max),
                    search_steps: *search_steps,
                };
                PipelineOutput::Transformed(self.composition("Box-Cox")?.boxcox(&config)?)
            }
            PipelineStep::Invert => match self {
                PipelineOutput::Transformed(table) => PipelineOutput::Composition(table.invert()?),
                PipelineOutput::Composition(_) => {
                    return Err(CodaError::Pipeline(
                        "Invert needs a preceding transform".to_string(),
                    ))
                }
            },
            PipelineStep::LogRatioMean { transform } => {
                let table = self.composition("LogRatioMean")?;
                let mean = table.logratiomean(transform)?;
                let data = DMatrix::from_row_slice(1, mean.len(), &mean.values);
                PipelineOutput::Composition(
                    CompositionTable::new(data, mean.columns, vec!["mean".to_string()])?
                        .with_index_name(table.index_name()),
                )
            }
        };
        Ok(next)
    }
}
