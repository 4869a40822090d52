//! Batch exploration and report synthesis pipeline.
//!
//! - [`config`]: execution limits, retry budgets, sampling options
//! - [`coordinator`]: batch lifecycle, admission control, crash recovery
//! - [`engine`]: chunked, resumable execution of the pattern universe
//! - [`synthesis`]: per-scope report generation with budget escalation

pub mod config;
pub mod coordinator;
pub mod engine;
pub mod synthesis;

pub use config::{ConfigError, PipelineConfig};
pub use coordinator::{BatchCoordinator, StartedBatch};
pub use engine::ExplorationEngine;
pub use synthesis::SynthesisEngine;
