pub mod algorithms;
pub mod buffer;
pub mod color;
pub mod effects;
pub mod error;
pub mod pipeline;
pub mod preprocess;
pub mod scheduler;
pub mod state;

pub use buffer::PixelBuffer;
pub use effects::{EffectId, ParameterDefinition, ParameterSet, ParameterType, ParameterValue};
pub use error::{CoreError, Result};
pub use pipeline::{EffectContext, EffectRegistry, PipelineResult, PixelEffect, run_pipeline};
pub use preprocess::{PreprocessingParameters, preprocess};
pub use scheduler::{PipelineScheduler, RunOutput, SchedulerConfig, Submission};
pub use state::{AppState, StateMessage};
