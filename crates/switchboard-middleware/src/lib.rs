//! Turn pipeline: a statically composed chain of stages wrapped around the
//! delivery adapter, and the handler seam business logic plugs into.

pub mod context;
pub mod error;
pub mod pipeline;
pub mod sink;
pub mod stage;
pub mod stages;

pub use context::{Flow, Turn, TurnContext, TurnHandler};
pub use error::{PipelineError, Result};
pub use pipeline::{standard_chain, Pipeline, StandardChain, TurnOutcome};
pub use sink::DeliverySink;
pub use stage::{ActivitySink, Chain, Stage};
pub use stages::{DebugStage, FormatStage, TimingStage};
