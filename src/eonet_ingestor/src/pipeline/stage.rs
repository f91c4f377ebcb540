use std::fmt;

use serde::Serialize;

/// Where a run is. Advances strictly in declaration order; `Failed` can follow any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PipelineStage {
    Idle,
    Extracting,
    Flattening,
    Cleaning,
    Enriching,
    Merging,
    Persisting,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Idle => "Idle",
            PipelineStage::Extracting => "Extracting",
            PipelineStage::Flattening => "Flattening",
            PipelineStage::Cleaning => "Cleaning",
            PipelineStage::Enriching => "Enriching",
            PipelineStage::Merging => "Merging",
            PipelineStage::Persisting => "Persisting",
            PipelineStage::Done => "Done",
            PipelineStage::Failed => "Failed",
        }
    }

    /// The stage after this one on the success path. Terminal stages map to themselves.
    pub fn next(&self) -> PipelineStage {
        match self {
            PipelineStage::Idle => PipelineStage::Extracting,
            PipelineStage::Extracting => PipelineStage::Flattening,
            PipelineStage::Flattening => PipelineStage::Cleaning,
            PipelineStage::Cleaning => PipelineStage::Enriching,
            PipelineStage::Enriching => PipelineStage::Merging,
            PipelineStage::Merging => PipelineStage::Persisting,
            PipelineStage::Persisting => PipelineStage::Done,
            PipelineStage::Done => PipelineStage::Done,
            PipelineStage::Failed => PipelineStage::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
