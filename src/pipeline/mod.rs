//! Extraction orchestration
//!
//! Wires the input sources to the three modality reducers and merges their
//! outputs into the final feature vector. The engine owns the two-tier
//! failure policy: recoverable source problems degrade to empty input and
//! zeroed features, fatal ones abort the clip.

pub mod aggregator;
pub mod engine;

pub use aggregator::FeatureAggregator;
pub use engine::{ClipSources, ExtractionPipeline};
