//! Dwell-indexed multi-channel I/Q capture loading and phase-coherence
//! analysis for twinrx receiver studies.
//!
//! The pipeline runs strictly upward: [`catalog`] discovers capture files by
//! their naming convention, [`waveform`] decodes interleaved sc16 samples
//! with DC-offset correction, [`dwell`] groups the corrected waveforms by
//! dwell number and channel, and [`coherence`] estimates the mean relative
//! phase between channel pairs with a quadrant-rotation fit. [`spectrum`]
//! and [`plot`] are visualization glue consuming the pipeline's outputs.

pub mod catalog;
pub mod coherence;
pub mod dwell;
pub mod plot;
pub mod spectrum;
pub mod utils;
pub mod waveform;
