//! Local stand-in for the hosting runtime: reads an event document and runs
//! it through a sample HTTP handler chain.

pub mod event_reader;
pub mod pipeline;

pub use event_reader::EventReader;
