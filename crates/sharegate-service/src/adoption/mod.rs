//! Moves reverse-share uploads into an owner's library.

pub mod pipeline;

pub use pipeline::AdoptionPipeline;
