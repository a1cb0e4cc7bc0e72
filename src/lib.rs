//! Recomposes audio from fixed-length phrases of existing recordings.
//!
//! Inputs are cut into equal phrases, and new pieces are assembled from
//! random draws of those phrases, each pitch-shifted or time-stretched on
//! the way in.

pub mod composition;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod pipeline;
pub mod preprocessing;

pub use composition::{Composition, Phrase, StyleComposer, Variation};
pub use config::Config;
pub use domain::entities::AudioSegment;
pub use domain::errors::AppError;
pub use pipeline::{Pipeline, Report};
