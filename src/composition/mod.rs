pub mod composer;

pub use composer::{Composition, Phrase, StyleComposer, Variation};
