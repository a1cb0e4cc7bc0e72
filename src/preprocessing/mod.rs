pub mod segmenter;
pub mod trim;
