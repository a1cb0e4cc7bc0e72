pub mod audio;
pub mod augmentation;
pub mod vocoder;
