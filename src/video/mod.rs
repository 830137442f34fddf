pub mod ffmpeg;
pub mod sampler;

pub use ffmpeg::*;
pub use sampler::*;
