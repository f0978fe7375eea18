pub mod decode;
pub mod frame;
pub mod metrics;
pub mod select;
pub mod vad;
