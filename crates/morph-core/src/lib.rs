pub mod config;
pub mod error;
pub mod pipeline;
pub mod window;

pub use config::ConversionConfig;
pub use error::{MorphError, Result};
pub use pipeline::{Converter, Transform, Vectorizer};
pub use window::{clip, windows};
