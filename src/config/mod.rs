mod settings;

pub use settings::{ApiConfig, QueueConfig, Settings};
