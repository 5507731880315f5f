pub mod error;
pub mod schedule;
pub mod settings;

pub use error::ConfigError;
pub use schedule::{load_schedule, FetcherBinding, JobSpec, Schedule};
pub use settings::{CollectionMode, FetcherSource, Settings};
