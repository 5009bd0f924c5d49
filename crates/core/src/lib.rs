pub mod booking;
pub mod clock;
pub mod config;
pub mod error;
pub mod repository;

pub use booking::*;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::*;
pub use repository::{JsonFileRepository, MemoryRepository, RecordRepository};
