pub mod clock;
pub mod config;
pub mod fsutil;
pub mod types;

pub use config::{AutodocsConfig, ServeConfig, WatchConfig};
pub use fsutil::write_atomic;
pub use types::*;
