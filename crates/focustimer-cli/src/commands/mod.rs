pub mod background;
pub mod config;
pub mod stats;
pub mod timer;
