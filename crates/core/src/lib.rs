#![forbid(unsafe_code)]

pub mod import;
pub mod model;
pub mod scheduler;
pub mod selector;
pub mod stats;
pub mod test_flow;
pub mod time;

pub use time::Clock;
