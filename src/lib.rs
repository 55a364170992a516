pub mod acquire;
pub mod clock;
pub mod config;
pub mod display;
pub mod errors;
pub mod http;
pub mod link;
pub mod model;
pub mod retry;
pub mod sensor;
pub mod supervisor;
pub mod watchdog;
