pub mod accounts;
pub mod bank;
pub mod config;
pub mod console;
pub mod error;
pub mod round;
pub mod scores;
pub mod seed;
pub mod session;
pub mod store;
