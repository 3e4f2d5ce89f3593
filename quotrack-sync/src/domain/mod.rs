mod error;

pub mod models;
pub mod ports;
pub mod services;

pub use error::*;
