mod client;
mod config;
mod quotrack_url;

pub mod domain;

pub use client::*;
pub use config::*;
pub use quotrack_url::*;
