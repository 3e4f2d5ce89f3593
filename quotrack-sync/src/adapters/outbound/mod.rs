mod http;
mod memory;

pub use http::*;
pub use memory::*;
