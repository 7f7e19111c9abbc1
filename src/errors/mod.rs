mod http_error;
mod panic_handler;

pub use http_error::*;
pub use panic_handler::*;
