mod native_connection;
mod native_event;
mod signal_sink;

pub use native_connection::*;
pub use native_event::*;
pub use signal_sink::*;
