mod mesh_command;
mod mesh_manager;
mod remote_streams;
mod render_sink;

pub use mesh_command::*;
pub use mesh_manager::*;
pub use remote_streams::*;
pub use render_sink::*;
