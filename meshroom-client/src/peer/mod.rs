mod candidate_buffer;
mod negotiation;
mod peer_task;
mod signaling_state;

pub use candidate_buffer::*;
pub use negotiation::*;
pub use peer_task::*;
pub use signaling_state::*;
