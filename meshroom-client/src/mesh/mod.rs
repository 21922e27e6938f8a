mod link_event;
mod link_worker;
mod mesh_command;
mod mesh_coordinator;
mod mesh_handle;
mod room_view;


pub(crate) use link_event::*;
pub use mesh_coordinator::*;
pub use mesh_handle::*;
pub use room_view::*;
