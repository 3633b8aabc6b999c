//! Listening socket ownership, the accept loop and shutdown triggers.

pub mod listener;
pub mod shutdown;

pub use listener::Server;
pub use shutdown::stop_on_command;
