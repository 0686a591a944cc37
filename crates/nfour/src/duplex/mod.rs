//! Duplex multiplexing mode (C6/C7): one TCP connection serves many
//! concurrent requests without head-of-line blocking, using a dedicated
//! reader and writer task on each side. Grounded on the source's `duplex`
//! package (`srv.go`, `trans.go`).

mod server;
mod transport;

pub use server::{ErrorHandler, HandlerError, Server, Working};
pub use transport::Transport;
