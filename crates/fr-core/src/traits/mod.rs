//! Core trait definitions

mod transport;

pub use transport::{Connection, Transport};
