//! Background daemon sharing one tracker between shell clients.

pub mod server;
pub mod view;
