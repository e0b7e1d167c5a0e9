//! Newline-delimited JSON protocol between the daemon and its clients.

pub mod messages;
