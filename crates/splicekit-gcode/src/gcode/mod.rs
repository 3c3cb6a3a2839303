//! G-Code instruction model and block classification primitives

pub mod block;
pub mod command;

pub use block::{BlockClass, Marker};
pub use command::{format_number, GcodeCommand, Parameter};
