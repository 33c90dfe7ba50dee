//! Sink implementations

pub mod console;
pub mod manager;
pub mod memory;
pub mod rotating_file;

pub use console::ConsoleSink;
pub use manager::{SinkManager, SinkSlot};
pub use memory::MemorySink;
pub use rotating_file::{FileSettings, RotatingFileSink};

pub use crate::core::Sink;
