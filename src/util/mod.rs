//! Leaf utilities: synthetic upload data, discarding sink, deadlines, timing

pub mod buffer;
pub mod deadline;
pub mod sink;
pub mod time;
