//! Shared task model and snapshot format for `tasksync`.

pub mod codec;
pub mod task;
