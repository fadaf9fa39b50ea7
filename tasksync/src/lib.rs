//! `tasksync`: two-way reconciliation of task lists.
//!
//! The core is [`reconcile::reconcile`], a pure merge of two task
//! collections. [`sync::SyncEngine`] runs it against two [`store::TaskStore`]s
//! and writes the results back.

pub mod config;
pub mod parser;
pub mod priority;
pub mod reconcile;
pub mod store;
pub mod sync;
