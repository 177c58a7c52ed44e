pub mod catalog;
pub mod error;
pub mod interpreter;
pub mod query_builder;
pub mod reconcile;
pub mod record_store;
pub mod source_registry;
