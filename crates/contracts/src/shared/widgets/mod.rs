//! Dashboard widget configuration: catalog metadata, persisted modules,
//! custom widget descriptors and the shapes the interpreter renders into.

pub mod api;
pub mod catalog;
pub mod data_config;
pub mod display;
pub mod generation;
pub mod module;
pub mod overrides;
pub mod render;

pub use api::*;
pub use catalog::*;
pub use data_config::*;
pub use display::*;
pub use generation::*;
pub use module::*;
pub use overrides::*;
pub use render::*;
