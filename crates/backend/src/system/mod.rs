pub mod middleware;
pub mod tenant;
pub mod tracing;
