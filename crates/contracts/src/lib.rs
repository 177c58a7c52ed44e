//! Types shared between the dashboard backend and its clients.

pub mod domain;
pub mod shared;
