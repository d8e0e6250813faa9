//! HTTP surface

pub mod handlers;
pub mod routes;

pub use routes::http_router;
