pub mod doc;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;
