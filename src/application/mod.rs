pub mod ranking;
pub mod service;
pub mod statistics;
pub mod validation;

pub use service::CryptoService;
