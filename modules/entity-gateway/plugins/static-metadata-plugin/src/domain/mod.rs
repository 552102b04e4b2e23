pub mod error;
pub mod loader;
pub mod service;

pub use error::LoadError;
pub use service::Service;
