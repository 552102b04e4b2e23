//! Domain layer of the entity gateway.
//!
//! One submodule per pipeline stage; [`service::RequestPipeline`] runs them
//! in order and stops at the first error.

pub mod authorization;
pub mod context;
pub mod error;
pub mod local_client;
pub mod parser;
pub mod plan_builder;
pub mod relationships;
pub mod service;
pub mod validator;

pub use context::{KeyPair, RequestContext};
pub use error::PipelineError;
pub use local_client::EntityGatewayLocalClient;
pub use service::RequestPipeline;
