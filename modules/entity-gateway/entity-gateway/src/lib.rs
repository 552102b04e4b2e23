#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Entity gateway request pipeline.
//!
//! Turns an inbound REST/GraphQL request into a validated, authorized,
//! provider-agnostic [`QueryPlan`](entity_gateway_sdk::QueryPlan):
//!
//! parser → request context → key validator / relationship resolver →
//! authorization evaluator → plan builder
//!
//! Every stage is synchronous and free of I/O. [`EntityGatewayLocalClient`]
//! exposes the pipeline to async callers.

pub mod config;
pub mod domain;

#[cfg(test)]
mod test_support;

pub use config::PipelineConfig;
pub use domain::{EntityGatewayLocalClient, RequestPipeline};
