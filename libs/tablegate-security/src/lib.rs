#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Caller identity for the Tablegate request pipeline.
//!
//! - [`SecurityContext`] - authenticated (or anonymous) caller with roles and claims
//! - [`roles`] - system role names and effective-role resolution
//! - [`RoleError`] - role resolution failures

pub mod context;
pub mod roles;

pub use context::{Claims, SecurityContext, SecurityContextBuilder};
pub use roles::RoleError;
