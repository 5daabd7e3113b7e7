//! Common test utilities for document building.
//!
//! - [`fixtures`] - Blog domain types, service model and configurations
//! - [`assertions`] - Document and error assertions

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;
