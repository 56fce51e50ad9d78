//! Query builders for common NerdGraph operations.
//!
//! Each helper is a pure function over a [`crate::QueryRunner`], so it can
//! run against the real client or a mock.

pub mod accounts;
pub mod nrql;
pub mod response_structs;
