//! Data Transfer Objects for REST request/response serialization.
//!
//! Money is carried as [`rust_decimal::Decimal`] and serialized as a JSON
//! string; requests accept either a string or a number.

pub mod admin_dto;
pub mod common_dto;
pub mod grading_dto;
pub mod wallet_dto;

pub use admin_dto::*;
pub use common_dto::*;
pub use grading_dto::*;
pub use wallet_dto::*;
