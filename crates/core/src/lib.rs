//! Core library with shared types, rules, and error handling.
//!
//! This crate provides the pieces every other crate leans on:
//! - Error type with automatic JSON envelope conversion
//! - Indian mobile number normalization
//! - SMS body limits
//! - Password hashing and field validation helpers

pub mod error;
pub mod password;
pub mod phone;
pub mod sms;
pub mod str_ext;
pub mod validation;

pub use error::{AppError, AppResult, ResultExt};
pub use phone::{NormalizedPhone, PhoneRejection, normalize};
pub use str_ext::{OptionStrExt, StrExt};
