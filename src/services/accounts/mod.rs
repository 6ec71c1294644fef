//! Account service: phone-number signup, login and credential reset.
//!
//! Organized by domain:
//! - `mod.rs` - Service type, request and response shapes
//! - `handlers.rs` - Thin axum handlers
//! - `authentication.rs` - Signup and login
//! - `password.rs` - Credential reset
//! - `verification.rs` - OTP-verified signup

mod authentication;
mod handlers;
mod password;
mod verification;

use std::sync::Arc;

use agrisense_db::{Account, AccountSummary};
use serde::{Deserialize, Serialize};

use crate::core::ServiceContext;
use crate::services::phone_field;

pub use handlers::{login, reset_password, send_otp, signup, verify_otp};

/// Account service.
#[derive(Debug, Clone)]
pub struct AccountService {
    ctx: Arc<ServiceContext>,
}

impl AccountService {
    #[must_use]
    pub const fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "phone_field")]
    pub phone: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "phone_field")]
    pub phone: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default, deserialize_with = "phone_field")]
    pub phone: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    #[serde(default, deserialize_with = "phone_field")]
    pub phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "phone_field")]
    pub phone: Option<String>,
    pub password: Option<String>,
    pub code: Option<String>,
}

// ============================================================================
// Responses
// ============================================================================

/// Success body carrying the account's public fields.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub success: bool,
    pub message: &'static str,
    pub user: AccountSummary,
}

impl AccountResponse {
    fn new(message: &'static str, account: &Account) -> Self {
        Self {
            success: true,
            message,
            user: account.summary(),
        }
    }
}

/// Success body with a message only.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

impl MessageResponse {
    const fn new(message: &'static str) -> Self {
        Self {
            success: true,
            message,
        }
    }
}
