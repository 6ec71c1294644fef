//! Thin axum handlers that extract the body and delegate to domain methods.

use std::sync::Arc;

use agrisense_core::AppResult;
use axum::Json;
use axum::extract::State;

use super::{
    AccountResponse, AccountService, LoginRequest, MessageResponse, ResetPasswordRequest,
    SendOtpRequest, SignupRequest, VerifyOtpRequest,
};
use crate::services::ApiJson;

pub async fn signup(
    State(service): State<Arc<AccountService>>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> AppResult<Json<AccountResponse>> {
    service.signup(req).await.map(Json)
}

pub async fn login(
    State(service): State<Arc<AccountService>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> AppResult<Json<AccountResponse>> {
    service.login(req).await.map(Json)
}

pub async fn reset_password(
    State(service): State<Arc<AccountService>>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    service.reset_password(req).await.map(Json)
}

pub async fn send_otp(
    State(service): State<Arc<AccountService>>,
    ApiJson(req): ApiJson<SendOtpRequest>,
) -> AppResult<Json<MessageResponse>> {
    service.send_otp(req).await.map(Json)
}

pub async fn verify_otp(
    State(service): State<Arc<AccountService>>,
    ApiJson(req): ApiJson<VerifyOtpRequest>,
) -> AppResult<Json<AccountResponse>> {
    service.verify_otp(req).await.map(Json)
}
