//! Crop advisory notifications.
//!
//! Records the message against the recipient's account, creating a shell
//! account for unknown numbers, then hands the (possibly truncated) body to
//! the SMS provider.

use std::sync::Arc;

use agrisense_core::sms::truncate_body;
use agrisense_core::{AppError, AppResult, OptionStrExt, normalize};
use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::core::ServiceContext;
use crate::services::{ApiJson, phone_field};

/// Notification service.
#[derive(Debug, Clone)]
pub struct NotificationService {
    ctx: Arc<ServiceContext>,
}

/// `message` wins over `cropInfo` when both are set.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    #[serde(default, deserialize_with = "phone_field")]
    pub phone: Option<String>,
    pub message: Option<String>,
    pub crop_info: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendNotificationResponse {
    pub success: bool,
    pub message: &'static str,
    pub sid: String,
}

impl NotificationService {
    #[must_use]
    pub const fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    #[instrument(skip_all, fields(phone))]
    async fn send(&self, req: SendNotificationRequest) -> AppResult<SendNotificationResponse> {
        let (Some(phone), Some(body)) = (
            req.phone.present(),
            req.message.present().or_else(|| req.crop_info.present()),
        ) else {
            return Err(AppError::InvalidArgument(
                "Phone number and message/cropInfo required".to_string(),
            ));
        };

        let phone = normalize(phone)?;
        tracing::Span::current().record("phone", phone.canonical());

        let account = self.ctx.directory().upsert_contact(&phone, body).await?;

        let body = truncate_body(body);
        let receipt = self.ctx.sms().send(&phone, &body).await?;

        info!(
            account_id = %account.id,
            sid = %receipt.id,
            status = %receipt.status,
            "Notification sent"
        );

        Ok(SendNotificationResponse {
            success: true,
            message: "SMS sent successfully!",
            sid: receipt.id,
        })
    }
}

pub async fn send_notification(
    State(service): State<Arc<NotificationService>>,
    ApiJson(req): ApiJson<SendNotificationRequest>,
) -> AppResult<Json<SendNotificationResponse>> {
    service.send(req).await.map(Json)
}
