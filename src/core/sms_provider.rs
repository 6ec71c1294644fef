//! SMS provider abstraction for the Twilio gateway and a console fallback.
//!
//! Uses enum dispatch since the set of providers is small and fixed.

use std::sync::Arc;

use agrisense_core::{AppError, AppResult, NormalizedPhone};
use agrisense_twilio::{FaultCategory, TwilioError, TwilioService};
use tracing::{error, info, warn};
use uuid::Uuid;

const REASON_UNVERIFIED: &str =
    "Your Twilio account is in trial mode — please verify this number in Twilio console.";
const REASON_PERMISSION: &str = "Twilio permission denied for sending to this destination.";
const REASON_SENDER: &str = "The Twilio number is not SMS-capable.";

/// Error returned by the OTP routes when no Verify service is configured.
pub const OTP_NOT_CONFIGURED: &str = "OTP verification not configured";

/// Accepted outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub id: String,
    pub status: String,
}

/// Outbound SMS provider.
#[derive(Debug, Clone)]
pub enum SmsProvider {
    /// Twilio Messaging, plus Verify when a service SID is configured.
    Twilio(Arc<TwilioService>),
    /// Logs the message instead of sending it.
    Console,
}

impl SmsProvider {
    /// Provider name for logs, metrics and readiness output.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Twilio(_) => "twilio",
            Self::Console => "console",
        }
    }

    /// True if OTP verification can be used.
    #[must_use]
    pub fn otp_enabled(&self) -> bool {
        matches!(self, Self::Twilio(service) if service.verify_enabled())
    }

    /// Send `body` to the phone's dispatch form.
    ///
    /// # Errors
    /// Returns `AppError::Dispatch` with a user-facing reason if the gateway
    /// rejects the message or cannot be reached.
    pub async fn send(&self, phone: &NormalizedPhone, body: &str) -> AppResult<DispatchReceipt> {
        let result = match self {
            Self::Twilio(service) => service
                .send_sms(phone.dispatch(), body)
                .await
                .map(|receipt| DispatchReceipt {
                    id: receipt.sid,
                    status: receipt.status,
                })
                .map_err(|e| dispatch_fault(phone, &e)),
            Self::Console => {
                info!(to = %phone.dispatch(), body, "Console SMS");
                Ok(DispatchReceipt {
                    id: format!("console-{}", Uuid::new_v4().simple()),
                    status: "queued".to_string(),
                })
            }
        };

        let outcome = if result.is_ok() { "sent" } else { "failed" };
        metrics::counter!("sms_dispatch_total", "provider" => self.name(), "outcome" => outcome)
            .increment(1);

        result
    }

    /// Send a one-time code to the phone.
    ///
    /// # Errors
    /// `AppError::NotConfigured` without a Verify service, `AppError::Dispatch`
    /// if the gateway call fails.
    pub async fn start_verification(&self, phone: &NormalizedPhone) -> AppResult<()> {
        let service = self.verify_service()?;
        service
            .start_verification(phone.dispatch())
            .await
            .map_err(|e| {
                error!(phone = %phone, error = %e, "Failed to start verification");
                AppError::Dispatch("Failed to send OTP".to_string())
            })?;
        Ok(())
    }

    /// Check a one-time code. `Ok(false)` means the code was not approved.
    ///
    /// # Errors
    /// Same as [`Self::start_verification`].
    pub async fn check_verification(&self, phone: &NormalizedPhone, code: &str) -> AppResult<bool> {
        let service = self.verify_service()?;
        service
            .check_verification(phone.dispatch(), code)
            .await
            .map_err(|e| {
                error!(phone = %phone, error = %e, "Failed to check verification");
                AppError::Dispatch("Failed to verify OTP".to_string())
            })
    }

    fn verify_service(&self) -> AppResult<&TwilioService> {
        match self {
            Self::Twilio(service) if service.verify_enabled() => Ok(service),
            _ => Err(AppError::NotConfigured(OTP_NOT_CONFIGURED.to_string())),
        }
    }
}

/// Reason shown to the caller for a failed send.
fn user_reason(err: &TwilioError) -> String {
    match err.category() {
        FaultCategory::UnverifiedDestination => REASON_UNVERIFIED.to_string(),
        FaultCategory::PermissionDenied => REASON_PERMISSION.to_string(),
        FaultCategory::SenderNotCapable => REASON_SENDER.to_string(),
        FaultCategory::Other => err.to_string(),
    }
}

fn dispatch_fault(phone: &NormalizedPhone, err: &TwilioError) -> AppError {
    warn!(
        phone = %phone,
        category = ?err.category(),
        error = %err,
        "SMS dispatch failed"
    );
    AppError::Dispatch(user_reason(err))
}

#[cfg(test)]
mod tests {
    use agrisense_core::normalize;
    use agrisense_twilio::TwilioConfig;
    use secrecy::SecretString;

    use super::*;

    fn api_error(code: Option<u32>, message: &str) -> TwilioError {
        TwilioError::Api {
            status: 400,
            code,
            message: message.to_string(),
        }
    }

    fn unreachable_twilio(verify: bool) -> SmsProvider {
        let mut config = TwilioConfig::new("AC123", SecretString::from("token"), "+15005550006");
        config.api_url = "http://127.0.0.1:1".to_string();
        config.verify_url = "http://127.0.0.1:1".to_string();
        if verify {
            config = config.with_verify_service("VA123");
        }
        SmsProvider::Twilio(Arc::new(TwilioService::new(config).unwrap()))
    }

    #[test]
    fn reasons_follow_fault_category() {
        assert_eq!(user_reason(&api_error(Some(21608), "x")), REASON_UNVERIFIED);
        assert_eq!(user_reason(&api_error(Some(21408), "x")), REASON_PERMISSION);
        assert_eq!(user_reason(&api_error(Some(21659), "x")), REASON_SENDER);
        assert_eq!(
            user_reason(&api_error(None, "The 'From' number is invalid")),
            REASON_SENDER
        );
        assert_eq!(
            user_reason(&api_error(Some(30003), "Unreachable destination handset")),
            "Unreachable destination handset"
        );
        assert_eq!(
            user_reason(&api_error(Some(30007), "Message from carrier filtered as spam")),
            "Message from carrier filtered as spam"
        );
    }

    #[tokio::test]
    async fn console_provider_accepts_everything() {
        let phone = normalize("9876543210").unwrap();
        let receipt = SmsProvider::Console.send(&phone, "Rain expected").await.unwrap();
        assert!(receipt.id.starts_with("console-"));
        assert_eq!(receipt.status, "queued");
    }

    #[tokio::test]
    async fn unreachable_gateway_is_a_dispatch_fault() {
        let phone = normalize("9876543210").unwrap();
        let err = unreachable_twilio(false)
            .send(&phone, "Rain expected")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Dispatch(reason) if reason.contains("Twilio")));
    }

    #[tokio::test]
    async fn otp_requires_verify_service() {
        let phone = normalize("9876543210").unwrap();

        assert!(!SmsProvider::Console.otp_enabled());
        assert!(!unreachable_twilio(false).otp_enabled());
        assert!(unreachable_twilio(true).otp_enabled());

        let err = SmsProvider::Console
            .start_verification(&phone)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotConfigured(_)));

        let err = unreachable_twilio(false)
            .check_verification(&phone, "123456")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotConfigured(_)));
    }
}
