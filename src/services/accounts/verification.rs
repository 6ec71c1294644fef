//! OTP-verified signup through the gateway's Verify service.

use agrisense_core::validation::{required, validate_name, validate_password};
use agrisense_core::{AppError, AppResult, OptionStrExt, normalize, password};
use agrisense_db::CreateAccountParams;
use tracing::{info, instrument, warn};

use super::{AccountResponse, AccountService, MessageResponse, SendOtpRequest, VerifyOtpRequest};
use crate::core::OTP_NOT_CONFIGURED;

impl AccountService {
    fn ensure_otp_enabled(&self) -> AppResult<()> {
        if self.ctx.sms().otp_enabled() {
            Ok(())
        } else {
            Err(AppError::NotConfigured(OTP_NOT_CONFIGURED.to_string()))
        }
    }

    /// Sends a one-time code to the phone.
    #[instrument(skip_all, fields(phone))]
    pub(super) async fn send_otp(&self, req: SendOtpRequest) -> AppResult<MessageResponse> {
        self.ensure_otp_enabled()?;

        let phone = normalize(req.phone.as_deref().unwrap_or_default())?;
        tracing::Span::current().record("phone", phone.canonical());

        self.ctx.sms().start_verification(&phone).await?;

        info!("OTP sent");
        Ok(MessageResponse::new("OTP sent successfully!"))
    }

    /// Creates the account once the gateway approves the code.
    #[instrument(skip_all, fields(phone))]
    pub(super) async fn verify_otp(&self, req: VerifyOtpRequest) -> AppResult<AccountResponse> {
        self.ensure_otp_enabled()?;

        let [name, phone, password, code] = required(
            [
                req.name.present(),
                req.phone.present(),
                req.password.present(),
                req.code.present(),
            ],
            "All fields required",
        )?;

        let phone = normalize(phone)?;
        tracing::Span::current().record("phone", phone.canonical());

        let name = validate_name(name)?;
        validate_password(password)?;

        if !self.ctx.sms().check_verification(&phone, code.trim()).await? {
            warn!("OTP not approved");
            return Err(AppError::InvalidArgument("Invalid OTP".to_string()));
        }

        let password_hash = password::hash(password)?;
        let account = self
            .ctx
            .directory()
            .create_account(
                &phone,
                CreateAccountParams {
                    name,
                    password_hash: &password_hash,
                },
            )
            .await?;

        info!(account_id = %account.id, "Account created after OTP");
        Ok(AccountResponse::new("User created successfully!", &account))
    }
}
