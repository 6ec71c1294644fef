//! Credential reset.

use agrisense_core::validation::{required, validate_password};
use agrisense_core::{AppResult, OptionStrExt, normalize, password};
use tracing::{info, instrument};

use super::{AccountService, MessageResponse, ResetPasswordRequest};

impl AccountService {
    /// Replaces the credential of an existing account.
    ///
    /// Works for shell accounts too, which gives them a credential.
    #[instrument(skip_all, fields(phone))]
    pub(super) async fn reset_password(
        &self,
        req: ResetPasswordRequest,
    ) -> AppResult<MessageResponse> {
        let [phone, new_password] = required(
            [req.phone.present(), req.new_password.present()],
            "Phone and new password required",
        )?;

        let phone = normalize(phone)?;
        tracing::Span::current().record("phone", phone.canonical());
        validate_password(new_password)?;

        let password_hash = password::hash(new_password)?;
        self.ctx
            .directory()
            .update_credential(&phone, &password_hash)
            .await?;

        info!("Password reset");
        Ok(MessageResponse::new("Password reset successfully"))
    }
}

#[cfg(test)]
mod tests {
    use agrisense_core::AppError;

    use super::*;
    use crate::services::accounts::{LoginRequest, SignupRequest};
    use crate::services::test_context;

    fn reset_request(phone: &str, new_password: &str) -> ResetPasswordRequest {
        ResetPasswordRequest {
            phone: Some(phone.to_string()),
            new_password: Some(new_password.to_string()),
        }
    }

    #[tokio::test]
    async fn reset_replaces_credential() {
        let service = AccountService::new(test_context());
        service
            .signup(SignupRequest {
                name: Some("Arjun".to_string()),
                phone: Some("9812345678".to_string()),
                password: Some("old".to_string()),
            })
            .await
            .unwrap();

        let response = service
            .reset_password(reset_request("+91-98123-45678", "new"))
            .await
            .unwrap();
        assert_eq!(response.message, "Password reset successfully");

        let login = |password: &str| LoginRequest {
            phone: Some("9812345678".to_string()),
            password: Some(password.to_string()),
        };
        assert!(service.login(login("new")).await.is_ok());
        assert!(matches!(
            service.login(login("old")).await,
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn reset_gives_shell_account_a_credential() {
        let ctx = test_context();
        let phone = normalize("9123456789").unwrap();
        ctx.directory().upsert_contact(&phone, "Hello").await.unwrap();

        let service = AccountService::new(ctx);
        service
            .reset_password(reset_request("9123456789", "first"))
            .await
            .unwrap();

        let response = service
            .login(LoginRequest {
                phone: Some("9123456789".to_string()),
                password: Some("first".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(response.user.name, None);
    }

    #[tokio::test]
    async fn reset_unknown_phone_is_not_found() {
        let service = AccountService::new(test_context());
        let err = service
            .reset_password(reset_request("9000000000", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn reset_requires_both_fields() {
        let service = AccountService::new(test_context());
        let err = service
            .reset_password(ResetPasswordRequest {
                phone: Some("9000000000".to_string()),
                new_password: None,
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err, AppError::InvalidArgument(msg) if msg == "Phone and new password required")
        );
    }
}
