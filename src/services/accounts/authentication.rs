//! Signup and login.

use agrisense_core::validation::{required, validate_name, validate_password};
use agrisense_core::{AppError, AppResult, OptionStrExt, normalize, password};
use agrisense_db::CreateAccountParams;
use tracing::{info, instrument, warn};

use super::{AccountResponse, AccountService, LoginRequest, SignupRequest};

impl AccountService {
    /// Creates a login-capable account for an unused phone number.
    #[instrument(skip_all, fields(phone))]
    pub(super) async fn signup(&self, req: SignupRequest) -> AppResult<AccountResponse> {
        let [name, phone, password] = required(
            [req.name.present(), req.phone.present(), req.password.present()],
            "Name, phone, and password required",
        )?;

        let phone = normalize(phone)?;
        tracing::Span::current().record("phone", phone.canonical());

        let name = validate_name(name)?;
        validate_password(password)?;
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

        info!(account_id = %account.id, "Account created");
        Ok(AccountResponse::new("User created", &account))
    }

    /// Checks a phone and password pair.
    ///
    /// Unknown phones are `NotFound`; a wrong password, or an account that
    /// never completed signup, is `Unauthenticated`.
    #[instrument(skip_all, fields(phone))]
    pub(super) async fn login(&self, req: LoginRequest) -> AppResult<AccountResponse> {
        let [phone, password] = required(
            [req.phone.present(), req.password.present()],
            "Phone and password required",
        )?;

        let phone = normalize(phone)?;
        tracing::Span::current().record("phone", phone.canonical());

        let directory = self.ctx.directory();
        let account = directory.find_by_phone(&phone).await?;

        let verified = account
            .password_hash
            .as_deref()
            .is_some_and(|hash| directory.verify_credential(password, hash));

        if !verified {
            warn!(shell = account.is_shell(), "Login rejected");
            return Err(AppError::Unauthenticated("Incorrect password".to_string()));
        }

        info!(account_id = %account.id, "Login successful");
        Ok(AccountResponse::new("Login successful", &account))
    }
}
