//! Twilio client for the Programmable Messaging and Verify APIs.
//!
//! # Configuration
//!
//! Environment variables (read by the service binary):
//! - `TWILIO_ACCOUNT_SID` - Account SID (`AC…`)
//! - `TWILIO_AUTH_TOKEN` - Auth token
//! - `TWILIO_PHONE_NUMBER` - SMS-capable sender number in E.164
//! - `TWILIO_VERIFY_SERVICE_SID` - Verify service (`VA…`), optional
//!
//! # Example
//!
//! ```ignore
//! let service = TwilioService::new(config)?;
//! let receipt = service.send_sms("+919876543210", "Heavy rain expected tonight").await?;
//! ```

use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument};

/// Messaging API root.
pub const TWILIO_API_URL: &str = "https://api.twilio.com/2010-04-01";

/// Verify API root.
pub const TWILIO_VERIFY_URL: &str = "https://verify.twilio.com/v2";

/// HTTP client timeout for every gateway call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Twilio error code: destination not verified on a trial account.
const CODE_UNVERIFIED_DESTINATION: u32 = 21608;
/// Twilio error code: geo permission not enabled for the destination region.
const CODE_PERMISSION_DENIED: u32 = 21408;
/// Twilio error codes for a sender that cannot send SMS.
const CODES_SENDER_NOT_CAPABLE: &[u32] = &[21606, 21659, 21212];
/// Twilio error code for a missing resource (expired verification).
const CODE_NOT_FOUND: u32 = 20404;

/// Why a gateway call failed, as far as callers need to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCategory {
    /// Trial account sending to a number that is not verified.
    UnverifiedDestination,
    /// Account lacks permission to reach the destination.
    PermissionDenied,
    /// Sender number is not SMS-capable.
    SenderNotCapable,
    Other,
}

impl FaultCategory {
    /// Classify a gateway error by code first, then by message text.
    #[must_use]
    pub fn classify(code: Option<u32>, message: &str) -> Self {
        match code {
            Some(CODE_UNVERIFIED_DESTINATION) => return Self::UnverifiedDestination,
            Some(CODE_PERMISSION_DENIED) => return Self::PermissionDenied,
            Some(c) if CODES_SENDER_NOT_CAPABLE.contains(&c) => return Self::SenderNotCapable,
            _ => {}
        }

        // Case matters: "From" is the sender parameter, not the word "from".
        if message.contains("unverified") {
            Self::UnverifiedDestination
        } else if message.contains("Permission") {
            Self::PermissionDenied
        } else if message.contains("From") {
            Self::SenderNotCapable
        } else {
            Self::Other
        }
    }
}

/// Twilio client errors.
#[derive(Debug, thiserror::Error)]
pub enum TwilioError {
    /// The API answered with an error body.
    #[error("{message}")]
    Api {
        status: u16,
        code: Option<u32>,
        message: String,
    },
    #[error("Failed to reach Twilio: {0}")]
    Transport(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TwilioError {
    /// Fault category for user-facing reporting.
    #[must_use]
    pub fn category(&self) -> FaultCategory {
        match self {
            Self::Api { code, message, .. } => FaultCategory::classify(*code, message),
            Self::Transport(_) | Self::Config(_) => FaultCategory::Other,
        }
    }
}

/// Twilio client configuration.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    /// Account SID, also the basic-auth username.
    pub account_sid: String,
    /// Auth token, the basic-auth password.
    pub auth_token: SecretString,
    /// Sender number in E.164.
    pub from_number: String,
    /// Verify service SID; OTP calls fail with `Config` when absent.
    pub verify_service_sid: Option<String>,
    /// Messaging API root, overridable for tests.
    pub api_url: String,
    /// Verify API root, overridable for tests.
    pub verify_url: String,
}

impl TwilioConfig {
    /// Configuration against the public Twilio endpoints.
    #[must_use]
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: SecretString,
        from_number: impl Into<String>,
    ) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token,
            from_number: from_number.into(),
            verify_service_sid: None,
            api_url: TWILIO_API_URL.to_string(),
            verify_url: TWILIO_VERIFY_URL.to_string(),
        }
    }

    /// Enable the Verify API for OTP flows.
    #[must_use]
    pub fn with_verify_service(mut self, service_sid: impl Into<String>) -> Self {
        self.verify_service_sid = Some(service_sid.into());
        self
    }
}

/// Accepted message as reported by the Messaging API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageReceipt {
    pub sid: String,
    pub status: String,
}

#[derive(Deserialize)]
struct VerificationResponse {
    status: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    code: Option<u32>,
    message: Option<String>,
}

/// Twilio Messaging and Verify client.
#[derive(Clone)]
pub struct TwilioService {
    client: Client,
    config: TwilioConfig,
}

impl std::fmt::Debug for TwilioService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioService")
            .field("account_sid", &self.config.account_sid)
            .field("from_number", &self.config.from_number)
            .field("verify_enabled", &self.verify_enabled())
            .finish_non_exhaustive()
    }
}

impl TwilioService {
    /// Create a new Twilio client.
    ///
    /// # Errors
    /// Returns `TwilioError::Config` if the HTTP client cannot be built.
    pub fn new(config: TwilioConfig) -> Result<Self, TwilioError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TwilioError::Config(format!("HTTP client: {e}")))?;

        info!(
            account_sid = %config.account_sid,
            from = %config.from_number,
            verify = config.verify_service_sid.is_some(),
            "Twilio service initialized"
        );

        Ok(Self { client, config })
    }

    /// True if a Verify service is configured.
    #[inline]
    #[must_use]
    pub const fn verify_enabled(&self) -> bool {
        self.config.verify_service_sid.is_some()
    }

    /// Send an SMS from the configured sender.
    ///
    /// # Errors
    /// Returns `TwilioError::Api` when Twilio rejects the message and
    /// `TwilioError::Transport` when it cannot be reached.
    #[instrument(skip(self, body), fields(to = %to, body_len = body.len()))]
    pub async fn send_sms(&self, to: &str, body: &str) -> Result<MessageReceipt, TwilioError> {
        let url = format!(
            "{}/Accounts/{}/Messages.json",
            self.config.api_url, self.config.account_sid
        );

        let receipt: MessageReceipt = self
            .post_form(
                &url,
                &[
                    ("To", to),
                    ("From", self.config.from_number.as_str()),
                    ("Body", body),
                ],
            )
            .await?;

        info!(sid = %receipt.sid, status = %receipt.status, "SMS accepted by Twilio");
        Ok(receipt)
    }

    /// Start an SMS verification and return its status (normally `pending`).
    ///
    /// # Errors
    /// Returns `TwilioError::Config` without a Verify service, otherwise the
    /// same errors as [`Self::send_sms`].
    #[instrument(skip(self), fields(to = %to))]
    pub async fn start_verification(&self, to: &str) -> Result<String, TwilioError> {
        let url = format!("{}/Verifications", self.verify_service_url()?);

        let response: VerificationResponse = self
            .post_form(&url, &[("To", to), ("Channel", "sms")])
            .await?;

        debug!(status = %response.status, "Verification started");
        Ok(response.status)
    }

    /// Check an OTP code. Returns `true` only for an approved verification.
    ///
    /// An expired or unknown verification counts as not approved.
    ///
    /// # Errors
    /// Same as [`Self::start_verification`].
    #[instrument(skip(self, code), fields(to = %to))]
    pub async fn check_verification(&self, to: &str, code: &str) -> Result<bool, TwilioError> {
        let url = format!("{}/VerificationCheck", self.verify_service_url()?);

        match self
            .post_form::<VerificationResponse>(&url, &[("To", to), ("Code", code)])
            .await
        {
            Ok(response) => Ok(response.status == "approved"),
            Err(TwilioError::Api { status: 404, .. })
            | Err(TwilioError::Api {
                code: Some(CODE_NOT_FOUND),
                ..
            }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Validate configuration (does not make network calls).
    ///
    /// # Errors
    /// Returns `TwilioError::Config` if any required value is missing.
    pub fn validate_config(&self) -> Result<(), TwilioError> {
        if self.config.account_sid.is_empty() {
            return Err(TwilioError::Config("Account SID is empty".to_string()));
        }
        if self.config.auth_token.expose_secret().is_empty() {
            return Err(TwilioError::Config("Auth token is empty".to_string()));
        }
        if !self.config.from_number.starts_with('+') {
            return Err(TwilioError::Config(
                "Sender number must be in E.164 format".to_string(),
            ));
        }
        Ok(())
    }

    fn verify_service_url(&self) -> Result<String, TwilioError> {
        let sid = self
            .config
            .verify_service_sid
            .as_deref()
            .ok_or_else(|| TwilioError::Config("Verify service not configured".to_string()))?;
        Ok(format!("{}/Services/{sid}", self.config.verify_url))
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<T, TwilioError> {
        let response = self
            .client
            .post(url)
            .basic_auth(
                &self.config.account_sid,
                Some(self.config.auth_token.expose_secret()),
            )
            .form(form)
            .send()
            .await
            .map_err(|e| TwilioError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "Twilio API error");
            return Err(api_error(status.as_u16(), &body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| TwilioError::Transport(format!("Unexpected response: {e}")))
    }
}

/// Build an API error from a non-success response body.
fn api_error(status: u16, body: &str) -> TwilioError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => TwilioError::Api {
            status,
            code: parsed.code,
            message: parsed
                .message
                .unwrap_or_else(|| format!("Twilio returned HTTP {status}")),
        },
        Err(_) => TwilioError::Api {
            status,
            code: None,
            message: if body.is_empty() {
                format!("Twilio returned HTTP {status}")
            } else {
                body.to_string()
            },
        },
    }
}
