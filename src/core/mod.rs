//! Service infrastructure shared by the HTTP handlers.

mod service_context;
mod sms_provider;

pub use service_context::ServiceContext;
pub use sms_provider::{DispatchReceipt, OTP_NOT_CONFIGURED, SmsProvider};
