//! HTTP service implementations.

pub mod accounts;
mod extract;
pub mod notifications;

pub use accounts::AccountService;
pub use extract::{ApiJson, phone_field};
pub use notifications::NotificationService;

#[cfg(test)]
pub(crate) fn test_context() -> std::sync::Arc<crate::core::ServiceContext> {
    use agrisense_db::Directory;

    use crate::core::{ServiceContext, SmsProvider};

    std::sync::Arc::new(ServiceContext::new(
        Directory::in_memory(),
        SmsProvider::Console,
    ))
}
