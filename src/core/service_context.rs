//! Shared service context for all HTTP services.

use agrisense_db::Directory;

use super::SmsProvider;

/// Shared infrastructure context for all services.
///
/// Built once at startup; services hold `Arc<ServiceContext>`.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    directory: Directory,
    sms: SmsProvider,
}

impl ServiceContext {
    #[must_use]
    pub const fn new(directory: Directory, sms: SmsProvider) -> Self {
        Self { directory, sms }
    }

    /// Account directory.
    #[inline]
    #[must_use]
    pub const fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Outbound SMS provider.
    #[inline]
    #[must_use]
    pub const fn sms(&self) -> &SmsProvider {
        &self.sms
    }
}
