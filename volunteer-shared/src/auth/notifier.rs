/// Out-of-band delivery of password reset tokens
///
/// The reset flow mints the token and hands it off here; how it reaches the
/// user (email, SMS, an admin console) is up to the implementation.
/// [`LogNotifier`] writes the token to the log and is meant for development.

use async_trait::async_trait;

/// Error returned by a notifier
#[derive(Debug, thiserror::Error)]
#[error("Failed to deliver reset token: {0}")]
pub struct NotifyError(pub String);

/// Delivers password reset tokens to users
#[async_trait]
pub trait ResetNotifier: Send + Sync {
    /// Sends `token` to the owner of `email`
    async fn deliver(&self, email: &str, token: &str) -> Result<(), NotifyError>;
}

/// Notifier that logs the token instead of sending it
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl ResetNotifier for LogNotifier {
    async fn deliver(&self, email: &str, token: &str) -> Result<(), NotifyError> {
        tracing::info!(email, token, "Password reset token issued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_succeeds() {
        assert!(LogNotifier.deliver("a@example.com", "token").await.is_ok());
    }
}
