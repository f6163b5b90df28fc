use async_trait::async_trait;
use campground_scan::{EmailService, NotificationError, PushService};

/// Mock email service for dry runs and local development
pub struct MockEmailService;

#[async_trait]
impl EmailService for MockEmailService {
    async fn send_email(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, NotificationError> {
        log::info!("📧 [MOCK EMAIL] From: {} To: {}", from, to);
        log::info!("📧 [MOCK EMAIL] Subject: {}", subject);
        log::info!("📧 [MOCK EMAIL] Body:\n{}", body);

        let mock_id = format!("mock-email-{}", uuid::Uuid::new_v4());
        Ok(mock_id)
    }
}

/// Mock push service for dry runs and local development
pub struct MockPushService;

#[async_trait]
impl PushService for MockPushService {
    async fn send_push(
        &self,
        topic: &str,
        title: &str,
        body: &str,
        click_url: Option<&str>,
    ) -> Result<String, NotificationError> {
        log::info!("📱 [MOCK PUSH] Topic: {} Title: {}", topic, title);
        log::info!("📱 [MOCK PUSH] Body:\n{}", body);
        if let Some(url) = click_url {
            log::info!("📱 [MOCK PUSH] Click: {}", url);
        }

        let mock_id = format!("mock-push-{}", uuid::Uuid::new_v4());
        Ok(mock_id)
    }
}
