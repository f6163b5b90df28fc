use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{error, info};

use crate::alert_formatter::{email_subject, format_vacancies, push_title};
use crate::config::NotificationSettings;
use crate::quiet_hours::is_quiet_hours;
use crate::scan_types::VacancyInfo;

/// Errors raised by notification transports
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// Email delivery failed
    #[error("Email error: {0}")]
    Email(String),
    /// Push delivery failed
    #[error("Push error: {0}")]
    Push(String),
}

/// Trait for email service implementations
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Send a plain-text email and return the provider's message id.
    async fn send_email(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, NotificationError>;
}

/// Trait for push service implementations
#[async_trait]
pub trait PushService: Send + Sync {
    /// Publish a push message to `topic` and return the provider's message id.
    async fn send_push(
        &self,
        topic: &str,
        title: &str,
        body: &str,
        click_url: Option<&str>,
    ) -> Result<String, NotificationError>;
}

/// What happened to an alert batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertOutcome {
    /// Message id of the email
    pub email_id: String,
    /// Message id of the push, if one was sent
    pub push_id: Option<String>,
    /// Push was withheld because of quiet hours
    pub push_suppressed: bool,
}

/// Sends merged vacancy alerts over email and push.
pub struct AlertDispatcher {
    email_service: Arc<dyn EmailService>,
    push_service: Arc<dyn PushService>,
    from_email: String,
    push_topic: String,
    settings: NotificationSettings,
    timezone: Tz,
}

impl AlertDispatcher {
    /// Create a dispatcher for the configured recipient and push topic
    pub fn new(
        email_service: Arc<dyn EmailService>,
        push_service: Arc<dyn PushService>,
        from_email: String,
        push_topic: String,
        settings: NotificationSettings,
        timezone: Tz,
    ) -> Self {
        Self {
            email_service,
            push_service,
            from_email,
            push_topic,
            settings,
            timezone,
        }
    }

    /// Whether push delivery is currently suppressed
    pub fn is_quiet(&self, now: DateTime<Utc>) -> bool {
        let (start, end) = self
            .settings
            .quiet_hours
            .clone()
            .unwrap_or_default()
            .hours();
        is_quiet_hours(self.timezone, now, start, end)
    }

    /// Send one merged alert for `vacancies`.
    ///
    /// Email always goes out first and is never gated. Push follows unless
    /// quiet hours are in effect; `force` skips the quiet-hours check. Returns
    /// `Ok(None)` for an empty batch. Transport failures are returned, not retried.
    pub async fn send_alert(
        &self,
        vacancies: &[VacancyInfo],
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<Option<AlertOutcome>, NotificationError> {
        let Some(first) = vacancies.first() else {
            return Ok(None);
        };

        let count = vacancies.len();
        let subject = email_subject(&first.park);
        let title = push_title(&first.park, count);
        let (email_body, push_body) = format_vacancies(vacancies);

        let email_id = self
            .email_service
            .send_email(&self.from_email, &self.settings.email, &subject, &email_body)
            .await
            .inspect_err(|e| error!("Failed to send alert email to {}: {}", self.settings.email, e))?;
        info!("Alert email sent to {} ({} vacancies)", self.settings.email, count);

        let quiet = !force && self.is_quiet(now);
        if quiet {
            info!("Quiet hours in effect, skipping push notification");
            return Ok(Some(AlertOutcome {
                email_id,
                push_id: None,
                push_suppressed: true,
            }));
        }

        let push_id = self
            .push_service
            .send_push(&self.push_topic, &title, &push_body, Some(&first.url))
            .await
            .inspect_err(|e| error!("Failed to send push notification: {}", e))?;
        info!("Push notification sent to topic {}", self.push_topic);

        Ok(Some(AlertOutcome {
            email_id,
            push_id: Some(push_id),
            push_suppressed: false,
        }))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use chrono::TimeZone;

    use super::*;
    use crate::quiet_hours::QuietHours;

    #[derive(Default)]
    pub(crate) struct RecordingEmail {
        pub sent: Mutex<Vec<(String, String, String, String)>>,
        pub fail: bool,
    }

    #[async_trait]
    impl EmailService for RecordingEmail {
        async fn send_email(
            &self,
            from: &str,
            to: &str,
            subject: &str,
            body: &str,
        ) -> Result<String, NotificationError> {
            if self.fail {
                return Err(NotificationError::Email("smtp down".to_string()));
            }
            self.sent.lock().unwrap().push((
                from.to_string(),
                to.to_string(),
                subject.to_string(),
                body.to_string(),
            ));
            Ok("mock-email-id".to_string())
        }
    }

    #[derive(Default)]
    pub(crate) struct RecordingPush {
        pub sent: Mutex<Vec<(String, String, String, Option<String>)>>,
    }

    #[async_trait]
    impl PushService for RecordingPush {
        async fn send_push(
            &self,
            topic: &str,
            title: &str,
            body: &str,
            click_url: Option<&str>,
        ) -> Result<String, NotificationError> {
            self.sent.lock().unwrap().push((
                topic.to_string(),
                title.to_string(),
                body.to_string(),
                click_url.map(str::to_string),
            ));
            Ok("mock-push-id".to_string())
        }
    }

    pub(crate) fn settings() -> NotificationSettings {
        NotificationSettings {
            email: "me@example.com".to_string(),
            timezone: "America/Los_Angeles".to_string(),
            quiet_hours: Some(QuietHours::default()),
        }
    }

    pub(crate) fn dispatcher(
        email: Arc<RecordingEmail>,
        push: Arc<RecordingPush>,
    ) -> AlertDispatcher {
        AlertDispatcher::new(
            email,
            push,
            "sender@example.com".to_string(),
            "my-topic".to_string(),
            settings(),
            chrono_tz::America::Los_Angeles,
        )
    }

    pub(crate) fn noon_pdt() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 19, 0, 0).unwrap()
    }

    fn midnight_pdt() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 7, 30, 0).unwrap()
    }

    fn vacancy(name: &str, url: &str) -> VacancyInfo {
        VacancyInfo {
            park: "Yosemite National Park".to_string(),
            name: name.to_string(),
            dates: "2025-07-01 to 2025-07-07".to_string(),
            url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sends_email_and_push_outside_quiet_hours() {
        let email = Arc::new(RecordingEmail::default());
        let push = Arc::new(RecordingPush::default());
        let dispatcher = dispatcher(email.clone(), push.clone());

        let outcome = dispatcher
            .send_alert(&[vacancy("A", "https://a"), vacancy("B", "https://b")], false, noon_pdt())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.push_id.as_deref(), Some("mock-push-id"));
        let emails = email.sent.lock().unwrap();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].0, "sender@example.com");
        assert_eq!(emails[0].1, "me@example.com");
        assert_eq!(emails[0].2, "🏕 Vacancy Alert — Yosemite National Park");

        let pushes = push.sent.lock().unwrap();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].0, "my-topic");
        assert_eq!(pushes[0].1, "🏕 Yosemite National Park — 2 vacancies found");
        assert_eq!(pushes[0].3.as_deref(), Some("https://a"));
    }

    #[tokio::test]
    async fn test_quiet_hours_suppress_push_only() {
        let email = Arc::new(RecordingEmail::default());
        let push = Arc::new(RecordingPush::default());
        let dispatcher = dispatcher(email.clone(), push.clone());

        let outcome = dispatcher
            .send_alert(&[vacancy("A", "https://a")], false, midnight_pdt())
            .await
            .unwrap()
            .unwrap();

        assert!(outcome.push_suppressed);
        assert_eq!(email.sent.lock().unwrap().len(), 1);
        assert!(push.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_force_bypasses_quiet_hours() {
        let email = Arc::new(RecordingEmail::default());
        let push = Arc::new(RecordingPush::default());
        let dispatcher = dispatcher(email.clone(), push.clone());

        let outcome = dispatcher
            .send_alert(&[vacancy("A", "https://a")], true, midnight_pdt())
            .await
            .unwrap()
            .unwrap();

        assert!(!outcome.push_suppressed);
        assert_eq!(push.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_email_failure_is_surfaced() {
        let email = Arc::new(RecordingEmail {
            fail: true,
            ..Default::default()
        });
        let push = Arc::new(RecordingPush::default());
        let dispatcher = dispatcher(email, push.clone());

        let result = dispatcher
            .send_alert(&[vacancy("A", "https://a")], false, noon_pdt())
            .await;

        assert!(matches!(result, Err(NotificationError::Email(_))));
        assert!(push.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch_sends_nothing() {
        let email = Arc::new(RecordingEmail::default());
        let push = Arc::new(RecordingPush::default());
        let dispatcher = dispatcher(email.clone(), push.clone());

        let outcome = dispatcher.send_alert(&[], false, noon_pdt()).await.unwrap();

        assert!(outcome.is_none());
        assert!(email.sent.lock().unwrap().is_empty());
    }
}
