use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ses::Client as SesClient;
use campground_scan::{EmailService, NotificationError, PushService};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};

/// Public ntfy server
pub const NTFY_BASE_URL: &str = "https://ntfy.sh";

/// Email service that delivers plain-text mail through AWS SES.
#[derive(Debug, Clone)]
pub struct SesEmailService {
    ses_client: SesClient,
}

impl SesEmailService {
    /// Creates a new instance with credentials from the default AWS provider chain.
    pub async fn new() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self {
            ses_client: SesClient::new(&config),
        }
    }
}

#[async_trait]
impl EmailService for SesEmailService {
    async fn send_email(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, NotificationError> {
        let subject_content = aws_sdk_ses::types::Content::builder()
            .data(subject)
            .charset("UTF-8")
            .build()
            .map_err(|e| {
                log::error!("❌ Failed to build subject content: {}", e);
                NotificationError::Email(format!("Failed to build subject: {}", e))
            })?;

        let text_content = aws_sdk_ses::types::Content::builder()
            .data(body)
            .charset("UTF-8")
            .build()
            .map_err(|e| {
                log::error!("❌ Failed to build text content: {}", e);
                NotificationError::Email(format!("Failed to build text body: {}", e))
            })?;

        let message = aws_sdk_ses::types::Message::builder()
            .subject(subject_content)
            .body(aws_sdk_ses::types::Body::builder().text(text_content).build())
            .build();

        let destination = aws_sdk_ses::types::Destination::builder()
            .to_addresses(to)
            .build();

        log::info!("📧 Sending email to {} via AWS SES...", to);

        let result = self
            .ses_client
            .send_email()
            .source(from)
            .destination(destination)
            .message(message)
            .send()
            .await;

        match result {
            Ok(output) => {
                let message_id = output.message_id().to_string();
                log::info!("📧 SES Message ID: {}", message_id);
                Ok(message_id)
            }
            Err(e) => {
                log::error!("❌ AWS SES error: {:#?}", e);
                let error_msg = if let Some(service_error) = e.as_service_error() {
                    format!("AWS SES service error: {:?}", service_error)
                } else {
                    format!("AWS SES error: {}", e)
                };
                Err(NotificationError::Email(error_msg))
            }
        }
    }
}

/// Push service that publishes to an ntfy topic.
#[derive(Debug, Clone)]
pub struct NtfyPushService {
    client: Client,
    base_url: String,
}

impl NtfyPushService {
    /// Publisher for the public ntfy.sh server
    pub fn new() -> Result<Self, NotificationError> {
        Self::with_base_url(NTFY_BASE_URL)
    }

    /// Publisher for a self-hosted ntfy server
    pub fn with_base_url(base_url: &str) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| NotificationError::Push(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL a message for `topic` is posted to
    pub fn publish_url(&self, topic: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(topic))
    }
}

/// ntfy reads `Title` and `Click` headers; values are sent as raw UTF-8.
fn ntfy_headers(title: &str, click_url: Option<&str>) -> Result<HeaderMap, NotificationError> {
    let mut headers = HeaderMap::new();
    headers.insert("Title", header_value(title)?);
    if let Some(url) = click_url {
        headers.insert("Click", header_value(url)?);
    }
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue, NotificationError> {
    HeaderValue::from_bytes(value.as_bytes())
        .map_err(|e| NotificationError::Push(format!("Invalid header value {:?}: {}", value, e)))
}

#[async_trait]
impl PushService for NtfyPushService {
    async fn send_push(
        &self,
        topic: &str,
        title: &str,
        body: &str,
        click_url: Option<&str>,
    ) -> Result<String, NotificationError> {
        let response = self
            .client
            .post(self.publish_url(topic))
            .headers(ntfy_headers(title, click_url)?)
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| NotificationError::Push(format!("ntfy request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("❌ ntfy returned {}: {}", status, body);
            return Err(NotificationError::Push(format!("ntfy returned HTTP {}", status)));
        }

        let message_id = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(str::to_string))
            .unwrap_or_else(|| format!("ntfy-{}", uuid::Uuid::new_v4()));

        log::info!("📱 Push published to ntfy topic {}", topic);
        Ok(message_id)
    }
}
