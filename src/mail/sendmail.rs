// mail/sendmail.rs
use regex::Regex;
use serde_json::json;
use thiserror::Error;
use tokio::time::{sleep, Duration};

use crate::config::{Config, MailProvider};

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 1000;
const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Invalid email address: {0}")]
    InvalidRecipient(String),

    #[error("Email provider error: {0}")]
    Provider(String),

    #[error("SMTP error: {0}")]
    Smtp(String),
}

fn validate_email(email: &str) -> Result<(), MailError> {
    let email_regex = Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .map_err(|e| MailError::Provider(e.to_string()))?;

    if email_regex.is_match(email) {
        Ok(())
    } else {
        Err(MailError::InvalidRecipient(email.to_string()))
    }
}

/// Substitutes `{{key}}` markers. Values are escaped, the template is not.
pub fn render_template(template: &str, placeholders: &[(&str, String)]) -> String {
    let mut html = template.to_string();
    for (key, value) in placeholders {
        html = html.replace(&format!("{{{{{}}}}}", key), &ammonia::clean_text(value));
    }
    html
}

#[derive(Debug, Clone)]
pub struct Mailer {
    provider: MailProvider,
    from_email: String,
    resend_api_key: String,
    smtp_host: String,
    smtp_port: u16,
    smtp_username: String,
    smtp_password: String,
    client: reqwest::Client,
}

impl Mailer {
    pub fn new(config: &Config) -> Self {
        let mut provider = config.mail_provider;
        if provider == MailProvider::Resend && config.resend_api_key.is_empty() {
            tracing::warn!("MAIL_PROVIDER=resend without RESEND_API_KEY, emails will only be logged");
            provider = MailProvider::Log;
        }
        tracing::info!("Outgoing mail provider: {:?}", provider);

        Self {
            provider,
            from_email: config.from_email.clone(),
            resend_api_key: config.resend_api_key.clone(),
            smtp_host: config.smtp_host.clone(),
            smtp_port: config.smtp_port,
            smtp_username: config.smtp_username.clone(),
            smtp_password: config.smtp_password.clone(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn send(&self, to_email: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
        validate_email(to_email)?;

        match self.provider {
            MailProvider::Log => {
                tracing::info!("[mail:log] to={} subject={:?} ({} bytes)", to_email, subject, html_body.len());
                Ok(())
            }
            MailProvider::Resend => self.send_with_retries(to_email, subject, html_body).await,
            MailProvider::Smtp => self.send_via_smtp(to_email, subject, html_body).await,
        }
    }

    async fn send_with_retries(&self, to_email: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            match self.send_via_resend(to_email, subject, html_body).await {
                Ok(email_id) => {
                    tracing::info!("Email sent to {} (id: {})", to_email, email_id);
                    return Ok(());
                }
                Err(e) => {
                    last_error = Some(e);
                    if attempt < MAX_RETRIES {
                        let delay = RETRY_DELAY_MS * 2_u64.pow(attempt - 1);
                        tracing::warn!(
                            "Email send attempt {} failed for {}. Retrying in {}ms...",
                            attempt,
                            to_email,
                            delay
                        );
                        sleep(Duration::from_millis(delay)).await;
                    }
                }
            }
        }

        let error = last_error.unwrap_or_else(|| MailError::Provider("Unknown email sending error".to_string()));
        tracing::error!("Email failed for {} after {} attempts: {}", to_email, MAX_RETRIES, error);
        Err(error)
    }

    async fn send_via_resend(&self, to_email: &str, subject: &str, html_body: &str) -> Result<String, MailError> {
        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.resend_api_key)
            .json(&json!({
                "from": self.from_email,
                "to": to_email,
                "subject": subject,
                "html": html_body,
            }))
            .send()
            .await
            .map_err(|e| MailError::Provider(format!("Network error: {}", e)))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(MailError::Provider(format!("Resend API error ({}): {}", status.as_u16(), body)));
        }

        let id = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| value.get("id").and_then(|id| id.as_str()).map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        Ok(id)
    }

    async fn send_via_smtp(&self, to_email: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
        use lettre::{
            message::header::ContentType, transport::smtp::authentication::Credentials, Message,
            SmtpTransport, Transport,
        };

        let email = Message::builder()
            .from(
                self.from_email
                    .parse()
                    .map_err(|e| MailError::Smtp(format!("Invalid sender: {}", e)))?,
            )
            .to(to_email
                .parse()
                .map_err(|_| MailError::InvalidRecipient(to_email.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| MailError::Smtp(e.to_string()))?;

        let transport = SmtpTransport::relay(&self.smtp_host)
            .map_err(|e| MailError::Smtp(e.to_string()))?
            .port(self.smtp_port)
            .credentials(Credentials::new(
                self.smtp_username.clone(),
                self.smtp_password.clone(),
            ))
            .build();

        // lettre's SmtpTransport blocks on network I/O.
        let result = tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| MailError::Smtp(e.to_string()))?;

        match result {
            Ok(_) => {
                tracing::info!("Email sent via SMTP to {}", to_email);
                Ok(())
            }
            Err(e) => {
                tracing::error!("SMTP send failed for {}: {}", to_email, e);
                Err(MailError::Smtp(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name+tag@domain.co.uk").is_ok());
        assert!(validate_email("invalid-email").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn placeholders_are_escaped() {
        let html = render_template(
            "<p>Hello {{username}}, {{username}}</p>",
            &[("username", "<script>x</script>".to_string())],
        );
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert_eq!(html.matches("&lt;script&gt;").count(), 2);
    }

    #[tokio::test]
    async fn log_provider_accepts_valid_recipients() {
        let mailer = Mailer::new(&Config::for_tests());
        assert_eq!(mailer.provider, MailProvider::Log);
        assert!(mailer.send("someone@example.com", "Hi", "<p>hi</p>").await.is_ok());
        assert!(matches!(
            mailer.send("nope", "Hi", "<p>hi</p>").await,
            Err(MailError::InvalidRecipient(_))
        ));
    }
}
