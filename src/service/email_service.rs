//! Email Service
//!
//! Outbound mail behind the [`Mailer`] trait. [`SmtpMailer`] delivers through
//! an SMTP relay; [`LogMailer`] only logs and is used when no relay is
//! configured. Message bodies are rendered by [`EmailTemplates`].

use async_trait::async_trait;
use chrono::Datelike;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use log::{debug, error, info};
use tera::{Context, Tera};
use thiserror::Error;

use crate::config::EmailConfig;
use crate::utils::error::{AppResult, IntoAppError};

/// Mail delivery failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to render email: {0}")]
    Template(String),

    #[error("Failed to build email message: {0}")]
    Message(String),

    #[error("Failed to send email: {0}")]
    Transport(String),

    #[error("Mailer misconfigured: {0}")]
    Configuration(String),
}

/// Mail notifier
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), DeliveryError>;
}

/// SMTP mailer using an authenticated relay
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self, DeliveryError> {
        let from = format!("{} <{}>", config.from_name, config.from_email)
            .parse()
            .map_err(|e| DeliveryError::Configuration(format!("Invalid from address: {}", e)))?;

        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| {
                DeliveryError::Configuration(format!("Failed to configure SMTP relay: {}", e))
            })?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), DeliveryError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .parse()
                .map_err(|e| DeliveryError::InvalidAddress(format!("{}: {}", to, e)))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| DeliveryError::Message(e.to_string()))?;

        match self.transport.send(message).await {
            Ok(_) => {
                info!("Email '{}' sent to {}", subject, to);
                Ok(())
            }
            Err(e) => {
                error!("Failed to send email '{}' to {}: {}", subject, to, e);
                Err(DeliveryError::Transport(e.to_string()))
            }
        }
    }
}

/// Mailer that writes messages to the log instead of delivering them
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), DeliveryError> {
        info!("SMTP not configured; email '{}' for {} not delivered", subject, to);
        debug!("Email body:\n{}", html_body);
        Ok(())
    }
}

const VERIFICATION_TEMPLATE: &str = "verification_email.html";

const VERIFICATION_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Verify Your Email Address</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1>Verify Your Email Address</h1>
    <p>Hello {{ username }},</p>
    <p>Please confirm your email address by following the link below:</p>
    <p><a href="{{ verification_link | safe }}" style="display: inline-block; padding: 12px 24px; background: #007bff; color: white; text-decoration: none; border-radius: 4px;">Verify email</a></p>
    <p>Or paste this address into your browser:<br>{{ verification_link | safe }}</p>
    <p>This link expires in <strong>{{ expires_in_minutes }} minutes</strong>.</p>
    <p>If you didn't create an account, you can safely ignore this email.</p>
    <p style="font-size: 12px; color: #666;">&copy; {{ current_year }} {{ app_name }}</p>
</body>
</html>
"#;

/// Rendered email ready for a [`Mailer`]
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub html_body: String,
}

/// Embedded email templates
#[derive(Debug, Clone)]
pub struct EmailTemplates {
    tera: Tera,
    app_name: String,
}

impl EmailTemplates {
    pub fn new(app_name: impl Into<String>) -> AppResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(VERIFICATION_TEMPLATE, VERIFICATION_HTML)
            .into_app_error("Failed to add verification template")?;

        Ok(Self {
            tera,
            app_name: app_name.into(),
        })
    }

    pub fn verification_email(
        &self,
        username: &str,
        verification_link: &str,
        expires_in_minutes: i64,
    ) -> Result<RenderedEmail, DeliveryError> {
        let mut context = Context::new();
        context.insert("username", username);
        context.insert("verification_link", verification_link);
        context.insert("expires_in_minutes", &expires_in_minutes);
        context.insert("app_name", &self.app_name);
        context.insert("current_year", &chrono::Utc::now().year());

        let html_body = self
            .tera
            .render(VERIFICATION_TEMPLATE, &context)
            .map_err(|e| DeliveryError::Template(e.to_string()))?;

        Ok(RenderedEmail {
            subject: "Verify Your Email Address".to_string(),
            html_body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_email_contains_link() {
        let templates = EmailTemplates::new("City Library").unwrap();
        let email = templates
            .verification_email(
                "reader",
                "http://localhost:3000/auth/verify-email?token=abc.def.ghi",
                60,
            )
            .unwrap();

        assert_eq!(email.subject, "Verify Your Email Address");
        assert!(email.html_body.contains("Hello reader"));
        assert!(email
            .html_body
            .contains("http://localhost:3000/auth/verify-email?token=abc.def.ghi"));
        assert!(email.html_body.contains("60 minutes"));
        assert!(email.html_body.contains("City Library"));
    }

    #[tokio::test]
    async fn test_log_mailer_accepts_messages() {
        assert!(LogMailer
            .send("a@x.com", "Subject", "<p>Body</p>")
            .await
            .is_ok());
    }

    #[test]
    fn test_smtp_mailer_rejects_bad_sender() {
        let config = EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_username: "user".to_string(),
            smtp_password: "pass".to_string(),
            from_name: "Library".to_string(),
            from_email: "not an address".to_string(),
        };
        assert!(matches!(
            SmtpMailer::new(&config),
            Err(DeliveryError::Configuration(_))
        ));
    }
}
