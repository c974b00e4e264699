//! Contact notification delivery
//!
//! Each submission produces two messages: an alert to the site admin and an
//! acknowledgment to the submitter. Delivery goes through an HTTP mail relay
//! that accepts `{from, to, subject, text}` JSON; without a relay configured the
//! messages are only logged.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::db::schemas::ContactDoc;
use crate::types::{ApiError, Result};

/// Subject of the acknowledgment sent to the submitter
pub const AUTO_REPLY_SUBJECT: &str = "Terima kasih atas minat Anda - PT Mabra Technology Solutions";

/// Best-effort delivery of contact notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_contact(&self, contact: &ContactDoc) -> Result<()>;
}

/// Plain-text email handed to the relay
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

fn or_na(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => "N/A",
    }
}

/// Alert for the site admin with the full submission
pub fn admin_alert(contact: &ContactDoc, from: &str, admin_email: &str) -> MailMessage {
    let text = format!(
        "New contact form submission received from the Mabratech website:\n\n\
         Name: {name}\n\
         Email: {email}\n\
         Phone: {phone}\n\
         Company: {company}\n\
         Service Interest: {service}\n\n\
         Message:\n{message}\n\n\
         Submission Details:\n\
         - Time: {time}\n\
         - IP Address: {ip}\n\
         - User Agent: {ua}\n\n\
         Please respond to this inquiry at your earliest convenience.\n\n\
         Best regards,\n\
         Mabratech Website System\n",
        name = contact.name,
        email = contact.email,
        phone = or_na(contact.phone.as_deref()),
        company = or_na(contact.company.as_deref()),
        service = contact.service,
        message = contact.message,
        time = contact.created_at.to_chrono().to_rfc3339(),
        ip = or_na(contact.ip_address.as_deref()),
        ua = or_na(contact.user_agent.as_deref()),
    );

    MailMessage {
        from: from.to_string(),
        to: admin_email.to_string(),
        subject: format!("New Contact Form Submission - {}", contact.service),
        text,
    }
}

/// Acknowledgment for the person who submitted the form
pub fn auto_reply(contact: &ContactDoc, from: &str) -> MailMessage {
    let text = format!(
        "Halo {name},\n\n\
         Terima kasih telah menghubungi PT Mabra Technology Solutions!\n\n\
         Kami telah menerima pesan Anda mengenai {service} dan akan segera menindaklanjutinya. \
         Tim kami akan menghubungi Anda dalam waktu 1x24 jam untuk membahas kebutuhan teknologi perusahaan Anda.\n\n\
         Ringkasan pesan Anda:\n\
         - Layanan yang diminati: {service}\n\
         - Perusahaan: {company}\n\n\
         Sementara menunggu respons dari tim kami, Anda dapat:\n\
         - Melihat portofolio proyek kami di website\n\
         - Menghubungi kami langsung di (022) 20668716\n\
         - Mengunjungi kantor kami di Jl. Canon No. 5 A-6 Cipageran Cimahi\n\n\
         Hormat kami,\n\
         Tim PT Mabra Technology Solutions\n\n\
         ---\n\
         PT Mabra Technology Solutions\n\
         Jl. Canon No. 5 A-6 Cipageran Cimahi\n\
         Phone: (022) 20668716\n\
         Email: info@mabratech.co.id\n\
         Website: www.mabratech.co.id\n",
        name = contact.name,
        service = contact.service,
        company = or_na(contact.company.as_deref()),
    );

    MailMessage {
        from: from.to_string(),
        to: contact.email.clone(),
        subject: AUTO_REPLY_SUBJECT.to_string(),
        text,
    }
}

/// Used when no mail relay is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn notify_contact(&self, contact: &ContactDoc) -> Result<()> {
        warn!(
            contact_id = %contact._id,
            "Mail relay not configured, skipping contact notification"
        );
        Ok(())
    }
}

/// Sends notifications through an HTTP mail relay
pub struct MailRelayNotifier {
    http_client: reqwest::Client,
    relay_url: String,
    api_key: Option<String>,
    from: String,
    admin_email: String,
}

impl MailRelayNotifier {
    pub fn new(
        relay_url: String,
        api_key: Option<String>,
        from: String,
        admin_email: String,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            relay_url,
            api_key,
            from,
            admin_email,
        })
    }

    async fn send(&self, message: &MailMessage) -> Result<()> {
        let mut request = self.http_client.post(&self.relay_url).json(message);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to reach mail relay: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Internal(format!(
                "Mail relay rejected message to {}: {}",
                message.to, status
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for MailRelayNotifier {
    async fn notify_contact(&self, contact: &ContactDoc) -> Result<()> {
        self.send(&admin_alert(contact, &self.from, &self.admin_email))
            .await?;
        info!(email = %contact.email, "Contact notification sent to admin");

        // The auto-reply failing does not undo the admin alert
        if let Err(e) = self.send(&auto_reply(contact, &self.from)).await {
            warn!(error = %e, email = %contact.email, "Failed to send auto-reply");
            return Ok(());
        }
        info!(email = %contact.email, "Auto-reply sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::ContactStatus;
    use bson::DateTime;

    fn contact() -> ContactDoc {
        let now = DateTime::now();
        ContactDoc {
            _id: "c-1".into(),
            name: "Budi".into(),
            email: "budi@x.com".into(),
            phone: Some("0812".into()),
            company: None,
            service: "ERP".into(),
            message: "This is a sufficiently long message.".into(),
            status: ContactStatus::New,
            created_at: now,
            updated_at: now,
            ip_address: Some("10.0.0.1".into()),
            user_agent: None,
        }
    }

    #[test]
    fn test_admin_alert() {
        let msg = admin_alert(&contact(), "web@mabratech.co.id", "info@mabratech.co.id");
        assert_eq!(msg.to, "info@mabratech.co.id");
        assert_eq!(msg.subject, "New Contact Form Submission - ERP");
        assert!(msg.text.contains("Phone: 0812"));
        assert!(msg.text.contains("Company: N/A"));
        assert!(msg.text.contains("IP Address: 10.0.0.1"));
    }

    #[test]
    fn test_auto_reply() {
        let msg = auto_reply(&contact(), "web@mabratech.co.id");
        assert_eq!(msg.to, "budi@x.com");
        assert_eq!(msg.subject, AUTO_REPLY_SUBJECT);
        assert!(msg.text.starts_with("Halo Budi,"));
    }

    #[tokio::test]
    async fn test_disabled_notifier_succeeds() {
        assert!(DisabledNotifier.notify_contact(&contact()).await.is_ok());
    }
}
