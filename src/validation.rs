//! Input validation for submitted entities
//!
//! Payloads are checked field by field before anything touches the store; the
//! first failing field is reported in the error. Lengths are counted in
//! characters, not bytes, so Indonesian text with diacritics is measured the
//! way users see it.

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use crate::db::schemas::Feature;
use crate::types::{ApiError, Result};

/// Something that can check its own shape
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$").ok()
        })
        .as_ref()
}

/// Whether `email` looks like a deliverable address
pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && email_regex().is_some_and(|re| re.is_match(email))
}

fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len < min {
        let message = if len == 0 {
            "is required".to_string()
        } else {
            format!("must be at least {} characters", min)
        };
        return Err(ApiError::validation(field, message));
    }
    if len > max {
        return Err(ApiError::validation(
            field,
            format!("must be at most {} characters", max),
        ));
    }
    Ok(())
}

fn check_max(field: &str, value: Option<&str>, max: usize) -> Result<()> {
    match value {
        Some(value) => check_len(field, value, 0, max),
        None => Ok(()),
    }
}

fn default_active() -> bool {
    true
}

/// String member of a JSON object; absent and `null` both read as `None`
fn text_field(body: &Map<String, Value>, field: &str) -> Result<Option<String>> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ApiError::validation(field, "must be a string")),
    }
}

/// Contact form submission
///
/// Missing required fields decode as empty strings so that [`Validate`]
/// reports them by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactPayload {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub service: String,
    pub message: String,
}

impl ContactPayload {
    /// Read a submission out of a decoded JSON body
    ///
    /// A body that is not an object is a bad request. A member of the wrong
    /// type is a validation failure on that member.
    pub fn from_json(body: Value) -> Result<Self> {
        let Value::Object(body) = body else {
            return Err(ApiError::BadRequest("Expected a JSON object".into()));
        };
        Ok(Self {
            name: text_field(&body, "name")?.unwrap_or_default(),
            email: text_field(&body, "email")?.unwrap_or_default(),
            phone: text_field(&body, "phone")?,
            company: text_field(&body, "company")?,
            service: text_field(&body, "service")?.unwrap_or_default(),
            message: text_field(&body, "message")?.unwrap_or_default(),
        })
    }
}

impl Validate for ContactPayload {
    fn validate(&self) -> Result<()> {
        check_len("name", &self.name, 1, 100)?;
        if self.email.is_empty() {
            return Err(ApiError::validation("email", "is required"));
        }
        if !is_valid_email(&self.email) {
            return Err(ApiError::validation("email", "not a valid email address"));
        }
        check_max("phone", self.phone.as_deref(), 20)?;
        check_max("company", self.company.as_deref(), 100)?;
        check_len("service", &self.service, 1, usize::MAX)?;
        check_len("message", &self.message, 10, 1000)
    }
}

/// New catalog service
#[derive(Debug, Clone, Deserialize)]
pub struct ServicePayload {
    pub icon: String,
    pub title: String,
    pub description: String,
    pub features: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub order: i32,
}

impl Validate for ServicePayload {
    fn validate(&self) -> Result<()> {
        check_len("title", &self.title, 1, 100)?;
        check_len("description", &self.description, 10, 500)
    }
}

/// New catalog product
#[derive(Debug, Clone, Deserialize)]
pub struct ProductPayload {
    pub icon: String,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub features: Vec<Feature>,
    pub color: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub order: i32,
}

impl Validate for ProductPayload {
    fn validate(&self) -> Result<()> {
        check_len("title", &self.title, 1, 100)?;
        check_len("subtitle", &self.subtitle, 1, 200)?;
        check_len("description", &self.description, 10, 500)
    }
}

/// New portfolio project
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectPayload {
    pub title: String,
    pub client: String,
    pub category: String,
    pub description: String,
    pub features: Vec<String>,
    pub technologies: Vec<String>,
    pub duration: String,
    pub year: String,
    pub status: String,
    pub icon: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub order: i32,
}

impl Validate for ProjectPayload {
    fn validate(&self) -> Result<()> {
        check_len("title", &self.title, 1, 100)?;
        check_len("client", &self.client, 1, 100)?;
        check_len("category", &self.category, 1, 100)?;
        check_len("description", &self.description, 10, 500)
    }
}

/// Analytics event as posted by the site
///
/// Has no [`Validate`] impl: any type and page are accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsPayload {
    pub event_type: String,
    pub page: String,
    pub metadata: Option<Map<String, Value>>,
}

impl AnalyticsPayload {
    /// Event type used when the body names none
    pub const DEFAULT_TYPE: &'static str = "page_view";
    /// Page used when the body names none
    pub const UNKNOWN_PAGE: &'static str = "unknown";

    /// Read an event out of any JSON value. Never fails; members that are
    /// missing or of the wrong type fall back to defaults.
    pub fn from_json(body: Value) -> Self {
        let mut body = match body {
            Value::Object(body) => body,
            _ => Map::new(),
        };
        let text = |body: &Map<String, Value>, field: &str, default: &str| {
            text_field(body, field)
                .ok()
                .flatten()
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            event_type: text(&body, "type", Self::DEFAULT_TYPE),
            page: text(&body, "page", Self::UNKNOWN_PAGE),
            metadata: match body.remove("metadata") {
                Some(Value::Object(map)) => Some(map),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> ContactPayload {
        ContactPayload {
            name: "Budi".into(),
            email: "budi@x.com".into(),
            phone: None,
            company: None,
            service: "ERP".into(),
            message: "This is a sufficiently long message.".into(),
        }
    }

    fn field_of(result: Result<()>) -> String {
        result.unwrap_err().field().unwrap().to_string()
    }

    #[test]
    fn test_valid_contact() {
        assert!(contact().validate().is_ok());
    }

    #[test]
    fn test_missing_fields_named_by_validator() {
        let body = serde_json::json!({ "name": "Budi", "email": "budi@x.com", "service": "ERP" });
        let c = ContactPayload::from_json(body).unwrap();
        let err = c.validate().unwrap_err();
        assert_eq!(err.field(), Some("message"));
        assert_eq!(err.to_string(), "Invalid message: is required");

        let c = ContactPayload::from_json(serde_json::json!({})).unwrap();
        assert_eq!(field_of(c.validate()), "name");

        let mut c = contact();
        c.email = String::new();
        assert_eq!(field_of(c.validate()), "email");
    }

    #[test]
    fn test_mistyped_field_is_validation_error() {
        let body = serde_json::json!({
            "name": "Budi",
            "email": "budi@x.com",
            "service": "ERP",
            "message": 12345
        });
        let err = ContactPayload::from_json(body).unwrap_err();
        assert_eq!(err.field(), Some("message"));

        let err = ContactPayload::from_json(serde_json::json!(["Budi"])).unwrap_err();
        assert_eq!(err.kind(), "bad_request");
    }

    #[test]
    fn test_null_optionals_read_as_absent() {
        let body = serde_json::json!({
            "name": "Budi",
            "email": "budi@x.com",
            "service": "ERP",
            "message": "This is a sufficiently long message.",
            "phone": null,
            "company": null
        });
        let c = ContactPayload::from_json(body).unwrap();
        assert_eq!(c, contact());
    }

    #[test]
    fn test_analytics_payload_defaults() {
        let event = AnalyticsPayload::from_json(serde_json::json!({ "type": "page_view" }));
        assert_eq!(event.event_type, "page_view");
        assert_eq!(event.page, AnalyticsPayload::UNKNOWN_PAGE);
        assert_eq!(event.metadata, None);

        let event = AnalyticsPayload::from_json(serde_json::json!({
            "type": 7,
            "page": "/about",
            "metadata": "not a map"
        }));
        assert_eq!(event.event_type, AnalyticsPayload::DEFAULT_TYPE);
        assert_eq!(event.page, "/about");
        assert_eq!(event.metadata, None);

        let event = AnalyticsPayload::from_json(serde_json::json!(null));
        assert_eq!(event.page, AnalyticsPayload::UNKNOWN_PAGE);
    }

    #[test]
    fn test_message_bounds() {
        let mut c = contact();
        c.message = "x".repeat(9);
        assert_eq!(field_of(c.validate()), "message");

        c.message = "x".repeat(10);
        assert!(c.validate().is_ok());

        c.message = "x".repeat(1000);
        assert!(c.validate().is_ok());

        c.message = "x".repeat(1001);
        assert_eq!(field_of(c.validate()), "message");
    }

    #[test]
    fn test_lengths_count_characters() {
        let mut c = contact();
        // 100 two-byte characters
        c.name = "é".repeat(100);
        assert!(c.validate().is_ok());
        c.name.push('é');
        assert_eq!(field_of(c.validate()), "name");
    }

    #[test]
    fn test_empty_name_and_service() {
        let mut c = contact();
        c.name = String::new();
        assert_eq!(field_of(c.validate()), "name");

        let mut c = contact();
        c.service = String::new();
        assert_eq!(field_of(c.validate()), "service");
    }

    #[test]
    fn test_optional_field_limits() {
        let mut c = contact();
        c.phone = Some("0".repeat(20));
        c.company = Some("c".repeat(100));
        assert!(c.validate().is_ok());

        c.phone = Some("0".repeat(21));
        assert_eq!(field_of(c.validate()), "phone");

        let mut c = contact();
        c.company = Some("c".repeat(101));
        assert_eq!(field_of(c.validate()), "company");
    }

    #[test]
    fn test_email_syntax() {
        for ok in ["budi@x.com", "a.b+tag@mail.example.co.id", "X_Y@sub-domain.org"] {
            assert!(is_valid_email(ok), "{} should be valid", ok);
        }
        for bad in ["", "budi", "budi@", "@x.com", "budi@x", "budi x@x.com", "budi@-x.com"] {
            assert!(!is_valid_email(bad), "{} should be invalid", bad);
        }
    }

    #[test]
    fn test_product_subtitle_required() {
        let product: ProductPayload = serde_json::from_value(serde_json::json!({
            "icon": "Users",
            "title": "Mabra Payroll",
            "subtitle": "",
            "description": "Complete payroll system",
            "features": ["Payroll", {"icon": "Clock", "text": "Attendance"}],
            "color": "from-blue-500 to-blue-600"
        }))
        .unwrap();
        assert!(product.is_active);
        assert_eq!(product.order, 0);
        assert_eq!(field_of(product.validate()), "subtitle");
    }

    #[test]
    fn test_project_fields() {
        let mut project = ProjectPayload {
            title: "Payroll Application".into(),
            client: "PT. Example".into(),
            category: "Web Application".into(),
            description: "Payroll for a plantation company".into(),
            features: vec![],
            technologies: vec![],
            duration: "6 bulan".into(),
            year: "2022".into(),
            status: "Completed".into(),
            icon: "Calculator".into(),
            is_active: true,
            order: 1,
        };
        assert!(project.validate().is_ok());

        project.client = String::new();
        assert_eq!(field_of(project.validate()), "client");
    }

    #[test]
    fn test_service_description_bounds() {
        let mut service = ServicePayload {
            icon: "Code".into(),
            title: "Web Development".into(),
            description: "short".into(),
            features: vec![],
            is_active: true,
            order: 0,
        };
        assert_eq!(field_of(service.validate()), "description");
        service.description = "d".repeat(501);
        assert_eq!(field_of(service.validate()), "description");
        service.description = "d".repeat(500);
        assert!(service.validate().is_ok());
    }
}
