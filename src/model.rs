use serde_json::{Map, Value};

use crate::dates::DateFormatter;
use crate::error::Error;

/// Printed in place of any scalar field the record does not carry.
pub const PLACEHOLDER: &str = "-";

/// A burial record as supplied by the record store: a loosely typed map of
/// camelCase fields. Every field is optional and may arrive with the wrong
/// JSON type; the accessors below apply one coercion rule per semantic type.
#[derive(Clone, Debug, Default)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(Error::InvalidRecord {
                source: None,
                hint: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Trimmed text. Numbers and booleans are stringified; null, empty and
    /// whitespace-only values are absent.
    pub fn text(&self, key: &str) -> Option<String> {
        self.raw(key).and_then(coerce_text)
    }

    /// First present value among `keys`.
    pub fn text_any(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.text(k))
    }

    /// Integer money amount; missing or non-numeric values are 0.
    pub fn amount(&self, key: &str) -> i64 {
        self.raw(key).map(coerce_amount).unwrap_or(0)
    }

    /// Raw date value, untouched apart from trimming.
    pub fn date(&self, key: &str) -> Option<String> {
        self.text(key)
    }

    pub fn list(&self, key: &str) -> &[Value] {
        match self.raw(key) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn coerce_text(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    if s.is_empty() { None } else { Some(s) }
}

fn coerce_amount(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                    .map(|f| f.trunc() as i64)
            })
            .unwrap_or(0),
        Value::String(s) => parse_amount(s),
        _ => 0,
    }
}

/// Accepts `"5000"`, `"5,000"`, `"-250"` and `"12.90"` (truncated). Anything
/// else is 0.
fn parse_amount(raw: &str) -> i64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();
    let (int_part, frac_part) = match cleaned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (cleaned.as_str(), None),
    };
    if frac_part.is_some_and(|f| !f.bytes().all(|b| b.is_ascii_digit())) {
        return 0;
    }
    let digits = int_part.strip_prefix(['-', '+']).unwrap_or(int_part);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    int_part.parse().unwrap_or(0)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Pending,
    Verified,
    Rejected,
    Completed,
    Other(String),
}

impl Status {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Status::Pending;
        };
        match raw.to_ascii_lowercase().as_str() {
            "pending" => Status::Pending,
            "verified" => Status::Verified,
            "rejected" => Status::Rejected,
            "completed" => Status::Completed,
            _ => Status::Other(raw.to_string()),
        }
    }

    /// Badge text: "Pending" reads as "PENDING VERIFICATION", everything
    /// else is its own name uppercased.
    pub fn label(&self) -> String {
        match self {
            Status::Pending => "PENDING VERIFICATION".to_string(),
            Status::Verified => "VERIFIED".to_string(),
            Status::Rejected => "REJECTED".to_string(),
            Status::Completed => "COMPLETED".to_string(),
            Status::Other(raw) => raw.to_uppercase(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceKind {
    Primary,
    Secondary,
    Other,
}

impl ServiceKind {
    pub fn label(self) -> &'static str {
        match self {
            ServiceKind::Primary => "Primary",
            ServiceKind::Secondary => "Secondary",
            ServiceKind::Other => "Other",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ServiceSlot {
    pub kind: ServiceKind,
    pub name: Option<String>,
    pub cost: i64,
}

/// Sum of the costs of the named services, in slot order.
pub fn services_total(slots: &[ServiceSlot]) -> i64 {
    slots
        .iter()
        .filter(|s| s.name.is_some())
        .fold(0i64, |acc, s| acc.saturating_add(s.cost))
}

#[derive(Clone, Debug, PartialEq)]
pub struct Attachment {
    pub filename: Option<String>,
    pub path: Option<String>,
    pub uploaded_at: Option<String>,
}

impl Attachment {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(_) => Some(Self {
                filename: None,
                path: coerce_text(value),
                uploaded_at: None,
            }),
            Value::Object(obj) => {
                let get = |k: &str| obj.get(k).and_then(coerce_text);
                Some(Self {
                    filename: get("filename").or_else(|| get("originalName")),
                    path: get("path").or_else(|| get("url")),
                    uploaded_at: get("uploadedAt"),
                })
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Deceased {
    pub full_name: Option<String>,
    pub id_passport: Option<String>,
    pub gender: Option<String>,
    pub age: Option<String>,
    pub date_of_death: Option<String>,
    pub date_of_burial: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NextOfKin {
    pub name: Option<String>,
    pub relationship: Option<String>,
    pub contact: Option<String>,
    pub id_passport: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Payment {
    pub receipt_no: Option<String>,
    pub payment_ref: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Permit {
    pub number: Option<String>,
    pub issue_date: Option<String>,
    pub issued_by: Option<String>,
    pub issued_by_contact: Option<String>,
    pub issued_to: Option<String>,
    pub issued_to_contact: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Applicant {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A record normalized to semantic types. Built once per export; the
/// renderers only ever see this.
#[derive(Clone, Debug, PartialEq)]
pub struct ReceiptData {
    pub status: Status,
    pub rejection_reason: Option<String>,
    pub deceased: Deceased,
    pub next_of_kin: NextOfKin,
    pub burial_location: Option<String>,
    pub services: [ServiceSlot; 3],
    pub payment: Payment,
    pub permit: Permit,
    pub applicant: Applicant,
    pub attachments: Vec<Attachment>,
}

impl ReceiptData {
    pub fn from_record(record: &Record, dates: &dyn DateFormatter) -> Self {
        let format = |key: &str| {
            record
                .date(key)
                .map(|raw| dates.format_date(&raw))
                .and_then(|s| {
                    let s = s.trim();
                    if s.is_empty() { None } else { Some(s.to_string()) }
                })
        };

        let full_name = ["firstName", "middleName", "lastName"]
            .iter()
            .filter_map(|k| record.text(k))
            .collect::<Vec<_>>()
            .join(" ");

        let age = record.text("age").map(|age| match record.text("ageCategory") {
            Some(category) => format!("{age} years ({category})"),
            None => format!("{age} years"),
        });

        let slot = |kind, name_key: &str, cost_key: &str| ServiceSlot {
            kind,
            name: record.text(name_key),
            cost: record.amount(cost_key),
        };

        Self {
            status: Status::parse(record.text("status").as_deref()),
            rejection_reason: record.text("rejectionReason"),
            deceased: Deceased {
                full_name: if full_name.is_empty() { None } else { Some(full_name) },
                id_passport: record.text("idPassportNo"),
                gender: record.text("gender"),
                age,
                date_of_death: format("dateOfDeath"),
                date_of_burial: format("dateOfBurial"),
            },
            next_of_kin: NextOfKin {
                name: record.text("nextOfKinName"),
                relationship: record.text("nextOfKinRelationship"),
                contact: record.text("nextOfKinContact"),
                id_passport: record.text("nextOfKinIdPassport"),
            },
            burial_location: record.text("burialLocation"),
            services: [
                slot(ServiceKind::Primary, "primaryService", "amountPaidBurial"),
                slot(ServiceKind::Secondary, "secondaryService", "amountPaidSecondary"),
                slot(ServiceKind::Other, "tertiaryService", "amountPaidTertiary"),
            ],
            payment: Payment {
                receipt_no: record.text_any(&["receiptNo", "receiptNumber"]),
                payment_ref: record.text_any(&["mpesaRefNo", "paymentReference"]),
            },
            permit: Permit {
                number: record.text("burialPermitNumber"),
                issue_date: format("burialPermitDate"),
                issued_by: record.text("burialPermitIssuedBy"),
                issued_by_contact: record.text("burialPermitIssuedByContact"),
                issued_to: record.text("burialPermitIssuedTo"),
                issued_to_contact: record.text("burialPermitIssuedToContact"),
            },
            applicant: Applicant {
                name: record.text_any(&["applicantName", "submitterName"]),
                email: record.text_any(&["applicantEmail", "submitterEmail"]),
                phone: record.text_any(&["applicantPhone", "submitterPhone", "applicantMobile"]),
            },
            attachments: record
                .list("attachments")
                .iter()
                .filter_map(Attachment::from_value)
                .map(|mut a| {
                    a.uploaded_at = a
                        .uploaded_at
                        .map(|raw| dates.format_date(&raw))
                        .filter(|s| !s.trim().is_empty());
                    a
                })
                .collect(),
        }
    }

    pub fn total(&self) -> i64 {
        services_total(&self.services)
    }
}

/// The value as printed: the text itself, or [`PLACEHOLDER`] when absent or
/// blank.
pub fn display(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn amounts_coerce_to_integers() {
        assert_eq!(coerce_amount(&json!(5000)), 5000);
        assert_eq!(coerce_amount(&json!(5000.9)), 5000);
        assert_eq!(coerce_amount(&json!("5,000")), 5000);
        assert_eq!(coerce_amount(&json!(" 12.90 ")), 12);
        assert_eq!(coerce_amount(&json!("-250")), -250);
        assert_eq!(coerce_amount(&json!("abc")), 0);
        assert_eq!(coerce_amount(&json!("12abc")), 0);
        assert_eq!(coerce_amount(&json!("")), 0);
        assert_eq!(coerce_amount(&json!(null)), 0);
        assert_eq!(coerce_amount(&json!(true)), 0);
    }

    #[test]
    fn text_trims_and_drops_blank_values() {
        let record = Record::new()
            .with("a", "  Jane ")
            .with("b", "   ")
            .with("c", 42)
            .with("d", Value::Null);
        assert_eq!(record.text("a").as_deref(), Some("Jane"));
        assert_eq!(record.text("b"), None);
        assert_eq!(record.text("c").as_deref(), Some("42"));
        assert_eq!(record.text("d"), None);
        assert_eq!(record.text("missing"), None);
    }

    #[test]
    fn status_parsing() {
        assert_eq!(Status::parse(None), Status::Pending);
        assert_eq!(Status::parse(Some("Verified")), Status::Verified);
        assert_eq!(Status::parse(Some("rejected")), Status::Rejected);
        assert_eq!(
            Status::parse(Some("Verification Pending")),
            Status::Other("Verification Pending".into())
        );
        assert_eq!(Status::Pending.label(), "PENDING VERIFICATION");
        assert_eq!(Status::Other("On Hold".into()).label(), "ON HOLD");
    }

    #[test]
    fn non_object_records_are_rejected() {
        assert!(matches!(
            Record::from_json("[1, 2]"),
            Err(Error::InvalidRecord { .. })
        ));
        assert!(matches!(
            Record::from_json("{ nope"),
            Err(Error::InvalidRecord { source: Some(_), .. })
        ));
    }

    #[test]
    fn total_counts_named_services_only() {
        let record = Record::new()
            .with("primaryService", "Burial plot")
            .with("amountPaidBurial", 5000)
            .with("secondaryService", "Tent hire")
            .with("amountPaidSecondary", "1,000")
            .with("amountPaidTertiary", 999);
        let data = ReceiptData::from_record(&record, &|raw: &str| raw.to_string());
        assert_eq!(data.total(), 6000);
        assert_eq!(data.services[2].name, None);
    }

    #[test]
    fn attachments_accept_strings_and_objects() {
        let record = Record::new().with(
            "attachments",
            json!([
                "uploads/a.pdf",
                { "originalName": "b.jpg", "url": "https://x/b.jpg", "uploadedAt": "2024-01-02" },
                42
            ]),
        );
        let data = ReceiptData::from_record(&record, &|raw: &str| format!("[{raw}]"));
        assert_eq!(data.attachments.len(), 2);
        assert_eq!(data.attachments[0].path.as_deref(), Some("uploads/a.pdf"));
        assert_eq!(data.attachments[0].filename, None);
        assert_eq!(data.attachments[1].filename.as_deref(), Some("b.jpg"));
        assert_eq!(data.attachments[1].uploaded_at.as_deref(), Some("[2024-01-02]"));
    }
}
