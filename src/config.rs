use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::pdf::canvas::PageGeometry;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Fixed text printed on every receipt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Branding {
    pub title: String,
    pub subtitle: String,
    pub footer_notice: String,
    pub system_name: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            title: "BURIAL RECORD".to_string(),
            subtitle: "OFFICIAL ACKNOWLEDGEMENT RECEIPT".to_string(),
            footer_notice: "This document is a computer-generated official receipt.".to_string(),
            system_name: "Burial Record Management System".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReceiptOptions {
    /// Prefix for relative attachment paths.
    pub base_url: String,
    /// Currency code printed before amounts.
    pub currency: String,
    /// Installed font family; Helvetica when unset or not found.
    pub font_family: Option<String>,
    /// `chrono` patterns for the generation stamp in the header.
    pub header_date_format: String,
    pub header_time_format: String,
    pub branding: Branding,
    /// Generation time; the current local time when unset.
    #[serde(skip)]
    pub generated_at: Option<DateTime<Local>>,
    #[serde(skip)]
    pub geometry: PageGeometry,
}

impl Default for ReceiptOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            currency: "KES".to_string(),
            font_family: None,
            header_date_format: "%-m/%-d/%Y".to_string(),
            header_time_format: "%-I:%M:%S %p".to_string(),
            branding: Branding::default(),
            generated_at: None,
            geometry: PageGeometry::a4(),
        }
    }
}

impl ReceiptOptions {
    /// Defaults overridden by `RECEIPT_BASE_URL`, `RECEIPT_CURRENCY` and
    /// `RECEIPT_FONT`. Font search paths come from `RECEIPT_FONT_DIRS`,
    /// read when fonts are resolved.
    pub fn from_env() -> Self {
        let mut opts = Self::default();
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        if let Some(url) = var("RECEIPT_BASE_URL") {
            opts.base_url = url;
        }
        if let Some(currency) = var("RECEIPT_CURRENCY") {
            opts.currency = currency;
        }
        if let Some(font) = var("RECEIPT_FONT") {
            opts.font_family = Some(font);
        }
        opts
    }

    pub fn generated_at(&self) -> DateTime<Local> {
        self.generated_at.unwrap_or_else(Local::now)
    }

    /// Absolute URL for an attachment path. Paths that already carry a
    /// scheme are used verbatim.
    pub fn resolve_url(&self, path: &str) -> String {
        let path = path.trim();
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
