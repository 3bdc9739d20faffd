use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{PurchasedItem, RecallMatch, SessionId, SessionPhase};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSession {
    pub id: SessionId,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub purchased_items: Option<Vec<PurchasedItem>>,
    #[serde(default)]
    pub recall_matches: Option<Vec<RecallMatch>>,
    #[serde(default)]
    pub ocr_error: Option<String>,
    #[serde(default)]
    pub llm_error: Option<String>,
}

impl ReceiptSession {
    pub fn items(&self) -> &[PurchasedItem] {
        self.purchased_items.as_deref().unwrap_or_default()
    }

    pub fn has_error(&self) -> bool {
        self.ocr_error.is_some() || self.llm_error.is_some()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.recall_matches.is_some() {
            SessionPhase::RecallChecked
        } else if self.has_error() {
            SessionPhase::ExtractionFailed
        } else if !self.items().is_empty() {
            SessionPhase::ExtractionSucceeded
        } else {
            SessionPhase::ExtractionPending
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRecallsResponse {
    #[serde(default)]
    pub message: String,
    pub updated_matches: ReceiptSession,
}

/// Entry of the recent recalls feed. `raw` is the untouched upstream record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecallSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl RecallSummary {
    pub fn category_label(&self) -> &str {
        let category = self.category.trim();
        if category.is_empty() {
            "Unknown"
        } else {
            category
        }
    }

    pub fn published_on(&self) -> Option<NaiveDate> {
        let date = self.date.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(date) {
            return Some(parsed.with_timezone(&Utc).date_naive());
        }
        date.get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    }

    /// ISO date when `date` parses, the raw string otherwise.
    pub fn display_date(&self) -> String {
        match self.published_on() {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => self.date.clone(),
        }
    }

    pub fn notice_url(&self) -> Option<&str> {
        self.raw.get("URL").and_then(serde_json::Value::as_str)
    }
}
