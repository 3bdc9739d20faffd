//! Plain-text rendering of workflow state and backend records.

use std::fmt::Write as _;

use shared::{
    domain::{PurchasedItem, RecallMatch, SessionPhase},
    protocol::{RecallSummary, ReceiptSession},
};
use workflow::{FailureKind, FlowStatus, WorkflowState};

pub fn status_line(state: &WorkflowState) -> String {
    match state.status {
        FlowStatus::Idle => match &state.selected_file {
            Some(file) => format!(
                "Selected {} ({})",
                file.file_name,
                human_readable_bytes(file.len() as u64)
            ),
            None => "Waiting for a receipt".to_string(),
        },
        FlowStatus::Uploading => "Uploading receipt...".to_string(),
        FlowStatus::Processing => "Reading receipt items...".to_string(),
        FlowStatus::Ready => format!(
            "Found {} item(s); ready to check recalls",
            state.purchased_items.len()
        ),
        FlowStatus::Checking => "Checking items against recent recalls...".to_string(),
        FlowStatus::Done => match state.recall_matches.as_deref().map(<[_]>::len) {
            Some(0) | None => "No recalls match your items".to_string(),
            Some(n) => format!("{n} recall match(es) found"),
        },
        FlowStatus::Error => format!(
            "Error: {}",
            state.error_message().unwrap_or("something went wrong")
        ),
    }
}

pub fn render_state(state: &WorkflowState) -> String {
    let mut out = status_line(state);
    out.push('\n');

    if !state.purchased_items.is_empty() {
        out.push_str("\nPurchased items:\n");
        out.push_str(&render_items(&state.purchased_items));
    }
    if let Some(matches) = &state.recall_matches {
        out.push_str("\nRecall matches:\n");
        out.push_str(&render_matches(matches));
    }
    match state.error.as_ref().map(|failure| failure.kind) {
        Some(FailureKind::Transport) => out.push_str(
            "\nThe server request did not complete; check the connection or try again later.\n",
        ),
        Some(FailureKind::Matching) => {
            out.push_str("\nItems above are still valid; the recall check can be retried.\n")
        }
        _ => {}
    }
    out
}

pub fn render_items(items: &[PurchasedItem]) -> String {
    let mut out = String::new();
    for item in items {
        match item.price {
            Some(price) => {
                let _ = writeln!(out, "  - {} (${price:.2})", item.name);
            }
            None => {
                let _ = writeln!(out, "  - {}", item.name);
            }
        }
    }
    out
}

pub fn render_matches(matches: &[RecallMatch]) -> String {
    if matches.is_empty() {
        return "  none\n".to_string();
    }
    let mut out = String::new();
    for m in matches {
        let _ = writeln!(
            out,
            "  ! {}: {} [{}]\n    {}",
            m.purchased_item_name, m.recall_title, m.recall_id, m.reason
        );
    }
    out
}

pub fn render_session(session: &ReceiptSession) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Session {}", session.id);
    if let Some(created_at) = session.created_at {
        let _ = writeln!(out, "Created: {}", created_at.format("%Y-%m-%d %H:%M UTC"));
    }
    let phase = match session.phase() {
        SessionPhase::ExtractionPending => "extraction pending",
        SessionPhase::ExtractionFailed => "extraction failed",
        SessionPhase::ExtractionSucceeded => "items extracted",
        SessionPhase::RecallChecked => "recalls checked",
    };
    let _ = writeln!(out, "Status: {phase}");
    if let Some(err) = &session.ocr_error {
        let _ = writeln!(out, "OCR error: {err}");
    }
    if let Some(err) = &session.llm_error {
        let _ = writeln!(out, "AI error: {err}");
    }
    if !session.items().is_empty() {
        out.push_str("Purchased items:\n");
        out.push_str(&render_items(session.items()));
    }
    if let Some(matches) = &session.recall_matches {
        out.push_str("Recall matches:\n");
        out.push_str(&render_matches(matches));
    }
    out
}

pub fn render_recalls(recalls: &[RecallSummary]) -> String {
    if recalls.is_empty() {
        return "No recalls found in the current window. There may be no new recalls, \
                or the feed is temporarily unavailable.\n"
            .to_string();
    }
    let mut out = String::new();
    for recall in recalls {
        let _ = writeln!(out, "{}", recall.title);
        let _ = writeln!(out, "  Category: {}", recall.category_label());
        let _ = writeln!(out, "  Last updated: {}", recall.display_date());
        if let Some(url) = recall.notice_url() {
            let _ = writeln!(out, "  Notice: {url}");
        }
    }
    out
}

fn human_readable_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes < KB {
        return format!("{bytes} B");
    }
    if bytes < MB {
        return format_scaled_unit(bytes, KB, "KB");
    }
    format_scaled_unit(bytes, MB, "MB")
}

fn format_scaled_unit(bytes: u64, unit_size: u64, unit_label: &str) -> String {
    let value = bytes as f64 / unit_size as f64;
    let value_text = format!("{value:.1}");
    let compact_value = value_text.strip_suffix(".0").unwrap_or(&value_text);
    format!("{compact_value} {unit_label}")
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
