// src/render.rs
//! Log-based presentation sink.

use tracing::{debug, info};

use crate::fetch::orchestrator::Status;
use crate::reconcile::DisplayState;

/// Percentage movement that counts as a visible change.
const PULSE_THRESHOLD: f64 = 0.5;

/// Whole US dollars with thousands separators, e.g. `$1,234`.
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

/// Donor names sorted for display, or a placeholder.
pub fn donor_list(names: &[String]) -> String {
    if names.is_empty() {
        return "No donor names available".to_string();
    }
    let mut sorted = names.to_vec();
    sorted.sort();
    sorted.join(", ")
}

/// Remembers what was last shown so changes can be flagged.
#[derive(Debug, Default)]
pub struct LogRenderer {
    shown: Option<DisplayState>,
}

impl LogRenderer {
    /// Returns `true` when the thermometer moved enough to pulse.
    pub fn render(&mut self, status: &Status) -> bool {
        let view = &status.display;
        let shown_percentage = self.shown.as_ref().map_or(0.0, |s| s.percentage);
        let pulse = (view.percentage - shown_percentage).abs() > PULSE_THRESHOLD;
        let changed = self.shown.as_ref() != Some(view);

        if changed {
            info!(
                raised = %format_currency(view.total_amount),
                donations = view.donor_count,
                percentage = %format!("{:.2}", view.percentage),
                donors = %donor_list(&view.donor_names),
                pulse,
                "thermometer updated"
            );
        } else {
            debug!(
                raised = %format_currency(view.total_amount),
                donations = view.donor_count,
                failures = status.diagnostics.consecutive_failures,
                "thermometer unchanged"
            );
        }
        if let Some(err) = &status.diagnostics.last_error {
            debug!(
                error = %err,
                at = ?status.diagnostics.last_error_at,
                "last fetch error"
            );
        }

        self.shown = Some(view.clone());
        pulse
    }

    /// Show a snapshot that did not come from the live loop (cache replay).
    pub fn render_cached(&mut self, view: &DisplayState) {
        info!(
            raised = %format_currency(view.total_amount),
            donations = view.donor_count,
            donors = %donor_list(&view.donor_names),
            "showing cached snapshot until first fetch"
        );
        self.shown = Some(view.clone());
    }
}
