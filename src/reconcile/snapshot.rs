// src/reconcile/snapshot.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::process::aggregate::Aggregate;

/// Aggregate donation state as shown to users.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DonationSnapshot {
    pub total_amount: f64,
    pub donor_count: u64,
    pub donor_names: Vec<String>,
    /// When the data behind this snapshot was fetched. `None` for the zero snapshot.
    pub source_timestamp: Option<DateTime<Utc>>,
}

impl DonationSnapshot {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_aggregate(agg: Aggregate, fetched_at: DateTime<Utc>) -> Self {
        Self {
            total_amount: agg.total_amount,
            donor_count: agg.donor_count,
            donor_names: agg.donor_names,
            source_timestamp: Some(fetched_at),
        }
    }

    /// Same numbers and names, ignoring when they were fetched.
    pub fn same_data(&self, other: &DonationSnapshot) -> bool {
        self.total_amount == other.total_amount
            && self.donor_count == other.donor_count
            && self.donor_names == other.donor_names
    }

    pub fn view(&self, goal_amount: f64) -> DisplayState {
        DisplayState {
            total_amount: self.total_amount,
            donor_count: self.donor_count,
            donor_names: self.donor_names.clone(),
            percentage: percentage(self.total_amount, goal_amount),
        }
    }
}

/// What the presentation sink receives.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DisplayState {
    pub total_amount: f64,
    pub donor_count: u64,
    pub donor_names: Vec<String>,
    pub percentage: f64,
}

/// Progress toward `goal`, clamped to `0..=100`.
pub fn percentage(amount: f64, goal: f64) -> f64 {
    if goal <= 0.0 {
        return 0.0;
    }
    let pct = amount / goal * 100.0;
    if pct.is_nan() {
        0.0
    } else {
        pct.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_is_clamped() {
        assert_eq!(percentage(1_500_000.0, 1_000_000.0), 100.0);
        assert_eq!(percentage(-5.0, 1_000_000.0), 0.0);
        assert_eq!(percentage(250_000.0, 1_000_000.0), 25.0);
    }

    #[test]
    fn degenerate_goal_is_zero_percent() {
        assert_eq!(percentage(10.0, 0.0), 0.0);
        assert_eq!(percentage(f64::NAN, 100.0), 0.0);
    }

    #[test]
    fn same_data_ignores_timestamp() {
        let a = DonationSnapshot {
            total_amount: 10.0,
            donor_count: 1,
            donor_names: vec!["Al".into()],
            source_timestamp: Some(Utc::now()),
        };
        let b = DonationSnapshot {
            source_timestamp: None,
            ..a.clone()
        };
        assert!(a.same_data(&b));
        assert_ne!(a, b);
    }
}
