// src/reconcile/mod.rs
//! Owner of the single accepted snapshot.

pub mod snapshot;

use serde::Deserialize;
use tracing::{debug, info, warn};

pub use snapshot::{percentage, DisplayState, DonationSnapshot};

/// How a fresh aggregate is weighed against the accepted one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReconciliationPolicy {
    /// Totals and donor counts may only grow; empty name lists keep the old list.
    #[default]
    Monotonic,
    /// Every successful fetch replaces the snapshot wholesale.
    ReplaceAlways,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    TotalDecreased,
    DonorCountDecreased,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Accepted { names_retained: bool },
    /// Tentative data matched the accepted data; nothing replaced.
    Unchanged,
    Rejected(RejectReason),
}

/// Reconciliation gate. The accepted snapshot is only ever replaced here.
#[derive(Debug)]
pub struct Gate {
    policy: ReconciliationPolicy,
    accepted: DonationSnapshot,
}

impl Gate {
    /// Start from the zero snapshot.
    pub fn init(policy: ReconciliationPolicy) -> Self {
        Self {
            policy,
            accepted: DonationSnapshot::zero(),
        }
    }

    /// Forget everything and go back to the zero snapshot.
    pub fn reset(&mut self) {
        self.accepted = DonationSnapshot::zero();
    }

    pub fn policy(&self) -> ReconciliationPolicy {
        self.policy
    }

    pub fn accepted(&self) -> &DonationSnapshot {
        &self.accepted
    }

    /// Decide whether `tentative` becomes the accepted snapshot.
    pub fn reconcile(&mut self, tentative: DonationSnapshot) -> Decision {
        let prior = &self.accepted;

        if self.policy == ReconciliationPolicy::Monotonic {
            let reason = if tentative.total_amount < prior.total_amount {
                Some(RejectReason::TotalDecreased)
            } else if tentative.donor_count < prior.donor_count {
                Some(RejectReason::DonorCountDecreased)
            } else {
                None
            };
            if let Some(reason) = reason {
                warn!(
                    ?reason,
                    prior_total = prior.total_amount,
                    prior_donors = prior.donor_count,
                    new_total = tentative.total_amount,
                    new_donors = tentative.donor_count,
                    "rejected regressing snapshot"
                );
                return Decision::Rejected(reason);
            }
        }

        let names_retained = self.policy == ReconciliationPolicy::Monotonic
            && tentative.donor_names.is_empty()
            && !prior.donor_names.is_empty();

        let next = DonationSnapshot {
            donor_names: if names_retained {
                prior.donor_names.clone()
            } else {
                tentative.donor_names
            },
            ..tentative
        };

        if next.same_data(prior) {
            debug!("snapshot unchanged");
            return Decision::Unchanged;
        }

        info!(
            total = next.total_amount,
            donors = next.donor_count,
            names = next.donor_names.len(),
            names_retained,
            "accepted snapshot"
        );
        self.accepted = next;
        Decision::Accepted { names_retained }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn snap(total: f64, donors: u64, names: &[&str]) -> DonationSnapshot {
        DonationSnapshot {
            total_amount: total,
            donor_count: donors,
            donor_names: names.iter().map(|s| s.to_string()).collect(),
            source_timestamp: Some(Utc::now()),
        }
    }

    fn seeded(policy: ReconciliationPolicy) -> Gate {
        let mut gate = Gate::init(policy);
        assert!(matches!(
            gate.reconcile(snap(100.0, 2, &["Al", "Bo"])),
            Decision::Accepted { .. }
        ));
        gate
    }

    #[test]
    fn starts_at_zero() {
        let gate = Gate::init(ReconciliationPolicy::Monotonic);
        assert_eq!(gate.accepted(), &DonationSnapshot::zero());
    }

    #[test]
    fn monotonic_rejects_regression() {
        let mut gate = seeded(ReconciliationPolicy::Monotonic);
        let before = gate.accepted().clone();
        assert_eq!(
            gate.reconcile(snap(90.0, 1, &[])),
            Decision::Rejected(RejectReason::TotalDecreased)
        );
        assert_eq!(gate.accepted(), &before);
    }

    #[test]
    fn monotonic_rejects_fewer_donors_even_with_higher_total() {
        let mut gate = seeded(ReconciliationPolicy::Monotonic);
        assert_eq!(
            gate.reconcile(snap(120.0, 1, &["Al"])),
            Decision::Rejected(RejectReason::DonorCountDecreased)
        );
        assert_eq!(gate.accepted().total_amount, 100.0);
    }

    #[test]
    fn monotonic_retains_names_when_new_list_empty() {
        let mut gate = seeded(ReconciliationPolicy::Monotonic);
        assert_eq!(
            gate.reconcile(snap(150.0, 3, &[])),
            Decision::Accepted {
                names_retained: true
            }
        );
        let acc = gate.accepted();
        assert_eq!(acc.total_amount, 150.0);
        assert_eq!(acc.donor_count, 3);
        assert_eq!(acc.donor_names, vec!["Al", "Bo"]);
    }

    #[test]
    fn monotonic_replaces_non_empty_names() {
        let mut gate = seeded(ReconciliationPolicy::Monotonic);
        gate.reconcile(snap(150.0, 3, &["Cy"]));
        assert_eq!(gate.accepted().donor_names, vec!["Cy"]);
    }

    #[test]
    fn identical_payload_is_unchanged() {
        let mut gate = seeded(ReconciliationPolicy::Monotonic);
        let before = gate.accepted().clone();
        assert_eq!(
            gate.reconcile(snap(100.0, 2, &["Al", "Bo"])),
            Decision::Unchanged
        );
        assert_eq!(gate.accepted(), &before);
    }

    #[test]
    fn replace_always_follows_source_down() {
        let mut gate = seeded(ReconciliationPolicy::ReplaceAlways);
        assert_eq!(
            gate.reconcile(snap(90.0, 1, &[])),
            Decision::Accepted {
                names_retained: false
            }
        );
        let acc = gate.accepted();
        assert_eq!(acc.total_amount, 90.0);
        assert_eq!(acc.donor_count, 1);
        assert!(acc.donor_names.is_empty());
    }

    #[test]
    fn same_csv_twice_through_pipeline_is_stable() {
        use crate::process::{process_csv, ProcessOptions};

        let csv = "Timestamp,Amount,Name\nt,$50,Al\nt,75.50,Bo\n";
        let mut gate = Gate::init(ReconciliationPolicy::Monotonic);
        let mut accepted = Vec::new();
        for _ in 0..2 {
            let agg = process_csv(csv, &ProcessOptions::default()).unwrap();
            gate.reconcile(DonationSnapshot::from_aggregate(agg, Utc::now()));
            accepted.push(gate.accepted().clone());
        }
        assert_eq!(accepted[0], accepted[1]);
        assert_eq!(accepted[0].total_amount, 125.5);
        assert_eq!(accepted[0].donor_count, 2);
    }

    #[test]
    fn reset_returns_to_zero() {
        let mut gate = seeded(ReconciliationPolicy::Monotonic);
        gate.reset();
        assert_eq!(gate.accepted(), &DonationSnapshot::zero());
        assert_eq!(gate.policy(), ReconciliationPolicy::Monotonic);
    }
}
