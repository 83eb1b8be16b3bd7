//! Shipping verification session.
//!
//! One session per route being verified. The expected set is every uid that
//! was loaded onto the route; verification completes when all of them have
//! been scanned. Containers outside the expected set are accepted as extras
//! when their status allows shipping.

use super::transitions::{transition, Workflow};
use super::validation::ScanValidation;
use shared_types::{Container, ContainerStatus};
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of one verification scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShippingScan {
    /// Expected container, now verified.
    Verified(Container),
    /// Not expected on this route but shippable.
    Extra(Container),
    /// Already verified or already shipped. Not an error.
    Duplicate { uid: String, scan_count: u32 },
    Rejected(ScanValidation),
}

impl ShippingScan {
    #[must_use]
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Verified(_) => "verified",
            Self::Extra(_) => "extra",
            Self::Duplicate { .. } => "duplicate",
            Self::Rejected(v) => v.outcome(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingSession {
    route_id: String,
    expected: BTreeSet<String>,
    verified: BTreeSet<String>,
    extras: BTreeSet<String>,
    scan_counts: BTreeMap<String, u32>,
}

impl ShippingSession {
    pub fn new(route_id: impl Into<String>, expected: BTreeSet<String>) -> Self {
        Self {
            route_id: route_id.into(),
            expected,
            verified: BTreeSet::new(),
            extras: BTreeSet::new(),
            scan_counts: BTreeMap::new(),
        }
    }

    pub fn route_id(&self) -> &str {
        &self.route_id
    }

    /// Classify a scan and record it.
    pub fn scan(&mut self, uid: &str, found: Option<Container>) -> ShippingScan {
        let Some(container) = found else {
            return ShippingScan::Rejected(ScanValidation::NotRegistered(uid.to_string()));
        };

        let seen = self.verified.contains(uid) || self.extras.contains(uid);
        if seen || container.status == ContainerStatus::Shipped {
            let count = self.scan_counts.entry(uid.to_string()).or_insert(0);
            *count += 1;
            return ShippingScan::Duplicate {
                uid: uid.to_string(),
                scan_count: *count,
            };
        }

        if transition(Workflow::ShippingVerification, container.status).is_err() {
            let current = container.status;
            return ShippingScan::Rejected(ScanValidation::InvalidStatus { container, current });
        }

        self.scan_counts.insert(uid.to_string(), 1);
        if self.expected.contains(uid) {
            self.verified.insert(uid.to_string());
            ShippingScan::Verified(container)
        } else {
            self.extras.insert(uid.to_string());
            ShippingScan::Extra(container)
        }
    }

    /// Every expected uid has been verified.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.expected.is_subset(&self.verified)
    }

    /// Expected uids not yet scanned.
    pub fn outstanding(&self) -> BTreeSet<String> {
        self.expected.difference(&self.verified).cloned().collect()
    }

    /// Verified plus extras: everything this session will ship.
    pub fn accepted(&self) -> BTreeSet<String> {
        self.verified.union(&self.extras).cloned().collect()
    }

    pub fn verified(&self) -> &BTreeSet<String> {
        &self.verified
    }

    pub fn extras(&self) -> &BTreeSet<String> {
        &self.extras
    }

    pub fn scan_count(&self, uid: &str) -> u32 {
        self.scan_counts.get(uid).copied().unwrap_or(0)
    }
}
