//! Filtered container queries.
//!
//! Adapters evaluate a `ContainerQuery` by filtering with `matches` and then
//! ordering with `sort`, so every backend returns identical results.

use shared_types::{Container, ContainerStatus};
use std::cmp::Ordering;

/// A filtered query over container records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerQuery {
    /// Containers in a warehouse whose status is in `statuses`.
    /// An empty status set matches every status.
    ByWarehouse {
        warehouse_id: String,
        statuses: Vec<ContainerStatus>,
    },
    /// Candidates for issuing a product out of a warehouse.
    ForIssue {
        product_id: String,
        warehouse_id: String,
        status: ContainerStatus,
    },
}

impl ContainerQuery {
    pub fn by_warehouse(warehouse_id: impl Into<String>, statuses: &[ContainerStatus]) -> Self {
        Self::ByWarehouse {
            warehouse_id: warehouse_id.into(),
            statuses: statuses.to_vec(),
        }
    }

    pub fn for_issue(
        product_id: impl Into<String>,
        warehouse_id: impl Into<String>,
        status: ContainerStatus,
    ) -> Self {
        Self::ForIssue {
            product_id: product_id.into(),
            warehouse_id: warehouse_id.into(),
            status,
        }
    }

    #[must_use]
    pub fn matches(&self, container: &Container) -> bool {
        match self {
            Self::ByWarehouse {
                warehouse_id,
                statuses,
            } => {
                container.is_in_warehouse(warehouse_id)
                    && (statuses.is_empty() || statuses.contains(&container.status))
            }
            Self::ForIssue {
                product_id,
                warehouse_id,
                status,
            } => {
                container.product_id.as_deref() == Some(product_id.as_str())
                    && container.is_in_warehouse(warehouse_id)
                    && container.status == *status
            }
        }
    }

    /// Order matching results.
    pub fn sort(&self, containers: &mut [Container]) {
        match self {
            Self::ByWarehouse { .. } => containers.sort_by(|a, b| a.uid.cmp(&b.uid)),
            Self::ForIssue { .. } => containers.sort_by(issue_order),
        }
    }

    /// Filter and order an arbitrary record set.
    pub fn apply<'a, I>(&self, records: I) -> Vec<Container>
    where
        I: IntoIterator<Item = &'a Container>,
    {
        let mut found: Vec<Container> = records
            .into_iter()
            .filter(|c| self.matches(c))
            .cloned()
            .collect();
        self.sort(&mut found);
        found
    }
}

/// Quantity descending, then oldest `last_updated` first, then uid.
fn issue_order(a: &Container, b: &Container) -> Ordering {
    b.quantity
        .cmp(&a.quantity)
        .then_with(|| a.last_updated.cmp(&b.last_updated))
        .then_with(|| a.uid.cmp(&b.uid))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stocked(uid: &str, quantity: u32, last_updated: u64) -> Container {
        Container::new(uid, last_updated)
            .with_product("P1")
            .with_warehouse("W1")
            .with_quantity(quantity)
            .with_status(ContainerStatus::InStock)
    }

    #[test]
    fn test_issue_order_prefers_fullest_then_oldest() {
        let records = vec![
            stocked("A", 10, 300),
            stocked("B", 40, 500),
            stocked("C", 40, 100),
            stocked("D", 20, 50),
        ];
        let query = ContainerQuery::for_issue("P1", "W1", ContainerStatus::InStock);
        let uids: Vec<_> = query.apply(&records).into_iter().map(|c| c.uid).collect();
        assert_eq!(uids, vec!["C", "B", "D", "A"]);
    }

    #[test]
    fn test_for_issue_filters_product_warehouse_status() {
        let mut other_product = stocked("A", 10, 0);
        other_product.product_id = Some("P2".to_string());
        let other_warehouse = stocked("B", 10, 0).with_warehouse("W2");
        let loading = stocked("C", 10, 0).with_status(ContainerStatus::Loading);
        let ok = stocked("D", 10, 0);

        let records = vec![other_product, other_warehouse, loading, ok];
        let query = ContainerQuery::for_issue("P1", "W1", ContainerStatus::InStock);
        let found = query.apply(&records);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].uid, "D");
    }

    #[test]
    fn test_by_warehouse_empty_status_set_matches_all() {
        let records = vec![
            stocked("B", 1, 0),
            stocked("A", 1, 0).with_status(ContainerStatus::Sampling),
            stocked("C", 1, 0).with_warehouse("W9"),
        ];
        let all = ContainerQuery::by_warehouse("W1", &[]).apply(&records);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].uid, "A");

        let only_stock =
            ContainerQuery::by_warehouse("W1", &[ContainerStatus::InStock]).apply(&records);
        assert_eq!(only_stock.len(), 1);
        assert_eq!(only_stock[0].uid, "B");
    }
}
