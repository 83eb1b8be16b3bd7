//! Field resolution.

use super::errors::ResolutionError;
use super::payload::{BasketUpdate, BulkUpdateRequest, CommonData, UpdateType};
use shared_types::{Container, ContainerStatus, Timestamp};
use tracing::warn;

/// Which payload level supplied a status value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSource {
    Item,
    Common,
}

/// A recovered validation problem. The update still applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionWarning {
    /// The status string did not parse; the current status was kept.
    UnparseableStatus {
        uid: String,
        source: StatusSource,
        value: String,
    },
}

/// Outcome of resolving one basket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub container: Container,
    pub warnings: Vec<ResolutionWarning>,
}

/// What to do with a basket whose uid has no local record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Skip the basket and report it (receiving, transfer, clear).
    Skip,
    /// Start from a fresh unassigned container (production).
    Create,
}

impl MissingPolicy {
    pub fn for_update(update_type: UpdateType) -> Self {
        match update_type {
            UpdateType::Production => Self::Create,
            UpdateType::Receiving | UpdateType::Transfer | UpdateType::Clear => Self::Skip,
        }
    }
}

/// Result of resolving a whole request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedBatch {
    pub resolved: Vec<Resolution>,
    /// Uids skipped because no record existed.
    pub missing: Vec<String>,
}

impl ResolvedBatch {
    pub fn containers(&self) -> Vec<Container> {
        self.resolved.iter().map(|r| r.container.clone()).collect()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ResolutionWarning> {
        self.resolved.iter().flat_map(|r| r.warnings.iter())
    }
}

/// Resolve one basket against its existing record.
pub fn resolve_update(
    update_type: UpdateType,
    common: &CommonData,
    item: &BasketUpdate,
    existing: &Container,
    now: Timestamp,
) -> Result<Resolution, ResolutionError> {
    if item.uid != existing.uid {
        return Err(ResolutionError::UidMismatch {
            expected: existing.uid.clone(),
            found: item.uid.clone(),
        });
    }

    let mut warnings = Vec::new();
    let mut next = existing.clone();

    next.status = resolve_status(common, item, existing, &mut warnings);
    next.warehouse_id = item
        .warehouse_id
        .clone()
        .or_else(|| common.warehouse_id.clone())
        .or_else(|| existing.warehouse_id.clone());
    next.quantity = item
        .quantity
        .or(common.quantity)
        .unwrap_or(existing.quantity);
    next.update_by = common
        .update_by
        .clone()
        .or_else(|| existing.update_by.clone());
    next.last_updated = now;

    match update_type {
        // One production batch per submission: the association comes from
        // `common` alone, even where it is absent.
        UpdateType::Production => {
            next.product_id = common.product_id.clone();
            next.batch_id = common.batch_id.clone();
            next.production_date = common.production_date.clone();
            next.expire_date = common.expire_date.clone();
        }
        UpdateType::Clear => {
            next.status = ContainerStatus::Unassigned;
            next.quantity = 0;
            next.product_id = None;
            next.batch_id = None;
            next.warehouse_id = None;
            next.production_date = None;
            next.expire_date = None;
        }
        UpdateType::Receiving | UpdateType::Transfer => {}
    }

    Ok(Resolution {
        container: next,
        warnings,
    })
}

/// Resolve every basket of a request. `lookup` returns the persisted record.
///
/// Baskets without a record are handled per `MissingPolicy`; resolution of
/// the rest proceeds.
pub fn resolve_batch<F>(
    request: &BulkUpdateRequest,
    mut lookup: F,
    now: Timestamp,
) -> Result<ResolvedBatch, ResolutionError>
where
    F: FnMut(&str) -> Option<Container>,
{
    let policy = MissingPolicy::for_update(request.update_type);
    let mut batch = ResolvedBatch::default();

    for item in &request.baskets {
        let existing = match (lookup(&item.uid), policy) {
            (Some(container), _) => container,
            (None, MissingPolicy::Create) => Container::new(item.uid.clone(), now),
            (None, MissingPolicy::Skip) => {
                warn!(
                    uid = %item.uid,
                    update = %request.update_type,
                    "[bt-03] container not in local store, skipping"
                );
                batch.missing.push(item.uid.clone());
                continue;
            }
        };

        let resolution = resolve_update(
            request.update_type,
            &request.common_data,
            item,
            &existing,
            now,
        )?;
        for warning in &resolution.warnings {
            warn!(?warning, "[bt-03] recovered invalid field value");
        }
        batch.resolved.push(resolution);
    }

    Ok(batch)
}

/// Item status beats common status; an unparseable winner keeps the
/// existing status.
fn resolve_status(
    common: &CommonData,
    item: &BasketUpdate,
    existing: &Container,
    warnings: &mut Vec<ResolutionWarning>,
) -> ContainerStatus {
    let supplied = match (&item.status, &common.status) {
        (Some(value), _) => Some((value, StatusSource::Item)),
        (None, Some(value)) => Some((value, StatusSource::Common)),
        (None, None) => None,
    };

    let Some((value, source)) = supplied else {
        return existing.status;
    };

    value.parse().unwrap_or_else(|_| {
        warnings.push(ResolutionWarning::UnparseableStatus {
            uid: existing.uid.clone(),
            source,
            value: value.clone(),
        });
        existing.status
    })
}
