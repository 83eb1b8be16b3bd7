//! Pure completion functions over a `LoadingRoute`.

use crate::error::{CompletionError, CompletionResult};
use shared_types::{
    ItemCompletion, LoadingItem, LoadingRoute, RouteCompletion, RouteStatus, Timestamp,
};

/// Recompute item flags, route flags, totals and status from the counters.
pub fn recompute(route: &mut LoadingRoute) {
    for item in &mut route.items {
        let (full, loose) = item_flags(item);
        item.completion.full_baskets_completed = full;
        item.completion.loose_items_completed = loose;
    }

    let completion = &mut route.completion;
    completion.full_baskets_completed = route
        .items
        .iter()
        .all(|i| i.completion.full_baskets_completed);
    completion.loose_items_completed = route
        .items
        .iter()
        .all(|i| i.completion.loose_items_completed);
    completion.total_full_baskets_scanned = route
        .items
        .iter()
        .map(|i| i.completion.full_baskets_scanned)
        .sum();
    completion.total_loose_scanned = route
        .items
        .iter()
        .map(|i| i.completion.loose_scanned)
        .sum();

    if route.status == RouteStatus::Verified {
        return;
    }
    route.status = if completion.full_baskets_completed && completion.loose_items_completed {
        RouteStatus::Completed
    } else if route.items.iter().any(|i| i.completion.has_activity()) {
        RouteStatus::InProgress
    } else {
        RouteStatus::Pending
    };
}

fn item_flags(item: &LoadingItem) -> (bool, bool) {
    let c = &item.completion;
    let full = item.expected_full_baskets == 0
        || c.full_baskets_scanned >= item.expected_full_baskets
        || c.full_baskets_confirmed;
    let loose =
        item.expected_loose_quantity == 0 || c.loose_scanned == item.expected_loose_quantity;
    (full, loose)
}

/// Count one full basket for `product_id`.
///
/// Returns `false` (no change) if `uid` already contributed to the item.
pub fn record_full_basket(
    route: &mut LoadingRoute,
    product_id: &str,
    uid: &str,
    now: Timestamp,
    actor: Option<&str>,
) -> CompletionResult<bool> {
    let item = item_mut(route, product_id)?;
    if !item.completion.contributing_uids.insert(uid.to_string()) {
        return Ok(false);
    }
    item.completion.full_baskets_scanned += 1;
    touch(route, now, actor);
    recompute(route);
    Ok(true)
}

/// Add `quantity` loose units for `product_id`, optionally attributed to a
/// container.
pub fn record_loose_items(
    route: &mut LoadingRoute,
    product_id: &str,
    quantity: u32,
    uid: Option<&str>,
    now: Timestamp,
    actor: Option<&str>,
) -> CompletionResult<()> {
    let item = item_mut(route, product_id)?;
    item.completion.loose_scanned = item.completion.loose_scanned.saturating_add(quantity);
    if let Some(uid) = uid {
        item.completion.contributing_uids.insert(uid.to_string());
    }
    touch(route, now, actor);
    recompute(route);
    Ok(())
}

/// Operator confirms the full-basket count for `product_id` by hand.
pub fn confirm_full_baskets(
    route: &mut LoadingRoute,
    product_id: &str,
    now: Timestamp,
    actor: Option<&str>,
) -> CompletionResult<()> {
    item_mut(route, product_id)?.completion.full_baskets_confirmed = true;
    touch(route, now, actor);
    recompute(route);
    Ok(())
}

/// Back to the initial state: counters, uid sets and status.
pub fn reset(route: &mut LoadingRoute) {
    for item in &mut route.items {
        item.completion = ItemCompletion::default();
    }
    route.completion = RouteCompletion::default();
    route.status = RouteStatus::Pending;
    recompute(route);
}

/// Fold a freshly fetched route into the local mirror.
///
/// Expectations come from `remote`; scan progress recorded locally survives
/// for every product still on the route, as does a local `VERIFIED`.
pub fn merge_remote(local: Option<&LoadingRoute>, mut remote: LoadingRoute) -> LoadingRoute {
    if let Some(local) = local {
        for item in &mut remote.items {
            if let Some(existing) = local.item(&item.product_id) {
                item.completion = existing.completion.clone();
            }
        }
        remote.completion.last_updated = local.completion.last_updated;
        remote.completion.last_updated_by = local.completion.last_updated_by.clone();
        if local.status == RouteStatus::Verified {
            remote.status = RouteStatus::Verified;
        }
    }
    recompute(&mut remote);
    remote
}

/// Terminal state after successful shipping verification.
pub fn mark_verified(route: &mut LoadingRoute, now: Timestamp, actor: Option<&str>) {
    route.status = RouteStatus::Verified;
    touch(route, now, actor);
}

fn item_mut<'a>(
    route: &'a mut LoadingRoute,
    product_id: &str,
) -> CompletionResult<&'a mut LoadingItem> {
    let route_id = route.id.clone();
    route
        .item_mut(product_id)
        .ok_or_else(|| CompletionError::UnknownProduct {
            route_id,
            product_id: product_id.to_string(),
        })
}

fn touch(route: &mut LoadingRoute, now: Timestamp, actor: Option<&str>) {
    route.completion.last_updated = Some(now);
    if let Some(actor) = actor {
        route.completion.last_updated_by = Some(actor.to_string());
    }
}
