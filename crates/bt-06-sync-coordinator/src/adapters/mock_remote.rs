//! Scriptable in-memory remote backend.

use crate::error::RemoteError;
use crate::ports::{LoadingSubmission, RemoteApi, SamplingRequest, ShippingSubmission};
use async_trait::async_trait;
use bt_03_field_resolution::BulkUpdateRequest;
use parking_lot::Mutex;
use shared_types::{Container, LoadingRoute};
use std::collections::HashMap;
use std::time::Duration;

/// A call the mock received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    FetchContainer(String),
    BulkUpdate(BulkUpdateRequest),
    DeleteContainer(String),
    FetchRoutes,
    SubmitLoading(LoadingSubmission),
    SubmitShippingVerification(ShippingSubmission),
    MarkSampling(SamplingRequest),
}

#[derive(Default)]
struct MockState {
    containers: HashMap<String, Container>,
    routes: Vec<LoadingRoute>,
    calls: Vec<RemoteCall>,
    fail_with: Option<RemoteError>,
    delay: Option<Duration>,
}

/// Remote backend double.
///
/// Holds a container registry for fetches, records every call, and can be
/// told to fail every call or to stall (to exercise the timeout path).
#[derive(Default)]
pub struct MockRemoteApi {
    state: Mutex<MockState>,
}

impl MockRemoteApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container(self, container: Container) -> Self {
        self.state
            .lock()
            .containers
            .insert(container.uid.clone(), container);
        self
    }

    pub fn with_routes(self, routes: Vec<LoadingRoute>) -> Self {
        self.state.lock().routes = routes;
        self
    }

    /// Every subsequent call fails with `error`.
    pub fn fail_with(&self, error: RemoteError) {
        self.state.lock().fail_with = Some(error);
    }

    /// Every subsequent call sleeps for `delay` first.
    pub fn stall_for(&self, delay: Duration) {
        self.state.lock().delay = Some(delay);
    }

    /// Back to answering normally.
    pub fn heal(&self) {
        let mut state = self.state.lock();
        state.fail_with = None;
        state.delay = None;
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    async fn record(&self, call: RemoteCall) -> Result<(), RemoteError> {
        let (delay, failure) = {
            let mut state = self.state.lock();
            state.calls.push(call);
            (state.delay, state.fail_with.clone())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteApi for MockRemoteApi {
    async fn fetch_container(&self, uid: &str) -> Result<Container, RemoteError> {
        self.record(RemoteCall::FetchContainer(uid.to_string()))
            .await?;
        self.state
            .lock()
            .containers
            .get(uid)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound {
                resource: format!("container {uid}"),
            })
    }

    async fn bulk_update(&self, request: &BulkUpdateRequest) -> Result<(), RemoteError> {
        self.record(RemoteCall::BulkUpdate(request.clone())).await
    }

    async fn delete_container(&self, uid: &str) -> Result<(), RemoteError> {
        self.record(RemoteCall::DeleteContainer(uid.to_string()))
            .await?;
        self.state.lock().containers.remove(uid);
        Ok(())
    }

    async fn fetch_routes(&self) -> Result<Vec<LoadingRoute>, RemoteError> {
        self.record(RemoteCall::FetchRoutes).await?;
        Ok(self.state.lock().routes.clone())
    }

    async fn submit_loading(&self, submission: &LoadingSubmission) -> Result<(), RemoteError> {
        self.record(RemoteCall::SubmitLoading(submission.clone()))
            .await
    }

    async fn submit_shipping_verification(
        &self,
        submission: &ShippingSubmission,
    ) -> Result<(), RemoteError> {
        self.record(RemoteCall::SubmitShippingVerification(submission.clone()))
            .await
    }

    async fn mark_sampling(&self, request: &SamplingRequest) -> Result<(), RemoteError> {
        self.record(RemoteCall::MarkSampling(request.clone())).await
    }
}
