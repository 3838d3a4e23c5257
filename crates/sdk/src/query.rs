//! List fetchers for checkouts, webhook endpoints and events.
//!
//! A [`Query`] remembers the parameters it was built with and exposes the
//! outcome of its most recent fetch as [`QueryState`]. Failures are surfaced
//! once through the state and the return value of [`Query::refetch`]; there is
//! no automatic retry.

use std::sync::Arc;

use futures::{FutureExt, future::BoxFuture};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, warn};

use crate::{
    client::BillingClient,
    error::SharedError,
    types::{
        CheckoutList, EventList, ListCheckoutsParams, ListEventsParams,
        ListWebhookEndpointsParams, WebhookEndpointList,
    },
};

/// Observable outcome of a query or mutation
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    /// Result of the last successful call, kept when a later call fails
    pub data: Option<T>,

    /// Failure of the last call, cleared when a new call starts
    pub error: Option<SharedError>,

    /// True while a call is in flight
    pub is_loading: bool,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
        }
    }
}

type FetchFn<T> = Arc<
    dyn Fn(Arc<dyn BillingClient>) -> BoxFuture<'static, crate::error::Result<T>> + Send + Sync,
>;

/// A re-runnable list request
///
/// ```ignore
/// let query = Query::checkouts(client, ListCheckoutsParams {
///     limit: Some(10),
///     status: Some(CheckoutStatus::Confirmed),
///     ..Default::default()
/// });
/// let page = query.refetch().await?;
/// ```
pub struct Query<T> {
    name: &'static str,
    client: Arc<dyn BillingClient>,
    fetch: FetchFn<T>,
    state: Arc<watch::Sender<QueryState<T>>>,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            client: Arc::clone(&self.client),
            fetch: Arc::clone(&self.fetch),
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Query<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn new(name: &'static str, client: Arc<dyn BillingClient>, fetch: FetchFn<T>) -> Self {
        let (state, _) = watch::channel(QueryState::default());
        Self {
            name,
            client,
            fetch,
            state: Arc::new(state),
        }
    }

    /// Run the request again with the stored parameters
    pub async fn refetch(&self) -> Result<T, SharedError> {
        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });

        debug!(query = self.name, "Fetching");
        let result = (self.fetch)(Arc::clone(&self.client)).await;

        match result {
            Ok(data) => {
                self.state.send_modify(|state| {
                    state.data = Some(data.clone());
                    state.is_loading = false;
                });
                Ok(data)
            }
            Err(e) => {
                warn!(query = self.name, error = %e, "Fetch failed");
                let error = Arc::new(e);
                self.state.send_modify(|state| {
                    state.error = Some(Arc::clone(&error));
                    state.is_loading = false;
                });
                Err(error)
            }
        }
    }

    /// Spawn the initial fetch in the background
    pub fn open(&self) -> JoinHandle<()> {
        let query = self.clone();
        tokio::spawn(async move {
            let _ = query.refetch().await;
        })
    }

    pub fn state(&self) -> QueryState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.state.subscribe()
    }
}

impl Query<CheckoutList> {
    /// Paginated list of checkouts
    pub fn checkouts(client: Arc<dyn BillingClient>, params: ListCheckoutsParams) -> Self {
        let params = Arc::new(params);
        Self::new(
            "checkouts",
            client,
            Arc::new(move |client: Arc<dyn BillingClient>| {
                let params = Arc::clone(&params);
                async move { client.list_checkouts(&params).await }.boxed()
            }),
        )
    }
}

impl Query<WebhookEndpointList> {
    /// Paginated list of webhook endpoints
    pub fn webhook_endpoints(
        client: Arc<dyn BillingClient>,
        params: ListWebhookEndpointsParams,
    ) -> Self {
        let params = Arc::new(params);
        Self::new(
            "webhook_endpoints",
            client,
            Arc::new(move |client: Arc<dyn BillingClient>| {
                let params = Arc::clone(&params);
                async move { client.list_webhook_endpoints(&params).await }.boxed()
            }),
        )
    }
}

impl Query<EventList> {
    /// Paginated list of events
    pub fn events(client: Arc<dyn BillingClient>, params: ListEventsParams) -> Self {
        let params = Arc::new(params);
        Self::new(
            "events",
            client,
            Arc::new(move |client: Arc<dyn BillingClient>| {
                let params = Arc::clone(&params);
                async move { client.list_events(&params).await }.boxed()
            }),
        )
    }
}
