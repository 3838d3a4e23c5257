use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    client::BillingClient,
    error::{Result, SharedError},
    provider::BillingProvider,
    query::QueryState,
    types::{Checkout, CreateCheckoutRequest, RequestOptions},
};

/// Creates checkouts on demand
///
/// Nothing is sent until [`create_checkout`](Self::create_checkout) is called.
///
/// ```ignore
/// let mutation = CreateCheckoutMutation::new(client);
/// let checkout = mutation
///     .create_checkout(
///         CreateCheckoutRequest::new(49.99, Chain::Tron, Token::Usdt)
///             .with_metadata("order_id", "ord_12345"),
///         None,
///     )
///     .await?;
/// // redirect the payer to checkout.deposit_address ...
/// ```
pub struct CreateCheckoutMutation {
    client: Arc<dyn BillingClient>,
    state: watch::Sender<QueryState<Checkout>>,
}

impl CreateCheckoutMutation {
    pub fn new(client: Arc<dyn BillingClient>) -> Self {
        let (state, _) = watch::channel(QueryState::default());
        Self { client, state }
    }

    pub fn from_provider(provider: &BillingProvider) -> Result<Self> {
        Ok(Self::new(provider.client()?))
    }

    /// Create a checkout, recording the outcome in the observable state
    ///
    /// The error is both stored and returned; the call is not retried.
    pub async fn create_checkout(
        &self,
        request: CreateCheckoutRequest,
        options: Option<RequestOptions>,
    ) -> std::result::Result<Checkout, SharedError> {
        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });

        let options = options.unwrap_or_default();
        match self.client.create_checkout(&request, &options).await {
            Ok(checkout) => {
                info!(
                    checkout_id = %checkout.id,
                    amount_usd = checkout.amount_usd,
                    deposit_address = %checkout.deposit_address,
                    "Checkout created"
                );
                self.state.send_modify(|state| {
                    state.data = Some(checkout.clone());
                    state.is_loading = false;
                });
                Ok(checkout)
            }
            Err(e) => {
                warn!(error = %e, "Checkout creation failed");
                let error = Arc::new(e);
                self.state.send_modify(|state| {
                    state.error = Some(Arc::clone(&error));
                    state.is_loading = false;
                });
                Err(error)
            }
        }
    }

    pub fn state(&self) -> QueryState<Checkout> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<Checkout>> {
        self.state.subscribe()
    }
}
