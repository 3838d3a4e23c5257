use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::{
    client::{BillingClient, HttpBillingClient},
    error::{BillingError, Result},
    types::BillingConfig,
};

/// Holds the client shared by pollers, queries and mutations
///
/// The provider is passed explicitly to whatever needs a client. A provider
/// built with [`Default`] holds no client, and asking it for one is a usage
/// error ([`BillingError::MissingClient`]) rather than something to retry.
///
/// ```ignore
/// let provider = BillingProvider::new(
///     BillingConfig::new("sk_test_...").with_base_url("http://localhost:8080/v1"),
/// )?;
/// let poller = CheckoutStatusPoller::from_provider(&provider)?;
/// ```
#[derive(Default)]
pub struct BillingProvider {
    inner: RwLock<Option<ProviderClient>>,
}

struct ProviderClient {
    /// Configuration the client was built from, `None` for injected clients
    config: Option<BillingConfig>,
    client: Arc<dyn BillingClient>,
}

impl BillingProvider {
    /// Build a provider backed by an [`HttpBillingClient`]
    pub fn new(config: BillingConfig) -> Result<Self> {
        let provider = Self::default();
        provider.configure(config)?;
        Ok(provider)
    }

    /// Build a provider around an existing client
    pub fn with_client(client: Arc<dyn BillingClient>) -> Self {
        Self {
            inner: RwLock::new(Some(ProviderClient {
                config: None,
                client,
            })),
        }
    }

    /// Get the client, or [`BillingError::MissingClient`] if none is configured
    pub fn client(&self) -> Result<Arc<dyn BillingClient>> {
        self.inner
            .read()
            .as_ref()
            .map(|p| Arc::clone(&p.client))
            .ok_or(BillingError::MissingClient)
    }

    /// Apply a configuration, rebuilding the client only if the API key or base URL changed
    ///
    /// Returns `true` when a new client was built. Holders of the previous
    /// client keep using it until they fetch the new one.
    pub fn configure(&self, config: BillingConfig) -> Result<bool> {
        let mut inner = self.inner.write();

        if let Some(ProviderClient {
            config: Some(current),
            ..
        }) = inner.as_ref()
        {
            if current.api_key == config.api_key && current.base_url == config.base_url {
                return Ok(false);
            }
        }

        let client = HttpBillingClient::new(config.clone())?;
        debug!(base_url = %config.base_url, "Configured billing client");
        *inner = Some(ProviderClient {
            config: Some(config),
            client: Arc::new(client),
        });
        Ok(true)
    }
}
