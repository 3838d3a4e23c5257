//! Checkout status polling.
//!
//! [`CheckoutStatusPoller`] repeatedly asks the API for the status of one
//! checkout until it reaches a terminal state (`confirmed`, `expired` or
//! `failed`) or the caller stops it. Requests are strictly sequential: the
//! next one is only scheduled once the previous one has completed, after the
//! server-suggested interval (or a fixed interval pinned by the caller).
//!
//! Failed requests never end polling. The failure is exposed as the current
//! error next to the last good snapshot and the request is retried on the
//! next tick.
//!
//! The latest state is published on a [`tokio::sync::watch`] channel; every
//! response lands as a single update so observers never see a half-applied
//! snapshot.

use std::{collections::HashMap, num::NonZeroU64, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::{runtime::Handle, sync::watch, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::{
    client::BillingClient,
    error::{BillingError, Result, SharedError},
    provider::BillingProvider,
    types::{CheckoutStatus, CheckoutStatusResponse, defaults},
};

/// Polling interval used until the server suggests one
pub const DEFAULT_POLLING_INTERVAL_MS: u64 = defaults::POLLING_INTERVAL_MS;

/// Options accepted by [`CheckoutStatusPoller::start`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// When false no request is issued and the poller reports not-polling
    pub enabled: bool,

    /// Fixed interval that takes precedence over server suggestions
    pub polling_interval_ms: Option<NonZeroU64>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            polling_interval_ms: None,
        }
    }
}

impl PollOptions {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Pin the polling interval. Zero clears the override.
    pub fn with_polling_interval_ms(mut self, interval_ms: u64) -> Self {
        self.polling_interval_ms = NonZeroU64::new(interval_ms);
        self
    }
}

/// Latest known status of the observed checkout
#[derive(Debug, Clone, Default)]
pub struct CheckoutStatusState {
    /// `None` until the first successful response
    pub status: Option<CheckoutStatus>,

    pub confirmations: u32,

    pub required_confirmations: u32,

    /// On-chain transaction hash, once detected
    pub tx_hash: Option<String>,

    pub detected_at: Option<DateTime<Utc>>,

    pub confirmed_at: Option<DateTime<Utc>>,

    /// True while requests are being issued or scheduled
    pub is_polling: bool,

    /// Failure of the last request, cleared by the next success
    pub error: Option<SharedError>,
}

impl CheckoutStatusState {
    pub fn is_terminal(&self) -> bool {
        self.status.is_some_and(|s| s.is_terminal())
    }

    fn apply_response(&mut self, res: &CheckoutStatusResponse) {
        self.status = Some(res.status);
        self.confirmations = res.confirmations;
        self.required_confirmations = res.required_confirmations;
        self.tx_hash = res.tx_hash.clone();
        self.detected_at = res.detected_at;
        self.confirmed_at = res.confirmed_at;
        self.error = None;
    }
}

/// What the poller is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// No checkout observed, polling disabled, or stopped
    Idle,

    /// A status request is outstanding
    InFlight,

    /// Waiting for the next tick
    Waiting,

    /// The observed checkout reached a terminal status
    Terminal,
}

impl std::fmt::Display for PollPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollPhase::Idle => write!(f, "idle"),
            PollPhase::InFlight => write!(f, "in-flight"),
            PollPhase::Waiting => write!(f, "waiting"),
            PollPhase::Terminal => write!(f, "terminal"),
        }
    }
}

struct Control {
    /// Bumped on every stop/start; work tagged with an older value is discarded
    generation: u64,
    phase: PollPhase,
    /// Last non-empty checkout id passed to `start`
    checkout_id: Option<String>,
    server_interval_ms: u64,
    interval_override: Option<NonZeroU64>,
    /// Final snapshots of checkouts this instance saw reach a terminal status
    terminal: HashMap<String, CheckoutStatusState>,
    task: Option<JoinHandle<()>>,
}

impl Control {
    fn effective_interval_ms(&self) -> u64 {
        self.interval_override
            .map(NonZeroU64::get)
            .unwrap_or(self.server_interval_ms)
    }
}

struct Shared {
    control: Mutex<Control>,
    state: watch::Sender<CheckoutStatusState>,
}

impl Shared {
    /// Abort the running cycle without publishing. Must be called with the control lock held.
    fn halt(&self, control: &mut Control) {
        control.generation += 1;
        if let Some(task) = control.task.take() {
            task.abort();
        }
        if control.phase != PollPhase::Terminal {
            control.phase = PollPhase::Idle;
        }
    }

    /// Abort the running cycle and report not-polling. Must be called with the control lock held.
    fn cancel(&self, control: &mut Control) {
        self.halt(control);
        self.state.send_if_modified(|state| {
            let was_polling = state.is_polling;
            state.is_polling = false;
            was_polling
        });
    }

    /// Mark a new request as outstanding, unless the cycle was cancelled meanwhile
    fn begin_request(&self, generation: u64) -> bool {
        let mut control = self.control.lock();
        if control.generation != generation {
            return false;
        }
        control.phase = PollPhase::InFlight;
        true
    }

    /// Apply the outcome of one request and return the delay before the next one
    ///
    /// Returns `None` when the outcome was discarded (stale generation) or the
    /// checkout reached a terminal status.
    fn apply(
        &self,
        generation: u64,
        checkout_id: &str,
        result: Result<CheckoutStatusResponse>,
    ) -> Option<Duration> {
        let mut control = self.control.lock();
        if control.generation != generation {
            debug!(checkout_id = %checkout_id, "Discarding status response for stopped poller");
            return None;
        }

        match result {
            Ok(res) => {
                if let Some(interval_ms) = res.polling_interval_ms.filter(|ms| *ms > 0) {
                    control.server_interval_ms = interval_ms;
                }

                let terminal = res.status.is_terminal();
                self.state.send_modify(|state| {
                    state.apply_response(&res);
                    if terminal {
                        state.is_polling = false;
                    }
                });

                if terminal {
                    info!(
                        checkout_id = %checkout_id,
                        status = %res.status,
                        confirmations = res.confirmations,
                        "Checkout reached terminal status, polling stopped"
                    );
                    control.phase = PollPhase::Terminal;
                    control.task = None;
                    let snapshot = self.state.borrow().clone();
                    control.terminal.insert(checkout_id.to_string(), snapshot);
                    return None;
                }

                debug!(
                    checkout_id = %checkout_id,
                    status = %res.status,
                    confirmations = res.confirmations,
                    required_confirmations = res.required_confirmations,
                    "Checkout status updated"
                );
            }
            Err(e) => {
                warn!(
                    checkout_id = %checkout_id,
                    error = %e,
                    delay_ms = control.effective_interval_ms(),
                    "Checkout status request failed, retrying"
                );
                self.state.send_modify(|state| state.error = Some(Arc::new(e)));
            }
        }

        control.phase = PollPhase::Waiting;
        Some(Duration::from_millis(control.effective_interval_ms()))
    }
}

/// Polls the status of a single checkout until it settles
///
/// # Example
///
/// ```ignore
/// use billing_sdk::{CheckoutStatusPoller, PollOptions};
///
/// let poller = CheckoutStatusPoller::from_provider(&provider)?;
/// poller.start(Some("co_abc123"), PollOptions::default());
///
/// let mut rx = poller.subscribe();
/// while rx.changed().await.is_ok() {
///     let state = rx.borrow_and_update().clone();
///     println!("{:?} {}/{}", state.status, state.confirmations, state.required_confirmations);
///     if !state.is_polling {
///         break;
///     }
/// }
/// ```
///
/// `start` spawns a task on the current Tokio runtime. Called outside of one
/// it records an error and does not poll. Dropping the poller stops it.
pub struct CheckoutStatusPoller {
    client: Arc<dyn BillingClient>,
    shared: Arc<Shared>,
}

impl CheckoutStatusPoller {
    pub fn new(client: Arc<dyn BillingClient>) -> Self {
        let (state, _) = watch::channel(CheckoutStatusState::default());
        Self {
            client,
            shared: Arc::new(Shared {
                control: Mutex::new(Control {
                    generation: 0,
                    phase: PollPhase::Idle,
                    checkout_id: None,
                    server_interval_ms: DEFAULT_POLLING_INTERVAL_MS,
                    interval_override: None,
                    terminal: HashMap::new(),
                    task: None,
                }),
                state,
            }),
        }
    }

    /// Create a poller using the provider's client
    pub fn from_provider(provider: &BillingProvider) -> Result<Self> {
        Ok(Self::new(provider.client()?))
    }

    /// Begin observing `checkout_id`
    ///
    /// Any running cycle is stopped first, so calling `start` with a new id or
    /// new options behaves like `stop` followed by a fresh start. With no id,
    /// an empty id, or `enabled: false` nothing is requested and the snapshot
    /// is left as last observed. A checkout this instance already saw reach a
    /// terminal status is not polled again.
    pub fn start(&self, checkout_id: Option<&str>, options: PollOptions) {
        let checkout_id = checkout_id.filter(|id| !id.is_empty());
        let mut control = self.shared.control.lock();
        // Each path below publishes at most once; a restart is never seen as a stop
        self.shared.halt(&mut control);
        control.interval_override = options.polling_interval_ms;

        let mut reset = false;
        if let Some(id) = checkout_id {
            if control.checkout_id.as_deref() != Some(id) {
                // Never show the previous checkout's data under a new id
                control.checkout_id = Some(id.to_string());
                control.server_interval_ms = DEFAULT_POLLING_INTERVAL_MS;
                control.phase = PollPhase::Idle;
                reset = true;
            }
        }
        let publish = |is_polling: bool, error: Option<SharedError>| {
            self.shared.state.send_if_modified(|state| {
                if reset {
                    *state = CheckoutStatusState::default();
                }
                let changed = reset || state.is_polling != is_polling || error.is_some();
                state.is_polling = is_polling;
                if error.is_some() {
                    state.error = error;
                }
                changed
            });
        };

        let Some(id) = checkout_id.filter(|_| options.enabled) else {
            debug!(enabled = options.enabled, "Checkout status polling idle");
            publish(false, None);
            return;
        };

        if let Some(snapshot) = control.terminal.get(id) {
            debug!(checkout_id = %id, "Checkout already settled, not polling");
            let snapshot = CheckoutStatusState {
                is_polling: false,
                ..snapshot.clone()
            };
            self.shared.state.send_replace(snapshot);
            control.phase = PollPhase::Terminal;
            return;
        }

        info!(
            checkout_id = %id,
            interval_ms = control.effective_interval_ms(),
            "Starting checkout status polling"
        );

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(
                    checkout_id = %id,
                    error = %e,
                    "Cannot poll checkout status outside a Tokio runtime"
                );
                publish(
                    false,
                    Some(Arc::new(BillingError::Other(format!(
                        "checkout status polling requires a Tokio runtime: {}",
                        e
                    )))),
                );
                return;
            }
        };

        control.phase = PollPhase::InFlight;
        publish(true, None);

        let generation = control.generation;
        let client = Arc::clone(&self.client);
        let shared = Arc::clone(&self.shared);
        let checkout_id = id.to_string();
        control.task = Some(runtime.spawn(async move {
            Self::run(client, shared, checkout_id, generation).await;
        }));
    }

    /// Stop polling
    ///
    /// Cancels the pending timer and drops any in-flight request; a response
    /// that still races in is discarded. Calling `stop` twice is a no-op.
    pub fn stop(&self) {
        let mut control = self.shared.control.lock();
        if control.task.is_some() {
            info!(
                checkout_id = control.checkout_id.as_deref().unwrap_or_default(),
                "Stopping checkout status polling"
            );
        }
        self.shared.cancel(&mut control);
    }

    /// Snapshot of the current state
    pub fn state(&self) -> CheckoutStatusState {
        self.shared.state.borrow().clone()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<CheckoutStatusState> {
        self.shared.state.subscribe()
    }

    pub fn phase(&self) -> PollPhase {
        self.shared.control.lock().phase
    }

    /// Interval that will be used for the next scheduled request
    pub fn effective_interval(&self) -> Duration {
        Duration::from_millis(self.shared.control.lock().effective_interval_ms())
    }

    /// Checkout currently or most recently observed
    pub fn checkout_id(&self) -> Option<String> {
        self.shared.control.lock().checkout_id.clone()
    }

    /// Wait until the poller is no longer polling and return the final state
    ///
    /// Returns immediately if the poller is not running.
    pub async fn wait_until_settled(&self) -> CheckoutStatusState {
        let mut rx = self.subscribe();
        match rx.wait_for(|state| !state.is_polling).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Request, apply, sleep; until terminal or cancelled
    async fn run(
        client: Arc<dyn BillingClient>,
        shared: Arc<Shared>,
        checkout_id: String,
        generation: u64,
    ) {
        loop {
            debug!(checkout_id = %checkout_id, "Requesting checkout status");
            let result = client.get_checkout_status(&checkout_id).await;

            let Some(delay) = shared.apply(generation, &checkout_id, result) else {
                return;
            };

            tokio::time::sleep(delay).await;

            if !shared.begin_request(generation) {
                return;
            }
        }
    }
}

impl Drop for CheckoutStatusPoller {
    fn drop(&mut self) {
        let mut control = self.shared.control.lock();
        self.shared.cancel(&mut control);
    }
}
