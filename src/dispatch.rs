//! Multi-target dispatch.
//!
//! One logical send fans a [`Message`] out to every given [`Target`]
//! concurrently and folds the per-target results into a single outcome.
//!
//! # Aggregation rules
//!
//! - An empty target slice is rejected with
//!   [`DispatchError::NoTargetsSelected`] before any network activity.
//! - History is written **at most once**, by whichever target succeeds
//!   first, without waiting for the others. The record lists every target
//!   that was selected, including ones that later fail.
//! - The send succeeds if at least one target succeeds. Failures from the
//!   other targets are not itemized; only the last error observed is kept
//!   (see [`DispatchSummary::last_error`]).
//! - The send fails only when every target fails, with the last error
//!   observed.
//!
//! All requests run to completion; there is no cancellation once a send
//! starts.
//!
//! # Architecture
//!
//! ```text
//! dispatch(message, targets)
//!     │
//!     ├── target 1: build params ─> Transport::send ──┐
//!     ├── target 2: build params ─> Transport::send ──┼─> join_all ─> aggregate
//!     └── target N: build params ─> Transport::send ──┘
//!                          │
//!             first success ─> claim one-shot flag ─> HistoryRecorder::record
//! ```

use futures_util::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{DispatchError, UNKNOWN_ERROR};
use crate::history::HistoryRecorder;
use crate::message::Message;
use crate::payload::{build_params, Encryption};
use crate::target::{mask_key, target_names, Target};
use crate::transport::Transport;

/// Result of sending to one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The server accepted the push.
    Delivered,
    /// The push failed for this target.
    Failed(DispatchError),
}

impl DispatchOutcome {
    /// Whether this target accepted the push.
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// What the caller learns about a successful logical send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Number of targets attempted.
    pub attempted: usize,
    /// Whether the history write went through.
    pub history_recorded: bool,
    /// Last error seen from any target, if some targets failed.
    pub last_error: Option<DispatchError>,
}

/// Observable state shared by every dispatch on one [`Dispatcher`].
///
/// Only feeds [`Dispatcher::is_loading`] and [`Dispatcher::last_error`].
/// Results are built from the per-call `LogicalSend`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct DispatchState {
    in_flight: usize,
    last_error: Option<DispatchError>,
}

/// Counts one dispatch as in flight until dropped, including when the
/// dispatch future is cancelled.
struct InFlight<'a> {
    state: &'a Mutex<DispatchState>,
}

impl<'a> InFlight<'a> {
    fn enter(state: &'a Mutex<DispatchState>) -> Self {
        lock(state).in_flight += 1;
        Self { state }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = lock(self.state);
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}

fn lock(state: &Mutex<DispatchState>) -> MutexGuard<'_, DispatchState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State for a single logical send.
///
/// Owns the one-shot history flag and the last error of this send, so
/// overlapping dispatches on one [`Dispatcher`] never see each other's
/// results.
struct LogicalSend<'a> {
    message: &'a Message,
    target_names: Vec<String>,
    history_claimed: AtomicBool,
    history_recorded: AtomicBool,
    last_error: Mutex<Option<DispatchError>>,
}

impl<'a> LogicalSend<'a> {
    fn new(message: &'a Message, targets: &[Target]) -> Self {
        Self {
            message,
            target_names: target_names(targets),
            history_claimed: AtomicBool::new(false),
            history_recorded: AtomicBool::new(false),
            last_error: Mutex::new(None),
        }
    }

    fn note_error(&self, err: &DispatchError) {
        *self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(err.clone());
    }

    fn take_last_error(&self) -> Option<DispatchError> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Returns `true` for exactly one caller: the first success.
    fn claim_history(&self) -> bool {
        self.history_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Recorders do blocking I/O, so the write runs on tokio's blocking
    /// pool. The winning target's future waits for it.
    async fn record_history(&self, history: &Arc<dyn HistoryRecorder>) {
        if !self.claim_history() {
            return;
        }
        let history = Arc::clone(history);
        let message = self.message.clone();
        let target_names = self.target_names.clone();
        let written =
            tokio::task::spawn_blocking(move || history.record(&message, &target_names)).await;

        match written {
            Ok(Ok(())) => self.history_recorded.store(true, Ordering::Release),
            Ok(Err(e)) => log::warn!(
                "[Dispatch] Failed to record history for {}: {:#}",
                self.message.id,
                e
            ),
            Err(e) => log::warn!(
                "[Dispatch] History task for {} did not complete: {}",
                self.message.id,
                e
            ),
        }
    }
}

/// Fans messages out to targets and records history once per send.
///
/// Constructed once with its collaborators and reused for every send.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    history: Arc<dyn HistoryRecorder>,
    state: Mutex<DispatchState>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("state", &*self.lock_state())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher over the given transport and history sink.
    pub fn new(transport: Arc<dyn Transport>, history: Arc<dyn HistoryRecorder>) -> Self {
        Self {
            transport,
            history,
            state: Mutex::new(DispatchState::default()),
        }
    }

    /// Clears the held error.
    ///
    /// [`dispatch`](Self::dispatch) calls this on entry. The loading flag is
    /// not touched: it tracks in-flight dispatches and clears itself when
    /// they finish.
    pub fn reset(&self) {
        self.lock_state().last_error = None;
    }

    /// Whether any dispatch is in flight.
    pub fn is_loading(&self) -> bool {
        self.lock_state().in_flight > 0
    }

    /// Last error observed by any dispatch since the most recent reset.
    ///
    /// With overlapping dispatches this may come from either of them; the
    /// result of each [`dispatch`](Self::dispatch) only ever carries its own.
    pub fn last_error(&self) -> Option<DispatchError> {
        self.lock_state().last_error.clone()
    }

    /// Sends `message` to every target in `targets` concurrently.
    ///
    /// With `encryption_enabled`, each target's title and body are sealed
    /// with that target's push key. See the module docs for how results
    /// are aggregated.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn dispatch(
        &self,
        message: &Message,
        targets: &[Target],
        encryption_enabled: bool,
    ) -> Result<DispatchSummary, DispatchError> {
        self.reset();

        if targets.is_empty() {
            let err = DispatchError::NoTargetsSelected;
            self.lock_state().last_error = Some(err.clone());
            return Err(err);
        }

        log::info!(
            "[Dispatch] Sending {} to {} target(s) (encrypted={})",
            message.id,
            targets.len(),
            encryption_enabled
        );

        let send = LogicalSend::new(message, targets);
        let outcomes = {
            let _in_flight = InFlight::enter(&self.state);
            join_all(
                targets
                    .iter()
                    .map(|target| self.send_to(&send, target, encryption_enabled)),
            )
            .await
        };

        aggregate(
            &outcomes,
            send.history_recorded.load(Ordering::Acquire),
            send.take_last_error(),
        )
    }

    async fn send_to(
        &self,
        send: &LogicalSend<'_>,
        target: &Target,
        encryption_enabled: bool,
    ) -> DispatchOutcome {
        match self.deliver(send.message, target, encryption_enabled).await {
            Ok(()) => {
                log::info!("[Dispatch] Delivered to '{}'", target.name);
                send.record_history(&self.history).await;
                DispatchOutcome::Delivered
            }
            Err(err) => {
                log::warn!(
                    "[Dispatch] Failed to deliver to '{}' ({}): {}",
                    target.name,
                    err.kind(),
                    err
                );
                send.note_error(&err);
                self.note_error(&err);
                DispatchOutcome::Failed(err)
            }
        }
    }

    async fn deliver(
        &self,
        message: &Message,
        target: &Target,
        encryption_enabled: bool,
    ) -> Result<(), DispatchError> {
        if !target.is_dispatchable() {
            return Err(DispatchError::InvalidUrl(format!(
                "target '{}' needs both a push key and a server URL",
                target.name
            )));
        }

        let encryption = if encryption_enabled {
            Encryption::Enabled {
                secret: &target.push_key,
            }
        } else {
            Encryption::Disabled
        };
        let params = build_params(message, encryption)?;

        log::debug!(
            "[Dispatch] '{}' -> {} key={}",
            target.name,
            target.server_url,
            mask_key(&target.push_key)
        );
        self.transport
            .send(&target.server_url, &target.push_key, &params)
            .await
    }

    fn note_error(&self, err: &DispatchError) {
        self.lock_state().last_error = Some(err.clone());
    }

    fn lock_state(&self) -> MutexGuard<'_, DispatchState> {
        lock(&self.state)
    }
}

/// Folds per-target outcomes into the logical result.
///
/// Any delivery makes the send a success; otherwise the last observed error
/// is returned.
pub fn aggregate(
    outcomes: &[DispatchOutcome],
    history_recorded: bool,
    last_error: Option<DispatchError>,
) -> Result<DispatchSummary, DispatchError> {
    if outcomes.iter().any(DispatchOutcome::is_delivered) {
        return Ok(DispatchSummary {
            attempted: outcomes.len(),
            history_recorded,
            last_error,
        });
    }

    if outcomes.is_empty() {
        return Err(DispatchError::NoTargetsSelected);
    }

    let err = last_error
        .or_else(|| {
            outcomes.iter().rev().find_map(|o| match o {
                DispatchOutcome::Failed(e) => Some(e.clone()),
                DispatchOutcome::Delivered => None,
            })
        })
        .unwrap_or_else(|| DispatchError::RequestFailed(UNKNOWN_ERROR.to_string()));
    Err(err)
}
