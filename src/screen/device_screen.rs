// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device screen state manager.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::{Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::command::Command;
use crate::error::{DeviceFailure, FailureKind};
use crate::protocol::{DeviceClient, RequestOptions};
use crate::response::DeviceResult;
use crate::types::RequestId;

use super::log::LogEntry;
use super::state::{ActiveRequest, ConnectionStatus, ScreenState};

/// Whether a completed dispatch changed the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// The result belonged to the newest dispatch and was applied.
    Applied,
    /// A newer dispatch superseded this one; only its log entry changed.
    Discarded,
}

/// Report returned by [`DeviceScreen::dispatch`] once the command completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Identifier minted for the dispatch.
    pub request_id: RequestId,
    /// Whether the result reached the screen.
    pub disposition: Disposition,
    /// The client's result, applied or not.
    pub result: DeviceResult,
}

impl DispatchOutcome {
    /// Returns `true` if the result was applied to the screen state.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.disposition == Disposition::Applied
    }
}

/// Owns the [`ScreenState`] of one device connection.
///
/// Every mutation goes through this type. Commands are tagged with a fresh
/// [`RequestId`]; a result is applied only if its identifier is still the
/// newest one when it arrives, so a slow answer to a superseded command can
/// never overwrite what a later command produced. Superseded calls are also
/// cancelled, but correctness only rests on the identifier check.
///
/// Cloning is cheap and yields a handle to the same screen.
///
/// # Examples
///
/// ```
/// use esplink::command::Command;
/// use esplink::protocol::SimulatedDeviceClient;
/// use esplink::screen::{ConnectionStatus, DeviceScreen};
/// use esplink::types::LedState;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let screen = DeviceScreen::new(SimulatedDeviceClient::new(), "192.168.1.100");
///
/// let pending = screen.dispatch(Command::LedToggle);
/// assert!(screen.snapshot().is_busy());
///
/// let outcome = pending.await;
/// assert!(outcome.is_applied());
///
/// let state = screen.snapshot();
/// assert_eq!(state.connection_status(), ConnectionStatus::Online);
/// assert_eq!(state.led_state(), Some(LedState::On));
/// # }
/// ```
pub struct DeviceScreen<C> {
    client: Arc<C>,
    shared: Arc<Shared>,
}

struct Shared {
    inner: Mutex<Inner>,
    state_tx: watch::Sender<ScreenState>,
    /// Revision of the state last sent to watchers.
    published: AtomicU64,
}

struct Inner {
    state: ScreenState,
    /// Cancellation handle of the active request.
    cancel: Option<CancellationToken>,
    /// Bumped on every mutation.
    revision: u64,
}

/// Reconciles a dispatch whose future is dropped before it completes.
///
/// The request is treated as cancelled, so an aborted or abandoned future
/// never leaves the screen busy or its log entry pending.
struct PendingDispatch {
    shared: Arc<Shared>,
    request_id: RequestId,
    started: Instant,
    armed: bool,
}

impl PendingDispatch {
    fn finish(mut self, result: &DeviceResult) -> Disposition {
        self.armed = false;
        self.shared.reconcile(self.request_id, result)
    }
}

impl Drop for PendingDispatch {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::debug!(request_id = %self.request_id, "Dispatch dropped before completion");
        let result: DeviceResult = DeviceFailure::cancelled(self.started.elapsed()).into();
        self.shared.reconcile(self.request_id, &result);
    }
}

impl<C> Clone for DeviceScreen<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: DeviceClient + 'static> DeviceScreen<C> {
    /// Creates a screen for the device at `address`.
    ///
    /// The address is not validated here; a malformed one surfaces as a
    /// validation failure on the first dispatch.
    #[must_use]
    pub fn new(client: C, address: impl Into<String>) -> Self {
        Self::with_shared_client(Arc::new(client), address)
    }

    /// Creates a screen over a client shared with other screens.
    #[must_use]
    pub fn with_shared_client(client: Arc<C>, address: impl Into<String>) -> Self {
        let state = ScreenState::new(address);
        let (state_tx, _) = watch::channel(state.clone());

        Self {
            client,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state,
                    cancel: None,
                    revision: 0,
                }),
                state_tx,
                published: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the underlying client.
    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Dispatches a command.
    ///
    /// Before this returns, a fresh request identifier is minted, the
    /// previous active command (if any) is cancelled, the command becomes
    /// active with a pending log entry, and `last_error` is cleared. The
    /// returned future performs the request and reconciles its result; it
    /// owns everything it needs and can be spawned or simply awaited.
    ///
    /// Dropping the future before it completes, or aborting the task it was
    /// spawned on, reconciles the command as `cancelled`.
    pub fn dispatch(
        &self,
        command: Command,
    ) -> impl Future<Output = DispatchOutcome> + Send + use<C> {
        let request_id = RequestId::new();
        let token = CancellationToken::new();

        let address = {
            let mut inner = self.shared.inner.lock();

            if let Some(previous) = inner.cancel.replace(token.clone()) {
                if let Some(superseded) = inner.state.latest_request_id() {
                    tracing::debug!(request_id = %superseded, "Superseding active request");
                }
                previous.cancel();
            }

            inner.state.active = Some(ActiveRequest {
                request_id,
                command: command.clone(),
            });
            inner
                .state
                .command_log
                .record(LogEntry::pending(request_id, command.clone()));
            inner.state.last_error = None;

            tracing::debug!(
                request_id = %request_id,
                command = %command,
                address = %inner.state.device_address,
                "Dispatching command"
            );

            let address = inner.state.device_address.clone();
            self.shared.commit(inner);
            address
        };

        let client = Arc::clone(&self.client);
        let pending = PendingDispatch {
            shared: Arc::clone(&self.shared),
            request_id,
            started: Instant::now(),
            armed: true,
        };

        async move {
            let options = RequestOptions::new().with_cancel(token);
            let result = client.send(&address, &command, options).await;
            let disposition = pending.finish(&result);

            DispatchOutcome {
                request_id,
                disposition,
                result,
            }
        }
    }
}

impl<C> DeviceScreen<C> {
    /// Changes the target address. Requests already in flight keep the
    /// address they were dispatched with.
    pub fn set_device_address(&self, address: impl Into<String>) {
        self.shared.update(|state| state.device_address = address.into());
    }

    /// Clears `last_error`.
    pub fn clear_error(&self) {
        self.shared.update(|state| state.last_error = None);
    }

    /// Empties the command log.
    ///
    /// Commands still in flight resolve normally but no longer have an
    /// entry to update.
    pub fn clear_command_log(&self) {
        self.shared.update(|state| state.command_log.clear());
    }

    /// Cancels the active command without dispatching a new one.
    ///
    /// The command completes as a `cancelled` failure: it leaves the active
    /// slot and its log entry turns to error, but neither `last_error` nor
    /// the connection status changes. Returns `false` if nothing was in
    /// flight.
    pub fn cancel_active(&self) -> bool {
        let inner = self.shared.inner.lock();
        match (&inner.cancel, inner.state.latest_request_id()) {
            (Some(token), Some(request_id)) => {
                tracing::debug!(request_id = %request_id, "Cancelling active request");
                token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ScreenState {
        self.shared.inner.lock().state.clone()
    }

    /// Returns a receiver that observes every state change.
    ///
    /// Do not hold a [`watch::Ref`] from `borrow()` while calling into the
    /// screen on the same thread: state changes wait for outstanding borrows.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ScreenState> {
        self.shared.state_tx.subscribe()
    }
}

impl Shared {
    /// Stamps a new revision and publishes it once the lock is released.
    fn commit(&self, mut inner: MutexGuard<'_, Inner>) {
        inner.revision += 1;
        let revision = inner.revision;
        let state = inner.state.clone();
        drop(inner);
        self.publish(revision, state);
    }

    /// Sends `state` to watchers unless a newer revision already went out.
    fn publish(&self, revision: u64, state: ScreenState) {
        self.state_tx.send_if_modified(|current| {
            // The watch lock serializes this closure.
            if revision <= self.published.load(Ordering::Relaxed) {
                return false;
            }
            self.published.store(revision, Ordering::Relaxed);
            *current = state;
            true
        });
    }

    fn update(&self, mutate: impl FnOnce(&mut ScreenState)) {
        let mut inner = self.inner.lock();
        mutate(&mut inner.state);
        self.commit(inner);
    }

    /// Applies a completed call, or discards it if a newer dispatch exists.
    fn reconcile(&self, request_id: RequestId, result: &DeviceResult) -> Disposition {
        let mut inner = self.inner.lock();

        // History stays truthful for superseded commands too.
        inner.state.command_log.resolve(request_id, result);

        if inner.state.latest_request_id() != Some(request_id) {
            tracing::debug!(
                request_id = %request_id,
                success = result.is_success(),
                "Discarding stale result"
            );
            self.commit(inner);
            return Disposition::Discarded;
        }

        inner.state.active = None;
        inner.cancel = None;
        Self::apply(&mut inner.state, request_id, result);

        self.commit(inner);
        Disposition::Applied
    }

    fn apply(state: &mut ScreenState, request_id: RequestId, result: &DeviceResult) {
        match result {
            DeviceResult::Success { body, .. } => {
                tracing::debug!(
                    request_id = %request_id,
                    latency_ms = result.latency_millis(),
                    "Applying device response"
                );
                state.connection_status = ConnectionStatus::Online;
                state.last_response_text.clone_from(body);
                state.last_latency_millis = result.latency_millis();
                state.last_success_at = Some(Utc::now());
            }
            DeviceResult::Failure(failure) => {
                let kind = failure.kind();
                if kind == FailureKind::Cancelled {
                    tracing::debug!(request_id = %request_id, "Active request cancelled");
                    return;
                }

                if kind.is_unreachable() {
                    tracing::warn!(
                        request_id = %request_id,
                        address = %state.device_address,
                        kind = %kind,
                        error = %failure,
                        "Device unreachable"
                    );
                    state.connection_status = ConnectionStatus::Offline;
                } else {
                    tracing::debug!(request_id = %request_id, kind = %kind, error = %failure, "Command failed");
                    if kind.device_responded() {
                        state.connection_status = ConnectionStatus::Online;
                    }
                }
                state.last_error = Some(failure.message().to_string());
            }
        }
    }
}

impl<C> std::fmt::Debug for DeviceScreen<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("DeviceScreen")
            .field("device_address", &inner.state.device_address)
            .field("connection_status", &inner.state.connection_status)
            .field("active", &inner.state.active)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::protocol::SimulatedDeviceClient;
    use crate::screen::LogStatus;
    use crate::types::LedState;

    const ADDR: &str = "192.168.1.100";

    fn screen() -> DeviceScreen<SimulatedDeviceClient> {
        DeviceScreen::new(SimulatedDeviceClient::new(), ADDR)
    }

    #[tokio::test(start_paused = true)]
    async fn dispatch_marks_active_before_awaiting() {
        let screen = screen();
        screen.shared.update(|state| state.last_error = Some("old".to_string()));

        let pending = screen.dispatch(Command::Status);
        let state = screen.snapshot();
        assert_eq!(state.active_command(), Some(&Command::Status));
        assert!(state.latest_request_id().is_some());
        assert_eq!(state.last_error(), None);
        assert_eq!(state.command_log().latest().unwrap().status(), LogStatus::Pending);

        let outcome = pending.await;
        assert_eq!(Some(outcome.request_id), state.latest_request_id());
        assert!(outcome.is_applied());

        let state = screen.snapshot();
        assert!(!state.is_busy());
        assert_eq!(state.latest_request_id(), None);
        assert_eq!(state.connection_status(), ConnectionStatus::Online);
        assert!(state.last_success_at().is_some());
        assert_eq!(state.last_latency_millis(), 50);
    }

    #[tokio::test(start_paused = true)]
    async fn new_dispatch_supersedes_active() {
        let screen = screen();

        let first = screen.dispatch(Command::LedOn);
        let second = screen.dispatch(Command::LedOff);
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first.disposition, Disposition::Discarded);
        assert_eq!(first.result.failure_kind(), Some(FailureKind::Cancelled));
        assert!(second.is_applied());

        let state = screen.snapshot();
        assert_eq!(state.led_state(), Some(LedState::Off));
        assert_eq!(state.last_error(), None);
        assert_eq!(state.command_log().pending_count(), 0);
        assert_eq!(
            state.command_log().get(first.request_id).unwrap().status(),
            LogStatus::Error
        );
        // The superseded call was cancelled before reaching the device.
        assert_eq!(screen.client().led_state(), LedState::Off);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_active_is_silent() {
        let screen = DeviceScreen::new(
            SimulatedDeviceClient::new().with_latency(Duration::from_secs(1)),
            ADDR,
        );

        let pending = screen.dispatch(Command::LedOn);
        assert!(screen.cancel_active());

        let outcome = pending.await;
        assert!(outcome.is_applied());
        assert_eq!(outcome.result.failure_kind(), Some(FailureKind::Cancelled));

        let state = screen.snapshot();
        assert!(!state.is_busy());
        assert_eq!(state.last_error(), None);
        assert_eq!(state.connection_status(), ConnectionStatus::Unknown);
        assert_eq!(state.command_log().latest().unwrap().status(), LogStatus::Error);
        assert!(!screen.cancel_active());
    }

    #[tokio::test(start_paused = true)]
    async fn validation_failure_keeps_connection() {
        let screen = DeviceScreen::new(SimulatedDeviceClient::new(), "300.1.1.1");

        let outcome = screen.dispatch(Command::Status).await;
        assert_eq!(outcome.result.failure_kind(), Some(FailureKind::Validation));

        let state = screen.snapshot();
        assert_eq!(state.connection_status(), ConnectionStatus::Unknown);
        assert!(state.last_error().unwrap().contains("300.1.1.1"));
        assert_eq!(screen.client().request_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_goes_offline() {
        let screen = screen();
        screen.dispatch(Command::Status).await;
        assert_eq!(screen.snapshot().connection_status(), ConnectionStatus::Online);

        screen.client().set_reachable(false);
        screen.dispatch(Command::Status).await;

        let state = screen.snapshot();
        assert_eq!(state.connection_status(), ConnectionStatus::Offline);
        assert!(state.last_error().is_some());
        // Failures keep the last good response.
        assert!(state.last_response_text().starts_with("ESP32 is running!"));
    }

    #[tokio::test(start_paused = true)]
    async fn address_change_does_not_touch_in_flight_request() {
        let screen = screen();

        let pending = screen.dispatch(Command::Status);
        screen.set_device_address("not-an-ip");
        let outcome = pending.await;

        assert!(outcome.result.is_success());
        assert_eq!(screen.snapshot().device_address(), "not-an-ip");
    }

    #[tokio::test(start_paused = true)]
    async fn clear_operations() {
        let screen = DeviceScreen::new(SimulatedDeviceClient::new(), "bad");
        screen.dispatch(Command::Status).await;
        assert!(screen.snapshot().last_error().is_some());

        screen.clear_error();
        screen.clear_command_log();

        let state = screen.snapshot();
        assert_eq!(state.last_error(), None);
        assert!(state.command_log().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_changes() {
        let screen = screen();
        let mut rx = screen.subscribe();
        assert!(!rx.borrow_and_update().is_busy());

        let pending = screen.dispatch(Command::LedToggle);
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_busy());

        pending.await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow().led_state(), Some(LedState::On));
    }

    #[tokio::test(start_paused = true)]
    async fn dispatch_future_can_be_spawned() {
        let screen = screen();
        let handle = tokio::spawn(screen.dispatch(Command::Status));
        let outcome = handle.await.unwrap();
        assert!(outcome.is_applied());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_dispatch_is_reconciled_as_cancelled() {
        let screen = screen();

        drop(screen.dispatch(Command::LedOn));
        tokio::time::sleep(Duration::from_secs(60)).await;

        let state = screen.snapshot();
        assert!(!state.is_busy());
        assert_eq!(state.last_error(), None);
        assert_eq!(state.connection_status(), ConnectionStatus::Unknown);
        assert_eq!(state.command_log().pending_count(), 0);
        assert_eq!(state.command_log().latest().unwrap().status(), LogStatus::Error);
        assert!(!screen.cancel_active());
        // The request never reached the device.
        assert_eq!(screen.client().request_count(), 0);

        let outcome = screen.dispatch(Command::Status).await;
        assert!(outcome.is_applied());
        let state = screen.snapshot();
        assert_eq!(state.command_log().len(), 2);
        assert_eq!(state.command_log().pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_task_frees_the_screen() {
        let screen = DeviceScreen::new(
            SimulatedDeviceClient::new().with_latency(Duration::from_secs(1)),
            ADDR,
        );

        let handle = tokio::spawn(screen.dispatch(Command::LedOn));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(screen.snapshot().is_busy());

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());

        let state = screen.snapshot();
        assert!(!state.is_busy());
        assert_eq!(state.command_log().pending_count(), 0);
        assert_eq!(screen.client().led_state(), LedState::Off);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_superseded_dispatch_keeps_newer_active() {
        let screen = screen();

        let first = screen.dispatch(Command::LedOn);
        let second = screen.dispatch(Command::LedOff);
        let second_id = screen.snapshot().latest_request_id();
        drop(first);

        let state = screen.snapshot();
        assert!(state.is_busy());
        assert_eq!(state.latest_request_id(), second_id);
        assert_eq!(state.command_log().pending_count(), 1);

        assert!(second.await.is_applied());
        assert_eq!(screen.snapshot().led_state(), Some(LedState::Off));
    }

    #[test]
    fn stale_revision_is_not_published() {
        let screen = screen();
        let rx = screen.subscribe();

        let mut newer = screen.snapshot();
        newer.last_error = Some("newer".to_string());
        let mut older = screen.snapshot();
        older.last_error = Some("older".to_string());

        screen.shared.publish(2, newer);
        screen.shared.publish(1, older);
        assert_eq!(rx.borrow().last_error(), Some("newer"));
    }

    #[test]
    fn publishing_does_not_hold_the_state_lock() {
        let screen = screen();
        let rx = screen.subscribe();
        let held = rx.borrow();

        let other = screen.clone();
        let writer = std::thread::spawn(move || other.clear_error());
        std::thread::sleep(Duration::from_millis(50));

        // The writer is parked on the watch lock, not on the state lock.
        let _ = screen.snapshot();
        drop(held);
        writer.join().unwrap();
        assert_eq!(rx.borrow().last_error(), None);
    }
}
