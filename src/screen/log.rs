// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounded command history.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::command::Command;
use crate::response::DeviceResult;
use crate::types::RequestId;

/// Lifecycle of a logged command: `Pending` then exactly one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    /// Awaiting a result.
    Pending,
    /// The device answered with a 2xx.
    Success,
    /// The call failed (any [`FailureKind`](crate::error::FailureKind)).
    Error,
}

impl LogStatus {
    /// Returns `true` for `Success` and `Error`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// One dispatched command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    request_id: RequestId,
    command: Command,
    issued_at: DateTime<Utc>,
    status: LogStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_millis: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

impl LogEntry {
    pub(crate) fn pending(request_id: RequestId, command: Command) -> Self {
        Self {
            request_id,
            command,
            issued_at: Utc::now(),
            status: LogStatus::Pending,
            response_text: None,
            latency_millis: None,
            error_message: None,
        }
    }

    /// Moves a pending entry to its terminal status. Terminal entries are
    /// left untouched; returns whether anything changed.
    fn resolve(&mut self, result: &DeviceResult) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.latency_millis = Some(result.latency_millis());
        match result {
            DeviceResult::Success { body, .. } => {
                self.status = LogStatus::Success;
                self.response_text = Some(body.clone());
            }
            DeviceResult::Failure(failure) => {
                self.status = LogStatus::Error;
                self.error_message = Some(failure.message().to_string());
            }
        }
        true
    }

    /// Returns the request identifier.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the command.
    #[must_use]
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Returns when the command was dispatched.
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Returns the entry status.
    #[must_use]
    pub fn status(&self) -> LogStatus {
        self.status
    }

    /// Returns the response body of a successful command.
    #[must_use]
    pub fn response_text(&self) -> Option<&str> {
        self.response_text.as_deref()
    }

    /// Returns the measured latency once resolved.
    #[must_use]
    pub fn latency_millis(&self) -> Option<u64> {
        self.latency_millis
    }

    /// Returns the failure message of a failed command.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// Recent commands, newest first, holding at most [`CommandLog::CAPACITY`]
/// entries.
///
/// Entries are never removed individually: the oldest one falls off when a
/// new command is recorded at capacity, and [`clear`](Self::clear) empties
/// the whole log.
///
/// # Examples
///
/// ```
/// use esplink::screen::CommandLog;
///
/// let log = CommandLog::new();
/// assert!(log.is_empty());
/// assert_eq!(CommandLog::CAPACITY, 10);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CommandLog {
    entries: VecDeque<LogEntry>,
}

impl CommandLog {
    /// Maximum number of retained entries.
    pub const CAPACITY: usize = 10;

    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new entry at the front, evicting the oldest at capacity.
    pub(crate) fn record(&mut self, entry: LogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(Self::CAPACITY);
    }

    /// Resolves the pending entry for `request_id`.
    ///
    /// Returns `false` when the entry was evicted or cleared meanwhile, or is
    /// already terminal.
    pub(crate) fn resolve(&mut self, request_id: RequestId, result: &DeviceResult) -> bool {
        self.entries
            .iter_mut()
            .find(|entry| entry.request_id == request_id)
            .is_some_and(|entry| entry.resolve(result))
    }

    /// Removes every entry.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the entry for `request_id`, if still retained.
    #[must_use]
    pub fn get(&self, request_id: RequestId) -> Option<&LogEntry> {
        self.entries.iter().find(|entry| entry.request_id == request_id)
    }

    /// Returns the most recent entry.
    #[must_use]
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    /// Iterates newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the log has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of entries still pending.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.status == LogStatus::Pending)
            .count()
    }
}

impl<'a> IntoIterator for &'a CommandLog {
    type Item = &'a LogEntry;
    type IntoIter = std::collections::vec_deque::Iter<'a, LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
