// Copyright 2024 The Smartlog Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The execution state machine for mutating commands.
//!
//! At most one command runs at a time; the rest wait in FIFO order. An
//! entry that exits is *not* removed immediately: it keeps contributing its
//! optimistic prediction until the next successful fetch confirms the
//! engine's state, so the UI never flashes back to stale data between
//! process exit and fetch completion.

#![allow(missing_docs)]

use std::collections::VecDeque;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::object_id::id_type;
use crate::operation::{prepare_args, same_operation, Operation, PreparedCommand};
use crate::settings::UserSettings;
use crate::successor::SuccessorTracker;

id_type!(
    /// Identity of one queue entry, echoed back by process events.
    pub QueueEntryId
);

/// Lifecycle state of one queue entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryStatus {
    /// Waiting behind an earlier entry.
    Queued,
    /// Dispatched to the process-execution collaborator.
    Running,
    /// The process exited with the given code.
    Exited(i32),
    /// The process could not be spawned or died abnormally.
    Errored(String),
}

impl EntryStatus {
    /// Whether the entry has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EntryStatus::Exited(_) | EntryStatus::Errored(_))
    }

    /// Whether the entry failed.
    pub fn is_failure(&self) -> bool {
        match self {
            EntryStatus::Exited(code) => *code != 0,
            EntryStatus::Errored(_) => true,
            EntryStatus::Queued | EntryStatus::Running => false,
        }
    }
}

/// One mutating command's lifecycle record inside the queue.
#[derive(Clone, Debug)]
pub struct QueueEntry {
    id: QueueEntryId,
    operation: Arc<dyn Operation>,
    status: EntryStatus,
    output: VecDeque<String>,
}

impl QueueEntry {
    pub fn id(&self) -> &QueueEntryId {
        &self.id
    }

    pub fn operation(&self) -> &Arc<dyn Operation> {
        &self.operation
    }

    pub fn status(&self) -> &EntryStatus {
        &self.status
    }

    /// Retained tail of the command's output, oldest first.
    pub fn output(&self) -> impl Iterator<Item = &str> {
        self.output.iter().map(String::as_str)
    }

    /// Whether this entry's prediction should shape the displayed graph.
    /// Failed entries stop predicting; their effect did not happen.
    pub fn applies_optimistically(&self) -> bool {
        matches!(
            self.status,
            EntryStatus::Queued | EntryStatus::Running | EntryStatus::Exited(0)
        )
    }
}

/// Reasons a queue request is rejected, synchronously at the call site.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("no queue entry {0}")]
    UnknownEntry(QueueEntryId),
    #[error("queue entry {0} has already been dispatched")]
    AlreadyDispatched(QueueEntryId),
    #[error("queue entry {0} has not failed")]
    NotFailed(QueueEntryId),
    #[error("too many pending commands (limit {0})")]
    QueueFull(usize),
}

/// FIFO of mutating commands with at most one running at a time.
#[derive(Debug)]
pub struct OperationQueue {
    entries: Vec<QueueEntry>,
    next_serial: u64,
    max_pending: usize,
    output_limit: usize,
}

impl OperationQueue {
    pub fn new(settings: &UserSettings) -> Self {
        OperationQueue {
            entries: vec![],
            next_serial: 1,
            max_pending: settings.max_queued_commands(),
            output_limit: settings.command_output_limit(),
        }
    }

    /// Whether no entry is currently dispatched.
    pub fn is_idle(&self) -> bool {
        !self
            .entries
            .iter()
            .any(|entry| entry.status == EntryStatus::Running)
    }

    /// All entries in queue order, including exited-but-not-yet-confirmed
    /// ones.
    pub fn snapshot(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn get(&self, id: &QueueEntryId) -> Option<&QueueEntry> {
        self.entries.iter().find(|entry| entry.id == *id)
    }

    /// Entries whose predictions currently shape the displayed graph, in
    /// queue order.
    pub fn applying(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.applies_optimistically())
    }

    /// Whether an equal operation is already queued or predicting.
    pub fn contains_equivalent(&self, operation: &dyn Operation) -> bool {
        self.applying()
            .any(|entry| same_operation(entry.operation.as_ref(), operation))
    }

    /// Appends an operation. If nothing is running it is dispatched
    /// immediately; the returned command must then be handed to the
    /// process-execution collaborator.
    pub fn enqueue(
        &mut self,
        operation: Arc<dyn Operation>,
        successors: &SuccessorTracker,
    ) -> Result<(QueueEntryId, Option<PreparedCommand>), QueueError> {
        let pending = self
            .entries
            .iter()
            .filter(|entry| entry.status == EntryStatus::Queued)
            .count();
        if pending >= self.max_pending {
            return Err(QueueError::QueueFull(self.max_pending));
        }
        let id = QueueEntryId::new(format!("op-{}", self.next_serial));
        self.next_serial += 1;
        let dispatch_now = self.is_idle();
        let status = if dispatch_now {
            EntryStatus::Running
        } else {
            EntryStatus::Queued
        };
        let entry = QueueEntry {
            id: id.clone(),
            operation,
            status,
            output: VecDeque::new(),
        };
        let command = dispatch_now.then(|| PreparedCommand {
            entry: id.clone(),
            args: prepare_args(entry.operation.as_ref(), successors),
        });
        debug!(%id, dispatched = dispatch_now, "operation enqueued");
        self.entries.push(entry);
        Ok((id, command))
    }

    /// Removes a not-yet-dispatched entry. Total: the entry never reaches
    /// the dispatcher and leaves no trace. Cancelling a running entry is
    /// the process-execution collaborator's job; the queue only reacts to
    /// the resulting exit event.
    pub fn cancel(&mut self, id: &QueueEntryId) -> Result<(), QueueError> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id == *id)
            .ok_or_else(|| QueueError::UnknownEntry(id.clone()))?;
        if self.entries[index].status != EntryStatus::Queued {
            return Err(QueueError::AlreadyDispatched(id.clone()));
        }
        self.entries.remove(index);
        debug!(%id, "queued operation cancelled");
        Ok(())
    }

    /// Removes a failed entry before the next fetch would retire it.
    pub fn dismiss_errored(&mut self, id: &QueueEntryId) -> Result<(), QueueError> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id == *id)
            .ok_or_else(|| QueueError::UnknownEntry(id.clone()))?;
        if !self.entries[index].status.is_failure() {
            return Err(QueueError::NotFailed(id.clone()));
        }
        self.entries.remove(index);
        Ok(())
    }

    /// The process-execution collaborator reports the dispatched command's
    /// process has spawned.
    pub fn notify_spawned(&mut self, id: &QueueEntryId) {
        match self.get(id) {
            Some(entry) if entry.status == EntryStatus::Running => {
                debug!(%id, "operation spawned");
            }
            _ => warn!(%id, "spawn notification for unknown or idle entry"),
        }
    }

    /// Appends one line of the command's stdout, keeping a bounded tail.
    pub fn notify_stdout(&mut self, id: &QueueEntryId, line: String) {
        self.append_output(id, line);
    }

    /// Appends one line of the command's stderr. Stored in the same tail as
    /// stdout, in arrival order, since error banners show both.
    pub fn notify_stderr(&mut self, id: &QueueEntryId, line: String) {
        self.append_output(id, line);
    }

    fn append_output(&mut self, id: &QueueEntryId, line: String) {
        let limit = self.output_limit;
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.id == *id) {
            entry.output.push_back(line);
            while entry.output.len() > limit {
                entry.output.pop_front();
            }
        }
    }

    /// The running command exited. The entry stays visible (and, on
    /// success, keeps predicting) until the next fetch. If another entry is
    /// waiting, it is dispatched: the returned command's succeedable
    /// references are re-resolved now, so a queued command naming "the
    /// commit I just rebased" picks up the post-rebase identity.
    #[must_use]
    pub fn notify_exit(
        &mut self,
        id: &QueueEntryId,
        code: i32,
        successors: &SuccessorTracker,
    ) -> Option<PreparedCommand> {
        self.finalize(id, EntryStatus::Exited(code));
        self.dispatch_next(successors)
    }

    /// The command could not be spawned or died abnormally. Does not block
    /// the rest of the queue; each operation's failure is isolated.
    #[must_use]
    pub fn notify_error(
        &mut self,
        id: &QueueEntryId,
        message: String,
        successors: &SuccessorTracker,
    ) -> Option<PreparedCommand> {
        self.finalize(id, EntryStatus::Errored(message));
        self.dispatch_next(successors)
    }

    fn finalize(&mut self, id: &QueueEntryId, status: EntryStatus) {
        match self.entries.iter_mut().find(|entry| entry.id == *id) {
            Some(entry) if entry.status == EntryStatus::Running => {
                debug!(%id, ?status, "operation finished");
                entry.status = status;
            }
            Some(_) | None => warn!(%id, "exit notification for unknown or idle entry"),
        }
    }

    fn dispatch_next(&mut self, successors: &SuccessorTracker) -> Option<PreparedCommand> {
        if !self.is_idle() {
            return None;
        }
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.status == EntryStatus::Queued)?;
        entry.status = EntryStatus::Running;
        debug!(id = %entry.id, "dispatching next queued operation");
        Some(PreparedCommand {
            entry: entry.id.clone(),
            args: prepare_args(entry.operation.as_ref(), successors),
        })
    }

    /// A factual fetch has been applied; terminal entries are confirmed (or
    /// superseded) by it and retire from the optimistic window.
    pub fn notify_fetch_applied(&mut self) {
        let before = self.entries.len();
        self.entries.retain(|entry| !entry.status.is_terminal());
        if self.entries.len() < before {
            debug!(retired = before - self.entries.len(), "optimistic entries retired");
        }
    }
}
