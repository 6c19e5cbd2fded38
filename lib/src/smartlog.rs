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

//! The top-level model tying the factual graph, the successor tracker, the
//! operation queue, and the preview layers together.
//!
//! Everything here runs on a single event-handling path: fetch results and
//! process events are delivered as method calls, state is swapped as
//! immutable snapshots, and nothing blocks. Readers can query
//! [`Smartlog::displayed_dag`] at any point between events.

#![allow(missing_docs)]

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::commit::{reuse_fetched_records, CommitId, CommitRecord};
use crate::dag::CommitDag;
use crate::operation::{same_operation, CommandDispatcher, Operation, OperationError};
use crate::operations::RebaseOperation;
use crate::preview::{compose_displayed_changes, compose_displayed_dag};
use crate::queue::{OperationQueue, QueueEntry, QueueEntryId, QueueError};
use crate::settings::UserSettings;
use crate::successor::SuccessorTracker;
use crate::working_copy::ChangedFile;

/// Generation counter for commit-list fetches. Fetches may complete out of
/// order; only the newest one wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchId(u64);

/// The one-drag-at-a-time interaction state. Owned explicitly by the model
/// rather than living in ambient global state; there is exactly one drag
/// gesture possible in a window.
#[derive(Clone, Debug, Default)]
pub struct DragState {
    dragged: Option<CommitId>,
}

impl DragState {
    /// The commit currently under the pointer, if a drag is in progress.
    pub fn dragged(&self) -> Option<&CommitId> {
        self.dragged.as_ref()
    }
}

/// The interactive smartlog model.
pub struct Smartlog {
    dispatcher: Box<dyn CommandDispatcher>,
    factual: CommitDag,
    uncommitted: Vec<ChangedFile>,
    successors: SuccessorTracker,
    queue: OperationQueue,
    hover: Option<Arc<dyn Operation>>,
    drag: DragState,
    started_fetches: u64,
    applied_fetch: Option<u64>,
}

impl Smartlog {
    pub fn new(settings: &UserSettings, dispatcher: Box<dyn CommandDispatcher>) -> Self {
        Smartlog {
            dispatcher,
            factual: CommitDag::new(),
            uncommitted: vec![],
            successors: SuccessorTracker::new(),
            queue: OperationQueue::new(settings),
            hover: None,
            drag: DragState::default(),
            started_fetches: 0,
            applied_fetch: None,
        }
    }

    /// Stamps a new fetch before its request goes out. The ticket must be
    /// passed back with the result so stale responses can be discarded.
    pub fn begin_fetch(&mut self) -> FetchId {
        self.started_fetches += 1;
        FetchId(self.started_fetches)
    }

    /// Delivers a completed commit-list fetch. The whole record set
    /// replaces the factual graph; delivery may be redundant (same
    /// content) or out of order (older than an already-applied fetch, in
    /// which case it is dropped).
    #[instrument(level = "debug", skip(self, records), fields(commits = records.len()))]
    pub fn on_factual_commits(&mut self, fetch: FetchId, records: Vec<CommitRecord>) {
        if self.applied_fetch.is_some_and(|applied| fetch.0 <= applied) {
            debug!(fetch = fetch.0, "discarding stale fetch result");
            return;
        }
        self.applied_fetch = Some(fetch.0);
        let records = reuse_fetched_records(&self.factual, records);
        self.successors.observe_fetch(&self.factual, &records);
        self.factual = CommitDag::from_records(records).force_connect();
        self.queue.notify_fetch_applied();
    }

    /// Delivers a completed uncommitted-changes fetch.
    pub fn on_uncommitted_changes(&mut self, files: Vec<ChangedFile>) {
        self.uncommitted = files;
    }

    /// The graph the UI should render right now: factual state, plus every
    /// pending operation's prediction, plus the hover preview.
    pub fn displayed_dag(&self) -> CommitDag {
        compose_displayed_dag(
            &self.factual,
            &self.queue,
            self.hover.as_deref(),
            &self.successors,
        )
    }

    /// The uncommitted file list the UI should render right now.
    pub fn displayed_changes(&self) -> Vec<ChangedFile> {
        compose_displayed_changes(&self.uncommitted, &self.queue)
    }

    /// The graph as last reported by the engine, without predictions.
    pub fn factual_dag(&self) -> &CommitDag {
        &self.factual
    }

    /// The rewrite tracker, for callers that need to chase identities
    /// themselves.
    pub fn successors(&self) -> &SuccessorTracker {
        &self.successors
    }

    /// All queue entries in order, for "N commands pending" UI.
    pub fn queue_snapshot(&self) -> &[QueueEntry] {
        self.queue.snapshot()
    }

    /// Confirms an operation: appends it to the queue and dispatches it if
    /// nothing is running. A hover preview for the same command collapses
    /// into the queued instance.
    pub fn enqueue_operation(
        &mut self,
        operation: Arc<dyn Operation>,
    ) -> Result<QueueEntryId, QueueError> {
        let (id, command) = self.queue.enqueue(operation.clone(), &self.successors)?;
        if self
            .hover
            .as_deref()
            .is_some_and(|hover| same_operation(hover, operation.as_ref()))
        {
            self.hover = None;
        }
        if let Some(command) = command {
            self.dispatcher.dispatch(&command);
        }
        Ok(id)
    }

    /// Cancels a not-yet-dispatched entry together with its prediction.
    pub fn cancel_queued(&mut self, id: &QueueEntryId) -> Result<(), QueueError> {
        self.queue.cancel(id)
    }

    /// Dismisses a failed entry's error banner.
    pub fn dismiss_errored(&mut self, id: &QueueEntryId) -> Result<(), QueueError> {
        self.queue.dismiss_errored(id)
    }

    /// Sets or clears the hover preview. Setting a preview equal to an
    /// already queued operation is a no-op; the queued instance already
    /// predicts it.
    pub fn set_hover_preview(&mut self, operation: Option<Arc<dyn Operation>>) {
        self.hover =
            operation.filter(|operation| !self.queue.contains_equivalent(operation.as_ref()));
    }

    /// The process-execution collaborator reports a spawn.
    pub fn notify_spawned(&mut self, id: &QueueEntryId) {
        self.queue.notify_spawned(id);
    }

    /// The process-execution collaborator reports one line of stdout.
    pub fn notify_stdout(&mut self, id: &QueueEntryId, line: String) {
        self.queue.notify_stdout(id, line);
    }

    /// The process-execution collaborator reports one line of stderr.
    pub fn notify_stderr(&mut self, id: &QueueEntryId, line: String) {
        self.queue.notify_stderr(id, line);
    }

    /// The process-execution collaborator reports an exit. May dispatch
    /// the next queued command.
    pub fn notify_exit(&mut self, id: &QueueEntryId, code: i32) {
        if let Some(command) = self.queue.notify_exit(id, code, &self.successors) {
            self.dispatcher.dispatch(&command);
        }
    }

    /// The process-execution collaborator reports a spawn failure. May
    /// dispatch the next queued command; failures are isolated.
    pub fn notify_error(&mut self, id: &QueueEntryId, message: String) {
        if let Some(command) = self.queue.notify_error(id, message, &self.successors) {
            self.dispatcher.dispatch(&command);
        }
    }

    /// The commit currently being dragged, if any.
    pub fn drag(&self) -> &DragState {
        &self.drag
    }

    /// Begins dragging a commit. If the grabbed hash has been rewritten
    /// since it was rendered, the drag retargets to its latest successor.
    pub fn start_drag(&mut self, hash: CommitId) -> Result<(), OperationError> {
        if self.drag.dragged.is_some() {
            return Err(OperationError::DragInProgress);
        }
        let current = self.successors.latest_successor(&hash);
        let display = self.displayed_dag();
        let record = display
            .get(&current)
            .ok_or_else(|| OperationError::UnknownCommit(current.clone()))?;
        if record.is_public() {
            return Err(OperationError::ImmutableCommit(current));
        }
        self.drag.dragged = Some(current);
        Ok(())
    }

    /// The dragged commit is hovering over `destination`: shows the rebase
    /// preview, or clears it (and reports why) when the drop would be
    /// illegal.
    pub fn drag_over(&mut self, destination: &CommitId) -> Result<(), OperationError> {
        let source = self
            .drag
            .dragged
            .clone()
            .ok_or(OperationError::NoDragInProgress)?;
        let display = self.displayed_dag();
        match RebaseOperation::new(&display, source, destination.clone()) {
            Ok(operation) => {
                self.set_hover_preview(Some(Arc::new(operation)));
                Ok(())
            }
            Err(reason) => {
                self.hover = None;
                Err(reason)
            }
        }
    }

    /// Drops the dragged commit, turning the current hover preview into a
    /// queued operation. Dropping with no legal hover target does nothing.
    pub fn drop_drag(&mut self) -> Result<Option<QueueEntryId>, QueueError> {
        self.drag.dragged = None;
        match self.hover.take() {
            Some(operation) => self.enqueue_operation(operation).map(Some),
            None => Ok(None),
        }
    }

    /// Abandons the drag gesture and its preview without side effects.
    pub fn cancel_drag(&mut self) {
        self.drag.dragged = None;
        self.hover = None;
    }
}
