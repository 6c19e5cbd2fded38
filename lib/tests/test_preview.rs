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

use std::sync::Arc;

use pretty_assertions::assert_eq;
use smartlog_lib::commit::{CommitId, CommitPreview};
use smartlog_lib::dag::CommitDag;
use smartlog_lib::operation::Operation;
use smartlog_lib::operations::{AmendOperation, HideOperation, RebaseOperation};
use smartlog_lib::preview::{compose_displayed_changes, compose_displayed_dag};
use smartlog_lib::queue::OperationQueue;
use smartlog_lib::revset::CommitRef;
use smartlog_lib::settings::UserSettings;
use smartlog_lib::successor::SuccessorTracker;
use smartlog_lib::working_copy::{ChangedFile, FileStatus};
use testutils::{draft_commit, public_commit, sibling_graph};

fn stack_graph() -> CommitDag {
    // A (public) <- B <- C
    CommitDag::from_records(
        [
            public_commit("aaa", &[]),
            draft_commit("bbb", &["aaa"]),
            draft_commit("ccc", &["bbb"]),
        ]
        .map(Arc::new),
    )
}

fn id(hash: &str) -> CommitId {
    CommitId::from(hash)
}

fn queued(operations: &[Arc<dyn Operation>], successors: &SuccessorTracker) -> OperationQueue {
    let mut queue = OperationQueue::new(&UserSettings::default());
    for operation in operations {
        queue.enqueue(operation.clone(), successors).unwrap();
    }
    // Every entry predicts, running or queued.
    assert_eq!(queue.applying().count(), operations.len());
    queue
}

#[test]
fn test_composition_is_queue_ordered() {
    let factual = stack_graph();
    let successors = SuccessorTracker::new();

    // First queued: move C out from under B, onto A.
    let move_c: Arc<dyn Operation> =
        Arc::new(RebaseOperation::new(&factual, id("ccc"), id("aaa")).unwrap());
    // Second queued: move B onto C. Only legal against the graph the first
    // operation predicts; against the factual graph C is B's descendant.
    let after_first = queued(std::slice::from_ref(&move_c), &successors);
    let predicted = compose_displayed_dag(&factual, &after_first, None, &successors);
    let move_b: Arc<dyn Operation> =
        Arc::new(RebaseOperation::new(&predicted, id("bbb"), id("ccc")).unwrap());

    let queue = queued(&[move_c.clone(), move_b.clone()], &successors);
    let display = compose_displayed_dag(&factual, &queue, None, &successors);
    assert_eq!(display.parents(&id("ccc")), &[id("aaa")]);
    assert_eq!(display.parents(&id("bbb")), &[id("ccc")]);

    // Reversed order composes differently: B-onto-C is illegal before
    // C has moved, degrades to a no-op, and B stays put.
    let reversed = queued(&[move_b, move_c], &successors);
    let display_reversed = compose_displayed_dag(&factual, &reversed, None, &successors);
    assert_eq!(display_reversed.parents(&id("ccc")), &[id("aaa")]);
    assert_eq!(display_reversed.parents(&id("bbb")), &[id("aaa")]);
    assert_ne!(display, display_reversed);
}

#[test]
fn test_degrades_when_target_vanishes_mid_composition() {
    let factual = stack_graph();
    let successors = SuccessorTracker::new();

    // The hide removes C; the queued rebase then references a hash that no
    // longer resolves and must leave B in its last-known-good position.
    let hide_c: Arc<dyn Operation> =
        Arc::new(HideOperation::new(&factual, id("ccc")).unwrap());
    let move_b: Arc<dyn Operation> = Arc::new(RebaseOperation::from_refs(
        CommitRef::succeedable(id("bbb")),
        CommitRef::succeedable(id("ccc")),
    ));

    let queue = queued(&[hide_c, move_b], &successors);
    let display = compose_displayed_dag(&factual, &queue, None, &successors);
    assert!(!display.contains(&id("ccc")));
    assert_eq!(display.parents(&id("bbb")), &[id("aaa")]);
}

#[test]
fn test_hover_preview_applies_last_and_leaves_factual_untouched() {
    let factual = CommitDag::from_records(sibling_graph().into_iter().map(Arc::new));
    let successors = SuccessorTracker::new();
    let queue = OperationQueue::new(&UserSettings::default());

    let hover = RebaseOperation::new(&factual, id("bbb"), id("ccc")).unwrap();
    let display = compose_displayed_dag(&factual, &queue, Some(&hover), &successors);

    // B (with its descendant D following) is shown under C.
    assert_eq!(display.parents(&id("bbb")), &[id("ccc")]);
    assert_eq!(display.parents(&id("ddd")), &[id("bbb")]);
    assert_eq!(
        display.get(&id("bbb")).unwrap().preview,
        Some(CommitPreview::RebaseTarget)
    );
    // The factual graph is untouched.
    assert_eq!(factual.parents(&id("bbb")), &[id("aaa")]);
    assert_eq!(factual.get(&id("bbb")).unwrap().preview, None);
}

#[test]
fn test_hover_equal_to_queued_operation_is_not_applied_twice() {
    let factual = CommitDag::from_records(sibling_graph().into_iter().map(Arc::new));
    let successors = SuccessorTracker::new();

    let rebase = RebaseOperation::new(&factual, id("bbb"), id("ccc")).unwrap();
    let queued_rebase: Arc<dyn Operation> = Arc::new(rebase.clone());
    let queue = queued(std::slice::from_ref(&queued_rebase), &successors);

    let without_hover = compose_displayed_dag(&factual, &queue, None, &successors);
    let with_hover = compose_displayed_dag(&factual, &queue, Some(&rebase), &successors);
    assert_eq!(without_hover, with_hover);
    // The queued instance predicts with the optimistic marker, not the
    // hover one.
    assert_eq!(
        with_hover.get(&id("bbb")).unwrap().preview,
        Some(CommitPreview::Rebasing)
    );
}

#[test]
fn test_composition_is_deterministic() {
    let factual = stack_graph();
    let successors = SuccessorTracker::new();
    let move_c: Arc<dyn Operation> =
        Arc::new(RebaseOperation::new(&factual, id("ccc"), id("aaa")).unwrap());
    let queue = queued(&[move_c], &successors);

    let first = compose_displayed_dag(&factual, &queue, None, &successors);
    let second = compose_displayed_dag(&factual, &queue, None, &successors);
    assert_eq!(first, second);
}

#[test]
fn test_displayed_changes_fold() {
    let factual = CommitDag::from_records(sibling_graph().into_iter().map(Arc::new));
    let successors = SuccessorTracker::new();
    let files = vec![ChangedFile {
        path: "src/lib.rs".to_owned(),
        status: FileStatus::Modified,
    }];

    // An empty queue passes the factual list through.
    let queue = OperationQueue::new(&UserSettings::default());
    assert_eq!(compose_displayed_changes(&files, &queue), files);

    // A pending amend predicts the changes folded into the commit.
    let amend: Arc<dyn Operation> =
        Arc::new(AmendOperation::new(&factual, id("ddd"), None).unwrap());
    let queue = queued(&[amend], &successors);
    assert_eq!(compose_displayed_changes(&files, &queue), vec![]);
}
