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

use itertools::Itertools as _;
use smartlog_lib::commit::{CommitId, CommitRecord};
use smartlog_lib::dag::CommitDag;
use smartlog_lib::successor::SuccessorTracker;
use testutils::{draft_commit, public_commit, CommitRecordBuilder};

fn dag_of(records: Vec<CommitRecord>) -> CommitDag {
    CommitDag::from_records(records.into_iter().map(Arc::new))
}

fn arcs(records: Vec<CommitRecord>) -> Vec<Arc<CommitRecord>> {
    records.into_iter().map(Arc::new).collect()
}

#[test]
fn test_disappeared_predecessor_becomes_succession() {
    let prev = dag_of(vec![public_commit("aaa", &[]), draft_commit("x1", &["aaa"])]);
    let fresh = arcs(vec![
        public_commit("aaa", &[]),
        CommitRecordBuilder::new("x2")
            .parents(&["aaa"])
            .predecessors(&["x1"])
            .build(),
    ]);

    let mut tracker = SuccessorTracker::new();
    tracker.observe_fetch(&prev, &fresh);
    assert_eq!(
        tracker.latest_successor(&CommitId::from("x1")),
        CommitId::from("x2")
    );
    // Unrelated hashes resolve to themselves.
    assert_eq!(
        tracker.latest_successor(&CommitId::from("aaa")),
        CommitId::from("aaa")
    );
}

#[test]
fn test_predecessor_still_present_is_not_a_rewrite() {
    // A commit may list a predecessor that is still alive (e.g. a copy);
    // no identity edge must be recorded then.
    let prev = dag_of(vec![public_commit("aaa", &[]), draft_commit("x1", &["aaa"])]);
    let fresh = arcs(vec![
        public_commit("aaa", &[]),
        draft_commit("x1", &["aaa"]),
        CommitRecordBuilder::new("x2")
            .parents(&["aaa"])
            .predecessors(&["x1"])
            .build(),
    ]);

    let mut tracker = SuccessorTracker::new();
    tracker.observe_fetch(&prev, &fresh);
    assert_eq!(
        tracker.latest_successor(&CommitId::from("x1")),
        CommitId::from("x1")
    );
}

#[test]
fn test_successor_info_recorded_directly() {
    // An obsolete commit still present in the fetch carries its successor
    // inline.
    let prev = dag_of(vec![public_commit("aaa", &[]), draft_commit("x1", &["aaa"])]);
    let fresh = arcs(vec![
        public_commit("aaa", &[]),
        CommitRecordBuilder::new("x1")
            .parents(&["aaa"])
            .successor("x2", "amend")
            .build(),
        draft_commit("x2", &["aaa"]),
    ]);

    let mut tracker = SuccessorTracker::new();
    tracker.observe_fetch(&prev, &fresh);
    assert_eq!(
        tracker.latest_successor(&CommitId::from("x1")),
        CommitId::from("x2")
    );
}

#[test]
fn test_chain_across_consecutive_fetches() {
    let mut tracker = SuccessorTracker::new();

    let gen0 = dag_of(vec![draft_commit("x1", &[])]);
    let gen1 = arcs(vec![CommitRecordBuilder::new("x2").predecessors(&["x1"]).build()]);
    tracker.observe_fetch(&gen0, &gen1);

    let gen1_dag = CommitDag::from_records(gen1);
    let gen2 = arcs(vec![CommitRecordBuilder::new("x3").predecessors(&["x2"]).build()]);
    tracker.observe_fetch(&gen1_dag, &gen2);

    // Chains collapse to their fixpoint, from any link.
    assert_eq!(
        tracker.latest_successor(&CommitId::from("x1")),
        CommitId::from("x3")
    );
    assert_eq!(
        tracker.latest_successor(&CommitId::from("x2")),
        CommitId::from("x3")
    );
    assert_eq!(
        tracker.latest_successor(&CommitId::from("x3")),
        CommitId::from("x3")
    );

    let chain = tracker.follow_successors(&CommitId::from("x1")).collect_vec();
    assert_eq!(
        chain,
        vec![
            CommitId::from("x1"),
            CommitId::from("x2"),
            CommitId::from("x3"),
        ]
    );
    // The last element is a fixpoint.
    assert!(!tracker.has_successor(chain.last().unwrap()));
}

#[test]
fn test_redundant_fetch_changes_nothing() {
    let prev = dag_of(vec![draft_commit("x1", &[])]);
    let fresh = arcs(vec![CommitRecordBuilder::new("x2").predecessors(&["x1"]).build()]);

    let mut tracker = SuccessorTracker::new();
    tracker.observe_fetch(&prev, &fresh);
    let fresh_dag = CommitDag::from_records(fresh.clone());
    tracker.observe_fetch(&fresh_dag, &fresh);
    assert_eq!(tracker.len(), 1);
    assert_eq!(
        tracker.latest_successor(&CommitId::from("x1")),
        CommitId::from("x2")
    );
}

#[test]
fn test_cycle_is_refused() {
    // Malformed engine output declaring x1 -> x2 -> x1 must not loop; the
    // closing edge is dropped and resolution stays at the fixpoint.
    let prev = dag_of(vec![draft_commit("x1", &[]), draft_commit("x2", &[])]);
    let fresh = arcs(vec![
        CommitRecordBuilder::new("x1").successor("x2", "rebase").build(),
        CommitRecordBuilder::new("x2").successor("x1", "rebase").build(),
    ]);

    let mut tracker = SuccessorTracker::new();
    tracker.observe_fetch(&prev, &fresh);
    assert_eq!(
        tracker.latest_successor(&CommitId::from("x1")),
        CommitId::from("x2")
    );
    assert_eq!(
        tracker.latest_successor(&CommitId::from("x2")),
        CommitId::from("x2")
    );
    let chain = tracker.follow_successors(&CommitId::from("x1")).collect_vec();
    assert_eq!(chain, vec![CommitId::from("x1"), CommitId::from("x2")]);
}
