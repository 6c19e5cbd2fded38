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

use std::collections::HashSet;
use std::sync::Arc;

use itertools::Itertools as _;
use pretty_assertions::assert_eq;
use smartlog_lib::commit::CommitId;
use smartlog_lib::dag::CommitDag;
use testutils::{draft_commit, public_commit, sibling_graph, CommitRecordBuilder};

fn dag_of(records: Vec<smartlog_lib::commit::CommitRecord>) -> CommitDag {
    CommitDag::from_records(records.into_iter().map(Arc::new))
}

fn ids(hashes: &[&str]) -> HashSet<CommitId> {
    hashes.iter().map(|hash| CommitId::from(*hash)).collect()
}

#[test]
fn test_add_is_idempotent() {
    let records: Vec<Arc<_>> = sibling_graph().into_iter().map(Arc::new).collect();
    let once = CommitDag::new().add(records.clone());
    let twice = once.add(records);
    assert_eq!(once, twice);
}

#[test]
fn test_add_replaces_same_hash() {
    let dag = dag_of(sibling_graph());
    let retitled = CommitRecordBuilder::new("ccc")
        .parents(&["aaa"])
        .title("renamed")
        .build();
    let updated = dag.add([Arc::new(retitled)]);
    assert_eq!(updated.len(), dag.len());
    assert_eq!(updated.get(&CommitId::from("ccc")).unwrap().title, "renamed");
}

#[test]
fn test_at_most_one_head_after_add() {
    // Two records claiming the working copy; the graph must repair to one.
    let dag = dag_of(vec![
        public_commit("aaa", &[]),
        CommitRecordBuilder::new("bbb").parents(&["aaa"]).head().build(),
        CommitRecordBuilder::new("ccc").parents(&["aaa"]).head().build(),
    ]);
    let heads = dag.commits().filter(|record| record.is_head).collect_vec();
    assert_eq!(heads.len(), 1);
    assert_eq!(heads[0].hash, CommitId::from("ccc"));
    assert_eq!(dag.head_commit().unwrap().hash, CommitId::from("ccc"));
}

#[test]
fn test_head_moves_on_refresh() {
    let dag = dag_of(sibling_graph());
    assert_eq!(dag.head_commit().unwrap().hash, CommitId::from("ddd"));
    let moved = dag.with_head_at(&CommitId::from("ccc"));
    assert_eq!(moved.head_commit().unwrap().hash, CommitId::from("ccc"));
    assert!(!moved.get(&CommitId::from("ddd")).unwrap().is_head);
    // Unknown targets leave the graph alone.
    assert_eq!(moved.with_head_at(&CommitId::from("nope")), moved);
}

#[test]
fn test_ancestors_and_descendants() {
    let dag = dag_of(sibling_graph());
    assert_eq!(
        dag.ancestors(&CommitId::from("ddd"), None),
        ids(&["ddd", "bbb", "aaa"])
    );
    assert_eq!(
        dag.descendants(&CommitId::from("aaa"), None),
        ids(&["aaa", "bbb", "ccc", "ddd"])
    );
    assert_eq!(
        dag.descendants(&CommitId::from("bbb"), None),
        ids(&["bbb", "ddd"])
    );
    // Restriction bounds the walk.
    let drafts = dag.draft_commits();
    assert_eq!(
        dag.ancestors(&CommitId::from("ddd"), Some(&drafts)),
        ids(&["ddd", "bbb"])
    );
}

#[test]
fn test_ancestor_descendant_duality() {
    let dag = dag_of(sibling_graph());
    let hashes = dag.render_order();
    for a in &hashes {
        let descendants = dag.descendants(a, None);
        for b in &hashes {
            assert_eq!(
                dag.is_ancestor(a, b),
                descendants.contains(b),
                "duality violated for ({a}, {b})"
            );
        }
    }
}

#[test]
fn test_unknown_lookups_never_fail() {
    let dag = dag_of(sibling_graph());
    let unknown = CommitId::from("0000000");
    assert_eq!(dag.get(&unknown), None);
    assert_eq!(dag.parents(&unknown), &[] as &[CommitId]);
    assert_eq!(dag.children(&unknown), &[] as &[CommitId]);
    assert_eq!(dag.ancestors(&unknown, None), HashSet::new());
    assert_eq!(dag.descendants(&unknown, None), HashSet::new());
    assert!(!dag.is_ancestor(&unknown, &CommitId::from("aaa")));
    assert_eq!(dag.resolve("0000000"), None);
}

#[test]
fn test_heads() {
    let dag = dag_of(sibling_graph());
    assert_eq!(dag.heads(None), ids(&["ccc", "ddd"]));
    assert_eq!(
        dag.heads(Some(&ids(&["aaa", "bbb", "ccc"]))),
        ids(&["bbb", "ccc"])
    );
    assert_eq!(dag.heads(Some(&ids(&["aaa", "bbb", "ddd"]))), ids(&["ddd"]));
}

#[test]
fn test_resolve_symbols() {
    let dag = dag_of(vec![
        public_commit("aaa000", &[]),
        CommitRecordBuilder::new("abc123")
            .parents(&["aaa000"])
            .bookmark("work")
            .build(),
        CommitRecordBuilder::new("abd456")
            .parents(&["aaa000"])
            .remote_bookmark("remote/main")
            .head()
            .build(),
    ]);
    assert_eq!(dag.resolve("work").unwrap().hash, CommitId::from("abc123"));
    assert_eq!(
        dag.resolve("remote/main").unwrap().hash,
        CommitId::from("abd456")
    );
    assert_eq!(dag.resolve(".").unwrap().hash, CommitId::from("abd456"));
    assert_eq!(dag.resolve("abc123").unwrap().hash, CommitId::from("abc123"));
    // Unique prefix resolves, ambiguous prefix does not.
    assert_eq!(dag.resolve("abc").unwrap().hash, CommitId::from("abc123"));
    assert_eq!(dag.resolve("abd4").unwrap().hash, CommitId::from("abd456"));
    assert_eq!(dag.resolve("ab"), None);
    assert_eq!(dag.resolve("zzz"), None);
}

#[test]
fn test_boundary_commits_tracked_separately() {
    // "fff" references a parent outside the fetched window; it is a
    // boundary commit, not an error and not a root.
    let dag = dag_of(vec![
        public_commit("aaa", &[]),
        draft_commit("bbb", &["aaa"]),
        public_commit("fff", &["missing"]),
    ]);
    assert_eq!(dag.roots(), &[CommitId::from("aaa")]);
    assert_eq!(dag.boundary_commits(), &[CommitId::from("fff")]);
    assert_eq!(dag.children(&CommitId::from("missing")), &[] as &[CommitId]);
}

#[test]
fn test_force_connect_synthesizes_single_root() {
    let dag = dag_of(vec![
        public_commit("aaa", &[]),
        draft_commit("bbb", &["aaa"]),
        public_commit("fff", &["missing"]),
        draft_commit("ggg", &["fff"]),
    ]);
    let connected = dag.force_connect();
    assert_eq!(connected.len(), dag.len() + 1);
    let root_id = connected.roots().iter().exactly_one().unwrap().clone();
    assert!(CommitDag::is_boundary_root(&root_id));
    assert_eq!(
        connected.parents(&CommitId::from("aaa")),
        &[root_id.clone()]
    );
    assert_eq!(connected.parents(&CommitId::from("fff")), &[root_id.clone()]);
    // Everything is now reachable from the synthetic root.
    assert_eq!(connected.descendants(&root_id, None).len(), connected.len());
}

#[test]
fn test_force_connect_noop_when_connected() {
    let dag = dag_of(sibling_graph());
    assert_eq!(dag.force_connect(), dag);
}

#[test]
fn test_remove_drops_indices() {
    let dag = dag_of(sibling_graph());
    let removed = dag.remove(&ids(&["bbb", "ddd"]));
    assert_eq!(removed.len(), 2);
    assert_eq!(removed.children(&CommitId::from("aaa")), &[CommitId::from("ccc")]);
    assert_eq!(removed.head_commit(), None);
    assert_eq!(removed.heads(None), ids(&["ccc"]));
}

#[test]
fn test_render_order_parents_after_children() {
    let dag = dag_of(sibling_graph());
    let order = dag.render_order();
    assert_eq!(order.len(), dag.len());
    let position = |hash: &str| {
        order
            .iter()
            .position(|id| id == &CommitId::from(hash))
            .unwrap()
    };
    assert!(position("ddd") < position("bbb"));
    assert!(position("bbb") < position("aaa"));
    assert!(position("ccc") < position("aaa"));
}

#[test]
fn test_structural_reuse_across_fetches() {
    use smartlog_lib::commit::reuse_fetched_records;

    let dag = dag_of(sibling_graph());
    let mut second = sibling_graph();
    second[1].title = "changed".to_owned();
    let reused = reuse_fetched_records(&dag, second);
    // Unchanged records keep their allocation, the changed one does not.
    assert!(Arc::ptr_eq(&reused[0], dag.get(&CommitId::from("aaa")).unwrap()));
    assert!(!Arc::ptr_eq(&reused[1], dag.get(&CommitId::from("bbb")).unwrap()));
    assert!(Arc::ptr_eq(&reused[3], dag.get(&CommitId::from("ddd")).unwrap()));
}
