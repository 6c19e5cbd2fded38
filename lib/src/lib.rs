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

//! Core UI model for smartlog, an interactive front-end for a slow,
//! external source-control engine.
//!
//! The model keeps three layers of state: the factual commit graph as last
//! reported by the engine, an operation queue of mutating commands in
//! flight, and an optional hover preview. The displayed graph is a pure
//! composition of the three, recomputed on every change, so the UI can show
//! predicted results immediately and reconcile with ground truth without
//! visible jumps.

#![warn(missing_docs)]
#![deny(unused_must_use)]
#![forbid(unsafe_code)]

pub mod object_id;

pub mod commit;
pub mod dag;
pub mod dag_walk;
pub mod operation;
pub mod operations;
pub mod preview;
pub mod queue;
pub mod revset;
pub mod settings;
pub mod smartlog;
pub mod successor;
pub mod union_find;
pub mod working_copy;
