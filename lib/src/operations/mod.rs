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

//! The concrete mutating commands the UI can issue.
//!
//! Each command kind implements [`crate::operation::Operation`]; illegal
//! constructions are rejected here, synchronously, before anything is
//! enqueued.

#![allow(missing_docs)]

mod amend;
mod goto;
mod hide;
mod rebase;

pub use amend::AmendOperation;
pub use goto::GotoOperation;
pub use hide::HideOperation;
pub use rebase::RebaseOperation;
