// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The mesh sync agent.
//!
//! The agent owns no algorithm of its own: it reads the host through a
//! [`SceneDelegate`](tessel_core::scene::SceneDelegate), decides which lanes
//! must run from the dirty bits, and writes their output into the shared
//! [`RenderScene`](tessel_data::RenderScene).

mod agent;
mod primvars;
mod settings;
mod snapshot;

pub use agent::MeshSyncAgent;
pub use settings::PrimSettings;
