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

//! Lanes: the hot-path algorithm units driven by the sync agent.

/// The kind of work a lane performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneKind {
    /// Topology refinement and triangulation.
    Topology,
    /// Primvar to attribute-buffer mapping.
    Attribute,
    /// Tangent-space generation.
    Tangent,
    /// Motion keys and instance transforms.
    Motion,
}

impl std::fmt::Display for LaneKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaneKind::Topology => write!(f, "Topology"),
            LaneKind::Attribute => write!(f, "Attribute"),
            LaneKind::Tangent => write!(f, "Tangent"),
            LaneKind::Motion => write!(f, "Motion"),
        }
    }
}

/// Common identity of every lane.
pub trait Lane: Send + Sync {
    /// Human-readable name of the lane's strategy, used in logs.
    fn strategy_name(&self) -> &'static str;

    /// The kind of processing this lane performs.
    fn lane_kind(&self) -> LaneKind;
}
