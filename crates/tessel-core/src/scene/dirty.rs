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

//! Per-prim change tracking bits reported by the scene host.

use crate::primvar::tokens;
use crate::tessel_bitflags;

tessel_bitflags! {
    /// What changed on a prim since its last sync.
    ///
    /// Bits are not mutually exclusive; a single sync may see several.
    pub struct DirtyBits: u32 {
        /// Face counts, indices, orientation or subsets changed.
        const TOPOLOGY = 1 << 0;
        /// Crease or corner tags changed.
        const SUBDIV_TAGS = 1 << 1;
        /// The display refine level changed.
        const DISPLAY_STYLE = 1 << 2;
        /// Vertex positions changed.
        const POINTS = 1 << 3;
        /// The normals primvar changed.
        const NORMALS = 1 << 4;
        /// Any other primvar changed.
        const PRIMVAR = 1 << 5;
        /// The prim transform changed.
        const TRANSFORM = 1 << 6;
        /// The bound material changed.
        const MATERIAL_ID = 1 << 7;
        /// Visibility changed.
        const VISIBILITY = 1 << 8;
        /// Instance transforms or count changed.
        const INSTANCER = 1 << 9;
        /// Double-sidedness changed.
        const DOUBLE_SIDED = 1 << 10;
        /// The prim's numeric id changed.
        const PRIM_ID = 1 << 11;
    }
}

impl DirtyBits {
    /// Every bit, as reported for a prim synced for the first time.
    pub const ALL: Self = Self::from_bits_truncate((1 << 12) - 1);

    /// Returns `true` if the primvar `name` needs to be pulled again.
    pub fn is_primvar_dirty(&self, name: &str) -> bool {
        let bit = match name {
            tokens::POINTS => DirtyBits::POINTS,
            tokens::NORMALS => DirtyBits::NORMALS,
            _ => DirtyBits::PRIMVAR,
        };
        self.intersects(bit)
    }

    /// Returns `true` if the refined topology must be rebuilt.
    pub fn needs_refine(&self) -> bool {
        self.intersects(DirtyBits::TOPOLOGY | DirtyBits::SUBDIV_TAGS | DirtyBits::DISPLAY_STYLE)
    }
}
