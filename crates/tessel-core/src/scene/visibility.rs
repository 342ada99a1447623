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

//! Per-ray visibility masks for render objects.

use crate::tessel_bitflags;

tessel_bitflags! {
    /// Which ray types see an object.
    pub struct VisibilityFlags: u32 {
        /// Camera rays.
        const CAMERA = 1 << 0;
        /// Diffuse bounces.
        const DIFFUSE = 1 << 1;
        /// Glossy bounces.
        const GLOSSY = 1 << 2;
        /// Transmission bounces.
        const TRANSMIT = 1 << 3;
        /// Shadow rays.
        const SHADOW = 1 << 4;
        /// Volume scatter bounces.
        const SCATTER = 1 << 5;
    }
}

impl VisibilityFlags {
    /// Visible to every ray type.
    pub const ALL: Self = Self::from_bits_truncate((1 << 6) - 1);

    /// Maps a `object:visibility:<ray>` suffix to its flag.
    pub fn from_ray_token(token: &str) -> Option<Self> {
        match token {
            "camera" => Some(Self::CAMERA),
            "diffuse" => Some(Self::DIFFUSE),
            "glossy" => Some(Self::GLOSSY),
            "transmission" => Some(Self::TRANSMIT),
            "shadow" => Some(Self::SHADOW),
            "scatter" => Some(Self::SCATTER),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_tokens() {
        assert_eq!(
            VisibilityFlags::from_ray_token("transmission"),
            Some(VisibilityFlags::TRANSMIT)
        );
        assert_eq!(VisibilityFlags::from_ray_token("volume"), None);
    }

    #[test]
    fn test_all_mask() {
        let mut mask = VisibilityFlags::ALL;
        mask.remove(VisibilityFlags::SHADOW);
        assert!(!mask.contains(VisibilityFlags::SHADOW));
        assert!(mask.contains(VisibilityFlags::CAMERA | VisibilityFlags::SCATTER));
        assert_eq!(VisibilityFlags::ALL.bits(), 0b11_1111);
    }
}
