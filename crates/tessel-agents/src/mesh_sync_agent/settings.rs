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

//! Per-prim overrides carried by constant primvars.

use tessel_core::config::SyncConfig;
use tessel_core::primvar::{Interpolation, PrimvarValue};
use tessel_core::scene::{PrimId, SceneDelegate, VisibilityFlags};
use tessel_core::topology::SubdivisionScheme;

const OBJECT_PREFIX: &str = "object:";
const MESH_PREFIX: &str = "mesh:";
const VISIBILITY_PREFIX: &str = "object:visibility:";

/// Object and mesh settings of one prim.
///
/// Defaults come from the [`SyncConfig`]; constant primvars named
/// `object:*` and `mesh:*` override them.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimSettings {
    /// `object:motion_blur`: transform and deformation blur.
    pub motion_blur: bool,
    /// `object:motion_blur_deform`: deformation blur only.
    pub motion_blur_deform: bool,
    /// `mesh:subdivision_type`: overrides the topology's scheme.
    pub scheme: Option<SubdivisionScheme>,
    /// `mesh:dicing_rate`.
    pub dicing_rate: f32,
    /// `mesh:subdivision_max_level`.
    pub max_level: u32,
    /// `object:shadow_catcher`.
    pub shadow_catcher: bool,
    /// `object:holdout`.
    pub holdout: bool,
    /// `object:visibility:<ray>` flags.
    pub visibility: VisibilityFlags,
}

impl PrimSettings {
    /// The settings of a prim without overrides.
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            motion_blur: true,
            motion_blur_deform: true,
            scheme: None,
            dicing_rate: config.dicing_rate,
            max_level: config.max_subdivision_level,
            shadow_catcher: false,
            holdout: false,
            visibility: VisibilityFlags::ALL,
        }
    }

    /// Reads every override the host exposes for `id`.
    pub fn read(delegate: &dyn SceneDelegate, id: &PrimId, config: &SyncConfig) -> Self {
        let mut settings = Self::from_config(config);
        for descriptor in delegate.primvar_descriptors(id, Interpolation::Constant) {
            if !Self::is_setting(&descriptor.name) {
                continue;
            }
            if let Some(value) = delegate.primvar(id, &descriptor.name) {
                if !settings.apply(&descriptor.name, &value) {
                    log::warn!(
                        "{id}: ignoring setting '{}' of type {}",
                        descriptor.name,
                        value.type_name()
                    );
                }
            }
        }
        settings
    }

    /// Returns `true` for primvar names that carry settings rather than data.
    pub fn is_setting(name: &str) -> bool {
        name.starts_with(OBJECT_PREFIX) || name.starts_with(MESH_PREFIX)
    }

    /// Applies one override. Returns `false` when the name is unknown or the
    /// value has the wrong type.
    pub fn apply(&mut self, name: &str, value: &PrimvarValue) -> bool {
        if let Some(ray) = name.strip_prefix(VISIBILITY_PREFIX) {
            return match (VisibilityFlags::from_ray_token(ray), value.first_as_bool()) {
                (Some(flag), Some(visible)) => {
                    self.visibility.set(flag, visible);
                    true
                }
                _ => false,
            };
        }

        match name {
            "object:motion_blur" => set(&mut self.motion_blur, value.first_as_bool()),
            "object:motion_blur_deform" => {
                set(&mut self.motion_blur_deform, value.first_as_bool())
            }
            "object:shadow_catcher" => set(&mut self.shadow_catcher, value.first_as_bool()),
            "object:holdout" => set(&mut self.holdout, value.first_as_bool()),
            "mesh:subdivision_type" => {
                match value.first_as_token().and_then(SubdivisionScheme::from_token) {
                    Some(scheme) => {
                        self.scheme = Some(scheme);
                        true
                    }
                    None => false,
                }
            }
            "mesh:dicing_rate" => match value.first_as_f32() {
                Some(rate) if rate > 0.0 => {
                    self.dicing_rate = rate;
                    true
                }
                _ => false,
            },
            "mesh:subdivision_max_level" => match value.first_as_f32() {
                Some(level) if level >= 0.0 => {
                    self.max_level = level as u32;
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Returns `true` if switching to `other` changes the refined topology.
    pub fn refine_differs(&self, other: &PrimSettings) -> bool {
        self.scheme != other.scheme || self.max_level != other.max_level
    }

    /// Whether deformation motion keys are kept.
    pub fn deformation_blur(&self, config: &SyncConfig) -> bool {
        config.enable_motion_blur && self.motion_blur && self.motion_blur_deform
    }

    /// Whether transform motion keys are kept.
    pub fn transform_blur(&self, config: &SyncConfig) -> bool {
        config.enable_motion_blur && self.motion_blur
    }
}

fn set(slot: &mut bool, value: Option<bool>) -> bool {
    match value {
        Some(value) => {
            *slot = value;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_config() {
        let config = SyncConfig {
            dicing_rate: 2.0,
            ..Default::default()
        };
        let settings = PrimSettings::from_config(&config);
        assert_eq!(settings.dicing_rate, 2.0);
        assert_eq!(settings.max_level, 12);
        assert_eq!(settings.visibility, VisibilityFlags::ALL);
        assert!(!settings.deformation_blur(&config));
    }

    #[test]
    fn test_numeric_booleans() {
        let mut settings = PrimSettings::from_config(&SyncConfig::default());
        assert!(settings.apply("object:holdout", &PrimvarValue::Int(vec![1])));
        assert!(settings.apply("object:motion_blur", &PrimvarValue::Double(vec![0.0])));
        assert!(settings.holdout);
        assert!(!settings.motion_blur);
    }

    #[test]
    fn test_visibility_rays() {
        let mut settings = PrimSettings::from_config(&SyncConfig::default());
        assert!(settings.apply(
            "object:visibility:shadow",
            &PrimvarValue::Bool(vec![false])
        ));
        assert!(!settings.visibility.contains(VisibilityFlags::SHADOW));
        assert!(settings.visibility.contains(VisibilityFlags::CAMERA));
        assert!(!settings.apply(
            "object:visibility:volume",
            &PrimvarValue::Bool(vec![false])
        ));
    }

    #[test]
    fn test_subdivision_overrides() {
        let config = SyncConfig::default();
        let base = PrimSettings::from_config(&config);
        let mut settings = base.clone();
        assert!(settings.apply(
            "mesh:subdivision_type",
            &PrimvarValue::Token(vec!["linear".into()])
        ));
        assert!(settings.apply("mesh:subdivision_max_level", &PrimvarValue::Int(vec![2])));
        assert!(!settings.apply("mesh:dicing_rate", &PrimvarValue::Float(vec![-1.0])));
        assert_eq!(settings.scheme, Some(SubdivisionScheme::Linear));
        assert_eq!(settings.max_level, 2);
        assert!(base.refine_differs(&settings));
    }

    #[test]
    fn test_setting_names() {
        assert!(PrimSettings::is_setting("object:holdout"));
        assert!(PrimSettings::is_setting("mesh:dicing_rate"));
        assert!(!PrimSettings::is_setting("displayColor"));
    }
}
