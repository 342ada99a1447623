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

//! Core contracts and data types of the Tessel mesh sync engine.
//!
//! This crate holds everything the other layers agree on: math, numeric
//! conversion of host primvars, topology and face views, the subdivision
//! refiner contract, time samples, the scene host traits and the sync
//! configuration. It contains no renderer state and no algorithms beyond
//! small value-level helpers.

#![warn(missing_docs)]

pub mod config;
pub mod lane;
pub mod macros;
pub mod math;
pub mod primvar;
pub mod sampling;
pub mod scene;
pub mod topology;

pub use config::{ConfigError, SyncConfig};
pub use lane::{Lane, LaneKind};
pub use sampling::{SampleError, TimeSampleArray, MAX_MOTION_SAMPLES};
