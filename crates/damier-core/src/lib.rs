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

//! # Damier Core
//!
//! Foundational crate for the damier checkerboard renderer: math primitives,
//! the recorded command-list vocabulary, light and camera types, and the
//! [`GraphicsHost`](renderer::traits::GraphicsHost) contract a runtime
//! implements to execute recorded frames.

#![warn(missing_docs)]

pub mod math;
pub mod renderer;
pub mod settings;

pub use settings::{PipelineSettings, ShadowSettings};
