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

//! # Damier Pipeline
//!
//! The checkerboard-reconstruction deferred frame scheduler. Each camera
//! frame is recorded as an ordered command list: depth prepasses, a
//! half-resolution G-Buffer, deferred lighting through light-volume proxies
//! with a shadow atlas, transparency, a two-stage post-process chain, and a
//! compute pass that reconstructs the full-resolution image from alternating
//! checker fields.
//!
//! Frames are recorded against the
//! [`GraphicsHost`](damier_core::renderer::GraphicsHost) trait; the
//! [`headless::RecordingHost`] in this crate captures frames without a GPU.

#![warn(missing_docs)]

pub mod context;
pub mod dispatch;
pub mod error;
pub mod headless;
pub mod lighting;
pub mod post;
pub mod procedural;
pub mod reconstruct;
pub mod resources;
pub mod scheduler;
pub mod shadow;

pub use context::{FrameContext, PipelineContext};
pub use error::FrameError;
pub use scheduler::{CameraFrame, CheckerboardScheduler, PipelineAssets};
