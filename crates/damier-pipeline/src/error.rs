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

//! Defines the scheduler-side error type.
//!
//! Recoverable per-stage conditions (a missing compute kernel, an
//! unavailable frustum) are logged and skipped, never surfaced as errors;
//! `FrameError` covers the violations that abort a frame.

use damier_core::renderer::ResourceError;
use thiserror::Error;

/// An error that aborts recording of a camera frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// A frame-resource lifecycle rule was violated. This is a bug in the
    /// recording code, not a runtime condition.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// A post-process effect was registered under a name already in use.
    #[error("post-process effect '{0}' is already registered")]
    DuplicateEffect(String),
}
