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

//! Defines the resource-lifecycle error type for the rendering contracts.

use std::fmt;

use super::handle::ComputeBufferId;
use super::target::RenderTargetId;

/// An error in the lifecycle of a transient frame resource.
///
/// Every variant is a programming error in the recording code: targets and
/// buffers must be created before use and released exactly once within the
/// frame that created them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// A target key was referenced before a `CreateTarget` for it.
    TargetNotLive {
        /// The target key.
        id: RenderTargetId,
    },
    /// A target key was created twice without an intervening release.
    TargetAlreadyLive {
        /// The target key.
        id: RenderTargetId,
    },
    /// A buffer key was referenced before a `CreateBuffer` for it.
    BufferNotLive {
        /// The buffer key.
        id: ComputeBufferId,
    },
    /// A buffer key was created twice without an intervening release.
    BufferAlreadyLive {
        /// The buffer key.
        id: ComputeBufferId,
    },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::TargetNotLive { id } => {
                write!(f, "Render target {id:?} used or released before creation")
            }
            ResourceError::TargetAlreadyLive { id } => {
                write!(f, "Render target {id:?} created while still live")
            }
            ResourceError::BufferNotLive { id } => {
                write!(f, "Compute buffer {id:?} used or released before creation")
            }
            ResourceError::BufferAlreadyLive { id } => {
                write!(f, "Compute buffer {id:?} created while still live")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_error_display_names_the_key() {
        let e = ResourceError::TargetNotLive {
            id: RenderTargetId(7),
        };
        assert!(e.to_string().contains("RenderTargetId(7)"));
    }

    #[test]
    fn buffer_error_display_names_the_key() {
        let e = ResourceError::BufferAlreadyLive {
            id: ComputeBufferId(3),
        };
        assert!(e.to_string().contains("ComputeBufferId(3)"));
    }
}
