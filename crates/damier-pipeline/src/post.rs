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

//! The two-stage post-process chain.
//!
//! Effects run twice per frame: a low-resolution stage on the checkered
//! deferred output before reconstruction, and a full-resolution stage on
//! the camera target after it. Each stage blits the current image into a
//! scratch target and hands both to every effect in registration order.

use damier_core::renderer::{AttachmentRef, CommandRecorder, RenderOp};

use crate::error::FrameError;

/// An image-space effect participating in the post-process chain.
///
/// Both stage hooks default to doing nothing, so effects implement only the
/// stages they care about.
pub trait PostEffect {
    /// The unique name the effect is registered under.
    fn name(&self) -> &str;

    /// Records the effect's low-resolution pass, reading `src` and writing
    /// `dst` (the checkered deferred output).
    fn record_low_res(&self, recorder: &mut CommandRecorder, src: AttachmentRef, dst: AttachmentRef) {
        let _ = (recorder, src, dst);
    }

    /// Records the effect's full-resolution pass, reading `src` and writing
    /// `dst` (the camera target).
    fn record_full_res(
        &self,
        recorder: &mut CommandRecorder,
        src: AttachmentRef,
        dst: AttachmentRef,
    ) {
        let _ = (recorder, src, dst);
    }
}

/// The ordered set of registered post-process effects.
#[derive(Default)]
pub struct PostProcessChain {
    effects: Vec<Box<dyn PostEffect>>,
}

impl std::fmt::Debug for PostProcessChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostProcessChain")
            .field("effects", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

impl PostProcessChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an effect at the end of the chain.
    ///
    /// Names are unique; registering a second effect under an existing name
    /// is rejected.
    pub fn register(&mut self, effect: Box<dyn PostEffect>) -> Result<(), FrameError> {
        if self.is_registered(effect.name()) {
            return Err(FrameError::DuplicateEffect(effect.name().to_owned()));
        }
        self.effects.push(effect);
        Ok(())
    }

    /// Removes an effect by name. Returns `false` when no such effect
    /// exists.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.effects.len();
        self.effects.retain(|e| e.name() != name);
        self.effects.len() != before
    }

    /// Returns `true` when an effect with this name is in the chain.
    pub fn is_registered(&self, name: &str) -> bool {
        self.effects.iter().any(|e| e.name() == name)
    }

    /// Number of registered effects.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Returns `true` when no effects are registered.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Iterates the registered effect names in chain order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.effects.iter().map(|e| e.name())
    }

    /// Runs the low-resolution stage: snapshot `image` into `scratch`, then
    /// let every effect read the snapshot and write back to `image`.
    ///
    /// Records nothing when the chain is empty.
    pub fn run_low_res(
        &self,
        recorder: &mut CommandRecorder,
        image: AttachmentRef,
        scratch: AttachmentRef,
    ) {
        if self.effects.is_empty() {
            return;
        }
        recorder.push(RenderOp::Blit {
            src: image,
            dst: scratch,
        });
        for effect in &self.effects {
            effect.record_low_res(recorder, scratch, image);
        }
    }

    /// Runs the full-resolution stage with the same snapshot discipline as
    /// [`run_low_res`](Self::run_low_res).
    pub fn run_full_res(
        &self,
        recorder: &mut CommandRecorder,
        image: AttachmentRef,
        scratch: AttachmentRef,
    ) {
        if self.effects.is_empty() {
            return;
        }
        recorder.push(RenderOp::Blit {
            src: image,
            dst: scratch,
        });
        for effect in &self.effects {
            effect.record_full_res(recorder, scratch, image);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use damier_core::renderer::RenderTargetId;

    struct Named(&'static str);
    impl PostEffect for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn record_low_res(
            &self,
            recorder: &mut CommandRecorder,
            src: AttachmentRef,
            dst: AttachmentRef,
        ) {
            recorder.push(RenderOp::Blit { src, dst });
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut chain = PostProcessChain::new();
        chain.register(Box::new(Named("vignette"))).unwrap();
        assert!(matches!(
            chain.register(Box::new(Named("vignette"))),
            Err(FrameError::DuplicateEffect(_))
        ));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn unregister_removes_by_name() {
        let mut chain = PostProcessChain::new();
        chain.register(Box::new(Named("vignette"))).unwrap();
        assert!(chain.unregister("vignette"));
        assert!(!chain.unregister("vignette"));
        assert!(chain.is_empty());
    }

    #[test]
    fn empty_chain_records_nothing() {
        let chain = PostProcessChain::new();
        let mut rec = CommandRecorder::new("test");
        chain.run_low_res(
            &mut rec,
            AttachmentRef::Target(RenderTargetId(1)),
            AttachmentRef::Target(RenderTargetId(2)),
        );
        assert!(rec.is_empty());
    }

    #[test]
    fn stage_snapshots_before_running_effects() {
        let mut chain = PostProcessChain::new();
        chain.register(Box::new(Named("vignette"))).unwrap();
        let mut rec = CommandRecorder::new("test");
        let image = AttachmentRef::Target(RenderTargetId(1));
        let scratch = AttachmentRef::Target(RenderTargetId(2));
        chain.run_low_res(&mut rec, image, scratch);

        // First op copies the image aside, second is the effect reading the
        // snapshot and writing the image back.
        assert_eq!(
            rec.ops()[0],
            RenderOp::Blit {
                src: image,
                dst: scratch
            }
        );
        assert_eq!(
            rec.ops()[1],
            RenderOp::Blit {
                src: scratch,
                dst: image
            }
        );
    }
}
