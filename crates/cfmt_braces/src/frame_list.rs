//! Snapshot and restore of parse frames across preprocessor directives.
//!
//! A `#if` saves a copy of the current frame; `#else`/`#elif` park the
//! branch just scanned under that copy and restart from the pre-`#if`
//! state; `#endif` discards every frame belonging to the conditional it
//! closes. `#define` bodies get a fresh private frame so macro braces
//! cannot corrupt the surrounding code.

use log::trace;

use crate::frame::ParseFrame;
use crate::kind::Kind;

/// Stack of saved parse frames.
///
/// Each saved frame is tagged (via its `pp_level`) with the conditional
/// nesting depth it was saved at, so closing a conditional can discard the
/// branch frames parked at the same depth along with the `#if` snapshot.
#[derive(Debug, Default)]
pub struct FrameList {
    frames: Vec<ParseFrame>,
}

impl FrameList {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of saved frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no frames are saved.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Save a copy of `frm` on top (the `#define` entry path).
    pub fn push(&mut self, frm: &ParseFrame) {
        trace!("frame list push at pp level {}", frm.pp_level);
        self.frames.push(frm.clone());
    }

    /// Restore the top saved frame into `frm` (the `#define` exit path).
    pub fn pop_into(&mut self, frm: &mut ParseFrame) {
        if let Some(saved) = self.frames.pop() {
            trace!("frame list pop, restoring pp level {}", saved.pp_level);
            *frm = saved;
        }
    }

    /// Apply a conditional directive to the frame state.
    ///
    /// Mutates `pp_level` (for `#endif`) or schedules its increment in
    /// `pp_pending` (for `#if`, applied when the directive body ends), and
    /// returns the `pp_level` to stamp on the directive itself.
    pub fn check(
        &mut self,
        frm: &mut ParseFrame,
        pp_level: &mut u32,
        pp_pending: &mut i32,
        directive: Kind,
    ) -> u32 {
        match directive {
            Kind::PpIf => {
                let mut saved = frm.clone();
                saved.pp_level = *pp_level;
                self.frames.push(saved);
                *pp_pending += 1;
                trace!("#if at pp level {}", *pp_level);
                *pp_level
            }
            Kind::PpElse => {
                // The list top is the pre-#if snapshot for this depth; park
                // the branch just scanned under it and restart from it.
                let depth = pp_level.saturating_sub(1);
                if let Some(pre_if) = self.frames.last().cloned() {
                    let mut branch = frm.clone();
                    branch.pp_level = depth;
                    let top = self.frames.len() - 1;
                    self.frames.insert(top, branch);
                    *frm = pre_if;
                    trace!("#else restored pre-#if frame at pp level {depth}");
                }
                depth
            }
            Kind::PpEndif => {
                *pp_level = pp_level.saturating_sub(1);
                while self
                    .frames
                    .last()
                    .is_some_and(|saved| saved.pp_level >= *pp_level)
                {
                    self.frames.pop();
                }
                trace!("#endif back to pp level {}", *pp_level);
                *pp_level
            }
            _ => *pp_level,
        }
    }
}
