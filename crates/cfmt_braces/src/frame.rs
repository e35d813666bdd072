//! The parse frame: a sentinel-guarded stack of open brackets and
//! in-flight complex statements, plus the per-frame counters.

use log::trace;

use crate::chunk::ChunkId;
use crate::kind::Kind;

/// Which token a complex statement expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Not a complex statement, or already inside its body.
    None,
    /// Expecting a mandatory `(`.
    Paren1,
    /// Expecting an optional `(`; anything else starts the body.
    OpParen1,
    /// Expecting `{` or the first body token.
    Brace2,
    /// Expecting the `{` of a `do` body.
    BraceDo,
    /// `if` body closed; an `else` may follow.
    Else,
    /// `else` seen; an `if` may fuse with it.
    ElseIf,
    /// `do` body closed; `while` is mandatory.
    While,
    /// `try`/`catch` body closed; `catch` or `finally` may follow.
    Catch,
    /// C# `catch` seen; optional paren or `when` filter may follow.
    CatchWhen,
    /// Expecting the `(` of a do-closing `while`.
    WodParen,
    /// Expecting the `;` after a do-closing `while (...)`.
    WodSemi,
}

/// One open bracket or in-flight complex statement.
#[derive(Debug, Clone, Copy)]
pub struct StackEntry {
    /// Kind of the opener or statement keyword.
    pub kind: Kind,
    /// Parent kind to stamp onto the matching closer.
    pub parent: Kind,
    /// Complex-statement progress.
    pub stage: Stage,
    /// The opener chunk, for diagnostics and parent linkage.
    pub pc: Option<ChunkId>,
    /// Whether this opener bumped `brace_level`; the matching close only
    /// decrements when it did.
    pub brace_bump: bool,
}

impl StackEntry {
    /// A fresh entry with no parent and no stage.
    pub fn new(kind: Kind, stage: Stage, pc: Option<ChunkId>) -> Self {
        Self {
            kind,
            parent: Kind::None,
            stage,
            pc,
            brace_bump: false,
        }
    }
}

/// The active parser state: bracket stack plus counters.
///
/// # Invariants
///
/// - Index 0 always holds an [`Kind::Eof`] sentinel, so [`ParseFrame::top`]
///   never fails; the sentinel cannot be popped.
/// - `sparen_count` equals the number of `SParenOpen` entries on the stack.
#[derive(Debug, Clone)]
pub struct ParseFrame {
    entries: Vec<StackEntry>,
    /// Open-bracket nesting depth of any kind.
    pub level: u32,
    /// Curly-brace nesting depth (real and virtual).
    pub brace_level: u32,
    /// Preprocessor nesting depth this frame belongs to.
    pub pp_level: u32,
    /// Number of open statement parens on the stack.
    pub sparen_count: u32,
    /// Significant chunks seen since the last statement boundary.
    pub stmt_count: u32,
    /// Significant chunks seen since the last expression boundary.
    pub expr_count: u32,
}

impl ParseFrame {
    /// A fresh frame holding only the sentinel.
    pub fn new() -> Self {
        Self {
            entries: vec![StackEntry::new(Kind::Eof, Stage::None, None)],
            level: 0,
            brace_level: 0,
            pp_level: 0,
            sparen_count: 0,
            stmt_count: 0,
            expr_count: 0,
        }
    }

    /// Number of entries, sentinel included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Push an entry.
    pub fn push(&mut self, entry: StackEntry) {
        trace!("frame push {:?} ({:?})", entry.kind, entry.stage);
        self.entries.push(entry);
    }

    /// Pop the top entry.
    ///
    /// Returns `None` instead of removing the sentinel; popping an empty
    /// stack is a programmer error upstream of this guard.
    pub fn pop(&mut self) -> Option<StackEntry> {
        if self.entries.len() <= 1 {
            debug_assert_eq!(
                self.entries[0].kind,
                Kind::Eof,
                "bottom of the stack must be the sentinel"
            );
            return None;
        }
        let entry = self.entries.pop();
        if let Some(e) = &entry {
            trace!("frame pop {:?}", e.kind);
        }
        entry
    }

    /// The top entry. Always valid thanks to the sentinel.
    #[inline]
    pub fn top(&self) -> &StackEntry {
        self.entries.last().expect("sentinel keeps the stack non-empty")
    }

    /// Mutable access to the top entry.
    #[inline]
    pub fn top_mut(&mut self) -> &mut StackEntry {
        self.entries.last_mut().expect("sentinel keeps the stack non-empty")
    }

    /// The entry directly under the top, if any real entry is there.
    #[inline]
    pub fn prev(&self) -> Option<&StackEntry> {
        self.entries.get(self.entries.len().wrapping_sub(2))
    }

    /// Indexed access from the bottom; 0 is the sentinel.
    #[inline]
    pub fn at(&self, idx: usize) -> &StackEntry {
        &self.entries[idx]
    }
}

impl Default for ParseFrame {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_frame_holds_the_sentinel() {
        let frm = ParseFrame::new();
        assert_eq!(frm.len(), 1);
        assert_eq!(frm.top().kind, Kind::Eof);
        assert_eq!(frm.top().stage, Stage::None);
        assert_eq!(frm.level, 0);
        assert_eq!(frm.brace_level, 0);
    }

    #[test]
    fn sentinel_cannot_be_popped() {
        let mut frm = ParseFrame::new();
        assert!(frm.pop().is_none());
        assert_eq!(frm.top().kind, Kind::Eof);
    }

    #[test]
    fn push_pop_round_trip() {
        let mut frm = ParseFrame::new();
        frm.push(StackEntry::new(Kind::If, Stage::Paren1, None));
        frm.push(StackEntry::new(Kind::SParenOpen, Stage::None, None));
        assert_eq!(frm.len(), 3);
        assert_eq!(frm.top().kind, Kind::SParenOpen);
        assert_eq!(frm.prev().unwrap().kind, Kind::If);

        let popped = frm.pop().unwrap();
        assert_eq!(popped.kind, Kind::SParenOpen);
        assert_eq!(frm.top().kind, Kind::If);
        assert_eq!(frm.top().stage, Stage::Paren1);
    }

    #[test]
    fn stage_is_mutable_through_top_mut() {
        let mut frm = ParseFrame::new();
        frm.push(StackEntry::new(Kind::If, Stage::Paren1, None));
        frm.top_mut().stage = Stage::Brace2;
        assert_eq!(frm.top().stage, Stage::Brace2);
    }
}
