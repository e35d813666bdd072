//! Chunks and the doubly-linked chunk list the pass operates on.

use std::ops::{Index, IndexMut};

use bitflags::bitflags;
use oxc_span::Span;

use crate::kind::Kind;

bitflags! {
    /// Per-chunk flag bits set by this pass (and the upstream tokenizer for
    /// `IN_PREPROC`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ChunkFlags: u32 {
        /// The chunk is part of a preprocessor directive.
        const IN_PREPROC = 1 << 0;
        /// The chunk starts a statement.
        const STMT_START = 1 << 1;
        /// The chunk starts an expression.
        const EXPR_START = 1 << 2;
        /// The chunk sits inside a statement paren (`if (...)`, ...).
        const IN_SPAREN = 1 << 3;
        /// The chunk sits inside the parens of a `for`.
        const IN_FOR = 1 << 4;
        /// The chunk sits inside a namespace block.
        const IN_NAMESPACE = 1 << 5;
        /// The chunk opens or closes a block longer than the configured
        /// namespace indent limit.
        const LONG_BLOCK = 1 << 6;

        /// The subset of flags inherited by inserted virtual chunks.
        const COPY = Self::IN_PREPROC.bits()
            | Self::IN_SPAREN.bits()
            | Self::IN_FOR.bits()
            | Self::IN_NAMESPACE.bits();
    }
}

/// Handle to a chunk inside a [`ChunkList`].
///
/// Plain `u32` index; `Option<ChunkId>` stands in for the null-chunk
/// sentinel of exhausted queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkId(u32);

/// A lexed token enriched with position, level and flag fields.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Kind of the token. Refined in place by the pass.
    pub kind: Kind,
    /// Kind of the syntactic construct this chunk belongs to.
    pub parent_kind: Kind,
    /// The chunk this one is attached to (`case` → its `switch`, ...).
    pub parent: Option<ChunkId>,
    /// Text of the token. Empty for virtual chunks.
    pub text: String,
    /// Byte range in the original source, for diagnostics.
    pub span: Span,
    /// 1-based line in the original source.
    pub orig_line: u32,
    /// 1-based column in the original source.
    pub orig_col: u32,
    /// Output column, seeded from the original column.
    pub column: u32,
    /// Open-bracket nesting depth of any kind.
    pub level: u32,
    /// Curly-brace nesting depth (real and virtual).
    pub brace_level: u32,
    /// Preprocessor conditional nesting depth.
    pub pp_level: u32,
    /// Flag bits.
    pub flags: ChunkFlags,
    prev: Option<ChunkId>,
    next: Option<ChunkId>,
}

impl Chunk {
    /// Create a chunk with default position fields.
    pub fn new(kind: Kind, text: impl Into<String>) -> Self {
        Self {
            kind,
            parent_kind: Kind::None,
            parent: None,
            text: text.into(),
            span: Span::new(0, 0),
            orig_line: 1,
            orig_col: 1,
            column: 1,
            level: 0,
            brace_level: 0,
            pp_level: 0,
            flags: ChunkFlags::empty(),
            prev: None,
            next: None,
        }
    }

    /// Whether this chunk has the given kind.
    #[inline]
    pub fn is(&self, kind: Kind) -> bool {
        self.kind == kind
    }

    /// Whether this chunk is a real or virtual semicolon.
    #[inline]
    pub fn is_semicolon(&self) -> bool {
        matches!(self.kind, Kind::Semicolon | Kind::VSemicolon)
    }

    /// Whether this chunk is a comment or a newline.
    #[inline]
    pub fn is_comment_or_newline(&self) -> bool {
        matches!(self.kind, Kind::Comment | Kind::Newline)
    }
}

/// The doubly-linked list of chunks, backed by an arena.
///
/// Chunks are never removed; the pass only refines them in place and
/// splices new virtual chunks in next to existing ones.
#[derive(Debug, Default)]
pub struct ChunkList {
    chunks: Vec<Chunk>,
    head: Option<ChunkId>,
    tail: Option<ChunkId>,
}

impl ChunkList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chunks, including inserted virtual ones.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the list holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// First chunk in stream order.
    pub fn head(&self) -> Option<ChunkId> {
        self.head
    }

    /// Last chunk in stream order.
    pub fn tail(&self) -> Option<ChunkId> {
        self.tail
    }

    /// Append a chunk at the end of the stream.
    pub fn push_back(&mut self, mut chunk: Chunk) -> ChunkId {
        let id = ChunkId(self.chunks.len() as u32);
        chunk.prev = self.tail;
        chunk.next = None;
        self.chunks.push(chunk);
        match self.tail {
            Some(tail) => self.chunks[tail.0 as usize].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    /// Splice a chunk in right after `after`.
    pub fn insert_after(&mut self, after: ChunkId, mut chunk: Chunk) -> ChunkId {
        let id = ChunkId(self.chunks.len() as u32);
        let next = self[after].next;
        chunk.prev = Some(after);
        chunk.next = next;
        self.chunks.push(chunk);
        self.chunks[after.0 as usize].next = Some(id);
        match next {
            Some(n) => self.chunks[n.0 as usize].prev = Some(id),
            None => self.tail = Some(id),
        }
        id
    }

    /// The chunk after `id` in stream order.
    #[inline]
    pub fn next(&self, id: ChunkId) -> Option<ChunkId> {
        self[id].next
    }

    /// The chunk before `id` in stream order.
    #[inline]
    pub fn prev(&self, id: ChunkId) -> Option<ChunkId> {
        self[id].prev
    }

    /// Next chunk that is not a comment and not a newline.
    pub fn next_ncnnl(&self, id: ChunkId) -> Option<ChunkId> {
        let mut cur = self.next(id);
        while let Some(c) = cur {
            if !self[c].is_comment_or_newline() {
                return Some(c);
            }
            cur = self.next(c);
        }
        None
    }

    /// Previous chunk that is not a comment and not a newline.
    pub fn prev_ncnnl(&self, id: ChunkId) -> Option<ChunkId> {
        let mut cur = self.prev(id);
        while let Some(c) = cur {
            if !self[c].is_comment_or_newline() {
                return Some(c);
            }
            cur = self.prev(c);
        }
        None
    }

    /// Next chunk that is not a comment.
    pub fn next_nc(&self, id: ChunkId) -> Option<ChunkId> {
        let mut cur = self.next(id);
        while let Some(c) = cur {
            if !self[c].is(Kind::Comment) {
                return Some(c);
            }
            cur = self.next(c);
        }
        None
    }

    /// Previous chunk that is not a comment.
    pub fn prev_nc(&self, id: ChunkId) -> Option<ChunkId> {
        let mut cur = self.prev(id);
        while let Some(c) = cur {
            if !self[c].is(Kind::Comment) {
                return Some(c);
            }
            cur = self.prev(c);
        }
        None
    }

    /// The closer matching an opener, found by counting same-kind nesting.
    ///
    /// Works before levels are assigned, which matters because namespace
    /// marking runs ahead of the sweep.
    pub fn closing_match(&self, open: ChunkId) -> Option<ChunkId> {
        let open_kind = self[open].kind;
        let close_kind = open_kind.closing()?;
        let mut depth = 0u32;
        let mut cur = Some(open);
        while let Some(id) = cur {
            let kind = self[id].kind;
            if kind == open_kind {
                depth += 1;
            } else if kind == close_kind {
                depth -= 1;
                if depth == 0 {
                    return Some(id);
                }
            }
            cur = self.next(id);
        }
        None
    }

    /// Flag every chunk strictly between an opener and its matching closer,
    /// and stamp a parent kind on the pair itself.
    ///
    /// Returns the closer, or `None` when the opener is unmatched.
    pub fn flag_parens(
        &mut self,
        open: ChunkId,
        flags: ChunkFlags,
        parent: Kind,
    ) -> Option<ChunkId> {
        let close = self.closing_match(open)?;
        if !flags.is_empty() {
            let mut cur = self.next(open);
            while let Some(id) = cur {
                if id == close {
                    break;
                }
                self[id].flags.insert(flags);
                cur = self.next(id);
            }
        }
        if parent != Kind::None {
            self[open].parent_kind = parent;
            self[close].parent_kind = parent;
        }
        Some(close)
    }

    /// Iterate chunk ids in stream order.
    pub fn ids(&self) -> impl Iterator<Item = ChunkId> + '_ {
        std::iter::successors(self.head, move |&id| self.next(id))
    }
}

impl Index<ChunkId> for ChunkList {
    type Output = Chunk;

    #[inline]
    fn index(&self, id: ChunkId) -> &Chunk {
        &self.chunks[id.0 as usize]
    }
}

impl IndexMut<ChunkId> for ChunkList {
    #[inline]
    fn index_mut(&mut self, id: ChunkId) -> &mut Chunk {
        &mut self.chunks[id.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of(kinds: &[Kind]) -> ChunkList {
        let mut list = ChunkList::new();
        for &kind in kinds {
            list.push_back(Chunk::new(kind, ""));
        }
        list
    }

    #[test]
    fn push_back_links_chunks() {
        let list = list_of(&[Kind::If, Kind::ParenOpen, Kind::ParenClose]);
        let head = list.head().unwrap();
        assert!(list[head].is(Kind::If));
        let second = list.next(head).unwrap();
        assert!(list[second].is(Kind::ParenOpen));
        assert_eq!(list.prev(second), Some(head));
        let third = list.next(second).unwrap();
        assert_eq!(list.tail(), Some(third));
        assert_eq!(list.next(third), None);
    }

    #[test]
    fn insert_after_splices() {
        let mut list = list_of(&[Kind::Word, Kind::Semicolon]);
        let head = list.head().unwrap();
        let inserted = list.insert_after(head, Chunk::new(Kind::VBraceOpen, ""));
        let kinds: Vec<Kind> = list.ids().map(|id| list[id].kind).collect();
        assert_eq!(kinds, [Kind::Word, Kind::VBraceOpen, Kind::Semicolon]);
        assert_eq!(list.prev(inserted), Some(head));

        let tail = list.tail().unwrap();
        let appended = list.insert_after(tail, Chunk::new(Kind::VBraceClose, ""));
        assert_eq!(list.tail(), Some(appended));
    }

    #[test]
    fn ncnnl_queries_skip_trivia() {
        let list = list_of(&[Kind::If, Kind::Comment, Kind::Newline, Kind::ParenOpen]);
        let head = list.head().unwrap();
        let paren = list.next_ncnnl(head).unwrap();
        assert!(list[paren].is(Kind::ParenOpen));
        assert_eq!(list.prev_ncnnl(paren), Some(head));
        assert_eq!(list.next_ncnnl(paren), None);

        let comment = list.next(head).unwrap();
        let newline = list.next_nc(comment).unwrap();
        assert!(list[newline].is(Kind::Newline));
    }

    #[test]
    fn closing_match_counts_nesting() {
        let list = list_of(&[
            Kind::BraceOpen,
            Kind::BraceOpen,
            Kind::BraceClose,
            Kind::BraceClose,
        ]);
        let outer = list.head().unwrap();
        let close = list.closing_match(outer).unwrap();
        assert_eq!(list.next(close), None, "outer close is the last chunk");

        let inner = list.next(outer).unwrap();
        let inner_close = list.closing_match(inner).unwrap();
        assert_eq!(list.next(inner_close), Some(close));
    }

    #[test]
    fn flag_parens_marks_the_region() {
        let mut list = list_of(&[
            Kind::BraceOpen,
            Kind::Word,
            Kind::Semicolon,
            Kind::BraceClose,
        ]);
        let open = list.head().unwrap();
        let close = list
            .flag_parens(open, ChunkFlags::IN_NAMESPACE, Kind::Namespace)
            .unwrap();
        assert_eq!(list[open].parent_kind, Kind::Namespace);
        assert_eq!(list[close].parent_kind, Kind::Namespace);
        let word = list.next(open).unwrap();
        assert!(list[word].flags.contains(ChunkFlags::IN_NAMESPACE));
        assert!(!list[close].flags.contains(ChunkFlags::IN_NAMESPACE));
    }
}
