//! Pawn statement termination.
//!
//! Pawn ends statements at newlines unless the line obviously continues.
//! When a newline is reached inside a virtual brace, a virtual semicolon is
//! appended after the last significant chunk so the generic close logic can
//! treat the statement like any other.

use log::trace;

use crate::chunk::{Chunk, ChunkFlags, ChunkId, ChunkList};
use crate::kind::Kind;

/// Called on a newline while the top of the stack is a virtual brace.
///
/// Returns the chunk the sweep should continue from: the freshly inserted
/// (or already present) statement terminator, or `pc` unchanged when the
/// line continues.
pub fn check_vsemicolon(list: &mut ChunkList, pc: ChunkId) -> ChunkId {
    let mut vb_open = None;
    let mut cur = list.prev(pc);
    while let Some(id) = cur {
        if list[id].is(Kind::VBraceOpen) {
            vb_open = Some(id);
            break;
        }
        cur = list.prev(id);
    }
    let Some(vb_open) = vb_open else { return pc };
    let Some(prev) = list.prev_ncnnl(pc) else { return pc };
    if prev == vb_open
        || list[prev].flags.contains(ChunkFlags::IN_PREPROC)
        || continued(list, prev, list[vb_open].level + 1)
    {
        return pc;
    }
    add_vsemi_after(list, prev)
}

/// Append a virtual semicolon after `pc`, unless one is already there.
pub fn add_vsemi_after(list: &mut ChunkList, pc: ChunkId) -> ChunkId {
    if list[pc].is_semicolon() {
        return pc;
    }
    let anchor = &list[pc];
    let mut chunk = Chunk::new(Kind::VSemicolon, "");
    chunk.orig_line = anchor.orig_line;
    chunk.orig_col = anchor.orig_col + anchor.text.len() as u32;
    chunk.column = anchor.column + anchor.text.len() as u32;
    chunk.level = anchor.level;
    chunk.brace_level = anchor.brace_level;
    chunk.pp_level = anchor.pp_level;
    chunk.flags = anchor.flags & ChunkFlags::COPY;
    trace!(
        "virtual semicolon after '{}' on line {}",
        anchor.text,
        anchor.orig_line
    );
    list.insert_after(pc, chunk)
}

/// Whether the statement ending at `pc` continues on the next line.
fn continued(list: &ChunkList, pc: ChunkId, level: u32) -> bool {
    if list[pc].level != level {
        return true;
    }
    matches!(
        list[pc].kind,
        Kind::Semicolon
            | Kind::VSemicolon
            | Kind::Assign
            | Kind::Arith
            | Kind::Shift
            | Kind::Bool
            | Kind::Compare
            | Kind::Comma
            | Kind::Question
            | Kind::Colon
            | Kind::Not
            | Kind::Inv
            | Kind::Star
            | Kind::Minus
            | Kind::Plus
            | Kind::Caret
            | Kind::BraceOpen
            | Kind::VBraceOpen
            | Kind::ParenOpen
            | Kind::SParenOpen
            | Kind::FParenOpen
            | Kind::If
            | Kind::Else
            | Kind::ElseIf
            | Kind::Do
            | Kind::While
            | Kind::Switch
            | Kind::For
            | Kind::Case
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_vsemi_after_skips_existing_terminators() {
        let mut list = ChunkList::new();
        let semi = list.push_back(Chunk::new(Kind::Semicolon, ";"));
        assert_eq!(add_vsemi_after(&mut list, semi), semi);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn add_vsemi_after_inserts_a_virtual_terminator() {
        let mut list = ChunkList::new();
        let word = list.push_back(Chunk::new(Kind::Word, "x"));
        let vsemi = add_vsemi_after(&mut list, word);
        assert!(list[vsemi].is(Kind::VSemicolon));
        assert_eq!(list.next(word), Some(vsemi));
    }

    #[test]
    fn continued_lines_get_no_terminator() {
        let mut list = ChunkList::new();
        let vb = list.push_back(Chunk::new(Kind::VBraceOpen, ""));
        let mut word = Chunk::new(Kind::Word, "x");
        word.level = 1;
        list.push_back(word);
        let mut op = Chunk::new(Kind::Plus, "+");
        op.level = 1;
        list.push_back(op);
        let nl = list.push_back(Chunk::new(Kind::Newline, "\n"));

        let _ = vb;
        assert_eq!(check_vsemicolon(&mut list, nl), nl, "trailing '+' continues");
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn finished_lines_get_a_terminator() {
        let mut list = ChunkList::new();
        list.push_back(Chunk::new(Kind::VBraceOpen, ""));
        let mut word = Chunk::new(Kind::Word, "x");
        word.level = 1;
        let word = list.push_back(word);
        let nl = list.push_back(Chunk::new(Kind::Newline, "\n"));

        let vsemi = check_vsemicolon(&mut list, nl);
        assert_ne!(vsemi, nl);
        assert!(list[vsemi].is(Kind::VSemicolon));
        assert_eq!(list.next(word), Some(vsemi));
    }
}
