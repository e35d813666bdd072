#![allow(dead_code)]

use cfmt_braces::{Chunk, ChunkFlags, ChunkId, ChunkList, Kind};

/// Append one line of tokens at `line`, columns advancing left to right,
/// followed by a newline chunk. Directive lines get `IN_PREPROC` on every
/// token; the trailing newline stays unflagged, ending the directive.
pub fn push_line(list: &mut ChunkList, line: u32, in_preproc: bool, toks: &[(Kind, &str)]) {
    let mut col = 1u32;
    for &(kind, text) in toks {
        let mut chunk = Chunk::new(kind, text);
        chunk.orig_line = line;
        chunk.orig_col = col;
        chunk.column = col;
        if in_preproc {
            chunk.flags |= ChunkFlags::IN_PREPROC;
        }
        col += text.len() as u32 + 1;
        list.push_back(chunk);
    }
    let mut newline = Chunk::new(Kind::Newline, "\n");
    newline.orig_line = line;
    newline.orig_col = col;
    list.push_back(newline);
}

/// Build a single-line stream with no trailing newline.
pub fn build(toks: &[(Kind, &str)]) -> ChunkList {
    let mut list = ChunkList::new();
    let mut col = 1u32;
    for &(kind, text) in toks {
        let mut chunk = Chunk::new(kind, text);
        chunk.orig_col = col;
        chunk.column = col;
        col += text.len() as u32 + 1;
        list.push_back(chunk);
    }
    list
}

/// Every chunk kind in stream order.
pub fn kinds(list: &ChunkList) -> Vec<Kind> {
    list.ids().map(|id| list[id].kind).collect()
}

/// First chunk of the given kind.
pub fn find(list: &ChunkList, kind: Kind) -> ChunkId {
    list.ids()
        .find(|&id| list[id].kind == kind)
        .unwrap_or_else(|| panic!("no {kind:?} chunk in the stream"))
}

/// The `n`-th (0-based) chunk of the given kind.
pub fn find_nth(list: &ChunkList, kind: Kind, n: usize) -> ChunkId {
    list.ids()
        .filter(|&id| list[id].kind == kind)
        .nth(n)
        .unwrap_or_else(|| panic!("no {n}-th {kind:?} chunk in the stream"))
}

/// First chunk with the given text.
pub fn find_text(list: &ChunkList, text: &str) -> ChunkId {
    list.ids()
        .find(|&id| list[id].text == text)
        .unwrap_or_else(|| panic!("no '{text}' chunk in the stream"))
}
