//! Brace and parenthesis level cleanup for the cfmt beautifier.
//!
//! This pass runs between the tokenizer and every formatting stage. It
//! walks the chunk list once, head to tail, and
//!
//! - assigns the bracket nesting [`level`], the curly [`brace_level`] and
//!   the preprocessor [`pp_level`] of every chunk;
//! - attaches open/close brackets to the construct they belong to via
//!   `parent_kind` (function call, `if`, `for`, `switch`, namespace, ...);
//! - synthesizes [`Kind::VBraceOpen`]/[`Kind::VBraceClose`] pairs around
//!   unbraced bodies (`if (x) y;`) so later passes can treat braced and
//!   unbraced bodies uniformly;
//! - refines ambiguous kinds: a bare `(` becomes a statement or function
//!   paren, the `while` of a `do` loop becomes [`Kind::WhileOfDo`], an `if`
//!   fuses with its `else`, `case`/`default`/`break` are linked to their
//!   `switch`;
//! - snapshots the scan state across `#if`/`#else`/`#endif` and parses
//!   `#define` bodies in isolation.
//!
//! # Usage
//!
//! Build a [`ChunkList`] (normally the tokenizer's output), then run the
//! pass over it in place:
//!
//! ```rust
//! use cfmt_braces::{BraceCleanup, Chunk, ChunkList, Kind, Language};
//!
//! // if (x) y;
//! let mut list = ChunkList::new();
//! for (kind, text) in [
//!     (Kind::If, "if"),
//!     (Kind::ParenOpen, "("),
//!     (Kind::Word, "x"),
//!     (Kind::ParenClose, ")"),
//!     (Kind::Word, "y"),
//!     (Kind::Semicolon, ";"),
//! ] {
//!     list.push_back(Chunk::new(kind, text));
//! }
//!
//! let ret = BraceCleanup::new(&mut list, Language::C).run();
//! assert!(ret.fatal.is_none());
//!
//! let kinds: Vec<Kind> = list.ids().map(|id| list[id].kind).collect();
//! assert!(kinds.contains(&Kind::VBraceOpen));
//! assert!(kinds.contains(&Kind::VBraceClose));
//! ```
//!
//! # Errors
//!
//! Structurally unbalanced input outside a preprocessor region is not
//! recovered: the pass stops and reports the problem in
//! [`CleanupReturn::fatal`]. Producing subtly wrong level information on
//! malformed input would silently corrupt the rest of the pipeline, so the
//! embedding driver is expected to abort with [`EX_SOFTWARE`]. Mismatches
//! inside `#if`/`#else` branches are tolerated, since the branches often
//! balance differently.
//!
//! [`level`]: Chunk::level
//! [`brace_level`]: Chunk::brace_level
//! [`pp_level`]: Chunk::pp_level

#![warn(missing_docs)]

mod chunk;
mod cleanup;
mod diagnostics;
mod frame;
mod frame_list;
mod kind;
mod pawn;

use oxc_diagnostics::OxcDiagnostic;

pub use crate::chunk::{Chunk, ChunkFlags, ChunkId, ChunkList};
pub use crate::kind::{Kind, PatternClass};

/// BSD `sysexits` code the embedding driver should exit with on an
/// unrecoverable structural error.
pub const EX_SOFTWARE: i32 = 70;

/// Source language of the chunk stream.
///
/// Consulted at a handful of decision points only: Pawn virtual
/// semicolons, the D virtual close on `}`, the Objective-C `NS_ENUM`
/// parent, the C# `catch`/`when` variant, and the C++-only `return {...}`
/// parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    /// C.
    #[default]
    C,
    /// C++.
    Cpp,
    /// C#.
    CSharp,
    /// D.
    D,
    /// Java.
    Java,
    /// Objective-C.
    ObjectiveC,
    /// Pawn.
    Pawn,
    /// Vala.
    Vala,
}

/// The options this pass consults.
///
/// The full option schema lives with the surrounding driver; only the
/// handful of knobs read here are modeled.
#[derive(Debug, Clone, Copy)]
pub struct CleanupOptions {
    /// Warn when a `#define` body ends with unbalanced braces.
    pub pp_warn_unbalanced_if: bool,
    /// Whether namespace bodies are indented at all.
    pub indent_namespace: bool,
    /// With [`CleanupOptions::indent_namespace`], a namespace nested
    /// directly inside another namespace shares its indent level.
    pub indent_namespace_single_indent: bool,
    /// Line count past which a namespace block is flagged
    /// [`ChunkFlags::LONG_BLOCK`]. Zero disables the check.
    pub indent_namespace_limit: u32,
    /// Keep `else` and `if` separate when a newline sits between them.
    pub indent_else_if: bool,
    /// In C#, whether an unbraced `using (...)` body is virtual-braced.
    pub indent_using_block: bool,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            pp_warn_unbalanced_if: true,
            indent_namespace: false,
            indent_namespace_single_indent: false,
            indent_namespace_limit: 0,
            indent_else_if: false,
            indent_using_block: true,
        }
    }
}

/// Result of a [`BraceCleanup::run`].
#[derive(Debug, Default)]
pub struct CleanupReturn {
    /// Recoverable oddities: stray closers at the top level, unbalanced
    /// `#define` bodies. Processing continued past each of these.
    pub warnings: Vec<OxcDiagnostic>,
    /// The structural error that stopped the pass, if any. The chunk list
    /// is left in a partially processed state when this is set.
    pub fatal: Option<OxcDiagnostic>,
}

impl CleanupReturn {
    /// Exit code for an embedding driver: [`EX_SOFTWARE`] when the pass
    /// stopped on a structural error, 0 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.fatal.is_some() {
            EX_SOFTWARE
        } else {
            0
        }
    }
}

/// The brace cleanup pass.
///
/// See [`BraceCleanup::run`] and the [module documentation](crate).
pub struct BraceCleanup<'a> {
    list: &'a mut ChunkList,
    language: Language,
    options: CleanupOptions,
}

impl<'a> BraceCleanup<'a> {
    /// Create the pass over a chunk list.
    pub fn new(list: &'a mut ChunkList, language: Language) -> Self {
        Self {
            list,
            language,
            options: CleanupOptions::default(),
        }
    }

    /// Set the options consulted by the pass.
    #[must_use]
    pub fn with_options(mut self, options: CleanupOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the sweep, mutating the chunk list in place.
    pub fn run(self) -> CleanupReturn {
        cleanup::CleanupImpl::new(self.list, self.language, self.options).run()
    }
}
