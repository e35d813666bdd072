//! The brace cleanup sweep.
//!
//! At the heart of the pass are two stacks. The parse frame tracks braces,
//! parens and complex statements (`if`/`else`/`switch`/`do`/`while`/...),
//! anything nestable. Complex statements go through stages; for
//! `if ( x ) { x--; }` the stack evolves like so:
//!
//! ```text
//! 'if'  [If:Paren1]
//! '('   [If:Paren1] [SParenOpen]
//! 'x'   [If:Paren1] [SParenOpen]
//! ')'   [If:Brace2]                 <- stage advanced
//! '{'   [If:Brace2] [BraceOpen]
//! 'x--;'[If:Brace2] [BraceOpen]
//! '}'   [If:Else]                   <- no else follows, statement closes
//! ```
//!
//! When the body of a stage-`Brace2` statement starts with anything but a
//! `{`, a virtual brace pair is synthesized around it so later passes can
//! treat braced and unbraced bodies uniformly.
//!
//! The frame itself sits on a frame list so that `#if`/`#else`/`#endif`
//! can fork and restore the scan state, and so `#define` bodies are parsed
//! in a private frame that cannot leak brace levels into the program.

use log::{trace, warn};
use oxc_diagnostics::OxcDiagnostic;

use crate::chunk::{Chunk, ChunkFlags, ChunkId, ChunkList};
use crate::diagnostics;
use crate::frame::{ParseFrame, Stage, StackEntry};
use crate::frame_list::FrameList;
use crate::kind::{Kind, PatternClass};
use crate::{CleanupOptions, CleanupReturn, Language};

/// Implementation of the pass. [`crate::BraceCleanup`] is the public
/// wrapper; the guts live here.
pub struct CleanupImpl<'a> {
    list: &'a mut ChunkList,
    language: Language,
    options: CleanupOptions,

    frames: FrameList,
    /// Directive kind of the preprocessor region being scanned.
    in_preproc: Kind,
    pp_level: u32,
    /// `pp_level` change applied when the current directive body ends.
    pp_pending: i32,
    /// Whether the current chunk was already counted as closing something.
    consumed: bool,

    warnings: Vec<OxcDiagnostic>,
}

impl<'a> CleanupImpl<'a> {
    pub fn new(list: &'a mut ChunkList, language: Language, options: CleanupOptions) -> Self {
        Self {
            list,
            language,
            options,
            frames: FrameList::new(),
            in_preproc: Kind::None,
            pp_level: 0,
            pp_pending: 0,
            consumed: false,
            warnings: Vec::new(),
        }
    }

    pub fn run(mut self) -> CleanupReturn {
        let mut frm = ParseFrame::new();
        let mut fatal = None;

        let mut cur = self.list.head();
        while let Some(mut pc) = cur {
            // Leaving a preprocessor region?
            if self.in_preproc != Kind::None
                && !self.list[pc].flags.contains(ChunkFlags::IN_PREPROC)
            {
                if self.in_preproc == Kind::PpDefine {
                    if self.options.pp_warn_unbalanced_if && frm.brace_level != 1 {
                        let line = self.list[pc].orig_line;
                        let d = diagnostics::unbalanced_define(frm.brace_level, line);
                        warn!("{d}");
                        self.warnings.push(d);
                    }
                    self.frames.pop_into(&mut frm);
                }
                self.in_preproc = Kind::None;
                self.pp_level = self.pp_level.saturating_add_signed(self.pp_pending);
                self.pp_pending = 0;
            }

            let pp_stamp = if self.list[pc].is(Kind::Preproc) {
                self.preproc_start(&mut frm, pc)
            } else {
                self.pp_level
            };
            frm.pp_level = self.pp_level;

            // Pawn ends statements at newlines; do this before the frame
            // values are stamped so the replacement chunk gets them.
            if self.language == Language::Pawn
                && frm.top().kind == Kind::VBraceOpen
                && self.list[pc].is(Kind::Newline)
            {
                pc = crate::pawn::check_vsemicolon(self.list, pc);
            }

            if self.list[pc].is(Kind::Namespace) {
                self.mark_namespace(pc);
            }

            // Assume the level won't change.
            {
                let chunk = &mut self.list[pc];
                chunk.level = frm.level;
                chunk.brace_level = frm.brace_level;
                chunk.pp_level = pp_stamp;
            }

            // #define bodies get the full treatment, including the leading
            // '#'; other directives only get levels stamped.
            if !self.list[pc].is_comment_or_newline()
                && !matches!(self.list[pc].kind, Kind::Attribute | Kind::Ignored)
                && matches!(self.in_preproc, Kind::PpDefine | Kind::None)
            {
                self.consumed = false;
                if let Err(diagnostic) = self.parse_cleanup(&mut frm, pc) {
                    warn!("{diagnostic}");
                    fatal = Some(diagnostic);
                    break;
                }
            }
            cur = self.list.next(pc);
        }

        CleanupReturn {
            warnings: self.warnings,
            fatal,
        }
    }

    /// Learn the directive kind behind a `#` and fork/restore frames.
    ///
    /// Returns the `pp_level` to stamp on the directive chunk itself.
    fn preproc_start(&mut self, frm: &mut ParseFrame, pc: ChunkId) -> u32 {
        let Some(next) = self.list.next_ncnnl(pc) else {
            return self.pp_level;
        };
        self.in_preproc = self.list[next].kind;

        if self.in_preproc != Kind::PpDefine {
            return self
                .frames
                .check(frm, &mut self.pp_level, &mut self.pp_pending, self.in_preproc);
        }

        // A #define body is brace-parsed in a private universe.
        self.frames.push(frm);
        *frm = ParseFrame::new();
        frm.level = 1;
        frm.brace_level = 1;
        frm.pp_level = self.pp_level;
        frm.push(StackEntry::new(Kind::PpDefine, Stage::None, None));
        self.pp_level
    }

    fn parse_cleanup(&mut self, frm: &mut ParseFrame, pc: ChunkId) -> Result<(), OxcDiagnostic> {
        trace!(
            "line {}: '{}' ({:?}), top {:?}:{:?}",
            self.list[pc].orig_line,
            self.list[pc].text,
            self.list[pc].kind,
            frm.top().kind,
            frm.top().stage,
        );

        // Mark statement and expression starts.
        let kind = self.list[pc].kind;
        if (frm.stmt_count == 0 || frm.expr_count == 0)
            && !self.list[pc].is_semicolon()
            && !matches!(
                kind,
                Kind::BraceClose
                    | Kind::VBraceClose
                    | Kind::ParenClose
                    | Kind::SParenClose
                    | Kind::FParenClose
                    | Kind::SquareClose
            )
        {
            let mut add = ChunkFlags::EXPR_START;
            if frm.stmt_count == 0 {
                add |= ChunkFlags::STMT_START;
            }
            self.list[pc].flags.insert(add);
        }
        frm.stmt_count += 1;
        frm.expr_count += 1;

        if frm.sparen_count > 0 {
            self.list[pc].flags.insert(ChunkFlags::IN_SPAREN);

            // Everything inside a for(...) is tagged.
            for idx in (0..frm.len() - 1).rev() {
                if frm.at(idx).kind == Kind::For {
                    self.list[pc].flags.insert(ChunkFlags::IN_FOR);
                    break;
                }
            }

            // The two semicolons directly inside a for(...) belong to it.
            if self.list[pc].is(Kind::Semicolon)
                && frm.len() > 2
                && frm.prev().is_some_and(|e| e.kind == Kind::For)
            {
                self.list[pc].parent_kind = Kind::For;
            }
        }

        // Check the progression of complex statements.
        if frm.top().stage != Stage::None
            && self.list[pc].kind != Kind::AutoreleasePool
            && self.check_complex_statements(frm, pc)?
        {
            return Ok(());
        }

        // A semicolon inside a virtual brace closes the statement; the
        // virtual close is picked up on the next time through the sweep.
        if frm.top().kind == Kind::VBraceOpen {
            if self.list[pc].is_semicolon() {
                self.consumed = true;
                self.close_statement(frm, pc)?;
            } else if matches!(self.language, Language::Pawn | Language::D)
                && self.list[pc].is(Kind::BraceClose)
            {
                self.close_statement(frm, pc)?;
            }
        }

        // Handle closers of every flavor.
        let kind = self.list[pc].kind;
        if matches!(
            kind,
            Kind::ParenClose
                | Kind::SParenClose
                | Kind::FParenClose
                | Kind::BraceClose
                | Kind::VBraceClose
                | Kind::AngleClose
                | Kind::MacroClose
                | Kind::SquareClose
        ) {
            // Refine a paren close to match a refined open.
            if matches!(frm.top().kind, Kind::FParenOpen | Kind::SParenOpen)
                && (kind == Kind::ParenClose || Some(kind) == frm.top().kind.closing())
            {
                if let Some(refined) = frm.top().kind.closing() {
                    self.list[pc].kind = refined;
                    if refined == Kind::SParenClose {
                        frm.sparen_count = frm.sparen_count.saturating_sub(1);
                        self.list[pc].flags.remove(ChunkFlags::IN_SPAREN);
                    }
                }
            }

            let kind = self.list[pc].kind;
            if frm.top().kind.closing() != Some(kind) {
                if self.list[pc].flags.contains(ChunkFlags::IN_PREPROC) {
                    // #if/#else branches frequently balance differently;
                    // tolerate the mismatch inside a directive.
                } else if matches!(frm.top().kind, Kind::Eof | Kind::PpDefine) {
                    let d = diagnostics::stray_closer(kind.to_str(), self.list[pc].span);
                    warn!("line {}: {d}", self.list[pc].orig_line);
                    self.warnings.push(d);
                } else {
                    let top = frm.top();
                    let (opener, opener_line) = match top.pc {
                        Some(id) => (self.list[id].kind.to_str(), self.list[id].orig_line),
                        None => (top.kind.to_str(), self.list[pc].orig_line),
                    };
                    return Err(diagnostics::mismatched_closer(
                        kind.to_str(),
                        opener,
                        opener_line,
                        self.list[pc].span,
                    ));
                }
            } else {
                self.consumed = true;

                // Copy the parent and update the levels.
                self.list[pc].parent_kind = frm.top().parent;
                frm.level = frm.level.saturating_sub(1);
                if matches!(kind, Kind::BraceClose | Kind::VBraceClose | Kind::MacroClose)
                    && frm.top().brace_bump
                {
                    frm.brace_level = frm.brace_level.saturating_sub(1);
                }
                self.list[pc].level = frm.level;
                self.list[pc].brace_level = frm.brace_level;
                frm.pop();

                // Frames are not created for plain function bodies. When one
                // closes directly inside a virtual block, push a kindless
                // entry so the generic close path unwinds the virtual brace.
                if frm.top().stage == Stage::None
                    && matches!(kind, Kind::VBraceClose | Kind::BraceClose)
                    && frm.top().pc.is_some_and(|id| self.list[id].is(Kind::VBraceOpen))
                {
                    let mut dummy = StackEntry::new(Kind::None, Stage::Brace2, None);
                    dummy.parent = frm.top().parent;
                    frm.push(dummy);
                }

                if frm.top().stage != Stage::None {
                    self.handle_complex_close(frm, pc)?;
                }
            }
        }

        // In this stage we expect a semicolon, but the close sparen lands
        // here too; `consumed` tells the two apart.
        if frm.top().stage == Stage::WodSemi {
            if self.consumed {
                // On the close sparen. Pawn statements may omit the
                // semicolon entirely; append a virtual one.
                if self.language == Language::Pawn {
                    let next = self.list.next_ncnnl(pc);
                    if !next.is_some_and(|n| self.list[n].is_semicolon()) {
                        crate::pawn::add_vsemi_after(self.list, pc);
                    }
                }
            } else {
                if self.list[pc].is_semicolon() {
                    self.consumed = true;
                    self.list[pc].parent_kind = Kind::WhileOfDo;
                } else {
                    return Err(diagnostics::expected_while_of_do_semicolon(
                        self.list[pc].kind.to_str(),
                        self.list[pc].span,
                    ));
                }
                self.handle_complex_close(frm, pc)?;
            }
        }

        // Derive the parent for paren and brace opens.
        let kind = self.list[pc].kind;
        let mut parent = self.list[pc].parent_kind;
        if matches!(
            kind,
            Kind::ParenOpen | Kind::FParenOpen | Kind::SParenOpen | Kind::BraceOpen
        ) {
            if let Some(prev) = self.list.prev_ncnnl(pc) {
                let prev_kind = self.list[prev].kind;
                if kind != Kind::BraceOpen {
                    match prev_kind {
                        Kind::If
                        | Kind::Constexpr
                        | Kind::ElseIf
                        | Kind::While
                        | Kind::WhileOfDo
                        | Kind::Do
                        | Kind::For
                        | Kind::Switch
                        | Kind::Catch
                        | Kind::Synchronized
                        | Kind::DVersion
                        | Kind::DVersionIf
                        | Kind::DScope
                        | Kind::DScopeIf => {
                            self.list[pc].kind = Kind::SParenOpen;
                            parent = frm.top().kind;
                            frm.sparen_count += 1;
                        }
                        Kind::Function => {
                            self.list[pc].kind = Kind::FParenOpen;
                            parent = Kind::Function;
                        }
                        // NS_ENUM and NS_OPTIONS are followed by a
                        // (type, name) pair.
                        Kind::Enum if self.language == Language::ObjectiveC => {
                            self.list[pc].kind = Kind::FParenOpen;
                            parent = Kind::Enum;
                        }
                        Kind::Declspec => {
                            parent = Kind::Declspec;
                        }
                        _ => {}
                    }
                } else if frm.top().stage != Stage::None {
                    parent = frm.top().kind;
                } else if prev_kind == Kind::Assign && self.list[prev].text.starts_with('=') {
                    parent = Kind::Assign;
                } else if prev_kind == Kind::Return && self.language == Language::Cpp {
                    parent = Kind::Return;
                } else if prev_kind == Kind::FParenClose
                    && self.language == Language::ObjectiveC
                    && self.list[prev].parent_kind == Kind::Enum
                {
                    parent = Kind::Enum;
                } else if prev_kind == Kind::FParenClose {
                    parent = Kind::Function;
                }
            }
        }

        // Adjust the level for opens and create a stack entry. A freshly
        // synthesized virtual open never reaches this point; one revisited
        // from the stream is pushed like a real brace.
        let kind = self.list[pc].kind;
        if matches!(
            kind,
            Kind::BraceOpen
                | Kind::ParenOpen
                | Kind::FParenOpen
                | Kind::SParenOpen
                | Kind::VBraceOpen
                | Kind::AngleOpen
                | Kind::MacroOpen
                | Kind::SquareOpen
        ) {
            frm.level += 1;

            let mut bumped = false;
            if matches!(kind, Kind::BraceOpen | Kind::MacroOpen | Kind::VBraceOpen) {
                // A namespace nested directly in another namespace may share
                // its indent level.
                let mut single = false;
                if self.list[pc].parent_kind == Kind::Namespace
                    && self.options.indent_namespace
                    && self.options.indent_namespace_single_indent
                {
                    if let Some(top_pc) = frm.top().pc {
                        if self.list[top_pc].parent_kind == Kind::Namespace {
                            single = true;
                        }
                    }
                }
                if !single {
                    frm.brace_level += 1;
                    bumped = true;
                }
            }

            let mut entry = StackEntry::new(kind, Stage::None, Some(pc));
            entry.parent = parent;
            entry.brace_bump = bumped;
            frm.push(entry);
            self.list[pc].parent_kind = parent;
        }

        // Link switch braces, labels and breaks back to their statement.
        if self.list[pc].is(Kind::BraceOpen) && self.list[pc].parent_kind == Kind::Switch {
            self.link_to_entry_below_top(frm, pc);
        }
        if matches!(self.list[pc].kind, Kind::Case | Kind::Default) {
            let prev_is_assign = self
                .list
                .prev_ncnnl(pc)
                .is_some_and(|p| self.list[p].is(Kind::Assign));
            // 'default' after '=' is a default value, not a label
            if self.list[pc].is(Kind::Case) || !prev_is_assign {
                self.list[pc].parent_kind = Kind::Switch;
                self.link_to_entry_below_top(frm, pc);
            }
        }
        if self.list[pc].is(Kind::Break) {
            self.link_to_entry_below_top(frm, pc);
        }

        // Create a stack entry for complex statements.
        let kind = self.list[pc].kind;
        match kind.pattern_class() {
            PatternClass::Braced => {
                let stage = if kind == Kind::Do { Stage::BraceDo } else { Stage::Brace2 };
                let mut entry = StackEntry::new(kind, stage, Some(pc));
                entry.parent = self.list[pc].parent_kind;
                frm.push(entry);
            }
            PatternClass::ParenBraced => {
                let mut stage = Stage::Paren1;
                let mut entry_kind = kind;
                if kind == Kind::While && self.maybe_while_of_do(pc) {
                    self.list[pc].kind = Kind::WhileOfDo;
                    entry_kind = Kind::WhileOfDo;
                    stage = Stage::WodParen;
                }
                let mut entry = StackEntry::new(entry_kind, stage, Some(pc));
                entry.parent = self.list[pc].parent_kind;
                frm.push(entry);
            }
            PatternClass::OpParenBraced => {
                let mut entry = StackEntry::new(kind, Stage::OpParen1, Some(pc));
                entry.parent = self.list[pc].parent_kind;
                frm.push(entry);
            }
            PatternClass::Else => {
                let mut entry = StackEntry::new(kind, Stage::ElseIf, Some(pc));
                entry.parent = self.list[pc].parent_kind;
                frm.push(entry);
            }
            PatternClass::None => {}
        }

        // Statement boundaries: after braces, after ';' outside parens,
        // after the '(' of a for.
        let kind = self.list[pc].kind;
        if kind == Kind::SquareOpen
            || (kind == Kind::BraceOpen && self.list[pc].parent_kind != Kind::Assign)
            || matches!(kind, Kind::BraceClose | Kind::VBraceClose)
            || (kind == Kind::SParenOpen && self.list[pc].parent_kind == Kind::For)
            || matches!(kind, Kind::Colon | Kind::OcEnd | Kind::Macro)
            || (self.list[pc].is_semicolon()
                && !matches!(
                    frm.top().kind,
                    Kind::ParenOpen | Kind::FParenOpen | Kind::SParenOpen
                ))
        {
            frm.stmt_count = 0;
            frm.expr_count = 0;
        }

        // Expression boundaries.
        let next_sig = self.list.next_ncnnl(pc);
        if matches!(
            kind,
            Kind::Arith
                | Kind::Shift
                | Kind::Assign
                | Kind::Case
                | Kind::Compare
                | Kind::Bool
                | Kind::Minus
                | Kind::Plus
                | Kind::Caret
                | Kind::AngleOpen
                | Kind::AngleClose
                | Kind::Return
                | Kind::Throw
                | Kind::Goto
                | Kind::Continue
                | Kind::ParenOpen
                | Kind::FParenOpen
                | Kind::SParenOpen
                | Kind::BraceOpen
                | Kind::Comma
                | Kind::Not
                | Kind::Inv
                | Kind::Colon
                | Kind::Question
        ) || (kind == Kind::Star && !next_sig.is_some_and(|n| self.list[n].is(Kind::Star)))
            || self.list[pc].is_semicolon()
        {
            frm.expr_count = 0;
        }
        Ok(())
    }

    /// Attach `pc` to the chunk owning the entry directly under the top:
    /// the `switch` for its brace, labels and breaks.
    fn link_to_entry_below_top(&mut self, frm: &ParseFrame, pc: ChunkId) {
        if frm.len() >= 2 {
            if let Some(saved) = frm.at(frm.len() - 2).pc {
                self.list[pc].parent = Some(saved);
            }
        }
    }

    /// Advance the stage of the statement at the top of the stack based on
    /// the chunk just seen.
    ///
    /// Returns `Ok(true)` when the chunk was fully handled here.
    fn check_complex_statements(
        &mut self,
        frm: &mut ParseFrame,
        pc: ChunkId,
    ) -> Result<bool, OxcDiagnostic> {
        // An optional paren turns into a real paren or starts the body.
        if frm.top().stage == Stage::OpParen1 {
            frm.top_mut().stage =
                if matches!(self.list[pc].kind, Kind::ParenOpen | Kind::SParenOpen) {
                    Stage::Paren1
                } else {
                    Stage::Brace2
                };
        }

        // else after if?
        while frm.top().stage == Stage::Else {
            if self.list[pc].is(Kind::Else) {
                frm.top_mut().kind = Kind::Else;
                frm.top_mut().stage = Stage::ElseIf;
                return Ok(true);
            }
            // No else: drop the if and close the statement.
            frm.pop();
            if self.close_statement(frm, pc)? {
                return Ok(true);
            }
        }

        // if directly after else fuses into a single else-if.
        if frm.top().stage == Stage::ElseIf {
            let kind = self.list[pc].kind;
            let newline_between = self
                .list
                .prev_nc(pc)
                .is_some_and(|p| self.list[p].is(Kind::Newline));
            if kind == Kind::ElseIf
                || (kind == Kind::If && (!self.options.indent_else_if || !newline_between))
            {
                self.list[pc].kind = Kind::ElseIf;
                frm.top_mut().kind = Kind::ElseIf;
                frm.top_mut().stage = Stage::Paren1;
                return Ok(true);
            }
            frm.top_mut().stage = Stage::Brace2;
        }

        // catch or finally after try/catch?
        while frm.top().stage == Stage::Catch {
            let kind = self.list[pc].kind;
            if matches!(kind, Kind::Catch | Kind::Finally) {
                frm.top_mut().kind = kind;
                frm.top_mut().stage = if kind == Kind::Finally {
                    Stage::Brace2
                } else if self.language == Language::CSharp {
                    // the C# expression after catch is optional
                    Stage::CatchWhen
                } else {
                    Stage::Paren1
                };
                return Ok(true);
            }
            frm.pop();
            if self.close_statement(frm, pc)? {
                return Ok(true);
            }
        }

        // Optional paren and optional when-filter after a C# catch.
        if frm.top().stage == Stage::CatchWhen {
            let kind = self.list[pc].kind;
            if matches!(kind, Kind::ParenOpen | Kind::SParenOpen) {
                self.list[pc].kind = Kind::SParenOpen;
                frm.top_mut().kind = Kind::SParenOpen;
                frm.top_mut().stage = Stage::Paren1;
                return Ok(false);
            }
            if kind == Kind::When {
                frm.top_mut().kind = Kind::When;
                frm.top_mut().stage = Stage::OpParen1;
                return Ok(true);
            }
            if kind == Kind::BraceOpen {
                frm.top_mut().stage = Stage::Brace2;
                return Ok(false);
            }
        }

        // The while closing a do is mandatory.
        if frm.top().stage == Stage::While {
            let kind = self.list[pc].kind;
            if matches!(kind, Kind::While | Kind::WhileOfDo) {
                self.list[pc].kind = Kind::WhileOfDo;
                frm.top_mut().kind = Kind::WhileOfDo;
                frm.top_mut().stage = Stage::WodParen;
                return Ok(true);
            }
            frm.pop();
            return Err(diagnostics::expected_while(
                kind.to_str(),
                self.list[pc].span,
            ));
        }

        // The body starts without a '{': wrap it in a virtual brace.
        // Never inside a preprocessor directive, and a revisited virtual
        // open is pushed by the regular opener path instead.
        if matches!(frm.top().stage, Stage::Brace2 | Stage::BraceDo)
            && !matches!(self.list[pc].kind, Kind::BraceOpen | Kind::VBraceOpen)
            && !self.list[pc].flags.contains(ChunkFlags::IN_PREPROC)
        {
            if self.language == Language::CSharp
                && self.list[pc].is(Kind::UsingStmt)
                && !self.options.indent_using_block
            {
                // leave the using block unindented
            } else {
                let parent = frm.top().kind;
                if let Some(vbrace) = self.insert_vbrace_open_before(pc, frm) {
                    self.list[vbrace].parent_kind = parent;

                    frm.level += 1;
                    frm.brace_level += 1;

                    let mut entry = StackEntry::new(Kind::VBraceOpen, Stage::None, Some(vbrace));
                    entry.parent = parent;
                    entry.brace_bump = true;
                    frm.push(entry);

                    self.list[pc].level = frm.level;
                    self.list[pc].brace_level = frm.brace_level;

                    // The wrapped chunk starts a statement.
                    frm.stmt_count = 1;
                    frm.expr_count = 1;
                    self.list[pc].flags
                        .insert(ChunkFlags::STMT_START | ChunkFlags::EXPR_START);
                }
            }
        }

        // constexpr may sit between if/else-if and its paren.
        if frm.top().stage == Stage::Paren1
            && matches!(frm.top().kind, Kind::If | Kind::ElseIf)
            && self.list[pc].is(Kind::Constexpr)
        {
            return Ok(false);
        }

        // From here the statement paren is mandatory.
        if matches!(frm.top().stage, Stage::Paren1 | Stage::WodParen)
            && !matches!(self.list[pc].kind, Kind::ParenOpen | Kind::SParenOpen)
        {
            let statement = frm.top().kind.to_str();
            frm.pop();
            return Err(diagnostics::expected_paren(
                statement,
                self.list[pc].kind.to_str(),
                self.list[pc].span,
            ));
        }
        Ok(false)
    }

    /// A close paren or brace was consumed: progress the stage, and close
    /// the whole statement when its end was hit.
    fn handle_complex_close(
        &mut self,
        frm: &mut ParseFrame,
        pc: ChunkId,
    ) -> Result<bool, OxcDiagnostic> {
        match frm.top().stage {
            Stage::Paren1 => {
                if self
                    .list
                    .next_ncnnl(pc)
                    .is_some_and(|n| self.list[n].is(Kind::When))
                {
                    frm.top_mut().kind = self.list[pc].kind;
                    frm.top_mut().stage = Stage::CatchWhen;
                    return Ok(true);
                }
                frm.top_mut().stage = Stage::Brace2;
            }
            Stage::Brace2 => match frm.top().kind {
                Kind::If | Kind::ElseIf => {
                    frm.top_mut().stage = Stage::Else;
                    let next = self.list.next_ncnnl(pc);
                    if !next.is_some_and(|n| self.list[n].is(Kind::Else)) {
                        frm.pop();
                        return self.close_statement(frm, pc);
                    }
                }
                Kind::Try | Kind::Catch => {
                    frm.top_mut().stage = Stage::Catch;
                    let next = self.list.next_ncnnl(pc);
                    if !next
                        .is_some_and(|n| matches!(self.list[n].kind, Kind::Catch | Kind::Finally))
                    {
                        frm.pop();
                        return self.close_statement(frm, pc);
                    }
                }
                _ => {
                    frm.pop();
                    return self.close_statement(frm, pc);
                }
            },
            Stage::BraceDo => {
                frm.top_mut().stage = Stage::While;
            }
            Stage::WodParen => {
                frm.top_mut().stage = Stage::WodSemi;
            }
            Stage::WodSemi => {
                frm.pop();
                return self.close_statement(frm, pc);
            }
            _ => {
                return Err(diagnostics::broken_statement_stage(
                    frm.top().kind.to_str(),
                    self.list[pc].span,
                ));
            }
        }
        Ok(false)
    }

    /// A statement just ended and the stack was popped.
    ///
    /// If the new top is a virtual brace, synthesize its close and recurse;
    /// if it is a complex statement, advance it. Terminates because every
    /// recursive call pops at least one entry.
    fn close_statement(&mut self, frm: &mut ParseFrame, pc: ChunkId) -> Result<bool, OxcDiagnostic> {
        if self.consumed {
            frm.stmt_count = 0;
            frm.expr_count = 0;
        }

        if frm.top().kind == Kind::VBraceOpen {
            if self.consumed {
                // The terminator was consumed: append the virtual close
                // after it, unless a revisited one is already there. It is
                // swept, and pops the entry, on the next time through.
                let next = self.list.next_ncnnl(pc);
                if !next.is_some_and(|n| self.list[n].is(Kind::VBraceClose)) {
                    self.insert_vbrace_close_after(pc, frm);
                }
            } else {
                // Unconsumed: the close lands before the current chunk and
                // the entry pops right here.
                let Some(anchor) = self.list.prev_ncnnl(pc) else {
                    return Ok(false);
                };
                frm.level = frm.level.saturating_sub(1);
                if frm.top().brace_bump {
                    frm.brace_level = frm.brace_level.saturating_sub(1);
                }
                let parent = frm.top().parent;
                let vbc = self.insert_vbrace_close_after(anchor, frm);
                self.list[vbc].parent_kind = parent;
                frm.pop();

                self.list[pc].level = frm.level;
                self.list[pc].brace_level = frm.brace_level;

                self.close_statement(frm, pc)?;
                return Ok(true);
            }
        }

        if frm.top().stage != Stage::None && self.handle_complex_close(frm, pc)? {
            return Ok(true);
        }
        Ok(false)
    }

    /// Synthesize a `VBRACE_CLOSE` right after `pc`.
    fn insert_vbrace_close_after(&mut self, pc: ChunkId, frm: &ParseFrame) -> ChunkId {
        let anchor = &self.list[pc];
        let mut chunk = Chunk::new(Kind::VBraceClose, "");
        chunk.parent_kind = frm.top().kind;
        chunk.orig_line = anchor.orig_line;
        chunk.orig_col = anchor.orig_col;
        chunk.column = anchor.column;
        chunk.level = frm.level;
        chunk.brace_level = frm.brace_level;
        chunk.pp_level = frm.pp_level;
        chunk.flags = anchor.flags & ChunkFlags::COPY;
        self.list.insert_after(pc, chunk)
    }

    /// Synthesize a `VBRACE_OPEN` before `pc`.
    ///
    /// Rewinds over comments and newlines, pulling them into the virtual
    /// block by bumping their levels, but never crosses a preprocessor
    /// boundary in either direction.
    fn insert_vbrace_open_before(&mut self, pc: ChunkId, frm: &ParseFrame) -> Option<ChunkId> {
        let mut chunk = Chunk::new(Kind::VBraceOpen, "");
        chunk.parent_kind = frm.top().kind;
        chunk.level = frm.level;
        chunk.brace_level = frm.brace_level;
        chunk.flags = self.list[pc].flags & ChunkFlags::COPY;

        let mut anchor = self.list.prev(pc)?;
        if !self.list[anchor].flags.contains(ChunkFlags::IN_PREPROC) {
            chunk.flags.remove(ChunkFlags::IN_PREPROC);
        }
        let prev_is_comment = self.list[anchor].is(Kind::Comment);

        while self.list[anchor].is_comment_or_newline() {
            self.list[anchor].level += 1;
            self.list[anchor].brace_level += 1;
            anchor = self.list.prev(anchor)?;
        }

        // Don't back into a preprocessor directive from regular code.
        if !self.list[pc].flags.contains(ChunkFlags::IN_PREPROC)
            && self.list[anchor].flags.contains(ChunkFlags::IN_PREPROC)
        {
            if self.list[anchor].is(Kind::PreprocBody) {
                while self.list[anchor].flags.contains(ChunkFlags::IN_PREPROC) {
                    anchor = self.list.prev(anchor)?;
                }
            } else {
                anchor = self.list.next(anchor)?;
                if self.list[anchor].is(Kind::Comment) {
                    anchor = self.list.next_nc(anchor)?;
                }
            }
        }

        // A comment hugging the body stays outside the virtual block.
        if prev_is_comment {
            anchor = self.list.next(anchor)?;
        }

        let a = &self.list[anchor];
        chunk.orig_line = a.orig_line;
        chunk.orig_col = a.orig_col;
        chunk.column = a.column + a.text.len() as u32 + 1;
        chunk.pp_level = a.pp_level;
        trace!(
            "virtual brace open before '{}' on line {}",
            self.list[pc].text,
            self.list[pc].orig_line
        );
        Some(self.list.insert_after(anchor, chunk))
    }

    /// A `while` closes a `do` when the code just before it, inside a macro
    /// body, ends with a `do`-parented block.
    fn maybe_while_of_do(&self, pc: ChunkId) -> bool {
        let Some(prev) = self.list.prev_ncnnl(pc) else {
            return false;
        };
        if !self.list[prev].flags.contains(ChunkFlags::IN_PREPROC) {
            return false;
        }
        matches!(self.list[prev].kind, Kind::VBraceClose | Kind::BraceClose)
            && self.list[prev].parent_kind == Kind::Do
    }

    /// Walk a `namespace`, stamping the parent on everything up to the
    /// block or the terminating semicolon of a directive/alias.
    fn mark_namespace(&mut self, pns: ChunkId) {
        let mut is_using = false;
        if let Some(prev) = self.list.prev_ncnnl(pns) {
            if self.list[prev].is(Kind::Using) {
                is_using = true;
                self.list[pns].parent_kind = Kind::Using;
            }
        }

        let mut cur = self.list.next_ncnnl(pns);
        while let Some(pc) = cur {
            self.list[pc].parent_kind = Kind::Namespace;
            if !self.list[pc].is(Kind::BraceOpen) {
                if self.list[pc].is(Kind::Semicolon) {
                    if is_using {
                        self.list[pc].parent_kind = Kind::Using;
                    }
                    return;
                }
                cur = self.list.next_ncnnl(pc);
                continue;
            }

            if self.options.indent_namespace_limit > 0 {
                if let Some(close) = self.list.closing_match(pc) {
                    let lines = self.list[close]
                        .orig_line
                        .saturating_sub(self.list[pc].orig_line)
                        .saturating_sub(1);
                    if lines > self.options.indent_namespace_limit {
                        self.list[pc].flags.insert(ChunkFlags::LONG_BLOCK);
                        self.list[close].flags.insert(ChunkFlags::LONG_BLOCK);
                    }
                }
            }
            self.list
                .flag_parens(pc, ChunkFlags::IN_NAMESPACE, Kind::Namespace);
            return;
        }
    }
}
