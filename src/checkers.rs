// checkers.rs - Independent analysis passes over the parse tree.
//
// Each checker is a pure function appending diagnostics; none of them may
// mutate the tree. The dispatcher runs every registered checker against the
// same tree and converts a panicking checker into a synthetic "999"
// diagnostic, so one broken check never blocks the rest.
//
// Diagnostic codes are a versioned contract; never reassign one to a
// different meaning.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use memchr::memchr;

use crate::charclass::{build_output, charclass_score, simplify_charclass, ClassEntry};
use crate::chars::{char_category, esc};
use crate::flags::PatternFlags;
use crate::parser::{width, ClassItem, NodeId, NodeKind, ParseTree};
use crate::tokenizer::TokenKind;

// === Diagnostics ===

/// Severity of one finding. Ordering: Info < Warning < Error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// One finding: stable three-digit code, severity, raw byte offset, text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: &'static str,
    pub severity: Severity,
    pub position: usize,
    pub message: String,
}

impl Diagnostic {
    fn new(code: &'static str, severity: Severity, position: usize, message: impl Into<String>) -> Self {
        Diagnostic {
            code,
            severity,
            position,
            message: message.into(),
        }
    }
}

impl PartialOrd for Diagnostic {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Diagnostic {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.severity, self.code, self.position)
            .cmp(&(other.severity, other.code, other.position))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}:{}",
            &self.severity.to_string()[..1],
            self.code,
            self.position,
            self.message
        )
    }
}

/// What the caller expects each capture group to feed, in group order.
/// `Ignore` marks a group whose content the caller discards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupHint {
    Token,
    Ignore,
}

// === Registry ===

type CheckerFn = fn(&ParseTree, &mut Vec<Diagnostic>, Option<&[GroupHint]>);

/// One entry in the static checker registry.
pub struct CheckerDescriptor {
    pub name: &'static str,
    pub run: CheckerFn,
    /// Whether the checker needs the expected-groups sequence; it is
    /// skipped when the caller passes none.
    pub wants_groups: bool,
}

macro_rules! checker {
    ($name:ident) => {
        CheckerDescriptor {
            name: stringify!($name),
            run: $name,
            wants_groups: false,
        }
    };
    ($name:ident, groups) => {
        CheckerDescriptor {
            name: stringify!($name),
            run: $name,
            wants_groups: true,
        }
    };
}

/// Every checker, in a fixed order. Replaces run-everything-by-prefix
/// reflection with an explicit list.
pub static REGISTRY: &[CheckerDescriptor] = &[
    checker!(check_no_nulls),
    checker!(check_no_newlines),
    checker!(check_no_empty_alternations),
    checker!(check_charclass_homogeneous_ranges),
    checker!(check_prefix_ordering),
    checker!(check_no_bels),
    checker!(check_no_consecutive_dots),
    checker!(check_bad_flags),
    checker!(check_suspicious_anchors),
    checker!(check_single_character_classes),
    checker!(check_charclass_overlap),
    checker!(check_charclass_len),
    checker!(check_charclass_negation),
    checker!(check_multiline_anchors),
    checker!(check_charclass_case_insensitive_overlap),
    checker!(check_charclass_simplify),
    checker!(check_unescaped_braces),
    checker!(check_redundant_repetition),
    checker!(check_expected_groups_named, groups),
    checker!(check_expected_groups_count, groups),
    checker!(check_expected_groups_overlap, groups),
    checker!(check_expected_groups_repetition, groups),
];

/// Run every registered checker. Group-aware checkers only run when
/// `expected_groups` is given.
pub fn run_all_checkers(
    tree: &ParseTree,
    expected_groups: Option<&[GroupHint]>,
) -> Vec<Diagnostic> {
    run_checkers(tree, expected_groups, None)
}

/// Run the registry with an optional name filter (`only`). A checker that
/// panics is converted into a synthetic "999" diagnostic naming it.
pub fn run_checkers(
    tree: &ParseTree,
    expected_groups: Option<&[GroupHint]>,
    only: Option<&str>,
) -> Vec<Diagnostic> {
    run_registry(REGISTRY, tree, expected_groups, only)
}

fn run_registry(
    registry: &[CheckerDescriptor],
    tree: &ParseTree,
    expected_groups: Option<&[GroupHint]>,
    only: Option<&str>,
) -> Vec<Diagnostic> {
    let mut errs = Vec::new();
    for desc in registry {
        if desc.wants_groups && expected_groups.is_none() {
            continue;
        }
        if let Some(name) = only {
            if desc.name != name {
                continue;
            }
        }
        let run = desc.run;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            run(tree, &mut errs, expected_groups);
        }));
        if let Err(payload) = outcome {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic".to_string());
            errs.push(Diagnostic::new(
                "999",
                Severity::Error,
                0,
                format!("Checker {} encountered error parsing: {}", desc.name, detail),
            ));
        }
    }
    errs
}

// === Tree helpers ===

fn by_kind<'t>(
    tree: &'t ParseTree,
    pred: impl Fn(NodeKind) -> bool + 't,
) -> impl Iterator<Item = NodeId> + 't {
    tree.walk().filter(move |&id| pred(tree.node(id).kind))
}

fn leaves_of<'t>(tree: &'t ParseTree, kind: TokenKind) -> impl Iterator<Item = NodeId> + 't {
    by_kind(tree, move |k| k == NodeKind::Leaf(kind))
}

fn charclasses<'t>(tree: &'t ParseTree) -> impl Iterator<Item = NodeId> + 't {
    by_kind(tree, |k| k == NodeKind::CharClass)
}

fn capturing_groups(tree: &ParseTree) -> Vec<NodeId> {
    by_kind(tree, |k| {
        k == NodeKind::Group(crate::parser::GroupKind::Capturing)
    })
    .collect()
}

/// Whether a node can consume characters; `None` means descend.
fn has_width(tree: &ParseTree, id: NodeId) -> Option<bool> {
    width(tree.node(id).kind)
}

/// First node between `first` and `second` where `f` answers true. A false
/// answer whitelists the node and its whole subtree; `None` descends.
fn find_bad_between(
    tree: &ParseTree,
    first: Option<NodeId>,
    second: Option<NodeId>,
    f: impl Fn(&ParseTree, NodeId) -> Option<bool>,
) -> Option<NodeId> {
    let mut good: Option<NodeId> = None;
    for j in tree.between(first, second) {
        if let Some(g) = good {
            if tree.is_descendant_of(j, g) {
                continue;
            }
        }
        match f(tree, j) {
            Some(true) => return Some(j),
            Some(false) => good = Some(j),
            None => {}
        }
    }
    None
}

fn is_open_kind(kind: NodeKind) -> bool {
    matches!(kind, NodeKind::Group(_) | NodeKind::Leaf(TokenKind::ExistsNamed))
}

fn is_anchor_kind(kind: NodeKind) -> bool {
    matches!(kind, NodeKind::Leaf(k) if k.is_anchor())
}

// === Checkers ===

fn check_no_nulls(tree: &ParseTree, errs: &mut Vec<Diagnostic>, _: Option<&[GroupHint]>) {
    if let Some(pos) = memchr(0x00, tree.raw.as_bytes()) {
        errs.push(Diagnostic::new(
            "101",
            Severity::Error,
            pos,
            "Null characters not allowed; use \\x00 instead",
        ));
    }
}

fn check_no_newlines(tree: &ParseTree, errs: &mut Vec<Diagnostic>, _: Option<&[GroupHint]>) {
    // verbose mode strips bare newlines anyway
    if tree.effective_flags.contains(PatternFlags::VERBOSE) {
        return;
    }
    if let Some(pos) = memchr(b'\n', tree.raw.as_bytes()) {
        errs.push(Diagnostic::new(
            "102",
            Severity::Error,
            pos,
            "Newline characters not allowed; use \\n instead",
        ));
    }
}

fn check_no_bels(tree: &ParseTree, errs: &mut Vec<Diagnostic>, _: Option<&[GroupHint]>) {
    if let Some(pos) = memchr(0x08, tree.raw.as_bytes()) {
        errs.push(Diagnostic::new(
            "110",
            Severity::Error,
            pos,
            "You probably don't want a backspace; use \\x08 instead",
        ));
    }
}

fn check_no_empty_alternations(
    tree: &ParseTree,
    errs: &mut Vec<Diagnostic>,
    _: Option<&[GroupHint]>,
) {
    for id in by_kind(tree, |k| k == NodeKind::Progression) {
        let empty = tree.children(id).is_empty();
        let in_alternation = tree
            .parent(id)
            .map(|p| tree.node(p).kind == NodeKind::Alternation)
            .unwrap_or(false);
        if empty && in_alternation {
            let pos = tree.node(id).start;
            errs.push(Diagnostic::new(
                "103",
                Severity::Error,
                pos,
                format!(
                    "Empty string allowed in alternation starting at position {}, use ?",
                    pos
                ),
            ));
        }
    }
}

fn check_charclass_homogeneous_ranges(
    tree: &ParseTree,
    errs: &mut Vec<Diagnostic>,
    _: Option<&[GroupHint]>,
) {
    for id in charclasses(tree) {
        let data = tree.node(id).charclass().expect("closed charclass");
        for item in &data.chars {
            let r = match item {
                ClassItem::Range(r) => r,
                ClassItem::Atom(_) => continue,
            };
            let not_homogeneous = Diagnostic::new(
                "104",
                Severity::Error,
                r.a.start,
                format!(
                    "Range in character class is not homogeneous near position {}",
                    r.a.start
                ),
            );
            if r.a.kind == TokenKind::LiteralHex && r.b.kind == TokenKind::LiteralHex {
                // hex notation for both sides is ok to skip this check
            } else if r.a.kind == TokenKind::Literal && r.b.kind == TokenKind::Literal {
                if char_category(r.codepoint_a) != char_category(r.codepoint_b) {
                    errs.push(not_homogeneous);
                }
                // only forward ranges are allowed
                if r.codepoint_a >= r.codepoint_b {
                    errs.push(Diagnostic::new(
                        "104",
                        Severity::Error,
                        r.a.start,
                        format!(
                            "Range in character class goes backwards near position {}",
                            r.a.start
                        ),
                    ));
                }
            } else if !r.a.kind.is_literal() && !r.b.kind.is_literal() {
                // punctuation range?
                errs.push(not_homogeneous);
            } else if matches!(
                r.a.kind,
                TokenKind::LiteralUnicode | TokenKind::LiteralLongUnicode
            ) && matches!(
                r.b.kind,
                TokenKind::LiteralUnicode | TokenKind::LiteralLongUnicode
            ) {
                // both explicit unicode escapes, fine
            } else {
                // strange range
                errs.push(not_homogeneous);
            }
        }
    }
}

/// Things of the form `a|ab` should be `ab|a`: the engine takes the first
/// branch that matches, so the prefix shadows the longer branch.
fn check_prefix_ordering(tree: &ParseTree, errs: &mut Vec<Diagnostic>, _: Option<&[GroupHint]>) {
    for alt in by_kind(tree, |k| k == NodeKind::Alternation).collect::<Vec<_>>() {
        // anything with width after the alternation makes the heuristic
        // unreliable; skip this alternation entirely
        let mut run_checks = true;
        for i in tree.between(Some(alt), None) {
            let kind = tree.node(i).kind;
            if is_anchor_kind(kind) || is_open_kind(kind) || width(kind) == Some(true) {
                run_checks = false;
                break;
            }
        }
        if !run_checks {
            continue;
        }

        let mut prev: Option<String> = None;
        for &branch in tree.children(alt) {
            debug_assert_eq!(tree.node(branch).kind, NodeKind::Progression);
            let plain = tree.children(branch).iter().all(|&x| {
                matches!(tree.node(x).kind, NodeKind::Leaf(k)
                    if k.is_literal()
                        || k == TokenKind::Literals
                        || k == TokenKind::Newline
                        || k.is_suspicious())
            });
            if !plain {
                return;
            }
            let text: String = tree
                .children(branch)
                .iter()
                .map(|&x| tree.node(x).data.as_str())
                .collect();
            if let Some(prev_text) = &prev {
                if text.starts_with(prev_text.as_str()) {
                    errs.push(Diagnostic::new(
                        "105",
                        Severity::Error,
                        tree.node(branch).start,
                        format!(
                            "Potential out of order alternation between {:?} and {:?}",
                            prev_text, text
                        ),
                    ));
                    break;
                }
            }
            prev = Some(text);
        }
    }
}

fn check_no_consecutive_dots(
    tree: &ParseTree,
    errs: &mut Vec<Diagnostic>,
    _: Option<&[GroupHint]>,
) {
    for id in leaves_of(tree, TokenKind::Dot) {
        let next_is_dot = tree
            .next_skipping_children(id)
            .map(|n| tree.node(n).kind == NodeKind::Leaf(TokenKind::Dot))
            .unwrap_or(false);
        if next_is_dot {
            errs.push(Diagnostic::new(
                "111",
                Severity::Warning,
                tree.node(id).start,
                "Consecutive dots, use .{2} if this is intentional",
            ));
            break;
        }
    }
}

fn check_bad_flags(tree: &ParseTree, errs: &mut Vec<Diagnostic>, _: Option<&[GroupHint]>) {
    let directives: Vec<NodeId> = leaves_of(tree, TokenKind::Directive).collect();
    if directives.is_empty() {
        return;
    }
    let flags: String = directives
        .iter()
        .map(|&d| tree.node(d).data.as_str())
        .collect();
    let at = tree.node(directives[0]).start;
    let unneeded = |letter: char| {
        Diagnostic::new(
            "113",
            Severity::Warning,
            at,
            format!("Manually set flag '{}', but do not need it", letter),
        )
    };

    if flags.contains('x') {
        // for x to matter, some node must sit at a different parsed offset
        // than its raw one; the last child is the easiest place to look
        if let Some(&last) = tree.children(tree.root()).last() {
            if tree.node(last).parsed_end == tree.raw.len() {
                errs.push(unneeded('x'));
            }
        }
    }

    if flags.contains('i') {
        let mut needed = leaves_of(tree, TokenKind::Literal).any(|id| {
            let data = &tree.node(id).data;
            data.len() == 1 && data.as_bytes()[0].is_ascii_alphabetic()
        });
        if !needed {
            // single characters were checked above; this part only checks
            // ranges
            'classes: for id in charclasses(tree) {
                let data = tree.node(id).charclass().expect("closed charclass");
                for item in &data.chars {
                    if let ClassItem::Range(r) = item {
                        let touches_alpha = (r.codepoint_a..r.codepoint_b)
                            .any(|c| (0x41..=0x5a).contains(&c) || (0x61..=0x7a).contains(&c));
                        if touches_alpha {
                            needed = true;
                            break 'classes;
                        }
                    }
                }
            }
        }
        if !needed {
            errs.push(unneeded('i'));
        }
    }

    if flags.contains('s') && leaves_of(tree, TokenKind::Dot).next().is_none() {
        errs.push(unneeded('s'));
    }

    if flags.contains('m') {
        // only ^ and $ behave differently in multiline mode
        let any_line_anchor = by_kind(tree, |k| {
            matches!(
                k,
                NodeKind::Leaf(TokenKind::AnchorBeginning) | NodeKind::Leaf(TokenKind::AnchorEnd)
            )
        })
        .next()
        .is_some();
        if !any_line_anchor {
            errs.push(unneeded('m'));
        }
    }
}

fn check_suspicious_anchors(
    tree: &ParseTree,
    errs: &mut Vec<Diagnostic>,
    _: Option<&[GroupHint]>,
) {
    for alt in by_kind(tree, |k| k == NodeKind::Alternation) {
        let mut first = alt;
        while let Some(&c) = tree.children(first).first() {
            first = c;
        }
        let mut last = alt;
        while let Some(&c) = tree.children(last).last() {
            last = c;
        }
        if is_anchor_kind(tree.node(first).kind) && is_anchor_kind(tree.node(last).kind) {
            errs.push(Diagnostic::new(
                "114",
                Severity::Warning,
                tree.node(first).start,
                "Suspicious use of anchors in alternation",
            ));
        }
    }
}

fn check_single_character_classes(
    tree: &ParseTree,
    errs: &mut Vec<Diagnostic>,
    _: Option<&[GroupHint]>,
) {
    for id in charclasses(tree) {
        let node = tree.node(id);
        let data = node.charclass().expect("closed charclass");
        let repeated = tree
            .parent(id)
            .map(|p| tree.node(p).kind == NodeKind::Repetition)
            .unwrap_or(false);
        let single = match data.chars.as_slice() {
            [ClassItem::Atom(_)] => true,
            [ClassItem::Range(r)] => r.codepoint_a == r.codepoint_b,
            _ => false,
        };
        if single && !data.negated && !repeated {
            errs.push(Diagnostic::new(
                "115",
                Severity::Info,
                node.start,
                "Only a single character in character class",
            ));
        }
    }
}

fn check_charclass_overlap(
    tree: &ParseTree,
    errs: &mut Vec<Diagnostic>,
    _: Option<&[GroupHint]>,
) {
    for id in charclasses(tree) {
        let node = tree.node(id);
        let codes = &node.charclass().expect("closed charclass").matching_character_codes;
        let mut counts: HashMap<u32, u32> = HashMap::new();
        for &c in codes {
            *counts.entry(c).or_insert(0) += 1;
        }
        if counts.len() != codes.len() {
            // report duplicates in first-seen order
            let mut dupes: Vec<char> = Vec::new();
            for &c in codes {
                if counts[&c] > 1 {
                    let ch = char::from_u32(c).unwrap_or(char::REPLACEMENT_CHARACTER);
                    if !dupes.contains(&ch) {
                        dupes.push(ch);
                    }
                }
            }
            errs.push(Diagnostic::new(
                "117",
                Severity::Warning,
                node.start,
                format!("Overlap in character class: {:?}", dupes),
            ));
        }
    }
}

const COMMON_SINGLE_CHAR_CODES: &[u32] = &[40, 41, 42, 43, 46, 32]; // "()*+. "

fn check_charclass_len(tree: &ParseTree, errs: &mut Vec<Diagnostic>, _: Option<&[GroupHint]>) {
    for id in charclasses(tree) {
        let node = tree.node(id);
        let data = node.charclass().expect("closed charclass");
        if data.negated || data.matching_character_codes.len() != 1 {
            continue;
        }
        let code = data.matching_character_codes[0];
        let repeated = tree
            .parent(id)
            .map(|p| tree.node(p).kind == NodeKind::Repetition)
            .unwrap_or(false);
        let msg = "Superfluous character class when only one char";
        if COMMON_SINGLE_CHAR_CODES.contains(&code) || repeated {
            // some people write [*] instead of \*; allow it quietly
            errs.push(Diagnostic::new("118", Severity::Info, node.start, msg));
        } else if tree.requested_flags.contains(PatternFlags::VERBOSE) && code == '#' as u32 {
            errs.push(Diagnostic::new(
                "118",
                Severity::Warning,
                node.start,
                format!("{}: use backslash", msg),
            ));
        } else {
            errs.push(Diagnostic::new("118", Severity::Warning, node.start, msg));
        }
    }
}

fn check_charclass_negation(
    tree: &ParseTree,
    errs: &mut Vec<Diagnostic>,
    _: Option<&[GroupHint]>,
) {
    for id in charclasses(tree) {
        let node = tree.node(id);
        let data = node.charclass().expect("closed charclass");
        let children = tree.children(id);
        if data.negated
            && children.len() == 2
            && tree.node(children[1]).kind == NodeKind::Leaf(TokenKind::BuiltinCharclass)
        {
            errs.push(Diagnostic::new(
                "119",
                Severity::Warning,
                node.start,
                "Instead of negating character class, flip case of builtin class",
            ));
        }
    }
}

fn check_multiline_anchors(
    tree: &ParseTree,
    errs: &mut Vec<Diagnostic>,
    _: Option<&[GroupHint]>,
) {
    if tree.effective_flags.contains(PatternFlags::MULTILINE) {
        return;
    }
    for id in by_kind(tree, |k| {
        matches!(
            k,
            NodeKind::Leaf(TokenKind::AnchorBeginning) | NodeKind::Leaf(TokenKind::AnchorEnd)
        )
    }) {
        errs.push(Diagnostic::new(
            "120",
            Severity::Warning,
            tree.node(id).start,
            "Use of ^ or $ without multiline mode: use \\A or \\Z explicitly",
        ));
    }
}

fn check_charclass_case_insensitive_overlap(
    tree: &ParseTree,
    errs: &mut Vec<Diagnostic>,
    _: Option<&[GroupHint]>,
) {
    if !tree.effective_flags.contains(PatternFlags::IGNORECASE) {
        return;
    }
    let fold = |c: u32| if (97..=122).contains(&c) { c - 32 } else { c };

    // this only finds the obvious shape, (?i)[0-9a-fA-F]; bare letters
    // overlapping a range are not caught
    for id in charclasses(tree) {
        let data = tree.node(id).charclass().expect("closed charclass");
        let mut seen: Vec<(u32, u32)> = Vec::new();
        for item in &data.chars {
            if let ClassItem::Range(r) = item {
                let key = (fold(r.codepoint_a), fold(r.codepoint_b));
                if seen.contains(&key) {
                    errs.push(Diagnostic::new(
                        "122",
                        Severity::Warning,
                        r.a.start,
                        "Overlap due to case insensitive mode",
                    ));
                }
                seen.push(key);
            }
        }
    }
}

fn check_charclass_simplify(
    tree: &ParseTree,
    errs: &mut Vec<Diagnostic>,
    _: Option<&[GroupHint]>,
) {
    // the suggestions assume an 8-bit view of the pattern
    if tree.raw.chars().any(|c| c as u32 > 255)
        || tree.effective_flags.contains(PatternFlags::UNICODE)
    {
        return;
    }
    let ignorecase = tree.effective_flags.contains(PatternFlags::IGNORECASE);

    for id in charclasses(tree) {
        let node = tree.node(id);
        let data = node.charclass().expect("closed charclass");
        let existing_score = node.end - node.start - 2;
        let (entries, negated) =
            match simplify_charclass(&data.matching_character_codes, ignorecase) {
                Ok(result) => result,
                Err(_) => continue,
            };
        let new_score = charclass_score(&entries, negated);
        if new_score >= existing_score {
            continue;
        }
        let new_class = match entries.as_slice() {
            [ClassEntry::Single(code)] if !negated => esc(*code, ""),
            [ClassEntry::Category(key)] if !negated => (*key).to_string(),
            _ => format!(
                "[{}{}]",
                if negated { "^" } else { "" },
                build_output(&entries)
            ),
        };
        errs.push(Diagnostic::new(
            "123",
            Severity::Warning,
            node.start,
            format!(
                "Regex can be written more simply: {} -> {}",
                tree.reconstruct(id),
                new_class
            ),
        ));
    }
}

fn check_unescaped_braces(
    tree: &ParseTree,
    errs: &mut Vec<Diagnostic>,
    _: Option<&[GroupHint]>,
) {
    for id in leaves_of(tree, TokenKind::UnescapedCurly) {
        errs.push(Diagnostic::new(
            "124",
            Severity::Error,
            tree.node(id).start,
            "Curly braces should be escaped when not a repetition spec",
        ));
    }
}

fn check_redundant_repetition(
    tree: &ParseTree,
    errs: &mut Vec<Diagnostic>,
    _: Option<&[GroupHint]>,
) {
    for id in by_kind(tree, |k| k == NodeKind::Repetition) {
        let node = tree.node(id);
        let spec = node.repeat().expect("repetition payload");
        if spec.op != TokenKind::RepeatCurly {
            continue;
        }
        let at = node.start;
        let msg = |text: String| Diagnostic::new("125", Severity::Warning, at, text);
        if spec.min == 1 && spec.max == Some(1) {
            errs.push(msg(format!(
                "Redundant repetition spec: {} can be omitted",
                node.end_data
            )));
        } else if spec.max == Some(spec.min) && node.end_data.contains(',') {
            errs.push(msg(format!("Redundant repetition spec: {}", node.end_data)));
        } else if spec.min == 0 && spec.max.is_none() && !node.end_data.contains('*') {
            errs.push(msg("should be *".to_string()));
        } else if spec.min == 1 && spec.max.is_none() && !node.end_data.contains('+') {
            errs.push(msg("should be +".to_string()));
        } else if spec.min == 0 && spec.max == Some(1) && !node.end_data.starts_with('?') {
            errs.push(msg("should be ?".to_string()));
        }
    }
}

// === Expected-group checkers ===

fn check_expected_groups_named(
    tree: &ParseTree,
    errs: &mut Vec<Diagnostic>,
    _groups: Option<&[GroupHint]>,
) {
    for id in by_kind(tree, |k| {
        k == NodeKind::Group(crate::parser::GroupKind::NamedCapturing)
    }) {
        errs.push(Diagnostic::new(
            "106",
            Severity::Error,
            tree.node(id).start,
            "Named capture group used where positional groups are expected",
        ));
        break;
    }
}

fn check_expected_groups_count(
    tree: &ParseTree,
    errs: &mut Vec<Diagnostic>,
    groups: Option<&[GroupHint]>,
) {
    let desired = groups.expect("registry gates on groups").len();
    let n = capturing_groups(tree).len();
    if n < desired {
        errs.push(Diagnostic::new(
            "107",
            Severity::Error,
            0,
            format!("Wrong number of capture groups ({}) for the expected {}", n, desired),
        ));
    } else if n > desired {
        // nested groups anywhere but the last get flagged by the overlap
        // check; this one does not look at positions
        errs.push(Diagnostic::new(
            "107",
            Severity::Info,
            0,
            format!(
                "Wrong number of capture groups ({}) for the expected {} (extra groups)",
                n, desired
            ),
        ));
    }
}

fn check_expected_groups_overlap(
    tree: &ParseTree,
    errs: &mut Vec<Diagnostic>,
    groups: Option<&[GroupHint]>,
) {
    let hints = groups.expect("registry gates on groups");
    let found = capturing_groups(tree);
    if found.is_empty() {
        // the count check already complains about this case
        return;
    }
    let desired = hints.len();
    let msg_nested = "Nested capture group other than the final one";
    let msg_gap = "Gap in capture groups";

    let mut prev_end = 0usize;
    let mut prev: Option<NodeId> = None;
    for (idx, &raw_group) in found.iter().enumerate() {
        // a repeated group spans its repetition operator
        let mut group = raw_group;
        if let Some(p) = tree.parent(group) {
            if tree.node(p).kind == NodeKind::Repetition {
                group = p;
            }
        }

        let group_start = tree.node(group).parsed_start;
        if group_start > prev_end {
            if let Some(j) = find_bad_between(tree, prev, Some(group), has_width) {
                errs.push(Diagnostic::new(
                    "108",
                    Severity::Error,
                    tree.node(j).start,
                    msg_gap,
                ));
            }
        } else if group_start < prev_end {
            if idx >= desired {
                // extra groups are ignored downstream, so nesting within
                // the last counted group is merely informational
                errs.push(Diagnostic::new(
                    "108",
                    Severity::Info,
                    tree.node(group).start,
                    format!("{} (extra groups)", msg_nested),
                ));
                group = prev.expect("idx > 0 when overlapping");
            } else {
                if hints[idx] == GroupHint::Token {
                    errs.push(Diagnostic::new(
                        "108",
                        Severity::Error,
                        tree.node(group).start,
                        msg_nested,
                    ));
                }
                group = prev.expect("idx > 0 when overlapping");
            }
        }

        prev_end = tree.node(group).parsed_end;
        prev = Some(group);
    }

    if prev_end != tree.parsed_end() {
        if let Some(j) = find_bad_between(tree, prev, None, has_width) {
            errs.push(Diagnostic::new(
                "108",
                Severity::Error,
                tree.node(j).start,
                msg_gap,
            ));
        }
    }
}

fn check_expected_groups_repetition(
    tree: &ParseTree,
    errs: &mut Vec<Diagnostic>,
    groups: Option<&[GroupHint]>,
) {
    let hints = groups.expect("registry gates on groups");
    let desired = hints.len();
    for (idx, &capture) in capturing_groups(tree).iter().enumerate() {
        let mut parent = tree.parent(capture);
        while let Some(p) = parent {
            let node = tree.node(p);
            // `?` is harmless here; everything else repeats the group
            let repeats = node.kind == NodeKind::Repetition
                && node.repeat().map(|s| s.op) != Some(TokenKind::RepeatQuestion);
            if repeats {
                if idx >= desired {
                    errs.push(Diagnostic::new(
                        "109",
                        Severity::Info,
                        tree.node(capture).start,
                        "Capture group should not be within a repetition (extra groups)",
                    ));
                } else if hints[idx] == GroupHint::Token {
                    errs.push(Diagnostic::new(
                        "109",
                        Severity::Error,
                        tree.node(capture).start,
                        "Capture group should not be within a repetition",
                    ));
                }
            }
            parent = tree.parent(p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn tree(pattern: &str) -> ParseTree {
        parse(pattern, PatternFlags::empty()).unwrap()
    }

    fn broken_checker(_: &ParseTree, errs: &mut Vec<Diagnostic>, _: Option<&[GroupHint]>) {
        errs.push(Diagnostic::new("101", Severity::Error, 0, "partial work"));
        panic!("checker blew up");
    }

    fn quiet_checker(_: &ParseTree, _: &mut Vec<Diagnostic>, _: Option<&[GroupHint]>) {}

    #[test]
    fn panicking_checker_becomes_999() {
        let registry = [
            CheckerDescriptor {
                name: "broken_checker",
                run: broken_checker,
                wants_groups: false,
            },
            CheckerDescriptor {
                name: "quiet_checker",
                run: quiet_checker,
                wants_groups: false,
            },
        ];
        let t = tree("a");
        let errs = run_registry(&registry, &t, None, None);
        // partial output is kept, and the failure is reported in-band
        assert_eq!(errs.len(), 2);
        assert_eq!(errs[0].code, "101");
        assert_eq!(errs[1].code, "999");
        assert!(errs[1].message.contains("broken_checker"));
        assert!(errs[1].message.contains("blew up"));
    }

    #[test]
    fn only_filter_limits_registry() {
        let t = tree(r"{");
        assert_eq!(run_checkers(&t, None, Some("check_unescaped_braces")).len(), 1);
        assert_eq!(run_checkers(&t, None, Some("check_no_nulls")).len(), 0);
    }

    #[test]
    fn registry_names_are_unique() {
        let mut names: Vec<&str> = REGISTRY.iter().map(|d| d.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), REGISTRY.len());
    }

    #[test]
    fn diagnostic_ordering() {
        let a = Diagnostic::new("103", Severity::Error, 5, "x");
        let b = Diagnostic::new("101", Severity::Error, 0, "y");
        let c = Diagnostic::new("120", Severity::Warning, 0, "z");
        let mut all = vec![a.clone(), b.clone(), c.clone()];
        all.sort();
        assert_eq!(all, vec![c, b, a]);
    }

    #[test]
    fn severity_display() {
        assert_eq!(Severity::Error.to_string(), "ERROR");
        assert_eq!(Severity::Info.to_string(), "INFO");
    }
}
