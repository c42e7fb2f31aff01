// tokenizer.rs - Pattern text to token stream.
//
// A hand-written byte scanner with one sub-grammar per context (root,
// charclass, verbose additions), first-matching-rule-wins with each rule
// taking its longest extent. Tokens carry two offsets: the raw position in
// the source, and the "parsed" position that discounts verbose-mode
// whitespace and comments (those have parsed width zero).
//
// Verbose mode has a chicken/egg problem: whether whitespace is significant
// depends on a (?x) directive that may appear mid-pattern. We tokenize
// assuming the caller's flags; if a directive grants verbose mode while the
// non-verbose table is active, tokenization restarts from scratch.

use crate::error::PatternError;
use crate::flags::{match_repeat_curly, resolve_flags, PatternFlags};

/// Closed set of token kinds, one per rule in the sub-grammar tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // structural
    Alternate,
    Directive,
    OpenCapturing,
    OpenNonCapturing,
    OpenNamedCapturing,
    OpenLookahead,
    OpenNegativeLookahead,
    OpenLookbehind,
    OpenNegativeLookbehind,
    OpenExists,
    /// `(?P=name)` - complete in a single token, never opens a group.
    ExistsNamed,
    Comment,
    CloseParen,
    OpenCharClass,
    CloseCharClass,
    Backref,
    // meta
    Dot,
    AnchorBeginning,
    AnchorEnd,
    AnchorWordBoundary,
    AnchorNotWordBoundary,
    AnchorBeginningOfString,
    AnchorEndOfString,
    RepeatStar,
    RepeatNongreedyStar,
    RepeatPlus,
    RepeatNongreedyPlus,
    RepeatQuestion,
    RepeatNongreedyQuestion,
    RepeatCurly,
    // literals
    Literal,
    LiteralOct,
    LiteralHex,
    LiteralUnicode,
    LiteralLongUnicode,
    LiteralNamed,
    LiteralBracket,
    LiteralParen,
    LiteralDot,
    LiteralBackslash,
    LiteralStar,
    LiteralPlus,
    LiteralAlternation,
    Newline,
    EscapedDash,
    /// Run of plain characters the more specific rules left behind.
    Literals,
    // charclass internals
    ClassNegate,
    ClassSpecial,
    BuiltinCharclass,
    // oddities
    Suspicious,
    SuspiciousSquo,
    SuspiciousDquo,
    UnescapedCurly,
    // verbose-only
    VerboseWhitespace,
    VerboseComment,
}

impl TokenKind {
    /// Kinds that open a group node in the tree builder.
    pub fn opens_group(self) -> bool {
        matches!(
            self,
            TokenKind::OpenCapturing
                | TokenKind::OpenNonCapturing
                | TokenKind::OpenNamedCapturing
                | TokenKind::OpenLookahead
                | TokenKind::OpenNegativeLookahead
                | TokenKind::OpenLookbehind
                | TokenKind::OpenNegativeLookbehind
                | TokenKind::OpenExists
        )
    }

    /// The open-token family, including the self-contained `(?P=name)`.
    pub fn is_open(self) -> bool {
        self.opens_group() || self == TokenKind::ExistsNamed
    }

    /// The literal family: a token matching exactly one character.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Literal
                | TokenKind::LiteralOct
                | TokenKind::LiteralHex
                | TokenKind::LiteralUnicode
                | TokenKind::LiteralLongUnicode
                | TokenKind::LiteralNamed
                | TokenKind::LiteralBracket
                | TokenKind::LiteralParen
                | TokenKind::LiteralDot
                | TokenKind::LiteralBackslash
                | TokenKind::LiteralStar
                | TokenKind::LiteralPlus
                | TokenKind::LiteralAlternation
        )
    }

    pub fn is_anchor(self) -> bool {
        matches!(
            self,
            TokenKind::AnchorBeginning
                | TokenKind::AnchorEnd
                | TokenKind::AnchorWordBoundary
                | TokenKind::AnchorNotWordBoundary
                | TokenKind::AnchorBeginningOfString
                | TokenKind::AnchorEndOfString
        )
    }

    pub fn is_repetition(self) -> bool {
        matches!(
            self,
            TokenKind::RepeatStar
                | TokenKind::RepeatNongreedyStar
                | TokenKind::RepeatPlus
                | TokenKind::RepeatNongreedyPlus
                | TokenKind::RepeatQuestion
                | TokenKind::RepeatNongreedyQuestion
                | TokenKind::RepeatCurly
        )
    }

    pub fn is_suspicious(self) -> bool {
        matches!(
            self,
            TokenKind::Suspicious | TokenKind::SuspiciousSquo | TokenKind::SuspiciousDquo
        )
    }

    pub fn is_verbose(self) -> bool {
        matches!(
            self,
            TokenKind::VerboseWhitespace | TokenKind::VerboseComment
        )
    }
}

/// One token: kind, raw offset, verbose-adjusted offset, matched text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub parsed_start: usize,
    pub text: String,
}

impl Token {
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Width in the parsed coordinate space (zero for verbose tokens).
    pub fn parsed_len(&self) -> usize {
        if self.kind.is_verbose() {
            0
        } else {
            self.text.len()
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.len()
    }

    pub fn parsed_end(&self) -> usize {
        self.parsed_start + self.parsed_len()
    }
}

/// Tokenize `pattern` under `requested` flags.
///
/// Returns the token stream and the effective flags (requested merged with
/// inline directives). Fails only when the host-style validation in
/// [`resolve_flags`] rejects the pattern; the catch-all rules guarantee a
/// valid pattern consumes completely.
pub fn tokenize(
    pattern: &str,
    requested: PatternFlags,
) -> Result<(Vec<Token>, PatternFlags), PatternError> {
    let effective = resolve_flags(pattern, requested)?;
    let mut verbose = requested.contains(PatternFlags::VERBOSE);

    'restart: loop {
        let mut tokens = Vec::new();
        let mut scanner = Scanner::new(pattern, verbose);
        while let Some(token) = scanner.next_token() {
            if !verbose && token.kind == TokenKind::Directive && token.text.contains('x') {
                verbose = true;
                continue 'restart;
            }
            tokens.push(token);
        }
        return Ok((tokens, effective));
    }
}

// === Scanner ===

#[derive(PartialEq)]
enum ClassState {
    Outside,
    /// Right after `[`.
    Start,
    /// Right after a leading `^`.
    AfterNegate,
    Inside,
}

struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    parsed_pos: usize,
    verbose: bool,
    class: ClassState,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str, verbose: bool) -> Self {
        Scanner {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            parsed_pos: 0,
            verbose,
            class: ClassState::Outside,
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let (kind, len) = if self.class == ClassState::Outside {
            self.root_token()
        } else {
            self.class_token()
        };

        let token = Token {
            kind,
            start: self.pos,
            parsed_start: self.parsed_pos,
            text: self.text[self.pos..self.pos + len].to_string(),
        };
        self.pos += len;
        self.parsed_pos += token.parsed_len();

        self.class = match (&self.class, kind) {
            (_, TokenKind::OpenCharClass) => ClassState::Start,
            (_, TokenKind::CloseCharClass) => ClassState::Outside,
            (ClassState::Start, TokenKind::ClassNegate) => ClassState::AfterNegate,
            (ClassState::Outside, _) => ClassState::Outside,
            _ => ClassState::Inside,
        };
        Some(token)
    }

    // --- root sub-grammar ---

    fn root_token(&self) -> (TokenKind, usize) {
        let p = &self.bytes[self.pos..];
        let c = p[0];

        if self.verbose {
            if is_pattern_space(c) {
                let mut n = 1;
                while n < p.len() && is_pattern_space(p[n]) {
                    n += 1;
                }
                return (TokenKind::VerboseWhitespace, n);
            }
            if c == b'#' {
                let mut n = 1;
                while n < p.len() && p[n] != b'\n' {
                    n += 1;
                }
                return (TokenKind::VerboseComment, n);
            }
        }

        match c {
            b'|' => (TokenKind::Alternate, 1),
            b'(' => self.open_token(p),
            b')' => (TokenKind::CloseParen, 1),
            b'[' => (TokenKind::OpenCharClass, 1),
            b'\\' => self.root_escape(p),
            // misdone backreferences, tabs, newlines, and bel
            0x00..=0x08 | 0x0a | 0x0d => (TokenKind::Suspicious, 1),
            b'.' => (TokenKind::Dot, 1),
            b'^' => (TokenKind::AnchorBeginning, 1),
            b'$' => (TokenKind::AnchorEnd, 1),
            b'*' => {
                if p.get(1) == Some(&b'?') {
                    (TokenKind::RepeatNongreedyStar, 2)
                } else {
                    (TokenKind::RepeatStar, 1)
                }
            }
            b'+' => {
                if p.get(1) == Some(&b'?') {
                    (TokenKind::RepeatNongreedyPlus, 2)
                } else {
                    (TokenKind::RepeatPlus, 1)
                }
            }
            b'?' => {
                if p.get(1) == Some(&b'?') {
                    (TokenKind::RepeatNongreedyQuestion, 2)
                } else {
                    (TokenKind::RepeatQuestion, 1)
                }
            }
            b'{' => match match_repeat_curly(self.bytes, self.pos) {
                Some(end) => (TokenKind::RepeatCurly, end - self.pos),
                None => (TokenKind::UnescapedCurly, 1),
            },
            b'}' => (TokenKind::UnescapedCurly, 1),
            b'-' => {
                // catch-all: run of plain characters
                let mut n = 1;
                while n < p.len() && !matches!(p[n], b'\\' | b'(' | b')' | b'|' | b'[' | b']' | b'{' | b'}')
                {
                    n += 1;
                }
                (TokenKind::Literals, n)
            }
            b']' => (TokenKind::Literal, 1),
            _ => (TokenKind::Literal, self.char_len()),
        }
    }

    // `p[0]` is `(`. Forms were validated up front, so unterminated variants
    // cannot occur; anything unrecognized degrades to a bare capturing open.
    fn open_token(&self, p: &[u8]) -> (TokenKind, usize) {
        if p.get(1) != Some(&b'?') {
            return (TokenKind::OpenCapturing, 1);
        }
        match p.get(2).copied() {
            Some(b':') => (TokenKind::OpenNonCapturing, 3),
            Some(b'=') => (TokenKind::OpenLookahead, 3),
            Some(b'!') => (TokenKind::OpenNegativeLookahead, 3),
            Some(b'<') => match p.get(3).copied() {
                Some(b'=') => (TokenKind::OpenLookbehind, 4),
                Some(b'!') => (TokenKind::OpenNegativeLookbehind, 4),
                _ => (TokenKind::OpenCapturing, 1),
            },
            Some(b'P') => match p.get(3).copied() {
                Some(b'<') => match find(p, 4, b'>') {
                    Some(n) => (TokenKind::OpenNamedCapturing, n + 1),
                    None => (TokenKind::OpenCapturing, 1),
                },
                Some(b'=') => match find(p, 4, b')') {
                    Some(n) => (TokenKind::ExistsNamed, n + 1),
                    None => (TokenKind::OpenCapturing, 1),
                },
                _ => (TokenKind::OpenCapturing, 1),
            },
            Some(b'#') => match find(p, 3, b')') {
                Some(n) => (TokenKind::Comment, n + 1),
                None => (TokenKind::OpenCapturing, 1),
            },
            Some(b'(') => match find(p, 3, b')') {
                Some(n) => (TokenKind::OpenExists, n + 1),
                None => (TokenKind::OpenCapturing, 1),
            },
            Some(l) if PatternFlags::from_letter(l).is_some() => {
                let mut n = 2;
                while n < p.len() && PatternFlags::from_letter(p[n]).is_some() {
                    n += 1;
                }
                if p.get(n) == Some(&b')') {
                    (TokenKind::Directive, n + 1)
                } else {
                    (TokenKind::OpenCapturing, 1)
                }
            }
            _ => (TokenKind::OpenCapturing, 1),
        }
    }

    // `p[0]` is `\`, in root context. Backrefs bind before the shared
    // literal escapes.
    fn root_escape(&self, p: &[u8]) -> (TokenKind, usize) {
        match p.get(1).copied() {
            Some(b'1'..=b'9') => {
                if matches!(p.get(2), Some(d) if d.is_ascii_digit()) {
                    (TokenKind::Backref, 3)
                } else {
                    (TokenKind::Backref, 2)
                }
            }
            Some(b'b') => (TokenKind::AnchorWordBoundary, 2),
            Some(b'B') => (TokenKind::AnchorNotWordBoundary, 2),
            Some(b'A') => (TokenKind::AnchorBeginningOfString, 2),
            Some(b'Z') => (TokenKind::AnchorEndOfString, 2),
            _ => self.shared_escape(p),
        }
    }

    // --- charclass sub-grammar ---

    fn class_token(&self) -> (TokenKind, usize) {
        let p = &self.bytes[self.pos..];
        let c = p[0];

        // host quirk: `]` directly after `[` or `[^` is a literal
        let at_start = self.class == ClassState::Start || self.class == ClassState::AfterNegate;
        if at_start && c == b']' {
            return (TokenKind::Literal, 1);
        }
        if self.class == ClassState::Start && c == b'^' {
            return (TokenKind::ClassNegate, 1);
        }

        match c {
            b']' => (TokenKind::CloseCharClass, 1),
            b'\\' => {
                if p.get(1) == Some(&b'-') {
                    (TokenKind::EscapedDash, 2)
                } else {
                    self.shared_escape(p)
                }
            }
            b'-' | b'^' => (TokenKind::ClassSpecial, 1),
            _ => (TokenKind::Literal, self.char_len()),
        }
    }

    // --- simpleliteral sub-grammar, shared by root and charclass ---

    // `p[0]` is `\`.
    fn shared_escape(&self, p: &[u8]) -> (TokenKind, usize) {
        match p.get(1).copied() {
            Some(b'0') => {
                // \0 plus up to two more octal digits (host limit: three total)
                let mut n = 2;
                while n < 4 && matches!(p.get(n).copied(), Some(b'0'..=b'7')) {
                    n += 1;
                }
                (TokenKind::LiteralOct, n)
            }
            Some(b'x') => {
                if hex_digits(p, 2, 2) {
                    (TokenKind::LiteralHex, 4)
                } else {
                    (TokenKind::Suspicious, 2)
                }
            }
            Some(b'u') => {
                if hex_digits(p, 2, 4) {
                    (TokenKind::LiteralUnicode, 6)
                } else {
                    (TokenKind::Suspicious, 2)
                }
            }
            Some(b'U') => {
                if hex_digits(p, 2, 8) {
                    (TokenKind::LiteralLongUnicode, 10)
                } else {
                    (TokenKind::Suspicious, 2)
                }
            }
            Some(b'N') => match p.get(2).copied() {
                Some(b'{') => match find(p, 3, b'}') {
                    Some(n) => (TokenKind::LiteralNamed, n + 1),
                    None => (TokenKind::Suspicious, 2),
                },
                _ => (TokenKind::Suspicious, 2),
            },
            Some(b'[') | Some(b']') => (TokenKind::LiteralBracket, 2),
            Some(b'(') | Some(b')') => (TokenKind::LiteralParen, 2),
            Some(b'n') => (TokenKind::Newline, 2),
            Some(b'.') => (TokenKind::LiteralDot, 2),
            Some(b'\\') => (TokenKind::LiteralBackslash, 2),
            Some(b'*') => (TokenKind::LiteralStar, 2),
            Some(b'+') => (TokenKind::LiteralPlus, 2),
            Some(b'|') => (TokenKind::LiteralAlternation, 2),
            Some(b'\'') => (TokenKind::SuspiciousSquo, 2),
            Some(b'"') => (TokenKind::SuspiciousDquo, 2),
            Some(b's') | Some(b'S') | Some(b'w') | Some(b'W') | Some(b'd') | Some(b'D') => {
                (TokenKind::BuiltinCharclass, 2)
            }
            Some(_) => {
                // one escaped character, which may be multi-byte
                let tail = &self.text[self.pos + 1..];
                let width = tail.chars().next().map(char::len_utf8).unwrap_or(0);
                (TokenKind::Suspicious, 1 + width)
            }
            None => (TokenKind::Suspicious, 1),
        }
    }

    fn char_len(&self) -> usize {
        self.text[self.pos..]
            .chars()
            .next()
            .map(char::len_utf8)
            .unwrap_or(1)
    }
}

// The dialect's \s: space, tab, newline, return, vtab, formfeed.
fn is_pattern_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn hex_digits(p: &[u8], from: usize, count: usize) -> bool {
    if p.len() < from + count {
        return false;
    }
    p[from..from + count].iter().all(|b| b.is_ascii_hexdigit())
}

fn find(p: &[u8], from: usize, needle: u8) -> Option<usize> {
    if from >= p.len() {
        return None;
    }
    memchr::memchr(needle, &p[from..]).map(|n| from + n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(pattern: &str) -> Vec<TokenKind> {
        let (tokens, _) = tokenize(pattern, PatternFlags::empty()).unwrap();
        tokens.iter().map(|t| t.kind).collect()
    }

    fn texts(pattern: &str) -> Vec<String> {
        let (tokens, _) = tokenize(pattern, PatternFlags::empty()).unwrap();
        tokens.into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn simple_literals() {
        assert_eq!(
            kinds("abc"),
            vec![TokenKind::Literal, TokenKind::Literal, TokenKind::Literal]
        );
    }

    #[test]
    fn tokens_cover_the_input() {
        for pattern in [
            r"a|b",
            r"(?i)x+",
            r"[^a-z\d]{2,3}?",
            r"(?P<name>\w+)\s*(?P=name)",
            r"\\(foo|bar)\b",
            "café.*",
        ] {
            let (tokens, _) = tokenize(pattern, PatternFlags::empty()).unwrap();
            let rebuilt: String = tokens.iter().map(|t| t.text.as_str()).collect();
            assert_eq!(rebuilt, pattern);
        }
    }

    #[test]
    fn group_openers() {
        assert_eq!(kinds("(a)")[0], TokenKind::OpenCapturing);
        assert_eq!(kinds("(?:a)")[0], TokenKind::OpenNonCapturing);
        assert_eq!(kinds("(?=a)")[0], TokenKind::OpenLookahead);
        assert_eq!(kinds("(?!a)")[0], TokenKind::OpenNegativeLookahead);
        assert_eq!(kinds("(?<=a)")[0], TokenKind::OpenLookbehind);
        assert_eq!(kinds("(?<!a)")[0], TokenKind::OpenNegativeLookbehind);
        assert_eq!(texts("(?P<n>a)")[0], "(?P<n>");
        assert_eq!(kinds("(a)(?(1)b)")[3], TokenKind::OpenExists);
    }

    #[test]
    fn exists_named_is_self_contained() {
        let k = kinds("(?P<n>a)(?P=n)");
        assert_eq!(k[4], TokenKind::ExistsNamed);
        assert_eq!(texts("(?P<n>a)(?P=n)")[4], "(?P=n)");
    }

    #[test]
    fn directive_and_comment() {
        assert_eq!(kinds("(?im)a")[0], TokenKind::Directive);
        assert_eq!(kinds("(?#note)a")[0], TokenKind::Comment);
        assert_eq!(texts("(?#note)a")[0], "(?#note)");
    }

    #[test]
    fn repetitions() {
        assert_eq!(kinds("a*")[1], TokenKind::RepeatStar);
        assert_eq!(kinds("a*?")[1], TokenKind::RepeatNongreedyStar);
        assert_eq!(kinds("a+")[1], TokenKind::RepeatPlus);
        assert_eq!(kinds("a??")[1], TokenKind::RepeatNongreedyQuestion);
        assert_eq!(kinds("a?")[1], TokenKind::RepeatQuestion);
        assert_eq!(texts("a{1,3}?")[1], "{1,3}?");
        assert_eq!(kinds("a{1,3}?")[1], TokenKind::RepeatCurly);
        assert_eq!(texts("a{,5}?")[1], "{,5}?");
        assert_eq!(texts("a{2}")[1], "{2}");
    }

    #[test]
    fn bare_braces_are_unescaped_curly() {
        assert_eq!(kinds("{"), vec![TokenKind::UnescapedCurly]);
        assert_eq!(
            kinds("a{lit}"),
            vec![
                TokenKind::Literal,
                TokenKind::UnescapedCurly,
                TokenKind::Literal,
                TokenKind::Literal,
                TokenKind::Literal,
                TokenKind::UnescapedCurly,
            ]
        );
    }

    #[test]
    fn backrefs() {
        assert_eq!(kinds(r"(a)\1")[3], TokenKind::Backref);
        let t = texts(r"(a)(b)(c)(d)(e)(f)(g)(h)(i)(j)(k)\11");
        assert_eq!(t.last().unwrap(), "\\11");
    }

    #[test]
    fn anchors() {
        assert_eq!(
            kinds(r"^a$"),
            vec![
                TokenKind::AnchorBeginning,
                TokenKind::Literal,
                TokenKind::AnchorEnd
            ]
        );
        assert_eq!(kinds(r"\ba\Z")[0], TokenKind::AnchorWordBoundary);
        assert_eq!(kinds(r"\Aa\b")[0], TokenKind::AnchorBeginningOfString);
    }

    #[test]
    fn escapes() {
        assert_eq!(kinds(r"\x41")[0], TokenKind::LiteralHex);
        assert_eq!(kinds(r"\010")[0], TokenKind::LiteralOct);
        assert_eq!(kinds(r"\u0041")[0], TokenKind::LiteralUnicode);
        assert_eq!(kinds(r"\U00000041")[0], TokenKind::LiteralLongUnicode);
        assert_eq!(kinds(r"\N{SPACE}")[0], TokenKind::LiteralNamed);
        assert_eq!(kinds(r"\[")[0], TokenKind::LiteralBracket);
        assert_eq!(kinds(r"\(")[0], TokenKind::LiteralParen);
        assert_eq!(kinds(r"\n")[0], TokenKind::Newline);
        assert_eq!(kinds(r"\.")[0], TokenKind::LiteralDot);
        assert_eq!(kinds(r"\w")[0], TokenKind::BuiltinCharclass);
        assert_eq!(kinds(r"\q")[0], TokenKind::Suspicious);
        assert_eq!(kinds(r"\'")[0], TokenKind::SuspiciousSquo);
    }

    #[test]
    fn octal_stops_at_three_digits() {
        // host reads at most three octal digits; the fourth is a literal
        assert_eq!(
            texts(r"\0377"),
            vec!["\\037".to_string(), "7".to_string()]
        );
    }

    #[test]
    fn charclass_tokens() {
        assert_eq!(
            kinds("[a-z]"),
            vec![
                TokenKind::OpenCharClass,
                TokenKind::Literal,
                TokenKind::ClassSpecial,
                TokenKind::Literal,
                TokenKind::CloseCharClass,
            ]
        );
        assert_eq!(kinds(r"[\-_]")[1], TokenKind::EscapedDash);
        assert_eq!(kinds(r"[\s]")[1], TokenKind::BuiltinCharclass);
        assert_eq!(kinds(r"[\x00]")[1], TokenKind::LiteralHex);
    }

    #[test]
    fn charclass_negation_and_bracket_quirk() {
        assert_eq!(kinds("[^a]")[1], TokenKind::ClassNegate);
        // `]` right after `[` or `[^` is a literal
        let k = kinds("[]]");
        assert_eq!(k[1], TokenKind::Literal);
        assert_eq!(k[2], TokenKind::CloseCharClass);
        let k = kinds("[^]]");
        assert_eq!(k[1], TokenKind::ClassNegate);
        assert_eq!(k[2], TokenKind::Literal);
        assert_eq!(k[3], TokenKind::CloseCharClass);
        // non-leading caret is special, not negation
        assert_eq!(kinds("[a^]")[2], TokenKind::ClassSpecial);
    }

    #[test]
    fn suspicious_control_characters() {
        assert_eq!(kinds("a\nb")[1], TokenKind::Suspicious);
        assert_eq!(kinds("a\x08b")[1], TokenKind::Suspicious);
    }

    #[test]
    fn literals_run_after_dash() {
        let t = texts("a-b");
        assert_eq!(t, vec!["a".to_string(), "-b".to_string()]);
        let (tokens, _) = tokenize("a-b", PatternFlags::empty()).unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Literals);
    }

    #[test]
    fn verbose_whitespace_and_comments() {
        let (tokens, flags) = tokenize("(?x)a b # trailing", PatternFlags::empty()).unwrap();
        assert!(flags.contains(PatternFlags::VERBOSE));
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Directive,
                TokenKind::Literal,
                TokenKind::VerboseWhitespace,
                TokenKind::Literal,
                TokenKind::VerboseWhitespace,
                TokenKind::VerboseComment,
            ]
        );
    }

    #[test]
    fn verbose_restart_adjusts_earlier_tokens() {
        // the space precedes the directive; the restart re-lexes it as
        // verbose whitespace
        let (tokens, _) = tokenize(" a(?x) b", PatternFlags::empty()).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::VerboseWhitespace);
    }

    #[test]
    fn parsed_offsets_discount_verbose_tokens() {
        let (tokens, _) = tokenize("(?x)a b", PatternFlags::empty()).unwrap();
        // "(?x)" 0..4, "a" 4..5, " " 5..6 (parsed width 0), "b" 6..7
        assert_eq!(tokens[3].start, 6);
        assert_eq!(tokens[3].parsed_start, 5);
        assert_eq!(tokens[3].parsed_end(), 6);
    }

    #[test]
    fn verbose_flag_requested_directly() {
        let (tokens, _) = tokenize("a b", PatternFlags::VERBOSE).unwrap();
        assert_eq!(tokens[1].kind, TokenKind::VerboseWhitespace);
    }

    #[test]
    fn newline_suspicious_when_not_verbose() {
        let (tokens, _) = tokenize("a\nb", PatternFlags::empty()).unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Suspicious);
        let (tokens, _) = tokenize("a\nb", PatternFlags::VERBOSE).unwrap();
        assert_eq!(tokens[1].kind, TokenKind::VerboseWhitespace);
    }

    #[test]
    fn invalid_pattern_fails_fast() {
        assert!(tokenize("(a", PatternFlags::empty()).is_err());
        assert!(tokenize("[a", PatternFlags::empty()).is_err());
    }
}
