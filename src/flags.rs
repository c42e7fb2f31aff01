// flags.rs - Pattern flags and host-style pattern validation.
//
// resolve_flags() plays the role of the host dialect's own flag merging:
// it folds inline (?iLmsuxa) directives into the caller's bitmask and
// rejects patterns the dialect itself would refuse, before any tree is
// built. A rejected pattern never produces a partial tree.

use bitflags::bitflags;

use crate::error::PatternError;

bitflags! {
    /// Flags accepted by the analyzed regex dialect.
    ///
    /// The letters match the inline directive syntax: `(?imsx)` etc.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PatternFlags: u32 {
        /// `i` - case-insensitive matching.
        const IGNORECASE = 1;
        /// `L` - locale-dependent builtin classes.
        const LOCALE = 1 << 1;
        /// `m` - `^`/`$` match at line boundaries.
        const MULTILINE = 1 << 2;
        /// `s` - `.` also matches newline.
        const DOTALL = 1 << 3;
        /// `u` - unicode matching semantics.
        const UNICODE = 1 << 4;
        /// `x` - verbose mode: unescaped whitespace and `#` comments are
        /// insignificant.
        const VERBOSE = 1 << 5;
        /// `a` - ASCII-only builtin classes.
        const ASCII = 1 << 6;
    }
}

impl PatternFlags {
    /// Map a directive letter to its flag bit.
    pub fn from_letter(letter: u8) -> Option<PatternFlags> {
        match letter {
            b'i' => Some(PatternFlags::IGNORECASE),
            b'L' => Some(PatternFlags::LOCALE),
            b'm' => Some(PatternFlags::MULTILINE),
            b's' => Some(PatternFlags::DOTALL),
            b'u' => Some(PatternFlags::UNICODE),
            b'x' => Some(PatternFlags::VERBOSE),
            b'a' => Some(PatternFlags::ASCII),
            _ => None,
        }
    }
}

/// Merge inline directives into `requested` and validate the pattern the
/// way the host dialect's own parser would.
///
/// Returns the effective flags. Fails fast on syntax the dialect rejects:
/// unbalanced groups, unterminated classes or comments, unknown `(?`
/// extensions, repetition with nothing to repeat, backwards class ranges,
/// and the contradictory ASCII+UNICODE bitmask.
pub fn resolve_flags(
    pattern: &str,
    requested: PatternFlags,
) -> Result<PatternFlags, PatternError> {
    if requested.contains(PatternFlags::ASCII) && requested.contains(PatternFlags::UNICODE) {
        return Err(PatternError::IncompatibleFlags);
    }

    let bytes = pattern.as_bytes();
    let inline = scan_structure(bytes)?;
    let effective = requested | inline;
    if effective.contains(PatternFlags::ASCII) && effective.contains(PatternFlags::UNICODE) {
        return Err(PatternError::IncompatibleFlags);
    }

    check_repetitions(bytes, effective.contains(PatternFlags::VERBOSE))?;
    Ok(effective)
}

// === Structural scan ===
//
// One linear pass: group balance, class/comment termination, extension
// syntax, inline directive collection.

fn scan_structure(p: &[u8]) -> Result<PatternFlags, PatternError> {
    let mut inline = PatternFlags::empty();
    let mut open_positions: Vec<usize> = Vec::new();
    let mut i = 0;

    while i < p.len() {
        match p[i] {
            b'\\' => {
                if i + 1 >= p.len() {
                    return Err(PatternError::syntax(i, "bad escape (end of pattern)"));
                }
                i += 2;
            }
            b'[' => {
                i = scan_class(p, i)?;
            }
            b'(' => {
                if p.get(i + 1) == Some(&b'?') {
                    i = scan_extension(p, i, &mut inline, &mut open_positions)?;
                } else {
                    open_positions.push(i);
                    i += 1;
                }
            }
            b')' => {
                if open_positions.pop().is_none() {
                    return Err(PatternError::syntax(i, "unbalanced parenthesis"));
                }
                i += 1;
            }
            _ => i += 1,
        }
    }

    if let Some(pos) = open_positions.pop() {
        return Err(PatternError::syntax(pos, "missing ), unterminated subpattern"));
    }
    Ok(inline)
}

// `i` points at the `(` of a `(?...` construct. Returns the index to resume
// scanning at; pushes onto `open_positions` if the construct opens a group.
fn scan_extension(
    p: &[u8],
    i: usize,
    inline: &mut PatternFlags,
    open_positions: &mut Vec<usize>,
) -> Result<usize, PatternError> {
    match p.get(i + 2).copied() {
        Some(b':') | Some(b'=') | Some(b'!') => {
            open_positions.push(i);
            Ok(i + 3)
        }
        Some(b'<') => match p.get(i + 3).copied() {
            Some(b'=') | Some(b'!') => {
                open_positions.push(i);
                Ok(i + 4)
            }
            _ => Err(PatternError::syntax(i, "unknown extension (?<")),
        },
        Some(b'P') => match p.get(i + 3).copied() {
            Some(b'<') => {
                let close = find_from(p, i + 4, b'>')
                    .ok_or_else(|| PatternError::syntax(i, "missing >, unterminated name"))?;
                open_positions.push(i);
                Ok(close + 1)
            }
            Some(b'=') => {
                // (?P=name) is self-contained, no group opened
                let close = find_from(p, i + 4, b')')
                    .ok_or_else(|| PatternError::syntax(i, "missing ), unterminated name"))?;
                Ok(close + 1)
            }
            _ => Err(PatternError::syntax(i, "unknown extension (?P")),
        },
        Some(b'#') => {
            let close = find_from(p, i + 3, b')')
                .ok_or_else(|| PatternError::syntax(i, "missing ), unterminated comment"))?;
            Ok(close + 1)
        }
        Some(b'(') => {
            // conditional reference: (?(group)
            let mut j = i + 3;
            while j < p.len() && p[j].is_ascii_digit() {
                j += 1;
            }
            if j == i + 3 || p.get(j) != Some(&b')') {
                return Err(PatternError::syntax(i, "bad conditional group reference"));
            }
            open_positions.push(i);
            Ok(j + 1)
        }
        Some(c) if PatternFlags::from_letter(c).is_some() => {
            let mut j = i + 2;
            let mut flags = PatternFlags::empty();
            while j < p.len() {
                match PatternFlags::from_letter(p[j]) {
                    Some(f) => {
                        flags |= f;
                        j += 1;
                    }
                    None => break,
                }
            }
            if p.get(j) != Some(&b')') {
                return Err(PatternError::syntax(i, "unknown extension"));
            }
            *inline |= flags;
            Ok(j + 1)
        }
        _ => Err(PatternError::syntax(i, "unknown extension")),
    }
}

// `open` points at `[`. Returns the index just past the closing `]`.
// Also rejects backwards ranges between plain literal bounds.
fn scan_class(p: &[u8], open: usize) -> Result<usize, PatternError> {
    let mut i = open + 1;
    if p.get(i) == Some(&b'^') {
        i += 1;
    }
    if p.get(i) == Some(&b']') {
        // literal close-bracket in first position (host quirk)
        i += 1;
    }

    // Last plain literal byte, for the backwards-range check. None after an
    // escape or a completed range.
    let mut prev: Option<u8> = None;
    while i < p.len() {
        match p[i] {
            b']' => return Ok(i + 1),
            b'\\' => {
                if i + 1 >= p.len() {
                    return Err(PatternError::syntax(i, "bad escape (end of pattern)"));
                }
                prev = None;
                i += 2;
            }
            b'-' => {
                match (prev, p.get(i + 1)) {
                    (Some(low), Some(&high)) if high != b']' => {
                        // this dash binds as a range operator
                        if high == b'\\' {
                            i += 3;
                        } else {
                            if low > high {
                                return Err(PatternError::syntax(i, "bad character range"));
                            }
                            i += 2;
                        }
                        prev = None;
                    }
                    _ => {
                        prev = Some(b'-');
                        i += 1;
                    }
                }
            }
            _ => {
                prev = Some(p[i]);
                i += 1;
            }
        }
    }
    Err(PatternError::syntax(open, "unterminated character set"))
}

// === Repetition sanity ===
//
// Rejects `*` / `+` / `?` / `{m,n}` with no operand before it, and stacked
// operators (`a**`). Verbose mode skips insignificant whitespace/comments.

#[derive(PartialEq)]
enum Operand {
    None,
    Some,
    JustRepeated,
}

fn check_repetitions(p: &[u8], verbose: bool) -> Result<(), PatternError> {
    let mut state = Operand::None;
    let mut i = 0;

    while i < p.len() {
        let c = p[i];
        if verbose && (c == b' ' || c == b'\t' || c == b'\n' || c == b'\r' || c == 0x0b || c == 0x0c)
        {
            i += 1;
            continue;
        }
        if verbose && c == b'#' {
            i = find_from(p, i, b'\n').map(|n| n + 1).unwrap_or(p.len());
            continue;
        }
        match c {
            b'\\' => {
                i += 2;
                state = Operand::Some;
            }
            b'[' => {
                // already validated; just skip past it
                i = scan_class(p, i)?;
                state = Operand::Some;
            }
            b'(' => {
                match (p.get(i + 1).copied(), p.get(i + 2).copied()) {
                    (Some(b'?'), Some(b'#')) => {
                        i = find_from(p, i + 3, b')').map(|n| n + 1).unwrap_or(p.len());
                        state = Operand::None;
                    }
                    (Some(b'?'), Some(b'P')) if p.get(i + 3) == Some(&b'=') => {
                        i = find_from(p, i + 4, b')').map(|n| n + 1).unwrap_or(p.len());
                        state = Operand::Some;
                    }
                    (Some(b'?'), Some(c2)) if PatternFlags::from_letter(c2).is_some() => {
                        i = find_from(p, i + 2, b')').map(|n| n + 1).unwrap_or(p.len());
                        state = Operand::None;
                    }
                    _ => {
                        // group opener of some form; skip just past the
                        // decorated prefix so its body is scanned normally
                        i = skip_group_opener(p, i);
                        state = Operand::None;
                    }
                }
            }
            b')' => {
                i += 1;
                state = Operand::Some;
            }
            b'|' => {
                i += 1;
                state = Operand::None;
            }
            b'*' | b'+' | b'?' => {
                match state {
                    Operand::None => {
                        return Err(PatternError::syntax(i, "nothing to repeat"))
                    }
                    Operand::JustRepeated => {
                        return Err(PatternError::syntax(i, "multiple repeat"))
                    }
                    Operand::Some => {}
                }
                i += 1;
                if p.get(i) == Some(&b'?') {
                    i += 1;
                }
                state = Operand::JustRepeated;
            }
            b'{' => match match_repeat_curly(p, i) {
                Some(end) => {
                    match state {
                        Operand::None => {
                            return Err(PatternError::syntax(i, "nothing to repeat"))
                        }
                        Operand::JustRepeated => {
                            return Err(PatternError::syntax(i, "multiple repeat"))
                        }
                        Operand::Some => {}
                    }
                    i = end;
                    state = Operand::JustRepeated;
                }
                None => {
                    i += 1;
                    state = Operand::Some;
                }
            },
            _ => {
                i += 1;
                state = Operand::Some;
            }
        }
    }
    Ok(())
}

// `i` points at `(`. Returns the index just past the opener decoration
// ("(", "(?:", "(?=", "(?<!", "(?P<name>", "(?(1)").
fn skip_group_opener(p: &[u8], i: usize) -> usize {
    if p.get(i + 1) != Some(&b'?') {
        return i + 1;
    }
    match p.get(i + 2).copied() {
        Some(b':') | Some(b'=') | Some(b'!') => i + 3,
        Some(b'<') => i + 4,
        Some(b'P') => find_from(p, i + 3, b'>').map(|n| n + 1).unwrap_or(i + 3),
        Some(b'(') => find_from(p, i + 3, b')').map(|n| n + 1).unwrap_or(i + 3),
        _ => i + 2,
    }
}

/// Match a repetition spec `{m}`, `{m,}`, `{,n}` or `{m,n}` at `i`,
/// including a trailing non-greedy `?`. Returns the index just past it.
pub(crate) fn match_repeat_curly(p: &[u8], i: usize) -> Option<usize> {
    debug_assert_eq!(p.get(i), Some(&b'{'));
    let mut j = i + 1;
    let digits_before = eat_digits(p, &mut j);
    let comma = p.get(j) == Some(&b',');
    if comma {
        j += 1;
    }
    let digits_after = eat_digits(p, &mut j);
    if p.get(j) != Some(&b'}') {
        return None;
    }
    // at least one bound, and {m} requires no comma ambiguity
    if digits_before == 0 && digits_after == 0 {
        return None;
    }
    if !comma && digits_after > 0 {
        return None;
    }
    j += 1;
    if p.get(j) == Some(&b'?') {
        j += 1;
    }
    Some(j)
}

fn eat_digits(p: &[u8], j: &mut usize) -> usize {
    let start = *j;
    while *j < p.len() && p[*j].is_ascii_digit() {
        *j += 1;
    }
    *j - start
}

fn find_from(p: &[u8], from: usize, needle: u8) -> Option<usize> {
    if from >= p.len() {
        return None;
    }
    memchr::memchr(needle, &p[from..]).map(|n| from + n)
}
