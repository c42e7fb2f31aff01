// charclass.rs - Shortest-equivalent-charclass search.
//
// Given the exact code set a class matches, find the shortest class body
// that matches the same set, trying every combination of builtin category
// shorthands over both polarities. All set algebra runs on BitVec256.
//
// Some classes read better unshortened; those raise WontOptimize instead of
// a suggestion.

use std::fmt;

use smallvec::SmallVec;

use crate::bitvector::BitVec256;
use crate::chars::{builtin_codes, char_category, esc, lowercase_code, CharCategory};

/// Category shorthands in search order. Negated-category keys come last so
/// the `\w\W` style pairs stay in reading order.
const CATEGORY_KEYS: [&str; 6] = ["\\w", "\\s", "\\d", "\\W", "\\S", "\\D"];

/// One element of a suggested class body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassEntry {
    /// A builtin shorthand such as `\w`.
    Category(&'static str),
    /// A single code point.
    Single(u32),
    /// An inclusive range of code points.
    Range(u32, u32),
}

/// Explicit "don't rewrite this" signal; not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WontOptimize {
    /// Looks like a hex digit set; `0-9a-f` reads better than `\da-f`.
    HexDigit,
    /// Alphanumerics without underscore; close to `\w` but not it.
    AlnumWithoutUnderscore,
    /// Contains code points outside the single-byte domain.
    WideCodes,
}

impl fmt::Display for WontOptimize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WontOptimize::HexDigit => write!(f, "hex digit"),
            WontOptimize::AlnumWithoutUnderscore => write!(f, "alphanumeric without _"),
            WontOptimize::WideCodes => write!(f, "codes outside 0-255"),
        }
    }
}

fn category_set(key: &str, base: &BitVec256) -> BitVec256 {
    let letter = key.as_bytes()[1];
    BitVec256::from_codes(builtin_codes(letter)).intersection(base)
}

/// Find the shortest equivalent class body for `matching_codes`.
///
/// Returns the body entries and whether the class is negated. Under
/// `ignorecase` the target and the 0-255 domain are folded to lower case
/// before the search, and negation is computed against the folded domain.
pub fn simplify_charclass(
    matching_codes: &[u32],
    ignorecase: bool,
) -> Result<(Vec<ClassEntry>, bool), WontOptimize> {
    if matching_codes.iter().any(|&c| c > 255) {
        return Err(WontOptimize::WideCodes);
    }

    let raw_target = BitVec256::from_codes(matching_codes.iter().copied());

    // Don't simplify something that looks fairly like a hex digit pattern.
    let hex = BitVec256::from_codes("0123456789abcdef".chars().map(|c| c as u32));
    if hex.is_subset_of(&raw_target) && !raw_target.contains('g' as u32) {
        return Err(WontOptimize::HexDigit);
    }
    let alnum = BitVec256::from_codes((b'a'..=b'z').chain(b'0'..=b'9').map(u32::from));
    if alnum.is_subset_of(&raw_target) && !raw_target.contains('_' as u32) {
        return Err(WontOptimize::AlnumWithoutUnderscore);
    }

    let (target, base) = if ignorecase {
        (
            BitVec256::from_codes(matching_codes.iter().map(|&c| lowercase_code(c))),
            BitVec256::from_codes((0u32..256).map(lowercase_code)),
        )
    } else {
        (raw_target, BitVec256::from_codes(0u32..256))
    };

    let mut best: Option<(isize, Vec<ClassEntry>, bool)> = None;

    for negated in [false, true] {
        let matching = if negated {
            base.difference(&target)
        } else {
            target
        };

        for mask in 0u32..(1 << CATEGORY_KEYS.len()) {
            let chosen: SmallVec<[&'static str; 6]> = CATEGORY_KEYS
                .iter()
                .enumerate()
                .filter(|(b, _)| mask & (1 << b) != 0)
                .map(|(_, &k)| k)
                .collect();

            // Humans are terrible at double-negatives: never mix a negated
            // category into an already-negated class.
            if negated && chosen.iter().any(|k| k.as_bytes()[1].is_ascii_uppercase()) {
                continue;
            }

            let mut chosen_set = BitVec256::EMPTY;
            for key in &chosen {
                chosen_set = chosen_set.union(&category_set(key, &base));
            }
            if !chosen_set.is_subset_of(&matching) {
                continue;
            }

            let remainder = matching.difference(&chosen_set);
            let mut entries: Vec<ClassEntry> =
                chosen.iter().map(|&k| ClassEntry::Category(k)).collect();
            entries.extend(build_ranges(&remainder));
            if entries.is_empty() {
                continue;
            }

            let discount =
                if chosen.len() == 2 && chosen[0] == "\\w" && chosen[1] == "\\W" { 1 } else { 0 };
            let score = charclass_score(&entries, negated) as isize - discount;

            let better = match &best {
                Some((s, _, _)) => score < *s,
                None => true,
            };
            if better {
                best = Some((score, entries, negated));
            }
        }
    }

    // the no-categories subset always qualifies, so a winner always exists
    let (_, entries, negated) = best.expect("empty search space");
    Ok((entries, negated))
}

/// Approximate rendered length of a class body, the search's cost metric.
/// Negation costs one extra character.
pub fn charclass_score(items: &[ClassEntry], negated: bool) -> usize {
    build_output(items).len() + usize::from(negated)
}

/// Render suggested entries as the inside of a `[...]`.
pub fn build_output(items: &[ClassEntry]) -> String {
    // single quotes and class metacharacters need a backslash here
    let class_esc = |code: u32| esc(code, "'-[]");

    let mut buf = String::new();
    for item in items {
        match item {
            ClassEntry::Category(key) => buf.push_str(key),
            ClassEntry::Range(a, b) => {
                if *b != a + 1 {
                    buf.push_str(&class_esc(*a));
                    buf.push('-');
                    buf.push_str(&class_esc(*b));
                } else {
                    // width-two span: adjacent characters beat range syntax
                    buf.push_str(&class_esc(*a));
                    buf.push_str(&class_esc(*b));
                }
            }
            ClassEntry::Single(code) => buf.push_str(&class_esc(*code)),
        }
    }
    buf
}

/// Convert a code set to minimal run-length entries. Adjacent codes merge
/// into a range only within one character category; `other` codes never
/// merge, so a span like `9-A` cannot appear.
pub fn build_ranges(codes: &BitVec256) -> Vec<ClassEntry> {
    let mut entries = Vec::new();
    let mut run: Option<(u32, u32, CharCategory)> = None;

    for code in codes.codes() {
        let cat = char_category(code);
        match run {
            Some((start, end, run_cat))
                if run_cat != CharCategory::Other && cat == run_cat && end == code - 1 =>
            {
                run = Some((start, code, run_cat));
            }
            _ => {
                if let Some(r) = run {
                    entries.push(flush(r));
                }
                run = Some((code, code, cat));
            }
        }
    }
    if let Some(r) = run {
        entries.push(flush(r));
    }
    entries
}

fn flush((start, end, _): (u32, u32, CharCategory)) -> ClassEntry {
    if start == end {
        ClassEntry::Single(start)
    } else {
        ClassEntry::Range(start, end)
    }
}
