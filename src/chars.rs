// chars.rs - Character-level semantics: escape decoding, escaping for
// display, char categories, and the builtin class code sets.
//
// eval_char() must agree with the host dialect's escape semantics; the
// charclass simplifier trusts these codes when proposing rewrites.

/// Characters matched by `\s` (single-byte domain), in matching order.
pub const WHITESPACE: &str = " \t\n\r\x0b\x0c";

/// Characters matched by `\d`, in matching order.
pub const DIGITS: &str = "0123456789";

/// Characters matched by `\w`, in matching order.
pub const WORD: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_";

/// The code points a builtin shorthand class matches. Lowercase letters give
/// the class itself, uppercase the 0-255 complement.
pub fn builtin_codes(letter: u8) -> Vec<u32> {
    let base: &str = match letter.to_ascii_lowercase() {
        b's' => WHITESPACE,
        b'd' => DIGITS,
        b'w' => WORD,
        _ => panic!("not a builtin class letter: {}", letter as char),
    };
    if letter.is_ascii_lowercase() {
        base.chars().map(|c| c as u32).collect()
    } else {
        (0u32..256).filter(|&i| !base.contains(char::from(i as u8))).collect()
    }
}

// === Escape decoding ===

/// Decode a single token's text to the character code it matches.
///
/// Handles octal (`\0oo`), hex (`\xNN`), unicode (`\uNNNN`, `\UNNNNNNNN`),
/// named (`\N{NAME}`, fixed table), control escapes, and the redundant
/// backslash (`\q` means `q`). Unknown character names fail; the host
/// dialect rejects those patterns outright.
pub fn eval_char(text: &str) -> Result<u32, String> {
    let mut chars = text.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return Err("empty character text".to_string()),
    };
    if chars.as_str().is_empty() {
        return Ok(first as u32);
    }
    if first != '\\' {
        // multi-char plain text should not reach here
        return Err(format!("not a single character: {:?}", text));
    }

    let rest = chars.as_str();
    let mut rc = rest.chars();
    let kind = rc.next().ok_or_else(|| "dangling backslash".to_string())?;
    match kind {
        '0' => {
            // \0 plus up to two more octal digits
            u32::from_str_radix(rest, 8).map_err(|_| format!("bad octal escape: {:?}", text))
        }
        'x' => from_hex(rc.as_str(), 2, text),
        'u' => {
            if rest == "u" {
                // truncated escape tokenized as suspicious; means a bare 'u'
                return Ok('u' as u32);
            }
            from_hex(rc.as_str(), 4, text)
        }
        'U' => from_hex(rc.as_str(), 8, text),
        'N' => {
            let name = rc
                .as_str()
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .ok_or_else(|| format!("malformed named escape: {:?}", text))?;
            named_code(name).ok_or_else(|| format!("unknown character name: {:?}", name))
        }
        'a' => Ok(0x07),
        'b' => Ok(0x08),
        't' => Ok(0x09),
        'n' => Ok(0x0a),
        'v' => Ok(0x0b),
        'f' => Ok(0x0c),
        'r' => Ok(0x0d),
        '\\' => Ok('\\' as u32),
        c if c.is_ascii_digit() => Err(format!("bad numeric escape: {:?}", text)),
        c => Ok(c as u32), // unnecessary backslash
    }
}

fn from_hex(digits: &str, want: usize, whole: &str) -> Result<u32, String> {
    if digits.len() != want {
        return Err(format!("bad hex escape: {:?}", whole));
    }
    u32::from_str_radix(digits, 16).map_err(|_| format!("bad hex escape: {:?}", whole))
}

// Fixed table of the character names that occur in real single-byte
// patterns. Anything else is an unknown name.
fn named_code(name: &str) -> Option<u32> {
    let code = match name {
        "NULL" | "NUL" => 0,
        "BEL" | "ALERT" => 0x07,
        "BACKSPACE" => 0x08,
        "CHARACTER TABULATION" | "TAB" | "HORIZONTAL TABULATION" => 0x09,
        "LINE FEED" | "NEW LINE" | "LF" => 0x0a,
        "CARRIAGE RETURN" | "CR" => 0x0d,
        "ESCAPE" | "ESC" => 0x1b,
        "SPACE" => 0x20,
        "EXCLAMATION MARK" => 0x21,
        "QUOTATION MARK" => 0x22,
        "NUMBER SIGN" => 0x23,
        "DOLLAR SIGN" => 0x24,
        "PERCENT SIGN" => 0x25,
        "AMPERSAND" => 0x26,
        "APOSTROPHE" => 0x27,
        "LEFT PARENTHESIS" => 0x28,
        "RIGHT PARENTHESIS" => 0x29,
        "ASTERISK" => 0x2a,
        "PLUS SIGN" => 0x2b,
        "COMMA" => 0x2c,
        "HYPHEN-MINUS" => 0x2d,
        "FULL STOP" => 0x2e,
        "SOLIDUS" => 0x2f,
        "COLON" => 0x3a,
        "SEMICOLON" => 0x3b,
        "LESS-THAN SIGN" => 0x3c,
        "EQUALS SIGN" => 0x3d,
        "GREATER-THAN SIGN" => 0x3e,
        "QUESTION MARK" => 0x3f,
        "COMMERCIAL AT" => 0x40,
        "LEFT SQUARE BRACKET" => 0x5b,
        "REVERSE SOLIDUS" => 0x5c,
        "RIGHT SQUARE BRACKET" => 0x5d,
        "CIRCUMFLEX ACCENT" => 0x5e,
        "LOW LINE" => 0x5f,
        "GRAVE ACCENT" => 0x60,
        "LEFT CURLY BRACKET" => 0x7b,
        "VERTICAL LINE" => 0x7c,
        "RIGHT CURLY BRACKET" => 0x7d,
        "TILDE" => 0x7e,
        _ => return None,
    };
    Some(code)
}

// === Escaping for display ===

/// Render a character code for use inside a suggested class body.
///
/// `also_escape` lists additional characters that get a backslash in the
/// current context (class metacharacters, mostly).
pub fn esc(code: u32, also_escape: &str) -> String {
    match code {
        0x0d => return "\\r".to_string(),
        0x0a => return "\\n".to_string(),
        0x09 => return "\\t".to_string(),
        0x5c => return "\\\\".to_string(),
        0x27 => return "\\'".to_string(),
        _ => {}
    }
    if code > 0xffff {
        format!("\\U{:08x}", code)
    } else if code > 0xff {
        format!("\\u{:04x}", code)
    } else if code < 0x20 || code > 0x7e {
        format!("\\x{:02x}", code)
    } else {
        let c = char::from(code as u8);
        if also_escape.contains(c) {
            format!("\\{}", c)
        } else {
            c.to_string()
        }
    }
}

// === Char categories ===

/// Coarse category used for range homogeneity and run merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharCategory {
    Upper,
    Lower,
    Digit,
    Other,
}

pub fn char_category(code: u32) -> CharCategory {
    match code {
        0x41..=0x5a => CharCategory::Upper,
        0x61..=0x7a => CharCategory::Lower,
        0x30..=0x39 => CharCategory::Digit,
        _ => CharCategory::Other,
    }
}

/// Fold an upper-case ASCII code to lower case; everything else unchanged.
pub fn lowercase_code(code: u32) -> u32 {
    if (0x41..=0x5a).contains(&code) {
        code + 32
    } else {
        code
    }
}
