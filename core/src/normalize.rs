use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // Letter/digit runs joined by single inner separators, e.g. `oem-99`, `12.5`, `a/b`.
    static ref TOKEN_RE: Regex =
        Regex::new(r"(?u)[\p{L}\p{N}]+(?:[-./][\p{L}\p{N}]+)*").expect("valid regex");
}

/// Upper bound on fold passes; real input is stable after one or two.
const MAX_FOLD_PASSES: usize = 4;

/// Canonical form of a raw search string.
///
/// Compatibility-decomposes the text, drops diacritics, lowercases,
/// splits it into tokens and joins them back with single spaces. Tokens
/// that look like product codes (they carry an ASCII letter or digit)
/// get their Cyrillic look-alike letters replaced by Latin ones, so
/// `АВ-12` typed on a Cyrillic layout ends up as `ab-12`.
///
/// Total and idempotent: `normalize_search_string(normalize_search_string(s))`
/// equals `normalize_search_string(s)` and empty input yields `""`.
pub fn normalize_search_string(raw: &str) -> String {
    let folded = fold_until_stable(raw);
    let mut out = String::with_capacity(folded.len());
    for token in TOKEN_RE.find_iter(&folded) {
        if !out.is_empty() {
            out.push(' ');
        }
        let token = token.as_str();
        if looks_like_code(token) {
            out.extend(token.chars().map(|c| latin_lookalike(c).unwrap_or(c)));
        } else {
            out.push_str(token);
        }
    }
    out
}

/// Strip everything but letters and digits: `"oem-99 ab"` becomes `"oem99ab"`.
pub fn compact_code(normalized: &str) -> String {
    normalized.chars().filter(|c| c.is_alphanumeric()).collect()
}

fn fold(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

// Lowercasing may produce characters that decompose further (and the
// other way around), so fold to a fixed point.
fn fold_until_stable(text: &str) -> String {
    let mut current = fold(text);
    for _ in 1..MAX_FOLD_PASSES {
        let next = fold(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn looks_like_code(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_alphanumeric())
}

fn latin_lookalike(c: char) -> Option<char> {
    let latin = match c {
        'а' => 'a',
        'в' => 'b',
        'е' => 'e',
        'к' => 'k',
        'м' => 'm',
        'н' => 'h',
        'о' => 'o',
        'р' => 'p',
        'с' => 'c',
        'т' => 't',
        'у' => 'y',
        'х' => 'x',
        'і' => 'i',
        'ј' => 'j',
        _ => return None,
    };
    Some(latin)
}
