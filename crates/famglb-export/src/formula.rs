// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Formula identifier scanning
//!
//! Formulas are free text. No expression grammar is applied: every run of
//! `[A-Za-z_][A-Za-z0-9_]*` is a candidate identifier, and everything else is
//! skipped one character at a time.

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::anychar,
    combinator::{map, recognize, value},
    multi::many0,
    sequence::pair,
    IResult, Parser,
};
use rustc_hash::FxHashSet;

/// Words with meaning in the formula language; never parameter references
pub const RESERVED_WORDS: [&str; 9] = [
    "and", "or", "not", "if", "then", "else", "true", "false", "pi",
];

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parse one identifier
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(take_while1(is_ident_start), take_while(is_ident_char))).parse(input)
}

/// Identifier, or a single skipped character
fn token(input: &str) -> IResult<&str, Option<&str>> {
    alt((map(identifier, Some), value(None, anychar))).parse(input)
}

/// Every identifier in the formula, in order, duplicates included
pub fn identifiers(formula: &str) -> Vec<&str> {
    many0(token)
        .parse(formula)
        .map(|(_, tokens)| tokens.into_iter().flatten().collect())
        .unwrap_or_default()
}

/// Whether an identifier is a reserved word (case-insensitive)
pub fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS.iter().any(|r| r.eq_ignore_ascii_case(word))
}

/// Parameter names a formula depends on
///
/// Reserved words are dropped, repeats are dropped case-insensitively, and a
/// token is kept only if `is_known` accepts it. Tokens are returned as
/// written in the formula, in first-seen order.
pub fn dependencies(formula: &str, is_known: impl Fn(&str) -> bool) -> Vec<String> {
    let mut seen = FxHashSet::default();
    let mut result = Vec::new();

    for word in identifiers(formula) {
        if is_reserved(word) {
            continue;
        }
        if !seen.insert(word.to_lowercase()) {
            continue;
        }
        if is_known(word) {
            result.push(word.to_string());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known<'a>(names: &'a [&'a str]) -> impl Fn(&str) -> bool + 'a {
        move |word| names.iter().any(|n| n.eq_ignore_ascii_case(word))
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(identifiers("Width + 2 * Trim"), vec!["Width", "Trim"]);
        assert_eq!(identifiers("a_1*(b2-_c)"), vec!["a_1", "b2", "_c"]);
        // Digits never start an identifier
        assert_eq!(identifiers("2x + 10"), vec!["x"]);
        assert!(identifiers("").is_empty());
        assert!(identifiers("1 + 2.5").is_empty());
    }

    #[test]
    fn test_non_ascii_is_skipped() {
        assert_eq!(identifiers("Länge + B"), vec!["L", "nge", "B"]);
    }

    #[test]
    fn test_reserved_words_removed() {
        let deps = dependencies("A + B * pi", known(&["A", "B", "C"]));
        assert_eq!(deps, vec!["A", "B"]);

        let deps = dependencies(
            "if(Width > 3 AND NOT Glass, TRUE, False)",
            known(&["Width", "Glass", "true"]),
        );
        assert_eq!(deps, vec!["Width", "Glass"]);
    }

    #[test]
    fn test_dependencies_keep_written_case() {
        let deps = dependencies("width + WIDTH + Height", known(&["Width", "Height"]));
        assert_eq!(deps, vec!["width", "Height"]);
    }

    #[test]
    fn test_unknown_tokens_dropped() {
        let deps = dependencies("Width * scale + Trim", known(&["Width", "Trim"]));
        assert_eq!(deps, vec!["Width", "Trim"]);
    }

    #[test]
    fn test_if_formula() {
        let deps = dependencies("if(Width > 3, 2, 1)", known(&["Width", "Panels"]));
        assert_eq!(deps, vec!["Width"]);
    }
}
