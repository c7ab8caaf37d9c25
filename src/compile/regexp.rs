//! Translation of `/pattern/` literals into the Lucene regular-expression
//! dialect accepted by `regexp` queries.
//!
//! Lucene patterns are implicitly anchored at both ends and know neither
//! shorthand classes nor flags, so `\s \d \w` are expanded, the `i` flag is
//! applied by hand as letter alternatives, and unanchored patterns get `.*`
//! on the open sides. Non-capturing and named groups become plain groups.

use crate::parse::literal::regex_parts;

const WHITESPACE: &str = " \t\n\r";
const DIGIT: &str = "0-9";
const WORD: &str = "A-Za-z0-9_";

/// Characters that are operators in Lucene regexps but literals in ours.
const RESERVED: &[char] = &['"', '#', '@', '&', '<', '>', '~'];

/// Translate a regex literal. `None` if `literal` is not a regex literal or
/// uses a construct with no Lucene equivalent (negated shorthand inside a
/// bracket class, inline flag groups).
#[must_use]
pub fn translate(literal: &str) -> Option<String> {
    let (pattern, insensitive) = regex_parts(literal)?;

    let (anchored_start, pattern) = match pattern.strip_prefix('^') {
        Some(rest) => (true, rest),
        None => (false, pattern),
    };
    let (anchored_end, pattern) = match pattern.strip_suffix('$') {
        Some(rest) if trailing_backslashes(rest) % 2 == 0 => (true, rest),
        _ => (false, pattern),
    };

    let mut out = String::with_capacity(pattern.len() * 2 + 4);
    if !anchored_start {
        out.push_str(".*");
    }

    let chars: Vec<char> = pattern.chars().collect();
    let mut in_class = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                let Some(&next) = chars.get(i + 1) else {
                    out.push_str("\\\\");
                    break;
                };
                shorthand(next, in_class, &mut out)?;
                i += 2;
                continue;
            }
            '(' if !in_class && chars.get(i + 1) == Some(&'?') => {
                let skip = group_prefix(&chars[i + 2..])?;
                out.push('(');
                i += 2 + skip;
                continue;
            }
            '[' if !in_class => {
                in_class = true;
                out.push('[');
                // A leading `^` or `]` belongs to the class syntax.
                if let Some(&lead @ ('^' | ']')) = chars.get(i + 1) {
                    out.push(lead);
                    i += 1;
                }
            }
            ']' if in_class => {
                in_class = false;
                out.push(']');
            }
            c if insensitive && c.is_ascii_alphabetic() => {
                if in_class {
                    i += class_letter(&chars, i, &mut out);
                    continue;
                }
                out.push('[');
                out.push(c.to_ascii_lowercase());
                out.push(c.to_ascii_uppercase());
                out.push(']');
            }
            c if RESERVED.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
        i += 1;
    }

    if !anchored_end {
        out.push_str(".*");
    }
    Some(out)
}

/// Emit the translation of `\<c>`.
fn shorthand(c: char, in_class: bool, out: &mut String) -> Option<()> {
    let (set, negated) = match c {
        's' => (WHITESPACE, false),
        'd' => (DIGIT, false),
        'w' => (WORD, false),
        'S' => (WHITESPACE, true),
        'D' => (DIGIT, true),
        'W' => (WORD, true),
        other => {
            out.push('\\');
            out.push(other);
            return Some(());
        }
    };
    match (in_class, negated) {
        (true, true) => return None,
        (true, false) => out.push_str(set),
        (false, negated) => {
            out.push('[');
            if negated {
                out.push('^');
            }
            out.push_str(set);
            out.push(']');
        }
    }
    Some(())
}

/// Length of the group syntax after `(?` that a plain group can drop:
/// `:` or a `<name>` / `P<name>` label. `None` for anything else.
fn group_prefix(rest: &[char]) -> Option<usize> {
    match rest {
        [':', ..] => Some(1),
        ['P', '<', ..] | ['<', ..] => {
            let open = rest.iter().position(|&c| c == '<')?;
            let close = rest.iter().position(|&c| c == '>')?;
            let name = rest.get(open + 1..close)?;
            let valid = !name.is_empty() && name.iter().all(|c| c.is_ascii_alphanumeric() || *c == '_');
            valid.then_some(close + 1)
        }
        _ => None,
    }
}

/// Emit a letter (or letter range) inside a bracket class together with its
/// other-case counterpart. Returns the number of characters consumed.
fn class_letter(chars: &[char], i: usize, out: &mut String) -> usize {
    let c = chars[i];
    if let (Some('-'), Some(&end)) = (chars.get(i + 1), chars.get(i + 2)) {
        if end.is_ascii_alphabetic() {
            out.extend([c, '-', end, swap_case(c), '-', swap_case(end)]);
            return 3;
        }
    }
    out.push(c);
    out.push(swap_case(c));
    1
}

fn swap_case(c: char) -> char {
    if c.is_ascii_lowercase() {
        c.to_ascii_uppercase()
    } else {
        c.to_ascii_lowercase()
    }
}

fn trailing_backslashes(s: &str) -> usize {
    s.chars().rev().take_while(|&c| c == '\\').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unanchored_pattern_is_wrapped() {
        assert_eq!(translate("/ab+c/").unwrap(), ".*ab+c.*");
    }

    #[test]
    fn anchors_are_dropped() {
        assert_eq!(translate("/^ab$/").unwrap(), "ab");
        assert_eq!(translate("/^ab/").unwrap(), "ab.*");
        assert_eq!(translate(r"/ab\$/").unwrap(), r".*ab\$.*");
    }

    #[test]
    fn shorthand_classes_expand() {
        assert_eq!(translate(r"/^\d\d$/").unwrap(), "[0-9][0-9]");
        assert_eq!(translate(r"/^a\sb$/").unwrap(), "a[ \t\n\r]b");
        assert_eq!(translate(r"/^\W$/").unwrap(), "[^A-Za-z0-9_]");
        assert_eq!(translate(r"/^[\d.]$/").unwrap(), "[0-9.]");
    }

    #[test]
    fn negated_shorthand_inside_class_is_rejected() {
        assert!(translate(r"/[\S]/").is_none());
    }

    #[test]
    fn case_insensitive_letters() {
        assert_eq!(translate("/^ab1$/i").unwrap(), "[aA][bB]1");
        assert_eq!(translate("/^[a-c]$/i").unwrap(), "[a-cA-C]");
        assert_eq!(translate("/^[x9]$/i").unwrap(), "[xX9]");
    }

    #[test]
    fn reserved_characters_escaped() {
        assert_eq!(translate("/^a&b<c$/").unwrap(), r"a\&b\<c");
    }

    #[test]
    fn group_extensions() {
        assert_eq!(translate("/^(?:ab)+$/").unwrap(), "(ab)+");
        assert_eq!(translate("/^(?P<x>a|b)c$/").unwrap(), "(a|b)c");
        assert_eq!(translate("/^(?<yr>\\d)$/").unwrap(), "([0-9])");
        assert_eq!(translate("/^(?:a)$/i").unwrap(), "([aA])");
        assert_eq!(translate(r"/^\(?:$/").unwrap(), r"\(?:");
        assert!(translate("/(?i)ab/").is_none());
        assert!(translate("/(?<=a)b/").is_none());
    }

    #[test]
    fn non_literals_are_rejected() {
        assert!(translate("plain").is_none());
    }
}
