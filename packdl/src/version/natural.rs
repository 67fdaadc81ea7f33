//! Natural ordering for platform-version group labels.

use std::cmp::Ordering;

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Number(&'a str),
    Text(&'a str),
}

fn tokenize(s: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_digits = None;

    for (i, c) in s.char_indices() {
        let is_digit = c.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != is_digit => {
                tokens.push(make_token(&s[start..i], prev));
                start = i;
            }
            _ => {}
        }
        in_digits = Some(is_digit);
    }
    if let Some(prev) = in_digits {
        tokens.push(make_token(&s[start..], prev));
    }
    tokens
}

fn make_token(run: &str, digits: bool) -> Token<'_> {
    if digits {
        Token::Number(run)
    } else {
        Token::Text(run)
    }
}

/// Compare two digit runs numerically without parsing (no overflow).
fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Compare two labels, treating digit runs as numbers.
///
/// Numbers sort below text at the same position; when one label is a
/// prefix of the other, the shorter one is less.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use packdl::version::natural_cmp;
///
/// assert_eq!(natural_cmp("1.21.11", "1.21.4"), Ordering::Greater);
/// assert_eq!(natural_cmp("1.20", "1.20.1"), Ordering::Less);
/// ```
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let left = tokenize(a);
    let right = tokenize(b);

    for (l, r) in left.iter().zip(right.iter()) {
        let ord = match (l, r) {
            (Token::Number(x), Token::Number(y)) => cmp_digit_runs(x, y),
            (Token::Text(x), Token::Text(y)) => x.cmp(y),
            (Token::Number(_), Token::Text(_)) => Ordering::Less,
            (Token::Text(_), Token::Number(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    left.len().cmp(&right.len())
}
