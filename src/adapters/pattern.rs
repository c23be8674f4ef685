//! Character-pattern expansion for formatted identifiers (phone numbers,
//! id-card numbers, MAC addresses).
//!
//! Supported syntax:
//! - `\d` digit, `\a` lowercase letter, `\A` uppercase letter
//! - `\x` / `\X` lower / upper hex digit, `\w` word character
//! - `\s` space, `\\` literal backslash, any other `\c` is the literal `c`
//! - `[abc]`, `[a-z0-9X]` one character from the class
//! - `{n}` / `{n,m}` repeat the previous atom, each repetition drawn afresh
//! - anything else is copied literally

use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone)]
enum Atom {
    Literal(char),
    Class(Vec<char>),
}

impl Atom {
    fn draw<R: Rng>(&self, rng: &mut R) -> Option<char> {
        match self {
            Atom::Literal(c) => Some(*c),
            Atom::Class(chars) => chars.choose(rng).copied(),
        }
    }
}

fn escape_class(c: char) -> Atom {
    match c {
        'd' => Atom::Class(('0'..='9').collect()),
        'a' => Atom::Class(('a'..='z').collect()),
        'A' => Atom::Class(('A'..='Z').collect()),
        'x' => Atom::Class(('0'..='9').chain('a'..='f').collect()),
        'X' => Atom::Class(('0'..='9').chain('A'..='F').collect()),
        'w' => Atom::Class(
            ('a'..='z')
                .chain('A'..='Z')
                .chain('0'..='9')
                .chain(std::iter::once('_'))
                .collect(),
        ),
        's' => Atom::Literal(' '),
        other => Atom::Literal(other),
    }
}

pub fn expand<R: Rng>(pattern: &str, rng: &mut R) -> String {
    let mut result = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    let mut last: Option<Atom> = None;

    while let Some(ch) = chars.next() {
        let atom = match ch {
            '\\' => match chars.next() {
                Some(next) => escape_class(next),
                None => Atom::Literal('\\'),
            },
            '[' => {
                let mut class: Vec<char> = Vec::new();
                while let Some(c) = chars.next() {
                    if c == ']' {
                        break;
                    }
                    if chars.peek() == Some(&'-') {
                        chars.next();
                        match chars.peek().copied() {
                            Some(end) if end != ']' => {
                                chars.next();
                                class.extend(c..=end);
                                continue;
                            }
                            _ => class.push('-'),
                        }
                    }
                    class.push(c);
                }
                Atom::Class(class)
            }
            '{' => {
                let mut spec = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    spec.push(c);
                }
                let (min, max) = parse_repeat(&spec);
                let count = if min >= max { min } else { rng.gen_range(min..=max) };
                if let Some(prev) = &last {
                    // the previous atom already produced one character
                    for _ in 1..count {
                        if let Some(c) = prev.draw(rng) {
                            result.push(c);
                        }
                    }
                }
                continue;
            }
            other => Atom::Literal(other),
        };

        if let Some(c) = atom.draw(rng) {
            result.push(c);
        }
        last = Some(atom);
    }

    result
}

fn parse_repeat(spec: &str) -> (usize, usize) {
    match spec.split_once(',') {
        Some((lo, hi)) => {
            let min = lo.trim().parse().unwrap_or(1);
            let max = hi.trim().parse().unwrap_or(min);
            (min, max)
        }
        None => {
            let n = spec.trim().parse().unwrap_or(1);
            (n, n)
        }
    }
}
