//! Natural ordering for page names
//!
//! Digit runs compare by numeric value, so `page2.jpg` sorts before
//! `page10.jpg`. Letters compare case-insensitively, and punctuation sorts
//! before digits which sort before letters.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Number(&'a str),
    Char(char),
}

impl Token<'_> {
    fn rank(&self) -> u8 {
        match self {
            Token::Char(c) if c.is_alphabetic() => 2,
            Token::Number(_) => 1,
            Token::Char(_) => 0,
        }
    }
}

struct Tokens<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Tokens<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
        }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (start, c) = self.chars.next()?;
        if !c.is_ascii_digit() {
            return Some(Token::Char(c));
        }

        let mut end = start + c.len_utf8();
        while let Some(&(idx, next)) = self.chars.peek() {
            if !next.is_ascii_digit() {
                break;
            }
            end = idx + next.len_utf8();
            self.chars.next();
        }
        Some(Token::Number(&self.source[start..end]))
    }
}

fn compare_numbers(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_chars(a: char, b: char) -> Ordering {
    a.to_lowercase().cmp(b.to_lowercase())
}

/// Compares two names using natural ordering.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Tokens::new(a);
    let mut right = Tokens::new(b);

    loop {
        let ordering = match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(Token::Number(x)), Some(Token::Number(y))) => compare_numbers(x, y),
            (Some(Token::Char(x)), Some(Token::Char(y)))
                if x.is_alphabetic() == y.is_alphabetic() =>
            {
                compare_chars(x, y)
            }
            (Some(x), Some(y)) => x.rank().cmp(&y.rank()),
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

/// Sorts items in place by a name key using natural ordering.
pub fn sort_naturally_by<T, F>(items: &mut [T], mut name: F)
where
    F: FnMut(&T) -> &str,
{
    items.sort_by(|a, b| natural_cmp(name(a), name(b)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_runs_compare_by_value() {
        assert_eq!(natural_cmp("page2.jpg", "page10.jpg"), Ordering::Less);
        assert_eq!(natural_cmp("page2.jpg", "page1.jpg"), Ordering::Greater);
        assert_eq!(natural_cmp("page10.jpg", "page9.jpg"), Ordering::Greater);
    }

    #[test]
    fn leading_zeros_do_not_change_numeric_value() {
        assert_eq!(natural_cmp("page007.png", "page8.png"), Ordering::Less);
        assert_eq!(natural_cmp("page010.png", "page9.png"), Ordering::Greater);
    }

    #[test]
    fn letters_compare_case_insensitively() {
        assert_eq!(natural_cmp("Chapter2/a.png", "chapter10/a.png"), Ordering::Less);
        assert_eq!(natural_cmp("b.png", "A.png"), Ordering::Greater);
    }

    #[test]
    fn punctuation_sorts_before_digits_and_letters() {
        assert_eq!(natural_cmp("page.jpg", "page1.jpg"), Ordering::Less);
        assert_eq!(natural_cmp("1.jpg", "a.jpg"), Ordering::Less);
    }

    #[test]
    fn directory_paths_sort_per_component() {
        let mut names = vec![
            "vol2/page1.png",
            "vol10/page1.png",
            "vol1/page10.png",
            "vol1/page2.png",
        ];
        sort_naturally_by(&mut names, |n| *n);
        assert_eq!(
            names,
            vec![
                "vol1/page2.png",
                "vol1/page10.png",
                "vol2/page1.png",
                "vol10/page1.png",
            ]
        );
    }

    #[test]
    fn identical_names_are_equal() {
        assert_eq!(natural_cmp("page1.png", "page1.png"), Ordering::Equal);
    }

    #[test]
    fn non_ascii_names_do_not_panic() {
        assert_eq!(natural_cmp("หน้า2.png", "หน้า10.png"), Ordering::Less);
    }
}
