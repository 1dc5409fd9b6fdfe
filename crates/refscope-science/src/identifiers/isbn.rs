use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScienceError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Isbn {
    pub raw: String,
    pub isbn13: String,
    pub isbn10: Option<String>,
}

fn strip_isbn(input: &str) -> String {
    let trimmed = input.trim();
    let body = match trimmed.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("isbn") => &trimmed[4..],
        _ => trimmed,
    };
    body.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

fn isbn13_check_digit(first12: &[u32]) -> u32 {
    let sum: u32 = first12
        .iter()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { *d } else { d * 3 })
        .sum();
    (10 - sum % 10) % 10
}

fn isbn10_check_char(first9: &[u32]) -> char {
    let sum: u32 = first9
        .iter()
        .enumerate()
        .map(|(i, d)| (10 - i as u32) * d)
        .sum();
    match (11 - sum % 11) % 11 {
        10 => 'X',
        n => char::from_digit(n, 10).unwrap_or('0'),
    }
}

fn digits_of(s: &str) -> Option<Vec<u32>> {
    s.chars().map(|c| c.to_digit(10)).collect()
}

fn join_digits(digits: &[u32]) -> String {
    digits.iter().map(|d| d.to_string()).collect()
}

impl Isbn {
    /// Parses ISBN-10 or ISBN-13 (hyphens, spaces and an `ISBN` prefix are
    /// ignored) and validates the check digit. ISBN-10 input is converted to
    /// its ISBN-13 form.
    pub fn parse(input: &str) -> Result<Self> {
        let stripped = strip_isbn(input);
        let invalid = || ScienceError::InvalidIsbn(input.to_string());

        match stripped.len() {
            13 => {
                let digits = digits_of(&stripped).ok_or_else(invalid)?;
                if !(stripped.starts_with("978") || stripped.starts_with("979")) {
                    return Err(invalid());
                }
                if isbn13_check_digit(&digits[..12]) != digits[12] {
                    return Err(invalid());
                }
                let isbn10 = stripped.starts_with("978").then(|| {
                    let mut s = join_digits(&digits[3..12]);
                    s.push(isbn10_check_char(&digits[3..12]));
                    s
                });
                Ok(Self {
                    raw: input.to_string(),
                    isbn13: stripped,
                    isbn10,
                })
            }
            10 => {
                let first9 = digits_of(&stripped[..9]).ok_or_else(invalid)?;
                let check = stripped.chars().last().ok_or_else(invalid)?;
                if isbn10_check_char(&first9) != check {
                    return Err(invalid());
                }
                let mut d13 = vec![9, 7, 8];
                d13.extend_from_slice(&first9);
                d13.push(isbn13_check_digit(&d13));
                Ok(Self {
                    raw: input.to_string(),
                    isbn13: join_digits(&d13),
                    isbn10: Some(stripped),
                })
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.isbn13)
    }
}
