//! Character composition of a URL.

use serde::Serialize;

/// Counts and ratios of character classes in a URL.
///
/// Ratios divide by the character length, floored to 1 so the empty string
/// yields zeros instead of NaN.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Composition {
    pub letters: usize,
    pub letter_ratio: f64,
    pub digits: usize,
    pub digit_ratio: f64,
    pub equals: usize,
    pub question_marks: usize,
    pub ampersands: usize,
    pub hashtags: usize,
    /// Non-alphanumeric characters other than `=`, `?`, `&` and `#`.
    pub other_special: usize,
    pub other_special_ratio: f64,
}

impl Composition {
    pub fn of(url: &str) -> Self {
        let len = url.chars().count().max(1) as f64;

        let mut c = Composition {
            letters: 0,
            letter_ratio: 0.0,
            digits: 0,
            digit_ratio: 0.0,
            equals: 0,
            question_marks: 0,
            ampersands: 0,
            hashtags: 0,
            other_special: 0,
            other_special_ratio: 0.0,
        };

        for ch in url.chars() {
            if ch.is_alphabetic() {
                c.letters += 1;
            } else if ch.is_numeric() {
                c.digits += 1;
            }
            match ch {
                '=' => c.equals += 1,
                '?' => c.question_marks += 1,
                '&' => c.ampersands += 1,
                '#' => c.hashtags += 1,
                _ if !ch.is_alphanumeric() => c.other_special += 1,
                _ => {}
            }
        }

        c.letter_ratio = c.letters as f64 / len;
        c.digit_ratio = c.digits as f64 / len;
        c.other_special_ratio = c.other_special as f64 / len;
        c
    }
}
