//! Text canonicalization shared by spoken queries and catalog labels.
//!
//! Number words are converted one token at a time. There is no compound-number
//! parsing: "one hundred" becomes "1 100", and "twenty one" becomes "20 1".

/// Lower-cases, strips punctuation, collapses whitespace and converts number words
/// to digits.
pub fn normalize(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for character in text.chars().flat_map(char::to_lowercase) {
        if is_elided(character) {
            continue;
        }
        if is_separator(character) {
            cleaned.push(' ');
        } else {
            cleaned.push(character);
        }
    }

    cleaned.split_whitespace().map(convert_number_word).collect::<Vec<_>>().join(" ")
}

/// Normalized tokens of `text`, first occurrence wins.
pub fn tokens(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for token in normalize(text).split(' ').filter(|token| !token.is_empty()) {
        if !seen.iter().any(|existing: &String| existing == token) {
            seen.push(token.to_owned());
        }
    }
    seen
}

fn is_elided(character: char) -> bool {
    matches!(character, '\'' | '\u{2019}' | '`')
}

fn is_separator(character: char) -> bool {
    matches!(
        character,
        '-' | '\u{2013}'
            | '\u{2014}'
            | '_'
            | '.'
            | ','
            | '!'
            | '?'
            | ':'
            | ';'
            | '"'
            | '('
            | ')'
            | '['
            | ']'
            | '/'
            | '&'
            | '+'
    ) || character.is_whitespace()
}

fn convert_number_word(token: &str) -> String {
    match number_word(token) {
        Some(value) => value.to_string(),
        None => token.to_owned(),
    }
}

fn number_word(token: &str) -> Option<u32> {
    let value = match token {
        "zero" => 0,
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        "twenty" => 20,
        "thirty" => 30,
        "forty" => 40,
        "fifty" => 50,
        "sixty" => 60,
        "seventy" => 70,
        "eighty" => 80,
        "ninety" => 90,
        "hundred" => 100,
        "thousand" => 1_000,
        "million" => 1_000_000,
        _ => return None,
    };
    Some(value)
}
