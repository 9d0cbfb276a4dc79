//! File name normalization.
//!
//! Turns an arbitrary file name into a filesystem-safe one: Ukrainian Cyrillic
//! letters in the stem are transliterated to Latin, and every remaining non-word
//! character in the stem becomes `_`. The extension chain is kept as it was.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Lowercase source alphabet and its Latin replacement.
///
/// Uppercase letters map to the uppercased replacement (`Щ` → `SCH`).
pub const TRANSLITERATION: &[(char, &str)] = &[
    ('а', "a"),
    ('б', "b"),
    ('в', "v"),
    ('г', "g"),
    ('ґ', "g"),
    ('д', "d"),
    ('е', "e"),
    ('є', "je"),
    ('ж', "zh"),
    ('з', "z"),
    ('и', "y"),
    ('і', "i"),
    ('ї', "ji"),
    ('й', "j"),
    ('к', "k"),
    ('л', "l"),
    ('м', "m"),
    ('н', "n"),
    ('о', "o"),
    ('п', "p"),
    ('р', "r"),
    ('с', "s"),
    ('т', "t"),
    ('у', "u"),
    ('ф', "f"),
    ('х', "h"),
    ('ц', "ts"),
    ('ч', "ch"),
    ('ш', "sh"),
    ('щ', "sch"),
    ('ь', ""),
    ('ю', "ju"),
    ('я', "ja"),
];

static TRANSLIT_MAP: LazyLock<HashMap<char, String>> = LazyLock::new(|| {
    let mut map = HashMap::with_capacity(TRANSLITERATION.len() * 2);
    for &(letter, latin) in TRANSLITERATION {
        map.insert(letter, latin.to_string());
        for upper in letter.to_uppercase() {
            map.insert(upper, latin.to_uppercase());
        }
    }
    map
});

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\W").expect("static regex is valid"));

/// Transliterates every letter of the source alphabet, leaving other characters as they are.
pub fn transliterate(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match TRANSLIT_MAP.get(&c) {
            Some(latin) => result.push_str(latin),
            None => result.push(c),
        }
    }
    result
}

/// Normalizes a file name.
///
/// The part before the first `.` is transliterated and sanitized, everything after
/// it is appended unchanged. A name without any dot gets no trailing dot, and a
/// name that would come out empty (such as a lone `Ь`) becomes `_`.
///
/// # Examples
///
/// ```
/// use dirsort::normalize::normalize;
///
/// assert_eq!(normalize("Звіт за рік.pdf"), "Zvit_za_rik.pdf");
/// assert_eq!(normalize("backup.tar.gz"), "backup.tar.gz");
/// assert_eq!(normalize("README"), "README");
/// ```
pub fn normalize(name: &str) -> String {
    let (stem, extension) = match name.split_once('.') {
        Some((stem, extension)) => (stem, Some(extension)),
        None => (name, None),
    };

    let transliterated = transliterate(stem);
    let sanitized = NON_WORD.replace_all(&transliterated, "_");

    match extension {
        Some(extension) => format!("{}.{}", sanitized, extension),
        None if sanitized.is_empty() => "_".to_string(),
        None => sanitized.into_owned(),
    }
}
