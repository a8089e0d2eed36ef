//! Book-code resolution.
//!
//! Maps the many ways a book is named in source material (USFM identifiers,
//! display names, filename fragments, storage codes) onto the canonical
//! storage `book_code`.
//!
//! Resolution runs in two passes over a normalized candidate (lowercase,
//! ASCII letters and digits only, so `"1 Samuel"`, `"1_samuel"` and `"1SA"`
//! compare as `1samuel`/`1sa`):
//!
//! 1. exact match against the alias table;
//! 2. loose containment against full names. A single hit wins; with several,
//!    the longest contained name wins, and a tie is unresolved.

use std::collections::HashMap;

use crate::canon::Canon;
use crate::error::UnresolvedBookError;

/// Common spellings that neither the USFM code nor the display name covers.
const EXTRA_ALIASES: &[(&str, &str)] = &[
    ("psalm", "psalms"),
    ("ps", "psalms"),
    ("songofsongs", "song_of_solomon"),
    ("song", "song_of_solomon"),
    ("canticles", "song_of_solomon"),
    ("qoheleth", "ecclesiastes"),
    ("revelations", "revelation"),
    ("apocalypse", "revelation"),
    ("acts of the apostles", "acts"),
];

fn normalize(candidate: &str) -> String {
    candidate
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Resolver over one [`Canon`]. Cheap to clone; holds only `'static` strings.
#[derive(Debug, Clone)]
pub struct BookResolver {
    aliases: HashMap<String, &'static str>,
    /// `(normalized full name, book_code)` for the containment pass.
    names: Vec<(String, &'static str)>,
}

impl BookResolver {
    pub fn new(canon: &Canon) -> Self {
        let mut aliases = HashMap::new();
        let mut names = Vec::with_capacity(canon.books().len());
        for book in canon.books() {
            aliases.insert(normalize(book.usfm_code), book.code);
            aliases.insert(normalize(book.code), book.code);
            aliases.insert(normalize(book.name), book.code);
            names.push((normalize(book.name), book.code));
        }
        for (alias, code) in EXTRA_ALIASES {
            if let Ok(book) = canon.book(code) {
                aliases.insert(normalize(alias), book.code);
            }
        }
        Self { aliases, names }
    }

    /// Resolves `candidate` to a canonical `book_code`.
    pub fn resolve(&self, candidate: &str) -> Result<&'static str, UnresolvedBookError> {
        let key = normalize(candidate);
        if key.is_empty() {
            return Err(UnresolvedBookError(candidate.to_string()));
        }
        if let Some(code) = self.aliases.get(&key) {
            return Ok(*code);
        }
        self.loose_match(&key)
            .ok_or_else(|| UnresolvedBookError(candidate.to_string()))
    }

    fn loose_match(&self, key: &str) -> Option<&'static str> {
        // Short fragments contain or are contained by too many names.
        if key.len() < 4 {
            return None;
        }
        let hits: Vec<&(String, &'static str)> = self
            .names
            .iter()
            .filter(|(name, _)| key.contains(name.as_str()) || name.contains(key))
            .collect();
        match hits.as_slice() {
            [] => None,
            [(_, code)] => Some(*code),
            _ => {
                let contained: Vec<&&(String, &'static str)> = hits
                    .iter()
                    .filter(|(name, _)| key.contains(name.as_str()))
                    .collect();
                let longest = contained.iter().map(|(name, _)| name.len()).max()?;
                let mut best = contained.iter().filter(|(name, _)| name.len() == longest);
                match (best.next(), best.next()) {
                    (Some((_, code)), None) => Some(*code),
                    _ => None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> BookResolver {
        BookResolver::new(&Canon::standard())
    }

    #[test]
    fn test_usfm_codes_case_insensitive() {
        let r = resolver();
        assert_eq!(r.resolve("GEN").unwrap(), "genesis");
        assert_eq!(r.resolve("gen").unwrap(), "genesis");
        assert_eq!(r.resolve("1CH").unwrap(), "1_chronicles");
        assert_eq!(r.resolve("sng").unwrap(), "song_of_solomon");
        assert_eq!(r.resolve("JHN").unwrap(), "john");
        assert_eq!(r.resolve("1JN").unwrap(), "1_john");
    }

    #[test]
    fn test_full_names_and_codes() {
        let r = resolver();
        assert_eq!(r.resolve("1_chronicles").unwrap(), "1_chronicles");
        assert_eq!(r.resolve("1 Chronicles").unwrap(), "1_chronicles");
        assert_eq!(r.resolve("Song of Solomon").unwrap(), "song_of_solomon");
        assert_eq!(r.resolve("song_of_solomon").unwrap(), "song_of_solomon");
        assert_eq!(r.resolve("Revelation").unwrap(), "revelation");
    }

    #[test]
    fn test_extra_aliases() {
        let r = resolver();
        assert_eq!(r.resolve("Psalm").unwrap(), "psalms");
        assert_eq!(r.resolve("Song of Songs").unwrap(), "song_of_solomon");
        assert_eq!(r.resolve("Revelations").unwrap(), "revelation");
    }

    #[test]
    fn test_loose_containment() {
        let r = resolver();
        assert_eq!(r.resolve("The Book of Genesis").unwrap(), "genesis");
        assert_eq!(r.resolve("Deuteronom").unwrap(), "deuteronomy");
        // "1john" and "john" are both contained; the longer one wins.
        assert_eq!(r.resolve("The First Epistle 1 John").unwrap(), "1_john");
    }

    #[test]
    fn test_unresolved() {
        let r = resolver();
        let err = r.resolve("XYZ").unwrap_err();
        assert_eq!(err, UnresolvedBookError("XYZ".into()));
        assert!(r.resolve("").is_err());
        assert!(r.resolve("Tobit").is_err());
    }

    #[test]
    fn test_ambiguous_fragment_unresolved() {
        // Contained in 1 Samuel and 2 Samuel alike.
        assert!(resolver().resolve("samuel").is_err());
    }
}
