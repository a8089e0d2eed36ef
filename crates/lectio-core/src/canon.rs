//! Canonical structure of the 66-book Protestant canon.
//!
//! The table is the ground truth every import is checked against: book codes,
//! canonical order, testament, and the verse count of every chapter
//! (1,189 chapters, 31,102 verses). It is embedded as static data and wrapped
//! in a [`Canon`] value that callers construct once and share by reference
//! (usually behind an `Arc`).
//!
//! # Example
//!
//! ```rust
//! use lectio_core::canon::Canon;
//!
//! let canon = Canon::standard();
//! assert_eq!(canon.all_book_codes().len(), 66);
//! assert_eq!(canon.canonical_order("exodus").unwrap(), 2);
//! assert_eq!(canon.chapters_for("ruth").unwrap(), &[22, 23, 18, 22]);
//! ```

use std::collections::HashMap;

use serde::Serialize;

use crate::error::CanonError;

/// Old or New Testament.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Testament {
    Old,
    New,
}

impl Testament {
    pub fn as_str(&self) -> &'static str {
        match self {
            Testament::Old => "old",
            Testament::New => "new",
        }
    }
}

/// One immutable entry of the canonical table.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CanonicalBook {
    /// Storage book code: lowercase, underscore separated (`"1_samuel"`).
    pub code: &'static str,
    /// Three-character USFM identifier (`"1SA"`).
    pub usfm_code: &'static str,
    /// Display name (`"1 Samuel"`).
    pub name: &'static str,
    /// Position in the canon, 1 through 66.
    pub order: u8,
    pub testament: Testament,
    /// Verse count of chapter `i + 1` at index `i`.
    pub verse_counts: &'static [u32],
}

impl CanonicalBook {
    pub fn chapter_count(&self) -> u32 {
        self.verse_counts.len() as u32
    }

    /// Verse count for a 1-based chapter number, `None` when out of range.
    pub fn verses_in(&self, chapter: u32) -> Option<u32> {
        if chapter == 0 {
            return None;
        }
        self.verse_counts.get(chapter as usize - 1).copied()
    }

    pub fn total_verses(&self) -> u32 {
        self.verse_counts.iter().sum()
    }

    /// `(chapter_number, verse_count)` pairs in chapter order.
    pub fn chapters(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.verse_counts
            .iter()
            .enumerate()
            .map(|(i, count)| (i as u32 + 1, *count))
    }
}

/// Read-only lookup over the canonical table.
#[derive(Debug, Clone)]
pub struct Canon {
    books: &'static [CanonicalBook],
    by_code: HashMap<&'static str, usize>,
}

impl Canon {
    /// Builds the lookup over the embedded 66-book table.
    pub fn standard() -> Self {
        let by_code = STANDARD_BOOKS
            .iter()
            .enumerate()
            .map(|(i, book)| (book.code, i))
            .collect();
        Self {
            books: &STANDARD_BOOKS,
            by_code,
        }
    }

    /// All books in canonical order.
    pub fn books(&self) -> &[CanonicalBook] {
        self.books
    }

    pub fn book(&self, code: &str) -> Result<&CanonicalBook, CanonError> {
        self.by_code
            .get(code)
            .map(|&i| &self.books[i])
            .ok_or_else(|| CanonError::UnknownBook(code.to_string()))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
    }

    /// Verse counts per chapter, in chapter order.
    pub fn chapters_for(&self, code: &str) -> Result<&'static [u32], CanonError> {
        self.book(code).map(|b| b.verse_counts)
    }

    pub fn canonical_order(&self, code: &str) -> Result<u8, CanonError> {
        self.book(code).map(|b| b.order)
    }

    /// The 66 book codes in canonical order.
    pub fn all_book_codes(&self) -> Vec<&'static str> {
        self.books.iter().map(|b| b.code).collect()
    }

    pub fn total_chapters(&self) -> u32 {
        self.books.iter().map(|b| b.chapter_count()).sum()
    }

    pub fn total_verses(&self) -> u32 {
        self.books.iter().map(|b| b.total_verses()).sum()
    }

    /// Checks that `book chapter:verse` exists in the canonical structure.
    pub fn check_reference(&self, code: &str, chapter: u32, verse: u32) -> Result<(), CanonError> {
        let book = self.book(code)?;
        let verses = book
            .verses_in(chapter)
            .ok_or_else(|| CanonError::ChapterOutOfRange {
                book: book.code.to_string(),
                chapter,
                chapters: book.chapter_count(),
            })?;
        if verse == 0 || verse > verses {
            return Err(CanonError::VerseOutOfRange {
                book: book.code.to_string(),
                chapter,
                verse,
                verses,
            });
        }
        Ok(())
    }
}

impl Default for Canon {
    fn default() -> Self {
        Self::standard()
    }
}

macro_rules! book {
    ($order:expr, $usfm:expr, $code:expr, $name:expr, $testament:expr, $verses:expr) => {
        CanonicalBook {
            code: $code,
            usfm_code: $usfm,
            name: $name,
            order: $order,
            testament: $testament,
            verse_counts: $verses,
        }
    };
}

static STANDARD_BOOKS: [CanonicalBook; 66] = [
    book!(1, "GEN", "genesis", "Genesis", Testament::Old,
        &[
            31, 25, 24, 26, 32, 22, 24, 22, 29, 32, 32, 20, 18, 24, 21, 16, 27, 33, 38, 18, 34,
            24, 20, 67, 34, 35, 46, 22, 35, 43, 55, 32, 20, 31, 29, 43, 36, 30, 23, 23, 57, 38,
            34, 34, 28, 34, 31, 22, 33, 26
        ]),
    book!(2, "EXO", "exodus", "Exodus", Testament::Old,
        &[
            22, 25, 22, 31, 23, 30, 25, 32, 35, 29, 10, 51, 22, 31, 27, 36, 16, 27, 25, 26, 36,
            31, 33, 18, 40, 37, 21, 43, 46, 38, 18, 35, 23, 35, 35, 38, 29, 31, 43, 38
        ]),
    book!(3, "LEV", "leviticus", "Leviticus", Testament::Old,
        &[
            17, 16, 17, 35, 19, 30, 38, 36, 24, 20, 47, 8, 59, 57, 33, 34, 16, 30, 37, 27, 24,
            33, 44, 23, 55, 46, 34
        ]),
    book!(4, "NUM", "numbers", "Numbers", Testament::Old,
        &[
            54, 34, 51, 49, 31, 27, 89, 26, 23, 36, 35, 16, 33, 45, 41, 50, 13, 32, 22, 29, 35,
            41, 30, 25, 18, 65, 23, 31, 40, 16, 54, 42, 56, 29, 34, 13
        ]),
    book!(5, "DEU", "deuteronomy", "Deuteronomy", Testament::Old,
        &[
            46, 37, 29, 49, 33, 25, 26, 20, 29, 22, 32, 32, 18, 29, 23, 22, 20, 22, 21, 20, 23,
            30, 25, 22, 19, 19, 26, 68, 29, 20, 30, 52, 29, 12
        ]),
    book!(6, "JOS", "joshua", "Joshua", Testament::Old,
        &[
            18, 24, 17, 24, 15, 27, 26, 35, 27, 43, 23, 24, 33, 15, 63, 10, 18, 28, 51, 9, 45,
            34, 16, 33
        ]),
    book!(7, "JDG", "judges", "Judges", Testament::Old,
        &[36, 23, 31, 24, 31, 40, 25, 35, 57, 18, 40, 15, 25, 20, 20, 31, 13, 31, 30, 48, 25]),
    book!(8, "RUT", "ruth", "Ruth", Testament::Old,
        &[22, 23, 18, 22]),
    book!(9, "1SA", "1_samuel", "1 Samuel", Testament::Old,
        &[
            28, 36, 21, 22, 12, 21, 17, 22, 27, 27, 15, 25, 23, 52, 35, 23, 58, 30, 24, 42, 15,
            23, 29, 22, 44, 25, 12, 25, 11, 31, 13
        ]),
    book!(10, "2SA", "2_samuel", "2 Samuel", Testament::Old,
        &[
            27, 32, 39, 12, 25, 23, 29, 18, 13, 19, 27, 31, 39, 33, 37, 23, 29, 33, 43, 26, 22,
            51, 39, 25
        ]),
    book!(11, "1KI", "1_kings", "1 Kings", Testament::Old,
        &[
            53, 46, 28, 34, 18, 38, 51, 66, 28, 29, 43, 33, 34, 31, 34, 34, 24, 46, 21, 43, 29,
            53
        ]),
    book!(12, "2KI", "2_kings", "2 Kings", Testament::Old,
        &[
            18, 25, 27, 44, 27, 33, 20, 29, 37, 36, 21, 21, 25, 29, 38, 20, 41, 37, 37, 21, 26,
            20, 37, 20, 30
        ]),
    book!(13, "1CH", "1_chronicles", "1 Chronicles", Testament::Old,
        &[
            54, 55, 24, 43, 26, 81, 40, 40, 44, 14, 47, 40, 14, 17, 29, 43, 27, 17, 19, 8, 30,
            19, 32, 31, 31, 32, 34, 21, 30
        ]),
    book!(14, "2CH", "2_chronicles", "2 Chronicles", Testament::Old,
        &[
            17, 18, 17, 22, 14, 42, 22, 18, 31, 19, 23, 16, 22, 15, 19, 14, 19, 34, 11, 37, 20,
            12, 21, 27, 28, 23, 9, 27, 36, 27, 21, 33, 25, 33, 27, 23
        ]),
    book!(15, "EZR", "ezra", "Ezra", Testament::Old,
        &[11, 70, 13, 24, 17, 22, 28, 36, 15, 44]),
    book!(16, "NEH", "nehemiah", "Nehemiah", Testament::Old,
        &[11, 20, 32, 23, 19, 19, 73, 18, 38, 39, 36, 47, 31]),
    book!(17, "EST", "esther", "Esther", Testament::Old,
        &[22, 23, 15, 17, 14, 14, 10, 17, 32, 3]),
    book!(18, "JOB", "job", "Job", Testament::Old,
        &[
            22, 13, 26, 21, 27, 30, 21, 22, 35, 22, 20, 25, 28, 22, 35, 22, 16, 21, 29, 29, 34,
            30, 17, 25, 6, 14, 23, 28, 25, 31, 40, 22, 33, 37, 16, 33, 24, 41, 30, 24, 34, 17
        ]),
    book!(19, "PSA", "psalms", "Psalms", Testament::Old,
        &[
            6, 12, 8, 8, 12, 10, 17, 9, 20, 18, 7, 8, 6, 7, 5, 11, 15, 50, 14, 9, 13, 31, 6, 10,
            22, 12, 14, 9, 11, 12, 24, 11, 22, 22, 28, 12, 40, 22, 13, 17, 13, 11, 5, 26, 17,
            11, 9, 14, 20, 23, 19, 9, 6, 7, 23, 13, 11, 11, 17, 12, 8, 12, 11, 10, 13, 20, 7,
            35, 36, 5, 24, 20, 28, 23, 10, 12, 20, 72, 13, 19, 16, 8, 18, 12, 13, 17, 7, 18, 52,
            17, 16, 15, 5, 23, 11, 13, 12, 9, 9, 5, 8, 28, 22, 35, 45, 48, 43, 13, 31, 7, 10,
            10, 9, 8, 18, 19, 2, 29, 176, 7, 8, 9, 4, 8, 5, 6, 5, 6, 8, 8, 3, 18, 3, 3, 21, 26,
            9, 8, 24, 13, 10, 7, 12, 15, 21, 10, 20, 14, 9, 6
        ]),
    book!(20, "PRO", "proverbs", "Proverbs", Testament::Old,
        &[
            33, 22, 35, 27, 23, 35, 27, 36, 18, 32, 31, 28, 25, 35, 33, 33, 28, 24, 29, 30, 31,
            29, 35, 34, 28, 28, 27, 28, 27, 33, 31
        ]),
    book!(21, "ECC", "ecclesiastes", "Ecclesiastes", Testament::Old,
        &[18, 26, 22, 16, 20, 12, 29, 17, 18, 20, 10, 14]),
    book!(22, "SNG", "song_of_solomon", "Song of Solomon", Testament::Old,
        &[17, 17, 11, 16, 16, 13, 13, 14]),
    book!(23, "ISA", "isaiah", "Isaiah", Testament::Old,
        &[
            31, 22, 26, 6, 30, 13, 25, 22, 21, 34, 16, 6, 22, 32, 9, 14, 14, 7, 25, 6, 17, 25,
            18, 23, 12, 21, 13, 29, 24, 33, 9, 20, 24, 17, 10, 22, 38, 22, 8, 31, 29, 25, 28,
            28, 25, 13, 15, 22, 26, 11, 23, 15, 12, 17, 13, 12, 21, 14, 21, 22, 11, 12, 19, 12,
            25, 24
        ]),
    book!(24, "JER", "jeremiah", "Jeremiah", Testament::Old,
        &[
            19, 37, 25, 31, 31, 30, 34, 22, 26, 25, 23, 17, 27, 22, 21, 21, 27, 23, 15, 18, 14,
            30, 40, 10, 38, 24, 22, 17, 32, 24, 40, 44, 26, 22, 19, 32, 21, 28, 18, 16, 18, 22,
            13, 30, 5, 28, 7, 47, 39, 46, 64, 34
        ]),
    book!(25, "LAM", "lamentations", "Lamentations", Testament::Old,
        &[22, 22, 66, 22, 22]),
    book!(26, "EZK", "ezekiel", "Ezekiel", Testament::Old,
        &[
            28, 10, 27, 17, 17, 14, 27, 18, 11, 22, 25, 28, 23, 23, 8, 63, 24, 32, 14, 49, 32,
            31, 49, 27, 17, 21, 36, 26, 21, 26, 18, 32, 33, 31, 15, 38, 28, 23, 29, 49, 26, 20,
            27, 31, 25, 24, 23, 35
        ]),
    book!(27, "DAN", "daniel", "Daniel", Testament::Old,
        &[21, 49, 30, 37, 31, 28, 28, 27, 27, 21, 45, 13]),
    book!(28, "HOS", "hosea", "Hosea", Testament::Old,
        &[11, 23, 5, 19, 15, 11, 16, 14, 17, 15, 12, 14, 16, 9]),
    book!(29, "JOL", "joel", "Joel", Testament::Old,
        &[20, 32, 21]),
    book!(30, "AMO", "amos", "Amos", Testament::Old,
        &[15, 16, 15, 13, 27, 14, 17, 14, 15]),
    book!(31, "OBA", "obadiah", "Obadiah", Testament::Old,
        &[21]),
    book!(32, "JON", "jonah", "Jonah", Testament::Old,
        &[17, 10, 10, 11]),
    book!(33, "MIC", "micah", "Micah", Testament::Old,
        &[16, 13, 12, 13, 15, 16, 20]),
    book!(34, "NAM", "nahum", "Nahum", Testament::Old,
        &[15, 13, 19]),
    book!(35, "HAB", "habakkuk", "Habakkuk", Testament::Old,
        &[17, 20, 19]),
    book!(36, "ZEP", "zephaniah", "Zephaniah", Testament::Old,
        &[18, 15, 20]),
    book!(37, "HAG", "haggai", "Haggai", Testament::Old,
        &[15, 23]),
    book!(38, "ZEC", "zechariah", "Zechariah", Testament::Old,
        &[21, 13, 10, 14, 11, 15, 14, 23, 17, 12, 17, 14, 9, 21]),
    book!(39, "MAL", "malachi", "Malachi", Testament::Old,
        &[14, 17, 18, 6]),
    book!(40, "MAT", "matthew", "Matthew", Testament::New,
        &[
            25, 23, 17, 25, 48, 34, 29, 34, 38, 42, 30, 50, 58, 36, 39, 28, 27, 35, 30, 34, 46,
            46, 39, 51, 46, 75, 66, 20
        ]),
    book!(41, "MRK", "mark", "Mark", Testament::New,
        &[45, 28, 35, 41, 43, 56, 37, 38, 50, 52, 33, 44, 37, 72, 47, 20]),
    book!(42, "LUK", "luke", "Luke", Testament::New,
        &[
            80, 52, 38, 44, 39, 49, 50, 56, 62, 42, 54, 59, 35, 35, 32, 31, 37, 43, 48, 47, 38,
            71, 56, 53
        ]),
    book!(43, "JHN", "john", "John", Testament::New,
        &[51, 25, 36, 54, 47, 71, 53, 59, 41, 42, 57, 50, 38, 31, 27, 33, 26, 40, 42, 31, 25]),
    book!(44, "ACT", "acts", "Acts", Testament::New,
        &[
            26, 47, 26, 37, 42, 15, 60, 40, 43, 48, 30, 25, 52, 28, 41, 40, 34, 28, 41, 38, 40,
            30, 35, 27, 27, 32, 44, 31
        ]),
    book!(45, "ROM", "romans", "Romans", Testament::New,
        &[32, 29, 31, 25, 21, 23, 25, 39, 33, 21, 36, 21, 14, 23, 33, 27]),
    book!(46, "1CO", "1_corinthians", "1 Corinthians", Testament::New,
        &[31, 16, 23, 21, 13, 20, 40, 13, 27, 33, 34, 31, 13, 40, 58, 24]),
    book!(47, "2CO", "2_corinthians", "2 Corinthians", Testament::New,
        &[24, 17, 18, 18, 21, 18, 16, 24, 15, 18, 33, 21, 14]),
    book!(48, "GAL", "galatians", "Galatians", Testament::New,
        &[24, 21, 29, 31, 26, 18]),
    book!(49, "EPH", "ephesians", "Ephesians", Testament::New,
        &[23, 22, 21, 32, 33, 24]),
    book!(50, "PHP", "philippians", "Philippians", Testament::New,
        &[30, 30, 21, 23]),
    book!(51, "COL", "colossians", "Colossians", Testament::New,
        &[29, 23, 25, 18]),
    book!(52, "1TH", "1_thessalonians", "1 Thessalonians", Testament::New,
        &[10, 20, 13, 18, 28]),
    book!(53, "2TH", "2_thessalonians", "2 Thessalonians", Testament::New,
        &[12, 17, 18]),
    book!(54, "1TI", "1_timothy", "1 Timothy", Testament::New,
        &[20, 15, 16, 16, 25, 21]),
    book!(55, "2TI", "2_timothy", "2 Timothy", Testament::New,
        &[18, 26, 17, 22]),
    book!(56, "TIT", "titus", "Titus", Testament::New,
        &[16, 15, 15]),
    book!(57, "PHM", "philemon", "Philemon", Testament::New,
        &[25]),
    book!(58, "HEB", "hebrews", "Hebrews", Testament::New,
        &[14, 18, 19, 16, 14, 20, 28, 13, 28, 39, 40, 29, 25]),
    book!(59, "JAS", "james", "James", Testament::New,
        &[27, 26, 18, 17, 20]),
    book!(60, "1PE", "1_peter", "1 Peter", Testament::New,
        &[25, 25, 22, 19, 14]),
    book!(61, "2PE", "2_peter", "2 Peter", Testament::New,
        &[21, 22, 18]),
    book!(62, "1JN", "1_john", "1 John", Testament::New,
        &[10, 29, 24, 21, 21]),
    book!(63, "2JN", "2_john", "2 John", Testament::New,
        &[13]),
    book!(64, "3JN", "3_john", "3 John", Testament::New,
        &[14]),
    book!(65, "JUD", "jude", "Jude", Testament::New,
        &[25]),
    book!(66, "REV", "revelation", "Revelation", Testament::New,
        &[
            20, 29, 22, 11, 14, 17, 17, 13, 21, 11, 19, 17, 18, 20, 8, 21, 18, 24, 21, 15, 27,
            21
        ]),
];
