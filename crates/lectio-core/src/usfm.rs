//! USFM parsing.
//!
//! A USFM file is plain text with backslash markers. Parsing happens in two
//! steps:
//!
//! 1. [`tokenize`] splits the content into [`Token::Marker`] and
//!    [`Token::Text`] runs. One space or tab after an opening marker is its
//!    delimiter and is consumed.
//! 2. [`parse_usfm`] drives a small state machine over the tokens and emits
//!    one [`ParsedVerse`] per `\v`.
//!
//! # Marker policy
//!
//! | markers | effect |
//! |---|---|
//! | `\id` | first word resolved to the book code; rest of line ignored |
//! | `\h` | captured as the header, informational only |
//! | `\c n` | sets the chapter, closes the open verse |
//! | `\v n` | opens verse `n` (`\v 1-3` is stored as verse 1) |
//! | `\f \fe \x \ef \ex \fig \ca \va \vp \rq` | excised up to the matching `*` close |
//! | `\mt \s \r \ms \d \toc \rem ...` | rest of the line dropped |
//! | `\p \q \m \pi \li \b \nb ...` | separator, adds a space |
//! | `\zaln-s \qt-s ... \*`, `\zaln-e\*` | milestone, dropped with its attributes |
//! | any other | character style, content kept, `\|attributes` dropped |
//!
//! Verse text runs until the next `\v`, `\c` or `\id` across any number of
//! lines, with whitespace collapsed. An excised span that is still open when
//! the verse ends is malformed input: the verse is skipped and an issue is
//! recorded, and parsing continues.

use crate::books::BookResolver;
use crate::error::UsfmError;
use crate::models::ParsedVerse;
use crate::text::collapse_whitespace;

/// Spans whose content never reaches verse text.
const EXCISED: &[&str] = &["f", "fe", "x", "ef", "ex", "fig", "ca", "va", "vp", "rq"];

/// Markers whose line is a title, heading, or metadata.
const LINE_MARKERS: &[&str] = &[
    "ide", "usfm", "sts", "rem", "toc", "toca", "mt", "mte", "ms", "mr", "s", "sr", "r", "d",
    "sp", "cl", "cd", "cp", "qa", "restore", "periph", "imt", "imte", "is", "ip", "ipi", "im",
    "imi", "ipq", "imq", "ipr", "iq", "ib", "ili", "iot", "io", "iex", "ie", "lit",
];

/// Paragraph-level markers. They separate text but carry none.
const PARAGRAPH_MARKERS: &[&str] = &[
    "p", "m", "po", "pr", "cls", "pmo", "pm", "pmc", "pmr", "pi", "mi", "nb", "pc", "ph", "b",
    "q", "qr", "qc", "qm", "qd", "li", "lh", "lf", "lim", "tr", "th", "thr", "tc", "tcr", "pb",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// `name` without the backslash, the `+` nesting prefix, or the `*`.
    /// Milestones keep their `-s`/`-e` suffix; the bare `\*` that closes a
    /// milestone's attributes has an empty name.
    Marker { name: &'a str, closing: bool },
    Text(&'a str),
}

/// Splits USFM content into markers and text runs. Never fails; a stray
/// backslash not followed by a marker name is kept as text.
pub fn tokenize(content: &str) -> Vec<Token<'_>> {
    let bytes = content.as_bytes();
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'\\' {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        if j < bytes.len() && bytes[j] == b'+' {
            j += 1;
        }
        let name_start = j;
        while j < bytes.len() && bytes[j].is_ascii_alphanumeric() {
            j += 1;
        }
        if j > name_start
            && j + 1 < bytes.len()
            && bytes[j] == b'-'
            && matches!(bytes[j + 1], b's' | b'e')
            && !bytes.get(j + 2).is_some_and(|b| b.is_ascii_alphanumeric())
        {
            j += 2;
        }
        let name_end = j;
        let closing = j < bytes.len() && bytes[j] == b'*';
        if name_start == name_end && !closing {
            i += 1;
            continue;
        }
        if text_start < i {
            tokens.push(Token::Text(&content[text_start..i]));
        }
        if closing {
            j += 1;
        } else if j < bytes.len() && (bytes[j] == b' ' || bytes[j] == b'\t') {
            j += 1;
        }
        tokens.push(Token::Marker {
            name: &content[name_start..name_end],
            closing,
        });
        i = j;
        text_start = j;
    }
    if text_start < bytes.len() {
        tokens.push(Token::Text(&content[text_start..]));
    }
    tokens
}

/// One parsed USFM file.
#[derive(Debug, Clone)]
pub struct UsfmBook {
    pub book_code: &'static str,
    /// Text of `\h`, if present.
    pub header: Option<String>,
    pub verses: Vec<ParsedVerse>,
    /// Skipped verses and malformed marker sequences.
    pub issues: Vec<String>,
}

/// Parses one USFM file.
///
/// Fails when the file has no `\id` before its first chapter or verse, or
/// when the `\id` book cannot be resolved. Everything else is recorded in
/// [`UsfmBook::issues`].
pub fn parse_usfm(content: &str, resolver: &BookResolver) -> Result<UsfmBook, UsfmError> {
    let mut parser = Parser::new(resolver);
    for token in tokenize(content) {
        match token {
            Token::Marker { name, closing } => parser.marker(name, closing)?,
            Token::Text(text) => parser.text(text)?,
        }
    }
    parser.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Nothing,
    BookId,
    Header,
    Chapter,
    Verse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Skip {
    Nothing,
    Line,
    /// Inside an excised span, waiting for its closing marker.
    Span(String),
    /// After `|` in a character style, waiting for its closing marker.
    Attributes,
    /// Inside a milestone's attributes, waiting for `\*`.
    Milestone,
}

struct OpenVerse {
    number: u32,
    text: String,
}

struct Parser<'r> {
    resolver: &'r BookResolver,
    book: Option<&'static str>,
    header: Option<String>,
    chapter: Option<u32>,
    current: Option<OpenVerse>,
    expect: Expect,
    skip: Skip,
    char_depth: usize,
    verses: Vec<ParsedVerse>,
    issues: Vec<String>,
}

fn base_name(name: &str) -> &str {
    name.trim_end_matches(|c: char| c.is_ascii_digit())
}

fn is_milestone(name: &str) -> bool {
    name.ends_with("-s") || name.ends_with("-e")
}

fn is_structural(base: &str) -> bool {
    matches!(base, "id" | "c" | "v")
}

/// Splits off the first whitespace-delimited word.
fn first_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], &text[end..]),
        None => (text, ""),
    }
}

/// Leading decimal digits of a word (`"12-14"` gives 12, `"3a"` gives 3).
fn leading_number(word: &str) -> Option<u32> {
    let end = word
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(word.len());
    word[..end].parse().ok()
}

impl<'r> Parser<'r> {
    fn new(resolver: &'r BookResolver) -> Self {
        Self {
            resolver,
            book: None,
            header: None,
            chapter: None,
            current: None,
            expect: Expect::Nothing,
            skip: Skip::Nothing,
            char_depth: 0,
            verses: Vec::new(),
            issues: Vec::new(),
        }
    }

    fn book_label(&self) -> &'static str {
        self.book.unwrap_or("unknown book")
    }

    fn reference(&self) -> String {
        match (&self.current, self.chapter) {
            (Some(v), Some(c)) => format!("{} {}:{}", self.book_label(), c, v.number),
            (None, Some(c)) => format!("{} {}", self.book_label(), c),
            _ => self.book_label().to_string(),
        }
    }

    fn flush(&mut self) {
        if let (Some(open), Some(book), Some(chapter)) = (self.current.take(), self.book, self.chapter) {
            self.verses.push(ParsedVerse {
                book_code: book.to_string(),
                chapter,
                verse: open.number,
                text: collapse_whitespace(&open.text),
            });
        }
    }

    /// An excised span ran into the end of its verse.
    fn abandon_span(&mut self, span: &str) {
        self.issues.push(format!(
            "unmatched \\{} in {}; verse skipped",
            span,
            self.reference()
        ));
        self.current = None;
        self.skip = Skip::Nothing;
    }

    fn missing_argument(&mut self) {
        match self.expect {
            Expect::Chapter => {
                self.issues.push(format!(
                    "\\c without a chapter number in {}",
                    self.book_label()
                ));
                self.chapter = None;
            }
            Expect::Verse => {
                self.issues.push(format!(
                    "\\v without a verse number in {}",
                    self.reference()
                ));
            }
            _ => {}
        }
        self.expect = Expect::Nothing;
    }

    fn require_book(&self) -> Result<(), UsfmError> {
        match self.book {
            Some(_) => Ok(()),
            None => Err(UsfmError::MissingBookId),
        }
    }

    fn marker(&mut self, name: &str, closing: bool) -> Result<(), UsfmError> {
        let base = base_name(name);

        if self.expect != Expect::Nothing {
            self.missing_argument();
        }

        match &self.skip {
            Skip::Nothing => {}
            Skip::Span(span) => {
                if closing && base == span.as_str() {
                    self.skip = Skip::Nothing;
                    return Ok(());
                }
                if closing || !is_structural(base) {
                    return Ok(());
                }
                let span = span.clone();
                self.abandon_span(&span);
            }
            Skip::Attributes => {
                if closing {
                    self.skip = Skip::Nothing;
                    self.char_depth = self.char_depth.saturating_sub(1);
                    return Ok(());
                }
                self.skip = Skip::Nothing;
            }
            Skip::Milestone => {
                if closing && name.is_empty() {
                    self.skip = Skip::Nothing;
                    return Ok(());
                }
                if closing || !is_structural(base) {
                    return Ok(());
                }
                self.skip = Skip::Nothing;
            }
            Skip::Line => {
                if closing || !(is_structural(base) || PARAGRAPH_MARKERS.contains(&base)) {
                    return Ok(());
                }
                self.skip = Skip::Nothing;
            }
        }

        if is_milestone(name) {
            if !closing {
                self.skip = Skip::Milestone;
            }
            return Ok(());
        }
        if name.is_empty() {
            return Ok(());
        }

        if closing {
            self.char_depth = self.char_depth.saturating_sub(1);
            return Ok(());
        }

        match base {
            "id" => {
                self.flush();
                self.chapter = None;
                self.expect = Expect::BookId;
            }
            "h" => self.expect = Expect::Header,
            "c" => {
                self.require_book()?;
                self.flush();
                self.char_depth = 0;
                self.expect = Expect::Chapter;
            }
            "v" => {
                self.require_book()?;
                self.flush();
                self.char_depth = 0;
                self.expect = Expect::Verse;
            }
            _ if EXCISED.contains(&base) => self.skip = Skip::Span(base.to_string()),
            _ if LINE_MARKERS.contains(&base) => self.skip = Skip::Line,
            _ if PARAGRAPH_MARKERS.contains(&base) => {
                self.char_depth = 0;
                self.push_text(" ");
            }
            _ => self.char_depth += 1,
        }
        Ok(())
    }

    fn push_text(&mut self, text: &str) {
        if let Some(open) = self.current.as_mut() {
            open.text.push_str(text);
        }
    }

    fn text(&mut self, text: &str) -> Result<(), UsfmError> {
        let mut rest = text;
        while !rest.is_empty() {
            match self.expect {
                Expect::BookId => {
                    let (word, tail) = first_word(rest);
                    if word.is_empty() {
                        return Ok(());
                    }
                    self.book = Some(self.resolver.resolve(word)?);
                    self.expect = Expect::Nothing;
                    self.skip = Skip::Line;
                    rest = tail;
                    continue;
                }
                Expect::Header => {
                    let (line, tail, ended) = match rest.find('\n') {
                        Some(end) => (&rest[..end], &rest[end + 1..], true),
                        None => (rest, "", false),
                    };
                    let line = collapse_whitespace(line);
                    if !line.is_empty() {
                        self.header = Some(line);
                    }
                    self.expect = Expect::Nothing;
                    if !ended {
                        self.skip = Skip::Line;
                    }
                    rest = tail;
                    continue;
                }
                Expect::Chapter => {
                    let (word, tail) = first_word(rest);
                    if word.is_empty() {
                        return Ok(());
                    }
                    self.expect = Expect::Nothing;
                    match leading_number(word) {
                        Some(n) => self.chapter = Some(n),
                        None => {
                            self.issues.push(format!(
                                "invalid chapter number '{}' in {}",
                                word,
                                self.book_label()
                            ));
                            self.chapter = None;
                        }
                    }
                    rest = tail;
                    continue;
                }
                Expect::Verse => {
                    let (word, tail) = first_word(rest);
                    if word.is_empty() {
                        return Ok(());
                    }
                    self.expect = Expect::Nothing;
                    match (leading_number(word), self.chapter) {
                        (Some(n), Some(_)) => {
                            self.current = Some(OpenVerse {
                                number: n,
                                text: String::new(),
                            });
                        }
                        (Some(n), None) => self.issues.push(format!(
                            "verse {} in {} appears outside a valid chapter; skipped",
                            n,
                            self.book_label()
                        )),
                        (None, _) => self.issues.push(format!(
                            "invalid verse number '{}' in {}",
                            word,
                            self.reference()
                        )),
                    }
                    rest = tail;
                    continue;
                }
                Expect::Nothing => {}
            }

            match self.skip {
                Skip::Nothing => {
                    if self.char_depth > 0 {
                        if let Some(bar) = rest.find('|') {
                            let kept = &rest[..bar];
                            self.push_text(kept);
                            self.skip = Skip::Attributes;
                            return Ok(());
                        }
                    }
                    self.push_text(rest);
                    return Ok(());
                }
                Skip::Line => match rest.find('\n') {
                    Some(end) => {
                        self.skip = Skip::Nothing;
                        rest = &rest[end + 1..];
                    }
                    None => return Ok(()),
                },
                Skip::Span(_) | Skip::Attributes | Skip::Milestone => return Ok(()),
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<UsfmBook, UsfmError> {
        if self.expect != Expect::Nothing {
            self.missing_argument();
        }
        if let Skip::Span(span) = &self.skip {
            let span = span.clone();
            self.abandon_span(&span);
        }
        self.flush();
        let book_code = self.book.ok_or(UsfmError::MissingBookId)?;
        Ok(UsfmBook {
            book_code,
            header: self.header,
            verses: self.verses,
            issues: self.issues,
        })
    }
}
