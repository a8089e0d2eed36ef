//! Per-chapter HTML parsing.
//!
//! Each file holds one chapter and is named `{CODE}{NN}.htm`, for example
//! `MAT01.htm`. The code is resolved through [`BookResolver`]; chapter `00`
//! is the book introduction and never produces verses.
//!
//! Verse text is located by `<span class="verse" id="V{n}">` markers inside
//! `<div class="main">`. Everything after a marker up to the next marker
//! belongs to verse `n`, with these exceptions:
//!
//! - the marker's own content (the printed verse number) is skipped;
//! - note markers (`a.notemark`, `span.popup`) and headings are skipped;
//! - extraction stops at `<div class="footnote">`.
//!
//! Verse 0 and verses left empty after whitespace collapsing are dropped.

use std::ops::ControlFlow;

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Node};

use crate::books::BookResolver;
use crate::error::UnresolvedBookError;
use crate::models::ParsedVerse;
use crate::text::collapse_whitespace;

lazy_static! {
    pub static ref RE_CHAPTER_FILE_NAME: Regex =
        Regex::new(r"(?i)^([A-Z0-9]{3})([0-9]{2})\.htm$").unwrap();
}

/// Elements whose content is never verse text.
const SKIPPED_CLASSES: &[&str] = &[
    "notemark", "popup", "chapterlabel", "mt", "mt1", "mt2", "ms", "ms1", "mr", "s", "s1", "s2",
    "s3", "sr", "r", "d",
];

const BLOCK_ELEMENTS: &[&str] = &[
    "div", "p", "br", "li", "ul", "ol", "table", "tr", "td", "th", "blockquote", "h1", "h2", "h3",
    "h4", "h5", "h6",
];

/// What a file name means to the HTML importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlFileKind {
    /// Does not match the naming pattern.
    Ignored,
    /// Chapter `00`.
    Introduction,
    Chapter { book_code: &'static str, chapter: u32 },
}

impl HtmlFileKind {
    /// True for names that match the pattern, introductions included.
    pub fn matches_pattern(&self) -> bool {
        !matches!(self, HtmlFileKind::Ignored)
    }
}

/// Classifies a file name. Introductions are recognized before the code is
/// resolved; an unresolvable code on a chapter file is an error.
pub fn classify_file_name(
    file_name: &str,
    resolver: &BookResolver,
) -> Result<HtmlFileKind, UnresolvedBookError> {
    let Some(caps) = RE_CHAPTER_FILE_NAME.captures(file_name) else {
        return Ok(HtmlFileKind::Ignored);
    };
    let Ok(chapter) = caps[2].parse::<u32>() else {
        return Ok(HtmlFileKind::Ignored);
    };
    if chapter == 0 {
        return Ok(HtmlFileKind::Introduction);
    }
    let book_code = resolver.resolve(&caps[1])?;
    Ok(HtmlFileKind::Chapter { book_code, chapter })
}

/// Verses extracted from one chapter document, before book/chapter are attached.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// `(verse, text)` in reading order.
    pub verses: Vec<(u32, String)>,
    pub issues: Vec<String>,
}

/// Extracts verse text from one chapter document.
pub fn extract_verses(html: &str) -> Extraction {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let main = root
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "div" && has_class(el, "main"));

    let mut walker = Walker::default();
    if main.is_none() {
        walker
            .issues
            .push("no <div class=\"main\">; reading the whole document".to_string());
    }
    let _ = walker.walk(main.unwrap_or(root));

    if !walker.saw_marker {
        walker
            .issues
            .push("no <span class=\"verse\"> markers found".to_string());
    }

    let verses = walker
        .verses
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, raw)| (n, collapse_whitespace(&raw)))
        .filter(|(_, text)| !text.is_empty())
        .collect();

    Extraction {
        verses,
        issues: walker.issues,
    }
}

/// A parsed chapter file.
#[derive(Debug, Clone)]
pub struct HtmlChapter {
    pub book_code: &'static str,
    pub chapter: u32,
    pub verses: Vec<ParsedVerse>,
    pub issues: Vec<String>,
}

/// Classifies `file_name` and, for chapter files, extracts its verses.
/// Returns `Ok(None)` for introductions and non-matching names.
pub fn parse_html_chapter(
    file_name: &str,
    html: &str,
    resolver: &BookResolver,
) -> Result<Option<HtmlChapter>, UnresolvedBookError> {
    let (book_code, chapter) = match classify_file_name(file_name, resolver)? {
        HtmlFileKind::Chapter { book_code, chapter } => (book_code, chapter),
        HtmlFileKind::Ignored | HtmlFileKind::Introduction => return Ok(None),
    };
    let extraction = extract_verses(html);
    let verses = extraction
        .verses
        .into_iter()
        .map(|(verse, text)| ParsedVerse::new(book_code, chapter, verse, text))
        .collect();
    let issues = extraction
        .issues
        .into_iter()
        .map(|issue| format!("{}: {}", file_name, issue))
        .collect();
    Ok(Some(HtmlChapter {
        book_code,
        chapter,
        verses,
        issues,
    }))
}

fn has_class(el: &ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c.eq_ignore_ascii_case(class))
}

fn leading_number(text: &str) -> Option<u32> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[derive(Default)]
struct Walker {
    verses: Vec<(u32, String)>,
    /// Index into `verses` receiving text, if any.
    current: Option<usize>,
    saw_marker: bool,
    issues: Vec<String>,
}

impl Walker {
    fn walk(&mut self, element: ElementRef<'_>) -> ControlFlow<()> {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.push_text(text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.element(child)?;
                    }
                }
                _ => {}
            }
        }
        ControlFlow::Continue(())
    }

    fn element(&mut self, el: ElementRef<'_>) -> ControlFlow<()> {
        let name = el.value().name();
        if name == "div" && has_class(&el, "footnote") {
            return ControlFlow::Break(());
        }
        if name == "span" && has_class(&el, "verse") {
            self.start_verse(&el);
            return ControlFlow::Continue(());
        }
        if matches!(name, "script" | "style" | "head" | "title")
            || SKIPPED_CLASSES.iter().any(|class| has_class(&el, class))
        {
            return ControlFlow::Continue(());
        }

        let block = BLOCK_ELEMENTS.contains(&name);
        if block {
            self.push_text(" ");
        }
        self.walk(el)?;
        if block {
            self.push_text(" ");
        }
        ControlFlow::Continue(())
    }

    fn start_verse(&mut self, el: &ElementRef<'_>) {
        self.saw_marker = true;
        let number = el
            .value()
            .attr("id")
            .and_then(|id| id.strip_prefix('V').or_else(|| id.strip_prefix('v')))
            .and_then(|n| n.parse::<u32>().ok())
            .or_else(|| leading_number(&el.text().collect::<String>()));

        let Some(number) = number else {
            self.issues
                .push("verse marker without a verse number; text skipped".to_string());
            self.current = None;
            return;
        };

        let existing = self.verses.iter().position(|(n, _)| *n == number);
        self.current = Some(match existing {
            Some(index) => {
                self.verses[index].1.push(' ');
                index
            }
            None => {
                self.verses.push((number, String::new()));
                self.verses.len() - 1
            }
        });
    }

    fn push_text(&mut self, text: &str) {
        if let Some(index) = self.current {
            self.verses[index].1.push_str(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::Canon;

    const SAMPLE: &str = r##"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Genesis 1</title></head>
<body>
<div class="main">
  <div class='chapterlabel' id="V0">1</div>
  <div class="p">
  <span class="verse" id="V1">1&#160;</span>In the beginning God created the heavens and the earth.
  <span class="verse" id="V2">2&#160;</span>And the earth was <i>without</i> form,<a href="#FN1" class="notemark">*<span class="popup">Or: empty</span></a> and void.
  </div>
  <div class="s">The Light</div>
  <div class="p">
  <span class="verse" id="V3">3&#160;</span>And God said, Let there be light.
  </div>
</div>
<div class="footnote">
  <p class="f" id="FN1"><span class="ft">This is a footnote explanation.</span></p>
</div>
</body>
</html>"##;

    fn resolver() -> BookResolver {
        BookResolver::new(&Canon::standard())
    }

    #[test]
    fn test_classify_chapter_files() {
        let r = resolver();
        assert_eq!(
            classify_file_name("GEN01.htm", &r).unwrap(),
            HtmlFileKind::Chapter { book_code: "genesis", chapter: 1 }
        );
        assert_eq!(
            classify_file_name("gen01.htm", &r).unwrap(),
            classify_file_name("GEN01.htm", &r).unwrap()
        );
        assert_eq!(
            classify_file_name("1CO13.htm", &r).unwrap(),
            HtmlFileKind::Chapter { book_code: "1_corinthians", chapter: 13 }
        );
    }

    #[test]
    fn test_classify_introduction_and_ignored() {
        let r = resolver();
        assert_eq!(classify_file_name("GEN00.htm", &r).unwrap(), HtmlFileKind::Introduction);
        assert_eq!(classify_file_name("XYZ00.htm", &r).unwrap(), HtmlFileKind::Introduction);
        assert_eq!(classify_file_name("index.htm", &r).unwrap(), HtmlFileKind::Ignored);
        assert_eq!(classify_file_name("GEN01.html", &r).unwrap(), HtmlFileKind::Ignored);
        assert_eq!(classify_file_name("GEN1.htm", &r).unwrap(), HtmlFileKind::Ignored);
        assert_eq!(classify_file_name("GEN١٢.htm", &r).unwrap(), HtmlFileKind::Ignored);
    }

    #[test]
    fn test_classify_unresolved_code() {
        let err = classify_file_name("XYZ01.htm", &resolver()).unwrap_err();
        assert_eq!(err.0, "XYZ");
    }

    #[test]
    fn test_extract_sample() {
        let extraction = extract_verses(SAMPLE);
        assert_eq!(
            extraction.verses,
            vec![
                (1, "In the beginning God created the heavens and the earth.".to_string()),
                (2, "And the earth was without form, and void.".to_string()),
                (3, "And God said, Let there be light.".to_string()),
            ]
        );
        assert!(extraction.issues.is_empty());
    }

    #[test]
    fn test_footnote_section_not_extracted() {
        let extraction = extract_verses(SAMPLE);
        assert!(extraction
            .verses
            .iter()
            .all(|(_, text)| !text.contains("footnote") && !text.contains("empty")));
    }

    #[test]
    fn test_missing_main_falls_back_to_document() {
        let html = r#"<html><body><div class="content"><span class="verse" id="V1">1&#160;</span>Text here.</div></body></html>"#;
        let extraction = extract_verses(html);
        assert_eq!(extraction.verses, vec![(1, "Text here.".to_string())]);
        assert_eq!(extraction.issues.len(), 1);
    }

    #[test]
    fn test_no_markers_is_an_issue() {
        let html = r#"<html><body><div class="main"><p>No verses.</p></div></body></html>"#;
        let extraction = extract_verses(html);
        assert!(extraction.verses.is_empty());
        assert_eq!(extraction.issues.len(), 1);
    }

    #[test]
    fn test_empty_and_zero_verses_dropped() {
        let html = r#"<div class="main"><span class="verse" id="V0">0</span>Intro
<span class="verse" id="V1">1</span>
<span class="verse" id="V2">2</span>Two.</div>"#;
        let extraction = extract_verses(html);
        assert_eq!(extraction.verses, vec![(2, "Two.".to_string())]);
    }

    #[test]
    fn test_repeated_marker_merges() {
        let html = r#"<div class="main"><div class="p"><span class="verse" id="V1">1</span>First half</div>
<div class="q"><span class="verse" id="V1"></span>second half.</div></div>"#;
        let extraction = extract_verses(html);
        assert_eq!(extraction.verses, vec![(1, "First half second half.".to_string())]);
    }

    #[test]
    fn test_parse_chapter_attaches_reference() {
        let chapter = parse_html_chapter("gen01.htm", SAMPLE, &resolver())
            .unwrap()
            .unwrap();
        assert_eq!(chapter.book_code, "genesis");
        assert_eq!(chapter.chapter, 1);
        assert_eq!(chapter.verses.len(), 3);
        assert_eq!(chapter.verses[0], ParsedVerse::new("genesis", 1, 1, "In the beginning God created the heavens and the earth."));
    }

    #[test]
    fn test_parse_introduction_yields_nothing() {
        assert!(parse_html_chapter("GEN00.htm", SAMPLE, &resolver())
            .unwrap()
            .is_none());
    }
}
