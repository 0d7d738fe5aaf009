//! Streaming TS parser built on `quick-xml`.
//!
//! The parser never fails: malformed XML stops parsing and is recorded as a
//! [`SyntaxIssue`], keeping everything read up to that point.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::{
    BytesStart,
    BytesText,
    Event,
};

use crate::catalog::{
    Context,
    Location,
    Message,
    Translation,
    TranslationCatalog,
    TranslationKind,
};
use crate::types::{
    LineIndex,
    SourceRange,
};

/// Problems found while reading the document structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxIssueKind {
    /// The document is not well-formed XML.
    MalformedXml,
    /// The root element is not `<TS>`.
    UnexpectedRoot,
    /// A `<context>` without `<name>`.
    MissingName,
    /// A `<message>` without `<source>`.
    MissingSource,
    /// A `<message>` without `<translation>`.
    MissingTranslation,
    /// A `<message>` with more than one `<source>` or `<translation>`.
    DuplicateElement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    pub kind: SyntaxIssueKind,
    pub range: SourceRange,
    pub message: String,
}

/// Result of lenient parsing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedCatalog {
    pub catalog: TranslationCatalog,
    pub issues: Vec<SyntaxIssue>,
}

/// Parsing stopped; `offset` defaults to the reader's error position.
struct Abort {
    message: String,
    offset: Option<usize>,
}

impl Abort {
    fn at(offset: usize, message: impl Into<String>) -> Self {
        Self { message: message.into(), offset: Some(offset) }
    }
}

impl From<quick_xml::Error> for Abort {
    fn from(err: quick_xml::Error) -> Self {
        Self { message: err.to_string(), offset: None }
    }
}

type Step<T> = Result<T, Abort>;

/// Parses a TS document.
///
/// # Examples
/// ```
/// use linguist_language_server::syntax::parse_str;
///
/// let parsed = parse_str(
///     r#"<TS version="2.1" language="fr_FR">
/// <context><name>FilterMate</name>
/// <message><source>Filter</source><translation>Filtrer</translation></message>
/// </context></TS>"#,
/// );
///
/// assert!(parsed.issues.is_empty());
/// assert_eq!(parsed.catalog.translate("FilterMate", "Filter"), "Filtrer");
/// ```
#[must_use]
pub fn parse_str(text: &str) -> ParsedCatalog {
    CatalogParser::new(text).parse()
}

struct CatalogParser<'a> {
    text: &'a str,
    reader: Reader<&'a [u8]>,
    line_index: LineIndex,
    issues: Vec<SyntaxIssue>,
}

impl<'a> CatalogParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            reader: Reader::from_str(text),
            line_index: LineIndex::new(text),
            issues: Vec::new(),
        }
    }

    fn offset(&self) -> usize {
        usize::try_from(self.reader.buffer_position()).unwrap_or(usize::MAX)
    }

    fn range(&self, start: usize, end: usize) -> SourceRange {
        self.line_index.range(self.text, start, end)
    }

    fn issue(&mut self, kind: SyntaxIssueKind, range: SourceRange, message: impl Into<String>) {
        self.issues.push(SyntaxIssue { kind, range, message: message.into() });
    }

    fn parse(mut self) -> ParsedCatalog {
        let mut catalog = TranslationCatalog::default();

        if let Err(abort) = self.parse_document(&mut catalog) {
            let offset = abort.offset.unwrap_or_else(|| {
                usize::try_from(self.reader.error_position()).unwrap_or(usize::MAX)
            });
            tracing::debug!(offset, message = %abort.message, "Catalog parsing stopped");

            let end = (offset + 1).min(self.text.len());
            let range = self.range(offset, end);
            self.issue(SyntaxIssueKind::MalformedXml, range, abort.message);
        }

        ParsedCatalog { catalog, issues: self.issues }
    }

    fn parse_document(&mut self, catalog: &mut TranslationCatalog) -> Step<()> {
        loop {
            let start = self.offset();
            match self.reader.read_event()? {
                Event::Start(e) => {
                    if !self.check_root(&e, start) {
                        return Ok(());
                    }
                    read_root_attributes(&e, catalog, start)?;
                    self.parse_root(catalog)?;
                    return self.parse_epilog();
                }
                Event::Empty(e) => {
                    if !self.check_root(&e, start) {
                        return Ok(());
                    }
                    read_root_attributes(&e, catalog, start)?;
                    return self.parse_epilog();
                }
                Event::Text(t) if !is_blank(&t) => {
                    return Err(Abort::at(start, "Text content outside of the root element"));
                }
                Event::Eof => {
                    let range = self.range(start, start);
                    self.issue(
                        SyntaxIssueKind::MalformedXml,
                        range,
                        "Document has no <TS> root element",
                    );
                    return Ok(());
                }
                _ => {}
            }
        }
    }

    /// Only comments, processing instructions and whitespace may follow the root.
    fn parse_epilog(&mut self) -> Step<()> {
        loop {
            let start = self.offset();
            match self.reader.read_event()? {
                Event::Start(e) | Event::Empty(e) => {
                    return Err(Abort::at(
                        start,
                        format!("Element <{}> after the root element", element_name(&e)),
                    ));
                }
                Event::End(_) => {
                    return Err(Abort::at(start, "Closing tag after the root element"));
                }
                Event::Text(t) if !is_blank(&t) => {
                    return Err(Abort::at(start, "Text content after the root element"));
                }
                Event::CData(_) => {
                    return Err(Abort::at(start, "CDATA section after the root element"));
                }
                Event::Eof => return Ok(()),
                _ => {}
            }
        }
    }

    /// Records an issue unless `e` is the `<TS>` element.
    fn check_root(&mut self, e: &BytesStart<'_>, start: usize) -> bool {
        if e.local_name().as_ref() == b"TS" {
            return true;
        }
        let range = self.range(start, self.offset());
        self.issue(
            SyntaxIssueKind::UnexpectedRoot,
            range,
            format!("Expected <TS> root element, found <{}>", element_name(e)),
        );
        false
    }

    fn parse_root(&mut self, catalog: &mut TranslationCatalog) -> Step<()> {
        loop {
            let start = self.offset();
            match self.reader.read_event()? {
                Event::Start(e) if e.local_name().as_ref() == b"context" => {
                    let context = self.parse_context(start)?;
                    catalog.contexts.push(context);
                }
                Event::Start(e) => {
                    self.reader.read_to_end(e.name())?;
                }
                Event::End(_) => return Ok(()),
                Event::Eof => {
                    return Err(Abort::at(start, "Unexpected end of document inside <TS>"));
                }
                _ => {}
            }
        }
    }

    fn parse_context(&mut self, start: usize) -> Step<Context> {
        let mut context = Context::default();
        let mut has_name = false;

        loop {
            let offset = self.offset();
            match self.reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"name" => {
                        context.name = self.read_text(offset)?;
                        has_name = true;
                    }
                    b"message" => context.messages.push(self.parse_message(&e, offset, false)?),
                    _ => {
                        self.reader.read_to_end(e.name())?;
                    }
                },
                Event::Empty(e) if e.local_name().as_ref() == b"message" => {
                    context.messages.push(self.parse_message(&e, offset, true)?);
                }
                Event::Empty(e) if e.local_name().as_ref() == b"name" => has_name = true,
                Event::End(_) => {
                    context.range = self.range(start, self.offset());
                    if !has_name {
                        self.issue(
                            SyntaxIssueKind::MissingName,
                            context.range,
                            "Context has no <name> element",
                        );
                    }
                    return Ok(context);
                }
                Event::Eof => {
                    return Err(Abort::at(offset, "Unexpected end of document inside <context>"));
                }
                _ => {}
            }
        }
    }

    fn parse_message(&mut self, e: &BytesStart<'_>, start: usize, empty: bool) -> Step<Message> {
        let mut message = Message {
            id: attribute(e, "id", start)?,
            numerus: attribute(e, "numerus", start)?.as_deref() == Some("yes"),
            ..Message::default()
        };
        let mut source_count = 0;
        let mut translation_count = 0;

        while !empty {
            let offset = self.offset();
            match self.reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"source" => {
                        let text = self.read_text(offset)?;
                        source_count += 1;
                        self.record_source(&mut message, text, offset, source_count);
                    }
                    b"translation" => {
                        let kind = translation_kind(&e, offset)?;
                        let translation = self.parse_translation(kind)?;
                        translation_count += 1;
                        self.record_translation(&mut message, translation, offset, translation_count);
                    }
                    b"comment" => message.comment = Some(self.read_text(offset)?),
                    b"oldsource" => message.old_source = Some(self.read_text(offset)?),
                    b"oldcomment" => message.old_comment = Some(self.read_text(offset)?),
                    b"extracomment" => message.extra_comment = Some(self.read_text(offset)?),
                    b"translatorcomment" => {
                        message.translator_comment = Some(self.read_text(offset)?);
                    }
                    _ => {
                        self.reader.read_to_end(e.name())?;
                    }
                },
                Event::Empty(e) => match e.local_name().as_ref() {
                    b"location" => message.locations.push(Location {
                        filename: attribute(&e, "filename", offset)?,
                        line: attribute(&e, "line", offset)?,
                    }),
                    b"source" => {
                        source_count += 1;
                        self.record_source(&mut message, String::new(), offset, source_count);
                    }
                    b"translation" => {
                        let kind = translation_kind(&e, offset)?;
                        let translation =
                            Translation { kind, text: String::new(), numerus_forms: Vec::new() };
                        translation_count += 1;
                        self.record_translation(&mut message, translation, offset, translation_count);
                    }
                    _ => {}
                },
                Event::End(_) => break,
                Event::Eof => {
                    return Err(Abort::at(offset, "Unexpected end of document inside <message>"));
                }
                _ => {}
            }
        }

        message.ranges.message = self.range(start, self.offset());

        if message.numerus
            && let Some(translation) = message.translation.as_mut()
            && translation.text.trim().is_empty()
        {
            translation.text.clear();
        }
        if source_count == 0 {
            self.issue(
                SyntaxIssueKind::MissingSource,
                message.ranges.message,
                "Message has no <source> element",
            );
        }
        if translation_count == 0 {
            self.issue(
                SyntaxIssueKind::MissingTranslation,
                message.ranges.message,
                format!("Message '{}' has no <translation> element", message.source_text()),
            );
        }

        Ok(message)
    }

    fn record_source(&mut self, message: &mut Message, text: String, start: usize, count: usize) {
        let range = self.range(start, self.offset());
        if count == 1 {
            message.source = Some(text);
            message.ranges.source = Some(range);
        } else {
            self.issue(SyntaxIssueKind::DuplicateElement, range, "Message has more than one <source>");
        }
    }

    fn record_translation(
        &mut self,
        message: &mut Message,
        translation: Translation,
        start: usize,
        count: usize,
    ) {
        let range = self.range(start, self.offset());
        if count == 1 {
            message.translation = Some(translation);
            message.ranges.translation = Some(range);
        } else {
            self.issue(
                SyntaxIssueKind::DuplicateElement,
                range,
                format!("Message '{}' has more than one <translation>", message.source_text()),
            );
        }
    }

    fn parse_translation(&mut self, kind: TranslationKind) -> Step<Translation> {
        let mut text = String::new();
        let mut numerus_forms = Vec::new();

        loop {
            let offset = self.offset();
            match self.reader.read_event()? {
                Event::Text(t) => text.push_str(&unescape(&t, offset)?),
                Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
                Event::Start(e) if e.local_name().as_ref() == b"numerusform" => {
                    numerus_forms.push(self.read_text(offset)?);
                }
                Event::Start(e) => {
                    self.reader.read_to_end(e.name())?;
                }
                Event::Empty(e) => match e.local_name().as_ref() {
                    b"numerusform" => numerus_forms.push(String::new()),
                    b"byte" => text.extend(byte_value(&e, offset)?),
                    _ => {}
                },
                Event::End(_) => break,
                Event::Eof => {
                    return Err(Abort::at(offset, "Unexpected end of document inside <translation>"));
                }
                _ => {}
            }
        }

        if !numerus_forms.is_empty() {
            text.clear();
        }
        Ok(Translation { kind, text, numerus_forms })
    }

    /// Reads the character content of the element whose start tag was just read.
    fn read_text(&mut self, start: usize) -> Step<String> {
        let mut text = String::new();

        loop {
            let offset = self.offset();
            match self.reader.read_event()? {
                Event::Text(t) => text.push_str(&unescape(&t, offset)?),
                Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
                Event::Empty(e) if e.local_name().as_ref() == b"byte" => {
                    text.extend(byte_value(&e, offset)?);
                }
                Event::Start(e) => {
                    self.reader.read_to_end(e.name())?;
                }
                Event::End(_) => return Ok(text),
                Event::Eof => return Err(Abort::at(start, "Unexpected end of document")),
                _ => {}
            }
        }
    }
}

fn read_root_attributes(
    e: &BytesStart<'_>,
    catalog: &mut TranslationCatalog,
    offset: usize,
) -> Step<()> {
    catalog.version = attribute(e, "version", offset)?;
    catalog.language = attribute(e, "language", offset)?;
    catalog.source_language = attribute(e, "sourcelanguage", offset)?;
    Ok(())
}

fn translation_kind(e: &BytesStart<'_>, offset: usize) -> Step<TranslationKind> {
    Ok(TranslationKind::from_attribute(attribute(e, "type", offset)?.as_deref()))
}

fn attribute(e: &BytesStart<'_>, name: &str, offset: usize) -> Step<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Abort::at(offset, err.to_string()))?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            let value = attr.unescape_value().map_err(|err| Abort::at(offset, err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Decodes `<byte value="x41"/>` (hex) or `<byte value="65"/>` (decimal).
fn byte_value(e: &BytesStart<'_>, offset: usize) -> Step<Option<char>> {
    let Some(value) = attribute(e, "value", offset)? else {
        return Ok(None);
    };
    let code = value.strip_prefix('x').map_or_else(
        || value.parse::<u32>().ok(),
        |hex| u32::from_str_radix(hex, 16).ok(),
    );
    Ok(code.and_then(char::from_u32))
}

fn unescape(text: &BytesText<'_>, offset: usize) -> Step<String> {
    text.unescape().map(Cow::into_owned).map_err(|err| Abort::at(offset, err.to_string()))
}

fn is_blank(text: &BytesText<'_>) -> bool {
    text.iter().all(u8::is_ascii_whitespace)
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::types::SourcePosition;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.1" language="fr_FR" sourcelanguage="en_US">
<context>
    <name>FilterMateDockWidget</name>
    <message>
        <location filename="../filter_mate_dockwidget.py" line="123"/>
        <source>Database deleted: {filename}</source>
        <translation>Base de données supprimée : {filename}</translation>
    </message>
    <message>
        <source>Open</source>
        <comment>file</comment>
        <extracomment>Toolbar button</extracomment>
        <translation type="unfinished"></translation>
    </message>
</context>
<context>
    <name>FeedbackUtils</name>
    <message numerus="yes">
        <source>%n layer(s) filtered</source>
        <translation>
            <numerusform>%n couche filtrée</numerusform>
            <numerusform>%n couches filtrées</numerusform>
        </translation>
    </message>
</context>
</TS>
"#;

    #[googletest::test]
    fn test_parse_sample() {
        let parsed = parse_str(SAMPLE);

        expect_that!(parsed.issues, is_empty());
        let catalog = &parsed.catalog;
        expect_that!(catalog.version, some(eq("2.1")));
        expect_that!(catalog.language, some(eq("fr_FR")));
        expect_that!(catalog.source_language, some(eq("en_US")));
        expect_that!(catalog.contexts, len(eq(2)));

        let dock = &catalog.contexts[0];
        expect_that!(dock.name, eq("FilterMateDockWidget"));
        expect_that!(dock.messages, len(eq(2)));

        let first = &dock.messages[0];
        expect_that!(first.source, some(eq("Database deleted: {filename}")));
        expect_that!(
            first.translation,
            some(field!(Translation.text, eq("Base de données supprimée : {filename}")))
        );
        expect_that!(
            first.locations,
            elements_are![all![
                field!(Location.filename, some(eq("../filter_mate_dockwidget.py"))),
                field!(Location.line, some(eq("123")))
            ]]
        );

        let second = &dock.messages[1];
        expect_that!(second.comment, some(eq("file")));
        expect_that!(second.extra_comment, some(eq("Toolbar button")));
        expect_that!(
            second.translation,
            some(field!(Translation.kind, eq(&TranslationKind::Unfinished)))
        );

        let plural = &catalog.contexts[1].messages[0];
        expect_that!(plural.numerus, eq(true));
        expect_that!(
            plural.translation,
            some(all![
                field!(Translation.text, eq("")),
                field!(
                    Translation.numerus_forms,
                    elements_are![eq("%n couche filtrée"), eq("%n couches filtrées")]
                )
            ])
        );
    }

    #[googletest::test]
    fn test_parse_records_ranges() {
        let parsed = parse_str(SAMPLE);
        let message = &parsed.catalog.contexts[0].messages[0];

        expect_that!(message.ranges.message.start, eq(SourcePosition { line: 5, character: 4 }));
        expect_that!(message.ranges.message.end, eq(SourcePosition { line: 9, character: 14 }));
        expect_that!(
            message.ranges.source.map(|r| r.start),
            some(eq(SourcePosition { line: 7, character: 8 }))
        );
    }

    #[rstest]
    #[case::entities("<source>Tom &amp; Jerry &lt;3</source>", "Tom & Jerry <3")]
    #[case::char_refs("<source>&#233;t&#xE9;</source>", "été")]
    #[case::cdata("<source><![CDATA[a < b]]></source>", "a < b")]
    #[case::byte_element("<source>tab<byte value=\"x9\"/>here</source>", "tab\there")]
    #[case::whitespace_preserved("<source>  padded  </source>", "  padded  ")]
    #[case::empty_source("<source/>", "")]
    fn test_parse_source_text(#[case] source_xml: &str, #[case] expected: &str) {
        let text = format!(
            "<TS><context><name>C</name><message>{source_xml}<translation>t</translation></message></context></TS>"
        );

        let parsed = parse_str(&text);

        assert_that!(parsed.issues, is_empty());
        assert_that!(parsed.catalog.contexts[0].messages[0].source, some(eq(expected)));
    }

    #[googletest::test]
    fn test_parse_malformed_xml_keeps_prefix() {
        let text = "<TS>\n<context><name>A</name><message><source>x</source><translation>y</translation></message></context>\n<context><name>B</name>\n</TS>";

        let parsed = parse_str(text);

        expect_that!(
            parsed.issues,
            elements_are![field!(SyntaxIssue.kind, eq(&SyntaxIssueKind::MalformedXml))]
        );
        expect_that!(parsed.catalog.contexts, len(eq(1)));
        expect_that!(parsed.catalog.translate("A", "x"), eq("y"));
    }

    #[googletest::test]
    fn test_parse_unexpected_root() {
        let parsed = parse_str("<resources><string name=\"a\">b</string></resources>");

        expect_that!(
            parsed.issues,
            elements_are![all![
                field!(SyntaxIssue.kind, eq(&SyntaxIssueKind::UnexpectedRoot)),
                field!(SyntaxIssue.message, contains_substring("<resources>"))
            ]]
        );
        expect_that!(parsed.catalog.contexts, is_empty());
    }

    #[googletest::test]
    fn test_parse_empty_document() {
        let parsed = parse_str("");

        expect_that!(
            parsed.issues,
            elements_are![field!(SyntaxIssue.kind, eq(&SyntaxIssueKind::MalformedXml))]
        );
    }

    #[rstest]
    #[case::trailing_element("<TS></TS><extra/>", "<extra>")]
    #[case::trailing_text("<TS></TS>garbage", "Text content")]
    #[case::second_root("<TS></TS><TS></TS>", "<TS>")]
    #[case::after_empty_root("<TS/>\n<TS/>", "<TS>")]
    fn test_parse_content_after_root(#[case] text: &str, #[case] detail: &str) {
        let parsed = parse_str(text);

        assert_that!(
            parsed.issues,
            elements_are![all![
                field!(SyntaxIssue.kind, eq(&SyntaxIssueKind::MalformedXml)),
                field!(SyntaxIssue.message, contains_substring(detail))
            ]]
        );
    }

    #[googletest::test]
    fn test_parse_allows_trailing_comments_and_whitespace() {
        let parsed = parse_str("<TS language=\"fr\"></TS>\n<!-- generated -->\n\n");

        expect_that!(parsed.issues, is_empty());
        expect_that!(parsed.catalog.language, some(eq("fr")));
    }

    #[googletest::test]
    fn test_parse_context_without_name() {
        let text = "<TS>\n<context><message><source>a</source><translation>b</translation></message></context>\n</TS>";

        let parsed = parse_str(text);

        assert_that!(
            parsed.issues,
            elements_are![field!(SyntaxIssue.kind, eq(&SyntaxIssueKind::MissingName))]
        );
        expect_that!(parsed.issues[0].range.start.line, eq(1));
        expect_that!(parsed.catalog.contexts[0].messages, len(eq(1)));
    }

    #[googletest::test]
    fn test_parse_unclosed_document() {
        let parsed = parse_str("<TS><context><name>A</name>");

        expect_that!(
            parsed.issues,
            elements_are![field!(SyntaxIssue.kind, eq(&SyntaxIssueKind::MalformedXml))]
        );
    }

    #[googletest::test]
    fn test_parse_missing_elements() {
        let text = "<TS>\n<context><name>A</name>\n<message><source>only source</source></message>\n<message><translation>only translation</translation></message>\n<message/>\n</context></TS>";

        let parsed = parse_str(text);
        let kinds: Vec<_> = parsed.issues.iter().map(|i| (i.kind, i.range.start.line)).collect();

        expect_that!(
            kinds,
            elements_are![
                eq(&(SyntaxIssueKind::MissingTranslation, 2)),
                eq(&(SyntaxIssueKind::MissingSource, 3)),
                eq(&(SyntaxIssueKind::MissingSource, 4)),
                eq(&(SyntaxIssueKind::MissingTranslation, 4))
            ]
        );
        expect_that!(parsed.catalog.contexts[0].messages, len(eq(3)));
    }

    #[googletest::test]
    fn test_parse_duplicate_elements_keep_first() {
        let text = "<TS><context><name>A</name><message><source>one</source><source>two</source><translation>un</translation><translation>deux</translation></message></context></TS>";

        let parsed = parse_str(text);

        expect_that!(
            parsed.issues,
            elements_are![
                field!(SyntaxIssue.kind, eq(&SyntaxIssueKind::DuplicateElement)),
                field!(SyntaxIssue.kind, eq(&SyntaxIssueKind::DuplicateElement))
            ]
        );
        expect_that!(parsed.catalog.translate("A", "one"), eq("un"));
    }

    #[googletest::test]
    fn test_parse_skips_unknown_elements() {
        let text = "<TS><dependencies><dependency catalog=\"qtbase\"/></dependencies><context><name>A</name><message><source>s</source><userdata>x<b>y</b></userdata><translation>t</translation></message></context></TS>";

        let parsed = parse_str(text);

        expect_that!(parsed.issues, is_empty());
        expect_that!(parsed.catalog.translate("A", "s"), eq("t"));
    }
}
