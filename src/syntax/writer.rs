//! Serializes a catalog back into TS XML in lupdate's element order.

use quick_xml::Writer;
use quick_xml::escape::escape;
use quick_xml::events::{
    BytesDecl,
    BytesEnd,
    BytesStart,
    BytesText,
    Event,
};

use super::CatalogError;
use crate::catalog::{
    Context,
    Message,
    Translation,
    TranslationCatalog,
};

/// Indentation width used by lupdate.
const INDENT_SIZE: usize = 4;

/// Writes `catalog` as a TS document.
///
/// # Errors
/// Returns [`CatalogError::Write`] if the XML writer fails.
pub fn write_catalog(catalog: &TranslationCatalog) -> Result<String, CatalogError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_SIZE);

    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    emit(&mut writer, Event::DocType(BytesText::from_escaped("TS")))?;

    let mut root = BytesStart::new("TS");
    for (name, value) in [
        ("version", &catalog.version),
        ("language", &catalog.language),
        ("sourcelanguage", &catalog.source_language),
    ] {
        if let Some(value) = value {
            root.push_attribute((name, value.as_str()));
        }
    }
    emit(&mut writer, Event::Start(root))?;

    for context in &catalog.contexts {
        write_context(&mut writer, context)?;
    }

    emit(&mut writer, Event::End(BytesEnd::new("TS")))?;

    let mut text =
        String::from_utf8(writer.into_inner()).map_err(|e| CatalogError::Write(e.to_string()))?;
    text.push('\n');
    Ok(text)
}

fn write_context(writer: &mut Writer<Vec<u8>>, context: &Context) -> Result<(), CatalogError> {
    emit(writer, Event::Start(BytesStart::new("context")))?;
    text_element(writer, BytesStart::new("name"), &context.name)?;

    for message in &context.messages {
        write_message(writer, message)?;
    }

    emit(writer, Event::End(BytesEnd::new("context")))
}

fn write_message(writer: &mut Writer<Vec<u8>>, message: &Message) -> Result<(), CatalogError> {
    let mut start = BytesStart::new("message");
    if let Some(id) = &message.id {
        start.push_attribute(("id", id.as_str()));
    }
    if message.numerus {
        start.push_attribute(("numerus", "yes"));
    }
    emit(writer, Event::Start(start))?;

    for location in &message.locations {
        let mut element = BytesStart::new("location");
        if let Some(filename) = &location.filename {
            element.push_attribute(("filename", filename.as_str()));
        }
        if let Some(line) = &location.line {
            element.push_attribute(("line", line.as_str()));
        }
        emit(writer, Event::Empty(element))?;
    }

    if let Some(source) = &message.source {
        text_element(writer, BytesStart::new("source"), source)?;
    }
    for (name, value) in [
        ("oldsource", &message.old_source),
        ("comment", &message.comment),
        ("oldcomment", &message.old_comment),
        ("extracomment", &message.extra_comment),
        ("translatorcomment", &message.translator_comment),
    ] {
        if let Some(value) = value {
            text_element(writer, BytesStart::new(name), value)?;
        }
    }
    if let Some(translation) = &message.translation {
        write_translation(writer, translation, message.numerus)?;
    }

    emit(writer, Event::End(BytesEnd::new("message")))
}

fn write_translation(
    writer: &mut Writer<Vec<u8>>,
    translation: &Translation,
    numerus: bool,
) -> Result<(), CatalogError> {
    let mut start = BytesStart::new("translation");
    if let Some(kind) = translation.kind.as_attribute() {
        start.push_attribute(("type", kind));
    }

    if !numerus || translation.numerus_forms.is_empty() {
        return text_element(writer, start, &translation.text);
    }

    emit(writer, Event::Start(start))?;
    for form in &translation.numerus_forms {
        text_element(writer, BytesStart::new("numerusform"), form)?;
    }
    emit(writer, Event::End(BytesEnd::new("translation")))
}

/// `<name attrs>text</name>`, always with an explicit end tag.
fn text_element(
    writer: &mut Writer<Vec<u8>>,
    start: BytesStart<'_>,
    text: &str,
) -> Result<(), CatalogError> {
    let end = start.to_end().into_owned();
    emit(writer, Event::Start(start))?;
    // One pre-escaped event so the indenting writer never breaks the text
    emit(writer, Event::Text(BytesText::from_escaped(escape_text(text))))?;
    emit(writer, Event::End(end))
}

/// Escapes markup characters and encodes what XML 1.0 cannot carry.
///
/// `\r` becomes `&#13;` so readers do not normalize it to `\n`; other
/// characters outside the XML `Char` production become lupdate's
/// `<byte value="xN"/>`.
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(index) = rest.find(|c: char| c == '\r' || !is_xml_char(c)) {
        let (plain, tail) = rest.split_at(index);
        escaped.push_str(&escape(plain));

        let mut chars = tail.chars();
        match chars.next() {
            Some('\r') => escaped.push_str("&#13;"),
            Some(c) => escaped.push_str(&format!("<byte value=\"x{:x}\"/>", u32::from(c))),
            None => {}
        }
        rest = chars.as_str();
    }

    escaped.push_str(&escape(rest));
    escaped
}

/// Whether `c` matches the XML 1.0 `Char` production.
const fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{fffd}' | '\u{10000}'..)
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), CatalogError> {
    writer.write_event(event).map_err(|e| CatalogError::Write(e.to_string()))
}
