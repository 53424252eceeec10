use std::borrow::Cow;

/// Returns true for characters that XML 1.0 does not allow in documents.
///
/// Tab, newline and carriage return are allowed; every other C0 control
/// character is not, nor are the noncharacters U+FFFE and U+FFFF.
fn is_xml_forbidden(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}')
}

/// Strips characters that would make the output feed ill-formed XML.
///
/// Scraped page titles and hover text occasionally carry stray control bytes.
/// `quick-xml` escapes markup characters but writes control characters
/// through unchanged, so they are removed before serialization.
///
/// Returns `Cow::Borrowed` when nothing needs stripping (common case).
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_xml_forbidden) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|&c| !is_xml_forbidden(c)).collect())
}

/// Collapses runs of whitespace into single spaces and trims both ends.
///
/// `<title>` text is frequently split across lines in the page source.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
