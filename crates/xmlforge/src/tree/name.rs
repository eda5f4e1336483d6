//! Lexical checks for names and character data
//!
//! Names follow the `NCName` production of Namespaces in XML 1.0: an XML
//! `Name` without colons. Character data must consist of XML 1.0 `Char`s.

use crate::error::{Error, ErrorKind, Result};

/// Reject anything that is not a non-empty `NCName`
pub fn validate_ncname(name: &str) -> Result<()> {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start(first) => {}
        _ => return Err(Error::invalid_name(name)),
    }
    if chars.all(is_name_char) {
        Ok(())
    } else {
        Err(Error::invalid_name(name))
    }
}

/// Reject text containing characters outside the XML `Char` production
pub fn validate_chars(text: &str) -> Result<()> {
    match text.chars().find(|ch| !is_xml_char(*ch)) {
        Some(ch) => Err(Error::new(ErrorKind::InvalidCharacter { ch })),
        None => Ok(()),
    }
}

fn is_name_start(ch: char) -> bool {
    matches!(ch,
        'A'..='Z'
        | 'a'..='z'
        | '_'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(ch: char) -> bool {
    is_name_start(ch)
        || matches!(ch,
            '0'..='9'
            | '-'
            | '.'
            | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}

fn is_xml_char(ch: char) -> bool {
    matches!(ch,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}
