//! Inline style conversion between CSS declaration text and camel-cased
//! property maps.

use cssparser::{Delimiter, ParseError, Parser, ParserInput, Token};
use indexmap::IndexMap;

/// Parse a CSS declaration list (`"background-color: red; -webkit-transition: all"`)
/// into a map keyed by camel-cased property names (`backgroundColor`,
/// `WebkitTransition`). Custom properties (`--x`) keep their names.
///
/// Values are kept as written, minus comments and surrounding whitespace.
/// Semicolons inside strings, `url(...)` and other blocks do not end a
/// declaration. Declarations without a property or a value are dropped, and
/// a repeated property keeps its last value.
pub fn parse_style(css: &str) -> IndexMap<String, String> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut out = IndexMap::new();
    loop {
        parser.skip_whitespace();
        if parser.is_exhausted() {
            break;
        }
        let declaration: Result<_, ParseError<'_, ()>> =
            parser.parse_until_after(Delimiter::Semicolon, parse_declaration);
        if let Ok((property, value)) = declaration {
            if !value.is_empty() {
                out.insert(camel_case(&property), value);
            }
        }
    }
    out
}

/// `property: value` up to the delimiter; comments are cut out of the value.
fn parse_declaration<'i>(
    input: &mut Parser<'i, '_>,
) -> Result<(String, String), ParseError<'i, ()>> {
    let property = input.expect_ident()?.to_string();
    input.expect_colon()?;
    let mut value = String::new();
    let mut from = input.position();
    loop {
        let before = input.position();
        let is_comment = match input.next_including_whitespace_and_comments() {
            Ok(token) => matches!(token, Token::Comment(_)),
            Err(_) => break,
        };
        if is_comment {
            value.push_str(input.slice(from..before));
            from = input.position();
        }
    }
    value.push_str(input.slice_from(from));
    Ok((property, value.trim().to_string()))
}

/// Inverse of [`parse_style`]: `kebab-key:value` pairs joined with `;`.
pub fn to_css_text(style: &IndexMap<String, String>) -> String {
    style
        .iter()
        .map(|(k, v)| format!("{}:{v}", kebab_case(k)))
        .collect::<Vec<_>>()
        .join(";")
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn camel_case(property: &str) -> String {
    if property.starts_with("--") {
        return property.to_string();
    }
    let mut out = String::with_capacity(property.len());
    let mut chars = property.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '-' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some(&next) if is_word(next) => {
                out.extend(next.to_uppercase());
                chars.next();
            }
            // trailing dash is dropped
            None => {}
            Some(_) => out.push(c),
        }
    }
    out
}

fn kebab_case(property: &str) -> String {
    if property.starts_with("--") {
        return property.to_string();
    }
    let mut out = String::with_capacity(property.len() + 4);
    // `msTransition` carries its vendor prefix in lower case
    if property.starts_with("ms") && property.chars().nth(2).is_some_and(char::is_uppercase) {
        out.push('-');
    }
    for c in property.chars() {
        if c.is_uppercase() {
            out.push('-');
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
