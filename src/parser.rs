//! XML-RPC document parser.
//!
//! A recursive-descent parser over the events produced by `xml-rs`. The parser looks at most one
//! token ahead: a token that did not satisfy the current rule is held in a pushback slot and is
//! offered to whichever rule reads next.

use crate::error::{Mismatch, ParseError};
use crate::utils::parse_datetime;
use crate::Value;

use xml::common::{Position, TextPosition};
use xml::reader::{EventReader, XmlEvent};
use xml::ParserConfig;

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::io::{BufReader, Read};

pub type ParseResult<T> = Result<T, ParseError>;

/// The part of an XML event the grammar cares about.
#[derive(Clone, Debug, PartialEq)]
enum Token {
    /// Start element, by local name.
    Start(String),
    /// End element, by local name.
    End(String),
    Text(String),
    Whitespace(String),
    Eof,
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            Token::Start(ref name) => write!(f, "<{}>", name),
            Token::End(ref name) => write!(f, "</{}>", name),
            Token::Text(ref text) => write!(f, "characters {:?}", text),
            Token::Whitespace(_) => f.write_str("whitespace"),
            Token::Eof => f.write_str("end of document"),
        }
    }
}

pub struct Parser<R: Read> {
    reader: EventReader<BufReader<R>>,
    pushback: Option<(Token, TextPosition)>,
}

impl<R: Read> Parser<R> {
    pub fn new(reader: R) -> Self {
        let config = ParserConfig::new().cdata_to_characters(true);

        Parser {
            reader: EventReader::new_with_config(BufReader::new(reader), config),
            pushback: None,
        }
    }

    /// Returns the pushed back token if there is one, otherwise reads the next relevant event.
    ///
    /// Returns an `Err` if a start element has any attributes.
    ///
    /// Tokens are tagged with the reader position after the event, that is, the end of the token.
    fn next_token(&mut self) -> ParseResult<(Token, TextPosition)> {
        if let Some(pushed) = self.pushback.take() {
            return Ok(pushed);
        }

        loop {
            let event = self.reader.next()?;
            let position = self.reader.position();
            let token = match event {
                XmlEvent::StartElement { name, attributes, .. } => {
                    if !attributes.is_empty() {
                        return Err(ParseError::UnexpectedAttributes {
                            element: name.local_name,
                            position,
                        });
                    }
                    Token::Start(name.local_name)
                }
                XmlEvent::EndElement { name } => Token::End(name.local_name),
                XmlEvent::Characters(text) | XmlEvent::CData(text) => Token::Text(text),
                XmlEvent::Whitespace(text) => Token::Whitespace(text),
                XmlEvent::EndDocument => Token::Eof,
                _ => continue, // declaration, comments, processing instructions
            };

            return Ok((token, position));
        }
    }

    /// Like `next_token`, but skips whitespace between elements.
    fn next_significant(&mut self) -> ParseResult<(Token, TextPosition)> {
        loop {
            match self.next_token()? {
                (Token::Whitespace(_), _) => continue,
                other => return Ok(other),
            }
        }
    }

    /// Builds an `UnexpectedXml` error for `token`.
    ///
    /// Unless the name of an element was wrong, the token goes back into the pushback slot so
    /// that the next rule can try it.
    fn reject(&mut self, mismatch: Mismatch, expected: String, token: Token, position: TextPosition) -> ParseError {
        let found = token.to_string();
        if mismatch != Mismatch::NameMismatch {
            self.pushback = Some((token, position));
        }

        ParseError::UnexpectedXml {
            mismatch,
            expected,
            found,
            position,
        }
    }

    /// Expects an opening tag like `<tag>`.
    pub fn expect_start(&mut self, name: &str) -> ParseResult<()> {
        let (token, position) = self.next_significant()?;
        match token {
            Token::Start(ref found) if found == name => Ok(()),
            Token::Start(_) => Err(self.reject(Mismatch::NameMismatch, format!("<{}>", name), token, position)),
            _ => Err(self.reject(Mismatch::ExpectedStart, format!("<{}>", name), token, position)),
        }
    }

    /// Expects an opening tag with one of `names` and returns the name that was found.
    pub fn expect_start_of<'n>(&mut self, names: &[&'n str]) -> ParseResult<&'n str> {
        let (token, position) = self.next_significant()?;
        let expected = || names.iter().map(|name| format!("<{}>", name)).collect::<Vec<_>>().join(" or ");
        match token {
            Token::Start(ref found) => match names.iter().find(|name| **name == found.as_str()) {
                Some(name) => Ok(*name),
                None => Err(self.reject(Mismatch::NameMismatch, expected(), token, position)),
            },
            _ => Err(self.reject(Mismatch::ExpectedStart, expected(), token, position)),
        }
    }

    /// Expects a closing tag like `</tag>`.
    pub fn expect_end(&mut self, name: &str) -> ParseResult<()> {
        let (token, position) = self.next_significant()?;
        match token {
            Token::End(ref found) if found == name => Ok(()),
            Token::End(_) => Err(self.reject(Mismatch::NameMismatch, format!("</{}>", name), token, position)),
            _ => Err(self.reject(Mismatch::ExpectedEnd, format!("</{}>", name), token, position)),
        }
    }

    /// Tries to open a repeated element.
    ///
    /// Returns `Ok(false)` if there are no more repetitions, that is, if the next token is not a
    /// start element at all. A start element with the wrong name is still an error.
    pub fn try_start(&mut self, name: &str) -> ParseResult<bool> {
        match self.expect_start(name) {
            Ok(()) => Ok(true),
            Err(ref err) if err.mismatch() == Some(Mismatch::ExpectedStart) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Reads the character data of the current element up to and including `</name>`.
    fn read_text(&mut self, name: &str) -> ParseResult<String> {
        let mut text = String::new();
        loop {
            match self.next_token()? {
                (Token::Text(s), _) | (Token::Whitespace(s), _) => text.push_str(&s),
                other => {
                    self.pushback = Some(other);
                    break;
                }
            }
        }

        self.expect_end(name)?;
        Ok(text)
    }

    /// Reads a `<name>characters</name>` element.
    pub fn read_text_element(&mut self, name: &str) -> ParseResult<String> {
        self.expect_start(name)?;
        self.read_text(name)
    }

    /// Parses a single value: either a `<value>` element, or a bare type element like `<int>`.
    pub fn parse_value(&mut self) -> ParseResult<Value> {
        let (token, position) = self.next_significant()?;
        match token {
            Token::Start(name) => self.parse_element(&name, position),
            token => Err(self.reject(Mismatch::ExpectedStart, "<value>".to_string(), token, position)),
        }
    }

    /// Parses what follows an already consumed `<value>`, including the closing `</value>`.
    ///
    /// Bare character data (even if empty or only whitespace) is a string.
    pub fn parse_value_body(&mut self) -> ParseResult<Value> {
        let mut text = String::new();
        let mut only_whitespace = true;
        loop {
            let (token, position) = self.next_token()?;
            match token {
                Token::Text(s) => {
                    only_whitespace = false;
                    text.push_str(&s);
                }
                Token::Whitespace(s) => text.push_str(&s),
                Token::Start(name) if only_whitespace => {
                    let value = self.parse_element(&name, position)?;
                    self.expect_end("value")?;
                    return Ok(value);
                }
                token => {
                    self.pushback = Some((token, position));
                    self.expect_end("value")?;
                    return Ok(Value::String(text));
                }
            }
        }
    }

    /// Parses the element whose start tag `<name>` was just consumed.
    fn parse_element(&mut self, name: &str, position: TextPosition) -> ParseResult<Value> {
        fn invalid_value(for_type: &'static str, found: String, position: TextPosition) -> ParseError {
            ParseError::InvalidValue {
                for_type,
                found,
                position,
            }
        }

        let value = match name {
            "value" => self.parse_value_body()?,
            "int" | "i1" | "i2" | "i4" => {
                let data = self.read_text(name)?;
                let int = data.trim().parse::<i32>().map_err(|_| invalid_value("int", data.clone(), position))?;
                Value::Int(int)
            }
            "i8" => {
                let data = self.read_text(name)?;
                let int = data.trim().parse::<i64>().map_err(|_| invalid_value("i8", data.clone(), position))?;
                Value::Int64(int)
            }
            "double" => {
                let data = self.read_text(name)?;
                let double = data.trim().parse::<f64>().map_err(|_| invalid_value("double", data.clone(), position))?;
                Value::Double(double)
            }
            "boolean" => {
                let data = self.read_text(name)?;
                match data.trim() {
                    "0" => Value::Bool(false),
                    "1" => Value::Bool(true),
                    _ => return Err(invalid_value("boolean", data, position)),
                }
            }
            "string" => Value::String(self.read_text(name)?),
            "dateTime.iso8601" => {
                let data = self.read_text(name)?;
                match parse_datetime(data.trim()) {
                    Some(date_time) => Value::DateTime(date_time),
                    None => return Err(invalid_value("dateTime.iso8601", data, position)),
                }
            }
            "base64" => {
                let data = self.read_text(name)?;
                // producers commonly wrap long payloads into lines
                let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
                let bytes = base64::decode(&compact).map_err(|_| invalid_value("base64", data.clone(), position))?;
                Value::Base64(bytes)
            }
            "struct" => {
                let mut members = BTreeMap::new();
                while self.try_start("member")? {
                    let name = self.read_text_element("name")?;
                    self.expect_start("value")?;
                    let value = self.parse_value_body()?;
                    self.expect_end("member")?;

                    // a repeated name replaces the earlier member
                    members.insert(name, value);
                }
                self.expect_end("struct")?;

                Value::Struct(members)
            }
            "array" => {
                let mut elements = Vec::new();
                self.expect_start("data")?;
                while self.try_start("value")? {
                    elements.push(self.parse_value_body()?);
                }
                self.expect_end("data")?;
                self.expect_end("array")?;

                Value::Array(elements)
            }
            _ => {
                return Err(ParseError::UnexpectedXml {
                    mismatch: Mismatch::NameMismatch,
                    expected: "a type tag".to_string(),
                    found: format!("<{}>", name),
                    position,
                })
            }
        };

        Ok(value)
    }
}

/// Parses a single XML-RPC value from a reader.
///
/// The document must consist of a `<value>` element or of one of the type elements (`<int>`,
/// `<struct>`, ...).
pub fn parse_value<R: Read>(reader: R) -> ParseResult<Value> {
    Parser::new(reader).parse_value()
}
