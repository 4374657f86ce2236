//! Declared field types.
//!
//! A [`TypeHint`] describes a field the way a schema author writes it:
//! a scalar or message name, optionally wrapped in a container and/or
//! unioned with the absent marker. Hints have a compact textual form:
//!
//! ```text
//! int32                  scalar
//! Point                  embedded message (any non-scalar name)
//! list[int32]            repeated, ordered list
//! deque[int32]           repeated, double-ended queue
//! iterable[int32]        repeated, unbounded iterable
//! tuple[int32, ...]      repeated, immutable tuple
//! tuple[int32, string]   fixed tuple (not repeated)
//! int32 | None           optional
//! optional[int32]        same as `int32 | None`
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Primitive field types understood by the wire decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    Bool,
    Int32,
    Int64,
    #[serde(rename = "uint32")]
    UInt32,
    #[serde(rename = "uint64")]
    UInt64,
    #[serde(rename = "sint32")]
    SInt32,
    #[serde(rename = "sint64")]
    SInt64,
    Fixed32,
    Fixed64,
    #[serde(rename = "sfixed32")]
    SFixed32,
    #[serde(rename = "sfixed64")]
    SFixed64,
    Float,
    Double,
    String,
    Bytes,
    Enum,
}

impl ScalarType {
    /// Every scalar type, in declaration order.
    pub const ALL: [ScalarType; 16] = [
        Self::Bool,
        Self::Int32,
        Self::Int64,
        Self::UInt32,
        Self::UInt64,
        Self::SInt32,
        Self::SInt64,
        Self::Fixed32,
        Self::Fixed64,
        Self::SFixed32,
        Self::SFixed64,
        Self::Float,
        Self::Double,
        Self::String,
        Self::Bytes,
        Self::Enum,
    ];

    /// The name used in the textual hint syntax.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::SInt32 => "sint32",
            Self::SInt64 => "sint64",
            Self::Fixed32 => "fixed32",
            Self::Fixed64 => "fixed64",
            Self::SFixed32 => "sfixed32",
            Self::SFixed64 => "sfixed64",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Enum => "enum",
        }
    }

    /// Looks up a scalar type by its textual name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|scalar| scalar.name() == name)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The ordered container a repeated field accumulates into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    /// Growable ordered sequence.
    #[default]
    List,
    /// Double-ended queue.
    Deque,
    /// Immutable tuple; appending builds a new tuple.
    Tuple,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::List => "list",
            Self::Deque => "deque",
            Self::Tuple => "tuple",
        })
    }
}

/// A declared field type.
///
/// Serialized as its textual form (see the module docs).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeHint {
    /// A primitive value.
    Scalar(ScalarType),
    /// An embedded message, by message type name.
    Message(String),
    /// `list[T]`
    List(Box<TypeHint>),
    /// `deque[T]`
    Deque(Box<TypeHint>),
    /// `iterable[T]`
    Iterable(Box<TypeHint>),
    /// `tuple[A, B, ...]`. A tuple whose second (and last) argument is
    /// [`TypeHint::Ellipsis`] is the open, repeated form `tuple[T, ...]`.
    Tuple(Vec<TypeHint>),
    /// The repetition marker `...`.
    Ellipsis,
    /// `A | B | ...`
    Union(Vec<TypeHint>),
    /// The explicit absent marker `None`.
    Absent,
}

impl TypeHint {
    #[must_use]
    pub fn scalar(scalar: ScalarType) -> Self {
        Self::Scalar(scalar)
    }

    #[must_use]
    pub fn message(name: impl Into<String>) -> Self {
        Self::Message(name.into())
    }

    #[must_use]
    pub fn list(element: TypeHint) -> Self {
        Self::List(Box::new(element))
    }

    #[must_use]
    pub fn deque(element: TypeHint) -> Self {
        Self::Deque(Box::new(element))
    }

    #[must_use]
    pub fn iterable(element: TypeHint) -> Self {
        Self::Iterable(Box::new(element))
    }

    /// `tuple[element, ...]`
    #[must_use]
    pub fn open_tuple(element: TypeHint) -> Self {
        Self::Tuple(vec![element, Self::Ellipsis])
    }

    /// `hint | None`
    #[must_use]
    pub fn optional(hint: TypeHint) -> Self {
        Self::union([hint, Self::Absent])
    }

    /// Builds a union, flattening nested unions.
    ///
    /// A single member is returned as-is rather than wrapped.
    #[must_use]
    pub fn union(members: impl IntoIterator<Item = TypeHint>) -> Self {
        let mut flat = Vec::new();
        for member in members {
            match member {
                Self::Union(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Self::Union(flat)
        }
    }

    /// Returns true for the absent marker `None`.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns the message type name for an embedded message hint.
    #[must_use]
    pub fn message_name(&self) -> Option<&str> {
        match self {
            Self::Message(name) => Some(name),
            _ => None,
        }
    }

    /// Every message type name mentioned anywhere in the hint, in order of
    /// appearance.
    #[must_use]
    pub fn message_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_message_names(&mut names);
        names
    }

    fn collect_message_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::Message(name) => names.push(name),
            Self::List(element) | Self::Deque(element) | Self::Iterable(element) => {
                element.collect_message_names(names);
            }
            Self::Tuple(members) | Self::Union(members) => {
                for member in members {
                    member.collect_message_names(names);
                }
            }
            Self::Scalar(_) | Self::Ellipsis | Self::Absent => {}
        }
    }
}

impl From<ScalarType> for TypeHint {
    fn from(scalar: ScalarType) -> Self {
        Self::Scalar(scalar)
    }
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(scalar) => write!(f, "{scalar}"),
            Self::Message(name) => f.write_str(name),
            Self::List(element) => write!(f, "list[{element}]"),
            Self::Deque(element) => write!(f, "deque[{element}]"),
            Self::Iterable(element) => write!(f, "iterable[{element}]"),
            Self::Tuple(args) => {
                f.write_str("tuple[")?;
                write_joined(f, args, ", ")?;
                f.write_str("]")
            }
            Self::Ellipsis => f.write_str("..."),
            Self::Union(members) => write_joined(f, members, " | "),
            Self::Absent => f.write_str("None"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, hints: &[TypeHint], sep: &str) -> fmt::Result {
    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{hint}")?;
    }
    Ok(())
}

impl FromStr for TypeHint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let tokens = tokenize(s)?;
        let mut parser = Parser {
            input: s,
            tokens,
            pos: 0,
        };
        let hint = parser.parse_union()?;
        match parser.peek() {
            None => Ok(hint),
            Some(token) => Err(parser.error(&format!("unexpected {token}"))),
        }
    }
}

impl TryFrom<String> for TypeHint {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<TypeHint> for String {
    fn from(hint: TypeHint) -> Self {
        hint.to_string()
    }
}

// ── Parsing ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Ident(&'a str),
    Open,
    Close,
    Comma,
    Pipe,
    Ellipsis,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "`{name}`"),
            Self::Open => f.write_str("`[`"),
            Self::Close => f.write_str("`]`"),
            Self::Comma => f.write_str("`,`"),
            Self::Pipe => f.write_str("`|`"),
            Self::Ellipsis => f.write_str("`...`"),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn tokenize(input: &str) -> Result<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '[' | ']' | ',' | '|' => {
                chars.next();
                tokens.push(match c {
                    '[' => Token::Open,
                    ']' => Token::Close,
                    ',' => Token::Comma,
                    _ => Token::Pipe,
                });
            }
            '.' if input[start..].starts_with("...") => {
                chars.nth(2);
                tokens.push(Token::Ellipsis);
            }
            c if is_ident_char(c) => {
                let mut end = start;
                // Dotted names (`pkg.Point`) are one identifier.
                while let Some(&(i, c)) = chars.peek() {
                    let dotted = c == '.' && !input[i..].starts_with("...");
                    if is_ident_char(c) || dotted {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(&input[start..end]));
            }
            other => {
                return Err(Error::InvalidTypeHint(format!(
                    "{input:?}: unexpected character {other:?} at {start}"
                )));
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: Token<'a>) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, reason: &str) -> Error {
        Error::InvalidTypeHint(format!("{:?}: {reason}", self.input))
    }

    fn parse_union(&mut self) -> Result<TypeHint> {
        let mut members = vec![self.parse_primary()?];
        while self.eat(Token::Pipe) {
            members.push(self.parse_primary()?);
        }
        Ok(TypeHint::union(members))
    }

    fn parse_primary(&mut self) -> Result<TypeHint> {
        match self.next() {
            Some(Token::Ellipsis) => Ok(TypeHint::Ellipsis),
            Some(Token::Ident(name)) => {
                if self.eat(Token::Open) {
                    let args = self.parse_args()?;
                    self.generic(name, args)
                } else {
                    Ok(plain(name))
                }
            }
            Some(token) => Err(self.error(&format!("unexpected {token}"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<TypeHint>> {
        let mut args = vec![self.parse_union()?];
        while self.eat(Token::Comma) {
            args.push(self.parse_union()?);
        }
        if self.eat(Token::Close) {
            Ok(args)
        } else {
            Err(self.error("expected `]`"))
        }
    }

    fn generic(&self, name: &str, mut args: Vec<TypeHint>) -> Result<TypeHint> {
        let lowered = name.to_ascii_lowercase();
        if lowered == "tuple" {
            return Ok(TypeHint::Tuple(args));
        }
        if args.len() != 1 {
            return Err(self.error(&format!(
                "`{name}` takes exactly one argument, got {}",
                args.len()
            )));
        }
        let arg = args.remove(0);
        match lowered.as_str() {
            "list" => Ok(TypeHint::list(arg)),
            "deque" => Ok(TypeHint::deque(arg)),
            "iterable" => Ok(TypeHint::iterable(arg)),
            "optional" => Ok(TypeHint::optional(arg)),
            _ => Err(self.error(&format!("unknown generic `{name}`"))),
        }
    }
}

fn plain(name: &str) -> TypeHint {
    if name == "None" {
        return TypeHint::Absent;
    }
    match ScalarType::from_name(name) {
        Some(scalar) => TypeHint::Scalar(scalar),
        None => TypeHint::Message(name.to_string()),
    }
}
