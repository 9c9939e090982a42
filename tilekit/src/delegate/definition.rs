//! Textual delegate definitions: `Name(arg1,arg2,...)`.
//!
//! Grammar:
//!
//! ```text
//! definition := ws name ws ( "(" args ")" )? ws
//! name       := [A-Za-z_] [A-Za-z0-9_.]*
//! args       := ( arg ( "," arg )* )?
//! arg        := balanced text without a top-level ","
//! ```
//!
//! An argument may itself be a definition (`Gamma(gamma=0.8)`) or free-form
//! text such as a URL template, as long as its parentheses balance. `Name`
//! and `Name()` both mean zero arguments; serialization always emits
//! `Name()`.
//!
//! # Example
//!
//! ```
//! use tilekit::delegate::Definition;
//!
//! let def = Definition::parse(" FilterTransformer( Invert , Gamma(gamma=0.8) ) ").unwrap();
//! assert!(def.is("filtertransformer"));
//! assert_eq!(def.args(), ["Invert", "Gamma(gamma=0.8)"]);
//! assert_eq!(def.to_string(), "FilterTransformer(Invert,Gamma(gamma=0.8))");
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors from parsing a definition string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("Empty delegate definition")]
    Empty,

    #[error("Invalid delegate name at position {position} in '{input}'")]
    InvalidName { input: String, position: usize },

    #[error("Unbalanced parentheses in '{input}'")]
    Unbalanced { input: String },

    #[error("Unexpected input after position {position} in '{input}'")]
    TrailingInput { input: String, position: usize },

    #[error("Empty argument {index} in '{input}'")]
    EmptyArgument { input: String, index: usize },
}

/// A parsed delegate definition: a type name plus raw argument strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Definition {
    name: String,
    args: Vec<String>,
}

impl Definition {
    /// Build a definition from parts. Arguments are stored verbatim.
    pub fn new<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a definition string.
    pub fn parse(input: &str) -> Result<Self, DefinitionError> {
        Parser::new(input).parse()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Case-insensitive name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Raw argument at `index`.
    pub fn str_arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Argument parsed as a colour channel (0-255).
    pub fn u8_arg(&self, index: usize) -> Option<u8> {
        self.str_arg(index)?.parse().ok()
    }

    pub fn u32_arg(&self, index: usize) -> Option<u32> {
        self.str_arg(index)?.parse().ok()
    }

    /// Argument parsed as a finite decimal.
    pub fn f64_arg(&self, index: usize) -> Option<f64> {
        self.str_arg(index)?
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }

    /// Argument parsed as a flag: `1`/`0` or `true`/`false`.
    pub fn bool_arg(&self, index: usize) -> Option<bool> {
        match self.str_arg(index)?.to_ascii_lowercase().as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        }
    }

    /// Argument parsed as a nested definition.
    pub fn nested_arg(&self, index: usize) -> Option<Result<Definition, DefinitionError>> {
        self.str_arg(index).map(Definition::parse)
    }
}

impl FromStr for Definition {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Definition::parse(s)
    }
}

impl fmt::Display for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args.join(","))
    }
}

// ── Parser ────────────────────────────────────────────────────────────────

struct Parser<'a> {
    input: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|&(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn parse(&mut self) -> Result<Definition, DefinitionError> {
        self.skip_ws();
        if self.peek().is_none() {
            return Err(DefinitionError::Empty);
        }

        let name = self.parse_name()?;
        self.skip_ws();

        let args = match self.peek() {
            None => Vec::new(),
            Some('(') => {
                self.pos += 1;
                let args = self.parse_args()?;
                self.skip_ws();
                args
            }
            Some(_) => {
                return Err(DefinitionError::TrailingInput {
                    input: self.input.to_string(),
                    position: self.offset(),
                })
            }
        };

        if self.peek().is_some() {
            return Err(DefinitionError::TrailingInput {
                input: self.input.to_string(),
                position: self.offset(),
            });
        }

        Ok(Definition { name, args })
    }

    fn parse_name(&mut self) -> Result<String, DefinitionError> {
        let start = self.offset();
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.pos += 1,
            _ => {
                return Err(DefinitionError::InvalidName {
                    input: self.input.to_string(),
                    position: start,
                })
            }
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            self.pos += 1;
        }
        Ok(self.input[start..self.offset()].to_string())
    }

    /// Parse arguments up to and including the closing parenthesis.
    fn parse_args(&mut self) -> Result<Vec<String>, DefinitionError> {
        let mut args = Vec::new();
        let mut depth = 0usize;
        let mut start = self.offset();

        loop {
            let Some(c) = self.peek() else {
                return Err(DefinitionError::Unbalanced {
                    input: self.input.to_string(),
                });
            };
            let at = self.offset();
            self.pos += 1;

            match c {
                '(' => depth += 1,
                ')' if depth > 0 => depth -= 1,
                ')' => {
                    let last = self.input[start..at].trim();
                    if args.is_empty() && last.is_empty() {
                        return Ok(args);
                    }
                    self.push_arg(&mut args, last)?;
                    return Ok(args);
                }
                ',' if depth == 0 => {
                    let arg = self.input[start..at].trim();
                    self.push_arg(&mut args, arg)?;
                    start = self.offset();
                }
                _ => {}
            }
        }
    }

    fn push_arg(&self, args: &mut Vec<String>, arg: &str) -> Result<(), DefinitionError> {
        if arg.is_empty() {
            return Err(DefinitionError::EmptyArgument {
                input: self.input.to_string(),
                index: args.len(),
            });
        }
        args.push(arg.to_string());
        Ok(())
    }
}
