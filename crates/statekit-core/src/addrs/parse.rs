//! Address parsing
//!
//! Grammar accepted by [`Target::parse`]:
//!
//! ```text
//! target   := step ("." step)* ("." resource)? | resource
//! step     := "module." IDENT key?
//! resource := ("data.")? IDENT "." IDENT key?
//! key      := "[" INTEGER "]" | "[" STRING "]"
//! ```
//!
//! `STRING` is double quoted and supports the escapes `\"`, `\\`, `\n`,
//! `\r` and `\t`. Splat and wildcard keys are rejected.

use std::fmt;
use std::str::FromStr;

use super::{
    AbsResource, AbsResourceInstance, InstanceKey, ModuleInstance, ModuleInstanceStep, Resource,
    ResourceMode,
};
use crate::{Error, Result};

/// A parsed move source or destination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// A module instance and everything beneath it
    Module(ModuleInstance),
    /// A resource with all of its instances
    Resource(AbsResource),
    /// One keyed instance of a resource
    Instance(AbsResourceInstance),
}

impl Target {
    /// Parse address text into a [`Target`].
    ///
    /// A resource address without a key parses as [`Target::Resource`];
    /// with a key it parses as [`Target::Instance`].
    pub fn parse(input: &str) -> Result<Self> {
        let mut cursor = Cursor::new(input);
        if input.trim().is_empty() {
            return Err(Error::malformed(input, "", "address is empty"));
        }

        let mut steps = Vec::new();
        loop {
            let word = cursor.ident()?;

            if word == "module" {
                cursor.expect('.')?;
                let name = cursor.ident()?;
                let key = cursor.key()?;
                steps.push(ModuleInstanceStep { name, key });
                if cursor.at_end() {
                    return Ok(Self::Module(steps.into_iter().collect()));
                }
                cursor.expect('.')?;
                continue;
            }

            let (mode, type_name) = if word == "data" {
                cursor.expect('.')?;
                (ResourceMode::Data, cursor.ident()?)
            } else {
                (ResourceMode::Managed, word)
            };
            cursor.expect('.')?;
            let name = cursor.ident()?;
            let key = cursor.key()?;
            if !cursor.at_end() {
                return Err(cursor.error_at(cursor.pos, "unexpected text after resource address"));
            }

            let resource = AbsResource {
                module: steps.into_iter().collect(),
                resource: Resource {
                    mode,
                    type_name,
                    name,
                },
            };
            return Ok(match key {
                InstanceKey::NoKey => Self::Resource(resource),
                key => Self::Instance(resource.instance(key)),
            });
        }
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module(module) => write!(f, "{module}"),
            Self::Resource(addr) => write!(f, "{addr}"),
            Self::Instance(addr) => write!(f, "{addr}"),
        }
    }
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Text from `from` up to the next `.` after it, used to point at a bad token.
    fn token_at(&self, from: usize) -> String {
        let rest = &self.input[from..];
        if rest.is_empty() {
            return "end of input".to_string();
        }
        let end = rest
            .char_indices()
            .skip(1)
            .find(|(_, ch)| *ch == '.')
            .map_or(rest.len(), |(idx, _)| idx);
        rest[..end].to_string()
    }

    fn error_at(&self, from: usize, reason: &str) -> Error {
        Error::malformed(self.input, self.token_at(from), reason)
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.peek() {
            Some(ch) if ch == expected => {
                self.bump();
                Ok(())
            }
            _ => Err(self.error_at(self.pos, &format!("expected '{expected}'"))),
        }
    }

    fn ident(&mut self) -> Result<String> {
        let start = self.pos;
        match self.peek() {
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {}
            _ => return Err(self.error_at(start, "expected a name")),
        }
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                self.bump();
            } else {
                break;
            }
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn key(&mut self) -> Result<InstanceKey> {
        if self.peek() != Some('[') {
            return Ok(InstanceKey::NoKey);
        }
        let start = self.pos;
        self.bump();

        let key = match self.peek() {
            Some('"') => {
                self.bump();
                InstanceKey::Str(self.string_body(start)?)
            }
            Some(ch) if ch.is_ascii_digit() => {
                let digits_start = self.pos;
                while self.peek().is_some_and(|ch| ch.is_ascii_digit()) {
                    self.bump();
                }
                let digits = &self.input[digits_start..self.pos];
                let n = digits
                    .parse::<i64>()
                    .map_err(|_| self.error_at(start, "instance index is out of range"))?;
                InstanceKey::Int(n)
            }
            Some('*') => return Err(self.error_at(start, "wildcard keys are not supported")),
            None => return Err(self.error_at(start, "unterminated instance key")),
            Some(_) => {
                return Err(self.error_at(
                    start,
                    "instance key must be an integer or a quoted string",
                ));
            }
        };

        if self.peek() != Some(']') {
            let reason = if self.at_end() {
                "unterminated instance key"
            } else {
                "expected ']'"
            };
            return Err(self.error_at(start, reason));
        }
        self.bump();
        Ok(key)
    }

    fn string_body(&mut self, start: usize) -> Result<String> {
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error_at(start, "unterminated string key")),
                Some('"') => return Ok(value),
                Some('\\') => match self.bump() {
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some('t') => value.push('\t'),
                    _ => return Err(self.error_at(start, "invalid escape in string key")),
                },
                Some(ch) => value.push(ch),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_of(input: &str) -> String {
        match Target::parse(input).unwrap_err() {
            Error::MalformedAddress { token, .. } => token,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parses_module_path() {
        let target = Target::parse("module.foo.module.child1").unwrap();
        assert!(matches!(target, Target::Module(_)));
        assert_eq!(target.to_string(), "module.foo.module.child1");
    }

    #[test]
    fn parses_keyed_module_and_resource() {
        let target = Target::parse(r#"module.foo["a"].test_instance.bar[2]"#).unwrap();
        let Target::Instance(addr) = target else {
            panic!("expected an instance address");
        };
        assert_eq!(addr.module.steps()[0].key, InstanceKey::from("a"));
        assert_eq!(addr.resource, Resource::managed("test_instance", "bar"));
        assert_eq!(addr.key, InstanceKey::Int(2));
    }

    #[test]
    fn parses_data_source() {
        let Target::Resource(addr) = Target::parse("data.test_data_source.one").unwrap() else {
            panic!("expected a resource address");
        };
        assert_eq!(addr.resource.mode, ResourceMode::Data);
        assert_eq!(addr.resource.type_name, "test_data_source");
    }

    #[test]
    fn string_key_unescapes() {
        let Target::Instance(addr) = Target::parse(r#"test_instance.foo["a\"b\\c"]"#).unwrap()
        else {
            panic!("expected an instance address");
        };
        assert_eq!(addr.key, InstanceKey::from("a\"b\\c"));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(Target::parse("").is_err());
        assert!(Target::parse("   ").is_err());
    }

    #[test]
    fn rejects_resource_without_name() {
        assert_eq!(token_of("test_instance"), "end of input");
        assert_eq!(token_of("test_instance."), "end of input");
    }

    #[test]
    fn rejects_unterminated_key() {
        assert_eq!(token_of("test_instance.foo["), "[");
        assert_eq!(token_of("test_instance.foo[12"), "[12");
    }

    #[test]
    fn rejects_wildcard_key() {
        assert_eq!(token_of("test_instance.foo[*]"), "[*]");
    }

    #[test]
    fn rejects_trailing_text() {
        assert_eq!(token_of("test_instance.foo.bar"), ".bar");
    }

    #[test]
    fn rejects_bad_identifier() {
        assert_eq!(token_of("module.9lives"), "9lives");
    }

    #[test]
    fn rejects_out_of_range_index() {
        assert!(Target::parse("test_instance.foo[99999999999999999999]").is_err());
    }
}
