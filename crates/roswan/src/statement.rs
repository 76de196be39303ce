//! Structured configuration statements.
//!
//! Every emitted line is a [`Statement`]: a verb plus ordered `key=value`
//! arguments. A single serializer owns the quoting and line-continuation
//! rules so they are enforced in one place:
//!
//! - bare tokens render as-is (`chain=prerouting`);
//! - string values render double-quoted with `\` and `"` escaped;
//! - a quoted value containing newlines renders as a multi-line
//!   continuation, each interior line break becoming a trailing `\`
//!   followed by an indented next line, the form the device's import
//!   parser accepts verbatim.
//!
//! # Example
//!
//! ```
//! use roswan::Statement;
//!
//! let stmt = Statement::add()
//!     .arg("chain", "input")
//!     .arg("in-interface", "ether1")
//!     .quoted("comment", "primary uplink");
//! assert_eq!(
//!     stmt.render(),
//!     r#"add chain=input in-interface=ether1 comment="primary uplink""#
//! );
//! ```

use std::fmt;

/// Statement verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// Create a new entry in the section.
    Add,
    /// Modify an existing entry.
    Set,
}

impl Verb {
    fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Set => "set",
        }
    }
}

/// Argument value: either a bare token or a quoted string.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Word(String),
    Quoted(String),
}

/// One configuration statement.
///
/// Arguments render in the order they were appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    verb: Verb,
    args: Vec<(&'static str, Value)>,
}

impl Statement {
    /// Start an `add` statement.
    pub fn add() -> Self {
        Self {
            verb: Verb::Add,
            args: Vec::new(),
        }
    }

    /// Start a `set` statement.
    pub fn set() -> Self {
        Self {
            verb: Verb::Set,
            args: Vec::new(),
        }
    }

    /// Append a bare `key=value` argument.
    pub fn arg(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.args.push((key, Value::Word(value.to_string())));
        self
    }

    /// Append a bare argument only when a value is present.
    pub fn arg_opt(self, key: &'static str, value: Option<impl fmt::Display>) -> Self {
        match value {
            Some(value) => self.arg(key, value),
            None => self,
        }
    }

    /// Append a double-quoted string argument.
    pub fn quoted(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.args.push((key, Value::Quoted(value.into())));
        self
    }

    /// Append a quoted argument only when a value is present.
    pub fn quoted_opt(self, key: &'static str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.quoted(key, value),
            None => self,
        }
    }

    /// Render the statement as one exportable line (or a continuation
    /// group when a quoted value spans multiple lines).
    pub fn render(&self) -> String {
        let mut out = String::from(self.verb.as_str());
        for (key, value) in &self.args {
            out.push(' ');
            out.push_str(key);
            out.push('=');
            match value {
                Value::Word(word) => out.push_str(word),
                Value::Quoted(text) => {
                    out.push('"');
                    out.push_str(&escape(text));
                    out.push('"');
                }
            }
        }
        if out.contains('\n') {
            // Interior newlines only ever come from quoted values; the
            // trailing backslash is the device's continuation marker.
            out.replace('\n', "\\\n    ")
        } else {
            out
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn escape(text: &str) -> String {
    // Backslash first so escaped quotes are not double-escaped.
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
