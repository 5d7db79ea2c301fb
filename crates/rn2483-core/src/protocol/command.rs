//! Outgoing command lines.
//!
//! A command is `<namespace> <verb> [args...]`. The terminator is appended
//! by the transport, never stored here.

use std::fmt;

use super::constants::{NS_MAC, NS_RADIO, NS_SYS};

/// Command namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Mac,
    Radio,
    Sys,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Mac => NS_MAC,
            Namespace::Radio => NS_RADIO,
            Namespace::Sys => NS_SYS,
        }
    }

    /// Parse a namespace keyword.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            NS_MAC => Some(Namespace::Mac),
            NS_RADIO => Some(Namespace::Radio),
            NS_SYS => Some(Namespace::Sys),
            _ => None,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    line: String,
}

impl Command {
    /// Start building a command in the given namespace.
    pub fn builder(namespace: Namespace, verb: &str) -> CommandBuilder {
        CommandBuilder {
            line: format!("{} {}", namespace, verb),
        }
    }

    pub fn mac(verb: &str) -> CommandBuilder {
        Self::builder(Namespace::Mac, verb)
    }

    pub fn radio(verb: &str) -> CommandBuilder {
        Self::builder(Namespace::Radio, verb)
    }

    pub fn sys(verb: &str) -> CommandBuilder {
        Self::builder(Namespace::Sys, verb)
    }

    /// The command text without terminator.
    pub fn as_str(&self) -> &str {
        &self.line
    }

    /// Namespace and verb, used to label log lines and errors.
    pub fn name(&self) -> &str {
        match self.line.match_indices(' ').nth(1) {
            Some((idx, _)) => &self.line[..idx],
            None => &self.line,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

/// Builder for [`Command`].
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    line: String,
}

impl CommandBuilder {
    /// Append a textual or decimal argument.
    pub fn arg(mut self, arg: impl fmt::Display) -> Self {
        self.line.push(' ');
        self.line.push_str(&arg.to_string());
        self
    }

    /// Append a binary payload as upper-case hex without prefix.
    pub fn hex_arg(mut self, data: &[u8]) -> Self {
        self.line.push(' ');
        self.line.push_str(&hex::encode_upper(data));
        self
    }

    /// Append a boolean as `on`/`off`.
    pub fn on_off(self, value: bool) -> Self {
        self.arg(if value { "on" } else { "off" })
    }

    pub fn build(self) -> Command {
        Command { line: self.line }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_simple() {
        let cmd = Command::sys("get").arg("ver").build();
        assert_eq!(cmd.as_str(), "sys get ver");
        assert_eq!(cmd.name(), "sys get");
    }

    #[test]
    fn test_hex_payload_is_uppercase() {
        let cmd = Command::mac("tx")
            .arg("cnf")
            .arg(1)
            .hex_arg(&[0xde, 0xad, 0x0b])
            .build();
        assert_eq!(cmd.to_string(), "mac tx cnf 1 DEAD0B");
    }

    #[test]
    fn test_on_off() {
        let cmd = Command::mac("set").arg("adr").on_off(true).build();
        assert_eq!(cmd.as_str(), "mac set adr on");
    }

    #[test]
    fn test_namespace_parse() {
        assert_eq!(Namespace::parse("radio"), Some(Namespace::Radio));
        assert_eq!(Namespace::parse("foo"), None);
    }
}
