//! Line model of a torrc file.
//!
//! Every line is kept verbatim, terminator included, so rendering an
//! unmodified document reproduces the input byte for byte. Only the first
//! line carrying a recognized directive is ever interpreted or rewritten.

use std::fmt;

/// Directives tormgr reads and rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKey {
    SocksPort,
    ExitNodes,
}

impl DirectiveKey {
    pub fn keyword(&self) -> &'static str {
        match self {
            DirectiveKey::SocksPort => "SocksPort",
            DirectiveKey::ExitNodes => "ExitNodes",
        }
    }

    /// Whether `line` is this directive. Tor option names are case-insensitive.
    pub fn matches(&self, line: &str) -> bool {
        split_directive(line)
            .map(|(keyword, _)| keyword.eq_ignore_ascii_case(self.keyword()))
            .unwrap_or(false)
    }

    /// Extract the value of this directive from `line`.
    ///
    /// `SocksPort` takes the first token after the keyword; `ExitNodes` takes
    /// the rest of the line. A line without a value yields `None`.
    pub fn value_of<'a>(&self, line: &'a str) -> Option<&'a str> {
        let (keyword, rest) = split_directive(line)?;
        if !keyword.eq_ignore_ascii_case(self.keyword()) {
            return None;
        }
        match self {
            DirectiveKey::SocksPort => rest.split_whitespace().next(),
            DirectiveKey::ExitNodes => Some(rest).filter(|r| !r.is_empty()),
        }
    }
}

impl fmt::Display for DirectiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Split a trimmed line into keyword and (trimmed) remainder.
fn split_directive(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    match trimmed.split_once(char::is_whitespace) {
        Some((keyword, rest)) => Some((keyword, rest.trim())),
        None => Some((trimmed, "")),
    }
}

/// The two directive values tormgr cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TorrcSnapshot {
    pub socks_port: Option<String>,
    pub exit_nodes: Option<String>,
}

/// Ordered raw lines of a torrc file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    lines: Vec<String>,
}

impl ConfigDocument {
    pub fn parse(content: &str) -> Self {
        Self {
            lines: content.split_inclusive('\n').map(str::to_string).collect(),
        }
    }

    pub fn render(&self) -> String {
        self.lines.concat()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Index of the first line carrying `key`, valueless or not.
    pub fn position(&self, key: DirectiveKey) -> Option<usize> {
        self.lines.iter().position(|line| key.matches(line))
    }

    /// Value of the first occurrence of `key`; later duplicates are ignored.
    pub fn value(&self, key: DirectiveKey) -> Option<&str> {
        self.position(key)
            .and_then(|idx| key.value_of(&self.lines[idx]))
    }

    pub fn snapshot(&self) -> TorrcSnapshot {
        TorrcSnapshot {
            socks_port: self.value(DirectiveKey::SocksPort).map(str::to_string),
            exit_nodes: self.value(DirectiveKey::ExitNodes).map(str::to_string),
        }
    }

    /// Rewrite the first `key` line in place, or append one if absent.
    pub fn set(&mut self, key: DirectiveKey, value: &str) {
        let directive = format!("{} {}", key.keyword(), value);

        match self.position(key) {
            Some(idx) => {
                let terminator = line_terminator(&self.lines[idx]);
                self.lines[idx] = format!("{}{}", directive, terminator);
            }
            None => {
                if let Some(last) = self.lines.last_mut() {
                    if !last.ends_with('\n') {
                        last.push('\n');
                    }
                }
                self.lines.push(format!("{}\n", directive));
            }
        }
    }
}

fn line_terminator(line: &str) -> &'static str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}
