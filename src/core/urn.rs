//! Package URN
//!
//! Every package, collection and account is addressed by a namespaced
//! identifier: `urn:<namespace>:<part1>:<part2>:...`.
//!
//! The namespace selects the owning handler; the parts are opaque to
//! everything except that handler. Parts may contain any text: `%` and `:`
//! are percent-escaped when formatting so that `parse(format(u)) == u`.

use crate::error::{Result, UnipkgError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const URN_PREFIX: &str = "urn:";

/// A parsed, immutable package identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageUrn {
    namespace: String,
    parts: Vec<String>,
}

impl PackageUrn {
    /// Build a URN from a namespace and raw (unescaped) parts.
    pub fn new<N, I, S>(namespace: N, parts: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            namespace: namespace.into(),
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse `urn:<namespace>:<part>...`. The `urn:` prefix is matched case-insensitively.
    ///
    /// Whitespace is significant; callers trim user input before parsing.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason: &str| UnipkgError::InvalidUrn {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let rest = match input.get(..URN_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(URN_PREFIX) => &input[URN_PREFIX.len()..],
            _ => return Err(invalid("missing 'urn:' prefix")),
        };

        let mut segments = rest.split(':');
        let namespace = segments
            .next()
            .map(unescape)
            .transpose()
            .map_err(|reason| invalid(&reason))?
            .unwrap_or_default();
        if namespace.is_empty() {
            return Err(invalid("empty namespace"));
        }

        let parts = segments
            .map(unescape)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|reason| invalid(&reason))?;

        Ok(Self { namespace, parts })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn part(&self, index: usize) -> Option<&str> {
        self.parts.get(index).map(String::as_str)
    }

    /// The namespace-specific string, unescaped and joined with `:`.
    pub fn specific(&self) -> String {
        self.parts.join(":")
    }

    /// A filesystem-safe name, used for per-package download folders.
    pub fn to_file_stem(&self) -> String {
        std::iter::once(self.namespace.as_str())
            .chain(self.parts.iter().map(String::as_str))
            .map(|segment| {
                segment
                    .chars()
                    .map(|c| {
                        if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                            c
                        } else {
                            '_'
                        }
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("_")
    }
}

impl fmt::Display for PackageUrn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", URN_PREFIX, escape(&self.namespace))?;
        for part in &self.parts {
            write!(f, ":{}", escape(part))?;
        }
        Ok(())
    }
}

impl FromStr for PackageUrn {
    type Err = UnipkgError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PackageUrn {
    type Error = UnipkgError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<PackageUrn> for String {
    fn from(urn: PackageUrn) -> Self {
        urn.to_string()
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '%' => out.push_str("%25"),
            ':' => out.push_str("%3A"),
            c if c.is_control() => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    out.push_str(&format!("%{:02X}", byte));
                }
            }
            c => out.push(c),
        }
    }
    out
}

fn unescape(escaped: &str) -> std::result::Result<String, String> {
    if !escaped.contains('%') {
        return Ok(escaped.to_string());
    }

    let bytes = escaped.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = escaped
                .get(i + 1..i + 3)
                .ok_or_else(|| format!("truncated escape at offset {}", i))?;
            let byte = u8::from_str_radix(hex, 16)
                .map_err(|_| format!("invalid escape '%{}' at offset {}", hex, i))?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(out).map_err(|_| "escaped bytes are not valid UTF-8".to_string())
}
