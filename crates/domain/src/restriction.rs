//! Execution restrictions — state tokens that forbid running a process.
//!
//! A [`Restriction`] keeps its trimmed, de-duplicated token list as the
//! canonical form and derives a case-insensitive whole-word matcher from it.
//! Construction re-reads the tokens back out of the compiled pattern and
//! refuses any token that does not survive the trip (anything that is not a
//! single word, e.g. `in progress` or `a|b`).

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Name of the JSON field carrying a message's state context.
pub const STATE_CTX_FIELD: &str = "state_ctx";

static STATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\b(\w+)\\b").expect("state token regex is valid"));

/// A message that carries restriction state information.
pub trait StatefulMessage {
    /// The state context checked against a [`Restriction`], if any.
    fn state_ctx(&self) -> Option<&str>;
}

impl StatefulMessage for serde_json::Value {
    fn state_ctx(&self) -> Option<&str> {
        self.get(STATE_CTX_FIELD).and_then(serde_json::Value::as_str)
    }
}

/// Set of state tokens that, matched in a message's state context, refuse execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Restriction {
    states: Vec<String>,
    matcher: Regex,
}

impl Restriction {
    /// Build a restriction from an explicit list of state tokens.
    ///
    /// Blank tokens are dropped, the rest trimmed and de-duplicated
    /// case-insensitively, keeping the first spelling.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyRestriction`] when no token remains and
    /// [`ValidationError::InvalidRestriction`] when a token is not a single word.
    pub fn new<I, S>(tokens: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut states: Vec<String> = Vec::new();
        for token in tokens {
            let token = token.as_ref().trim();
            if token.is_empty() {
                continue;
            }
            let folded = token.to_lowercase();
            if states.iter().any(|s| s.to_lowercase() == folded) {
                continue;
            }
            states.push(token.to_string());
        }
        if states.is_empty() {
            return Err(ValidationError::EmptyRestriction);
        }

        let invalid = || ValidationError::InvalidRestriction {
            tokens: states.join(", "),
        };
        let pattern = states
            .iter()
            .map(|s| format!(r"\b{s}\b"))
            .collect::<Vec<_>>()
            .join("|");
        let matcher = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|_| invalid())?;

        let recovered: Vec<&str> = STATE_TOKEN
            .captures_iter(matcher.as_str())
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect();
        if recovered != states {
            return Err(invalid());
        }

        Ok(Self { states, matcher })
    }

    /// Canonical list of restricted state tokens.
    #[must_use]
    pub fn restricted_states(&self) -> &[String] {
        &self.states
    }

    /// `true` when any token occurs as a whole word in `state_ctx`.
    #[must_use]
    pub fn is_restricted(&self, state_ctx: Option<&str>) -> bool {
        match state_ctx {
            Some(ctx) if !ctx.is_empty() => self.matcher.is_match(ctx),
            _ => false,
        }
    }

    /// Check `message` against this restriction.
    #[must_use]
    pub fn restricts<M: StatefulMessage + ?Sized>(&self, message: &M) -> bool {
        self.is_restricted(message.state_ctx())
    }
}

impl PartialEq for Restriction {
    fn eq(&self, other: &Self) -> bool {
        self.states == other.states
    }
}

impl Eq for Restriction {}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.states.join(", "))
    }
}

impl FromStr for Restriction {
    type Err = ValidationError;

    /// Parse a comma-separated token list.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.split(','))
    }
}

impl TryFrom<String> for Restriction {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Restriction> for String {
    fn from(value: Restriction) -> Self {
        value.to_string()
    }
}
