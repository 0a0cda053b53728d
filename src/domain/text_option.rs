//! Free-form engine options.
//!
//! Text options are an escape hatch for engine parameters the model does not
//! know about. They are emitted after every modeled argument, and a text
//! option shadows a modeled argument with the same key.

use std::{fmt, str::FromStr, sync::LazyLock};

use non_empty_string::NonEmptyString;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::options::UnknownVariant;

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("option name pattern is a valid regex")
});

/// The declared type of a text option's value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    /// Any string.
    #[default]
    Text,
    /// A number (integer or float).
    Numeric,
    /// yes/no, true/false or 1/0.
    Boolean,
}

impl OptionType {
    /// Infers the type of a raw value, preferring the narrowest match.
    #[must_use]
    pub fn infer(value: &str) -> Self {
        if parse_boolean(value).is_some() && value.parse::<f64>().is_err() {
            Self::Boolean
        } else if value.parse::<f64>().is_ok() {
            Self::Numeric
        } else {
            Self::Text
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Numeric => "numeric",
            Self::Boolean => "boolean",
        })
    }
}

impl FromStr for OptionType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "string" => Ok(Self::Text),
            "numeric" | "number" => Ok(Self::Numeric),
            "boolean" | "bool" => Ok(Self::Boolean),
            _ => Err(UnknownVariant::new(s, "option type")),
        }
    }
}

/// A `(name, value, type)` triple passed verbatim to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextOption {
    name: NonEmptyString,
    value: String,
    #[serde(rename = "type", default)]
    kind: OptionType,
}

impl TextOption {
    /// Creates a text option.
    ///
    /// Leading dashes are stripped from the name, so `--max_size` and
    /// `max_size` name the same option.
    ///
    /// # Errors
    ///
    /// Returns [`TextOptionError`] if the name is empty or not an identifier,
    /// or if the value does not match the declared type.
    pub fn new(
        name: &str,
        value: impl Into<String>,
        kind: OptionType,
    ) -> Result<Self, TextOptionError> {
        let name = normalise_name(name);
        let name = NonEmptyString::new(name.to_string()).map_err(|_| TextOptionError::EmptyName)?;
        if !NAME_PATTERN.is_match(name.as_str()) {
            return Err(TextOptionError::InvalidName(name.to_string()));
        }

        let value = value.into().trim().to_string();
        let value = match kind {
            OptionType::Text => value,
            OptionType::Numeric => {
                if value.parse::<f64>().is_err() {
                    return Err(TextOptionError::NotNumeric(value));
                }
                value
            }
            OptionType::Boolean => {
                let flag = parse_boolean(&value).ok_or(TextOptionError::NotBoolean(value))?;
                if flag { "yes" } else { "no" }.to_string()
            }
        };

        Ok(Self { name, value, kind })
    }

    /// The option name, without leading dashes.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// The option value. Boolean values are normalised to `yes` / `no`.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The declared value type.
    #[must_use]
    pub const fn kind(&self) -> OptionType {
        self.kind
    }

    /// Re-checks the option, for options read from a document.
    pub(crate) fn check(&self) -> Result<(), TextOptionError> {
        Self::new(self.name(), self.value.clone(), self.kind).map(|_| ())
    }
}

/// Splits a legacy single-string option line (`-a 1 --flag --name value`)
/// into typed options.
///
/// A token starting with a dash opens an option; the following token is its
/// value unless it opens another option. Options with no value become
/// boolean `yes`. Tokens that cannot be attached to a name are dropped.
pub(crate) fn split_legacy_line(line: &str) -> Vec<TextOption> {
    let mut options = Vec::new();
    let mut tokens = line.split_whitespace().peekable();

    while let Some(token) = tokens.next() {
        if !is_option_name(token) {
            tracing::debug!(token, "dropping stray legacy option token");
            continue;
        }
        let value = match tokens.peek() {
            Some(next) if !is_option_name(next) => tokens.next(),
            _ => None,
        };
        let option = match value {
            Some(value) => TextOption::new(token, value, OptionType::infer(value)),
            None => TextOption::new(token, "yes", OptionType::Boolean),
        };
        match option {
            Ok(option) => match options
                .iter_mut()
                .find(|existing: &&mut TextOption| existing.name == option.name)
            {
                Some(existing) => *existing = option,
                None => options.push(option),
            },
            Err(error) => tracing::debug!(token, %error, "dropping invalid legacy option"),
        }
    }

    options
}

fn is_option_name(token: &str) -> bool {
    token.starts_with('-') && token.parse::<f64>().is_err()
}

fn normalise_name(name: &str) -> &str {
    name.trim().trim_start_matches('-')
}

fn parse_boolean(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" | "on" => Some(true),
        "no" | "false" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Error returned when a text option is malformed.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TextOptionError {
    /// The name is empty once dashes are stripped.
    #[error("option name is empty")]
    EmptyName,

    /// The name is not an identifier.
    #[error("invalid option name '{0}': expected letters, digits and underscores")]
    InvalidName(String),

    /// A numeric option has a non-numeric value.
    #[error("'{0}' is not a number")]
    NotNumeric(String),

    /// A boolean option has a value that is not a boolean spelling.
    #[error("'{0}' is not a boolean (expected yes/no, true/false or 1/0)")]
    NotBoolean(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_dashes_are_stripped() {
        let option = TextOption::new("--max_size", "2.5", OptionType::Numeric).unwrap();
        assert_eq!(option.name(), "max_size");
        assert_eq!(option.value(), "2.5");
    }

    #[test]
    fn rejects_bad_names() {
        assert_eq!(
            TextOption::new("--", "1", OptionType::Numeric).unwrap_err(),
            TextOptionError::EmptyName
        );
        assert_eq!(
            TextOption::new("max size", "1", OptionType::Numeric).unwrap_err(),
            TextOptionError::InvalidName("max size".to_string())
        );
    }

    #[test]
    fn values_are_checked_against_type() {
        assert_eq!(
            TextOption::new("gradation", "steep", OptionType::Numeric).unwrap_err(),
            TextOptionError::NotNumeric("steep".to_string())
        );
        assert_eq!(
            TextOption::new("flag", "maybe", OptionType::Boolean).unwrap_err(),
            TextOptionError::NotBoolean("maybe".to_string())
        );
        let flag = TextOption::new("flag", "TRUE", OptionType::Boolean).unwrap();
        assert_eq!(flag.value(), "yes");
    }

    #[test]
    fn type_inference_prefers_numbers_over_digits_as_booleans() {
        assert_eq!(OptionType::infer("1"), OptionType::Numeric);
        assert_eq!(OptionType::infer("yes"), OptionType::Boolean);
        assert_eq!(OptionType::infer("-3.5"), OptionType::Numeric);
        assert_eq!(OptionType::infer("/tmp/out"), OptionType::Text);
    }

    #[test]
    fn legacy_line_is_split_into_options() {
        let options = split_legacy_line("-m 512 --no_initial_central_point --prefix out -o strong");
        let rendered: Vec<_> = options
            .iter()
            .map(|o| (o.name(), o.value(), o.kind()))
            .collect();
        assert_eq!(
            rendered,
            [
                ("m", "512", OptionType::Numeric),
                ("no_initial_central_point", "yes", OptionType::Boolean),
                ("prefix", "out", OptionType::Text),
                ("o", "strong", OptionType::Text),
            ]
        );
    }

    #[test]
    fn legacy_line_keeps_negative_numbers_as_values() {
        let options = split_legacy_line("--shift -2.5 stray");
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].value(), "-2.5");
    }

    #[test]
    fn legacy_line_repeated_names_keep_last_value() {
        let options = split_legacy_line("-v 3 -v 5");
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].value(), "5");
    }
}
