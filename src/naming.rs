//! Identifier case conversion for tag defaults, routes and generated symbols.
//!
//! All storage-facing conversions share one special case: a field named
//! `Id` or `ID` always maps to the reserved storage name `_id`, regardless
//! of the configured style. Mixed `ID` runs are normalized to `Id` first so
//! `UserID` converts the same way `UserId` does.

use serde::{Deserialize, Serialize};

/// Naming style applied when synthesizing a default tag value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    SnakeCase,
    LowerCamel,
    UpperCamel,
    KebabCase,
    /// Apply no default at all; only explicit directives produce a tag.
    #[default]
    Raw,
}

impl Style {
    /// Parse a `@wire_style:` directive value. Unknown values mean raw.
    pub fn parse(value: &str) -> Self {
        match value {
            "snake_case" => Self::SnakeCase,
            "lower_camel" => Self::LowerCamel,
            "upper_camel" => Self::UpperCamel,
            "kebab_case" => Self::KebabCase,
            _ => Self::Raw,
        }
    }

    /// Convert `name` according to this style. The `Id`/`ID` identity
    /// rule applies to every style except raw, which never converts.
    pub fn convert(self, name: &str) -> Option<String> {
        if self == Self::Raw {
            return None;
        }
        if name == "Id" || name == "ID" {
            return Some("_id".to_string());
        }
        match self {
            Self::SnakeCase => Some(storage_snake(name)),
            Self::LowerCamel => Some(to_lower_camel(name)),
            Self::UpperCamel => Some(to_upper_camel(name)),
            Self::KebabCase => Some(storage_kebab(name)),
            Self::Raw => None,
        }
    }
}

/// Uppercase the first letter, leaving the rest untouched.
pub fn to_title(src: &str) -> String {
    let mut chars = src.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {
            first.to_ascii_uppercase().to_string() + chars.as_str()
        }
        _ => src.to_string(),
    }
}

/// CamelCase to snake_case.
pub fn to_snake(src: &str) -> String {
    let mut out = String::with_capacity(src.len() + 4);
    for (i, c) in src.chars().enumerate() {
        if c.is_uppercase() {
            if i != 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// snake_case to UpperCamel.
pub fn to_upper_camel(src: &str) -> String {
    src.split('_').map(to_title).collect()
}

/// snake_case to lowerCamel.
pub fn to_lower_camel(src: &str) -> String {
    let camel = to_upper_camel(src);
    let mut chars = camel.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().to_string() + chars.as_str(),
        None => camel,
    }
}

/// Storage-facing snake_case with the `_id` identity rule.
pub fn storage_snake(src: &str) -> String {
    if src == "Id" || src == "ID" {
        return "_id".to_string();
    }
    to_snake(&src.replace("ID", "Id"))
}

/// Storage-facing kebab-case with the `_id` identity rule.
pub fn storage_kebab(src: &str) -> String {
    if src == "Id" || src == "ID" {
        return "_id".to_string();
    }
    let normalized = src.replace("ID", "Id");
    let mut out = String::with_capacity(normalized.len() + 4);
    for (i, c) in normalized.chars().enumerate() {
        if c.is_uppercase() {
            if i != 0 {
                out.push('-');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
