//! Display locale
//!
//! Only the parts of a locale the grid needs: case folding for searches,
//! collation for text sorting, and the number and date conventions used to
//! turn cell text into sortable keys.

use std::fmt;

/// Languages writing `1.234,5`
const COMMA_DECIMAL: &[&str] = &[
    "de", "fr", "es", "it", "nl", "pt", "ru", "pl", "sv", "da", "fi", "nb", "no", "cs", "tr", "id",
];

/// Languages grouping thousands with a (non-breaking) space
const SPACE_GROUPING: &[&str] = &["fr", "ru", "pl", "sv", "fi", "nb", "no", "cs"];

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Locale {
    tag: String,
    language: String,
    region: Option<String>,
}

impl Default for Locale {
    fn default() -> Self {
        Self::parse("en-US")
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}

impl Locale {
    /// Parse a language tag such as `de-DE`, `en_US` or `fr`
    ///
    /// Unknown languages are accepted and use English conventions.
    pub fn parse(tag: &str) -> Self {
        let normalized = tag.trim().replace('_', "-");
        let mut parts = normalized.split('-').filter(|p| !p.is_empty());
        let language = parts
            .next()
            .map(|l| l.to_ascii_lowercase())
            .unwrap_or_else(|| "en".to_string());
        let region = parts.next().map(|r| r.to_ascii_uppercase());
        let tag = match &region {
            Some(region) => format!("{}-{}", language, region),
            None => language.clone(),
        };
        Locale {
            tag,
            language,
            region,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn decimal_separator(&self) -> char {
        if COMMA_DECIMAL.contains(&self.language.as_str()) {
            ','
        } else {
            '.'
        }
    }

    pub fn grouping_separator(&self) -> char {
        if SPACE_GROUPING.contains(&self.language.as_str()) {
            '\u{a0}'
        } else if COMMA_DECIMAL.contains(&self.language.as_str()) {
            '.'
        } else {
            ','
        }
    }

    /// Lower-case a string following the locale's casing rules
    pub fn to_lower(&self, text: &str) -> String {
        match self.language.as_str() {
            // dotted and dotless i are distinct letters
            "tr" | "az" => text
                .chars()
                .map(|c| match c {
                    'I' => "ı".to_string(),
                    'İ' => "i".to_string(),
                    other => other.to_lowercase().collect(),
                })
                .collect(),
            _ => text.to_lowercase(),
        }
    }

    /// Date patterns tried in order when extracting date keys
    pub fn date_patterns(&self) -> &'static [&'static str] {
        match (self.language.as_str(), self.region.as_deref()) {
            ("en", Some("US")) | ("en", None) => &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"],
            ("en", _) | ("fr", _) | ("es", _) | ("it", _) | ("pt", _) => {
                &["%Y-%m-%d", "%d/%m/%Y", "%d/%m/%y"]
            }
            ("nl", _) => &["%Y-%m-%d", "%d-%m-%Y", "%d-%m-%y"],
            _ => &["%Y-%m-%d", "%d.%m.%Y", "%d.%m.%y"],
        }
    }

    /// Time patterns tried in order when extracting time keys
    pub fn time_patterns(&self) -> &'static [&'static str] {
        match self.language.as_str() {
            "en" => &["%H:%M:%S", "%H:%M", "%I:%M:%S %p", "%I:%M %p"],
            _ => &["%H:%M:%S", "%H:%M"],
        }
    }

    /// Strip grouping separators and normalise the decimal separator
    fn normalize_number(&self, text: &str) -> String {
        let grouping = self.grouping_separator();
        let decimal = self.decimal_separator();
        text.trim()
            .chars()
            .filter(|c| *c != grouping && *c != ' ' && *c != '\u{a0}' && *c != '\u{202f}')
            .map(|c| if c == decimal { '.' } else { c })
            .collect()
    }

    /// Parse a localised decimal number such as `1.234,5` (de) or `1,234.5` (en)
    pub fn parse_decimal(&self, text: &str) -> Option<f64> {
        let normalized = self.normalize_number(text);
        if normalized.is_empty() {
            return None;
        }
        normalized.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Parse a localised integer such as `1.234` (de) or `1,234` (en)
    pub fn parse_integer(&self, text: &str) -> Option<i128> {
        let normalized = self.normalize_number(text);
        if normalized.is_empty() {
            return None;
        }
        normalized.parse::<i128>().ok()
    }
}
