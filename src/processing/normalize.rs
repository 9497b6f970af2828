//! Text normalization applied to every extractor's output.

use serde::Deserialize;

/// Character set retained by [`normalize`].
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TextFilter {
    /// Printable ASCII plus ASCII whitespace.
    #[default]
    Ascii,
    /// Every character except non-whitespace controls, U+FFFD and U+FEFF.
    Unicode,
}

impl TextFilter {
    fn keeps(self, c: char) -> bool {
        match self {
            Self::Ascii => matches!(c, ' '..='~' | '\t' | '\n' | '\r' | '\x0b' | '\x0c'),
            Self::Unicode => {
                !(c.is_control() && !c.is_whitespace())
                    && c != char::REPLACEMENT_CHARACTER
                    && c != '\u{feff}'
            }
        }
    }
}

impl std::str::FromStr for TextFilter {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ascii" => Ok(Self::Ascii),
            "unicode" => Ok(Self::Unicode),
            _ => Err(()),
        }
    }
}

/// Drop non-printable characters, collapse whitespace runs to one space, and trim.
///
/// Total and idempotent: the output contains only retained characters separated by single
/// spaces, so a second pass changes nothing.
pub fn normalize(text: &str, filter: TextFilter) -> String {
    let printable: String = text.chars().filter(|c| filter.keeps(*c)).collect();
    let mut normalized = String::with_capacity(printable.len());
    for word in printable.split_whitespace() {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str(word);
    }
    normalized
}
