//! Character set descriptors.
//!
//! Used only for database-level configuration
//! (`ALTER DATABASE name CHARACTER SET = x COLLATE = y`).

use std::fmt;

/// An immutable character set + collation pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charset {
    name: String,
    collation: String,
    max_len: u8,
    description: Option<String>,
}

impl Charset {
    /// Creates a charset descriptor with a maximum byte length of 1.
    #[must_use]
    pub fn new(name: impl Into<String>, collation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collation: collation.into(),
            max_len: 1,
            description: None,
        }
    }

    /// Sets the maximum bytes-per-character length.
    #[must_use]
    pub fn max_len(mut self, max_len: u8) -> Self {
        self.max_len = max_len;
        self
    }

    /// Sets a human-readable description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// UTF-8 (up to three bytes per character).
    #[must_use]
    pub fn utf8() -> Self {
        Self::new("utf8", "utf8_general_ci")
            .max_len(3)
            .description("UTF-8 Unicode")
    }

    /// Full UTF-8 (up to four bytes per character).
    #[must_use]
    pub fn utf8mb4() -> Self {
        Self::new("utf8mb4", "utf8mb4_general_ci")
            .max_len(4)
            .description("UTF-8 Unicode, supplementary planes included")
    }

    /// Western European.
    #[must_use]
    pub fn latin1() -> Self {
        Self::new("latin1", "latin1_swedish_ci").description("cp1252 West European")
    }

    /// US ASCII.
    #[must_use]
    pub fn ascii() -> Self {
        Self::new("ascii", "ascii_general_ci").description("US ASCII")
    }

    /// The charset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The collation name.
    #[must_use]
    pub fn collation(&self) -> &str {
        &self.collation
    }

    /// Maximum bytes per character.
    #[must_use]
    pub fn max_length(&self) -> u8 {
        self.max_len
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_charsets() {
        let cs = Charset::utf8mb4();
        assert_eq!(cs.name(), "utf8mb4");
        assert_eq!(cs.collation(), "utf8mb4_general_ci");
        assert_eq!(cs.max_length(), 4);
        assert_eq!(cs.to_string(), "utf8mb4");
    }
}
