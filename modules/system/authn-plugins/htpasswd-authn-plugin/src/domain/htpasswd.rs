//! Parsing of htpasswd files.

use std::collections::HashMap;

use thiserror::Error;

use super::hash::verify_password;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("htpasswd file is not valid UTF-8")]
    Encoding,

    #[error("htpasswd line {line} has no ':' separator")]
    MissingSeparator { line: usize },

    #[error("htpasswd line {line} has an empty username")]
    EmptyUser { line: usize },
}

/// Username to stored hash, as read from an htpasswd file.
#[derive(Debug, Clone, Default)]
pub struct HtpasswdFile {
    entries: HashMap<String, String>,
}

impl HtpasswdFile {
    /// Parse `user:hash` lines. Blank lines and `#` comments are skipped; a
    /// later entry for the same user replaces an earlier one.
    ///
    /// # Errors
    /// Returns [`ParseError`] on a non UTF-8 file or a malformed line.
    pub fn parse(raw: &[u8]) -> Result<Self, ParseError> {
        let text = std::str::from_utf8(raw).map_err(|_| ParseError::Encoding)?;
        let mut entries = HashMap::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (user, hash) = line
                .split_once(':')
                .ok_or(ParseError::MissingSeparator { line: idx + 1 })?;
            if user.is_empty() {
                return Err(ParseError::EmptyUser { line: idx + 1 });
            }
            entries.insert(user.to_owned(), hash.to_owned());
        }
        Ok(Self { entries })
    }

    #[must_use]
    pub fn contains(&self, user: &str) -> bool {
        self.entries.contains_key(user)
    }

    /// `None` if the user is unknown, otherwise whether the password matches.
    #[must_use]
    pub fn verify(&self, user: &str, password: &str) -> Option<bool> {
        self.entries
            .get(user)
            .map(|stored| verify_password(password, stored))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_skipping_comments() {
        let file = HtpasswdFile::parse(
            b"# managed by ops\n\nuser1:$1$D89ubl/e$dJ8XW4DfrJHTrnwCdx3Ji1\nuser2:plain\n",
        )
        .unwrap();

        assert_eq!(file.len(), 2);
        assert_eq!(file.verify("user1", "mickey5"), Some(true));
        assert_eq!(file.verify("user2", "plain"), Some(true));
        assert_eq!(file.verify("user2", "other"), Some(false));
        assert_eq!(file.verify("nobody", "x"), None);
    }

    #[test]
    fn hash_may_contain_colons() {
        let file = HtpasswdFile::parse(b"svc:a:b:c").unwrap();
        assert_eq!(file.verify("svc", "a:b:c"), Some(true));
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert_eq!(
            HtpasswdFile::parse(b"ok:pw\njunk\n").unwrap_err(),
            ParseError::MissingSeparator { line: 2 }
        );
        assert_eq!(
            HtpasswdFile::parse(b":pw").unwrap_err(),
            ParseError::EmptyUser { line: 1 }
        );
        assert_eq!(HtpasswdFile::parse(&[0xff, 0xfe]).unwrap_err(), ParseError::Encoding);
    }
}
