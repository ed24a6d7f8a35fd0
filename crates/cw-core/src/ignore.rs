//! Case-insensitive ignore list for automated chat accounts.

use std::collections::BTreeSet;

/// Bot accounts that sit in most channels and never count as viewers.
pub const DEFAULT_IGNORED: &[&str] = &[
    "nightbot",
    "streamelements",
    "moobot",
    "streamlabs",
    "fossabot",
    "wizebot",
    "soundalerts",
    "commanderroot",
];

/// A set of identities excluded from all accounting.
///
/// Entries are stored lower-cased; lookups fold the candidate the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreList {
    names: BTreeSet<String>,
}

impl Default for IgnoreList {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl IgnoreList {
    /// The built-in bot list.
    pub fn with_defaults() -> Self {
        Self::from_names(DEFAULT_IGNORED.iter().copied())
    }

    /// An ignore list with no entries at all.
    pub const fn empty() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::empty();
        list.extend(names);
        list
    }

    /// Adds more names. Existing entries are never removed.
    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.names.extend(
            names
                .into_iter()
                .map(|n| n.as_ref().trim().to_lowercase())
                .filter(|n| !n.is_empty()),
        );
    }

    pub fn is_ignored(&self, identity: &str) -> bool {
        self.names.contains(&identity.to_lowercase())
    }

    /// Lower-cased entries in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
