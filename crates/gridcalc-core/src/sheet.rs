//! Sheet names

use crate::error::{Error, Result};
use crate::MAX_SHEET_NAME_LEN;
use lazy_regex::regex_is_match;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Characters Excel rejects in sheet names
const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];

/// A validated sheet name
///
/// Sheet names compare, hash, and order case-insensitively (`Sheet1` and
/// `SHEET1` name the same sheet) while keeping the spelling they were created
/// with for display. Cloning shares the underlying string.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct SheetName(Arc<str>);

impl SheetName {
    /// Create a sheet name, validating it against Excel's rules
    ///
    /// # Examples
    /// ```
    /// use gridcalc_core::SheetName;
    ///
    /// assert!(SheetName::new("Q1 Sales").is_ok());
    /// assert!(SheetName::new("").is_err());
    /// assert!(SheetName::new("a/b").is_err());
    /// ```
    pub fn new<S: AsRef<str>>(name: S) -> Result<Self> {
        let name = name.as_ref();
        validate(name)?;
        Ok(SheetName(Arc::from(name)))
    }

    /// Get the name as written
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name must be wrapped in single quotes inside a formula
    pub fn needs_quoting(&self) -> bool {
        let name = self.as_str();
        !regex_is_match!(r"^[A-Za-z_][A-Za-z0-9_.]*$", name)
            || regex_is_match!(r"^[A-Za-z]{1,3}[0-9]+$", name)
            || regex_is_match!(r"^(?i:r[0-9]*c?[0-9]*|c[0-9]*)$", name)
    }

    /// Format the name as a reference prefix, e.g. `Sheet1!` or `'My Sheet'!`
    pub fn to_prefix(&self) -> String {
        if self.needs_quoting() {
            format!("'{}'!", self.as_str().replace('\'', "''"))
        } else {
            format!("{}!", self.as_str())
        }
    }

    fn folded(&self) -> impl Iterator<Item = char> + '_ {
        self.0.chars().flat_map(char::to_lowercase)
    }
}

fn validate(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(Error::InvalidSheetName(format!(
            "Sheet name too long (max {} characters)",
            MAX_SHEET_NAME_LEN
        )));
    }
    if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
        return Err(Error::InvalidSheetName(format!(
            "Sheet name cannot contain '{}'",
            c
        )));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(Error::InvalidSheetName(
            "Sheet name cannot start or end with an apostrophe".into(),
        ));
    }
    Ok(())
}

impl Default for SheetName {
    fn default() -> Self {
        SheetName(Arc::from("Sheet1"))
    }
}

impl PartialEq for SheetName {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.folded().eq(other.folded())
    }
}

impl Eq for SheetName {}

impl Hash for SheetName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in self.folded() {
            c.hash(state);
        }
    }
}

impl PartialOrd for SheetName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SheetName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded().cmp(other.folded())
    }
}

impl fmt::Debug for SheetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for SheetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for SheetName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<String> for SheetName {
    type Error = Error;

    fn try_from(name: String) -> Result<Self> {
        SheetName::new(name)
    }
}

impl TryFrom<&str> for SheetName {
    type Error = Error;

    fn try_from(name: &str) -> Result<Self> {
        SheetName::new(name)
    }
}

impl From<SheetName> for String {
    fn from(name: SheetName) -> Self {
        name.as_str().to_string()
    }
}
