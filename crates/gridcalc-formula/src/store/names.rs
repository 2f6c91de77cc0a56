//! Defined names
//!
//! Defined names let formulas refer to a cell, a range, a constant, or a
//! whole expression by a meaningful identifier:
//!
//! ```text
//! // Define a name "TaxRate" that refers to cell B1
//! workbook.define_name("TaxRate", NameScope::Workbook, "=Sheet1!$B$1")?;
//!
//! // Use it in a formula
//! =Price * TaxRate
//! ```

use crate::formula::Formula;
use ahash::AHashMap;
use gridcalc_core::{Error, SheetName};
use lazy_regex::regex_is_match;

/// Scope of a defined name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NameScope {
    /// Visible from every sheet
    Workbook,
    /// Visible only from formulas on this sheet; shadows a workbook name
    Sheet(SheetName),
}

/// A defined name and the formula it stands for
#[derive(Debug, Clone, PartialEq)]
pub struct DefinedName {
    name: String,
    scope: NameScope,
    formula: Formula,
}

impl DefinedName {
    /// Create a defined name after checking its syntax
    pub fn new(name: impl Into<String>, scope: NameScope, formula: Formula) -> Result<Self, Error> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            scope,
            formula,
        })
    }

    /// The name as it was defined
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> &NameScope {
        &self.scope
    }

    /// What the name refers to
    pub fn formula(&self) -> &Formula {
        &self.formula
    }
}

/// Whether `name` can be used as a defined name
///
/// Names start with a letter, `_`, or `\`, continue with letters, digits,
/// `_`, `.`, or `\`, and must not read as a cell address, an R1C1 address,
/// or a boolean.
pub fn is_valid_name(name: &str) -> bool {
    regex_is_match!(r"^[\p{L}_\\][\p{L}0-9_.\\]*$", name)
        && !regex_is_match!(r"^[A-Za-z]{1,3}[0-9]+$", name)
        && !regex_is_match!(r"^(?i:r[0-9]*c?[0-9]*|c[0-9]*)$", name)
        && !name.eq_ignore_ascii_case("TRUE")
        && !name.eq_ignore_ascii_case("FALSE")
}

fn validate_name(name: &str) -> Result<(), Error> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(Error::InvalidName(name.to_string()))
    }
}

/// Defined names keyed case-insensitively by name and scope
#[derive(Debug, Default, Clone)]
pub struct DefinedNames {
    names: AHashMap<(String, NameScope), DefinedName>,
}

impl DefinedNames {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(name: &str, scope: &NameScope) -> (String, NameScope) {
        (name.to_lowercase(), scope.clone())
    }

    /// Add a name; fails if the name already exists in the same scope
    pub fn define(&mut self, name: DefinedName) -> Result<(), Error> {
        let key = Self::key(&name.name, &name.scope);
        if self.names.contains_key(&key) {
            return Err(Error::InvalidName(format!(
                "'{}' already exists in this scope",
                name.name
            )));
        }
        self.names.insert(key, name);
        Ok(())
    }

    /// Add a name, replacing any existing definition in the same scope
    pub fn define_or_update(&mut self, name: DefinedName) {
        let key = Self::key(&name.name, &name.scope);
        self.names.insert(key, name);
    }

    /// Look up a name as seen from `sheet`: sheet scope first, then workbook
    pub fn get(&self, name: &str, sheet: &SheetName) -> Option<&DefinedName> {
        self.names
            .get(&Self::key(name, &NameScope::Sheet(sheet.clone())))
            .or_else(|| self.names.get(&Self::key(name, &NameScope::Workbook)))
    }

    /// Look up a name in exactly one scope
    pub fn get_exact(&self, name: &str, scope: &NameScope) -> Option<&DefinedName> {
        self.names.get(&Self::key(name, scope))
    }

    pub fn remove(&mut self, name: &str, scope: &NameScope) -> Option<DefinedName> {
        self.names.remove(&Self::key(name, scope))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DefinedName> {
        self.names.values()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defined(name: &str, scope: NameScope, refers_to: &str) -> DefinedName {
        let formula = Formula::parse(refers_to, &SheetName::default()).unwrap();
        DefinedName::new(name, scope, formula).unwrap()
    }

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("TaxRate"));
        assert!(is_valid_name("_total"));
        assert!(is_valid_name("Sales.Q1"));
        assert!(!is_valid_name("A1"));
        assert!(!is_valid_name("XFD100"));
        assert!(!is_valid_name("R1C1"));
        assert!(!is_valid_name("c"));
        assert!(!is_valid_name("TRUE"));
        assert!(!is_valid_name("1abc"));
        assert!(!is_valid_name("has space"));
    }

    #[test]
    fn test_scoped_lookup() {
        let data = SheetName::new("Data").unwrap();
        let mut names = DefinedNames::new();
        names.define(defined("Rate", NameScope::Workbook, "=0.1")).unwrap();
        names
            .define(defined("rate", NameScope::Sheet(data.clone()), "=0.2"))
            .unwrap();

        let from_data = names.get("RATE", &data).unwrap();
        assert_eq!(from_data.scope(), &NameScope::Sheet(data));

        let from_other = names.get("rate", &SheetName::default()).unwrap();
        assert_eq!(from_other.scope(), &NameScope::Workbook);
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_duplicate_definition() {
        let mut names = DefinedNames::new();
        names.define(defined("Rate", NameScope::Workbook, "=1")).unwrap();
        assert!(names.define(defined("RATE", NameScope::Workbook, "=2")).is_err());

        names.define_or_update(defined("RATE", NameScope::Workbook, "=2"));
        let rate = names.get_exact("rate", &NameScope::Workbook).unwrap();
        assert_eq!(rate.formula().to_string(), "=2");
    }

    #[test]
    fn test_invalid_name_rejected() {
        let formula = Formula::parse("=1", &SheetName::default()).unwrap();
        assert_eq!(
            DefinedName::new("B2", NameScope::Workbook, formula),
            Err(Error::InvalidName("B2".into()))
        );
    }
}
