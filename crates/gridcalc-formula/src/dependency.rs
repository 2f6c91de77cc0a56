//! Dependency tracking for recalculation
//!
//! Built from the references each formula records at parse time. Single-cell
//! references become graph edges; ranges and whole rows or columns are kept
//! as areas and matched against cells when dependents are looked up, so
//! `SUM(A:A)` costs one entry rather than a million.

use crate::functions::FunctionRegistry;
use crate::store::Workbook;
use ahash::{AHashMap, AHashSet};
use gridcalc_core::{CellKey, Reference};

/// Dependency graph for formula cells
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Cell → cells that depend on it
    dependents: AHashMap<CellKey, AHashSet<CellKey>>,
    /// Cell → cells it depends on
    precedents: AHashMap<CellKey, AHashSet<CellKey>>,
    /// Multi-cell references and the formula cells reading them
    areas: Vec<(Reference, CellKey)>,
    /// Cells calling volatile functions
    volatile: AHashSet<CellKey>,
    /// Every cell with a formula
    formulas: AHashSet<CellKey>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph of every formula in the workbook
    ///
    /// Defined names used by a formula contribute the references of their
    /// own formulas. References produced at evaluation time (`INDIRECT`,
    /// `OFFSET`) are not visible here; cells using them are volatile instead.
    pub fn from_workbook(workbook: &Workbook, registry: &FunctionRegistry) -> Self {
        let mut graph = Self::new();
        for worksheet in workbook.worksheets() {
            for cell in worksheet.formula_cells() {
                let Some(formula) = cell.formula() else {
                    continue;
                };
                let key = cell.address().key();
                graph.add_formula(key.clone());
                if formula.is_volatile(registry) {
                    graph.volatile.insert(key.clone());
                }

                let mut references = formula.references().to_vec();
                let mut seen_names = AHashSet::new();
                let mut pending: Vec<String> =
                    formula.names().into_iter().map(str::to_lowercase).collect();
                while let Some(name) = pending.pop() {
                    if !seen_names.insert(name.clone()) {
                        continue;
                    }
                    let Some(def) = workbook.get_defined_name(&name, worksheet.name()) else {
                        continue;
                    };
                    references.extend(def.formula().references().iter().cloned());
                    pending.extend(def.formula().names().into_iter().map(str::to_lowercase));
                    if def.formula().is_volatile(registry) {
                        graph.volatile.insert(key.clone());
                    }
                }

                for reference in references {
                    match reference {
                        Reference::Cell(precedent) => {
                            graph.add_dependency(precedent.key(), key.clone())
                        }
                        area => graph.add_area_dependency(area, key.clone()),
                    }
                }
            }
        }
        graph
    }

    /// Record a cell holding a formula
    pub fn add_formula(&mut self, cell: CellKey) {
        self.formulas.insert(cell);
    }

    /// Add a dependency: dependent depends on precedent
    pub fn add_dependency(&mut self, precedent: CellKey, dependent: CellKey) {
        self.dependents
            .entry(precedent.clone())
            .or_default()
            .insert(dependent.clone());
        self.precedents
            .entry(dependent)
            .or_default()
            .insert(precedent);
    }

    /// Add a dependency on every cell of `area`
    pub fn add_area_dependency(&mut self, area: Reference, dependent: CellKey) {
        self.areas.push((area, dependent));
    }

    /// Mark a cell as recalculated on every pass
    pub fn add_volatile(&mut self, cell: CellKey) {
        self.volatile.insert(cell);
    }

    /// Remove all dependencies for a cell
    pub fn clear_dependencies(&mut self, cell: &CellKey) {
        // Remove from all precedents' dependents list
        if let Some(precedents) = self.precedents.remove(cell) {
            for precedent in precedents {
                if let Some(deps) = self.dependents.get_mut(&precedent) {
                    deps.remove(cell);
                }
            }
        }

        // Remove as a precedent for others
        if let Some(dependents) = self.dependents.remove(cell) {
            for dependent in dependents {
                if let Some(precs) = self.precedents.get_mut(&dependent) {
                    precs.remove(cell);
                }
            }
        }

        self.areas.retain(|(_, dependent)| dependent != cell);
        self.volatile.remove(cell);
        self.formulas.remove(cell);
    }

    /// Get cells that depend on the given cell, through single-cell
    /// references or areas covering it
    pub fn get_dependents(&self, cell: &CellKey) -> Vec<CellKey> {
        let address = cell.reference();
        let direct = self.dependents.get(cell).into_iter().flatten().cloned();
        let through_areas = self
            .areas
            .iter()
            .filter(|(area, _)| area.contains(&address))
            .map(|(_, dependent)| dependent.clone());

        let mut result: Vec<CellKey> = direct.chain(through_areas).collect();
        result.sort();
        result.dedup();
        result
    }

    /// Get cells that the given cell depends on through single-cell references
    pub fn get_precedents(&self, cell: &CellKey) -> impl Iterator<Item = &CellKey> + '_ {
        self.precedents.get(cell).into_iter().flatten()
    }

    /// Formula cells whose areas cover a cell
    fn area_precedents<'a>(
        &'a self,
        cell: &'a CellKey,
    ) -> impl Iterator<Item = &'a CellKey> + 'a {
        let areas: Vec<&Reference> = self
            .areas
            .iter()
            .filter(|(_, dependent)| dependent == cell)
            .map(|(area, _)| area)
            .collect();
        self.formulas
            .iter()
            .filter(move |formula| areas.iter().any(|area| area.contains(&formula.reference())))
    }

    pub fn volatile_cells(&self) -> impl Iterator<Item = &CellKey> + '_ {
        self.volatile.iter()
    }

    pub fn is_volatile(&self, cell: &CellKey) -> bool {
        self.volatile.contains(cell)
    }

    /// Formula cells to recalculate after `changed` cells were edited
    ///
    /// Includes every transitive dependent plus the volatile cells and their
    /// dependents, precedents before dependents. Cycles are cut arbitrarily;
    /// the evaluator reports them.
    pub fn get_recalc_order(&self, changed: &[CellKey]) -> Vec<CellKey> {
        let mut result = Vec::new();
        let mut visited = AHashSet::new();
        let mut in_stack = AHashSet::new();

        let mut volatile: Vec<&CellKey> = self.volatile.iter().collect();
        volatile.sort();
        for cell in changed.iter().chain(volatile) {
            self.topological_sort(cell, &mut result, &mut visited, &mut in_stack);
        }

        result.reverse();
        result.retain(|cell| self.formulas.contains(cell));
        result
    }

    /// Topological sort helper (DFS)
    fn topological_sort(
        &self,
        cell: &CellKey,
        result: &mut Vec<CellKey>,
        visited: &mut AHashSet<CellKey>,
        in_stack: &mut AHashSet<CellKey>,
    ) {
        if visited.contains(cell) || in_stack.contains(cell) {
            return;
        }

        in_stack.insert(cell.clone());

        // Visit all dependents first
        for dependent in self.get_dependents(cell) {
            self.topological_sort(&dependent, result, visited, in_stack);
        }

        in_stack.remove(cell);
        visited.insert(cell.clone());
        result.push(cell.clone());
    }

    /// Detect circular references involving a cell
    pub fn has_circular_reference(&self, cell: &CellKey) -> bool {
        let mut visited = AHashSet::new();
        let mut in_stack = AHashSet::new();
        self.detect_cycle(cell, &mut visited, &mut in_stack)
    }

    /// Whether a cell lies on a cycle itself, i.e. can reach itself through
    /// its precedents. A cell that merely reads a cycle does not.
    pub fn is_on_cycle(&self, cell: &CellKey) -> bool {
        let mut visited = AHashSet::new();
        let mut pending: Vec<&CellKey> =
            self.get_precedents(cell).chain(self.area_precedents(cell)).collect();
        while let Some(next) = pending.pop() {
            if next == cell {
                return true;
            }
            if visited.insert(next) {
                pending.extend(self.get_precedents(next).chain(self.area_precedents(next)));
            }
        }
        false
    }

    fn detect_cycle(
        &self,
        cell: &CellKey,
        visited: &mut AHashSet<CellKey>,
        in_stack: &mut AHashSet<CellKey>,
    ) -> bool {
        if in_stack.contains(cell) {
            return true;
        }
        if visited.contains(cell) {
            return false;
        }

        visited.insert(cell.clone());
        in_stack.insert(cell.clone());

        let precedents: Vec<&CellKey> =
            self.get_precedents(cell).chain(self.area_precedents(cell)).collect();
        for precedent in precedents {
            if self.detect_cycle(precedent, visited, in_stack) {
                return true;
            }
        }

        in_stack.remove(cell);
        false
    }

    /// Clear the entire graph
    pub fn clear(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
        self.areas.clear();
        self.volatile.clear();
        self.formulas.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NameScope;
    use gridcalc_core::CellReference;
    use pretty_assertions::assert_eq;

    fn key(text: &str) -> CellKey {
        CellReference::parse(text, "Sheet1").unwrap().key()
    }

    #[test]
    fn test_add_dependency() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(key("A1"), key("B1"));

        assert_eq!(graph.get_dependents(&key("A1")), vec![key("B1")]);
        assert!(graph.get_precedents(&key("B1")).any(|c| *c == key("A1")));

        graph.clear_dependencies(&key("B1"));
        assert!(graph.get_dependents(&key("A1")).is_empty());
    }

    #[test]
    fn test_circular_reference() {
        let mut graph = DependencyGraph::new();

        // A1 -> B1 -> C1 -> A1 (circular)
        graph.add_dependency(key("A1"), key("B1"));
        graph.add_dependency(key("B1"), key("C1"));
        graph.add_dependency(key("C1"), key("A1"));

        assert!(graph.has_circular_reference(&key("A1")));
        assert!(graph.has_circular_reference(&key("B1")));
        assert!(!graph.has_circular_reference(&key("D1")));

        // D1 reads the cycle without being part of it
        graph.add_dependency(key("A1"), key("D1"));
        assert!(graph.has_circular_reference(&key("D1")));
        assert!(!graph.is_on_cycle(&key("D1")));
        assert!(graph.is_on_cycle(&key("C1")));
    }

    #[test]
    fn test_circular_through_area() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_formula("A3", "=SUM(A1:A5)").unwrap();
        sheet.set_cell_formula("B1", "=A1").unwrap();

        let graph = DependencyGraph::from_workbook(&wb, FunctionRegistry::builtin());
        assert!(graph.has_circular_reference(&key("A3")));
        assert!(!graph.has_circular_reference(&key("B1")));
    }

    #[test]
    fn test_recalc_order_from_workbook() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_value("A1", 1).unwrap();
        sheet.set_cell_formula("A2", "=A1*2").unwrap();
        sheet.set_cell_formula("A3", "=A2+1").unwrap();
        sheet.set_cell_formula("B1", "=SUM(A:A)").unwrap();
        sheet.set_cell_formula("C1", "=5").unwrap();
        sheet.set_cell_formula("D1", "=OFFSET(C1,0,0)").unwrap();

        let graph = DependencyGraph::from_workbook(&wb, FunctionRegistry::builtin());
        assert!(graph.is_volatile(&key("D1")));

        let order = graph.get_recalc_order(&[key("A1")]);
        let position = |cell: &str| order.iter().position(|c| *c == key(cell));
        assert!(position("A2") < position("A3"));
        assert!(position("A3") < position("B1"));
        assert!(position("D1").is_some());
        assert_eq!(position("C1"), None);
        assert_eq!(position("A1"), None);
    }

    #[test]
    fn test_defined_names_contribute_references() {
        let mut wb = Workbook::new();
        wb.worksheet_mut(0)
            .unwrap()
            .set_cell_formula("B1", "=Rate*2")
            .unwrap();
        wb.define_name("Rate", NameScope::Workbook, "=Sheet1!$A$1").unwrap();

        let graph = DependencyGraph::from_workbook(&wb, FunctionRegistry::builtin());
        assert_eq!(graph.get_dependents(&key("A1")), vec![key("B1")]);
    }
}
