//! Dependency graph algorithms over the sheet's cells.
//!
//! All three walks use an explicit stack: the depth of a dependency chain is
//! up to the user, so it must not become call-stack depth.

use std::collections::{BTreeSet, HashMap, HashSet};

use cellgraph_engine::engine::{Position, Value};
use log::trace;

use super::Sheet;
use crate::cell::{Cell, CellContent};

impl Sheet {
    /// Check whether giving `target` the child set `candidates` would close a
    /// cycle. Returns the offending path (`target -> ... -> target`) if so.
    ///
    /// Positions without a cell have no outgoing edges, so the check can run
    /// before any missing dependency is created.
    pub(crate) fn detect_cycle(
        &self,
        target: Position,
        candidates: &BTreeSet<Position>,
    ) -> Option<Vec<Position>> {
        let mut came_from: HashMap<Position, Option<Position>> = HashMap::new();
        let mut stack: Vec<(Position, Option<Position>)> =
            candidates.iter().rev().map(|&c| (c, None)).collect();

        while let Some((pos, from)) = stack.pop() {
            if came_from.contains_key(&pos) {
                continue;
            }
            came_from.insert(pos, from);

            if pos == target {
                let mut path = vec![target];
                let mut cur = from;
                while let Some(step) = cur {
                    path.push(step);
                    cur = came_from.get(&step).copied().flatten();
                }
                path.push(target);
                path.reverse();
                return Some(path);
            }

            if let Some(cell) = self.cells.get(&pos) {
                for child in cell.children.iter().rev() {
                    if !came_from.contains_key(child) {
                        stack.push((*child, Some(pos)));
                    }
                }
            }
        }

        None
    }

    /// Drop the cache of `origin` and of every dependent whose value was
    /// derived from it.
    ///
    /// The origin always propagates. Past it, a cell with no cache stops the
    /// walk: nothing above it can have been computed from it since.
    pub(crate) fn invalidate_from(&self, origin: Position) {
        let Some(cell) = self.cells.get(&origin) else {
            return;
        };
        cell.clear_cache();

        let mut stack: Vec<Position> = cell.parents().collect();
        let mut cleared = 0usize;
        while let Some(pos) = stack.pop() {
            let Some(parent) = self.cells.get(&pos) else {
                continue;
            };
            if parent.clear_cache() {
                cleared += 1;
                stack.extend(parent.parents());
            }
        }

        trace!("{}: invalidated {} dependent cache(s)", origin, cleared);
    }

    /// Value of the cell at `pos`, computing and caching formula results.
    pub(crate) fn evaluate(&self, pos: Position) -> Value {
        let Some(cell) = self.cells.get(&pos) else {
            return Value::empty();
        };
        if let Some(value) = cell.literal_value() {
            return value;
        }
        if let Some(value) = cell.cached_value() {
            return value;
        }

        self.evaluate_dependencies(pos);
        self.evaluate_formula(pos, cell)
    }

    /// Evaluate every uncached formula below `root`, children before parents,
    /// so that evaluating `root` only ever reads cached values.
    fn evaluate_dependencies(&self, root: Position) {
        let mut visited = HashSet::new();
        let mut stack: Vec<(Position, bool)> = Vec::new();
        if let Some(cell) = self.cells.get(&root) {
            stack.extend(cell.children().map(|c| (c, false)));
        }

        while let Some((pos, expanded)) = stack.pop() {
            let Some(cell) = self.cells.get(&pos) else {
                continue;
            };
            if expanded {
                if needs_evaluation(cell) {
                    self.evaluate_formula(pos, cell);
                }
                continue;
            }
            if !visited.insert(pos) || !needs_evaluation(cell) {
                continue;
            }
            stack.push((pos, true));
            for child in cell.children() {
                if !visited.contains(&child) {
                    stack.push((child, false));
                }
            }
        }
    }

    fn evaluate_formula(&self, pos: Position, cell: &Cell) -> Value {
        let CellContent::Formula(formula) = cell.content() else {
            return cell.literal_value().unwrap_or_default();
        };
        self.evaluations.set(self.evaluations.get() + 1);
        let value = Value::from(formula.evaluate(self));
        trace!("{}: evaluated to {}", pos, value);
        cell.store_cache(value.clone());
        value
    }
}

fn needs_evaluation(cell: &Cell) -> bool {
    matches!(cell.content(), CellContent::Formula(_)) && !cell.has_cache()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::Sheet;
    use cellgraph_engine::engine::{FormulaError, Position, Value};

    fn p(name: &str) -> Position {
        name.parse().unwrap()
    }

    #[test]
    fn test_detect_cycle_no_cycle() {
        let mut sheet = Sheet::new();
        sheet.set_cell(p("A1"), "10").unwrap();
        sheet.set_cell(p("B1"), "20").unwrap();
        let candidates = BTreeSet::from([p("A1"), p("B1")]);
        assert!(sheet.detect_cycle(p("C1"), &candidates).is_none());
    }

    #[test]
    fn test_detect_cycle_direct() {
        let mut sheet = Sheet::new();
        sheet.set_cell(p("A1"), "=B1").unwrap();
        let path = sheet.detect_cycle(p("B1"), &BTreeSet::from([p("A1")]));
        assert_eq!(path, Some(vec![p("B1"), p("A1"), p("B1")]));
    }

    #[test]
    fn test_detect_cycle_self_reference() {
        let sheet = Sheet::new();
        let path = sheet.detect_cycle(p("A1"), &BTreeSet::from([p("A1")]));
        assert_eq!(path, Some(vec![p("A1"), p("A1")]));
    }

    #[test]
    fn test_detect_cycle_diamond_visits_once() {
        // D1 is reachable through both B1 and C1; no cycle back to E1.
        let mut sheet = Sheet::new();
        sheet.set_cell(p("A1"), "=B1+C1").unwrap();
        sheet.set_cell(p("B1"), "=D1").unwrap();
        sheet.set_cell(p("C1"), "=D1").unwrap();
        assert!(sheet.detect_cycle(p("E1"), &BTreeSet::from([p("A1")])).is_none());
        assert!(sheet.detect_cycle(p("D1"), &BTreeSet::from([p("A1")])).is_some());
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let mut sheet = Sheet::new();
        let depth = 5_000;
        sheet.set_cell(Position::new(0, 0), "1").unwrap();
        for row in 1..depth {
            let formula = format!("={}+1", Position::new(row - 1, 0));
            sheet.set_cell(Position::new(row, 0), &formula).unwrap();
        }
        let last = Position::new(depth - 1, 0);
        assert_eq!(sheet.value(last).unwrap(), Some(Value::Number(depth as f64)));

        // Closing the loop at the bottom must be rejected, not recurse forever.
        let closing = format!("={}", last);
        assert!(sheet.set_cell(Position::new(0, 0), &closing).is_err());

        // Invalidation walks the whole chain.
        sheet.set_cell(Position::new(0, 0), "2").unwrap();
        assert!(!sheet.get_cell(last).unwrap().unwrap().has_cache());
        assert_eq!(
            sheet.value(last).unwrap(),
            Some(Value::Number(depth as f64 + 1.0))
        );
    }

    #[test]
    fn test_invalidation_reaches_transitive_dependents_only() {
        let mut sheet = Sheet::new();
        sheet.set_cell(p("A1"), "1").unwrap();
        sheet.set_cell(p("B1"), "=A1+1").unwrap();
        sheet.set_cell(p("C1"), "=B1+1").unwrap();
        sheet.set_cell(p("D1"), "=5").unwrap();
        assert_eq!(sheet.value(p("C1")).unwrap(), Some(Value::Number(3.0)));
        assert_eq!(sheet.value(p("D1")).unwrap(), Some(Value::Number(5.0)));

        sheet.set_cell(p("A1"), "10").unwrap();
        assert!(!sheet.get_cell(p("B1")).unwrap().unwrap().has_cache());
        assert!(!sheet.get_cell(p("C1")).unwrap().unwrap().has_cache());
        assert!(sheet.get_cell(p("D1")).unwrap().unwrap().has_cache());
        assert_eq!(sheet.value(p("C1")).unwrap(), Some(Value::Number(12.0)));
    }

    #[test]
    fn test_evaluating_top_caches_whole_subtree() {
        let mut sheet = Sheet::new();
        sheet.set_cell(p("A1"), "=B1+C1").unwrap();
        sheet.set_cell(p("B1"), "=C1*2").unwrap();
        sheet.set_cell(p("C1"), "=3").unwrap();

        assert_eq!(sheet.value(p("A1")).unwrap(), Some(Value::Number(9.0)));
        assert_eq!(sheet.evaluation_count(), 3);
        for name in ["A1", "B1", "C1"] {
            assert!(sheet.get_cell(p(name)).unwrap().unwrap().has_cache());
        }
    }

    #[test]
    fn test_errors_are_cached_values() {
        let mut sheet = Sheet::new();
        sheet.set_cell(p("A1"), "=1/0").unwrap();
        sheet.set_cell(p("B1"), "=A1+1").unwrap();

        let expected = Some(Value::Error(FormulaError::Arithmetic));
        assert_eq!(sheet.value(p("B1")).unwrap(), expected);
        assert_eq!(sheet.value(p("A1")).unwrap(), expected);
        let count = sheet.evaluation_count();
        assert_eq!(sheet.value(p("B1")).unwrap(), expected);
        assert_eq!(sheet.evaluation_count(), count);
    }
}
