//! cellgraph_engine - Leaf types and formula front end.

pub mod engine;

#[cfg(test)]
mod tests {
    use crate::engine::*;
    use std::cell::Cell;
    use std::collections::HashMap;

    /// Lookup that counts how often it is consulted.
    struct CountingLookup {
        values: HashMap<Position, Value>,
        hits: Cell<usize>,
    }

    impl CellLookup for CountingLookup {
        fn lookup_value(&self, pos: Position) -> Option<Value> {
            self.hits.set(self.hits.get() + 1);
            self.values.get(&pos).cloned()
        }
    }

    fn pos(name: &str) -> Position {
        name.parse().unwrap()
    }

    #[test]
    fn test_from_str_single_letter_columns() {
        assert_eq!(pos("A1"), Position::new(0, 0));
        assert_eq!(pos("B1"), Position::new(0, 1));
        assert_eq!(pos("Z1"), Position::new(0, 25));
    }

    #[test]
    fn test_from_str_multi_letter_columns() {
        assert_eq!(pos("AA1").col, 26);
        assert_eq!(pos("AB1").col, 27);
        assert_eq!(pos("AZ1").col, 51);
        assert_eq!(pos("BA1").col, 52);
    }

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!(pos("a1"), Position::new(0, 0));
        assert_eq!(pos("aA1").col, 26);
    }

    #[test]
    fn test_from_str_invalid_inputs() {
        assert!("".parse::<Position>().is_err());
        assert!("123".parse::<Position>().is_err());
        assert!("ABC".parse::<Position>().is_err());
        assert!("A0".parse::<Position>().is_err());
        assert!("1A".parse::<Position>().is_err());
        assert!("A 1".parse::<Position>().is_err());
    }

    #[test]
    fn test_formula_reads_each_reference_through_lookup() {
        let lookup = CountingLookup {
            values: HashMap::from([
                (pos("A1"), Value::Number(2.0)),
                (pos("B1"), Value::Text("3".to_string())),
            ]),
            hits: Cell::new(0),
        };
        let formula = Formula::parse("A1*B1 + A1").unwrap();
        assert_eq!(formula.evaluate(&lookup), Ok(8.0));
        assert_eq!(lookup.hits.get(), 3);
        assert_eq!(formula.referenced_cells(), &[pos("A1"), pos("B1")]);
    }

    #[test]
    fn test_formula_error_becomes_value() {
        let lookup = CountingLookup {
            values: HashMap::new(),
            hits: Cell::new(0),
        };
        let formula = Formula::parse("1/(A1-A1)").unwrap();
        let value = Value::from(formula.evaluate(&lookup));
        assert_eq!(value, Value::Error(FormulaError::Arithmetic));
        assert_eq!(value.to_string(), "#ARITHM!");
    }
}
