//! Formula expression tree: evaluation and re-serialization.

use std::fmt;

use super::CellLookup;
use crate::engine::{FormulaError, Position, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
        }
    }

    fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
        }
    }

    fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
        }
    }
}

const UNARY_PRECEDENCE: u8 = 3;
const ATOM_PRECEDENCE: u8 = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// May hold an out-of-range position; it evaluates to `#REF!`.
    Cell(Position),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    fn precedence(&self) -> u8 {
        match self {
            Expr::Number(_) | Expr::Cell(_) => ATOM_PRECEDENCE,
            Expr::Unary { .. } => UNARY_PRECEDENCE,
            Expr::Binary { op, .. } => op.precedence(),
        }
    }

    pub fn evaluate(&self, lookup: &dyn CellLookup) -> Result<f64, FormulaError> {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Cell(pos) => cell_number(*pos, lookup),
            Expr::Unary { op, operand } => {
                let v = operand.evaluate(lookup)?;
                Ok(match op {
                    UnaryOp::Plus => v,
                    UnaryOp::Minus => -v,
                })
            }
            Expr::Binary { op, left, right } => {
                let lhs = left.evaluate(lookup)?;
                let rhs = right.evaluate(lookup)?;
                let result = op.apply(lhs, rhs);
                if result.is_finite() {
                    Ok(result)
                } else {
                    Err(FormulaError::Arithmetic)
                }
            }
        }
    }

    /// Append every cell this expression reads, in source order, duplicates included.
    pub fn collect_cells(&self, out: &mut Vec<Position>) {
        match self {
            Expr::Number(_) => {}
            Expr::Cell(pos) => out.push(*pos),
            Expr::Unary { operand, .. } => operand.collect_cells(out),
            Expr::Binary { left, right, .. } => {
                left.collect_cells(out);
                right.collect_cells(out);
            }
        }
    }

    fn write_operand(&self, f: &mut fmt::Formatter<'_>, parens: bool) -> fmt::Result {
        if parens {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

/// Read a referenced cell as a number.
fn cell_number(pos: Position, lookup: &dyn CellLookup) -> Result<f64, FormulaError> {
    if !pos.is_valid() {
        return Err(FormulaError::Ref);
    }
    match lookup.lookup_value(pos) {
        None => Ok(0.0),
        Some(Value::Number(n)) => Ok(n),
        Some(Value::Text(s)) if s.is_empty() => Ok(0.0),
        Some(Value::Text(s)) => match s.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(n),
            _ => Err(FormulaError::Value),
        },
        Some(Value::Error(e)) => Err(e),
    }
}

// Prints with the fewest parentheses that keep the tree shape.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Cell(pos) => write!(f, "{}", pos),
            Expr::Unary { op, operand } => {
                let sign = match op {
                    UnaryOp::Plus => '+',
                    UnaryOp::Minus => '-',
                };
                write!(f, "{}", sign)?;
                operand.write_operand(f, operand.precedence() < UNARY_PRECEDENCE)
            }
            Expr::Binary { op, left, right } => {
                let prec = op.precedence();
                left.write_operand(f, left.precedence() < prec)?;
                write!(f, "{}", op.symbol())?;
                let right_parens = right.precedence() < prec
                    || (right.precedence() == prec && matches!(op, BinaryOp::Sub | BinaryOp::Div));
                right.write_operand(f, right_parens)
            }
        }
    }
}
