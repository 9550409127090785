// Formula parser - converts formula source (without the leading '=') into an AST.
// Supports: numbers, cell refs (A1), unary +/-, binary + - * / and parentheses.

use super::FormulaParseError;
use super::ast::{BinaryOp, Expr, UnaryOp};
use crate::engine::Position;

/// Deepest parenthesis/unary nesting accepted before the parser gives up.
const MAX_NESTING: usize = 256;

/// Tallest expression tree accepted. Evaluation, printing and drop all
/// walk the tree recursively, so its height must stay bounded.
const MAX_HEIGHT: usize = 512;

/// An expression and the height of its tree.
type Node = (Expr, usize);

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Cell(Position),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

/// A token plus the byte offset it started at.
#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    offset: usize,
}

/// Parse formula source into an expression tree.
pub fn parse(source: &str) -> Result<Expr, FormulaParseError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(FormulaParseError::new("Empty formula", source.len()));
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
        end: source.len(),
    };
    let (expr, _) = parser.parse_expr()?;
    if let Some(extra) = parser.peek() {
        return Err(FormulaParseError::new(
            format!("Unexpected token {:?}", extra.token),
            extra.offset,
        ));
    }
    Ok(expr)
}

fn tokenize(input: &str) -> Result<Vec<Spanned>, FormulaParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        let simple = match c {
            ' ' | '\t' => {
                chars.next();
                continue;
            }
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            _ => None,
        };
        if let Some(token) = simple {
            chars.next();
            tokens.push(Spanned { token, offset });
            continue;
        }

        match c {
            '0'..='9' | '.' => {
                let mut num_str = String::new();
                while let Some(&(_, d)) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        num_str.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }

                // Exponent only if 'e' is followed by digits (optionally signed).
                if let Some(&(_, 'e' | 'E')) = chars.peek() {
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    let mut exponent = String::from("e");
                    if let Some(&(_, sign @ ('+' | '-'))) = lookahead.peek() {
                        exponent.push(sign);
                        lookahead.next();
                    }
                    if matches!(lookahead.peek(), Some(&(_, d)) if d.is_ascii_digit()) {
                        while let Some(&(_, d)) = lookahead.peek() {
                            if d.is_ascii_digit() {
                                exponent.push(d);
                                lookahead.next();
                            } else {
                                break;
                            }
                        }
                        num_str.push_str(&exponent);
                        chars = lookahead;
                    }
                }

                let num: f64 = num_str.parse().map_err(|_| {
                    FormulaParseError::new(format!("Invalid number: {}", num_str), offset)
                })?;
                if !num.is_finite() {
                    return Err(FormulaParseError::new(
                        format!("Number out of range: {}", num_str),
                        offset,
                    ));
                }
                tokens.push(Spanned {
                    token: Token::Number(num),
                    offset,
                });
            }
            'A'..='Z' | 'a'..='z' => {
                let mut ident = String::new();
                while let Some(&(_, ch)) = chars.peek() {
                    if ch.is_ascii_alphanumeric() {
                        ident.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let pos = Position::parse_a1(&ident).ok_or_else(|| {
                    FormulaParseError::new(format!("Invalid cell reference: {}", ident), offset)
                })?;
                tokens.push(Spanned {
                    token: Token::Cell(pos),
                    offset,
                });
            }
            _ => {
                return Err(FormulaParseError::new(
                    format!("Unexpected character: {}", c),
                    offset,
                ));
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    depth: usize,
    end: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Spanned> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Spanned> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn enter(&mut self, offset: usize) -> Result<(), FormulaParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(FormulaParseError::new("Formula nested too deeply", offset));
        }
        Ok(())
    }

    /// Join two operands, rejecting trees taller than `MAX_HEIGHT`.
    fn binary(
        &self,
        op: BinaryOp,
        left: Node,
        right: Node,
        offset: usize,
    ) -> Result<Node, FormulaParseError> {
        let height = left.1.max(right.1) + 1;
        if height > MAX_HEIGHT {
            return Err(FormulaParseError::new("Formula too long", offset));
        }
        let expr = Expr::Binary {
            op,
            left: Box::new(left.0),
            right: Box::new(right.0),
        };
        Ok((expr, height))
    }

    fn parse_expr(&mut self) -> Result<Node, FormulaParseError> {
        let mut left = self.parse_term()?;

        while let Some(tok) = self.peek() {
            let op = match tok.token {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_term()?;
            left = self.binary(op, left, right, tok.offset)?;
        }

        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Node, FormulaParseError> {
        let mut left = self.parse_unary()?;

        while let Some(tok) = self.peek() {
            let op = match tok.token {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = self.binary(op, left, right, tok.offset)?;
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Node, FormulaParseError> {
        let Some(tok) = self.peek() else {
            return self.parse_primary();
        };
        let op = match tok.token {
            Token::Plus => UnaryOp::Plus,
            Token::Minus => UnaryOp::Minus,
            _ => return self.parse_primary(),
        };
        self.pos += 1;
        self.enter(tok.offset)?;
        let (operand, height) = self.parse_unary()?;
        self.depth -= 1;
        let expr = Expr::Unary {
            op,
            operand: Box::new(operand),
        };
        Ok((expr, height + 1))
    }

    fn parse_primary(&mut self) -> Result<Node, FormulaParseError> {
        let Some(tok) = self.next() else {
            return Err(FormulaParseError::new("Unexpected end of formula", self.end));
        };

        match &tok.token {
            Token::Number(n) => Ok((Expr::Number(*n), 1)),
            Token::Cell(pos) => Ok((Expr::Cell(*pos), 1)),
            Token::LParen => {
                self.enter(tok.offset)?;
                let inner = self.parse_expr()?;
                self.depth -= 1;
                match self.next() {
                    Some(Spanned {
                        token: Token::RParen,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(FormulaParseError::new(
                        format!("Expected ')' but found {:?}", other.token),
                        other.offset,
                    )),
                    None => Err(FormulaParseError::new("Missing ')'", self.end)),
                }
            }
            other => Err(FormulaParseError::new(
                format!("Unexpected token {:?}", other),
                tok.offset,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Expr {
        Expr::Number(n)
    }

    #[test]
    fn test_parse_precedence() {
        let expr = parse("1+2*3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Add,
                left: Box::new(num(1.0)),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: Box::new(num(2.0)),
                    right: Box::new(num(3.0)),
                }),
            }
        );
    }

    #[test]
    fn test_parse_left_associative() {
        let expr = parse("8-2-1").unwrap();
        match expr {
            Expr::Binary { op, left, right } => {
                assert_eq!(op, BinaryOp::Sub);
                assert_eq!(*right, num(1.0));
                assert!(matches!(*left, Expr::Binary { op: BinaryOp::Sub, .. }));
            }
            other => panic!("Expected binary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_cells_and_numbers() {
        assert_eq!(parse("b2").unwrap(), Expr::Cell(Position::new(1, 1)));
        assert_eq!(parse(" 2.5e3 ").unwrap(), num(2500.0));
        assert_eq!(parse(".5").unwrap(), num(0.5));
        assert_eq!(parse("1E-2").unwrap(), num(0.01));
    }

    #[test]
    fn test_parse_unary() {
        assert_eq!(
            parse("-A1").unwrap(),
            Expr::Unary {
                op: UnaryOp::Minus,
                operand: Box::new(Expr::Cell(Position::new(0, 0))),
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("").is_err());
        assert!(parse("1+").is_err());
        assert!(parse("(1+2").is_err());
        assert!(parse("1+2)").is_err());
        assert!(parse("1 2").is_err());
        assert!(parse("A").is_err());
        assert!(parse("A1B").is_err());
        assert!(parse("1..2").is_err());
        assert!(parse("1 % 2").is_err());
        assert!(parse("*3").is_err());
    }

    #[test]
    fn test_parse_error_offset() {
        let err = parse("1 + $").unwrap_err();
        assert_eq!(err.offset, 4);
    }

    #[test]
    fn test_parse_rejects_excessive_nesting() {
        let deep = format!("{}1{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert!(parse(&deep).is_err());
        let fine = format!("{}1{}", "(".repeat(10), ")".repeat(10));
        assert_eq!(parse(&fine).unwrap(), num(1.0));
    }

    #[test]
    fn test_parse_rejects_overlong_operator_chains() {
        let sum = vec!["1"; 10_000].join("+");
        let err = parse(&sum).unwrap_err();
        assert_eq!(err.message, "Formula too long");

        let product = vec!["A1"; MAX_HEIGHT + 1].join("*");
        assert!(parse(&product).is_err());

        let at_limit = vec!["1"; MAX_HEIGHT].join("-");
        assert!(parse(&at_limit).is_ok());
    }

    #[test]
    fn test_parse_rejects_non_finite_literals() {
        let err = parse("1+1e999").unwrap_err();
        assert_eq!(err.offset, 2);
        assert!(err.message.starts_with("Number out of range"));
        assert!(parse("inf").is_err());
        assert_eq!(parse("1e308").unwrap(), num(1e308));
    }

    #[test]
    fn test_out_of_range_reference_still_parses() {
        assert!(matches!(parse("ZZZZ1").unwrap(), Expr::Cell(pos) if !pos.is_valid()));
    }
}
