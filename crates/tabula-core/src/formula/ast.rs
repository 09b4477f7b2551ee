//! AST types for parsed formulas, with canonical text serialisation.
//!
//! The tree keeps parenthesisation explicit, so serialising and re-parsing
//! an expression reproduces the same AST.

use std::fmt;

use crate::error::ErrorKind;
use crate::reference::Range;
use crate::value::number_to_text;

/// A parsed formula expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal (e.g., 42, 3.14, 1e6)
    Number(f64),
    /// String literal (e.g., "hello")
    Text(String),
    /// Boolean literal (TRUE/FALSE)
    Bool(bool),
    /// Error literal (#N/A, #VALUE!, ...)
    Error(ErrorKind),
    /// Cell or range reference, optionally sheet-qualified
    Reference(RefExpr),
    /// A defined name, resolved at evaluation time
    Name(String),
    /// Array literal: `{1,2;3,4}` (rows of columns)
    Array(Vec<Vec<Expr>>),
    /// Function call
    Call { name: String, args: Vec<Expr> },
    /// Binary operation
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Unary operation (prefix `+`/`-`, postfix `%`)
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// Parenthesised expression
    Paren(Box<Expr>),
    /// Reference union: `(A1:A3,C1:C3)`
    Union(Vec<Expr>),
    /// Reference intersection: `A1:B3 B2:C4`
    Intersection(Box<Expr>, Box<Expr>),
    /// An omitted argument slot, e.g. the middle of `OFFSET(A1,,1)`
    Empty,
}

/// A reference with an optional sheet qualifier. A single cell is the
/// degenerate range.
#[derive(Debug, Clone, PartialEq)]
pub struct RefExpr {
    pub sheet: Option<String>,
    pub range: Range,
}

impl RefExpr {
    /// True when the reference denotes a single cell.
    pub fn is_single(&self) -> bool {
        self.range.start == self.range.end
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// Division (/)
    Div,
    /// Exponentiation (^)
    Pow,
    /// Concatenation (&)
    Concat,
    /// Equal (=)
    Eq,
    /// Not equal (<>)
    Ne,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
}

impl BinaryOp {
    /// Operator spelling in formula text.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
            Self::Concat => "&",
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
    /// Positive (+)
    Pos,
    /// Percent (%) - postfix, divides by 100
    Percent,
}

/// Quote a sheet name when it needs it: whitespace or any of `!'[]`.
fn write_sheet(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    let needs_quotes = name
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '!' | '\'' | '[' | ']'));
    if needs_quotes {
        write!(f, "'{}'", name.replace('\'', "''"))
    } else {
        f.write_str(name)
    }
}

impl fmt::Display for RefExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref sheet) = self.sheet {
            write_sheet(f, sheet)?;
            f.write_str("!")?;
        }
        write!(f, "{}", self.range)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => f.write_str(&number_to_text(*n)),
            Expr::Text(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            Expr::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Expr::Error(e) => write!(f, "{e}"),
            Expr::Reference(r) => write!(f, "{r}"),
            Expr::Name(n) => f.write_str(n),
            Expr::Array(rows) => {
                f.write_str("{")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        f.write_str(";")?;
                    }
                    for (j, cell) in row.iter().enumerate() {
                        if j > 0 {
                            f.write_str(",")?;
                        }
                        write!(f, "{cell}")?;
                    }
                }
                f.write_str("}")
            }
            Expr::Call { name, args } => {
                f.write_str(name)?;
                f.write_str("(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Expr::Binary { op, lhs, rhs } => write!(f, "{lhs}{}{rhs}", op.symbol()),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Neg => write!(f, "-{operand}"),
                UnaryOp::Pos => write!(f, "+{operand}"),
                UnaryOp::Percent => write!(f, "{operand}%"),
            },
            Expr::Paren(inner) => write!(f, "({inner})"),
            Expr::Union(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{part}")?;
                }
                Ok(())
            }
            Expr::Intersection(a, b) => write!(f, "{a} {b}"),
            Expr::Empty => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::CellRef;

    fn cell(s: &str) -> Expr {
        Expr::Reference(RefExpr {
            sheet: None,
            range: Range::cell(CellRef::parse(s).unwrap()),
        })
    }

    #[test]
    fn test_display_literals() {
        assert_eq!(Expr::Number(42.0).to_string(), "42");
        assert_eq!(Expr::Number(3.14).to_string(), "3.14");
        assert_eq!(Expr::Text("a\"b".to_string()).to_string(), "\"a\"\"b\"");
        assert_eq!(Expr::Bool(true).to_string(), "TRUE");
        assert_eq!(Expr::Error(ErrorKind::Na).to_string(), "#N/A");
    }

    #[test]
    fn test_display_references() {
        assert_eq!(cell("A1").to_string(), "A1");
        let r = Expr::Reference(RefExpr {
            sheet: Some("Data".to_string()),
            range: Range::parse("A1:B2").unwrap(),
        });
        assert_eq!(r.to_string(), "Data!A1:B2");
    }

    #[test]
    fn test_display_quoted_sheet_names() {
        let r = Expr::Reference(RefExpr {
            sheet: Some("My Sheet".to_string()),
            range: Range::parse("A1").unwrap(),
        });
        assert_eq!(r.to_string(), "'My Sheet'!A1");

        let r = Expr::Reference(RefExpr {
            sheet: Some("It's".to_string()),
            range: Range::parse("A1").unwrap(),
        });
        assert_eq!(r.to_string(), "'It''s'!A1");
    }

    #[test]
    fn test_display_absolute_markers_survive() {
        let r = Expr::Reference(RefExpr {
            sheet: None,
            range: Range::parse("$A$1:B2").unwrap(),
        });
        assert_eq!(r.to_string(), "$A$1:B2");
    }

    #[test]
    fn test_display_call_and_operators() {
        let e = Expr::Call {
            name: "SUM".to_string(),
            args: vec![
                Expr::Reference(RefExpr {
                    sheet: None,
                    range: Range::parse("A1:A3").unwrap(),
                }),
                Expr::Number(2.0),
            ],
        };
        assert_eq!(e.to_string(), "SUM(A1:A3,2)");

        let b = Expr::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(Expr::Number(1.0)),
            rhs: Box::new(Expr::Paren(Box::new(Expr::Binary {
                op: BinaryOp::Mul,
                lhs: Box::new(Expr::Number(2.0)),
                rhs: Box::new(Expr::Number(3.0)),
            }))),
        };
        assert_eq!(b.to_string(), "1+(2*3)");
    }

    #[test]
    fn test_display_unary_and_percent() {
        let e = Expr::Unary {
            op: UnaryOp::Percent,
            operand: Box::new(Expr::Number(50.0)),
        };
        assert_eq!(e.to_string(), "50%");
        let e = Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(cell("A1")),
        };
        assert_eq!(e.to_string(), "-A1");
    }

    #[test]
    fn test_display_array() {
        let e = Expr::Array(vec![
            vec![Expr::Number(1.0), Expr::Number(2.0)],
            vec![Expr::Number(3.0), Expr::Number(4.0)],
        ]);
        assert_eq!(e.to_string(), "{1,2;3,4}");
    }

    #[test]
    fn test_display_union_and_intersection() {
        let u = Expr::Paren(Box::new(Expr::Union(vec![cell("A1"), cell("B2")])));
        assert_eq!(u.to_string(), "(A1,B2)");
        let i = Expr::Intersection(Box::new(cell("A1")), Box::new(cell("B2")));
        assert_eq!(i.to_string(), "A1 B2");
    }
}
