//! Formula tokenizer.
//!
//! Produces a positioned token stream from formula text (without the
//! leading `=`). nom combinators lex the individual literals; a scan loop
//! stitches them together. Whitespace is kept as a token of its own: the
//! parser discards it everywhere except between two references, where it is
//! the intersection operator.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::char,
    combinator::{opt, recognize},
    sequence::{pair, preceded, tuple},
    IResult,
};

use crate::error::{Error, ErrorKind, Result};
use crate::reference::CellRef;

/// A token with its byte offset in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: usize,
}

/// Token kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Numeric literal, scientific notation included.
    Number(f64),
    /// Double-quoted string; `""` escapes a quote.
    Text(String),
    /// TRUE / FALSE (case-insensitive).
    Bool(bool),
    /// `#DIV/0!` and friends.
    ErrorLit(ErrorKind),
    /// A name that is not a reference and not followed by `(`.
    Ident(String),
    /// A name immediately followed by `(`.
    FuncName(String),
    /// A1-style cell reference with absolute markers.
    Ref(CellRef),
    /// Sheet qualifier before `!` (quotes already stripped).
    SheetName(String),
    Bang,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
    Colon,
    Percent,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Amp,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// A run of whitespace. Significant only between two references.
    Whitespace,
}

/// Tokenize a formula body. The input must not include the leading `=`.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = input;
    let mut pos = 0usize;

    while !rest.is_empty() {
        let (consumed, kind) = scan_token(rest).map_err(|detail| Error::FormulaParse {
            position: pos,
            detail,
        })?;
        tokens.push(Token { kind, pos });
        pos += consumed;
        rest = &rest[consumed..];
    }
    Ok(tokens)
}

/// Scan one token at the head of `input`, returning the bytes consumed.
fn scan_token(input: &str) -> std::result::Result<(usize, TokenKind), String> {
    let bytes = input.as_bytes();
    let first = bytes[0];

    if first.is_ascii_whitespace() {
        let len = bytes
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        return Ok((len, TokenKind::Whitespace));
    }

    // Fixed two-character operators before their one-character prefixes.
    for (text, kind) in [
        ("<>", TokenKind::Ne),
        ("<=", TokenKind::Le),
        (">=", TokenKind::Ge),
    ] {
        if input.starts_with(text) {
            return Ok((2, kind));
        }
    }
    let single = match first {
        b'(' => Some(TokenKind::LParen),
        b')' => Some(TokenKind::RParen),
        b'{' => Some(TokenKind::LBrace),
        b'}' => Some(TokenKind::RBrace),
        b',' => Some(TokenKind::Comma),
        b';' => Some(TokenKind::Semicolon),
        b':' => Some(TokenKind::Colon),
        b'%' => Some(TokenKind::Percent),
        b'+' => Some(TokenKind::Plus),
        b'-' => Some(TokenKind::Minus),
        b'*' => Some(TokenKind::Star),
        b'/' => Some(TokenKind::Slash),
        b'^' => Some(TokenKind::Caret),
        b'&' => Some(TokenKind::Amp),
        b'=' => Some(TokenKind::Eq),
        b'<' => Some(TokenKind::Lt),
        b'>' => Some(TokenKind::Gt),
        b'!' => Some(TokenKind::Bang),
        _ => None,
    };
    if let Some(kind) = single {
        return Ok((1, kind));
    }

    if first == b'"' {
        return lex_string(input);
    }
    if first == b'\'' {
        return lex_quoted_sheet(input);
    }
    if first == b'#' {
        return lex_error_literal(input);
    }
    if first.is_ascii_digit() || (first == b'.' && bytes.get(1).is_some_and(u8::is_ascii_digit)) {
        return lex_number(input);
    }
    if first == b'$' || first.is_ascii_alphabetic() || first == b'_' {
        return lex_name_or_ref(input);
    }

    Err(format!("unexpected character '{}'", input.chars().next().unwrap_or('?')))
}

fn lex_number(input: &str) -> std::result::Result<(usize, TokenKind), String> {
    let result: IResult<&str, &str> = recognize(tuple((
        alt((
            recognize(pair(
                take_while1(|c: char| c.is_ascii_digit()),
                opt(pair(char('.'), opt(take_while1(|c: char| c.is_ascii_digit())))),
            )),
            recognize(preceded(char('.'), take_while1(|c: char| c.is_ascii_digit()))),
        )),
        opt(recognize(tuple((
            alt((char('e'), char('E'))),
            opt(alt((char('+'), char('-')))),
            take_while1(|c: char| c.is_ascii_digit()),
        )))),
    )))(input);

    match result {
        Ok((_, text)) => {
            let n: f64 = text
                .parse()
                .map_err(|_| format!("invalid number '{text}'"))?;
            Ok((text.len(), TokenKind::Number(n)))
        }
        Err(_) => Err("invalid number".to_string()),
    }
}

fn lex_string(input: &str) -> std::result::Result<(usize, TokenKind), String> {
    debug_assert!(input.starts_with('"'));
    let mut out = String::new();
    let mut chars = input[1..].char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '"' {
            if input[1 + i + 1..].starts_with('"') {
                out.push('"');
                chars.next();
            } else {
                return Ok((1 + i + 1, TokenKind::Text(out)));
            }
        } else {
            out.push(c);
        }
    }
    Err("unterminated string literal".to_string())
}

fn lex_quoted_sheet(input: &str) -> std::result::Result<(usize, TokenKind), String> {
    debug_assert!(input.starts_with('\''));
    let mut out = String::new();
    let mut chars = input[1..].char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '\'' {
            if input[1 + i + 1..].starts_with('\'') {
                out.push('\'');
                chars.next();
            } else {
                let end = 1 + i + 1;
                if !input[end..].starts_with('!') {
                    return Err("quoted sheet name must be followed by '!'".to_string());
                }
                return Ok((end, TokenKind::SheetName(out)));
            }
        } else {
            out.push(c);
        }
    }
    Err("unterminated sheet name".to_string())
}

fn lex_error_literal(input: &str) -> std::result::Result<(usize, TokenKind), String> {
    let lex = |name: &'static str| -> IResult<&str, &str> { tag(name)(input) };
    // Longest names first so #N/A does not shadow #NAME?.
    for name in [
        "#GETTING_DATA",
        "#DIV/0!",
        "#VALUE!",
        "#SPILL!",
        "#NULL!",
        "#NAME?",
        "#CALC!",
        "#NUM!",
        "#REF!",
        "#N/A",
    ] {
        if lex(name).is_ok() {
            let kind = ErrorKind::parse(name).expect("literal list matches the error set");
            return Ok((name.len(), TokenKind::ErrorLit(kind)));
        }
    }
    Err("unrecognised error literal".to_string())
}

/// Lex a `$`-or-letter-led chunk: a cell reference, a sheet qualifier, a
/// function name, a boolean, or a plain identifier.
fn lex_name_or_ref(input: &str) -> std::result::Result<(usize, TokenKind), String> {
    let bytes = input.as_bytes();

    // Try the reference shape first: [$] letters{1..3} [$] digits+
    if let Some((reference, len)) = try_ref(input) {
        match bytes.get(len) {
            // followed by '!': this is a sheet named like a reference
            Some(b'!') => {}
            // followed by '(': a function named like a reference (LOG10)
            Some(b'(') => {}
            Some(b) if b.is_ascii_alphanumeric() || *b == b'_' || *b == b'.' => {}
            _ => return Ok((len, TokenKind::Ref(reference))),
        }
    }
    if bytes[0] == b'$' {
        return Err("'$' outside a cell reference".to_string());
    }

    // Identifier: letters, digits, underscores, dots (e.g. NORM.DIST,
    // _xlfn.CONCAT).
    let len = bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_' || **b == b'.')
        .count();
    let name = &input[..len];

    match bytes.get(len) {
        Some(b'!') => Ok((len, TokenKind::SheetName(name.to_string()))),
        Some(b'(') => Ok((len, TokenKind::FuncName(name.to_ascii_uppercase()))),
        _ => {
            if name.eq_ignore_ascii_case("TRUE") {
                Ok((len, TokenKind::Bool(true)))
            } else if name.eq_ignore_ascii_case("FALSE") {
                Ok((len, TokenKind::Bool(false)))
            } else {
                Ok((len, TokenKind::Ident(name.to_string())))
            }
        }
    }
}

/// Match the reference shape at the head of the input.
fn try_ref(input: &str) -> Option<(CellRef, usize)> {
    let bytes = input.as_bytes();
    let mut i = 0;
    let abs_col = bytes.first() == Some(&b'$');
    if abs_col {
        i += 1;
    }
    let col_start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }
    if !(1..=3).contains(&(i - col_start)) {
        return None;
    }
    let col_text = &input[col_start..i];
    let abs_row = bytes.get(i) == Some(&b'$');
    if abs_row {
        i += 1;
    }
    let row_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if row_start == i {
        return None;
    }

    let col = crate::reference::column_index(col_text).ok()?;
    let row: u32 = input[row_start..i].parse().ok()?;
    if !(1..=crate::utils::constants::MAX_ROWS).contains(&row) {
        return None;
    }
    Some((
        CellRef {
            col,
            row,
            abs_col,
            abs_row,
        },
        i,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("42"), vec![TokenKind::Number(42.0)]);
        assert_eq!(kinds("3.14"), vec![TokenKind::Number(3.14)]);
        assert_eq!(kinds(".5"), vec![TokenKind::Number(0.5)]);
        assert_eq!(kinds("1e3"), vec![TokenKind::Number(1000.0)]);
        assert_eq!(kinds("2.5E-2"), vec![TokenKind::Number(0.025)]);
    }

    #[test]
    fn test_leading_sign_is_an_operator() {
        assert_eq!(
            kinds("-5"),
            vec![TokenKind::Minus, TokenKind::Number(5.0)]
        );
        assert_eq!(kinds("+5"), vec![TokenKind::Plus, TokenKind::Number(5.0)]);
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            kinds("\"hello\""),
            vec![TokenKind::Text("hello".to_string())]
        );
        assert_eq!(kinds("\"\""), vec![TokenKind::Text(String::new())]);
        assert_eq!(
            kinds("\"a\"\"b\""),
            vec![TokenKind::Text("a\"b".to_string())]
        );
    }

    #[test]
    fn test_unterminated_string_fails() {
        assert!(tokenize("\"oops").is_err());
    }

    #[test]
    fn test_booleans() {
        assert_eq!(kinds("TRUE"), vec![TokenKind::Bool(true)]);
        assert_eq!(kinds("false"), vec![TokenKind::Bool(false)]);
        // TRUE() is the function, not the literal.
        assert_eq!(
            kinds("TRUE()"),
            vec![
                TokenKind::FuncName("TRUE".to_string()),
                TokenKind::LParen,
                TokenKind::RParen
            ]
        );
    }

    #[test]
    fn test_error_literals() {
        assert_eq!(kinds("#N/A"), vec![TokenKind::ErrorLit(ErrorKind::Na)]);
        assert_eq!(kinds("#NAME?"), vec![TokenKind::ErrorLit(ErrorKind::Name)]);
        assert_eq!(
            kinds("#DIV/0!"),
            vec![TokenKind::ErrorLit(ErrorKind::Div0)]
        );
        assert_eq!(
            kinds("#GETTING_DATA"),
            vec![TokenKind::ErrorLit(ErrorKind::GettingData)]
        );
        assert!(tokenize("#WAT!").is_err());
    }

    #[test]
    fn test_refs() {
        let r = CellRef::parse("A1").unwrap();
        assert_eq!(kinds("A1"), vec![TokenKind::Ref(r)]);
        let r = CellRef::parse("$AB$100").unwrap();
        assert_eq!(kinds("$AB$100"), vec![TokenKind::Ref(r)]);
        assert_eq!(
            kinds("a1"),
            vec![TokenKind::Ref(CellRef::parse("A1").unwrap())]
        );
    }

    #[test]
    fn test_range_tokens() {
        assert_eq!(
            kinds("A1:B2"),
            vec![
                TokenKind::Ref(CellRef::parse("A1").unwrap()),
                TokenKind::Colon,
                TokenKind::Ref(CellRef::parse("B2").unwrap()),
            ]
        );
    }

    #[test]
    fn test_function_vs_ref_ambiguity() {
        // LOG10 names a valid column but followed by '(' it is a function.
        assert_eq!(
            kinds("LOG10(1)"),
            vec![
                TokenKind::FuncName("LOG10".to_string()),
                TokenKind::LParen,
                TokenKind::Number(1.0),
                TokenKind::RParen,
            ]
        );
        assert_eq!(
            kinds("LOG10"),
            vec![TokenKind::Ref(CellRef::parse("LOG10").unwrap())]
        );
    }

    #[test]
    fn test_out_of_grid_ref_is_an_ident() {
        // XFE1 exceeds the column bound, so it lexes as a name.
        assert_eq!(kinds("XFE1"), vec![TokenKind::Ident("XFE1".to_string())]);
    }

    #[test]
    fn test_sheet_qualifiers() {
        assert_eq!(
            kinds("Sheet1!A1"),
            vec![
                TokenKind::SheetName("Sheet1".to_string()),
                TokenKind::Bang,
                TokenKind::Ref(CellRef::parse("A1").unwrap()),
            ]
        );
        assert_eq!(
            kinds("'My Sheet'!A1:B2"),
            vec![
                TokenKind::SheetName("My Sheet".to_string()),
                TokenKind::Bang,
                TokenKind::Ref(CellRef::parse("A1").unwrap()),
                TokenKind::Colon,
                TokenKind::Ref(CellRef::parse("B2").unwrap()),
            ]
        );
        assert_eq!(
            kinds("'It''s'!A1"),
            vec![
                TokenKind::SheetName("It's".to_string()),
                TokenKind::Bang,
                TokenKind::Ref(CellRef::parse("A1").unwrap()),
            ]
        );
    }

    #[test]
    fn test_operators_and_punctuation() {
        assert_eq!(
            kinds("1<=2"),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Le,
                TokenKind::Number(2.0)
            ]
        );
        assert_eq!(
            kinds("1<>2"),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Ne,
                TokenKind::Number(2.0)
            ]
        );
        assert_eq!(
            kinds("{1,2;3}"),
            vec![
                TokenKind::LBrace,
                TokenKind::Number(1.0),
                TokenKind::Comma,
                TokenKind::Number(2.0),
                TokenKind::Semicolon,
                TokenKind::Number(3.0),
                TokenKind::RBrace,
            ]
        );
        assert_eq!(
            kinds("50%"),
            vec![TokenKind::Number(50.0), TokenKind::Percent]
        );
    }

    #[test]
    fn test_whitespace_tokens_kept() {
        assert_eq!(
            kinds("A1 B2"),
            vec![
                TokenKind::Ref(CellRef::parse("A1").unwrap()),
                TokenKind::Whitespace,
                TokenKind::Ref(CellRef::parse("B2").unwrap()),
            ]
        );
    }

    #[test]
    fn test_idents_with_dots() {
        assert_eq!(
            kinds("NORM.DIST(0,0,1,TRUE)")[0],
            TokenKind::FuncName("NORM.DIST".to_string())
        );
        assert_eq!(kinds("MyName"), vec![TokenKind::Ident("MyName".to_string())]);
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("1 + A2").unwrap();
        assert_eq!(tokens[0].pos, 0);
        assert_eq!(tokens[1].pos, 1); // whitespace
        assert_eq!(tokens[2].pos, 2); // +
        assert_eq!(tokens[4].pos, 4); // A2
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("1 @ 2").unwrap_err();
        match err {
            Error::FormulaParse { position, .. } => assert_eq!(position, 2),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
