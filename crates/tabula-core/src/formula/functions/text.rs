//! Text functions. Positions and lengths are in characters, not bytes;
//! `FIND` is case-sensitive, `SEARCH` folds case and honours wildcards.

use crate::error::ErrorKind;
use crate::formula::ast::Expr;
use crate::formula::criteria::wildcard_match;
use crate::formula::eval::Evaluator;
use crate::formula::functions::{def, FunctionDef, MANY, NONE};
use crate::numfmt::format_number;
use crate::value::{parse_number_text, to_text, CellValue};

pub(super) const DEFS: &[FunctionDef] = &[
    def("CHAR", 1, 1, NONE, char_),
    def("CLEAN", 1, 1, NONE, clean),
    def("CODE", 1, 1, NONE, code),
    def("CONCAT", 1, MANY, NONE, concat),
    def("CONCATENATE", 1, MANY, NONE, concatenate),
    def("DOLLAR", 1, 2, NONE, dollar),
    def("EXACT", 2, 2, NONE, exact),
    def("FIND", 2, 3, NONE, find),
    def("FIXED", 1, 3, NONE, fixed),
    def("LEFT", 1, 2, NONE, left),
    def("LEN", 1, 1, NONE, len),
    def("LOWER", 1, 1, NONE, lower),
    def("MID", 3, 3, NONE, mid),
    def("NUMBERVALUE", 1, 3, NONE, numbervalue),
    def("PROPER", 1, 1, NONE, proper),
    def("REPLACE", 4, 4, NONE, replace),
    def("REPT", 2, 2, NONE, rept),
    def("RIGHT", 1, 2, NONE, right),
    def("SEARCH", 2, 3, NONE, search),
    def("SUBSTITUTE", 3, 4, NONE, substitute),
    def("T", 1, 1, NONE, t_),
    def("TEXT", 2, 2, NONE, text_fn),
    def("TEXTAFTER", 2, 3, NONE, textafter),
    def("TEXTBEFORE", 2, 3, NONE, textbefore),
    def("TEXTJOIN", 3, MANY, NONE, textjoin),
    def("TRIM", 1, 1, NONE, trim),
    def("UNICHAR", 1, 1, NONE, unichar),
    def("UNICODE", 1, 1, NONE, unicode),
    def("UPPER", 1, 1, NONE, upper),
    def("VALUE", 1, 1, NONE, value_fn),
];

type R = Result<CellValue, ErrorKind>;

const MAX_TEXT_LEN: usize = 32_767;

fn char_(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.int(args, 0)?;
    if !(1..=255).contains(&n) {
        return Err(ErrorKind::Value);
    }
    let c = char::from_u32(n as u32).ok_or(ErrorKind::Value)?;
    Ok(CellValue::Text(c.to_string()))
}

fn unichar(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.int(args, 0)?;
    if n < 1 {
        return Err(ErrorKind::Value);
    }
    let c = char::from_u32(n as u32).ok_or(ErrorKind::Value)?;
    Ok(CellValue::Text(c.to_string()))
}

fn code(args: &[Expr], ctx: &mut Evaluator) -> R {
    let s = ctx.text(args, 0)?;
    let c = s.chars().next().ok_or(ErrorKind::Value)?;
    Ok(CellValue::Number(f64::from(c as u32)))
}

fn unicode(args: &[Expr], ctx: &mut Evaluator) -> R {
    code(args, ctx)
}

fn len(args: &[Expr], ctx: &mut Evaluator) -> R {
    let s = ctx.text(args, 0)?;
    Ok(CellValue::Number(s.chars().count() as f64))
}

fn lower(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Text(ctx.text(args, 0)?.to_lowercase()))
}

fn upper(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Text(ctx.text(args, 0)?.to_uppercase()))
}

fn proper(args: &[Expr], ctx: &mut Evaluator) -> R {
    let s = ctx.text(args, 0)?;
    let mut out = String::with_capacity(s.len());
    let mut word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(c);
            word_start = true;
        }
    }
    Ok(CellValue::Text(out))
}

/// TRIM collapses internal runs of spaces and strips the ends.
fn trim(args: &[Expr], ctx: &mut Evaluator) -> R {
    let s = ctx.text(args, 0)?;
    Ok(CellValue::Text(
        s.split(' ').filter(|p| !p.is_empty()).collect::<Vec<_>>().join(" "),
    ))
}

fn clean(args: &[Expr], ctx: &mut Evaluator) -> R {
    let s = ctx.text(args, 0)?;
    Ok(CellValue::Text(s.chars().filter(|&c| c as u32 >= 32).collect()))
}

fn left(args: &[Expr], ctx: &mut Evaluator) -> R {
    let s = ctx.text(args, 0)?;
    let n = ctx.num_or(args, 1, 1.0)?;
    if n < 0.0 {
        return Err(ErrorKind::Value);
    }
    Ok(CellValue::Text(s.chars().take(n as usize).collect()))
}

fn right(args: &[Expr], ctx: &mut Evaluator) -> R {
    let s = ctx.text(args, 0)?;
    let n = ctx.num_or(args, 1, 1.0)?;
    if n < 0.0 {
        return Err(ErrorKind::Value);
    }
    let chars: Vec<char> = s.chars().collect();
    let start = chars.len().saturating_sub(n as usize);
    Ok(CellValue::Text(chars[start..].iter().collect()))
}

fn mid(args: &[Expr], ctx: &mut Evaluator) -> R {
    let s = ctx.text(args, 0)?;
    let start = ctx.num(args, 1)?;
    let count = ctx.num(args, 2)?;
    if start < 1.0 || count < 0.0 {
        return Err(ErrorKind::Value);
    }
    Ok(CellValue::Text(
        s.chars().skip(start as usize - 1).take(count as usize).collect(),
    ))
}

fn concat(args: &[Expr], ctx: &mut Evaluator) -> R {
    let mut out = String::new();
    for v in ctx.flat_values(args) {
        if let CellValue::Error(e) = v {
            return Err(e);
        }
        out.push_str(&to_text(&v));
        if out.chars().count() > MAX_TEXT_LEN {
            return Err(ErrorKind::Value);
        }
    }
    Ok(CellValue::Text(out))
}

/// CONCATENATE takes scalars only; ranges are not flattened.
fn concatenate(args: &[Expr], ctx: &mut Evaluator) -> R {
    let mut out = String::new();
    for i in 0..args.len() {
        out.push_str(&ctx.text(args, i)?);
    }
    Ok(CellValue::Text(out))
}

fn textjoin(args: &[Expr], ctx: &mut Evaluator) -> R {
    let delimiter = ctx.text(args, 0)?;
    let ignore_empty = ctx.bool(args, 1)?;
    let mut parts = Vec::new();
    for v in ctx.flat_values(&args[2..]) {
        if let CellValue::Error(e) = v {
            return Err(e);
        }
        let s = to_text(&v);
        if ignore_empty && s.is_empty() {
            continue;
        }
        parts.push(s);
    }
    let joined = parts.join(&delimiter);
    if joined.chars().count() > MAX_TEXT_LEN {
        return Err(ErrorKind::Value);
    }
    Ok(CellValue::Text(joined))
}

fn exact(args: &[Expr], ctx: &mut Evaluator) -> R {
    let a = ctx.text(args, 0)?;
    let b = ctx.text(args, 1)?;
    Ok(CellValue::Bool(a == b))
}

/// Case-sensitive, no wildcards.
fn find(args: &[Expr], ctx: &mut Evaluator) -> R {
    let needle = ctx.text(args, 0)?;
    let haystack = ctx.text(args, 1)?;
    let start = ctx.num_or(args, 2, 1.0)?;
    find_position(&needle, &haystack, start, false).map(CellValue::Number)
}

/// Case-insensitive, `*`/`?` wildcards.
fn search(args: &[Expr], ctx: &mut Evaluator) -> R {
    let needle = ctx.text(args, 0)?.to_lowercase();
    let haystack = ctx.text(args, 1)?.to_lowercase();
    let start = ctx.num_or(args, 2, 1.0)?;
    find_position(&needle, &haystack, start, true).map(CellValue::Number)
}

fn find_position(
    needle: &str,
    haystack: &str,
    start: f64,
    wildcards: bool,
) -> Result<f64, ErrorKind> {
    let chars: Vec<char> = haystack.chars().collect();
    let start = start as usize;
    if start < 1 || start > chars.len() + 1 {
        return Err(ErrorKind::Value);
    }
    let from = start - 1;

    if wildcards && (needle.contains('*') || needle.contains('?')) {
        let pattern: Vec<char> = needle.chars().collect();
        for i in from..chars.len() {
            for end in i..=chars.len() {
                let window: String = chars[i..end].iter().collect();
                let pat: String = pattern.iter().collect();
                if wildcard_match(&window, &pat) {
                    return Ok(i as f64 + 1.0);
                }
            }
        }
        return Err(ErrorKind::Value);
    }

    let needle_chars: Vec<char> = needle.chars().collect();
    if needle_chars.is_empty() {
        return Ok(start as f64);
    }
    for i in from..chars.len() {
        if chars[i..].starts_with(&needle_chars) {
            return Ok(i as f64 + 1.0);
        }
    }
    Err(ErrorKind::Value)
}

fn replace(args: &[Expr], ctx: &mut Evaluator) -> R {
    let old = ctx.text(args, 0)?;
    let start = ctx.num(args, 1)?;
    let count = ctx.num(args, 2)?;
    let new = ctx.text(args, 3)?;
    if start < 1.0 || count < 0.0 {
        return Err(ErrorKind::Value);
    }
    let chars: Vec<char> = old.chars().collect();
    let start = (start as usize - 1).min(chars.len());
    let end = (start + count as usize).min(chars.len());
    let mut out: String = chars[..start].iter().collect();
    out.push_str(&new);
    out.extend(&chars[end..]);
    Ok(CellValue::Text(out))
}

fn substitute(args: &[Expr], ctx: &mut Evaluator) -> R {
    let text = ctx.text(args, 0)?;
    let old = ctx.text(args, 1)?;
    let new = ctx.text(args, 2)?;
    if old.is_empty() {
        return Ok(CellValue::Text(text));
    }
    if ctx.has_arg(args, 3) {
        let instance = ctx.int(args, 3)?;
        if instance < 1 {
            return Err(ErrorKind::Value);
        }
        let mut seen = 0;
        let mut result = String::with_capacity(text.len());
        let mut rest = text.as_str();
        while let Some(pos) = rest.find(&old) {
            seen += 1;
            if seen == instance {
                result.push_str(&rest[..pos]);
                result.push_str(&new);
                result.push_str(&rest[pos + old.len()..]);
                return Ok(CellValue::Text(result));
            }
            result.push_str(&rest[..pos + old.len()]);
            rest = &rest[pos + old.len()..];
        }
        Ok(CellValue::Text(text))
    } else {
        Ok(CellValue::Text(text.replace(&old, &new)))
    }
}

fn rept(args: &[Expr], ctx: &mut Evaluator) -> R {
    let text = ctx.text(args, 0)?;
    let count = ctx.num(args, 1)?;
    if count < 0.0 {
        return Err(ErrorKind::Value);
    }
    let count = count as usize;
    if text.chars().count() * count > MAX_TEXT_LEN {
        return Err(ErrorKind::Value);
    }
    Ok(CellValue::Text(text.repeat(count)))
}

fn t_(args: &[Expr], ctx: &mut Evaluator) -> R {
    match ctx.arg(args, 0) {
        CellValue::Text(s) => Ok(CellValue::Text(s)),
        CellValue::Error(e) => Err(e),
        _ => Ok(CellValue::Text(String::new())),
    }
}

fn value_fn(args: &[Expr], ctx: &mut Evaluator) -> R {
    let v = ctx.arg(args, 0);
    if let CellValue::Error(e) = v {
        return Err(e);
    }
    if v.is_numeric() {
        return Ok(CellValue::Number(crate::value::to_number(&v)?));
    }
    let s = to_text(&v);
    let trimmed = s.trim();
    if let Some(stripped) = trimmed.strip_suffix('%') {
        let n = parse_number_text(stripped).ok_or(ErrorKind::Value)?;
        return Ok(CellValue::Number(n / 100.0));
    }
    parse_number_text(trimmed)
        .map(CellValue::Number)
        .ok_or(ErrorKind::Value)
}

fn numbervalue(args: &[Expr], ctx: &mut Evaluator) -> R {
    let s = ctx.text(args, 0)?;
    let dec = ctx
        .text(args, 1)
        .ok()
        .filter(|_| ctx.has_arg(args, 1))
        .unwrap_or_else(|| ".".to_string());
    let group = ctx
        .text(args, 2)
        .ok()
        .filter(|_| ctx.has_arg(args, 2))
        .unwrap_or_else(|| ",".to_string());
    let dec = dec.chars().next().ok_or(ErrorKind::Value)?;
    let group_char = group.chars().next();

    let mut normalised = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_whitespace() {
            continue;
        }
        if Some(c) == group_char {
            continue;
        }
        if c == dec {
            normalised.push('.');
        } else {
            normalised.push(c);
        }
    }
    if let Some(stripped) = normalised.strip_suffix('%') {
        let n = parse_number_text(stripped).ok_or(ErrorKind::Value)?;
        return Ok(CellValue::Number(n / 100.0));
    }
    parse_number_text(&normalised)
        .map(CellValue::Number)
        .ok_or(ErrorKind::Value)
}

fn text_fn(args: &[Expr], ctx: &mut Evaluator) -> R {
    let v = ctx.arg(args, 0);
    if let CellValue::Error(e) = v {
        return Err(e);
    }
    let format = ctx.text(args, 1)?;
    match crate::value::to_number(&v) {
        Ok(n) => Ok(CellValue::Text(format_number(n, &format))),
        // Non-numeric input passes through as its text.
        Err(_) => Ok(CellValue::Text(to_text(&v))),
    }
}

fn fixed(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    let decimals = ctx.num_or(args, 1, 2.0)? as i32;
    let no_commas = ctx.bool_or(args, 2, false)?;
    let factor = 10f64.powi(decimals);
    let rounded = (n * factor).round() / factor;
    let formatted = if decimals > 0 {
        format!("{rounded:.prec$}", prec = decimals as usize)
    } else {
        format!("{}", rounded.trunc() as i64)
    };
    if no_commas {
        return Ok(CellValue::Text(formatted));
    }
    Ok(CellValue::Text(group_int_part(&formatted)))
}

fn dollar(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    let decimals = ctx.num_or(args, 1, 2.0)? as i32;
    let factor = 10f64.powi(decimals);
    let rounded = (n.abs() * factor).round() / factor;
    let body = if decimals > 0 {
        format!("{rounded:.prec$}", prec = decimals as usize)
    } else {
        format!("{}", rounded.trunc() as i64)
    };
    let grouped = group_int_part(&body);
    Ok(CellValue::Text(if n < 0.0 {
        format!("(${grouped})")
    } else {
        format!("${grouped}")
    }))
}

fn group_int_part(formatted: &str) -> String {
    let (sign, body) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (body, None),
    };
    let bytes = int_part.as_bytes();
    let mut grouped = String::new();
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*b as char);
    }
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

fn split_at_instance<'a>(
    text: &'a str,
    delimiter: &'a str,
    instance: i64,
) -> Option<(usize, &'a str)> {
    if delimiter.is_empty() || instance == 0 {
        return None;
    }
    let positions: Vec<usize> = text.match_indices(delimiter).map(|(i, _)| i).collect();
    let idx = if instance > 0 {
        (instance as usize).checked_sub(1)?
    } else {
        positions.len().checked_sub(instance.unsigned_abs() as usize)?
    };
    positions.get(idx).map(|&p| (p, delimiter))
}

fn textbefore(args: &[Expr], ctx: &mut Evaluator) -> R {
    let text = ctx.text(args, 0)?;
    let delimiter = ctx.text(args, 1)?;
    let instance = if ctx.has_arg(args, 2) {
        ctx.int(args, 2)?
    } else {
        1
    };
    match split_at_instance(&text, &delimiter, instance) {
        Some((pos, _)) => Ok(CellValue::Text(text[..pos].to_string())),
        None => Err(ErrorKind::Na),
    }
}

fn textafter(args: &[Expr], ctx: &mut Evaluator) -> R {
    let text = ctx.text(args, 0)?;
    let delimiter = ctx.text(args, 1)?;
    let instance = if ctx.has_arg(args, 2) {
        ctx.int(args, 2)?
    } else {
        1
    };
    match split_at_instance(&text, &delimiter, instance) {
        Some((pos, d)) => Ok(CellValue::Text(text[pos + d.len()..].to_string())),
        None => Err(ErrorKind::Na),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::eval::CellSnapshot;
    use crate::formula::parser::parse_formula;

    fn eval_str(snap: &CellSnapshot, formula: &str) -> CellValue {
        let expr = parse_formula(formula).unwrap();
        Evaluator::new(snap).eval(&expr)
    }

    fn text(snap: &CellSnapshot, formula: &str) -> String {
        match eval_str(snap, formula) {
            CellValue::Text(s) => s,
            other => panic!("{formula} gave {other:?}"),
        }
    }

    fn num(snap: &CellSnapshot, formula: &str) -> f64 {
        match eval_str(snap, formula) {
            CellValue::Number(n) => n,
            other => panic!("{formula} gave {other:?}"),
        }
    }

    #[test]
    fn test_char_and_code() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(text(&snap, "CHAR(65)"), "A");
        assert_eq!(num(&snap, "CODE(\"A\")"), 65.0);
        assert_eq!(text(&snap, "UNICHAR(960)"), "\u{3c0}");
        assert_eq!(num(&snap, "UNICODE(\"\u{3c0}\")"), 960.0);
    }

    #[test]
    fn test_case_functions() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(text(&snap, "UPPER(\"abc\")"), "ABC");
        assert_eq!(text(&snap, "LOWER(\"ABC\")"), "abc");
        assert_eq!(text(&snap, "PROPER(\"hello world\")"), "Hello World");
        assert_eq!(text(&snap, "PROPER(\"o'neil\")"), "O'Neil");
    }

    #[test]
    fn test_trim_collapses_runs() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(text(&snap, "TRIM(\"  a   b  \")"), "a b");
    }

    #[test]
    fn test_substring_functions() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(text(&snap, "LEFT(\"hello\",2)"), "he");
        assert_eq!(text(&snap, "LEFT(\"hello\")"), "h");
        assert_eq!(text(&snap, "RIGHT(\"hello\",3)"), "llo");
        assert_eq!(text(&snap, "MID(\"hello\",2,3)"), "ell");
        assert_eq!(num(&snap, "LEN(\"hello\")"), 5.0);
    }

    #[test]
    fn test_find_is_case_sensitive() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(num(&snap, "FIND(\"l\",\"hello\")"), 3.0);
        assert_eq!(num(&snap, "FIND(\"l\",\"hello\",4)"), 4.0);
        assert_eq!(
            eval_str(&snap, "FIND(\"L\",\"hello\")"),
            CellValue::Error(ErrorKind::Value)
        );
    }

    #[test]
    fn test_search_folds_case_and_wildcards() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(num(&snap, "SEARCH(\"L\",\"hello\")"), 3.0);
        assert_eq!(num(&snap, "SEARCH(\"w*d\",\"hello world\")"), 7.0);
        assert_eq!(num(&snap, "SEARCH(\"?or\",\"hello world\")"), 7.0);
        assert_eq!(
            eval_str(&snap, "SEARCH(\"zz\",\"hello\")"),
            CellValue::Error(ErrorKind::Value)
        );
    }

    #[test]
    fn test_replace_and_substitute() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(text(&snap, "REPLACE(\"abcdef\",2,3,\"X\")"), "aXef");
        assert_eq!(text(&snap, "SUBSTITUTE(\"a-b-c\",\"-\",\"+\")"), "a+b+c");
        assert_eq!(text(&snap, "SUBSTITUTE(\"a-b-c\",\"-\",\"+\",2)"), "a-b+c");
        assert_eq!(text(&snap, "SUBSTITUTE(\"a-b-c\",\"-\",\"+\",5)"), "a-b-c");
    }

    #[test]
    fn test_concat_variants() {
        let mut snap = CellSnapshot::new("Sheet1");
        snap.set_a1("A1", CellValue::Text("x".to_string()));
        snap.set_a1("A2", CellValue::Text("y".to_string()));
        assert_eq!(text(&snap, "CONCATENATE(\"a\",1,TRUE)"), "a1TRUE");
        assert_eq!(text(&snap, "CONCAT(A1:A2,\"!\")"), "xy!");
        assert_eq!(
            text(&snap, "TEXTJOIN(\",\",TRUE,A1:A3)"),
            "x,y"
        );
        assert_eq!(
            text(&snap, "TEXTJOIN(\",\",FALSE,A1:A3)"),
            "x,y,"
        );
    }

    #[test]
    fn test_rept_and_exact() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(text(&snap, "REPT(\"ab\",3)"), "ababab");
        assert_eq!(eval_str(&snap, "EXACT(\"a\",\"a\")"), CellValue::Bool(true));
        assert_eq!(eval_str(&snap, "EXACT(\"a\",\"A\")"), CellValue::Bool(false));
    }

    #[test]
    fn test_value_and_numbervalue() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(num(&snap, "VALUE(\"3.14\")"), 3.14);
        assert_eq!(num(&snap, "VALUE(\"50%\")"), 0.5);
        assert_eq!(
            eval_str(&snap, "VALUE(\"abc\")"),
            CellValue::Error(ErrorKind::Value)
        );
        assert_eq!(num(&snap, "NUMBERVALUE(\"1.234,56\",\",\",\".\")"), 1234.56);
    }

    #[test]
    fn test_text_function_formats() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(text(&snap, "TEXT(1234.567,\"#,##0.00\")"), "1,234.57");
        assert_eq!(text(&snap, "TEXT(0.25,\"0%\")"), "25%");
        assert_eq!(text(&snap, "TEXT(45292,\"yyyy-mm-dd\")"), "2024-01-01");
        assert_eq!(text(&snap, "TEXT(\"abc\",\"0\")"), "abc");
    }

    #[test]
    fn test_fixed_and_dollar() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(text(&snap, "FIXED(1234.567)"), "1,234.57");
        assert_eq!(text(&snap, "FIXED(1234.567,1,TRUE)"), "1234.6");
        assert_eq!(text(&snap, "DOLLAR(1234.567)"), "$1,234.57");
        assert_eq!(text(&snap, "DOLLAR(-1234.567)"), "($1,234.57)");
    }

    #[test]
    fn test_t_function() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(text(&snap, "T(\"abc\")"), "abc");
        assert_eq!(text(&snap, "T(42)"), "");
    }

    #[test]
    fn test_textbefore_after() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(text(&snap, "TEXTBEFORE(\"a-b-c\",\"-\")"), "a");
        assert_eq!(text(&snap, "TEXTBEFORE(\"a-b-c\",\"-\",2)"), "a-b");
        assert_eq!(text(&snap, "TEXTAFTER(\"a-b-c\",\"-\")"), "b-c");
        assert_eq!(text(&snap, "TEXTAFTER(\"a-b-c\",\"-\",-1)"), "c");
        assert_eq!(
            eval_str(&snap, "TEXTBEFORE(\"abc\",\"-\")"),
            CellValue::Error(ErrorKind::Na)
        );
    }

    #[test]
    fn test_clean() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(text(&snap, "CLEAN(\"a\"&CHAR(10)&\"b\")"), "ab");
    }
}
