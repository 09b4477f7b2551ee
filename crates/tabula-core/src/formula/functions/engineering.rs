//! Engineering functions: positional base conversions with two's-complement
//! negatives, bitwise operations in the 2^48 integer domain, error
//! functions, and complex arithmetic over `"a+bi"` strings.

use num_complex::Complex64;
use statrs::function::erf as erf_fn;

use crate::error::ErrorKind;
use crate::formula::ast::Expr;
use crate::formula::eval::Evaluator;
use crate::formula::functions::{def, FunctionDef, MANY, NONE};
use crate::utils::constants::INTEGER_DOMAIN_LIMIT;
use crate::value::{number_to_text, to_text, CellValue};

pub(super) const DEFS: &[FunctionDef] = &[
    def("BIN2DEC", 1, 1, NONE, bin2dec),
    def("BIN2HEX", 1, 2, NONE, bin2hex),
    def("BIN2OCT", 1, 2, NONE, bin2oct),
    def("BITAND", 2, 2, NONE, bitand),
    def("BITLSHIFT", 2, 2, NONE, bitlshift),
    def("BITOR", 2, 2, NONE, bitor),
    def("BITRSHIFT", 2, 2, NONE, bitrshift),
    def("BITXOR", 2, 2, NONE, bitxor),
    def("COMPLEX", 2, 3, NONE, complex),
    def("CONVERT", 3, 3, NONE, convert),
    def("DEC2BIN", 1, 2, NONE, dec2bin),
    def("DEC2HEX", 1, 2, NONE, dec2hex),
    def("DEC2OCT", 1, 2, NONE, dec2oct),
    def("DELTA", 1, 2, NONE, delta),
    def("ERF", 1, 2, NONE, erf),
    def("ERF.PRECISE", 1, 1, NONE, erf),
    def("ERFC", 1, 1, NONE, erfc),
    def("ERFC.PRECISE", 1, 1, NONE, erfc),
    def("GESTEP", 1, 2, NONE, gestep),
    def("HEX2BIN", 1, 2, NONE, hex2bin),
    def("HEX2DEC", 1, 1, NONE, hex2dec),
    def("HEX2OCT", 1, 2, NONE, hex2oct),
    def("IMABS", 1, 1, NONE, imabs),
    def("IMAGINARY", 1, 1, NONE, imaginary),
    def("IMARGUMENT", 1, 1, NONE, imargument),
    def("IMCONJUGATE", 1, 1, NONE, imconjugate),
    def("IMCOS", 1, 1, NONE, imcos),
    def("IMDIV", 2, 2, NONE, imdiv),
    def("IMEXP", 1, 1, NONE, imexp),
    def("IMLN", 1, 1, NONE, imln),
    def("IMLOG10", 1, 1, NONE, imlog10),
    def("IMLOG2", 1, 1, NONE, imlog2),
    def("IMPOWER", 2, 2, NONE, impower),
    def("IMPRODUCT", 1, MANY, NONE, improduct),
    def("IMREAL", 1, 1, NONE, imreal),
    def("IMSIN", 1, 1, NONE, imsin),
    def("IMSQRT", 1, 1, NONE, imsqrt),
    def("IMSUB", 2, 2, NONE, imsub),
    def("IMSUM", 1, MANY, NONE, imsum),
    def("IMTAN", 1, 1, NONE, imtan),
    def("OCT2BIN", 1, 2, NONE, oct2bin),
    def("OCT2DEC", 1, 1, NONE, oct2dec),
    def("OCT2HEX", 1, 2, NONE, oct2hex),
];

type R = Result<CellValue, ErrorKind>;

// -- Positional bases ------------------------------------------------------

/// Parse a base-`radix` string of at most 10 digits; a full-width value
/// with the high bit set is a two's-complement negative over `bits` bits.
fn parse_base(ctx: &mut Evaluator, args: &[Expr], radix: u32, bits: u32) -> Result<i64, ErrorKind> {
    let v = ctx.arg(args, 0);
    if let CellValue::Error(e) = v {
        return Err(e);
    }
    let text = match &v {
        CellValue::Number(n) | CellValue::Date(n) => {
            if n.fract() != 0.0 || *n < 0.0 {
                return Err(ErrorKind::Num);
            }
            number_to_text(*n)
        }
        CellValue::Empty => "0".to_string(),
        other => to_text(other),
    };
    let text = text.trim();
    if text.is_empty() || text.len() > 10 {
        return Err(ErrorKind::Num);
    }
    let mut value: i64 = 0;
    for c in text.chars() {
        let digit = c.to_digit(radix).ok_or(ErrorKind::Num)? as i64;
        value = value * i64::from(radix) + digit;
    }
    if text.len() == 10 && value >= (1i64 << (bits - 1)) {
        value -= 1i64 << bits;
    }
    Ok(value)
}

/// Format in base `radix`: negatives render as 10-digit two's complement
/// over `bits` bits; `places` zero-pads non-negative results.
fn format_base(
    value: i64,
    radix: u32,
    bits: u32,
    places: Option<i64>,
) -> Result<String, ErrorKind> {
    let min = -(1i64 << (bits - 1));
    let max = (1i64 << (bits - 1)) - 1;
    if value < min || value > max {
        return Err(ErrorKind::Num);
    }
    let unsigned = if value < 0 {
        (value + (1i64 << bits)) as u64
    } else {
        value as u64
    };
    let mut digits = Vec::new();
    let mut n = unsigned;
    loop {
        let d = (n % u64::from(radix)) as u32;
        digits.push(char::from_digit(d, radix).expect("digit in radix").to_ascii_uppercase());
        n /= u64::from(radix);
        if n == 0 {
            break;
        }
    }
    if value < 0 {
        while digits.len() < 10 {
            digits.push('0');
        }
    } else if let Some(p) = places {
        if p < 0 || p > 10 || (p as usize) < digits.len() {
            return Err(ErrorKind::Num);
        }
        while digits.len() < p as usize {
            digits.push('0');
        }
    }
    digits.reverse();
    Ok(digits.into_iter().collect())
}

fn places_arg(ctx: &mut Evaluator, args: &[Expr]) -> Result<Option<i64>, ErrorKind> {
    if ctx.has_arg(args, 1) {
        Ok(Some(ctx.int(args, 1)?))
    } else {
        Ok(None)
    }
}

fn bin2dec(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Number(parse_base(ctx, args, 2, 10)? as f64))
}

fn oct2dec(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Number(parse_base(ctx, args, 8, 30)? as f64))
}

fn hex2dec(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Number(parse_base(ctx, args, 16, 40)? as f64))
}

fn dec_arg(ctx: &mut Evaluator, args: &[Expr]) -> Result<i64, ErrorKind> {
    Ok(ctx.num(args, 0)?.trunc() as i64)
}

fn dec2bin(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = dec_arg(ctx, args)?;
    let places = places_arg(ctx, args)?;
    Ok(CellValue::Text(format_base(n, 2, 10, places)?))
}

fn dec2oct(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = dec_arg(ctx, args)?;
    let places = places_arg(ctx, args)?;
    Ok(CellValue::Text(format_base(n, 8, 30, places)?))
}

fn dec2hex(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = dec_arg(ctx, args)?;
    let places = places_arg(ctx, args)?;
    Ok(CellValue::Text(format_base(n, 16, 40, places)?))
}

fn bin2oct(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = parse_base(ctx, args, 2, 10)?;
    let places = places_arg(ctx, args)?;
    Ok(CellValue::Text(format_base(n, 8, 30, places)?))
}

fn bin2hex(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = parse_base(ctx, args, 2, 10)?;
    let places = places_arg(ctx, args)?;
    Ok(CellValue::Text(format_base(n, 16, 40, places)?))
}

fn oct2bin(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = parse_base(ctx, args, 8, 30)?;
    let places = places_arg(ctx, args)?;
    Ok(CellValue::Text(format_base(n, 2, 10, places)?))
}

fn oct2hex(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = parse_base(ctx, args, 8, 30)?;
    let places = places_arg(ctx, args)?;
    Ok(CellValue::Text(format_base(n, 16, 40, places)?))
}

fn hex2bin(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = parse_base(ctx, args, 16, 40)?;
    let places = places_arg(ctx, args)?;
    Ok(CellValue::Text(format_base(n, 2, 10, places)?))
}

fn hex2oct(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = parse_base(ctx, args, 16, 40)?;
    let places = places_arg(ctx, args)?;
    Ok(CellValue::Text(format_base(n, 8, 30, places)?))
}

// -- Bitwise ---------------------------------------------------------------

fn bit_operand(ctx: &mut Evaluator, args: &[Expr], i: usize) -> Result<u64, ErrorKind> {
    let n = ctx.num(args, i)?;
    if n < 0.0 || n.fract() != 0.0 || n > INTEGER_DOMAIN_LIMIT {
        return Err(ErrorKind::Num);
    }
    Ok(n as u64)
}

fn bitand(args: &[Expr], ctx: &mut Evaluator) -> R {
    let a = bit_operand(ctx, args, 0)?;
    let b = bit_operand(ctx, args, 1)?;
    Ok(CellValue::Number((a & b) as f64))
}

fn bitor(args: &[Expr], ctx: &mut Evaluator) -> R {
    let a = bit_operand(ctx, args, 0)?;
    let b = bit_operand(ctx, args, 1)?;
    Ok(CellValue::Number((a | b) as f64))
}

fn bitxor(args: &[Expr], ctx: &mut Evaluator) -> R {
    let a = bit_operand(ctx, args, 0)?;
    let b = bit_operand(ctx, args, 1)?;
    Ok(CellValue::Number((a ^ b) as f64))
}

fn shift(args: &[Expr], ctx: &mut Evaluator, left: bool) -> R {
    let n = bit_operand(ctx, args, 0)?;
    let amount = ctx.int(args, 1)?;
    if amount.abs() > 53 {
        return Err(ErrorKind::Num);
    }
    let shift_left = (amount >= 0) == left;
    let magnitude = amount.unsigned_abs() as u32;
    let result = if shift_left {
        n.checked_shl(magnitude).ok_or(ErrorKind::Num)?
    } else {
        n.checked_shr(magnitude).unwrap_or(0)
    };
    if result as f64 > INTEGER_DOMAIN_LIMIT {
        return Err(ErrorKind::Num);
    }
    Ok(CellValue::Number(result as f64))
}

fn bitlshift(args: &[Expr], ctx: &mut Evaluator) -> R {
    shift(args, ctx, true)
}

fn bitrshift(args: &[Expr], ctx: &mut Evaluator) -> R {
    shift(args, ctx, false)
}

// -- Steps and error functions ---------------------------------------------

fn delta(args: &[Expr], ctx: &mut Evaluator) -> R {
    let a = ctx.num(args, 0)?;
    let b = ctx.num_or(args, 1, 0.0)?;
    Ok(CellValue::Number(if a == b { 1.0 } else { 0.0 }))
}

fn gestep(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    let step = ctx.num_or(args, 1, 0.0)?;
    Ok(CellValue::Number(if n >= step { 1.0 } else { 0.0 }))
}

fn erf(args: &[Expr], ctx: &mut Evaluator) -> R {
    let lower = ctx.num(args, 0)?;
    if ctx.has_arg(args, 1) {
        let upper = ctx.num(args, 1)?;
        Ok(CellValue::Number(erf_fn::erf(upper) - erf_fn::erf(lower)))
    } else {
        Ok(CellValue::Number(erf_fn::erf(lower)))
    }
}

fn erfc(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Number(erf_fn::erfc(ctx.num(args, 0)?)))
}

// -- Complex numbers -------------------------------------------------------

/// Parse an `"a+bi"` string (suffix `i` or `j`). Bare reals and bare
/// imaginaries are accepted.
fn parse_complex(value: &CellValue) -> Result<(Complex64, char), ErrorKind> {
    let text = match value {
        CellValue::Number(n) | CellValue::Date(n) => return Ok((Complex64::new(*n, 0.0), 'i')),
        CellValue::Empty => return Ok((Complex64::new(0.0, 0.0), 'i')),
        CellValue::Error(e) => return Err(*e),
        other => to_text(other),
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok((Complex64::new(0.0, 0.0), 'i'));
    }
    let suffix = match trimmed.chars().last() {
        Some('i') => 'i',
        Some('j') => 'j',
        _ => {
            let real: f64 = trimmed.parse().map_err(|_| ErrorKind::Num)?;
            return Ok((Complex64::new(real, 0.0), 'i'));
        }
    };
    let body = &trimmed[..trimmed.len() - 1];

    // Split the imaginary coefficient off at the last interior +/- that is
    // not an exponent sign.
    let chars: Vec<char> = body.chars().collect();
    let mut split = None;
    for idx in (1..chars.len()).rev() {
        let c = chars[idx];
        if (c == '+' || c == '-') && !matches!(chars[idx - 1], 'e' | 'E') {
            split = Some(idx);
            break;
        }
    }
    let (real, imag) = match split {
        Some(idx) => {
            let re: String = chars[..idx].iter().collect();
            let im: String = chars[idx..].iter().collect();
            let re: f64 = re.parse().map_err(|_| ErrorKind::Num)?;
            let im = match im.as_str() {
                "+" => 1.0,
                "-" => -1.0,
                s => s.parse().map_err(|_| ErrorKind::Num)?,
            };
            (re, im)
        }
        None => {
            let im = match body {
                "" => 1.0,
                "-" => -1.0,
                "+" => 1.0,
                s => s.parse().map_err(|_| ErrorKind::Num)?,
            };
            (0.0, im)
        }
    };
    Ok((Complex64::new(real, imag), suffix))
}

fn format_complex(z: Complex64, suffix: char) -> String {
    let re = z.re;
    let im = z.im;
    if im == 0.0 {
        return number_to_text(re);
    }
    let imag_part = if im == 1.0 {
        suffix.to_string()
    } else if im == -1.0 {
        format!("-{suffix}")
    } else {
        format!("{}{suffix}", number_to_text(im))
    };
    if re == 0.0 {
        return imag_part;
    }
    if im > 0.0 {
        format!("{}+{imag_part}", number_to_text(re))
    } else {
        format!("{}{imag_part}", number_to_text(re))
    }
}

fn complex_arg(ctx: &mut Evaluator, args: &[Expr], i: usize) -> Result<(Complex64, char), ErrorKind> {
    let v = ctx.arg(args, i);
    parse_complex(&v)
}

fn complex(args: &[Expr], ctx: &mut Evaluator) -> R {
    let re = ctx.num(args, 0)?;
    let im = ctx.num(args, 1)?;
    let suffix = if ctx.has_arg(args, 2) {
        let s = ctx.text(args, 2)?;
        match s.as_str() {
            "i" => 'i',
            "j" => 'j',
            _ => return Err(ErrorKind::Value),
        }
    } else {
        'i'
    };
    Ok(CellValue::Text(format_complex(Complex64::new(re, im), suffix)))
}

fn imreal(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Number(complex_arg(ctx, args, 0)?.0.re))
}

fn imaginary(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Number(complex_arg(ctx, args, 0)?.0.im))
}

fn imabs(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Number(complex_arg(ctx, args, 0)?.0.norm()))
}

fn imargument(args: &[Expr], ctx: &mut Evaluator) -> R {
    let (z, _) = complex_arg(ctx, args, 0)?;
    if z.re == 0.0 && z.im == 0.0 {
        return Err(ErrorKind::Div0);
    }
    Ok(CellValue::Number(z.arg()))
}

fn imconjugate(args: &[Expr], ctx: &mut Evaluator) -> R {
    let (z, s) = complex_arg(ctx, args, 0)?;
    Ok(CellValue::Text(format_complex(z.conj(), s)))
}

fn imsum(args: &[Expr], ctx: &mut Evaluator) -> R {
    let mut total = Complex64::new(0.0, 0.0);
    let mut suffix = 'i';
    for i in 0..args.len() {
        let (z, s) = complex_arg(ctx, args, i)?;
        total += z;
        suffix = s;
    }
    Ok(CellValue::Text(format_complex(total, suffix)))
}

fn imsub(args: &[Expr], ctx: &mut Evaluator) -> R {
    let (a, suffix) = complex_arg(ctx, args, 0)?;
    let (b, _) = complex_arg(ctx, args, 1)?;
    Ok(CellValue::Text(format_complex(a - b, suffix)))
}

fn improduct(args: &[Expr], ctx: &mut Evaluator) -> R {
    let mut total = Complex64::new(1.0, 0.0);
    let mut suffix = 'i';
    for i in 0..args.len() {
        let (z, s) = complex_arg(ctx, args, i)?;
        total *= z;
        suffix = s;
    }
    Ok(CellValue::Text(format_complex(total, suffix)))
}

fn imdiv(args: &[Expr], ctx: &mut Evaluator) -> R {
    let (a, suffix) = complex_arg(ctx, args, 0)?;
    let (b, _) = complex_arg(ctx, args, 1)?;
    if b.re == 0.0 && b.im == 0.0 {
        return Err(ErrorKind::Num);
    }
    Ok(CellValue::Text(format_complex(a / b, suffix)))
}

fn impower(args: &[Expr], ctx: &mut Evaluator) -> R {
    let (z, suffix) = complex_arg(ctx, args, 0)?;
    let power = ctx.num(args, 1)?;
    Ok(CellValue::Text(format_complex(z.powf(power), suffix)))
}

fn imsqrt(args: &[Expr], ctx: &mut Evaluator) -> R {
    let (z, suffix) = complex_arg(ctx, args, 0)?;
    Ok(CellValue::Text(format_complex(z.sqrt(), suffix)))
}

fn imexp(args: &[Expr], ctx: &mut Evaluator) -> R {
    let (z, suffix) = complex_arg(ctx, args, 0)?;
    Ok(CellValue::Text(format_complex(z.exp(), suffix)))
}

fn imln(args: &[Expr], ctx: &mut Evaluator) -> R {
    let (z, suffix) = complex_arg(ctx, args, 0)?;
    if z.re == 0.0 && z.im == 0.0 {
        return Err(ErrorKind::Num);
    }
    Ok(CellValue::Text(format_complex(z.ln(), suffix)))
}

fn imlog10(args: &[Expr], ctx: &mut Evaluator) -> R {
    let (z, suffix) = complex_arg(ctx, args, 0)?;
    if z.re == 0.0 && z.im == 0.0 {
        return Err(ErrorKind::Num);
    }
    Ok(CellValue::Text(format_complex(
        z.ln() / std::f64::consts::LN_10,
        suffix,
    )))
}

fn imlog2(args: &[Expr], ctx: &mut Evaluator) -> R {
    let (z, suffix) = complex_arg(ctx, args, 0)?;
    if z.re == 0.0 && z.im == 0.0 {
        return Err(ErrorKind::Num);
    }
    Ok(CellValue::Text(format_complex(
        z.ln() / std::f64::consts::LN_2,
        suffix,
    )))
}

fn imsin(args: &[Expr], ctx: &mut Evaluator) -> R {
    let (z, suffix) = complex_arg(ctx, args, 0)?;
    Ok(CellValue::Text(format_complex(z.sin(), suffix)))
}

fn imcos(args: &[Expr], ctx: &mut Evaluator) -> R {
    let (z, suffix) = complex_arg(ctx, args, 0)?;
    Ok(CellValue::Text(format_complex(z.cos(), suffix)))
}

fn imtan(args: &[Expr], ctx: &mut Evaluator) -> R {
    let (z, suffix) = complex_arg(ctx, args, 0)?;
    Ok(CellValue::Text(format_complex(z.tan(), suffix)))
}

// -- Unit conversion -------------------------------------------------------

/// Unit table: (symbol, category, factor to the category base unit).
/// Temperatures are handled separately.
const UNITS: &[(&str, u8, f64)] = &[
    // Mass (base: gram)
    ("g", 0, 1.0),
    ("kg", 0, 1000.0),
    ("mg", 0, 0.001),
    ("lbm", 0, 453.59237),
    ("ozm", 0, 28.349523125),
    ("u", 0, 1.660_539_066_6e-24),
    // Distance (base: metre)
    ("m", 1, 1.0),
    ("km", 1, 1000.0),
    ("cm", 1, 0.01),
    ("mm", 1, 0.001),
    ("mi", 1, 1609.344),
    ("Nmi", 1, 1852.0),
    ("in", 1, 0.0254),
    ("ft", 1, 0.3048),
    ("yd", 1, 0.9144),
    // Time (base: second)
    ("sec", 2, 1.0),
    ("s", 2, 1.0),
    ("mn", 2, 60.0),
    ("min", 2, 60.0),
    ("hr", 2, 3600.0),
    ("day", 2, 86400.0),
    ("d", 2, 86400.0),
    ("yr", 2, 31557600.0),
    // Liquid volume (base: litre)
    ("l", 3, 1.0),
    ("L", 3, 1.0),
    ("lt", 3, 1.0),
    ("ml", 3, 0.001),
    ("tsp", 3, 0.00492892159375),
    ("tbs", 3, 0.01478676478125),
    ("oz", 3, 0.0295735295625),
    ("cup", 3, 0.2365882365),
    ("pt", 3, 0.473176473),
    ("qt", 3, 0.946352946),
    ("gal", 3, 3.785411784),
];

fn convert(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    let from = ctx.text(args, 1)?;
    let to = ctx.text(args, 2)?;

    // Temperature scales convert affinely.
    let to_kelvin = |v: f64, unit: &str| -> Option<f64> {
        match unit {
            "C" | "cel" => Some(v + 273.15),
            "F" | "fah" => Some((v - 32.0) / 1.8 + 273.15),
            "K" | "kel" => Some(v),
            _ => None,
        }
    };
    if let Some(kelvin) = to_kelvin(n, &from) {
        let result = match to.as_str() {
            "C" | "cel" => kelvin - 273.15,
            "F" | "fah" => (kelvin - 273.15) * 1.8 + 32.0,
            "K" | "kel" => kelvin,
            _ => return Err(ErrorKind::Na),
        };
        return Ok(CellValue::Number(result));
    }

    let lookup = |unit: &str| UNITS.iter().find(|(sym, _, _)| *sym == unit);
    let (_, from_cat, from_factor) = lookup(&from).ok_or(ErrorKind::Na)?;
    let (_, to_cat, to_factor) = lookup(&to).ok_or(ErrorKind::Na)?;
    if from_cat != to_cat {
        return Err(ErrorKind::Na);
    }
    Ok(CellValue::Number(n * from_factor / to_factor))
}
