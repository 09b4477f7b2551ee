//! Math and trigonometry functions.

use crate::error::ErrorKind;
use crate::formula::ast::Expr;
use crate::formula::eval::Evaluator;
use crate::formula::functions::{
    def, ifs_mask, masked_numbers, FunctionDef, MANY, NONE, VOLATILE,
};
use crate::value::{to_number, CellValue, Matrix};

pub(super) const DEFS: &[FunctionDef] = &[
    def("ABS", 1, 1, NONE, abs),
    def("ACOS", 1, 1, NONE, acos),
    def("ACOT", 1, 1, NONE, acot),
    def("ARABIC", 1, 1, NONE, arabic),
    def("ASIN", 1, 1, NONE, asin),
    def("ATAN", 1, 1, NONE, atan),
    def("ATAN2", 2, 2, NONE, atan2),
    def("BASE", 2, 3, NONE, base),
    def("CEILING", 2, 2, NONE, ceiling),
    def("CEILING.MATH", 1, 3, NONE, ceiling_math),
    def("COMBIN", 2, 2, NONE, combin),
    def("COS", 1, 1, NONE, cos),
    def("COT", 1, 1, NONE, cot),
    def("CSC", 1, 1, NONE, csc),
    def("DECIMAL", 2, 2, NONE, decimal),
    def("DEGREES", 1, 1, NONE, degrees),
    def("EVEN", 1, 1, NONE, even),
    def("EXP", 1, 1, NONE, exp),
    def("FACT", 1, 1, NONE, fact),
    def("FACTDOUBLE", 1, 1, NONE, factdouble),
    def("FLOOR", 2, 2, NONE, floor),
    def("FLOOR.MATH", 1, 3, NONE, floor_math),
    def("GCD", 1, MANY, NONE, gcd),
    def("INT", 1, 1, NONE, int_),
    def("LCM", 1, MANY, NONE, lcm),
    def("LN", 1, 1, NONE, ln),
    def("LOG", 1, 2, NONE, log),
    def("LOG10", 1, 1, NONE, log10),
    def("MMULT", 2, 2, NONE, mmult),
    def("MOD", 2, 2, NONE, mod_),
    def("MROUND", 2, 2, NONE, mround),
    def("MULTINOMIAL", 1, MANY, NONE, multinomial),
    def("ODD", 1, 1, NONE, odd),
    def("PERMUT", 2, 2, NONE, permut),
    def("PI", 0, 0, NONE, pi),
    def("POWER", 2, 2, NONE, power),
    def("QUOTIENT", 2, 2, NONE, quotient),
    def("RADIANS", 1, 1, NONE, radians),
    def("RAND", 0, 0, VOLATILE, rand_),
    def("RANDARRAY", 0, 5, VOLATILE, randarray),
    def("RANDBETWEEN", 2, 2, VOLATILE, randbetween),
    def("ROMAN", 1, 2, NONE, roman),
    def("ROUND", 2, 2, NONE, round),
    def("ROUNDDOWN", 2, 2, NONE, rounddown),
    def("ROUNDUP", 2, 2, NONE, roundup),
    def("SEC", 1, 1, NONE, sec),
    def("SERIESSUM", 4, 4, NONE, seriessum),
    def("SIGN", 1, 1, NONE, sign),
    def("SIN", 1, 1, NONE, sin),
    def("SQRT", 1, 1, NONE, sqrt),
    def("SQRTPI", 1, 1, NONE, sqrtpi),
    def("SUBTOTAL", 2, MANY, NONE, subtotal),
    def("SUM", 1, MANY, NONE, sum),
    def("SUMIF", 2, 3, NONE, sumif),
    def("SUMIFS", 3, MANY, NONE, sumifs),
    def("SUMPRODUCT", 1, MANY, NONE, sumproduct),
    def("SUMSQ", 1, MANY, NONE, sumsq),
    def("SUMX2MY2", 2, 2, NONE, sumx2my2),
    def("SUMX2PY2", 2, 2, NONE, sumx2py2),
    def("SUMXMY2", 2, 2, NONE, sumxmy2),
    def("TAN", 1, 1, NONE, tan),
    def("TRUNC", 1, 2, NONE, trunc),
];

type R = Result<CellValue, ErrorKind>;

fn num_result(n: f64) -> R {
    if n.is_nan() || n.is_infinite() {
        Err(ErrorKind::Num)
    } else {
        Ok(CellValue::Number(n))
    }
}

// -- Aggregates ------------------------------------------------------------

fn sum(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = ctx.numbers(args)?;
    Ok(CellValue::Number(nums.iter().sum()))
}

fn sumsq(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = ctx.numbers(args)?;
    Ok(CellValue::Number(nums.iter().map(|n| n * n).sum()))
}

fn sumif(args: &[Expr], ctx: &mut Evaluator) -> R {
    let (range, mask) = ifs_mask(ctx, &args[..2], 0)?;
    let source = if args.len() > 2 {
        let m = ctx.matrix(args, 2)?;
        if m.rows != range.rows || m.cols != range.cols {
            return Err(ErrorKind::Value);
        }
        m
    } else {
        range
    };
    Ok(CellValue::Number(
        masked_numbers(&source, &mask).iter().sum(),
    ))
}

fn sumifs(args: &[Expr], ctx: &mut Evaluator) -> R {
    let source = ctx.matrix(args, 0)?;
    let (first, mask) = ifs_mask(ctx, args, 1)?;
    if source.rows != first.rows || source.cols != first.cols {
        return Err(ErrorKind::Value);
    }
    Ok(CellValue::Number(
        masked_numbers(&source, &mask).iter().sum(),
    ))
}

fn sumproduct(args: &[Expr], ctx: &mut Evaluator) -> R {
    let first = ctx.matrix(args, 0)?;
    let mut products: Vec<f64> = Vec::with_capacity(first.values.len());
    for v in &first.values {
        match v {
            CellValue::Error(e) => return Err(*e),
            CellValue::Number(n) | CellValue::Date(n) => products.push(*n),
            _ => products.push(0.0),
        }
    }
    for i in 1..args.len() {
        let m = ctx.matrix(args, i)?;
        if m.rows != first.rows || m.cols != first.cols {
            return Err(ErrorKind::Value);
        }
        for (acc, v) in products.iter_mut().zip(&m.values) {
            match v {
                CellValue::Error(e) => return Err(*e),
                CellValue::Number(n) | CellValue::Date(n) => *acc *= n,
                _ => *acc = 0.0,
            }
        }
    }
    Ok(CellValue::Number(products.iter().sum()))
}

fn paired_numbers(
    ctx: &mut Evaluator,
    args: &[Expr],
) -> Result<Vec<(f64, f64)>, ErrorKind> {
    let a = ctx.matrix(args, 0)?;
    let b = ctx.matrix(args, 1)?;
    if a.rows != b.rows || a.cols != b.cols {
        return Err(ErrorKind::Na);
    }
    let mut pairs = Vec::new();
    for (x, y) in a.values.iter().zip(&b.values) {
        if let CellValue::Error(e) = x {
            return Err(*e);
        }
        if let CellValue::Error(e) = y {
            return Err(*e);
        }
        if x.is_numeric() && y.is_numeric() {
            pairs.push((to_number(x)?, to_number(y)?));
        }
    }
    Ok(pairs)
}

fn sumx2my2(args: &[Expr], ctx: &mut Evaluator) -> R {
    let pairs = paired_numbers(ctx, args)?;
    Ok(CellValue::Number(
        pairs.iter().map(|(x, y)| x * x - y * y).sum(),
    ))
}

fn sumx2py2(args: &[Expr], ctx: &mut Evaluator) -> R {
    let pairs = paired_numbers(ctx, args)?;
    Ok(CellValue::Number(
        pairs.iter().map(|(x, y)| x * x + y * y).sum(),
    ))
}

fn sumxmy2(args: &[Expr], ctx: &mut Evaluator) -> R {
    let pairs = paired_numbers(ctx, args)?;
    Ok(CellValue::Number(
        pairs.iter().map(|(x, y)| (x - y) * (x - y)).sum(),
    ))
}

fn seriessum(args: &[Expr], ctx: &mut Evaluator) -> R {
    let x = ctx.num(args, 0)?;
    let n = ctx.num(args, 1)?;
    let m = ctx.num(args, 2)?;
    let coeffs = ctx.numbers(&args[3..4])?;
    let mut total = 0.0;
    for (i, a) in coeffs.iter().enumerate() {
        total += a * x.powf(n + m * i as f64);
    }
    num_result(total)
}

fn subtotal(args: &[Expr], ctx: &mut Evaluator) -> R {
    let code = ctx.int(args, 0)?;
    let rest = &args[1..];
    let nums = ctx.numbers(rest)?;
    // Codes 101-111 mirror 1-11; hidden-row filtering is a rendering
    // concern the engine does not model.
    let op = if (101..=111).contains(&code) {
        code - 100
    } else {
        code
    };
    let n = nums.len() as f64;
    let value = match op {
        1 => {
            if nums.is_empty() {
                return Err(ErrorKind::Div0);
            }
            nums.iter().sum::<f64>() / n
        }
        2 => n,
        3 => {
            let values = ctx.flat_values(rest);
            values
                .iter()
                .filter(|v| !matches!(v, CellValue::Empty))
                .count() as f64
        }
        4 => {
            if nums.is_empty() {
                0.0
            } else {
                nums.iter().copied().fold(f64::NEG_INFINITY, f64::max)
            }
        }
        5 => {
            if nums.is_empty() {
                0.0
            } else {
                nums.iter().copied().fold(f64::INFINITY, f64::min)
            }
        }
        6 => nums.iter().product(),
        7 | 8 | 10 | 11 => {
            let mean = nums.iter().sum::<f64>() / n;
            let ss: f64 = nums.iter().map(|v| (v - mean) * (v - mean)).sum();
            match op {
                7 => {
                    if nums.len() < 2 {
                        return Err(ErrorKind::Div0);
                    }
                    (ss / (n - 1.0)).sqrt()
                }
                8 => (ss / n).sqrt(),
                10 => {
                    if nums.len() < 2 {
                        return Err(ErrorKind::Div0);
                    }
                    ss / (n - 1.0)
                }
                _ => ss / n,
            }
        }
        9 => nums.iter().sum(),
        _ => return Err(ErrorKind::Value),
    };
    num_result(value)
}

fn mmult(args: &[Expr], ctx: &mut Evaluator) -> R {
    let a = ctx.matrix(args, 0)?;
    let b = ctx.matrix(args, 1)?;
    if a.cols != b.rows {
        return Err(ErrorKind::Value);
    }
    let mut values = Vec::with_capacity(a.rows * b.cols);
    for i in 0..a.rows {
        for j in 0..b.cols {
            let mut acc = 0.0;
            for k in 0..a.cols {
                let x = to_number(a.get(i, k)).map_err(|_| ErrorKind::Value)?;
                let y = to_number(b.get(k, j)).map_err(|_| ErrorKind::Value)?;
                acc += x * y;
            }
            values.push(CellValue::Number(acc));
        }
    }
    Ok(CellValue::Array(Matrix::new(a.rows, b.cols, values)))
}

// -- Rounding --------------------------------------------------------------

fn round_away(n: f64, digits: i64) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (n * factor).round() / factor
}

fn round(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    let digits = ctx.int(args, 1)?;
    num_result(round_away(n, digits))
}

fn roundup(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    let digits = ctx.int(args, 1)?;
    let factor = 10f64.powi(digits as i32);
    num_result((n.abs() * factor).ceil() / factor * n.signum())
}

fn rounddown(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    let digits = ctx.int(args, 1)?;
    let factor = 10f64.powi(digits as i32);
    num_result((n.abs() * factor).floor() / factor * n.signum())
}

fn trunc(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    let digits = if ctx.has_arg(args, 1) {
        ctx.int(args, 1)?
    } else {
        0
    };
    let factor = 10f64.powi(digits as i32);
    num_result((n * factor).trunc() / factor)
}

fn int_(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    Ok(CellValue::Number(n.floor()))
}

fn mround(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    let multiple = ctx.num(args, 1)?;
    if multiple == 0.0 {
        return Ok(CellValue::Number(0.0));
    }
    if (n > 0.0) != (multiple > 0.0) && n != 0.0 {
        return Err(ErrorKind::Num);
    }
    num_result((n / multiple).round() * multiple)
}

fn ceiling(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    let sig = ctx.num(args, 1)?;
    if sig == 0.0 {
        return Ok(CellValue::Number(0.0));
    }
    if n > 0.0 && sig < 0.0 {
        return Err(ErrorKind::Num);
    }
    num_result((n / sig).ceil() * sig)
}

fn ceiling_math(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    let sig = ctx.num_or(args, 1, 1.0)?.abs();
    let mode = ctx.num_or(args, 2, 0.0)?;
    if sig == 0.0 {
        return Ok(CellValue::Number(0.0));
    }
    let result = if n >= 0.0 || mode == 0.0 {
        (n / sig).ceil() * sig
    } else {
        // Nonzero mode rounds negatives away from zero.
        -((-n / sig).ceil() * sig)
    };
    num_result(result)
}

fn floor(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    let sig = ctx.num(args, 1)?;
    if sig == 0.0 {
        return Err(ErrorKind::Div0);
    }
    if n > 0.0 && sig < 0.0 {
        return Err(ErrorKind::Num);
    }
    num_result((n / sig).floor() * sig)
}

fn floor_math(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    let sig = ctx.num_or(args, 1, 1.0)?.abs();
    let mode = ctx.num_or(args, 2, 0.0)?;
    if sig == 0.0 {
        return Ok(CellValue::Number(0.0));
    }
    let result = if n >= 0.0 || mode == 0.0 {
        (n / sig).floor() * sig
    } else {
        -((-n / sig).floor() * sig)
    };
    num_result(result)
}

fn even(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    let magnitude = (n.abs() / 2.0).ceil() * 2.0;
    Ok(CellValue::Number(if n < 0.0 { -magnitude } else { magnitude }))
}

fn odd(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    let magnitude = ((n.abs() + 1.0) / 2.0).ceil() * 2.0 - 1.0;
    Ok(CellValue::Number(if n < 0.0 { -magnitude } else { magnitude }))
}

// -- Elementary ------------------------------------------------------------

fn abs(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Number(ctx.num(args, 0)?.abs()))
}

fn sign(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    Ok(CellValue::Number(if n > 0.0 {
        1.0
    } else if n < 0.0 {
        -1.0
    } else {
        0.0
    }))
}

fn sqrt(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    if n < 0.0 {
        return Err(ErrorKind::Num);
    }
    Ok(CellValue::Number(n.sqrt()))
}

fn sqrtpi(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    if n < 0.0 {
        return Err(ErrorKind::Num);
    }
    Ok(CellValue::Number((n * std::f64::consts::PI).sqrt()))
}

fn exp(args: &[Expr], ctx: &mut Evaluator) -> R {
    num_result(ctx.num(args, 0)?.exp())
}

fn ln(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    if n <= 0.0 {
        return Err(ErrorKind::Num);
    }
    num_result(n.ln())
}

/// LOG is base-10 unless a base argument is given; LN is the natural log.
fn log(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    let base = ctx.num_or(args, 1, 10.0)?;
    if n <= 0.0 || base <= 0.0 || base == 1.0 {
        return Err(ErrorKind::Num);
    }
    num_result(n.log(base))
}

fn log10(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    if n <= 0.0 {
        return Err(ErrorKind::Num);
    }
    num_result(n.log10())
}

fn power(args: &[Expr], ctx: &mut Evaluator) -> R {
    let base = ctx.num(args, 0)?;
    let exponent = ctx.num(args, 1)?;
    if base == 0.0 && exponent == 0.0 {
        return Ok(CellValue::Number(1.0));
    }
    if base == 0.0 && exponent < 0.0 {
        return Err(ErrorKind::Div0);
    }
    num_result(base.powf(exponent))
}

/// Excel MOD: the result carries the sign of the divisor.
fn mod_(args: &[Expr], ctx: &mut Evaluator) -> R {
    let a = ctx.num(args, 0)?;
    let b = ctx.num(args, 1)?;
    if b == 0.0 {
        return Err(ErrorKind::Div0);
    }
    num_result(a - b * (a / b).floor())
}

fn quotient(args: &[Expr], ctx: &mut Evaluator) -> R {
    let a = ctx.num(args, 0)?;
    let b = ctx.num(args, 1)?;
    if b == 0.0 {
        return Err(ErrorKind::Div0);
    }
    num_result((a / b).trunc())
}

fn gcd(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = ctx.numbers(args)?;
    let mut acc: u64 = 0;
    for n in nums {
        let n = n.trunc();
        if n < 0.0 || n > crate::utils::constants::INTEGER_DOMAIN_LIMIT {
            return Err(ErrorKind::Num);
        }
        acc = gcd_u64(acc, n as u64);
    }
    Ok(CellValue::Number(acc as f64))
}

fn lcm(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = ctx.numbers(args)?;
    let mut acc: u64 = 1;
    for n in nums {
        let n = n.trunc();
        if n < 0.0 || n > crate::utils::constants::INTEGER_DOMAIN_LIMIT {
            return Err(ErrorKind::Num);
        }
        let n = n as u64;
        if n == 0 {
            return Ok(CellValue::Number(0.0));
        }
        acc = acc.checked_mul(n / gcd_u64(acc, n)).ok_or(ErrorKind::Num)?;
        if acc as f64 > crate::utils::constants::INTEGER_DOMAIN_LIMIT {
            return Err(ErrorKind::Num);
        }
    }
    Ok(CellValue::Number(acc as f64))
}

fn gcd_u64(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn fact(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.int(args, 0)?;
    if n < 0 {
        return Err(ErrorKind::Num);
    }
    let mut acc = 1.0f64;
    for i in 2..=n {
        acc *= i as f64;
        if acc.is_infinite() {
            return Err(ErrorKind::Num);
        }
    }
    Ok(CellValue::Number(acc))
}

fn factdouble(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.int(args, 0)?;
    if n < 0 {
        return Err(ErrorKind::Num);
    }
    let mut acc = 1.0f64;
    let mut i = n;
    while i > 1 {
        acc *= i as f64;
        if acc.is_infinite() {
            return Err(ErrorKind::Num);
        }
        i -= 2;
    }
    Ok(CellValue::Number(acc))
}

fn combin(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.int(args, 0)?;
    let k = ctx.int(args, 1)?;
    if n < 0 || k < 0 || k > n {
        return Err(ErrorKind::Num);
    }
    num_result(binomial(n as u64, k as u64))
}

pub(crate) fn binomial(n: u64, k: u64) -> f64 {
    let k = k.min(n - k.min(n));
    let mut acc = 1.0f64;
    for i in 0..k {
        acc = acc * (n - i) as f64 / (i + 1) as f64;
    }
    acc.round()
}

fn permut(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.int(args, 0)?;
    let k = ctx.int(args, 1)?;
    if n < 0 || k < 0 || k > n {
        return Err(ErrorKind::Num);
    }
    let mut acc = 1.0f64;
    for i in 0..k {
        acc *= (n - i) as f64;
        if acc.is_infinite() {
            return Err(ErrorKind::Num);
        }
    }
    Ok(CellValue::Number(acc))
}

fn multinomial(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = ctx.numbers(args)?;
    let mut total = 0u64;
    let mut denom = 1.0f64;
    for n in &nums {
        let n = n.trunc();
        if n < 0.0 {
            return Err(ErrorKind::Num);
        }
        total += n as u64;
        for i in 2..=(n as u64) {
            denom *= i as f64;
        }
    }
    let mut numer = 1.0f64;
    for i in 2..=total {
        numer *= i as f64;
        if numer.is_infinite() {
            return Err(ErrorKind::Num);
        }
    }
    num_result(numer / denom)
}

// -- Trigonometry ----------------------------------------------------------

fn pi(_args: &[Expr], _ctx: &mut Evaluator) -> R {
    Ok(CellValue::Number(std::f64::consts::PI))
}

fn degrees(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Number(ctx.num(args, 0)?.to_degrees()))
}

fn radians(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Number(ctx.num(args, 0)?.to_radians()))
}

fn sin(args: &[Expr], ctx: &mut Evaluator) -> R {
    num_result(ctx.num(args, 0)?.sin())
}

fn cos(args: &[Expr], ctx: &mut Evaluator) -> R {
    num_result(ctx.num(args, 0)?.cos())
}

fn tan(args: &[Expr], ctx: &mut Evaluator) -> R {
    num_result(ctx.num(args, 0)?.tan())
}

fn asin(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    if !(-1.0..=1.0).contains(&n) {
        return Err(ErrorKind::Num);
    }
    num_result(n.asin())
}

fn acos(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    if !(-1.0..=1.0).contains(&n) {
        return Err(ErrorKind::Num);
    }
    num_result(n.acos())
}

fn atan(args: &[Expr], ctx: &mut Evaluator) -> R {
    num_result(ctx.num(args, 0)?.atan())
}

/// ATAN2(x, y) with Excel's argument order.
fn atan2(args: &[Expr], ctx: &mut Evaluator) -> R {
    let x = ctx.num(args, 0)?;
    let y = ctx.num(args, 1)?;
    if x == 0.0 && y == 0.0 {
        return Err(ErrorKind::Div0);
    }
    num_result(y.atan2(x))
}

fn acot(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?;
    num_result(std::f64::consts::FRAC_PI_2 - n.atan())
}

fn sec(args: &[Expr], ctx: &mut Evaluator) -> R {
    let c = ctx.num(args, 0)?.cos();
    if c == 0.0 {
        return Err(ErrorKind::Div0);
    }
    num_result(1.0 / c)
}

fn csc(args: &[Expr], ctx: &mut Evaluator) -> R {
    let s = ctx.num(args, 0)?.sin();
    if s == 0.0 {
        return Err(ErrorKind::Div0);
    }
    num_result(1.0 / s)
}

fn cot(args: &[Expr], ctx: &mut Evaluator) -> R {
    let t = ctx.num(args, 0)?.tan();
    if t == 0.0 {
        return Err(ErrorKind::Div0);
    }
    num_result(1.0 / t)
}

// -- Random ----------------------------------------------------------------

fn rand_(_args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Number(ctx.random()))
}

fn randbetween(args: &[Expr], ctx: &mut Evaluator) -> R {
    let bottom = ctx.num(args, 0)?.ceil();
    let top = ctx.num(args, 1)?.floor();
    if bottom > top {
        return Err(ErrorKind::Num);
    }
    let span = top - bottom + 1.0;
    Ok(CellValue::Number(bottom + (ctx.random() * span).floor()))
}

fn randarray(args: &[Expr], ctx: &mut Evaluator) -> R {
    let rows = ctx.num_or(args, 0, 1.0)? as usize;
    let cols = ctx.num_or(args, 1, 1.0)? as usize;
    let min = ctx.num_or(args, 2, 0.0)?;
    let max = ctx.num_or(args, 3, 1.0)?;
    let whole = ctx.bool_or(args, 4, false)?;
    if rows == 0 || cols == 0 || min > max {
        return Err(ErrorKind::Value);
    }
    let mut values = Vec::with_capacity(rows * cols);
    for _ in 0..rows * cols {
        let draw = ctx.random();
        let n = if whole {
            (min.ceil() + (draw * (max.floor() - min.ceil() + 1.0)).floor()).min(max.floor())
        } else {
            min + draw * (max - min)
        };
        values.push(CellValue::Number(n));
    }
    Ok(CellValue::Array(Matrix::new(rows, cols, values)))
}

// -- Numeral systems -------------------------------------------------------

const ROMAN_VALUES: [(u32, &str); 13] = [
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

fn roman(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.int(args, 0)?;
    if !(0..=3999).contains(&n) {
        return Err(ErrorKind::Value);
    }
    let mut out = String::new();
    let mut n = n as u32;
    for (value, digits) in ROMAN_VALUES {
        while n >= value {
            out.push_str(digits);
            n -= value;
        }
    }
    Ok(CellValue::Text(out))
}

fn arabic(args: &[Expr], ctx: &mut Evaluator) -> R {
    let text = ctx.text(args, 0)?.trim().to_ascii_uppercase();
    if text.is_empty() {
        return Ok(CellValue::Number(0.0));
    }
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.as_str()),
    };
    let digit = |c: char| -> Option<i64> {
        Some(match c {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            'D' => 500,
            'M' => 1000,
            _ => return None,
        })
    };
    let mut total = 0i64;
    let chars: Vec<char> = body.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        let v = digit(c).ok_or(ErrorKind::Value)?;
        let next = chars.get(i + 1).and_then(|&c| digit(c)).unwrap_or(0);
        if v < next {
            total -= v;
        } else {
            total += v;
        }
    }
    Ok(CellValue::Number(if negative { -total } else { total } as f64))
}

fn base(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.int(args, 0)?;
    let radix = ctx.int(args, 1)?;
    let min_len = if ctx.has_arg(args, 2) {
        ctx.int(args, 2)?
    } else {
        0
    };
    if n < 0 || !(2..=36).contains(&radix) || !(0..=255).contains(&min_len) {
        return Err(ErrorKind::Num);
    }
    const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut out = Vec::new();
    let mut n = n as u64;
    let radix = radix as u64;
    loop {
        out.push(DIGITS[(n % radix) as usize]);
        n /= radix;
        if n == 0 {
            break;
        }
    }
    while (out.len() as i64) < min_len {
        out.push(b'0');
    }
    out.reverse();
    Ok(CellValue::Text(String::from_utf8(out).expect("ascii digits")))
}

fn decimal(args: &[Expr], ctx: &mut Evaluator) -> R {
    let text = ctx.text(args, 0)?.trim().to_ascii_uppercase();
    let radix = ctx.int(args, 1)?;
    if !(2..=36).contains(&radix) {
        return Err(ErrorKind::Num);
    }
    if text.is_empty() {
        return Ok(CellValue::Number(0.0));
    }
    let mut acc = 0.0f64;
    for c in text.chars() {
        let v = c.to_digit(36).ok_or(ErrorKind::Num)? as i64;
        if v >= radix {
            return Err(ErrorKind::Num);
        }
        acc = acc * radix as f64 + v as f64;
    }
    num_result(acc)
}
