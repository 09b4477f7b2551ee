//! Statistical functions: counting, central tendency, dispersion, ranking,
//! regression, and the distribution families backed by statrs.

use statrs::distribution::{
    Beta, Binomial, ChiSquared, Continuous, ContinuousCDF, Discrete, DiscreteCDF, Exp,
    FisherSnedecor, Gamma, Hypergeometric, LogNormal, NegativeBinomial, Normal, Poisson,
    StudentsT, Weibull,
};
use statrs::function::gamma as gamma_fn;

use crate::error::ErrorKind;
use crate::formula::ast::Expr;
use crate::formula::criteria::Criterion;
use crate::formula::eval::Evaluator;
use crate::formula::functions::{
    def, ifs_mask, masked_numbers, FunctionDef, MANY, NONE,
};
use crate::value::{to_number, CellValue, Matrix};

pub(super) const DEFS: &[FunctionDef] = &[
    def("AVEDEV", 1, MANY, NONE, avedev),
    def("AVERAGE", 1, MANY, NONE, average),
    def("AVERAGEA", 1, MANY, NONE, averagea),
    def("AVERAGEIF", 2, 3, NONE, averageif),
    def("AVERAGEIFS", 3, MANY, NONE, averageifs),
    def("BETA.DIST", 4, 6, NONE, beta_dist),
    def("BETA.INV", 3, 5, NONE, beta_inv),
    def("BINOM.DIST", 4, 4, NONE, binom_dist),
    def("BINOM.INV", 3, 3, NONE, binom_inv),
    def("CHISQ.DIST", 3, 3, NONE, chisq_dist),
    def("CHISQ.DIST.RT", 2, 2, NONE, chisq_dist_rt),
    def("CHISQ.INV", 2, 2, NONE, chisq_inv),
    def("CHISQ.INV.RT", 2, 2, NONE, chisq_inv_rt),
    def("CONFIDENCE.NORM", 3, 3, NONE, confidence_norm),
    def("CONFIDENCE.T", 3, 3, NONE, confidence_t),
    def("CORREL", 2, 2, NONE, correl),
    def("COUNT", 1, MANY, NONE, count),
    def("COUNTA", 1, MANY, NONE, counta),
    def("COUNTBLANK", 1, 1, NONE, countblank),
    def("COUNTIF", 2, 2, NONE, countif),
    def("COUNTIFS", 2, MANY, NONE, countifs),
    def("COVARIANCE.P", 2, 2, NONE, covariance_p),
    def("COVARIANCE.S", 2, 2, NONE, covariance_s),
    def("DEVSQ", 1, MANY, NONE, devsq),
    def("EXPON.DIST", 3, 3, NONE, expon_dist),
    def("F.DIST", 4, 4, NONE, f_dist),
    def("F.DIST.RT", 3, 3, NONE, f_dist_rt),
    def("F.INV", 3, 3, NONE, f_inv),
    def("F.INV.RT", 3, 3, NONE, f_inv_rt),
    def("FISHER", 1, 1, NONE, fisher),
    def("FISHERINV", 1, 1, NONE, fisherinv),
    def("FORECAST", 3, 3, NONE, forecast),
    def("FORECAST.LINEAR", 3, 3, NONE, forecast),
    def("FREQUENCY", 2, 2, NONE, frequency),
    def("GAMMA", 1, 1, NONE, gamma_),
    def("GAMMA.DIST", 4, 4, NONE, gamma_dist),
    def("GAMMA.INV", 3, 3, NONE, gamma_inv),
    def("GAMMALN", 1, 1, NONE, gammaln),
    def("GAMMALN.PRECISE", 1, 1, NONE, gammaln),
    def("GEOMEAN", 1, MANY, NONE, geomean),
    def("HARMEAN", 1, MANY, NONE, harmean),
    def("HYPGEOM.DIST", 5, 5, NONE, hypgeom_dist),
    def("INTERCEPT", 2, 2, NONE, intercept),
    def("KURT", 1, MANY, NONE, kurt),
    def("LARGE", 2, 2, NONE, large),
    def("LOGNORM.DIST", 4, 4, NONE, lognorm_dist),
    def("LOGNORM.INV", 3, 3, NONE, lognorm_inv),
    def("MAX", 1, MANY, NONE, max),
    def("MAXA", 1, MANY, NONE, maxa),
    def("MAXIFS", 3, MANY, NONE, maxifs),
    def("MEDIAN", 1, MANY, NONE, median),
    def("MIN", 1, MANY, NONE, min),
    def("MINA", 1, MANY, NONE, mina),
    def("MINIFS", 3, MANY, NONE, minifs),
    def("MODE", 1, MANY, NONE, mode_sngl),
    def("MODE.SNGL", 1, MANY, NONE, mode_sngl),
    def("NEGBINOM.DIST", 4, 4, NONE, negbinom_dist),
    def("NORM.DIST", 4, 4, NONE, norm_dist),
    def("NORM.INV", 3, 3, NONE, norm_inv),
    def("NORM.S.DIST", 2, 2, NONE, norm_s_dist),
    def("NORM.S.INV", 1, 1, NONE, norm_s_inv),
    def("PEARSON", 2, 2, NONE, correl),
    def("PERCENTILE", 2, 2, NONE, percentile_inc),
    def("PERCENTILE.EXC", 2, 2, NONE, percentile_exc),
    def("PERCENTILE.INC", 2, 2, NONE, percentile_inc),
    def("POISSON.DIST", 3, 3, NONE, poisson_dist),
    def("QUARTILE", 2, 2, NONE, quartile_inc),
    def("QUARTILE.INC", 2, 2, NONE, quartile_inc),
    def("RANK", 2, 3, NONE, rank_eq),
    def("RANK.AVG", 2, 3, NONE, rank_avg),
    def("RANK.EQ", 2, 3, NONE, rank_eq),
    def("RSQ", 2, 2, NONE, rsq),
    def("SKEW", 1, MANY, NONE, skew),
    def("SLOPE", 2, 2, NONE, slope),
    def("SMALL", 2, 2, NONE, small),
    def("STANDARDIZE", 3, 3, NONE, standardize),
    def("STDEV", 1, MANY, NONE, stdev_s),
    def("STDEV.P", 1, MANY, NONE, stdev_p),
    def("STDEV.S", 1, MANY, NONE, stdev_s),
    def("STDEVP", 1, MANY, NONE, stdev_p),
    def("T.DIST", 3, 3, NONE, t_dist),
    def("T.DIST.2T", 2, 2, NONE, t_dist_2t),
    def("T.DIST.RT", 2, 2, NONE, t_dist_rt),
    def("T.INV", 2, 2, NONE, t_inv),
    def("T.INV.2T", 2, 2, NONE, t_inv_2t),
    def("TRIMMEAN", 2, 2, NONE, trimmean),
    def("VAR", 1, MANY, NONE, var_s),
    def("VAR.P", 1, MANY, NONE, var_p),
    def("VAR.S", 1, MANY, NONE, var_s),
    def("VARP", 1, MANY, NONE, var_p),
    def("WEIBULL.DIST", 4, 4, NONE, weibull_dist),
];

type R = Result<CellValue, ErrorKind>;

fn finite(n: f64) -> R {
    if n.is_nan() || n.is_infinite() {
        Err(ErrorKind::Num)
    } else {
        Ok(CellValue::Number(n))
    }
}

// -- Counting and simple aggregates ----------------------------------------

fn count(args: &[Expr], ctx: &mut Evaluator) -> R {
    let mut n = 0usize;
    for expr in args {
        match expr {
            Expr::Reference(_) | Expr::Name(_) | Expr::Array(_) => {
                if let Ok(m) = ctx.matrix_of(expr) {
                    n += m.values.iter().filter(|v| v.is_numeric()).count();
                }
            }
            _ => {
                let v = ctx.eval(expr);
                if to_number(&v).is_ok() && !matches!(v, CellValue::Empty) {
                    n += 1;
                }
            }
        }
    }
    Ok(CellValue::Number(n as f64))
}

fn counta(args: &[Expr], ctx: &mut Evaluator) -> R {
    let values = ctx.flat_values(args);
    let n = values
        .iter()
        .filter(|v| !matches!(v, CellValue::Empty))
        .count();
    Ok(CellValue::Number(n as f64))
}

fn countblank(args: &[Expr], ctx: &mut Evaluator) -> R {
    let m = ctx.matrix(args, 0)?;
    let n = m
        .values
        .iter()
        .filter(|v| matches!(v, CellValue::Empty) || matches!(v, CellValue::Text(s) if s.is_empty()))
        .count();
    Ok(CellValue::Number(n as f64))
}

fn countif(args: &[Expr], ctx: &mut Evaluator) -> R {
    let m = ctx.matrix(args, 0)?;
    let crit_value = ctx.arg(args, 1);
    if let CellValue::Error(e) = crit_value {
        return Err(e);
    }
    let criterion = Criterion::parse(&crit_value);
    let n = m.values.iter().filter(|v| criterion.matches(v)).count();
    Ok(CellValue::Number(n as f64))
}

fn countifs(args: &[Expr], ctx: &mut Evaluator) -> R {
    let (_, mask) = ifs_mask(ctx, args, 0)?;
    Ok(CellValue::Number(
        mask.iter().filter(|b| **b).count() as f64
    ))
}

fn average(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = ctx.numbers(args)?;
    if nums.is_empty() {
        return Err(ErrorKind::Div0);
    }
    Ok(CellValue::Number(
        nums.iter().sum::<f64>() / nums.len() as f64,
    ))
}

/// AVERAGEA: text counts as zero and logicals as 0/1, also inside ranges.
fn averagea(args: &[Expr], ctx: &mut Evaluator) -> R {
    let values = ctx.flat_values(args);
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in &values {
        match v {
            CellValue::Empty => {}
            CellValue::Error(e) => return Err(*e),
            CellValue::Number(x) | CellValue::Date(x) => {
                sum += x;
                n += 1;
            }
            CellValue::Bool(b) => {
                sum += if *b { 1.0 } else { 0.0 };
                n += 1;
            }
            _ => n += 1,
        }
    }
    if n == 0 {
        return Err(ErrorKind::Div0);
    }
    Ok(CellValue::Number(sum / n as f64))
}

fn averageif(args: &[Expr], ctx: &mut Evaluator) -> R {
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
    let nums = masked_numbers(&source, &mask);
    if nums.is_empty() {
        return Err(ErrorKind::Div0);
    }
    Ok(CellValue::Number(
        nums.iter().sum::<f64>() / nums.len() as f64,
    ))
}

fn averageifs(args: &[Expr], ctx: &mut Evaluator) -> R {
    let source = ctx.matrix(args, 0)?;
    let (first, mask) = ifs_mask(ctx, args, 1)?;
    if source.rows != first.rows || source.cols != first.cols {
        return Err(ErrorKind::Value);
    }
    let nums = masked_numbers(&source, &mask);
    if nums.is_empty() {
        return Err(ErrorKind::Div0);
    }
    Ok(CellValue::Number(
        nums.iter().sum::<f64>() / nums.len() as f64,
    ))
}

fn max(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = ctx.numbers(args)?;
    if nums.is_empty() {
        return Ok(CellValue::Number(0.0));
    }
    Ok(CellValue::Number(
        nums.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    ))
}

fn min(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = ctx.numbers(args)?;
    if nums.is_empty() {
        return Ok(CellValue::Number(0.0));
    }
    Ok(CellValue::Number(
        nums.iter().copied().fold(f64::INFINITY, f64::min),
    ))
}

fn numbers_a(ctx: &mut Evaluator, args: &[Expr]) -> Result<Vec<f64>, ErrorKind> {
    let mut out = Vec::new();
    for v in ctx.flat_values(args) {
        match v {
            CellValue::Empty => {}
            CellValue::Error(e) => return Err(e),
            CellValue::Number(x) | CellValue::Date(x) => out.push(x),
            CellValue::Bool(b) => out.push(if b { 1.0 } else { 0.0 }),
            _ => out.push(0.0),
        }
    }
    Ok(out)
}

fn maxa(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = numbers_a(ctx, args)?;
    if nums.is_empty() {
        return Ok(CellValue::Number(0.0));
    }
    Ok(CellValue::Number(
        nums.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    ))
}

fn mina(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = numbers_a(ctx, args)?;
    if nums.is_empty() {
        return Ok(CellValue::Number(0.0));
    }
    Ok(CellValue::Number(
        nums.iter().copied().fold(f64::INFINITY, f64::min),
    ))
}

fn maxifs(args: &[Expr], ctx: &mut Evaluator) -> R {
    let source = ctx.matrix(args, 0)?;
    let (first, mask) = ifs_mask(ctx, args, 1)?;
    if source.rows != first.rows || source.cols != first.cols {
        return Err(ErrorKind::Value);
    }
    let nums = masked_numbers(&source, &mask);
    if nums.is_empty() {
        return Ok(CellValue::Number(0.0));
    }
    Ok(CellValue::Number(
        nums.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    ))
}

fn minifs(args: &[Expr], ctx: &mut Evaluator) -> R {
    let source = ctx.matrix(args, 0)?;
    let (first, mask) = ifs_mask(ctx, args, 1)?;
    if source.rows != first.rows || source.cols != first.cols {
        return Err(ErrorKind::Value);
    }
    let nums = masked_numbers(&source, &mask);
    if nums.is_empty() {
        return Ok(CellValue::Number(0.0));
    }
    Ok(CellValue::Number(
        nums.iter().copied().fold(f64::INFINITY, f64::min),
    ))
}

// -- Order statistics ------------------------------------------------------

fn sorted_numbers(ctx: &mut Evaluator, args: &[Expr]) -> Result<Vec<f64>, ErrorKind> {
    let mut nums = ctx.numbers(args)?;
    nums.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Ok(nums)
}

fn median(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = sorted_numbers(ctx, args)?;
    if nums.is_empty() {
        return Err(ErrorKind::Num);
    }
    let mid = nums.len() / 2;
    let value = if nums.len() % 2 == 1 {
        nums[mid]
    } else {
        (nums[mid - 1] + nums[mid]) / 2.0
    };
    Ok(CellValue::Number(value))
}

fn mode_sngl(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = ctx.numbers(args)?;
    let mut best: Option<(f64, usize)> = None;
    for &x in &nums {
        let count = nums.iter().filter(|&&y| y == x).count();
        // Ties keep the first-encountered value.
        if best.map_or(true, |(_, bc)| count > bc) {
            best = Some((x, count));
        }
    }
    match best {
        Some((value, count)) if count > 1 => Ok(CellValue::Number(value)),
        _ => Err(ErrorKind::Na),
    }
}

fn large(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = sorted_numbers(ctx, &args[..1])?;
    let k = ctx.int(args, 1)?;
    if k < 1 || k as usize > nums.len() {
        return Err(ErrorKind::Num);
    }
    Ok(CellValue::Number(nums[nums.len() - k as usize]))
}

fn small(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = sorted_numbers(ctx, &args[..1])?;
    let k = ctx.int(args, 1)?;
    if k < 1 || k as usize > nums.len() {
        return Err(ErrorKind::Num);
    }
    Ok(CellValue::Number(nums[k as usize - 1]))
}

fn percentile_at(nums: &[f64], rank: f64) -> Option<f64> {
    if nums.is_empty() {
        return None;
    }
    let low = rank.floor() as usize;
    let frac = rank - rank.floor();
    if low >= nums.len() {
        return None;
    }
    if frac == 0.0 || low + 1 >= nums.len() {
        return Some(nums[low]);
    }
    Some(nums[low] + frac * (nums[low + 1] - nums[low]))
}

fn percentile_inc(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = sorted_numbers(ctx, &args[..1])?;
    let k = ctx.num(args, 1)?;
    if nums.is_empty() || !(0.0..=1.0).contains(&k) {
        return Err(ErrorKind::Num);
    }
    let rank = k * (nums.len() - 1) as f64;
    percentile_at(&nums, rank)
        .map(CellValue::Number)
        .ok_or(ErrorKind::Num)
}

fn percentile_exc(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = sorted_numbers(ctx, &args[..1])?;
    let k = ctx.num(args, 1)?;
    let n = nums.len() as f64;
    if nums.is_empty() || k <= 0.0 || k >= 1.0 {
        return Err(ErrorKind::Num);
    }
    let rank = k * (n + 1.0);
    if rank < 1.0 || rank > n {
        return Err(ErrorKind::Num);
    }
    percentile_at(&nums, rank - 1.0)
        .map(CellValue::Number)
        .ok_or(ErrorKind::Num)
}

fn quartile_inc(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = sorted_numbers(ctx, &args[..1])?;
    let q = ctx.int(args, 1)?;
    if !(0..=4).contains(&q) {
        return Err(ErrorKind::Num);
    }
    if nums.is_empty() {
        return Err(ErrorKind::Num);
    }
    let rank = q as f64 / 4.0 * (nums.len() - 1) as f64;
    percentile_at(&nums, rank)
        .map(CellValue::Number)
        .ok_or(ErrorKind::Num)
}

fn rank_common(
    args: &[Expr],
    ctx: &mut Evaluator,
) -> Result<(f64, Vec<f64>, bool), ErrorKind> {
    let x = ctx.num(args, 0)?;
    let nums = ctx.numbers(&args[1..2])?;
    let ascending = ctx.num_or(args, 2, 0.0)? != 0.0;
    Ok((x, nums, ascending))
}

fn rank_eq(args: &[Expr], ctx: &mut Evaluator) -> R {
    let (x, nums, ascending) = rank_common(args, ctx)?;
    if !nums.contains(&x) {
        return Err(ErrorKind::Na);
    }
    let ahead = nums
        .iter()
        .filter(|&&y| if ascending { y < x } else { y > x })
        .count();
    Ok(CellValue::Number(ahead as f64 + 1.0))
}

/// RANK.AVG resolves ties to the mean of the tied ranks.
fn rank_avg(args: &[Expr], ctx: &mut Evaluator) -> R {
    let (x, nums, ascending) = rank_common(args, ctx)?;
    let ties = nums.iter().filter(|&&y| y == x).count();
    if ties == 0 {
        return Err(ErrorKind::Na);
    }
    let ahead = nums
        .iter()
        .filter(|&&y| if ascending { y < x } else { y > x })
        .count();
    let first = ahead as f64 + 1.0;
    Ok(CellValue::Number(first + (ties as f64 - 1.0) / 2.0))
}

// -- Dispersion ------------------------------------------------------------

fn moments(nums: &[f64]) -> (f64, f64) {
    let n = nums.len() as f64;
    let mean = nums.iter().sum::<f64>() / n;
    let ss = nums.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>();
    (mean, ss)
}

fn var_s(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = ctx.numbers(args)?;
    if nums.len() < 2 {
        return Err(ErrorKind::Div0);
    }
    let (_, ss) = moments(&nums);
    Ok(CellValue::Number(ss / (nums.len() as f64 - 1.0)))
}

fn var_p(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = ctx.numbers(args)?;
    if nums.is_empty() {
        return Err(ErrorKind::Div0);
    }
    let (_, ss) = moments(&nums);
    Ok(CellValue::Number(ss / nums.len() as f64))
}

fn stdev_s(args: &[Expr], ctx: &mut Evaluator) -> R {
    match var_s(args, ctx)? {
        CellValue::Number(v) => Ok(CellValue::Number(v.sqrt())),
        other => Ok(other),
    }
}

fn stdev_p(args: &[Expr], ctx: &mut Evaluator) -> R {
    match var_p(args, ctx)? {
        CellValue::Number(v) => Ok(CellValue::Number(v.sqrt())),
        other => Ok(other),
    }
}

fn devsq(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = ctx.numbers(args)?;
    if nums.is_empty() {
        return Err(ErrorKind::Num);
    }
    let (_, ss) = moments(&nums);
    Ok(CellValue::Number(ss))
}

fn avedev(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = ctx.numbers(args)?;
    if nums.is_empty() {
        return Err(ErrorKind::Num);
    }
    let (mean, _) = moments(&nums);
    let dev = nums.iter().map(|x| (x - mean).abs()).sum::<f64>() / nums.len() as f64;
    Ok(CellValue::Number(dev))
}

fn geomean(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = ctx.numbers(args)?;
    if nums.is_empty() || nums.iter().any(|&x| x <= 0.0) {
        return Err(ErrorKind::Num);
    }
    let log_sum: f64 = nums.iter().map(|x| x.ln()).sum();
    finite((log_sum / nums.len() as f64).exp())
}

fn harmean(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = ctx.numbers(args)?;
    if nums.is_empty() || nums.iter().any(|&x| x <= 0.0) {
        return Err(ErrorKind::Num);
    }
    let recip_sum: f64 = nums.iter().map(|x| 1.0 / x).sum();
    finite(nums.len() as f64 / recip_sum)
}

fn trimmean(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = sorted_numbers(ctx, &args[..1])?;
    let percent = ctx.num(args, 1)?;
    if nums.is_empty() || !(0.0..1.0).contains(&percent) {
        return Err(ErrorKind::Num);
    }
    let trim = ((nums.len() as f64 * percent) / 2.0).floor() as usize;
    let kept = &nums[trim..nums.len() - trim];
    if kept.is_empty() {
        return Err(ErrorKind::Num);
    }
    Ok(CellValue::Number(
        kept.iter().sum::<f64>() / kept.len() as f64,
    ))
}

fn skew(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = ctx.numbers(args)?;
    let n = nums.len() as f64;
    if nums.len() < 3 {
        return Err(ErrorKind::Div0);
    }
    let (mean, ss) = moments(&nums);
    let sd = (ss / (n - 1.0)).sqrt();
    if sd == 0.0 {
        return Err(ErrorKind::Div0);
    }
    let cubes: f64 = nums.iter().map(|x| ((x - mean) / sd).powi(3)).sum();
    finite(n / ((n - 1.0) * (n - 2.0)) * cubes)
}

fn kurt(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = ctx.numbers(args)?;
    let n = nums.len() as f64;
    if nums.len() < 4 {
        return Err(ErrorKind::Div0);
    }
    let (mean, ss) = moments(&nums);
    let sd = (ss / (n - 1.0)).sqrt();
    if sd == 0.0 {
        return Err(ErrorKind::Div0);
    }
    let fourths: f64 = nums.iter().map(|x| ((x - mean) / sd).powi(4)).sum();
    let term = n * (n + 1.0) / ((n - 1.0) * (n - 2.0) * (n - 3.0)) * fourths;
    let adjust = 3.0 * (n - 1.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0));
    finite(term - adjust)
}

// -- Regression ------------------------------------------------------------

fn xy_pairs(ctx: &mut Evaluator, args: &[Expr]) -> Result<Vec<(f64, f64)>, ErrorKind> {
    let a = ctx.matrix(args, 0)?;
    let b = ctx.matrix(args, 1)?;
    if a.values.len() != b.values.len() {
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
            pairs.push((
                to_number(x).map_err(|_| ErrorKind::Value)?,
                to_number(y).map_err(|_| ErrorKind::Value)?,
            ));
        }
    }
    if pairs.is_empty() {
        return Err(ErrorKind::Div0);
    }
    Ok(pairs)
}

fn covariance(pairs: &[(f64, f64)]) -> (f64, f64, f64, f64, f64) {
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let my = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
    let sxy = pairs.iter().map(|(x, y)| (x - mx) * (y - my)).sum::<f64>();
    let sxx = pairs.iter().map(|(x, _)| (x - mx) * (x - mx)).sum::<f64>();
    let syy = pairs.iter().map(|(_, y)| (y - my) * (y - my)).sum::<f64>();
    (mx, my, sxy, sxx, syy)
}

fn correl(args: &[Expr], ctx: &mut Evaluator) -> R {
    let pairs = xy_pairs(ctx, args)?;
    let (_, _, sxy, sxx, syy) = covariance(&pairs);
    if sxx == 0.0 || syy == 0.0 {
        return Err(ErrorKind::Div0);
    }
    finite(sxy / (sxx * syy).sqrt())
}

fn rsq(args: &[Expr], ctx: &mut Evaluator) -> R {
    match correl(args, ctx)? {
        CellValue::Number(r) => Ok(CellValue::Number(r * r)),
        other => Ok(other),
    }
}

fn covariance_p(args: &[Expr], ctx: &mut Evaluator) -> R {
    let pairs = xy_pairs(ctx, args)?;
    let (_, _, sxy, _, _) = covariance(&pairs);
    Ok(CellValue::Number(sxy / pairs.len() as f64))
}

fn covariance_s(args: &[Expr], ctx: &mut Evaluator) -> R {
    let pairs = xy_pairs(ctx, args)?;
    if pairs.len() < 2 {
        return Err(ErrorKind::Div0);
    }
    let (_, _, sxy, _, _) = covariance(&pairs);
    Ok(CellValue::Number(sxy / (pairs.len() as f64 - 1.0)))
}

/// SLOPE(known_y, known_x)
fn slope(args: &[Expr], ctx: &mut Evaluator) -> R {
    let pairs = xy_pairs(ctx, args)?;
    // xy_pairs loads (y, x) in argument order; swap to regression form.
    let (_, _, sxy, _, sxx) = covariance(&pairs);
    if sxx == 0.0 {
        return Err(ErrorKind::Div0);
    }
    finite(sxy / sxx)
}

fn intercept(args: &[Expr], ctx: &mut Evaluator) -> R {
    let pairs = xy_pairs(ctx, args)?;
    let (my, mx, sxy, _, sxx) = covariance(&pairs);
    if sxx == 0.0 {
        return Err(ErrorKind::Div0);
    }
    finite(my - sxy / sxx * mx)
}

/// FORECAST(x, known_y, known_x)
fn forecast(args: &[Expr], ctx: &mut Evaluator) -> R {
    let x = ctx.num(args, 0)?;
    let pairs = xy_pairs(ctx, &args[1..])?;
    let (my, mx, sxy, _, sxx) = covariance(&pairs);
    if sxx == 0.0 {
        return Err(ErrorKind::Div0);
    }
    let slope = sxy / sxx;
    finite(my - slope * mx + slope * x)
}

fn frequency(args: &[Expr], ctx: &mut Evaluator) -> R {
    let data = ctx.numbers(&args[..1])?;
    let mut bins = ctx.numbers(&args[1..2])?;
    bins.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mut counts = vec![0usize; bins.len() + 1];
    for x in &data {
        let mut slot = bins.len();
        for (i, b) in bins.iter().enumerate() {
            if *x <= *b {
                slot = i;
                break;
            }
        }
        counts[slot] += 1;
    }
    let values = counts
        .into_iter()
        .map(|c| CellValue::Number(c as f64))
        .collect::<Vec<_>>();
    let rows = values.len();
    Ok(CellValue::Array(Matrix::new(rows, 1, values)))
}

// -- Distributions ---------------------------------------------------------

fn cdf_or_pdf<D>(dist: &D, x: f64, cumulative: bool) -> f64
where
    D: Continuous<f64, f64> + ContinuousCDF<f64, f64>,
{
    if cumulative {
        dist.cdf(x)
    } else {
        dist.pdf(x)
    }
}

fn probability(p: f64) -> Result<f64, ErrorKind> {
    if !(0.0..=1.0).contains(&p) {
        return Err(ErrorKind::Num);
    }
    Ok(p)
}

fn open_probability(p: f64) -> Result<f64, ErrorKind> {
    if p <= 0.0 || p >= 1.0 {
        return Err(ErrorKind::Num);
    }
    Ok(p)
}

fn norm_dist(args: &[Expr], ctx: &mut Evaluator) -> R {
    let x = ctx.num(args, 0)?;
    let mean = ctx.num(args, 1)?;
    let sd = ctx.num(args, 2)?;
    let cumulative = ctx.bool(args, 3)?;
    let dist = Normal::new(mean, sd).map_err(|_| ErrorKind::Num)?;
    finite(cdf_or_pdf(&dist, x, cumulative))
}

fn norm_inv(args: &[Expr], ctx: &mut Evaluator) -> R {
    let p = open_probability(ctx.num(args, 0)?)?;
    let mean = ctx.num(args, 1)?;
    let sd = ctx.num(args, 2)?;
    let dist = Normal::new(mean, sd).map_err(|_| ErrorKind::Num)?;
    finite(dist.inverse_cdf(p))
}

fn norm_s_dist(args: &[Expr], ctx: &mut Evaluator) -> R {
    let z = ctx.num(args, 0)?;
    let cumulative = ctx.bool(args, 1)?;
    let dist = Normal::new(0.0, 1.0).map_err(|_| ErrorKind::Num)?;
    finite(cdf_or_pdf(&dist, z, cumulative))
}

fn norm_s_inv(args: &[Expr], ctx: &mut Evaluator) -> R {
    let p = open_probability(ctx.num(args, 0)?)?;
    let dist = Normal::new(0.0, 1.0).map_err(|_| ErrorKind::Num)?;
    finite(dist.inverse_cdf(p))
}

fn lognorm_dist(args: &[Expr], ctx: &mut Evaluator) -> R {
    let x = ctx.num(args, 0)?;
    let mean = ctx.num(args, 1)?;
    let sd = ctx.num(args, 2)?;
    let cumulative = ctx.bool(args, 3)?;
    if x <= 0.0 {
        return Err(ErrorKind::Num);
    }
    let dist = LogNormal::new(mean, sd).map_err(|_| ErrorKind::Num)?;
    finite(cdf_or_pdf(&dist, x, cumulative))
}

fn lognorm_inv(args: &[Expr], ctx: &mut Evaluator) -> R {
    let p = open_probability(ctx.num(args, 0)?)?;
    let mean = ctx.num(args, 1)?;
    let sd = ctx.num(args, 2)?;
    let dist = LogNormal::new(mean, sd).map_err(|_| ErrorKind::Num)?;
    finite(dist.inverse_cdf(p))
}

fn expon_dist(args: &[Expr], ctx: &mut Evaluator) -> R {
    let x = ctx.num(args, 0)?;
    let lambda = ctx.num(args, 1)?;
    let cumulative = ctx.bool(args, 2)?;
    if x < 0.0 || lambda <= 0.0 {
        return Err(ErrorKind::Num);
    }
    let dist = Exp::new(lambda).map_err(|_| ErrorKind::Num)?;
    finite(cdf_or_pdf(&dist, x, cumulative))
}

fn poisson_dist(args: &[Expr], ctx: &mut Evaluator) -> R {
    let x = ctx.int(args, 0)?;
    let mean = ctx.num(args, 1)?;
    let cumulative = ctx.bool(args, 2)?;
    if x < 0 || mean < 0.0 {
        return Err(ErrorKind::Num);
    }
    let dist = Poisson::new(mean).map_err(|_| ErrorKind::Num)?;
    let value = if cumulative {
        dist.cdf(x as u64)
    } else {
        dist.pmf(x as u64)
    };
    finite(value)
}

fn binom_dist(args: &[Expr], ctx: &mut Evaluator) -> R {
    let k = ctx.int(args, 0)?;
    let n = ctx.int(args, 1)?;
    let p = probability(ctx.num(args, 2)?)?;
    let cumulative = ctx.bool(args, 3)?;
    if k < 0 || n < 0 || k > n {
        return Err(ErrorKind::Num);
    }
    let dist = Binomial::new(p, n as u64).map_err(|_| ErrorKind::Num)?;
    let value = if cumulative {
        dist.cdf(k as u64)
    } else {
        dist.pmf(k as u64)
    };
    finite(value)
}

/// BINOM.INV: smallest k whose cumulative probability reaches alpha.
fn binom_inv(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.int(args, 0)?;
    let p = probability(ctx.num(args, 1)?)?;
    let alpha = open_probability(ctx.num(args, 2)?)?;
    if n < 0 {
        return Err(ErrorKind::Num);
    }
    let dist = Binomial::new(p, n as u64).map_err(|_| ErrorKind::Num)?;
    for k in 0..=n as u64 {
        if dist.cdf(k) >= alpha {
            return Ok(CellValue::Number(k as f64));
        }
    }
    Ok(CellValue::Number(n as f64))
}

fn t_dist(args: &[Expr], ctx: &mut Evaluator) -> R {
    let x = ctx.num(args, 0)?;
    let df = ctx.num(args, 1)?.trunc();
    let cumulative = ctx.bool(args, 2)?;
    if df < 1.0 {
        return Err(ErrorKind::Num);
    }
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|_| ErrorKind::Num)?;
    finite(cdf_or_pdf(&dist, x, cumulative))
}

fn t_dist_rt(args: &[Expr], ctx: &mut Evaluator) -> R {
    let x = ctx.num(args, 0)?;
    let df = ctx.num(args, 1)?.trunc();
    if df < 1.0 {
        return Err(ErrorKind::Num);
    }
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|_| ErrorKind::Num)?;
    finite(1.0 - dist.cdf(x))
}

fn t_dist_2t(args: &[Expr], ctx: &mut Evaluator) -> R {
    let x = ctx.num(args, 0)?;
    let df = ctx.num(args, 1)?.trunc();
    if df < 1.0 || x < 0.0 {
        return Err(ErrorKind::Num);
    }
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|_| ErrorKind::Num)?;
    finite(2.0 * (1.0 - dist.cdf(x)))
}

fn t_inv(args: &[Expr], ctx: &mut Evaluator) -> R {
    let p = open_probability(ctx.num(args, 0)?)?;
    let df = ctx.num(args, 1)?.trunc();
    if df < 1.0 {
        return Err(ErrorKind::Num);
    }
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|_| ErrorKind::Num)?;
    finite(dist.inverse_cdf(p))
}

fn t_inv_2t(args: &[Expr], ctx: &mut Evaluator) -> R {
    let p = open_probability(ctx.num(args, 0)?)?;
    let df = ctx.num(args, 1)?.trunc();
    if df < 1.0 {
        return Err(ErrorKind::Num);
    }
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|_| ErrorKind::Num)?;
    finite(dist.inverse_cdf(1.0 - p / 2.0))
}

fn chisq_dist(args: &[Expr], ctx: &mut Evaluator) -> R {
    let x = ctx.num(args, 0)?;
    let df = ctx.num(args, 1)?.trunc();
    let cumulative = ctx.bool(args, 2)?;
    if x < 0.0 || df < 1.0 {
        return Err(ErrorKind::Num);
    }
    let dist = ChiSquared::new(df).map_err(|_| ErrorKind::Num)?;
    finite(cdf_or_pdf(&dist, x, cumulative))
}

fn chisq_dist_rt(args: &[Expr], ctx: &mut Evaluator) -> R {
    let x = ctx.num(args, 0)?;
    let df = ctx.num(args, 1)?.trunc();
    if x < 0.0 || df < 1.0 {
        return Err(ErrorKind::Num);
    }
    let dist = ChiSquared::new(df).map_err(|_| ErrorKind::Num)?;
    finite(1.0 - dist.cdf(x))
}

fn chisq_inv(args: &[Expr], ctx: &mut Evaluator) -> R {
    let p = open_probability(ctx.num(args, 0)?)?;
    let df = ctx.num(args, 1)?.trunc();
    if df < 1.0 {
        return Err(ErrorKind::Num);
    }
    let dist = ChiSquared::new(df).map_err(|_| ErrorKind::Num)?;
    finite(dist.inverse_cdf(p))
}

fn chisq_inv_rt(args: &[Expr], ctx: &mut Evaluator) -> R {
    let p = open_probability(ctx.num(args, 0)?)?;
    let df = ctx.num(args, 1)?.trunc();
    if df < 1.0 {
        return Err(ErrorKind::Num);
    }
    let dist = ChiSquared::new(df).map_err(|_| ErrorKind::Num)?;
    finite(dist.inverse_cdf(1.0 - p))
}

fn f_dist(args: &[Expr], ctx: &mut Evaluator) -> R {
    let x = ctx.num(args, 0)?;
    let d1 = ctx.num(args, 1)?.trunc();
    let d2 = ctx.num(args, 2)?.trunc();
    let cumulative = ctx.bool(args, 3)?;
    if x < 0.0 || d1 < 1.0 || d2 < 1.0 {
        return Err(ErrorKind::Num);
    }
    let dist = FisherSnedecor::new(d1, d2).map_err(|_| ErrorKind::Num)?;
    finite(cdf_or_pdf(&dist, x, cumulative))
}

fn f_dist_rt(args: &[Expr], ctx: &mut Evaluator) -> R {
    let x = ctx.num(args, 0)?;
    let d1 = ctx.num(args, 1)?.trunc();
    let d2 = ctx.num(args, 2)?.trunc();
    if x < 0.0 || d1 < 1.0 || d2 < 1.0 {
        return Err(ErrorKind::Num);
    }
    let dist = FisherSnedecor::new(d1, d2).map_err(|_| ErrorKind::Num)?;
    finite(1.0 - dist.cdf(x))
}

fn f_inv(args: &[Expr], ctx: &mut Evaluator) -> R {
    let p = open_probability(ctx.num(args, 0)?)?;
    let d1 = ctx.num(args, 1)?.trunc();
    let d2 = ctx.num(args, 2)?.trunc();
    if d1 < 1.0 || d2 < 1.0 {
        return Err(ErrorKind::Num);
    }
    let dist = FisherSnedecor::new(d1, d2).map_err(|_| ErrorKind::Num)?;
    finite(dist.inverse_cdf(p))
}

fn f_inv_rt(args: &[Expr], ctx: &mut Evaluator) -> R {
    let p = open_probability(ctx.num(args, 0)?)?;
    let d1 = ctx.num(args, 1)?.trunc();
    let d2 = ctx.num(args, 2)?.trunc();
    if d1 < 1.0 || d2 < 1.0 {
        return Err(ErrorKind::Num);
    }
    let dist = FisherSnedecor::new(d1, d2).map_err(|_| ErrorKind::Num)?;
    finite(dist.inverse_cdf(1.0 - p))
}

fn beta_dist(args: &[Expr], ctx: &mut Evaluator) -> R {
    let x = ctx.num(args, 0)?;
    let alpha = ctx.num(args, 1)?;
    let beta = ctx.num(args, 2)?;
    let cumulative = ctx.bool(args, 3)?;
    let lower = ctx.num_or(args, 4, 0.0)?;
    let upper = ctx.num_or(args, 5, 1.0)?;
    if alpha <= 0.0 || beta <= 0.0 || upper <= lower || x < lower || x > upper {
        return Err(ErrorKind::Num);
    }
    let scaled = (x - lower) / (upper - lower);
    let dist = Beta::new(alpha, beta).map_err(|_| ErrorKind::Num)?;
    let value = if cumulative {
        dist.cdf(scaled)
    } else {
        dist.pdf(scaled) / (upper - lower)
    };
    finite(value)
}

fn beta_inv(args: &[Expr], ctx: &mut Evaluator) -> R {
    let p = open_probability(ctx.num(args, 0)?)?;
    let alpha = ctx.num(args, 1)?;
    let beta = ctx.num(args, 2)?;
    let lower = ctx.num_or(args, 3, 0.0)?;
    let upper = ctx.num_or(args, 4, 1.0)?;
    if alpha <= 0.0 || beta <= 0.0 || upper <= lower {
        return Err(ErrorKind::Num);
    }
    let dist = Beta::new(alpha, beta).map_err(|_| ErrorKind::Num)?;
    finite(lower + dist.inverse_cdf(p) * (upper - lower))
}

/// GAMMA.DIST takes the scale parameter; statrs uses rate.
fn gamma_dist(args: &[Expr], ctx: &mut Evaluator) -> R {
    let x = ctx.num(args, 0)?;
    let alpha = ctx.num(args, 1)?;
    let scale = ctx.num(args, 2)?;
    let cumulative = ctx.bool(args, 3)?;
    if x < 0.0 || alpha <= 0.0 || scale <= 0.0 {
        return Err(ErrorKind::Num);
    }
    let dist = Gamma::new(alpha, 1.0 / scale).map_err(|_| ErrorKind::Num)?;
    finite(cdf_or_pdf(&dist, x, cumulative))
}

fn gamma_inv(args: &[Expr], ctx: &mut Evaluator) -> R {
    let p = open_probability(ctx.num(args, 0)?)?;
    let alpha = ctx.num(args, 1)?;
    let scale = ctx.num(args, 2)?;
    if alpha <= 0.0 || scale <= 0.0 {
        return Err(ErrorKind::Num);
    }
    let dist = Gamma::new(alpha, 1.0 / scale).map_err(|_| ErrorKind::Num)?;
    finite(dist.inverse_cdf(p))
}

fn weibull_dist(args: &[Expr], ctx: &mut Evaluator) -> R {
    let x = ctx.num(args, 0)?;
    let shape = ctx.num(args, 1)?;
    let scale = ctx.num(args, 2)?;
    let cumulative = ctx.bool(args, 3)?;
    if x < 0.0 || shape <= 0.0 || scale <= 0.0 {
        return Err(ErrorKind::Num);
    }
    let dist = Weibull::new(shape, scale).map_err(|_| ErrorKind::Num)?;
    finite(cdf_or_pdf(&dist, x, cumulative))
}

fn hypgeom_dist(args: &[Expr], ctx: &mut Evaluator) -> R {
    let sample_s = ctx.int(args, 0)?;
    let sample_n = ctx.int(args, 1)?;
    let pop_s = ctx.int(args, 2)?;
    let pop_n = ctx.int(args, 3)?;
    let cumulative = ctx.bool(args, 4)?;
    if sample_s < 0 || sample_n <= 0 || pop_s < 0 || pop_n <= 0 {
        return Err(ErrorKind::Num);
    }
    if sample_n > pop_n || pop_s > pop_n || sample_s > sample_n {
        return Err(ErrorKind::Num);
    }
    let dist = Hypergeometric::new(pop_n as u64, pop_s as u64, sample_n as u64)
        .map_err(|_| ErrorKind::Num)?;
    let value = if cumulative {
        dist.cdf(sample_s as u64)
    } else {
        dist.pmf(sample_s as u64)
    };
    finite(value)
}

fn negbinom_dist(args: &[Expr], ctx: &mut Evaluator) -> R {
    let failures = ctx.int(args, 0)?;
    let successes = ctx.int(args, 1)?;
    let p = open_probability(ctx.num(args, 2)?)?;
    let cumulative = ctx.bool(args, 3)?;
    if failures < 0 || successes < 1 {
        return Err(ErrorKind::Num);
    }
    let dist = NegativeBinomial::new(successes as f64, p).map_err(|_| ErrorKind::Num)?;
    let value = if cumulative {
        dist.cdf(failures as u64)
    } else {
        dist.pmf(failures as u64)
    };
    finite(value)
}

fn confidence_norm(args: &[Expr], ctx: &mut Evaluator) -> R {
    let alpha = open_probability(ctx.num(args, 0)?)?;
    let sd = ctx.num(args, 1)?;
    let n = ctx.num(args, 2)?.trunc();
    if sd <= 0.0 || n < 1.0 {
        return Err(ErrorKind::Num);
    }
    let dist = Normal::new(0.0, 1.0).map_err(|_| ErrorKind::Num)?;
    let z = dist.inverse_cdf(1.0 - alpha / 2.0);
    finite(z * sd / n.sqrt())
}

fn confidence_t(args: &[Expr], ctx: &mut Evaluator) -> R {
    let alpha = open_probability(ctx.num(args, 0)?)?;
    let sd = ctx.num(args, 1)?;
    let n = ctx.num(args, 2)?.trunc();
    if sd <= 0.0 || n < 2.0 {
        return Err(ErrorKind::Num);
    }
    let dist = StudentsT::new(0.0, 1.0, n - 1.0).map_err(|_| ErrorKind::Num)?;
    let t = dist.inverse_cdf(1.0 - alpha / 2.0);
    finite(t * sd / n.sqrt())
}

// -- Special functions -----------------------------------------------------

fn gamma_(args: &[Expr], ctx: &mut Evaluator) -> R {
    let x = ctx.num(args, 0)?;
    if x <= 0.0 && x.fract() == 0.0 {
        return Err(ErrorKind::Num);
    }
    finite(gamma_fn::gamma(x))
}

fn gammaln(args: &[Expr], ctx: &mut Evaluator) -> R {
    let x = ctx.num(args, 0)?;
    if x <= 0.0 {
        return Err(ErrorKind::Num);
    }
    finite(gamma_fn::ln_gamma(x))
}

fn fisher(args: &[Expr], ctx: &mut Evaluator) -> R {
    let x = ctx.num(args, 0)?;
    if x <= -1.0 || x >= 1.0 {
        return Err(ErrorKind::Num);
    }
    finite(0.5 * ((1.0 + x) / (1.0 - x)).ln())
}

fn fisherinv(args: &[Expr], ctx: &mut Evaluator) -> R {
    let y = ctx.num(args, 0)?;
    let e2y = (2.0 * y).exp();
    finite((e2y - 1.0) / (e2y + 1.0))
}

fn standardize(args: &[Expr], ctx: &mut Evaluator) -> R {
    let x = ctx.num(args, 0)?;
    let mean = ctx.num(args, 1)?;
    let sd = ctx.num(args, 2)?;
    if sd <= 0.0 {
        return Err(ErrorKind::Num);
    }
    finite((x - mean) / sd)
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

    fn num(snap: &CellSnapshot, formula: &str) -> f64 {
        match eval_str(snap, formula) {
            CellValue::Number(n) => n,
            other => panic!("{formula} gave {other:?}"),
        }
    }

    fn close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{a} != {b}");
    }

    #[test]
    fn test_count_family() {
        let mut snap = CellSnapshot::new("Sheet1");
        snap.set_a1("A1", CellValue::Number(1.0));
        snap.set_a1("A2", CellValue::Text("x".to_string()));
        snap.set_a1("A3", CellValue::Bool(true));
        snap.set_a1("A4", CellValue::Number(4.0));
        assert_eq!(num(&snap, "COUNT(A1:A5)"), 2.0);
        assert_eq!(num(&snap, "COUNTA(A1:A5)"), 4.0);
        assert_eq!(num(&snap, "COUNTBLANK(A1:A5)"), 1.0);
    }

    #[test]
    fn test_countif_spec_cases() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(num(&snap, "COUNTIF({1,2,3,\"a\",\"A\"},\">1\")"), 2.0);
        assert_eq!(
            num(&snap, "COUNTIF({\"apple\",\"apricot\",\"banana\"},\"ap*\")"),
            2.0
        );
        assert_eq!(num(&snap, "COUNTIF({1,2,3},\"<>2\")"), 2.0);
    }

    #[test]
    fn test_countifs() {
        let mut snap = CellSnapshot::new("Sheet1");
        for (i, (a, b)) in [(1.0, "x"), (2.0, "y"), (3.0, "x")].iter().enumerate() {
            snap.set("Sheet1", 1, i as u32 + 1, CellValue::Number(*a));
            snap.set("Sheet1", 2, i as u32 + 1, CellValue::Text(b.to_string()));
        }
        assert_eq!(num(&snap, "COUNTIFS(A1:A3,\">1\",B1:B3,\"x\")"), 1.0);
    }

    #[test]
    fn test_average_and_a_variant() {
        let mut snap = CellSnapshot::new("Sheet1");
        snap.set_a1("A1", CellValue::Number(2.0));
        snap.set_a1("A2", CellValue::Text("txt".to_string()));
        snap.set_a1("A3", CellValue::Number(4.0));
        assert_eq!(num(&snap, "AVERAGE(A1:A3)"), 3.0);
        assert_eq!(num(&snap, "AVERAGEA(A1:A3)"), 2.0);
        assert_eq!(
            eval_str(&snap, "AVERAGE(B1:B3)"),
            CellValue::Error(ErrorKind::Div0)
        );
    }

    #[test]
    fn test_min_max() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(num(&snap, "MAX(1,5,3)"), 5.0);
        assert_eq!(num(&snap, "MIN(4,2,8)"), 2.0);
        assert_eq!(num(&snap, "MAX(Z1:Z3)"), 0.0);
        assert_eq!(num(&snap, "MAXA({1,TRUE})"), 1.0);
    }

    #[test]
    fn test_median_and_mode() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(num(&snap, "MEDIAN(1,2,3)"), 2.0);
        assert_eq!(num(&snap, "MEDIAN(1,2,3,4)"), 2.5);
        assert_eq!(num(&snap, "MODE.SNGL(1,2,2,3)"), 2.0);
        assert_eq!(
            eval_str(&snap, "MODE.SNGL(1,2,3)"),
            CellValue::Error(ErrorKind::Na)
        );
    }

    #[test]
    fn test_large_small() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(num(&snap, "LARGE({10,20,30},1)"), 30.0);
        assert_eq!(num(&snap, "LARGE({10,20,30},3)"), 10.0);
        assert_eq!(num(&snap, "SMALL({10,20,30},2)"), 20.0);
        assert_eq!(
            eval_str(&snap, "SMALL({1,2},3)"),
            CellValue::Error(ErrorKind::Num)
        );
    }

    #[test]
    fn test_percentile_and_quartile() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(num(&snap, "PERCENTILE.INC({1,2,3,4},0.5)"), 2.5);
        assert_eq!(num(&snap, "PERCENTILE.INC({1,2,3,4},0.25)"), 1.75);
        assert_eq!(num(&snap, "QUARTILE.INC({1,2,3,4},2)"), 2.5);
        assert_eq!(num(&snap, "PERCENTILE.EXC({1,2,3,4},0.4)"), 2.0);
    }

    #[test]
    fn test_rank_variants() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(num(&snap, "RANK.EQ(20,{10,20,30})"), 2.0);
        assert_eq!(num(&snap, "RANK.EQ(20,{10,20,30},1)"), 2.0);
        assert_eq!(num(&snap, "RANK.EQ(30,{10,20,30})"), 1.0);
        // Ties: RANK.AVG averages the tied positions.
        assert_eq!(num(&snap, "RANK.AVG(20,{10,20,20,30})"), 2.5);
        assert_eq!(
            eval_str(&snap, "RANK.EQ(99,{1,2})"),
            CellValue::Error(ErrorKind::Na)
        );
    }

    #[test]
    fn test_dispersion() {
        let snap = CellSnapshot::new("Sheet1");
        close(num(&snap, "VAR.S(2,4,6)"), 4.0);
        close(num(&snap, "VAR.P(2,4,6)"), 8.0 / 3.0);
        close(num(&snap, "STDEV.S(2,4,6)"), 2.0);
        close(num(&snap, "DEVSQ(1,2,3)"), 2.0);
        close(num(&snap, "AVEDEV(1,2,3)"), 2.0 / 3.0);
        close(num(&snap, "GEOMEAN(2,8)"), 4.0);
        close(num(&snap, "HARMEAN(2,6)"), 3.0);
        close(num(&snap, "TRIMMEAN({1,2,3,4,100},0.4)"), 3.0);
    }

    #[test]
    fn test_regression() {
        let snap = CellSnapshot::new("Sheet1");
        // y = 2x + 1 exactly.
        close(num(&snap, "SLOPE({3,5,7},{1,2,3})"), 2.0);
        close(num(&snap, "INTERCEPT({3,5,7},{1,2,3})"), 1.0);
        close(num(&snap, "FORECAST(4,{3,5,7},{1,2,3})"), 9.0);
        close(num(&snap, "CORREL({3,5,7},{1,2,3})"), 1.0);
        close(num(&snap, "RSQ({3,5,7},{1,2,3})"), 1.0);
        close(num(&snap, "COVARIANCE.P({1,2,3},{3,5,7})"), 4.0 / 3.0);
        close(num(&snap, "COVARIANCE.S({1,2,3},{3,5,7})"), 2.0);
    }

    #[test]
    fn test_frequency() {
        let snap = CellSnapshot::new("Sheet1");
        let v = eval_str(&snap, "FREQUENCY({1,2,3,4,5},{2,4})");
        match v {
            CellValue::Array(m) => {
                assert_eq!(m.rows, 3);
                assert_eq!(
                    m.values,
                    vec![
                        CellValue::Number(2.0),
                        CellValue::Number(2.0),
                        CellValue::Number(1.0)
                    ]
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_normal_family() {
        let snap = CellSnapshot::new("Sheet1");
        close(num(&snap, "NORM.S.DIST(0,TRUE)"), 0.5);
        close(num(&snap, "NORM.S.INV(0.5)"), 0.0);
        close(num(&snap, "NORM.DIST(100,100,15,TRUE)"), 0.5);
        close(num(&snap, "NORM.INV(0.5,100,15)"), 100.0);
        // Round-trip through the inverse.
        let p = num(&snap, "NORM.S.DIST(1.2345,TRUE)");
        let snap2 = CellSnapshot::new("Sheet1");
        close(num(&snap2, &format!("NORM.S.INV({p})")), 1.2345);
    }

    #[test]
    fn test_discrete_distributions() {
        let snap = CellSnapshot::new("Sheet1");
        close(num(&snap, "BINOM.DIST(2,5,0.5,FALSE)"), 0.3125);
        close(num(&snap, "BINOM.DIST(2,5,0.5,TRUE)"), 0.5);
        assert_eq!(num(&snap, "BINOM.INV(5,0.5,0.5)"), 2.0);
        close(num(&snap, "POISSON.DIST(0,1,FALSE)"), (-1.0f64).exp());
    }

    #[test]
    fn test_continuous_distributions() {
        let snap = CellSnapshot::new("Sheet1");
        close(num(&snap, "EXPON.DIST(1,1,TRUE)"), 1.0 - (-1.0f64).exp());
        close(num(&snap, "CHISQ.DIST.RT(0,3)"), 1.0);
        close(num(&snap, "T.DIST(0,10,TRUE)"), 0.5);
        close(num(&snap, "T.DIST.2T(0,10)"), 1.0);
        close(num(&snap, "GAMMA.DIST(1,1,1,TRUE)"), 1.0 - (-1.0f64).exp());
        close(
            num(&snap, "WEIBULL.DIST(1,1,1,TRUE)"),
            1.0 - (-1.0f64).exp(),
        );
        close(num(&snap, "BETA.DIST(0.5,1,1,TRUE)"), 0.5);
    }

    #[test]
    fn test_special_functions() {
        let snap = CellSnapshot::new("Sheet1");
        close(num(&snap, "GAMMA(5)"), 24.0);
        close(num(&snap, "GAMMALN(5)"), 24.0f64.ln());
        close(num(&snap, "FISHER(0)"), 0.0);
        close(num(&snap, "FISHERINV(0)"), 0.0);
        close(num(&snap, "STANDARDIZE(110,100,15)"), 2.0 / 3.0);
        assert_eq!(eval_str(&snap, "GAMMA(0)"), CellValue::Error(ErrorKind::Num));
    }

    #[test]
    fn test_skew_kurt() {
        let snap = CellSnapshot::new("Sheet1");
        close(num(&snap, "SKEW(1,2,3)"), 0.0);
        close(num(&snap, "KURT(1,2,3,4)"), -1.2);
    }

    #[test]
    fn test_confidence() {
        let snap = CellSnapshot::new("Sheet1");
        close(num(&snap, "CONFIDENCE.NORM(0.05,1,100)"), 0.1959964);
    }
}
