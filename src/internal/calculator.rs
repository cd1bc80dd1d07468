//! The probability calculator (§4.4): a second, independent visitor over
//! the same tree, producing a `(Value, Distribution)` pair per node
//! instead of a single sampled value.
//!
//! Distribution keys follow Design Notes §9 exactly: `Outcome::Scalar`
//! for a single number, `Outcome::Group` for a sorted multiset (a clutch
//! of dice before `sum`/`largest`/etc. reduce it). Every operator is
//! lifted to distributions the same way: enumerate the operand
//! distribution(s), apply the value-level operator to each combination,
//! and accumulate weight on collision. This is "the canonical lift of any
//! deterministic function to distributions" the specification calls out
//! for unary aggregation, generalized here to every operator family.
//!
//! `repeat`, `foreach`, and string/`TextAlign` operators have no
//! meaningful probability-mass interpretation and are refused with an
//! `Interpreter`-kind not-implemented error, per §4.4's closing line.

use crate::internal::ast::{BinaryOp, DiceKind, Expr, FoldOp, Stmt, UnaryOp};
use crate::internal::errors::{ErrorHandler, ErrorKind};
use crate::internal::functions::{CompositionalDef, Definition, FunctionDef, FunctionTable};
use crate::internal::tokens::Literal;
use crate::internal::value::Value;
use std::collections::HashMap;

/// A scalar outcome's payload. Kept distinct from `i64`/`f64` directly so
/// `Outcome` can derive a serviceable `PartialEq` without relying on
/// float bit-patterns matching exactly across independently-computed
/// branches.
#[derive(Debug, Clone, Copy)]
pub enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

impl PartialEq for Num {
    fn eq(&self, other: &Self) -> bool {
        self.as_f64() == other.as_f64()
    }
}

/// A distribution key: either a single number, or a sorted multiset of
/// integers representing an as-yet-unreduced clutch of dice (§9,
/// "Calculator tuple keys").
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Scalar(Num),
    Group(Vec<i64>),
}

impl Outcome {
    fn to_ints(&self) -> Vec<i64> {
        match self {
            Outcome::Group(v) => v.clone(),
            Outcome::Scalar(Num::Int(i)) => vec![*i],
            Outcome::Scalar(Num::Float(f)) => vec![*f as i64],
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Outcome::Scalar(n) => Some(n.as_f64()),
            Outcome::Group(_) => None,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Outcome::Scalar(Num::Int(i)) => Value::Int(*i),
            Outcome::Scalar(Num::Float(f)) => Value::Float(*f),
            Outcome::Group(items) => Value::List(items.iter().map(|i| Value::Int(*i)).collect()),
        }
    }
}

/// An unnormalized weight map. `entries` is a flat `Vec` rather than a
/// `HashMap` because `Outcome` carries `f64` payloads and isn't `Hash`;
/// distributions here stay small enough (a handful to a few thousand
/// outcomes for realistic dice pools) that linear collision lookup is not
/// a bottleneck.
#[derive(Debug, Clone)]
pub struct Distribution {
    entries: Vec<(Outcome, f64)>,
}

impl Distribution {
    fn new() -> Self {
        Distribution { entries: Vec::new() }
    }

    fn single(outcome: Outcome, weight: f64) -> Self {
        Distribution {
            entries: vec![(outcome, weight)],
        }
    }

    fn add(&mut self, outcome: Outcome, weight: f64) {
        if weight == 0.0 {
            return;
        }
        if let Some((_, w)) = self.entries.iter_mut().find(|(o, _)| *o == outcome) {
            *w += weight;
        } else {
            self.entries.push((outcome, weight));
        }
    }

    pub fn entries(&self) -> &[(Outcome, f64)] {
        &self.entries
    }

    fn total_weight(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    /// Lifts a unary value-level function over every outcome, summing
    /// weight on collision (§4.4, "the canonical lift").
    fn map_unary(&self, f: impl Fn(&Outcome) -> Option<Outcome>) -> Option<Distribution> {
        let mut out = Distribution::new();
        for (o, w) in &self.entries {
            out.add(f(o)?, *w);
        }
        Some(out)
    }

    /// Cartesian product of two distributions, lifted through a
    /// value-level binary function (§4.4, "Binary arithmetic").
    fn map_binary(&self, other: &Distribution, f: impl Fn(&Outcome, &Outcome) -> Option<Outcome>) -> Option<Distribution> {
        let mut out = Distribution::new();
        for (a, wa) in &self.entries {
            for (b, wb) in &other.entries {
                out.add(f(a, b)?, wa * wb);
            }
        }
        Some(out)
    }

    fn scale(&self, factor: f64) -> Distribution {
        Distribution {
            entries: self.entries.iter().map(|(o, w)| (o.clone(), w * factor)).collect(),
        }
    }

    fn merge(mut self, other: Distribution) -> Distribution {
        for (o, w) in other.entries {
            self.add(o, w);
        }
        self
    }

    /// The outcome carrying the most weight — used as a node's
    /// "representative value" for structural decisions (§4.4).
    fn mode_value(&self) -> Value {
        self.entries
            .iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(o, _)| o.to_value())
            .unwrap_or(Value::Empty)
    }

    fn normalized(&self) -> Distribution {
        let total = self.total_weight();
        if total == 0.0 {
            return self.clone();
        }
        self.scale(1.0 / total)
    }

    fn mean(&self) -> Option<f64> {
        let norm = self.normalized();
        let mut acc = 0.0;
        for (o, w) in &norm.entries {
            acc += o.as_f64()? * w;
        }
        Some(acc)
    }
}

/// A fully reduced top-level result: the normalized distribution plus the
/// moments §4.4 specifies when outcomes are numeric.
pub struct Report {
    pub value: Value,
    pub distribution: Distribution,
    pub mean: Option<f64>,
    pub spread: Option<f64>,
    pub mean_deviation: Option<f64>,
}

fn build_report(value: Value, dist: Distribution) -> Report {
    let normalized = dist.normalized();
    let mean = normalized.mean();
    let (spread, mean_deviation) = if let Some(mean) = mean {
        let mut variance = 0.0;
        let mut abs_dev = 0.0;
        for (o, w) in &normalized.entries {
            if let Some(k) = o.as_f64() {
                variance += k * k * w;
                abs_dev += (k - mean).abs() * w;
            }
        }
        variance -= mean * mean;
        (Some(variance.max(0.0).sqrt()), Some(abs_dev))
    } else {
        (None, None)
    };
    Report {
        value,
        distribution: normalized,
        mean,
        spread,
        mean_deviation,
    }
}

type Binding = (Value, Distribution);

/// A scope chain mirroring `internal::scope::ScopeChain`, but carrying a
/// `(Value, Distribution)` pair per binding since every calculator node
/// produces both (§4.4).
struct CalcScope {
    frames: Vec<HashMap<String, Binding>>,
}

impl CalcScope {
    fn new() -> Self {
        CalcScope {
            frames: vec![HashMap::new()],
        }
    }

    fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    fn define(&mut self, name: &str, binding: Binding) {
        self.frames.last_mut().expect("scope is never empty").insert(name.to_string(), binding);
    }

    fn get(&self, name: &str) -> Option<&Binding> {
        self.frames.iter().rev().find_map(|f| f.get(name))
    }
}

pub struct Calculator {
    functions: FunctionTable,
}

impl Calculator {
    pub fn new() -> Self {
        Calculator {
            functions: FunctionTable::new(),
        }
    }

    pub fn run(&mut self, program: &[Stmt], errors: &mut ErrorHandler) -> Vec<Report> {
        let mut scope = CalcScope::new();
        let mut reports = Vec::new();
        for stmt in program {
            if errors.is_fatal() {
                break;
            }
            match stmt {
                Stmt::Function { name, params, body } => {
                    self.functions.define_function(name.clone(), params.clone(), body.clone());
                }
                Stmt::Compositional {
                    name,
                    empty,
                    singleton,
                    union,
                } => {
                    self.functions
                        .define_compositional(name.clone(), empty.clone(), singleton.clone(), union.clone());
                }
                Stmt::Print { expr, .. } | Stmt::Expression(expr) => {
                    if let Some((value, dist)) = eval_expr(&mut scope, &self.functions, expr, errors) {
                        reports.push(build_report(value, dist));
                    }
                }
            }
        }
        reports
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Calculator::new()
    }
}

fn fail(errors: &mut ErrorHandler, message: impl Into<String>) -> Option<(Value, Distribution)> {
    errors.report(ErrorKind::Interpreter, 0, 0, message);
    None
}

fn literal_outcome(lit: &Literal) -> (Value, Outcome) {
    match lit {
        Literal::Int(i) => (Value::Int(*i), Outcome::Scalar(Num::Int(*i))),
        Literal::Float(f) => (Value::Float(*f), Outcome::Scalar(Num::Float(*f))),
        Literal::Str(s) => (Value::Str(s.clone()), Outcome::Scalar(Num::Int(0))),
    }
}

fn eval_expr(scope: &mut CalcScope, functions: &FunctionTable, expr: &Expr, errors: &mut ErrorHandler) -> Option<(Value, Distribution)> {
    match expr {
        Expr::Literal(lit) => {
            let (value, outcome) = literal_outcome(lit);
            Some((value, Distribution::single(outcome, 1.0)))
        }
        Expr::Variable(name) => match scope.get(name) {
            Some((v, d)) => Some((v.clone(), d.clone())),
            None => fail(errors, format!("unbound identifier: {name}")),
        },
        Expr::Grouping(inner) => eval_expr(scope, functions, inner, errors),
        Expr::Unary(op, right) => eval_unary(scope, functions, *op, right, errors),
        Expr::Binary(left, op, right) => eval_binary(scope, functions, left, *op, right, errors),
        Expr::List(items) => eval_list(scope, functions, items, errors),
        Expr::Pair(_, _) => fail(errors, "pairs are not supported in probability mode"),
        Expr::Block(exprs) => {
            scope.push();
            let mut last = None;
            for e in exprs {
                last = eval_expr(scope, functions, e, errors);
                if last.is_none() {
                    break;
                }
            }
            scope.pop();
            last
        }
        Expr::Assign(name, value) => {
            let result = eval_expr(scope, functions, value, errors)?;
            scope.define(name, result.clone());
            Some(result)
        }
        Expr::Conditional(cond, then_branch, else_branch) => {
            eval_conditional(scope, functions, cond, then_branch, else_branch, errors)
        }
        Expr::Foreach { .. } => fail(errors, "foreach has no probability-mass interpretation"),
        Expr::Repeat { .. } => fail(errors, "repeat has no probability-mass interpretation"),
        Expr::Accumulate { .. } => fail(errors, "accumulate has no probability-mass interpretation"),
        Expr::Call { name, args } => eval_call(scope, functions, name, args, errors),
        Expr::TextAlign(..) => fail(errors, "text alignment has no probability-mass interpretation"),
    }
}

fn eval_list(scope: &mut CalcScope, functions: &FunctionTable, items: &[Expr], errors: &mut ErrorHandler) -> Option<(Value, Distribution)> {
    let mut dist = Distribution::single(Outcome::Group(vec![]), 1.0);
    for item in items {
        let (_, item_dist) = eval_expr(scope, functions, item, errors)?;
        dist = dist.map_binary(&item_dist, |acc, next| {
            let Outcome::Group(mut ints) = acc.clone() else {
                unreachable!("accumulator is always built as a Group");
            };
            ints.extend(next.to_ints());
            ints.sort_unstable();
            Some(Outcome::Group(ints))
        })?;
    }
    let value = dist.mode_value();
    Some((value, dist))
}

fn eval_conditional(
    scope: &mut CalcScope,
    functions: &FunctionTable,
    cond: &Expr,
    then_branch: &Expr,
    else_branch: &Expr,
    errors: &mut ErrorHandler,
) -> Option<(Value, Distribution)> {
    let (_, cond_dist) = eval_expr(scope, functions, cond, errors)?;
    let total = cond_dist.total_weight();
    if total == 0.0 {
        return fail(errors, "conditional has no probability mass to branch on");
    }
    let p_true = cond_dist
        .entries
        .iter()
        .filter(|(o, _)| is_truthy_outcome(o))
        .map(|(_, w)| w)
        .sum::<f64>()
        / total;
    let (_, then_dist) = eval_expr(scope, functions, then_branch, errors)?;
    let (_, else_dist) = eval_expr(scope, functions, else_branch, errors)?;
    let combined = then_dist.scale(p_true).merge(else_dist.scale(1.0 - p_true));
    let value = combined.mode_value();
    Some((value, combined))
}

fn is_truthy_outcome(o: &Outcome) -> bool {
    match o {
        Outcome::Scalar(Num::Int(0)) => false,
        Outcome::Scalar(Num::Float(f)) => *f != 0.0,
        Outcome::Group(items) => !items.is_empty(),
        _ => true,
    }
}

fn boolean_outcome(truthy: bool) -> Outcome {
    Outcome::Scalar(Num::Int(if truthy { 1 } else { 0 }))
}

fn eval_call(
    scope: &mut CalcScope,
    functions: &FunctionTable,
    name: &str,
    args: &[Expr],
    errors: &mut ErrorHandler,
) -> Option<(Value, Distribution)> {
    let mut evaluated = Vec::with_capacity(args.len());
    for a in args {
        evaluated.push(eval_expr(scope, functions, a, errors)?);
    }
    match functions.get(name) {
        Some(Definition::Function(f)) => call_function(scope, functions, f, evaluated, errors),
        Some(Definition::Compositional(c)) => call_compositional(scope, functions, c, evaluated, errors),
        None => fail(errors, format!("unknown function: {name}")),
    }
}

fn call_function(
    scope: &mut CalcScope,
    functions: &FunctionTable,
    f: &FunctionDef,
    args: Vec<(Value, Distribution)>,
    errors: &mut ErrorHandler,
) -> Option<(Value, Distribution)> {
    if args.len() != f.params.len() {
        return fail(errors, format!("function expects {} argument(s), got {}", f.params.len(), args.len()));
    }
    scope.push();
    for (param, binding) in f.params.iter().zip(args) {
        scope.define(param, binding);
    }
    let result = eval_expr(scope, functions, &f.body, errors);
    scope.pop();
    result
}

/// Folds over a *deterministic* group argument (a literal list, or any
/// expression whose distribution collapses to one `Group` outcome).
/// Compositional folds over a genuinely random group are out of scope for
/// the calculator — see DESIGN.md.
fn call_compositional(
    scope: &mut CalcScope,
    functions: &FunctionTable,
    c: &CompositionalDef,
    mut args: Vec<(Value, Distribution)>,
    errors: &mut ErrorHandler,
) -> Option<(Value, Distribution)> {
    if args.len() != 1 {
        return fail(errors, "compositional functions take exactly one argument");
    }
    let (arg_value, arg_dist) = args.remove(0);
    let (_, empty_dist) = eval_expr(scope, functions, &c.empty, errors)?;
    match arg_value {
        Value::List(items) => {
            if arg_dist.entries.len() != 1 {
                return fail(errors, "compositional fold over a random group is not supported");
            }
            let mut acc = empty_dist;
            for item in items {
                let item_dist = Distribution::single(value_to_outcome(&item)?, 1.0);
                acc = apply_fold(scope, functions, &c.union, acc, item_dist, errors)?;
            }
            Some((acc.mode_value(), acc))
        }
        _ => {
            let result = apply_fold(scope, functions, &c.singleton, empty_dist, arg_dist, errors)?;
            let value = result.mode_value();
            Some((value, result))
        }
    }
}

fn value_to_outcome(v: &Value) -> Option<Outcome> {
    match v {
        Value::Int(i) => Some(Outcome::Scalar(Num::Int(*i))),
        Value::Float(f) => Some(Outcome::Scalar(Num::Float(*f))),
        Value::List(items) => Some(Outcome::Group(items.iter().filter_map(|i| i.as_i64()).collect())),
        _ => None,
    }
}

fn apply_fold(
    scope: &mut CalcScope,
    functions: &FunctionTable,
    op: &FoldOp,
    left: Distribution,
    right: Distribution,
    errors: &mut ErrorHandler,
) -> Option<Distribution> {
    match op {
        FoldOp::Operator(bin_op) => lift_binary_op(*bin_op, &left, &right, errors),
        FoldOp::Named(name) => match functions.get(name) {
            Some(Definition::Function(f)) => {
                if f.params.len() != 2 {
                    errors.report(ErrorKind::Interpreter, 0, 0, format!("'{name}' must take exactly two parameters"));
                    return None;
                }
                scope.push();
                scope.define(&f.params[0], (left.mode_value(), left));
                scope.define(&f.params[1], (right.mode_value(), right));
                let result = eval_expr(scope, functions, &f.body, errors);
                scope.pop();
                result.map(|(_, d)| d)
            }
            _ => {
                errors.report(ErrorKind::Interpreter, 0, 0, format!("'{name}' is not a usable fold operator"));
                None
            }
        },
    }
}

fn eval_unary(scope: &mut CalcScope, functions: &FunctionTable, op: UnaryOp, right: &Expr, errors: &mut ErrorHandler) -> Option<(Value, Distribution)> {
    if let UnaryOp::Dice(kind) = op {
        let (_, n_dist) = eval_expr(scope, functions, right, errors)?;
        return lift_dice_unary(kind, &n_dist, errors);
    }
    let (_, dist) = eval_expr(scope, functions, right, errors)?;
    let result = match op {
        UnaryOp::Neg => dist.map_unary(|o| Some(Outcome::Scalar(negate_num(o)?))),
        UnaryOp::Not => dist.map_unary(|o| Some(boolean_outcome(!is_truthy_outcome(o)))),
        UnaryOp::Probability => {
            return fail(errors, "probability sampling (?p) has no probability-mass interpretation");
        }
        UnaryOp::Sum => dist.map_unary(|o| Some(Outcome::Scalar(Num::Int(o.to_ints().iter().sum())))),
        UnaryOp::Sgn => dist.map_unary(|o| Some(Outcome::Scalar(Num::Int(o.as_f64()?.signum() as i64)))),
        UnaryOp::Count => dist.map_unary(|o| Some(Outcome::Scalar(Num::Int(o.to_ints().len() as i64)))),
        UnaryOp::Choose => {
            return Some(lift_choose(&dist));
        }
        UnaryOp::Min => dist.map_unary(|o| o.to_ints().into_iter().min().map(|v| Outcome::Scalar(Num::Int(v)))),
        UnaryOp::Max => dist.map_unary(|o| o.to_ints().into_iter().max().map(|v| Outcome::Scalar(Num::Int(v)))),
        UnaryOp::Median => dist.map_unary(|o| lift_median(o)),
        UnaryOp::Minimal => dist.map_unary(|o| lift_extremes(o, false)),
        UnaryOp::Maximal => dist.map_unary(|o| lift_extremes(o, true)),
        UnaryOp::Different => dist.map_unary(|o| {
            let mut ints = o.to_ints();
            ints.sort_unstable();
            ints.dedup();
            Some(Outcome::Group(ints))
        }),
        UnaryOp::Pair1 | UnaryOp::Pair2 => {
            return fail(errors, "pair accessors have no probability-mass interpretation");
        }
        UnaryOp::Dice(_) => unreachable!("handled above"),
    };
    let dist = result.or_else(|| {
        errors.report(ErrorKind::Interpreter, 0, 0, format!("{op:?} could not be lifted over its operand's distribution"));
        None
    })?;
    Some((dist.mode_value(), dist))
}

fn outcome_i64(o: &Outcome) -> Option<i64> {
    o.as_f64().map(|f| f as i64)
}

fn negate_num(o: &Outcome) -> Option<Num> {
    match o {
        Outcome::Scalar(Num::Int(i)) => Some(Num::Int(-i)),
        Outcome::Scalar(Num::Float(f)) => Some(Num::Float(-f)),
        Outcome::Group(_) => None,
    }
}

fn lift_median(o: &Outcome) -> Option<Outcome> {
    let mut ints = o.to_ints();
    if ints.is_empty() {
        return None;
    }
    ints.sort_unstable();
    let mid = ints.len() / 2;
    if ints.len() % 2 == 1 {
        Some(Outcome::Scalar(Num::Int(ints[mid])))
    } else {
        Some(Outcome::Scalar(Num::Float((ints[mid - 1] + ints[mid]) as f64 / 2.0)))
    }
}

fn lift_extremes(o: &Outcome, want_max: bool) -> Option<Outcome> {
    let ints = o.to_ints();
    let target = if want_max { ints.iter().copied().max() } else { ints.iter().copied().min() }?;
    Some(Outcome::Group(ints.into_iter().filter(|i| *i == target).collect()))
}

/// `choose` picks one element uniformly: a `Group` outcome's weight
/// splits evenly across its members (§4.3/§4.4 — the calculator's lift of
/// a random selection is a weighted split, not a single branch).
fn lift_choose(dist: &Distribution) -> (Value, Distribution) {
    let mut out = Distribution::new();
    for (o, w) in &dist.entries {
        let ints = o.to_ints();
        if ints.is_empty() {
            continue;
        }
        let share = w / ints.len() as f64;
        for i in ints {
            out.add(Outcome::Scalar(Num::Int(i)), share);
        }
    }
    (out.mode_value(), out)
}

fn lift_dice_unary(kind: DiceKind, n_dist: &Distribution, errors: &mut ErrorHandler) -> Option<(Value, Distribution)> {
    let mut out = Distribution::new();
    for (n_outcome, w) in &n_dist.entries {
        let n = outcome_i64(n_outcome)?;
        let die = uniform_die(kind, n);
        for (face, fw) in die.entries {
            out.add(face, fw * w);
        }
    }
    if out.entries.is_empty() {
        return fail(errors, "die size must be numeric");
    }
    Some((out.mode_value(), out))
}

fn uniform_die(kind: DiceKind, n: i64) -> Distribution {
    let start: i64 = match kind {
        DiceKind::Standard => 1,
        DiceKind::ZeroBased => 0,
    };
    let mut dist = Distribution::new();
    for face in start..start + n.max(0) {
        dist.add(Outcome::Scalar(Num::Int(face)), 1.0);
    }
    dist
}

/// `M d N` as a Cartesian convolution of `M` independent uniform draws,
/// keyed by the sorted tuple of results (§4.4, "Binary dice"). Repeated
/// insertion naturally accumulates the multinomial weight of each sorted
/// group — no combinatorial formula needed.
fn dice_group_distribution(kind: DiceKind, m: i64, n: i64) -> Distribution {
    let die = uniform_die(kind, n);
    let mut dist = Distribution::single(Outcome::Group(vec![]), 1.0);
    for _ in 0..m.max(0) {
        let mut next = Distribution::new();
        for (group, gw) in &dist.entries {
            let Outcome::Group(g) = group else { continue };
            for (face, fw) in &die.entries {
                let mut ng = g.clone();
                ng.push(outcome_i64(face).unwrap_or(0));
                ng.sort_unstable();
                next.add(Outcome::Group(ng), gw * fw);
            }
        }
        dist = next;
    }
    dist
}

fn eval_binary(
    scope: &mut CalcScope,
    functions: &FunctionTable,
    left: &Expr,
    op: BinaryOp,
    right: &Expr,
    errors: &mut ErrorHandler,
) -> Option<(Value, Distribution)> {
    if let BinaryOp::Dice(kind) = op {
        let (_, m_dist) = eval_expr(scope, functions, left, errors)?;
        let (_, n_dist) = eval_expr(scope, functions, right, errors)?;
        let mut out = Distribution::new();
        for (m_o, mw) in &m_dist.entries {
            for (n_o, nw) in &n_dist.entries {
                let m = outcome_i64(m_o)?;
                let n = outcome_i64(n_o)?;
                let group_dist = dice_group_distribution(kind, m, n);
                for (g, gw) in group_dist.entries {
                    out.add(g, gw * mw * nw);
                }
            }
        }
        return Some((out.mode_value(), out));
    }
    if op == BinaryOp::Samples {
        let (_, k_dist) = eval_expr(scope, functions, left, errors)?;
        let mut out = Distribution::new();
        for (k_o, kw) in &k_dist.entries {
            let k = outcome_i64(k_o)?.max(0);
            let mut acc = Distribution::single(Outcome::Group(vec![]), 1.0);
            for _ in 0..k {
                let (_, sample_dist) = eval_expr(scope, functions, right, errors)?;
                acc = acc.map_binary(&sample_dist, |g, s| {
                    let Outcome::Group(mut ints) = g.clone() else { return None };
                    ints.extend(s.to_ints());
                    ints.sort_unstable();
                    Some(Outcome::Group(ints))
                })?;
            }
            for (g, w) in acc.entries {
                out.add(g, w * kw);
            }
        }
        return Some((out.mode_value(), out));
    }
    if let BinaryOp::Largest | BinaryOp::Least = op {
        let (_, k_dist) = eval_expr(scope, functions, left, errors)?;
        let (_, target_dist) = eval_expr(scope, functions, right, errors)?;
        let want_largest = op == BinaryOp::Largest;
        let result = k_dist.map_binary(&target_dist, |k_o, target| {
            let k = outcome_i64(k_o)?.max(0) as usize;
            let mut ints = target.to_ints();
            ints.sort_unstable();
            let take = k.min(ints.len());
            let selected: Vec<i64> = if want_largest {
                ints.into_iter().rev().take(take).collect()
            } else {
                ints.into_iter().take(take).collect()
            };
            Some(Outcome::Group(selected))
        })?;
        return Some((result.mode_value(), result));
    }
    if op == BinaryOp::Pick {
        return fail(errors, "pick has no deterministic probability-mass lift; see DESIGN.md");
    }
    let (_, left_dist) = eval_expr(scope, functions, left, errors)?;
    let (_, right_dist) = eval_expr(scope, functions, right, errors)?;
    if op == BinaryOp::And || op == BinaryOp::DefaultOp {
        return lift_short_circuit(op, &left_dist, &right_dist).map(|d| (d.mode_value(), d));
    }
    let dist = lift_binary_op(op, &left_dist, &right_dist, errors)?;
    Some((dist.mode_value(), dist))
}

/// `&` and `~` are lazy under sampling, but a distribution must still
/// account for every possible world — both operands are evaluated and
/// combined with the same truth table the lazy interpreter would have
/// produced value-by-value (§5, §9 Open Questions).
fn lift_short_circuit(op: BinaryOp, left: &Distribution, right: &Distribution) -> Option<Distribution> {
    let right_total = right.total_weight();
    let mut out = Distribution::new();
    for (l, lw) in &left.entries {
        let l_truthy = is_truthy_outcome(l);
        match op {
            BinaryOp::And if !l_truthy => out.add(boolean_outcome(false), lw * right_total),
            BinaryOp::DefaultOp if l_truthy => out.add(l.clone(), lw * right_total),
            _ => {
                for (r, rw) in &right.entries {
                    let outcome = match op {
                        BinaryOp::And => boolean_outcome(is_truthy_outcome(r)),
                        BinaryOp::DefaultOp => r.clone(),
                        _ => unreachable!(),
                    };
                    out.add(outcome, lw * rw);
                }
            }
        }
    }
    Some(out)
}

fn lift_binary_op(op: BinaryOp, left: &Distribution, right: &Distribution, errors: &mut ErrorHandler) -> Option<Distribution> {
    let result = match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            left.map_binary(right, |a, b| lift_arithmetic(op, a, b))
        }
        BinaryOp::Union => left.map_binary(right, |a, b| {
            let mut ints = a.to_ints();
            ints.extend(b.to_ints());
            ints.sort_unstable();
            Some(Outcome::Group(ints))
        }),
        BinaryOp::Difference => left.map_binary(right, |a, b| {
            let mut ints = a.to_ints();
            for x in b.to_ints() {
                if let Some(pos) = ints.iter().position(|v| *v == x) {
                    ints.remove(pos);
                }
            }
            Some(Outcome::Group(ints))
        }),
        BinaryOp::Drop => left.map_binary(right, |a, b| membership_lift(a, b, false)),
        BinaryOp::Keep => left.map_binary(right, |a, b| membership_lift(a, b, true)),
        BinaryOp::Range => left.map_binary(right, |a, b| {
            let (lo, hi) = (outcome_i64(a)?, outcome_i64(b)?);
            let ints = if lo <= hi { (lo..=hi).collect() } else { (hi..=lo).rev().collect() };
            Some(Outcome::Group(ints))
        }),
        BinaryOp::Equal
        | BinaryOp::NotEqual
        | BinaryOp::LessThan
        | BinaryOp::LessThanOrEqual
        | BinaryOp::GreaterThan
        | BinaryOp::GreaterThanOrEqual => left.map_binary(right, |a, b| lift_compare(op, a, b)),
        // Reached only from a compositional fold, where both operands are
        // already-materialized distributions — the short-circuit in
        // `lift_short_circuit` doesn't apply since there's no unevaluated
        // right-hand expression to skip.
        BinaryOp::And | BinaryOp::DefaultOp => {
            left.map_binary(right, |a, b| Some(if is_truthy_outcome(a) { a.clone() } else { b.clone() }))
        }
        _ => None,
    };
    result.or_else(|| {
        errors.report(ErrorKind::Interpreter, 0, 0, format!("{op:?} could not be lifted over its operands' distributions"));
        None
    })
}

fn lift_arithmetic(op: BinaryOp, a: &Outcome, b: &Outcome) -> Option<Outcome> {
    let (x, y) = (a.as_f64()?, b.as_f64()?);
    let both_int = matches!(a, Outcome::Scalar(Num::Int(_))) && matches!(b, Outcome::Scalar(Num::Int(_)));
    match op {
        BinaryOp::Div if both_int => {
            let bi = outcome_i64(b)?;
            if bi == 0 {
                return None;
            }
            Some(Outcome::Scalar(Num::Int(outcome_i64(a)? / bi)))
        }
        BinaryOp::Mod if both_int => {
            let bi = outcome_i64(b)?;
            if bi == 0 {
                return None;
            }
            Some(Outcome::Scalar(Num::Int(outcome_i64(a)?.rem_euclid(bi))))
        }
        BinaryOp::Mod => Some(Outcome::Scalar(Num::Float(x - y * (x / y).floor()))),
        _ => {
            let r = match op {
                BinaryOp::Add => x + y,
                BinaryOp::Sub => x - y,
                BinaryOp::Mul => x * y,
                BinaryOp::Div => x / y,
                _ => unreachable!(),
            };
            Some(if both_int && op != BinaryOp::Div {
                Outcome::Scalar(Num::Int(r as i64))
            } else {
                Outcome::Scalar(Num::Float(r))
            })
        }
    }
}

fn lift_compare(op: BinaryOp, a: &Outcome, b: &Outcome) -> Option<Outcome> {
    // A scalar-versus-group comparison filters the group element-wise,
    // mirroring the sampling interpreter's `compare_values` (§4.3).
    match (a, b) {
        (Outcome::Group(_), Outcome::Group(_)) => None,
        (Outcome::Group(items), scalar) => {
            let s = scalar.as_f64()?;
            Some(Outcome::Group(items.iter().copied().filter(|i| compare_f64(op, *i as f64, s)).collect()))
        }
        (scalar, Outcome::Group(items)) => {
            let s = scalar.as_f64()?;
            Some(Outcome::Group(items.iter().copied().filter(|i| compare_f64(op, s, *i as f64)).collect()))
        }
        (sa, sb) => {
            let truthy = if op == BinaryOp::Equal {
                sa == sb
            } else if op == BinaryOp::NotEqual {
                sa != sb
            } else {
                compare_f64(op, sa.as_f64()?, sb.as_f64()?)
            };
            Some(boolean_outcome(truthy))
        }
    }
}

fn compare_f64(op: BinaryOp, x: f64, y: f64) -> bool {
    match op {
        BinaryOp::Equal => x == y,
        BinaryOp::NotEqual => x != y,
        BinaryOp::LessThan => x < y,
        BinaryOp::LessThanOrEqual => x <= y,
        BinaryOp::GreaterThan => x > y,
        BinaryOp::GreaterThanOrEqual => x >= y,
        _ => false,
    }
}

fn membership_lift(a: &Outcome, b: &Outcome, keep_matches: bool) -> Option<Outcome> {
    let b_ints = b.to_ints();
    Some(Outcome::Group(a.to_ints().into_iter().filter(|i| b_ints.contains(i) == keep_matches).collect()))
}
