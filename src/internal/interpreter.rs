//! The sampling interpreter (§4.3): a tree-walking visitor returning a
//! concrete [`Value`] for each statement, using an injected
//! [`RandomSource`] or, in average mode, the expected value of every
//! random draw.
//!
//! Dispatch is a single exhaustive match per node family — no reflection,
//! per the visitor-dispatch design note. Interpreter-phase errors report
//! position `(0, 0)`: the AST in §3 carries no source positions on
//! expression nodes (only tokens do, and those are gone by the time this
//! visitor runs), so a type violation can only be attributed to the
//! evaluation as a whole, not a source offset.
//!
//! Every recursive entry point takes `scope: &mut ScopeChain` explicitly
//! rather than living on `&mut self`: a scope push returns a
//! [`ScopeGuard`] that exclusively borrows the chain it came from, and a
//! method that also needed `&mut self` for the rest of the walk would
//! conflict with that borrow the moment it tried to recurse. Threading
//! the chain as a plain parameter lets nested pushes compose (`guard.push()`
//! borrows through the outer guard's `DerefMut`) without ever re-borrowing
//! `self`.

use crate::internal::ast::{BinaryOp, DiceKind, Expr, FoldOp, RepeatKind, Stmt, UnaryOp};
use crate::internal::errors::{ErrorHandler, ErrorKind};
use crate::internal::functions::{CompositionalDef, Definition, FunctionDef, FunctionTable};
use crate::internal::random::RandomSource;
use crate::internal::scope::ScopeChain;
use crate::internal::tokens::Literal;
use crate::internal::value::{text_align, Value};

pub struct Interpreter<'a> {
    functions: FunctionTable,
    random: &'a mut dyn RandomSource,
    average: bool,
}

impl<'a> Interpreter<'a> {
    pub fn new(random: &'a mut dyn RandomSource, average: bool) -> Self {
        Interpreter {
            functions: FunctionTable::new(),
            random,
            average,
        }
    }

    /// Evaluates every statement in source order, returning one value per
    /// statement that produces one (function/compositional declarations
    /// produce none). An interpreter error is fatal for the rest of the
    /// evaluation (§7).
    pub fn run(&mut self, program: &[Stmt], errors: &mut ErrorHandler) -> Vec<Value> {
        let mut scope = ScopeChain::new();
        let mut results = Vec::new();
        for stmt in program {
            if errors.is_fatal() {
                break;
            }
            match stmt {
                Stmt::Function { name, params, body } => {
                    self.functions
                        .define_function(name.clone(), params.clone(), body.clone());
                }
                Stmt::Compositional {
                    name,
                    empty,
                    singleton,
                    union,
                } => {
                    self.functions.define_compositional(
                        name.clone(),
                        empty.clone(),
                        singleton.clone(),
                        union.clone(),
                    );
                }
                Stmt::Print { expr, repeats } => {
                    if let Some(value) =
                        eval_expr(&mut scope, &self.functions, self.random, self.average, expr, errors)
                    {
                        let rendered = match repeats {
                            Some(count_expr) => {
                                match eval_expr(
                                    &mut scope,
                                    &self.functions,
                                    self.random,
                                    self.average,
                                    count_expr,
                                    errors,
                                )
                                .and_then(|v| v.as_i64())
                                {
                                    Some(n) => Value::List(vec![value; n.max(0) as usize]),
                                    None => continue,
                                }
                            }
                            None => value,
                        };
                        results.push(rendered);
                    }
                }
                Stmt::Expression(expr) => {
                    if let Some(value) =
                        eval_expr(&mut scope, &self.functions, self.random, self.average, expr, errors)
                    {
                        results.push(value);
                    }
                }
            }
        }
        results
    }
}

fn fail(errors: &mut ErrorHandler, message: impl Into<String>) -> Option<Value> {
    errors.report(ErrorKind::Interpreter, 0, 0, message);
    None
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Int(i) => Value::Int(*i),
        Literal::Float(f) => Value::Float(*f),
        Literal::Str(s) => Value::Str(s.clone()),
    }
}

fn eval_expr(
    scope: &mut ScopeChain,
    functions: &FunctionTable,
    random: &mut dyn RandomSource,
    average: bool,
    expr: &Expr,
    errors: &mut ErrorHandler,
) -> Option<Value> {
    match expr {
        Expr::Literal(lit) => Some(literal_value(lit)),
        Expr::Variable(name) => match scope.get(name) {
            Some(v) => Some(v.clone()),
            None => fail(errors, format!("unbound identifier: {name}")),
        },
        Expr::Grouping(inner) => eval_expr(scope, functions, random, average, inner, errors),
        Expr::Unary(op, right) => eval_unary(scope, functions, random, average, *op, right, errors),
        Expr::Binary(left, op, right) => {
            eval_binary(scope, functions, random, average, left, *op, right, errors)
        }
        Expr::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match eval_expr(scope, functions, random, average, item, errors)? {
                    Value::List(inner) => out.extend(inner),
                    other => out.push(other),
                }
            }
            Some(Value::List(out))
        }
        Expr::Pair(a, b) => {
            let a = eval_expr(scope, functions, random, average, a, errors)?;
            let b = eval_expr(scope, functions, random, average, b, errors)?;
            Some(Value::pair(a, b))
        }
        Expr::Block(exprs) => {
            let mut guard = scope.push();
            let mut last = Value::Empty;
            for e in exprs {
                last = eval_expr(&mut guard, functions, random, average, e, errors)?;
            }
            Some(last)
        }
        Expr::Assign(name, value) => {
            let v = eval_expr(scope, functions, random, average, value, errors)?;
            scope.define(name, v.clone());
            Some(v)
        }
        Expr::Conditional(cond, then_branch, else_branch) => {
            let c = eval_expr(scope, functions, random, average, cond, errors)?;
            if c.is_truthy() {
                eval_expr(scope, functions, random, average, then_branch, errors)
            } else {
                eval_expr(scope, functions, random, average, else_branch, errors)
            }
        }
        Expr::Foreach { var, source, body } => {
            let list = eval_expr(scope, functions, random, average, source, errors)?.into_bag();
            let mut guard = scope.push();
            let mut results = Vec::with_capacity(list.len());
            for item in list {
                guard.define(var, item);
                results.push(eval_expr(&mut guard, functions, random, average, body, errors)?);
            }
            Some(Value::List(results))
        }
        Expr::Repeat {
            kind,
            action,
            qualifier,
        } => eval_repeat(scope, functions, random, average, *kind, action, qualifier, errors),
        Expr::Accumulate { action, qualifier } => {
            eval_accumulate(scope, functions, random, average, action, qualifier, errors)
        }
        Expr::Call { name, args } => eval_call(scope, functions, random, average, name, args, errors),
        Expr::TextAlign(left, op, right) => {
            let l = eval_expr(scope, functions, random, average, left, errors)?;
            let r = eval_expr(scope, functions, random, average, right, errors)?;
            Some(text_align(&l, &r, *op))
        }
    }
}

/// `repeat x := action while/until q` evaluates `action` (an assignment
/// into `x`) at least once in the *current* frame — the loop introduces
/// no scope of its own, since the whole point is that `x` outlives it
/// (§4.3, "returns the final value of `x`").
fn eval_repeat(
    scope: &mut ScopeChain,
    functions: &FunctionTable,
    random: &mut dyn RandomSource,
    average: bool,
    kind: RepeatKind,
    action: &Expr,
    qualifier: &Expr,
    errors: &mut ErrorHandler,
) -> Option<Value> {
    let var_name = match action {
        Expr::Assign(name, _) => name.clone(),
        _ => return fail(errors, "repeat action must be an assignment"),
    };
    loop {
        eval_expr(scope, functions, random, average, action, errors)?;
        if average {
            break;
        }
        let q = eval_expr(scope, functions, random, average, qualifier, errors)?.is_truthy();
        let keep_going = match kind {
            RepeatKind::While => q,
            RepeatKind::Until => !q,
        };
        if !keep_going {
            break;
        }
    }
    scope.get(&var_name).cloned().or_else(|| fail(errors, format!("unbound identifier: {var_name}")))
}

fn eval_accumulate(
    scope: &mut ScopeChain,
    functions: &FunctionTable,
    random: &mut dyn RandomSource,
    average: bool,
    action: &Expr,
    qualifier: &Expr,
    errors: &mut ErrorHandler,
) -> Option<Value> {
    let mut results = Vec::new();
    loop {
        results.push(eval_expr(scope, functions, random, average, action, errors)?);
        if average {
            break;
        }
        if !eval_expr(scope, functions, random, average, qualifier, errors)?.is_truthy() {
            break;
        }
    }
    Some(Value::List(results))
}

fn eval_call(
    scope: &mut ScopeChain,
    functions: &FunctionTable,
    random: &mut dyn RandomSource,
    average: bool,
    name: &str,
    args: &[Expr],
    errors: &mut ErrorHandler,
) -> Option<Value> {
    let mut values = Vec::with_capacity(args.len());
    for a in args {
        values.push(eval_expr(scope, functions, random, average, a, errors)?);
    }
    match functions.get(name) {
        Some(Definition::Function(f)) => call_function(scope, functions, random, average, f, values, errors),
        Some(Definition::Compositional(c)) => {
            call_compositional(scope, functions, random, average, c, values, errors)
        }
        None => fail(errors, format!("unknown function: {name}")),
    }
}

fn call_function(
    scope: &mut ScopeChain,
    functions: &FunctionTable,
    random: &mut dyn RandomSource,
    average: bool,
    f: &FunctionDef,
    args: Vec<Value>,
    errors: &mut ErrorHandler,
) -> Option<Value> {
    if args.len() != f.params.len() {
        return fail(
            errors,
            format!("function expects {} argument(s), got {}", f.params.len(), args.len()),
        );
    }
    let mut guard = scope.push();
    for (param, value) in f.params.iter().zip(args) {
        guard.define(param, value);
    }
    eval_expr(&mut guard, functions, random, average, &f.body, errors)
}

/// `f(x)` on a non-list argument applies `singleton(x)` over `empty`; on a
/// list, folds with `union` starting from `empty` (§4.3, "Functions").
fn call_compositional(
    scope: &mut ScopeChain,
    functions: &FunctionTable,
    random: &mut dyn RandomSource,
    average: bool,
    c: &CompositionalDef,
    mut args: Vec<Value>,
    errors: &mut ErrorHandler,
) -> Option<Value> {
    if args.len() != 1 {
        return fail(errors, "compositional functions take exactly one argument");
    }
    let arg = args.remove(0);
    let empty_value = eval_expr(scope, functions, random, average, &c.empty, errors)?;
    match arg {
        Value::List(items) => {
            let mut acc = empty_value;
            for item in items {
                acc = apply_fold(scope, functions, random, average, &c.union, acc, item, errors)?;
            }
            Some(acc)
        }
        scalar => apply_fold(scope, functions, random, average, &c.singleton, empty_value, scalar, errors),
    }
}

fn apply_fold(
    scope: &mut ScopeChain,
    functions: &FunctionTable,
    random: &mut dyn RandomSource,
    average: bool,
    op: &FoldOp,
    left: Value,
    right: Value,
    errors: &mut ErrorHandler,
) -> Option<Value> {
    match op {
        FoldOp::Operator(bin_op) => apply_binary_values(*bin_op, left, right, errors),
        FoldOp::Named(name) => match functions.get(name) {
            Some(Definition::Function(f)) => {
                if f.params.len() != 2 {
                    return fail(errors, format!("'{name}' must take exactly two parameters"));
                }
                let mut guard = scope.push();
                guard.define(&f.params[0], left);
                guard.define(&f.params[1], right);
                eval_expr(&mut guard, functions, random, average, &f.body, errors)
            }
            Some(Definition::Compositional(_)) => {
                fail(errors, format!("'{name}' is compositional, not a 2-argument function"))
            }
            None => fail(errors, format!("unknown function: {name}")),
        },
    }
}

fn eval_unary(
    scope: &mut ScopeChain,
    functions: &FunctionTable,
    random: &mut dyn RandomSource,
    average: bool,
    op: UnaryOp,
    right: &Expr,
    errors: &mut ErrorHandler,
) -> Option<Value> {
    if let UnaryOp::Dice(kind) = op {
        let side = eval_expr(scope, functions, random, average, right, errors)?;
        let n = match side.as_i64() {
            Some(n) => n,
            None => return fail(errors, "d requires an integer die size"),
        };
        return Some(roll_dice(random, average, kind, n));
    }
    if op == UnaryOp::Probability {
        let arg = eval_expr(scope, functions, random, average, right, errors)?;
        let p = match arg.as_f64() {
            Some(p) => p,
            None => return fail(errors, "?p requires a numeric probability"),
        };
        return Some(eval_probability(random, average, p));
    }
    let v = eval_expr(scope, functions, random, average, right, errors)?;
    match op {
        UnaryOp::Neg => negate(&v).or_else(|| fail(errors, "- requires a numeric operand")),
        UnaryOp::Not => Some(if v.is_truthy() { Value::Empty } else { Value::Int(1) }),
        UnaryOp::Sum => Some(sum_bag(v.as_bag())),
        UnaryOp::Sgn => match v.as_f64() {
            Some(f) => Some(Value::Int(f.signum() as i64)),
            None => fail(errors, "sgn requires a numeric operand"),
        },
        UnaryOp::Count => Some(Value::Int(v.as_bag().len() as i64)),
        UnaryOp::Choose => Some(choose(random, average, v.as_bag())),
        UnaryOp::Min => numeric_extreme(v.as_bag(), false),
        UnaryOp::Max => numeric_extreme(v.as_bag(), true),
        UnaryOp::Median => median(v.as_bag()),
        UnaryOp::Minimal => extremes(v.as_bag(), false),
        UnaryOp::Maximal => extremes(v.as_bag(), true),
        UnaryOp::Different => Some(unique(v.as_bag())),
        UnaryOp::Pair1 => pair_component(&v, true, errors),
        UnaryOp::Pair2 => pair_component(&v, false, errors),
        UnaryOp::Probability | UnaryOp::Dice(_) => unreachable!("handled above"),
    }
}

fn eval_binary(
    scope: &mut ScopeChain,
    functions: &FunctionTable,
    random: &mut dyn RandomSource,
    average: bool,
    left: &Expr,
    op: BinaryOp,
    right: &Expr,
    errors: &mut ErrorHandler,
) -> Option<Value> {
    // Lazy operators: the right operand is not always evaluated (§5).
    if op == BinaryOp::And {
        let l = eval_expr(scope, functions, random, average, left, errors)?;
        if !l.is_truthy() {
            return Some(Value::Empty);
        }
        let r = eval_expr(scope, functions, random, average, right, errors)?;
        return Some(if r.is_truthy() { r } else { Value::Empty });
    }
    if op == BinaryOp::DefaultOp {
        let l = eval_expr(scope, functions, random, average, left, errors)?;
        if l.is_truthy() {
            return Some(l);
        }
        return eval_expr(scope, functions, random, average, right, errors);
    }
    if let BinaryOp::Dice(kind) = op {
        let m = eval_expr(scope, functions, random, average, left, errors)?.as_i64()?;
        let n = eval_expr(scope, functions, random, average, right, errors)?.as_i64()?;
        return Some(roll_dice_many(random, average, kind, m, n));
    }
    if op == BinaryOp::Samples {
        let k = eval_expr(scope, functions, random, average, left, errors)?.as_i64()?;
        let mut out = Vec::new();
        for _ in 0..k.max(0) {
            match eval_expr(scope, functions, random, average, right, errors)? {
                Value::List(inner) => out.extend(inner),
                other => out.push(other),
            }
        }
        return Some(Value::List(out));
    }
    if let BinaryOp::Largest | BinaryOp::Least = op {
        let k = eval_expr(scope, functions, random, average, left, errors)?.as_i64()?;
        let target = eval_expr(scope, functions, random, average, right, errors)?;
        return select_extreme(target.as_bag(), k, op == BinaryOp::Largest, errors);
    }
    if op == BinaryOp::Pick {
        let list = eval_expr(scope, functions, random, average, left, errors)?.as_bag();
        let k = eval_expr(scope, functions, random, average, right, errors)?.as_i64()?;
        return Some(pick(random, average, list, k));
    }
    let l = eval_expr(scope, functions, random, average, left, errors)?;
    let r = eval_expr(scope, functions, random, average, right, errors)?;
    apply_binary_values(op, l, r, errors)
}

/// The operators that need no evaluator state (no RNG, no scope) — shared
/// between ordinary `Binary` evaluation and a compositional fold's
/// `singleton`/`union` when it names an operator token directly.
fn apply_binary_values(op: BinaryOp, left: Value, right: Value, errors: &mut ErrorHandler) -> Option<Value> {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            arithmetic(op, &left, &right, errors)
        }
        BinaryOp::Union => {
            let mut out = left.into_bag();
            out.extend(right.into_bag());
            Some(Value::List(out))
        }
        BinaryOp::Difference => Some(Value::List(bag_difference(left.into_bag(), right.into_bag()))),
        BinaryOp::Drop => Some(Value::List(membership_filter(left.into_bag(), right.into_bag(), false))),
        BinaryOp::Keep => Some(Value::List(membership_filter(left.into_bag(), right.into_bag(), true))),
        BinaryOp::Range => Some(range(&left, &right, errors)?),
        BinaryOp::Equal
        | BinaryOp::NotEqual
        | BinaryOp::LessThan
        | BinaryOp::LessThanOrEqual
        | BinaryOp::GreaterThan
        | BinaryOp::GreaterThanOrEqual => compare_values(op, left, right, errors),
        BinaryOp::Largest | BinaryOp::Least | BinaryOp::Pick | BinaryOp::Dice(_) | BinaryOp::Samples => {
            fail(errors, format!("{op:?} cannot be used as a fold operator"))
        }
        BinaryOp::And | BinaryOp::DefaultOp => {
            Some(if left.is_truthy() { left } else { right })
        }
    }
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value, errors: &mut ErrorHandler) -> Option<Value> {
    let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
        return fail(errors, format!("{op:?} requires numeric operands"));
    };
    let both_int = matches!(left, Value::Int(_)) && matches!(right, Value::Int(_));
    if op == BinaryOp::Div && both_int {
        let bi = right.as_i64().unwrap_or(0);
        if bi == 0 {
            return fail(errors, "division by zero");
        }
        let ai = left.as_i64().unwrap_or(0);
        return Some(Value::Int(ai / bi));
    }
    if op == BinaryOp::Mod {
        if both_int {
            let bi = right.as_i64().unwrap_or(0);
            if bi == 0 {
                return fail(errors, "division by zero");
            }
            let ai = left.as_i64().unwrap_or(0);
            return Some(Value::Int(ai.rem_euclid(bi)));
        }
        return Some(Value::Float(a - b * (a / b).floor()));
    }
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => unreachable!(),
    };
    if both_int && op != BinaryOp::Div {
        Some(Value::Int(result as i64))
    } else {
        Some(Value::Float(result))
    }
}

fn negate(v: &Value) -> Option<Value> {
    match v {
        Value::Int(i) => Some(Value::Int(-i)),
        Value::Float(f) => Some(Value::Float(-f)),
        _ => None,
    }
}

fn compare_scalars(op: BinaryOp, a: &Value, b: &Value) -> Option<bool> {
    match op {
        BinaryOp::Equal => Some(a == b),
        BinaryOp::NotEqual => Some(a != b),
        _ => {
            let (x, y) = (a.as_f64()?, b.as_f64()?);
            Some(match op {
                BinaryOp::LessThan => x < y,
                BinaryOp::LessThanOrEqual => x <= y,
                BinaryOp::GreaterThan => x > y,
                BinaryOp::GreaterThanOrEqual => x >= y,
                _ => unreachable!(),
            })
        }
    }
}

fn to_boolean_value(b: bool) -> Value {
    if b {
        Value::Int(1)
    } else {
        Value::Empty
    }
}

/// A comparison with a scalar on one side and a list on the other filters
/// the list element-wise, keeping elements for which the comparison holds
/// against the scalar (§4.3). Scalar-scalar comparisons instead collapse
/// to the boolean sentinel convention used throughout the language
/// (`Int(1)`/`Empty`).
fn filter_by_scalar(
    op: BinaryOp,
    scalar: &Value,
    items: Vec<Value>,
    scalar_on_left: bool,
    errors: &mut ErrorHandler,
) -> Option<Value> {
    let mut kept = Vec::with_capacity(items.len());
    for item in items {
        let matched = if scalar_on_left {
            compare_scalars(op, scalar, &item)
        } else {
            compare_scalars(op, &item, scalar)
        };
        match matched {
            Some(true) => kept.push(item),
            Some(false) => {}
            None => return fail(errors, format!("{op:?} requires numeric operands")),
        }
    }
    Some(Value::List(kept))
}

fn compare_values(op: BinaryOp, left: Value, right: Value, errors: &mut ErrorHandler) -> Option<Value> {
    match (left, right) {
        (Value::List(_), Value::List(_)) => fail(errors, format!("{op:?} cannot compare two lists")),
        (scalar, Value::List(items)) => filter_by_scalar(op, &scalar, items, true, errors),
        (Value::List(items), scalar) => filter_by_scalar(op, &scalar, items, false, errors),
        (left, right) => Some(to_boolean_value(compare_scalars(op, &left, &right)?)),
    }
}

fn bag_difference(mut left: Vec<Value>, right: Vec<Value>) -> Vec<Value> {
    for item in right {
        if let Some(pos) = left.iter().position(|v| *v == item) {
            left.remove(pos);
        }
    }
    left
}

fn membership_filter(left: Vec<Value>, right: Vec<Value>, keep_matches: bool) -> Vec<Value> {
    left.into_iter()
        .filter(|v| right.contains(v) == keep_matches)
        .collect()
}

fn range(left: &Value, right: &Value, errors: &mut ErrorHandler) -> Option<Value> {
    let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) else {
        return fail(errors, "range bounds must be integers");
    };
    let items = if a <= b {
        (a..=b).map(Value::Int).collect()
    } else {
        (b..=a).rev().map(Value::Int).collect()
    };
    Some(Value::List(items))
}

fn sum_bag(items: Vec<Value>) -> Value {
    let mut int_total = 0i64;
    let mut float_total = 0.0;
    let mut saw_float = false;
    for item in &items {
        match item {
            Value::Float(f) => {
                saw_float = true;
                float_total += f;
            }
            other => {
                if let Some(i) = other.as_i64() {
                    int_total += i;
                }
            }
        }
    }
    if saw_float {
        Value::Float(float_total + int_total as f64)
    } else {
        Value::Int(int_total)
    }
}

fn choose(random: &mut dyn RandomSource, average: bool, items: Vec<Value>) -> Value {
    if items.is_empty() {
        return Value::Empty;
    }
    let idx = if average {
        (items.len() - 1) / 2
    } else {
        random.int_range(0, items.len() as i64 - 1) as usize
    };
    items[idx].clone()
}

fn numeric_extreme(items: Vec<Value>, want_max: bool) -> Option<Value> {
    items
        .into_iter()
        .filter_map(|v| v.as_f64().map(|f| (f, v)))
        .reduce(|best, cur| {
            if (want_max && cur.0 > best.0) || (!want_max && cur.0 < best.0) {
                cur
            } else {
                best
            }
        })
        .map(|(_, v)| v)
        .or(Some(Value::Empty))
}

fn median(items: Vec<Value>) -> Option<Value> {
    let mut values: Vec<f64> = items.iter().filter_map(|v| v.as_f64()).collect();
    if values.is_empty() {
        return Some(Value::Empty);
    }
    values.sort_by(|a, b| a.partial_cmp(b).expect("dice and arithmetic values are never NaN"));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(Value::Float(values[mid]))
    } else {
        Some(Value::Float((values[mid - 1] + values[mid]) / 2.0))
    }
}

fn extremes(items: Vec<Value>, want_max: bool) -> Option<Value> {
    let keyed: Vec<(f64, Value)> = items.into_iter().filter_map(|v| v.as_f64().map(|f| (f, v))).collect();
    if keyed.is_empty() {
        return Some(Value::List(vec![]));
    }
    let target = keyed
        .iter()
        .map(|(f, _)| *f)
        .fold(
            if want_max { f64::NEG_INFINITY } else { f64::INFINITY },
            |acc, f| if want_max { acc.max(f) } else { acc.min(f) },
        );
    Some(Value::List(
        keyed
            .into_iter()
            .filter(|(f, _)| *f == target)
            .map(|(_, v)| v)
            .collect(),
    ))
}

fn unique(items: Vec<Value>) -> Value {
    let mut out: Vec<Value> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    Value::List(out)
}

fn pair_component(v: &Value, first: bool, errors: &mut ErrorHandler) -> Option<Value> {
    match v {
        Value::Pair(a, b) => Some(if first { (**a).clone() } else { (**b).clone() }),
        _ => fail(errors, "%1/%2 require a pair operand"),
    }
}

fn select_extreme(items: Vec<Value>, k: i64, want_largest: bool, errors: &mut ErrorHandler) -> Option<Value> {
    let k = k.max(0) as usize;
    let mut keyed: Vec<(f64, Value)> = match items
        .iter()
        .map(|v| v.as_f64().map(|f| (f, v.clone())))
        .collect::<Option<Vec<_>>>()
    {
        Some(k) => k,
        None => return fail(errors, "largest/least require numeric operands"),
    };
    keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("dice values are never NaN"));
    let take = k.min(keyed.len());
    let selected: Vec<Value> = if want_largest {
        keyed.into_iter().rev().take(take).map(|(_, v)| v).collect()
    } else {
        keyed.into_iter().take(take).map(|(_, v)| v).collect()
    };
    Some(Value::List(selected))
}

/// `pick k` without replacement in random mode; a centered window of `k`
/// elements (clamped to the list length) in average mode (§4.3, §9 Open
/// Questions — clamping rather than erroring is the chosen permissive
/// behavior for an oversized `k`).
fn pick(random: &mut dyn RandomSource, average: bool, list: Vec<Value>, k: i64) -> Value {
    let len = list.len();
    let window = (k.max(0) as usize).min(len);
    if average {
        let start = (len - window) / 2;
        Value::List(list[start..start + window].to_vec())
    } else {
        let mut pool = list;
        let mut out = Vec::with_capacity(window);
        for _ in 0..window {
            let idx = random.int_range(0, pool.len() as i64 - 1) as usize;
            out.push(pool.remove(idx));
        }
        Value::List(out)
    }
}

fn roll_dice(random: &mut dyn RandomSource, average: bool, kind: DiceKind, n: i64) -> Value {
    let start: i64 = match kind {
        DiceKind::Standard => 1,
        DiceKind::ZeroBased => 0,
    };
    if average {
        Value::Float((n as f64 + start as f64) / 2.0)
    } else {
        Value::Int(random.int_range(start, start + n - 1))
    }
}

fn roll_dice_many(random: &mut dyn RandomSource, average: bool, kind: DiceKind, m: i64, n: i64) -> Value {
    let start: i64 = match kind {
        DiceKind::Standard => 1,
        DiceKind::ZeroBased => 0,
    };
    let count = m.max(0) as usize;
    if average {
        let mean = (n as f64 + start as f64) / 2.0;
        Value::List(vec![Value::Float(mean); count])
    } else {
        Value::List(
            (0..count)
                .map(|_| Value::Int(random.int_range(start, start + n - 1)))
                .collect(),
        )
    }
}

fn eval_probability(random: &mut dyn RandomSource, average: bool, p: f64) -> Value {
    if average {
        to_boolean_value(p >= 0.5)
    } else {
        to_boolean_value(random.float01() < p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::errors::ErrorHandler;
    use crate::internal::parser::Parser;
    use crate::internal::random::StdRandomSource;

    fn run(src: &str, average: bool, seed: u64) -> (Vec<Value>, ErrorHandler) {
        let mut errors = ErrorHandler::new();
        let mut parser = Parser::new(src, &mut errors);
        let program = parser.parse(&mut errors);
        let mut random = StdRandomSource::seeded(seed);
        let mut interpreter = Interpreter::new(&mut random, average);
        let values = interpreter.run(&program, &mut errors);
        (values, errors)
    }

    #[test]
    fn s1_d6_average_is_three_point_five() {
        let (values, errors) = run("d6", true, 0);
        assert!(!errors.is_fatal());
        assert_eq!(values, vec![Value::Float(3.5)]);
    }

    #[test]
    fn s2_sum_largest_3_4d6_average() {
        let (values, errors) = run("sum largest 3 4d6", true, 0);
        assert!(!errors.is_fatal());
        // four dice at the average value 3.5 each; "largest 3" keeps three
        // of the four equal entries, summing to 10.5
        assert_eq!(values, vec![Value::Float(10.5)]);
    }

    #[test]
    fn s3_pick_clamps_when_k_exceeds_length() {
        let (values, errors) = run("{1,2,3} pick 4", false, 1);
        assert!(!errors.is_fatal());
        match &values[0] {
            Value::List(items) => assert_eq!(items.len(), 3),
            other => panic!("expected a list, got {other:?}"),
        }
    }

    #[test]
    fn s4_assignment_chain_and_conjunction() {
        let (values, errors) = run("x := 2; y := 3; if x = 2 & y = 3 then 42 else 24", false, 0);
        assert!(!errors.is_fatal());
        assert_eq!(values, vec![Value::Int(42)]);
    }

    #[test]
    fn s5_repeat_runs_once_in_average_mode() {
        let (values, errors) = run("repeat x := d8 until x < 8", true, 0);
        assert!(!errors.is_fatal());
        assert_eq!(values, vec![Value::Float(4.5)]);
    }

    #[test]
    fn average_mode_never_touches_the_random_source() {
        // two runs with different seeds must agree bit-for-bit in average mode
        let (a, _) = run("sum largest 3 4d6", true, 1);
        let (b, _) = run("sum largest 3 4d6", true, 2);
        assert_eq!(a, b);
    }

    #[test]
    fn unbound_identifier_is_fatal() {
        let (values, errors) = run("x", false, 0);
        assert!(values.is_empty());
        assert!(errors.is_fatal());
    }

    #[test]
    fn compositional_sum_over_a_list() {
        let (values, errors) = run("compositional total(0, x, +); call total({1,2,3})", false, 0);
        assert!(!errors.is_fatal());
        assert_eq!(values.last(), Some(&Value::Int(6)));
    }

    #[test]
    fn function_call_binds_parameters_in_a_fresh_frame() {
        let (values, errors) = run("function double(x) = x * 2; call double(5)", false, 0);
        assert!(!errors.is_fatal());
        assert_eq!(values.last(), Some(&Value::Int(10)));
    }
}
