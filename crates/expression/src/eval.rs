use std::borrow::Cow;

use resolvegate_schema::ValueExt;
use value::{ConstValue, Number};

use crate::parser::{BinaryOp, Expr, LogicalOp, UnaryOp};
use crate::{ExprError, Scope};

type Evaluated<'a> = Cow<'a, ConstValue>;

static NULL: ConstValue = ConstValue::Null;

/// Builds a number value, keeping integral results integral. `NaN` and the
/// infinities have no representation and become null.
pub fn number(n: f64) -> ConstValue {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        ConstValue::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n)
            .map(ConstValue::Number)
            .unwrap_or(ConstValue::Null)
    }
}

#[inline]
pub fn is_truthy(value: &ConstValue) -> bool {
    value.is_truthy()
}

pub fn evaluate<'a>(expr: &Expr, scope: &Scope<'a>) -> Result<Evaluated<'a>, ExprError> {
    match expr {
        Expr::Literal(value) => Ok(Cow::Owned(value.clone())),
        Expr::Ident(name) => scope
            .get(name)
            .map(Cow::Borrowed)
            .ok_or_else(|| ExprError::UnknownIdentifier { name: name.clone() }),
        Expr::Array(items) => Ok(Cow::Owned(ConstValue::List(
            items
                .iter()
                .map(|item| evaluate(item, scope).map(Cow::into_owned))
                .collect::<Result<_, _>>()?,
        ))),
        Expr::Member { .. } | Expr::Index { .. } | Expr::Call { .. } => {
            Ok(link(expr, scope)?.unwrap_or(Cow::Owned(ConstValue::Null)))
        }
        Expr::Unary { op, expr } => {
            let value = evaluate(expr, scope)?;
            Ok(Cow::Owned(match op {
                UnaryOp::Not => ConstValue::Boolean(!value.is_truthy()),
                UnaryOp::Neg => number(-to_number(&value)),
                UnaryOp::Plus => number(to_number(&value)),
            }))
        }
        Expr::Binary { op, left, right } => {
            let left = evaluate(left, scope)?;
            let right = evaluate(right, scope)?;
            Ok(Cow::Owned(binary(*op, &left, &right)))
        }
        Expr::Logical { op, left, right } => {
            let left = evaluate(left, scope)?;
            let take_left = match op {
                LogicalOp::And => !left.is_truthy(),
                LogicalOp::Or => left.is_truthy(),
                LogicalOp::Coalesce => !matches!(*left, ConstValue::Null),
            };
            if take_left {
                Ok(left)
            } else {
                evaluate(right, scope)
            }
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            if evaluate(test, scope)?.is_truthy() {
                evaluate(consequent, scope)
            } else {
                evaluate(alternate, scope)
            }
        }
    }
}

/// Evaluates one link of a member chain. `None` means an optional link met
/// null, which skips the rest of the chain.
fn link<'a>(expr: &Expr, scope: &Scope<'a>) -> Result<Option<Evaluated<'a>>, ExprError> {
    match expr {
        Expr::Member {
            object,
            property,
            optional,
        } => {
            let object = receiver(object, *optional, scope, || Ok(property.clone()))?;
            Ok(object.map(|object| member(object, property)))
        }
        Expr::Index {
            object,
            index,
            optional,
        } => {
            let object = match receiver(object, *optional, scope, || {
                evaluate(index, scope).map(|index| to_js_string(&index))
            })? {
                Some(object) => object,
                None => return Ok(None),
            };
            let index = evaluate(index, scope)?;
            let list_index = match (&*object, &*index) {
                (ConstValue::List(_), ConstValue::Number(n)) => n.as_u64(),
                _ => None,
            };
            Ok(Some(match list_index {
                Some(idx) => project(object, |value| match value {
                    ConstValue::List(list) => list.get(idx as usize),
                    _ => None,
                }),
                None => member(object, &to_js_string(&index)),
            }))
        }
        Expr::Call {
            object,
            method,
            args,
            optional,
        } => {
            let object = match receiver(object, *optional, scope, || Ok(method.clone()))? {
                Some(object) => object,
                None => return Ok(None),
            };
            let args = args
                .iter()
                .map(|arg| evaluate(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            call(&object, method, &args).map(|value| Some(Cow::Owned(value)))
        }
        expr => evaluate(expr, scope).map(Some),
    }
}

/// The object a link reads from, or `None` when the chain is skipped.
fn receiver<'a, F>(
    object: &Expr,
    optional: bool,
    scope: &Scope<'a>,
    property: F,
) -> Result<Option<Evaluated<'a>>, ExprError>
where
    F: FnOnce() -> Result<String, ExprError>,
{
    match link(object, scope)? {
        Some(object) if matches!(*object, ConstValue::Null) => {
            if optional {
                Ok(None)
            } else {
                Err(ExprError::NullMember {
                    property: property()?,
                })
            }
        }
        object => Ok(object),
    }
}

/// Applies `f` to the value, borrowing from the scope when possible.
fn project<'a, F>(value: Evaluated<'a>, f: F) -> Evaluated<'a>
where
    F: for<'b> Fn(&'b ConstValue) -> Option<&'b ConstValue>,
{
    match value {
        Cow::Borrowed(value) => Cow::Borrowed(f(value).unwrap_or(&NULL)),
        Cow::Owned(value) => Cow::Owned(f(&value).cloned().unwrap_or(ConstValue::Null)),
    }
}

fn member<'a>(object: Evaluated<'a>, property: &str) -> Evaluated<'a> {
    if property == "length" {
        match &*object {
            ConstValue::List(list) => return Cow::Owned(number(list.len() as f64)),
            ConstValue::String(s) => return Cow::Owned(number(s.chars().count() as f64)),
            _ => {}
        }
    }
    project(object, |value| match value {
        ConstValue::Object(object) => object.get(property),
        ConstValue::List(list) => property
            .parse::<usize>()
            .ok()
            .and_then(|idx| list.get(idx)),
        _ => None,
    })
}

fn call(
    object: &ConstValue,
    method: &str,
    args: &[Evaluated<'_>],
) -> Result<ConstValue, ExprError> {
    let arg = |idx: usize| args.get(idx).map(|arg| &**arg).unwrap_or(&NULL);
    let invalid_receiver = || ExprError::InvalidReceiver {
        method: method.to_string(),
        receiver: type_name(object).to_string(),
    };

    match (method, object) {
        ("includes", ConstValue::List(list)) => Ok(ConstValue::Boolean(
            list.iter().any(|item| strict_equals(item, arg(0))),
        )),
        ("includes", ConstValue::String(s)) => {
            Ok(ConstValue::Boolean(s.contains(&to_js_string(arg(0)))))
        }
        ("startsWith", ConstValue::String(s)) => {
            Ok(ConstValue::Boolean(s.starts_with(&to_js_string(arg(0)))))
        }
        ("endsWith", ConstValue::String(s)) => {
            Ok(ConstValue::Boolean(s.ends_with(&to_js_string(arg(0)))))
        }
        ("toLowerCase", ConstValue::String(s)) => Ok(ConstValue::String(s.to_lowercase())),
        ("toUpperCase", ConstValue::String(s)) => Ok(ConstValue::String(s.to_uppercase())),
        ("trim", ConstValue::String(s)) => Ok(ConstValue::String(s.trim().to_string())),
        ("toString", value) => Ok(ConstValue::String(to_js_string(value))),
        ("includes" | "startsWith" | "endsWith" | "toLowerCase" | "toUpperCase" | "trim", _) => {
            Err(invalid_receiver())
        }
        _ => Err(ExprError::UnknownMethod {
            method: method.to_string(),
        }),
    }
}

fn binary(op: BinaryOp, left: &ConstValue, right: &ConstValue) -> ConstValue {
    match op {
        BinaryOp::Add => match (left, right) {
            (ConstValue::String(_), _) | (_, ConstValue::String(_)) => {
                ConstValue::String(to_js_string(left) + &to_js_string(right))
            }
            _ => number(to_number(left) + to_number(right)),
        },
        BinaryOp::Sub => number(to_number(left) - to_number(right)),
        BinaryOp::Mul => number(to_number(left) * to_number(right)),
        BinaryOp::Div => number(to_number(left) / to_number(right)),
        BinaryOp::Rem => number(to_number(left) % to_number(right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (left, right) {
                (ConstValue::String(a), ConstValue::String(b)) => Some(a.cmp(b)),
                _ => to_number(left).partial_cmp(&to_number(right)),
            };
            ConstValue::Boolean(match (op, ordering) {
                (_, None) => false,
                (BinaryOp::Lt, Some(ordering)) => ordering.is_lt(),
                (BinaryOp::Le, Some(ordering)) => ordering.is_le(),
                (BinaryOp::Gt, Some(ordering)) => ordering.is_gt(),
                (_, Some(ordering)) => ordering.is_ge(),
            })
        }
        BinaryOp::Eq => ConstValue::Boolean(loose_equals(left, right)),
        BinaryOp::Ne => ConstValue::Boolean(!loose_equals(left, right)),
        BinaryOp::StrictEq => ConstValue::Boolean(strict_equals(left, right)),
        BinaryOp::StrictNe => ConstValue::Boolean(!strict_equals(left, right)),
    }
}

fn to_number(value: &ConstValue) -> f64 {
    match value {
        ConstValue::Null => 0.0,
        ConstValue::String(s) if s.trim().is_empty() => 0.0,
        value => value.as_f64().unwrap_or(f64::NAN),
    }
}

pub fn to_js_string(value: &ConstValue) -> String {
    match value {
        ConstValue::Null => "null".to_string(),
        ConstValue::String(s) => s.clone(),
        ConstValue::List(list) => list
            .iter()
            .map(|item| match item {
                ConstValue::Null => String::new(),
                item => to_js_string(item),
            })
            .collect::<Vec<_>>()
            .join(","),
        ConstValue::Object(_) => "[object Object]".to_string(),
        value => value.to_key_string().unwrap_or_default(),
    }
}

fn strict_equals(left: &ConstValue, right: &ConstValue) -> bool {
    match (left, right) {
        (ConstValue::Number(a), ConstValue::Number(b)) => a.as_f64() == b.as_f64(),
        (ConstValue::Enum(a), ConstValue::String(b))
        | (ConstValue::String(b), ConstValue::Enum(a)) => a.as_str() == b.as_str(),
        _ => left == right,
    }
}

fn loose_equals(left: &ConstValue, right: &ConstValue) -> bool {
    match (left, right) {
        (ConstValue::Number(_), ConstValue::String(_))
        | (ConstValue::String(_), ConstValue::Number(_))
        | (ConstValue::Boolean(_), _)
        | (_, ConstValue::Boolean(_))
            if !matches!(left, ConstValue::Null) && !matches!(right, ConstValue::Null) =>
        {
            to_number(left) == to_number(right)
        }
        _ => strict_equals(left, right),
    }
}

fn type_name(value: &ConstValue) -> &'static str {
    match value {
        ConstValue::Null => "null",
        ConstValue::Number(_) => "number",
        ConstValue::String(_) | ConstValue::Enum(_) => "string",
        ConstValue::Boolean(_) => "boolean",
        ConstValue::Binary(_) => "binary",
        ConstValue::List(_) => "list",
        ConstValue::Object(_) => "object",
    }
}
