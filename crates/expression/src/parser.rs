use nom::branch::alt;
use nom::bytes::complete::{is_not, tag, take_while};
use nom::character::complete::{anychar, char, digit1, multispace0, satisfy};
use nom::combinator::{all_consuming, cut, map, map_res, not, opt, recognize, value};
use nom::multi::{fold_many0, many0, separated_list0};
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use nom::{Finish, IResult};
use nom_locate::LocatedSpan;
use ::value::ConstValue;

use crate::eval::number;
use crate::ExprError;

pub type Span<'a> = LocatedSpan<&'a str>;

type ParseResult<'a, T> = IResult<Span<'a>, T>;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LogicalOp {
    And,
    Or,
    Coalesce,
}

/// Member, index and call expressions form a chain. Once an `optional` link
/// meets null, the rest of its chain evaluates to null as well.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(ConstValue),
    Ident(String),
    Array(Vec<Expr>),
    Member {
        object: Box<Expr>,
        property: String,
        optional: bool,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        optional: bool,
    },
    Call {
        object: Box<Expr>,
        method: String,
        args: Vec<Expr>,
        optional: bool,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
}

pub fn parse(source: &str) -> Result<Expr, ExprError> {
    all_consuming(terminated(conditional, multispace0))(Span::new(source))
        .finish()
        .map(|(_, expr)| expr)
        .map_err(ExprError::from)
}

/// A punctuator, skipping the whitespace before it.
fn punct<'a>(text: &'static str) -> impl FnMut(Span<'a>) -> ParseResult<'a, Span<'a>> {
    preceded(multispace0, tag(text))
}

// Conditional ::= Coalesce ("?" Conditional ":" Conditional)?
fn conditional(input: Span) -> ParseResult<Expr> {
    let (input, test) = coalesce(input)?;
    let (input, branches) = opt(preceded(
        punct("?"),
        cut(tuple((conditional, punct(":"), conditional))),
    ))(input)?;
    Ok((
        input,
        match branches {
            Some((consequent, _, alternate)) => Expr::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
            None => test,
        },
    ))
}

/// Parses `operand (operator operand)*` into a left associative tree.
fn chain<'a, O>(
    input: Span<'a>,
    operand: fn(Span<'a>) -> ParseResult<'a, Expr>,
    operator: fn(Span<'a>) -> ParseResult<'a, O>,
    build: fn(O, Expr, Expr) -> Expr,
) -> ParseResult<'a, Expr> {
    map(
        pair(operand, many0(pair(operator, cut(operand)))),
        |(first, rest)| {
            rest.into_iter()
                .fold(first, |left, (op, right)| build(op, left, right))
        },
    )(input)
}

fn coalesce(input: Span) -> ParseResult<Expr> {
    chain(
        input,
        or,
        |input| value(LogicalOp::Coalesce, punct("??"))(input),
        logical,
    )
}

fn or(input: Span) -> ParseResult<Expr> {
    chain(
        input,
        and,
        |input| value(LogicalOp::Or, punct("||"))(input),
        logical,
    )
}

fn and(input: Span) -> ParseResult<Expr> {
    chain(
        input,
        equality,
        |input| value(LogicalOp::And, punct("&&"))(input),
        logical,
    )
}

fn equality(input: Span) -> ParseResult<Expr> {
    chain(
        input,
        relational,
        |input| {
            preceded(
                multispace0,
                alt((
                    value(BinaryOp::StrictEq, tag("===")),
                    value(BinaryOp::StrictNe, tag("!==")),
                    value(BinaryOp::Eq, tag("==")),
                    value(BinaryOp::Ne, tag("!=")),
                )),
            )(input)
        },
        binary,
    )
}

fn relational(input: Span) -> ParseResult<Expr> {
    chain(
        input,
        additive,
        |input| {
            preceded(
                multispace0,
                alt((
                    value(BinaryOp::Le, tag("<=")),
                    value(BinaryOp::Ge, tag(">=")),
                    value(BinaryOp::Lt, tag("<")),
                    value(BinaryOp::Gt, tag(">")),
                )),
            )(input)
        },
        binary,
    )
}

fn additive(input: Span) -> ParseResult<Expr> {
    chain(
        input,
        multiplicative,
        |input| {
            preceded(
                multispace0,
                alt((value(BinaryOp::Add, char('+')), value(BinaryOp::Sub, char('-')))),
            )(input)
        },
        binary,
    )
}

fn multiplicative(input: Span) -> ParseResult<Expr> {
    chain(
        input,
        unary,
        |input| {
            preceded(
                multispace0,
                alt((
                    value(BinaryOp::Mul, char('*')),
                    value(BinaryOp::Div, char('/')),
                    value(BinaryOp::Rem, char('%')),
                )),
            )(input)
        },
        binary,
    )
}

fn unary(input: Span) -> ParseResult<Expr> {
    let (rest, op) = opt(preceded(
        multispace0,
        alt((
            value(UnaryOp::Not, char('!')),
            value(UnaryOp::Neg, char('-')),
            value(UnaryOp::Plus, char('+')),
        )),
    ))(input)?;
    match op {
        Some(op) => map(cut(unary), |expr| Expr::Unary {
            op,
            expr: Box::new(expr),
        })(rest),
        None => postfix(input),
    }
}

enum Link {
    Member(String),
    Index(Expr),
    Call(String, Vec<Expr>),
}

impl Link {
    fn apply(self, object: Expr, optional: bool) -> Expr {
        let object = Box::new(object);
        match self {
            Link::Member(property) => Expr::Member {
                object,
                property,
                optional,
            },
            Link::Index(index) => Expr::Index {
                object,
                index: Box::new(index),
                optional,
            },
            Link::Call(method, args) => Expr::Call {
                object,
                method,
                args,
                optional,
            },
        }
    }
}

// Postfix ::= Primary ("?."? "[" Conditional "]" | ("." | "?.") Name Arguments?)*
fn postfix(input: Span) -> ParseResult<Expr> {
    // `a ?.5 : b` is a conditional, not optional chaining.
    let optional_dot = terminated(tag("?."), not(satisfy(|c| c.is_ascii_digit())));
    let link = preceded(
        multispace0,
        alt((
            map(
                preceded(optional_dot, cut(alt((index, member_or_call)))),
                |link| (link, true),
            ),
            map(preceded(char('.'), cut(member_or_call)), |link| (link, false)),
            map(index, |link| (link, false)),
        )),
    );
    map(pair(primary, many0(link)), |(first, links)| {
        links
            .into_iter()
            .fold(first, |object, (link, optional)| link.apply(object, optional))
    })(input)
}

fn index(input: Span) -> ParseResult<Link> {
    map(
        delimited(char('['), cut(conditional), cut(punct("]"))),
        Link::Index,
    )(input)
}

fn member_or_call(input: Span) -> ParseResult<Link> {
    map(
        pair(
            preceded(multispace0, identifier),
            opt(preceded(punct("("), cut(terminated(arguments, punct(")"))))),
        ),
        |(name, args)| match args {
            Some(args) => Link::Call(name, args),
            None => Link::Member(name),
        },
    )(input)
}

fn arguments(input: Span) -> ParseResult<Vec<Expr>> {
    separated_list0(punct(","), conditional)(input)
}

fn primary(input: Span) -> ParseResult<Expr> {
    preceded(
        multispace0,
        alt((
            map(number_literal, |n| Expr::Literal(number(n))),
            map(string_literal, |s| Expr::Literal(ConstValue::String(s))),
            map(identifier, |name| match name.as_str() {
                "true" => Expr::Literal(ConstValue::Boolean(true)),
                "false" => Expr::Literal(ConstValue::Boolean(false)),
                "null" | "undefined" => Expr::Literal(ConstValue::Null),
                _ => Expr::Ident(name),
            }),
            delimited(char('('), cut(conditional), cut(punct(")"))),
            map(
                delimited(char('['), cut(arguments), cut(punct("]"))),
                Expr::Array,
            ),
        )),
    )(input)
}

fn identifier(input: Span) -> ParseResult<String> {
    map(
        recognize(pair(
            satisfy(|c| c.is_alphabetic() || c == '_' || c == '$'),
            take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '$'),
        )),
        |name: Span| name.fragment().to_string(),
    )(input)
}

// Number ::= [0-9]+ ("." [0-9]+)? | "." [0-9]+
fn number_literal(input: Span) -> ParseResult<f64> {
    map_res(
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit1)))),
            recognize(pair(char('.'), digit1)),
        )),
        |text: Span| text.fragment().parse::<f64>(),
    )(input)
}

fn string_literal(input: Span) -> ParseResult<String> {
    alt((
        delimited(char('\''), string_body("\\'"), cut(char('\''))),
        delimited(char('"'), string_body("\\\""), cut(char('"'))),
    ))(input)
}

fn string_body<'a>(stop: &'static str) -> impl FnMut(Span<'a>) -> ParseResult<'a, String> {
    fold_many0(
        alt((
            map(is_not(stop), |text: Span| text.fragment().to_string()),
            map(preceded(char('\\'), anychar), |escaped| {
                let unescaped = match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => other,
                };
                unescaped.to_string()
            }),
        )),
        String::new,
        |mut text, part| {
            text.push_str(&part);
            text
        },
    )
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn logical(op: LogicalOp, left: Expr, right: Expr) -> Expr {
    Expr::Logical {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
