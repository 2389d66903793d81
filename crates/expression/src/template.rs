use std::fmt::{self, Display, Formatter};

use nom::branch::alt;
use nom::bytes::complete::{take_till, take_till1};
use nom::character::complete::char;
use nom::combinator::{map, rest, verify};
use nom::multi::many0;
use nom::sequence::delimited;
use nom::{Finish, IResult};
use resolvegate_schema::{ValueExt, ValuePath};
use value::ConstValue;

use crate::eval::to_js_string;
use crate::parser::Span;
use crate::{ExprError, Scope};

enum RawSegment<'a> {
    Literal(&'a str),
    /// The offset of the opening brace and the text between the braces.
    Placeholder(usize, &'a str),
}

// Segment ::= "{" [^}]* "}" | [^{]+ | "{" .*
//
// An opening brace without a closing one is plain text up to the end.
fn raw_segment(input: Span) -> IResult<Span, RawSegment> {
    alt((
        map(
            delimited(char('{'), take_till(|c: char| c == '}'), char('}')),
            |path: Span| RawSegment::Placeholder(path.location_offset() - 1, *path.fragment()),
        ),
        map(take_till1(|c: char| c == '{'), |text: Span| {
            RawSegment::Literal(*text.fragment())
        }),
        map(verify(rest, |text: &Span| !text.is_empty()), |text: Span| {
            RawSegment::Literal(*text.fragment())
        }),
    ))(input)
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Placeholder(ValuePath),
}

/// A string with `{variable.path}` placeholders, e.g. `user:{args.id}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        let (_, raw) = many0(raw_segment)(Span::new(source))
            .finish()
            .map_err(ExprError::from)?;

        let segments = raw
            .into_iter()
            .map(|segment| match segment {
                RawSegment::Literal(text) => Ok(Segment::Literal(text.to_string())),
                RawSegment::Placeholder(offset, text) => {
                    let path = ValuePath::parse(text.trim());
                    match path.split_first_key() {
                        Some(_) => Ok(Segment::Placeholder(path)),
                        None => Err(ExprError::syntax(
                            offset,
                            "placeholder must start with a variable name",
                        )),
                    }
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Renders the template. A template made of a single placeholder yields the
    /// referenced value as is; otherwise the parts are joined into a string and
    /// missing values render empty.
    pub fn render(&self, scope: &Scope<'_>) -> ConstValue {
        if let [Segment::Placeholder(path)] = self.segments.as_slice() {
            return lookup(path, scope).cloned().unwrap_or(ConstValue::Null);
        }
        ConstValue::String(self.render_string(scope))
    }

    pub fn render_string(&self, scope: &Scope<'_>) -> String {
        let mut output = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Placeholder(path) => match lookup(path, scope) {
                    None | Some(ConstValue::Null) => {}
                    Some(value @ (ConstValue::Object(_) | ConstValue::List(_))) => {
                        output.push_str(&value.to_string())
                    }
                    Some(value) => output.push_str(
                        &value
                            .to_key_string()
                            .unwrap_or_else(|| to_js_string(value)),
                    ),
                },
            }
        }
        output
    }
}

fn lookup<'a>(path: &ValuePath, scope: &Scope<'a>) -> Option<&'a ConstValue> {
    let (name, rest) = path.split_first_key()?;
    let root = scope.get(name)?;
    resolvegate_schema::get_segments(root, rest)
}

impl Display for Template {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
