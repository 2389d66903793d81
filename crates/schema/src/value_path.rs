use std::fmt::{self, Display, Formatter};

use value::{ConstValue, Name};

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    fn from_text(text: String) -> Self {
        match text.parse::<usize>() {
            Ok(index) => PathSegment::Index(index),
            Err(_) => PathSegment::Key(text),
        }
    }

    #[inline]
    pub fn is_index(&self) -> bool {
        matches!(self, PathSegment::Index(_))
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// A property path into a value, written as `a.b[0].c`, `a.0.c` or `a["b.c"]`.
///
/// Segments that read as non-negative integers address list elements.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct ValuePath(Vec<PathSegment>);

impl ValuePath {
    pub fn parse(path: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = path.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if !current.is_empty() {
                        segments.push(PathSegment::from_text(std::mem::take(&mut current)));
                    }
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(PathSegment::from_text(std::mem::take(&mut current)));
                    }
                    let quote = match chars.peek() {
                        Some(&q @ ('"' | '\'')) => {
                            chars.next();
                            Some(q)
                        }
                        _ => None,
                    };
                    let mut inner = String::new();
                    for c in chars.by_ref() {
                        if Some(c) == quote {
                            continue;
                        }
                        if c == ']' {
                            break;
                        }
                        inner.push(c);
                    }
                    segments.push(match quote {
                        Some(_) => PathSegment::Key(inner),
                        None => PathSegment::from_text(inner.trim().to_string()),
                    });
                }
                _ => current.push(c),
            }
        }

        if !current.is_empty() {
            segments.push(PathSegment::from_text(current));
        }
        ValuePath(segments)
    }

    #[inline]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn first_is_index(&self) -> bool {
        matches!(self.0.first(), Some(PathSegment::Index(_)))
    }

    /// Splits off the leading key, used to pick a scope variable.
    pub fn split_first_key(&self) -> Option<(&str, &[PathSegment])> {
        match self.0.split_first() {
            Some((PathSegment::Key(key), rest)) => Some((key.as_str(), rest)),
            _ => None,
        }
    }

    pub fn get<'a>(&self, value: &'a ConstValue) -> Option<&'a ConstValue> {
        get_segments(value, &self.0)
    }

    /// Writes `new_value` at this path, creating intermediate containers.
    pub fn set(&self, target: &mut ConstValue, new_value: ConstValue) {
        set_segments(target, &self.0, new_value)
    }
}

impl Display for ValuePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

pub fn get_segments<'a>(value: &'a ConstValue, segments: &[PathSegment]) -> Option<&'a ConstValue> {
    segments
        .iter()
        .try_fold(value, |current, segment| match (current, segment) {
            (ConstValue::Object(object), PathSegment::Key(key)) => object.get(key.as_str()),
            (ConstValue::Object(object), PathSegment::Index(index)) => {
                object.get(index.to_string().as_str())
            }
            (ConstValue::List(list), PathSegment::Index(index)) => list.get(*index),
            _ => None,
        })
}

fn empty_container(next: Option<&PathSegment>) -> ConstValue {
    match next {
        Some(PathSegment::Index(_)) => ConstValue::List(Vec::new()),
        Some(PathSegment::Key(_)) => ConstValue::Object(Default::default()),
        None => ConstValue::Null,
    }
}

fn set_segments(target: &mut ConstValue, segments: &[PathSegment], new_value: ConstValue) {
    let (segment, rest) = match segments.split_first() {
        Some(split) => split,
        None => {
            *target = new_value;
            return;
        }
    };

    match segment {
        PathSegment::Index(index) if !matches!(target, ConstValue::Object(_)) => {
            if !matches!(target, ConstValue::List(_)) {
                *target = ConstValue::List(Vec::new());
            }
            if let ConstValue::List(list) = target {
                if list.len() <= *index {
                    list.resize(*index + 1, ConstValue::Null);
                }
                if rest.is_empty() || list[*index] == ConstValue::Null {
                    list[*index] = empty_container(rest.first());
                }
                set_segments(&mut list[*index], rest, new_value);
            }
        }
        _ => {
            if !matches!(target, ConstValue::Object(_)) {
                *target = ConstValue::Object(Default::default());
            }
            if let ConstValue::Object(object) = target {
                let entry = object
                    .entry(Name::new(segment.to_string()))
                    .or_insert_with(|| empty_container(rest.first()));
                set_segments(entry, rest, new_value);
            }
        }
    }
}
