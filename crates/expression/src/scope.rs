use indexmap::IndexMap;
use value::ConstValue;

/// The fixed set of variables an expression or template can read.
#[derive(Debug, Default, Clone)]
pub struct Scope<'a> {
    variables: IndexMap<&'a str, &'a ConstValue>,
}

impl<'a> Scope<'a> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with(mut self, name: &'a str, value: &'a ConstValue) -> Self {
        self.variables.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &'a str, value: &'a ConstValue) {
        self.variables.insert(name, value);
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&'a ConstValue> {
        self.variables.get(name).copied()
    }
}
