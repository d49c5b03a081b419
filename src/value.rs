use crate::Value;
use ptree::TreeItem;
use std::fmt::{Debug, Display, Formatter};

impl Value {
    /// Collapse the captured items of an alternative into its default value:
    /// the sole item when there is one, a tuple otherwise.
    pub fn from_items(mut items: Vec<Value>) -> Value {
        if items.len() == 1 {
            items.pop().unwrap()
        } else {
            Value::Tuple(items)
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text of a token value; empty for anything else.
    pub fn token_text(&self) -> &str {
        match self {
            Value::Token(token) => &token.text,
            _ => "",
        }
    }

    pub fn items(&self) -> &[Value] {
        match self {
            Value::Tuple(items) | Value::Seq(items) => items,
            _ => &[],
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Token(token) => write!(f, "{}", token.text),
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (index, item) in items.iter().enumerate() {
                    if index != 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Value::Seq(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Null => write!(f, "None"),
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Token(token) => write!(f, "Token({}, {:?})", token.kind, token.text),
            Value::Tuple(items) => f.debug_list().entries(items).finish(),
            Value::Seq(items) => {
                write!(f, "Seq")?;
                f.debug_list().entries(items).finish()
            }
            Value::Null => write!(f, "None"),
        }
    }
}

impl TreeItem for Value {
    type Child = Self;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _: &ptree::Style) -> std::io::Result<()> {
        match self {
            Value::Token(token) => write!(f, "{} {:?}", token.kind, token.text),
            Value::Tuple(_) => write!(f, "()"),
            Value::Seq(_) => write!(f, "[]"),
            Value::Null => write!(f, "None"),
        }
    }

    fn children(&self) -> std::borrow::Cow<[Self::Child]> {
        std::borrow::Cow::from(self.items())
    }
}

impl Value {
    pub fn print(&self) -> Result<(), std::io::Error> {
        ptree::print_tree(self)
    }
}
