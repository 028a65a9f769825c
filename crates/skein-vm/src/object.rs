use std::fmt;
use std::rc::Rc;

use skein_bytecode::Op;

pub type ObjectRef = Rc<Object>;

/// A machine object.
///
/// Combinator objects (`Data`, `Opaque`, `Bytecode`) carry their fully
/// qualified symbol; literal objects carry their value. Data tables embedded
/// in bytecode objects reference other objects, so the whole algebra is one
/// acyclic graph of `Rc`s.
#[derive(Debug)]
pub enum Object {
    /// A data combinator: an inert symbol, used as constructor and tag.
    Data { symbol: String },
    /// A primitive combinator whose reduction rule lives outside the machine.
    Opaque { symbol: String },
    Integer(i64),
    Float(f64),
    Char(char),
    Text(String),
    /// A compiled combinator: code stream plus per-definition data table.
    Bytecode {
        symbol: String,
        code: Vec<Op>,
        data: Vec<ObjectRef>,
    },
}

impl Object {
    pub fn data(symbol: impl Into<String>) -> ObjectRef {
        Rc::new(Self::Data {
            symbol: symbol.into(),
        })
    }

    pub fn opaque(symbol: impl Into<String>) -> ObjectRef {
        Rc::new(Self::Opaque {
            symbol: symbol.into(),
        })
    }

    pub fn bytecode(symbol: impl Into<String>, code: Vec<Op>, data: Vec<ObjectRef>) -> ObjectRef {
        Rc::new(Self::Bytecode {
            symbol: symbol.into(),
            code,
            data,
        })
    }

    /// The qualified symbol of a combinator object; literals have none.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Self::Data { symbol } | Self::Opaque { symbol } | Self::Bytecode { symbol, .. } => {
                Some(symbol)
            }
            Self::Integer(_) | Self::Float(_) | Self::Char(_) | Self::Text(_) => None,
        }
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data { .. })
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, Self::Opaque { .. })
    }

    pub fn is_bytecode(&self) -> bool {
        matches!(self, Self::Bytecode { .. })
    }

    pub fn code(&self) -> Option<&[Op]> {
        match self {
            Self::Bytecode { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn data_table(&self) -> Option<&[ObjectRef]> {
        match self {
            Self::Bytecode { data, .. } => Some(data),
            _ => None,
        }
    }
}

/// Equality for data-table interning: combinators compare by symbol,
/// literals by value (floats by bit pattern, so NaNs intern too).
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Data { symbol: a }, Self::Data { symbol: b })
            | (Self::Opaque { symbol: a }, Self::Opaque { symbol: b })
            | (Self::Bytecode { symbol: a, .. }, Self::Bytecode { symbol: b, .. }) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data { symbol } | Self::Opaque { symbol } => write!(f, "{symbol}"),
            Self::Bytecode { symbol, .. } => write!(f, "{symbol}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "'{v}'"),
            Self::Text(v) => write!(f, "\"{v}\""),
        }
    }
}
