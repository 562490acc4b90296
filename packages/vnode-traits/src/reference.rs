use smol_str::SmolStr;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

/// A process-unique token. Only compares equal to its own clones.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Symbol {
    id: u64,
    description: Option<SmolStr>,
}

impl Symbol {
    pub fn new(description: impl Into<SmolStr>) -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description: Some(description.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description: None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// The identity of a [`Node`](crate::Node).
///
/// A reference is assigned when a node is created and never changes. Consumers compare references
/// with `==`; two emissions describing the same logical node carry equal references.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Reference {
    String(SmolStr),
    Number(i64),
    Symbol(Symbol),
    /// Carried by every fragment node. Cannot be built from a user value.
    Fragment,
}

impl Reference {
    /// A fresh [`Symbol`] reference
    pub fn symbol(description: impl Into<SmolStr>) -> Self {
        Self::Symbol(Symbol::new(description))
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self, Self::Fragment)
    }

    /// Whether this reference can be the value of a scalar node (a string or a number)
    pub fn is_scalar_value(&self) -> bool {
        matches!(self, Self::String(_) | Self::Number(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<&str> for Reference {
    fn from(value: &str) -> Self {
        Self::String(SmolStr::new(value))
    }
}

impl From<String> for Reference {
    fn from(value: String) -> Self {
        Self::String(SmolStr::from(value))
    }
}

impl From<SmolStr> for Reference {
    fn from(value: SmolStr) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Reference {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Reference {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<Symbol> for Reference {
    fn from(value: Symbol) -> Self {
        Self::Symbol(value)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Symbol(symbol) => match symbol.description() {
                Some(description) => write!(f, "Symbol({description})"),
                None => write!(f, "Symbol()"),
            },
            Self::Fragment => write!(f, "Fragment"),
        }
    }
}

#[test]
fn test_symbols_are_unique() {
    let a = Reference::symbol("Scalar");
    let b = Reference::symbol("Scalar");
    assert_ne!(a, b);
    assert_eq!(a, a.clone());
    assert_eq!(a.to_string(), "Symbol(Scalar)");
}

#[test]
fn test_user_values_are_never_the_fragment_marker() {
    assert!(!Reference::from("Fragment").is_fragment());
    assert!(!Reference::from(0).is_fragment());
    assert!(Reference::Fragment.is_fragment());
    assert!(!Reference::Fragment.is_scalar_value());
}

#[test]
fn test_scalar_values() {
    assert!(Reference::from("text").is_scalar_value());
    assert!(Reference::from(42).is_scalar_value());
    assert!(!Reference::Symbol(Symbol::anonymous()).is_scalar_value());
    assert_eq!(Reference::from(42).as_number(), Some(42));
    assert_eq!(Reference::from("text").as_str(), Some("text"));
}
