//! Type specifications: the keys the registry is indexed by.
//!
//! A spec is either an atomic key (a built-in atom, an opaque user token,
//! or a literal scalar) or a non-empty bracketed sequence
//! `[base, arg1, ..., argN]` whose arguments are themselves specs.
//! Flattening unwraps nested brackets into one linear token run; the
//! registry matches the longest registered prefix of that run and hands
//! the rest back as arguments (see `registry`).

use ordered_float::OrderedFloat;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ------------------------------- Atoms ------------------------------------ //

/// An opaque user-defined spec atom. Two tokens are equal only if they
/// are clones of the same `Token::new` call; the name is for messages.
#[derive(Clone, Debug)]
pub struct Token {
    id: u64,
    name: Arc<str>,
}

static NEXT_TOKEN_ID: AtomicU64 = AtomicU64::new(0);

impl Token {
    pub fn new(name: impl Into<String>) -> Self {
        Token {
            id: NEXT_TOKEN_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into().into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Token {}

impl std::hash::Hash for Token {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// An atomic spec key: the closed built-in vocabulary plus user tokens.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SpecAtom {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
    Map,
    Set,
    Any,
    AnyOf,
    Tuple,
    Token(Token),
}

impl SpecAtom {
    pub fn name(&self) -> &str {
        match self {
            SpecAtom::Null => "null",
            SpecAtom::Boolean => "Boolean",
            SpecAtom::Number => "Number",
            SpecAtom::String => "String",
            SpecAtom::Array => "Array",
            SpecAtom::Object => "Object",
            SpecAtom::Map => "Map",
            SpecAtom::Set => "Set",
            SpecAtom::Any => "Any",
            SpecAtom::AnyOf => "AnyOf",
            SpecAtom::Tuple => "Tuple",
            SpecAtom::Token(t) => t.name(),
        }
    }
}

/// A literal scalar usable inside a spec sequence (the "mixed" variant):
/// a constraint on the value itself rather than a nested spec.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Literal {
    Bool(bool),
    Num(OrderedFloat<f64>),
    Str(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Num(n) => write!(f, "{}", n.0),
            Literal::Str(s) => write!(f, "{s:?}"),
        }
    }
}

// ------------------------------- Specs ------------------------------------ //

/// A type specification: atomic, a literal constraint, or `[base, args...]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TySpec {
    Atom(SpecAtom),
    Lit(Literal),
    /// Non-empty by construction (`TySpec::seq` rejects empty input).
    Seq(Vec<TySpec>),
}

pub const BOOLEAN: TySpec = TySpec::Atom(SpecAtom::Boolean);
pub const NUMBER: TySpec = TySpec::Atom(SpecAtom::Number);
pub const STRING: TySpec = TySpec::Atom(SpecAtom::String);
pub const NULL: TySpec = TySpec::Atom(SpecAtom::Null);
pub const ANY: TySpec = TySpec::Atom(SpecAtom::Any);

impl From<SpecAtom> for TySpec {
    fn from(a: SpecAtom) -> Self {
        TySpec::Atom(a)
    }
}
impl From<Token> for TySpec {
    fn from(t: Token) -> Self {
        TySpec::Atom(SpecAtom::Token(t))
    }
}
impl From<bool> for TySpec {
    fn from(b: bool) -> Self {
        TySpec::Lit(Literal::Bool(b))
    }
}
impl From<f64> for TySpec {
    fn from(n: f64) -> Self {
        TySpec::Lit(Literal::Num(OrderedFloat(n)))
    }
}
impl From<&str> for TySpec {
    fn from(s: &str) -> Self {
        TySpec::Lit(Literal::Str(s.to_string()))
    }
}

impl TySpec {
    /// `[base, args...]`. Panics on empty input: an empty bracket is not
    /// a spec and can only come from a programming mistake at setup time.
    pub fn seq(parts: Vec<TySpec>) -> TySpec {
        assert!(!parts.is_empty(), "a spec sequence must be non-empty");
        TySpec::Seq(parts)
    }

    /// Number of tokens this spec occupies once flattened.
    pub(crate) fn flat_len(&self) -> usize {
        match self {
            TySpec::Atom(_) | TySpec::Lit(_) => 1,
            TySpec::Seq(parts) => parts.iter().map(TySpec::flat_len).sum(),
        }
    }

    /// Linear token run: nested brackets unwrap in place, so
    /// `[Array, [Map, String]]` and `[Array, Map, String]` flatten alike.
    pub fn flatten(&self) -> Vec<FlatTok> {
        let mut out = Vec::with_capacity(self.flat_len());
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(&self, out: &mut Vec<FlatTok>) {
        match self {
            TySpec::Atom(a) => out.push(FlatTok::Atom(a.clone())),
            TySpec::Lit(l) => out.push(FlatTok::Lit(l.clone())),
            TySpec::Seq(parts) => {
                for p in parts {
                    p.flatten_into(out);
                }
            }
        }
    }

    /// Top-level elements: the parts of a sequence, or the spec itself.
    pub(crate) fn elements(&self) -> &[TySpec] {
        match self {
            TySpec::Seq(parts) => parts,
            other => std::slice::from_ref(other),
        }
    }

    /// The generic fallback description: a bracketed join of token names.
    pub fn fallback_description(&self) -> String {
        match self {
            TySpec::Atom(a) => a.name().to_string(),
            TySpec::Lit(l) => l.to_string(),
            TySpec::Seq(parts) => {
                let inner = parts
                    .iter()
                    .map(TySpec::fallback_description)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("[{inner}]")
            }
        }
    }
}

/// One token of a flattened spec. Literals never match a trie edge, so
/// they always fall into the leftover-argument suffix.
#[derive(Clone, Debug, PartialEq)]
pub enum FlatTok {
    Atom(SpecAtom),
    Lit(Literal),
}

// --------------------------- Spec constructors ----------------------------- //

/// `[Array, elem]`
pub fn array_of(elem: TySpec) -> TySpec {
    TySpec::seq(vec![SpecAtom::Array.into(), elem])
}

/// `[Map, value]` — homogeneous string-keyed object.
pub fn map_of(value: TySpec) -> TySpec {
    TySpec::seq(vec![SpecAtom::Map.into(), value])
}

/// `[Set, elem]` — array with duplicate raw elements collapsed.
pub fn set_of(elem: TySpec) -> TySpec {
    TySpec::seq(vec![SpecAtom::Set.into(), elem])
}

/// `[AnyOf, alt1, ...]` — first matching alternative wins.
pub fn any_of(alts: impl IntoIterator<Item = TySpec>) -> TySpec {
    let mut parts = vec![SpecAtom::AnyOf.into()];
    parts.extend(alts);
    assert!(parts.len() > 1, "any_of needs at least one alternative");
    TySpec::seq(parts)
}

/// `[Tuple, elem1, ...]` — fixed-length, positionally-typed array.
pub fn tuple_of(elems: impl IntoIterator<Item = TySpec>) -> TySpec {
    let mut parts = vec![SpecAtom::Tuple.into()];
    parts.extend(elems);
    TySpec::seq(parts)
}

/// `[Object, ["name", spec], ...]` — fixed-key object.
pub fn object_spec_of<S: Into<String>>(fields: impl IntoIterator<Item = (S, TySpec)>) -> TySpec {
    let mut parts = vec![SpecAtom::Object.into()];
    parts.extend(fields.into_iter().map(|(name, spec)| {
        TySpec::seq(vec![TySpec::Lit(Literal::Str(name.into())), spec])
    }));
    TySpec::seq(parts)
}

// ------------------------------- Tests ------------------------------------ //
