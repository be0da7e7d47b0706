//! Error taxonomy and context-trail rendering.
//!
//! Validation failures travel as values through the whole descent; the
//! only message assembly happens when a `LoadError` is displayed. Each
//! error carries a snapshot of the breadcrumb trail that was live when
//! it was constructed — raw specs and nodes, never pre-rendered text.

use std::fmt;
use thiserror::Error;

use crate::registry::Schemas;
use crate::spec::TySpec;
use crate::value::Json;

/// One breadcrumb of the descent, outermost first in a trail. Holds the
/// raw spec and node; stringification waits until the owning
/// `LoadError` is displayed.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    /// About to read a value for some spec.
    Value { spec: TySpec, value: Json },
    /// Entered an object member.
    Key(String),
    /// Entered an array element.
    Index(usize),
}

/// An unknown object member, possibly with a close registered name.
#[derive(Clone, Debug, PartialEq)]
pub struct UnknownKey {
    pub name: String,
    pub suggestion: Option<String>,
}

impl fmt::Display for UnknownKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.suggestion {
            Some(s) => write!(f, "{:?} (did you mean {:?}?)", self.name, s),
            None => write!(f, "{:?}", self.name),
        }
    }
}

/// Registry usage errors: these point at spec composition mistakes, not
/// at the document being validated.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SpecError {
    #[error("{description} takes {} arguments, but got {got}", expected_phrase(.min, .max))]
    WrongNumberOfArguments {
        description: String,
        got: usize,
        min: usize,
        max: Option<usize>,
    },
    #[error("malformed spec argument for {description}: {detail}")]
    MalformedArgument { description: String, detail: String },
    #[error("alias cycle while resolving {description}")]
    AliasCycle { description: String },
}

fn expected_phrase(min: &usize, max: &Option<usize>) -> String {
    match max {
        Some(max) if max == min => format!("exactly {min}"),
        Some(max) => format!("at least {min} and at most {max}"),
        None => format!("at least {min}"),
    }
}

/// What went wrong at the innermost point of the descent.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadErrorKind {
    TypeMismatch { expected: String, actual: String },
    MissingKeys(Vec<String>),
    UnknownKeys(Vec<UnknownKey>),
    UnknownSpec(String),
    BadSpec(SpecError),
}

/// A structural validation failure plus the trail that led to it. The
/// registry travels along so `Display` can describe the frames' specs;
/// no frame text or value text exists before the message is read.
#[derive(Clone)]
pub struct LoadError {
    pub(crate) schemas: Schemas,
    pub trail: Vec<Frame>,
    pub kind: LoadErrorKind,
}

impl PartialEq for LoadError {
    fn eq(&self, other: &Self) -> bool {
        self.trail == other.trail && self.kind == other.kind
    }
}

impl fmt::Debug for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadError")
            .field("trail", &self.trail)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in &self.trail {
            match frame {
                Frame::Value { spec, value } => writeln!(
                    f,
                    "while reading a value for {}, got: {value}",
                    self.schemas.describe_for_trail(spec)
                )?,
                Frame::Key(k) => writeln!(f, "in key {k:?}:")?,
                Frame::Index(i) => writeln!(f, "at index {i}:")?,
            }
        }
        match &self.kind {
            LoadErrorKind::TypeMismatch { expected, actual } => {
                write!(f, "expected {expected}, but got {actual}")
            }
            LoadErrorKind::MissingKeys(keys) => {
                write!(f, "missing keys: {}", join_quoted(keys))
            }
            LoadErrorKind::UnknownKeys(keys) => {
                let rendered = keys.iter().map(UnknownKey::to_string).collect::<Vec<_>>();
                write!(f, "unknown keys: {}", rendered.join(", "))
            }
            LoadErrorKind::UnknownSpec(desc) => {
                write!(f, "unknown specification: {desc}")
            }
            LoadErrorKind::BadSpec(err) => {
                write!(f, "invalid specification: {err}")
            }
        }
    }
}

impl std::error::Error for LoadError {}

fn join_quoted(keys: &[String]) -> String {
    keys.iter()
        .map(|k| format!("{k:?}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Everything `parse_as` can return on the failure side. Syntax errors
/// come straight from the text parser and never carry a trail.
#[derive(Debug, Error)]
pub enum ParseFailure {
    #[error("syntax error: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("{0}")]
    Load(#[from] LoadError),
}

// ------------------------------- Tests ------------------------------------ //
