//! The recursive-descent loader/validator.
//!
//! One `JsonParser` drives one parse at a time: `parse_as` resets the
//! breadcrumb stack, `load_as` pushes a frame per descent step and pops
//! it on the way out, and the four `fail_with_*` constructors snapshot
//! whatever trail is live when something goes wrong. A parser must not
//! be shared between overlapping parses; `&mut self` on every in-flight
//! operation makes that a compile-time error in safe Rust.

use tracing::trace;

use crate::defaults;
use crate::error::{Frame, LoadError, LoadErrorKind, ParseFailure, SpecError, UnknownKey};
use crate::registry::Schemas;
use crate::schema::{LoadResult, Loaded};
use crate::spec::{Literal, TySpec};
use crate::value::Json;

pub struct JsonParser {
    schemas: Schemas,
    context: Vec<Frame>,
}

impl Default for JsonParser {
    fn default() -> Self {
        JsonParser::new()
    }
}

impl JsonParser {
    /// A parser over the built-in type vocabulary.
    pub fn new() -> Self {
        JsonParser::bare(defaults::default_schemas())
    }

    /// Built-ins layered under `user`; user entries win on collision.
    pub fn with_schemas(user: Schemas) -> Self {
        JsonParser::bare(Schemas::merge([defaults::default_schemas(), user]))
    }

    /// Exactly the given registry, no built-ins.
    pub fn bare(schemas: Schemas) -> Self {
        JsonParser {
            schemas,
            context: Vec::new(),
        }
    }

    pub fn schemas(&self) -> &Schemas {
        &self.schemas
    }

    /// Parse `text` and validate the root against `spec`. Malformed text
    /// surfaces as `ParseFailure::Syntax` with no trail; everything else
    /// is a structural `LoadError`. Never panics on bad input.
    pub fn parse_as(&mut self, text: &str, spec: &TySpec) -> Result<Loaded, ParseFailure> {
        self.context.clear();
        let raw: serde_json::Value = serde_json::from_str(text)?;
        let node = Json::from(raw);
        let result = self.load_as(&node, spec);
        debug_assert!(self.context.is_empty(), "context frames must balance");
        result.map_err(ParseFailure::from)
    }

    /// `parse_as`, unwrapping the failure side by panicking with the
    /// rendered message. For tests and prototypes.
    pub fn parse_as_or_panic(&mut self, text: &str, spec: &TySpec) -> Loaded {
        match self.parse_as(text, spec) {
            Ok(value) => value,
            Err(failure) => panic!("{failure}"),
        }
    }

    /// Validate one node against `spec`, one frame deep. The frame holds
    /// the raw spec and node; no description or value text is built
    /// unless an error is actually displayed.
    pub fn load_as(&mut self, node: &Json, spec: &TySpec) -> LoadResult {
        trace!(kind = node.kind_name(), "descending");
        self.context.push(Frame::Value {
            spec: spec.clone(),
            value: node.clone(),
        });
        let result = self.load_in_frame(node, spec);
        self.context.pop();
        result
    }

    /// `load_as` inside an object member, for exact error locations.
    pub fn load_key_as(&mut self, key: &str, node: &Json, spec: &TySpec) -> LoadResult {
        self.context.push(Frame::Key(key.to_string()));
        let result = self.load_as(node, spec);
        self.context.pop();
        result
    }

    /// `load_as` inside an array element.
    pub fn load_index_as(&mut self, index: usize, node: &Json, spec: &TySpec) -> LoadResult {
        self.context.push(Frame::Index(index));
        let result = self.load_as(node, spec);
        self.context.pop();
        result
    }

    fn load_in_frame(&mut self, node: &Json, spec: &TySpec) -> LoadResult {
        if let TySpec::Lit(lit) = spec {
            return self.load_literal(node, lit);
        }
        match self.schemas.get_schema_for_spec(spec) {
            Err(err) => Err(self.fail_with_bad_spec(err)),
            Ok(None) => Err(self.fail_with_unknown_spec(spec)),
            Ok(Some(schema)) => schema.on(self, node),
        }
    }

    /// A literal spec constrains the value itself, no registry involved.
    fn load_literal(&mut self, node: &Json, lit: &Literal) -> LoadResult {
        let matched = match (node, lit) {
            (Json::Boolean(b), Literal::Bool(l)) => b == l,
            (Json::Number(n), Literal::Num(l)) => *n == l.0,
            (Json::String(s), Literal::Str(l)) => s == l,
            _ => false,
        };
        if matched {
            Ok(Loaded::new(node.clone()))
        } else {
            Err(self.fail_with_type_error(format!("the literal {lit}"), node.kind_with_article()))
        }
    }

    // --------------------- structured error builders -------------------- //
    //
    // All four snapshot the live trail; calling them with no parse in
    // flight is a programming error and panics.

    fn snapshot(&self) -> Vec<Frame> {
        assert!(
            !self.context.is_empty(),
            "structured errors can only be built during an active parse"
        );
        self.context.clone()
    }

    pub fn fail_with_type_error(
        &self,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> LoadError {
        LoadError {
            schemas: self.schemas.clone(),
            trail: self.snapshot(),
            kind: LoadErrorKind::TypeMismatch {
                expected: expected.into(),
                actual: actual.into(),
            },
        }
    }

    pub fn fail_with_missing_keys(&self, keys: Vec<String>) -> LoadError {
        LoadError {
            schemas: self.schemas.clone(),
            trail: self.snapshot(),
            kind: LoadErrorKind::MissingKeys(keys),
        }
    }

    pub fn fail_with_unknown_keys(&self, keys: Vec<UnknownKey>) -> LoadError {
        LoadError {
            schemas: self.schemas.clone(),
            trail: self.snapshot(),
            kind: LoadErrorKind::UnknownKeys(keys),
        }
    }

    pub fn fail_with_unknown_spec(&self, spec: &TySpec) -> LoadError {
        LoadError {
            schemas: self.schemas.clone(),
            trail: self.snapshot(),
            kind: LoadErrorKind::UnknownSpec(self.schemas.describe_for_trail(spec)),
        }
    }

    pub(crate) fn fail_with_bad_spec(&self, err: SpecError) -> LoadError {
        LoadError {
            schemas: self.schemas.clone(),
            trail: self.snapshot(),
            kind: LoadErrorKind::BadSpec(err),
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
