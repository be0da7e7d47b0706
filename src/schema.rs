//! Reusable validator/transformer bundles, one handler per JSON kind.
//!
//! A `JsonSchema` is total over all six node kinds: any handler left
//! unset falls back to a type-mismatch failure built from the schema's
//! own description. The factories below compose the whole built-in type
//! vocabulary; nothing here is special-cased inside the parser.

use indexmap::IndexMap;
use std::any::Any;
use std::sync::Arc;

use crate::error::{LoadError, UnknownKey};
use crate::parser::JsonParser;
use crate::spec::TySpec;
use crate::value::Json;

// ------------------------------- Output ----------------------------------- //

/// The output cell of a loader: an owned value of whatever type the
/// schema's `finish` step produced. Built-in loaders yield `bool`, `f64`,
/// `String`, `()` for null, `Vec<Loaded>`, `IndexMap<String, Loaded>`,
/// and `Json` for the catch-all spec.
pub struct Loaded(Box<dyn Any>);

impl Loaded {
    pub fn new<T: 'static>(value: T) -> Self {
        Loaded(Box::new(value))
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.0.is::<T>()
    }

    pub fn downcast<T: 'static>(self) -> Result<T, Loaded> {
        self.0.downcast::<T>().map(|b| *b).map_err(Loaded)
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl std::fmt::Debug for Loaded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Loaded(..)")
    }
}

pub type LoadResult = Result<Loaded, LoadError>;

// ------------------------------ Handlers ----------------------------------- //

type ArrayHandler = Arc<dyn Fn(&mut JsonParser, &[Json]) -> LoadResult + Send + Sync>;
type BooleanHandler = Arc<dyn Fn(&mut JsonParser, bool) -> LoadResult + Send + Sync>;
type NullHandler = Arc<dyn Fn(&mut JsonParser) -> LoadResult + Send + Sync>;
type NumberHandler = Arc<dyn Fn(&mut JsonParser, f64) -> LoadResult + Send + Sync>;
type ObjectHandler =
    Arc<dyn Fn(&mut JsonParser, &IndexMap<String, Json>) -> LoadResult + Send + Sync>;
type StringHandler = Arc<dyn Fn(&mut JsonParser, &str) -> LoadResult + Send + Sync>;
type AnyHandler = Arc<dyn Fn(&mut JsonParser, &Json) -> LoadResult + Send + Sync>;

/// An immutable bundle of per-kind handlers plus an optional catch-all.
/// Dispatch order: matching per-kind handler, then the catch-all, then
/// the default type-mismatch failure.
#[derive(Clone, Default)]
pub struct JsonSchema {
    description: String,
    on_array: Option<ArrayHandler>,
    on_boolean: Option<BooleanHandler>,
    on_null: Option<NullHandler>,
    on_number: Option<NumberHandler>,
    on_object: Option<ObjectHandler>,
    on_string: Option<StringHandler>,
    on_any: Option<AnyHandler>,
}

impl std::fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSchema")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl JsonSchema {
    pub fn new(description: impl Into<String>) -> Self {
        JsonSchema {
            description: description.into(),
            ..JsonSchema::default()
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn with_array(
        mut self,
        f: impl Fn(&mut JsonParser, &[Json]) -> LoadResult + Send + Sync + 'static,
    ) -> Self {
        self.on_array = Some(Arc::new(f));
        self
    }

    pub fn with_boolean(
        mut self,
        f: impl Fn(&mut JsonParser, bool) -> LoadResult + Send + Sync + 'static,
    ) -> Self {
        self.on_boolean = Some(Arc::new(f));
        self
    }

    pub fn with_null(
        mut self,
        f: impl Fn(&mut JsonParser) -> LoadResult + Send + Sync + 'static,
    ) -> Self {
        self.on_null = Some(Arc::new(f));
        self
    }

    pub fn with_number(
        mut self,
        f: impl Fn(&mut JsonParser, f64) -> LoadResult + Send + Sync + 'static,
    ) -> Self {
        self.on_number = Some(Arc::new(f));
        self
    }

    pub fn with_object(
        mut self,
        f: impl Fn(&mut JsonParser, &IndexMap<String, Json>) -> LoadResult + Send + Sync + 'static,
    ) -> Self {
        self.on_object = Some(Arc::new(f));
        self
    }

    pub fn with_string(
        mut self,
        f: impl Fn(&mut JsonParser, &str) -> LoadResult + Send + Sync + 'static,
    ) -> Self {
        self.on_string = Some(Arc::new(f));
        self
    }

    /// Catch-all handler with access to the live parser and the raw node.
    /// This is the escape hatch for validation that is not purely
    /// structural (numeric ranges, alternative matching, cross-spec
    /// lookups).
    pub fn with_any(
        mut self,
        f: impl Fn(&mut JsonParser, &Json) -> LoadResult + Send + Sync + 'static,
    ) -> Self {
        self.on_any = Some(Arc::new(f));
        self
    }

    /// Dispatch `node` to the handler matching its kind.
    pub fn on(&self, parser: &mut JsonParser, node: &Json) -> LoadResult {
        let handled = match node {
            Json::Array(items) => self.on_array.as_ref().map(|h| h(parser, items)),
            Json::Boolean(b) => self.on_boolean.as_ref().map(|h| h(parser, *b)),
            Json::Null => self.on_null.as_ref().map(|h| h(parser)),
            Json::Number(n) => self.on_number.as_ref().map(|h| h(parser, *n)),
            Json::Object(m) => self.on_object.as_ref().map(|h| h(parser, m)),
            Json::String(s) => self.on_string.as_ref().map(|h| h(parser, s)),
        };
        if let Some(result) = handled {
            return result;
        }
        if let Some(h) = &self.on_any {
            return h(parser, node);
        }
        Err(parser.fail_with_type_error(self.description.as_str(), node.kind_with_article()))
    }
}

// ------------------------------ Factories ---------------------------------- //

pub fn boolean_schema(
    description: impl Into<String>,
    finish: impl Fn(bool) -> Loaded + Send + Sync + 'static,
) -> JsonSchema {
    JsonSchema::new(description).with_boolean(move |_, b| Ok(finish(b)))
}

pub fn number_schema(
    description: impl Into<String>,
    finish: impl Fn(f64) -> Loaded + Send + Sync + 'static,
) -> JsonSchema {
    JsonSchema::new(description).with_number(move |_, n| Ok(finish(n)))
}

pub fn string_schema(
    description: impl Into<String>,
    finish: impl Fn(&str) -> Loaded + Send + Sync + 'static,
) -> JsonSchema {
    JsonSchema::new(description).with_string(move |_, s| Ok(finish(s)))
}

pub fn null_schema(
    description: impl Into<String>,
    finish: impl Fn() -> Loaded + Send + Sync + 'static,
) -> JsonSchema {
    JsonSchema::new(description).with_null(move |_| Ok(finish()))
}

/// Validate every element against `elem`, short-circuiting on the first
/// failing element, then hand the loaded elements to `finish`.
pub fn array_schema(
    description: impl Into<String>,
    elem: TySpec,
    finish: impl Fn(Vec<Loaded>) -> Loaded + Send + Sync + 'static,
) -> JsonSchema {
    JsonSchema::new(description).with_array(move |parser, items| {
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            out.push(parser.load_index_as(i, item, &elem)?);
        }
        Ok(finish(out))
    })
}

/// Homogeneous "dictionary" object: every value validates against the
/// spec `key_spec` selects for its key.
pub fn object_schema_map(
    description: impl Into<String>,
    key_spec: impl Fn(&str) -> TySpec + Send + Sync + 'static,
    finish: impl Fn(IndexMap<String, Loaded>) -> Loaded + Send + Sync + 'static,
) -> JsonSchema {
    JsonSchema::new(description).with_object(move |parser, members| {
        let mut out = IndexMap::with_capacity(members.len());
        for (key, value) in members {
            let spec = key_spec(key);
            out.insert(key.clone(), parser.load_key_as(key, value, &spec)?);
        }
        Ok(finish(out))
    })
}

/// Fixed-key object with complete key-set accounting.
///
/// One pass over the actual members: known fields load (a nested failure
/// propagates immediately), unknown keys accumulate. Only after a clean
/// pass do the aggregate checks run — all unknown keys first, then all
/// missing fields, lexicographically sorted.
pub fn object_schema(
    description: impl Into<String>,
    fields: IndexMap<String, TySpec>,
    finish: impl Fn(IndexMap<String, Loaded>) -> Loaded + Send + Sync + 'static,
) -> JsonSchema {
    JsonSchema::new(description).with_object(move |parser, members| {
        let mut loaded = IndexMap::with_capacity(fields.len());
        let mut unknown = Vec::new();
        for (key, value) in members {
            match fields.get(key) {
                Some(spec) => {
                    loaded.insert(key.clone(), parser.load_key_as(key, value, spec)?);
                }
                None => unknown.push(key.clone()),
            }
        }
        if !unknown.is_empty() {
            let expected: Vec<&str> = fields.keys().map(String::as_str).collect();
            let unknown = unknown
                .into_iter()
                .map(|name| UnknownKey {
                    suggestion: find_similar_field(&name, &expected).map(str::to_string),
                    name,
                })
                .collect();
            return Err(parser.fail_with_unknown_keys(unknown));
        }
        let mut missing: Vec<String> = fields
            .keys()
            .filter(|k| !loaded.contains_key(*k))
            .cloned()
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(parser.fail_with_missing_keys(missing));
        }
        Ok(finish(loaded))
    })
}

/// Escape hatch: a schema made of nothing but a catch-all handler.
pub fn custom_schema(
    description: impl Into<String>,
    f: impl Fn(&mut JsonParser, &Json) -> LoadResult + Send + Sync + 'static,
) -> JsonSchema {
    JsonSchema::new(description).with_any(f)
}

/// Best fuzzy match for an unknown field name among the expected ones.
/// Jaro-Winkler with a 0.6 floor; highest similarity wins.
fn find_similar_field<'a>(unknown: &str, expected: &[&'a str]) -> Option<&'a str> {
    let mut best: Option<(&'a str, f64)> = None;
    for &candidate in expected {
        let similarity = strsim::jaro_winkler(unknown, candidate);
        if similarity >= 0.6 && best.is_none_or(|(_, s)| similarity > s) {
            best = Some((candidate, similarity));
        }
    }
    best.map(|(name, _)| name)
}

// ------------------------------- Tests ------------------------------------ //
