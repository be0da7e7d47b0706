//! Validate parsed JSON against declarative type specifications.
//!
//! A *spec* ([`TySpec`]) describes a shape: an atomic key like
//! [`spec::BOOLEAN`], or a bracketed sequence like `[Array, Boolean]`
//! built with the helpers in [`spec`]. A [`Schemas`] registry maps specs
//! to loaders by longest-prefix match over the flattened key, so an
//! open-ended spec's trailing arguments reach the registered loader as
//! arguments rather than failing the lookup. The [`JsonParser`] walks a
//! parsed document against a resolved spec, keeping a breadcrumb trail
//! that errors render as a layered, path-annotated message.
//!
//! Design goals:
//! - Specs are plain data; loaders and descriptions are composed at
//!   registration time, never special-cased in the parser.
//! - All validation failures travel as values; only
//!   [`JsonParser::parse_as_or_panic`] converts one into a panic.
//! - The registry is immutable after setup and cheap to share; each
//!   parser drives one parse at a time.
//!
//! # Examples
//!
//! Validating against the built-in vocabulary:
//!
//! ```
//! use json_tyspec::{parse_as_typed, spec};
//!
//! let ok: Vec<json_tyspec::Loaded> = parse_as_typed(
//!     r#"[true, 1, "test"]"#,
//!     &spec::array_of(spec::any_of([spec::BOOLEAN, spec::STRING, spec::NUMBER])),
//! )
//! .unwrap();
//! assert_eq!(ok.len(), 3);
//! ```
//!
//! Errors quote the offending value and the full descent path:
//!
//! ```
//! use json_tyspec::{parse_as, spec};
//!
//! let err = parse_as("[1, 2]", &spec::BOOLEAN).unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "while reading a value for a boolean, got: [1,2]\n\
//!      expected a boolean, but got an array"
//! );
//! ```
//!
//! Layering user specs over the defaults:
//!
//! ```
//! use json_tyspec::{
//!     custom_schema, Json, JsonParser, Loaded, Schemas, SpecOptions, Token,
//! };
//!
//! let latitude = Token::new("Latitude");
//! let mut schemas = Schemas::empty();
//! schemas.add_spec(
//!     latitude.clone(),
//!     SpecOptions::new()
//!         .description("a latitude in degrees")
//!         .load(custom_schema("a latitude in degrees", |parser, node| {
//!             match node {
//!                 Json::Number(n) if (-90.0..=90.0).contains(n) => Ok(Loaded::new(*n)),
//!                 other => Err(parser.fail_with_type_error(
//!                     "a latitude in degrees",
//!                     other.kind_with_article(),
//!                 )),
//!             }
//!         })),
//! );
//!
//! let mut parser = JsonParser::with_schemas(schemas);
//! let lat: f64 = parser
//!     .parse_as("47.37", &latitude.clone().into())
//!     .unwrap()
//!     .downcast()
//!     .unwrap();
//! assert_eq!(lat, 47.37);
//! assert!(parser.parse_as("123.0", &latitude.into()).is_err());
//! ```

pub mod defaults;
pub mod error;
pub mod parser;
pub mod registry;
pub mod schema;
pub mod spec;
pub mod value;

pub use defaults::default_schemas;
pub use error::{Frame, LoadError, LoadErrorKind, ParseFailure, SpecError, UnknownKey};
pub use parser::JsonParser;
pub use registry::{Arity, Schemas, SpecOptions};
pub use schema::{
    array_schema, boolean_schema, custom_schema, null_schema, number_schema, object_schema,
    object_schema_map, string_schema, JsonSchema, LoadResult, Loaded,
};
pub use spec::{Literal, SpecAtom, Token, TySpec};
pub use value::Json;

/// Parse `text` and validate it against `spec` using a fresh parser over
/// the built-in vocabulary.
pub fn parse_as(text: &str, spec: &TySpec) -> Result<Loaded, ParseFailure> {
    let mut parser = JsonParser::new();
    parser.parse_as(text, spec)
}

/// Like [`parse_as`], downcasting the loaded value to `T`.
///
/// # Panics
///
/// Panics if the parse succeeds but the loaded value is not a `T`; the
/// requested type is part of the caller's contract with the spec.
pub fn parse_as_typed<T: 'static>(text: &str, spec: &TySpec) -> Result<T, ParseFailure> {
    parse_as(text, spec).map(|loaded| match loaded.downcast::<T>() {
        Ok(value) => value,
        Err(_) => panic!(
            "loaded value is not a {}",
            std::any::type_name::<T>()
        ),
    })
}
