//! The built-in type vocabulary.
//!
//! Everything here is composed from the public factories in `schema` and
//! registered through the ordinary `Schemas` API; the parser knows
//! nothing about any of these specs. The registry is built once and
//! cloned per parser (clones share the entries).

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::error::SpecError;
use crate::registry::{Arity, Schemas, SpecOptions};
use crate::schema::{
    array_schema, boolean_schema, custom_schema, null_schema, number_schema, object_schema,
    object_schema_map, string_schema, JsonSchema, Loaded,
};
use crate::spec::{Literal, SpecAtom, TySpec, ANY};

static DEFAULTS: Lazy<Schemas> = Lazy::new(build_defaults);

/// The default registry: `Array`, `Object`, `Map`, `Set`, `Boolean`,
/// `Number`, `String`, `null`, `Any`, `AnyOf`, `Tuple`.
pub fn default_schemas() -> Schemas {
    DEFAULTS.clone()
}

fn build_defaults() -> Schemas {
    let mut s = Schemas::empty();

    s.add_spec(
        SpecAtom::Boolean,
        SpecOptions::new()
            .description("a boolean")
            .load(boolean_schema("a boolean", |b| Loaded::new(b))),
    );
    s.add_spec(
        SpecAtom::Number,
        SpecOptions::new()
            .description("a number")
            .load(number_schema("a number", |n| Loaded::new(n))),
    );
    s.add_spec(
        SpecAtom::String,
        SpecOptions::new()
            .description("a string")
            .load(string_schema("a string", |s| Loaded::new(s.to_string()))),
    );
    s.add_spec(
        SpecAtom::Null,
        SpecOptions::new()
            .description("null")
            .load(null_schema("null", || Loaded::new(()))),
    );
    s.add_spec(
        SpecAtom::Any,
        SpecOptions::new()
            .description("anything")
            .load(custom_schema("anything", |_, node| {
                Ok(Loaded::new(node.clone()))
            })),
    );

    s.add_spec(
        SpecAtom::Array,
        SpecOptions::new()
            .args(Arity::between(0, 1))
            .describe_with(array_description)
            .load_with(|schemas, args| {
                let elem = args.first().cloned().unwrap_or(ANY);
                let description = array_description(schemas, args);
                Ok(array_schema(description, elem, Loaded::new))
            }),
    );

    s.add_spec(
        SpecAtom::Map,
        SpecOptions::new()
            .args(Arity::between(0, 1))
            .describe_with(map_description)
            .load_with(|schemas, args| {
                let value = args.first().cloned().unwrap_or(ANY);
                let description = map_description(schemas, args);
                Ok(object_schema_map(
                    description,
                    move |_| value.clone(),
                    Loaded::new,
                ))
            }),
    );

    s.add_spec(
        SpecAtom::Set,
        SpecOptions::new()
            .args(Arity::between(0, 1))
            .describe_with(set_description)
            .load_with(|schemas, args| {
                let elem = args.first().cloned().unwrap_or(ANY);
                let description = set_description(schemas, args);
                Ok(set_schema(description, elem))
            }),
    );

    s.add_spec(
        SpecAtom::Object,
        SpecOptions::new()
            .args(Arity::at_least(0))
            .describe_with(object_description)
            .load_with(|schemas, args| {
                let fields = object_fields(args)?;
                let description = object_description(schemas, args);
                Ok(object_schema(description, fields, Loaded::new))
            }),
    );

    s.add_spec(
        SpecAtom::AnyOf,
        SpecOptions::new()
            .args(Arity::at_least(1))
            .describe_with(any_of_description)
            .load_with(|schemas, args| {
                let description = any_of_description(schemas, args);
                let alts = args.to_vec();
                let expected = description.clone();
                Ok(custom_schema(description, move |parser, node| {
                    for alt in &alts {
                        if let Ok(value) = parser.load_as(node, alt) {
                            return Ok(value);
                        }
                    }
                    Err(parser.fail_with_type_error(expected.as_str(), node.kind_with_article()))
                }))
            }),
    );

    s.add_spec(
        SpecAtom::Tuple,
        SpecOptions::new()
            .args(Arity::at_least(0))
            .describe_with(tuple_description)
            .load_with(|schemas, args| {
                let description = tuple_description(schemas, args);
                Ok(tuple_schema(description, args.to_vec()))
            }),
    );

    s
}

// --------------------------- composed schemas ------------------------------ //

/// Array where duplicate raw elements collapse before loading. Indices
/// in error trails refer to the first occurrence.
fn set_schema(description: String, elem: TySpec) -> JsonSchema {
    JsonSchema::new(description).with_array(move |parser, items| {
        let mut seen: Vec<&crate::value::Json> = Vec::new();
        let mut out = Vec::new();
        for (i, item) in items.iter().enumerate() {
            if seen.iter().any(|s| *s == item) {
                continue;
            }
            seen.push(item);
            out.push(parser.load_index_as(i, item, &elem)?);
        }
        Ok(Loaded::new(out))
    })
}

/// Fixed-length, positionally-typed array.
fn tuple_schema(description: String, elems: Vec<TySpec>) -> JsonSchema {
    let expected = description.clone();
    JsonSchema::new(description).with_array(move |parser, items| {
        if items.len() != elems.len() {
            return Err(parser.fail_with_type_error(
                expected.as_str(),
                format!("an array of {} elements", items.len()),
            ));
        }
        let mut out = Vec::with_capacity(elems.len());
        for (i, (item, spec)) in items.iter().zip(&elems).enumerate() {
            out.push(parser.load_index_as(i, item, spec)?);
        }
        Ok(Loaded::new(out))
    })
}

/// Pull `["name", spec]` pairs out of Object's trailing arguments.
fn object_fields(args: &[TySpec]) -> Result<IndexMap<String, TySpec>, SpecError> {
    let mut fields = IndexMap::with_capacity(args.len());
    for arg in args {
        let malformed = || SpecError::MalformedArgument {
            description: "Object".to_string(),
            detail: format!(
                "expected a [\"name\", spec] pair, got {}",
                arg.fallback_description()
            ),
        };
        let TySpec::Seq(parts) = arg else {
            return Err(malformed());
        };
        let [TySpec::Lit(Literal::Str(name)), spec] = parts.as_slice() else {
            return Err(malformed());
        };
        fields.insert(name.clone(), spec.clone());
    }
    Ok(fields)
}

// ----------------------------- descriptions -------------------------------- //

fn array_description(schemas: &Schemas, args: &[TySpec]) -> String {
    match args {
        [] => "an array".to_string(),
        [elem] => format!("an array of {}", schemas.describe_for_trail(elem)),
        _ => "an array".to_string(),
    }
}

fn map_description(schemas: &Schemas, args: &[TySpec]) -> String {
    match args {
        [] => "a map".to_string(),
        [value] => format!("a map of {}", schemas.describe_for_trail(value)),
        _ => "a map".to_string(),
    }
}

fn set_description(schemas: &Schemas, args: &[TySpec]) -> String {
    match args {
        [] => "a set".to_string(),
        [elem] => format!("a set of {}", schemas.describe_for_trail(elem)),
        _ => "a set".to_string(),
    }
}

fn object_description(_schemas: &Schemas, args: &[TySpec]) -> String {
    match object_fields(args) {
        Ok(fields) if fields.is_empty() => "an empty object".to_string(),
        Ok(fields) => {
            let names = fields
                .keys()
                .map(|k| format!("{k:?}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("an object with fields {names}")
        }
        Err(_) => "an object".to_string(),
    }
}

fn any_of_description(schemas: &Schemas, args: &[TySpec]) -> String {
    let alts = args
        .iter()
        .map(|a| schemas.describe_for_trail(a))
        .collect::<Vec<_>>()
        .join(", ");
    format!("any of: {alts}")
}

fn tuple_description(schemas: &Schemas, args: &[TySpec]) -> String {
    if args.is_empty() {
        return "an empty tuple".to_string();
    }
    let elems = args
        .iter()
        .map(|a| schemas.describe_for_trail(a))
        .collect::<Vec<_>>()
        .join(", ");
    format!("a tuple of {elems}")
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::JsonParser;
    use crate::spec::{any_of, array_of, map_of, set_of, tuple_of, BOOLEAN, NUMBER, NULL, STRING};
    use crate::value::Json;

    fn parser() -> JsonParser {
        JsonParser::new()
    }

    #[test]
    fn scalars_round_trip() {
        let mut p = parser();
        assert_eq!(
            p.parse_as("true", &BOOLEAN).unwrap().downcast::<bool>().unwrap(),
            true
        );
        assert_eq!(
            p.parse_as("4.25", &NUMBER).unwrap().downcast::<f64>().unwrap(),
            4.25
        );
        assert_eq!(
            p.parse_as(r#""hi""#, &STRING).unwrap().downcast::<String>().unwrap(),
            "hi"
        );
        assert!(p.parse_as("null", &NULL).unwrap().is::<()>());
    }

    #[test]
    fn array_defaults_to_anything() {
        let mut p = parser();
        let loaded = p
            .parse_as(r#"[true, 1, "x"]"#, &TySpec::from(SpecAtom::Array))
            .unwrap()
            .downcast::<Vec<Loaded>>()
            .unwrap();
        assert_eq!(loaded.len(), 3);
        assert!(loaded[0].is::<Json>());
    }

    #[test]
    fn array_elements_validate_and_cite_their_index() {
        let mut p = parser();
        let err = p
            .parse_as("[1, 2, true]", &array_of(NUMBER))
            .unwrap_err()
            .to_string();
        assert!(err.contains("at index 2:"), "{err}");
        assert!(err.contains("expected a number, but got a boolean"), "{err}");
    }

    #[test]
    fn map_collects_members_in_order() {
        let mut p = parser();
        let loaded = p
            .parse_as(r#"{"b": 1, "a": 2}"#, &map_of(NUMBER))
            .unwrap()
            .downcast::<IndexMap<String, Loaded>>()
            .unwrap();
        let keys: Vec<&String> = loaded.keys().collect();
        assert_eq!(keys, ["b", "a"]);
    }

    #[test]
    fn set_collapses_duplicate_raw_elements() {
        let mut p = parser();
        let loaded = p
            .parse_as("[1, 1, 2, 1]", &set_of(NUMBER))
            .unwrap()
            .downcast::<Vec<Loaded>>()
            .unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn any_of_takes_first_matching_alternative() {
        let mut p = parser();
        let spec = any_of([BOOLEAN, STRING, NUMBER]);
        assert!(p.parse_as("true", &spec).unwrap().is::<bool>());
        assert!(p.parse_as("1", &spec).unwrap().is::<f64>());
        assert!(p.parse_as(r#""x""#, &spec).unwrap().is::<String>());

        let err = p.parse_as("null", &spec).unwrap_err().to_string();
        assert!(err.contains("expected any of: a boolean, a string, a number"), "{err}");
        assert!(err.contains("but got null"), "{err}");
    }

    #[test]
    fn tuple_length_must_match() {
        let mut p = parser();
        let spec = tuple_of([STRING, BOOLEAN]);
        let loaded = p
            .parse_as(r#"["x", true]"#, &spec)
            .unwrap()
            .downcast::<Vec<Loaded>>()
            .unwrap();
        assert_eq!(loaded.len(), 2);

        let err = p.parse_as(r#"["x"]"#, &spec).unwrap_err().to_string();
        assert!(err.contains("a tuple of a string, a boolean"), "{err}");
        assert!(err.contains("an array of 1 elements"), "{err}");
    }

    #[test]
    fn object_malformed_arguments_are_spec_errors() {
        let mut p = parser();
        // Object argument that is not a ["name", spec] pair.
        let bad = TySpec::seq(vec![TySpec::from(SpecAtom::Object), BOOLEAN]);
        let err = p.parse_as("{}", &bad).unwrap_err().to_string();
        assert!(err.contains("invalid specification"), "{err}");
        assert!(err.contains("[\"name\", spec] pair"), "{err}");
    }

    #[test]
    fn descriptions_compose_recursively() {
        let s = default_schemas();
        assert_eq!(
            s.get_description(&array_of(map_of(BOOLEAN))).unwrap(),
            "an array of a map of a boolean"
        );
        assert_eq!(
            s.get_description(&crate::spec::object_spec_of([("p", BOOLEAN)]))
                .unwrap(),
            "an object with fields \"p\""
        );
    }
}
