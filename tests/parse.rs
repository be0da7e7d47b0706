//! End-to-end scenarios: text in, loaded values or rendered errors out.

use anyhow::Result;
use indexmap::IndexMap;
use json_tyspec::spec::{
    any_of, array_of, object_spec_of, tuple_of, BOOLEAN, NULL, NUMBER, STRING,
};
use json_tyspec::{
    custom_schema, parse_as, Json, JsonParser, LoadErrorKind, Loaded, ParseFailure, Schemas,
    SpecOptions, Token,
};

fn load_error(failure: ParseFailure) -> json_tyspec::LoadError {
    match failure {
        ParseFailure::Load(err) => err,
        ParseFailure::Syntax(err) => panic!("expected a load error, got syntax error: {err}"),
    }
}

#[test]
fn scalars_round_trip() -> Result<()> {
    assert_eq!(parse_as("true", &BOOLEAN)?.downcast::<bool>().unwrap(), true);
    assert_eq!(parse_as("false", &BOOLEAN)?.downcast::<bool>().unwrap(), false);
    assert_eq!(parse_as("-3.5", &NUMBER)?.downcast::<f64>().unwrap(), -3.5);
    assert_eq!(parse_as(r#""test""#, &STRING)?.downcast::<String>().unwrap(), "test");
    assert!(parse_as("null", &NULL)?.is::<()>());
    Ok(())
}

#[test]
fn object_with_matching_field_succeeds() -> Result<()> {
    let spec = object_spec_of([("p", BOOLEAN)]);
    let fields = parse_as(r#"{"p": true}"#, &spec)?
        .downcast::<IndexMap<String, Loaded>>()
        .unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields["p"].downcast_ref::<bool>(), Some(&true));
    Ok(())
}

#[test]
fn empty_object_reports_the_missing_field() {
    let spec = object_spec_of([("p", BOOLEAN)]);
    let err = load_error(parse_as("{}", &spec).unwrap_err());
    assert_eq!(err.kind, LoadErrorKind::MissingKeys(vec!["p".to_string()]));
    assert!(err.to_string().ends_with("missing keys: \"p\""));
}

#[test]
fn extra_member_reports_the_unknown_key() {
    let spec = object_spec_of([("p", BOOLEAN)]);
    let err = load_error(parse_as(r#"{"p": true, "q": 1}"#, &spec).unwrap_err());
    let LoadErrorKind::UnknownKeys(keys) = &err.kind else {
        panic!("expected unknown keys, got {:?}", err.kind);
    };
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].name, "q");
}

#[test]
fn all_missing_fields_are_aggregated() {
    let spec = object_spec_of([("p1", BOOLEAN), ("p2", NUMBER), ("p3", STRING)]);
    let err = load_error(parse_as(r#"{"p2": 1}"#, &spec).unwrap_err());
    assert_eq!(
        err.kind,
        LoadErrorKind::MissingKeys(vec!["p1".to_string(), "p3".to_string()])
    );
}

#[test]
fn all_unknown_keys_are_aggregated_with_suggestions() {
    let spec = object_spec_of([("name", STRING), ("age", NUMBER)]);
    let err = load_error(parse_as(r#"{"name": "a", "nmae": "b", "zzz": 1}"#, &spec).unwrap_err());
    let LoadErrorKind::UnknownKeys(keys) = &err.kind else {
        panic!("expected unknown keys, got {:?}", err.kind);
    };
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0].name, "nmae");
    assert_eq!(keys[0].suggestion.as_deref(), Some("name"));
    assert_eq!(keys[1].name, "zzz");
    assert_eq!(keys[1].suggestion, None);
}

#[test]
fn nested_field_failure_wins_over_key_accounting() {
    // "p" fails validation before the unknown "q" is ever reported.
    let spec = object_spec_of([("p", BOOLEAN)]);
    let err = load_error(parse_as(r#"{"p": 1, "q": 2}"#, &spec).unwrap_err());
    assert!(matches!(err.kind, LoadErrorKind::TypeMismatch { .. }));
    assert!(err.to_string().contains("in key \"p\":"));
}

#[test]
fn type_error_quotes_the_offending_value() {
    let err = load_error(parse_as("[1, 2]", &BOOLEAN).unwrap_err());
    let msg = err.to_string();
    assert!(msg.contains("[1,2]"), "{msg}");
    assert!(msg.ends_with("expected a boolean, but got an array"), "{msg}");
}

#[test]
fn any_of_elements_load_as_their_own_types() -> Result<()> {
    let spec = array_of(any_of([BOOLEAN, STRING, NUMBER]));
    let loaded = parse_as(r#"[true, 1, "test"]"#, &spec)?
        .downcast::<Vec<Loaded>>()
        .unwrap();
    assert_eq!(loaded[0].downcast_ref::<bool>(), Some(&true));
    assert_eq!(loaded[1].downcast_ref::<f64>(), Some(&1.0));
    assert_eq!(loaded[2].downcast_ref::<String>().map(String::as_str), Some("test"));
    Ok(())
}

#[test]
fn tuple_mismatch_cites_the_failing_position() {
    let spec = tuple_of([STRING, BOOLEAN, NUMBER]);
    let err = load_error(parse_as(r#"["test", true, null]"#, &spec).unwrap_err());
    let msg = err.to_string();
    assert!(msg.contains("at index 2:"), "{msg}");
    assert!(msg.ends_with("expected a number, but got null"), "{msg}");
}

#[test]
fn deep_descent_renders_a_layered_trail() {
    let spec = object_spec_of([("outer", object_spec_of([("inner", NUMBER)]))]);
    let err = load_error(parse_as(r#"{"outer": {"inner": []}}"#, &spec).unwrap_err());
    let msg = err.to_string();
    let lines: Vec<&str> = msg.lines().collect();
    assert_eq!(
        lines,
        vec![
            r#"while reading a value for an object with fields "outer", got: {"outer":{"inner":[]}}"#,
            r#"in key "outer":"#,
            r#"while reading a value for an object with fields "inner", got: {"inner":[]}"#,
            r#"in key "inner":"#,
            r#"while reading a value for a number, got: []"#,
            "expected a number, but got an array",
        ]
    );
}

#[test]
fn malformed_text_is_a_syntax_error() {
    let err = parse_as("{truncated", &BOOLEAN).unwrap_err();
    assert!(matches!(err, ParseFailure::Syntax(_)));
}

#[test]
fn user_registry_layers_over_defaults() -> Result<()> {
    let port = Token::new("Port");
    let mut schemas = Schemas::empty();
    schemas.add_spec(
        port.clone(),
        SpecOptions::new()
            .description("a TCP port")
            .load(custom_schema("a TCP port", |parser, node| match node {
                Json::Number(n) if (1.0..=65535.0).contains(n) && n.fract() == 0.0 => {
                    Ok(Loaded::new(*n as u16))
                }
                other => {
                    Err(parser.fail_with_type_error("a TCP port", other.kind_with_article()))
                }
            })),
    );
    let mut parser = JsonParser::with_schemas(schemas);

    // The user spec works inside built-in combinators.
    let spec = object_spec_of([("host", STRING), ("port", port.into())]);
    let fields = parser
        .parse_as(r#"{"host": "localhost", "port": 5432}"#, &spec)?
        .downcast::<IndexMap<String, Loaded>>()
        .unwrap();
    assert_eq!(fields["port"].downcast_ref::<u16>(), Some(&5432));

    // Built-ins are still present after the merge.
    assert!(parser.parse_as("true", &BOOLEAN).is_ok());
    Ok(())
}

#[test]
fn aliases_resolve_through_the_default_vocabulary() {
    let flag = Token::new("Flag");
    let mut schemas = Schemas::empty();
    schemas.add_alias(flag.clone(), BOOLEAN);

    let mut parser = JsonParser::with_schemas(schemas);
    let loaded = parser.parse_as_or_panic("true", &flag.into());
    assert_eq!(loaded.downcast_ref::<bool>(), Some(&true));
}

#[test]
#[should_panic(expected = "expected a boolean")]
fn parse_as_or_panic_raises_the_rendered_failure() {
    let mut parser = JsonParser::new();
    let _ = parser.parse_as_or_panic("1", &BOOLEAN);
}
