//! Integration tests for flattening object graphs into records

mod test_support;

use pretty_assertions::assert_eq;
use recordmap_core::{flatten, Error, MapperConfig, Namespace, Object};
use serde_json::json;
use test_support::{record, ComplexObject, Data, ParentModel, Point, TestModel};

#[test]
fn test_flatten_property() {
    let config = MapperConfig::default();
    let actual = flatten(&Data::new("Joe"), &config).unwrap();
    assert_eq!(actual, record(json!({"name": "Joe"})));
}

#[test]
fn test_flatten_sub_objects() {
    let config = MapperConfig::default();
    let data = Data::new("Joe").with_data(Data::new("John"));

    let actual = flatten(&data, &config).unwrap();
    assert_eq!(
        actual,
        record(json!({
            "name": "Joe",
            "data": {"name": "John"}
        }))
    );
}

#[test]
fn test_flatten_array_of_sub_objects() {
    let config = MapperConfig::default();
    let data = Data::new("Joe").with_datas(vec![
        Data::new("John"),
        Data::new("Jesse"),
        Data::new("Jack").with_optional("x"),
    ]);

    let actual = flatten(&data, &config).unwrap();
    assert_eq!(
        actual,
        record(json!({
            "name": "Joe",
            "datas": [
                {"name": "John"},
                {"name": "Jesse"},
                {"name": "Jack", "optional": "x"}
            ]
        }))
    );
}

#[test]
fn test_flatten_keeps_strings_whole() {
    let config = MapperConfig::default();
    let long = "a string that is long enough to be tempting to iterate".repeat(4);
    let actual = flatten(&Data::new(&long), &config).unwrap();
    assert_eq!(actual.get("name"), Some(&json!(long)));
}

#[test]
fn test_flatten_keep_null() {
    let config = MapperConfig::default().keep_null();
    let actual = flatten(&Data::new("Joe"), &config).unwrap();
    assert_eq!(
        actual,
        record(json!({
            "name": "Joe",
            "data": null,
            "optional": null,
            "datas": null
        }))
    );
}

#[test]
fn test_flatten_attributes_follow_declared_fields() {
    let config = MapperConfig::default();
    let mut data = Data::new("Joe");
    data.attributes.insert("nickname".to_string(), json!("Jo"));

    let actual = flatten(&data, &config).unwrap();
    let keys: Vec<&str> = actual.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["name", "nickname"]);
}

#[test]
fn test_flatten_variadic_containers() {
    let config = MapperConfig::default();
    let object = ComplexObject {
        required: "r".to_string(),
        args: vec![json!("a"), json!("b")],
        optional: "opt".to_string(),
        kwargs: [("x".to_string(), json!("y"))].into_iter().collect(),
    };

    let actual = flatten(&object, &config).unwrap();
    assert_eq!(
        actual,
        record(json!({
            "required": "r",
            "args": ["a", "b"],
            "optional": "opt",
            "kwargs": {"x": "y"}
        }))
    );
}

#[test]
fn test_flatten_keyword_models() {
    let config = MapperConfig::default();
    let aged = TestModel::new("id", Some(4));
    assert_eq!(
        flatten(&aged, &config).unwrap(),
        record(json!({"id": "id", "age": 4}))
    );
    let unaged = TestModel::new("id", None);
    assert_eq!(
        flatten(&unaged, &config).unwrap(),
        record(json!({"id": "id"}))
    );

    let parent = ParentModel {
        child: TestModel::new("c", None),
        optional_child: None,
    };
    assert_eq!(
        flatten(&parent, &config).unwrap(),
        record(json!({"child": {"id": "c"}}))
    );
}

#[test]
fn test_flatten_unset_slots_are_skipped() {
    let config = MapperConfig::default().keep_null();
    let point = Point {
        x: Some(1),
        y: None,
    };
    assert_eq!(flatten(&point, &config).unwrap(), record(json!({"x": 1})));
}

#[test]
fn test_flatten_namespace() {
    let config = MapperConfig::default();
    let mut inner = Namespace::new();
    inner.insert("name", json!("John").into());
    let mut outer = Namespace::new();
    outer.insert("name", json!("Joe").into());
    outer.insert("data", (Box::new(inner) as Box<dyn Object>).into());

    assert_eq!(
        flatten(&outer, &config).unwrap(),
        record(json!({"name": "Joe", "data": {"name": "John"}}))
    );
}

#[test]
fn test_flatten_depth_limit() {
    let config = MapperConfig::default().with_max_depth(3);
    let leaf = Data::new("c").with_data(Data::new("d"));
    let deep = Data::new("a").with_data(Data::new("b").with_data(leaf));

    let err = flatten(&deep, &config).unwrap_err();
    assert!(matches!(err, Error::DepthExceeded { max_depth: 3, .. }));
}
