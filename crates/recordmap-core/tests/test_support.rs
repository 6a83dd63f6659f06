//! Shared model types and helpers for integration tests

#![allow(dead_code)]

use recordmap_core::{
    Arguments, ConstructError, Dynamic, Field, FieldLayout, FromDynamic, Object, Parameter,
    Record, SetFieldError, ToField, TypeDescriptor, TypeRegistry,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Scope id every test model is registered under
pub const SCOPE: &str = "tests.models";

/// Convert a JSON object literal into a record
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

/// Registry holding every test model under [`SCOPE`]
pub fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register(SCOPE, Data::descriptor());
    registry.register(SCOPE, ComplexObject::descriptor());
    registry.register(SCOPE, TestModel::descriptor());
    registry.register(SCOPE, ParentModel::descriptor());
    registry
}

fn assign<T: FromDynamic>(name: &str, value: Dynamic) -> Result<T, SetFieldError> {
    T::from_dynamic(value).map_err(|_| SetFieldError::WrongType {
        name: name.to_string(),
        expected: T::expected(),
    })
}

fn unbox<T>(items: Option<Vec<Box<T>>>) -> Option<Vec<T>> {
    items.map(|items| items.into_iter().map(|item| *item).collect())
}

/// Model with nested optional children and free-form attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Data {
    pub name: String,
    pub data: Option<Box<Data>>,
    pub optional: Option<String>,
    pub datas: Option<Vec<Data>>,
    /// Plain values assigned after construction
    pub attributes: BTreeMap<String, Value>,
}

impl Data {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_data(mut self, data: Data) -> Self {
        self.data = Some(Box::new(data));
        self
    }

    pub fn with_datas(mut self, datas: Vec<Data>) -> Self {
        self.datas = Some(datas);
        self
    }

    pub fn with_optional(mut self, optional: &str) -> Self {
        self.optional = Some(optional.to_string());
        self
    }

    pub fn hello(&self) -> String {
        format!("hello {}", self.name)
    }

    /// `Data(name, data: Optional[Data] = None, datas: Optional[list[Data]] = None)`
    pub fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder("Data")
            .param(Parameter::receiver())
            .param(Parameter::positional("name"))
            .typed_param(
                Parameter::positional("data").with_default(Value::Null),
                "Optional[Data]",
            )
            .unwrap()
            .typed_param(
                Parameter::positional("datas").with_default(Value::Null),
                "Optional[list[Data]]",
            )
            .unwrap()
            .constructor(|args: &mut Arguments| {
                let name = args.next::<String>("name")?;
                let data = args.next::<Option<Box<Data>>>("data")?;
                let datas = args.next::<Option<Vec<Box<Data>>>>("datas")?;
                std::mem::take(args).finish()?;
                Ok(Data {
                    name,
                    data,
                    datas: unbox(datas),
                    ..Data::default()
                })
            })
            .bare_default::<Data>()
            .build()
            .unwrap()
    }
}

impl Object for Data {
    fn type_name(&self) -> &str {
        "Data"
    }

    fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = ["name", "data", "optional", "datas"]
            .iter()
            .map(|name| name.to_string())
            .collect();
        names.extend(self.attributes.keys().cloned());
        names
    }

    fn field(&self, name: &str) -> Option<Field<'_>> {
        match name {
            "name" => Some(self.name.to_field()),
            "data" => Some(Field::maybe_object(self.data.as_deref())),
            "optional" => Some(self.optional.to_field()),
            "datas" => Some(
                self.datas
                    .as_ref()
                    .map_or(Field::Null, |datas| Field::objects(datas)),
            ),
            other => self.attributes.get(other).map(ToField::to_field),
        }
    }

    fn set_field(&mut self, name: &str, value: Dynamic) -> Result<(), SetFieldError> {
        match name {
            "name" => self.name = assign(name, value)?,
            "data" => self.data = assign(name, value)?,
            "optional" => self.optional = assign(name, value)?,
            "datas" => self.datas = unbox(assign(name, value)?),
            other => {
                let value = assign::<Value>(other, value)?;
                self.attributes.insert(other.to_string(), value);
            }
        }
        Ok(())
    }
}

/// `ComplexObject(required, *args, optional='', **kwargs)`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplexObject {
    pub required: String,
    pub args: Vec<Value>,
    pub optional: String,
    pub kwargs: BTreeMap<String, Value>,
}

impl ComplexObject {
    pub fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder("ComplexObject")
            .param(Parameter::receiver())
            .param(Parameter::positional("required"))
            .param(Parameter::var_positional("args"))
            .param(Parameter::keyword_only("optional").with_default(Value::from("")))
            .param(Parameter::var_keyword("kwargs"))
            .constructor(|args: &mut Arguments| {
                let required = args.next::<String>("required")?;
                let rest = args.rest::<Value>("args")?;
                let optional = args.keyword::<String>("optional")?;
                let mut kwargs = BTreeMap::new();
                for (name, value) in args.extra_keywords() {
                    let value = Value::from_dynamic(value).map_err(|found| {
                        ConstructError::TypeMismatch {
                            name: name.clone(),
                            expected: Value::expected(),
                            found: found.kind(),
                        }
                    })?;
                    kwargs.insert(name, value);
                }
                Ok(ComplexObject {
                    required,
                    args: rest,
                    optional,
                    kwargs,
                })
            })
            .build()
            .unwrap()
    }
}

impl Object for ComplexObject {
    fn type_name(&self) -> &str {
        "ComplexObject"
    }

    fn field_names(&self) -> Vec<String> {
        vec![
            "required".to_string(),
            "args".to_string(),
            "optional".to_string(),
            "kwargs".to_string(),
        ]
    }

    fn field(&self, name: &str) -> Option<Field<'_>> {
        match name {
            "required" => Some(self.required.to_field()),
            "args" => Some(self.args.to_field()),
            "optional" => Some(self.optional.to_field()),
            "kwargs" => Some(self.kwargs.to_field()),
            _ => None,
        }
    }
}

/// Keyword-only model with an optional value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestModel {
    pub id: String,
    pub age: Option<i64>,
}

impl TestModel {
    pub fn new(id: &str, age: Option<i64>) -> Self {
        TestModel {
            id: id.to_string(),
            age,
        }
    }

    pub fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder("TestModel")
            .param(Parameter::keyword_only("id"))
            .typed_param(Parameter::keyword_only("age"), "Optional[int]")
            .unwrap()
            .constructor(|args: &mut Arguments| {
                let id = args.keyword::<String>("id")?;
                let age = args.keyword::<Option<i64>>("age")?;
                std::mem::take(args).finish()?;
                Ok(TestModel { id, age })
            })
            .build()
            .unwrap()
    }
}

impl Object for TestModel {
    fn type_name(&self) -> &str {
        "TestModel"
    }

    fn field_names(&self) -> Vec<String> {
        vec!["id".to_string(), "age".to_string()]
    }

    fn field(&self, name: &str) -> Option<Field<'_>> {
        match name {
            "id" => Some(self.id.to_field()),
            "age" => Some(self.age.to_field()),
            _ => None,
        }
    }
}

/// Model with a required and an optional nested child
#[derive(Debug, Clone, PartialEq)]
pub struct ParentModel {
    pub child: TestModel,
    pub optional_child: Option<TestModel>,
}

impl ParentModel {
    pub fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder("ParentModel")
            .typed_param(Parameter::keyword_only("child"), "TestModel")
            .unwrap()
            .typed_param(
                Parameter::keyword_only("optional_child"),
                "Optional[TestModel]",
            )
            .unwrap()
            .constructor(|args: &mut Arguments| {
                let child = args.keyword::<Box<TestModel>>("child")?;
                let optional_child = args.keyword::<Option<Box<TestModel>>>("optional_child")?;
                std::mem::take(args).finish()?;
                Ok(ParentModel {
                    child: *child,
                    optional_child: optional_child.map(|child| *child),
                })
            })
            .build()
            .unwrap()
    }
}

impl Object for ParentModel {
    fn type_name(&self) -> &str {
        "ParentModel"
    }

    fn field_names(&self) -> Vec<String> {
        vec!["child".to_string(), "optional_child".to_string()]
    }

    fn field(&self, name: &str) -> Option<Field<'_>> {
        match name {
            "child" => Some(Field::object(&self.child)),
            "optional_child" => Some(Field::maybe_object(self.optional_child.as_ref())),
            _ => None,
        }
    }
}

/// Fixed slots that may be left unset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Point {
    pub x: Option<i64>,
    pub y: Option<i64>,
}

impl Object for Point {
    fn type_name(&self) -> &str {
        "Point"
    }

    fn layout(&self) -> FieldLayout {
        FieldLayout::Slots
    }

    fn field_names(&self) -> Vec<String> {
        vec!["x".to_string(), "y".to_string()]
    }

    fn field(&self, name: &str) -> Option<Field<'_>> {
        match name {
            "x" => self.x.map(Field::value),
            "y" => self.y.map(Field::value),
            _ => None,
        }
    }
}
