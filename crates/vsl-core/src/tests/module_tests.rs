use crate::builder::FunctionBuilder;
use crate::function::{Function, FunctionSignature};
use crate::module::{ExternalFunction, GlobalData, Module};
use crate::values::{Location, Value};
use crate::{ExecutionError, IrError};

fn constant_function(name: &str, params: &[&str], value: f64) -> Function {
    let mut func = FunctionBuilder::new(FunctionSignature::numeric(name, params.iter().copied()));
    func.ins().unwrap().ret(Value::number(value));
    func.build().unwrap()
}

#[test]
fn test_cstring_names_are_unique() {
    let mut module = Module::new("m");
    let a = module.add_cstring("str", "a");
    let b = module.add_cstring("str", "a");
    let fmt = module.add_cstring("fmt", "%s");
    let names: Vec<_> = [a, b, fmt]
        .iter()
        .map(|id| module.global(*id).unwrap().name.clone())
        .collect();
    assert_eq!(names, vec!["str.0", "str.1", "fmt.2"]);
    assert!(module.global(a).unwrap().readonly);
    assert_eq!(module.global(a).unwrap().data.to_bytes(), b"a\0".to_vec());
}

#[test]
fn test_cstring_stops_at_interior_nul() {
    let mut module = Module::new("m");
    let id = module.add_cstring("str", "a\0b");
    let global = module.global(id).unwrap();
    assert_eq!(global.data, GlobalData::CString("a".to_string()));
    assert_eq!(global.data.to_bytes(), b"a\0".to_vec());
}

#[test]
fn test_number_globals_are_zeroed() {
    let mut module = Module::new("m");
    let x = module.add_number_global("var.x");
    let global = module.global(x).unwrap();
    assert_eq!(global.data, GlobalData::Number(0.0));
    assert!(!global.readonly);
    assert_eq!(module.global_by_name("var.x").map(|g| g.id), Some(x));
}

#[test]
fn test_declare_external_is_idempotent() {
    let mut module = Module::new("m");
    module.declare_external(ExternalFunction::printf());
    module.declare_external(ExternalFunction::printf());
    assert_eq!(module.externals.len(), 1);
    assert!(module.externals["printf"].variadic);
}

#[test]
fn test_entry_function_checks() {
    let mut module = Module::new("m");
    assert!(matches!(
        module.entry_function(),
        Err(IrError::Execution(ExecutionError::MissingEntry(_)))
    ));

    module.add_function(constant_function("main", &["argc"], 0.0));
    assert!(matches!(
        module.entry_function(),
        Err(IrError::Execution(ExecutionError::EntryArity { arity: 1, .. }))
    ));

    module.add_function(constant_function("main", &[], 0.0));
    assert!(module.entry_function().is_ok());
    assert_eq!(module.functions.len(), 1);
}

#[test]
fn test_validate_rejects_bad_call_arity() {
    let mut module = Module::new("m");
    module.add_function(constant_function("one", &["a"], 1.0));

    let mut main = FunctionBuilder::new(FunctionSignature::numeric("main", Vec::<String>::new()));
    let r = main.ins().unwrap().call("one", vec![]);
    main.ins().unwrap().ret(r);
    module.add_function(main.build().unwrap());

    let err = module.validate().unwrap_err();
    assert!(err.to_string().contains("expected 1"), "{}", err);
}

#[test]
fn test_validate_rejects_string_as_variable() {
    let mut module = Module::new("m");
    let text = module.add_cstring("str", "hi");

    let mut main = FunctionBuilder::new(FunctionSignature::numeric("main", Vec::<String>::new()));
    main.ins()
        .unwrap()
        .store(Location::Global(text), Value::number(1.0));
    main.ins().unwrap().ret(Value::number(0.0));
    module.add_function(main.build().unwrap());

    assert!(matches!(module.validate(), Err(IrError::ValidationError(_))));
}

#[test]
fn test_module_serializes() {
    let mut module = Module::new("m");
    module.add_function(constant_function("main", &[], 1.0));
    let json = serde_json::to_string(&module).unwrap();
    let back: Module = serde_json::from_str(&json).unwrap();
    assert_eq!(back.functions.len(), 1);
    assert!(back.validate().is_ok());
}
