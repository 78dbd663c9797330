use vsl_core::{
    builder::FunctionBuilder,
    codegen::{ExecutionBackend, JitBackend, ObjectBackend},
    function::FunctionSignature,
    module::{ExternalFunction, Module},
    runtime::capture_output,
    values::{Location, Value},
    CodegenConfig, Interpreter, IrError,
};

fn add_module() -> Module {
    let mut module = Module::new("add");
    let mut add = FunctionBuilder::new(FunctionSignature::numeric("add", ["a", "b"]));
    let a = add.param(0).unwrap();
    let b = add.param(1).unwrap();
    let sum = add.ins().unwrap().fadd(a, b);
    add.ins().unwrap().ret(sum);
    module.add_function(add.build().unwrap());

    let mut main = FunctionBuilder::new(FunctionSignature::numeric("main", Vec::<String>::new()));
    let r = main
        .ins()
        .unwrap()
        .call("add", vec![Value::number(3.0), Value::number(4.0)]);
    main.ins().unwrap().ret(r);
    module.add_function(main.build().unwrap());
    module
}

fn print_module() -> Module {
    let mut module = Module::new("print");
    module.declare_external(ExternalFunction::printf());
    let x = module.add_number_global("var.x");
    let label = module.add_cstring("str", "x is ");
    let newline = module.add_cstring("str", "\n");
    let fmt = module.add_cstring("fmt", "%s%.1f%s");

    let mut main = FunctionBuilder::new(FunctionSignature::numeric("main", Vec::<String>::new()));
    main.ins()
        .unwrap()
        .store(Location::Global(x), Value::number(5.0));
    let loaded = main.ins().unwrap().load(Location::Global(x));
    main.ins().unwrap().call_external(
        "printf",
        vec![
            Value::GlobalAddress(fmt),
            Value::GlobalAddress(label),
            loaded,
            Value::GlobalAddress(newline),
        ],
    );
    main.ins().unwrap().ret(loaded);
    module.add_function(main.build().unwrap());
    module
}

#[test]
fn test_jit_runs_entry() {
    let mut jit = JitBackend::default();
    assert_eq!(jit.execute(&add_module()).unwrap(), 7.0);
}

#[test]
fn test_jit_optimized_matches_interpreter() {
    let module = add_module();
    let mut jit = JitBackend::new(CodegenConfig::optimized());
    let mut interp = Interpreter::new();
    assert_eq!(
        jit.execute(&module).unwrap(),
        interp.execute(&module).unwrap()
    );
}

#[test]
fn test_jit_prints_through_runtime() {
    let module = print_module();
    let (result, out) = capture_output(|| JitBackend::default().execute(&module));
    assert_eq!(result.unwrap(), 5.0);
    assert_eq!(out, "x is 5.0\n");

    let (_, interpreted) = capture_output(|| Interpreter::new().run(&module));
    assert_eq!(interpreted, out);
}

#[test]
fn test_jit_requires_entry() {
    let mut module = add_module();
    module.functions.shift_remove("main");
    assert!(matches!(
        JitBackend::default().execute(&module),
        Err(IrError::Execution(_))
    ));
}

#[test]
fn test_object_emission() {
    let bytes = ObjectBackend::default().emit_object(&print_module()).unwrap();
    assert!(!bytes.is_empty());
    #[cfg(target_os = "linux")]
    assert_eq!(&bytes[..4], b"\x7fELF");
}

#[test]
fn test_object_emission_for_named_target() {
    let config = CodegenConfig::default().with_target("x86_64-unknown-linux-gnu");
    let bytes = ObjectBackend::new(config).emit_object(&add_module()).unwrap();
    assert_eq!(&bytes[..4], b"\x7fELF");
}
