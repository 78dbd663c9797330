use crate::builder::FunctionBuilder;
use crate::codegen::ExecutionBackend;
use crate::function::FunctionSignature;
use crate::interpreter::Interpreter;
use crate::module::{ExternalFunction, Module};
use crate::runtime::capture_output;
use crate::values::{Location, Value};
use crate::{ExecutionError, IrError};

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

#[test]
fn test_runs_entry_function() {
    let mut interp = Interpreter::new();
    assert_eq!(interp.execute(&add_module()).unwrap(), 7.0);
}

#[test]
fn test_calls_named_function() {
    let interp = Interpreter::new();
    assert_eq!(interp.call(&add_module(), "add", &[1.5, 2.0]).unwrap(), 3.5);
    assert!(interp.call(&add_module(), "add", &[1.0]).is_err());
    assert!(matches!(
        interp.call(&add_module(), "nope", &[]),
        Err(IrError::FunctionNotFound(_))
    ));
}

#[test]
fn test_division_by_zero_is_ieee() {
    let mut module = Module::new("div");
    let mut main = FunctionBuilder::new(FunctionSignature::numeric("main", Vec::<String>::new()));
    let r = main
        .ins()
        .unwrap()
        .fdiv(Value::number(1.0), Value::number(0.0));
    main.ins().unwrap().ret(r);
    module.add_function(main.build().unwrap());
    assert_eq!(Interpreter::new().run(&module).unwrap(), f64::INFINITY);
}

#[test]
fn test_loop_with_global_counter() {
    // counter := 0; WHILE 3 - counter DO counter := counter + 1 DONE; RETURN counter
    let mut module = Module::new("loop");
    let counter = module.add_number_global("var.counter");
    let mut main = FunctionBuilder::new(FunctionSignature::numeric("main", Vec::<String>::new()));
    let header = main.create_block();
    let body = main.create_block();
    let exit = main.create_block();
    main.ins().unwrap().jump(header);

    main.switch_to_block(header).unwrap();
    let c = main.ins().unwrap().load(Location::Global(counter));
    let left = main.ins().unwrap().fsub(Value::number(3.0), c);
    let cond = main.ins().unwrap().fcmp_gt(left, Value::number(0.0));
    main.ins().unwrap().branch(cond, body, exit);

    main.switch_to_block(body).unwrap();
    let c = main.ins().unwrap().load(Location::Global(counter));
    let next = main.ins().unwrap().fadd(c, Value::number(1.0));
    main.ins()
        .unwrap()
        .store(Location::Global(counter), next);
    main.ins().unwrap().jump(header);

    main.switch_to_block(exit).unwrap();
    let c = main.ins().unwrap().load(Location::Global(counter));
    main.ins().unwrap().ret(c);
    module.add_function(main.build().unwrap());

    assert_eq!(Interpreter::new().run(&module).unwrap(), 3.0);
}

#[test]
fn test_printf_goes_through_runtime_sink() {
    let mut module = Module::new("print");
    module.declare_external(ExternalFunction::printf());
    let label = module.add_cstring("str", "x = ");
    let fmt = module.add_cstring("fmt", "%s%.1f\n");
    let mut main = FunctionBuilder::new(FunctionSignature::numeric("main", Vec::<String>::new()));
    main.ins().unwrap().call_external(
        "printf",
        vec![
            Value::GlobalAddress(fmt),
            Value::GlobalAddress(label),
            Value::number(5.0),
        ],
    );
    main.ins().unwrap().ret(Value::number(0.0));
    module.add_function(main.build().unwrap());

    let (result, out) = capture_output(|| Interpreter::new().run(&module));
    assert_eq!(result.unwrap(), 0.0);
    assert_eq!(out, "x = 5.0\n");
}

#[test]
fn test_unbounded_recursion_is_reported() {
    let mut module = Module::new("rec");
    let mut main = FunctionBuilder::new(FunctionSignature::numeric("main", Vec::<String>::new()));
    let r = main.ins().unwrap().call("main", vec![]);
    main.ins().unwrap().ret(r);
    module.add_function(main.build().unwrap());

    let err = Interpreter::new()
        .with_max_call_depth(32)
        .run(&module)
        .unwrap_err();
    assert!(matches!(
        err,
        IrError::Execution(ExecutionError::StackOverflow(32))
    ));
}
