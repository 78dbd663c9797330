use cranelift_codegen::ir::{types, AbiParam, Signature, UserFuncName};
use cranelift_module::{DataDescription, DataId, FuncId, Linkage, Module as ClifModule};
use std::collections::HashMap;
use tracing::{debug, trace};

use super::{context::CodegenContext, cranelift_error, lowering::lower_function};
use crate::{
    config::{PRINTF_NAME, RUNTIME_PRINTF_NAME},
    function::Function,
    instructions::Instruction,
    module::Module,
    values::{GlobalId, Location, Value},
    Result,
};

/// Cranelift ids of everything declared for one IR module.
#[derive(Debug, Default)]
pub struct Declarations {
    pub functions: HashMap<String, FuncId>,
    pub globals: HashMap<GlobalId, DataId>,
    pub runtime_printf: Option<FuncId>,
}

/// Declares and defines every global and function of `module` in `target`.
/// The caller finalizes (JIT) or finishes (object) the target afterwards.
pub fn define_module<M: ClifModule>(target: &mut M, module: &Module) -> Result<Declarations> {
    module.validate()?;
    let mut decls = Declarations::default();

    for global in &module.globals {
        let data_id = target
            .declare_data(&global.name, Linkage::Local, !global.readonly, false)
            .map_err(|e| cranelift_error("Failed to declare data", e))?;
        let mut description = DataDescription::new();
        description.define(global.data.to_bytes().into_boxed_slice());
        description.set_align(8);
        target
            .define_data(data_id, &description)
            .map_err(|e| cranelift_error("Failed to define data", e))?;
        decls.globals.insert(global.id, data_id);
    }

    if module.externals.contains_key(PRINTF_NAME) {
        let pointer = target.target_config().pointer_type();
        let mut sig = target.make_signature();
        sig.params.push(AbiParam::new(pointer));
        sig.params.push(AbiParam::new(pointer));
        sig.params.push(AbiParam::new(pointer));
        sig.returns.push(AbiParam::new(types::I32));
        let id = target
            .declare_function(RUNTIME_PRINTF_NAME, Linkage::Import, &sig)
            .map_err(|e| cranelift_error("Failed to declare runtime", e))?;
        decls.runtime_printf = Some(id);
    }

    for (name, function) in &module.functions {
        let sig = numeric_signature(target, function);
        let func_id = target
            .declare_function(name, Linkage::Export, &sig)
            .map_err(|e| cranelift_error("Failed to declare function", e))?;
        decls.functions.insert(name.clone(), func_id);
    }

    let mut codegen = CodegenContext::new(target.make_context());
    for (name, function) in &module.functions {
        let func_id = *decls
            .functions
            .get(name)
            .ok_or_else(|| crate::IrError::FunctionNotFound(name.clone()))?;
        let ctx = &mut codegen.ctx;
        ctx.func.signature = numeric_signature(target, function);
        ctx.func.name = UserFuncName::user(0, func_id.as_u32());

        let refs = declare_references(target, &mut ctx.func, function, &decls)?;
        lower_function(
            function,
            &mut ctx.func,
            &mut codegen.builder_context,
            &refs,
            target.target_config().pointer_type(),
        )?;
        trace!("cranelift IR for '{}':\n{}", name, codegen.ctx.func.display());

        target
            .define_function(func_id, &mut codegen.ctx)
            .map_err(|e| cranelift_error(&format!("Failed to define function '{}'", name), e))?;
        target.clear_context(&mut codegen.ctx);
        debug!(function = %name, "compiled");
    }

    Ok(decls)
}

fn numeric_signature<M: ClifModule>(target: &M, function: &Function) -> Signature {
    let mut sig = target.make_signature();
    for param in &function.signature.params {
        sig.params.push(AbiParam::new(
            param.param_type.to_cranelift(target.target_config().pointer_type()),
        ));
    }
    sig.returns.push(AbiParam::new(
        function
            .signature
            .returns
            .to_cranelift(target.target_config().pointer_type()),
    ));
    sig
}

/// Function and data references a single function body needs, imported into it up front.
pub struct FunctionRefs {
    pub functions: HashMap<String, cranelift_codegen::ir::FuncRef>,
    pub globals: HashMap<GlobalId, cranelift_codegen::ir::GlobalValue>,
    pub runtime_printf: Option<cranelift_codegen::ir::FuncRef>,
}

fn declare_references<M: ClifModule>(
    target: &mut M,
    func: &mut cranelift_codegen::ir::Function,
    function: &Function,
    decls: &Declarations,
) -> Result<FunctionRefs> {
    let mut refs = FunctionRefs {
        functions: HashMap::new(),
        globals: HashMap::new(),
        runtime_printf: None,
    };

    let mut import_global = |id: GlobalId,
                             refs: &mut FunctionRefs,
                             func: &mut cranelift_codegen::ir::Function|
     -> Result<()> {
        if refs.globals.contains_key(&id) {
            return Ok(());
        }
        let data_id = decls.globals.get(&id).ok_or_else(|| {
            crate::IrError::CraneliftError(format!("Global {} was not declared", id))
        })?;
        let gv = target.declare_data_in_func(*data_id, func);
        refs.globals.insert(id, gv);
        Ok(())
    };

    for inst in function.body.blocks.values().flat_map(|b| &b.instructions) {
        if let Some(Location::Global(id)) = inst.location() {
            import_global(id, &mut refs, func)?;
        }
        for operand in inst.operands() {
            if let Value::GlobalAddress(id) = operand {
                import_global(*id, &mut refs, func)?;
            }
        }
    }

    for inst in function.body.blocks.values().flat_map(|b| &b.instructions) {
        match inst {
            Instruction::Call { callee, .. } if !refs.functions.contains_key(callee) => {
                let func_id = decls.functions.get(callee).ok_or_else(|| {
                    crate::IrError::FunctionNotFound(callee.clone())
                })?;
                let func_ref = target.declare_func_in_func(*func_id, func);
                refs.functions.insert(callee.clone(), func_ref);
            }
            Instruction::CallExternal { .. } if refs.runtime_printf.is_none() => {
                if let Some(id) = decls.runtime_printf {
                    refs.runtime_printf = Some(target.declare_func_in_func(id, func));
                }
            }
            _ => {}
        }
    }

    Ok(refs)
}
