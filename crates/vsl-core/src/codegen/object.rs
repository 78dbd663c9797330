use cranelift_module::default_libcall_names;
use cranelift_object::{ObjectBuilder, ObjectModule};
use tracing::debug;

use super::{context::build_isa, cranelift_error, define_module};
use crate::{config::CodegenConfig, module::Module, Result};

/// Serializes a module into a relocatable object file. `vsl_printf` stays an undefined import.
#[derive(Debug, Clone, Default)]
pub struct ObjectBackend {
    config: CodegenConfig,
}

impl ObjectBackend {
    pub fn new(config: CodegenConfig) -> Self {
        Self { config }
    }

    pub fn emit_object(&self, module: &Module) -> Result<Vec<u8>> {
        let isa = build_isa(&self.config, true)?;
        let object_builder = ObjectBuilder::new(isa, module.name.as_bytes().to_vec(), default_libcall_names())
            .map_err(|e| cranelift_error("Failed to create object builder", e))?;
        let mut object = ObjectModule::new(object_builder);

        let decls = define_module(&mut object, module)?;

        let product = object.finish();
        let bytes = product
            .emit()
            .map_err(|e| cranelift_error("Failed to emit object", e))?;
        debug!(
            module = %module.name,
            functions = decls.functions.len(),
            bytes = bytes.len(),
            "object emitted"
        );
        Ok(bytes)
    }
}
