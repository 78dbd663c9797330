use vsl_core::{
    ast::{Block, PrintItem, PrintStatement, Statement, VariableDeclaration},
    config::{NUMBER_FORMAT, PRINTF_NAME, TEXT_FORMAT},
    module::ExternalFunction,
    values::Value,
};

use super::{context::LoweringContext, errors::LoweringResult};

impl LoweringContext<'_> {
    /// Declarations, then statements. Stops at the first statement that terminates the current
    /// block; whatever follows is unreachable and is not lowered.
    pub fn lower_block(&mut self, block: &Block) -> LoweringResult<()> {
        for declaration in &block.declarations {
            self.lower_declaration(declaration)?;
        }
        for statement in &block.statements {
            if self.builder.is_terminated() {
                break;
            }
            self.lower_statement(statement)?;
        }
        Ok(())
    }

    pub fn lower_declaration(&mut self, declaration: &VariableDeclaration) -> LoweringResult<()> {
        for name in &declaration.names {
            self.declare_variable(name)?;
        }
        Ok(())
    }

    pub fn lower_statement(&mut self, statement: &Statement) -> LoweringResult<()> {
        match statement {
            Statement::Assign(assign) => {
                let location = self.scopes.resolve(assign.target.as_str())?;
                let value = self.lower_expression(&assign.value)?;
                self.builder.ins()?.store(location, value);
                Ok(())
            }
            Statement::Return(expr) => {
                let value = self.lower_expression(expr)?;
                self.builder.ins()?.ret(value);
                Ok(())
            }
            Statement::Print(print) => self.lower_print(print),
            Statement::If(stmt) => self.lower_if(stmt),
            Statement::While(stmt) => self.lower_while(stmt),
        }
    }

    /// One `printf` call per statement: `%s` for each text, the number format for each
    /// expression. Texts and the format string become read-only module globals.
    fn lower_print(&mut self, print: &PrintStatement) -> LoweringResult<()> {
        let mut format = String::new();
        let mut args = Vec::with_capacity(print.items().len() + 1);

        for item in print.items() {
            match item {
                PrintItem::Text(text) => {
                    format.push_str(TEXT_FORMAT);
                    let id = self.module.add_cstring("str", text.unescaped());
                    args.push(Value::GlobalAddress(id));
                }
                PrintItem::Expression(expr) => {
                    format.push_str(NUMBER_FORMAT);
                    args.push(self.lower_expression(expr)?);
                }
            }
        }

        let format = self.module.add_cstring("fmt", format);
        args.insert(0, Value::GlobalAddress(format));
        self.module.declare_external(ExternalFunction::printf());
        self.builder.ins()?.call_external(PRINTF_NAME, args);
        Ok(())
    }
}
