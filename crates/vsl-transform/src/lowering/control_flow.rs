use vsl_core::{
    ast::{IfStatement, WhileStatement},
    block::BlockId,
};

use super::{context::LoweringContext, errors::LoweringResult};

impl LoweringContext<'_> {
    /// ```text
    ///   cond = test > 0
    ///   brif cond, if.then, if.else | if.end
    /// if.then:  ...; jump if.end
    /// if.else:  ...; jump if.end
    /// if.end:
    /// ```
    /// `if.end` is only created when some path reaches it. When neither branch falls through,
    /// the builder is left on a terminated block and the rest of the enclosing block is skipped.
    pub fn lower_if(&mut self, stmt: &IfStatement) -> LoweringResult<()> {
        let condition = self.lower_condition(&stmt.test)?;

        let then_block = self.builder.create_labeled_block("if.then");
        let mut merge: Option<BlockId> = None;
        let else_target = match stmt.else_block {
            Some(_) => self.builder.create_labeled_block("if.else"),
            None => self.merge_block(&mut merge),
        };
        self.builder
            .ins()?
            .branch(condition, then_block, else_target);

        self.builder.switch_to_block(then_block)?;
        self.lower_block(&stmt.then_block)?;
        self.fall_through(&mut merge)?;

        if let Some(else_body) = &stmt.else_block {
            self.builder.switch_to_block(else_target)?;
            self.lower_block(else_body)?;
            self.fall_through(&mut merge)?;
        }

        if let Some(merge) = merge {
            self.builder.switch_to_block(merge)?;
        }
        Ok(())
    }

    /// ```text
    ///   jump while.header
    /// while.header:  cond = test > 0; brif cond, while.body, while.exit
    /// while.body:    ...; jump while.header
    /// while.exit:
    /// ```
    pub fn lower_while(&mut self, stmt: &WhileStatement) -> LoweringResult<()> {
        let header = self.builder.create_labeled_block("while.header");
        let body = self.builder.create_labeled_block("while.body");
        let exit = self.builder.create_labeled_block("while.exit");
        self.builder.mark_loop_header(header)?;

        self.builder.ins()?.jump(header);

        self.builder.switch_to_block(header)?;
        let condition = self.lower_condition(&stmt.test)?;
        self.builder.ins()?.branch(condition, body, exit);

        self.builder.switch_to_block(body)?;
        self.lower_block(&stmt.body)?;
        if !self.builder.is_terminated() {
            self.builder.ins()?.jump(header);
        }

        self.builder.switch_to_block(exit)?;
        Ok(())
    }

    fn merge_block(&mut self, merge: &mut Option<BlockId>) -> BlockId {
        *merge.get_or_insert_with(|| self.builder.create_labeled_block("if.end"))
    }

    fn fall_through(&mut self, merge: &mut Option<BlockId>) -> LoweringResult<()> {
        if !self.builder.is_terminated() {
            let target = self.merge_block(merge);
            self.builder.ins()?.jump(target);
        }
        Ok(())
    }
}
