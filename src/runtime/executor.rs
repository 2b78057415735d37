use tracing::{debug, error};

use crate::error::Result;
use crate::flow::CompiledPlan;
use crate::state::ExecutionContext;

/// 按编译顺序依次执行节点
///
/// 节点返回 `Err` 时立即停止；降级输出照常写入上下文并继续。
pub(crate) async fn execute_plan(plan: &CompiledPlan, ctx: &ExecutionContext) -> Result<()> {
    for step in plan.steps() {
        debug!(node = %step.spec.id, kind = step.processor.kind(), "executing node");
        let output = step.processor.process(ctx.to_input()).await.map_err(|e| {
            error!(node = %step.spec.id, error = %e, "node failed");
            e
        })?;
        ctx.apply(&step.spec.id, output);
    }
    Ok(())
}
