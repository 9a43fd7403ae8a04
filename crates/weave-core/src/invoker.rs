//! Invoker：在目标上以给定参数调用方法，返回结果或原样传播失败。
//!
//! # 教案式说明
//! - **意图 (Why)**：以显式多态替代反射调用。每个接口的适配器为委托实现 [`Target`]，
//!   将方法描述符与类型擦除参数翻译回真实的方法调用；
//! - **契约 (What)**：
//!   - [`invoke`] 是整条调用链最内层唯一的出口，除日志外不做任何加工；
//!   - 委托返回的失败必须原样返回，不包装、不转换。

use crate::{
    descriptor::MethodDescriptor,
    error::InterceptError,
    value::{Arguments, Value},
};

/// 单次调用的结果。
pub type CallResult = Result<Value, InterceptError>;

/// 被代理对象的动态调用面。
pub trait Target: Send + Sync {
    /// 委托的类型名，供日志与诊断使用。
    fn type_name(&self) -> &'static str;

    /// 以方法描述符与参数调用真实方法。
    fn invoke(&self, method: &MethodDescriptor, args: Arguments) -> CallResult;
}

/// 链路底座：直接调用目标。
pub fn invoke(target: &dyn Target, method: &MethodDescriptor, args: Arguments) -> CallResult {
    tracing::trace!(
        target: "weave::invoker",
        method = %method.qualified_name(),
        delegate = target.type_name(),
        arity = args.len(),
        "invoking delegate"
    );
    target.invoke(method, args)
}
