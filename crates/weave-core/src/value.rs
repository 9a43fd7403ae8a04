//! 类型擦除的调用值：参数列表与返回值。
//!
//! # 教案式说明
//! - **意图 (Why)**：拦截器需要面对任意签名的方法；通过 `Arc<dyn Payload>` 擦除具体类型，
//!   同时保留 `Debug` 能力，日志类拦截器无需了解参数类型即可输出；
//! - **结构 (How)**：[`Value`] 是引用计数的不可变载荷，克隆仅增加计数；[`Arguments`] 是按位置
//!   排列的 `Value` 序列，Advice 的 `after` 阶段仍能看到与 `before` 相同的参数；
//! - **契约 (What)**：取值时类型不符返回 [`InterceptError::TypeMismatch`]，不会 panic。

use std::{any::Any, borrow::Cow, fmt, sync::Arc};

use crate::{
    descriptor::MethodDescriptor,
    error::{InterceptError, Result},
};

/// 可被拦截管线承载的载荷。
///
/// 对所有 `Any + Send + Sync + Debug` 类型自动实现。
pub trait Payload: Any + Send + Sync + fmt::Debug {
    /// 借用为 `&dyn Any`。
    fn as_any(&self) -> &dyn Any;

    /// 转换为可向下转型的 `Arc`。
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T> Payload for T
where
    T: Any + Send + Sync + fmt::Debug,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// 单个调用值。
#[derive(Clone)]
pub struct Value(Arc<dyn Payload>);

impl Value {
    /// 包装任意载荷。
    pub fn new<T: Payload>(value: T) -> Self {
        Value(Arc::new(value))
    }

    /// `()` 返回值。
    pub fn unit() -> Self {
        Value::new(())
    }

    /// 借用为具体类型。
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        Payload::as_any(&*self.0).downcast_ref::<T>()
    }

    /// 是否承载 `T`。
    pub fn is<T: Any>(&self) -> bool {
        Payload::as_any(&*self.0).is::<T>()
    }

    /// 取出具体类型；载荷仍被共享时退化为克隆。
    pub fn into_inner<T>(self) -> core::result::Result<T, Value>
    where
        T: Any + Send + Sync + Clone,
    {
        if !self.is::<T>() {
            return Err(self);
        }
        match Payload::into_any_arc(self.0).downcast::<T>() {
            Ok(typed) => Ok(Arc::try_unwrap(typed).unwrap_or_else(|shared| (*shared).clone())),
            // `is::<T>` 已校验类型，不会进入此分支。
            Err(_) => Err(Value::unit()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// 按位置排列的调用参数。
#[derive(Clone, Default)]
pub struct Arguments {
    values: Vec<Value>,
}

impl Arguments {
    /// 空参数列表。
    pub fn empty() -> Self {
        Self::default()
    }

    /// 由值序列构造。
    pub fn from_values(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// 追加一个参数，便于手写适配器链式构造。
    pub fn with<T: Payload>(mut self, value: T) -> Self {
        self.values.push(Value::new(value));
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 按位置借用原始值。
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// 按位置借用具体类型；越界或类型不符时返回 `TypeMismatch`。
    pub fn get<T: Any>(&self, method: &MethodDescriptor, index: usize) -> Result<&T> {
        self.values
            .get(index)
            .and_then(Value::downcast_ref::<T>)
            .ok_or_else(|| mismatch::<T>(method, index))
    }

    /// 替换某个位置的参数，供改写参数的拦截器使用。
    pub fn replace<T: Payload>(&mut self, index: usize, value: T) -> Result<()> {
        let len = self.values.len();
        let slot = self.values.get_mut(index).ok_or_else(|| {
            InterceptError::invalid_argument(format!(
                "argument index {index} out of range for {len} argument(s)"
            ))
        })?;
        *slot = Value::new(value);
        Ok(())
    }

    /// 迭代全部参数。
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// 以类型化游标依次取出参数，供生成的分发代码使用。
    pub fn reader<'a>(&'a self, method: &'a MethodDescriptor) -> ArgumentReader<'a> {
        ArgumentReader {
            arguments: self,
            method,
            position: 0,
        }
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values.iter()).finish()
    }
}

impl FromIterator<Value> for Arguments {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// 顺序读取参数的游标。
pub struct ArgumentReader<'a> {
    arguments: &'a Arguments,
    method: &'a MethodDescriptor,
    position: usize,
}

impl ArgumentReader<'_> {
    /// 取出下一个参数的克隆。
    pub fn read<T>(&mut self) -> Result<T>
    where
        T: Any + Clone,
    {
        let position = self.position;
        self.position += 1;
        self.arguments
            .get::<T>(self.method, position)
            .map(Clone::clone)
    }
}

fn mismatch<T: Any>(method: &MethodDescriptor, index: usize) -> InterceptError {
    InterceptError::TypeMismatch {
        method: Cow::Owned(method.qualified_name()),
        position: Cow::Owned(format!("argument #{index}")),
        expected: std::any::type_name::<T>(),
    }
}

/// 将返回值还原为具体类型。
pub fn return_value<T>(method: &MethodDescriptor, value: Value) -> Result<T>
where
    T: Any + Send + Sync + Clone,
{
    value
        .into_inner::<T>()
        .map_err(|_| InterceptError::TypeMismatch {
            method: Cow::Owned(method.qualified_name()),
            position: Cow::Borrowed("return value"),
            expected: std::any::type_name::<T>(),
        })
}

/// 以表达式列表构造 [`Arguments`]。
#[macro_export]
macro_rules! args {
    () => {
        $crate::Arguments::empty()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Arguments::from_values(::std::vec![$($crate::Value::new($value)),+])
    };
}
