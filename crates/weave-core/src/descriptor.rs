//! 接口与方法的静态描述符。
//!
//! # 教案式说明
//! - **意图 (Why)**：以显式的值类型替代运行期反射：声明类型、方法、参数以及它们携带的标记
//!   在接口描述构建时一次性收集，调用期只读；
//! - **结构 (How)**：[`InterfaceBuilder`] 收集 [`MethodSignature`]，`build` 校验后产出
//!   [`InterfaceDescriptor`]，其中每个 [`MethodDescriptor`] 共享同一个 [`DeclaringType`]；
//! - **契约 (What)**：
//!   - 每次 `build` 分配新的 [`InterfaceId`]；[`MethodKey`]（描述符身份 + 方法名）是调用链缓存键，
//!     只有共享同一份已构建描述符的代理才共享缓存条目，同一 Rust 类型的两份描述互不干扰；
//!   - 构建失败一律返回 `InvalidArgument`，不会留下半成品描述符；
//!   - 名称与形状同时吻合的方法自动标注为身份操作：`eq`/`ne`/`equals` 恰有一个参数，
//!     `hash`/`hash_code`/`to_string` 没有参数，`fmt` 恰有一个参数；其余同名方法照常转发。

use std::{
    any::{TypeId, type_name},
    borrow::Cow,
    collections::HashMap,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{
    error::{InterceptError, Result},
    marker::{Marker, MarkerId},
};

/// 身份敏感操作的分类，此类调用不会被转发给委托。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdentityOp {
    Equals,
    Hash,
    ToString,
}

impl IdentityOp {
    /// 依据方法名推断身份操作，不考虑参数个数。
    pub fn from_method_name(name: &str) -> Option<Self> {
        match name {
            "eq" | "ne" | "equals" => Some(IdentityOp::Equals),
            "hash" | "hash_code" => Some(IdentityOp::Hash),
            "fmt" | "to_string" => Some(IdentityOp::ToString),
            _ => None,
        }
    }

    /// 依据方法名与参数个数推断身份操作。
    ///
    /// 只有形状吻合时才视为身份操作，例如带数据参数的 `hash(data)` 是普通业务方法。
    pub fn infer(name: &str, arity: usize) -> Option<Self> {
        let op = Self::from_method_name(name)?;
        let expected = match name {
            "hash" | "hash_code" | "to_string" => 0,
            _ => 1,
        };
        (arity == expected).then_some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityOp::Equals => "equals",
            IdentityOp::Hash => "hash_code",
            IdentityOp::ToString => "to_string",
        }
    }
}

static NEXT_INTERFACE_ID: AtomicU64 = AtomicU64::new(1);

/// 已构建接口描述符的进程内唯一身份。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InterfaceId(u64);

impl InterfaceId {
    fn next() -> Self {
        Self(NEXT_INTERFACE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// 调用链缓存键：描述符身份 + 方法名。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodKey {
    interface: InterfaceId,
    method: Cow<'static, str>,
}

impl MethodKey {
    pub fn interface(&self) -> InterfaceId {
        self.interface
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

/// 声明类型：接口名、身份与类型级标记。
#[derive(Clone, Debug)]
pub struct DeclaringType {
    type_id: TypeId,
    name: Cow<'static, str>,
    markers: Vec<MarkerId>,
}

impl DeclaringType {
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn markers(&self) -> &[MarkerId] {
        &self.markers
    }
}

/// 参数描述：名称、类型名与参数级标记（按声明顺序）。
#[derive(Clone, Debug)]
pub struct ParameterDescriptor {
    name: Cow<'static, str>,
    type_name: &'static str,
    markers: Vec<MarkerId>,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<Cow<'static, str>>, type_name: &'static str) -> Self {
        Self {
            name: name.into(),
            type_name,
            markers: Vec::new(),
        }
    }

    /// 以 Rust 类型推导类型名。
    pub fn of<T: ?Sized>(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, type_name::<T>())
    }

    /// 附加类型标记。
    pub fn marked<M: Marker>(self) -> Self {
        self.with_marker(M::id())
    }

    /// 附加任意标记身份。
    pub fn with_marker(mut self, marker: MarkerId) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn markers(&self) -> &[MarkerId] {
        &self.markers
    }
}

/// 方法签名构建器，挂入 [`InterfaceBuilder`] 后才成为 [`MethodDescriptor`]。
#[derive(Clone, Debug)]
pub struct MethodSignature {
    name: Cow<'static, str>,
    markers: Vec<MarkerId>,
    parameters: Vec<ParameterDescriptor>,
    return_type: &'static str,
    identity: Option<IdentityOp>,
}

impl MethodSignature {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            markers: Vec::new(),
            parameters: Vec::new(),
            return_type: type_name::<()>(),
            identity: None,
        }
    }

    pub fn marked<M: Marker>(self) -> Self {
        self.with_marker(M::id())
    }

    pub fn with_marker(mut self, marker: MarkerId) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn param(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn returns<T: ?Sized>(mut self) -> Self {
        self.return_type = type_name::<T>();
        self
    }

    /// 显式标注身份操作，覆盖按名称与形状推断的结果。
    pub fn identity(mut self, op: IdentityOp) -> Self {
        self.identity = Some(op);
        self
    }
}

/// 已解析的方法描述符。
///
/// # 契约说明（What）
/// - 同时充当缓存键来源（[`MethodDescriptor::key`]）与标记来源（声明类型、方法、参数）；
/// - 构建后不可变，可在线程间共享。
#[derive(Clone, Debug)]
pub struct MethodDescriptor {
    declaring: Arc<DeclaringType>,
    key: MethodKey,
    markers: Vec<MarkerId>,
    parameters: Vec<ParameterDescriptor>,
    return_type: &'static str,
    identity: Option<IdentityOp>,
}

impl MethodDescriptor {
    pub fn declaring_type(&self) -> &DeclaringType {
        &self.declaring
    }

    pub fn name(&self) -> &str {
        &self.key.method
    }

    pub fn key(&self) -> &MethodKey {
        &self.key
    }

    pub fn markers(&self) -> &[MarkerId] {
        &self.markers
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    pub fn return_type(&self) -> &'static str {
        self.return_type
    }

    pub fn identity(&self) -> Option<IdentityOp> {
        self.identity
    }

    /// `Interface::method` 形式的全名。
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.declaring.name, self.key.method)
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}(", self.declaring.name, self.key.method)?;
        for (index, parameter) in self.parameters.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", parameter.name, parameter.type_name)?;
        }
        write!(f, ") -> {}", self.return_type)
    }
}

/// 接口描述：声明类型与其全部方法。
#[derive(Clone, Debug)]
pub struct InterfaceDescriptor {
    id: InterfaceId,
    declaring: Arc<DeclaringType>,
    methods: Vec<Arc<MethodDescriptor>>,
    index: HashMap<Cow<'static, str>, usize>,
}

impl InterfaceDescriptor {
    /// 为接口类型 `I`（通常为 `dyn Trait`）开始构建描述。
    pub fn builder<I: ?Sized + 'static>(name: impl Into<Cow<'static, str>>) -> InterfaceBuilder {
        InterfaceBuilder {
            type_id: TypeId::of::<I>(),
            name: name.into(),
            markers: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.declaring.name
    }

    /// 构建时分配的身份，克隆后保持不变。
    pub fn id(&self) -> InterfaceId {
        self.id
    }

    pub fn type_id(&self) -> TypeId {
        self.declaring.type_id
    }

    pub fn declaring_type(&self) -> &DeclaringType {
        &self.declaring
    }

    /// 按名称查找方法。
    pub fn method(&self, name: &str) -> Option<&Arc<MethodDescriptor>> {
        self.index.get(name).map(|&position| &self.methods[position])
    }

    pub fn methods(&self) -> impl Iterator<Item = &Arc<MethodDescriptor>> {
        self.methods.iter()
    }
}

/// [`InterfaceDescriptor`] 构建器。
#[derive(Debug)]
pub struct InterfaceBuilder {
    type_id: TypeId,
    name: Cow<'static, str>,
    markers: Vec<MarkerId>,
    methods: Vec<MethodSignature>,
}

impl InterfaceBuilder {
    pub fn marked<M: Marker>(self) -> Self {
        self.with_marker(M::id())
    }

    pub fn with_marker(mut self, marker: MarkerId) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn method(mut self, signature: MethodSignature) -> Self {
        self.methods.push(signature);
        self
    }

    /// 校验并产出描述符。
    ///
    /// # 契约（What）
    /// - 接口名、方法名不得为空，方法名在接口内唯一；
    /// - 任何位置的命名标记不得为空名；
    /// - 任一校验失败返回 `InvalidArgument`。
    pub fn build(self) -> Result<InterfaceDescriptor> {
        if self.name.trim().is_empty() {
            return Err(InterceptError::invalid_argument("interface name is empty"));
        }
        check_markers(&self.name, &self.markers)?;

        let id = InterfaceId::next();
        let declaring = Arc::new(DeclaringType {
            type_id: self.type_id,
            name: self.name,
            markers: self.markers,
        });

        let mut methods = Vec::with_capacity(self.methods.len());
        let mut index = HashMap::with_capacity(self.methods.len());
        for signature in self.methods {
            if signature.name.trim().is_empty() {
                return Err(InterceptError::invalid_argument(format!(
                    "interface `{}` declares a method with an empty name",
                    declaring.name
                )));
            }
            if index.contains_key(&signature.name) {
                return Err(InterceptError::invalid_argument(format!(
                    "interface `{}` declares method `{}` more than once",
                    declaring.name, signature.name
                )));
            }
            check_markers(&signature.name, &signature.markers)?;
            for parameter in &signature.parameters {
                check_markers(&parameter.name, &parameter.markers)?;
            }

            let identity = signature
                .identity
                .or_else(|| IdentityOp::infer(&signature.name, signature.parameters.len()));
            index.insert(signature.name.clone(), methods.len());
            methods.push(Arc::new(MethodDescriptor {
                declaring: Arc::clone(&declaring),
                key: MethodKey {
                    interface: id,
                    method: signature.name,
                },
                markers: signature.markers,
                parameters: signature.parameters,
                return_type: signature.return_type,
                identity,
            }));
        }

        Ok(InterfaceDescriptor {
            id,
            declaring,
            methods,
            index,
        })
    }
}

fn check_markers(owner: &str, markers: &[MarkerId]) -> Result<()> {
    match markers.iter().find(|marker| !marker.is_valid()) {
        Some(_) => Err(InterceptError::invalid_argument(format!(
            "`{owner}` carries a marker with an empty name"
        ))),
        None => Ok(()),
    }
}
