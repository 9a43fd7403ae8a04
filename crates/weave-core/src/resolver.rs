//! Call-Site Resolver：计算某个调用点适用的拦截器列表。
//!
//! # 教案式说明
//! - **意图 (Why)**：在不引入优先级数字的前提下给出确定、可解释的顺序：类型级行为最靠外，
//!   其次是方法级，参数级最后；
//! - **流程 (How)**：
//!   1. 依固定顺序收集标记：声明类型 → 方法 → 各参数（自左向右，参数内按声明顺序）；
//!   2. 按身份去重，保留首次出现的位置；
//!   3. 依标记顺序向注册表查询并拼接列表，各列表内部保持注册顺序；
//! - **契约 (What)**：无任何标记的方法得到空列表，组合后的调用链退化为直接调用 Invoker。

use std::sync::Arc;

use crate::{
    descriptor::MethodDescriptor, interceptor::Interceptor, marker::MarkerId,
    registry::MarkerRegistry,
};

/// 收集调用点上的标记，按身份去重并保持首次出现顺序。
pub fn collect_markers(method: &MethodDescriptor) -> Vec<MarkerId> {
    let scopes = method
        .declaring_type()
        .markers()
        .iter()
        .chain(method.markers())
        .chain(
            method
                .parameters()
                .iter()
                .flat_map(|parameter| parameter.markers()),
        );

    let mut markers: Vec<MarkerId> = Vec::new();
    for marker in scopes {
        // 标记数量通常个位数，线性查重即可。
        if !markers.contains(marker) {
            markers.push(marker.clone());
        }
    }
    markers
}

/// 解析调用点适用的有序拦截器列表。
pub fn resolve_interceptors(
    registry: &MarkerRegistry,
    method: &MethodDescriptor,
) -> Vec<Arc<dyn Interceptor>> {
    collect_markers(method)
        .iter()
        .flat_map(|marker| registry.lookup(marker))
        .collect()
}
