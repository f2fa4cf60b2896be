//! 表情平滑混合

use super::{Expression, ExpressionStore};

/// 本帧强制覆盖某个表情的目标值（来自说话脚本）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExpressionOverride {
    pub expression: Expression,
    pub value: f32,
}

/// 将 `expression` 的当前权重向目标值线性逼近
///
/// - `overriding` 指向同一个表情时，用覆盖值代替 `target`
/// - `rate` 一般为 Δt × 响应系数，截断到 [0, 1]，保证不会越过目标
/// - 变化量不超过 `epsilon` 时不写回
///
/// 返回存储中的值是否真的改变（未绑定的预设写入会被丢弃）。
pub fn blend<S: ExpressionStore + ?Sized>(
    store: &mut S,
    expression: Expression,
    target: f32,
    overriding: Option<ExpressionOverride>,
    rate: f32,
    epsilon: f32,
) -> bool {
    let target = match overriding {
        Some(o) if o.expression == expression => o.value,
        _ => target,
    };

    let rate = if rate.is_finite() { rate.clamp(0.0, 1.0) } else { 0.0 };
    let current = store.get(expression);
    let next = current + (target - current) * rate;

    if (next - current).abs() > epsilon {
        store.set(expression, next);
        store.get(expression) != current
    } else {
        false
    }
}
