//! 表情管理器

use super::{Expression, ExpressionStore};
use crate::{AvatarError, Result};

/// 表情管理器
///
/// 每个预设一个权重，权重始终在 [0, 1] 内。
#[derive(Clone, Debug)]
pub struct ExpressionManager {
    weights: [f32; Expression::COUNT],
    /// 模型实际带有的预设（未绑定的预设写入会被忽略）
    bound: [bool; Expression::COUNT],
}

impl ExpressionManager {
    /// 创建包含全部预设的管理器
    pub fn new() -> Self {
        Self {
            weights: [0.0; Expression::COUNT],
            bound: [true; Expression::COUNT],
        }
    }

    /// 只绑定模型提供的预设
    pub fn with_presets(presets: impl IntoIterator<Item = Expression>) -> Self {
        let mut bound = [false; Expression::COUNT];
        for preset in presets {
            bound[preset.index()] = true;
        }
        Self {
            weights: [0.0; Expression::COUNT],
            bound,
        }
    }

    /// 从模型声明的预设名构建，未知名称在加载时报错
    pub fn from_preset_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let presets = names
            .into_iter()
            .map(str::parse::<Expression>)
            .collect::<Result<Vec<_>>>()?;
        log::debug!("表情管理器: {} 个预设", presets.len());
        Ok(Self::with_presets(presets))
    }

    /// 预设是否绑定到模型
    pub fn is_bound(&self, expression: Expression) -> bool {
        self.bound[expression.index()]
    }

    /// 通过名称设置权重（给宿主胶水层用）
    pub fn set_by_name(&mut self, name: &str, weight: f32) -> Result<()> {
        let expression = name
            .parse::<Expression>()
            .map_err(|_| AvatarError::UnknownExpression(name.to_string()))?;
        self.set(expression, weight);
        Ok(())
    }

    /// 重置所有权重
    pub fn reset_all(&mut self) {
        self.weights = [0.0; Expression::COUNT];
    }

    pub fn iter(&self) -> impl Iterator<Item = (Expression, f32)> + '_ {
        Expression::ALL
            .iter()
            .copied()
            .filter(|e| self.is_bound(*e))
            .map(|e| (e, self.weights[e.index()]))
    }
}

impl ExpressionStore for ExpressionManager {
    fn get(&self, expression: Expression) -> f32 {
        self.weights[expression.index()]
    }

    fn set(&mut self, expression: Expression, weight: f32) {
        if !self.is_bound(expression) {
            return;
        }
        self.weights[expression.index()] = if weight.is_nan() {
            0.0
        } else {
            weight.clamp(0.0, 1.0)
        };
    }
}

impl Default for ExpressionManager {
    fn default() -> Self {
        Self::new()
    }
}
