//! 表情（BlendShape）系统

mod blender;
mod manager;

pub use blender::{blend, ExpressionOverride};
pub use manager::ExpressionManager;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AvatarError;

/// VRM 表情预设
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Expression {
    // 口型
    Aa,
    Ih,
    Ou,
    Ee,
    Oh,
    // 眨眼
    Blink,
    BlinkLeft,
    BlinkRight,
    // 情绪
    Happy,
    Angry,
    Sad,
    Relaxed,
    Surprised,
    Neutral,
    // 视线
    LookUp,
    LookDown,
    LookLeft,
    LookRight,
}

impl Expression {
    pub const COUNT: usize = 18;

    pub const ALL: [Expression; Self::COUNT] = [
        Expression::Aa,
        Expression::Ih,
        Expression::Ou,
        Expression::Ee,
        Expression::Oh,
        Expression::Blink,
        Expression::BlinkLeft,
        Expression::BlinkRight,
        Expression::Happy,
        Expression::Angry,
        Expression::Sad,
        Expression::Relaxed,
        Expression::Surprised,
        Expression::Neutral,
        Expression::LookUp,
        Expression::LookDown,
        Expression::LookLeft,
        Expression::LookRight,
    ];

    /// 五个元音口型
    pub const VISEMES: [Expression; 5] = [
        Expression::Aa,
        Expression::Ih,
        Expression::Ee,
        Expression::Oh,
        Expression::Ou,
    ];

    /// 设置面板上暴露的滑条，顺序与面板一致
    pub const SLIDERS: [Expression; 10] = [
        Expression::Aa,
        Expression::Ih,
        Expression::Ee,
        Expression::Oh,
        Expression::Ou,
        Expression::BlinkLeft,
        Expression::BlinkRight,
        Expression::Angry,
        Expression::Sad,
        Expression::Happy,
    ];

    /// 预设名称（VRM 规范中的 camelCase 名）
    pub fn name(self) -> &'static str {
        match self {
            Expression::Aa => "aa",
            Expression::Ih => "ih",
            Expression::Ou => "ou",
            Expression::Ee => "ee",
            Expression::Oh => "oh",
            Expression::Blink => "blink",
            Expression::BlinkLeft => "blinkLeft",
            Expression::BlinkRight => "blinkRight",
            Expression::Happy => "happy",
            Expression::Angry => "angry",
            Expression::Sad => "sad",
            Expression::Relaxed => "relaxed",
            Expression::Surprised => "surprised",
            Expression::Neutral => "neutral",
            Expression::LookUp => "lookUp",
            Expression::LookDown => "lookDown",
            Expression::LookLeft => "lookLeft",
            Expression::LookRight => "lookRight",
        }
    }

    /// 在权重数组中的下标
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Expression {
    type Err = AvatarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Expression::ALL
            .iter()
            .copied()
            .find(|e| e.name() == s)
            .ok_or_else(|| AvatarError::UnknownExpression(s.to_string()))
    }
}

/// 表情存储接口
///
/// 权重的范围由存储自身负责约束。
pub trait ExpressionStore {
    fn get(&self, expression: Expression) -> f32;
    fn set(&mut self, expression: Expression, weight: f32);
}

/// 设置面板上的原始滑条值
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExpressionSliders {
    pub aa: f32,
    pub ih: f32,
    pub ee: f32,
    pub oh: f32,
    pub ou: f32,
    pub blink_left: f32,
    pub blink_right: f32,
    pub angry: f32,
    pub sad: f32,
    pub happy: f32,
}

impl ExpressionSliders {
    /// 按 `Expression::SLIDERS` 的顺序取值
    pub fn values(&self) -> [(Expression, f32); 10] {
        [
            (Expression::Aa, self.aa),
            (Expression::Ih, self.ih),
            (Expression::Ee, self.ee),
            (Expression::Oh, self.oh),
            (Expression::Ou, self.ou),
            (Expression::BlinkLeft, self.blink_left),
            (Expression::BlinkRight, self.blink_right),
            (Expression::Angry, self.angry),
            (Expression::Sad, self.sad),
            (Expression::Happy, self.happy),
        ]
    }

    /// 任一滑条相对 `previous` 变化超过 `epsilon`
    pub fn changed_since(&self, previous: &ExpressionSliders, epsilon: f32) -> bool {
        self.values()
            .iter()
            .zip(previous.values().iter())
            .any(|((_, curr), (_, prev))| (curr - prev).abs() > epsilon)
    }
}
