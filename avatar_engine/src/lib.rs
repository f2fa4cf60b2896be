//! Avatar Engine - VRM 虚拟形象的逐帧驱动运行时
//!
//! 提供：
//! - 表情（BlendShape）平滑混合
//! - 人形骨骼旋转驱动（面捕/动捕数据）
//! - Mixamo 动画重定向与播放
//! - 动画状态协调与说话脚本时间轴
//! - 基于 Rapier3D 的角色移动控制

pub mod animation;
pub mod avatar;
pub mod config;
pub mod expression;
pub mod humanoid;
pub mod locomotion;
pub mod tracking;

pub use animation::{
    AnimationClip, AnimationMixer, AnimationStateCoordinator, ClipName, ClipRegistry,
    ScriptPlayer, SourceClip, TalkingMode, TalkingScript,
};
pub use avatar::{Avatar, AvatarDriver, FrameInputs, FrameReport};
pub use config::DriverConfig;
pub use expression::{Expression, ExpressionManager, ExpressionSliders, ExpressionStore};
pub use humanoid::{AxisFlip, BoneNode, Humanoid, HumanoidBone, SkeletonProvider};
pub use locomotion::{CharacterController, MovementInput, PhysicsWorld};
pub use tracking::{DriveMode, DrivingSignal, LiveRig};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AvatarError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown humanoid bone: {0}")]
    UnknownBone(String),

    #[error("Required humanoid bone missing: {0}")]
    MissingHumanoidBone(HumanoidBone),

    #[error("Unknown expression: {0}")]
    UnknownExpression(String),

    #[error("Unknown animation clip: {0}")]
    UnknownClip(String),

    #[error("Invalid clip: {0}")]
    InvalidClip(String),

    #[error("Invalid talking script: {0}")]
    InvalidScript(String),
}

pub type Result<T> = std::result::Result<T, AvatarError>;
