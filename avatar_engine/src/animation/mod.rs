//! 动画系统
//!
//! 提供 Mixamo 动画重定向、片段播放、动画状态协调和说话脚本时间轴。

mod clip;
mod coordinator;
mod mixer;
mod retarget;
mod script;

pub use clip::{AnimationClip, BoneTrack, ClipName, RotationKey, TranslationKey};
pub use coordinator::{AnimationStateCoordinator, TimeWindow};
pub use mixer::{AnimationMixer, ClipAction, ClipActionState, ClipRegistry};
pub use retarget::{mixamo_to_humanoid, retarget, RestPose, SourceClip, SourceTrack, VrmVersion};
pub use script::{ScriptEntry, ScriptPlayer, TalkingMode, TalkingScript};
