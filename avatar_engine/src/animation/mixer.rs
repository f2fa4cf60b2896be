//! 动画混合器 - 管理已注册片段的播放状态
//!
//! 每个片段一个 `ClipAction`，拥有独立的时间轴和播放状态，播放中的片段循环。

use std::collections::HashMap;
use std::sync::Arc;

use crate::humanoid::SkeletonProvider;

use super::{AnimationClip, ClipName};

/// 片段播放接口
pub trait ClipRegistry {
    fn play(&mut self, name: ClipName) -> bool;
    fn stop(&mut self, name: ClipName);
    fn time(&self, name: ClipName) -> Option<f32>;
    fn set_time(&mut self, name: ClipName, time: f32);
    fn is_playing(&self, name: ClipName) -> bool;
}

/// 片段播放状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipActionState {
    Stopped,
    Playing,
}

/// 单个片段的播放实例
pub struct ClipAction {
    clip: Arc<AnimationClip>,
    /// 当前播放时间（秒）
    time: f32,
    state: ClipActionState,
}

impl ClipAction {
    pub fn new(clip: Arc<AnimationClip>) -> Self {
        Self {
            clip,
            time: 0.0,
            state: ClipActionState::Stopped,
        }
    }

    pub fn play(&mut self) {
        self.state = ClipActionState::Playing;
    }

    /// 停止并回到开头
    pub fn stop(&mut self) {
        self.state = ClipActionState::Stopped;
        self.time = 0.0;
    }

    /// 跳转到指定时间
    pub fn seek_to(&mut self, time: f32) {
        let duration = self.clip.duration;
        self.time = if duration > 0.0 {
            time.clamp(0.0, duration)
        } else {
            0.0
        };
    }

    /// 推进时间轴（循环播放），返回是否处于播放中
    pub fn update(&mut self, delta_time: f32) -> bool {
        if self.state != ClipActionState::Playing {
            return false;
        }

        let duration = self.clip.duration;
        if duration <= 0.0 {
            return true;
        }

        self.time += delta_time;
        if self.time > duration {
            self.time %= duration;
        }
        true
    }

    pub fn evaluate<S: SkeletonProvider + ?Sized>(&self, skeleton: &mut S) {
        self.clip.apply(self.time, 1.0, skeleton);
    }

    pub fn state(&self) -> ClipActionState {
        self.state
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }
}

/// 动画混合器
#[derive(Default)]
pub struct AnimationMixer {
    actions: HashMap<ClipName, ClipAction>,
}

impl AnimationMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册片段（同名片段会被替换）
    pub fn register(&mut self, clip: AnimationClip) {
        let name = clip.name;
        if name.is_none() {
            log::warn!("片段名为 None，不能注册，已忽略");
            return;
        }
        log::debug!("注册动画片段: {} ({:.2}s)", name, clip.duration);
        self.actions.insert(name, ClipAction::new(Arc::new(clip)));
    }

    pub fn action(&self, name: ClipName) -> Option<&ClipAction> {
        self.actions.get(&name)
    }

    pub fn clip_count(&self) -> usize {
        self.actions.len()
    }

    /// 当前播放中的片段
    pub fn playing(&self) -> impl Iterator<Item = ClipName> + '_ {
        self.actions
            .iter()
            .filter(|(_, a)| a.state() == ClipActionState::Playing)
            .map(|(name, _)| *name)
    }

    /// 推进所有片段并把姿态写入骨架
    pub fn advance<S: SkeletonProvider + ?Sized>(&mut self, delta_time: f32, skeleton: &mut S) {
        for action in self.actions.values_mut() {
            if action.update(delta_time) {
                action.evaluate(skeleton);
            }
        }
    }
}

impl ClipRegistry for AnimationMixer {
    fn play(&mut self, name: ClipName) -> bool {
        match self.actions.get_mut(&name) {
            Some(action) => {
                action.play();
                true
            }
            None => false,
        }
    }

    fn stop(&mut self, name: ClipName) {
        if let Some(action) = self.actions.get_mut(&name) {
            action.stop();
        }
    }

    fn time(&self, name: ClipName) -> Option<f32> {
        self.actions.get(&name).map(ClipAction::time)
    }

    fn set_time(&mut self, name: ClipName, time: f32) {
        if let Some(action) = self.actions.get_mut(&name) {
            action.seek_to(time);
        }
    }

    fn is_playing(&self, name: ClipName) -> bool {
        self.actions
            .get(&name)
            .is_some_and(|a| a.state() == ClipActionState::Playing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{BoneTrack, RotationKey};
    use crate::humanoid::{Humanoid, HumanoidBone};
    use approx::assert_abs_diff_eq;
    use glam::Quat;

    fn sway_clip(name: ClipName, duration: f32) -> AnimationClip {
        let mut track = BoneTrack::new(HumanoidBone::Spine);
        track.rotations = vec![
            RotationKey { time: 0.0, rotation: Quat::IDENTITY },
            RotationKey { time: duration, rotation: Quat::from_rotation_z(0.5) },
        ];
        AnimationClip::new(name, duration, vec![track])
    }

    #[test]
    fn test_play_advance_and_loop() {
        let mut mixer = AnimationMixer::new();
        mixer.register(sway_clip(ClipName::Idle, 2.0));
        assert!(mixer.play(ClipName::Idle));
        let mut humanoid = Humanoid::t_pose();
        mixer.advance(1.5, &mut humanoid);
        assert_abs_diff_eq!(mixer.time(ClipName::Idle).unwrap(), 1.5);
        mixer.advance(1.0, &mut humanoid);
        assert_abs_diff_eq!(mixer.time(ClipName::Idle).unwrap(), 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_stop_rewinds() {
        let mut mixer = AnimationMixer::new();
        mixer.register(sway_clip(ClipName::Walking, 1.0));
        mixer.play(ClipName::Walking);
        mixer.advance(0.4, &mut Humanoid::t_pose());
        mixer.stop(ClipName::Walking);
        assert!(!mixer.is_playing(ClipName::Walking));
        assert_eq!(mixer.time(ClipName::Walking), Some(0.0));
    }

    #[test]
    fn test_stopped_clip_leaves_pose() {
        let mut mixer = AnimationMixer::new();
        mixer.register(sway_clip(ClipName::Idle, 1.0));
        let mut humanoid = Humanoid::t_pose();
        mixer.advance(0.5, &mut humanoid);
        assert_eq!(
            humanoid.bone_node(HumanoidBone::Spine).unwrap().rotation,
            Quat::IDENTITY
        );
    }

    #[test]
    fn test_unknown_clip() {
        let mut mixer = AnimationMixer::new();
        assert!(!mixer.play(ClipName::SambaDancing));
        assert_eq!(mixer.time(ClipName::SambaDancing), None);
        mixer.register(sway_clip(ClipName::None, 1.0));
        assert_eq!(mixer.clip_count(), 0);
    }

    #[test]
    fn test_set_time_clamps_to_duration() {
        let mut mixer = AnimationMixer::new();
        mixer.register(sway_clip(ClipName::Idle, 2.0));
        mixer.set_time(ClipName::Idle, 7.0);
        assert_eq!(mixer.time(ClipName::Idle), Some(2.0));
    }
}
