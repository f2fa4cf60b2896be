//! 动画片段与关键帧

use std::fmt;
use std::str::FromStr;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::humanoid::{HumanoidBone, SkeletonProvider};
use crate::AvatarError;

/// 可选的动画片段
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClipName {
    None,
    #[default]
    Idle,
    #[serde(rename = "Swing Dancing")]
    SwingDancing,
    #[serde(rename = "Thriller Part 2")]
    ThrillerPart2,
    #[serde(rename = "Samba Dancing")]
    SambaDancing,
    #[serde(rename = "Female Start Walking")]
    FemaleStartWalking,
    Walking,
}

impl ClipName {
    pub const ALL: [ClipName; 7] = [
        ClipName::None,
        ClipName::Idle,
        ClipName::SwingDancing,
        ClipName::ThrillerPart2,
        ClipName::SambaDancing,
        ClipName::FemaleStartWalking,
        ClipName::Walking,
    ];

    /// 设置面板上显示的名称
    pub fn label(self) -> &'static str {
        match self {
            ClipName::None => "None",
            ClipName::Idle => "Idle",
            ClipName::SwingDancing => "Swing Dancing",
            ClipName::ThrillerPart2 => "Thriller Part 2",
            ClipName::SambaDancing => "Samba Dancing",
            ClipName::FemaleStartWalking => "Female Start Walking",
            ClipName::Walking => "Walking",
        }
    }

    /// Mixamo 源动画文件名，`None` 没有源文件
    pub fn source_file(self) -> Option<&'static str> {
        match self {
            ClipName::None => None,
            ClipName::Idle => Some("Breathing Idle.fbx"),
            ClipName::SwingDancing => Some("Swing Dancing.fbx"),
            ClipName::ThrillerPart2 => Some("Thriller Part 2.fbx"),
            ClipName::SambaDancing => Some("Samba Dancing.fbx"),
            ClipName::FemaleStartWalking => Some("Female Start Walking.fbx"),
            ClipName::Walking => Some("Walking.fbx"),
        }
    }

    pub fn is_none(self) -> bool {
        self == ClipName::None
    }
}

impl fmt::Display for ClipName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ClipName {
    type Err = AvatarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClipName::ALL
            .iter()
            .copied()
            .find(|c| c.label() == s)
            .ok_or_else(|| AvatarError::UnknownClip(s.to_string()))
    }
}

/// 旋转关键帧
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotationKey {
    pub time: f32,
    pub rotation: Quat,
}

/// 平移关键帧
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranslationKey {
    pub time: f32,
    pub translation: Vec3,
}

/// 单根骨骼的动画轨道
#[derive(Clone, Debug, PartialEq)]
pub struct BoneTrack {
    pub bone: HumanoidBone,
    pub rotations: Vec<RotationKey>,
    pub translations: Vec<TranslationKey>,
}

impl BoneTrack {
    pub fn new(bone: HumanoidBone) -> Self {
        Self {
            bone,
            rotations: Vec::new(),
            translations: Vec::new(),
        }
    }

    /// 关键帧按时间排序
    pub fn sort_keyframes(&mut self) {
        self.rotations.sort_by(|a, b| a.time.total_cmp(&b.time));
        self.translations.sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    pub fn sample_rotation(&self, time: f32) -> Option<Quat> {
        let (prev, next, t) = find_span(&self.rotations, time, |k| k.time)?;
        Some(prev.rotation.slerp(next.rotation, t))
    }

    pub fn sample_translation(&self, time: f32) -> Option<Vec3> {
        let (prev, next, t) = find_span(&self.translations, time, |k| k.time)?;
        Some(prev.translation.lerp(next.translation, t))
    }

    pub fn max_time(&self) -> f32 {
        let r = self.rotations.last().map(|k| k.time).unwrap_or(0.0);
        let p = self.translations.last().map(|k| k.time).unwrap_or(0.0);
        r.max(p)
    }
}

/// 查找包含 `time` 的相邻关键帧和插值因子，区间外取端点
fn find_span<K>(keys: &[K], time: f32, key_time: impl Fn(&K) -> f32) -> Option<(&K, &K, f32)> {
    let first = keys.first()?;
    let last = keys.last()?;

    if time <= key_time(first) {
        return Some((first, first, 0.0));
    }
    if time >= key_time(last) {
        return Some((last, last, 0.0));
    }

    // 第一个时间大于 time 的关键帧
    let next_idx = keys.partition_point(|k| key_time(k) <= time);
    let prev = &keys[next_idx - 1];
    let next = &keys[next_idx];
    let span = key_time(next) - key_time(prev);
    let t = if span > 0.0 {
        (time - key_time(prev)) / span
    } else {
        0.0
    };
    Some((prev, next, t))
}

/// 已重定向到人形骨架的动画片段
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClip {
    pub name: ClipName,
    pub duration: f32,
    pub tracks: Vec<BoneTrack>,
}

impl AnimationClip {
    pub fn new(name: ClipName, duration: f32, mut tracks: Vec<BoneTrack>) -> Self {
        for track in &mut tracks {
            track.sort_keyframes();
        }
        let duration = if duration > 0.0 {
            duration
        } else {
            tracks.iter().map(BoneTrack::max_time).fold(0.0, f32::max)
        };
        Self {
            name,
            duration,
            tracks,
        }
    }

    /// 在 `time` 处采样并写入骨架，`weight` 为与当前姿态的混合权重
    pub fn apply<S: SkeletonProvider + ?Sized>(&self, time: f32, weight: f32, skeleton: &mut S) {
        let weight = weight.clamp(0.0, 1.0);
        for track in &self.tracks {
            let Some(node) = skeleton.bone_node_mut(track.bone) else {
                continue;
            };
            if let Some(rotation) = track.sample_rotation(time) {
                node.rotation = node.rotation.slerp(rotation, weight);
            }
            if let Some(translation) = track.sample_translation(time) {
                node.translation = node.translation.lerp(translation, weight);
            }
        }
    }
}
