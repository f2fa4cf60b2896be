//! Mixamo 动画重定向到 VRM 人形骨架
//!
//! 每个旋转关键帧按 `parent_rest_world * q * rest_world⁻¹` 变换到归一化骨骼空间；
//! VRM 0.x 模型朝向相反，需要再翻转 x/z 分量。胯部平移按两套骨架的胯部高度比例缩放。

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::humanoid::{Humanoid, HumanoidBone};
use crate::{AvatarError, Result};

use super::{AnimationClip, BoneTrack, ClipName, RotationKey, TranslationKey};

/// VRM 规范版本
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VrmVersion {
    #[serde(rename = "0")]
    V0,
    #[default]
    #[serde(rename = "1")]
    V1,
}

/// 源骨骼的初始姿态
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestPose {
    pub world_rotation: Quat,
    pub parent_world_rotation: Quat,
}

impl Default for RestPose {
    fn default() -> Self {
        Self {
            world_rotation: Quat::IDENTITY,
            parent_world_rotation: Quat::IDENTITY,
        }
    }
}

/// Mixamo 骨骼名下的一条轨道
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceTrack {
    pub bone: String,
    #[serde(default)]
    pub rotations: Vec<RotationKey>,
    #[serde(default)]
    pub translations: Vec<TranslationKey>,
}

/// 从 FBX 导出的 Mixamo 动画
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceClip {
    pub duration: f32,
    /// `mixamorigHips` 的初始高度
    pub hips_height: f32,
    pub tracks: Vec<SourceTrack>,
    #[serde(default)]
    pub rest: HashMap<String, RestPose>,
}

impl SourceClip {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Mixamo 骨骼名到人形骨骼
pub fn mixamo_to_humanoid(name: &str) -> Option<HumanoidBone> {
    use HumanoidBone::*;
    let bone = match name.strip_prefix("mixamorig")? {
        "Hips" => Hips,
        "Spine" => Spine,
        "Spine1" => Chest,
        "Spine2" => UpperChest,
        "Neck" => Neck,
        "Head" => Head,
        "LeftShoulder" => LeftShoulder,
        "LeftArm" => LeftUpperArm,
        "LeftForeArm" => LeftLowerArm,
        "LeftHand" => LeftHand,
        "LeftHandThumb1" => LeftThumbMetacarpal,
        "LeftHandThumb2" => LeftThumbProximal,
        "LeftHandThumb3" => LeftThumbDistal,
        "LeftHandIndex1" => LeftIndexProximal,
        "LeftHandIndex2" => LeftIndexIntermediate,
        "LeftHandIndex3" => LeftIndexDistal,
        "LeftHandMiddle1" => LeftMiddleProximal,
        "LeftHandMiddle2" => LeftMiddleIntermediate,
        "LeftHandMiddle3" => LeftMiddleDistal,
        "LeftHandRing1" => LeftRingProximal,
        "LeftHandRing2" => LeftRingIntermediate,
        "LeftHandRing3" => LeftRingDistal,
        "LeftHandPinky1" => LeftLittleProximal,
        "LeftHandPinky2" => LeftLittleIntermediate,
        "LeftHandPinky3" => LeftLittleDistal,
        "RightShoulder" => RightShoulder,
        "RightArm" => RightUpperArm,
        "RightForeArm" => RightLowerArm,
        "RightHand" => RightHand,
        "RightHandThumb1" => RightThumbMetacarpal,
        "RightHandThumb2" => RightThumbProximal,
        "RightHandThumb3" => RightThumbDistal,
        "RightHandIndex1" => RightIndexProximal,
        "RightHandIndex2" => RightIndexIntermediate,
        "RightHandIndex3" => RightIndexDistal,
        "RightHandMiddle1" => RightMiddleProximal,
        "RightHandMiddle2" => RightMiddleIntermediate,
        "RightHandMiddle3" => RightMiddleDistal,
        "RightHandRing1" => RightRingProximal,
        "RightHandRing2" => RightRingIntermediate,
        "RightHandRing3" => RightRingDistal,
        "RightHandPinky1" => RightLittleProximal,
        "RightHandPinky2" => RightLittleIntermediate,
        "RightHandPinky3" => RightLittleDistal,
        "LeftUpLeg" => LeftUpperLeg,
        "LeftLeg" => LeftLowerLeg,
        "LeftFoot" => LeftFoot,
        "LeftToeBase" => LeftToes,
        "RightUpLeg" => RightUpperLeg,
        "RightLeg" => RightLowerLeg,
        "RightFoot" => RightFoot,
        "RightToeBase" => RightToes,
        _ => return None,
    };
    Some(bone)
}

/// 把 Mixamo 动画重定向到 `target` 骨架
pub fn retarget(
    source: &SourceClip,
    target: &Humanoid,
    name: ClipName,
    version: VrmVersion,
) -> Result<AnimationClip> {
    if !(source.hips_height.is_finite() && source.hips_height > 0.0) {
        return Err(AvatarError::InvalidClip(format!(
            "{}: source hips height {} is not positive",
            name, source.hips_height
        )));
    }
    let hips_scale = target.hips_height().abs() / source.hips_height;

    let mut tracks = Vec::new();
    for source_track in &source.tracks {
        let Some(bone) = mixamo_to_humanoid(&source_track.bone) else {
            log::debug!("跳过非人形轨道: {}", source_track.bone);
            continue;
        };
        if !target.has_bone(bone) {
            log::debug!("目标骨架缺少 {}，跳过轨道", bone);
            continue;
        }

        let rest = source.rest.get(&source_track.bone).copied().unwrap_or_default();
        let rest_inverse = rest.world_rotation.inverse();

        let mut track = BoneTrack::new(bone);
        track.rotations = source_track
            .rotations
            .iter()
            .map(|key| {
                let q = rest.parent_world_rotation * key.rotation * rest_inverse;
                RotationKey {
                    time: key.time,
                    rotation: flip_rotation(q, version).normalize(),
                }
            })
            .collect();

        // 只保留胯部平移，其余骨骼的平移来自模型自身
        if bone == HumanoidBone::Hips {
            track.translations = source_track
                .translations
                .iter()
                .map(|key| TranslationKey {
                    time: key.time,
                    translation: flip_translation(key.translation, version) * hips_scale,
                })
                .collect();
        }

        if !track.rotations.is_empty() || !track.translations.is_empty() {
            tracks.push(track);
        }
    }

    if tracks.is_empty() {
        return Err(AvatarError::InvalidClip(format!(
            "{}: no track maps onto the humanoid",
            name
        )));
    }

    log::info!("动画重定向完成: {} ({} 条轨道)", name, tracks.len());
    Ok(AnimationClip::new(name, source.duration, tracks))
}

fn flip_rotation(q: Quat, version: VrmVersion) -> Quat {
    match version {
        VrmVersion::V0 => Quat::from_xyzw(-q.x, q.y, -q.z, q.w),
        VrmVersion::V1 => q,
    }
}

fn flip_translation(v: Vec3, version: VrmVersion) -> Vec3 {
    match version {
        VrmVersion::V0 => Vec3::new(-v.x, v.y, -v.z),
        VrmVersion::V1 => v,
    }
}
