//! VRM 人形骨骼与骨骼旋转驱动

mod bone;
mod driver;
mod skeleton;

pub use bone::BoneNode;
pub use driver::{rotate, AxisFlip};
pub use skeleton::Humanoid;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AvatarError;

/// 按标准骨骼名取节点的接口
pub trait SkeletonProvider {
    fn bone_node(&self, bone: HumanoidBone) -> Option<&BoneNode>;
    fn bone_node_mut(&mut self, bone: HumanoidBone) -> Option<&mut BoneNode>;
}

macro_rules! humanoid_bones {
    ($($variant:ident => $name:literal,)*) => {
        /// VRM 人形骨骼
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum HumanoidBone {
            $(
                #[serde(rename = $name)]
                $variant,
            )*
        }

        impl HumanoidBone {
            pub const ALL: &'static [HumanoidBone] = &[$(HumanoidBone::$variant,)*];

            /// 规范中的骨骼名
            pub fn name(self) -> &'static str {
                match self {
                    $(HumanoidBone::$variant => $name,)*
                }
            }
        }
    };
}

humanoid_bones! {
    // 躯干
    Hips => "hips",
    Spine => "spine",
    Chest => "chest",
    UpperChest => "upperChest",
    Neck => "neck",
    // 头部
    Head => "head",
    LeftEye => "leftEye",
    RightEye => "rightEye",
    Jaw => "jaw",
    // 腿
    LeftUpperLeg => "leftUpperLeg",
    LeftLowerLeg => "leftLowerLeg",
    LeftFoot => "leftFoot",
    LeftToes => "leftToes",
    RightUpperLeg => "rightUpperLeg",
    RightLowerLeg => "rightLowerLeg",
    RightFoot => "rightFoot",
    RightToes => "rightToes",
    // 手臂
    LeftShoulder => "leftShoulder",
    LeftUpperArm => "leftUpperArm",
    LeftLowerArm => "leftLowerArm",
    LeftHand => "leftHand",
    RightShoulder => "rightShoulder",
    RightUpperArm => "rightUpperArm",
    RightLowerArm => "rightLowerArm",
    RightHand => "rightHand",
    // 左手手指
    LeftThumbMetacarpal => "leftThumbMetacarpal",
    LeftThumbProximal => "leftThumbProximal",
    LeftThumbDistal => "leftThumbDistal",
    LeftIndexProximal => "leftIndexProximal",
    LeftIndexIntermediate => "leftIndexIntermediate",
    LeftIndexDistal => "leftIndexDistal",
    LeftMiddleProximal => "leftMiddleProximal",
    LeftMiddleIntermediate => "leftMiddleIntermediate",
    LeftMiddleDistal => "leftMiddleDistal",
    LeftRingProximal => "leftRingProximal",
    LeftRingIntermediate => "leftRingIntermediate",
    LeftRingDistal => "leftRingDistal",
    LeftLittleProximal => "leftLittleProximal",
    LeftLittleIntermediate => "leftLittleIntermediate",
    LeftLittleDistal => "leftLittleDistal",
    // 右手手指
    RightThumbMetacarpal => "rightThumbMetacarpal",
    RightThumbProximal => "rightThumbProximal",
    RightThumbDistal => "rightThumbDistal",
    RightIndexProximal => "rightIndexProximal",
    RightIndexIntermediate => "rightIndexIntermediate",
    RightIndexDistal => "rightIndexDistal",
    RightMiddleProximal => "rightMiddleProximal",
    RightMiddleIntermediate => "rightMiddleIntermediate",
    RightMiddleDistal => "rightMiddleDistal",
    RightRingProximal => "rightRingProximal",
    RightRingIntermediate => "rightRingIntermediate",
    RightRingDistal => "rightRingDistal",
    RightLittleProximal => "rightLittleProximal",
    RightLittleIntermediate => "rightLittleIntermediate",
    RightLittleDistal => "rightLittleDistal",
}

impl HumanoidBone {
    /// 人形规范要求必须存在的骨骼
    pub const REQUIRED: [HumanoidBone; 15] = [
        HumanoidBone::Hips,
        HumanoidBone::Spine,
        HumanoidBone::Head,
        HumanoidBone::LeftUpperLeg,
        HumanoidBone::LeftLowerLeg,
        HumanoidBone::LeftFoot,
        HumanoidBone::RightUpperLeg,
        HumanoidBone::RightLowerLeg,
        HumanoidBone::RightFoot,
        HumanoidBone::LeftUpperArm,
        HumanoidBone::LeftLowerArm,
        HumanoidBone::LeftHand,
        HumanoidBone::RightUpperArm,
        HumanoidBone::RightLowerArm,
        HumanoidBone::RightHand,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }
}

impl fmt::Display for HumanoidBone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HumanoidBone {
    type Err = AvatarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HumanoidBone::ALL
            .iter()
            .copied()
            .find(|b| b.name() == s)
            .ok_or_else(|| AvatarError::UnknownBone(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bone_names_parse_back() {
        assert_eq!(HumanoidBone::ALL.len(), 55);
        for bone in HumanoidBone::ALL {
            assert_eq!(bone.name().parse::<HumanoidBone>().unwrap(), *bone);
        }
    }

    #[test]
    fn test_serde_uses_rig_names() {
        let json = serde_json::to_string(&HumanoidBone::LeftThumbMetacarpal).unwrap();
        assert_eq!(json, "\"leftThumbMetacarpal\"");
        let bone: HumanoidBone = serde_json::from_str("\"upperChest\"").unwrap();
        assert_eq!(bone, HumanoidBone::UpperChest);
    }

    #[test]
    fn test_unknown_bone_name() {
        assert!(matches!(
            "leftThumbIntermediate".parse::<HumanoidBone>(),
            Err(AvatarError::UnknownBone(_))
        ));
    }
}
