//! 实时驱动信号
//!
//! 面部、身体、手部的解算结果由外部的关键点解算器给出，
//! 这里只定义它们在驱动器里的形状。

mod look_at;

pub use look_at::LookAt;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::humanoid::HumanoidBone;

/// 五元音口型
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct MouthShape {
    pub a: f32,
    pub i: f32,
    pub e: f32,
    pub o: f32,
    pub u: f32,
}

/// 左右眼睁开程度（1 = 完全睁开）
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EyeOpenness {
    pub l: f32,
    pub r: f32,
}

impl Default for EyeOpenness {
    fn default() -> Self {
        Self { l: 1.0, r: 1.0 }
    }
}

/// 面部解算结果
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceRig {
    pub mouth: MouthShape,
    pub eye: EyeOpenness,
    /// 头部欧拉角（弧度）
    pub head: Vec3,
    /// 瞳孔偏移，约在 [-1, 1]
    pub pupil: Vec2,
}

/// 身体解算结果（全部为欧拉角，弧度）
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseRig {
    pub spine: Vec3,
    pub hips_rotation: Vec3,
    pub left_upper_arm: Vec3,
    pub left_lower_arm: Vec3,
    pub right_upper_arm: Vec3,
    pub right_lower_arm: Vec3,
    pub left_hand: Vec3,
    pub right_hand: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandSide {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Little,
}

/// 解算器的指节命名（拇指也是 Proximal/Intermediate/Distal）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    Proximal,
    Intermediate,
    Distal,
}

/// 单只手的解算结果
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandRig {
    pub side: HandSide,
    pub wrist: Vec3,
    pub fingers: Vec<(Finger, Segment, Vec3)>,
}

impl HandRig {
    pub fn new(side: HandSide) -> Self {
        Self {
            side,
            wrist: Vec3::ZERO,
            fingers: Vec::new(),
        }
    }

    pub fn with_segment(mut self, finger: Finger, segment: Segment, rotation: Vec3) -> Self {
        self.fingers.push((finger, segment, rotation));
        self
    }

    /// 解算器指节到人形骨骼
    ///
    /// 人形规范的拇指是 Metacarpal/Proximal/Distal，解算器的
    /// `Intermediate` 对应 `ThumbMetacarpal`。
    pub fn humanoid_bone(side: HandSide, finger: Finger, segment: Segment) -> HumanoidBone {
        use Finger::*;
        use HumanoidBone as B;
        use Segment::*;
        match (side, finger, segment) {
            (HandSide::Left, Thumb, Proximal) => B::LeftThumbProximal,
            (HandSide::Left, Thumb, Intermediate) => B::LeftThumbMetacarpal,
            (HandSide::Left, Thumb, Distal) => B::LeftThumbDistal,
            (HandSide::Left, Index, Proximal) => B::LeftIndexProximal,
            (HandSide::Left, Index, Intermediate) => B::LeftIndexIntermediate,
            (HandSide::Left, Index, Distal) => B::LeftIndexDistal,
            (HandSide::Left, Middle, Proximal) => B::LeftMiddleProximal,
            (HandSide::Left, Middle, Intermediate) => B::LeftMiddleIntermediate,
            (HandSide::Left, Middle, Distal) => B::LeftMiddleDistal,
            (HandSide::Left, Ring, Proximal) => B::LeftRingProximal,
            (HandSide::Left, Ring, Intermediate) => B::LeftRingIntermediate,
            (HandSide::Left, Ring, Distal) => B::LeftRingDistal,
            (HandSide::Left, Little, Proximal) => B::LeftLittleProximal,
            (HandSide::Left, Little, Intermediate) => B::LeftLittleIntermediate,
            (HandSide::Left, Little, Distal) => B::LeftLittleDistal,
            (HandSide::Right, Thumb, Proximal) => B::RightThumbProximal,
            (HandSide::Right, Thumb, Intermediate) => B::RightThumbMetacarpal,
            (HandSide::Right, Thumb, Distal) => B::RightThumbDistal,
            (HandSide::Right, Index, Proximal) => B::RightIndexProximal,
            (HandSide::Right, Index, Intermediate) => B::RightIndexIntermediate,
            (HandSide::Right, Index, Distal) => B::RightIndexDistal,
            (HandSide::Right, Middle, Proximal) => B::RightMiddleProximal,
            (HandSide::Right, Middle, Intermediate) => B::RightMiddleIntermediate,
            (HandSide::Right, Middle, Distal) => B::RightMiddleDistal,
            (HandSide::Right, Ring, Proximal) => B::RightRingProximal,
            (HandSide::Right, Ring, Intermediate) => B::RightRingIntermediate,
            (HandSide::Right, Ring, Distal) => B::RightRingDistal,
            (HandSide::Right, Little, Proximal) => B::RightLittleProximal,
            (HandSide::Right, Little, Intermediate) => B::RightLittleIntermediate,
            (HandSide::Right, Little, Distal) => B::RightLittleDistal,
        }
    }

    pub fn wrist_bone(&self) -> HumanoidBone {
        match self.side {
            HandSide::Left => HumanoidBone::LeftHand,
            HandSide::Right => HumanoidBone::RightHand,
        }
    }
}

/// 一帧的实时驱动数据，尚未解算出的部分为 None
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveRig {
    pub face: Option<FaceRig>,
    pub pose: Option<PoseRig>,
    pub left_hand: Option<HandRig>,
    pub right_hand: Option<HandRig>,
}

impl LiveRig {
    /// 镜像：画面中的左手驱动模型的右手，反之亦然
    pub fn mirrored(
        face: Option<FaceRig>,
        pose: Option<PoseRig>,
        landmark_left_hand: Option<HandRig>,
        landmark_right_hand: Option<HandRig>,
    ) -> Self {
        let as_side = |hand: Option<HandRig>, side: HandSide| {
            hand.map(|mut h| {
                h.side = side;
                h
            })
        };
        Self {
            face,
            pose,
            left_hand: as_side(landmark_right_hand, HandSide::Left),
            right_hand: as_side(landmark_left_hand, HandSide::Right),
        }
    }
}

/// 驱动模式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveMode {
    /// 脚本/滑条驱动，动画片段正常播放
    Scripted,
    /// 摄像头实时驱动，动画片段全部停止
    Live,
}

/// 本帧的驱动信号：有视频输入时为 Live
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DrivingSignal {
    #[default]
    Scripted,
    Live(LiveRig),
}

impl DrivingSignal {
    pub fn mode(&self) -> DriveMode {
        match self {
            DrivingSignal::Scripted => DriveMode::Scripted,
            DrivingSignal::Live(_) => DriveMode::Live,
        }
    }
}
