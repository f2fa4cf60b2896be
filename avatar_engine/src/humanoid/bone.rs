//! 骨骼节点

use glam::{Quat, Vec3};

/// 归一化人形骨骼节点
///
/// 旋转和平移都是相对父节点的本地值，初始姿态为 T-Pose。
#[derive(Clone, Debug, PartialEq)]
pub struct BoneNode {
    pub rotation: Quat,
    pub translation: Vec3,

    // 初始状态（用于 reset）
    pub rest_rotation: Quat,
    pub rest_translation: Vec3,
    /// 初始姿态下的世界坐标（用于计算胯部高度）
    pub rest_world_position: Vec3,
}

impl BoneNode {
    pub fn new(rest_translation: Vec3, rest_world_position: Vec3) -> Self {
        Self {
            rotation: Quat::IDENTITY,
            translation: rest_translation,
            rest_rotation: Quat::IDENTITY,
            rest_translation,
            rest_world_position,
        }
    }

    /// 恢复初始姿态
    pub fn reset(&mut self) {
        self.rotation = self.rest_rotation;
        self.translation = self.rest_translation;
    }
}

impl Default for BoneNode {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::ZERO)
    }
}
