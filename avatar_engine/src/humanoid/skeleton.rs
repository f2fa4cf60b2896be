//! 人形骨架

use glam::Vec3;

use super::{BoneNode, HumanoidBone, SkeletonProvider};
use crate::{AvatarError, Result};

/// 人形骨架
///
/// 在加载时完成名称校验，运行时只按枚举查找。
#[derive(Clone, Debug)]
pub struct Humanoid {
    nodes: Vec<Option<BoneNode>>,
}

impl Humanoid {
    /// 由骨骼节点构建，缺少必需骨骼时报错
    pub fn new(bones: impl IntoIterator<Item = (HumanoidBone, BoneNode)>) -> Result<Self> {
        let mut nodes = vec![None; HumanoidBone::ALL.len()];
        for (bone, node) in bones {
            nodes[bone.index()] = Some(node);
        }

        let humanoid = Self { nodes };
        if let Some(missing) = HumanoidBone::REQUIRED
            .iter()
            .find(|bone| !humanoid.has_bone(**bone))
        {
            return Err(AvatarError::MissingHumanoidBone(*missing));
        }

        log::info!("人形骨架加载完成: {} 个骨骼", humanoid.bone_count());
        Ok(humanoid)
    }

    /// 由模型文件中的骨骼名构建，未知名称在加载时报错
    pub fn from_bone_names<'a>(
        bones: impl IntoIterator<Item = (&'a str, BoneNode)>,
    ) -> Result<Self> {
        let parsed = bones
            .into_iter()
            .map(|(name, node)| name.parse::<HumanoidBone>().map(|bone| (bone, node)))
            .collect::<Result<Vec<_>>>()?;
        Self::new(parsed)
    }

    pub fn has_bone(&self, bone: HumanoidBone) -> bool {
        self.nodes[bone.index()].is_some()
    }

    pub fn bone_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// 宿主按字符串查找（未知名称返回 None）
    pub fn bone_node_by_name(&self, name: &str) -> Option<&BoneNode> {
        let bone = name.parse::<HumanoidBone>().ok()?;
        self.bone_node(bone)
    }

    pub fn bones(&self) -> impl Iterator<Item = (HumanoidBone, &BoneNode)> + '_ {
        HumanoidBone::ALL
            .iter()
            .filter_map(move |bone| self.bone_node(*bone).map(|node| (*bone, node)))
    }

    /// 所有骨骼恢复初始姿态
    pub fn reset_pose(&mut self) {
        for node in self.nodes.iter_mut().flatten() {
            node.reset();
        }
    }

    /// 初始姿态下胯部离地高度
    pub fn hips_height(&self) -> f32 {
        self.bone_node(HumanoidBone::Hips)
            .map(|node| node.rest_world_position.y)
            .unwrap_or(0.0)
    }

    /// 简易 T-Pose 骨架，所有骨骼都存在
    ///
    /// 尺寸大致对应 1.6m 的人形，用于测试和无模型时的占位。
    pub fn t_pose() -> Self {
        let nodes = HumanoidBone::ALL
            .iter()
            .map(|bone| {
                let world = t_pose_position(*bone);
                Some(BoneNode::new(world, world))
            })
            .collect();
        Self { nodes }
    }
}

impl SkeletonProvider for Humanoid {
    fn bone_node(&self, bone: HumanoidBone) -> Option<&BoneNode> {
        self.nodes[bone.index()].as_ref()
    }

    fn bone_node_mut(&mut self, bone: HumanoidBone) -> Option<&mut BoneNode> {
        self.nodes[bone.index()].as_mut()
    }
}

fn t_pose_position(bone: HumanoidBone) -> Vec3 {
    use HumanoidBone::*;
    match bone {
        Hips => Vec3::new(0.0, 0.9, 0.0),
        Spine => Vec3::new(0.0, 1.0, 0.0),
        Chest => Vec3::new(0.0, 1.15, 0.0),
        UpperChest => Vec3::new(0.0, 1.25, 0.0),
        Neck => Vec3::new(0.0, 1.4, 0.0),
        Head => Vec3::new(0.0, 1.5, 0.0),
        LeftUpperLeg => Vec3::new(0.1, 0.85, 0.0),
        RightUpperLeg => Vec3::new(-0.1, 0.85, 0.0),
        LeftLowerLeg => Vec3::new(0.1, 0.45, 0.0),
        RightLowerLeg => Vec3::new(-0.1, 0.45, 0.0),
        LeftFoot => Vec3::new(0.1, 0.08, 0.0),
        RightFoot => Vec3::new(-0.1, 0.08, 0.0),
        LeftUpperArm => Vec3::new(0.2, 1.35, 0.0),
        RightUpperArm => Vec3::new(-0.2, 1.35, 0.0),
        LeftLowerArm => Vec3::new(0.45, 1.35, 0.0),
        RightLowerArm => Vec3::new(-0.45, 1.35, 0.0),
        LeftHand => Vec3::new(0.7, 1.35, 0.0),
        RightHand => Vec3::new(-0.7, 1.35, 0.0),
        _ => Vec3::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required_nodes() -> Vec<(&'static str, BoneNode)> {
        HumanoidBone::REQUIRED
            .iter()
            .map(|b| (b.name(), BoneNode::default()))
            .collect()
    }

    #[test]
    fn test_from_bone_names_with_required_set() {
        let humanoid = Humanoid::from_bone_names(required_nodes()).unwrap();
        assert_eq!(humanoid.bone_count(), 15);
        assert!(!humanoid.has_bone(HumanoidBone::Chest));
        assert!(humanoid.bone_node_by_name("hips").is_some());
        assert!(humanoid.bone_node_by_name("tail").is_none());
    }

    #[test]
    fn test_unknown_name_fails_at_load() {
        let mut nodes = required_nodes();
        nodes.push(("mixamorigHips", BoneNode::default()));
        assert!(matches!(
            Humanoid::from_bone_names(nodes),
            Err(AvatarError::UnknownBone(name)) if name == "mixamorigHips"
        ));
    }

    #[test]
    fn test_missing_required_bone() {
        let nodes: Vec<_> = required_nodes()
            .into_iter()
            .filter(|(name, _)| *name != "head")
            .collect();
        assert!(matches!(
            Humanoid::from_bone_names(nodes),
            Err(AvatarError::MissingHumanoidBone(HumanoidBone::Head))
        ));
    }

    #[test]
    fn test_reset_pose_restores_rest() {
        let mut humanoid = Humanoid::t_pose();
        let node = humanoid.bone_node_mut(HumanoidBone::Neck).unwrap();
        node.rotation = glam::Quat::from_rotation_y(1.0);
        humanoid.reset_pose();
        assert_eq!(
            humanoid.bone_node(HumanoidBone::Neck).unwrap().rotation,
            glam::Quat::IDENTITY
        );
        assert!((humanoid.hips_height() - 0.9).abs() < 1e-6);
    }
}
