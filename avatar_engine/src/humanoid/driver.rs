//! 骨骼旋转驱动

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::{HumanoidBone, SkeletonProvider};

/// 各轴的旋转缩放（负数即翻转）
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisFlip {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl AxisFlip {
    pub const IDENTITY: AxisFlip = AxisFlip { x: 1.0, y: 1.0, z: 1.0 };

    pub const fn uniform(f: f32) -> Self {
        Self { x: f, y: f, z: f }
    }

    pub fn apply(&self, euler: Vec3) -> Vec3 {
        Vec3::new(euler.x * self.x, euler.y * self.y, euler.z * self.z)
    }
}

impl Default for AxisFlip {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// 把骨骼朝目标欧拉角（XYZ 顺序）平滑旋转
///
/// 骨骼不存在时输出一条警告并跳过，骨架不受影响。
/// 欧拉角含 NaN/无穷时保持上一帧姿态。
/// `slerp_rate` 截断到 [0, 1]。返回骨骼是否存在。
pub fn rotate<S: SkeletonProvider + ?Sized>(
    skeleton: &mut S,
    bone: HumanoidBone,
    euler: Vec3,
    slerp_rate: f32,
    flip: AxisFlip,
) -> bool {
    let Some(node) = skeleton.bone_node_mut(bone) else {
        log::warn!("VRM 骨架中没有骨骼 {}，已跳过", bone);
        return false;
    };

    let e = flip.apply(euler);
    if !e.is_finite() {
        return true;
    }
    let target = Quat::from_euler(EulerRot::XYZ, e.x, e.y, e.z);
    let rate = if slerp_rate.is_finite() { slerp_rate.clamp(0.0, 1.0) } else { 0.0 };
    node.rotation = node.rotation.slerp(target, rate).normalize();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanoid::{BoneNode, Humanoid};
    use approx::assert_abs_diff_eq;
    use std::cell::RefCell;
    use std::sync::Once;

    thread_local! {
        static WARNINGS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    /// 按线程收集 warn 记录，测试并行时互不干扰
    struct WarnCapture;

    impl log::Log for WarnCapture {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.level() <= log::Level::Warn
        }

        fn log(&self, record: &log::Record) {
            if record.level() == log::Level::Warn {
                WARNINGS.with(|w| w.borrow_mut().push(record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: WarnCapture = WarnCapture;

    fn capture_warnings() {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            let _ = log::set_logger(&CAPTURE);
            log::set_max_level(log::LevelFilter::Warn);
        });
        WARNINGS.with(|w| w.borrow_mut().clear());
    }

    fn warnings() -> Vec<String> {
        WARNINGS.with(|w| w.borrow().clone())
    }

    fn minimal() -> Humanoid {
        Humanoid::new(
            HumanoidBone::REQUIRED
                .iter()
                .map(|b| (*b, BoneNode::default())),
        )
        .unwrap()
    }

    #[test]
    fn test_full_rate_reaches_target() {
        let mut humanoid = Humanoid::t_pose();
        let euler = Vec3::new(0.2, -0.4, 0.1);
        assert!(rotate(&mut humanoid, HumanoidBone::Neck, euler, 1.0, AxisFlip::IDENTITY));
        let expected = Quat::from_euler(EulerRot::XYZ, 0.2, -0.4, 0.1);
        let actual = humanoid.bone_node(HumanoidBone::Neck).unwrap().rotation;
        assert_abs_diff_eq!(actual.dot(expected).abs(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_flip_scales_each_axis() {
        let mut humanoid = Humanoid::t_pose();
        rotate(
            &mut humanoid,
            HumanoidBone::Hips,
            Vec3::new(0.0, 1.0, 0.0),
            1.0,
            AxisFlip::uniform(0.7),
        );
        let q = humanoid.bone_node(HumanoidBone::Hips).unwrap().rotation;
        let (_, angle) = q.to_axis_angle();
        assert_abs_diff_eq!(angle, 0.7, epsilon = 1e-4);
    }

    #[test]
    fn test_partial_rate_moves_part_way() {
        let mut humanoid = Humanoid::t_pose();
        rotate(
            &mut humanoid,
            HumanoidBone::Spine,
            Vec3::new(0.0, 0.0, 1.0),
            0.25,
            AxisFlip::IDENTITY,
        );
        let q = humanoid.bone_node(HumanoidBone::Spine).unwrap().rotation;
        assert_abs_diff_eq!(q.angle_between(Quat::IDENTITY), 0.25, epsilon = 1e-4);
    }

    #[test]
    fn test_missing_bone_has_no_side_effects() {
        let mut humanoid = minimal();
        let before: Vec<_> = humanoid.bones().map(|(b, n)| (b, n.clone())).collect();
        assert!(!rotate(
            &mut humanoid,
            HumanoidBone::LeftRingDistal,
            Vec3::ONE,
            1.0,
            AxisFlip::IDENTITY,
        ));
        let after: Vec<_> = humanoid.bones().map(|(b, n)| (b, n.clone())).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_missing_bone_warns_once_per_call() {
        capture_warnings();
        let mut humanoid = minimal();
        rotate(&mut humanoid, HumanoidBone::Neck, Vec3::ONE, 1.0, AxisFlip::IDENTITY);
        assert_eq!(warnings().len(), 1);
        assert!(warnings()[0].contains("neck"));

        rotate(&mut humanoid, HumanoidBone::Neck, Vec3::ONE, 1.0, AxisFlip::IDENTITY);
        assert_eq!(warnings().len(), 2);

        // 存在的骨骼不产生警告
        rotate(&mut humanoid, HumanoidBone::Hips, Vec3::ONE, 1.0, AxisFlip::IDENTITY);
        assert_eq!(warnings().len(), 2);
    }

    #[test]
    fn test_non_finite_euler_holds_pose() {
        let mut humanoid = Humanoid::t_pose();
        rotate(&mut humanoid, HumanoidBone::Neck, Vec3::new(0.3, 0.0, 0.0), 1.0, AxisFlip::IDENTITY);
        let held = humanoid.bone_node(HumanoidBone::Neck).unwrap().rotation;

        assert!(rotate(
            &mut humanoid,
            HumanoidBone::Neck,
            Vec3::new(f32::NAN, 0.0, 0.0),
            0.5,
            AxisFlip::IDENTITY,
        ));
        assert_eq!(humanoid.bone_node(HumanoidBone::Neck).unwrap().rotation, held);
        rotate(&mut humanoid, HumanoidBone::Neck, Vec3::new(0.0, f32::INFINITY, 0.0), 0.5, AxisFlip::IDENTITY);
        assert_eq!(humanoid.bone_node(HumanoidBone::Neck).unwrap().rotation, held);

        for _ in 0..100 {
            rotate(&mut humanoid, HumanoidBone::Neck, Vec3::ZERO, 0.5, AxisFlip::IDENTITY);
        }
        let q = humanoid.bone_node(HumanoidBone::Neck).unwrap().rotation;
        assert!(q.is_finite());
        assert_abs_diff_eq!(q.angle_between(Quat::IDENTITY), 0.0, epsilon = 1e-3);
    }
}
