//! 角色控制器
//!
//! 胶囊刚体 + 锁定旋转，WASD 按相机水平朝向移动，空格起跳。

use glam::{Quat, Vec3};
use rapier3d::prelude::*;

use super::world::PhysicsWorld;

/// 一帧的按键状态
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MovementInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

impl MovementInput {
    /// 从按下的键构建（W/A/S/D/空格，不区分大小写）
    pub fn from_keys(keys: &[char]) -> Self {
        let mut input = Self::default();
        for key in keys {
            match key.to_ascii_lowercase() {
                'w' => input.forward = true,
                's' => input.back = true,
                'a' => input.left = true,
                'd' => input.right = true,
                ' ' => input.jump = true,
                _ => {}
            }
        }
        input
    }

    pub fn is_moving(&self) -> bool {
        self.forward || self.back || self.left || self.right
    }

    /// 相机水平朝向下的移动方向（未归一化，可能为零）
    pub fn direction(&self, camera_forward: Vec3) -> Vec3 {
        let forward = Vec3::new(camera_forward.x, 0.0, camera_forward.z).normalize_or_zero();
        let mut dir = Vec3::ZERO;
        if self.forward {
            dir += forward;
        }
        if self.back {
            dir -= forward;
        }
        if self.left {
            dir += Vec3::new(forward.z, 0.0, -forward.x);
        }
        if self.right {
            dir += Vec3::new(-forward.z, 0.0, forward.x);
        }
        dir
    }
}

/// 角色控制器
pub struct CharacterController {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    grounded: bool,
    moving: bool,
    /// 朝向（绕 Y 轴，弧度）
    yaw: f32,
}

impl CharacterController {
    /// 在 `position` 处生成角色刚体
    pub fn spawn(world: &mut PhysicsWorld, position: Vec3) -> Self {
        let config = world.config().clone();
        let body = RigidBodyBuilder::dynamic()
            .translation(Vector::new(position.x, position.y, position.z))
            .linear_damping(config.linear_damping)
            .lock_rotations()
            .can_sleep(false)
            .build();
        let body = world.rigid_body_set.insert(body);

        let collider = ColliderBuilder::capsule_y(config.capsule_half_height, config.capsule_radius)
            .translation(Vector::new(0.0, config.capsule_offset_y, 0.0))
            .friction(0.0)
            .build();
        let collider = world
            .collider_set
            .insert_with_parent(collider, body, &mut world.rigid_body_set);

        log::debug!("角色生成于 {:?}", position);
        Self {
            body,
            collider,
            grounded: true,
            moving: false,
            yaw: 0.0,
        }
    }

    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn collider(&self) -> ColliderHandle {
        self.collider
    }

    /// 施加本帧的移动/起跳冲量，推进世界并刷新着地状态
    pub fn update(
        &mut self,
        world: &mut PhysicsWorld,
        input: &MovementInput,
        camera_forward: Vec3,
        delta_time: f32,
    ) {
        let config = world.config().clone();
        let dir = input.direction(camera_forward);
        self.moving = input.is_moving();

        if let Some(rb) = world.rigid_body_set.get_mut(self.body) {
            if self.moving && dir.length_squared() > 0.0 {
                let dir = dir.normalize();
                self.yaw = dir.x.atan2(dir.z);
                let q = Quat::from_rotation_y(self.yaw);
                rb.set_rotation(Rotation::from_xyzw(q.x, q.y, q.z, q.w), true);

                let impulse = dir * config.movement_speed;
                rb.apply_impulse(Vector::new(impulse.x, 0.0, impulse.z), true);
            }

            if input.jump && self.grounded {
                rb.apply_impulse(Vector::new(0.0, config.jump_force, 0.0), true);
                // 下一次检测前视为离地
                self.grounded = false;
            }
        }

        world.step(delta_time);
        self.grounded = self.position(world).y <= config.grounded_height;
    }

    pub fn position(&self, world: &PhysicsWorld) -> Vec3 {
        world
            .rigid_body_set
            .get(self.body)
            .map(|rb| {
                let t = rb.translation();
                Vec3::new(t.x, t.y, t.z)
            })
            .unwrap_or(Vec3::ZERO)
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// 第三人称相机注视点
    pub fn camera_target(&self, world: &PhysicsWorld) -> Vec3 {
        self.position(world) + Vec3::Y * world.config().eye_height
    }

    /// 第一人称视点：返回 (眼睛位置, 注视点)
    pub fn eye_pose(&self, world: &PhysicsWorld) -> (Vec3, Vec3) {
        let base = self.camera_target(world);
        let forward = Quat::from_rotation_y(self.yaw) * Vec3::Z;
        (base + forward * 0.05, base + forward)
    }
}
