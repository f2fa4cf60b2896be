//! 场景物理世界
//!
//! 角色和静态场景共用一个 Rapier 世界，按固定步长推进。

use glam::Vec3;
use rapier3d::prelude::*;

use super::config::{get_config, LocomotionConfig};

/// 场景物理世界
pub struct PhysicsWorld {
    pub physics_pipeline: PhysicsPipeline,
    pub integration_parameters: IntegrationParameters,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub gravity: Vector,
    /// 固定步长对应的 FPS
    pub fps: f32,
    pub max_substep_count: i32,
    config: LocomotionConfig,
}

impl PhysicsWorld {
    /// 使用全局配置创建空世界
    pub fn new() -> Self {
        Self::with_config(get_config())
    }

    pub fn with_config(config: LocomotionConfig) -> Self {
        let fps = if config.physics_fps > 0.0 { config.physics_fps } else { 60.0 };
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = 1.0 / fps;

        if config.debug_log {
            log::info!(
                "[场景物理] FPS={}, 重力Y={}, 最大子步={}",
                fps,
                config.gravity_y,
                config.max_substep_count
            );
        }

        Self {
            physics_pipeline: PhysicsPipeline::new(),
            integration_parameters,
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity: Vector::new(0.0, config.gravity_y, 0.0),
            fps,
            max_substep_count: config.max_substep_count,
            config,
        }
    }

    /// 默认场景：100×1×100 的地板，顶面在 y = -8.9
    pub fn default_scene() -> Self {
        let mut world = Self::new();
        world.spawn_fixed_cuboid(Vec3::new(50.0, 0.5, 50.0), Vec3::new(0.0, -9.4, 0.0));
        world
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    /// 添加静态盒子
    pub fn spawn_fixed_cuboid(&mut self, half_extents: Vec3, position: Vec3) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed()
            .translation(Vector::new(position.x, position.y, position.z))
            .build();
        let handle = self.rigid_body_set.insert(body);
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z).build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        log::debug!("静态盒子: 半尺寸={:?} 位置={:?}", half_extents, position);
        handle
    }

    /// 按帧间隔推进，返回实际执行的子步数
    pub fn step(&mut self, delta_time: f32) -> i32 {
        if !(delta_time.is_finite() && delta_time > 0.0) {
            return 0;
        }
        let fixed_dt = 1.0 / self.fps;
        let max_steps = self.max_substep_count.max(1);
        let needed_steps = (delta_time / fixed_dt).ceil() as i32;

        if needed_steps <= max_steps {
            for _ in 0..needed_steps {
                self.step_once(fixed_dt);
            }
            needed_steps
        } else {
            // 帧率过低，最后一步消化剩余时间
            let fixed_steps = max_steps - 1;
            for _ in 0..fixed_steps {
                self.step_once(fixed_dt);
            }
            self.step_once(delta_time - fixed_steps as f32 * fixed_dt);
            max_steps
        }
    }

    fn step_once(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_counts_substeps() {
        let mut world = PhysicsWorld::with_config(LocomotionConfig::default());
        assert_eq!(world.step(1.0 / 60.0), 1);
        assert_eq!(world.step(2.5 / 60.0), 3);
        // 超过上限时只走 max_substep_count 步
        assert_eq!(world.step(1.0), 4);
        assert_eq!(world.step(0.0), 0);
        assert_eq!(world.step(f32::NAN), 0);
    }

    #[test]
    fn test_fixed_cuboid_stays_put() {
        let mut world = PhysicsWorld::with_config(LocomotionConfig::default());
        let handle = world.spawn_fixed_cuboid(Vec3::new(1.0, 1.0, 1.0), Vec3::new(0.0, 3.0, 0.0));
        world.step(0.5);
        let t = world.rigid_body_set[handle].translation();
        assert_eq!(t.y, 3.0);
        assert_eq!(world.collider_set.len(), 1);
    }

    #[test]
    fn test_default_scene_has_ground() {
        let world = PhysicsWorld::default_scene();
        assert_eq!(world.rigid_body_set.len(), 1);
        assert_eq!(world.collider_set.len(), 1);
    }
}
