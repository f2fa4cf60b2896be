//! 角色移动
//!
//! 使用 Rapier3D 模拟角色胶囊和静态场景。
//!
//! | 场景元素 | Rapier |
//! |----------|--------|
//! | 角色 | 动态刚体（锁定旋转）+ capsule_y 碰撞体 |
//! | 地板 | 固定刚体 + cuboid 碰撞体 |

mod controller;
mod world;
pub mod config;

pub use config::{get_config, reset_config, set_config, LocomotionConfig};
pub use controller::{CharacterController, MovementInput};
pub use world::PhysicsWorld;
