//! 角色移动配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。

use once_cell::sync::Lazy;
use std::sync::RwLock;

/// 角色移动配置（扁平化，不嵌套）
#[derive(Debug, Clone)]
pub struct LocomotionConfig {
    // ========== 移动 ==========
    /// 每帧移动冲量大小，默认 0.45
    pub movement_speed: f32,
    /// 起跳冲量，默认 2.0
    pub jump_force: f32,

    // ========== 世界 ==========
    /// 重力 Y 分量（负数向下），默认 -30.0
    pub gravity_y: f32,
    /// 物理 FPS，默认 60.0
    pub physics_fps: f32,
    /// 每帧最大子步数，默认 4
    pub max_substep_count: i32,

    // ========== 角色刚体 ==========
    /// 线性阻尼，默认 12.0
    /// 阻尼大，松开按键后角色立刻停下
    pub linear_damping: f32,
    /// 胶囊半高，默认 1.75
    pub capsule_half_height: f32,
    /// 胶囊半径，默认 0.3
    pub capsule_radius: f32,
    /// 胶囊中心相对刚体原点的高度，默认 2.0
    pub capsule_offset_y: f32,

    // ========== 判定 ==========
    /// 刚体高度不超过此值视为着地，默认 0.1
    pub grounded_height: f32,
    /// 相机注视点/第一人称视点离刚体原点的高度，默认 1.5
    pub eye_height: f32,

    // ========== 调试 ==========
    /// 是否输出调试日志，默认 false
    pub debug_log: bool,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            movement_speed: 0.45,
            jump_force: 2.0,

            gravity_y: -30.0,
            physics_fps: 60.0,
            max_substep_count: 4,

            linear_damping: 12.0,
            capsule_half_height: 1.75,
            capsule_radius: 0.3,
            capsule_offset_y: 2.0,

            grounded_height: 0.1,
            eye_height: 1.5,

            debug_log: false,
        }
    }
}

/// 全局配置实例
static LOCOMOTION_CONFIG: Lazy<RwLock<LocomotionConfig>> = Lazy::new(|| {
    RwLock::new(LocomotionConfig::default())
});

/// 获取当前配置（只读）
pub fn get_config() -> LocomotionConfig {
    LOCOMOTION_CONFIG
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// 手动设置配置（用于运行时调试）
pub fn set_config(config: LocomotionConfig) {
    *LOCOMOTION_CONFIG
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    set_config(LocomotionConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_round_trip() {
        let mut config = LocomotionConfig::default();
        config.jump_force = 4.0;
        set_config(config);
        assert_eq!(get_config().jump_force, 4.0);
        reset_config();
        assert_eq!(get_config().jump_force, 2.0);
        assert_eq!(get_config().movement_speed, 0.45);
    }
}
