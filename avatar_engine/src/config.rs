//! 驱动器配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。

use once_cell::sync::Lazy;
use std::sync::RwLock;

/// 每帧驱动配置（扁平化，不嵌套）
#[derive(Debug, Clone)]
pub struct DriverConfig {
    // ========== 表情响应 ==========
    /// 面部捕捉驱动的表情响应系数，实际插值率 = Δt × 此值，默认 5.0
    pub face_responsiveness: f32,
    /// 脚本/滑条驱动的表情响应系数，默认 12.0
    pub script_responsiveness: f32,

    // ========== 骨骼响应 ==========
    /// 头部、躯干、手臂的 slerp 响应系数，默认 5.0
    pub body_responsiveness: f32,
    /// 手腕与手指的 slerp 响应系数，默认 12.0
    pub hand_responsiveness: f32,
    /// 视线目标跟随系数，默认 5.0
    pub look_at_responsiveness: f32,

    // ========== 轴缩放 ==========
    /// 脖子旋转缩放，默认 0.7
    pub neck_flip: f32,
    /// 脊柱/胸部旋转缩放，默认 0.3
    pub spine_flip: f32,
    /// 胯部旋转缩放，默认 0.7
    pub hips_flip: f32,
    /// 瞳孔偏移到视线目标的缩放，默认 2.0
    pub look_at_scale: f32,

    // ========== 平滑 ==========
    /// 变化阈值，小于此值不写回，默认 0.001
    pub change_epsilon: f32,
    /// 播放时间滚动窗口长度，默认 10
    pub time_window_len: usize,

    // ========== 调试 ==========
    /// 是否输出逐帧调试日志，默认 false
    pub debug_log: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            face_responsiveness: 5.0,
            script_responsiveness: 12.0,

            body_responsiveness: 5.0,
            hand_responsiveness: 12.0,
            look_at_responsiveness: 5.0,

            neck_flip: 0.7,
            spine_flip: 0.3,
            hips_flip: 0.7,
            look_at_scale: 2.0,

            change_epsilon: 0.001,
            time_window_len: 10,

            debug_log: false,
        }
    }
}

/// 全局配置实例
static DRIVER_CONFIG: Lazy<RwLock<DriverConfig>> = Lazy::new(|| {
    RwLock::new(DriverConfig::default())
});

/// 获取当前配置（只读）
pub fn get_config() -> DriverConfig {
    DRIVER_CONFIG
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// 手动设置配置（用于运行时调试）
pub fn set_config(config: DriverConfig) {
    *DRIVER_CONFIG
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    set_config(DriverConfig::default());
}
