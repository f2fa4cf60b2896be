//! 动画状态协调
//!
//! 决定当前应播放的片段，并在切换时停止旧片段、启动新片段。
//! 实时驱动模式下所有片段停止，骨骼完全交给面捕/动捕数据。

use std::collections::VecDeque;

use crate::tracking::DriveMode;

use super::{ClipName, ClipRegistry};

/// 最近若干帧的播放时间
#[derive(Clone, Debug)]
pub struct TimeWindow {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl TimeWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, time: f32) {
        if !time.is_finite() || time < 0.0 {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(time);
    }

    /// 窗口内的最大时间，窗口为空时返回 0
    pub fn max(&self) -> f32 {
        self.samples.iter().copied().fold(0.0, f32::max)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// 动画状态协调器
#[derive(Clone, Debug)]
pub struct AnimationStateCoordinator {
    /// 设置面板上选择的片段
    selection: ClipName,
    /// 手动覆盖，优先于 selection
    manual_override: Option<ClipName>,
    /// 上次 sync 时期望播放的片段
    requested: Option<ClipName>,
    /// 正在播放的片段
    active: Option<ClipName>,
    /// requested 未注册的警告已输出
    warned_missing: bool,
    time_window: TimeWindow,
}

impl AnimationStateCoordinator {
    pub fn new(window_len: usize) -> Self {
        Self {
            selection: ClipName::Idle,
            manual_override: None,
            requested: None,
            active: None,
            warned_missing: false,
            time_window: TimeWindow::new(window_len),
        }
    }

    pub fn set_selection(&mut self, clip: ClipName) {
        self.selection = clip;
    }

    pub fn set_manual_override(&mut self, clip: Option<ClipName>) {
        self.manual_override = clip;
    }

    pub fn selection(&self) -> ClipName {
        self.selection
    }

    pub fn manual_override(&self) -> Option<ClipName> {
        self.manual_override
    }

    /// 生效的片段：手动覆盖优先
    pub fn effective(&self) -> ClipName {
        self.manual_override.unwrap_or(self.selection)
    }

    pub fn active(&self) -> Option<ClipName> {
        self.active
    }

    pub fn time_window(&self) -> &TimeWindow {
        &self.time_window
    }

    /// 让正在播放的片段与生效片段、驱动模式一致
    ///
    /// 期望的片段尚未注册时每帧重试（只警告一次），注册后立即开始播放。
    /// 返回本次是否停止或启动了片段。
    pub fn sync<R: ClipRegistry + ?Sized>(&mut self, registry: &mut R, mode: DriveMode) -> bool {
        let desired = match mode {
            DriveMode::Live => None,
            DriveMode::Scripted => Some(self.effective()).filter(|clip| !clip.is_none()),
        };

        let mut changed = false;
        if desired != self.requested {
            self.requested = desired;
            self.warned_missing = false;
            if let Some(previous) = self.active.take() {
                registry.stop(previous);
            }
            // 旧片段的时间对新片段没有意义
            self.time_window.clear();
            changed = true;
        }

        if let (None, Some(next)) = (self.active, desired) {
            if registry.play(next) {
                self.active = Some(next);
                changed = true;
            } else if !self.warned_missing {
                log::warn!("动画片段 {} 尚未注册，暂不播放", next);
                self.warned_missing = true;
            }
        }

        if changed {
            log::debug!("动画切换: {:?} (mode={:?})", self.active, mode);
        }
        changed
    }

    /// 记录当前片段的播放时间
    pub fn observe<R: ClipRegistry + ?Sized>(&mut self, registry: &R) {
        if let Some(time) = self.active.and_then(|clip| registry.time(clip)) {
            self.time_window.push(time);
        }
    }

    /// 表情输入变化时把当前片段拉回窗口内的最大时间
    ///
    /// 返回回拨到的时间；没有正在播放的片段时返回 None。
    pub fn on_expression_input<R: ClipRegistry + ?Sized>(&mut self, registry: &mut R) -> Option<f32> {
        let active = self.active?;
        let time = self.time_window.max();
        registry.set_time(active, time);
        Some(time)
    }

    /// 停止当前片段并清空状态（重新加载模型时）
    pub fn reset<R: ClipRegistry + ?Sized>(&mut self, registry: &mut R) {
        if let Some(previous) = self.active.take() {
            registry.stop(previous);
        }
        self.requested = None;
        self.warned_missing = false;
        self.time_window.clear();
    }
}

impl Default for AnimationStateCoordinator {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationClip, AnimationMixer};
    use crate::humanoid::Humanoid;

    fn mixer_with(clips: &[ClipName]) -> AnimationMixer {
        let mut mixer = AnimationMixer::new();
        for clip in clips {
            mixer.register(AnimationClip::new(*clip, 4.0, Vec::new()));
        }
        mixer
    }

    #[test]
    fn test_window_keeps_last_samples() {
        let mut window = TimeWindow::new(3);
        for t in [5.0, 1.0, 2.0, 3.0] {
            window.push(t);
        }
        assert_eq!(window.len(), 3);
        assert_eq!(window.max(), 3.0);
        window.push(f32::NAN);
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn test_override_takes_precedence() {
        let mut coordinator = AnimationStateCoordinator::default();
        coordinator.set_selection(ClipName::Walking);
        assert_eq!(coordinator.effective(), ClipName::Walking);
        coordinator.set_manual_override(Some(ClipName::SambaDancing));
        assert_eq!(coordinator.effective(), ClipName::SambaDancing);
        coordinator.set_manual_override(None);
        assert_eq!(coordinator.effective(), ClipName::Walking);
    }

    #[test]
    fn test_switch_stops_previous_and_plays_next() {
        let mut mixer = mixer_with(&[ClipName::Idle, ClipName::SwingDancing]);
        let mut coordinator = AnimationStateCoordinator::default();
        assert!(coordinator.sync(&mut mixer, DriveMode::Scripted));
        assert!(mixer.is_playing(ClipName::Idle));

        coordinator.set_manual_override(Some(ClipName::SwingDancing));
        assert!(coordinator.sync(&mut mixer, DriveMode::Scripted));
        assert!(!mixer.is_playing(ClipName::Idle));
        assert!(mixer.is_playing(ClipName::SwingDancing));
        assert!(!coordinator.sync(&mut mixer, DriveMode::Scripted));
    }

    #[test]
    fn test_none_plays_nothing() {
        let mut mixer = mixer_with(&[ClipName::Idle]);
        let mut coordinator = AnimationStateCoordinator::default();
        coordinator.sync(&mut mixer, DriveMode::Scripted);
        coordinator.set_selection(ClipName::None);
        coordinator.sync(&mut mixer, DriveMode::Scripted);
        assert_eq!(coordinator.active(), None);
        assert_eq!(mixer.playing().count(), 0);
    }

    #[test]
    fn test_live_mode_suppresses_clips() {
        let mut mixer = mixer_with(&[ClipName::Idle]);
        let mut coordinator = AnimationStateCoordinator::default();
        coordinator.sync(&mut mixer, DriveMode::Scripted);
        coordinator.sync(&mut mixer, DriveMode::Live);
        assert_eq!(mixer.playing().count(), 0);
        coordinator.sync(&mut mixer, DriveMode::Scripted);
        assert!(mixer.is_playing(ClipName::Idle));
    }

    #[test]
    fn test_expression_input_rewinds_to_window_max() {
        let mut mixer = mixer_with(&[ClipName::Idle]);
        let mut coordinator = AnimationStateCoordinator::new(10);
        let mut humanoid = Humanoid::t_pose();
        coordinator.sync(&mut mixer, DriveMode::Scripted);
        for _ in 0..5 {
            mixer.advance(0.5, &mut humanoid);
            coordinator.observe(&mixer);
        }
        // 4.0s 循环后时间回到 0.5，但窗口最大值仍是 2.5
        mixer.advance(1.0, &mut humanoid);
        mixer.advance(1.0, &mut humanoid);
        assert!(mixer.time(ClipName::Idle).unwrap() < 1.0);
        let rewound = coordinator.on_expression_input(&mut mixer).unwrap();
        assert_eq!(rewound, 2.5);
        assert_eq!(mixer.time(ClipName::Idle), Some(2.5));
    }

    #[test]
    fn test_missing_clip_leaves_nothing_active() {
        let mut mixer = mixer_with(&[]);
        let mut coordinator = AnimationStateCoordinator::default();
        assert!(coordinator.sync(&mut mixer, DriveMode::Scripted));
        assert_eq!(coordinator.active(), None);
        assert!(!coordinator.sync(&mut mixer, DriveMode::Scripted));
        assert_eq!(coordinator.on_expression_input(&mut mixer), None);
    }

    #[test]
    fn test_clip_registered_later_starts_playing() {
        let mut mixer = mixer_with(&[]);
        let mut coordinator = AnimationStateCoordinator::default();
        coordinator.sync(&mut mixer, DriveMode::Scripted);
        coordinator.sync(&mut mixer, DriveMode::Scripted);
        assert_eq!(coordinator.active(), None);

        mixer.register(AnimationClip::new(ClipName::Idle, 4.0, Vec::new()));
        assert!(coordinator.sync(&mut mixer, DriveMode::Scripted));
        assert_eq!(coordinator.active(), Some(ClipName::Idle));
        assert!(mixer.is_playing(ClipName::Idle));
        assert!(!coordinator.sync(&mut mixer, DriveMode::Scripted));
    }
}
