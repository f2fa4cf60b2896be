//! 说话脚本时间轴
//!
//! 脚本是一串 `{time, blendShape, value}`，按累计时间逐条推进，
//! 播完后回到第一条循环。当前条目作为本帧的表情覆盖值。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::expression::{Expression, ExpressionOverride};
use crate::{AvatarError, Result};

/// 浮点累加的比较容差
const TIME_TOLERANCE: f32 = 1e-5;

/// 脚本条目
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptEntry {
    /// 在本条目停留的时间（秒）
    pub time: f32,
    pub blend_shape: Expression,
    pub value: f32,
}

impl ScriptEntry {
    pub fn new(time: f32, blend_shape: Expression, value: f32) -> Self {
        Self {
            time,
            blend_shape,
            value,
        }
    }

    pub fn as_override(&self) -> ExpressionOverride {
        ExpressionOverride {
            expression: self.blend_shape,
            value: self.value,
        }
    }
}

/// 已校验的说话脚本（非空）
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TalkingScript {
    entries: Vec<ScriptEntry>,
}

impl TalkingScript {
    pub fn new(entries: Vec<ScriptEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(AvatarError::InvalidScript("script has no entries".to_string()));
        }
        for (i, entry) in entries.iter().enumerate() {
            if !entry.time.is_finite() || entry.time < 0.0 {
                return Err(AvatarError::InvalidScript(format!(
                    "entry {} has invalid time {}",
                    i, entry.time
                )));
            }
            if !(0.0..=1.0).contains(&entry.value) {
                return Err(AvatarError::InvalidScript(format!(
                    "entry {} value {} out of [0, 1]",
                    i, entry.value
                )));
            }
        }
        Ok(Self { entries })
    }

    /// 内置的 "Hello" 口型脚本
    pub fn greeting() -> Self {
        Self {
            entries: vec![
                ScriptEntry::new(0.2, Expression::Ih, 0.6),
                ScriptEntry::new(0.4, Expression::Ee, 0.0),
                ScriptEntry::new(1.0, Expression::Ih, 0.4),
                ScriptEntry::new(0.7, Expression::Ee, 0.0),
                ScriptEntry::new(1.0, Expression::Ou, 0.7),
            ],
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<ScriptEntry> = serde_json::from_str(json)?;
        let script = Self::new(entries)?;
        log::info!("说话脚本加载完成: {} 条", script.len());
        Ok(script)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn entries(&self) -> &[ScriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 完整循环一遍的时长
    pub fn cycle_duration(&self) -> f32 {
        self.entries.iter().map(|e| e.time).sum()
    }
}

impl Default for TalkingScript {
    fn default() -> Self {
        Self::greeting()
    }
}

/// 说话模式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TalkingMode {
    #[default]
    #[serde(rename = "No Talk")]
    NoTalk,
    #[serde(rename = "Talking 1")]
    Talking1,
    Poetry,
}

impl TalkingMode {
    /// 是否由脚本驱动口型
    pub fn drives_script(self) -> bool {
        self == TalkingMode::Talking1
    }

    /// 切换到该模式时播放的音频
    pub fn audio_cue(self) -> Option<&'static str> {
        match self {
            TalkingMode::NoTalk => None,
            TalkingMode::Talking1 => Some("models/audios/hello-48300.mp3"),
            TalkingMode::Poetry => Some("models/audios/poetry.mp3"),
        }
    }
}

/// 脚本播放状态
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScriptPlayer {
    accumulator: f32,
    index: usize,
}

impl ScriptPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 推进 `delta` 秒，返回本帧的当前条目
    pub fn tick<'a>(&mut self, script: &'a TalkingScript, delta: f32) -> &'a ScriptEntry {
        let entries = script.entries();
        if self.index >= entries.len() {
            self.index = 0;
        }

        self.accumulator += delta.max(0.0);
        if self.accumulator + TIME_TOLERANCE >= entries[self.index].time {
            self.index = (self.index + 1) % entries.len();
            self.accumulator = 0.0;
        }
        &entries[self.index]
    }

    /// 回到初始状态
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.index = 0;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    pub fn is_at_start(&self) -> bool {
        self.index == 0 && self.accumulator == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn three_step() -> TalkingScript {
        TalkingScript::new(vec![
            ScriptEntry::new(0.2, Expression::Ih, 0.6),
            ScriptEntry::new(0.4, Expression::Ee, 0.0),
            ScriptEntry::new(1.0, Expression::Ou, 0.7),
        ])
        .unwrap()
    }

    #[test]
    fn test_advances_at_expected_frames() {
        let script = three_step();
        let mut player = ScriptPlayer::new();
        let mut advanced = Vec::new();
        let mut last = player.index();
        for frame in 1..=18 {
            player.tick(&script, 0.1);
            if player.index() != last {
                advanced.push((frame, player.index()));
                last = player.index();
            }
        }
        assert_eq!(advanced, vec![(2, 1), (6, 2), (16, 0), (18, 1)]);
    }

    #[test]
    fn test_visits_every_entry_per_cycle() {
        let script = TalkingScript::greeting();
        let mut player = ScriptPlayer::new();
        let mut order = vec![player.index()];
        let mut elapsed = 0.0;
        let mut cycle_end = None;
        let dt = 0.01;
        for _ in 0..1000 {
            player.tick(&script, dt);
            elapsed += dt;
            if order.last() != Some(&player.index()) {
                order.push(player.index());
                if player.index() == 0 && cycle_end.is_none() {
                    cycle_end = Some(elapsed);
                }
            }
        }
        assert_eq!(&order[..7], &[0, 1, 2, 3, 4, 0, 1]);
        assert_abs_diff_eq!(cycle_end.unwrap(), script.cycle_duration(), epsilon = 0.02);
    }

    #[test]
    fn test_current_entry_is_override() {
        let script = three_step();
        let mut player = ScriptPlayer::new();
        let entry = player.tick(&script, 0.05);
        assert_eq!(entry.blend_shape, Expression::Ih);
        let entry = player.tick(&script, 0.2);
        assert_eq!(entry.as_override().expression, Expression::Ee);
    }

    #[test]
    fn test_reset_returns_to_start() {
        let script = three_step();
        let mut player = ScriptPlayer::new();
        for _ in 0..3 {
            player.tick(&script, 0.1);
        }
        assert!(!player.is_at_start());
        player.reset();
        assert!(player.is_at_start());
    }

    #[test]
    fn test_from_json_and_validation() {
        let script = TalkingScript::from_json(
            r#"[{"time":0.3,"blendShape":"aa","value":0.5},{"time":0.2,"blendShape":"oh","value":0.1}]"#,
        )
        .unwrap();
        assert_eq!(script.len(), 2);
        assert_abs_diff_eq!(script.cycle_duration(), 0.5);

        assert!(matches!(TalkingScript::from_json("[]"), Err(AvatarError::InvalidScript(_))));
        assert!(matches!(
            TalkingScript::from_json(r#"[{"time":0.3,"blendShape":"grin","value":0.5}]"#),
            Err(AvatarError::Json(_))
        ));
        assert!(TalkingScript::new(vec![ScriptEntry::new(-1.0, Expression::Aa, 0.5)]).is_err());
    }

    #[test]
    fn test_talking_modes() {
        assert!(TalkingMode::Talking1.drives_script());
        assert!(!TalkingMode::Poetry.drives_script());
        assert_eq!(TalkingMode::NoTalk.audio_cue(), None);
        let mode: TalkingMode = serde_json::from_str("\"Talking 1\"").unwrap();
        assert_eq!(mode, TalkingMode::Talking1);
    }
}
