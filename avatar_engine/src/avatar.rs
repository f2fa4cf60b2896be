//! 逐帧驱动
//!
//! `Avatar` 持有加载阶段创建的骨架、表情和混合器；
//! `AvatarDriver` 持有所有跨帧状态（上一帧滑条、播放时间窗口、脚本进度、视线目标），
//! 每帧由宿主渲染循环调用一次 `update`。
//!
//! 脚本模式下十个滑条都参与表情混合，angry/sad/happy 除了回拨动画也会写入表情。

use glam::Vec3;

use crate::animation::{
    retarget, AnimationMixer, AnimationStateCoordinator, ClipName, ScriptPlayer, SourceClip,
    TalkingMode, TalkingScript, VrmVersion,
};
use crate::config::{self, DriverConfig};
use crate::expression::{blend, Expression, ExpressionManager, ExpressionSliders};
use crate::humanoid::{rotate, AxisFlip, Humanoid, HumanoidBone};
use crate::tracking::{
    DriveMode, DrivingSignal, FaceRig, HandRig, HandSide, LiveRig, LookAt, PoseRig,
};
use crate::Result;

/// 已加载的虚拟形象
pub struct Avatar {
    pub humanoid: Humanoid,
    pub expressions: ExpressionManager,
    pub mixer: AnimationMixer,
    pub version: VrmVersion,
}

impl Avatar {
    pub fn new(humanoid: Humanoid, expressions: ExpressionManager, version: VrmVersion) -> Self {
        Self {
            humanoid,
            expressions,
            mixer: AnimationMixer::new(),
            version,
        }
    }

    /// 重定向 Mixamo 动画并注册到混合器
    pub fn load_clip(&mut self, source: &SourceClip, name: ClipName) -> Result<()> {
        let clip = retarget(source, &self.humanoid, name, self.version)?;
        self.mixer.register(clip);
        Ok(())
    }
}

/// 一帧的外部输入（全部只读）
#[derive(Clone, Debug, Default)]
pub struct FrameInputs {
    pub signal: DrivingSignal,
    pub sliders: ExpressionSliders,
    pub talking: TalkingMode,
    pub selection: ClipName,
    pub manual_override: Option<ClipName>,
}

/// 一帧的执行结果
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    pub mode: DriveMode,
    pub effective_clip: ClipName,
    pub active_clip: Option<ClipName>,
    /// 脚本驱动口型时的当前条目
    pub script_index: Option<usize>,
    /// 滑条变化导致动画回拨到的时间
    pub rewound_to: Option<f32>,
    pub expression_writes: usize,
    pub bones_driven: usize,
    pub missing_bones: usize,
}

impl FrameReport {
    fn new(mode: DriveMode, effective_clip: ClipName) -> Self {
        Self {
            mode,
            effective_clip,
            active_clip: None,
            script_index: None,
            rewound_to: None,
            expression_writes: 0,
            bones_driven: 0,
            missing_bones: 0,
        }
    }

    fn count_bone(&mut self, driven: bool) {
        if driven {
            self.bones_driven += 1;
        } else {
            self.missing_bones += 1;
        }
    }
}

/// 单个虚拟形象的逐帧驱动器
pub struct AvatarDriver {
    config: DriverConfig,
    coordinator: AnimationStateCoordinator,
    script: TalkingScript,
    player: ScriptPlayer,
    previous_sliders: Option<ExpressionSliders>,
    look_at: LookAt,
    last_mode: Option<DriveMode>,
}

impl AvatarDriver {
    /// 使用全局配置创建
    pub fn new() -> Self {
        Self::with_config(config::get_config())
    }

    pub fn with_config(config: DriverConfig) -> Self {
        Self {
            coordinator: AnimationStateCoordinator::new(config.time_window_len),
            config,
            script: TalkingScript::greeting(),
            player: ScriptPlayer::new(),
            previous_sliders: None,
            look_at: LookAt::default(),
            last_mode: None,
        }
    }

    /// 替换说话脚本，进度从头开始
    pub fn with_script(mut self, script: TalkingScript) -> Self {
        self.script = script;
        self.player.reset();
        self
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &AnimationStateCoordinator {
        &self.coordinator
    }

    pub fn script(&self) -> &TalkingScript {
        &self.script
    }

    pub fn script_player(&self) -> &ScriptPlayer {
        &self.player
    }

    pub fn look_at(&self) -> &LookAt {
        &self.look_at
    }

    /// 重新加载模型时清空所有跨帧状态
    pub fn reload(&mut self, avatar: &mut Avatar) {
        self.coordinator.reset(&mut avatar.mixer);
        self.player.reset();
        self.previous_sliders = None;
        self.look_at.reset();
        self.last_mode = None;
        avatar.expressions.reset_all();
        avatar.humanoid.reset_pose();
        log::info!("驱动状态已重置");
    }

    /// 推进一帧
    pub fn update(&mut self, avatar: &mut Avatar, inputs: &FrameInputs, delta_time: f32) -> FrameReport {
        let dt = if delta_time.is_finite() { delta_time.max(0.0) } else { 0.0 };
        let mode = inputs.signal.mode();

        if self.last_mode != Some(mode) {
            if self.last_mode.is_some() {
                log::debug!("驱动模式切换: {:?} -> {:?}", self.last_mode, mode);
            }
            self.player.reset();
            self.last_mode = Some(mode);
        }

        // 动画状态
        self.coordinator.set_selection(inputs.selection);
        self.coordinator.set_manual_override(inputs.manual_override);
        self.coordinator.sync(&mut avatar.mixer, mode);
        self.coordinator.observe(&avatar.mixer);

        let mut report = FrameReport::new(mode, self.coordinator.effective());

        let sliders_changed = match &self.previous_sliders {
            Some(previous) => inputs.sliders.changed_since(previous, self.config.change_epsilon),
            None => true,
        };
        if sliders_changed {
            report.rewound_to = self.coordinator.on_expression_input(&mut avatar.mixer);
            self.previous_sliders = Some(inputs.sliders);
        }

        match &inputs.signal {
            DrivingSignal::Live(rig) => self.drive_live(avatar, rig, dt, &mut report),
            DrivingSignal::Scripted => self.drive_scripted(avatar, inputs, dt, &mut report),
        }

        avatar.mixer.advance(dt, &mut avatar.humanoid);
        report.active_clip = self.coordinator.active();

        if self.config.debug_log {
            log::debug!(
                "帧: 模式={:?} 片段={:?} 脚本={:?} 表情写入={} 骨骼={} 缺失={}",
                report.mode,
                report.active_clip,
                report.script_index,
                report.expression_writes,
                report.bones_driven,
                report.missing_bones
            );
        }
        report
    }

    fn drive_scripted(
        &mut self,
        avatar: &mut Avatar,
        inputs: &FrameInputs,
        dt: f32,
        report: &mut FrameReport,
    ) {
        let overriding = if inputs.talking.drives_script() {
            let entry = self.player.tick(&self.script, dt);
            report.script_index = Some(self.player.index());
            Some(entry.as_override())
        } else {
            self.player.reset();
            None
        };

        let rate = dt * self.config.script_responsiveness;
        let epsilon = self.config.change_epsilon;
        let store = &mut avatar.expressions;
        for (expression, value) in inputs.sliders.values() {
            if blend(store, expression, value, overriding, rate, epsilon) {
                report.expression_writes += 1;
            }
        }

        // 脚本可能驱动滑条之外的表情
        if let Some(o) = overriding.filter(|o| !Expression::SLIDERS.contains(&o.expression)) {
            if blend(store, o.expression, o.value, None, rate, epsilon) {
                report.expression_writes += 1;
            }
        }
    }

    fn drive_live(&mut self, avatar: &mut Avatar, rig: &LiveRig, dt: f32, report: &mut FrameReport) {
        // 还没有解算结果的部分保持上一帧姿态
        if let Some(face) = &rig.face {
            self.drive_face(avatar, face, dt, report);
        }
        if let Some(pose) = &rig.pose {
            self.drive_pose(avatar, pose, dt, report);
        }
        for hand in [&rig.left_hand, &rig.right_hand].into_iter().flatten() {
            let pose_wrist_z = rig.pose.as_ref().map(|p| match hand.side {
                HandSide::Left => p.left_hand.z,
                HandSide::Right => p.right_hand.z,
            });
            self.drive_hand(avatar, hand, pose_wrist_z, dt, report);
        }
    }

    fn drive_face(&mut self, avatar: &mut Avatar, face: &FaceRig, dt: f32, report: &mut FrameReport) {
        let rate = dt * self.config.face_responsiveness;
        let epsilon = self.config.change_epsilon;
        let targets = [
            (Expression::Aa, face.mouth.a),
            (Expression::Ih, face.mouth.i),
            (Expression::Ee, face.mouth.e),
            (Expression::Oh, face.mouth.o),
            (Expression::Ou, face.mouth.u),
            (Expression::BlinkLeft, 1.0 - face.eye.l),
            (Expression::BlinkRight, 1.0 - face.eye.r),
        ];
        for (expression, target) in targets {
            if blend(&mut avatar.expressions, expression, target, None, rate, epsilon) {
                report.expression_writes += 1;
            }
        }

        self.look_at.update(
            face.pupil,
            self.config.look_at_scale,
            dt * self.config.look_at_responsiveness,
        );

        let driven = rotate(
            &mut avatar.humanoid,
            HumanoidBone::Neck,
            face.head,
            dt * self.config.body_responsiveness,
            AxisFlip::uniform(self.config.neck_flip),
        );
        report.count_bone(driven);
    }

    fn drive_pose(&self, avatar: &mut Avatar, pose: &PoseRig, dt: f32, report: &mut FrameReport) {
        let rate = dt * self.config.body_responsiveness;
        let spine_flip = AxisFlip::uniform(self.config.spine_flip);
        let drives = [
            (HumanoidBone::Chest, pose.spine, spine_flip),
            (HumanoidBone::Spine, pose.spine, spine_flip),
            (HumanoidBone::Hips, pose.hips_rotation, AxisFlip::uniform(self.config.hips_flip)),
            (HumanoidBone::LeftUpperArm, pose.left_upper_arm, AxisFlip::IDENTITY),
            (HumanoidBone::LeftLowerArm, pose.left_lower_arm, AxisFlip::IDENTITY),
            (HumanoidBone::RightUpperArm, pose.right_upper_arm, AxisFlip::IDENTITY),
            (HumanoidBone::RightLowerArm, pose.right_lower_arm, AxisFlip::IDENTITY),
        ];
        for (bone, euler, flip) in drives {
            report.count_bone(rotate(&mut avatar.humanoid, bone, euler, rate, flip));
        }
    }

    fn drive_hand(
        &self,
        avatar: &mut Avatar,
        hand: &HandRig,
        pose_wrist_z: Option<f32>,
        dt: f32,
        report: &mut FrameReport,
    ) {
        let rate = dt * self.config.hand_responsiveness;

        // 手腕的 z 来自身体解算，x/y 来自手部解算
        let wrist = Vec3::new(hand.wrist.x, hand.wrist.y, pose_wrist_z.unwrap_or(hand.wrist.z));
        report.count_bone(rotate(
            &mut avatar.humanoid,
            hand.wrist_bone(),
            wrist,
            rate,
            AxisFlip::IDENTITY,
        ));

        for (finger, segment, euler) in &hand.fingers {
            let bone = HandRig::humanoid_bone(hand.side, *finger, *segment);
            report.count_bone(rotate(&mut avatar.humanoid, bone, *euler, rate, AxisFlip::IDENTITY));
        }
    }
}

impl Default for AvatarDriver {
    fn default() -> Self {
        Self::new()
    }
}
