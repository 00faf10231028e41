//! # Animation Primitives
//!
//! Easing curves, keyframed tweens and per-component animation state.
//!
//! ## Responsibilities
//! - **Easing**: `EasingType` wraps the `keyframe` curves and adds the power
//!   and elastic curves used by the entrance and cursor effects.
//! - **Timed tweens**: `Animated<T>` builds a `keyframe::AnimationSequence`;
//!   `Tween<T>` retargets it mid-flight; `Playhead` plays it forward or back.
//! - **Smoothing**: `AnimationState<V>` chases a target with
//!   `current += (target - current) * factor`.

use glam::Vec2;
use keyframe::{AnimationSequence, CanTween, EasingFunction, Keyframe};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::KineticError;

/// Easing curves addressable by name (`"power3.out"`, `"elastic.out(1, 0.3)"`).
///
/// Power curves follow the common naming where `power1` is quadratic, so the
/// exponent is `n + 1`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EasingType {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    PowerIn(u8),
    PowerOut(u8),
    PowerInOut(u8),
    ElasticOut { amplitude: f32, period: f32 },
}

impl Default for EasingType {
    fn default() -> Self {
        EasingType::PowerOut(3)
    }
}

impl EasingFunction for EasingType {
    fn y(&self, x: f64) -> f64 {
        match *self {
            EasingType::Linear => keyframe::functions::Linear.y(x),
            EasingType::EaseIn => keyframe::functions::EaseIn.y(x),
            EasingType::EaseOut => keyframe::functions::EaseOut.y(x),
            EasingType::EaseInOut => keyframe::functions::EaseInOut.y(x),
            EasingType::PowerIn(n) => x.powi(n as i32 + 1),
            EasingType::PowerOut(n) => 1.0 - (1.0 - x).powi(n as i32 + 1),
            EasingType::PowerInOut(n) => {
                let k = n as i32 + 1;
                if x < 0.5 {
                    (2.0 * x).powi(k) / 2.0
                } else {
                    1.0 - (2.0 * (1.0 - x)).powi(k) / 2.0
                }
            }
            EasingType::ElasticOut { amplitude, period } => elastic_out(x, amplitude, period),
        }
    }
}

impl EasingType {
    /// `elastic.out(1, 0.3)`: the press-release spring of the cursor.
    pub const ELASTIC: EasingType = EasingType::ElasticOut {
        amplitude: 1.0,
        period: 0.3,
    };

    pub fn eval(&self, x: f32) -> f32 {
        self.y(x.clamp(0.0, 1.0) as f64) as f32
    }
}

fn elastic_out(x: f64, amplitude: f32, period: f32) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let amplitude = (amplitude as f64).max(1.0);
    let period = (period as f64).max(1e-3);
    let tau = std::f64::consts::TAU;
    let shift = period / tau * (1.0 / amplitude).asin();
    amplitude * 2f64.powf(-10.0 * x) * ((x - shift) * tau / period).sin() + 1.0
}

impl fmt::Display for EasingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EasingType::Linear => write!(f, "linear"),
            EasingType::EaseIn => write!(f, "ease_in"),
            EasingType::EaseOut => write!(f, "ease_out"),
            EasingType::EaseInOut => write!(f, "ease_in_out"),
            EasingType::PowerIn(n) => write!(f, "power{n}.in"),
            EasingType::PowerOut(n) => write!(f, "power{n}.out"),
            EasingType::PowerInOut(n) => write!(f, "power{n}.inOut"),
            EasingType::ElasticOut { amplitude, period } => {
                write!(f, "elastic.out({amplitude}, {period})")
            }
        }
    }
}

impl FromStr for EasingType {
    type Err = KineticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        match name {
            "linear" | "none" => return Ok(EasingType::Linear),
            "ease_in" | "ease-in" => return Ok(EasingType::EaseIn),
            "ease_out" | "ease-out" => return Ok(EasingType::EaseOut),
            "ease_in_out" | "ease-in-out" => return Ok(EasingType::EaseInOut),
            "elastic.out" | "elastic" => return Ok(EasingType::ELASTIC),
            _ => {}
        }

        if let Some(args) = name
            .strip_prefix("elastic.out(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let mut parts = args.split(',').map(|p| p.trim().parse::<f32>());
            return match (parts.next(), parts.next(), parts.next()) {
                (Some(Ok(amplitude)), Some(Ok(period)), None) => {
                    Ok(EasingType::ElasticOut { amplitude, period })
                }
                _ => Err(KineticError::invalid(format!("bad elastic easing `{name}`"))),
            };
        }

        if let Some(rest) = name.strip_prefix("power") {
            let (level, variant) = rest.split_once('.').unwrap_or((rest, "out"));
            let level: u8 = level
                .parse()
                .map_err(|_| KineticError::invalid(format!("bad power easing `{name}`")))?;
            if !(1..=4).contains(&level) {
                return Err(KineticError::invalid(format!(
                    "power easing level must be 1..=4, got {level}"
                )));
            }
            return match variant {
                "in" => Ok(EasingType::PowerIn(level)),
                "out" => Ok(EasingType::PowerOut(level)),
                "inOut" | "in_out" => Ok(EasingType::PowerInOut(level)),
                _ => Err(KineticError::invalid(format!("bad power easing `{name}`"))),
            };
        }

        Err(KineticError::invalid(format!("unknown easing `{name}`")))
    }
}

impl TryFrom<String> for EasingType {
    type Error = KineticError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EasingType> for String {
    fn from(value: EasingType) -> Self {
        value.to_string()
    }
}

/// A keyframed value backed by `keyframe::AnimationSequence`.
#[derive(Clone)]
pub struct Animated<T>
where
    T: Clone + CanTween + Default,
{
    pub raw_keyframes: Vec<(T, f64, EasingType)>,
    pub sequence: AnimationSequence<T>,
    pub current_value: T,
}

impl<T> Animated<T>
where
    T: Clone + CanTween + Default,
{
    pub fn new(initial: T) -> Self {
        let raw = vec![(initial.clone(), 0.0, EasingType::Linear)];
        let kf = Keyframe::new(initial.clone(), 0.0, EasingType::Linear);

        Self {
            sequence: AnimationSequence::from(vec![kf]),
            raw_keyframes: raw,
            current_value: initial,
        }
    }

    /// A single `from -> to` segment. Non-positive durations jump to `to`.
    pub fn tween(from: T, to: T, duration: f64, easing: EasingType) -> Self {
        if duration <= 0.0 {
            return Self::new(to);
        }
        let mut anim = Self::new(from);
        anim.add_keyframe(to, duration, easing);
        anim
    }

    pub fn add_keyframe(&mut self, target: T, duration: f64, easing: EasingType) {
        let new_time = self.sequence.duration() + duration.max(0.0);

        // keyframe eases a segment with the function of its starting frame.
        if let Some(last) = self.raw_keyframes.last_mut() {
            last.2 = easing;
        }
        self.raw_keyframes.push((target, new_time, EasingType::Linear));

        let frames: Vec<Keyframe<T>> = self
            .raw_keyframes
            .iter()
            .map(|(val, time, ease_type)| Keyframe::new(val.clone(), *time, *ease_type))
            .collect();

        self.sequence = AnimationSequence::from(frames);
    }

    pub fn duration(&self) -> f64 {
        self.sequence.duration()
    }

    pub fn update(&mut self, time: f64) -> &T {
        self.sequence.advance_to(time.clamp(0.0, self.duration()));
        self.current_value = self.sequence.now();
        &self.current_value
    }

    pub fn value(&self) -> &T {
        &self.current_value
    }

    /// The value the sequence settles on.
    pub fn end_value(&self) -> T {
        self.raw_keyframes
            .last()
            .map(|(value, _, _)| value.clone())
            .unwrap_or_else(|| self.current_value.clone())
    }
}

impl<T> fmt::Debug for Animated<T>
where
    T: Clone + CanTween + Default + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animated")
            .field("current_value", &self.current_value)
            .finish()
    }
}

/// A retargetable "tween to" that always starts from wherever the value is
/// now, so a new target overwrites the running one without a jump.
#[derive(Clone, Debug)]
pub struct Tween<T>
where
    T: Clone + CanTween + Default + fmt::Debug,
{
    anim: Animated<T>,
    started_at: f64,
}

impl<T> Tween<T>
where
    T: Clone + CanTween + Default + fmt::Debug,
{
    pub fn settled(value: T) -> Self {
        Self {
            anim: Animated::new(value),
            started_at: 0.0,
        }
    }

    pub fn to(&mut self, now: f64, target: T, duration: f64, easing: EasingType) {
        let from = self.sample(now);
        self.anim = Animated::tween(from, target, duration, easing);
        self.started_at = now;
    }

    pub fn sample(&mut self, now: f64) -> T {
        let local = (now - self.started_at).max(0.0);
        self.anim.update(local).clone()
    }

    pub fn target(&self) -> T {
        self.anim.end_value()
    }

    pub fn is_done(&self, now: f64) -> bool {
        now - self.started_at >= self.anim.duration()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayDirection {
    Forward,
    Reverse,
    Paused,
}

/// Time cursor for a reversible timeline. The start delay only applies to
/// forward play; reversing runs straight back to zero.
#[derive(Clone, Debug)]
pub struct Playhead {
    pub time: f64,
    pub duration: f64,
    pub delay: f64,
    delay_left: f64,
    direction: PlayDirection,
}

impl Playhead {
    pub fn new(duration: f64, delay: f64) -> Self {
        Self {
            time: 0.0,
            duration: duration.max(0.0),
            delay: delay.max(0.0),
            delay_left: 0.0,
            direction: PlayDirection::Paused,
        }
    }

    pub fn play(&mut self) {
        if self.direction != PlayDirection::Forward {
            self.delay_left = if self.time <= 0.0 { self.delay } else { 0.0 };
            self.direction = PlayDirection::Forward;
        }
    }

    pub fn reverse(&mut self) {
        self.direction = PlayDirection::Reverse;
        self.delay_left = 0.0;
    }

    pub fn direction(&self) -> PlayDirection {
        self.direction
    }

    /// Move the cursor by `dt` seconds and return the new time.
    pub fn advance(&mut self, dt: f64) -> f64 {
        let dt = dt.max(0.0);
        match self.direction {
            PlayDirection::Forward => {
                let consumed = dt.min(self.delay_left);
                self.delay_left -= consumed;
                self.time = (self.time + dt - consumed).min(self.duration);
                if self.time >= self.duration {
                    self.direction = PlayDirection::Paused;
                }
            }
            PlayDirection::Reverse => {
                self.time = (self.time - dt).max(0.0);
                if self.time <= 0.0 {
                    self.direction = PlayDirection::Paused;
                }
            }
            PlayDirection::Paused => {}
        }
        self.time
    }

    pub fn is_running(&self) -> bool {
        self.direction != PlayDirection::Paused
    }

    pub fn is_complete(&self) -> bool {
        self.time >= self.duration && self.direction == PlayDirection::Paused
    }
}

/// Values that can be chased by exponential smoothing.
pub trait Lerp: Copy {
    fn lerp_toward(self, target: Self, t: f32) -> Self;
    fn distance_to(self, other: Self) -> f32;
}

impl Lerp for f32 {
    fn lerp_toward(self, target: Self, t: f32) -> Self {
        self + (target - self) * t
    }

    fn distance_to(self, other: Self) -> f32 {
        (self - other).abs()
    }
}

impl Lerp for Vec2 {
    fn lerp_toward(self, target: Self, t: f32) -> Self {
        self.lerp(target, t)
    }

    fn distance_to(self, other: Self) -> f32 {
        self.distance(other)
    }
}

/// Per-component animation state. Owned by exactly one mounted component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationState<V> {
    pub current: V,
    pub target: V,
    pub last_sample_at: Option<f64>,
}

impl<V: Lerp> AnimationState<V> {
    pub fn new(value: V) -> Self {
        Self {
            current: value,
            target: value,
            last_sample_at: None,
        }
    }

    pub fn retarget(&mut self, target: V, now: f64) {
        self.target = target;
        self.last_sample_at = Some(now);
    }

    /// One smoothing step. `factor` is clamped into `[0, 1]`, so the value
    /// never passes the target.
    pub fn smooth(&mut self, factor: f32) -> V {
        self.current = exp_smooth(self.current, self.target, factor);
        self.current
    }

    pub fn snap(&mut self) -> V {
        self.current = self.target;
        self.current
    }

    pub fn is_settled(&self, epsilon: f32) -> bool {
        self.current.distance_to(self.target) <= epsilon
    }
}

/// `current + (target - current) * factor`
pub fn exp_smooth<V: Lerp>(current: V, target: V, factor: f32) -> V {
    current.lerp_toward(target, factor.clamp(0.0, 1.0))
}

/// Frame-rate independent smoothing factor for a lag expressed in seconds.
pub fn lag_factor(dt: f64, lag: f64) -> f32 {
    if lag <= 0.0 {
        1.0
    } else {
        (1.0 - (-dt.max(0.0) / lag).exp()) as f32
    }
}
