//! Flat parameter table shared by every voice.
//!
//! A [`Patch`] holds one [`OperatorParams`] per operator plus the
//! [`GlobalParams`]. Control surfaces address single values through a
//! [`ParamKey`] (`operator index + parameter name`) or a [`GlobalParam`];
//! every write is clamped to the parameter's valid range, never rejected.

use std::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::{oscillator::OscillatorWaveform, ramp::RampShape},
    error::Error,
    CARRIER_COUNT, MAX_DELAY_TAPS, OPERATOR_COUNT,
};

/// Feedback ceiling for a single delay tap.
const MAX_TAP_FEEDBACK: f32 = 0.95;
/// Largest accepted pitch bend range, in semitones.
const MAX_BEND_RANGE: f32 = 48.0;

// -------------------------------------------------------------------------------------------------

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    /// Seconds from the current level to 1.0.
    pub attack: f32,
    /// Seconds from 1.0 to the sustain level.
    pub decay: f32,
    /// Level held while the gate is on (0.0 to 1.0).
    pub sustain: f32,
    /// Seconds from the current level to 0.0 after the gate closes.
    pub release: f32,
}

impl EnvelopeParams {
    pub const fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self::new(0.01, 0.1, 0.5, 0.3)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampParams {
    pub start: f32,
    pub end: f32,
    /// Seconds from `start` to `end`.
    pub time: f32,
    pub shape: RampShape,
}

impl RampParams {
    /// A ramp that holds `value` for its whole life.
    pub const fn flat(value: f32) -> Self {
        Self {
            start: value,
            end: value,
            time: 1.0,
            shape: RampShape::Linear,
        }
    }
}

impl Default for RampParams {
    fn default() -> Self {
        Self::flat(1.0)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TapParams {
    /// Seconds behind the input.
    pub time: f32,
    /// Share of the tap written back into the line.
    pub feedback: f32,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayParams {
    /// Taps in use on each side (0 to `MAX_DELAY_TAPS`).
    pub taps: usize,
    pub left: [TapParams; MAX_DELAY_TAPS],
    pub right: [TapParams; MAX_DELAY_TAPS],
    /// Wet/dry balance: 0.0 is dry only, 1.0 wet only.
    pub mix: f32,
}

impl Default for DelayParams {
    fn default() -> Self {
        let tap = |time| TapParams {
            time,
            feedback: 0.3,
        };
        Self {
            taps: 3,
            left: [tap(0.15), tap(0.35), tap(0.55), tap(0.75)],
            right: [tap(0.2), tap(0.4), tap(0.6), tap(0.8)],
            mix: 0.3,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanParams {
    /// Resting position, 0.0 hard left to 1.0 hard right.
    pub center: f32,
    /// LFO rate in Hz.
    pub rate: f32,
    /// Sweep width around `center` (0.0 to 1.0).
    pub depth: f32,
}

impl Default for PanParams {
    fn default() -> Self {
        Self {
            center: 0.5,
            rate: 0.25,
            depth: 0.5,
        }
    }
}

/// Everything one operator needs, across all voices.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatorParams {
    pub waveform: OscillatorWaveform,
    /// Frequency relative to the voice fundamental.
    pub ratio: f32,
    /// Static offset in Hz, added after the ratio.
    pub offset: f32,
    /// Gain applied to the summed incoming modulation.
    pub index: f32,
    /// Gain applied to the operator's own previous output.
    pub feedback: f32,
    /// Initial phase as a fraction of a cycle.
    pub phase: f32,
    /// Output level.
    pub level: f32,
    /// Seconds between the voice gate and this operator's envelopes.
    pub trigger_delay: f32,
    pub amp_env: EnvelopeParams,
    pub freq_env: EnvelopeParams,
    /// Frequency multiplier at full frequency envelope: `1 + depth * env`.
    pub freq_env_depth: f32,
    pub freq_ramp: RampParams,
    pub amp_ramp: RampParams,
    /// Echo applied to carriers only.
    pub delay: DelayParams,
    /// Auto-pan applied to carriers only.
    pub pan: PanParams,
}

impl OperatorParams {
    /// Defaults for an operator that only modulates.
    pub fn modulator(ratio: f32, index: f32) -> Self {
        Self {
            waveform: OscillatorWaveform::Sine,
            ratio,
            offset: 0.0,
            index,
            feedback: 0.0,
            phase: 0.0,
            level: 1.0,
            trigger_delay: 0.0,
            amp_env: EnvelopeParams::new(0.01, 0.1, 0.5, 0.3),
            freq_env: EnvelopeParams::new(0.01, 0.1, 0.5, 0.3),
            freq_env_depth: 0.0,
            freq_ramp: RampParams::flat(1.0),
            amp_ramp: RampParams::flat(1.0),
            delay: DelayParams::default(),
            pan: PanParams::default(),
        }
    }

    /// Defaults for an audible operator.
    pub fn carrier(ratio: f32, index: f32, pan_rate: f32) -> Self {
        Self {
            level: 0.3,
            amp_env: EnvelopeParams::new(0.01, 0.1, 0.8, 0.5),
            pan: PanParams {
                rate: pan_rate,
                ..PanParams::default()
            },
            ..Self::modulator(ratio, index)
        }
    }

    pub fn get(&self, param: OperatorParam) -> f32 {
        use OperatorParam::*;
        match param {
            Waveform => self.waveform.to_value(),
            Ratio => self.ratio,
            Offset => self.offset,
            Index => self.index,
            Feedback => self.feedback,
            Phase => self.phase,
            Level => self.level,
            TriggerDelay => self.trigger_delay,
            AmpAttack => self.amp_env.attack,
            AmpDecay => self.amp_env.decay,
            AmpSustain => self.amp_env.sustain,
            AmpRelease => self.amp_env.release,
            FreqAttack => self.freq_env.attack,
            FreqDecay => self.freq_env.decay,
            FreqSustain => self.freq_env.sustain,
            FreqRelease => self.freq_env.release,
            FreqEnvDepth => self.freq_env_depth,
            FreqRampStart => self.freq_ramp.start,
            FreqRampEnd => self.freq_ramp.end,
            FreqRampTime => self.freq_ramp.time,
            FreqRampShape => self.freq_ramp.shape.to_value(),
            AmpRampStart => self.amp_ramp.start,
            AmpRampEnd => self.amp_ramp.end,
            AmpRampTime => self.amp_ramp.time,
            AmpRampShape => self.amp_ramp.shape.to_value(),
            DelayTaps => self.delay.taps as f32,
            DelayMix => self.delay.mix,
            DelayTime { side, tap } => self.taps(side)[tap.min(MAX_DELAY_TAPS - 1)].time,
            DelayFeedback { side, tap } => {
                self.taps(side)[tap.min(MAX_DELAY_TAPS - 1)].feedback
            }
            PanCenter => self.pan.center,
            PanRate => self.pan.rate,
            PanDepth => self.pan.depth,
        }
    }

    /// Write one value, clamped to the parameter's range.
    ///
    /// Non-finite values leave the parameter unchanged.
    pub fn set(&mut self, param: OperatorParam, value: f32) {
        use OperatorParam::*;
        if !value.is_finite() {
            return;
        }
        let non_negative = value.max(0.0);
        let unit = value.clamp(0.0, 1.0);
        match param {
            Waveform => self.waveform = OscillatorWaveform::from_value(value),
            Ratio => self.ratio = non_negative,
            Offset => self.offset = value,
            Index => self.index = non_negative,
            Feedback => self.feedback = non_negative,
            Phase => self.phase = value.rem_euclid(1.0),
            Level => self.level = non_negative,
            TriggerDelay => self.trigger_delay = non_negative,
            AmpAttack => self.amp_env.attack = non_negative,
            AmpDecay => self.amp_env.decay = non_negative,
            AmpSustain => self.amp_env.sustain = unit,
            AmpRelease => self.amp_env.release = non_negative,
            FreqAttack => self.freq_env.attack = non_negative,
            FreqDecay => self.freq_env.decay = non_negative,
            FreqSustain => self.freq_env.sustain = unit,
            FreqRelease => self.freq_env.release = non_negative,
            FreqEnvDepth => self.freq_env_depth = value,
            FreqRampStart => self.freq_ramp.start = value,
            FreqRampEnd => self.freq_ramp.end = value,
            FreqRampTime => self.freq_ramp.time = non_negative,
            FreqRampShape => self.freq_ramp.shape = RampShape::from_value(value),
            AmpRampStart => self.amp_ramp.start = value,
            AmpRampEnd => self.amp_ramp.end = value,
            AmpRampTime => self.amp_ramp.time = non_negative,
            AmpRampShape => self.amp_ramp.shape = RampShape::from_value(value),
            DelayTaps => self.delay.taps = (value.round().max(0.0) as usize).min(MAX_DELAY_TAPS),
            DelayMix => self.delay.mix = unit,
            DelayTime { side, tap } => {
                self.taps_mut(side)[tap.min(MAX_DELAY_TAPS - 1)].time = non_negative
            }
            DelayFeedback { side, tap } => {
                self.taps_mut(side)[tap.min(MAX_DELAY_TAPS - 1)].feedback =
                    value.clamp(0.0, MAX_TAP_FEEDBACK)
            }
            PanCenter => self.pan.center = unit,
            PanRate => self.pan.rate = non_negative,
            PanDepth => self.pan.depth = unit,
        }
    }

    fn taps(&self, side: DelaySide) -> &[TapParams; MAX_DELAY_TAPS] {
        match side {
            DelaySide::Left => &self.delay.left,
            DelaySide::Right => &self.delay.right,
        }
    }

    fn taps_mut(&mut self, side: DelaySide) -> &mut [TapParams; MAX_DELAY_TAPS] {
        match side {
            DelaySide::Left => &mut self.delay.left,
            DelaySide::Right => &mut self.delay.right,
        }
    }
}

impl Default for OperatorParams {
    fn default() -> Self {
        Self::modulator(1.0, 0.0)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalParams {
    /// Gain applied to the summed output of all voices.
    pub master_gain: f32,
    /// Scales every operator's modulation index.
    pub modulation_gain: f32,
    /// Carrier gain at full pressure: `1 + depth * pressure²`.
    pub pressure_depth: f32,
    /// Pitch bend range in semitones.
    pub bend_range: f32,
}

impl GlobalParams {
    pub fn get(&self, param: GlobalParam) -> f32 {
        match param {
            GlobalParam::MasterGain => self.master_gain,
            GlobalParam::ModulationGain => self.modulation_gain,
            GlobalParam::PressureDepth => self.pressure_depth,
            GlobalParam::BendRange => self.bend_range,
        }
    }

    pub fn set(&mut self, param: GlobalParam, value: f32) {
        if !value.is_finite() {
            return;
        }
        match param {
            GlobalParam::MasterGain => self.master_gain = value.max(0.0),
            GlobalParam::ModulationGain => self.modulation_gain = value.max(0.0),
            GlobalParam::PressureDepth => self.pressure_depth = value.max(0.0),
            GlobalParam::BendRange => self.bend_range = value.clamp(0.0, MAX_BEND_RANGE),
        }
    }
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            master_gain: 1.0,
            modulation_gain: 1.0,
            pressure_depth: 2.0,
            bend_range: 2.0,
        }
    }
}

/// The complete parameter table.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub operators: [OperatorParams; OPERATOR_COUNT],
    pub globals: GlobalParams,
}

impl Patch {
    /// Patch in which every operator is an unmodulated sine at `ratio` 1.
    pub fn pure_sines() -> Self {
        let mut patch = Self::default();
        for op in patch.operators.iter_mut() {
            op.index = 0.0;
            op.feedback = 0.0;
            op.freq_env_depth = 0.0;
        }
        patch
    }

    pub fn operator(&self, index: usize) -> Option<&OperatorParams> {
        self.operators.get(index)
    }

    pub fn get(&self, key: ParamKey) -> f32 {
        self.operators
            .get(key.operator())
            .map_or(0.0, |op| op.get(key.param()))
    }

    /// Runs on the audio thread: a key that addresses no operator is ignored.
    pub fn set(&mut self, key: ParamKey, value: f32) {
        if let Some(op) = self.operators.get_mut(key.operator()) {
            op.set(key.param(), value);
        }
    }

    pub fn get_global(&self, param: GlobalParam) -> f32 {
        self.globals.get(param)
    }

    pub fn set_global(&mut self, param: GlobalParam, value: f32) {
        self.globals.set(param, value);
    }
}

impl Default for Patch {
    fn default() -> Self {
        let carrier_rates: [f32; CARRIER_COUNT] = [0.13, 0.17, 0.23, 0.29];
        Self {
            operators: [
                OperatorParams::modulator(1.0, 0.0),
                OperatorParams::modulator(2.0, 0.8),
                OperatorParams::modulator(3.0, 0.6),
                OperatorParams::carrier(1.0, 0.5, carrier_rates[0]),
                OperatorParams::carrier(1.0, 0.4, carrier_rates[1]),
                OperatorParams::carrier(2.0, 0.3, carrier_rates[2]),
                OperatorParams::carrier(0.5, 0.2, carrier_rates[3]),
            ],
            globals: GlobalParams::default(),
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelaySide {
    Left,
    Right,
}

/// One addressable per-operator value.
///
/// Names are lowercase with underscores (`"ratio"`, `"amp_attack"`,
/// `"freq_ramp_end"`). Delay taps are numbered from 1 in names:
/// `"delay_l2_time"` is the second left tap, stored as `tap: 1`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorParam {
    Waveform,
    Ratio,
    Offset,
    Index,
    Feedback,
    Phase,
    Level,
    TriggerDelay,
    AmpAttack,
    AmpDecay,
    AmpSustain,
    AmpRelease,
    FreqAttack,
    FreqDecay,
    FreqSustain,
    FreqRelease,
    FreqEnvDepth,
    FreqRampStart,
    FreqRampEnd,
    FreqRampTime,
    FreqRampShape,
    AmpRampStart,
    AmpRampEnd,
    AmpRampTime,
    AmpRampShape,
    DelayTaps,
    DelayMix,
    DelayTime { side: DelaySide, tap: usize },
    DelayFeedback { side: DelaySide, tap: usize },
    PanCenter,
    PanRate,
    PanDepth,
}

const SIMPLE_PARAMS: [(&str, OperatorParam); 30] = [
    ("waveform", OperatorParam::Waveform),
    ("ratio", OperatorParam::Ratio),
    ("offset", OperatorParam::Offset),
    ("index", OperatorParam::Index),
    ("feedback", OperatorParam::Feedback),
    ("phase", OperatorParam::Phase),
    ("level", OperatorParam::Level),
    ("trigger_delay", OperatorParam::TriggerDelay),
    ("amp_attack", OperatorParam::AmpAttack),
    ("amp_decay", OperatorParam::AmpDecay),
    ("amp_sustain", OperatorParam::AmpSustain),
    ("amp_release", OperatorParam::AmpRelease),
    ("freq_attack", OperatorParam::FreqAttack),
    ("freq_decay", OperatorParam::FreqDecay),
    ("freq_sustain", OperatorParam::FreqSustain),
    ("freq_release", OperatorParam::FreqRelease),
    ("freq_env_depth", OperatorParam::FreqEnvDepth),
    ("freq_ramp_start", OperatorParam::FreqRampStart),
    ("freq_ramp_end", OperatorParam::FreqRampEnd),
    ("freq_ramp_time", OperatorParam::FreqRampTime),
    ("freq_ramp_shape", OperatorParam::FreqRampShape),
    ("amp_ramp_start", OperatorParam::AmpRampStart),
    ("amp_ramp_end", OperatorParam::AmpRampEnd),
    ("amp_ramp_time", OperatorParam::AmpRampTime),
    ("amp_ramp_shape", OperatorParam::AmpRampShape),
    ("delay_taps", OperatorParam::DelayTaps),
    ("delay_mix", OperatorParam::DelayMix),
    ("pan_center", OperatorParam::PanCenter),
    ("pan_rate", OperatorParam::PanRate),
    ("pan_depth", OperatorParam::PanDepth),
];

impl OperatorParam {
    /// True for parameters that only affect the delay and panner of carriers.
    pub fn is_spatial(self) -> bool {
        matches!(
            self,
            OperatorParam::DelayTaps
                | OperatorParam::DelayMix
                | OperatorParam::DelayTime { .. }
                | OperatorParam::DelayFeedback { .. }
                | OperatorParam::PanCenter
                | OperatorParam::PanRate
                | OperatorParam::PanDepth
        )
    }
}

impl FromStr for OperatorParam {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if let Some((_, param)) = SIMPLE_PARAMS.iter().find(|(n, _)| *n == name) {
            return Ok(*param);
        }
        parse_delay_tap(name).ok_or_else(|| Error::UnknownParameter(name.to_string()))
    }
}

/// Parse `delay_<l|r><tap>_<time|feedback>`.
fn parse_delay_tap(name: &str) -> Option<OperatorParam> {
    let rest = name.strip_prefix("delay_")?;
    let (tap, field) = rest.split_once('_')?;
    let mut chars = tap.chars();
    let side = match chars.next()? {
        'l' => DelaySide::Left,
        'r' => DelaySide::Right,
        _ => return None,
    };
    let number: usize = chars.as_str().parse().ok()?;
    if number == 0 || number > MAX_DELAY_TAPS {
        return None;
    }
    let tap = number - 1;
    match field {
        "time" => Some(OperatorParam::DelayTime { side, tap }),
        "feedback" => Some(OperatorParam::DelayFeedback { side, tap }),
        _ => None,
    }
}

impl fmt::Display for OperatorParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side_name = |side: &DelaySide| match side {
            DelaySide::Left => 'l',
            DelaySide::Right => 'r',
        };
        match self {
            OperatorParam::DelayTime { side, tap } => {
                write!(f, "delay_{}{}_time", side_name(side), tap + 1)
            }
            OperatorParam::DelayFeedback { side, tap } => {
                write!(f, "delay_{}{}_feedback", side_name(side), tap + 1)
            }
            other => {
                let name = SIMPLE_PARAMS
                    .iter()
                    .find(|(_, param)| param == other)
                    .map_or("unknown", |(name, _)| name);
                f.write_str(name)
            }
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalParam {
    MasterGain,
    ModulationGain,
    PressureDepth,
    BendRange,
}

impl GlobalParam {
    pub const ALL: [GlobalParam; 4] = [
        GlobalParam::MasterGain,
        GlobalParam::ModulationGain,
        GlobalParam::PressureDepth,
        GlobalParam::BendRange,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GlobalParam::MasterGain => "master_gain",
            GlobalParam::ModulationGain => "modulation_gain",
            GlobalParam::PressureDepth => "pressure_depth",
            GlobalParam::BendRange => "bend_range",
        }
    }
}

impl FromStr for GlobalParam {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|param| param.name() == name)
            .ok_or_else(|| Error::UnknownParameter(name.to_string()))
    }
}

impl fmt::Display for GlobalParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Address of one per-operator value in the table.
///
/// Only [`ParamKey::new`] and [`ParamKey::parse`] build keys, so the operator
/// index is always in range. Deserialized keys go through the same check.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(
        try_from = "(usize, OperatorParam)",
        into = "(usize, OperatorParam)"
    )
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamKey {
    operator: usize,
    param: OperatorParam,
}

impl ParamKey {
    pub fn new(operator: usize, param: OperatorParam) -> Result<Self, Error> {
        if operator >= OPERATOR_COUNT {
            return Err(Error::InvalidOperator(operator));
        }
        Ok(Self { operator, param })
    }

    /// Build a key from an operator index and a parameter name.
    pub fn parse(operator: usize, name: &str) -> Result<Self, Error> {
        Self::new(operator, name.parse()?)
    }

    /// 0-based operator index (OP1 is 0).
    pub fn operator(&self) -> usize {
        self.operator
    }

    pub fn param(&self) -> OperatorParam {
        self.param
    }
}

impl TryFrom<(usize, OperatorParam)> for ParamKey {
    type Error = Error;

    fn try_from((operator, param): (usize, OperatorParam)) -> Result<Self, Error> {
        Self::new(operator, param)
    }
}

impl From<ParamKey> for (usize, OperatorParam) {
    fn from(key: ParamKey) -> Self {
        (key.operator, key.param)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip() {
        for (name, param) in SIMPLE_PARAMS {
            assert_eq!(name.parse::<OperatorParam>(), Ok(param));
            assert_eq!(param.to_string(), name);
        }
        for global in GlobalParam::ALL {
            assert_eq!(global.to_string().parse::<GlobalParam>(), Ok(global));
        }
    }

    #[test]
    fn delay_tap_names() {
        assert_eq!(
            "delay_l2_time".parse::<OperatorParam>(),
            Ok(OperatorParam::DelayTime {
                side: DelaySide::Left,
                tap: 1
            })
        );
        assert_eq!(
            "delay_r4_feedback".parse::<OperatorParam>(),
            Ok(OperatorParam::DelayFeedback {
                side: DelaySide::Right,
                tap: 3
            })
        );
        let param = OperatorParam::DelayTime {
            side: DelaySide::Right,
            tap: 0,
        };
        assert_eq!(param.to_string(), "delay_r1_time");

        for bad in ["delay_l0_time", "delay_l5_time", "delay_x1_time", "delay_l1_gain"] {
            assert!(bad.parse::<OperatorParam>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn unknown_names_are_errors() {
        assert_eq!(
            "wobble".parse::<OperatorParam>(),
            Err(Error::UnknownParameter("wobble".into()))
        );
        assert!("volume".parse::<GlobalParam>().is_err());
    }

    #[test]
    fn operator_index_is_validated() {
        assert!(ParamKey::parse(6, "ratio").is_ok());
        assert_eq!(ParamKey::parse(7, "ratio"), Err(Error::InvalidOperator(7)));
    }

    #[test]
    fn keys_only_address_existing_operators() {
        assert_eq!(
            ParamKey::try_from((9, OperatorParam::Ratio)),
            Err(Error::InvalidOperator(9))
        );
        let key = ParamKey::try_from((6, OperatorParam::Ratio)).unwrap();
        assert_eq!((key.operator(), key.param()), (6, OperatorParam::Ratio));
        assert_eq!(<(usize, OperatorParam)>::from(key), (6, OperatorParam::Ratio));

        let mut patch = Patch::default();
        patch.set(key, 3.0);
        assert_eq!(patch.get(key), 3.0);
    }

    #[test]
    fn writes_are_clamped() {
        let mut patch = Patch::default();
        let key = |name| ParamKey::parse(3, name).unwrap();

        patch.set(key("amp_attack"), -1.0);
        assert_eq!(patch.get(key("amp_attack")), 0.0);

        patch.set(key("amp_sustain"), 1.5);
        assert_eq!(patch.get(key("amp_sustain")), 1.0);

        patch.set(key("ratio"), -2.0);
        assert_eq!(patch.get(key("ratio")), 0.0);

        patch.set(key("phase"), 1.25);
        assert!((patch.get(key("phase")) - 0.25).abs() < 1e-6);

        patch.set(key("delay_l1_feedback"), 3.0);
        assert_eq!(patch.get(key("delay_l1_feedback")), MAX_TAP_FEEDBACK);

        patch.set(key("delay_taps"), 9.0);
        assert_eq!(patch.get(key("delay_taps")), MAX_DELAY_TAPS as f32);

        // Negative offsets are valid
        patch.set(key("offset"), -12.5);
        assert_eq!(patch.get(key("offset")), -12.5);
    }

    #[test]
    fn non_finite_writes_are_ignored() {
        let mut patch = Patch::default();
        let key = ParamKey::parse(0, "ratio").unwrap();
        patch.set(key, f32::NAN);
        assert_eq!(patch.get(key), 1.0);

        patch.set_global(GlobalParam::MasterGain, f32::INFINITY);
        assert_eq!(patch.get_global(GlobalParam::MasterGain), 1.0);
    }

    #[test]
    fn globals_are_clamped() {
        let mut patch = Patch::default();
        patch.set_global(GlobalParam::BendRange, 100.0);
        assert_eq!(patch.get_global(GlobalParam::BendRange), MAX_BEND_RANGE);
        patch.set_global(GlobalParam::ModulationGain, -1.0);
        assert_eq!(patch.get_global(GlobalParam::ModulationGain), 0.0);
    }

    #[test]
    fn waveform_and_shapes_map_from_values() {
        let mut params = OperatorParams::default();
        params.set(OperatorParam::Waveform, 2.0);
        assert_eq!(params.waveform, OscillatorWaveform::Saw);
        params.set(OperatorParam::AmpRampShape, 1.0);
        assert_eq!(params.amp_ramp.shape, RampShape::Exponential);
    }

    #[test]
    fn pure_sines_have_no_modulation() {
        let patch = Patch::pure_sines();
        assert!(patch
            .operators
            .iter()
            .all(|op| op.index == 0.0 && op.feedback == 0.0));
    }
}
