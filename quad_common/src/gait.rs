//! Gait parameters and the gait parameter table.
//!
//! A `GaitParams` entry describes one gait mode as four parallel per-leg
//! arrays (amplitudes, neutral offsets, phase offsets) plus the waveform
//! family used to evaluate it. `GaitTable` maps every `GaitMode` to its
//! entry; it can only be built complete and validated.

use crate::config::ConfigError;
use crate::consts::{GAIT_MODE_COUNT, LEG_COUNT};
use crate::types::{GaitFamily, GaitMode, Leg};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Tolerance used when comparing phase offsets against their expected grid.
const PHASE_EPSILON: f64 = 1e-9;

/// Expected creep choreography: one leg per quarter cycle.
const CREEP_PHASES: [f64; LEG_COUNT] = [0.0, 0.25, 0.5, 0.75];

/// Trajectory family used to turn a leg phase into joint angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Waveform {
    /// Quarter-cycle lift, linear return.
    #[default]
    Creep,
    /// Quarter-cycle lift, cosine-eased return.
    CreepEased,
    /// Half-cycle lift, cosine return.
    Trot,
}

impl Waveform {
    /// All waveforms.
    pub const ALL: [Waveform; 3] = [Waveform::Creep, Waveform::CreepEased, Waveform::Trot];

    /// Fraction of the cycle during which the foot is off the ground.
    pub const fn lift_fraction(self) -> f64 {
        match self {
            Waveform::Creep | Waveform::CreepEased => 0.25,
            Waveform::Trot => 0.5,
        }
    }

    /// Canonical kebab-case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Waveform::Creep => "creep",
            Waveform::CreepEased => "creep-eased",
            Waveform::Trot => "trot",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Waveform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Waveform::ALL
            .into_iter()
            .find(|w| w.as_str() == normalized)
            .ok_or_else(|| ConfigError::ValidationError(format!("unknown waveform '{s}'")))
    }
}

/// Parameters of one gait mode. Arrays are indexed by `Leg::index()`.
///
/// # TOML Example
///
/// ```toml
/// [gaits.creep-forward]
/// waveform = "creep"
/// x_amplitude = [30.0, -30.0, 30.0, -30.0]
/// z_amplitude = [15.0, -15.0, -15.0, 15.0]
/// x_offset = [85.0, 95.0, 45.0, 135.0]
/// z_offset = [90.0, 90.0, 90.0, 90.0]
/// phase_offset = [0.0, 0.5, 0.25, 0.75]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GaitParams {
    /// Waveform family evaluated for every leg.
    #[serde(default)]
    pub waveform: Waveform,
    /// Mode-specific cycle duration [s]; falls back to the timing default.
    #[serde(default)]
    pub cycle_duration: Option<f64>,
    /// Horizontal sweep amplitude [deg, signed].
    pub x_amplitude: [f64; LEG_COUNT],
    /// Vertical lift amplitude [deg, signed].
    pub z_amplitude: [f64; LEG_COUNT],
    /// Neutral horizontal angle [deg].
    pub x_offset: [f64; LEG_COUNT],
    /// Neutral vertical angle [deg].
    pub z_offset: [f64; LEG_COUNT],
    /// Fraction of a cycle each leg is shifted by, in [0, 1).
    pub phase_offset: [f64; LEG_COUNT],
}

/// The per-leg slice of a `GaitParams` entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegParams {
    /// Horizontal sweep amplitude [deg].
    pub x_amplitude: f64,
    /// Vertical lift amplitude [deg].
    pub z_amplitude: f64,
    /// Neutral horizontal angle [deg].
    pub x_offset: f64,
    /// Neutral vertical angle [deg].
    pub z_offset: f64,
    /// Phase shift in [0, 1).
    pub phase_offset: f64,
}

impl GaitParams {
    /// Extract the parameters of one leg.
    #[inline]
    pub fn leg(&self, leg: Leg) -> LegParams {
        let i = leg.index();
        LegParams {
            x_amplitude: self.x_amplitude[i],
            z_amplitude: self.z_amplitude[i],
            x_offset: self.x_offset[i],
            z_offset: self.z_offset[i],
            phase_offset: self.phase_offset[i],
        }
    }

    /// Validate the entry for `mode`.
    ///
    /// # Validation Rules
    /// 1. All values finite
    /// 2. `phase_offset` in [0, 1)
    /// 3. `cycle_duration` > 0 if present
    /// 4. Creep modes: phase offsets are exactly {0, 0.25, 0.5, 0.75}
    /// 5. Trot modes: offsets in {0, 0.5}, diagonal legs share an offset,
    ///    the two diagonal pairs differ
    pub fn validate(&self, mode: GaitMode) -> Result<(), ConfigError> {
        let arrays = [
            ("x_amplitude", &self.x_amplitude),
            ("z_amplitude", &self.z_amplitude),
            ("x_offset", &self.x_offset),
            ("z_offset", &self.z_offset),
            ("phase_offset", &self.phase_offset),
        ];
        for (name, values) in arrays {
            if let Some(leg) = Leg::ALL.into_iter().find(|l| !values[l.index()].is_finite()) {
                return Err(ConfigError::ValidationError(format!(
                    "{mode}: {name}[{leg}] is not finite"
                )));
            }
        }

        for leg in Leg::ALL {
            let offset = self.phase_offset[leg.index()];
            if !(0.0..1.0).contains(&offset) {
                return Err(ConfigError::ValidationError(format!(
                    "{mode}: phase_offset[{leg}] = {offset} out of range [0, 1)"
                )));
            }
        }

        if let Some(cycle) = self.cycle_duration {
            if !cycle.is_finite() || cycle <= 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "{mode}: cycle_duration must be > 0 (got {cycle})"
                )));
            }
        }

        match mode.family() {
            GaitFamily::Creep => self.validate_creep_phases(mode),
            GaitFamily::Trot => self.validate_trot_phases(mode),
        }
    }

    fn validate_creep_phases(&self, mode: GaitMode) -> Result<(), ConfigError> {
        let mut sorted = self.phase_offset;
        sorted.sort_by(f64::total_cmp);
        let matches = sorted
            .iter()
            .zip(CREEP_PHASES.iter())
            .all(|(a, b)| (a - b).abs() < PHASE_EPSILON);
        if !matches {
            return Err(ConfigError::ValidationError(format!(
                "{mode}: creep phase offsets must be a permutation of {{0, 0.25, 0.5, 0.75}} (got {:?})",
                self.phase_offset
            )));
        }
        Ok(())
    }

    fn validate_trot_phases(&self, mode: GaitMode) -> Result<(), ConfigError> {
        let on_grid = self
            .phase_offset
            .iter()
            .all(|p| p.abs() < PHASE_EPSILON || (p - 0.5).abs() < PHASE_EPSILON);
        let offset = |leg: Leg| self.phase_offset[leg.index()];
        let paired = (offset(Leg::FrontLeft) - offset(Leg::RearRight)).abs() < PHASE_EPSILON
            && (offset(Leg::FrontRight) - offset(Leg::RearLeft)).abs() < PHASE_EPSILON;
        let staggered = (offset(Leg::FrontLeft) - offset(Leg::FrontRight)).abs() > PHASE_EPSILON;
        if !(on_grid && paired && staggered) {
            return Err(ConfigError::ValidationError(format!(
                "{mode}: trot phase offsets must pair diagonal legs at 0 and 0.5 (got {:?})",
                self.phase_offset
            )));
        }
        Ok(())
    }
}

// ─── Built-in tables ────────────────────────────────────────────────

const fn creep(
    x_amplitude: [f64; LEG_COUNT],
    z_amplitude: [f64; LEG_COUNT],
    x_offset: [f64; LEG_COUNT],
    phase_offset: [f64; LEG_COUNT],
) -> GaitParams {
    GaitParams {
        waveform: Waveform::Creep,
        cycle_duration: None,
        x_amplitude,
        z_amplitude,
        x_offset,
        z_offset: [90.0; LEG_COUNT],
        phase_offset,
    }
}

/// Tuned tables, indexed by `GaitMode::index()`. Legs: FL, FR, RL, RR.
/// Trot modes reuse the creep waveform with diagonal-pair phasing.
const BUILTIN_GAITS: [GaitParams; GAIT_MODE_COUNT] = [
    // CreepForward
    creep(
        [30.0, -30.0, 30.0, -30.0],
        [15.0, -15.0, -15.0, 15.0],
        [85.0, 95.0, 45.0, 135.0],
        [0.0, 0.5, 0.25, 0.75],
    ),
    // CreepBackward
    creep(
        [-30.0, 30.0, -30.0, 30.0],
        [15.0, -15.0, -15.0, 30.0],
        [135.0, 45.0, 95.0, 85.0],
        [0.25, 0.75, 0.0, 0.5],
    ),
    // CreepLeft
    creep(
        [-30.0, -30.0, -30.0, -30.0],
        [15.0, -15.0, -15.0, 15.0],
        [150.0, 60.0, 60.0, 150.0],
        [0.0, 0.5, 0.25, 0.75],
    ),
    // CreepRight
    creep(
        [30.0, 30.0, 30.0, 30.0],
        [15.0, -15.0, -15.0, 15.0],
        [120.0, 30.0, 30.0, 120.0],
        [0.0, 0.5, 0.25, 0.75],
    ),
    // TrotForward
    creep(
        [30.0, -30.0, 30.0, -30.0],
        [15.0, -15.0, -15.0, 15.0],
        [105.0, 75.0, 45.0, 135.0],
        [0.5, 0.0, 0.0, 0.5],
    ),
    // TrotBackward
    creep(
        [-30.0, 30.0, -30.0, 30.0],
        [15.0, -15.0, -15.0, 15.0],
        [135.0, 45.0, 75.0, 105.0],
        [0.5, 0.0, 0.0, 0.5],
    ),
    // TrotLeft
    creep(
        [30.0, 30.0, 30.0, 30.0],
        [15.0, -15.0, -15.0, 15.0],
        [105.0, 45.0, 45.0, 105.0],
        [0.5, 0.0, 0.0, 0.5],
    ),
    // TrotRight
    creep(
        [-30.0, -30.0, -30.0, -30.0],
        [15.0, -15.0, -15.0, 15.0],
        [135.0, 75.0, 75.0, 135.0],
        [0.5, 0.0, 0.0, 0.5],
    ),
];

// ─── GaitTable ──────────────────────────────────────────────────────

/// Complete, validated mapping from `GaitMode` to `GaitParams`.
///
/// Every constructor either yields an entry for all eight modes or fails
/// with a `ConfigError`, so lookups never fail afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct GaitTable {
    entries: [GaitParams; GAIT_MODE_COUNT],
}

impl GaitTable {
    /// The compiled-in tuned tables.
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_GAITS,
        }
    }

    /// Build a table from a complete set of entries.
    ///
    /// # Errors
    /// `ConfigError::MissingEntry` if any mode has no entry,
    /// `ConfigError::ValidationError` if an entry is invalid.
    pub fn from_entries(entries: &BTreeMap<GaitMode, GaitParams>) -> Result<Self, ConfigError> {
        let mut table = BUILTIN_GAITS;
        for mode in GaitMode::ALL {
            let params = entries
                .get(&mode)
                .ok_or_else(|| ConfigError::MissingEntry(format!("gait mode {mode}")))?;
            params.validate(mode)?;
            table[mode.index()] = *params;
        }
        Ok(Self { entries: table })
    }

    /// Start from the built-in tables and replace the named entries.
    ///
    /// Keys are gait mode names (kebab-case or snake_case).
    pub fn with_overrides(overrides: &BTreeMap<String, GaitParams>) -> Result<Self, ConfigError> {
        let mut table = Self::builtin();
        for (name, params) in overrides {
            let mode: GaitMode = name.parse()?;
            params.validate(mode)?;
            debug!(
                "Gait override for {}: {} waveform, cycle {:?}",
                mode, params.waveform, params.cycle_duration
            );
            table.entries[mode.index()] = *params;
        }
        Ok(table)
    }

    /// Parameters for `mode`. O(1).
    #[inline]
    pub fn get(&self, mode: GaitMode) -> &GaitParams {
        &self.entries[mode.index()]
    }

    /// Iterate over all `(mode, params)` pairs in mode order.
    pub fn iter(&self) -> impl Iterator<Item = (GaitMode, &GaitParams)> {
        GaitMode::ALL.into_iter().zip(self.entries.iter())
    }
}

impl Default for GaitTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_entries_validate() {
        let table = GaitTable::builtin();
        for (mode, params) in table.iter() {
            params
                .validate(mode)
                .unwrap_or_else(|e| panic!("{mode} invalid: {e}"));
        }
    }

    #[test]
    fn builtin_uses_creep_waveform_everywhere() {
        let table = GaitTable::builtin();
        assert!(table.iter().all(|(_, p)| p.waveform == Waveform::Creep));
    }

    #[test]
    fn creep_modes_stagger_by_quarter_cycle() {
        let table = GaitTable::builtin();
        for (mode, params) in table.iter().filter(|(m, _)| m.family() == GaitFamily::Creep) {
            let mut phases = params.phase_offset;
            phases.sort_by(f64::total_cmp);
            assert_eq!(phases, CREEP_PHASES, "{mode}");
        }
    }

    #[test]
    fn trot_modes_pair_diagonals() {
        let table = GaitTable::builtin();
        for (mode, params) in table.iter().filter(|(m, _)| m.family() == GaitFamily::Trot) {
            for leg in Leg::ALL {
                assert_eq!(
                    params.phase_offset[leg.index()],
                    params.phase_offset[leg.diagonal().index()],
                    "{mode} {leg}"
                );
            }
        }
    }

    #[test]
    fn rejects_duplicate_creep_phase() {
        let mut params = *GaitTable::builtin().get(GaitMode::CreepForward);
        params.phase_offset = [0.0, 0.25, 0.25, 0.75];
        assert!(matches!(
            params.validate(GaitMode::CreepForward),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn rejects_trot_without_diagonal_pairs() {
        let mut params = *GaitTable::builtin().get(GaitMode::TrotForward);
        params.phase_offset = [0.5, 0.5, 0.0, 0.0];
        assert!(params.validate(GaitMode::TrotForward).is_err());
    }

    #[test]
    fn rejects_phase_offset_of_one() {
        let mut params = *GaitTable::builtin().get(GaitMode::CreepLeft);
        params.phase_offset = [1.0, 0.25, 0.5, 0.75];
        assert!(params.validate(GaitMode::CreepLeft).is_err());
    }

    #[test]
    fn rejects_non_positive_cycle_duration() {
        let mut params = *GaitTable::builtin().get(GaitMode::CreepLeft);
        params.cycle_duration = Some(0.0);
        assert!(params.validate(GaitMode::CreepLeft).is_err());
    }

    #[test]
    fn from_entries_requires_every_mode() {
        let mut entries: BTreeMap<GaitMode, GaitParams> = GaitTable::builtin()
            .iter()
            .map(|(m, p)| (m, *p))
            .collect();
        assert!(GaitTable::from_entries(&entries).is_ok());

        entries.remove(&GaitMode::TrotLeft);
        assert!(matches!(
            GaitTable::from_entries(&entries),
            Err(ConfigError::MissingEntry(_))
        ));
    }

    #[test]
    fn overrides_replace_single_entry() {
        let mut params = *GaitTable::builtin().get(GaitMode::TrotForward);
        params.waveform = Waveform::Trot;
        params.cycle_duration = Some(1.0);

        let mut overrides = BTreeMap::new();
        overrides.insert("trot_forward".to_string(), params);
        let table = GaitTable::with_overrides(&overrides).unwrap();

        assert_eq!(table.get(GaitMode::TrotForward).waveform, Waveform::Trot);
        assert_eq!(table.get(GaitMode::TrotForward).cycle_duration, Some(1.0));
        assert_eq!(
            table.get(GaitMode::CreepForward),
            GaitTable::builtin().get(GaitMode::CreepForward)
        );
    }

    #[test]
    fn overrides_reject_unknown_mode() {
        let params = *GaitTable::builtin().get(GaitMode::TrotForward);
        let mut overrides = BTreeMap::new();
        overrides.insert("gallop".to_string(), params);
        assert!(matches!(
            GaitTable::with_overrides(&overrides),
            Err(ConfigError::UnknownGaitMode(_))
        ));
    }

    #[test]
    fn waveform_parsing() {
        assert_eq!("creep_eased".parse::<Waveform>().unwrap(), Waveform::CreepEased);
        assert_eq!("Trot".parse::<Waveform>().unwrap(), Waveform::Trot);
        assert!("sine".parse::<Waveform>().is_err());
    }
}
