use crate::instructions;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One node of the composition DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Visuals,
    Outfit,
    Expression,
    Setting,
    Mood,
    TimeOfDay,
    Genre,
    Influences,
    ShotType,
    Angle,
    Lens,
    LightingDescription,
    LightingTemperature,
    SubjectFocus,
    Ambiance,
}

impl Step {
    /// Every step in reference (sequential) order.
    pub const ALL: [Step; 15] = [
        Step::Visuals,
        Step::Outfit,
        Step::Expression,
        Step::Setting,
        Step::Mood,
        Step::TimeOfDay,
        Step::Genre,
        Step::Influences,
        Step::ShotType,
        Step::Angle,
        Step::Lens,
        Step::LightingDescription,
        Step::LightingTemperature,
        Step::SubjectFocus,
        Step::Ambiance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Visuals => "visuals",
            Step::Outfit => "outfit",
            Step::Expression => "expression",
            Step::Setting => "setting",
            Step::Mood => "mood",
            Step::TimeOfDay => "time_of_day",
            Step::Genre => "genre",
            Step::Influences => "influences",
            Step::ShotType => "shot_type",
            Step::Angle => "angle",
            Step::Lens => "lens",
            Step::LightingDescription => "lighting_description",
            Step::LightingTemperature => "lighting_temperature",
            Step::SubjectFocus => "subject_focus",
            Step::Ambiance => "ambiance",
        }
    }

    /// The role-framing instruction sent with this step.
    pub fn system_instruction(&self) -> &'static str {
        match self {
            Step::Visuals => instructions::VISUALS,
            Step::Outfit => instructions::OUTFIT,
            Step::Expression => instructions::EXPRESSION,
            Step::Setting => instructions::SETTING,
            Step::Mood => instructions::MOOD,
            Step::TimeOfDay => instructions::TIME_OF_DAY,
            Step::Genre => instructions::GENRE,
            Step::Influences => instructions::INFLUENCES,
            Step::ShotType => instructions::SHOT_TYPE,
            Step::Angle => instructions::ANGLE,
            Step::Lens => instructions::LENS,
            Step::LightingDescription => instructions::LIGHTING_DESCRIPTION,
            Step::LightingTemperature => instructions::LIGHTING_TEMPERATURE,
            Step::SubjectFocus => instructions::SUBJECT_FOCUS,
            Step::Ambiance => instructions::AMBIANCE,
        }
    }

    /// Identify a step from the system instruction it sends.
    pub fn from_system_instruction(system: &str) -> Option<Step> {
        Step::ALL
            .into_iter()
            .find(|step| step.system_instruction() == system)
    }

    /// Steps whose resolved values this step reads.
    pub fn dependencies(&self) -> &'static [Step] {
        match self {
            Step::Visuals | Step::Setting | Step::Genre => &[],
            Step::Outfit | Step::Expression => &[Step::Visuals],
            Step::Mood | Step::TimeOfDay | Step::ShotType => &[Step::Setting],
            Step::Influences => &[Step::Genre],
            Step::Angle => &[Step::ShotType],
            Step::Lens => &[Step::ShotType, Step::Genre],
            Step::LightingDescription => &[Step::Setting, Step::TimeOfDay],
            Step::LightingTemperature => &[Step::LightingDescription],
            Step::SubjectFocus => &[Step::Visuals, Step::Setting],
            Step::Ambiance => &[Step::Visuals, Step::Setting, Step::Mood],
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one step in a finished composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: Step,
    /// The step's field holds the `Error:` sentinel.
    pub failed: bool,
}
