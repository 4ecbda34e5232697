//! The structured cinematic prompt and its flattening into one string.
//!
//! `CinematicPrompt` owns five sub-records plus the free-standing subject,
//! ambiance, and negative-prompt fields. [`CinematicPrompt::assemble`] is a
//! pure function of those fields; [`CinematicPrompt::generate_prompt_string`]
//! additionally caches the result in `final_prompt_string`.
//!
//! Optional fields that are absent, empty, or whitespace-only contribute
//! nothing to their clause.

use crate::generation::SENTINEL_PREFIX;
use serde::{Deserialize, Serialize};

/// Quality boosters appended to every prompt.
pub const QUALITY_SUFFIX: &str = "ultra-detailed, 8k, photorealistic, cinematic composition";

/// Marker separating the positive prompt from negative elements.
pub const NEGATIVE_MARKER: &str = " --neg ";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterDetails {
    /// Appearance, age, key features.
    pub description: String,
    #[serde(default)]
    pub outfit: Option<String>,
    #[serde(default)]
    pub expression: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentDetails {
    pub setting: String,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub time_of_day: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraSetup {
    pub shot_type: String,
    #[serde(default)]
    pub angle: Option<String>,
    #[serde(default)]
    pub lens: Option<String>,
    /// Reserved; the composer never fills it.
    #[serde(default)]
    pub composition_notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightingDetails {
    pub description: String,
    #[serde(default)]
    pub temperature: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtisticStyle {
    pub genre: String,
    #[serde(default)]
    pub influences: Option<String>,
    /// Reserved; the composer never fills it.
    #[serde(default)]
    pub additional_details: Option<String>,
}

/// Aggregate root of one composition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CinematicPrompt {
    pub character: CharacterDetails,
    pub environment: EnvironmentDetails,
    pub camera: CameraSetup,
    pub lighting: LightingDetails,
    pub style: ArtisticStyle,
    pub subject_focus: String,
    pub ambiance_atmosphere: String,
    #[serde(default)]
    pub negative_prompt_elements: Vec<String>,
    /// Derived by [`CinematicPrompt::generate_prompt_string`]; `None` until then.
    #[serde(default)]
    pub final_prompt_string: Option<String>,
}

/// An optional field counts only when it has non-blank content.
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.trim().is_empty())
}

impl CinematicPrompt {
    /// Flatten the structured fields into a single prompt string.
    pub fn assemble(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(8);

        // Character
        let mut character = vec![self.character.description.clone()];
        if let Some(outfit) = present(&self.character.outfit) {
            character.push(format!("wearing {outfit}"));
        }
        if let Some(expression) = present(&self.character.expression) {
            character.push(format!("with a {expression} expression"));
        }
        parts.push(character.join(", "));

        // Environment
        let mut environment = vec![format!("in a {}", self.environment.setting)];
        if let Some(mood) = present(&self.environment.mood) {
            environment.push(format!("creating a {mood} mood"));
        }
        if let Some(time_of_day) = present(&self.environment.time_of_day) {
            environment.push(format!("during {time_of_day}"));
        }
        parts.push(environment.join(" "));

        parts.push(format!("Focusing on {}.", self.subject_focus));
        parts.push(format!(
            "The overall atmosphere is {}.",
            self.ambiance_atmosphere
        ));

        // Camera
        let mut camera = vec![self.camera.shot_type.clone()];
        if let Some(angle) = present(&self.camera.angle) {
            camera.push(angle.to_string());
        }
        if let Some(lens) = present(&self.camera.lens) {
            camera.push(format!("using a {lens} lens"));
        }
        if let Some(notes) = present(&self.camera.composition_notes) {
            camera.push(format!("with {notes}"));
        }
        parts.push(format!("Camera: {}.", camera.join(", ")));

        // Lighting
        let mut lighting = vec![self.lighting.description.clone()];
        if let Some(temperature) = present(&self.lighting.temperature) {
            lighting.push(format!("with {temperature} tones"));
        }
        parts.push(format!("Lighting: {}.", lighting.join(", ")));

        // Style
        let mut style = vec![format!("Style: {}", self.style.genre)];
        if let Some(influences) = present(&self.style.influences) {
            style.push(format!("influenced by {influences}"));
        }
        if let Some(details) = present(&self.style.additional_details) {
            style.push(details.to_string());
        }
        parts.push(format!("{}.", style.join(". ")));

        parts.push(QUALITY_SUFFIX.to_string());

        let mut prompt = parts.join(" ");
        if !self.negative_prompt_elements.is_empty() {
            prompt.push_str(NEGATIVE_MARKER);
            prompt.push_str(&self.negative_prompt_elements.join(", "));
        }
        prompt
    }

    /// Assemble and cache the result in `final_prompt_string`.
    pub fn generate_prompt_string(&mut self) -> &str {
        let assembled = self.assemble();
        self.final_prompt_string.insert(assembled).as_str()
    }

    /// Whether any generated field starts with the in-band `Error:` sentinel.
    pub fn has_sentinel(&self) -> bool {
        let required = [
            &self.character.description,
            &self.environment.setting,
            &self.camera.shot_type,
            &self.lighting.description,
            &self.style.genre,
            &self.subject_focus,
            &self.ambiance_atmosphere,
        ];
        let optional = [
            &self.character.outfit,
            &self.character.expression,
            &self.environment.mood,
            &self.environment.time_of_day,
            &self.camera.angle,
            &self.camera.lens,
            &self.camera.composition_notes,
            &self.lighting.temperature,
            &self.style.influences,
            &self.style.additional_details,
        ];
        required
            .into_iter()
            .map(String::as_str)
            .chain(optional.into_iter().filter_map(|field| field.as_deref()))
            .any(|value| value.starts_with(SENTINEL_PREFIX))
    }
}
