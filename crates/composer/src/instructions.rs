//! Role-framing and task instructions for every composition step.
//!
//! System instructions are fixed per step. User instructions interpolate the
//! already-resolved upstream values and, for the five hinted steps, append the
//! knowledge-base keywords.

pub const VISUALS: &str = "You are an AI assistant helping describe character visuals for an image generation prompt. Focus on appearance, age, and key features.";
pub const OUTFIT: &str = "You are an AI assistant helping describe outfit details for a character based on their visuals for an image generation prompt.";
pub const EXPRESSION: &str = "You are an AI assistant helping describe the facial expression or emotion of a character for an image generation prompt.";
pub const SETTING: &str = "You are an AI assistant helping create a compelling environment or setting for a character in an image generation prompt.";
pub const MOOD: &str = "You are an AI assistant helping define the mood of an environment based on its description.";
pub const TIME_OF_DAY: &str = "You are an AI assistant helping determine an appropriate time of day for a described environment.";
pub const GENRE: &str = "You are an AI assistant helping select an artistic genre (e.g., photorealistic, fantasy art) for an image generation prompt.";
pub const INFLUENCES: &str = "You are an AI assistant helping suggest artistic influences (artists, movies) for a given genre.";
pub const SHOT_TYPE: &str = "You are an AI assistant helping select a cinematic camera shot type (e.g., close-up, medium shot, full shot) for an image generation prompt.";
pub const ANGLE: &str = "You are an AI assistant helping select a camera angle (e.g., eye-level, low angle) for an image generation prompt.";
pub const LENS: &str = "You are an AI assistant helping select a camera lens (e.g., 35mm, wide-angle) appropriate for a shot type and artistic style.";
pub const LIGHTING_DESCRIPTION: &str = "You are an AI assistant helping describe the lighting of a scene.";
pub const LIGHTING_TEMPERATURE: &str = "You are an AI assistant helping describe the lighting temperature.";
pub const SUBJECT_FOCUS: &str = "You are an AI assistant helping define the main subject or focus of an image, given a character and setting.";
pub const AMBIANCE: &str = "You are an AI assistant helping describe the overall ambiance and atmosphere to convey in an image.";

/// Append `Known {label} keywords: a, b.` when the list has content.
pub fn with_hint(instruction: String, label: &str, keywords: Option<&[String]>) -> String {
    let keywords: Vec<&str> = keywords
        .unwrap_or_default()
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return instruction;
    }
    format!("{instruction} Known {label} keywords: {}.", keywords.join(", "))
}

pub fn visuals(name: &str, hints: Option<&[String]>) -> String {
    with_hint(format!("Describe the character '{name}'."), "visual", hints)
}

pub fn outfit(name: &str, visuals: &str, hints: Option<&[String]>) -> String {
    with_hint(
        format!("Given the character '{name}' who looks like: '{visuals}', describe their outfit."),
        "outfit",
        hints,
    )
}

pub fn expression(name: &str, visuals: &str, hints: Option<&[String]>) -> String {
    with_hint(
        format!("What is the expression of '{name}' who looks like: '{visuals}'?"),
        "expression",
        hints,
    )
}

pub fn setting(name: &str, hints: Option<&[String]>) -> String {
    with_hint(
        format!("Describe a suitable setting for the character '{name}'."),
        "environment",
        hints,
    )
}

pub fn mood(setting: &str) -> String {
    format!("For the setting '{setting}', what is the emotional atmosphere or tone?")
}

pub fn time_of_day(setting: &str) -> String {
    format!("For the setting '{setting}', what is the time of day?")
}

pub fn genre(name: &str, hints: Option<&[String]>) -> String {
    with_hint(
        format!("What artistic genre best fits '{name}'?"),
        "genre",
        hints,
    )
}

pub fn influences(genre: &str) -> String {
    format!("For the genre '{genre}', suggest some artistic influences.")
}

pub fn shot_type(name: &str, setting: &str) -> String {
    format!("For '{name}' in '{setting}', what is a good camera shot type?")
}

pub fn angle(name: &str, shot_type: &str) -> String {
    format!("For '{name}' with a '{shot_type}', suggest a camera angle.")
}

pub fn lens(shot_type: &str, genre: &str) -> String {
    format!("For a '{shot_type}' in a '{genre}' style, what lens would be suitable?")
}

pub fn lighting_description(name: &str, setting: &str, time_of_day: &str) -> String {
    format!("Describe the lighting for '{name}' in '{setting}' during '{time_of_day}'.")
}

pub fn lighting_temperature(description: &str) -> String {
    format!("For lighting described as '{description}', what is its color temperature (e.g. cool, warm)?")
}

pub fn subject_focus(visuals: &str, setting: &str) -> String {
    format!(
        "The character is '{visuals}' in '{setting}'. What should be the main subject focus of the image?"
    )
}

pub fn ambiance(visuals: &str, setting: &str, mood: &str) -> String {
    format!(
        "Given the character '{visuals}', the setting '{setting}', and mood '{mood}', describe the overall ambiance and atmosphere."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn hint_is_appended_in_order() {
        let hints = words(&["tall blue beehive hair", "yellow skin"]);
        assert_eq!(
            visuals("Marge Simpson", Some(&hints)),
            "Describe the character 'Marge Simpson'. Known visual keywords: tall blue beehive hair, yellow skin."
        );
    }

    #[test]
    fn absent_or_empty_hints_add_nothing() {
        assert_eq!(setting("Zorg", None), "Describe a suitable setting for the character 'Zorg'.");
        assert_eq!(setting("Zorg", Some(&[])), setting("Zorg", None));
        assert_eq!(setting("Zorg", Some(&words(&["", "  "]))), setting("Zorg", None));
    }

    #[test]
    fn upstream_values_are_interpolated() {
        let text = ambiance("a tall elf", "misty forest", "eerie");
        assert!(text.contains("'a tall elf'"));
        assert!(text.contains("'misty forest'"));
        assert!(text.contains("'eerie'"));
        assert!(lens("close-up", "noir").contains("'close-up' in a 'noir' style"));
    }

    #[test]
    fn system_instructions_are_distinct() {
        let all = [
            VISUALS, OUTFIT, EXPRESSION, SETTING, MOOD, TIME_OF_DAY, GENRE, INFLUENCES,
            SHOT_TYPE, ANGLE, LENS, LIGHTING_DESCRIPTION, LIGHTING_TEMPERATURE, SUBJECT_FOCUS,
            AMBIANCE,
        ];
        let unique: std::collections::HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
    }
}
