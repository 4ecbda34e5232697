//! The composition DAG and its two schedules.
//!
//! Sequential issuance follows [`Step::ALL`]. Parallel issuance runs four
//! waves, each holding only steps whose inputs an earlier wave resolved:
//!
//! 1. visuals, setting, genre
//! 2. outfit, expression, mood, time of day, influences, shot type, subject focus
//! 3. angle, lens, lighting description, ambiance
//! 4. lighting temperature
//!
//! Both schedules send identical instructions, so a deterministic generator
//! yields field-identical prompts either way.

use crate::{CharacterName, ComposeError, Step, StepRecord, instructions};
use reelprompt_config::{AppConfig, FailurePolicy};
use reelprompt_core::{
    ArtisticStyle, CameraSetup, CharacterDetails, CinematicPrompt, EnvironmentDetails, Generation,
    GenerationOptions, LightingDetails, TextGenerator,
};
use reelprompt_knowledge::{CharacterTraits, KnowledgeBase};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Failure reason recorded when the model answers with nothing.
const EMPTY_REPLY: &str = "model returned an empty response";

/// A finished prompt plus what happened at each step.
#[derive(Debug, Clone, Serialize)]
pub struct Composition {
    pub prompt: CinematicPrompt,
    /// One record per step, in reference order.
    pub steps: Vec<StepRecord>,
}

impl Composition {
    pub fn failed_steps(&self) -> impl Iterator<Item = Step> + '_ {
        self.steps.iter().filter(|r| r.failed).map(|r| r.step)
    }
}

/// Drives the fifteen generation calls for one character.
///
/// Holds only shared, read-only collaborators, so a single composer can serve
/// concurrent compositions.
pub struct PromptComposer {
    generator: Arc<dyn TextGenerator>,
    knowledge: Arc<KnowledgeBase>,
    options: GenerationOptions,
    failure_policy: FailurePolicy,
    parallel: bool,
}

/// Text resolved for one step.
struct Outcome {
    text: String,
    failure: Option<String>,
}

impl PromptComposer {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        knowledge: Arc<KnowledgeBase>,
        options: GenerationOptions,
    ) -> Self {
        Self {
            generator,
            knowledge,
            options,
            failure_policy: FailurePolicy::default(),
            parallel: false,
        }
    }

    /// Build with the generation options and composer section of `config`.
    pub fn from_config(
        config: &AppConfig,
        generator: Arc<dyn TextGenerator>,
        knowledge: Arc<KnowledgeBase>,
    ) -> Self {
        Self::new(generator, knowledge, config.llm.generation_options())
            .with_failure_policy(config.composer.failure_policy)
            .with_parallel(config.composer.parallel)
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Issue independent branches concurrently.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Compose a prompt for `character_name`.
    ///
    /// Blank names are rejected before any generation call. Under
    /// [`FailurePolicy::Propagate`] a failed step writes its `Error:` sentinel
    /// into the field and downstream steps consume it as content.
    pub async fn compose(&self, character_name: &str) -> Result<CinematicPrompt, ComposeError> {
        Ok(self.compose_with_report(character_name).await?.prompt)
    }

    /// Like [`compose`](Self::compose), also reporting which steps failed.
    pub async fn compose_with_report(
        &self,
        character_name: &str,
    ) -> Result<Composition, ComposeError> {
        let name = CharacterName::parse(character_name)?;
        let traits = self.knowledge.lookup(name.as_str());
        info!(
            character = %name,
            hints = traits.is_some(),
            parallel = self.parallel,
            "Composing cinematic prompt"
        );

        let resolved = if self.parallel {
            self.run_parallel(&name, traits).await?
        } else {
            self.run_sequential(&name, traits).await?
        };

        let negative = traits
            .and_then(|t| t.negative_prompt_keywords.clone())
            .unwrap_or_default();
        let composition = resolved.into_composition(negative);

        let failed = composition.failed_steps().count();
        if failed > 0 {
            warn!(character = %name, failed, "Composition finished with failed steps");
        } else {
            info!(character = %name, "Composition finished");
        }
        Ok(composition)
    }

    async fn run_sequential(
        &self,
        name: &CharacterName,
        traits: Option<&CharacterTraits>,
    ) -> Result<Resolved, ComposeError> {
        let name = name.as_str();
        let hints = Hints(traits);

        let visuals = self
            .step(Step::Visuals, instructions::visuals(name, hints.visual()))
            .await?;
        let outfit = self
            .step(Step::Outfit, instructions::outfit(name, &visuals.text, hints.outfit()))
            .await?;
        let expression = self
            .step(
                Step::Expression,
                instructions::expression(name, &visuals.text, hints.expression()),
            )
            .await?;
        let setting = self
            .step(Step::Setting, instructions::setting(name, hints.environment()))
            .await?;
        let mood = self
            .step(Step::Mood, instructions::mood(&setting.text))
            .await?;
        let time_of_day = self
            .step(Step::TimeOfDay, instructions::time_of_day(&setting.text))
            .await?;
        let genre = self
            .step(Step::Genre, instructions::genre(name, hints.genre()))
            .await?;
        let influences = self
            .step(Step::Influences, instructions::influences(&genre.text))
            .await?;
        let shot_type = self
            .step(Step::ShotType, instructions::shot_type(name, &setting.text))
            .await?;
        let angle = self
            .step(Step::Angle, instructions::angle(name, &shot_type.text))
            .await?;
        let lens = self
            .step(Step::Lens, instructions::lens(&shot_type.text, &genre.text))
            .await?;
        let lighting_description = self
            .step(
                Step::LightingDescription,
                instructions::lighting_description(name, &setting.text, &time_of_day.text),
            )
            .await?;
        let lighting_temperature = self
            .step(
                Step::LightingTemperature,
                instructions::lighting_temperature(&lighting_description.text),
            )
            .await?;
        let subject_focus = self
            .step(
                Step::SubjectFocus,
                instructions::subject_focus(&visuals.text, &setting.text),
            )
            .await?;
        let ambiance = self
            .step(
                Step::Ambiance,
                instructions::ambiance(&visuals.text, &setting.text, &mood.text),
            )
            .await?;

        Ok(Resolved {
            visuals,
            outfit,
            expression,
            setting,
            mood,
            time_of_day,
            genre,
            influences,
            shot_type,
            angle,
            lens,
            lighting_description,
            lighting_temperature,
            subject_focus,
            ambiance,
        })
    }

    async fn run_parallel(
        &self,
        name: &CharacterName,
        traits: Option<&CharacterTraits>,
    ) -> Result<Resolved, ComposeError> {
        let name = name.as_str();
        let hints = Hints(traits);

        let (visuals, setting, genre) = tokio::join!(
            self.generate(Step::Visuals, instructions::visuals(name, hints.visual())),
            self.generate(Step::Setting, instructions::setting(name, hints.environment())),
            self.generate(Step::Genre, instructions::genre(name, hints.genre())),
        );
        let visuals = self.settle(Step::Visuals, visuals)?;
        let setting = self.settle(Step::Setting, setting)?;
        let genre = self.settle(Step::Genre, genre)?;

        let (outfit, expression, mood, time_of_day, influences, shot_type, subject_focus) = tokio::join!(
            self.generate(Step::Outfit, instructions::outfit(name, &visuals.text, hints.outfit())),
            self.generate(
                Step::Expression,
                instructions::expression(name, &visuals.text, hints.expression()),
            ),
            self.generate(Step::Mood, instructions::mood(&setting.text)),
            self.generate(Step::TimeOfDay, instructions::time_of_day(&setting.text)),
            self.generate(Step::Influences, instructions::influences(&genre.text)),
            self.generate(Step::ShotType, instructions::shot_type(name, &setting.text)),
            self.generate(
                Step::SubjectFocus,
                instructions::subject_focus(&visuals.text, &setting.text),
            ),
        );
        let outfit = self.settle(Step::Outfit, outfit)?;
        let expression = self.settle(Step::Expression, expression)?;
        let mood = self.settle(Step::Mood, mood)?;
        let time_of_day = self.settle(Step::TimeOfDay, time_of_day)?;
        let influences = self.settle(Step::Influences, influences)?;
        let shot_type = self.settle(Step::ShotType, shot_type)?;
        let subject_focus = self.settle(Step::SubjectFocus, subject_focus)?;

        let (angle, lens, lighting_description, ambiance) = tokio::join!(
            self.generate(Step::Angle, instructions::angle(name, &shot_type.text)),
            self.generate(Step::Lens, instructions::lens(&shot_type.text, &genre.text)),
            self.generate(
                Step::LightingDescription,
                instructions::lighting_description(name, &setting.text, &time_of_day.text),
            ),
            self.generate(
                Step::Ambiance,
                instructions::ambiance(&visuals.text, &setting.text, &mood.text),
            ),
        );
        let angle = self.settle(Step::Angle, angle)?;
        let lens = self.settle(Step::Lens, lens)?;
        let lighting_description = self.settle(Step::LightingDescription, lighting_description)?;
        let ambiance = self.settle(Step::Ambiance, ambiance)?;

        let lighting_temperature = self
            .step(
                Step::LightingTemperature,
                instructions::lighting_temperature(&lighting_description.text),
            )
            .await?;

        Ok(Resolved {
            visuals,
            outfit,
            expression,
            setting,
            mood,
            time_of_day,
            genre,
            influences,
            shot_type,
            angle,
            lens,
            lighting_description,
            lighting_temperature,
            subject_focus,
            ambiance,
        })
    }

    async fn step(&self, step: Step, user_instruction: String) -> Result<Outcome, ComposeError> {
        let generation = self.generate(step, user_instruction).await;
        self.settle(step, generation)
    }

    /// Issue one step. Blank text and `Error:`-prefixed text from a
    /// sentinel-style backend both count as failures.
    async fn generate(&self, step: Step, user_instruction: String) -> Generation {
        debug!(%step, "Generating");
        let generation = match self
            .generator
            .generate(step.system_instruction(), &user_instruction, &self.options)
            .await
        {
            Generation::Text(text) if text.trim().is_empty() => {
                Generation::failed(EMPTY_REPLY)
            }
            Generation::Text(text) => Generation::from_sentinel(text),
            failed => failed,
        };
        if let Generation::Failed(reason) = &generation {
            warn!(%step, %reason, "Generation step failed");
        }
        generation
    }

    /// Apply the failure policy to one generation result.
    fn settle(&self, step: Step, generation: Generation) -> Result<Outcome, ComposeError> {
        match generation {
            Generation::Text(text) => Ok(Outcome { text, failure: None }),
            Generation::Failed(reason) => match self.failure_policy {
                FailurePolicy::ShortCircuit => Err(ComposeError::StepFailed { step, reason }),
                FailurePolicy::Propagate => Ok(Outcome {
                    text: Generation::Failed(reason.clone()).into_text(),
                    failure: Some(reason),
                }),
            },
        }
    }
}

/// Keyword hints for the five hinted steps.
#[derive(Clone, Copy)]
struct Hints<'a>(Option<&'a CharacterTraits>);

impl<'a> Hints<'a> {
    fn visual(self) -> Option<&'a [String]> {
        self.0.and_then(|t| t.visual_keywords.as_deref())
    }

    fn outfit(self) -> Option<&'a [String]> {
        self.0.and_then(|t| t.outfit_keywords.as_deref())
    }

    fn expression(self) -> Option<&'a [String]> {
        self.0.and_then(|t| t.expression_keywords.as_deref())
    }

    fn environment(self) -> Option<&'a [String]> {
        self.0.and_then(|t| t.environment_keywords.as_deref())
    }

    fn genre(self) -> Option<&'a [String]> {
        self.0.and_then(|t| t.genre_keywords.as_deref())
    }
}

struct Resolved {
    visuals: Outcome,
    outfit: Outcome,
    expression: Outcome,
    setting: Outcome,
    mood: Outcome,
    time_of_day: Outcome,
    genre: Outcome,
    influences: Outcome,
    shot_type: Outcome,
    angle: Outcome,
    lens: Outcome,
    lighting_description: Outcome,
    lighting_temperature: Outcome,
    subject_focus: Outcome,
    ambiance: Outcome,
}

impl Resolved {
    fn into_composition(self, negative_prompt_elements: Vec<String>) -> Composition {
        let steps = [
            (Step::Visuals, &self.visuals),
            (Step::Outfit, &self.outfit),
            (Step::Expression, &self.expression),
            (Step::Setting, &self.setting),
            (Step::Mood, &self.mood),
            (Step::TimeOfDay, &self.time_of_day),
            (Step::Genre, &self.genre),
            (Step::Influences, &self.influences),
            (Step::ShotType, &self.shot_type),
            (Step::Angle, &self.angle),
            (Step::Lens, &self.lens),
            (Step::LightingDescription, &self.lighting_description),
            (Step::LightingTemperature, &self.lighting_temperature),
            (Step::SubjectFocus, &self.subject_focus),
            (Step::Ambiance, &self.ambiance),
        ]
        .into_iter()
        .map(|(step, outcome)| StepRecord {
            step,
            failed: outcome.failure.is_some(),
        })
        .collect();

        let mut prompt = CinematicPrompt {
            character: CharacterDetails {
                description: self.visuals.text,
                outfit: Some(self.outfit.text),
                expression: Some(self.expression.text),
            },
            environment: EnvironmentDetails {
                setting: self.setting.text,
                mood: Some(self.mood.text),
                time_of_day: Some(self.time_of_day.text),
            },
            camera: CameraSetup {
                shot_type: self.shot_type.text,
                angle: Some(self.angle.text),
                lens: Some(self.lens.text),
                composition_notes: None,
            },
            lighting: LightingDetails {
                description: self.lighting_description.text,
                temperature: Some(self.lighting_temperature.text),
            },
            style: ArtisticStyle {
                genre: self.genre.text,
                influences: Some(self.influences.text),
                additional_details: None,
            },
            subject_focus: self.subject_focus.text,
            ambiance_atmosphere: self.ambiance.text,
            negative_prompt_elements,
            final_prompt_string: None,
        };
        prompt.generate_prompt_string();

        Composition { prompt, steps }
    }
}
