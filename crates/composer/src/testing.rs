//! Scripted text generator for pipeline tests.

use crate::Step;
use async_trait::async_trait;
use reelprompt_core::{Generation, GenerationOptions, TextGenerator};
use std::collections::HashMap;
use std::sync::Mutex;

/// Answers each step with `"{step} text"` unless told to fail it or given
/// a fixed reply.
///
/// Steps are recognised by their system instruction, so answers do not
/// depend on call order and parallel schedules see the same script.
pub struct ScriptedGenerator {
    failures: HashMap<Step, String>,
    replies: HashMap<Step, String>,
    calls: Mutex<Vec<(Step, String)>>,
    last_options: Mutex<Option<GenerationOptions>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            failures: HashMap::new(),
            replies: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            last_options: Mutex::new(None),
        }
    }

    pub fn fail(mut self, step: Step, reason: &str) -> Self {
        self.failures.insert(step, reason.to_string());
        self
    }

    pub fn reply(mut self, step: Step, text: &str) -> Self {
        self.replies.insert(step, text.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Steps in the order they were issued.
    pub fn steps(&self) -> Vec<Step> {
        self.calls.lock().unwrap().iter().map(|(s, _)| *s).collect()
    }

    pub fn users(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, u)| u.clone()).collect()
    }

    pub fn user_instruction(&self, step: Step) -> Option<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(s, _)| *s == step)
            .map(|(_, u)| u.clone())
    }

    pub fn last_options(&self) -> Option<GenerationOptions> {
        self.last_options.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        system_instruction: &str,
        user_instruction: &str,
        options: &GenerationOptions,
    ) -> Generation {
        let step = Step::from_system_instruction(system_instruction)
            .unwrap_or_else(|| panic!("ScriptedGenerator: unknown system instruction {system_instruction:?}"));
        self.calls
            .lock()
            .unwrap()
            .push((step, user_instruction.to_string()));
        *self.last_options.lock().unwrap() = Some(options.clone());

        if let Some(reason) = self.failures.get(&step) {
            return Generation::failed(reason.clone());
        }
        match self.replies.get(&step) {
            Some(text) => Generation::text(text.clone()),
            None => Generation::text(format!("{step} text")),
        }
    }
}
