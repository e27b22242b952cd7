use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::algorithms::format_timestamp_input;
use crate::effects::{EffectId, ParameterSet, ParameterValue};
use crate::error::{CoreError, Result};
use crate::preprocess::PreprocessingParameters;

/// Every change the interaction layer can make to an [`AppState`].
#[derive(Debug, Clone, PartialEq)]
pub enum StateMessage {
    SelectEffect(EffectId),
    SetPreprocessing { name: String, value: ParameterValue },
    SetParameter { effect: EffectId, name: String, value: ParameterValue },
    /// Same as `SetParameter` against whichever effect is active.
    SetActiveParameter { name: String, value: ParameterValue },
    ResetEffect(EffectId),
    ResetPreprocessing,
}

/// The full parameter record of a session: which effect is active, the
/// preprocessing adjustments and the parameters of every effect (so switching
/// effects keeps earlier settings).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StateRecord")]
pub struct AppState {
    pub active_effect: EffectId,
    pub preprocessing: PreprocessingParameters,
    effects: BTreeMap<EffectId, ParameterSet>,
}

/// Wire shape of [`AppState`] before normalization. Effect ids stay strings
/// here so a record written by a build with other effects still loads.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StateRecord {
    active_effect: Option<String>,
    preprocessing: PreprocessingParameters,
    effects: BTreeMap<String, ParameterSet>,
}

impl TryFrom<StateRecord> for AppState {
    type Error = CoreError;

    fn try_from(record: StateRecord) -> Result<Self> {
        let active_effect = match record.active_effect {
            Some(id) => id.parse().unwrap_or_else(|_| {
                warn!(effect = %id, fallback = %EffectId::default(), "unknown active effect in state record");
                EffectId::default()
            }),
            None => EffectId::default(),
        };
        let effects = record
            .effects
            .into_iter()
            .filter_map(|(id, params)| match id.parse::<EffectId>() {
                Ok(effect) => Some((effect, params)),
                Err(_) => {
                    warn!(effect = %id, "dropping parameters of unknown effect");
                    None
                }
            })
            .collect();
        let mut state = Self {
            active_effect,
            preprocessing: record.preprocessing,
            effects,
        };
        state.normalize()?;
        Ok(state)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            active_effect: EffectId::default(),
            preprocessing: PreprocessingParameters::default(),
            effects: EffectId::all()
                .into_iter()
                .map(|e| (e, ParameterSet::defaults(e)))
                .collect(),
        }
    }
}

impl AppState {
    pub fn new(active_effect: EffectId) -> Self {
        Self {
            active_effect,
            ..Self::default()
        }
    }

    /// Parse a JSON state record. Missing keys take their defaults and every
    /// stored value is normalized against its definition.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn parameters(&self, effect: EffectId) -> &ParameterSet {
        // normalize() and Default both populate every effect
        &self.effects[&effect]
    }

    pub fn active_parameters(&self) -> &ParameterSet {
        self.parameters(self.active_effect)
    }

    /// A detached copy to hand to a pipeline run.
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// Apply a message. Returns true if the record changed.
    pub fn update(&mut self, message: StateMessage) -> Result<bool> {
        match message {
            StateMessage::SelectEffect(effect) => {
                let changed = self.active_effect != effect;
                self.active_effect = effect;
                Ok(changed)
            }
            StateMessage::SetPreprocessing { name, value } => self.preprocessing.set(&name, value),
            StateMessage::SetParameter { effect, name, value } => {
                self.set_parameter(effect, &name, value)
            }
            StateMessage::SetActiveParameter { name, value } => {
                self.set_parameter(self.active_effect, &name, value)
            }
            StateMessage::ResetEffect(effect) => {
                let defaults = ParameterSet::defaults(effect);
                let changed = self.effects.get(&effect) != Some(&defaults);
                self.effects.insert(effect, defaults);
                Ok(changed)
            }
            StateMessage::ResetPreprocessing => {
                let defaults = PreprocessingParameters::default();
                let changed = self.preprocessing != defaults;
                self.preprocessing = defaults;
                Ok(changed)
            }
        }
    }

    /// Build the message for a `name=value` patch. Preprocessing keys win,
    /// anything else targets the active effect.
    pub fn parse_patch(&self, patch: &str) -> Result<StateMessage> {
        let (name, raw) = patch.split_once('=').ok_or_else(|| CoreError::UnknownParameter {
            effect: self.active_effect.id().to_string(),
            name: patch.to_string(),
        })?;
        let name = name.trim();
        let raw = raw.trim();

        if let Some(def) = PreprocessingParameters::parameter_definition(name) {
            return Ok(StateMessage::SetPreprocessing {
                name: name.to_string(),
                value: def.parse(raw)?,
            });
        }
        let def = self
            .active_effect
            .parameter_definition(name)
            .ok_or_else(|| CoreError::UnknownParameter {
                effect: self.active_effect.id().to_string(),
                name: name.to_string(),
            })?;
        Ok(StateMessage::SetActiveParameter {
            name: name.to_string(),
            value: def.parse(raw)?,
        })
    }

    fn set_parameter(&mut self, effect: EffectId, name: &str, value: ParameterValue) -> Result<bool> {
        let def = effect
            .parameter_definition(name)
            .ok_or_else(|| CoreError::UnknownParameter {
                effect: effect.id().to_string(),
                name: name.to_string(),
            })?;
        let value = match (effect, name, value) {
            (EffectId::CameraBloom, "customTimestamp", ParameterValue::Text(raw)) => {
                ParameterValue::Text(format_timestamp_input(&raw))
            }
            (_, _, value) => value,
        };
        let value = def.normalize(value)?;

        let params = self
            .effects
            .entry(effect)
            .or_insert_with(|| ParameterSet::defaults(effect));
        let changed = params.get(name) != Some(&value);
        params.insert(name, value);
        Ok(changed)
    }

    /// Fill in missing effects and parameters with defaults, drop unknown
    /// keys and bring every value back into range.
    fn normalize(&mut self) -> Result<()> {
        for effect in EffectId::all() {
            let stored = self.effects.remove(&effect).unwrap_or_default();
            let mut params = ParameterSet::new();
            for def in effect.parameter_definitions() {
                let value = match stored.get(def.name) {
                    Some(v) => def.normalize(v.clone())?,
                    None => def.default_value(),
                };
                params.insert(def.name, value);
            }
            self.effects.insert(effect, params);
        }

        for def in PreprocessingParameters::parameter_definitions() {
            if let Some(v) = self.preprocessing.get(def.name) {
                self.preprocessing.set(def.name, ParameterValue::Float(v))?;
            }
        }
        Ok(())
    }
}
