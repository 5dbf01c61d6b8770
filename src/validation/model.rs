use serde::{Deserialize, Serialize};

use super::{Rule, Schema, ValidationErrors, parse_id, present};
use crate::shop::models::{Model, ModelInput};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelForm {
    pub device_id: String,
    pub model_name: String,
}

impl ModelForm {
    #[must_use]
    pub fn from_model(model: &Model) -> Self {
        Self {
            device_id: model.device_id.to_string(),
            model_name: model.model_name.clone(),
        }
    }
}

const MODEL_RULES: &[Rule<ModelForm>] = &[
    Rule::new("deviceId", "Device is required", |f: &ModelForm| {
        parse_id(&f.device_id).is_some()
    }),
    Rule::new("modelName", "Model name is required", |f: &ModelForm| {
        present(&f.model_name)
    }),
];

const MODEL_SCHEMA: &[&[Rule<ModelForm>]] = &[MODEL_RULES];

impl Schema for ModelForm {
    type Output = ModelInput;

    fn rule_sets(&self) -> &'static [&'static [Rule<Self>]] {
        MODEL_SCHEMA
    }

    fn build(&self) -> Result<ModelInput, ValidationErrors> {
        let device_id = parse_id(&self.device_id)
            .ok_or_else(|| ValidationErrors::single("deviceId", "Device is required"))?;
        Ok(ModelInput {
            device_id,
            model_name: self.model_name.trim().to_string(),
        })
    }
}
