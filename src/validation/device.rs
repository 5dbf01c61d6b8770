use serde::{Deserialize, Serialize};

use super::{Rule, Schema, ValidationErrors, present};
use crate::shop::models::DeviceInput;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceForm {
    pub device_name: String,
}

const DEVICE_RULES: &[Rule<DeviceForm>] = &[Rule::new(
    "deviceName",
    "Device name is required",
    |f: &DeviceForm| present(&f.device_name),
)];

const DEVICE_SCHEMA: &[&[Rule<DeviceForm>]] = &[DEVICE_RULES];

impl Schema for DeviceForm {
    type Output = DeviceInput;

    fn rule_sets(&self) -> &'static [&'static [Rule<Self>]] {
        DEVICE_SCHEMA
    }

    fn build(&self) -> Result<DeviceInput, ValidationErrors> {
        Ok(DeviceInput {
            device_name: self.device_name.trim().to_string(),
            is_active: true,
        })
    }
}
