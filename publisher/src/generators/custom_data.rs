use super::{
    PointContext,
    PointGenerator,
};
use crate::point::{
    FieldValue,
    Point,
};
use buildflux_config::DEFAULT_MEASUREMENT_NAME;
use eyre::Result;
use std::collections::BTreeMap;

const DEFAULT_CUSTOM_MEASUREMENT: &str = "jenkins_custom_data";

/// Prepended to user chosen measurement names of custom data.
pub(crate) const CUSTOM_MEASUREMENT_PREFIX: &str = "custom_";

/// A single point made of user supplied values, e.g. computed in a pipeline script.
pub struct CustomDataPointGenerator<'a> {
    ctx: &'a PointContext,
    custom_data: &'a BTreeMap<String, serde_json::Value>,
    custom_data_tags: &'a BTreeMap<String, String>,
    measurement_name: &'a str,
}

impl<'a> CustomDataPointGenerator<'a> {
    pub fn new(
        ctx: &'a PointContext,
        custom_data: &'a BTreeMap<String, serde_json::Value>,
        custom_data_tags: &'a BTreeMap<String, String>,
        measurement_name: &'a str,
    ) -> Self {
        Self {
            ctx,
            custom_data,
            custom_data_tags,
            measurement_name,
        }
    }

    fn measurement(&self) -> String {
        if self.measurement_name.is_empty() || self.measurement_name == DEFAULT_MEASUREMENT_NAME {
            DEFAULT_CUSTOM_MEASUREMENT.to_string()
        } else {
            format!("{CUSTOM_MEASUREMENT_PREFIX}{}", self.measurement_name)
        }
    }
}

impl PointGenerator for CustomDataPointGenerator<'_> {
    fn name(&self) -> &'static str {
        "Custom data"
    }

    fn has_report(&mut self) -> bool {
        !self.custom_data.is_empty()
    }

    fn generate(&mut self) -> Result<Vec<Point>> {
        let point = self
            .ctx
            .point(self.measurement())
            .fields(json_fields(self.custom_data))
            .tags(self.custom_data_tags.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .build()?;
        Ok(vec![point])
    }
}

pub(crate) fn json_fields<'m>(
    data: &'m BTreeMap<String, serde_json::Value>,
) -> impl Iterator<Item = (&'m str, FieldValue)> + 'm {
    data.iter()
        .filter_map(|(key, value)| FieldValue::from_json(value).map(|value| (key.as_str(), value)))
}
