use super::{
    custom_data::{
        json_fields,
        CUSTOM_MEASUREMENT_PREFIX,
    },
    PointContext,
    PointGenerator,
};
use crate::point::Point;
use eyre::Result;
use std::collections::BTreeMap;

/// Several user defined measurements at once: one `custom_<name>` point per entry.
pub struct CustomDataMapPointGenerator<'a> {
    ctx: &'a PointContext,
    custom_data_map: &'a BTreeMap<String, BTreeMap<String, serde_json::Value>>,
    custom_data_map_tags: &'a BTreeMap<String, BTreeMap<String, String>>,
}

impl<'a> CustomDataMapPointGenerator<'a> {
    pub fn new(
        ctx: &'a PointContext,
        custom_data_map: &'a BTreeMap<String, BTreeMap<String, serde_json::Value>>,
        custom_data_map_tags: &'a BTreeMap<String, BTreeMap<String, String>>,
    ) -> Self {
        Self {
            ctx,
            custom_data_map,
            custom_data_map_tags,
        }
    }
}

impl PointGenerator for CustomDataMapPointGenerator<'_> {
    fn name(&self) -> &'static str {
        "Custom data map"
    }

    fn has_report(&mut self) -> bool {
        !self.custom_data_map.is_empty()
    }

    fn generate(&mut self) -> Result<Vec<Point>> {
        let mut points = Vec::with_capacity(self.custom_data_map.len());
        for (name, data) in self.custom_data_map {
            let mut builder = self
                .ctx
                .point(format!("{CUSTOM_MEASUREMENT_PREFIX}{name}"))
                .fields(json_fields(data));
            if !builder.has_fields() {
                debug!(measurement = %name, "custom data map entry without values");
                continue;
            }
            if let Some(tags) = self.custom_data_map_tags.get(name) {
                builder = builder.tags(tags.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            }
            points.push(builder.build()?);
        }
        Ok(points)
    }
}
