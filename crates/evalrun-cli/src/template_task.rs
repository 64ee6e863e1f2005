//! Task used by `evalrun run`: renders `params.template` against the eval input.

use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use evalrun_core::interpolate::interpolate;
use evalrun_core::model::Params;
use evalrun_core::task::{RunFieldSetter, TaskRunner};
use serde_json::{json, Value};

pub struct TemplateTask;

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Object inputs expose each field; any other input is exposed as `input`.
fn template_values(input: &Value) -> HashMap<String, String> {
    match input {
        Value::Object(fields) => fields
            .iter()
            .map(|(key, value)| (key.clone(), stringify(value)))
            .collect(),
        Value::Null => HashMap::new(),
        other => HashMap::from([("input".to_string(), stringify(other))]),
    }
}

#[async_trait]
impl TaskRunner for TemplateTask {
    async fn run(
        &self,
        eval_id: &str,
        input: &Value,
        params: &Params,
        run_fields: &RunFieldSetter,
    ) -> anyhow::Result<Value> {
        let template = params
            .get("template")
            .and_then(Value::as_str)
            .with_context(|| format!("eval {eval_id}: params.template must be a string"))?;

        let rendered = interpolate(template, &template_values(input));

        let mut fields = Params::new();
        fields.insert("rendered_chars".into(), json!(rendered.chars().count()));
        run_fields.set(fields);

        Ok(Value::String(rendered))
    }
}
