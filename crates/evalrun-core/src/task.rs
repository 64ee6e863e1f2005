//! The function under test.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::model::Params;

/// Function under test. Invoked once per execution attempt.
///
/// Errors are never propagated out of a run; they are captured on the
/// execution's record.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn run(
        &self,
        eval_id: &str,
        input: &Value,
        params: &Params,
        run_fields: &RunFieldSetter,
    ) -> anyhow::Result<Value>;
}

/// Lets a task attach custom fields to its eventual run record.
/// The last call wins; if never called the record carries no run fields.
#[derive(Debug, Default)]
pub struct RunFieldSetter {
    fields: Mutex<Option<Params>>,
}

impl RunFieldSetter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, fields: Params) {
        let mut slot = match self.fields.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(fields);
    }

    pub fn into_fields(self) -> Option<Params> {
        match self.fields.into_inner() {
            Ok(fields) => fields,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Adapter for synchronous closures.
pub struct SyncTask<F> {
    f: F,
}

impl<F> SyncTask<F>
where
    F: Fn(&str, &Value, &Params, &RunFieldSetter) -> anyhow::Result<Value> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> TaskRunner for SyncTask<F>
where
    F: Fn(&str, &Value, &Params, &RunFieldSetter) -> anyhow::Result<Value> + Send + Sync,
{
    async fn run(
        &self,
        eval_id: &str,
        input: &Value,
        params: &Params,
        run_fields: &RunFieldSetter,
    ) -> anyhow::Result<Value> {
        (self.f)(eval_id, input, params, run_fields)
    }
}
