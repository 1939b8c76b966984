// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Template normalization of state fields.
//!
//! During initialization a component's `input`, `env`, and `trigger` are
//! evaluated against the normalization context
//! `{trigger: {input}, input, output, env}`. Template expressions use
//! `{{ dotted.path }}` selectors into that context.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::error::StateError;
use crate::model::BaseState;

/// Valid dotted-path selector inside `{{ }}`, with an optional leading dot.
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\.?[a-zA-Z_][a-zA-Z0-9_-]*(?:\.[a-zA-Z_][a-zA-Z0-9_-]*)*$")
        .expect("constant regex pattern is valid")
});

/// Errors raised while rendering a template string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unclosed template expression: {0}")]
    Unclosed(String),

    #[error("invalid template expression: {0}")]
    InvalidExpression(String),
}

/// Collaborator interface: renders one template string against a context.
pub trait TemplateEngine: Send + Sync {
    fn render(&self, template: &str, ctx: &Value) -> Result<String, TemplateError>;
}

/// Default engine: `{{ dotted.path }}` selectors resolved against the
/// JSON context. Scalars render inline; maps and sequences render as
/// compact JSON; unknown paths render empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct DotPathEngine;

impl DotPathEngine {
    fn resolve<'a>(ctx: &'a Value, path: &str) -> Option<&'a Value> {
        let mut current = ctx;
        for segment in path.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    fn render_value(value: Option<&Value>) -> String {
        match value {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Number(n)) => n.to_string(),
            // Maps and sequences render as compact JSON
            Some(other) => other.to_string(),
        }
    }
}

impl TemplateEngine for DotPathEngine {
    fn render(&self, template: &str, ctx: &Value) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                return Err(TemplateError::Unclosed(rest[start..].to_string()));
            };
            let expression = after[..end].trim();
            if !PATH_PATTERN.is_match(expression) {
                return Err(TemplateError::InvalidExpression(expression.to_string()));
            }
            let path = expression.strip_prefix('.').unwrap_or(expression);
            out.push_str(&Self::render_value(Self::resolve(ctx, path)));
            rest = &after[end + 2..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// Evaluates state fields through a [`TemplateEngine`].
#[derive(Clone)]
pub struct Normalizer {
    engine: Option<Arc<dyn TemplateEngine>>,
}

impl Normalizer {
    pub fn new(engine: Arc<dyn TemplateEngine>) -> Self {
        Self { engine: Some(engine) }
    }

    /// Normalizer with no engine; any evaluation fails with
    /// `EngineUninitialized`.
    pub fn without_engine() -> Self {
        Self { engine: None }
    }

    fn engine(&self) -> Result<&dyn TemplateEngine, StateError> {
        self.engine.as_deref().ok_or(StateError::EngineUninitialized)
    }

    /// Normalization context exposed to templates.
    pub fn context(state: &BaseState) -> Value {
        json!({
            "trigger": { "input": state.trigger },
            "input": state.input,
            "output": state.output,
            "env": state.env,
        })
    }

    /// Recursively evaluate one value: strings containing template markers
    /// render through the engine; maps and sequences are walked;
    /// everything else passes through unchanged.
    pub fn parse_value(&self, value: &Value, ctx: &Value) -> Result<Value, StateError> {
        let engine = self.engine()?;
        walk(engine, value, ctx)
            .map_err(|source| StateError::TemplateParse { field: "value", source })
    }

    /// Evaluate a state's `input`, `env`, and `trigger`, in that order,
    /// against the context built from the state before evaluation.
    pub fn parse_templates(&self, state: &mut BaseState) -> Result<(), StateError> {
        let engine = self.engine()?;
        let ctx = Self::context(state);

        let input = walk_map(engine, &state.input, &ctx)
            .map_err(|source| StateError::TemplateParse { field: "input", source })?;

        let mut env = compozy_core::Env::new();
        for (key, value) in state.env.iter() {
            let rendered = engine
                .render(value, &ctx)
                .map_err(|source| StateError::TemplateParse { field: "env", source })?;
            env.set(key, rendered);
        }

        let trigger = walk_map(engine, &state.trigger, &ctx)
            .map_err(|source| StateError::TemplateParse { field: "trigger", source })?;

        state.input = input;
        state.env = env;
        state.trigger = trigger;
        Ok(())
    }
}

fn walk(engine: &dyn TemplateEngine, value: &Value, ctx: &Value) -> Result<Value, TemplateError> {
    match value {
        Value::String(s) if s.contains("{{") => Ok(Value::String(engine.render(s, ctx)?)),
        Value::Array(items) => {
            let walked: Result<Vec<Value>, TemplateError> =
                items.iter().map(|item| walk(engine, item, ctx)).collect();
            Ok(Value::Array(walked?))
        }
        Value::Object(map) => Ok(Value::Object(walk_map(engine, map, ctx)?)),
        other => Ok(other.clone()),
    }
}

fn walk_map(
    engine: &dyn TemplateEngine,
    map: &Map<String, Value>,
    ctx: &Value,
) -> Result<Map<String, Value>, TemplateError> {
    map.iter().map(|(k, v)| Ok((k.clone(), walk(engine, v, ctx)?))).collect()
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
