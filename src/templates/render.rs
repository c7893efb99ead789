// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Placeholder substitution for component templates.
//!
//! Templates reference context values as `{{.name}}`. Names the context does
//! not know render as the empty string; `{{/* ... */}}` comments render as
//! nothing. Any other action is rejected.

use crate::error::TemplateError;
use kube::api::ObjectMeta;
use regex::Regex;
use std::sync::LazyLock;

type Result<T> = std::result::Result<T, TemplateError>;

static ACTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{\{(.*?)\}\}").unwrap());
static FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.([A-Za-z_][A-Za-z0-9_]*)$").unwrap());

/// Values available to a template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    pub component_name: String,
    pub component_namespace: String,
    pub cluster_name: String,
    pub control_plane_name: String,
}

impl TemplateContext {
    pub fn new(meta: &ObjectMeta, control_plane_name: &str, cluster_name: &str) -> Self {
        Self {
            component_name: meta.name.clone().unwrap_or_default(),
            component_namespace: meta.namespace.clone().unwrap_or_default(),
            cluster_name: cluster_name.to_string(),
            control_plane_name: control_plane_name.to_string(),
        }
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        match key {
            "componentName" => Some(&self.component_name),
            "componentNamespace" => Some(&self.component_namespace),
            "clusterName" => Some(&self.cluster_name),
            "controlPlaneName" => Some(&self.control_plane_name),
            _ => None,
        }
    }
}

/// Substitute the context into a template
pub fn render(context: &TemplateContext, template: &str) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in ACTION_RE.captures_iter(template) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        push_text(&mut out, template, last, whole.start())?;
        last = whole.end();

        let inner = inner.as_str().trim();
        if inner.starts_with("/*") && inner.ends_with("*/") {
            continue;
        }

        let Some(name) = FIELD_RE.captures(inner).and_then(|c| c.get(1)) else {
            return Err(TemplateError::Render(format!(
                "unsupported action '{{{{{}}}}}' at offset {}",
                inner,
                whole.start()
            )));
        };
        out.push_str(context.lookup(name.as_str()).unwrap_or_default());
    }

    push_text(&mut out, template, last, template.len())?;
    Ok(out)
}

fn push_text(out: &mut String, template: &str, start: usize, end: usize) -> Result<()> {
    let text = &template[start..end];
    if let Some(pos) = text.find("{{") {
        return Err(TemplateError::Render(format!(
            "unterminated action at offset {}",
            start + pos
        )));
    }
    out.push_str(text);
    Ok(())
}
