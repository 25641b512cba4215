//! Template evaluation with logged, non-fatal fallback.

use std::{any, borrow::Cow, sync::Arc};

use rhai::serde::from_dynamic;
use serde_json::Value;
use tracing::{error, warn};

use crate::{
    FromTemplateValue, Resolved, Templatable, TemplateCache, TemplateContext, TemplateError,
    clean_template, is_template,
};

/// Evaluates configuration values that may be templates.
///
/// Non-template values pass through untouched. Template failures are logged and the original
/// template text is handed back, so a broken template degrades to visible text instead of
/// crashing the caller.
#[derive(Clone, Default)]
pub struct TemplateEvaluator {
    cache: Arc<TemplateCache>,
}

impl TemplateEvaluator {
    /// Create an evaluator backed by a shared `cache`.
    pub fn new(cache: Arc<TemplateCache>) -> Self {
        Self { cache }
    }

    /// The cache backing this evaluator.
    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    /// Effective value of `value` against `ctx`.
    ///
    /// Returns `value` itself (borrowed) unless it is a template that ran and returned something.
    pub fn evaluate<'a>(&self, ctx: &TemplateContext, value: &'a Value) -> Cow<'a, Value> {
        let Some(s) = value.as_str() else {
            return Cow::Borrowed(value);
        };
        match self.run_logged(ctx, s) {
            Some(out) => Cow::Owned(out),
            None => Cow::Borrowed(value),
        }
    }

    /// Like [`TemplateEvaluator::evaluate`] for fields that may be absent.
    pub fn evaluate_opt<'a>(
        &self,
        ctx: &TemplateContext,
        value: Option<&'a Value>,
    ) -> Option<Cow<'a, Value>> {
        value.map(|v| self.evaluate(ctx, v))
    }

    /// Evaluate a template string and report the classified outcome without logging.
    ///
    /// `Ok(None)` means the body finished without a `return`; `return ()` yields `Some(Null)`.
    pub fn try_evaluate(
        &self,
        ctx: &TemplateContext,
        template: &str,
    ) -> Result<Option<Value>, TemplateError> {
        let body = clean_template(template).ok_or(TemplateError::NotTemplate)?;
        let compiled = self.cache.get_or_compile(&body);
        let Some(out) = self.cache.compiler().invoke(&compiled, ctx)? else {
            return Ok(None);
        };
        from_dynamic::<Value>(&out)
            .map(Some)
            .map_err(|e| TemplateError::Conversion(e.to_string()))
    }

    /// Narrow a [`Templatable`] into a concrete `T`.
    ///
    /// Results are converted with [`FromTemplateValue`]; one `T` cannot use is logged and falls
    /// back.
    pub fn resolve<T>(&self, ctx: &TemplateContext, value: &Templatable<T>) -> Resolved<T>
    where
        T: FromTemplateValue + Clone,
    {
        let template = match value {
            Templatable::Literal(v) => return Resolved::Value(v.clone()),
            Templatable::Template(t) => t.as_str(),
        };
        let Some(out) = self.run_logged(ctx, template) else {
            return Resolved::Fallback(template.to_string());
        };
        match T::from_template_value(out) {
            Ok(v) => Resolved::Value(v),
            Err(e) => {
                warn!(
                    template = template,
                    expected = any::type_name::<T>(),
                    error = %e,
                    "template returned a value of the wrong type"
                );
                Resolved::Fallback(template.to_string())
            }
        }
    }

    /// Resolve an optional templatable field, treating absence as `None`.
    pub fn resolve_opt<T>(
        &self,
        ctx: &TemplateContext,
        value: Option<&Templatable<T>>,
    ) -> Option<Resolved<T>>
    where
        T: FromTemplateValue + Clone,
    {
        value.map(|v| self.resolve(ctx, v))
    }

    /// Run `s` if it is a template, logging failures. `None` means "use the original".
    fn run_logged(&self, ctx: &TemplateContext, s: &str) -> Option<Value> {
        if !is_template(s) {
            return None;
        }
        let Some(body) = clean_template(s) else {
            error!(template = s, "template detected but could not be cleaned");
            return None;
        };
        let compiled = self.cache.get_or_compile(&body);
        let out = match self.cache.compiler().invoke(&compiled, ctx) {
            Ok(Some(out)) => out,
            Ok(None) => {
                warn!(template = s, "template did not return a value");
                return None;
            }
            Err(e) => {
                error!(template = s, error = %e, "template evaluation failed");
                return None;
            }
        };
        match from_dynamic::<Value>(&out) {
            Ok(v) => Some(v),
            Err(e) => {
                error!(template = s, error = %e, "template result could not be converted");
                None
            }
        }
    }
}
