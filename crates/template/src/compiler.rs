//! Compilation of template bodies into reusable rhai programs.

use std::borrow::Cow;

use rhai::{AST, Dynamic, Engine, Scope};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::{TemplateContext, TemplateError};

/// Names under which the four template inputs are bound, in calling order.
pub const PARAMS: [&str; 4] = ["states", "user", "hass", "navbar"];

/// Scope name of the marker a body evaluates to when it runs off its end.
const FALLTHROUGH: &str = "__template_fallthrough__";

/// Value only produced by a body that finished without `return`.
#[derive(Debug, Clone, Copy)]
struct Fallthrough;

/// Interpreter limits applied to every template invocation.
///
/// These bound runaway bodies (unbounded loops, deep recursion); they are not a security
/// boundary, template authors are trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateSettings {
    /// Maximum number of interpreter operations per invocation (0 disables the limit).
    pub max_operations: u64,
    /// Maximum function call nesting.
    pub max_call_levels: usize,
    /// Maximum expression nesting at global level.
    pub max_expr_depth: usize,
    /// Maximum expression nesting inside functions.
    pub max_function_expr_depth: usize,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            max_operations: 200_000,
            max_call_levels: 64,
            max_expr_depth: 128,
            max_function_expr_depth: 64,
        }
    }
}

/// A template body compiled once and invoked many times.
///
/// Parse failures are kept inside the entry and reported on every invocation.
#[derive(Debug)]
pub struct CompiledTemplate {
    /// Cleaned body this entry was compiled from.
    body: String,
    /// Parsed program, or the parse failure to report at call time.
    program: Result<AST, TemplateError>,
}

impl CompiledTemplate {
    /// The cleaned body this entry was compiled from.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// True when the body parsed successfully.
    pub fn is_valid(&self) -> bool {
        self.program.is_ok()
    }
}

/// Owns the interpreter used to compile and run template bodies.
pub struct TemplateCompiler {
    engine: Engine,
}

impl Default for TemplateCompiler {
    fn default() -> Self {
        Self::new(TemplateSettings::default())
    }
}

impl TemplateCompiler {
    /// Create a compiler whose interpreter enforces `settings`.
    pub fn new(settings: TemplateSettings) -> Self {
        let mut engine = Engine::new();
        configure_engine(&mut engine, settings);
        Self { engine }
    }

    /// Compile `body` as a list of statements over `states`, `user`, `hass` and `navbar`.
    ///
    /// The body is not wrapped in an implicit `return`: a body that never executes `return`
    /// produces no value. Parse errors are deferred to [`TemplateCompiler::invoke`].
    pub fn compile(&self, body: &str) -> CompiledTemplate {
        let program = self
            .engine
            .compile(script_source(body))
            .map_err(|e| TemplateError::from_parse(&e));
        if let Err(e) = &program {
            debug!(error = %e, "template body failed to parse");
        }
        trace!(len = body.len(), "template_compiled");
        CompiledTemplate {
            body: body.to_string(),
            program,
        }
    }

    /// Run `template` against `ctx`.
    ///
    /// Returns `Ok(None)` when the body finished without executing `return`. An explicit
    /// `return ()` is a value (null) and comes back as `Some` unit.
    pub fn invoke(
        &self,
        template: &CompiledTemplate,
        ctx: &TemplateContext,
    ) -> Result<Option<Dynamic>, TemplateError> {
        let ast = template.program.as_ref().map_err(Clone::clone)?;
        let mut scope = Scope::new();
        let [states, user, hass, navbar] = PARAMS;
        scope.push_constant_dynamic(states, ctx.states.clone());
        scope.push_constant_dynamic(user, ctx.user.clone());
        scope.push_constant_dynamic(hass, ctx.hass.clone());
        scope.push_constant_dynamic(navbar, ctx.navbar.clone());
        scope.push_constant(FALLTHROUGH, Fallthrough);

        let out = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, ast)
            .map_err(|e| TemplateError::from_eval(&e))?;
        Ok(if out.is::<Fallthrough>() { None } else { Some(out) })
    }
}

/// Wrap `body` so that only an explicit `return` yields a value.
///
/// The body runs as a block whose value is discarded; the script then evaluates to the
/// fallthrough marker. A `return` inside the block ends the whole script with its value.
fn script_source(body: &str) -> String {
    let body = normalize_quotes(body);
    format!("{{\n{body}\n}}\n{FALLTHROUGH}")
}

/// Where the quote scanner currently is.
#[derive(Clone, Copy)]
enum Scan {
    /// Plain code; the count tracks braces opened inside a `${...}` interpolation.
    Code(usize),
    /// Inside a backtick string.
    Backtick,
}

/// Rewrite single-quoted literals (`states['light.x']`) as double-quoted strings.
///
/// rhai reads `'...'` as a character literal, which rejects the bracket-index style template
/// authors use for entity ids. Double-quoted and backtick strings and comments are left alone,
/// and code inside `${...}` interpolations is rewritten too.
pub(crate) fn normalize_quotes(body: &str) -> Cow<'_, str> {
    if !body.contains('\'') {
        return Cow::Borrowed(body);
    }
    let mut out = String::with_capacity(body.len() + 8);
    let mut stack = vec![Scan::Code(0)];
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        let nested = stack.len() > 1;
        let Some(top) = stack.last_mut() else {
            break;
        };
        match top {
            Scan::Backtick => {
                out.push(c);
                if c == '`' {
                    stack.pop();
                } else if c == '$' && chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    stack.push(Scan::Code(0));
                }
            }
            Scan::Code(depth) => match c {
                '\'' => {
                    out.push('"');
                    while let Some(c) = chars.next() {
                        match c {
                            '\'' => break,
                            '"' => out.push_str("\\\""),
                            '\\' => match chars.next() {
                                Some('\'') => out.push('\''),
                                Some(e) => {
                                    out.push('\\');
                                    out.push(e);
                                }
                                None => out.push('\\'),
                            },
                            c => out.push(c),
                        }
                    }
                    out.push('"');
                }
                '"' => {
                    out.push(c);
                    while let Some(c) = chars.next() {
                        out.push(c);
                        match c {
                            '"' => break,
                            '\\' => out.extend(chars.next()),
                            _ => {}
                        }
                    }
                }
                '`' => {
                    out.push(c);
                    stack.push(Scan::Backtick);
                }
                '/' if chars.peek() == Some(&'/') => {
                    out.push(c);
                    for c in chars.by_ref() {
                        out.push(c);
                        if c == '\n' {
                            break;
                        }
                    }
                }
                '/' if chars.peek() == Some(&'*') => {
                    out.push(c);
                    let mut prev = '\0';
                    for c in chars.by_ref() {
                        out.push(c);
                        if prev == '*' && c == '/' {
                            break;
                        }
                        prev = c;
                    }
                }
                '{' => {
                    *depth += 1;
                    out.push(c);
                }
                '}' if *depth == 0 && nested => {
                    stack.pop();
                    out.push(c);
                }
                '}' => {
                    *depth = depth.saturating_sub(1);
                    out.push(c);
                }
                c => out.push(c),
            },
        }
    }
    Cow::Owned(out)
}

/// Configure the interpreter shared by all template invocations.
fn configure_engine(engine: &mut Engine, settings: TemplateSettings) {
    engine.on_print(|s| info!(target: "template::rhai", "{}", s));
    engine.on_debug(|s, src, pos| {
        debug!(target: "template::rhai", "{} @ {:?}:{:?}", s, src, pos);
    });

    engine.set_max_operations(settings.max_operations);
    engine.set_max_call_levels(settings.max_call_levels);
    engine.set_max_expr_depths(settings.max_expr_depth, settings.max_function_expr_depth);
}
