#[cfg(test)]
mod tests {
    use std::{
        borrow::Cow,
        fmt::Write as _,
        sync::{Arc, Mutex},
        time::Instant,
    };

    use serde_json::{Value, json};
    use tracing::{
        Event, Level, Subscriber,
        field::{Field, Visit},
    };
    use tracing_subscriber::{
        layer::{Context, Layer},
        prelude::*,
    };

    use crate::{
        EntityState, HostContext, NavbarState, Resolved, Templatable, TemplateContext,
        TemplateError, TemplateEvaluator,
    };

    /// A captured log line: level plus flattened fields.
    #[derive(Debug, Clone)]
    struct Line {
        level: Level,
        text: String,
    }

    /// Records every event so tests can assert on logged failures.
    #[derive(Clone, Default)]
    struct Capture {
        lines: Arc<Mutex<Vec<Line>>>,
    }

    impl Capture {
        fn lines(&self) -> Vec<Line> {
            self.lines.lock().expect("capture lock").clone()
        }
    }

    impl<S: Subscriber> Layer<S> for Capture {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            struct Fields(String);
            impl Visit for Fields {
                fn record_str(&mut self, field: &Field, value: &str) {
                    let _ = write!(self.0, "{}={} ", field.name(), value);
                }
                fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
                    let _ = write!(self.0, "{}={:?} ", field.name(), value);
                }
            }
            let mut fields = Fields(String::new());
            event.record(&mut fields);
            self.lines.lock().expect("capture lock").push(Line {
                level: *event.metadata().level(),
                text: fields.0,
            });
        }
    }

    fn with_capture<R>(f: impl FnOnce() -> R) -> (R, Vec<Line>) {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let out = tracing::subscriber::with_default(subscriber, f);
        (out, capture.lines())
    }

    fn ctx_with(states: &[(&str, &str)], desktop: bool) -> TemplateContext {
        let mut host = HostContext::default();
        for (id, state) in states {
            host.states.insert((*id).to_string(), EntityState::new(*state));
        }
        TemplateContext::new(&host, NavbarState { is_desktop: desktop })
    }

    #[test]
    fn non_strings_pass_through_by_reference() {
        let eval = TemplateEvaluator::default();
        let ctx = TemplateContext::empty();
        for v in [
            json!(null),
            json!(1),
            json!(true),
            json!([1, 2]),
            json!({"a": "[[[ return 1 ]]]"}),
        ] {
            let out = eval.evaluate(&ctx, &v);
            assert!(matches!(out, Cow::Borrowed(r) if std::ptr::eq(r, &v)));
        }
        assert!(eval.evaluate_opt(&ctx, None).is_none());
        assert!(eval.cache().is_empty());
    }

    #[test]
    fn plain_strings_pass_through() {
        let eval = TemplateEvaluator::default();
        let ctx = TemplateContext::empty();
        for s in ["Home", "[[ return 1 ]]", "[[[ return 1", "x [[[ return 1 ]]]"] {
            let v = json!(s);
            assert_eq!(eval.evaluate(&ctx, &v).as_ref(), &v);
        }
        assert!(eval.cache().is_empty());
    }

    #[test]
    fn arithmetic_template() {
        let eval = TemplateEvaluator::default();
        let v = json!("[[[ return 1 + 1 ]]]");
        assert_eq!(
            eval.evaluate(&TemplateContext::empty(), &v).into_owned(),
            json!(2)
        );
    }

    #[test]
    fn reads_entity_state() {
        let eval = TemplateEvaluator::default();
        let ctx = ctx_with(&[("a", "on")], false);
        let v = json!("[[[ return states['a'].state ]]]");
        assert_eq!(eval.evaluate(&ctx, &v).into_owned(), json!("on"));
    }

    #[test]
    fn sees_user_hass_and_navbar() {
        let eval = TemplateEvaluator::default();
        let host: HostContext = serde_json::from_value(json!({
            "states": {"light.kitchen": {"state": "off", "attributes": {"brightness": 10}}},
            "user": {"id": "u1", "name": "Sam", "is_admin": true},
            "language": "en"
        }))
        .unwrap();
        let ctx = TemplateContext::new(&host, NavbarState { is_desktop: true });
        let cases = [
            ("[[[ return user.name ]]]", json!("Sam")),
            ("[[[ return user.is_admin ]]]", json!(true)),
            ("[[[ return hass.language ]]]", json!("en")),
            ("[[[ return navbar.isDesktop ]]]", json!(true)),
            (
                "[[[ return states['light.kitchen'].attributes.brightness * 2 ]]]",
                json!(20),
            ),
        ];
        for (template, want) in cases {
            assert_eq!(
                eval.evaluate(&ctx, &json!(template)).into_owned(),
                want,
                "{template}"
            );
        }
    }

    #[test]
    fn missing_user_is_unit() {
        let eval = TemplateEvaluator::default();
        let out = eval
            .try_evaluate(
                &TemplateContext::empty(),
                "[[[ if user == () { return \"anon\" } return user.name ]]]",
            )
            .unwrap();
        assert_eq!(out, Some(json!("anon")));
    }

    #[test]
    fn no_return_yields_original_and_warns() {
        let eval = TemplateEvaluator::default();
        let v = json!("[[[ 1 + 1 ]]]");
        let (out, lines) = with_capture(|| eval.evaluate(&TemplateContext::empty(), &v).into_owned());
        assert_eq!(out, v);
        let warn = lines
            .iter()
            .find(|l| l.level == Level::WARN)
            .expect("warning logged");
        assert!(warn.text.contains("did not return a value"));
        assert!(warn.text.contains("[[[ 1 + 1 ]]]"));
        assert!(!lines.iter().any(|l| l.level == Level::ERROR));
    }

    #[test]
    fn undefined_identifier_yields_original_and_errors() {
        let eval = TemplateEvaluator::default();
        let v = json!("[[[ return missing_thing.state ]]]");
        let (out, lines) = with_capture(|| eval.evaluate(&TemplateContext::empty(), &v).into_owned());
        assert_eq!(out, v);
        let err = lines
            .iter()
            .find(|l| l.level == Level::ERROR)
            .expect("error logged");
        assert!(err.text.contains("[[[ return missing_thing.state ]]]"));
        assert!(err.text.contains("missing_thing"));
    }

    #[test]
    fn syntax_errors_yield_original() {
        let eval = TemplateEvaluator::default();
        let v = json!("[[[ return ( ]]]");
        let (out, lines) = with_capture(|| eval.evaluate(&TemplateContext::empty(), &v).into_owned());
        assert_eq!(out, v);
        assert!(lines.iter().any(|l| l.level == Level::ERROR));
        assert!(matches!(
            eval.try_evaluate(&TemplateContext::empty(), "[[[ return ( ]]]"),
            Err(TemplateError::Syntax { .. })
        ));
    }

    #[test]
    fn try_evaluate_classifies() {
        let eval = TemplateEvaluator::default();
        let ctx = TemplateContext::empty();
        assert_eq!(eval.try_evaluate(&ctx, "[[[ return 3 ]]]"), Ok(Some(json!(3))));
        assert_eq!(eval.try_evaluate(&ctx, "[[[ 3 ]]]"), Ok(None));
        assert_eq!(
            eval.try_evaluate(&ctx, "plain"),
            Err(TemplateError::NotTemplate)
        );
    }

    #[test]
    fn wrapping_whitespace_shares_one_entry() {
        let eval = TemplateEvaluator::default();
        let ctx = TemplateContext::empty();
        eval.evaluate(&ctx, &json!("[[[return 5]]]"));
        eval.evaluate(&ctx, &json!("  [[[   return 5   ]]]\n"));
        let stats = eval.cache().stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.compilations, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn repeated_evaluation_compiles_once() {
        let eval = TemplateEvaluator::default();
        let ctx = ctx_with(&[("sensor.t", "21")], false);
        let v = json!("[[[ let t = states['sensor.t'].state; return `${t} C`; ]]]");
        for _ in 0..50 {
            assert_eq!(eval.evaluate(&ctx, &v).into_owned(), json!("21 C"));
        }
        let stats = eval.cache().stats();
        assert_eq!(stats.compilations, 1);
        assert_eq!(stats.hits, 49);
    }

    #[test]
    fn cache_hit_is_faster_than_first_compile() {
        let eval = TemplateEvaluator::default();
        let ctx = TemplateContext::empty();
        // A long body makes parsing dominate the first call.
        let body: String = (0..400).map(|i| format!("let v{i} = {i} * 2; ")).collect();
        let v = Value::String(format!("[[[ {body} return 1; ]]]"));

        let start = Instant::now();
        eval.evaluate(&ctx, &v);
        let first = start.elapsed();

        // Second lookup of the same body only hashes and compares.
        let cached_start = Instant::now();
        eval.cache().get_or_compile(&format!("{body} return 1;"));
        let cached = cached_start.elapsed();

        assert!(cached < first, "cached lookup {cached:?} vs first {first:?}");
        assert_eq!(eval.cache().stats().compilations, 1);
    }

    #[test]
    fn shared_cache_between_evaluators() {
        let first = TemplateEvaluator::default();
        let second = first.clone();
        first.evaluate(&TemplateContext::empty(), &json!("[[[ return 1 ]]]"));
        second.evaluate(&TemplateContext::empty(), &json!("[[[ return 1 ]]]"));
        assert_eq!(second.cache().stats().compilations, 1);
    }

    #[test]
    fn resolve_narrows_types() {
        let eval = TemplateEvaluator::default();
        let ctx = ctx_with(&[("binary_sensor.door", "on")], false);

        let hidden: Templatable<bool> =
            serde_json::from_value(json!("[[[ return states['binary_sensor.door'].state == \"off\" ]]]"))
                .unwrap();
        assert_eq!(eval.resolve(&ctx, &hidden), Resolved::Value(false));

        let literal: Templatable<bool> = Templatable::Literal(true);
        assert_eq!(eval.resolve(&ctx, &literal), Resolved::Value(true));

        let label: Templatable<String> =
            serde_json::from_value(json!("[[[ return 42 ]]]")).unwrap();
        assert_eq!(eval.resolve(&ctx, &label), Resolved::Value("42".to_string()));

        let on: Templatable<bool> =
            serde_json::from_value(json!("[[[ return states['binary_sensor.door'].state ]]]"))
                .unwrap();
        assert_eq!(eval.resolve(&ctx, &on), Resolved::Value(true));

        let empty: Templatable<bool> = serde_json::from_value(json!("[[[ return \"\" ]]]")).unwrap();
        assert_eq!(eval.resolve(&ctx, &empty), Resolved::Value(false));

        let count: Templatable<i64> = serde_json::from_value(json!("[[[ 7 ]]]")).unwrap();
        assert!(eval.resolve(&ctx, &count).is_fallback());
    }

    #[test]
    fn unusable_results_fall_back_with_a_warning() {
        let eval = TemplateEvaluator::default();
        let label: Templatable<String> =
            serde_json::from_value(json!("[[[ return #{a: 1} ]]]")).unwrap();
        let (resolved, lines) = with_capture(|| eval.resolve(&TemplateContext::empty(), &label));
        assert_eq!(resolved, Resolved::Fallback("[[[ return #{a: 1} ]]]".into()));
        assert!(lines.iter().any(|l| l.level == Level::WARN && l.text.contains("wrong type")));
    }

    #[test]
    fn returning_null_is_a_value() {
        let eval = TemplateEvaluator::default();
        let ctx = TemplateContext::empty();
        let v = json!("[[[ return user ]]]");
        let (out, lines) = with_capture(|| eval.evaluate(&ctx, &v).into_owned());
        assert_eq!(out, Value::Null);
        assert!(
            !lines.iter().any(|l| l.level <= Level::WARN),
            "unexpected warnings: {lines:?}"
        );
        assert_eq!(eval.try_evaluate(&ctx, "[[[ return (); ]]]"), Ok(Some(Value::Null)));

        let label: Templatable<String> = serde_json::from_value(v).unwrap();
        assert_eq!(eval.resolve(&ctx, &label), Resolved::Value(String::new()));
    }
}
