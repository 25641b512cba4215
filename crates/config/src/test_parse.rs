#[cfg(test)]
mod tests {
    use serde_json::json;
    use template::Templatable;

    use crate::*;

    fn load(src: &str) -> Result<NavbarConfig, Error> {
        load_from_str(src, &TemplateRegistry::new())
    }

    fn field_of(err: &Error) -> &str {
        match err {
            Error::Validation { field, .. } => field,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn minimal_config_parses_with_defaults() {
        let cfg = load(r#"{"routes": [{"url": "/lovelace/home", "icon": "mdi:home"}]}"#).unwrap();
        assert_eq!(cfg.routes.len(), 1);
        assert_eq!(cfg.desktop.position, DesktopPosition::Bottom);
        assert_eq!(cfg.desktop.min_width, DEFAULT_MIN_WIDTH);
        assert_eq!(cfg.haptic, HapticConfig::default());
        assert!(cfg.media_player.is_none());
    }

    #[test]
    fn templated_fields_are_kept_as_templates() {
        let cfg = load(
            r#"{
                "routes": [{
                    "url": "/lights",
                    "icon": "mdi:lightbulb",
                    "label": "[[[ return states['light.kitchen'].state ]]]",
                    "hidden": false,
                    "badge": {"show": "[[[ return true ]]]", "count": 3}
                }]
            }"#,
        )
        .unwrap();
        let item = &cfg.routes[0].item;
        assert!(item.label.as_ref().is_some_and(Templatable::is_template));
        assert_eq!(item.hidden, Some(Templatable::Literal(false)));
        let badge = item.badge.as_ref().unwrap();
        assert!(badge.show.as_ref().is_some_and(Templatable::is_template));
        assert_eq!(badge.count, Some(Templatable::Literal(json!(3))));
    }

    #[test]
    fn popup_and_actions_parse() {
        let cfg = load(
            r#"{
                "routes": [{
                    "icon": "mdi:dots-horizontal",
                    "tap_action": {"action": "open-popup"},
                    "hold_action": {"action": "quickbar", "mode": "commands"},
                    "popup": [
                        {"icon": "mdi:cog", "url": "/config"},
                        {"icon": "mdi:logout", "tap_action": {"action": "logout"}}
                    ]
                }]
            }"#,
        )
        .unwrap();
        let route = &cfg.routes[0];
        assert_eq!(route.item.action(Gesture::Tap), Some(&ActionConfig::OpenPopup));
        assert_eq!(
            route.item.action(Gesture::Hold),
            Some(&ActionConfig::Quickbar {
                mode: QuickbarMode::Commands
            })
        );
        assert_eq!(route.popup_items().len(), 2);
        assert_eq!(
            cfg.item(0, Some(1)).and_then(|i| i.action(Gesture::Tap)),
            Some(&ActionConfig::Logout)
        );
        assert!(cfg.item(0, Some(2)).is_none());
    }

    #[test]
    fn haptic_accepts_bool_or_object() {
        let all = load(r#"{"routes": [], "haptic": true}"#).unwrap();
        assert!(all.haptic.enabled_for(Gesture::Tap, false));
        assert!(all.haptic.enabled_for(Gesture::DoubleTap, true));

        let some = load(r#"{"routes": [], "haptic": {"tap_action": true}}"#).unwrap();
        assert!(some.haptic.enabled_for(Gesture::Tap, true));
        assert!(!some.haptic.enabled_for(Gesture::Tap, false));
        assert!(!some.haptic.enabled_for(Gesture::Hold, true));
    }

    #[test]
    fn route_without_icon_reports_its_index() {
        let err = load(
            r#"{"routes": [{"url": "/a", "icon": "mdi:a"}, {"url": "/b"}]}"#,
        )
        .unwrap_err();
        assert_eq!(field_of(&err), "routes[1]");
        assert!(err.to_string().contains("icon"));
    }

    #[test]
    fn unactionable_items_are_rejected() {
        let err = load(r#"{"routes": [{"icon": "mdi:a"}]}"#).unwrap_err();
        assert_eq!(field_of(&err), "routes[0]");

        // `popup` makes a route actionable but not a popup item.
        let err = load(
            r#"{"routes": [{"icon": "mdi:a", "popup": [{"icon": "mdi:b", "popup": []}]}]}"#,
        )
        .unwrap_err();
        assert_eq!(field_of(&err), "routes[0].popup[0]");
    }

    #[test]
    fn bad_action_reports_its_field() {
        let err = load(
            r#"{"routes": [{"icon": "mdi:a", "url": "/a",
                "popup": [{"icon": "mdi:b", "hold_action": {"navigation_path": "/x"}}]}]}"#,
        )
        .unwrap_err();
        assert_eq!(field_of(&err), "routes[0].popup[0].hold_action");
        assert!(err.to_string().contains("`action`"));
    }

    #[test]
    fn structural_errors() {
        assert_eq!(field_of(&load("[]").unwrap_err()), "");
        assert_eq!(field_of(&load("{}").unwrap_err()), "routes");
        assert_eq!(field_of(&load(r#"{"routes": {}}"#).unwrap_err()), "routes");
        assert_eq!(
            field_of(&load(r#"{"routes": [], "media_player": {}}"#).unwrap_err()),
            "media_player.entity"
        );
    }

    #[test]
    fn syntax_errors_carry_location() {
        let err = load("{\n  \"routes\": [\n    {\"icon\": }\n  ]\n}").unwrap_err();
        let Error::Parse { line, excerpt, .. } = &err else {
            panic!("expected a parse error, got {err:?}");
        };
        assert_eq!(*line, 3);
        assert!(excerpt.contains('^'));
    }

    #[test]
    fn type_errors_become_validation_errors() {
        let err = load(r#"{"routes": [], "desktop": {"min_width": "wide"}}"#).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn named_template_is_applied_before_validation() {
        let mut reg = TemplateRegistry::new();
        reg.insert(
            "base",
            json!({"routes": [{"url": "/home", "icon": "mdi:home"}], "desktop": {"position": "left"}}),
        );
        let cfg = load_from_str(r#"{"template": "base", "desktop": {"min_width": 1024}}"#, &reg)
            .unwrap();
        assert_eq!(cfg.template.as_deref(), Some("base"));
        assert_eq!(cfg.routes.len(), 1);
        assert_eq!(cfg.desktop.position, DesktopPosition::Left);
        assert_eq!(cfg.desktop.min_width, 1024);

        let err = load_from_str(r#"{"template": "missing"}"#, &reg).unwrap_err();
        assert_eq!(field_of(&err), "template");
    }

    #[test]
    fn files_attach_their_path() {
        let dir = std::env::temp_dir().join(format!("navbar-config-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("bad.json");
        std::fs::write(&file, r#"{"routes": [{"url": "/x"}]}"#).unwrap();
        let err = load_from_path(&file, &TemplateRegistry::new()).unwrap_err();
        assert_eq!(err.path(), Some(file.as_path()));
        assert!(err.pretty().contains("bad.json"));

        let missing = load_from_path(&dir.join("nope.json"), &TemplateRegistry::new()).unwrap_err();
        assert!(matches!(missing, Error::Read { .. }));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
