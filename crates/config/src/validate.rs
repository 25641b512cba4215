//! Structural validation of raw navbar configuration.
//!
//! Runs on the JSON tree before typed deserialization so that every failure carries the field
//! path it was found at.

use serde_json::{Map, Value};

use crate::{ActionConfig, Error, Gesture, action::kind};

/// Keys that make an item actionable.
const ACTIONABLE_KEYS: [&str; 5] = [
    "url",
    "popup",
    "tap_action",
    "hold_action",
    "double_tap_action",
];

/// Validate a raw configuration tree. The first problem found is returned.
pub fn validate(config: &Value) -> Result<(), Error> {
    let Value::Object(root) = config else {
        return Err(Error::validation(
            "",
            format!("configuration must be an object, got {}", kind(config)),
        ));
    };
    let routes = match root.get("routes") {
        None | Some(Value::Null) => {
            return Err(Error::validation("routes", "`routes` is required"));
        }
        Some(Value::Array(routes)) => routes,
        Some(other) => {
            return Err(Error::validation(
                "routes",
                format!("`routes` must be a list, got {}", kind(other)),
            ));
        }
    };

    for (i, route) in routes.iter().enumerate() {
        let field = format!("routes[{i}]");
        let obj = as_item(route, &field)?;
        validate_item(obj, &field, true)?;

        match obj.get("popup") {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for (j, item) in items.iter().enumerate() {
                    let field = format!("{field}.popup[{j}]");
                    validate_item(as_item(item, &field)?, &field, false)?;
                }
            }
            Some(other) => {
                return Err(Error::validation(
                    format!("{field}.popup"),
                    format!("popup must be a list, got {}", kind(other)),
                ));
            }
        }
    }

    if let Some(mp) = root.get("media_player").filter(|v| !v.is_null()) {
        let Value::Object(mp) = mp else {
            return Err(Error::validation(
                "media_player",
                format!("media_player must be an object, got {}", kind(mp)),
            ));
        };
        if mp.get("entity").is_none_or(Value::is_null) {
            return Err(Error::validation(
                "media_player.entity",
                "media_player requires an entity",
            ));
        }
    }

    Ok(())
}

/// Require `value` to be an object.
fn as_item<'a>(value: &'a Value, field: &str) -> Result<&'a Map<String, Value>, Error> {
    value.as_object().ok_or_else(|| {
        Error::validation(field, format!("expected an object, got {}", kind(value)))
    })
}

/// Check icon/image presence, actionability and every action config of one item.
fn validate_item(obj: &Map<String, Value>, field: &str, is_route: bool) -> Result<(), Error> {
    let present = |k: &str| obj.get(k).is_some_and(|v| !v.is_null());

    if !present("icon") && !present("image") {
        let what = if is_route { "route" } else { "popup item" };
        return Err(Error::validation(
            field,
            format!("{what} needs an `icon` or an `image`"),
        ));
    }

    let actionable = ACTIONABLE_KEYS
        .iter()
        .filter(|k| is_route || **k != "popup")
        .any(|k| present(k));
    if !actionable {
        let keys = if is_route {
            "`url`, `popup`, `tap_action`, `hold_action` or `double_tap_action`"
        } else {
            "`url`, `tap_action`, `hold_action` or `double_tap_action`"
        };
        return Err(Error::validation(field, format!("needs one of {keys}")));
    }

    for gesture in Gesture::ALL {
        let key = gesture.config_key();
        if let Some(action) = obj.get(key).filter(|v| !v.is_null()) {
            ActionConfig::from_value(action)
                .map_err(|msg| Error::validation(format!("{field}.{key}"), msg))?;
        }
    }
    Ok(())
}
