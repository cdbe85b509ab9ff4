//! Value-binding resolution.
//!
//! Every scalar in a blueprint modifier resolves through one rule: the
//! case-insensitive, trimmed prefix `states.` / `inputs.` / `logics.` selects
//! the namespace, anything else is a literal. The same classification is
//! reused for prop values, style values, state initials and effect watch
//! entries, so it lives in one place.

use serde_json::Value;

const STATES_PREFIX: &str = "states.";
const INPUTS_PREFIX: &str = "inputs.";
const LOGICS_PREFIX: &str = "logics.";

#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// `states.value`: references a local state identifier.
    State(String),
    /// `inputs.loopElement.title??value`: references an incoming input slot;
    /// the expression may dereference past the slot name.
    Input(String),
    /// `logics.onClick` / `logics.getColor()`: references a function in the
    /// companion logic module. `invoked` marks the trailing-`()` form that is
    /// called immediately instead of forwarded as a closure.
    Logic { name: String, invoked: bool },
    /// Anything else, JSON-encoded verbatim into the generated source.
    Literal(Value),
}

fn strip_prefix_ci<'a>(trimmed: &'a str, prefix: &str) -> Option<&'a str> {
    match trimmed.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => trimmed.get(prefix.len()..),
        _ => None,
    }
}

impl Binding {
    pub fn classify(value: &Value) -> Binding {
        match value {
            Value::String(s) => Binding::classify_str(s),
            other => Binding::Literal(other.clone()),
        }
    }

    pub fn classify_str(raw: &str) -> Binding {
        let trimmed = raw.trim();
        if let Some(rest) = strip_prefix_ci(trimmed, STATES_PREFIX) {
            return Binding::State(rest.to_string());
        }
        if let Some(rest) = strip_prefix_ci(trimmed, INPUTS_PREFIX) {
            return Binding::Input(rest.to_string());
        }
        if let Some(rest) = strip_prefix_ci(trimmed, LOGICS_PREFIX) {
            let invoked = rest.ends_with("()");
            let name = rest.trim_end_matches("()").to_string();
            return Binding::Logic { name, invoked };
        }
        Binding::Literal(Value::String(raw.to_string()))
    }

    /// Expression form used for prop values.
    pub fn prop_expression(&self) -> String {
        match self {
            Binding::State(name) | Binding::Input(name) => name.clone(),
            Binding::Logic {
                name,
                invoked: true,
            } => format!("{}({{component,args:[]}})", name),
            Binding::Logic {
                name,
                invoked: false,
            } => format!("(...args)=>{}({{component,args}})", name),
            Binding::Literal(value) => encode_literal(value),
        }
    }

    /// Expression form used inside the memoized style map. Logic entries are
    /// always invoked with the component context here.
    pub fn style_expression(&self) -> String {
        match self {
            Binding::State(name) | Binding::Input(name) => name.clone(),
            Binding::Logic { name, .. } => format!("{}({{component,args: []}})", name),
            Binding::Literal(value) => encode_literal(value),
        }
    }
}

/// JSON-encode a literal; `null`/absent encodes as the empty string, matching
/// the generated-source contract for optional prop values.
pub fn encode_literal(value: &Value) -> String {
    match value {
        Value::Null => "\"\"".to_string(),
        other => other.to_string(),
    }
}

/// Initial-value expression for a state declaration: an `inputs.` reference
/// becomes the bare input identifier, everything else a JSON literal.
pub fn state_initial(value: &Value) -> String {
    if let Value::String(s) = value {
        if let Binding::Input(rest) = Binding::classify_str(s) {
            return rest;
        }
    }
    value.to_string()
}

/// Effect-body expression: a `logics.` reference resolves to the bare
/// function name, anything else is emitted verbatim (`{}` when absent).
pub fn effect_body(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => match Binding::classify_str(s) {
            Binding::Logic { name, .. } => name,
            _ => s.clone(),
        },
        Some(other) => other.to_string(),
        None => "{}".to_string(),
    }
}

/// Watch-list entry: state/input references are stripped to identifiers,
/// unprefixed entries become opaque quoted dependency keys, null entries are
/// dropped.
pub fn watch_dependency(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => match Binding::classify_str(s) {
            Binding::State(name) | Binding::Input(name) => Some(name),
            _ => Some(format!("\"{}\"", s)),
        },
        other => Some(format!("\"{}\"", other)),
    }
}

/// Leading identifier of a namespaced reference: `loopElement.title??value`
/// yields `loopElement`. This is the name that appears in function
/// signatures and memo dependency lists, while the full expression is used
/// at the use site.
pub fn leading_identifier(reference: &str) -> String {
    reference
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
        .collect()
}

/// Input slot name referenced by a value, if any.
pub fn input_name(value: &Value) -> Option<String> {
    match Binding::classify(value) {
        Binding::Input(rest) => Some(leading_identifier(&rest)),
        _ => None,
    }
}

/// Logic function name referenced by a value, if any.
pub fn logic_name(value: &Value) -> Option<String> {
    match Binding::classify(value) {
        Binding::Logic { name, .. } => Some(name),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_prefixes() {
        assert_eq!(
            Binding::classify_str("states.value"),
            Binding::State("value".into())
        );
        assert_eq!(
            Binding::classify_str("  Inputs.title "),
            Binding::Input("title".into())
        );
        assert_eq!(
            Binding::classify_str("logics.getColor()"),
            Binding::Logic {
                name: "getColor".into(),
                invoked: true
            }
        );
        assert_eq!(
            Binding::classify_str("logics.onClick"),
            Binding::Logic {
                name: "onClick".into(),
                invoked: false
            }
        );
        assert_eq!(
            Binding::classify_str("Type here"),
            Binding::Literal(json!("Type here"))
        );
    }

    #[test]
    fn test_prop_expression() {
        assert_eq!(Binding::classify(&json!("states.value")).prop_expression(), "value");
        assert_eq!(
            Binding::classify(&json!("logics.onClick")).prop_expression(),
            "(...args)=>onClick({component,args})"
        );
        assert_eq!(
            Binding::classify(&json!("logics.getColor()")).prop_expression(),
            "getColor({component,args:[]})"
        );
        assert_eq!(Binding::classify(&json!(15)).prop_expression(), "15");
        assert_eq!(
            Binding::classify(&json!("Type here")).prop_expression(),
            "\"Type here\""
        );
    }

    #[test]
    fn test_style_expression_always_invokes_logic() {
        assert_eq!(
            Binding::classify(&json!("logics.getColor")).style_expression(),
            "getColor({component,args: []})"
        );
    }

    #[test]
    fn test_state_initial() {
        assert_eq!(state_initial(&json!("inputs.title")), "title");
        assert_eq!(state_initial(&json!("hello")), "\"hello\"");
        assert_eq!(state_initial(&json!(3)), "3");
    }

    #[test]
    fn test_watch_dependency() {
        assert_eq!(watch_dependency(&json!("states.value")), Some("value".into()));
        assert_eq!(watch_dependency(&json!("inputs.title")), Some("title".into()));
        assert_eq!(watch_dependency(&json!("raw")), Some("\"raw\"".into()));
        assert_eq!(watch_dependency(&Value::Null), None);
    }

    #[test]
    fn test_input_name_takes_leading_identifier() {
        assert_eq!(
            input_name(&json!("inputs.loopElement.title??value")),
            Some("loopElement".into())
        );
        assert_eq!(input_name(&json!("states.value")), None);
    }
}
