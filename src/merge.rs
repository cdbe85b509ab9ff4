//! Pre-codegen normalization of condition and loop units.
//!
//! Both unit kinds are generated against a fixed contract: a `rectangle`
//! base, a frame descriptor with the page-level `.stack` marker stripped, and
//! the built-in state/effect pair that drives them (`condition: false`
//! toggled by logic, `data: []` seeded by `onStart`).

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;

use crate::spec::{EffectSpec, FrameField, FrameSpec, SpecUnit};

const MERGED_BASE: &str = "rectangle";
const DEFAULT_CONDITION_FRAME: &str = "column.start";

lazy_static! {
    static ref STACK_SUFFIX_RE: Regex = Regex::new(r"(?i)(\.\s*stack)").unwrap();
}

/// Remove the `.stack` marker from a frame base. Stacking composes at the
/// page root only; merged units always render inline.
pub fn strip_stack(base: &str) -> String {
    STACK_SUFFIX_RE.replace_all(base, "").into_owned()
}

fn normalized_frame(unit: &SpecUnit, fallback: Option<&str>) -> FrameField {
    let (base, id, styles) = match &unit.modifier.frame {
        Some(FrameField::Base(s)) => (Some(s.clone()), None, Default::default()),
        Some(FrameField::Spec(spec)) => (spec.base.clone(), spec.id.clone(), spec.styles.clone()),
        None => (None, None, Default::default()),
    };
    let base = base
        .or_else(|| fallback.map(|s| s.to_string()))
        .map(|b| strip_stack(&b));
    FrameField::Spec(FrameSpec { base, id, styles })
}

fn on_start_effect() -> EffectSpec {
    EffectSpec {
        body: Some(json!("logics.onStart")),
        watch: Some(json!([])),
    }
}

/// Normalize a condition unit for generation.
pub fn merged_condition(condition: Option<SpecUnit>) -> Option<SpecUnit> {
    let mut unit = condition?;
    unit.modifier.frame = Some(normalized_frame(&unit, Some(DEFAULT_CONDITION_FRAME)));
    unit.base = Some(MERGED_BASE.to_string());
    unit.modifier.states.clear();
    unit.modifier
        .states
        .insert("condition".to_string(), json!(false));
    unit.modifier.effects.clear();
    unit.modifier
        .effects
        .insert("onStart".to_string(), on_start_effect());
    Some(unit)
}

/// Normalize a loop unit for generation.
pub fn merged_loop(repeat: Option<SpecUnit>) -> Option<SpecUnit> {
    let mut unit = repeat?;
    unit.modifier.frame = Some(normalized_frame(&unit, None));
    unit.base = Some(MERGED_BASE.to_string());
    unit.modifier.states.clear();
    unit.modifier.states.insert("data".to_string(), json!([]));
    unit.modifier.effects.clear();
    unit.modifier
        .effects
        .insert("onStart".to_string(), on_start_effect());
    Some(unit)
}
