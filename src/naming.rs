//! Identifier derivation rules.
//!
//! Every join key in the pipeline flows through here: the id-qualified node
//! name is the blueprint file name, the logic module name and the extend
//! reference, so the sanitization must be identical everywhere.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_ALNUM_RE: Regex = Regex::new(r"[^a-zA-Z0-9]").unwrap();
    static ref SNAKE_SEG_RE: Regex = Regex::new(r"_([a-zA-Z])").unwrap();
    static ref QUOTE_EDGE_RE: Regex = Regex::new(r#"^'|^"|'$|"$"#).unwrap();
}

/// `my_login_button` -> `myLoginButton`
pub fn snake_to_camel(name: &str) -> String {
    SNAKE_SEG_RE
        .replace_all(name, |caps: &regex::Captures| {
            caps[1].to_uppercase()
        })
        .into_owned()
}

/// Uppercase the first character, leave the rest untouched.
pub fn first_upper_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Uppercase the first character, lowercase the rest.
pub fn first_upper_case_rest_small(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => {
            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
        }
        None => String::new(),
    }
}

/// Strip surrounding quotes and turn design-tool `:` id separators into `_`.
pub fn sanitize_full_colon(name: &str) -> String {
    QUOTE_EDGE_RE.replace_all(name, "").replace(':', "_")
}

/// Collision-safe identifier for one design node: `i<id>_<TitleCase(name)>`
/// with every non-alphanumeric run collapsed to `_`.
pub fn node_identifier(id: &str, raw_name: &str) -> String {
    let qualified = format!("i{}_{}", id, first_upper_case_rest_small(raw_name));
    NON_ALNUM_RE.replace_all(&qualified, "_").into_owned()
}

/// Field name a loop item exposes for one of its template leaves.
///
/// Reverses [`node_identifier`]: removes the id prefix, drops the trailing
/// type-tag segment and lowercases what is left, so `i12_4_Title_text`
/// becomes `title`.
pub fn loop_element_field(id: &str, name: &str) -> String {
    let prefix = format!("i{}_", id.replace(':', "_"));
    let base = name.trim().replace(&prefix, "");
    let mut chunks: Vec<&str> = base.split('_').collect();
    if chunks.len() > 1 {
        chunks.pop();
    }
    chunks
        .iter()
        .map(|c| c.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Last `_`-delimited segment of a node name, lowercased. This is the type
/// tag that drives classification (`loop`, `condition`, `button`, ...).
pub fn base_type(name: &str) -> String {
    name.split('_').last().unwrap_or("").to_lowercase()
}

/// Component identifier for a blueprint file stem: `login_page` -> `LoginPage`.
pub fn component_name(stem: &str) -> String {
    first_upper_case(&snake_to_camel(stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_to_camel() {
        assert_eq!(snake_to_camel("login_page"), "loginPage");
        assert_eq!(snake_to_camel("a_b_c"), "aBC");
        assert_eq!(snake_to_camel("already"), "already");
    }

    #[test]
    fn test_first_upper_case() {
        assert_eq!(first_upper_case("loginPage"), "LoginPage");
        assert_eq!(first_upper_case(""), "");
    }

    #[test]
    fn test_first_upper_case_rest_small() {
        assert_eq!(first_upper_case_rest_small("Sign IN Button"), "Sign in button");
    }

    #[test]
    fn test_sanitize_full_colon() {
        assert_eq!(sanitize_full_colon("12:4"), "12_4");
        assert_eq!(sanitize_full_colon("'quoted'"), "quoted");
        assert_eq!(sanitize_full_colon("\"12:4\""), "12_4");
    }

    #[test]
    fn test_node_identifier() {
        assert_eq!(
            node_identifier("12:4", "Sign In_button"),
            "i12_4_Sign_in_button"
        );
    }

    #[test]
    fn test_loop_element_field() {
        assert_eq!(loop_element_field("12:4", "i12_4_Title_text"), "title");
        assert_eq!(loop_element_field("9", "i9_Avatar_image"), "avatar");
    }

    #[test]
    fn test_base_type() {
        assert_eq!(base_type("i12_4_Sign_in_button"), "button");
        assert_eq!(base_type("plain"), "plain");
    }

    #[test]
    fn test_component_name() {
        assert_eq!(component_name("i12_4_sign_in_button"), "I12_4SignInButton");
        assert_eq!(component_name("login_page"), "LoginPage");
    }
}
