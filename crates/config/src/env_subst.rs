/// Replace `${ENV_VAR}` placeholders in config text.
///
/// Unresolvable variables are left as-is.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Placeholder replacement with a caller-supplied lookup, so tests never
/// have to mutate the process environment.
fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    },
                }
                rest = &after[end + 1..];
            },
            // Unterminated or empty placeholder; keep the text literal and
            // resume scanning after the `${`.
            _ => {
                out.push_str("${");
                rest = after;
            },
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_var() {
        let lookup = |name: &str| match name {
            "WREN_API_TOKEN" => Some("tok-123".to_string()),
            _ => None,
        };
        assert_eq!(
            substitute_env_with("auth_token = \"${WREN_API_TOKEN}\"", lookup),
            "auth_token = \"tok-123\""
        );
    }

    #[test]
    fn substitutes_multiple_placeholders() {
        let lookup = |name: &str| Some(format!("<{name}>"));
        assert_eq!(
            substitute_env_with("${A}/middle/${B}", lookup),
            "<A>/middle/<B>"
        );
    }

    #[test]
    fn leaves_unknown_var() {
        let lookup = |_: &str| None;
        assert_eq!(
            substitute_env_with("${WREN_NONEXISTENT_XYZ}", lookup),
            "${WREN_NONEXISTENT_XYZ}"
        );
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        let lookup = |_: &str| Some("never".to_string());
        assert_eq!(substitute_env_with("tail ${OOPS", lookup), "tail ${OOPS");
    }

    #[test]
    fn empty_placeholder_is_literal() {
        let lookup = |_: &str| Some("never".to_string());
        assert_eq!(substitute_env_with("a ${} b", lookup), "a ${} b");
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain text"), "plain text");
    }
}
