use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The closed set of supported completion providers.
///
/// Adding a provider means adding a variant here (and an adapter in the
/// gateway), not editing a string branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Together,
}

impl ProviderKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Together => "together",
        }
    }

    /// Parse a stored provider name. A missing name defaults to `openai`;
    /// an unknown one is an error so a typo never silently falls back to a
    /// provider the key does not belong to.
    pub fn parse(name: Option<&str>) -> Result<Self> {
        match name {
            None => Ok(ProviderKind::default()),
            Some("openai") => Ok(ProviderKind::OpenAi),
            Some("together") => Ok(ProviderKind::Together),
            Some(other) => Err(Error::unsupported_provider(other)),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn known_names_parse() {
        assert_eq!(
            ProviderKind::parse(Some("openai")).unwrap(),
            ProviderKind::OpenAi
        );
        assert_eq!(
            ProviderKind::parse(Some("together")).unwrap(),
            ProviderKind::Together
        );
    }

    #[test]
    fn missing_name_defaults_to_openai() {
        assert_eq!(ProviderKind::parse(None).unwrap(), ProviderKind::OpenAi);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = ProviderKind::parse(Some("mystral")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedProvider { name } if name == "mystral"));
    }

    #[test]
    fn serde_round_trip_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&ProviderKind::OpenAi).unwrap(),
            "\"openai\""
        );
        assert_eq!(
            serde_json::from_str::<ProviderKind>("\"together\"").unwrap(),
            ProviderKind::Together
        );
    }
}
