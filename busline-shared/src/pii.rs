use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps passenger data so it never shows up in `Debug`/`Display` output.
///
/// Serialization still writes the real value: booking payloads handed to the
/// payment and ticketing collaborators need the actual passenger name.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn as_inner(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl From<String> for Masked<String> {
    fn from(value: String) -> Self {
        Masked(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_hides_value_in_logs() {
        let name = Masked("Ada Lovelace".to_string());
        assert_eq!(format!("{:?}", name), "********");
        assert_eq!(format!("{}", name), "********");
        assert_eq!(name.as_inner(), "Ada Lovelace");
    }

    #[test]
    fn test_masked_serializes_real_value() {
        let name = Masked("Ada Lovelace".to_string());
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"Ada Lovelace\"");

        let back: Masked<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.into_inner(), "Ada Lovelace");
    }
}
