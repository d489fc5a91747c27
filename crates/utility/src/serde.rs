//! Lenient deserializers for map exports, which freely mix numbers, strings
//! and booleans for the same field.

/// `0`/`1`, `"0"`/`"1"`, `true`/`false` and `null` as a boolean flag.
pub mod flag {
    use serde::{de::Error, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawFlag {
        Bool(bool),
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<RawFlag> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(false),
            Some(RawFlag::Bool(value)) => Ok(value),
            Some(RawFlag::Number(value)) => Ok(value != 0.0),
            Some(RawFlag::Text(value)) => match value.trim() {
                "" | "0" | "false" => Ok(false),
                "1" | "true" => Ok(true),
                other => Err(D::Error::custom(format!("invalid flag value `{}`", other))),
            },
        }
    }
}

/// A number which might be encoded as a string, `null` or garbage.
/// Anything not interpretable as a finite number becomes `None`.
pub mod lenient_number {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawNumber {
        Number(f64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<RawNumber> = Option::deserialize(deserializer)?;
        Ok(match raw {
            Some(RawNumber::Number(value)) => Some(value),
            Some(RawNumber::Text(text)) => text.trim().parse::<f64>().ok(),
            Some(RawNumber::Other(_)) | None => None,
        }
        .filter(|value| value.is_finite()))
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Burg {
        #[serde(default, with = "super::flag")]
        walls: bool,
        #[serde(default, with = "super::lenient_number")]
        population: Option<f64>,
    }

    #[test]
    fn flags_accept_mixed_encodings() {
        for (json, expected) in [
            (r#"{"walls": 1}"#, true),
            (r#"{"walls": 0}"#, false),
            (r#"{"walls": "1"}"#, true),
            (r#"{"walls": true}"#, true),
            (r#"{"walls": null}"#, false),
            (r#"{}"#, false),
        ] {
            let burg: Burg = serde_json::from_str(json).unwrap();
            assert_eq!(burg.walls, expected, "{}", json);
        }
    }

    #[test]
    fn invalid_flag_is_rejected() {
        assert!(serde_json::from_str::<Burg>(r#"{"walls": "maybe"}"#).is_err());
    }

    #[test]
    fn numbers_fall_back_to_none() {
        let burg: Burg = serde_json::from_str(r#"{"population": "12.5"}"#).unwrap();
        assert_eq!(burg.population, Some(12.5));
        let burg: Burg = serde_json::from_str(r#"{"population": "lots"}"#).unwrap();
        assert_eq!(burg.population, None);
        let burg: Burg = serde_json::from_str(r#"{"population": [1]}"#).unwrap();
        assert_eq!(burg.population, None);
    }
}
