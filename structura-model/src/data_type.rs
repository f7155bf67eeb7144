use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum input length of [`DataType::String1024`] values.
pub const STRING1024_MAX_LENGTH: u32 = 1024;

/// The data type of a property's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Short text, at most 1024 characters.
    String1024,
    Text,
    Html,
    /// 32-bit integer.
    Number,
    /// 64-bit integer.
    LargeNumber,
    Float,
    Double,
    Boolean,
    Date,
    DateTime,
    Binary,
    /// Link to another content instance.
    Reference,
}

impl DataType {
    /// Hard input length limit of the type, if it has one.
    #[must_use]
    pub const fn max_length(self) -> Option<u32> {
        match self {
            Self::String1024 => Some(STRING1024_MAX_LENGTH),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_textual(self) -> bool {
        matches!(self, Self::String1024 | Self::Text | Self::Html)
    }

    /// Whether random values can be generated for this type.
    ///
    /// Binary payloads and references need real instances to point at.
    #[must_use]
    pub const fn supports_random(self) -> bool {
        !matches!(self, Self::Binary | Self::Reference)
    }

    /// A random value of this type. Text values are at most `max_len`
    /// characters long. Returns `Value::Null` for types without random support.
    pub fn random_value<R: Rng + ?Sized>(self, rng: &mut R, max_len: u32) -> Value {
        match self {
            Self::String1024 | Self::Text => Value::String(random_text(rng, max_len)),
            Self::Html => Value::String(format!("<p>{}</p>", random_text(rng, max_len))),
            Self::Number => Value::from(rng.gen_range(i32::MIN..=i32::MAX)),
            Self::LargeNumber => Value::from(rng.gen_range(i64::MIN..=i64::MAX)),
            Self::Float => Value::from(f64::from(rng.gen_range(-1_000_000f32..1_000_000f32))),
            Self::Double => Value::from(rng.gen_range(-1_000_000_000f64..1_000_000_000f64)),
            Self::Boolean => Value::Bool(rng.gen_bool(0.5)),
            Self::Date => Value::String(random_date(rng)),
            Self::DateTime => Value::String(format!(
                "{}T{:02}:{:02}:{:02}Z",
                random_date(rng),
                rng.gen_range(0..24),
                rng.gen_range(0..60),
                rng.gen_range(0..60)
            )),
            Self::Binary | Self::Reference => Value::Null,
        }
    }
}

fn random_text<R: Rng + ?Sized>(rng: &mut R, max_len: u32) -> String {
    let len = rng.gen_range(1..=max_len.max(1));
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

fn random_date<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        rng.gen_range(1970..2040),
        rng.gen_range(1..=12),
        rng.gen_range(1..=28)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn random_text_respects_max_len() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let v = DataType::String1024.random_value(&mut rng, 12);
            let s = v.as_str().unwrap();
            assert!(!s.is_empty() && s.len() <= 12);
        }
    }

    #[test]
    fn unsupported_types_yield_null() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(!DataType::Binary.supports_random());
        assert_eq!(DataType::Reference.random_value(&mut rng, 10), Value::Null);
    }

    #[test]
    fn random_values_match_type() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(DataType::Number.random_value(&mut rng, 0).is_i64());
        assert!(DataType::Boolean.random_value(&mut rng, 0).is_boolean());
        assert!(DataType::Double.random_value(&mut rng, 0).is_f64());
        let date = DataType::Date.random_value(&mut rng, 0);
        assert_eq!(date.as_str().unwrap().len(), 10);
        let html = DataType::Html.random_value(&mut rng, 5);
        assert!(html.as_str().unwrap().starts_with("<p>"));
    }
}
