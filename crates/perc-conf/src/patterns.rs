use serde::Deserialize;
use serde::Deserializer;

/// Glob list accepted as a single string, an array of strings, or `null`
/// (an empty list).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternList(Vec<String>);

impl PatternList {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<'de> Deserialize<'de> for PatternList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            One(String),
            Many(Vec<String>),
        }

        Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
            None => Self::default(),
            Some(OneOrMany::One(pattern)) => Self(vec![pattern]),
            Some(OneOrMany::Many(patterns)) => Self(patterns),
        })
    }
}
