use std::{fmt, str::FromStr};

use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::error::{FieldError, ProtocolError};

/// Flat name/value mapping built from a submitted form.
///
/// Entries keep the order they were first inserted in. Inserting a name that
/// already exists overwrites its value in place, so the last submitted value
/// for a repeated field wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInput {
    entries: Vec<(String, String)>,
}

impl FormInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Parses a single `name=value` assignment and inserts it.
    ///
    /// Only the first `=` separates; the value may itself contain `=`.
    pub fn insert_assignment(&mut self, raw: &str) -> Result<(), FieldError> {
        let (name, value) = raw
            .split_once('=')
            .ok_or_else(|| FieldError::MalformedAssignment(raw.to_string()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(FieldError::MalformedAssignment(raw.to_string()));
        }
        self.insert(name, value.trim());
        Ok(())
    }
}

impl<K, V> FromIterator<(K, V)> for FormInput
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut form = FormInput::new();
        for (name, value) in iter {
            form.insert(name, value);
        }
        form
    }
}

impl FromStr for FormInput {
    type Err = FieldError;

    /// `name=value` pairs separated by `&` or newlines.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut form = FormInput::new();
        for part in raw.split(['&', '\n']).map(str::trim) {
            if part.is_empty() {
                continue;
            }
            form.insert_assignment(part)?;
        }
        Ok(form)
    }
}

impl Serialize for FormInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FormInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FormVisitor;

        impl<'de> Visitor<'de> for FormVisitor {
            type Value = FormInput;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a flat object of string fields")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FormInput, A::Error> {
                let mut form = FormInput::new();
                while let Some((name, value)) = access.next_entry::<String, FieldValue>()? {
                    form.insert(name, value.0);
                }
                Ok(form)
            }
        }

        deserializer.deserialize_map(FormVisitor)
    }
}

/// Form values always travel as strings; numbers and booleans read from a
/// fields file are stringified the way a browser form would report them.
struct FieldValue(String);

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
            Flag(bool),
        }

        Ok(FieldValue(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text,
            Raw::Number(number) => number.to_string(),
            Raw::Flag(flag) => flag.to_string(),
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    pub canceled: f64,
    pub not_canceled: f64,
}

/// Body returned by the prediction endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Probabilities>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub probabilities: Probabilities,
}

impl Prediction {
    pub fn style(&self) -> PredictionStyle {
        PredictionStyle::classify(&self.label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    Accepted(Prediction),
    Rejected { error: String },
}

pub const UNKNOWN_SERVER_ERROR: &str = "unknown error";

impl PredictionResponse {
    pub fn accepted(label: impl Into<String>, probabilities: Probabilities) -> Self {
        Self {
            success: true,
            prediction: Some(label.into()),
            probabilities: Some(probabilities),
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            prediction: None,
            probabilities: None,
            error: Some(error.into()),
        }
    }

    pub fn into_outcome(self) -> Result<PredictionOutcome, ProtocolError> {
        if !self.success {
            return Ok(PredictionOutcome::Rejected {
                error: self
                    .error
                    .unwrap_or_else(|| UNKNOWN_SERVER_ERROR.to_string()),
            });
        }

        let label = self
            .prediction
            .ok_or(ProtocolError::MissingField("prediction"))?;
        let probabilities = self
            .probabilities
            .ok_or(ProtocolError::MissingField("probabilities"))?;
        Ok(PredictionOutcome::Accepted(Prediction {
            label,
            probabilities,
        }))
    }
}

/// Presentation class for a prediction label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionStyle {
    NotCanceled,
    Canceled,
}

impl PredictionStyle {
    /// Any label containing "not" (any case, any position) is treated as
    /// not-canceled. "Cannot determine" would therefore match too.
    pub fn classify(label: &str) -> Self {
        if label.to_lowercase().contains("not") {
            Self::NotCanceled
        } else {
            Self::Canceled
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::NotCanceled => "not-canceled",
            Self::Canceled => "canceled",
        }
    }
}

impl fmt::Display for PredictionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_class())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_serializes_as_flat_object_in_insertion_order() {
        let form: FormInput = [("age", "34"), ("flights", "2")].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&form).expect("json"),
            r#"{"age":"34","flights":"2"}"#
        );

        let form: FormInput = [("zeta", "1"), ("alpha", "2")].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&form).expect("json"),
            r#"{"zeta":"1","alpha":"2"}"#
        );
    }

    #[test]
    fn repeated_field_keeps_position_and_last_value() {
        let form: FormInput = [("a", "1"), ("b", "2"), ("a", "3")].into_iter().collect();
        assert_eq!(form.len(), 2);
        assert_eq!(
            serde_json::to_string(&form).expect("json"),
            r#"{"a":"3","b":"2"}"#
        );
    }

    #[test]
    fn parses_assignments_with_spaces_in_names() {
        let form: FormInput = "lead time=34&room type=Room_Type 2\ncode=a=b"
            .parse()
            .expect("parse");
        assert_eq!(form.get("lead time"), Some("34"));
        assert_eq!(form.get("room type"), Some("Room_Type 2"));
        assert_eq!(form.get("code"), Some("a=b"));

        let err = "novalue".parse::<FormInput>().expect_err("must fail");
        assert!(matches!(err, FieldError::MalformedAssignment(_)));
    }

    #[test]
    fn fields_file_values_are_stringified() {
        let form: FormInput =
            serde_json::from_str(r#"{"lead time": 34, "average price": 99.5, "vip": true}"#)
                .expect("json");
        assert_eq!(form.get("lead time"), Some("34"));
        assert_eq!(form.get("average price"), Some("99.5"));
        assert_eq!(form.get("vip"), Some("true"));
    }

    #[test]
    fn classifies_by_case_insensitive_substring() {
        assert_eq!(
            PredictionStyle::classify("Not Canceled").css_class(),
            "not-canceled"
        );
        assert_eq!(PredictionStyle::classify("Canceled").css_class(), "canceled");
        assert_eq!(
            PredictionStyle::classify("definitely NOT canceled").css_class(),
            "not-canceled"
        );
        assert_eq!(
            PredictionStyle::classify("Not_Canceled"),
            PredictionStyle::NotCanceled
        );
    }

    #[test]
    fn successful_response_becomes_accepted_prediction() {
        let response: PredictionResponse = serde_json::from_str(
            r#"{"success":true,"prediction":"Canceled","probabilities":{"canceled":0.82,"not_canceled":0.18}}"#,
        )
        .expect("json");
        let outcome = response.into_outcome().expect("outcome");
        let PredictionOutcome::Accepted(prediction) = outcome else {
            panic!("expected accepted outcome");
        };
        assert_eq!(prediction.label, "Canceled");
        assert_eq!(prediction.style(), PredictionStyle::Canceled);
        assert_eq!(prediction.probabilities.canceled, 0.82);
    }

    #[test]
    fn failed_response_carries_server_message() {
        let response: PredictionResponse =
            serde_json::from_str(r#"{"success":false,"error":"Invalid age"}"#).expect("json");
        assert_eq!(
            response.into_outcome().expect("outcome"),
            PredictionOutcome::Rejected {
                error: "Invalid age".to_string()
            }
        );

        let response: PredictionResponse =
            serde_json::from_str(r#"{"success":false}"#).expect("json");
        assert_eq!(
            response.into_outcome().expect("outcome"),
            PredictionOutcome::Rejected {
                error: UNKNOWN_SERVER_ERROR.to_string()
            }
        );
    }

    #[test]
    fn success_without_probabilities_is_malformed() {
        let response: PredictionResponse =
            serde_json::from_str(r#"{"success":true,"prediction":"Canceled"}"#).expect("json");
        assert_eq!(
            response.into_outcome().expect_err("must fail"),
            ProtocolError::MissingField("probabilities")
        );
    }
}
