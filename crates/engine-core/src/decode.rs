use crate::error::DecodeError;
use model::{
    core::value::Value,
    records::{raw::RawUnit, row::RowData, sum::NormalizedPair},
};

const NUMBER: &str = "a finite number";
const KEY_TYPES: &str = "text or an integer key";

/// Turns one raw unit into a `(key, value)` pair.
///
/// The variant is picked once when the job is configured and shared by
/// every partition task.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoder {
    Structured(RowDecoder),
    Delimited(LineDecoder),
}

impl Decoder {
    pub fn decode(&self, unit: &RawUnit) -> Result<NormalizedPair, DecodeError> {
        match (self, unit) {
            (Decoder::Structured(decoder), RawUnit::Row(row)) => decoder.decode(row),
            (Decoder::Delimited(decoder), RawUnit::Line(line)) => decoder.decode(line),
            (decoder, unit) => Err(DecodeError::UnexpectedUnit {
                decoder: decoder.name(),
                found: unit.kind(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Decoder::Structured(_) => "structured",
            Decoder::Delimited(_) => "delimited",
        }
    }
}

/// Reads the key and value from named columns of a query row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowDecoder {
    pub key_field: String,
    pub value_field: String,
}

impl RowDecoder {
    pub fn new(key_field: impl Into<String>, value_field: impl Into<String>) -> Self {
        RowDecoder {
            key_field: key_field.into(),
            value_field: value_field.into(),
        }
    }

    pub fn decode(&self, row: &RowData) -> Result<NormalizedPair, DecodeError> {
        let key = row
            .get_value(&self.key_field)
            .ok_or_else(|| DecodeError::MissingField(self.key_field.clone()))?;
        let key = key.as_string().ok_or_else(|| DecodeError::TypeMismatch {
            field: self.key_field.clone(),
            expected: KEY_TYPES,
            found: format!("a {} value", key.type_name()),
        })?;
        if key.is_empty() {
            return Err(DecodeError::EmptyKey(self.key_field.clone()));
        }

        let value = row
            .get_value(&self.value_field)
            .ok_or_else(|| DecodeError::MissingField(self.value_field.clone()))?;

        Ok(NormalizedPair::new(key, numeric(&self.value_field, value)?))
    }
}

fn numeric(field: &str, value: &Value) -> Result<f64, DecodeError> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DecodeError::TypeMismatch {
            field: field.to_string(),
            expected: NUMBER,
            found: format!("'{value}'"),
        })
}

/// Splits a text line on a delimiter and reads two fields by position.
#[derive(Debug, Clone, PartialEq)]
pub struct LineDecoder {
    pub delimiter: String,
    pub key_index: usize,
    pub value_index: usize,
}

impl Default for LineDecoder {
    fn default() -> Self {
        LineDecoder {
            delimiter: "|".to_string(),
            key_index: 0,
            value_index: 3,
        }
    }
}

impl LineDecoder {
    pub fn new(delimiter: impl Into<String>, key_index: usize, value_index: usize) -> Self {
        LineDecoder {
            delimiter: delimiter.into(),
            key_index,
            value_index,
        }
    }

    /// Fields a line needs for both indices to resolve.
    pub fn required_fields(&self) -> usize {
        self.key_index.max(self.value_index) + 1
    }

    pub fn decode(&self, line: &str) -> Result<NormalizedPair, DecodeError> {
        let fields: Vec<&str> = line.split(self.delimiter.as_str()).collect();
        let required = self.required_fields();
        if fields.len() < required {
            return Err(DecodeError::MalformedLine {
                required,
                found: fields.len(),
            });
        }

        let key = fields[self.key_index];
        if key.is_empty() {
            return Err(DecodeError::EmptyKey(format!("#{}", self.key_index)));
        }

        let raw = fields[self.value_index].trim();
        let value = raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| DecodeError::TypeMismatch {
                field: format!("#{}", self.value_index),
                expected: NUMBER,
                found: format!("'{raw}'"),
            })?;

        Ok(NormalizedPair::new(key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::value::FieldValue;

    fn visit(ip: Option<Value>, revenue: Option<Value>) -> RawUnit {
        RawUnit::Row(RowData::new(
            "UserVisits",
            vec![
                FieldValue::new("sourceIP", ip),
                FieldValue::new("sumAdRevenue", revenue),
            ],
        ))
    }

    fn structured() -> Decoder {
        Decoder::Structured(RowDecoder::new("sourceIP", "sumAdRevenue"))
    }

    fn delimited() -> Decoder {
        Decoder::Delimited(LineDecoder::default())
    }

    #[test]
    fn decodes_benchmark_line() {
        let pair = delimited()
            .decode(&RawUnit::from("A|u1|d1|10.5|x|y"))
            .unwrap();
        assert_eq!(pair, NormalizedPair::new("A", 10.5));
    }

    #[test]
    fn value_field_is_trimmed() {
        let pair = delimited().decode(&RawUnit::from("B|u|d| 5.0 ")).unwrap();
        assert_eq!(pair.value, 5.0);
    }

    #[test]
    fn short_line_is_malformed() {
        assert_eq!(
            delimited().decode(&RawUnit::from("A|u1|d1")),
            Err(DecodeError::MalformedLine {
                required: 4,
                found: 3
            })
        );
    }

    #[test]
    fn line_value_must_be_a_finite_number() {
        for bad in ["A|u|d|abc", "A|u|d|", "A|u|d|NaN", "A|u|d|inf"] {
            assert!(
                matches!(
                    delimited().decode(&RawUnit::from(bad)),
                    Err(DecodeError::TypeMismatch { .. })
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn empty_line_key_is_rejected() {
        assert!(matches!(
            delimited().decode(&RawUnit::from("|u|d|1.0")),
            Err(DecodeError::EmptyKey(_))
        ));
    }

    #[test]
    fn multi_character_delimiter() {
        let decoder = Decoder::Delimited(LineDecoder::new("::", 1, 0));
        let pair = decoder.decode(&RawUnit::from("2.5::key")).unwrap();
        assert_eq!(pair, NormalizedPair::new("key", 2.5));
    }

    #[test]
    fn decodes_structured_row() {
        let unit = visit(
            Some(Value::String("10.0.0.1".into())),
            Some(Value::Float(7.0)),
        );
        assert_eq!(
            structured().decode(&unit).unwrap(),
            NormalizedPair::new("10.0.0.1", 7.0)
        );
    }

    #[test]
    fn integer_and_text_values_coerce() {
        let unit = visit(Some(Value::String("A".into())), Some(Value::Int(3)));
        assert_eq!(structured().decode(&unit).unwrap().value, 3.0);

        let unit = visit(
            Some(Value::String("A".into())),
            Some(Value::String("4.25".into())),
        );
        assert_eq!(structured().decode(&unit).unwrap().value, 4.25);
    }

    #[test]
    fn null_fields_are_missing() {
        let unit = visit(None, Some(Value::Float(1.0)));
        assert_eq!(
            structured().decode(&unit),
            Err(DecodeError::MissingField("sourceIP".into()))
        );

        let unit = visit(Some(Value::String("A".into())), None);
        assert_eq!(
            structured().decode(&unit),
            Err(DecodeError::MissingField("sumAdRevenue".into()))
        );
    }

    #[test]
    fn structured_value_type_mismatch() {
        let unit = visit(
            Some(Value::String("A".into())),
            Some(Value::Boolean(true)),
        );
        assert!(matches!(
            structured().decode(&unit),
            Err(DecodeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn float_key_is_reported_as_a_key_mismatch() {
        let unit = visit(Some(Value::Float(1.5)), Some(Value::Float(1.0)));
        let err = structured().decode(&unit).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TypeMismatch {
                field: "sourceIP".into(),
                expected: "text or an integer key",
                found: "a float value".into(),
            }
        );
        assert_eq!(
            err.to_string(),
            "Field 'sourceIP' holds a float value, expected text or an integer key"
        );
    }

    #[test]
    fn value_mismatch_names_the_number() {
        let err = delimited().decode(&RawUnit::from("A|u|d|abc")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Field '#3' holds 'abc', expected a finite number"
        );
    }

    #[test]
    fn structured_empty_key() {
        let unit = visit(Some(Value::String(String::new())), Some(Value::Float(1.0)));
        assert_eq!(
            structured().decode(&unit),
            Err(DecodeError::EmptyKey("sourceIP".into()))
        );
    }

    #[test]
    fn wrong_unit_variant() {
        assert_eq!(
            structured().decode(&RawUnit::from("A|u|d|1.0")),
            Err(DecodeError::UnexpectedUnit {
                decoder: "structured",
                found: "line"
            })
        );
        let row = visit(Some(Value::String("A".into())), Some(Value::Float(1.0)));
        assert!(matches!(
            delimited().decode(&row),
            Err(DecodeError::UnexpectedUnit { .. })
        ));
    }
}
