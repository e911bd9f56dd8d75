use serde::{Deserialize, Serialize};

/// A decoded `(key, value)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPair {
    pub key: String,
    pub value: f64,
}

impl NormalizedPair {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        NormalizedPair {
            key: key.into(),
            value,
        }
    }
}

/// Running total for one key within one partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialSum {
    pub key: String,
    pub sum: f64,
    pub count: u64,
}

impl PartialSum {
    pub fn new(key: impl Into<String>, sum: f64, count: u64) -> Self {
        PartialSum {
            key: key.into(),
            sum,
            count,
        }
    }
}

impl From<NormalizedPair> for PartialSum {
    fn from(pair: NormalizedPair) -> Self {
        PartialSum {
            key: pair.key,
            sum: pair.value,
            count: 1,
        }
    }
}

/// Fully merged total for one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalSum {
    pub key: String,
    pub sum: f64,
}

impl FinalSum {
    pub fn new(key: impl Into<String>, sum: f64) -> Self {
        FinalSum {
            key: key.into(),
            sum,
        }
    }

    /// `<key>\t<sum>` with the shortest decimal that reads back to the same f64.
    pub fn to_line(&self) -> String {
        format_line(&self.key, self.sum)
    }
}

pub fn format_line(key: &str, sum: f64) -> String {
    let mut buffer = ryu::Buffer::new();
    let rendered = buffer.format(sum);
    let mut line = String::with_capacity(key.len() + rendered.len() + 1);
    line.push_str(key);
    line.push('\t');
    line.push_str(rendered);
    line
}

/// Inverse of [`format_line`], used when reading results back.
pub fn parse_line(line: &str) -> Option<FinalSum> {
    let (key, sum) = line.rsplit_once('\t')?;
    let sum = sum.parse::<f64>().ok()?;
    Some(FinalSum::new(key, sum))
}
