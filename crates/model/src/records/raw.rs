use crate::records::row::RowData;

/// One input item before decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum RawUnit {
    /// A row from a structured query result.
    Row(RowData),
    /// One line of delimited text, without its line terminator.
    Line(String),
}

impl RawUnit {
    pub fn kind(&self) -> &'static str {
        match self {
            RawUnit::Row(_) => "row",
            RawUnit::Line(_) => "line",
        }
    }
}

impl From<RowData> for RawUnit {
    fn from(row: RowData) -> Self {
        RawUnit::Row(row)
    }
}

impl From<String> for RawUnit {
    fn from(line: String) -> Self {
        RawUnit::Line(line)
    }
}

impl From<&str> for RawUnit {
    fn from(line: &str) -> Self {
        RawUnit::Line(line.to_string())
    }
}
