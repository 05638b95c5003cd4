//! Record data model.

use std::fmt;

use crate::error::StoreError;

/// Number of choices every record carries, padded with empty strings.
pub const CHOICE_ARITY: usize = 2;

/// Column header of the store file.
pub const HEADER: [&str; 5] = ["Index", "Payload", "Choice1", "Choice2", "Outcome"];

/// Result of acting on a record's choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    Correct,
    Incorrect,
    #[default]
    Unknown,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Correct => write!(f, "correct"),
            Outcome::Incorrect => write!(f, "incorrect"),
            Outcome::Unknown => write!(f, "unknown"),
        }
    }
}

/// A confirmed unit of extracted data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 1-based, assigned at confirmation.
    pub index: u64,
    pub payload: String,
    pub choices: [String; CHOICE_ARITY],
    /// 1-based ordinal of the choice the driver invoked.
    pub selected: Option<u8>,
    pub outcome: Outcome,
    /// 1-based ordinal of the choice known to be right.
    pub answer: Option<u8>,
}

impl Record {
    /// A freshly confirmed record: empty choices, unknown outcome.
    pub fn new(index: u64, payload: impl Into<String>) -> Self {
        Self {
            index,
            payload: payload.into(),
            choices: Default::default(),
            selected: None,
            outcome: Outcome::Unknown,
            answer: None,
        }
    }

    /// Keep the first [`CHOICE_ARITY`] texts, padding the rest with "".
    pub fn set_choices<S: AsRef<str>>(&mut self, texts: &[S]) {
        self.choices = Default::default();
        for (slot, text) in self.choices.iter_mut().zip(texts) {
            *slot = text.as_ref().to_string();
        }
    }

    /// Number of non-empty choices.
    pub fn choice_count(&self) -> usize {
        self.choices.iter().filter(|c| !c.is_empty()).count()
    }

    /// The persisted projection of this record.
    pub fn row(&self) -> Row {
        Row {
            index: self.index,
            payload: self.payload.clone(),
            choices: self.choices.clone(),
            answer: self.answer,
        }
    }
}

/// One line of the store file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub index: u64,
    pub payload: String,
    pub choices: [String; CHOICE_ARITY],
    pub answer: Option<u8>,
}

impl Row {
    pub fn to_fields(&self) -> Vec<String> {
        let answer = self
            .answer
            .map(|n| format!("Answer{}", n))
            .unwrap_or_default();
        let mut fields = Vec::with_capacity(HEADER.len());
        fields.push(self.index.to_string());
        fields.push(self.payload.clone());
        fields.extend(self.choices.iter().cloned());
        fields.push(answer);
        fields
    }

    /// Parse the fields of data line `line` (1-based, header excluded).
    pub fn from_fields(line: usize, fields: &[String]) -> Result<Self, StoreError> {
        let malformed = |message: String| StoreError::Malformed { line, message };

        if fields.len() != HEADER.len() {
            return Err(malformed(format!(
                "expected {} fields, found {}",
                HEADER.len(),
                fields.len()
            )));
        }

        let index = fields[0]
            .parse::<u64>()
            .map_err(|e| malformed(format!("index {:?}: {}", fields[0], e)))?;

        let answer = match fields[4].as_str() {
            "" => None,
            other => {
                let ordinal = other
                    .strip_prefix("Answer")
                    .and_then(|n| n.parse::<u8>().ok())
                    .filter(|n| (1..=CHOICE_ARITY as u8).contains(n))
                    .ok_or_else(|| malformed(format!("outcome {:?}", other)))?;
                Some(ordinal)
            }
        };

        Ok(Self {
            index,
            payload: fields[1].clone(),
            choices: [fields[2].clone(), fields[3].clone()],
            answer,
        })
    }
}
