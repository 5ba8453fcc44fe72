use serde::{Deserialize, Serialize};

/// Highest degree earned, in ascending order of attainment.
///
/// The collection stores the labels verbatim; the variant order here is the
/// presentation contract for every education table, independent of counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    HighSchool,
    SomeCollege,
    Bachelors,
    Masters,
    Doctorate,
}

impl EducationLevel {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::HighSchool,
            Self::SomeCollege,
            Self::Bachelors,
            Self::Masters,
            Self::Doctorate,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::HighSchool => "High School or Baccalaureate",
            Self::SomeCollege => "Some College (1-3 years)",
            Self::Bachelors => "Bachelor's degree",
            Self::Masters => "Master's degree",
            Self::Doctorate => "Doctorate (e.g. PhD)",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|level| level.label() == value)
    }
}

/// Admissions-quiz outcome recorded on each applicant document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizStatus {
    Complete,
    Incomplete,
}

impl QuizStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Incomplete => "incomplete",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "complete" => Some(Self::Complete),
            "incomplete" => Some(Self::Incomplete),
            _ => None,
        }
    }
}

/// Arm of the email-nudge experiment an applicant was assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentGroup {
    Control,
    Treatment,
}

impl ExperimentGroup {
    /// Presentation order for contingency rows: control first.
    pub const fn ordered() -> [Self; 2] {
        [Self::Control, Self::Treatment]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Control => "no email (control)",
            Self::Treatment => "email (treatment)",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "no email (control)" => Some(Self::Control),
            "email (treatment)" => Some(Self::Treatment),
            _ => None,
        }
    }
}
