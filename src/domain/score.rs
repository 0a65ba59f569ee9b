//! Score types: per-dimension sub-scores, category totals, grade bands.

use std::fmt;

/// Why a sub-score holds the value it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// Computed from complete market data.
    Computed,
    /// Required data was missing; a documented neutral default was assigned.
    NeutralDefault,
    /// Computed from a fallback window (cross-day clamp, degenerate
    /// geometry), so the value is a best-effort estimate.
    Degraded,
}

/// One scored dimension: integer value, confidence, and a human-readable
/// justification.
#[derive(Debug, Clone)]
pub struct Subscore {
    pub value: u8,
    pub confidence: Confidence,
    pub note: String,
}

impl Subscore {
    pub fn computed(value: u8, note: impl Into<String>) -> Self {
        Self {
            value,
            confidence: Confidence::Computed,
            note: note.into(),
        }
    }

    pub fn neutral(value: u8, note: impl Into<String>) -> Self {
        Self {
            value,
            confidence: Confidence::NeutralDefault,
            note: note.into(),
        }
    }

    pub fn degraded(value: u8, note: impl Into<String>) -> Self {
        Self {
            value,
            confidence: Confidence::Degraded,
            note: note.into(),
        }
    }

    fn zero(note: &str) -> Self {
        Self::neutral(0, note)
    }
}

/// Declared maximum for each dimension, in rubric order.
pub const DIMENSION_MAXIMA: [(&str, u8); 13] = [
    ("S1", 10),
    ("S2", 10),
    ("S3", 10),
    ("E1", 10),
    ("E2", 10),
    ("E3", 5),
    ("X1", 10),
    ("X2", 5),
    ("X3", 5),
    ("R1", 10),
    ("R2", 5),
    ("T1", 5),
    ("T2", 5),
];

pub const STRUCTURE_MAX: u8 = 30;
pub const ENTRY_MAX: u8 = 25;
pub const EXIT_MAX: u8 = 20;
pub const RISK_MAX: u8 = 15;
pub const SENTIMENT_MAX: u8 = 10;

/// Full evaluation of one trade across five categories.
#[derive(Debug, Clone)]
pub struct Score {
    pub s1: Subscore,
    pub s2: Subscore,
    pub s3: Subscore,
    pub e1: Subscore,
    pub e2: Subscore,
    pub e3: Subscore,
    pub x1: Subscore,
    pub x2: Subscore,
    pub x3: Subscore,
    pub r1: Subscore,
    pub r2: Subscore,
    pub t1: Subscore,
    pub t2: Subscore,
    /// Set when the exit fell outside the entry day's bar sequence and the
    /// excursion window was clamped to the last bar.
    pub cross_day_note: Option<String>,
    /// Set when the trade's date had no bar data at all; the score is then
    /// all-zero and purely informational.
    pub unscored_note: Option<String>,
}

impl Score {
    /// All-zero score for a trade with no market data on its date.
    pub fn unscored(note: impl Into<String>) -> Self {
        let note = note.into();
        let z = || Subscore::zero(&note);
        Self {
            s1: z(),
            s2: z(),
            s3: z(),
            e1: z(),
            e2: z(),
            e3: z(),
            x1: z(),
            x2: z(),
            x3: z(),
            r1: z(),
            r2: z(),
            t1: z(),
            t2: z(),
            cross_day_note: None,
            unscored_note: Some(note),
        }
    }

    pub fn structure(&self) -> u8 {
        self.s1.value + self.s2.value + self.s3.value
    }

    pub fn entry(&self) -> u8 {
        self.e1.value + self.e2.value + self.e3.value
    }

    pub fn exit(&self) -> u8 {
        self.x1.value + self.x2.value + self.x3.value
    }

    pub fn risk(&self) -> u8 {
        self.r1.value + self.r2.value
    }

    pub fn sentiment(&self) -> u8 {
        self.t1.value + self.t2.value
    }

    pub fn total(&self) -> u8 {
        self.structure() + self.entry() + self.exit() + self.risk() + self.sentiment()
    }

    pub fn grade(&self) -> Grade {
        Grade::from_total(self.total())
    }

    /// Sub-scores with their dimension codes, in rubric order.
    pub fn dimensions(&self) -> [(&'static str, &Subscore); 13] {
        [
            ("S1", &self.s1),
            ("S2", &self.s2),
            ("S3", &self.s3),
            ("E1", &self.e1),
            ("E2", &self.e2),
            ("E3", &self.e3),
            ("X1", &self.x1),
            ("X2", &self.x2),
            ("X3", &self.x3),
            ("R1", &self.r1),
            ("R2", &self.r2),
            ("T1", &self.t1),
            ("T2", &self.t2),
        ]
    }
}

/// Ordinal grade band, a pure function of the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Grade {
    Poor,
    NeedsImprovement,
    Moderate,
    Good,
    Excellent,
}

impl Grade {
    pub fn from_total(total: u8) -> Self {
        match total {
            85.. => Grade::Excellent,
            70.. => Grade::Good,
            55.. => Grade::Moderate,
            40.. => Grade::NeedsImprovement,
            _ => Grade::Poor,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Grade::Excellent => "excellent execution",
            Grade::Good => "good execution",
            Grade::Moderate => "moderate execution",
            Grade::NeedsImprovement => "needs improvement",
            Grade::Poor => "serious problems",
        };
        write!(f, "{label}")
    }
}
