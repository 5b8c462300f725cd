//! Grade-keyed table of candidate tutoring topics.

use crate::domain::GradeLevel;

/// Topic sent with a chat turn when the student has not picked one.
pub const DEFAULT_TOPIC: &str = "General math practice";
/// Topic sent with the greeting that opens a brand-new session.
pub const WELCOME_TOPIC: &str = "Welcome";

const KINDERGARTEN: &[&str] = &[
    "Counting to 20",
    "Shapes",
    "Comparing numbers",
    "Adding within 5",
];

const FIRST: &[&str] = &[
    "Addition within 20",
    "Subtraction within 20",
    "Place value",
    "Telling time",
    "Measuring length",
];

const SECOND: &[&str] = &[
    "Addition within 100",
    "Subtraction within 100",
    "Money",
    "Skip counting",
    "Even and odd numbers",
];

const THIRD: &[&str] = &[
    "Multiplication",
    "Division",
    "Fractions",
    "Area and perimeter",
    "Rounding",
];

const FOURTH: &[&str] = &[
    "Multi-digit multiplication",
    "Long division",
    "Equivalent fractions",
    "Decimals",
    "Angles",
];

const FIFTH: &[&str] = &[
    "Adding fractions",
    "Multiplying fractions",
    "Decimal operations",
    "Volume",
    "Coordinate plane",
];

pub fn topics_for_grade(grade: GradeLevel) -> &'static [&'static str] {
    match grade {
        GradeLevel::Kindergarten => KINDERGARTEN,
        GradeLevel::First => FIRST,
        GradeLevel::Second => SECOND,
        GradeLevel::Third => THIRD,
        GradeLevel::Fourth => FOURTH,
        GradeLevel::Fifth => FIFTH,
    }
}
