//! Ordered pattern families for student card fields
//!
//! Each field owns a list of matchers tried in priority order over the fused
//! OCR corpus. The first matcher that hits anywhere decides the field; later
//! matchers are never consulted. Labeled and exact forms come first because
//! the corpus is noisy and generic patterns hit unrelated text.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Vietnamese uppercase letters, with and without diacritics
const VI_UPPER: &str = "A-ZÀÁÂÃÈÉÊÌÍÒÓÔÕÙÚĂĐĨŨƠƯẠẢẤẦẨẪẬẮẰẲẴẶẸẺẼỀỂỄỆỈỊỌỎỐỒỔỖỘỚỜỞỠỢỤỦỨỪỮỰỲỴỶỸ";
/// Vietnamese lowercase letters, with and without diacritics
const VI_LOWER: &str = "a-zàáâãèéêìíòóôõùúăđĩũơưạảấầẩẫậắằẳẵặẹẻẽềểễệỉịọỏốồổỗộớờởỡợụủứừữựỳỵỷỹ";

/// Structured fields read from a student card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    University,
    CardType,
    Name,
    DateOfBirth,
    StudentId,
    ClassName,
    Cohort,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::University,
        Field::CardType,
        Field::Name,
        Field::DateOfBirth,
        Field::StudentId,
        Field::ClassName,
        Field::Cohort,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::University => "university",
            Field::CardType => "cardType",
            Field::Name => "name",
            Field::DateOfBirth => "dateOfBirth",
            Field::StudentId => "studentId",
            Field::ClassName => "className",
            Field::Cohort => "cohort",
        }
    }
}

/// Try order for the student ID family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdPrecedence {
    /// "Student ID:" then "ID:" then any standalone 5-6 digit number
    #[default]
    LabeledFirst,
    /// Any standalone 5-6 digit number first, then the labeled forms
    Positional,
}

/// Which part of a match becomes the field value
#[derive(Debug, Clone, Copy)]
enum Capture {
    Whole,
    Group(usize),
}

/// A single compiled matcher
#[derive(Debug, Clone)]
pub struct FieldPattern {
    regex: Regex,
    capture: Capture,
    trim: bool,
}

impl FieldPattern {
    fn new(pattern: &str, case_insensitive: bool, capture: Capture, trim: bool) -> Self {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
            .expect("static regex");
        Self { regex, capture, trim }
    }

    fn whole(pattern: &str) -> Self {
        Self::new(pattern, true, Capture::Whole, false)
    }

    fn group(pattern: &str, case_insensitive: bool, trim: bool) -> Self {
        Self::new(pattern, case_insensitive, Capture::Group(1), trim)
    }

    /// Value captured by the leftmost match, if any
    pub fn find(&self, corpus: &str) -> Option<String> {
        let caps = self.regex.captures(corpus)?;
        let matched = match self.capture {
            Capture::Whole => caps.get(0),
            Capture::Group(i) => caps.get(i),
        }?;

        let value = if self.trim {
            matched.as_str().trim()
        } else {
            matched.as_str()
        };
        Some(value.to_string())
    }
}

/// Matchers for one field, in priority order
#[derive(Debug, Clone)]
pub struct PatternFamily {
    pub field: Field,
    patterns: Vec<FieldPattern>,
}

impl PatternFamily {
    fn new(field: Field, patterns: Vec<FieldPattern>) -> Self {
        Self { field, patterns }
    }

    /// Value of the first matcher that hits; later matchers are not run
    pub fn first_match(&self, corpus: &str) -> Option<String> {
        self.patterns.iter().find_map(|p| p.find(corpus))
    }

    pub fn patterns(&self) -> &[FieldPattern] {
        &self.patterns
    }
}

fn university() -> PatternFamily {
    PatternFamily::new(
        Field::University,
        vec![
            FieldPattern::whole("(ĐẠI HỌC ĐÔNG Á|DONG A UNIVERSITY|ĐAI HOC ĐÔNG Á|DAI HOC DONG A)"),
            FieldPattern::whole("ĐÔNG Á"),
            FieldPattern::whole("DONG A"),
        ],
    )
}

fn card_type() -> PatternFamily {
    PatternFamily::new(
        Field::CardType,
        vec![
            FieldPattern::whole("(THẺ SINH VIÊN|STUDENT CARD|THE SINH VIEN)"),
            FieldPattern::whole(r"THẺ\s+SINH\s+VIÊN"),
            FieldPattern::whole(r"THE\s+SINH\s+VIEN"),
        ],
    )
}

fn name() -> PatternFamily {
    let vietnamese = format!(
        r"([{upper}][{lower}\s]+\s+[{upper}][{lower}\s]+)",
        upper = VI_UPPER,
        lower = VI_LOWER
    );

    PatternFamily::new(
        Field::Name,
        vec![
            // Line after the card heading
            FieldPattern::group(r"(?:THẺ SINH VIÊN|THE SINH VIEN)[^\n]*\n+([^\n:]+)", true, true),
            FieldPattern::group(&vietnamese, true, true),
            FieldPattern::group(r"([A-Z][a-z]+\s+[A-Z][a-z]+\s+[A-Z][a-z]+)", true, true),
        ],
    )
}

fn date_of_birth() -> PatternFamily {
    PatternFamily::new(
        Field::DateOfBirth,
        vec![
            FieldPattern::group(r"Ngày sinh\s*:\s*(\d{2}/\d{2}/\d{4})", false, false),
            FieldPattern::group(r"Ngay sinh\s*:\s*(\d{2}/\d{2}/\d{4})", false, false),
            FieldPattern::group(r"DOB\s*:\s*(\d{2}/\d{2}/\d{4})", false, false),
            FieldPattern::group(r"(\d{2}/\d{2}/\d{4})", false, false),
        ],
    )
}

fn student_id(precedence: IdPrecedence) -> PatternFamily {
    // 5-6 digits with no digit on either side
    let standalone = FieldPattern::group(r"(?:^|\D)(\d{5,6})(?:\D|$)", false, false);
    let labeled = FieldPattern::group(r"ID\s*:\s*(\d{5,6})", false, false);
    let student_labeled = FieldPattern::group(r"Student ID\s*:\s*(\d{5,6})", false, false);

    let patterns = match precedence {
        IdPrecedence::LabeledFirst => vec![student_labeled, labeled, standalone],
        IdPrecedence::Positional => vec![standalone, labeled, student_labeled],
    };
    PatternFamily::new(Field::StudentId, patterns)
}

fn class_name() -> PatternFamily {
    PatternFamily::new(
        Field::ClassName,
        vec![
            FieldPattern::group(r"Lớp\s*:\s*([A-Z0-9]+)", false, false),
            FieldPattern::group(r"Lop\s*:\s*([A-Z0-9]+)", false, false),
            FieldPattern::group(r"Class\s*:\s*([A-Z0-9]+)", false, false),
        ],
    )
}

fn cohort() -> PatternFamily {
    PatternFamily::new(
        Field::Cohort,
        vec![
            FieldPattern::group(r"Khóa\s*:\s*(\d{4}\s*-\s*\d{4})", false, true),
            FieldPattern::group(r"Khoa\s*:\s*(\d{4}\s*-\s*\d{4})", false, true),
            FieldPattern::group(r"Course\s*:\s*(\d{4}\s*-\s*\d{4})", false, true),
        ],
    )
}

/// Field → ordered matcher table
#[derive(Debug, Clone)]
pub struct PatternTable {
    families: Vec<PatternFamily>,
}

impl PatternTable {
    pub fn new(precedence: IdPrecedence) -> Self {
        Self {
            families: vec![
                university(),
                card_type(),
                name(),
                date_of_birth(),
                student_id(precedence),
                class_name(),
                cohort(),
            ],
        }
    }

    /// Shared compiled table for a student ID ordering
    pub fn shared(precedence: IdPrecedence) -> &'static PatternTable {
        static LABELED_FIRST: Lazy<PatternTable> =
            Lazy::new(|| PatternTable::new(IdPrecedence::LabeledFirst));
        static POSITIONAL: Lazy<PatternTable> =
            Lazy::new(|| PatternTable::new(IdPrecedence::Positional));

        match precedence {
            IdPrecedence::LabeledFirst => &LABELED_FIRST,
            IdPrecedence::Positional => &POSITIONAL,
        }
    }

    pub fn family(&self, field: Field) -> Option<&PatternFamily> {
        self.families.iter().find(|f| f.field == field)
    }

    pub fn families(&self) -> &[PatternFamily] {
        &self.families
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> &'static PatternTable {
        PatternTable::shared(IdPrecedence::LabeledFirst)
    }

    fn first(field: Field, corpus: &str) -> Option<String> {
        table().family(field).unwrap().first_match(corpus)
    }

    #[test]
    fn test_every_field_has_a_family() {
        for field in Field::ALL {
            let family = table().family(field).unwrap();
            assert!(family.patterns().len() >= 3, "{}", field.name());
        }
    }

    #[test]
    fn test_university_prefers_full_name() {
        let corpus = "DONG A\nsome noise\nĐẠI HỌC ĐÔNG Á";
        assert_eq!(first(Field::University, corpus).as_deref(), Some("ĐẠI HỌC ĐÔNG Á"));
    }

    #[test]
    fn test_university_is_case_insensitive() {
        assert_eq!(
            first(Field::University, "welcome to dong a university").as_deref(),
            Some("dong a university")
        );
        assert_eq!(first(Field::University, "Truong Dong A").as_deref(), Some("Dong A"));
    }

    #[test]
    fn test_card_type_spaced_fallback() {
        assert_eq!(
            first(Field::CardType, "THẺ   SINH\tVIÊN").as_deref(),
            Some("THẺ   SINH\tVIÊN")
        );
        assert_eq!(
            first(Field::CardType, "student card").as_deref(),
            Some("student card")
        );
    }

    #[test]
    fn test_name_after_card_heading() {
        let corpus = "THẺ SINH VIÊN\n\n  Trần Thị Bích  \nNgày sinh: 02/03/2001";
        assert_eq!(first(Field::Name, corpus).as_deref(), Some("Trần Thị Bích"));
    }

    #[test]
    fn test_name_without_heading_uses_diacritic_pattern() {
        let corpus = "12 Lê Văn\n";
        let name = first(Field::Name, corpus).unwrap();
        assert!(name.starts_with("Lê Văn"));
    }

    #[test]
    fn test_name_is_case_insensitive() {
        assert_eq!(first(Field::Name, "nguyen van a").as_deref(), Some("nguyen van a"));
        assert_eq!(first(Field::Name, "42 trần thị bích").as_deref(), Some("trần thị bích"));
    }

    #[test]
    fn test_date_of_birth_labels_beat_bare_dates() {
        let corpus = "Issued 05/06/2020\nNgày sinh: 01/01/2000";
        assert_eq!(first(Field::DateOfBirth, corpus).as_deref(), Some("01/01/2000"));

        let corpus = "Issued 05/06/2020\nDOB : 07/08/1999";
        assert_eq!(first(Field::DateOfBirth, corpus).as_deref(), Some("07/08/1999"));

        assert_eq!(
            first(Field::DateOfBirth, "valid until 31/12/2025").as_deref(),
            Some("31/12/2025")
        );
    }

    #[test]
    fn test_date_labels_are_case_sensitive() {
        // lowercase "dob" misses the label but the bare date still matches
        let corpus = "dob: 01/02/2003";
        assert_eq!(first(Field::DateOfBirth, corpus).as_deref(), Some("01/02/2003"));
        assert!(first(Field::DateOfBirth, "dob: 1/2/2003").is_none());
    }

    #[test]
    fn test_standalone_id_rejects_longer_numbers() {
        let table = PatternTable::shared(IdPrecedence::Positional);
        let family = table.family(Field::StudentId).unwrap();

        assert_eq!(family.first_match("phone 0905123456 id 54321").as_deref(), Some("54321"));
        assert_eq!(family.first_match("1234567").as_deref(), None);
        assert_eq!(family.first_match("123456").as_deref(), Some("123456"));
    }

    #[test]
    fn test_labeled_first_id_order() {
        let corpus = "Ref 54321\nID: 123456";
        assert_eq!(first(Field::StudentId, corpus).as_deref(), Some("123456"));
    }

    #[test]
    fn test_positional_id_order() {
        let corpus = "Ref 54321\nID: 123456";
        let family = PatternTable::shared(IdPrecedence::Positional)
            .family(Field::StudentId)
            .unwrap();
        assert_eq!(family.first_match(corpus).as_deref(), Some("54321"));
    }

    #[test]
    fn test_class_name_labels() {
        assert_eq!(first(Field::ClassName, "Lớp: CT1").as_deref(), Some("CT1"));
        assert_eq!(first(Field::ClassName, "Class :ST21A2").as_deref(), Some("ST21A2"));
        // class codes are uppercase only
        assert!(first(Field::ClassName, "Lop: ct1").is_none());
    }

    #[test]
    fn test_cohort_is_trimmed_and_keeps_inner_spacing() {
        assert_eq!(first(Field::Cohort, "Khóa: 2018-2022").as_deref(), Some("2018-2022"));
        assert_eq!(
            first(Field::Cohort, "Course : 2019 - 2023 ").as_deref(),
            Some("2019 - 2023")
        );
    }

    #[test]
    fn test_id_precedence_serde_names() {
        let json = serde_json::to_string(&IdPrecedence::LabeledFirst).unwrap();
        assert_eq!(json, "\"labeled_first\"");
        let parsed: IdPrecedence = serde_json::from_str("\"positional\"").unwrap();
        assert_eq!(parsed, IdPrecedence::Positional);
    }
}
