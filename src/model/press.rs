//! Press office documents other than communiqués: journalist accreditations
//! and periodic press reviews.
//!
//! Both are rendered with the tenant's [`RenderSettings`](super::RenderSettings)
//! branding but have fixed layouts of their own.

use serde::{Deserialize, Serialize};

/// Header of an accreditation when the tenant configured none.
pub const ACCREDITATION_HEADER_LINES: [&str; 2] = ["Inspectoratul pentru Situații de Urgență", "al Județului"];

/// Title of an accreditation.
pub const ACCREDITATION_TITLE: &str = "ACREDITARE";

/// Legal basis sentence introducing the accredited journalist.
pub const ACCREDITATION_LEGAL_BASIS: &str =
    "În conformitate cu prevederile art. 18 din Legea nr.544/2001 se acreditează:";

/// Conditions printed after the credential line, in order.
pub const ACCREDITATION_CONDITIONS: [&str; 2] = [
    "Ziaristul acreditat trebuie să poarte la vedere, pe tot timpul prezenței în cadrul instituției, \
     legitimația de jurnalist prezentată la acreditare care îi permite accesul.",
    "Ziaristul este obligat să țină seama și să aplice principiile deontologice și prevederile legale \
     în vigoare; este interzisă intervenția în desfășurarea activităților instituției.",
];

/// Personal data notice closing an accreditation.
pub const PERSONAL_DATA_NOTICE: &str = "Prezentul document conține date cu caracter personal \
     prelucrate și protejate în conformitate cu prevederile legale.";

/// Header of a press review when the tenant configured none.
pub const REVIEW_HEADER_LINES: [&str; 2] = [
    "Inspectoratul pentru Situații de Urgență",
    "Compartiment Informare și Relații Publice",
];

/// Section listing the item titles.
pub const REVIEW_CONTENTS_LABEL: &str = "Cuprins";

/// Section holding the items.
pub const REVIEW_ITEMS_LABEL: &str = "Materiale";

/// Caption above the compiler's name.
pub const REVIEW_COMPILED_CAPTION: &str = "ÎNTOCMIT";

/// Accreditation of one journalist with the institution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccreditationRecord {
    /// Registry number (display only)
    pub number: String,

    /// Pre-formatted issue date
    pub date_label: String,

    /// Accredited journalist
    pub journalist: String,

    /// Press card number
    pub press_card: String,

    /// Newsroom that issued the press card
    pub newsroom: String,
}

impl AccreditationRecord {
    /// Create an accreditation for `journalist`.
    pub fn new(number: impl Into<String>, date_label: impl Into<String>, journalist: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            date_label: date_label.into(),
            journalist: journalist.into(),
            ..Default::default()
        }
    }

    /// Set the press card number and the issuing newsroom.
    pub fn with_press_card(mut self, card: impl Into<String>, newsroom: impl Into<String>) -> Self {
        self.press_card = card.into();
        self.newsroom = newsroom.into();
        self
    }

    /// "Nr. <number> din <date>".
    pub fn number_line(&self) -> String {
        format!("Nr. {} din {}", self.number.trim(), self.date_label.trim())
    }

    /// Sentence naming the press card and its newsroom.
    pub fn credential_line(&self) -> String {
        format!(
            "legitimație de presă {}, eliberată de {}, în vederea prezentării activităților instituției.",
            self.press_card.trim(),
            self.newsroom.trim()
        )
    }
}

/// One monitored press article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PressReviewItem {
    pub title: String,

    /// Article text or summary
    pub content: Option<String>,

    /// Publishing newsroom
    pub newsroom: Option<String>,
}

impl PressReviewItem {
    /// Create an item with a title only.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the article text.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the publishing newsroom.
    pub fn with_newsroom(mut self, newsroom: impl Into<String>) -> Self {
        self.newsroom = Some(newsroom.into());
        self
    }

    /// Content, absent when blank.
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    /// "<newsroom> – <title>", or the title alone without a newsroom.
    pub fn label(&self) -> String {
        match self.newsroom.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            Some(newsroom) => format!("{} – {}", newsroom, self.title),
            None => self.title.clone(),
        }
    }
}

/// Press articles of a period, collected by the press office.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PressReview {
    /// Registry number (display only)
    pub number: String,

    /// Pre-formatted issue date
    pub date_label: String,

    /// Pre-formatted covered period
    pub period_label: String,

    /// Person who compiled the review
    pub compiled_by: Option<String>,

    pub items: Vec<PressReviewItem>,
}

impl PressReview {
    /// Create an empty review of a period.
    pub fn new(number: impl Into<String>, date_label: impl Into<String>, period_label: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            date_label: date_label.into(),
            period_label: period_label.into(),
            ..Default::default()
        }
    }

    /// Set who compiled the review.
    pub fn with_compiled_by(mut self, name: impl Into<String>) -> Self {
        self.compiled_by = Some(name.into());
        self
    }

    /// Append an item.
    pub fn with_item(mut self, item: PressReviewItem) -> Self {
        self.items.push(item);
        self
    }

    /// Build the period label from two pre-formatted dates; equal dates
    /// give a single day.
    pub fn period(from: &str, to: &str) -> String {
        let (from, to) = (from.trim(), to.trim());
        if from == to {
            from.to_string()
        } else {
            format!("{} – {}", from, to)
        }
    }

    /// "Revista presei – <period>".
    pub fn title(&self) -> String {
        format!("Revista presei – {}", self.period_label.trim())
    }

    /// "Nr. <number> / <date>", with a dash for a missing number.
    pub fn number_line(&self) -> String {
        let number = match self.number.trim() {
            "" => "—",
            n => n,
        };
        format!("Nr. {} / {}", number, self.date_label.trim())
    }

    /// Compiler name, absent when blank.
    pub fn compiled_by(&self) -> Option<&str> {
        self.compiled_by.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// Configured header lines, or `defaults` when there are none.
pub(crate) fn header_or(lines: &[String], defaults: &[&str]) -> Vec<String> {
    if lines.iter().any(|l| !l.trim().is_empty()) {
        lines.to_vec()
    } else {
        defaults.iter().map(|l| l.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accreditation_lines() {
        let record = AccreditationRecord::new("7", "03/04/2024", "Ion Popescu").with_press_card("A-12", "Radio Iași");
        assert_eq!(record.number_line(), "Nr. 7 din 03/04/2024");
        assert!(record.credential_line().starts_with("legitimație de presă A-12, eliberată de Radio Iași,"));
    }

    #[test]
    fn test_accreditation_from_json() {
        let json = r#"{"number":"3","dateLabel":"01/02/2024","journalist":"Ana","pressCard":"X1"}"#;
        let record: AccreditationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.journalist, "Ana");
        assert_eq!(record.press_card, "X1");
        assert!(record.newsroom.is_empty());
    }

    #[test]
    fn test_item_label() {
        let item = PressReviewItem::new("Incendiu").with_newsroom("Ziarul de Iași");
        assert_eq!(item.label(), "Ziarul de Iași – Incendiu");
        assert_eq!(PressReviewItem::new("Incendiu").with_newsroom(" ").label(), "Incendiu");
        assert_eq!(PressReviewItem::new("x").with_content("  ").content(), None);
    }

    #[test]
    fn test_review_labels() {
        assert_eq!(PressReview::period("01.03.2024", "01.03.2024"), "01.03.2024");
        assert_eq!(PressReview::period("01.03.2024", "31.03.2024"), "01.03.2024 – 31.03.2024");

        let review = PressReview::new("", "02.04.2024", "martie");
        assert_eq!(review.title(), "Revista presei – martie");
        assert_eq!(review.number_line(), "Nr. — / 02.04.2024");
        assert_eq!(review.compiled_by(), None);
    }

    #[test]
    fn test_header_fallback() {
        assert_eq!(header_or(&[], &REVIEW_HEADER_LINES)[1], REVIEW_HEADER_LINES[1]);
        assert_eq!(header_or(&["  ".to_string()], &ACCREDITATION_HEADER_LINES).len(), 2);
        assert_eq!(header_or(&["ISU".to_string()], &ACCREDITATION_HEADER_LINES), vec!["ISU".to_string()]);
    }
}
