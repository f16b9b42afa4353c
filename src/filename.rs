//! Download file names.
//!
//! Names are folded to ASCII and slugified so existing stored links keep
//! resolving. One canonical algorithm is used for every format.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::model::{AccreditationRecord, ContentRecord, FilenameFormat, PressReview, Variant};

/// Maximum length of a slug, in characters.
pub const MAX_SLUG_LEN: usize = 150;

/// Name used when nothing survives slugification.
pub const FALLBACK_NAME: &str = "Document";

/// Separator replacing disallowed characters.
const SEPARATOR: char = '_';

/// Romanian letters with their ASCII base, including the legacy cedilla forms.
const DIACRITICS: &[(char, char)] = &[
    ('ă', 'a'),
    ('â', 'a'),
    ('î', 'i'),
    ('ș', 's'),
    ('ş', 's'),
    ('ț', 't'),
    ('ţ', 't'),
    ('Ă', 'A'),
    ('Â', 'A'),
    ('Î', 'I'),
    ('Ș', 'S'),
    ('Ş', 'S'),
    ('Ț', 'T'),
    ('Ţ', 'T'),
];

/// Fold one character to its ASCII base letter, if it has one.
pub fn fold_char(c: char) -> Option<char> {
    if c.is_ascii() {
        return Some(c);
    }
    if let Some(&(_, base)) = DIACRITICS.iter().find(|(d, _)| *d == c) {
        return Some(base);
    }
    let mut decomposed = std::iter::once(c).nfd().filter(|m| !is_combining_mark(*m));
    match (decomposed.next(), decomposed.next()) {
        (Some(base), None) if base.is_ascii() => Some(base),
        _ => match c {
            'ß' => Some('s'),
            'ø' => Some('o'),
            'Ø' => Some('O'),
            'đ' => Some('d'),
            'Đ' => Some('D'),
            'ł' => Some('l'),
            'Ł' => Some('L'),
            _ => None,
        },
    }
}

/// Fold Romanian and other accented Latin letters to ASCII.
///
/// Characters without an ASCII base are kept unchanged.
pub fn fold_diacritics(s: &str) -> String {
    s.chars().map(|c| fold_char(c).unwrap_or(c)).collect()
}

/// Turn arbitrary text into a file-name-safe slug.
///
/// The result only contains `[A-Za-z0-9._-]`, has no repeated or
/// leading/trailing separators, is at most 150 characters long and is never
/// empty.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in fold_diacritics(input).chars() {
        if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == SEPARATOR {
            slug.push(c);
        } else if !slug.ends_with(SEPARATOR) {
            slug.push(SEPARATOR);
        }
    }

    // A run of separators becomes one; `_` wins over `-`.
    let mut collapsed = String::with_capacity(slug.len());
    let mut run = String::new();
    for c in slug.chars().chain(std::iter::once('\0')) {
        if c == SEPARATOR || c == '-' {
            run.push(c);
            continue;
        }
        if !run.is_empty() {
            collapsed.push(if run.contains(SEPARATOR) { SEPARATOR } else { '-' });
            run.clear();
        }
        if c != '\0' {
            collapsed.push(c);
        }
    }

    let trimmed = trim_separators(&collapsed);
    let truncated: String = trimmed.chars().take(MAX_SLUG_LEN).collect();
    let result = trim_separators(&truncated);
    if result.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        result.to_string()
    }
}

fn trim_separators(s: &str) -> &str {
    s.trim_matches(|c| c == SEPARATOR || c == '-' || c == '.')
}

/// File name of a programmatic or template PDF.
///
/// Built from the record's display title; the public variant gets a
/// `_public` suffix.
pub fn pdf_filename(record: &ContentRecord, variant: Variant) -> String {
    let base = slugify(&record.display_title());
    match variant {
        Variant::Signed => format!("{}.pdf", base),
        Variant::Public => format!("{}_public.pdf", base),
    }
}

/// File name of a DOCX export, ordered per the tenant's format.
pub fn docx_filename(record: &ContentRecord, format: FilenameFormat) -> String {
    let raw = match format {
        FilenameFormat::NumberTypeTitle => format!(
            "{}-{}-{}",
            record.document_number, record.document_type, record.title
        ),
        FilenameFormat::TypeDateTitle => format!(
            "{} {} - {}",
            record.document_type, record.display_date, record.title
        ),
    };
    format!("{}.docx", slugify(&raw))
}

/// File name of an accreditation: `acreditare_<journalist>.pdf`.
pub fn accreditation_filename(record: &AccreditationRecord) -> String {
    format!("acreditare_{}.pdf", slugify(&record.journalist))
}

/// File name of a press review: `revista_presei_<period>.pdf`.
pub fn press_review_filename(review: &PressReview) -> String {
    format!("revista_presei_{}.pdf", slugify(&review.period_label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_folds_diacritics() {
        assert_eq!(
            slugify("Comunicat — Ședința Guvernului! 2024"),
            "Comunicat_Sedinta_Guvernului_2024"
        );
        assert_eq!(slugify("Țară, șes, încă"), "Tara_ses_inca");
        assert_eq!(slugify("Ţara şi Şcoala"), "Tara_si_Scoala");
    }

    #[test]
    fn test_slugify_allowed_characters_only() {
        let slug = slugify("a/b\\c:d*e?f\"g<h>i|j  k");
        assert!(slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_'));
        assert!(!slug.contains("__"));
        assert_eq!(slug, "a_b_c_d_e_f_g_h_i_j_k");
    }

    #[test]
    fn test_slugify_trims_and_collapses() {
        assert_eq!(slugify("  __Hello___world__  "), "Hello_world");
        assert_eq!(slugify("-.x.-"), "x");
        assert_eq!(slugify("a - b--c"), "a_b-c");
    }

    #[test]
    fn test_slugify_empty_fallback() {
        assert_eq!(slugify(""), "Document");
        assert_eq!(slugify("!!! ???"), "Document");
        assert_eq!(slugify("日本語"), "Document");
    }

    #[test]
    fn test_slugify_truncates() {
        let long = "a".repeat(200);
        assert_eq!(slugify(&long).len(), MAX_SLUG_LEN);

        let spaced = format!("{} b", "a".repeat(149));
        let slug = slugify(&spaced);
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('_'));
    }

    #[test]
    fn test_slugify_deterministic() {
        let input = "Informare — ploi abundente în județul Alba";
        assert_eq!(slugify(input), slugify(input));
    }

    #[test]
    fn test_fold_other_accents() {
        assert_eq!(fold_diacritics("café über Ñandú"), "cafe uber Nandu");
        assert_eq!(fold_char('ł'), Some('l'));
        assert_eq!(fold_char('€'), None);
    }

    #[test]
    fn test_pdf_filename() {
        let record = ContentRecord::new("12", "01.02.2024", "Comunicat de Presă", "Test");
        assert_eq!(
            pdf_filename(&record, Variant::Signed),
            "12_Comunicat_de_Presa_Test.pdf"
        );
        assert_eq!(
            pdf_filename(&record, Variant::Public),
            "12_Comunicat_de_Presa_Test_public.pdf"
        );
    }

    #[test]
    fn test_docx_filename_formats() {
        let record = ContentRecord::new("12", "01.02.2024", "Informare", "Cod galben");
        assert_eq!(
            docx_filename(&record, FilenameFormat::NumberTypeTitle),
            "12-Informare-Cod_galben.docx"
        );
        assert_eq!(
            docx_filename(&record, FilenameFormat::TypeDateTitle),
            "Informare_01.02.2024_Cod_galben.docx"
        );
    }

    #[test]
    fn test_press_office_filenames() {
        let record = AccreditationRecord::new("1", "01/02/2024", "Ștefan Mureșan");
        assert_eq!(accreditation_filename(&record), "acreditare_Stefan_Muresan.pdf");

        let review = PressReview::new("2", "01.04.2024", PressReview::period("01.03.2024", "31.03.2024"));
        assert_eq!(press_review_filename(&review), "revista_presei_01.03.2024_31.03.2024.pdf");
    }
}
