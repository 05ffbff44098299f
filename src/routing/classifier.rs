//! Anchor-label classification.
//!
//! The linksolver's anchor labels are a versioned, semi-stable vocabulary.
//! Keeping the label table here means a vocabulary change touches one
//! table, not the routing engine.

/// Access category behind a linksolver anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessCategory {
    /// Full text is online available, redirect straight to the resource
    FullText,
    /// Print or online holding exists but without a resource URL
    PrintOrOnlineHolding,
    /// Elsevier journal without full-text access, order form instead
    ElsevierOrderForm,
    /// Only interlibrary loan is available
    InterlibraryLoan,
    /// Label not in the vocabulary
    Unknown,
}

/// Map an anchor's display label to its access category.
///
/// The linksolver appends a variable provider suffix to the full-text
/// label ("Volltexte über XXX"); truncating to the first 9 characters
/// recovers the stable prefix before comparison.
#[must_use]
pub fn classify(label: &str) -> AccessCategory {
    let label = if label.starts_with("Volltexte ") {
        &label[..9]
    } else {
        label
    };

    match label {
        "Link zum Artikel" | "Volltexte" => AccessCategory::FullText,
        "Elsevier Zeitschriften - Link zum Bestellformular" => AccessCategory::ElsevierOrderForm,
        "Elektronischer und gedruckter Bestand der UB" | "zur Zeitschrift" => {
            AccessCategory::PrintOrOnlineHolding
        }
        "Fernleihe" | "Fernleihe Zeitschriften" => AccessCategory::InterlibraryLoan,
        _ => AccessCategory::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_text_labels() {
        assert_eq!(classify("Link zum Artikel"), AccessCategory::FullText);
        assert_eq!(classify("Volltexte"), AccessCategory::FullText);
    }

    #[test]
    fn test_provider_suffix_is_truncated() {
        assert_eq!(
            classify("Volltexte über Nationallizenz"),
            AccessCategory::FullText
        );
        assert_eq!(classify("Volltexte via JSTOR"), AccessCategory::FullText);
    }

    #[test]
    fn test_bare_prefix_without_suffix_is_unknown() {
        // no trailing space, no suffix rule applies
        assert_eq!(classify("VolltexteX"), AccessCategory::Unknown);
    }

    #[test]
    fn test_order_form_label() {
        assert_eq!(
            classify("Elsevier Zeitschriften - Link zum Bestellformular"),
            AccessCategory::ElsevierOrderForm
        );
    }

    #[test]
    fn test_holding_labels() {
        assert_eq!(
            classify("Elektronischer und gedruckter Bestand der UB"),
            AccessCategory::PrintOrOnlineHolding
        );
        assert_eq!(classify("zur Zeitschrift"), AccessCategory::PrintOrOnlineHolding);
    }

    #[test]
    fn test_interlibrary_loan_labels() {
        assert_eq!(classify("Fernleihe"), AccessCategory::InterlibraryLoan);
        assert_eq!(
            classify("Fernleihe Zeitschriften"),
            AccessCategory::InterlibraryLoan
        );
    }

    #[test]
    fn test_unmapped_labels() {
        assert_eq!(classify(""), AccessCategory::Unknown);
        assert_eq!(classify("Impressum"), AccessCategory::Unknown);
        assert_eq!(classify("link zum artikel"), AccessCategory::Unknown);
    }

    #[test]
    fn test_classification_is_deterministic() {
        for label in ["Link zum Artikel", "Fernleihe", "Impressum"] {
            assert_eq!(classify(label), classify(label));
        }
    }
}
