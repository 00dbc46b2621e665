//! Tests for combination space sizing and collision diagnostics

#[cfg(test)]
mod tests {
    use crate::support::{collection, layers};
    use traitmint::catalog::model::TraitCategory;
    use traitmint::math::space::{collision_suspects, combination_space, diagnose_category};

    // Tests the space is the product of reachable options
    // Verified by counting zero-weight layers
    #[test]
    fn test_combination_space() {
        let config = collection(vec![
            TraitCategory::required("Background", layers(&[("red", 1), ("blue", 1)])),
            TraitCategory::required("Body", layers(&[("a", 1), ("b", 0), ("c", 2)])),
            TraitCategory::optional("Hat", layers(&[("cap", 1)]), 4),
        ]);

        assert_eq!(combination_space(&config), 2 * 2 * 2);
    }

    // Tests an absent slot with zero weight adds nothing
    // Verified by counting the absent slot unconditionally
    #[test]
    fn test_space_ignores_unreachable_absent() {
        let config = collection(vec![TraitCategory::optional(
            "Hat",
            layers(&[("cap", 1), ("crown", 1)]),
            0,
        )]);

        assert_eq!(combination_space(&config), 2);
    }

    // Tests huge catalogs saturate instead of overflowing
    // Verified by using wrapping multiplication
    #[test]
    fn test_space_saturates() {
        let wide: Vec<(String, u32)> = (0..65_536).map(|i| (format!("l{i}"), 1)).collect();
        let specs: Vec<(&str, u32)> = wide.iter().map(|(n, w)| (n.as_str(), *w)).collect();
        let categories = (0..5)
            .map(|i| TraitCategory::required(format!("C{i}"), layers(&specs)))
            .collect();

        assert_eq!(combination_space(&collection(categories)), u64::MAX);
    }

    // Tests diagnostics of a skewed category
    // Verified by computing effective options from raw weights
    #[test]
    fn test_diagnose_category() {
        let category =
            TraitCategory::optional("Hat", layers(&[("cap", 1), ("crown", 1)]), 98);

        let suspect = diagnose_category(&category).unwrap();
        assert_eq!(suspect.category, "Hat");
        assert_eq!(suspect.dominant_option, "none");
        assert!((suspect.dominant_share - 0.98).abs() < 1e-9);
        assert!(suspect.effective_options < 1.1);
        assert_eq!(suspect.reachable_options, 3);
        assert!(suspect.skew() > 2.5);
        assert!(suspect.to_string().starts_with("Hat (none at 98%"));
    }

    // Tests categories with no weight produce no diagnosis
    // Verified by dividing by a zero total
    #[test]
    fn test_diagnose_zero_weight() {
        let category = TraitCategory::required("Body", layers(&[("a", 0)]));

        assert!(diagnose_category(&category).is_none());
    }

    // Tests suspects are ordered worst first and truncated
    // Verified by sorting ascending by skew
    #[test]
    fn test_suspect_ordering() {
        let config = collection(vec![
            TraitCategory::required("Even", layers(&[("a", 1), ("b", 1)])),
            TraitCategory::required("Skewed", layers(&[("a", 99), ("b", 1)])),
            TraitCategory::required("Mild", layers(&[("a", 3), ("b", 1)])),
        ]);

        let suspects = collision_suspects(&config, 2);
        let names: Vec<&str> = suspects.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(names, vec!["Skewed", "Mild"]);
    }

    // Tests evenly weighted categories are never reported
    // Verified by listing every category with a positive total
    #[test]
    fn test_even_categories_not_suspected() {
        let config = collection(vec![
            TraitCategory::required("Background", layers(&[("red", 5), ("blue", 5)])),
            TraitCategory::required("Body", layers(&[("only", 1)])),
            TraitCategory::optional("Hat", layers(&[("cap", 2), ("crown", 2)]), 2),
            TraitCategory::required("Eyes", layers(&[("open", 40), ("shut", 1)])),
        ]);

        let suspects = collision_suspects(&config, 10);
        let names: Vec<&str> = suspects.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(names, vec!["Eyes"]);
        assert!(collision_suspects(&collection(vec![config.categories[0].clone()]), 10).is_empty());
    }
}
