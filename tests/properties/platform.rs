//! Property tests for build tags and platform constraints.

use proptest::prelude::*;

use springbok::platform::{BuildTags, Platform};

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 96,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: tag list parsing never panics, and every comma-separated
    /// entry ends up set.
    #[test]
    fn property_build_tags_from_list(
        tags in proptest::collection::vec("[a-z][a-z0-9]{0,10}", 0..=6),
    ) {
        let list = tags.join(",");
        let parsed = BuildTags::from_list(&list);
        for tag in &tags {
            prop_assert!(parsed.is_set(tag), "tag {tag} not set");
        }
    }

    /// PROPERTY: tag list parsing tolerates arbitrary input.
    #[test]
    fn property_build_tags_never_panic(list in ".{0,128}") {
        let _ = BuildTags::from_list(&list);
    }

    /// PROPERTY: a platform's condition label always embeds its display form.
    #[test]
    fn property_condition_label_embeds_platform(
        os in "[a-z]{2,10}",
        arch in "[a-z0-9]{2,10}",
    ) {
        let platform = Platform::new(&os, &arch);
        let label = platform.condition_label();
        let want = format!("{os}_{arch}");
        prop_assert!(label.ends_with(&want), "label {label} missing {want}");
        prop_assert_eq!(platform.to_string(), want);
    }
}
