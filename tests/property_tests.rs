use arxiv_digest::retrieval::text::{collapse_whitespace, finalize};
use arxiv_digest::retrieval::{normalize_whitespace, truncate_with_marker, TRUNCATION_MARKER};
use arxiv_digest::summary::fingerprint;
use arxiv_digest::{ArxivId, DetailLevel};
use proptest::prelude::*;

mod text_props {
    use super::*;

    proptest! {
        #[test]
        fn test_normalization_is_idempotent(text in "[a-z \\t\\r\\n]{0,200}") {
            let once = normalize_whitespace(&text);
            prop_assert_eq!(normalize_whitespace(&once), once);
        }

        #[test]
        fn test_normalized_text_has_no_runs(text in "[a-z \\t\\r\\n]{0,200}") {
            let normalized = normalize_whitespace(&text);
            prop_assert!(!normalized.contains("  "));
            prop_assert!(!normalized.contains("\n\n\n"));
            prop_assert!(!normalized.contains('\r'));
            prop_assert!(!normalized.contains('\t'));
            prop_assert_eq!(normalized.trim(), normalized.as_str());
        }

        #[test]
        fn test_normalization_keeps_words(words in prop::collection::vec("[a-z]{1,8}", 0..30)) {
            let spaced = words.join(" \n\t ");
            prop_assert_eq!(collapse_whitespace(&normalize_whitespace(&spaced)), words.join(" "));
        }

        #[test]
        fn test_truncation_respects_cap(text in "\\PC{0,300}", cap in 1usize..200) {
            let original_chars = text.chars().count();
            let cut = truncate_with_marker(text.clone(), cap);

            if original_chars <= cap {
                prop_assert_eq!(cut, text);
            } else {
                prop_assert!(cut.ends_with(TRUNCATION_MARKER));
                prop_assert_eq!(cut.chars().count(), cap + TRUNCATION_MARKER.chars().count());
                prop_assert!(text.starts_with(&cut[..cut.len() - TRUNCATION_MARKER.len()]));
            }
        }

        #[test]
        fn test_finalize_never_exceeds_cap_plus_marker(text in "\\PC{0,500}", cap in 1usize..300) {
            let out = finalize(&text, cap);
            prop_assert!(out.chars().count() <= cap + TRUNCATION_MARKER.chars().count());
        }
    }
}

mod identifier_props {
    use super::*;

    proptest! {
        #[test]
        fn test_new_style_ids_normalize(
            yymm in 1000u32..9999,
            number in 0u32..99_999,
            version in prop::option::of(1u32..20),
        ) {
            let base = format!("{yymm:04}.{number:05}");
            let raw = match version {
                Some(v) => format!("{base}v{v}"),
                None => base.clone(),
            };

            let id = ArxivId::new(&raw).unwrap();
            prop_assert_eq!(id.as_str(), base.as_str());
            prop_assert_eq!(ArxivId::new(&format!("arXiv:{raw}")).unwrap(), id.clone());
            prop_assert_eq!(ArxivId::new(&format!("https://arxiv.org/abs/{raw}")).unwrap(), id);
        }

        #[test]
        fn test_fingerprints_distinguish_levels(selector in "\\PC{0,100}") {
            let keys: Vec<String> = DetailLevel::ALL
                .iter()
                .map(|level| fingerprint(&selector, *level))
                .collect();
            prop_assert_ne!(&keys[0], &keys[1]);
            prop_assert_ne!(&keys[1], &keys[2]);
            prop_assert!(keys.iter().all(|k| k.len() == 64));
        }
    }
}
