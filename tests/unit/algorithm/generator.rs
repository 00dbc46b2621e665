//! Tests for retry-until-unique edition generation

#[cfg(test)]
mod tests {
    use crate::support::{CountingRng, collection, layers};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;
    use traitmint::algorithm::cancel::CancellationToken;
    use traitmint::algorithm::combination::Selection;
    use traitmint::algorithm::generator::{CombinationGenerator, RetryPolicy, rng_from_seed};
    use traitmint::catalog::model::{CollectionConfig, TraitCategory};
    use traitmint::{EngineError, Stage};

    fn small() -> CollectionConfig {
        collection(vec![
            TraitCategory::required("Background", layers(&[("red", 1), ("blue", 1), ("green", 1)])),
            TraitCategory::optional("Hat", layers(&[("cap", 1), ("crown", 1)]), 1),
        ])
    }

    // Tests the retry ceiling grows with the draws expected per new combination
    // Verified by scaling with the slots still to fill
    #[test]
    fn test_retry_ceiling() {
        let policy = RetryPolicy {
            retry_factor: 10,
            retry_floor: 50,
        };

        assert_eq!(policy.ceiling(100, 0), 50);
        assert_eq!(policy.ceiling(100, 90), 100);
        assert_eq!(policy.ceiling(100, 99), 1_000);
        assert_eq!(policy.ceiling(100, 100), 50);
        assert_eq!(policy.ceiling(3, 1), 50);
        assert_eq!(RetryPolicy::default().ceiling(27_000, 26_999), 2_700_000);
    }

    // Tests a uniform space larger than the retry floor can be filled completely
    // Verified by shrinking the ceiling as the edition fills
    #[test]
    fn test_fill_uniform_space() {
        let options: Vec<String> = (0..30).map(|i| format!("l{i}")).collect();
        let specs: Vec<(&str, u32)> = options.iter().map(|name| (name.as_str(), 1)).collect();
        let config = collection(
            (0..3)
                .map(|i| TraitCategory::required(format!("C{i}"), layers(&specs)))
                .collect(),
        );
        let generator = CombinationGenerator::new(&config, RetryPolicy::default()).unwrap();
        assert_eq!(generator.combination_space(), 27_000);

        for seed in 0..2 {
            let edition = generator
                .generate(27_000, &mut StdRng::seed_from_u64(seed), &CancellationToken::new())
                .unwrap();
            assert_eq!(edition.len(), 27_000);
        }
    }

    // Tests sampler construction failures name the category
    // Verified by skipping zero-weight categories
    #[test]
    fn test_zero_weight_category() {
        let config = collection(vec![TraitCategory::required("Body", layers(&[("a", 0)]))]);

        match CombinationGenerator::new(&config, RetryPolicy::default()) {
            Err(EngineError::Sampler { category, .. }) => assert_eq!(category, "Body"),
            other => unreachable!("Expected Sampler error, got {:?}", other.err()),
        }
    }

    // Tests draws cover every category and respect its outcomes
    // Verified by drawing absent for required categories
    #[test]
    fn test_draw_shape() {
        let config = small();
        let generator = CombinationGenerator::new(&config, RetryPolicy::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(generator.combination_space(), 9);
        assert_eq!(generator.config().categories.len(), 2);
        for _ in 0..100 {
            let combination = generator.draw(&mut rng);
            assert_eq!(combination.len(), 2);
            assert_ne!(combination.selections()[0], Selection::Absent);
            assert!(combination.resolve(&config).is_ok());
        }
    }

    // Tests the whole space can be generated without duplicates
    // Verified by skipping the uniqueness check
    #[test]
    fn test_exhaust_space() {
        let config = small();
        let generator = CombinationGenerator::new(&config, RetryPolicy::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        let edition = generator
            .generate(9, &mut rng, &CancellationToken::new())
            .unwrap();

        let unique: HashSet<_> = edition.iter().cloned().collect();
        assert_eq!(edition.len(), 9);
        assert_eq!(unique.len(), 9);
        assert_eq!(edition.stats().accepted, 9);
    }

    // Tests oversize requests fail before consuming randomness
    // Verified by checking the space after sampling starts
    #[test]
    fn test_insufficient_space() {
        let config = small();
        let generator = CombinationGenerator::new(&config, RetryPolicy::default()).unwrap();
        let mut rng = CountingRng::new(StdRng::seed_from_u64(0));

        let err = generator
            .generate(10, &mut rng, &CancellationToken::new())
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::InsufficientSpace {
                requested: 10,
                available: 9
            }
        ));
        assert_eq!(rng.calls, 0);
    }

    // Tests an empty request succeeds immediately
    // Verified by requiring at least one draw
    #[test]
    fn test_zero_count() {
        let config = small();
        let generator = CombinationGenerator::new(&config, RetryPolicy::default()).unwrap();
        let mut rng = CountingRng::new(StdRng::seed_from_u64(0));

        let edition = generator
            .generate(0, &mut rng, &CancellationToken::new())
            .unwrap();
        assert!(edition.is_empty());
        assert_eq!(rng.calls, 0);
    }

    // Tests identical seeds produce identical editions
    // Verified by reseeding from entropy
    #[test]
    fn test_seeded_reproducibility() {
        let config = small();
        let generator = CombinationGenerator::new(&config, RetryPolicy::default()).unwrap();

        let first = generator
            .generate(6, &mut rng_from_seed(Some(77)), &CancellationToken::new())
            .unwrap();
        let second = generator
            .generate(6, &mut rng_from_seed(Some(77)), &CancellationToken::new())
            .unwrap();

        assert_eq!(first.combinations(), second.combinations());
    }

    // Tests a skewed catalog times out with diagnostics
    // Verified by retrying forever
    #[test]
    fn test_generation_timeout() {
        let config = collection(vec![
            TraitCategory::required("Body", layers(&[("common", 1_000_000), ("rare", 1)])),
            TraitCategory::required("Eyes", layers(&[("open", 1)])),
        ]);
        let policy = RetryPolicy {
            retry_factor: 1,
            retry_floor: 5,
        };
        let generator = CombinationGenerator::new(&config, policy).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let err = generator
            .generate(2, &mut rng, &CancellationToken::new())
            .unwrap_err();

        match &err {
            EngineError::GenerationTimeout {
                accepted,
                requested,
                rejections,
                suspects,
            } => {
                assert_eq!(*accepted, 1);
                assert_eq!(*requested, 2);
                assert_eq!(*rejections, 6);
                assert_eq!(suspects.len(), 1);
                assert_eq!(suspects[0].category, "Body");
                assert_eq!(suspects[0].dominant_option, "common");
            }
            other => unreachable!("Expected GenerationTimeout, got {other:?}"),
        }
        assert_eq!(err.stage(), Stage::Generation);
        assert!(err.to_string().contains("Body"));
    }

    // Tests cancellation stops generation at the next draw
    // Verified by checking the token only after completion
    #[test]
    fn test_cancellation() {
        let config = small();
        let generator = CombinationGenerator::new(&config, RetryPolicy::default()).unwrap();
        let cancel = CancellationToken::new();
        let mut rng = StdRng::seed_from_u64(9);
        let mut reported = Vec::new();

        let result = generator.generate_with(5, &mut rng, &cancel, |accepted| {
            reported.push(accepted);
            if accepted == 2 {
                cancel.cancel();
            }
        });

        assert!(matches!(
            result,
            Err(EngineError::Cancelled {
                stage: Stage::Generation
            })
        ));
        assert_eq!(reported, vec![1, 2]);
    }

    // Tests progress callbacks report every acceptance in order
    // Verified by reporting rejected draws
    #[test]
    fn test_progress_callback() {
        let config = small();
        let generator = CombinationGenerator::new(&config, RetryPolicy::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let mut reported = Vec::new();

        generator
            .generate_with(4, &mut rng, &CancellationToken::new(), |n| reported.push(n))
            .unwrap();

        assert_eq!(reported, vec![1, 2, 3, 4]);
    }
}
