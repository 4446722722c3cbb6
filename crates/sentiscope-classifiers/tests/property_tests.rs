//! Property tests for prediction invariants

use proptest::prelude::*;
use sentiscope_classifiers::{
    InferenceConfig, LinearModel, LogisticRegression, ModelHandle, PredictionOrchestrator,
    RegexNormalizer, Stage, StopwordFilter, SuffixStemmer, TextPipeline, TfidfVectorizer,
};
use sentiscope_core::{Sentiment, Value};
use std::sync::Arc;

const VOCAB: &[&str] = &[
    "good", "bad", "great", "terribl", "love", "hate", "product", "servic", "fast", "slow",
];

fn orchestrator(weights: Vec<f64>, bias: f64) -> PredictionOrchestrator {
    let pipeline = TextPipeline::builder()
        .stage(Stage::regex(
            "regex",
            RegexNormalizer::new()
                .lowercase(true)
                .rule(r"[^\w\s]", " ")
                .unwrap(),
        ))
        .stage(Stage::stopwords(
            "stopwords",
            StopwordFilter::new(["the", "a", "is", "was"]).unwrap(),
        ))
        .stage(Stage::stem("stemming", SuffixStemmer::new(["es", "s", "e"], 3)))
        .stage(Stage::vectorizer(
            "vectorizer",
            TfidfVectorizer::new(VOCAB.iter().map(|t| t.to_string()).collect()).unwrap(),
        ))
        .build()
        .unwrap();

    let classifier = LogisticRegression::new(LinearModel::new(weights, bias).unwrap());
    let model = ModelHandle::new("prop", Some(pipeline), Arc::new(classifier)).unwrap();
    let mut config = InferenceConfig::default();
    config.attribution.top_k = 3;
    PredictionOrchestrator::new(Arc::new(model), &config)
}

fn review() -> impl Strategy<Value = String> {
    let words = prop::sample::select(vec![
        "good", "bad", "great", "terrible", "love", "hate", "the", "products", "service", "is",
        "was", "fast", "slow", "!!", "ok", "A", "GOOD", "Hated",
    ]);
    prop::collection::vec(words, 0..40).prop_map(|w| w.join(" "))
}

fn weights() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-5.0f64..5.0, VOCAB.len())
}

proptest! {
    #[test]
    fn prop_probability_in_range(text in ".{0,200}", w in weights(), bias in -3.0f64..3.0) {
        let response = orchestrator(w, bias).predict(&text).unwrap();
        prop_assert!((0.0..=1.0).contains(&response.probability));
        prop_assert!(response.probability >= 0.5);
    }

    #[test]
    fn prop_label_matches_classifier(text in review(), w in weights(), bias in -3.0f64..3.0) {
        let orchestrator = orchestrator(w.clone(), bias);
        let response = orchestrator.predict(&text).unwrap();

        let model = orchestrator.model();
        let vector = model.pipeline().unwrap().run(&text).unwrap();
        let scores = model.classifier().predict(&Value::Vector(vector)).unwrap();

        prop_assert_eq!(response.sentiment == Sentiment::Positive, scores.class_index == 1);
        prop_assert_eq!(
            response.probability.to_bits(),
            scores.probabilities[scores.class_index].to_bits()
        );
    }

    #[test]
    fn prop_one_trace_per_stage(text in ".{0,100}") {
        let orchestrator = orchestrator(vec![1.0; VOCAB.len()], 0.0);
        let response = orchestrator.predict(&text).unwrap();
        let stages = orchestrator.model().pipeline().unwrap().stage_count();
        prop_assert_eq!(response.explain.unwrap().len(), stages);
    }

    #[test]
    fn prop_contributions_cover_nonzero_features(text in review(), w in weights()) {
        let orchestrator = orchestrator(w, 0.0);
        let response = orchestrator.predict(&text).unwrap();
        let attribution = response.attribution.unwrap();

        let model = orchestrator.model();
        let vector = model.pipeline().unwrap().run(&text).unwrap();
        let names = model.feature_names().unwrap();
        let nonzero: Vec<&str> = vector
            .nonzero_entries()
            .into_iter()
            .map(|(i, _)| names[i].as_str())
            .collect();
        let features: Vec<&str> = attribution
            .contributions
            .iter()
            .map(|c| c.feature.as_str())
            .collect();
        prop_assert_eq!(features, nonzero);

        prop_assert!(attribution.top.len() <= 3);
        prop_assert!(attribution
            .top
            .windows(2)
            .all(|p| p[0].value.abs() >= p[1].value.abs()));
    }

    #[test]
    fn prop_predict_is_deterministic(text in review(), w in weights()) {
        let orchestrator = orchestrator(w, 0.2);
        let first = orchestrator.predict(&text).unwrap();
        let second = orchestrator.predict(&text).unwrap();
        prop_assert_eq!(first.sentiment, second.sentiment);
        prop_assert_eq!(first.probability.to_bits(), second.probability.to_bits());
    }
}
