use medati_metadata::{best_match, ratio, NoSimilarMatch, SIMILARITY_THRESHOLD};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn ratio_counts_matched_characters_of_both_strings() {
    assert_eq!(ratio("abcd", "bcde"), 0.75);
    assert_eq!(ratio("region name", "region_name"), 20.0 / 22.0);
    assert_eq!(ratio("installed_capacity__mw_", "installed capacity (mw)"), 38.0 / 46.0);
    assert_eq!(ratio("x", "zzz"), 0.0);
    assert_eq!(ratio("", ""), 1.0);
    assert_eq!(ratio("", "id"), 0.0);
}

#[test]
fn ratio_depends_on_argument_order() {
    assert_eq!(ratio("tide", "diet"), 0.25);
    assert_eq!(ratio("diet", "tide"), 0.5);
}

#[test]
fn accepts_spacing_and_punctuation_differences() {
    let columns = ["id", "region_name", "installed_capacity__mw_", "year"];
    assert_eq!(best_match(&columns, "region name").unwrap(), "region_name");
    assert_eq!(
        best_match(&columns, "installed capacity (mw)").unwrap(),
        "installed_capacity__mw_"
    );
    assert_eq!(best_match(&columns, "year").unwrap(), "year");
}

#[test]
fn a_truncated_field_name_is_not_guessed() {
    // 2 * 6 / 17: "region" covers too little of "region_name" to clear the threshold.
    let err = best_match(&["region_name", "country"], "region").unwrap_err();
    assert_eq!(err.scores[0], ("region_name".to_string(), 12.0 / 17.0));
    assert!(err.scores.iter().all(|(_, score)| *score < SIMILARITY_THRESHOLD));
}

#[test]
fn no_overlap_reports_every_score() {
    let err = best_match(&["x", "y"], "zzz").unwrap_err();
    assert_eq!(
        err,
        NoSimilarMatch {
            target: "zzz".to_string(),
            candidates: vec!["x".to_string(), "y".to_string()],
            scores: vec![("x".to_string(), 0.0), ("y".to_string(), 0.0)],
        }
    );
    assert_eq!(
        err.to_string(),
        "metadata field name `zzz` has no similar column among [\"x\", \"y\"]; \
         every similarity is below 0.8: [x=0.000, y=0.000]"
    );
}

#[test]
fn empty_candidate_list_is_an_error() {
    let err = best_match::<&str>(&[], "id").unwrap_err();
    assert!(err.candidates.is_empty());
    assert!(err.scores.is_empty());
}

#[test]
fn ties_go_to_the_earlier_candidate() {
    assert_eq!(best_match(&["value_a", "value_b"], "value_c").unwrap(), "value_a");
    assert_eq!(best_match(&["value_b", "value_a"], "value_c").unwrap(), "value_b");
}

#[test]
fn a_perfect_match_beats_an_earlier_close_one() {
    assert_eq!(
        best_match(&["region_names", "region_name"], "region_name").unwrap(),
        "region_name"
    );
}

#[test]
fn matching_is_case_sensitive() {
    assert!(best_match(&["id"], "ID").is_err());
}

proptest! {
    #[test]
    fn every_string_is_identical_to_itself(s in "\\PC{0,40}") {
        prop_assert_eq!(ratio(&s, &s), 1.0);
    }

    #[test]
    fn ratio_stays_in_the_unit_interval(a in "\\PC{0,30}", b in "\\PC{0,30}") {
        let score = ratio(&a, &b);
        prop_assert!((0.0..=1.0).contains(&score), "{score}");
    }

    #[test]
    fn best_match_is_deterministic(
        candidates in proptest::collection::vec("[a-z_]{1,12}", 1..8),
        target in "[a-z_ ]{1,12}",
    ) {
        prop_assert_eq!(best_match(&candidates, &target), best_match(&candidates, &target));
    }

    #[test]
    fn never_guesses_below_the_threshold(
        candidates in proptest::collection::vec("[a-e_]{1,10}", 1..8),
        target in "[a-e_ ]{1,10}",
    ) {
        let best_score = candidates
            .iter()
            .map(|c| ratio(c, &target))
            .fold(0.0_f64, f64::max);
        match best_match(&candidates, &target) {
            Ok(chosen) => {
                prop_assert!(candidates.contains(&chosen));
                prop_assert!(ratio(&chosen, &target) >= SIMILARITY_THRESHOLD);
                prop_assert_eq!(ratio(&chosen, &target), best_score);
            }
            Err(err) => {
                prop_assert!(best_score < SIMILARITY_THRESHOLD);
                prop_assert_eq!(err.scores.len(), candidates.len());
            }
        }
    }
}
