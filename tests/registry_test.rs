//! Pure tests for the stage registry: chain order, flags, parsing.

use enrichq::error::Error;
use enrichq::pipeline::Stage;

#[test]
fn chain_is_linear_and_ends_at_postcheck2() {
    assert_eq!(Stage::Prellm.next(), Some(Stage::Llm));
    assert_eq!(Stage::Llm.next(), Some(Stage::Perp));
    assert_eq!(Stage::Perp.next(), Some(Stage::Postcheck1));
    assert_eq!(Stage::Postcheck1.next(), Some(Stage::Postcheck2));
    assert_eq!(Stage::Postcheck2.next(), None);
    assert_eq!(Stage::Photos.next(), None);
}

#[test]
fn walking_next_from_prellm_visits_every_active_stage() {
    let mut chain = vec![Stage::Prellm];
    while let Some(next) = chain.last().unwrap().next() {
        chain.push(next);
    }
    assert_eq!(chain, Stage::ACTIVE.to_vec());
}

#[test]
fn active_excludes_the_disabled_photos_stage() {
    assert!(!Stage::ACTIVE.contains(&Stage::Photos));
    assert!(Stage::ALL.contains(&Stage::Photos));
}

#[test]
fn names_round_trip() {
    for stage in Stage::ALL {
        assert_eq!(stage.as_str().parse::<Stage>().unwrap(), stage);
    }
}

#[test]
fn unknown_name_is_an_error() {
    let err = "facecheck".parse::<Stage>().unwrap_err();
    assert!(matches!(err, Error::UnknownStage(name) if name == "facecheck"));
}

#[test]
fn completion_flags_are_distinct() {
    let mut flags: Vec<&str> = Stage::ALL.iter().map(|s| s.completion_flag()).collect();
    flags.sort();
    flags.dedup();
    assert_eq!(flags.len(), Stage::ALL.len());
}

#[test]
fn each_stage_gates_on_its_predecessors_flag() {
    // The chain is only correct if predicates encode the stage order.
    let mut stage = Stage::Prellm;
    while let Some(next) = stage.next() {
        assert!(
            next.eligibility_sql().contains(stage.completion_flag()),
            "{next} predicate should require {}",
            stage.completion_flag()
        );
        stage = next;
    }
}
