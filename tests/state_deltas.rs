use std::time::SystemTime;

use footy_terminal::model::{MatchInput, predict};
use footy_terminal::provider::MatchContext;
use footy_terminal::state::{AppState, Delta, PredictionCard, apply_delta};

fn card(match_id: &str, provider: &str) -> PredictionCard {
    let input = MatchInput::default();
    let prediction = predict(&input).expect("default input is valid");
    PredictionCard {
        match_id: match_id.to_string(),
        provider: provider.to_string(),
        context: MatchContext {
            competition: "PL".to_string(),
            season: "2025".to_string(),
            utc_kickoff: "2026-02-14T15:00".to_string(),
            home_team_id: "1".to_string(),
            home_team_name: "Home".to_string(),
            away_team_id: "2".to_string(),
            away_team_name: "Away".to_string(),
            venue: None,
        },
        input,
        prediction,
        fetched_at: SystemTime::now(),
    }
}

#[test]
fn new_prediction_lands_at_front_and_is_selected() {
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::SetPrediction(card("m1", "demo")));
    state.select_next();

    apply_delta(&mut state, Delta::SetPrediction(card("m2", "demo")));
    assert_eq!(state.cards.len(), 2);
    assert_eq!(state.cards[0].match_id, "m2");
    assert_eq!(state.selected, 0);
}

#[test]
fn same_match_and_provider_replaces_in_place() {
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::SetPrediction(card("m1", "demo")));
    apply_delta(&mut state, Delta::SetPrediction(card("m2", "demo")));

    let mut updated = card("m1", "demo");
    updated.input.home_advantage = 0.4;
    apply_delta(&mut state, Delta::SetPrediction(updated));

    assert_eq!(state.cards.len(), 2);
    let m1 = state
        .cards
        .iter()
        .find(|c| c.match_id == "m1")
        .expect("m1 still present");
    assert_eq!(m1.input.home_advantage, 0.4);
}

#[test]
fn same_match_other_provider_is_a_second_card() {
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::SetPrediction(card("m1", "demo")));
    apply_delta(&mut state, Delta::SetPrediction(card("m1", "football-data")));
    assert_eq!(state.cards.len(), 2);
}

#[test]
fn log_ring_is_bounded() {
    let mut state = AppState::new();
    for i in 0..500 {
        apply_delta(&mut state, Delta::Log(format!("line {i}")));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("line 300"));
}

#[test]
fn loading_and_provider_label_update() {
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::Loading(true));
    assert!(state.loading);
    apply_delta(&mut state, Delta::SetProviderLabel("demo".to_string()));
    assert_eq!(state.provider_label, "demo");
}
