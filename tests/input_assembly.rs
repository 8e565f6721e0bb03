use anyhow::{Result, bail};

use footy_terminal::demo::DemoProvider;
use footy_terminal::model::{FormResult, predict};
use footy_terminal::provider::{MatchContext, StatsProvider, build_match_input};

/// Provider whose optional endpoints all fail, to exercise degradation.
struct FlakyProvider;

impl StatsProvider for FlakyProvider {
    fn name(&self) -> &'static str {
        "flaky"
    }

    fn match_context(&self, _match_id: &str) -> Result<MatchContext> {
        Ok(sample_context())
    }

    fn recent_form(&self, _team_id: &str) -> Result<Vec<FormResult>> {
        bail!("form endpoint down")
    }

    fn standing_position(&self, _competition: &str, _team_id: &str) -> Result<Option<u32>> {
        bail!("standings endpoint down")
    }

    fn key_starters_out(&self, _team_id: &str) -> Result<Option<u32>> {
        bail!("injuries endpoint down")
    }
}

fn sample_context() -> MatchContext {
    MatchContext {
        competition: "PL".to_string(),
        season: "2025".to_string(),
        utc_kickoff: "2026-02-14T15:00".to_string(),
        home_team_id: "1".to_string(),
        home_team_name: "Home".to_string(),
        away_team_id: "2".to_string(),
        away_team_name: "Away".to_string(),
        venue: None,
    }
}

#[test]
fn failures_degrade_to_neutral_defaults() {
    let provider = FlakyProvider;
    let ctx = sample_context();
    let (input, warnings) = build_match_input(&provider, &ctx, 0.25);

    // Every optional signal substitutes its documented neutral default.
    assert_eq!(input.home.form, vec![FormResult::Draw; 5]);
    assert_eq!(input.away.form, vec![FormResult::Draw; 5]);
    assert_eq!(input.home.position, None);
    assert_eq!(input.home.cards, None);
    assert_eq!(input.home.key_starters_out, 0);
    // One warning per failed fetch per side.
    assert_eq!(warnings.len(), 6);

    // The degraded input is still a valid model input.
    let p = predict(&input).expect("degraded input should predict");
    assert!(p.home_win > p.away_win);
}

#[test]
fn demo_provider_feeds_a_full_prediction() {
    let provider = DemoProvider::fixed();
    let ctx = provider.match_context("demo").expect("demo match exists");
    assert_eq!(ctx.home_team_name, "Alpha FC");

    let (input, warnings) = build_match_input(&provider, &ctx, 0.25);
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    assert_eq!(input.home.position, Some(3));
    assert_eq!(input.away.position, Some(15));
    assert!(input.home.cards.is_some());
    assert_eq!(input.away.key_starters_out, 3);

    let p = predict(&input).expect("demo input should predict");
    assert!((p.home_win + p.draw + p.away_win - 1.0).abs() < 1e-9);
    assert!(p.home_win > p.away_win);
}

#[test]
fn unknown_demo_match_is_rejected() {
    let provider = DemoProvider::fixed();
    assert!(provider.match_context("nope").is_err());
}
