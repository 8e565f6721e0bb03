use std::env;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::api_football::ApiFootballProvider;
use crate::demo::DemoProvider;
use crate::football_data::FootballDataProvider;
use crate::model::{CardRates, FormResult, MatchInput, TeamIndicators};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchContext {
    pub competition: String,
    pub season: String,
    pub utc_kickoff: String,
    pub home_team_id: String,
    pub home_team_name: String,
    pub away_team_id: String,
    pub away_team_name: String,
    pub venue: Option<String>,
}

/// One upstream statistics service, adapted to the model's input contract.
/// Card and injury data are optional enrichers; providers without them keep
/// the defaults.
pub trait StatsProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn match_context(&self, match_id: &str) -> Result<MatchContext>;

    /// Last finished results, oldest first, at most five.
    fn recent_form(&self, team_id: &str) -> Result<Vec<FormResult>>;

    fn standing_position(&self, competition: &str, team_id: &str) -> Result<Option<u32>>;

    fn card_rates(&self, _team_id: &str) -> Result<Option<CardRates>> {
        Ok(None)
    }

    fn key_starters_out(&self, _team_id: &str) -> Result<Option<u32>> {
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    FootballData,
    ApiFootball,
    Demo,
}

impl ProviderKind {
    pub fn label(self) -> &'static str {
        match self {
            ProviderKind::FootballData => "football-data",
            ProviderKind::ApiFootball => "api-football",
            ProviderKind::Demo => "demo",
        }
    }
}

pub fn configured_kind() -> Result<ProviderKind> {
    let choice = env::var("PROVIDER").unwrap_or_else(|_| "auto".to_string());
    match choice.trim().to_lowercase().as_str() {
        "auto" | "" => Ok(auto_kind()),
        "football-data" | "footballdata" | "fd" => Ok(ProviderKind::FootballData),
        "api-football" | "apifootball" | "af" => Ok(ProviderKind::ApiFootball),
        "demo" => Ok(ProviderKind::Demo),
        other => bail!("unknown PROVIDER value: {other}"),
    }
}

fn auto_kind() -> ProviderKind {
    if has_env("FOOTBALL_DATA_TOKEN") {
        ProviderKind::FootballData
    } else if has_env("API_FOOTBALL_KEY") {
        ProviderKind::ApiFootball
    } else {
        ProviderKind::Demo
    }
}

/// Kinds usable right now, in cycle order. Demo is always last and always
/// available.
pub fn available_kinds() -> Vec<ProviderKind> {
    let mut kinds = Vec::new();
    if has_env("FOOTBALL_DATA_TOKEN") {
        kinds.push(ProviderKind::FootballData);
    }
    if has_env("API_FOOTBALL_KEY") {
        kinds.push(ProviderKind::ApiFootball);
    }
    kinds.push(ProviderKind::Demo);
    kinds
}

pub fn make_provider(kind: ProviderKind) -> Box<dyn StatsProvider> {
    match kind {
        ProviderKind::FootballData => Box::new(FootballDataProvider::from_env()),
        ProviderKind::ApiFootball => Box::new(ApiFootballProvider::from_env()),
        ProviderKind::Demo => Box::new(DemoProvider::new()),
    }
}

fn has_env(key: &str) -> bool {
    env::var(key).map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// Assemble the model input for a match, degrading every optional signal to
/// its documented neutral default instead of failing. Warnings describe what
/// was substituted. Home and away sides fetch in parallel.
pub fn build_match_input(
    provider: &dyn StatsProvider,
    ctx: &MatchContext,
    home_advantage: f64,
) -> (MatchInput, Vec<String>) {
    let (home, away) = rayon::join(
        || fetch_team_side(provider, ctx, &ctx.home_team_id, &ctx.home_team_name),
        || fetch_team_side(provider, ctx, &ctx.away_team_id, &ctx.away_team_name),
    );

    let mut warnings = home.1;
    warnings.extend(away.1);

    (
        MatchInput {
            home: home.0,
            away: away.0,
            home_advantage,
        },
        warnings,
    )
}

fn fetch_team_side(
    provider: &dyn StatsProvider,
    ctx: &MatchContext,
    team_id: &str,
    team_name: &str,
) -> (TeamIndicators, Vec<String>) {
    let mut warnings = Vec::new();

    let form = match provider.recent_form(team_id) {
        Ok(form) if !form.is_empty() => form,
        Ok(_) => {
            warnings.push(format!("{team_name}: no recent results, assuming all draws"));
            vec![FormResult::Draw; 5]
        }
        Err(err) => {
            warnings.push(format!("{team_name}: form fetch failed ({err:#}), assuming all draws"));
            vec![FormResult::Draw; 5]
        }
    };

    let position = if ctx.competition.trim().is_empty() {
        None
    } else {
        match provider.standing_position(&ctx.competition, team_id) {
            Ok(position) => position,
            Err(err) => {
                warnings.push(format!("{team_name}: standings fetch failed ({err:#})"));
                None
            }
        }
    };

    let cards = match provider.card_rates(team_id) {
        Ok(cards) => cards,
        Err(err) => {
            warnings.push(format!("{team_name}: card stats unavailable ({err:#})"));
            None
        }
    };

    let key_starters_out = match provider.key_starters_out(team_id) {
        Ok(count) => count.unwrap_or(0),
        Err(err) => {
            warnings.push(format!("{team_name}: injury data unavailable ({err:#})"));
            0
        }
    };

    (
        TeamIndicators {
            form,
            position,
            cards,
            key_starters_out,
        },
        warnings,
    )
}
