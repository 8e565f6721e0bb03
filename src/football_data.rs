use std::env;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::http_client::http_client;
use crate::model::FormResult;
use crate::provider::{MatchContext, StatsProvider};
use crate::ttl_cache::{TtlCache, default_ttl};

const API_BASE: &str = "https://api.football-data.org/v4";

pub struct FootballDataProvider {
    api_key: Option<String>,
    cache: TtlCache,
}

impl FootballDataProvider {
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("FOOTBALL_DATA_TOKEN")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            cache: TtlCache::open("football_data", default_ttl()),
        }
    }

    fn get_json(&self, path_and_query: &str) -> Result<String> {
        if let Some(body) = self.cache.get(path_and_query) {
            return Ok(body);
        }

        let client = http_client()?;
        let mut req = client.get(format!("{API_BASE}{path_and_query}"));
        if let Some(key) = self.api_key.as_deref() {
            req = req.header("X-Auth-Token", key);
        }

        let resp = req.send().context("request failed")?;
        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            bail!("http {status}: {body}");
        }

        self.cache.set(path_and_query, &body);
        Ok(body)
    }
}

impl StatsProvider for FootballDataProvider {
    fn name(&self) -> &'static str {
        "football-data"
    }

    fn match_context(&self, match_id: &str) -> Result<MatchContext> {
        let body = self.get_json(&format!("/matches/{match_id}"))?;
        parse_match_context_json(&body)
    }

    fn recent_form(&self, team_id: &str) -> Result<Vec<FormResult>> {
        let body = self.get_json(&format!(
            "/teams/{team_id}/matches?status=FINISHED&limit=5"
        ))?;
        parse_recent_form_json(&body, team_id)
    }

    fn standing_position(&self, competition: &str, team_id: &str) -> Result<Option<u32>> {
        let body = self.get_json(&format!("/competitions/{competition}/standings"))?;
        parse_standing_json(&body, team_id)
    }
}

#[derive(Debug, Deserialize)]
struct MatchResponse {
    #[serde(default)]
    competition: Option<NamedRef>,
    #[serde(default)]
    season: Option<SeasonRef>,
    #[serde(rename = "utcDate", default)]
    utc_date: Option<String>,
    #[serde(rename = "homeTeam")]
    home_team: TeamRef,
    #[serde(rename = "awayTeam")]
    away_team: TeamRef,
    #[serde(default)]
    venue: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeasonRef {
    #[serde(rename = "startDate", default)]
    start_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TeamRef {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TeamMatchesResponse {
    #[serde(default)]
    matches: Vec<FinishedMatch>,
}

#[derive(Debug, Deserialize)]
struct FinishedMatch {
    #[serde(rename = "utcDate", default)]
    utc_date: String,
    #[serde(rename = "homeTeam")]
    home_team: TeamRef,
    #[serde(rename = "awayTeam")]
    away_team: TeamRef,
    #[serde(default)]
    score: MatchScore,
}

#[derive(Debug, Deserialize, Default)]
struct MatchScore {
    #[serde(default)]
    winner: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StandingsResponse {
    #[serde(default)]
    standings: Vec<StandingsTable>,
}

#[derive(Debug, Deserialize)]
struct StandingsTable {
    #[serde(rename = "type", default)]
    table_type: Option<String>,
    #[serde(default)]
    table: Vec<StandingsRow>,
}

#[derive(Debug, Deserialize)]
struct StandingsRow {
    #[serde(default)]
    position: Option<u32>,
    #[serde(default)]
    team: Option<TeamRef>,
}

pub fn parse_match_context_json(raw: &str) -> Result<MatchContext> {
    let m: MatchResponse = serde_json::from_str(raw).context("invalid match json")?;

    // The competition code is what /competitions/{code}/standings expects;
    // fall back to the display name when it is missing.
    let competition = m
        .competition
        .as_ref()
        .and_then(|c| c.code.clone().or_else(|| c.name.clone()))
        .unwrap_or_default();
    let season = m
        .season
        .and_then(|s| s.start_date)
        .map(|date| date.chars().take(4).collect())
        .unwrap_or_default();

    Ok(MatchContext {
        competition,
        season,
        utc_kickoff: m.utc_date.unwrap_or_default(),
        home_team_id: team_id_string(&m.home_team),
        home_team_name: m.home_team.name.unwrap_or_default(),
        away_team_id: team_id_string(&m.away_team),
        away_team_name: m.away_team.name.unwrap_or_default(),
        venue: m.venue.filter(|v| !v.trim().is_empty()),
    })
}

pub fn parse_recent_form_json(raw: &str, team_id: &str) -> Result<Vec<FormResult>> {
    let data: TeamMatchesResponse = serde_json::from_str(raw).context("invalid team matches json")?;

    let mut matches = data.matches;
    matches.sort_by(|a, b| a.utc_date.cmp(&b.utc_date));

    let mut form = Vec::new();
    for m in &matches {
        let Some(winner) = m.score.winner.as_deref() else {
            continue;
        };
        let result = match winner {
            "DRAW" => FormResult::Draw,
            "HOME_TEAM" if team_id_string(&m.home_team) == team_id => FormResult::Win,
            "AWAY_TEAM" if team_id_string(&m.away_team) == team_id => FormResult::Win,
            _ => FormResult::Loss,
        };
        form.push(result);
    }

    if form.len() > 5 {
        form.drain(..form.len() - 5);
    }
    Ok(form)
}

pub fn parse_standing_json(raw: &str, team_id: &str) -> Result<Option<u32>> {
    let data: StandingsResponse = serde_json::from_str(raw).context("invalid standings json")?;

    for table in &data.standings {
        if table.table_type.as_deref() != Some("TOTAL") {
            continue;
        }
        for row in &table.table {
            let matches_team = row
                .team
                .as_ref()
                .map(|t| team_id_string(t) == team_id)
                .unwrap_or(false);
            if matches_team {
                return Ok(row.position);
            }
        }
    }
    Ok(None)
}

fn team_id_string(team: &TeamRef) -> String {
    team.id.map(|id| id.to_string()).unwrap_or_default()
}
