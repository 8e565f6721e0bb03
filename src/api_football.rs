use std::env;

use anyhow::{Context, Result, bail};
use chrono::{Datelike, Utc};
use serde_json::Value;

use crate::http_client::http_client;
use crate::model::{CardRates, FormResult};
use crate::provider::{MatchContext, StatsProvider};
use crate::ttl_cache::{TtlCache, default_ttl};

const API_BASE: &str = "https://api-football-v1.p.rapidapi.com/v3";
const DEFAULT_HOST: &str = "api-football-v1.p.rapidapi.com";

// Rough share of an injury list that tends to be first-team starters.
const STARTER_SHARE: f64 = 0.3;

pub struct ApiFootballProvider {
    api_key: Option<String>,
    host: String,
    cache: TtlCache,
}

impl ApiFootballProvider {
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("API_FOOTBALL_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            host: env::var("API_FOOTBALL_HOST")
                .ok()
                .filter(|host| !host.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            cache: TtlCache::open("api_football", default_ttl()),
        }
    }

    fn get_json(&self, path_and_query: &str) -> Result<String> {
        if let Some(body) = self.cache.get(path_and_query) {
            return Ok(body);
        }

        let client = http_client()?;
        let mut req = client.get(format!("{API_BASE}{path_and_query}"));
        if let Some(key) = self.api_key.as_deref() {
            req = req
                .header("X-RapidAPI-Key", key)
                .header("X-RapidAPI-Host", self.host.as_str());
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

impl StatsProvider for ApiFootballProvider {
    fn name(&self) -> &'static str {
        "api-football"
    }

    fn match_context(&self, match_id: &str) -> Result<MatchContext> {
        let body = self.get_json(&format!("/fixtures?id={match_id}"))?;
        parse_fixture_context_json(&body)
    }

    fn recent_form(&self, team_id: &str) -> Result<Vec<FormResult>> {
        let body = self.get_json(&format!("/fixtures?team={team_id}&last=5&status=FT"))?;
        parse_fixture_form_json(&body, team_id)
    }

    fn standing_position(&self, competition: &str, team_id: &str) -> Result<Option<u32>> {
        let body = self.get_json(&format!(
            "/standings?league={competition}&season={}",
            current_season()
        ))?;
        parse_standing_json(&body, team_id)
    }

    fn card_rates(&self, team_id: &str) -> Result<Option<CardRates>> {
        let body = self.get_json(&format!(
            "/teams/statistics?team={team_id}&season={}",
            current_season()
        ))?;
        parse_card_rates_json(&body)
    }

    fn key_starters_out(&self, team_id: &str) -> Result<Option<u32>> {
        let body = self.get_json(&format!(
            "/injuries?team={team_id}&season={}",
            current_season()
        ))?;
        parse_injury_count_json(&body)
    }
}

fn current_season() -> i32 {
    Utc::now().year()
}

pub fn parse_fixture_context_json(raw: &str) -> Result<MatchContext> {
    let root: Value = serde_json::from_str(raw).context("invalid fixtures json")?;
    let Some(fixture) = root
        .get("response")
        .and_then(|v| v.as_array())
        .and_then(|list| list.first())
    else {
        bail!("fixture not found in response");
    };

    let league = fixture.get("league").unwrap_or(&Value::Null);
    let teams = fixture.get("teams").unwrap_or(&Value::Null);
    let info = fixture.get("fixture").unwrap_or(&Value::Null);

    Ok(MatchContext {
        competition: pick_string(league, &["id"])
            .or_else(|| pick_string(league, &["name"]))
            .unwrap_or_default(),
        season: pick_string(league, &["season"]).unwrap_or_default(),
        utc_kickoff: pick_string(info, &["date"]).unwrap_or_default(),
        home_team_id: team_field(teams, "home", &["id"]).unwrap_or_default(),
        home_team_name: team_field(teams, "home", &["name"]).unwrap_or_default(),
        away_team_id: team_field(teams, "away", &["id"]).unwrap_or_default(),
        away_team_name: team_field(teams, "away", &["name"]).unwrap_or_default(),
        venue: info
            .get("venue")
            .and_then(|v| pick_string(v, &["name"]))
            .filter(|name| !name.is_empty()),
    })
}

pub fn parse_fixture_form_json(raw: &str, team_id: &str) -> Result<Vec<FormResult>> {
    let root: Value = serde_json::from_str(raw).context("invalid fixtures json")?;
    let Some(list) = root.get("response").and_then(|v| v.as_array()) else {
        return Ok(Vec::new());
    };

    let mut form = Vec::new();
    for item in list {
        let Some(teams) = item.get("teams") else {
            continue;
        };
        let home_id = team_field(teams, "home", &["id"]).unwrap_or_default();
        let away_id = team_field(teams, "away", &["id"]).unwrap_or_default();
        let home_winner = teams
            .get("home")
            .and_then(|t| t.get("winner"))
            .and_then(|v| v.as_bool());
        let away_winner = teams
            .get("away")
            .and_then(|t| t.get("winner"))
            .and_then(|v| v.as_bool());

        let result = match (home_winner, away_winner) {
            (None, None) => FormResult::Draw,
            (Some(true), _) if home_id == team_id => FormResult::Win,
            (_, Some(true)) if away_id == team_id => FormResult::Win,
            _ => FormResult::Loss,
        };
        form.push(result);
    }

    // The `last=` endpoint returns newest first; the model wants oldest first.
    form.reverse();
    if form.len() > 5 {
        form.drain(..form.len() - 5);
    }
    Ok(form)
}

pub fn parse_card_rates_json(raw: &str) -> Result<Option<CardRates>> {
    let root: Value = serde_json::from_str(raw).context("invalid team statistics json")?;
    let response = root.get("response").unwrap_or(&Value::Null);
    let Some(cards) = response.get("cards") else {
        return Ok(None);
    };

    let yellow_total = sum_card_buckets(cards.get("yellow"));
    let red_total = sum_card_buckets(cards.get("red"));

    let played = response
        .get("fixtures")
        .and_then(|f| f.get("played"))
        .and_then(|p| p.get("total"))
        .and_then(|v| v.as_f64())
        .filter(|n| *n > 0.0)
        .unwrap_or(1.0);

    Ok(Some(CardRates {
        yellow_per_match: yellow_total / played,
        red_per_match: red_total / played,
    }))
}

// Card counts come bucketed by match minute ("0-15", "16-30", ...); only the
// totals matter here.
fn sum_card_buckets(value: Option<&Value>) -> f64 {
    let Some(buckets) = value.and_then(|v| v.as_object()) else {
        return 0.0;
    };
    buckets
        .values()
        .filter_map(|bucket| bucket.get("total"))
        .filter_map(|total| total.as_f64())
        .sum()
}

pub fn parse_injury_count_json(raw: &str) -> Result<Option<u32>> {
    let root: Value = serde_json::from_str(raw).context("invalid injuries json")?;
    let Some(list) = root.get("response").and_then(|v| v.as_array()) else {
        return Ok(None);
    };
    let starters = (list.len() as f64 * STARTER_SHARE).round() as u32;
    Ok(Some(starters))
}

pub fn parse_standing_json(raw: &str, team_id: &str) -> Result<Option<u32>> {
    let root: Value = serde_json::from_str(raw).context("invalid standings json")?;
    let Some(groups) = root.get("response").and_then(|v| v.as_array()) else {
        return Ok(None);
    };

    for group in groups {
        let Some(tables) = group
            .get("league")
            .and_then(|l| l.get("standings"))
            .and_then(|s| s.as_array())
        else {
            continue;
        };
        for table in tables {
            let Some(rows) = table.as_array() else {
                continue;
            };
            for row in rows {
                let matches_team = row
                    .get("team")
                    .and_then(|t| pick_string(t, &["id"]))
                    .map(|id| id == team_id)
                    .unwrap_or(false);
                if matches_team {
                    return Ok(row.get("rank").and_then(|v| v.as_u64()).map(|r| r as u32));
                }
            }
        }
    }
    Ok(None)
}

fn team_field(teams: &Value, side: &str, keys: &[&str]) -> Option<String> {
    teams.get(side).and_then(|team| pick_string(team, keys))
}

fn pick_string(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match value.get(*key) {
            Some(Value::String(s)) => return Some(s.trim().to_string()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => continue,
        }
    }
    None
}
