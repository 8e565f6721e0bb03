use std::env;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

const FORM_WEIGHTS: [f64; 5] = [3.0, 2.0, 1.0, 1.0, 1.0];
const WIN_VALUE: f64 = 3.0;
const DRAW_VALUE: f64 = 1.0;
// Fixed regardless of how many results are available, so short histories
// pull the score down instead of renormalizing.
const FORM_DENOM: f64 = WIN_VALUE * (FORM_WEIGHTS[0] + FORM_WEIGHTS[1] + FORM_WEIGHTS[2] + FORM_WEIGHTS[3] + FORM_WEIGHTS[4]);

const FORM_BLEND: f64 = 0.6;
const POSITION_BLEND: f64 = 0.4;

const YELLOW_PENALTY: f64 = 0.02;
const RED_PENALTY: f64 = 0.10;
const INJURY_PENALTY: f64 = 0.03;
const INJURY_FLOOR: f64 = 0.7;

pub const FORM_WINDOW: usize = 5;
pub const HOME_ADVANTAGE_DEFAULT: f64 = 0.25;
pub const HOME_ADVANTAGE_MAX: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormResult {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "D")]
    Draw,
    #[serde(rename = "L")]
    Loss,
}

impl FormResult {
    pub fn as_char(self) -> char {
        match self {
            FormResult::Win => 'W',
            FormResult::Draw => 'D',
            FormResult::Loss => 'L',
        }
    }

    fn value(self) -> f64 {
        match self {
            FormResult::Win => WIN_VALUE,
            FormResult::Draw => DRAW_VALUE,
            FormResult::Loss => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardRates {
    pub yellow_per_match: f64,
    pub red_per_match: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamIndicators {
    /// Up to the last five results, oldest first.
    #[serde(default)]
    pub form: Vec<FormResult>,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub cards: Option<CardRates>,
    #[serde(default)]
    pub key_starters_out: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchInput {
    pub home: TeamIndicators,
    pub away: TeamIndicators,
    pub home_advantage: f64,
}

impl Default for MatchInput {
    fn default() -> Self {
        Self {
            home: TeamIndicators::default(),
            away: TeamIndicators::default(),
            home_advantage: HOME_ADVANTAGE_DEFAULT,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ModelConfig {
    pub league_size: u32,
    pub draw_bias: f64,
    pub home_cap: f64,
    pub draw_cap: f64,
    pub away_cap: f64,
    pub prob_floor: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            league_size: 20,
            draw_bias: 0.65,
            home_cap: 0.95,
            draw_cap: 0.70,
            away_cap: 0.95,
            prob_floor: 1e-6,
        }
    }
}

impl ModelConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            league_size: env::var("MODEL_LEAGUE_SIZE")
                .ok()
                .and_then(|val| val.parse::<u32>().ok())
                .unwrap_or(d.league_size)
                .clamp(2, 40),
            draw_bias: env_f64("MODEL_DRAW_BIAS", d.draw_bias).clamp(0.0, 1.0),
            home_cap: env_f64("MODEL_HOME_CAP", d.home_cap).clamp(0.5, 1.0),
            draw_cap: env_f64("MODEL_DRAW_CAP", d.draw_cap).clamp(0.3, 1.0),
            away_cap: env_f64("MODEL_AWAY_CAP", d.away_cap).clamp(0.5, 1.0),
            prob_floor: d.prob_floor,
        }
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|val| val.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explain {
    pub home_strength: f64,
    pub away_strength: f64,
    pub inputs: MatchInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
    pub explain: Explain,
}

/// Estimate Home/Draw/Away probabilities with the default tunables.
pub fn predict(input: &MatchInput) -> Result<Prediction> {
    predict_with(input, &ModelConfig::default())
}

pub fn predict_with(input: &MatchInput, cfg: &ModelConfig) -> Result<Prediction> {
    validate_input(input)?;

    let home_strength = team_strength(&input.home, cfg);
    let away_strength = team_strength(&input.away, cfg);

    let home_score = home_strength + input.home_advantage;
    let away_score = away_strength;
    let draw_score = cfg.draw_bias * (home_strength + away_strength) / 2.0;

    let (home_win, draw, away_win) = distribute(home_score, draw_score, away_score, cfg);

    Ok(Prediction {
        home_win,
        draw,
        away_win,
        explain: Explain {
            home_strength,
            away_strength,
            inputs: input.clone(),
        },
    })
}

fn validate_input(input: &MatchInput) -> Result<()> {
    if !input.home_advantage.is_finite()
        || input.home_advantage < 0.0
        || input.home_advantage > HOME_ADVANTAGE_MAX
    {
        bail!(
            "home_advantage {} outside [0, {HOME_ADVANTAGE_MAX}]",
            input.home_advantage
        );
    }
    for (label, team) in [("home", &input.home), ("away", &input.away)] {
        if team.form.len() > FORM_WINDOW {
            bail!(
                "{label} form has {} results, expected at most {FORM_WINDOW}",
                team.form.len()
            );
        }
        if let Some(cards) = team.cards {
            if !cards.yellow_per_match.is_finite()
                || !cards.red_per_match.is_finite()
                || cards.yellow_per_match < 0.0
                || cards.red_per_match < 0.0
            {
                bail!(
                    "{label} card rates ({}, {}) must be finite and non-negative",
                    cards.yellow_per_match,
                    cards.red_per_match
                );
            }
        }
    }
    Ok(())
}

/// Recency-weighted form score in [0, 1]; neutral 0.5 with no history.
pub fn form_score(form: &[FormResult]) -> f64 {
    if form.is_empty() {
        return 0.5;
    }
    let mut sum = 0.0;
    for (result, weight) in form.iter().rev().zip(FORM_WEIGHTS.iter()) {
        sum += result.value() * weight;
    }
    sum / FORM_DENOM
}

/// League rank mapped linearly onto [0, 1]; 1st place is 1.0.
pub fn position_anchor(position: Option<u32>, league_size: u32) -> f64 {
    let Some(rank) = position.filter(|r| *r > 0) else {
        return 0.5;
    };
    let rank = rank.min(league_size) as f64;
    1.0 - (rank - 1.0) / (league_size as f64 - 1.0)
}

pub fn discipline_multiplier(cards: CardRates) -> f64 {
    let penalty = YELLOW_PENALTY * cards.yellow_per_match + RED_PENALTY * cards.red_per_match;
    (1.0 - penalty).max(0.0)
}

pub fn injury_multiplier(key_starters_out: u32) -> f64 {
    (1.0 - INJURY_PENALTY * key_starters_out as f64).max(INJURY_FLOOR)
}

fn team_strength(team: &TeamIndicators, cfg: &ModelConfig) -> f64 {
    let mut strength = FORM_BLEND * form_score(&team.form)
        + POSITION_BLEND * position_anchor(team.position, cfg.league_size);
    if let Some(cards) = team.cards {
        strength *= discipline_multiplier(cards);
    }
    strength *= injury_multiplier(team.key_starters_out);
    strength
}

fn distribute(home_score: f64, draw_score: f64, away_score: f64, cfg: &ModelConfig) -> (f64, f64, f64) {
    // Max-subtracted softmax; the shift cancels out but keeps exp() bounded.
    let max = home_score.max(draw_score).max(away_score);
    let eh = (home_score - max).exp();
    let ed = (draw_score - max).exp();
    let ea = (away_score - max).exp();
    let sum = eh + ed + ea;

    let home = (eh / sum).clamp(cfg.prob_floor, cfg.home_cap);
    let draw = (ed / sum).clamp(cfg.prob_floor, cfg.draw_cap);
    let away = (ea / sum).clamp(cfg.prob_floor, cfg.away_cap);

    let total = home + draw + away;
    (home / total, draw / total, away / total)
}
