use std::collections::VecDeque;
use std::env;
use std::time::SystemTime;

use crate::model::{self, MatchInput, Prediction};
use crate::provider::MatchContext;

#[derive(Debug, Clone)]
pub struct PredictionCard {
    pub match_id: String,
    pub provider: String,
    pub context: MatchContext,
    pub input: MatchInput,
    pub prediction: Prediction,
    pub fetched_at: SystemTime,
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetPrediction(PredictionCard),
    SetProviderLabel(String),
    Loading(bool),
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    Predict { match_id: String, home_advantage: f64 },
    RefreshAll { home_advantage: f64 },
    CycleProvider,
}

pub struct AppState {
    pub cards: Vec<PredictionCard>,
    pub selected: usize,
    pub input_buffer: String,
    pub input_active: bool,
    pub home_advantage: f64,
    pub provider_label: String,
    pub loading: bool,
    pub show_explain: bool,
    pub help_overlay: bool,
    pub logs: VecDeque<String>,
}

impl AppState {
    pub fn new() -> Self {
        let home_advantage = env::var("HOME_ADVANTAGE")
            .ok()
            .and_then(|val| val.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(model::HOME_ADVANTAGE_DEFAULT)
            .clamp(0.0, model::HOME_ADVANTAGE_MAX);
        Self {
            cards: Vec::new(),
            selected: 0,
            input_buffer: "demo".to_string(),
            input_active: true,
            home_advantage,
            provider_label: String::new(),
            loading: false,
            show_explain: false,
            help_overlay: false,
            logs: VecDeque::new(),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn selected_card(&self) -> Option<&PredictionCard> {
        self.cards.get(self.selected)
    }

    pub fn selected_card_mut(&mut self) -> Option<&mut PredictionCard> {
        self.cards.get_mut(self.selected)
    }

    pub fn select_next(&mut self) {
        if !self.cards.is_empty() {
            self.selected = (self.selected + 1).min(self.cards.len() - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetPrediction(card) => {
            if let Some(existing) = state
                .cards
                .iter_mut()
                .find(|c| c.match_id == card.match_id && c.provider == card.provider)
            {
                *existing = card;
            } else {
                state.cards.insert(0, card);
                state.selected = 0;
            }
        }
        Delta::SetProviderLabel(label) => state.provider_label = label,
        Delta::Loading(loading) => state.loading = loading,
        Delta::Log(msg) => state.push_log(msg),
    }
}
