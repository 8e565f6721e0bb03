use std::env;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, SystemTime};

use crate::model::{self, ModelConfig};
use crate::provider::{self, ProviderKind, StatsProvider, build_match_input};
use crate::state::{Delta, PredictionCard, ProviderCommand};

pub fn spawn_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || run_feed(tx, cmd_rx));
}

fn run_feed(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    let cfg = ModelConfig::from_env();

    let mut kind = match provider::configured_kind() {
        Ok(kind) => kind,
        Err(err) => {
            let _ = tx.send(Delta::Log(format!("[WARN] {err:#}; falling back to demo")));
            ProviderKind::Demo
        }
    };
    let mut stats = provider::make_provider(kind);
    let _ = tx.send(Delta::SetProviderLabel(kind.label().to_string()));
    let _ = tx.send(Delta::Log(format!(
        "[INFO] Provider ready: {}",
        kind.label()
    )));

    let refresh_interval = Duration::from_secs(
        env::var("PREDICT_REFRESH_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(300)
            .max(30),
    );

    // Matches predicted so far, re-run on the refresh tick.
    let mut known: Vec<String> = Vec::new();
    let mut home_advantage = model::HOME_ADVANTAGE_DEFAULT;

    loop {
        match cmd_rx.recv_timeout(refresh_interval) {
            Ok(ProviderCommand::Predict {
                match_id,
                home_advantage: ha,
            }) => {
                home_advantage = ha;
                if run_prediction(stats.as_ref(), &cfg, &match_id, ha, &tx)
                    && !known.contains(&match_id)
                {
                    known.push(match_id);
                }
            }
            Ok(ProviderCommand::RefreshAll { home_advantage: ha }) => {
                home_advantage = ha;
                refresh_known(stats.as_ref(), &cfg, &known, ha, &tx);
            }
            Ok(ProviderCommand::CycleProvider) => {
                let kinds = provider::available_kinds();
                let at = kinds.iter().position(|k| *k == kind).unwrap_or(0);
                kind = kinds[(at + 1) % kinds.len()];
                stats = provider::make_provider(kind);
                let _ = tx.send(Delta::SetProviderLabel(kind.label().to_string()));
                let _ = tx.send(Delta::Log(format!(
                    "[INFO] Switched provider to {}",
                    kind.label()
                )));
            }
            Err(RecvTimeoutError::Timeout) => {
                refresh_known(stats.as_ref(), &cfg, &known, home_advantage, &tx);
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

fn refresh_known(
    stats: &dyn StatsProvider,
    cfg: &ModelConfig,
    known: &[String],
    home_advantage: f64,
    tx: &Sender<Delta>,
) {
    for match_id in known {
        run_prediction(stats, cfg, match_id, home_advantage, tx);
    }
}

fn run_prediction(
    stats: &dyn StatsProvider,
    cfg: &ModelConfig,
    match_id: &str,
    home_advantage: f64,
    tx: &Sender<Delta>,
) -> bool {
    let _ = tx.send(Delta::Loading(true));
    let ok = predict_match(stats, cfg, match_id, home_advantage, tx);
    let _ = tx.send(Delta::Loading(false));
    ok
}

fn predict_match(
    stats: &dyn StatsProvider,
    cfg: &ModelConfig,
    match_id: &str,
    home_advantage: f64,
    tx: &Sender<Delta>,
) -> bool {
    let context = match stats.match_context(match_id) {
        Ok(context) => context,
        Err(err) => {
            let _ = tx.send(Delta::Log(format!(
                "[WARN] Match {match_id}: context fetch failed ({err:#})"
            )));
            return false;
        }
    };

    let (input, warnings) = build_match_input(stats, &context, home_advantage);
    for warning in warnings {
        let _ = tx.send(Delta::Log(format!("[WARN] {warning}")));
    }

    let prediction = match model::predict_with(&input, cfg) {
        Ok(prediction) => prediction,
        Err(err) => {
            let _ = tx.send(Delta::Log(format!("[WARN] Match {match_id}: {err:#}")));
            return false;
        }
    };

    let _ = tx.send(Delta::Log(format!(
        "[INFO] {} vs {}: H {:.1}% D {:.1}% A {:.1}%",
        context.home_team_name,
        context.away_team_name,
        prediction.home_win * 100.0,
        prediction.draw * 100.0,
        prediction.away_win * 100.0
    )));
    let _ = tx.send(Delta::SetPrediction(PredictionCard {
        match_id: match_id.to_string(),
        provider: stats.name().to_string(),
        context,
        input,
        prediction,
        fetched_at: SystemTime::now(),
    }));
    true
}
