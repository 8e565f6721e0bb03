use anyhow::{Context, Result};
use serde::Serialize;

use footy_terminal::model::{self, ModelConfig};
use footy_terminal::provider::{self, MatchContext, build_match_input};

#[derive(Serialize)]
struct Report {
    provider: &'static str,
    match_id: String,
    context: MatchContext,
    prediction: model::Prediction,
}

// One-shot prediction without the dashboard: fetch, run the model, print the
// output contract as JSON. Useful for scripting and for eyeballing provider
// responses.
fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let match_id = std::env::args().nth(1).unwrap_or_else(|| "demo".to_string());

    let kind = provider::configured_kind()?;
    let stats = provider::make_provider(kind);

    let context = stats
        .match_context(&match_id)
        .with_context(|| format!("fetching match {match_id}"))?;

    let home_advantage = std::env::var("HOME_ADVANTAGE")
        .ok()
        .and_then(|val| val.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(model::HOME_ADVANTAGE_DEFAULT)
        .clamp(0.0, model::HOME_ADVANTAGE_MAX);

    let (input, warnings) = build_match_input(stats.as_ref(), &context, home_advantage);
    for warning in &warnings {
        eprintln!("warning: {warning}");
    }

    let prediction = model::predict_with(&input, &ModelConfig::from_env())?;

    let report = Report {
        provider: stats.name(),
        match_id,
        context,
        prediction,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
