use std::sync::Mutex;

use anyhow::{Result, bail};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::{CardRates, FormResult};
use crate::provider::{MatchContext, StatsProvider};

use FormResult::{Draw, Loss, Win};

/// Offline provider with canned fixtures, so the dashboard works without any
/// API key. With drift enabled the soft indicators wobble a little between
/// refreshes to make the feed feel alive.
pub struct DemoProvider {
    drift: Option<Mutex<StdRng>>,
}

impl DemoProvider {
    pub fn new() -> Self {
        Self {
            drift: Some(Mutex::new(StdRng::from_entropy())),
        }
    }

    /// Deterministic variant for tests and the one-shot binary.
    pub fn fixed() -> Self {
        Self { drift: None }
    }

    fn jitter_cards(&self, cards: CardRates) -> CardRates {
        let Some(rng) = self.drift.as_ref() else {
            return cards;
        };
        let mut rng = rng.lock().expect("demo rng lock poisoned");
        CardRates {
            yellow_per_match: (cards.yellow_per_match + rng.gen_range(-0.2..=0.2)).max(0.0),
            red_per_match: (cards.red_per_match + rng.gen_range(-0.05..=0.05)).max(0.0),
        }
    }

    fn jitter_injuries(&self, count: u32) -> u32 {
        let Some(rng) = self.drift.as_ref() else {
            return count;
        };
        let mut rng = rng.lock().expect("demo rng lock poisoned");
        match rng.gen_range(0..4) {
            0 => count.saturating_sub(1),
            1 => count + 1,
            _ => count,
        }
    }
}

struct DemoTeam {
    id: &'static str,
    name: &'static str,
    form: [FormResult; 5],
    position: u32,
    cards: Option<CardRates>,
    key_starters_out: u32,
}

static DEMO_TEAMS: [DemoTeam; 4] = [
    DemoTeam {
        id: "alpha",
        name: "Alpha FC",
        form: [Win, Win, Win, Draw, Loss],
        position: 3,
        cards: Some(CardRates {
            yellow_per_match: 1.4,
            red_per_match: 0.05,
        }),
        key_starters_out: 1,
    },
    DemoTeam {
        id: "omega",
        name: "Omega United",
        form: [Loss, Loss, Draw, Draw, Win],
        position: 15,
        cards: Some(CardRates {
            yellow_per_match: 2.3,
            red_per_match: 0.15,
        }),
        key_starters_out: 3,
    },
    DemoTeam {
        id: "harbour",
        name: "Harbour City",
        form: [Draw, Win, Draw, Win, Draw],
        position: 6,
        cards: None,
        key_starters_out: 0,
    },
    DemoTeam {
        id: "rovers",
        name: "Harbour Rovers",
        form: [Win, Draw, Draw, Win, Draw],
        position: 7,
        cards: None,
        key_starters_out: 0,
    },
];

struct DemoMatch {
    id: &'static str,
    home: &'static str,
    away: &'static str,
    kickoff: &'static str,
}

static DEMO_MATCHES: [DemoMatch; 2] = [
    DemoMatch {
        id: "demo",
        home: "alpha",
        away: "omega",
        kickoff: "2026-08-08T19:45:00Z",
    },
    DemoMatch {
        id: "derby",
        home: "harbour",
        away: "rovers",
        kickoff: "2026-08-09T15:00:00Z",
    },
];

fn demo_team(team_id: &str) -> Result<&'static DemoTeam> {
    let Some(team) = DEMO_TEAMS.iter().find(|t| t.id == team_id) else {
        bail!("unknown demo team: {team_id}");
    };
    Ok(team)
}

impl StatsProvider for DemoProvider {
    fn name(&self) -> &'static str {
        "demo"
    }

    fn match_context(&self, match_id: &str) -> Result<MatchContext> {
        let Some(m) = DEMO_MATCHES.iter().find(|m| m.id == match_id) else {
            bail!("unknown demo match: {match_id} (try \"demo\" or \"derby\")");
        };
        let home = demo_team(m.home)?;
        let away = demo_team(m.away)?;
        Ok(MatchContext {
            competition: "Demoland Premier".to_string(),
            season: "2026".to_string(),
            utc_kickoff: m.kickoff.to_string(),
            home_team_id: home.id.to_string(),
            home_team_name: home.name.to_string(),
            away_team_id: away.id.to_string(),
            away_team_name: away.name.to_string(),
            venue: None,
        })
    }

    fn recent_form(&self, team_id: &str) -> Result<Vec<FormResult>> {
        Ok(demo_team(team_id)?.form.to_vec())
    }

    fn standing_position(&self, _competition: &str, team_id: &str) -> Result<Option<u32>> {
        Ok(Some(demo_team(team_id)?.position))
    }

    fn card_rates(&self, team_id: &str) -> Result<Option<CardRates>> {
        Ok(demo_team(team_id)?.cards.map(|cards| self.jitter_cards(cards)))
    }

    fn key_starters_out(&self, team_id: &str) -> Result<Option<u32>> {
        let base = demo_team(team_id)?.key_starters_out;
        Ok(Some(self.jitter_injuries(base)))
    }
}
