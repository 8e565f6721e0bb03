use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use footy_terminal::football_data::parse_recent_form_json;
use footy_terminal::model::{CardRates, FormResult, MatchInput, TeamIndicators, predict};

const TEAM_MATCHES_JSON: &str = include_str!("../tests/fixtures/football_data_team_matches.json");

fn sample_input() -> MatchInput {
    use FormResult::{Draw, Loss, Win};
    MatchInput {
        home: TeamIndicators {
            form: vec![Win, Win, Draw, Loss, Win],
            position: Some(3),
            cards: Some(CardRates {
                yellow_per_match: 1.6,
                red_per_match: 0.08,
            }),
            key_starters_out: 2,
        },
        away: TeamIndicators {
            form: vec![Loss, Draw, Draw, Win, Loss],
            position: Some(14),
            cards: None,
            key_starters_out: 0,
        },
        home_advantage: 0.25,
    }
}

fn bench_predict(c: &mut Criterion) {
    let input = sample_input();
    c.bench_function("predict", |b| {
        b.iter(|| {
            let p = predict(black_box(&input)).unwrap();
            black_box(p.home_win);
        })
    });
}

fn bench_form_parse(c: &mut Criterion) {
    c.bench_function("football_data_form_parse", |b| {
        b.iter(|| {
            let form = parse_recent_form_json(black_box(TEAM_MATCHES_JSON), "64").unwrap();
            black_box(form.len());
        })
    });
}

criterion_group!(benches, bench_predict, bench_form_parse);
criterion_main!(benches);
