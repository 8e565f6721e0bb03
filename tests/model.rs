use footy_terminal::model::{
    CardRates, FormResult, MatchInput, Prediction, TeamIndicators, predict,
};

use FormResult::{Draw, Loss, Win};

fn team(form: &[FormResult], position: Option<u32>) -> TeamIndicators {
    TeamIndicators {
        form: form.to_vec(),
        position,
        cards: None,
        key_starters_out: 0,
    }
}

fn assert_normalized(p: &Prediction) {
    assert!(
        (p.home_win + p.draw + p.away_win - 1.0).abs() < 1e-9,
        "probabilities should sum to 1, got {}",
        p.home_win + p.draw + p.away_win
    );
    for v in [p.home_win, p.draw, p.away_win] {
        assert!(v > 0.0 && v < 1.0, "probability {v} outside (0, 1)");
    }
}

#[test]
fn identical_inputs_give_identical_output() {
    let input = MatchInput {
        home: TeamIndicators {
            form: vec![Win, Draw, Win, Loss, Win],
            position: Some(4),
            cards: Some(CardRates {
                yellow_per_match: 1.7,
                red_per_match: 0.08,
            }),
            key_starters_out: 2,
        },
        away: team(&[Loss, Loss, Draw, Win, Draw], Some(11)),
        home_advantage: 0.3,
    };
    let a = predict(&input).unwrap();
    let b = predict(&input).unwrap();
    assert_eq!(a.home_win, b.home_win);
    assert_eq!(a.draw, b.draw);
    assert_eq!(a.away_win, b.away_win);
    assert_eq!(a.explain.home_strength, b.explain.home_strength);
}

#[test]
fn outputs_normalize_across_a_spread_of_inputs() {
    let forms: [&[FormResult]; 4] = [&[], &[Win; 5], &[Loss; 5], &[Win, Loss, Draw, Win, Loss]];
    for home_form in forms {
        for away_form in forms {
            for position in [None, Some(1), Some(20)] {
                let input = MatchInput {
                    home: team(home_form, position),
                    away: team(away_form, Some(10)),
                    home_advantage: 0.25,
                };
                let p = predict(&input).unwrap();
                assert_normalized(&p);
                assert!(p.draw < 0.75, "renormalized draw too large: {}", p.draw);
            }
        }
    }
}

#[test]
fn upgrading_a_loss_to_a_win_never_hurts_home() {
    let base_form = [Loss, Loss, Loss, Loss, Loss];
    let away = team(&[Draw; 5], Some(10));

    let baseline = predict(&MatchInput {
        home: team(&base_form, Some(10)),
        away: away.clone(),
        home_advantage: 0.25,
    })
    .unwrap();

    for slot in 0..5 {
        let mut form = base_form;
        form[slot] = Win;
        let improved = predict(&MatchInput {
            home: team(&form, Some(10)),
            away: away.clone(),
            home_advantage: 0.25,
        })
        .unwrap();
        assert!(
            improved.home_win >= baseline.home_win,
            "win at slot {slot} lowered home_win: {} -> {}",
            baseline.home_win,
            improved.home_win
        );
    }
}

#[test]
fn neutral_baseline_skews_home() {
    let input = MatchInput {
        home: team(&[Draw; 5], None),
        away: team(&[Draw; 5], None),
        home_advantage: 0.25,
    };
    let p = predict(&input).unwrap();
    assert_normalized(&p);
    assert!(p.home_win > p.away_win);
    assert!(p.draw > 0.2 && p.draw < 0.4, "draw {} off baseline", p.draw);
}

#[test]
fn injury_penalty_floors_out() {
    let predict_with_injuries = |count: u32| {
        predict(&MatchInput {
            home: TeamIndicators {
                form: vec![Win; 5],
                position: Some(1),
                cards: None,
                key_starters_out: count,
            },
            away: team(&[Draw; 5], Some(10)),
            home_advantage: 0.25,
        })
        .unwrap()
    };

    let at_floor = predict_with_injuries(10);
    let beyond_floor = predict_with_injuries(25);
    assert_eq!(
        at_floor.explain.home_strength,
        beyond_floor.explain.home_strength
    );
    assert_eq!(at_floor.home_win, beyond_floor.home_win);

    let healthy = predict_with_injuries(0);
    assert!(healthy.explain.home_strength > at_floor.explain.home_strength);
}

#[test]
fn out_of_range_position_clamps_to_bottom() {
    let run = |position: u32| {
        predict(&MatchInput {
            home: team(&[Draw; 5], Some(position)),
            away: team(&[Draw; 5], Some(10)),
            home_advantage: 0.25,
        })
        .unwrap()
    };
    let bottom = run(20);
    let below = run(25);
    assert_eq!(bottom.explain.home_strength, below.explain.home_strength);
    assert_eq!(bottom.home_win, below.home_win);

    let top = run(1);
    assert!(top.explain.home_strength > bottom.explain.home_strength);
}

#[test]
fn strong_home_side_is_clearly_favored() {
    let input = MatchInput {
        home: team(&[Win, Win, Win, Draw, Loss], Some(3)),
        away: team(&[Loss, Loss, Draw, Draw, Win], Some(15)),
        home_advantage: 0.25,
    };
    let p = predict(&input).unwrap();
    assert_normalized(&p);
    assert!(
        p.home_win > p.away_win + 0.1,
        "expected a clear home edge, got H {} A {}",
        p.home_win,
        p.away_win
    );
    assert!(p.draw >= 0.2 && p.draw <= 0.35, "draw {} out of band", p.draw);
}

#[test]
fn mirror_match_differs_only_by_home_advantage() {
    let side = TeamIndicators {
        form: vec![Win, Draw, Loss, Win, Draw],
        position: Some(8),
        cards: None,
        key_starters_out: 0,
    };

    let with_advantage = predict(&MatchInput {
        home: side.clone(),
        away: side.clone(),
        home_advantage: 0.25,
    })
    .unwrap();
    assert_eq!(
        with_advantage.explain.home_strength,
        with_advantage.explain.away_strength
    );
    assert!(with_advantage.home_win > with_advantage.away_win);

    let level = predict(&MatchInput {
        home: side.clone(),
        away: side,
        home_advantage: 0.0,
    })
    .unwrap();
    assert!((level.home_win - level.away_win).abs() < 1e-9);
}

#[test]
fn no_data_at_all_is_symmetric() {
    let input = MatchInput {
        home: TeamIndicators::default(),
        away: TeamIndicators::default(),
        home_advantage: 0.0,
    };
    let p = predict(&input).unwrap();
    assert_normalized(&p);
    assert!((p.home_win - p.away_win).abs() < 1e-9);
    assert!(p.draw > 0.0 && p.draw <= 0.70);
}
