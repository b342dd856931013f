#![cfg(any(feature = "highs", feature = "cbc", feature = "microlp"))]
//! Stress tests for long horizons and concurrent solves
//!
//! - One week and one full year of hourly data in a single solve
//! - Many simultaneous API solves sharing one router
//! - A wide sizing sweep on the rayon pool

use std::time::Instant;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::json;
use tokio::task::JoinSet;
use tower::ServiceExt;

use pv_bess_dispatch::api::{router, ApiState};
use pv_bess_dispatch::config::Config;
use pv_bess_dispatch::sizing::sweep;
use pv_bess_dispatch::{solve, BatterySpec, SolveOptions};

/// Synthetic PV bell curve and a duck-shaped price curve, repeated daily
fn synthetic_year(hours: usize) -> (Vec<f64>, Vec<f64>) {
    let generation = (0..hours)
        .map(|t| {
            let h = (t % 24) as f64;
            if (6.0..=18.0).contains(&h) {
                10.0 * (std::f64::consts::PI * (h - 6.0) / 12.0).sin()
            } else {
                0.0
            }
        })
        .collect();
    let price = (0..hours)
        .map(|t| {
            let h = t % 24;
            let day = (t / 24) as f64;
            let seasonal = 10.0 * (2.0 * std::f64::consts::PI * day / 365.0).cos();
            let base = match h {
                10..=14 => 15.0,
                17..=21 => 140.0,
                _ => 70.0,
            };
            base + seasonal
        })
        .collect();
    (generation, price)
}

#[test]
#[ignore] // slow: 336 binaries
fn test_one_week_horizon() {
    let (generation, price) = synthetic_year(24 * 7);
    let battery = BatterySpec::new(4.0, 16.0).unwrap();

    let start = Instant::now();
    let result = solve(&generation, &price, &battery).unwrap();
    println!(
        "week: objective {:.0} EUR, {} cycles, solved in {:?}",
        result.objective_value,
        result.metrics.operation.annual_cycles,
        start.elapsed()
    );
    assert_eq!(result.schedule.len(), 168);
    assert!(result.metrics.operation.annual_cycles > 1.0);
}

#[test]
#[ignore] // very slow without HiGHS: 17 520 binaries
fn test_full_year_horizon() {
    let (generation, price) = synthetic_year(8760);
    let battery = BatterySpec::new(4.0, 16.0).unwrap();

    let start = Instant::now();
    let result = solve(&generation, &price, &battery).unwrap();
    println!(
        "year: objective {:.0} EUR via {} ({}) in {:?}",
        result.objective_value,
        result.solver,
        result.status,
        start.elapsed()
    );
    assert_eq!(result.schedule.soc_mwh.len(), 8761);
}

/// Simultaneous API solves share no state and all complete
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Ignore by default as this is a slow test
async fn test_concurrent_api_solves() {
    let app = router(ApiState::new(Config::default()));
    let (generation, price) = synthetic_year(24);
    let mut tasks = JoinSet::new();

    for i in 0..16 {
        let app = app.clone();
        let body = json!({
            "generation_mw": generation,
            "price_eur_per_mwh": price,
            "battery": { "power_limit_mw": 1.0 + i as f64 * 0.5, "capacity_mwh": 4.0 }
        });
        tasks.spawn(async move {
            let request = Request::builder()
                .method("POST")
                .uri("/api/v1/optimize")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            let response = app.oneshot(request).await.unwrap();
            let status = response.status();
            let _ = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            status
        });
    }

    while let Some(status) = tasks.join_next().await {
        assert_eq!(status.expect("task should complete without panic"), StatusCode::OK);
    }
}

#[test]
#[ignore] // Ignore by default as this is a slow test
fn test_wide_sizing_sweep() {
    let (generation, price) = synthetic_year(48);
    let batteries: Vec<BatterySpec> = (1..=8)
        .flat_map(|p| (1..=4).map(move |h| (p as f64, (p * h) as f64)))
        .map(|(power, capacity)| BatterySpec::new(power, capacity).unwrap())
        .collect();

    let start = Instant::now();
    let outcomes = sweep(&generation, &price, &batteries, &SolveOptions::default());
    println!("{} configurations in {:?}", outcomes.len(), start.elapsed());

    assert_eq!(outcomes.len(), 32);
    assert!(outcomes.iter().all(|o| o.summary().is_some()));
}
