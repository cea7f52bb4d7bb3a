use std::time::Instant;

use bellsim_core::{Experiment, FrequencyTable, RngKind};
use rand::Rng;

pub fn run(phi1_deg: f64, phi2_deg: f64, args: &super::RunArgs, output_path: Option<&str>) {
    let (config, rng) = args.resolve();
    let (phi1, phi2) = (phi1_deg.to_radians(), phi2_deg.to_radians());

    println!(
        "🔬 Running test battery at φ1 = {phi1_deg:.2}°, φ2 = {phi2_deg:.2}° ({} trials, policy {}, rng {rng})...\n",
        config.run_length, config.policy
    );

    let t0 = Instant::now();
    let table = match rng {
        RngKind::Std => sample(Experiment::new(config), phi1, phi2),
        RngKind::Lcg => sample(Experiment::with_lcg(config), phi1, phi2),
    };
    let results = bellsim_tests::run_all_tests(&table, phi1, phi2);
    let elapsed = t0.elapsed().as_secs_f64();
    let score = bellsim_tests::calculate_quality_score(&results);
    let passed = results.iter().filter(|r| r.passed).count();

    println!(
        "  {:<30} {:>5} {:>10} {:>12}  details",
        "test", "grade", "p-value", "statistic"
    );
    println!("  {}", "─".repeat(72));
    for r in &results {
        let p = r
            .p_value
            .map(|p| format!("{p:.4}"))
            .unwrap_or_else(|| "-".to_string());
        let mark = if r.passed { "✓" } else { "✗" };
        println!(
            "  {mark} {:<28} {:>5} {p:>10} {:>12.4}  {}",
            r.name, r.grade, r.statistic, r.details
        );
    }
    println!(
        "\n  Score: {score:.0}/100 ({passed}/{} passed) [{elapsed:.2}s]",
        results.len()
    );

    if let Some(path) = output_path {
        let json = serde_json::json!({
            "phi1": phi1,
            "phi2": phi2,
            "config": config,
            "counts": table.counts(),
            "score": score,
            "results": results,
        });
        super::write_json(path, &json);
    }
}

fn sample<R: Rng>(mut experiment: Experiment<R>, phi1: f64, phi2: f64) -> FrequencyTable {
    super::or_exit(experiment.table(phi1, phi2))
}
