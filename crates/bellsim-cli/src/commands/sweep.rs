use std::path::Path;
use std::time::Instant;

use bellsim_core::{Experiment, RngKind, SweepReport};
use rand::Rng;

pub fn run(delta_deg: f64, args: &super::RunArgs, output_path: Option<&str>) {
    let (config, rng) = args.resolve();
    let delta = delta_deg.to_radians();

    println!(
        "Sweeping Δφ = {delta_deg:.2}° ({} trials per point, policy {}, rng {rng})...\n",
        config.run_length, config.policy
    );
    let t0 = Instant::now();
    let report = match rng {
        RngKind::Std => sweep(Experiment::new(config), delta),
        RngKind::Lcg => sweep(Experiment::with_lcg(config), delta),
    };
    let elapsed = t0.elapsed().as_secs_f64();

    println!(
        "  {:>8} {:>8} {:>10} {:>10} {:>9}",
        "φ1°", "φ2°", "estimate", "nominal", "error"
    );
    println!("  {}", "─".repeat(49));
    for p in &report.points {
        println!(
            "  {:>8.2} {:>8.2} {:>+10.5} {:>+10.5} {:>+9.5}",
            p.phi1.to_degrees(),
            p.phi2.to_degrees(),
            p.estimate,
            p.nominal,
            p.error()
        );
    }
    println!();
    println!(
        "  mean {:+.5}  max |error| {:.5}  [{elapsed:.2}s]",
        report.mean_estimate(),
        report.max_abs_error()
    );

    if let Some(path) = output_path {
        if let Err(e) = report.write_json(Path::new(path)) {
            eprintln!("Failed to write {path}: {e}");
            std::process::exit(1);
        }
        println!("\nReport written to {path}");
    }
}

fn sweep<R: Rng>(mut experiment: Experiment<R>, delta: f64) -> SweepReport {
    super::or_exit(experiment.sweep(delta))
}
