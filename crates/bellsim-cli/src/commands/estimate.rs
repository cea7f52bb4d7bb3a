use bellsim_core::{CorrelationEstimate, Experiment, ExperimentConfig, RngKind, nominal_correlation};
use rand::Rng;

pub fn run(phi1_deg: f64, phi2_deg: f64, args: &super::RunArgs, json: bool) {
    let (config, rng) = args.resolve();
    let (phi1, phi2) = (phi1_deg.to_radians(), phi2_deg.to_radians());
    let est = match rng {
        RngKind::Std => sample(Experiment::new(config), phi1, phi2),
        RngKind::Lcg => sample(Experiment::with_lcg(config), phi1, phi2),
    };

    if json {
        match serde_json::to_string_pretty(&est) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Failed to serialize estimate: {e}");
                std::process::exit(1);
            }
        }
        return;
    }
    print_estimate(&est, &config, rng, phi1_deg, phi2_deg);
}

fn sample<R: Rng>(mut experiment: Experiment<R>, phi1: f64, phi2: f64) -> CorrelationEstimate {
    super::or_exit(experiment.estimate_detailed(phi1, phi2))
}

fn print_estimate(
    est: &CorrelationEstimate,
    config: &ExperimentConfig,
    rng: RngKind,
    phi1_deg: f64,
    phi2_deg: f64,
) {
    println!(
        "φ1 = {phi1_deg:.2}°  φ2 = {phi2_deg:.2}°  policy = {}  n = {}  seed = {}  rng = {rng}",
        est.policy, est.trials, config.seed
    );
    println!();
    println!("  {:<8} {:>10} {:>6}", "term", "squared", "sign");
    println!("  {}", "─".repeat(26));
    for (label, square, sign) in [
        ("c1·c2", est.squares.cos_cos, est.signs.cc),
        ("c1·s2", est.squares.cos_sin, est.signs.cs),
        ("s1·c2", est.squares.sin_cos, est.signs.sc),
        ("s1·s2", est.squares.sin_sin, est.signs.ss),
    ] {
        println!("  {label:<8} {square:>10.5} {sign:>+6.0}");
    }
    println!();
    println!("  cos(φ1−φ2)   {:+.5}", est.cos_diff);
    println!("  sin(φ1−φ2)   {:+.5}", est.sin_diff);
    println!("  estimate     {:+.5}", est.value);
    println!(
        "  nominal      {:+.5}",
        nominal_correlation(est.phi1, est.phi2)
    );
}
