use bellsim_core::{AngleSchedule, Experiment, LowpassSmoother, RngKind, Tracker};
use rand::Rng;

pub struct TrackCommandConfig<'a> {
    pub delta_deg: f64,
    pub ticks: u64,
    pub tick_rate: f64,
    pub cutoff: f64,
    pub speed: f64,
    pub run: &'a super::RunArgs,
}

pub fn run(cfg: TrackCommandConfig<'_>) {
    let (config, rng) = cfg.run.resolve();
    if !(cfg.tick_rate.is_finite() && cfg.tick_rate > 0.0) {
        eprintln!("Error: tick rate must be positive, got {}", cfg.tick_rate);
        std::process::exit(1);
    }
    let smoother = super::or_exit(LowpassSmoother::new(cfg.cutoff, 1.0 / cfg.tick_rate));
    let schedule = super::or_exit(AngleSchedule::new(cfg.speed, cfg.delta_deg.to_radians()));

    println!(
        "Tracking Δφ = {:.2}° at {} ticks/s, cutoff {} Hz (α = {:.4}), policy {}",
        cfg.delta_deg,
        cfg.tick_rate,
        cfg.cutoff,
        smoother.alpha(),
        config.policy
    );
    println!(
        "  nominal correlation {:+.5}\n",
        (2.0 * cfg.delta_deg.to_radians()).cos()
    );
    println!(
        "  {:>6} {:>8} {:>8} {:>8} {:>10} {:>10}",
        "tick", "t (s)", "φ1°", "φ2°", "raw", "smoothed"
    );
    println!("  {}", "─".repeat(55));

    match rng {
        RngKind::Std => drive(
            Tracker::new(Experiment::new(config), schedule, smoother),
            cfg.ticks,
        ),
        RngKind::Lcg => drive(
            Tracker::new(Experiment::with_lcg(config), schedule, smoother),
            cfg.ticks,
        ),
    }
}

fn drive<R: Rng>(mut tracker: Tracker<R>, ticks: u64) {
    for _ in 0..ticks {
        let r = super::or_exit(tracker.tick_nominal());
        println!(
            "  {:>6} {:>8.3} {:>8.2} {:>8.2} {:>+10.5} {:>+10.5}",
            r.tick,
            r.time,
            r.phi1.to_degrees(),
            r.phi2.to_degrees(),
            r.raw,
            r.smoothed
        );
    }
}
