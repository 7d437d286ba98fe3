//! Drives `flexbar` through a few synthetic workloads.
//!
//! ```text
//! RUST_LOG=flexbar=debug flexbar-demo smooth
//! ```

use std::{thread, time::Duration};

use clap::{Parser, ValueEnum};
use flexbar::{Bar, BarConfig, ProgressBuilder};
use rand::Rng;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// `fast`, then `smooth`.
    All,
    /// Big steps with a handful of log lines in the middle.
    Fast,
    /// Single steps, relabeled halfway.
    Smooth,
    /// Few steps with long random pauses.
    Chunky,
    /// No target, random steps until the time is up.
    Infinite,
}

#[derive(Debug, Parser)]
#[command(name = "flexbar-demo", version, about = "Self-fitting progress bar demo")]
struct Args {
    /// Workload to run.
    #[arg(value_enum, default_value_t = Scenario::All)]
    scenario: Scenario,

    /// Disable ANSI colors (also honored through NO_COLOR).
    #[arg(long)]
    no_color: bool,

    /// Redraw interval in milliseconds.
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,

    /// How long the infinite scenario runs, in seconds.
    #[arg(long, default_value_t = 10)]
    seconds: u64,
}

impl Args {
    fn start(&self, label: &str, target: u64) -> Bar {
        let mut config = BarConfig::default().with_tick_interval(Duration::from_millis(self.tick_ms));
        if self.no_color {
            config = config.with_color(false);
        }
        ProgressBuilder::new_bar(label, target)
            .with_config(config)
            .start()
    }
}

fn pause(rng: &mut impl Rng, max_ms: u64) {
    thread::sleep(Duration::from_millis(rng.random_range(0..max_ms)));
}

fn fast(args: &Args, rng: &mut impl Rng) {
    let (max, step) = (6_000, 50);
    let bar = args.start("Fast", max);
    for i in (0..max).step_by(50) {
        pause(rng, 10);
        bar.advance(step);
        if i > 1_000 && i < 1_200 {
            bar.log_line(format!("Sweet {i} !!!"));
        }
    }
    bar.finish();
}

fn smooth(args: &Args, rng: &mut impl Rng) {
    let max = 12_550;
    let bar = args.start("Smooth...", max);
    for i in 0..max {
        pause(rng, 10);
        bar.inc();
        if i == max / 2 {
            bar.set_label("Smooth part 2...");
        }
    }
    bar.finish();
}

fn chunky(args: &Args, rng: &mut impl Rng) {
    let (max, step) = (600, 10);
    let bar = args.start("Chunky", max);
    for _ in (0..max).step_by(10) {
        pause(rng, 1_000);
        bar.advance(step);
    }
    bar.finish();
}

fn infinite(args: &Args, rng: &mut impl Rng) {
    let bar = args.start("Infinite", 0);
    let deadline = web_time::Instant::now() + Duration::from_secs(args.seconds);
    while web_time::Instant::now() < deadline {
        pause(rng, 100);
        bar.advance(rng.random_range(0..1_000));
    }
    bar.finish();
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    let mut rng = rand::rng();

    match args.scenario {
        Scenario::All => {
            fast(&args, &mut rng);
            smooth(&args, &mut rng);
        }
        Scenario::Fast => fast(&args, &mut rng),
        Scenario::Smooth => smooth(&args, &mut rng),
        Scenario::Chunky => chunky(&args, &mut rng),
        Scenario::Infinite => infinite(&args, &mut rng),
    }
}
