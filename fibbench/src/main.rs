use anyhow::Context as _;
use clap::Parser as _;
use fibbench::{BenchConfig, PrefixGenerator, run_once};

/// Measures bulk route-installation latency against the in-memory netlink
/// simulator, sweeping a list of batch sizes.
#[derive(Debug, clap::Parser)]
struct Args {
    /// Batch sizes to sweep, comma separated.
    #[arg(long, value_delimiter = ',', default_value = "10,100,1000,10000")]
    routes: Vec<usize>,
    /// Next-hops per route.
    #[arg(long, default_value_t = 128)]
    next_hops: usize,
    /// Prefix length of generated destinations.
    #[arg(long, default_value_t = 128)]
    prefix_len: u8,
    /// Measured passes per batch size (the first pass doubles as warm-up).
    #[arg(long, default_value_t = 3)]
    iters: usize,
    /// Seed for reproducible input generation.
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut generator = match args.seed {
        Some(seed) => PrefixGenerator::with_seed(seed),
        None => PrefixGenerator::new(),
    };

    for &routes in &args.routes {
        let cfg = BenchConfig {
            routes,
            next_hops: args.next_hops,
            prefix_len: args.prefix_len,
            ..BenchConfig::default()
        };
        for iter in 0..args.iters {
            let report = run_once(&cfg, &mut generator)
                .await
                .with_context(|| format!("installing {routes} routes"))?;
            log::info!(
                "routes={} next_hops={} iter={} installed={} elapsed={:?} ({:.0} routes/s)",
                routes,
                cfg.next_hops,
                iter,
                report.installed,
                report.elapsed,
                report.installed as f64 / report.elapsed.as_secs_f64(),
            );
        }
    }
    Ok(())
}
