use std::path::PathBuf;

use jumpers_rs::config::MergeOverrides;
use jumpers_rs::{ConfigOverrides, Jumpers, JumpersConfig, MergeStrategy};
use tracing_subscriber::EnvFilter;

fn parse_arg(flag: &str) -> Option<String> {
    let mut args = std::env::args();
    while let Some(arg) = args.next() {
        if arg == flag {
            return args.next();
        }
    }
    None
}

fn has_flag(flag: &str) -> bool {
    std::env::args().any(|arg| arg == flag)
}

fn parse_overrides() -> anyhow::Result<ConfigOverrides> {
    let strategy = parse_arg("--strategy")
        .map(|value| value.parse::<MergeStrategy>())
        .transpose()
        .map_err(anyhow::Error::msg)?;
    let parallel = has_flag("--parallel").then_some(true);

    let merge = (strategy.is_some() || parallel.is_some()).then(|| MergeOverrides {
        strategy,
        parallel,
        ..MergeOverrides::default()
    });

    Ok(ConfigOverrides {
        input: parse_arg("--input").map(PathBuf::from),
        output: parse_arg("--output").map(PathBuf::from),
        merge,
    })
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = parse_arg("--config").map(PathBuf::from);
    let config = JumpersConfig::load(config_path.as_deref(), parse_overrides()?)?;

    let outcome = Jumpers::new(config).run()?;
    println!(
        "{} cabinets, {} links, {} terminals written ({} input records, {} skipped)",
        outcome.report.cabinets,
        outcome.report.links,
        outcome.report.terminals,
        outcome.parse.records,
        outcome.parse.skipped
    );
    Ok(())
}
