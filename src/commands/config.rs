use anyhow::{Result, bail};

use crate::cli::ConfigArgs;
use penmark::config::{CONFIG_FILE, Config};

use super::resolve_project_root;

pub fn run_config_command(args: ConfigArgs) -> Result<()> {
    let root = resolve_project_root(args.root.as_deref())?;

    if args.root_dir {
        println!("{}", root.display());
        return Ok(());
    }

    let config = Config::load(root.join(CONFIG_FILE))?;
    println!("{}", query(&config, &args)?);
    Ok(())
}

fn query(config: &Config, args: &ConfigArgs) -> Result<String> {
    let requested = [
        (args.title, config.title.clone()),
        (args.base_url, config.base_url.clone()),
        (args.base_path, config.base_path.clone()),
        (args.timezone, config.timezone.clone()),
        (args.date_format, config.date_format.clone()),
        (args.collections, config.collections.join(",")),
        (args.search_asset_path, config.search.asset_path.clone()),
        (args.stats_asset_path, config.stats.asset_path.clone()),
        (args.og_output_dir, config.og.output_dir.clone()),
    ];

    let mut selected = requested.into_iter().filter(|(flag, _)| *flag);
    match (selected.next(), selected.next()) {
        (None, _) => bail!("No config key specified. Use --help to see available options."),
        (Some(_), Some(_)) => bail!("Only one config key can be queried at a time."),
        (Some((_, value)), None) => Ok(value),
    }
}
