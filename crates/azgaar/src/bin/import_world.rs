use std::{path::PathBuf, process};

use azgaar::{import_world, locations, read_map_data};
use clap::Parser;
use database::{DatabaseConnectionInfo, PgDatabase};
use world::Client;

#[derive(Parser, Debug)]
#[command(name = "import_world")]
#[command(about = "Replace all stored locations with the burgs of an Azgaar map export")]
struct Args {
    /// Azgaar "full JSON" export of the world map
    #[arg(long, default_value = "./data/map_data.json")]
    map_data: PathBuf,

    /// Only parse the export and report what would be imported
    #[arg(long)]
    dry_run: bool,
}

fn fail<E: std::fmt::Display>(message: &str, why: E) -> ! {
    log::error!("{}: {}", message, why);
    process::exit(1);
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    log::info!("reading map file {}", args.map_data.display());
    let map = read_map_data(&args.map_data)
        .unwrap_or_else(|why| fail("import failed", why));
    let locations = locations(&map);
    log::info!("found {} cities", locations.len());

    if args.dry_run {
        for location in &locations {
            log::info!(
                "{} `{}` ({}, population {})",
                location.azgaar_id,
                location.name,
                location.settlement_type.as_str(),
                location.population
            );
        }
        return;
    }

    let Some(database_connection_info) = DatabaseConnectionInfo::from_env() else {
        fail("import failed", "expected database connection info in env")
    };
    let database = PgDatabase::connect(database_connection_info)
        .await
        .unwrap_or_else(|why| fail("could not connect to database", why));

    match import_world(&Client::new(database), &locations).await {
        Ok(stored) => log::info!("imported {} locations", stored.len()),
        Err(why) => fail("import failed", why),
    }
}
