use std::process;

use database::{DatabaseConnectionInfo, PgDatabase};
use web::{start_web_server, WebConfig, WebState};

fn fail<E: std::fmt::Display>(message: &str, why: E) -> ! {
    log::error!("{}: {}", message, why);
    process::exit(1);
}

#[tokio::main]
async fn main() {
    env_logger::init();

    // database
    let Some(database_connection_info) = DatabaseConnectionInfo::from_env() else {
        fail("startup failed", "expected database connection info in env")
    };
    let database = PgDatabase::connect(database_connection_info)
        .await
        .unwrap_or_else(|why| fail("could not connect to database", why));

    // web server
    let config = WebConfig::from_env();
    if let Err(why) = start_web_server(WebState::new(database), &config).await {
        fail("web server stopped", why);
    }
}
