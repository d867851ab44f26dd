use std::{env, process::ExitCode};

use tzfind::ZoneCatalog;
use web_time::{SystemTime, UNIX_EPOCH};

fn main() -> ExitCode {
    env_logger::init();

    let Some(query) = env::args().nth(1) else {
        eprintln!("usage: tzfind <location>");
        return ExitCode::FAILURE;
    };

    let catalog = ZoneCatalog::global();
    let found = match catalog.lookup(&query) {
        Ok(found) => found,
        Err(err) => {
            eprintln!("tzfind: {err}");
            return ExitCode::FAILURE;
        }
    };
    log::debug!(
        "{} resolved to {} (distance {}, tzdata {})",
        found.name,
        found.key,
        found.distance,
        catalog.version()
    );

    let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(since_epoch) => since_epoch.as_secs() as i64,
        Err(err) => -(err.duration().as_secs() as i64),
    };
    match found.zone.local_time(now) {
        Ok(local) => {
            println!("{}", found.name);
            println!("{local}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("tzfind: {err}");
            ExitCode::FAILURE
        }
    }
}
