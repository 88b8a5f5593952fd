//! Dog Courier server entry point
//!
//! Loads the game config, restores saved sessions, drives the ticker and
//! writes a final snapshot on Ctrl-C.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use dog_courier::app::{Application, AutoSave, Ticker};
use dog_courier::consts::DEFAULT_TICK_PERIOD_MS;
use dog_courier::{Leaderboard, config, persistence};

const USAGE: &str = "\
Usage: dog-courier --config <file> [options]

Options:
  -c, --config <file>           Game config (JSON)
  -t, --tick-period <ms>        Tick period in milliseconds (default 50)
      --state-file <file>       Restore from and save to this file
      --save-state-period <ms>  Autosave period (needs --state-file)
      --randomize-spawn-points  Spawn dogs at random road positions
      --workers <n>             Worker threads (default: one per core)
  -h, --help                    Show this help";

#[derive(Debug, Clone, PartialEq)]
struct Args {
    config: PathBuf,
    tick_period: Duration,
    state_file: Option<PathBuf>,
    save_state_period: Option<Duration>,
    randomize_spawn: bool,
    workers: Option<usize>,
}

/// `Ok(None)` means help was requested
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Args>, String> {
    let mut config = None;
    let mut tick_period = Duration::from_millis(DEFAULT_TICK_PERIOD_MS);
    let mut state_file = None;
    let mut save_state_period = None;
    let mut randomize_spawn = false;
    let mut workers = None;

    fn value(flag: &str, v: Option<String>) -> Result<String, String> {
        v.ok_or_else(|| format!("{flag} needs a value"))
    }
    fn number<T: std::str::FromStr>(flag: &str, v: Option<String>) -> Result<T, String> {
        let raw = value(flag, v)?;
        raw.parse().map_err(|_| format!("{flag}: `{raw}` is not a valid number"))
    }

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" | "--config-file" => config = Some(PathBuf::from(value(&arg, args.next())?)),
            "-t" | "--tick-period" => tick_period = Duration::from_millis(number(&arg, args.next())?),
            "--state-file" => state_file = Some(PathBuf::from(value(&arg, args.next())?)),
            "--save-state-period" => {
                save_state_period = Some(Duration::from_millis(number(&arg, args.next())?))
            }
            "--randomize-spawn-points" => randomize_spawn = true,
            "--workers" => workers = Some(number(&arg, args.next())?),
            "-h" | "--help" => return Ok(None),
            other => return Err(format!("unknown option `{other}`")),
        }
    }

    let config = config.ok_or("--config is required")?;
    if tick_period.is_zero() {
        return Err("--tick-period must be positive".into());
    }
    if workers == Some(0) {
        return Err("--workers must be positive".into());
    }
    Ok(Some(Args {
        config,
        tick_period,
        state_file,
        save_state_period,
        randomize_spawn,
        workers,
    }))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(msg) => {
            eprintln!("{msg}\n\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(n) = args.workers {
        builder.worker_threads(n);
    }
    let runtime = match builder.build() {
        Ok(rt) => rt,
        Err(err) => {
            log::error!("Failed to start runtime: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(args)) {
        Ok(()) => {
            log::info!("Server exited");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("Server exited with error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut game = config::load_game(&args.config)?;
    game.set_randomize_spawn(args.randomize_spawn);
    game.set_loot_random(Arc::new(rand::random::<f64>));

    if let Some(path) = args.state_file.as_deref().filter(|p| p.exists()) {
        let snapshot = persistence::load(path)?;
        game.restore(snapshot)?;
        log::info!("Restored state from {}", path.display());
    }

    let leaderboard = Arc::new(Leaderboard::new());
    let app = Application::new(game, leaderboard.clone())?;

    let mut ticker = Ticker::new(app.clone(), args.tick_period);
    if let (Some(path), Some(period)) = (&args.state_file, args.save_state_period) {
        ticker = ticker.with_autosave(AutoSave {
            path: path.clone(),
            period,
        });
    }
    let ticker = ticker.spawn();
    log::info!(
        "Server started: {} map(s), tick period {} ms",
        app.maps().len(),
        args.tick_period.as_millis()
    );

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down");
    ticker.abort();

    let snapshot = app.shutdown().await;
    if let Some(path) = &args.state_file {
        persistence::save(path, &snapshot)?;
    }
    for (rank, entry) in leaderboard.top(0, 10).iter().enumerate() {
        log::info!(
            "#{} {} score {} in {:.1}s",
            rank + 1,
            entry.name,
            entry.score,
            entry.play_time.as_secs_f64()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<Args>, String> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_defaults() {
        let args = parse(&["--config", "game.json"]).unwrap().unwrap();
        assert_eq!(args.config, PathBuf::from("game.json"));
        assert_eq!(args.tick_period, Duration::from_millis(50));
        assert!(args.state_file.is_none());
        assert!(!args.randomize_spawn);
    }

    #[test]
    fn test_parse_all_options() {
        let args = parse(&[
            "-c",
            "game.json",
            "-t",
            "20",
            "--state-file",
            "state.json",
            "--save-state-period",
            "1000",
            "--randomize-spawn-points",
            "--workers",
            "4",
        ])
        .unwrap()
        .unwrap();
        assert_eq!(args.tick_period, Duration::from_millis(20));
        assert_eq!(args.state_file, Some(PathBuf::from("state.json")));
        assert_eq!(args.save_state_period, Some(Duration::from_secs(1)));
        assert!(args.randomize_spawn);
        assert_eq!(args.workers, Some(4));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--config"]).is_err());
        assert!(parse(&["--config", "a", "--tick-period", "fast"]).is_err());
        assert!(parse(&["--config", "a", "--bogus"]).is_err());
        assert_eq!(parse(&["--help"]), Ok(None));
    }
}
