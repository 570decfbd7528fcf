//! sim-runner: headless driver for the Dyson swarm simulation.
//!
//! Usage:
//!   sim-runner --ticks 500 --speed 4 --db run.db --save end.json
//!   sim-runner --load end.json --ipc-mode
//!
//! Wall time is virtual: the runner feeds the clock one outside sample per
//! 16 ms frame, so runs are reproducible and finish as fast as the CPU allows.
//! A loaded save resumes from its clock's last wall-time anchor.

mod runner;

use anyhow::Result;
use dyson_core::{
    command::PlayerCommand,
    config::SimConfig,
    snapshot::SaveState,
    store::{EventStore, MemoryStore, SqliteStore},
    summary::SimulationSummary,
    Simulation,
};
use runner::Runner;
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcRequest {
    GetState,
    Advance { millis: f64 },
    Command { command: PlayerCommand },
    Save { path: String },
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ticks = parse_arg(&args, "--ticks", 100u64);
    let speed = parse_arg(&args, "--speed", 1.0f64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let config_path = flag_value(&args, "--config");
    let load_path = flag_value(&args, "--load");
    let save_path = flag_value(&args, "--save");

    let config = match config_path {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    let store: Box<dyn EventStore> = if db == ":memory:" {
        Box::new(MemoryStore::new())
    } else {
        Box::new(SqliteStore::open(db)?)
    };

    let run_id = format!("run-{}", chrono::Utc::now().format("%Y%m%d-%H%M%S"));
    let sim = match load_path {
        Some(path) => Simulation::load(SaveState::read_from(path)?, config, store)?,
        None => Simulation::fresh_game(config, store)?,
    };
    log::info!("{run_id}: starting at tick {}", sim.current_tick());

    let mut runner = Runner::new(sim);

    if ipc_mode {
        run_ipc_loop(&mut runner)?;
    } else {
        println!("Dyson swarm sim-runner");
        println!("  run_id:  {run_id}");
        println!("  ticks:   {ticks}");
        println!("  speed:   {speed}");
        println!("  db:      {db}");
        println!();

        runner.run_batch(ticks, speed)?;
        print_summary(&runner.sim.summary(), &run_id);
    }

    if let Some(path) = save_path {
        runner.sim.save().write_to(path)?;
        log::info!("{run_id}: saved to {path}");
    }
    Ok(())
}

fn run_ipc_loop(runner: &mut Runner) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let request: IpcRequest = match serde_json::from_str(&buffer) {
            Ok(r) => r,
            Err(e) => {
                writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };

        let outcome = match request {
            IpcRequest::Quit => break,
            IpcRequest::GetState => Ok(()),
            IpcRequest::Advance { millis } => runner.advance(millis),
            IpcRequest::Command { command } => runner.issue(command),
            IpcRequest::Save { path } => runner.sim.save().write_to(&path).map_err(Into::into),
        };

        match outcome {
            Ok(()) => writeln!(stdout, "{}", serde_json::to_string(&runner.sim.summary())?)?,
            Err(e) => writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?,
        }
        stdout.flush()?;
    }
    Ok(())
}

fn print_summary(s: &SimulationSummary, run_id: &str) {
    println!("=== RUN SUMMARY ===");
    println!("  run_id:        {run_id}");
    println!("  final tick:    {}", s.tick);
    println!("  clock:         {} at speed {}", s.mode, s.speed);
    println!("  breaker:       {}", if s.breaker_tripped { "TRIPPED" } else { "ok" });
    println!("  swarm size:    {}", s.swarm_size);
    println!("  planet mass:   {}", s.planet_mass);
    println!("  logged events: {}", s.logged_events);

    println!();
    println!("=== STOCKS ===");
    for (resource, amount) in &s.stocks {
        println!("  {resource:<12} {amount}");
    }

    println!();
    println!("=== CONSTRUCTS ===");
    for (construct, counts) in &s.constructs {
        println!("  {construct:<10} {} ({} working)", counts.count, counts.working);
    }
    match s.fabricator_job {
        Some(job) => println!("  fabricator: building {job}, {} queued", s.fabricator_queue_len),
        None => println!("  fabricator: idle, {} queued", s.fabricator_queue_len),
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
