//! Playroom CLI
//!
//! Usage:
//!   playroom --game arithmetic              # Play in the terminal
//!   playroom --game patterns --seed 7       # Reproducible rounds
//!   playroom --dashboard                    # Overall score percentage
//!   playroom --serve                        # HTTP API server
//!   playroom --game emotion --json          # JSON lines output

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use clap::Parser;
use colored::Colorize;
use tokio::sync::mpsc;
use tokio::time::{interval_at, sleep_until, Instant};
use tracing::{error, warn};

use playroom::config::Config;
use playroom::core::{run_server, Command, DailyScoreStore, GameSession, InputParser, TimerToken};
use playroom::types::{DailySummary, GameKind, RoundView, SessionEvent, SessionPhase, StepOutput, TransitionReason};
use playroom::{TICK_INTERVAL_MS, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "playroom",
    version = VERSION,
    about = "Playroom - timed mini-games with daily score tracking",
    long_about = "Playroom runs small learning games in the terminal or over HTTP.\n\n\
                  Games:\n  \
                  arithmetic  Solve sums against the clock, three levels\n  \
                  emotion     Match each face with its emotion\n  \
                  patterns    Repeat the instrument sequence you just heard\n\n\
                  While playing:\n  \
                  submit  Evaluate what you typed so far\n  \
                  pause   Stop the clock (resume to continue)\n  \
                  reset   Start over\n  \
                  quit    Leave the game"
)]
struct Args {
    /// Game to play in the terminal
    #[arg(short, long, value_enum)]
    game: Option<GameKind>,

    /// Print the score dashboard and exit
    #[arg(short, long)]
    dashboard: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for the daily score stores (default: ./scores)
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long)]
    addr: Option<String>,

    /// Fixed RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config.with_overrides(args.store_dir.clone(), args.addr.clone(), args.seed),
        Err(e) => {
            error!(error = %e, "could not load configuration");
            eprintln!("{} {}", "Configuration error:".red().bold(), e);
            std::process::exit(2);
        }
    };
    let store = DailyScoreStore::on_disk(&config.store_dir);

    if args.serve {
        run_serve(config, store).await;
    } else if args.dashboard {
        run_dashboard(&store, args.json);
    } else if let Some(game) = args.game {
        if let Err(e) = run_game(game, &config, store, args.json).await {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    } else {
        run_dashboard(&store, args.json);
        println!();
        println!("Pick a game with --game <arithmetic|emotion|patterns>, or --help.");
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Print aggregated score percentage
fn run_dashboard(store: &DailyScoreStore, json: bool) {
    let keys: Vec<&str> = GameKind::ALL.iter().map(|k| k.store_key()).collect();
    let report = store.dashboard(&keys);

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("{}", e),
        }
        return;
    }

    print_header("Dashboard");
    for (kind, game) in GameKind::ALL.iter().zip(&report.games) {
        let mut line = format!(
            "  {:<28} {:>3}%  ({} days)",
            kind.title(),
            (game.average * 100.0).round(),
            game.entries
        );
        if game.skipped > 0 {
            line.push_str(&format!(", {} unreadable", game.skipped));
        }
        println!("{}", line);
    }
    println!();
    println!("  {} {}%", "Average score:".bold(), report.percent.to_string().green().bold());
}

/// Interactive play: stdin lines and the countdown share one loop
async fn run_game(game: GameKind, config: &Config, store: DailyScoreStore, json: bool) -> playroom::Result<()> {
    let profile = config.profile(game);
    let parser = InputParser::new(profile.match_rule);
    let mut engine = GameSession::new(profile, store, config.seed);

    if !json {
        print_header(game.title());
        println!("Type your answer and press Enter. 'pause', 'reset', 'quit' also work.");
        println!();
    }

    let output = engine.start()?;
    let mut view = Screen::new(json);
    view.show(&mut engine, &output);

    let mut lines = spawn_stdin_reader();
    let period = Duration::from_millis(TICK_INTERVAL_MS);
    let mut armed: Option<TimerToken> = engine.timer_token();
    let mut ticker = interval_at(Instant::now() + period, period);

    loop {
        // A new countdown generation restarts the one-second cadence
        if engine.timer_token() != armed {
            armed = engine.timer_token();
            ticker = interval_at(Instant::now() + period, period);
        }
        let reveal_at = view.reveal_at;

        tokio::select! {
            _ = ticker.tick(), if armed.is_some() => {
                if let Some(token) = armed {
                    let output = engine.on_tick(token);
                    view.show(&mut engine, &output);
                }
            }
            _ = sleep_until(reveal_at.unwrap_or_else(Instant::now)), if reveal_at.is_some() => {
                view.reveal_at = None;
                view.hide_sequence();
                let output = engine.reveal_complete();
                view.show(&mut engine, &output);
            }
            line = lines.recv() => {
                let Some(line) = line else {
                    break;
                };
                let round = engine.round_view();
                let output = match parser.parse(&line, round.as_ref()) {
                    Command::Answer(tokens) => engine.push_inputs(tokens)?,
                    Command::Submit => engine.submit()?,
                    Command::Pause => engine.pause(),
                    Command::Resume => engine.resume(),
                    Command::Reset => {
                        engine.reset();
                        engine.start()?
                    }
                    Command::Quit => break,
                    Command::Unrecognized(text) => {
                        if !text.is_empty() {
                            view.hint(&format!("Could not read '{}'", text));
                        }
                        continue;
                    }
                };
                view.show(&mut engine, &output);
            }
        }

        if engine.phase().is_terminal() {
            break;
        }
    }

    if engine.pending_write() {
        warn!("today's summary could not be saved");
    }
    Ok(())
}

/// Blocking stdin on its own thread, lines forwarded to the async loop
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Terminal renderer for engine events
struct Screen {
    json: bool,
    /// When the pattern on screen should be hidden
    reveal_at: Option<Instant>,
    sequence_shown: bool,
}

impl Screen {
    fn new(json: bool) -> Self {
        Self {
            json,
            reveal_at: None,
            sequence_shown: false,
        }
    }

    fn show(&mut self, engine: &mut GameSession, output: &StepOutput) {
        let events = engine.drain_events();
        for event in &events {
            if let SessionEvent::RoundPresented { round } = event {
                self.schedule_reveal(round);
            }
        }

        if self.json {
            for event in &events {
                if let Ok(s) = serde_json::to_string(event) {
                    println!("{}", s);
                }
            }
            if let Ok(s) = serde_json::to_string(output) {
                println!("{}", s);
            }
            return;
        }

        for event in events {
            match event {
                SessionEvent::RoundPresented { round } => self.present(&round),
                SessionEvent::InputOpened => {
                    if let Some(round) = engine.round_view() {
                        self.prompt(&round);
                    }
                }
                SessionEvent::Feedback { outcome } => {
                    if outcome.correct {
                        println!("{}", TransitionReason::G300_CORRECT_ADVANCING.description().green().bold());
                    } else {
                        println!("{}", TransitionReason::G310_INCORRECT_RETRY.description().red().bold());
                    }
                }
                SessionEvent::LevelAdvanced { level, .. } => {
                    println!();
                    println!("{} {}", "⬆ Level up:".cyan().bold(), level.cyan().bold());
                }
                SessionEvent::Tick { remaining } => {
                    if remaining % 10 == 0 || remaining <= 5 {
                        println!("{}", format!("⏱  {}s left", remaining).yellow());
                    }
                }
                SessionEvent::Celebrate => {
                    println!();
                    println!("{}", "🎉 Congratulations! You completed all levels!".green().bold());
                }
                SessionEvent::SessionEnded { summary } => self.summary(&summary),
            }
        }

        if output.phase == SessionPhase::TimedOut && output.reason == TransitionReason::G401_TIMED_OUT {
            println!("{}", "⌛ Time's up!".red().bold());
        }
        if output.phase.is_terminal() {
            println!("{}", output.to_parseable_string().dimmed());
        }
        if output.reason == TransitionReason::G410_PAUSED
            || output.reason == TransitionReason::G411_RESUMED
        {
            println!("{}", output.to_terminal_string());
        }
    }

    /// Playback length decides when input opens, whatever the output mode
    fn schedule_reveal(&mut self, round: &RoundView) {
        if let Some(sequence) = &round.sequence {
            let per_symbol = round.reveal_ms.unwrap_or(1000);
            let total = per_symbol.saturating_mul(sequence.len() as u64);
            self.reveal_at = Some(Instant::now() + Duration::from_millis(total));
        }
    }

    fn present(&mut self, round: &RoundView) {
        println!();
        println!("{} {}", format!("#{}", round.number).dimmed(), round.prompt.bold());
        if let Some(sequence) = &round.sequence {
            println!("  {} {}", "♪".magenta(), sequence.join(" → ").magenta().bold());
            self.sequence_shown = true;
        }
    }

    /// Overwrite the playback line so the player answers from memory
    fn hide_sequence(&mut self) {
        if self.sequence_shown && !self.json {
            print!("\x1b[1A\x1b[2K");
            let _ = io::stdout().flush();
        }
        self.sequence_shown = false;
    }

    fn prompt(&self, round: &RoundView) {
        if !round.items.is_empty() {
            let items: Vec<String> = round
                .items
                .iter()
                .enumerate()
                .map(|(i, item)| format!("{}) {}", i + 1, item))
                .collect();
            println!("  Faces:    {}", items.join("   "));
        }
        if !round.choices.is_empty() {
            let choices: Vec<String> = round
                .choices
                .iter()
                .enumerate()
                .map(|(i, c)| format!("{}) {}", i + 1, c))
                .collect();
            println!("  Choices:  {}", choices.join("   ").cyan());
        }
        if round.expected_len > 1 {
            println!("  {}", format!("Enter {} choices in order", round.expected_len).dimmed());
        }
        print!("> ");
        let _ = io::stdout().flush();
    }

    fn hint(&self, message: &str) {
        if self.json {
            return;
        }
        println!("{}", message.yellow());
    }

    fn summary(&self, summary: &DailySummary) {
        println!();
        println!("{}", "── Session over ──".bold());
        println!("  Level:     {}", summary.level);
        println!("  Score:     {}", summary.score);
        println!("  Correct:   {}", summary.correct_answers.to_string().green());
        println!("  Incorrect: {}", summary.incorrect_answers.to_string().red());
        println!("  Accuracy:  {:.0}%", summary.score_ratio() * 100.0);
    }
}

/// Print header
fn print_header(title: &str) {
    println!("{}", "╔══════════════════════════════════════════╗".bold());
    println!("{}", format!("║  Playroom v{} - {:<27}║", VERSION, title).bold());
    println!("{}", "╚══════════════════════════════════════════╝".bold());
    println!();
}

/// Run HTTP API server
async fn run_serve(config: Config, store: DailyScoreStore) {
    println!();
    print_header("API Server");

    if let Err(e) = run_server(config, store).await {
        error!(error = %e, "server stopped");
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use playroom::types::GameProfile;

    fn started(profile: GameProfile, json: bool) -> (GameSession, Screen) {
        let mut engine = GameSession::new(profile, DailyScoreStore::in_memory(), Some(1));
        let output = engine.start().unwrap();
        let mut view = Screen::new(json);
        view.show(&mut engine, &output);
        (engine, view)
    }

    #[test]
    fn test_json_mode_schedules_pattern_reveal() {
        let (mut engine, mut view) = started(GameProfile::patterns(), true);
        assert_eq!(engine.phase(), SessionPhase::Presenting);

        let reveal_at = view.reveal_at.expect("reveal scheduled in json mode");
        // Level 1: three symbols at 1000 ms each
        assert!(reveal_at <= Instant::now() + Duration::from_millis(3000));

        view.reveal_at = None;
        view.hide_sequence();
        let output = engine.reveal_complete();
        assert_eq!(output.phase, SessionPhase::AwaitingInput);
        assert_eq!(output.reason, TransitionReason::G120_INPUT_OPEN);
    }

    #[test]
    fn test_terminal_mode_schedules_pattern_reveal() {
        let (_, view) = started(GameProfile::patterns(), false);
        assert!(view.reveal_at.is_some());
        assert!(view.sequence_shown);
    }

    #[test]
    fn test_no_reveal_without_playback() {
        let (engine, view) = started(GameProfile::arithmetic(), true);
        assert!(view.reveal_at.is_none());
        assert_eq!(engine.phase(), SessionPhase::AwaitingInput);
    }
}
