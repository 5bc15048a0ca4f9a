use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use kombo::{
    app_dirs::AppDirs,
    combos::{ComboLibrary, DefaultComboSource},
    config::{Config, ConfigStore, FileConfigStore},
    runtime::{CrosstermEventSource, Input},
    session, GameError, Mode, SessionConfig, SessionEnd, SessionReport,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    error::Error,
    io::{self, stdin, BufRead, Write},
    path::PathBuf,
    process,
};

/// arrow-key combo reaction game
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Reproduce named arrow-key combos as fast and as accurately as you can. Every correct key scores 20, every wrong key costs 5, and timed runs pay a bonus for quick combos."
)]
pub struct Cli {
    /// game mode; asked interactively when omitted
    #[clap(short = 'm', long, value_enum)]
    mode: Option<Mode>,

    /// player name shown in the final summary; asked when omitted
    #[clap(short = 'u', long)]
    username: Option<String>,

    /// number of combos to play
    #[clap(short = 'n', long)]
    rounds: Option<usize>,

    /// seconds available in timed mode
    #[clap(short = 't', long)]
    time_limit: Option<u64>,

    /// arrows per combo in random mode
    #[clap(long)]
    random_length: Option<usize>,

    /// JSON file with {name, sequence} combos; the bundled set is used when it does not exist
    #[clap(short = 'c', long)]
    combos: Option<PathBuf>,

    /// store the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Layer command line overrides over the stored config
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(rounds) = self.rounds {
            cfg.rounds = rounds;
        }
        if let Some(secs) = self.time_limit {
            cfg.time_limit_secs = secs;
        }
        if let Some(len) = self.random_length {
            cfg.random_length = len;
        }
        if let Some(ref path) = self.combos {
            cfg.combos_file = path.clone();
        }
        cfg
    }
}

fn menu_choice(line: &str) -> Option<Mode> {
    match line.trim() {
        "1" => Some(Mode::Library),
        "2" => Some(Mode::Random),
        "3" => Some(Mode::Timed),
        _ => None,
    }
}

fn ask(prompt: &str) -> io::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn choose_mode(cfg: &Config) -> io::Result<Option<Mode>> {
    println!("Choose an option:");
    println!("1: Library Combos ({} random combos from file)", cfg.rounds);
    println!(
        "2: Random Combos ({} random sequences of {} arrows)",
        cfg.rounds, cfg.random_length
    );
    println!(
        "3: Timed Combos ({} seconds to finish {} random combos)",
        cfg.time_limit_secs, cfg.rounds
    );
    println!("q: Quit");

    let line = ask("> ")?;
    if line.eq_ignore_ascii_case("q") {
        println!("Exiting...");
        return Ok(None);
    }
    match menu_choice(&line) {
        Some(mode) => Ok(Some(mode)),
        None => {
            println!("Invalid option, please restart the program.");
            Ok(None)
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let _log_guard = AppDirs::state_dir().and_then(|dir| kombo::logging::init(&dir).ok());

    let store = FileConfigStore::new();
    let cfg = cli.apply(store.load());
    if cli.save_config {
        store.save(&cfg)?;
    }

    let username = match cli.username.clone() {
        Some(name) => name,
        None => ask("Enter your username: ")?,
    };
    let mode = match cli.mode {
        Some(mode) => mode,
        None => match choose_mode(&cfg)? {
            Some(mode) => mode,
            None => return Ok(()),
        },
    };

    let library = if mode.uses_library() {
        match ComboLibrary::load(&DefaultComboSource::new(&cfg.combos_file)) {
            Ok(library) => library,
            Err(e) => {
                tracing::error!(error = %e, "could not load combos");
                println!("Error loading combinations: {e}");
                println!("Congratulations {username}! Final Score: 0 in 0.00 seconds");
                return Err(e.into());
            }
        }
    } else {
        ComboLibrary::default()
    };

    let result = play(mode, &SessionConfig::from(&cfg), &library);

    match result {
        Ok(report) => {
            print_report(&username, &report);
            wait_for_exit()?;
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "fatal error during play");
            eprintln!("fatal: {e}");
            if let Some(path) = AppDirs::log_path() {
                eprintln!("details in {}", path.display());
            }
            let (score, secs) = e.banked_score_and_secs();
            println!("Congratulations {username}! Final Score: {score} in {secs:.2} seconds");
            process::exit(1);
        }
    }
}

/// Own the terminal for the duration of one session and always give it back
fn play(
    mode: Mode,
    config: &SessionConfig,
    library: &ComboLibrary,
) -> kombo::Result<SessionReport> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut display = kombo::ui::TerminalDisplay::new(Terminal::new(backend)?);
    display.terminal_mut().hide_cursor()?;

    let input = Input::new(CrosstermEventSource::new());
    let mut rng = rand::thread_rng();
    let result = session::play(mode, config, library, &mut rng, &input, &mut display);

    let restored = restore_terminal(display.into_terminal());

    let report = result?;
    restored.map_err(GameError::Terminal)?;
    Ok(report)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

fn print_report(username: &str, report: &SessionReport) {
    match report.end {
        SessionEnd::Quit => println!("You exited early. Final Score: {}", report.total_score),
        SessionEnd::TimeUp => println!("Time's up! Final Score: {}", report.total_score),
        SessionEnd::Finished => {}
    }
    let (score, secs) = report.score_and_secs();
    println!("Congratulations {username}! Final Score: {score} in {secs:.2} seconds");
}

fn wait_for_exit() -> io::Result<()> {
    println!("Press 'Enter' to exit.");
    let mut line = String::new();
    stdin().lock().read_line(&mut line)?;
    Ok(())
}
