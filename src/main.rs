mod app;
mod cli;
mod domain;
mod infra;
mod ui;

use crate::app::{
    AppCommand, AppData, AppError, AppEvent, AppModel, apply_mutation_completed, apply_page_load,
    apply_update_outcome, update,
};
use crate::cli::{CliInvocation, CliOptions, CliRunError};
use crate::domain::PageData;
use crate::infra::{GatewayError, MutationGateway, load_page_file};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::{ExecutableCommand, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout, Write};
use std::path::PathBuf;
use std::sync::mpsc::{Sender, channel};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Cli(#[from] CliRunError),
}

#[derive(Clone, Debug)]
enum PageLoadSignal {
    Loaded { result: Result<PageData, String> },
}

#[derive(Clone, Debug)]
enum MutationSignal {
    UpdateResolved {
        session_id: String,
        outcome: Result<(String, u32), String>,
    },
    Completed {
        description: &'static str,
        result: Result<(), String>,
    },
}

/// Where the page data comes from. Mutations always go to the backend;
/// a file source only changes where reloads read the collections.
#[derive(Clone, Debug)]
enum PageSource {
    Backend { profile: Option<i64> },
    File { path: PathBuf },
}

fn main() {
    if let Err(error) = run_main() {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{error}");
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), MainError> {
    let args = std::env::args().collect::<Vec<_>>();
    let invocation = match crate::cli::parse_invocation(&args) {
        Ok(invocation) => invocation,
        Err(error) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{error}");
            let _ = writeln!(err);
            print_help();
            std::process::exit(2);
        }
    };

    match invocation {
        CliInvocation::PrintHelp => {
            print_help();
            Ok(())
        }
        CliInvocation::PrintVersion => {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliInvocation::Tui { options } => Ok(run_tui(options)?),
        CliInvocation::Command(command) => Ok(crate::cli::run(command)?),
    }
}

fn print_help() {
    let text = format!(
        "{name} — browse and edit recorded play sessions\n\nUSAGE:\n  {name} [FLAGS]                 Start the TUI\n  {name} sessions [FLAGS]        Print sessions as TSV\n  {name} --help | --version\n\nFLAGS:\n  --base-url URL, -b URL  Tracker backend address (default: {base}; env {env})\n  --profile ID            Current profile id (scopes the fetched page data)\n  --data FILE             Read page data from a local snapshot instead of the\n                          backend; a trailing _<id> in the file name supplies\n                          the current profile id\n\nSESSIONS FLAGS:\n  --limit N, -l N         Max sessions to print (default: 25)\n  --offset N, -o N        Skip first N sessions (default: 0)\n  --longer-than TEXT      Only sessions at least this long, e.g. \"1h 30m\"\n\nOUTPUT:\n  sessions: start_date<TAB>start_time<TAB>end_time<TAB>duration<TAB>type<TAB>game\n",
        name = env!("CARGO_PKG_NAME"),
        base = crate::infra::DEFAULT_BASE_URL,
        env = crate::cli::BASE_URL_ENV,
    );
    let mut out = io::stdout().lock();
    let _ = write!(out, "{text}");
}

fn run_tui(options: CliOptions) -> Result<(), AppError> {
    let gateway = MutationGateway::new(options.resolved_base_url());
    let source = match &options.data_file {
        Some(path) => PageSource::File { path: path.clone() },
        None => PageSource::Backend {
            profile: options.profile,
        },
    };

    let data = match load_page(&gateway, &source) {
        Ok(page) => AppData::from_page(page),
        Err(message) => AppData::from_error(message),
    };
    let mut model = AppModel::new(data);

    let mut terminal = setup_terminal()?;
    let result = run(&mut terminal, &mut model, &gateway, &source);
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, AppError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<(), AppError> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    model: &mut AppModel,
    gateway: &MutationGateway,
    source: &PageSource,
) -> Result<(), AppError> {
    let (load_tx, load_rx) = channel::<PageLoadSignal>();
    let (mutation_tx, mutation_rx) = channel::<MutationSignal>();

    loop {
        while let Ok(signal) = mutation_rx.try_recv() {
            match signal {
                MutationSignal::UpdateResolved {
                    session_id,
                    outcome,
                } => apply_update_outcome(model, &session_id, outcome),
                MutationSignal::Completed {
                    description,
                    result,
                } => {
                    if apply_mutation_completed(model, description, result) {
                        request_reload(model, gateway, source, &load_tx);
                    }
                }
            }
        }
        while let Ok(PageLoadSignal::Loaded { result }) = load_rx.try_recv() {
            apply_page_load(model, result);
        }

        terminal.draw(|frame| ui::render(frame, model))?;

        if !event::poll(Duration::from_millis(120))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                let (next, command) = update(model.clone(), AppEvent::Key(key));
                *model = next;
                match command {
                    AppCommand::None => {}
                    AppCommand::Quit => return Ok(()),
                    AppCommand::Reload => request_reload(model, gateway, source, &load_tx),
                    AppCommand::SubmitUpdate {
                        session_id,
                        game_name,
                        duration_minutes,
                    } => {
                        let gateway = gateway.clone();
                        let tx = mutation_tx.clone();
                        std::thread::spawn(move || {
                            let outcome = gateway
                                .update_session(&session_id, &game_name, duration_minutes)
                                .map(|()| (game_name.clone(), duration_minutes))
                                .map_err(|error| error.to_string());
                            let _ = tx.send(MutationSignal::UpdateResolved {
                                session_id,
                                outcome,
                            });
                        });
                    }
                    AppCommand::RemoveSession { session_id } => spawn_mutation(
                        gateway.clone(),
                        mutation_tx.clone(),
                        "Delete session",
                        move |gateway| gateway.remove_session(&session_id),
                    ),
                    AppCommand::DeleteIdleSession { session_id } => spawn_mutation(
                        gateway.clone(),
                        mutation_tx.clone(),
                        "Delete idle session",
                        move |gateway| gateway.delete_idle_session(&session_id),
                    ),
                    AppCommand::ConvertIdleSession { session_id } => spawn_mutation(
                        gateway.clone(),
                        mutation_tx.clone(),
                        "Convert session",
                        move |gateway| gateway.convert_idle_session(&session_id),
                    ),
                    AppCommand::SwitchSessionProfile {
                        session_id,
                        profile_id,
                    } => spawn_mutation(
                        gateway.clone(),
                        mutation_tx.clone(),
                        "Switch profile",
                        move |gateway| gateway.switch_session_profile(&session_id, profile_id),
                    ),
                }
            }
            _ => {}
        }
    }
}

fn spawn_mutation<F>(
    gateway: MutationGateway,
    tx: Sender<MutationSignal>,
    description: &'static str,
    call: F,
) where
    F: FnOnce(&MutationGateway) -> Result<(), GatewayError> + Send + 'static,
{
    std::thread::spawn(move || {
        let result = call(&gateway).map_err(|error| error.to_string());
        let _ = tx.send(MutationSignal::Completed {
            description,
            result,
        });
    });
}

fn request_reload(
    model: &mut AppModel,
    gateway: &MutationGateway,
    source: &PageSource,
    tx: &Sender<PageLoadSignal>,
) {
    if model.reload_in_flight {
        return;
    }
    model.reload_in_flight = true;
    let gateway = gateway.clone();
    let source = source.clone();
    let tx = tx.clone();
    std::thread::spawn(move || {
        let result = load_page(&gateway, &source);
        let _ = tx.send(PageLoadSignal::Loaded { result });
    });
}

fn load_page(gateway: &MutationGateway, source: &PageSource) -> Result<PageData, String> {
    match source {
        PageSource::Backend { profile } => gateway
            .fetch_page_data(*profile)
            .map_err(|error| error.to_string()),
        PageSource::File { path } => load_page_file(path).map_err(|error| error.to_string()),
    }
}
