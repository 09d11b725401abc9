use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::Duration;
use via_cleaner::lsp::handlers::handle_clean_complete;
use via_cleaner::lsp::{dispatch, error_codes, CleanAsyncResult, Request, Response, ServerState};

/// How often pending batch results are checked while stdin is idle
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// JSON-RPC via cleaner server over stdio
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file, loaded at startup and rewritten on UpdateSettings
    #[arg(short, long, value_name = "FILE")]
    settings: Option<PathBuf>,
}

fn write_line(stdout: &mut impl Write, line: &str) -> io::Result<()> {
    writeln!(stdout, "{}", line)?;
    stdout.flush()
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
    let args = Args::parse();

    log::info!("Starting via cleaner server...");
    let mut state = match args.settings {
        Some(path) => ServerState::with_settings_file(path),
        None => ServerState::new(),
    };
    let mut stdout = io::stdout();

    // Channel for async clean results
    let (clean_tx, clean_rx): (Sender<CleanAsyncResult>, Receiver<CleanAsyncResult>) =
        mpsc::channel();

    // Stdin is read on its own thread so notifications go out while idle
    let (line_tx, line_rx) = mpsc::channel::<io::Result<String>>();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    loop {
        // Check for completed batches (non-blocking)
        match clean_rx.try_recv() {
            Ok(done) => {
                let notification = handle_clean_complete(&mut state, done);
                write_line(&mut stdout, &notification.to_string())?;
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {}
        }

        let line = match line_rx.recv_timeout(POLL_INTERVAL) {
            Ok(Ok(line)) => line,
            Ok(Err(e)) => {
                log::error!("Error reading stdin: {}", e);
                continue;
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                log::debug!("Request: {}", request.method);
                dispatch(&mut state, request, &clean_tx)
            }
            Err(e) => {
                log::warn!("Failed to parse request: {}", e);
                Response::error(None, error_codes::PARSE_ERROR, format!("Parse error: {}", e))
            }
        };
        write_line(&mut stdout, &response.to_line())?;
    }

    if let Some(cancel) = &state.running {
        cancel.cancel();
    }
    log::info!("Shutting down...");
    Ok(())
}
