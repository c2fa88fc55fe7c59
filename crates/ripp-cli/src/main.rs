//! The `ripp` binary

use ripp_cli::{command, logging, run, Failure, Io};
use std::io::Write;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let matches = command().get_matches();
    logging::init(matches.get_flag("json-logs"), matches.get_flag("verbose"));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            trigger.cancel();
        }
    });

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout().lock();
    let io = Io {
        input: &mut input,
        output: &mut output,
    };

    let passed = match run(&matches, io, &cancel).await {
        Ok(passed) => passed,
        Err(err) => {
            match err.downcast_ref::<Failure>() {
                Some(failure) => {
                    eprintln!("error[{}]: {failure}", failure.kind);
                    if let Some(hint) = &failure.hint {
                        eprintln!("  hint: {hint}");
                    }
                }
                None => eprintln!("error: {err:#}"),
            }
            false
        }
    };
    let _ = output.flush();
    std::process::exit(if passed { 0 } else { 1 });
}
