use std::sync::Arc;

use eyre::WrapErr;
use melodymatchr_http_client::SongServiceClient;
use melodymatchr_session::SessionHandle;
use models::config::SessionConfig;
use models::AlgorithmVariant;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render::render_view;

#[derive(Debug, PartialEq)]
enum Action {
    Input(String),
    Commit,
    Select(usize),
    Dismiss,
    Algorithm(AlgorithmVariant),
    Quit,
    Help,
}

const HELP: &str = "\
type a query and press enter to update it; suggestions appear after a short pause
  :commit          search for the current query
  :select N        pick suggestion N (1-based)
  :dismiss         hide the suggestion panel
  :algo NAME       switch backend (heap | hashtable)
  :quit            exit";

fn parse_line(line: &str) -> Result<Action, String> {
    let Some(command) = line.strip_prefix(':') else {
        return Ok(Action::Input(line.to_string()));
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("commit" | "c"), None) => Ok(Action::Commit),
        (Some("select" | "s"), Some(n)) => match n.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(Action::Select(n - 1)),
            _ => Err(format!("invalid suggestion number: {n}")),
        },
        (Some("dismiss" | "d"), None) => Ok(Action::Dismiss),
        (Some("algo"), Some(name)) => name
            .parse::<AlgorithmVariant>()
            .map(Action::Algorithm)
            .map_err(|_| format!("unknown algorithm: {name}")),
        (Some("quit" | "q"), None) => Ok(Action::Quit),
        (Some("help" | "h"), None) => Ok(Action::Help),
        _ => Err(format!("unknown command: {line}")),
    }
}

pub(crate) async fn run(client: SongServiceClient, config: SessionConfig) -> eyre::Result<()> {
    let (handle, task) = melodymatchr_session::spawn(Arc::new(client), config);
    let printer = tokio::spawn(print_views(handle.clone()));

    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.wrap_err("read stdin")? {
        match parse_line(&line) {
            Ok(Action::Input(text)) => handle.input(text),
            Ok(Action::Commit) => handle.commit(),
            Ok(Action::Select(index)) => handle.select_suggestion(index),
            Ok(Action::Dismiss) => handle.dismiss_panel(),
            Ok(Action::Algorithm(algorithm)) => handle.set_algorithm(algorithm),
            Ok(Action::Help) => println!("{HELP}"),
            Ok(Action::Quit) => break,
            Err(message) => eprintln!("{message}"),
        }
    }

    handle.shutdown();
    task.await.wrap_err("join search session")?;
    printer.abort();
    Ok(())
}

async fn print_views(handle: SessionHandle) {
    let mut views = handle.subscribe();
    let mut last = String::new();
    while views.changed().await.is_ok() {
        let rendered = render_view(&views.borrow_and_update());
        if rendered != last {
            print!("{rendered}");
            last = rendered;
        }
    }
}
