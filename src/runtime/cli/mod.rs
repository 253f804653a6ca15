mod helper;
mod render;

use std::sync::Arc;

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use tokio::sync::mpsc;

use crate::adapters::config::Settings;
use crate::adapters::docs::DocumentStore;
use crate::adapters::llm::{ChatLlmAdapter, StreamEvent};
use crate::core::ports::llm::{GenerateRequest, LlmPort};
use crate::core::prompt::{compose_prompt, PromptContext};
use crate::core::scan::chartable_series;
use crate::core::session::{Role, Session, RECENT_WINDOW};

use helper::CliHelper;

const SLASH_COMMANDS: [&str; 4] = ["/help", "/history", "/reload", "/quit"];

#[derive(Debug, Parser)]
#[command(
    name = "corebot",
    version,
    about = "Document-grounded chat companion for the terminal"
)]
struct Args {
    /// Folder scanned for .txt, .md, .pdf and .docx reference documents
    #[arg(long)]
    data_dir: Option<String>,
    /// Chat model served by the Google Generative Language API
    #[arg(long)]
    model: Option<String>,
    /// ASCII-art file shown as the startup banner
    #[arg(long)]
    mascot: Option<String>,
}

/// What one line of input asks the loop to do.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Command(SlashCommand),
    UnknownCommand(String),
    Chat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlashCommand {
    Help,
    History,
    Reload,
    Quit,
}

fn classify(line: &str) -> Option<Input> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let input = if trimmed.starts_with('/') {
        match trimmed {
            "/help" => Input::Command(SlashCommand::Help),
            "/history" => Input::Command(SlashCommand::History),
            "/reload" => Input::Command(SlashCommand::Reload),
            "/quit" | "/exit" => Input::Command(SlashCommand::Quit),
            other => Input::UnknownCommand(other.to_string()),
        }
    } else {
        Input::Chat(trimmed.to_string())
    };
    Some(input)
}

fn default_empty_reply() -> String {
    "I could not generate a reply this time. Please try again.".to_string()
}

pub fn run() -> Result<(), String> {
    let args = Args::parse();
    let settings = Settings::load_global().merged_with_args(
        args.data_dir.as_deref(),
        args.model.as_deref(),
        args.mascot.as_deref(),
    );
    let api_key = settings.resolve_api_key()?;

    let runtime = tokio::runtime::Runtime::new().map_err(|err| err.to_string())?;
    runtime.block_on(chat_loop(settings, api_key))
}

async fn chat_loop(settings: Settings, api_key: String) -> Result<(), String> {
    render::mascot_banner(&settings.mascot_path());
    render::title();

    let mut rl: Editor<CliHelper, DefaultHistory> =
        Editor::new().map_err(|err| err.to_string())?;
    rl.set_helper(Some(CliHelper::new(&SLASH_COMMANDS)));

    let mut session = Session::new();
    log::info!(
        "session {} started, model {}, data folder {}",
        session.id(),
        settings.chat_model(),
        settings.data_dir().display()
    );

    // The chat phase is gated on a name.
    loop {
        match rl.readline("Your name: ") {
            Ok(line) => {
                if session.set_username(&line) {
                    break;
                }
                render::info("A name is required to start the chat.");
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                render::goodbye();
                return Ok(());
            }
            Err(err) => return Err(err.to_string()),
        }
    }
    let username = session.username().unwrap_or_default().to_string();
    render::greeting(&username);

    let mut store = DocumentStore::new(settings.data_dir());
    let llm: Arc<dyn LlmPort> = Arc::new(ChatLlmAdapter::new());

    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let Some(input) = classify(&line) else {
                    continue;
                };
                let _ = rl.add_history_entry(&line);

                match input {
                    Input::Command(SlashCommand::Quit) => {
                        render::goodbye();
                        break;
                    }
                    Input::Command(SlashCommand::Help) => render::help(),
                    Input::Command(SlashCommand::History) => render::replay(session.history()),
                    Input::Command(SlashCommand::Reload) => {
                        store.invalidate();
                        render::info("Document folder will be rescanned on the next question.");
                    }
                    Input::UnknownCommand(command) => {
                        render::info(&format!("Unknown command: {command}. Try /help."));
                    }
                    Input::Chat(question) => {
                        let outcome = run_turn(
                            &mut session,
                            &mut store,
                            &settings,
                            &api_key,
                            llm.clone(),
                            &question,
                        )
                        .await;
                        if let Err(err) = outcome {
                            log::warn!("turn failed: {err}");
                            render::error_line(&err);
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                render::goodbye();
                break;
            }
            Err(err) => return Err(err.to_string()),
        }
    }

    Ok(())
}

/// One question answered: compose the prompt from the recent history and
/// the (cached) document aggregate, stream the reply to the terminal,
/// append both turns, chart the reply's numeric tokens when there are at
/// least two. A failed turn leaves the history untouched.
async fn run_turn(
    session: &mut Session,
    store: &mut DocumentStore,
    settings: &Settings,
    api_key: &str,
    llm: Arc<dyn LlmPort>,
    question: &str,
) -> Result<(), String> {
    let username = session
        .username()
        .ok_or_else(|| "no username set for this session".to_string())?
        .to_string();
    let recent_history = session.recent_window(RECENT_WINDOW);
    let document_text = store.load().map(ToOwned::to_owned);

    let composed = compose_prompt(&PromptContext {
        username: &username,
        question,
        recent_history: &recent_history,
        document_text: document_text.as_deref(),
    });
    log::info!(
        "session {} turn: model={} grounded={} policy={} fingerprint={}",
        session.id(),
        settings.chat_model(),
        document_text.is_some(),
        composed.version,
        composed.fingerprint
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let request = GenerateRequest {
        api_key: api_key.to_string(),
        provider: settings.chat_provider(),
        model: settings.chat_model(),
        prompt: composed.prompt,
        tx,
    };
    let worker = tokio::spawn(async move { llm.generate(request).await });

    render::assistant_prefix();
    let mut reply = String::new();
    let mut stream_error: Option<String> = None;
    while let Some(event) = rx.recv().await {
        match event {
            StreamEvent::Text(text) => {
                reply.push_str(&text);
                render::stream_chunk(&text);
            }
            StreamEvent::Usage(usage) => {
                log::info!(
                    "token usage: input={:?} output={:?} total={:?}",
                    usage.input_tokens,
                    usage.output_tokens,
                    usage.total_tokens
                );
            }
            StreamEvent::Done => break,
            StreamEvent::Error(message) => {
                stream_error = Some(message);
                break;
            }
        }
    }

    let outcome = worker.await.map_err(|err| err.to_string())?;

    let mut reply = reply.trim().to_string();
    if reply.is_empty() && stream_error.is_none() && outcome.is_ok() {
        reply = default_empty_reply();
        render::stream_chunk(&reply);
    }
    render::end_stream();

    outcome.map_err(|err| err.to_string())?;
    if let Some(message) = stream_error {
        return Err(message);
    }

    session.record(Role::User, question);
    session.record(Role::Assistant, reply.clone());

    if let Some(series) = chartable_series(&reply) {
        render::chart(&series);
    }

    Ok(())
}
