//! caBuddy terminal chat client.
//!
//! Run with: `cargo run`
//!
//! The view layer: renders the active conversation, reads input lines and
//! delegates every mutation to the conversation store. Plain lines are
//! sent to the backend; `/`-prefixed lines are commands (`/help` lists
//! them). Logging goes to stderr so the chat output stays clean.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use colored::Colorize;

use cabuddy::chat::{ChatConfig, ConversationStore, HttpChatBackend, LocalStore, Role};
use cabuddy::render::ResponseRenderer;

/// Shown when the active chat has no messages yet.
const WELCOME_MESSAGE: &str = "Accounting Buddy";

/// Disclaimer carried over from the web client.
const BOTTOM_INFO: &str =
    "This app may provide inaccurate info; verify responses. Your privacy matters.";

/// Spinner animation shown while a send is in flight.
const SPINNER_FRAMES: [char; 4] = ['|', '/', '-', '\\'];
const SPINNER_TICK: Duration = Duration::from_millis(120);

type Store = ConversationStore<HttpChatBackend>;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("{} {err:#}", "Error:".red());
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> anyhow::Result<()> {
    let config = ChatConfig::default();
    let persist = LocalStore::open(&config.data_dir)
        .with_context(|| format!("opening state directory {}", config.data_dir.display()))?;
    let backend = HttpChatBackend::new(&config).context("building HTTP client")?;
    let renderer = ResponseRenderer::new().context("compiling response patterns")?;
    let mut store = ConversationStore::new(backend, persist);

    print_banner();
    render_chat(&store, &renderer);
    print_prompt(&store);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let input = line.trim();
        if input.is_empty() {
            print_prompt(&store);
            continue;
        }
        if !handle_input(&mut store, &renderer, input) {
            break;
        }
        print_prompt(&store);
    }

    Ok(())
}

/// Dispatch one input line. Returns `false` when the user asked to quit.
fn handle_input(store: &mut Store, renderer: &ResponseRenderer, input: &str) -> bool {
    match input {
        "/quit" | "/exit" => return false,
        "/help" => print_help(),
        "/new" => {
            store.new_chat();
            render_chat(store, renderer);
        }
        "/list" => render_chat_list(store),
        _ => {
            if let Some(rest) = input.strip_prefix("/switch") {
                match rest.trim().parse() {
                    Ok(id) => {
                        store.switch_chat(id);
                        render_chat(store, renderer);
                    }
                    Err(_) => println!("{}", "Usage: /switch <chat id>".yellow()),
                }
            } else if let Some(rest) = input.strip_prefix("/delete") {
                let rest = rest.trim();
                let id = if rest.is_empty() {
                    Some(store.current_chat_id())
                } else {
                    rest.parse().ok()
                };
                match id {
                    Some(id) => {
                        store.delete_chat(id);
                        render_chat(store, renderer);
                    }
                    None => println!("{}", "Usage: /delete [chat id]".yellow()),
                }
            } else if input.starts_with('/') {
                println!("{}", "Unknown command; try /help".yellow());
            } else {
                send_with_spinner(store, input);
                render_chat(store, renderer);
            }
        }
    }
    true
}

/// Run the blocking send while a spinner animates on the same line.
fn send_with_spinner(store: &mut Store, text: &str) {
    let waiting = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&waiting);
    let spinner = thread::spawn(move || {
        let mut frame = 0;
        while flag.load(Ordering::Relaxed) {
            print!("\r{} waiting...", SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]);
            let _ = io::stdout().flush();
            frame += 1;
            thread::sleep(SPINNER_TICK);
        }
        print!("\r              \r");
        let _ = io::stdout().flush();
    });

    store.send(text);

    waiting.store(false, Ordering::Relaxed);
    let _ = spinner.join();
}

/// Re-render the active conversation, mirroring the web client: error
/// first, then the message history, or the welcome line for an empty chat.
fn render_chat(store: &Store, renderer: &ResponseRenderer) {
    println!();
    if let Some(error) = store.last_error() {
        println!("{}", error.red());
        println!();
    }

    let messages = store.current_messages();
    if messages.is_empty() && store.last_error().is_none() {
        println!("{}", WELCOME_MESSAGE.bold());
        println!();
        return;
    }

    for message in messages {
        match message.role {
            Role::User => println!("{} {}", "you:".green().bold(), message.content),
            Role::Assistant => {
                println!("{}", "buddy:".blue().bold());
                println!("{}", renderer.render(&message.content));
            }
        }
        println!();
    }
}

/// List chats most recent first, with the active one marked.
fn render_chat_list(store: &Store) {
    println!();
    println!("{}", "Recent Chats".bold());
    let ids = store.recent_chat_ids();
    if ids.is_empty() {
        println!("  (none yet)");
    }
    for id in ids {
        let marker = if id == store.current_chat_id() { "*" } else { " " };
        println!(" {marker} [{id}] {}", store.chat_title(id));
    }
    println!();
}

fn print_prompt(store: &Store) {
    print!("{} ", format!("[chat {}]>", store.current_chat_id()).dimmed());
    let _ = io::stdout().flush();
}

fn print_banner() {
    println!();
    println!("  ╔═══════════════════════════════════════════╗");
    println!("  ║        caBuddy - Accounting Buddy         ║");
    println!("  ╚═══════════════════════════════════════════╝");
    println!();
    println!("  {}", BOTTOM_INFO.dimmed());
    println!("  Type a message to chat, or /help for commands.");
}

fn print_help() {
    println!();
    println!("  /new           start a new chat");
    println!("  /list          list chats, most recent first");
    println!("  /switch <id>   make a chat active");
    println!("  /delete [id]   delete a chat (default: current)");
    println!("  /quit          exit");
    println!();
}
