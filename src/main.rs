//! smartsum is a CLI tool that summarizes web pages, YouTube videos and PDFs
//! with an LLM, tailored to a teacher, student or kid, and turns the stored
//! summaries into slide decks, quizzes, mindmaps and narration scripts.
//!
//! Account commands (`register`, `login`, `reset-password`, `logout`) manage
//! users and sessions; every other command runs inside a session started by
//! `login`.

use std::fs;
use std::io;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Builder;
use llm::LLMProvider;
use llm::builder::{LLMBackend, LLMBuilder};
use log::{LevelFilter, error, info, warn};
use std::str::FromStr;
use url::Url;

use smartsum::{
    Role, Source, TextBy,
    artifact::{
        answer_question, generate_audio_script, generate_mindmap, generate_quiz, generate_slides,
    },
    auth,
    compose::{compose, compose_deck, compose_history, compose_mindmap_dot, write_output},
    constants::{DEFAULT_DB_PATH, MODEL_API_KEY_ENV_NAME, MODEL_TEMPERATURE},
    generate::{GenerateContext, build_rate_limiter},
    quiz_session::{QuizProgress, run_quiz, write_report},
    session::{self, ChatTurn, SessionContext, Speaker, write_chat},
    source::LoadOptions,
    storage::{Storage, SummaryRecord},
    summarize::summarize,
    translate::{LANGUAGES, language_code},
};
use scraper::Selector as ScraperSelector;

/// A CLI tool to summarize documents and study them with generated artifacts
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The command to execute
    #[command(subcommand)]
    command: Command,

    /// Path to database file holding accounts, sessions and history
    #[arg(long, global = true, default_value = DEFAULT_DB_PATH)]
    db: String,

    #[arg(long, short, action = clap::ArgAction::Count, help = "Output v(v...)erbosity: error (0), warn (1), info (2), debug (3), trace (4)", global = true, default_value_t = 2)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account
    Register {
        username: String,
        #[arg(long, short)]
        password: String,
        /// Password confirmation, must match the password
        #[arg(long, short)]
        confirm: String,
    },
    /// Start a session and print its id
    Login {
        username: String,
        #[arg(long, short)]
        password: String,
        /// Audience of the summaries: "student" (default), "teacher" or "kid"
        #[arg(long, short, default_value = "student")]
        role: Role,
        /// Output language, as a code ("fr") or a name ("French")
        #[arg(long, short, default_value = "en")]
        lang: String,
    },
    /// Set a new password for an existing account
    ResetPassword {
        username: String,
        #[arg(long, short)]
        password: String,
        #[arg(long, short)]
        confirm: String,
    },
    /// End a session
    Logout { session: String },
    /// List the supported output languages
    Languages,
    /// Summarize a web page, YouTube video or PDF file and store it in the history
    Summarize(SummarizeArgs),
    /// Show the summary history, newest first
    History {
        session: String,
        /// Write the history digest to this file instead of printing it
        #[arg(long, short)]
        output: Option<String>,
    },
    /// Delete a summary from the history
    Delete { session: String, id: i64 },
    /// Generate a slide deck from a stored summary
    Slides {
        session: String,
        model: String,
        id: i64,
        /// Write the Markdown deck to this file instead of printing it
        #[arg(long, short)]
        output: Option<String>,
        /// Print the parsed slides as JSON
        #[arg(long)]
        json: bool,
    },
    /// Take a three question quiz about a stored summary
    Quiz {
        session: String,
        model: String,
        id: i64,
        /// Generate new questions even if a quiz is in progress
        #[arg(long)]
        new: bool,
        /// Clear previous answers and take the same quiz again
        #[arg(long)]
        retake: bool,
    },
    /// Generate a mindmap from a stored summary
    Mindmap {
        session: String,
        model: String,
        id: i64,
        /// Write the Graphviz graph to this file instead of printing it
        #[arg(long, short)]
        output: Option<String>,
        /// Print the parsed mindmap as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a short narration script from a stored summary
    AudioScript {
        session: String,
        model: String,
        id: i64,
        #[arg(long, short)]
        output: Option<String>,
    },
    /// Show the conversation about a stored summary and ask a new question
    Chat {
        session: String,
        model: String,
        id: i64,
        /// Question to ask; without one only the conversation so far is shown
        question: Option<String>,
    },
}

#[derive(Args)]
struct SummarizeArgs {
    session: String,
    /// URL of the LLM model to use for processing
    model: String,
    /// URL or path of the PDF to summarize
    source: String,
    /// Path to the file with a prompt template
    #[arg(long, short = 'p')]
    prompt_file: Option<String>,
    /// Text extraction method: "dom_smoothie" (default) or "fast_html2md"
    #[arg(long, default_value = "dom_smoothie")]
    text_by: TextBy,
    /// CSS selector to limit the HTML subset from which content is extracted (optional)
    #[arg(long, short)]
    selector: Option<String>,
    /// Rate limit: requests per minute (default: no limit)
    #[arg(long, short = 'r')]
    rpm: Option<u32>,
    /// Also write the summary to this file
    #[arg(long, short)]
    output: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            3 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .init();

    let storage = Storage::new(&cli.db)?;

    match cli.command {
        Command::Register {
            username,
            password,
            confirm,
        } => {
            auth::register(&storage, &username, &password, &confirm)?;
            println!("Account created successfully! You can now log in.");
            Ok(())
        }
        Command::Login {
            username,
            password,
            role,
            lang,
        } => handle_login_command(&storage, &username, &password, role, &lang),
        Command::ResetPassword {
            username,
            password,
            confirm,
        } => {
            auth::reset_password(&storage, &username, &password, &confirm)?;
            println!("Password has been reset successfully! You can now log in with your new password.");
            Ok(())
        }
        Command::Logout { session } => {
            if !session::expire(&storage, &session)? {
                warn!("Session {session} was not active");
            }
            Ok(())
        }
        Command::Languages => {
            for (name, code) in LANGUAGES {
                println!("{code}\t{name}");
            }
            Ok(())
        }
        Command::Summarize(args) => handle_summarize_command(&storage, args).await,
        Command::History { session, output } => handle_history_command(&storage, &session, output),
        Command::Delete { session, id } => handle_delete_command(&storage, &session, id),
        Command::Slides {
            session,
            model,
            id,
            output,
            json,
        } => handle_slides_command(&storage, &session, &model, id, output, json).await,
        Command::Quiz {
            session,
            model,
            id,
            new,
            retake,
        } => handle_quiz_command(&storage, &session, &model, id, new, retake).await,
        Command::Mindmap {
            session,
            model,
            id,
            output,
            json,
        } => handle_mindmap_command(&storage, &session, &model, id, output, json).await,
        Command::AudioScript {
            session,
            model,
            id,
            output,
        } => handle_audio_command(&storage, &session, &model, id, output).await,
        Command::Chat {
            session,
            model,
            id,
            question,
        } => handle_chat_command(&storage, &session, &model, id, question.as_deref()).await,
    }
}

fn handle_login_command(
    storage: &Storage,
    username: &str,
    password: &str,
    role: Role,
    lang: &str,
) -> Result<()> {
    let language = language_code(lang).with_context(|| {
        format!("Unsupported language: {lang}. Run `smartsum languages` for the list.")
    })?;

    let username = username.trim();
    auth::verify(storage, username, password)?;
    let session = session::create(storage, username, role, language)?;

    info!("Welcome, {username}! Pass the session id below to the other commands.");
    println!("{}", session.id);
    Ok(())
}

fn build_model(model: &str) -> Result<Box<dyn LLMProvider>> {
    let model_url = Url::parse(model).map_err(|e| anyhow::anyhow!("Invalid model URL: {}", e))?;
    let llm_builder = LLMBuilder::new()
        .backend(
            LLMBackend::from_str(model_url.scheme())
                .map_err(|e| anyhow::anyhow!("Invalid LLM backend: {}", e))?,
        )
        .model(
            [
                model_url
                    .host_str()
                    .context("Specify model name as host URL.")?,
                model_url.username(),
            ]
            .iter()
            .filter(|x| !x.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(":"),
        )
        .temperature(MODEL_TEMPERATURE);

    let llm_builder = match std::env::var(MODEL_API_KEY_ENV_NAME) {
        Ok(model_key) => {
            info!("API key is provided via {MODEL_API_KEY_ENV_NAME}");
            llm_builder.api_key(model_key)
        }
        Err(err) => {
            info!("{err} while providing api key");
            llm_builder
        }
    };

    llm_builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build LLM model: {}", e))
}

async fn handle_summarize_command(storage: &Storage, args: SummarizeArgs) -> Result<()> {
    let session = session::read(storage, &args.session)?;
    let source = Source::parse(&args.source)?;
    let selector = match args.selector {
        Some(selector_query) => Some(
            ScraperSelector::parse(&selector_query)
                .map_err(|e| anyhow::anyhow!("Invalid CSS selector: {}", e))?,
        ),
        None => None,
    };
    let prompt_template = match args.prompt_file {
        Some(file) => {
            let content =
                fs::read_to_string(&file).context(format!("Failed to read prompt file: {file}"))?;
            Some(content)
        }
        None => None,
    };

    let model = build_model(&args.model)?;
    let rate_limiter = build_rate_limiter(args.rpm);
    let ctx = GenerateContext {
        model: model.as_ref(),
        rate_limiter: rate_limiter.as_ref(),
    };
    let options = LoadOptions {
        text_by: args.text_by,
        selector,
    };

    let stored = match summarize(
        storage,
        &ctx,
        &session,
        &source,
        &options,
        prompt_template.as_deref(),
    )
    .await
    {
        Ok(stored) => stored,
        Err(err) => {
            error!("Summarization failed: {err:#}");
            return Ok(());
        }
    };

    if let Some(title) = &stored.title {
        println!("# {title}\n");
    }
    println!("{}", stored.summary);
    info!("Saved as summary #{}", stored.id);

    if let Some(output) = args.output {
        write_output(&output, &stored.summary)?;
        info!("Summary written to {output}");
    }
    Ok(())
}

fn handle_history_command(storage: &Storage, session_id: &str, output: Option<String>) -> Result<()> {
    let session = session::read(storage, session_id)?;
    if let Some(output) = output {
        compose(storage, &session.username, &output)?;
        return Ok(());
    }

    let records = storage.list_summaries(&session.username)?;
    if records.is_empty() {
        info!("No history yet.");
    }
    print!("{}", compose_history(&records));
    Ok(())
}

fn handle_delete_command(storage: &Storage, session_id: &str, id: i64) -> Result<()> {
    let mut session = session::read(storage, session_id)?;
    if storage.delete_summary(&session.username, id)? {
        session.forget_summary(id);
        session::update(storage, &session)?;
        info!("Deleted summary #{id}");
    } else {
        warn!("Summary #{id} is not in {}'s history", session.username);
    }
    Ok(())
}

/// Resolves the session and the summary the artifact is generated from.
fn load_summary(storage: &Storage, session_id: &str, id: i64) -> Result<(SessionContext, SummaryRecord)> {
    let session = session::read(storage, session_id)?;
    let record = storage
        .get_summary(&session.username, id)?
        .with_context(|| format!("Summary #{id} is not in {}'s history", session.username))?;
    Ok((session, record))
}

fn print_or_write(output: Option<String>, content: &str) -> Result<()> {
    match output {
        Some(output) => {
            write_output(&output, content)?;
            info!("Written to {output}");
        }
        None => print!("{content}"),
    }
    Ok(())
}

async fn handle_slides_command(
    storage: &Storage,
    session_id: &str,
    model: &str,
    id: i64,
    output: Option<String>,
    json: bool,
) -> Result<()> {
    let (_, record) = load_summary(storage, session_id, id)?;
    let model = build_model(model)?;
    let ctx = GenerateContext {
        model: model.as_ref(),
        rate_limiter: None,
    };

    let slides = match generate_slides(&ctx, &record.summary).await {
        Ok(slides) => slides,
        Err(err) => {
            error!("Slide generation failed: {err:#}");
            return Ok(());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&slides)?);
        return Ok(());
    }
    match compose_deck(&slides) {
        Ok(deck) => print_or_write(output, &deck),
        Err(err) => {
            error!("{err}");
            Ok(())
        }
    }
}

async fn handle_quiz_command(
    storage: &Storage,
    session_id: &str,
    model: &str,
    id: i64,
    new: bool,
    retake: bool,
) -> Result<()> {
    let (mut session, record) = load_summary(storage, session_id, id)?;

    let mut progress = match session.quizzes.remove(&id) {
        Some(progress) if !new => progress,
        _ => {
            let model = build_model(model)?;
            let ctx = GenerateContext {
                model: model.as_ref(),
                rate_limiter: None,
            };
            match generate_quiz(&ctx, &record.summary).await {
                Ok(questions) if !questions.is_empty() => QuizProgress::new(questions),
                Ok(_) => {
                    error!("Quiz generation produced no usable questions");
                    return Ok(());
                }
                Err(err) => {
                    error!("Quiz generation failed: {err:#}");
                    return Ok(());
                }
            }
        }
    };

    if progress.submitted && retake {
        progress.retake();
    }

    let mut stdout = io::stdout();
    if let Some(report) = progress.report() {
        write_report(&report, &mut stdout)?;
        info!("Quiz already submitted; pass --retake to answer it again or --new for new questions");
    } else if run_quiz(&mut progress, &mut io::stdin().lock(), &mut stdout)?.is_none() {
        warn!("Input ended, answers so far are kept for the next run");
    }

    session.quizzes.insert(id, progress);
    session::update(storage, &session)
}

async fn handle_mindmap_command(
    storage: &Storage,
    session_id: &str,
    model: &str,
    id: i64,
    output: Option<String>,
    json: bool,
) -> Result<()> {
    let (_, record) = load_summary(storage, session_id, id)?;
    let model = build_model(model)?;
    let ctx = GenerateContext {
        model: model.as_ref(),
        rate_limiter: None,
    };

    let map = match generate_mindmap(&ctx, &record.summary).await {
        Ok(map) => map,
        Err(err) => {
            error!("Mindmap generation failed: {err:#}");
            return Ok(());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }
    match compose_mindmap_dot(&map) {
        Ok(dot) => print_or_write(output, &dot),
        Err(err) => {
            error!("{err}");
            Ok(())
        }
    }
}

async fn handle_audio_command(
    storage: &Storage,
    session_id: &str,
    model: &str,
    id: i64,
    output: Option<String>,
) -> Result<()> {
    let (_, record) = load_summary(storage, session_id, id)?;
    let model = build_model(model)?;
    let ctx = GenerateContext {
        model: model.as_ref(),
        rate_limiter: None,
    };

    match generate_audio_script(&ctx, &record.summary).await {
        Ok(script) => print_or_write(output, &format!("{script}\n")),
        Err(err) => {
            error!("Audio script generation failed: {err:#}");
            Ok(())
        }
    }
}

async fn handle_chat_command(
    storage: &Storage,
    session_id: &str,
    model: &str,
    id: i64,
    question: Option<&str>,
) -> Result<()> {
    let (mut session, record) = load_summary(storage, session_id, id)?;
    write_chat(session.chat(id), &mut io::stdout())?;

    let Some(question) = question else {
        if session.chat(id).is_empty() {
            info!("No conversation about summary #{id} yet");
        }
        return Ok(());
    };

    let model = build_model(model)?;
    let ctx = GenerateContext {
        model: model.as_ref(),
        rate_limiter: None,
    };

    let answer = match answer_question(&ctx, &record.summary, question).await {
        Ok(answer) => answer,
        Err(err) => {
            error!("Chat answer failed: {err:#}");
            return Ok(());
        }
    };
    write_chat(
        &[
            ChatTurn::new(Speaker::User, question),
            ChatTurn::new(Speaker::Assistant, &answer),
        ],
        &mut io::stdout(),
    )?;

    session.push_chat(id, Speaker::User, question);
    session.push_chat(id, Speaker::Assistant, &answer);
    session::update(storage, &session)
}
