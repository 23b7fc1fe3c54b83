//! `datalens ask`: Single-question or interactive analysis mode.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use datalens_chat::{ConversationStore, PipelineSettings, QueryPipeline, QueryResult};
use datalens_core::message::SessionId;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{CommandResult, load_config};

pub async fn run(
    config_path: Option<&Path>,
    message: Option<String>,
    session: Option<String>,
    provider: Option<String>,
) -> CommandResult {
    let config = load_config(config_path)?;

    let registry = Arc::new(datalens_providers::build_from_config(&config));
    let provider = provider.unwrap_or_else(|| registry.default_name().to_string());
    // Fail fast on a typo before prompting
    registry.resolve(&provider)?;

    let pipeline = QueryPipeline::new(
        registry,
        Arc::new(ConversationStore::new(config.history_window)),
        PipelineSettings::from_config(&config),
    );
    let session = session.map(SessionId::from).unwrap_or_else(SessionId::generate);

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let result = pipeline.process(&session, &msg, &provider).await;
        eprint!("\r              \r");
        print_result(&result?);
        return Ok(());
    }

    println!();
    println!("  DataLens: Interactive Analysis");
    println!();
    println!("  Provider:  {provider}");
    println!("  Session:   {session}");
    println!("  Window:    {} messages", pipeline.store().window());
    println!();
    println!("  Type your question and press Enter.");
    println!("  '/clear' forgets the conversation, 'exit' quits.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => {}
            "exit" | "quit" => break,
            "/clear" => {
                pipeline.store().clear(&session).await;
                println!("  (conversation cleared)");
                println!();
            }
            query => {
                eprint!("  ...");
                let result = pipeline.process(&session, query, &provider).await;
                eprint!("\r     \r");
                match result {
                    Ok(result) => print_result(&result),
                    Err(e) => {
                        eprintln!("  [Error] {e}");
                        println!();
                    }
                }
            }
        }
        prompt()?;
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

fn print_result(result: &QueryResult) {
    println!();
    for line in result.response_text.lines() {
        println!("  DataLens > {line}");
    }
    if !result.suggested_questions.is_empty() {
        println!();
        println!("  Suggested follow-ups:");
        for (i, q) in result.suggested_questions.iter().enumerate() {
            println!("    {}. {q}", i + 1);
        }
    }
    println!();
}
