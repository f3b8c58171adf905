//! Chat command handler.
//!
//! Interactive multi-turn loop. The session history lives here, in the
//! driver: the pipeline itself stays stateless between turns.

use crate::commands::build_pipeline;
use clap::Args;
use docpilot_agent::Session;
use docpilot_core::{config::Mode, AppConfig, AppResult};
use std::io::{BufRead, Write};

/// Interactive multi-turn chat
#[derive(Args, Debug)]
pub struct ChatCommand {}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Starting chat session (mode={})", config.mode);

        let pipeline = build_pipeline(config)?;
        let mut session = Session::new();
        let mut mode = config.mode;

        println!("docpilot chat ({} mode). Type 'help' for commands.", mode);

        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();

        loop {
            print!("> ");
            stdout.flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }

            let query = line.trim();
            if query.is_empty() {
                continue;
            }
            if matches!(query, "exit" | "quit") {
                break;
            }
            if query == "help" {
                println!("Commands:");
                println!("  help                  show this message");
                println!("  mode                  show the current mode");
                println!("  mode offline|online   switch mode for following turns");
                println!("  exit | quit           leave the chat");
                continue;
            }
            if query == "mode" {
                println!("Current mode: {}", mode);
                continue;
            }
            if let Some(requested) = query.strip_prefix("mode ") {
                match Mode::parse(requested.trim()) {
                    Ok(new_mode) => {
                        if new_mode == Mode::Online && config.tavily_api_key.is_none() {
                            println!(
                                "Online mode needs TAVILY_API_KEY; web turns will fall back to local evidence."
                            );
                        }
                        mode = new_mode;
                        println!("Switched to {} mode", mode);
                    }
                    Err(e) => println!("{}", e),
                }
                continue;
            }

            match pipeline.answer(&session, query, mode).await {
                Ok(turn) => {
                    println!("\n{}\n", turn.answer.text);
                    if !turn.answer.sources.is_empty() {
                        println!("Sources: {}\n", turn.answer.sources.join(", "));
                    }
                    session.push(turn);
                }
                Err(e) => {
                    // A failed turn is reported but does not end the chat.
                    eprintln!("Error: {}\n", e);
                }
            }
        }

        tracing::info!("Chat session ended after {} turns", session.len());
        Ok(())
    }
}
