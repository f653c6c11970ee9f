use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::sync::Arc;

use crate::database::Database;
use crate::knowledge_base::IndexStats;
use crate::llm::assistant::{farewell, greeting, Assistant};
use crate::providers::utils::count_tokens;

mod document;
mod system;

pub use document::print_documents;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    Exit,
}

pub struct CommandHandler {
    assistant: Arc<Assistant>,
    db: Option<Database>,
    stats: Arc<IndexStats>,
    name: String,
}

impl CommandHandler {
    pub fn new(assistant: Arc<Assistant>, db: Option<Database>, stats: Arc<IndexStats>, name: String) -> Self {
        Self {
            assistant,
            db,
            stats,
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn handle_command(&mut self, input: &str) -> Result<CommandOutcome, String> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(CommandOutcome::Continue);
        }

        match input.to_lowercase().as_str() {
            "exit" | "quit" => {
                println!("{}", farewell(&self.name).bright_green());
                return Ok(CommandOutcome::Exit);
            }
            "help" => {
                system::print_help();
                return Ok(CommandOutcome::Continue);
            }
            "docs" | "documents" => {
                print_documents(&self.stats);
                return Ok(CommandOutcome::Continue);
            }
            "history" => {
                self.show_history().await?;
                return Ok(CommandOutcome::Continue);
            }
            _ => {}
        }

        self.handle_chat(input).await?;
        Ok(CommandOutcome::Continue)
    }

    async fn handle_chat(&mut self, input: &str) -> Result<(), String> {
        let input_tokens = count_tokens(input);
        println!("📥 Input tokens: {}", input_tokens.to_string().cyan());

        let response = self
            .assistant
            .handle_user_input(input)
            .await
            .map_err(|e| format!("Failed to get AI response: {}", e))?;

        if let Some(db) = &self.db {
            if let Err(e) = db
                .save_conversation(self.name.clone(), String::new(), input.to_string(), response.clone())
                .await
            {
                log::warn!("Failed to save conversation to database: {}", e);
            }
        }

        self.print_response(&response, input_tokens, count_tokens(&response));
        Ok(())
    }

    async fn show_history(&self) -> Result<(), String> {
        let Some(db) = &self.db else {
            println!("Conversation history is not available.");
            return Ok(());
        };

        let records = db
            .get_recent_conversations(10)
            .await
            .map_err(|e| format!("Failed to load history: {}", e))?;

        if records.is_empty() {
            println!("No conversations yet.");
            return Ok(());
        }
        for record in records.iter().rev() {
            println!("{} {}", record.timestamp.dimmed(), record.name.bright_yellow());
            println!("  Q: {}", record.question);
            println!("  A: {}", record.answer.truecolor(255, 236, 179));
        }
        Ok(())
    }

    fn print_response(&self, response: &str, input_tokens: usize, response_tokens: usize) {
        println!("{}", response.truecolor(255, 236, 179));

        println!(
            "\n📊 Tokens: 📥 Input: {} | 📤 Response: {} | 📈 Total: {}",
            input_tokens.to_string().cyan(),
            response_tokens.to_string().cyan(),
            (input_tokens + response_tokens).to_string().cyan()
        );
        println!();
    }
}

/// Runs the console loop until the user leaves.
pub async fn run_repl(mut handler: CommandHandler) -> Result<(), ReadlineError> {
    println!("{}", greeting(handler.name()).bright_cyan());
    system::print_help();

    let mut rl = Editor::<(), DefaultHistory>::new()?;

    loop {
        match rl.readline("👤 ") {
            Ok(line) => {
                let input = line.trim();
                if !input.is_empty() {
                    let _ = rl.add_history_entry(input);
                }

                match handler.handle_command(input).await {
                    Ok(CommandOutcome::Exit) => break,
                    Ok(CommandOutcome::Continue) => {}
                    Err(e) => println!("{}", e.red()),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("{}", farewell(handler.name()).bright_green());
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    Ok(())
}
