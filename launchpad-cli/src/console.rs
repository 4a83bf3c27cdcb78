use anyhow::Result;
use futures::StreamExt;
use launchpad_core::Content;
use launchpad_runner::{Runner, ensure_session};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

/// Interactive chat with the runner's agent in a fresh session.
pub async fn run_console(runner: Runner, user_id: String) -> Result<()> {
    let session_id = format!("console-{}", std::process::id());
    ensure_session(runner.session_service().as_ref(), runner.app_name(), &user_id, &session_id)
        .await?;

    let mut rl = DefaultEditor::new()?;

    println!("Launchpad Console");
    println!("Agent: {}", runner.root_agent().name());
    println!("Type your message and press Enter. Ctrl+C to exit.\n");

    loop {
        match rl.readline("User -> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                print!("\nAgent -> ");
                let mut events =
                    runner.run(user_id.clone(), session_id.clone(), Content::user(line)).await?;

                while let Some(event) = events.next().await {
                    match event {
                        Ok(event) => {
                            // Tool results are for the model, not the user.
                            let Some(content) = event.content.filter(|c| c.role == "model") else {
                                continue;
                            };
                            if let Some(text) = content.text() {
                                print!("{text}");
                            }
                        }
                        Err(e) => eprintln!("\nError: {e}"),
                    }
                }
                println!("\n");
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("Bye.");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    Ok(())
}
