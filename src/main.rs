use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use todo_client::cli::{Cli, Commands};
use todo_client::config::Config;
use todo_client::logging;
use todo_client::model::Model;
use todo_client::models::Note;
use todo_client::ui::run_tui;

fn print_note(note: &Note) {
    let status = if note.is_finished { "x" } else { " " };
    println!("[{}] {} | Priority: {} | {}", status, note.id, note.priority, note.value);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?.with_overrides(cli.base_url, cli.identity);

    match cli.command {
        None | Some(Commands::Tui) => {
            logging::init_file(&config.log_level, &config.log_path())?;
            run_tui(config)?;
        }
        Some(Commands::Completions { shell }) => {
            use clap_complete::{generate, Shell};
            let shell = shell.to_lowercase();
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "elvish" => Shell::Elvish,
                "powershell" => Shell::PowerShell,
                _ => {
                    println!("Unsupported shell: {}", shell);
                    return Ok(());
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "todo", &mut std::io::stdout());
        }
        Some(command) => {
            logging::init_stderr(&config.log_level);
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_command(&config, command))?;
        }
    }

    Ok(())
}

async fn run_command(config: &Config, command: Commands) -> Result<()> {
    let mut model = Model::new(config).context("Failed to build HTTP client")?;

    match command {
        Commands::List => {
            let notes = model.get_notes().await.context("Failed to fetch notes")?;
            if notes.is_empty() {
                println!("No notes yet.");
            }
            for note in &notes {
                print_note(note);
            }
        }
        Commands::Add { text, priority } => {
            let text = text.trim();
            if text.is_empty() {
                println!("Error: note text is empty.");
                return Ok(());
            }
            model.authenticate().await.context("Failed to log in")?;
            let note = model.create_note(text, priority).await.context("Failed to create note")?;
            print_note(&note);
        }
        Commands::Edit { id, text, priority } => {
            let priority = match priority {
                Some(priority) => priority,
                None => {
                    let notes = model.get_notes().await.context("Failed to fetch notes")?;
                    match notes.iter().find(|note| note.id == id) {
                        Some(note) => note.priority,
                        None => {
                            println!("Note '{}' not found.", id);
                            return Ok(());
                        }
                    }
                }
            };
            if model.session().is_none() {
                model.authenticate().await.context("Failed to log in")?;
            }
            model
                .edit_note_text(&id, &text, priority)
                .await
                .context("Failed to edit note")?;
            println!("Note '{}' updated", id);
        }
        Commands::Delete { id } => {
            model.authenticate().await.context("Failed to log in")?;
            model.delete_note(&id).await.context("Failed to delete note")?;
            println!("Note '{}' deleted", id);
        }
        Commands::Toggle { id } => {
            model.authenticate().await.context("Failed to log in")?;
            model.change_note_status(&id).await.context("Failed to toggle note")?;
            println!("Note '{}' status toggled", id);
        }
        Commands::Tui | Commands::Completions { .. } => {}
    }

    Ok(())
}
