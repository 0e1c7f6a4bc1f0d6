use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::ApiError;
use crate::model::Model;
use crate::models::Priority;
use crate::view::{Action, View};

/// Work queued by view handlers, run in dispatch order
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Add,
    Delete(String),
    Edit { id: String, text: String, priority: Priority },
    Toggle(String),
}

pub struct Controller {
    model: Model,
    view: View,
    commands: UnboundedReceiver<Command>,
    rollback_on_failure: bool,
}

impl Controller {
    /// Wires the view handlers, then loads and renders the existing notes.
    /// A failed load is logged and leaves the list empty.
    pub async fn new(model: Model, view: View, rollback_on_failure: bool) -> Self {
        let (sender, commands) = mpsc::unbounded_channel();
        let mut controller = Controller {
            model,
            view,
            commands,
            rollback_on_failure,
        };
        controller.register_handlers(sender);
        controller.load().await;
        controller
    }

    fn register_handlers(&mut self, sender: UnboundedSender<Command>) {
        let add = sender.clone();
        self.view.add_note_handler(move || {
            let _ = add.send(Command::Add);
        });

        let delete = sender.clone();
        self.view.delete_note_handler(move |id| {
            let _ = delete.send(Command::Delete(id.to_string()));
        });

        let edit = sender.clone();
        self.view.edit_note_handler(move |id, text, priority| {
            let _ = edit.send(Command::Edit {
                id: id.to_string(),
                text: text.to_string(),
                priority,
            });
        });

        self.view.change_status_handler(move |id| {
            let _ = sender.send(Command::Toggle(id.to_string()));
        });
    }

    async fn load(&mut self) {
        match self.model.get_notes().await {
            Ok(notes) => {
                log::info!("Loaded {} notes", notes.len());
                self.view.display_notes(&notes);
            }
            Err(err) => log::warn!("Failed to load notes: {}", err),
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut View {
        &mut self.view
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn dispatch(&mut self, action: Action) {
        self.view.dispatch(action);
    }

    /// Dispatches and then runs whatever the handlers queued
    pub async fn handle_action(&mut self, action: Action) {
        self.dispatch(action);
        self.process_pending().await;
    }

    pub async fn process_pending(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            self.run(command).await;
        }
    }

    async fn run(&mut self, command: Command) {
        match command {
            Command::Add => {
                if let Err(err) = self.handle_add_note().await {
                    log::warn!("Failed to create note: {}", err);
                }
            }
            Command::Delete(id) => {
                let result = self.model.delete_note(&id).await.map(|_| ());
                self.settle("delete", &id, result);
            }
            Command::Edit { id, text, priority } => {
                let result = self.model.edit_note_text(&id, &text, priority).await.map(|_| ());
                self.settle("edit", &id, result);
            }
            Command::Toggle(id) => {
                let result = self.model.change_note_status(&id).await;
                self.settle("toggle", &id, result);
            }
        }
    }

    /// Blank input sends nothing. The input is cleared before the request,
    /// so a failed create leaves it empty with no node appended.
    pub async fn handle_add_note(&mut self) -> Result<(), ApiError> {
        let text = self.view.get_note_input();
        if text.is_empty() {
            return Ok(());
        }

        self.view.clear_note_input();

        let note = self.model.create_note(&text, Priority::default()).await?;
        self.view.add_note_node(&text, &note.id, note.is_finished, note.priority);
        Ok(())
    }

    fn settle(&mut self, operation: &str, id: &str, result: Result<(), ApiError>) {
        match result {
            Ok(()) => {
                self.view.confirm_pending();
            }
            // The server accepted the change; only its reply was unreadable
            Err(err @ ApiError::Decode { .. }) => {
                log::warn!("Unexpected reply to {} of note {}: {}", operation, id, err);
                self.view.confirm_pending();
            }
            Err(err) => {
                log::warn!("Failed to {} note {}: {}", operation, id, err);
                if self.rollback_on_failure {
                    self.view.revert_pending();
                } else {
                    self.view.confirm_pending();
                }
            }
        }
    }
}
