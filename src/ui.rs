use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::io;

use crate::config::Config;
use crate::controller::Controller;
use crate::editor::LineEditor;
use crate::model::Model;
use crate::models::{EditField, Focus, Priority};
use crate::view::{Action, NoteNode, View};

pub struct App {
    controller: Controller,
    pub focus: Focus,
    pub list_state: ListState,
    pub input_editor: LineEditor,
    /// Item whose editor is open, with the text being typed
    pub editing: Option<(String, LineEditor)>,
    pub edit_field: EditField,
    pub should_quit: bool,
}

impl App {
    pub fn new(controller: Controller) -> Self {
        let mut list_state = ListState::default();
        if !controller.view().notes().is_empty() {
            list_state.select(Some(0));
        }
        App {
            controller,
            focus: Focus::Input,
            list_state,
            input_editor: LineEditor::default(),
            editing: None,
            edit_field: EditField::Text,
            should_quit: false,
        }
    }

    pub fn view(&self) -> &View {
        self.controller.view()
    }

    fn selected_id(&self) -> Option<String> {
        self.list_state
            .selected()
            .and_then(|i| self.view().notes().get(i))
            .map(|node| node.id.clone())
    }

    fn clamp_selection(&mut self) {
        let len = self.view().notes().len();
        match self.list_state.selected() {
            _ if len == 0 => self.list_state.select(None),
            Some(i) if i >= len => self.list_state.select(Some(len - 1)),
            None => self.list_state.select(Some(0)),
            _ => {}
        }
    }

    pub fn next_item(&mut self) {
        let len = self.view().notes().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous_item(&mut self) {
        let len = self.view().notes().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => Focus::List,
            Focus::List => Focus::Input,
        };
    }

    async fn act(&mut self, action: Action) {
        self.controller.handle_action(action).await;
        // The add flow clears the input; keep the cursor field in step
        if self.input_editor.get_content() != self.view().note_input() {
            self.input_editor = LineEditor::new(self.view().note_input());
        }
        self.clamp_selection();
    }

    fn sync_input(&mut self) {
        let text = self.input_editor.get_content().to_string();
        self.controller.view_mut().set_note_input(text);
    }

    pub async fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.act(Action::Add).await,
            KeyCode::Char(c) => {
                self.input_editor.insert_char(c);
                self.sync_input();
            }
            KeyCode::Backspace => {
                self.input_editor.delete_char();
                self.sync_input();
            }
            KeyCode::Delete => {
                self.input_editor.delete_forward();
                self.sync_input();
            }
            KeyCode::Left => self.input_editor.move_cursor_left(),
            KeyCode::Right => self.input_editor.move_cursor_right(),
            KeyCode::Home => self.input_editor.move_to_start_of_line(),
            KeyCode::End => self.input_editor.move_to_end_of_line(),
            _ => {}
        }
    }

    pub async fn handle_list_key(&mut self, key: KeyEvent) {
        if self.editing.is_some() {
            self.handle_edit_key(key).await;
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Down => self.next_item(),
            KeyCode::Up => self.previous_item(),
            KeyCode::Char('e') => self.open_editor().await,
            KeyCode::Char(' ') => {
                if let Some(id) = self.selected_id() {
                    self.act(Action::ToggleStatus(id)).await;
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_id() {
                    self.act(Action::Delete(id)).await;
                }
            }
            _ => {}
        }
    }

    async fn open_editor(&mut self) {
        let Some(id) = self.selected_id() else { return };
        self.act(Action::Edit(id.clone())).await;
        if let Some(node) = self.view().node(&id).filter(|node| node.is_editing()) {
            let editor = LineEditor::new(node.edit_text.value.clone());
            self.editing = Some((id, editor));
            self.edit_field = EditField::Text;
        }
    }

    async fn handle_edit_key(&mut self, key: KeyEvent) {
        let Some((id, mut editor)) = self.editing.take() else { return };

        match (self.edit_field, key.code) {
            (_, KeyCode::Enter) => {
                self.act(Action::Save(id)).await;
                return;
            }
            (EditField::Text, KeyCode::Right) if editor.cursor() == editor.get_content().chars().count() => {
                self.edit_field = EditField::Priority;
            }
            (EditField::Priority, KeyCode::Left) => self.edit_field = EditField::Text,
            (EditField::Priority, KeyCode::Char(c)) => {
                if let Some(priority) = c.to_digit(10).and_then(|d| Priority::try_from(d as u8).ok()) {
                    self.controller.view_mut().set_edit_priority(&id, priority);
                }
            }
            (EditField::Text, KeyCode::Char(c)) => {
                editor.insert_char(c);
                self.controller.view_mut().set_edit_text(&id, editor.get_content());
            }
            (EditField::Text, KeyCode::Backspace) => {
                editor.delete_char();
                self.controller.view_mut().set_edit_text(&id, editor.get_content());
            }
            (EditField::Text, KeyCode::Delete) => {
                editor.delete_forward();
                self.controller.view_mut().set_edit_text(&id, editor.get_content());
            }
            (EditField::Text, KeyCode::Left) => editor.move_cursor_left(),
            (EditField::Text, KeyCode::Right) => editor.move_cursor_right(),
            (EditField::Text, KeyCode::Home) => editor.move_to_start_of_line(),
            (EditField::Text, KeyCode::End) => editor.move_to_end_of_line(),
            _ => {}
        }

        self.editing = Some((id, editor));
    }

    pub async fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
        {
            self.should_quit = true;
            return;
        }
        if key.code == KeyCode::Tab && self.editing.is_none() {
            self.toggle_focus();
            return;
        }

        match self.focus {
            Focus::Input => self.handle_input_key(key).await,
            Focus::List => self.handle_list_key(key).await,
        }
    }
}

pub fn run_tui(config: Config) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let model = Model::new(&config).context("Failed to build HTTP client")?;
        let controller = Controller::new(model, View::new(), config.rollback_on_failure).await;
        let mut app = App::new(controller);

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let res = run_app(&mut terminal, &mut app).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        if let Err(err) = res {
            println!("{err:?}");
        }
        Ok::<(), anyhow::Error>(())
    })
}

async fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                app.handle_key(key).await;
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(f.area());

    render_input(f, app, chunks[0]);
    render_notes(f, app, chunks[1]);
    render_help(f, app, chunks[2]);
}

fn focused_border(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

// Text with a block cursor at the editor position
fn cursor_spans(editor: &LineEditor, style: Style) -> Vec<Span<'static>> {
    let (before, after) = editor.split_at_cursor();
    let mut chars = after.chars();
    let cursor_char = chars.next().map(|c| c.to_string()).unwrap_or_else(|| " ".to_string());
    vec![
        Span::styled(before.to_string(), style),
        Span::styled(cursor_char, Style::default().bg(Color::Cyan).fg(Color::Black)),
        Span::styled(chars.collect::<String>(), style),
    ]
}

fn render_input(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Input;
    let style = Style::default().fg(Color::White);
    let line = if focused {
        Line::from(cursor_spans(&app.input_editor, style))
    } else {
        Line::from(Span::styled(app.view().note_input().to_string(), style))
    };

    let input = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focused_border(focused))
            .title("New note (Enter: Add)"),
    );
    f.render_widget(input, area);
}

fn note_line(node: &NoteNode, editor: Option<(&LineEditor, EditField)>) -> Line<'static> {
    let text_style = if node.done {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default().fg(Color::White)
    };
    let input_style = Style::default().fg(Color::Black).bg(Color::Gray);

    let mut spans = Vec::new();
    if !node.status.hidden {
        let checkbox = if node.status.value { "[x] " } else { "[ ] " };
        spans.push(Span::styled(checkbox, Style::default().fg(Color::Green)));
    }
    if !node.text.hidden {
        spans.push(Span::styled(format!("{} ", node.text.value), text_style));
    }
    if !node.edit_text.hidden {
        match editor {
            Some((editor, EditField::Text)) => spans.extend(cursor_spans(editor, input_style)),
            _ => spans.push(Span::styled(node.edit_text.value.clone(), input_style)),
        }
        spans.push(Span::raw(" "));
    }
    if !node.priority.hidden {
        spans.push(Span::styled(format!("[P{}] ", node.priority.value), Style::default().fg(Color::Cyan)));
    }
    if !node.edit_priority.hidden {
        let value = node.edit_priority.value.map(|p| p.to_string()).unwrap_or_default();
        let style = match editor {
            Some((_, EditField::Priority)) => Style::default().bg(Color::Cyan).fg(Color::Black),
            _ => input_style,
        };
        spans.push(Span::styled(format!("P{}", value), style));
        spans.push(Span::raw(" "));
    }
    if !node.edit_button.hidden {
        spans.push(Span::styled("[Edit] ", Style::default().fg(Color::Yellow)));
    }
    if !node.save_button.hidden {
        spans.push(Span::styled("[Save] ", Style::default().fg(Color::Yellow)));
    }
    if !node.delete_button.hidden {
        spans.push(Span::styled("[Delete]", Style::default().fg(Color::Red)));
    }
    Line::from(spans)
}

fn render_notes(f: &mut Frame, app: &mut App, area: Rect) {
    let editing = app.editing.as_ref();
    let edit_field = app.edit_field;
    let items: Vec<ListItem> = app
        .controller
        .view()
        .notes()
        .iter()
        .map(|node| {
            let editor = editing
                .filter(|(id, _)| id == &node.id)
                .map(|(_, editor)| (editor, edit_field));
            ListItem::new(note_line(node, editor))
        })
        .collect();

    let notes = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focused_border(app.focus == Focus::List))
                .title("Notes"),
        )
        .highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::Black))
        .highlight_symbol(">> ");

    f.render_stateful_widget(notes, area, &mut app.list_state);
}

fn render_help(f: &mut Frame, app: &App, area: Rect) {
    let help = match (app.focus, app.editing.is_some()) {
        (Focus::Input, _) => "Type a note • Enter: Add • Tab: List • Esc: Quit",
        (Focus::List, false) => "↑/↓: Navigate • e: Edit • Space: Done • d: Delete • Tab: Input • q: Quit",
        (Focus::List, true) => "Type text • →/←: Text/Priority • 1-3: Priority • Enter: Save • Esc: Quit",
    };

    let paragraph = Paragraph::new(help)
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn given_display_mode_node_when_rendering_then_shows_text_priority_and_edit() {
        let node = NoteNode::new("Buy milk", "a", false, Priority::Medium);

        let line = note_line(&node, None);

        assert_eq!(plain(&line), "[ ] Buy milk [P2] [Edit] [Delete]");
    }

    #[test]
    fn given_done_node_when_rendering_then_text_is_crossed_out() {
        let node = NoteNode::new("Buy milk", "a", true, Priority::Low);

        let line = note_line(&node, None);

        let text = line.spans.iter().find(|span| span.content.starts_with("Buy milk")).expect("text span");
        assert!(text.style.add_modifier.contains(Modifier::CROSSED_OUT));
        assert!(plain(&line).starts_with("[x] "));
    }

    #[test]
    fn given_editing_node_when_rendering_then_inputs_and_save_replace_spans() {
        let mut view = View::new();
        view.add_note_node("Buy milk", "a", false, Priority::Low);
        view.dispatch(Action::Edit("a".to_string()));
        let node = view.node("a").expect("node a");
        let editor = LineEditor::new("Buy milk");

        let line = note_line(node, Some((&editor, EditField::Priority)));

        assert_eq!(plain(&line), "[ ] Buy milk P1 [Save] [Delete]");
    }
}
