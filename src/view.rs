//! Retained element tree for the note list.
//!
//! The view never talks to the network. It holds the new-note input and one
//! [`NoteNode`] per rendered note, and routes [`Action`]s to the handlers the
//! controller registers. Delete, save and status actions change the tree
//! before any handler runs; each such change is queued as a
//! [`PendingChange`] until the caller confirms or reverts it.

use std::collections::VecDeque;

use crate::models::{Note, Priority};

#[derive(Debug, Clone, PartialEq)]
pub struct Element<T> {
    pub value: T,
    pub hidden: bool,
}

impl<T> Element<T> {
    fn shown(value: T) -> Self {
        Element { value, hidden: false }
    }

    fn hidden(value: T) -> Self {
        Element { value, hidden: true }
    }

    fn toggle_hidden(&mut self) {
        self.hidden = !self.hidden;
    }
}

/// One rendered note item
#[derive(Debug, Clone, PartialEq)]
pub struct NoteNode {
    pub id: String,
    pub text: Element<String>,
    pub priority: Element<String>,
    pub edit_text: Element<String>,
    /// Numeric input limited to 1..=3; empty until the editor first opens
    pub edit_priority: Element<Option<Priority>>,
    pub status: Element<bool>,
    pub done: bool,
    pub edit_button: Element<()>,
    pub save_button: Element<()>,
    pub delete_button: Element<()>,
}

impl NoteNode {
    pub fn new(text: &str, id: &str, checked: bool, priority: Priority) -> Self {
        NoteNode {
            id: id.to_string(),
            text: Element::shown(text.to_string()),
            priority: Element::shown(priority.to_string()),
            edit_text: Element::hidden(String::new()),
            edit_priority: Element::hidden(None),
            status: Element::shown(checked),
            done: checked,
            edit_button: Element::shown(()),
            save_button: Element::hidden(()),
            delete_button: Element::shown(()),
        }
    }

    pub fn is_editing(&self) -> bool {
        !self.save_button.hidden
    }

    fn toggle_edit_mode(&mut self) {
        self.text.toggle_hidden();
        self.priority.toggle_hidden();
        self.edit_text.toggle_hidden();
        self.edit_priority.toggle_hidden();
        self.edit_button.toggle_hidden();
        self.save_button.toggle_hidden();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Add,
    Edit(String),
    Save(String),
    Delete(String),
    ToggleStatus(String),
}

/// A view change applied ahead of the remote outcome
#[derive(Debug, Clone, PartialEq)]
pub enum PendingChange {
    /// `seq` is the node's insertion sequence, used to find its slot again
    Removed { seq: u64, node: NoteNode },
    Edited { id: String, text: String, priority: String },
    Toggled { id: String },
}

type AddHandler = Box<dyn FnMut()>;
type IdHandler = Box<dyn FnMut(&str)>;
type EditHandler = Box<dyn FnMut(&str, &str, Priority)>;

#[derive(Default)]
struct Handlers {
    add: Vec<AddHandler>,
    delete: Vec<IdHandler>,
    edit: Vec<EditHandler>,
    status: Vec<IdHandler>,
}

#[derive(Default)]
pub struct View {
    input: String,
    notes: Vec<NoteNode>,
    /// Insertion sequence of each entry in `notes`, always ascending
    seqs: Vec<u64>,
    next_seq: u64,
    handlers: Handlers,
    pending: VecDeque<PendingChange>,
}

impl View {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes(&self) -> &[NoteNode] {
        &self.notes
    }

    pub fn node(&self, id: &str) -> Option<&NoteNode> {
        self.notes.iter().find(|node| node.id == id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.notes.iter().position(|node| node.id == id)
    }

    pub fn get_note_input(&self) -> String {
        self.input.trim().to_string()
    }

    /// Raw input value, untrimmed
    pub fn note_input(&self) -> &str {
        &self.input
    }

    pub fn set_note_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn clear_note_input(&mut self) {
        self.input.clear();
    }

    fn push_node(&mut self, node: NoteNode) {
        self.notes.push(node);
        self.seqs.push(self.next_seq);
        self.next_seq += 1;
    }

    pub fn display_notes(&mut self, notes: &[Note]) {
        for note in notes {
            self.push_node(NoteNode::new(&note.value, &note.id, note.is_finished, note.priority));
        }
    }

    pub fn add_note_node(&mut self, text: &str, id: &str, checked: bool, priority: Priority) {
        self.push_node(NoteNode::new(text, id, checked, priority));
    }

    /// Types into an open editor's text input. Returns false when the
    /// item is missing or not being edited.
    pub fn set_edit_text(&mut self, id: &str, text: impl Into<String>) -> bool {
        match self.notes.iter_mut().find(|node| node.id == id) {
            Some(node) if !node.edit_text.hidden => {
                node.edit_text.value = text.into();
                true
            }
            _ => false,
        }
    }

    pub fn set_edit_priority(&mut self, id: &str, priority: Priority) -> bool {
        match self.notes.iter_mut().find(|node| node.id == id) {
            Some(node) if !node.edit_priority.hidden => {
                node.edit_priority.value = Some(priority);
                true
            }
            _ => false,
        }
    }

    pub fn add_note_handler<F: FnMut() + 'static>(&mut self, handler: F) {
        self.handlers.add.push(Box::new(handler));
    }

    pub fn delete_note_handler<F: FnMut(&str) + 'static>(&mut self, handler: F) {
        self.handlers.delete.push(Box::new(handler));
    }

    pub fn edit_note_handler<F: FnMut(&str, &str, Priority) + 'static>(&mut self, handler: F) {
        self.handlers.edit.push(Box::new(handler));
    }

    pub fn change_status_handler<F: FnMut(&str) + 'static>(&mut self, handler: F) {
        self.handlers.status.push(Box::new(handler));
    }

    /// Actions aimed at a missing item or a hidden control do nothing.
    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::Add => {
                for handler in self.handlers.add.iter_mut() {
                    handler();
                }
            }
            Action::Edit(id) => self.open_editor(&id),
            Action::Save(id) => self.save_edit(&id),
            Action::Delete(id) => self.delete(&id),
            Action::ToggleStatus(id) => self.toggle_status(&id),
        }
    }

    fn open_editor(&mut self, id: &str) {
        let Some(index) = self.position(id) else { return };
        let node = &mut self.notes[index];
        if node.edit_button.hidden {
            return;
        }

        node.edit_text.value = node.text.value.clone();
        node.edit_priority.value = Some(node.priority.value.parse().unwrap_or_default());
        node.toggle_edit_mode();
    }

    fn save_edit(&mut self, id: &str) {
        let Some(index) = self.position(id) else { return };
        let node = &mut self.notes[index];
        if node.save_button.hidden {
            return;
        }

        let new_text = node.edit_text.value.clone();
        let new_priority = node.edit_priority.value.unwrap_or_default();
        let previous_text = std::mem::replace(&mut node.text.value, new_text.clone());
        let previous_priority = std::mem::replace(&mut node.priority.value, new_priority.to_string());
        self.pending.push_back(PendingChange::Edited {
            id: id.to_string(),
            text: previous_text,
            priority: previous_priority,
        });

        for handler in self.handlers.edit.iter_mut() {
            handler(id, &new_text, new_priority);
        }

        self.notes[index].toggle_edit_mode();
    }

    fn delete(&mut self, id: &str) {
        let Some(index) = self.position(id) else { return };
        if self.notes[index].delete_button.hidden {
            return;
        }

        for handler in self.handlers.delete.iter_mut() {
            handler(id);
        }

        let node = self.notes.remove(index);
        let seq = self.seqs.remove(index);
        self.pending.push_back(PendingChange::Removed { seq, node });
    }

    fn toggle_status(&mut self, id: &str) {
        let Some(index) = self.position(id) else { return };
        let node = &mut self.notes[index];
        if node.status.hidden {
            return;
        }

        node.status.value = !node.status.value;
        node.done = !node.done;
        self.pending.push_back(PendingChange::Toggled { id: id.to_string() });

        for handler in self.handlers.status.iter_mut() {
            handler(id);
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Settles the oldest pending change, keeping it
    pub fn confirm_pending(&mut self) -> Option<PendingChange> {
        self.pending.pop_front()
    }

    /// Settles the oldest pending change by undoing it
    pub fn revert_pending(&mut self) -> Option<PendingChange> {
        let change = self.pending.pop_front()?;
        match &change {
            PendingChange::Removed { seq, node } => {
                let at = self.seqs.partition_point(|existing| existing < seq);
                self.notes.insert(at, node.clone());
                self.seqs.insert(at, *seq);
            }
            PendingChange::Edited { id, text, priority } => {
                if let Some(node) = self.notes.iter_mut().find(|node| &node.id == id) {
                    node.text.value = text.clone();
                    node.priority.value = priority.clone();
                }
            }
            PendingChange::Toggled { id } => {
                if let Some(node) = self.notes.iter_mut().find(|node| &node.id == id) {
                    node.status.value = !node.status.value;
                    node.done = !node.done;
                }
            }
        }
        Some(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn sample_view() -> View {
        let mut view = View::new();
        view.display_notes(&[
            Note::new("a", "Buy milk", Priority::Low, false),
            Note::new("b", "Call mom", Priority::High, true),
            Note::new("c", "Pay rent", Priority::Medium, false),
        ]);
        view
    }

    fn ids(view: &View) -> Vec<&str> {
        view.notes().iter().map(|node| node.id.as_str()).collect()
    }

    #[test]
    fn given_notes_when_displaying_then_renders_in_order_with_done_marker() {
        // Arrange & Act
        let view = sample_view();

        // Assert
        assert_eq!(ids(&view), vec!["a", "b", "c"]);
        let finished = view.node("b").expect("node b");
        assert!(finished.done);
        assert!(finished.status.value);
        assert_eq!(finished.priority.value, "3");
        assert!(!view.node("a").expect("node a").done);
    }

    #[test]
    fn given_new_node_when_rendering_then_edit_controls_start_hidden() {
        let node = NoteNode::new("Buy milk", "a", false, Priority::Low);

        assert!(!node.text.hidden);
        assert!(node.edit_text.hidden);
        assert!(node.edit_priority.hidden);
        assert!(node.save_button.hidden);
        assert!(!node.edit_button.hidden);
        assert!(!node.is_editing());
    }

    #[test]
    fn given_padded_input_when_reading_then_trims() {
        let mut view = View::new();
        view.set_note_input("  Buy milk \n");

        assert_eq!(view.get_note_input(), "Buy milk");
        view.clear_note_input();
        assert_eq!(view.note_input(), "");
    }

    #[test]
    fn given_edit_action_when_dispatching_then_inputs_prefilled_and_buttons_swapped() {
        let mut view = sample_view();

        view.dispatch(Action::Edit("c".to_string()));

        let node = view.node("c").expect("node c");
        assert!(node.is_editing());
        assert!(node.text.hidden);
        assert!(node.priority.hidden);
        assert!(node.edit_button.hidden);
        assert_eq!(node.edit_text.value, "Pay rent");
        assert_eq!(node.edit_priority.value, Some(Priority::Medium));
        assert_eq!(view.pending_len(), 0);
    }

    #[test]
    fn given_open_editor_when_saving_then_spans_updated_and_handler_called() {
        // Arrange
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        let mut view = sample_view();
        view.edit_note_handler(move |id, text, priority| {
            sink.borrow_mut().push((id.to_string(), text.to_string(), priority));
        });
        view.dispatch(Action::Edit("a".to_string()));
        assert!(view.set_edit_text("a", "Buy oat milk"));
        assert!(view.set_edit_priority("a", Priority::High));

        // Act
        view.dispatch(Action::Save("a".to_string()));

        // Assert
        let node = view.node("a").expect("node a");
        assert_eq!(node.text.value, "Buy oat milk");
        assert_eq!(node.priority.value, "3");
        assert!(!node.is_editing());
        assert!(!node.text.hidden);
        assert!(node.edit_text.hidden);
        assert_eq!(
            calls.borrow().as_slice(),
            &[("a".to_string(), "Buy oat milk".to_string(), Priority::High)]
        );
        assert_eq!(view.pending_len(), 1);
    }

    #[test]
    fn given_closed_editor_when_saving_then_nothing_happens() {
        let calls = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&calls);
        let mut view = sample_view();
        view.edit_note_handler(move |_, _, _| *sink.borrow_mut() += 1);

        view.dispatch(Action::Save("a".to_string()));

        assert_eq!(*calls.borrow(), 0);
        assert_eq!(view.pending_len(), 0);
        assert!(!view.set_edit_text("a", "typed into hidden input"));
    }

    #[test]
    fn given_delete_action_when_dispatching_then_only_matching_item_removed() {
        let deleted = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&deleted);
        let mut view = sample_view();
        view.delete_note_handler(move |id| sink.borrow_mut().push(id.to_string()));

        view.dispatch(Action::Delete("b".to_string()));

        assert_eq!(ids(&view), vec!["a", "c"]);
        assert_eq!(deleted.borrow().as_slice(), &["b".to_string()]);
        assert_eq!(view.node("a"), Some(&NoteNode::new("Buy milk", "a", false, Priority::Low)));
    }

    #[test]
    fn given_unknown_id_when_dispatching_then_ignored() {
        let mut view = sample_view();

        view.dispatch(Action::Delete("zzz".to_string()));
        view.dispatch(Action::ToggleStatus("zzz".to_string()));

        assert_eq!(ids(&view), vec!["a", "b", "c"]);
        assert_eq!(view.pending_len(), 0);
    }

    #[test]
    fn given_toggle_action_when_dispatching_then_marker_flips_once_per_action() {
        let toggled = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&toggled);
        let mut view = sample_view();
        view.change_status_handler(move |id| sink.borrow_mut().push(id.to_string()));

        view.dispatch(Action::ToggleStatus("a".to_string()));
        assert!(view.node("a").expect("node a").done);
        view.dispatch(Action::ToggleStatus("a".to_string()));

        let node = view.node("a").expect("node a");
        assert!(!node.done);
        assert!(!node.status.value);
        assert_eq!(toggled.borrow().len(), 2);
    }

    #[test]
    fn given_several_add_handlers_when_adding_then_all_run_in_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let first = Rc::clone(&order);
        let second = Rc::clone(&order);
        let mut view = View::new();
        view.add_note_handler(move || first.borrow_mut().push(1));
        view.add_note_handler(move || second.borrow_mut().push(2));

        view.dispatch(Action::Add);

        assert_eq!(order.borrow().as_slice(), &[1, 2]);
    }

    #[test]
    fn given_pending_delete_when_reverting_then_item_returns_to_its_position() {
        let mut view = sample_view();
        view.dispatch(Action::Delete("b".to_string()));

        let change = view.revert_pending();

        assert!(matches!(change, Some(PendingChange::Removed { seq: 1, .. })));
        assert_eq!(ids(&view), vec!["a", "b", "c"]);
        assert_eq!(view.pending_len(), 0);
    }

    #[test]
    fn given_pending_edit_when_reverting_then_previous_spans_restored() {
        let mut view = sample_view();
        view.dispatch(Action::Edit("a".to_string()));
        view.set_edit_text("a", "Something else");
        view.dispatch(Action::Save("a".to_string()));

        view.revert_pending();

        let node = view.node("a").expect("node a");
        assert_eq!(node.text.value, "Buy milk");
        assert_eq!(node.priority.value, "1");
    }

    #[test]
    fn given_two_pending_changes_when_settling_then_oldest_goes_first() {
        let mut view = sample_view();
        view.dispatch(Action::ToggleStatus("a".to_string()));
        view.dispatch(Action::Delete("c".to_string()));

        assert_eq!(view.confirm_pending(), Some(PendingChange::Toggled { id: "a".to_string() }));
        view.revert_pending();

        assert_eq!(ids(&view), vec!["a", "b", "c"]);
        assert!(view.node("a").expect("node a").done);
        assert_eq!(view.confirm_pending(), None);
    }

    #[test]
    fn given_neighbouring_deletes_when_reverting_both_then_original_order_returns() {
        // Arrange
        let mut forward = sample_view();
        forward.dispatch(Action::Delete("a".to_string()));
        forward.dispatch(Action::Delete("b".to_string()));
        let mut backward = sample_view();
        backward.dispatch(Action::Delete("b".to_string()));
        backward.dispatch(Action::Delete("a".to_string()));

        // Act
        for view in [&mut forward, &mut backward] {
            view.revert_pending();
            view.revert_pending();
        }

        // Assert
        assert_eq!(ids(&forward), vec!["a", "b", "c"]);
        assert_eq!(ids(&backward), vec!["a", "b", "c"]);
    }

    #[test]
    fn given_confirmed_delete_between_when_reverting_later_delete_then_slot_skips_gone_item() {
        let mut view = sample_view();
        view.add_note_node("Water plants", "d", false, Priority::Low);
        view.dispatch(Action::Delete("b".to_string()));
        view.dispatch(Action::Delete("c".to_string()));

        view.confirm_pending();
        view.revert_pending();

        assert_eq!(ids(&view), vec!["a", "c", "d"]);
    }
}
