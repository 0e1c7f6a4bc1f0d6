/// Single-line text field with a cursor, used for the terminal inputs.
/// The cursor counts characters, not bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineEditor {
    content: String,
    cursor: usize,
}

impl LineEditor {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let cursor = content.chars().count();
        LineEditor { content, cursor }
    }

    fn byte_index(&self) -> usize {
        self.content
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    fn len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index();
        self.content.insert(at, c);
        self.cursor += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index();
        self.content.remove(at);
    }

    pub fn delete_forward(&mut self) {
        if self.cursor < self.len() {
            let at = self.byte_index();
            self.content.remove(at);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.len() {
            self.cursor += 1;
        }
    }

    pub fn move_to_start_of_line(&mut self) {
        self.cursor = 0;
    }

    pub fn move_to_end_of_line(&mut self) {
        self.cursor = self.len();
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn get_content(&self) -> &str {
        &self.content
    }

    /// Text before and after the cursor, for drawing
    pub fn split_at_cursor(&self) -> (&str, &str) {
        self.content.split_at(self.byte_index())
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }
}
