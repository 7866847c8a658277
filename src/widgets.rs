/// Scroll and composer state for one message view (channel or thread).
///
/// `scroll_offset == usize::MAX` pins the view to the newest message; the
/// renderer records the current maximum offset so scrolling up from the
/// pinned position lands on a real line.
#[derive(Debug, Clone)]
pub struct MessageView {
    pub scroll_offset: usize,
    pub last_max_scroll: usize,
    pub input_buffer: String,
    pub input_cursor: usize,
}

impl MessageView {
    pub fn new() -> Self {
        Self {
            scroll_offset: usize::MAX, // pinned to the newest message
            last_max_scroll: 0,
            input_buffer: String::new(),
            input_cursor: 0,
        }
    }

    pub fn clear_input(&mut self) {
        self.input_buffer.clear();
        self.input_cursor = 0;
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self
            .scroll_offset
            .min(self.last_max_scroll)
            .saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        let next = self
            .scroll_offset
            .min(self.last_max_scroll)
            .saturating_add(1);
        // Reaching the bottom re-pins the view to new arrivals.
        self.scroll_offset = if next >= self.last_max_scroll {
            usize::MAX
        } else {
            next
        };
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = usize::MAX;
    }

    pub fn insert_char(&mut self, c: char) {
        self.input_buffer.insert(self.input_cursor, c);
        self.input_cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if self.input_cursor == 0 {
            return;
        }
        let prev = prev_char_boundary(&self.input_buffer, self.input_cursor);
        self.input_buffer.drain(prev..self.input_cursor);
        self.input_cursor = prev;
    }

    pub fn move_cursor_left(&mut self) {
        if self.input_cursor > 0 {
            self.input_cursor = prev_char_boundary(&self.input_buffer, self.input_cursor);
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.input_cursor < self.input_buffer.len() {
            self.input_cursor = next_char_boundary(&self.input_buffer, self.input_cursor);
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.input_cursor = self.input_buffer.len();
    }
}

impl Default for MessageView {
    fn default() -> Self {
        Self::new()
    }
}

fn prev_char_boundary(s: &str, idx: usize) -> usize {
    s[..idx].char_indices().last().map(|(i, _)| i).unwrap_or(0)
}

fn next_char_boundary(s: &str, idx: usize) -> usize {
    if idx >= s.len() {
        return s.len();
    }
    let mut iter = s[idx..].char_indices();
    iter.next();
    match iter.next() {
        Some((next_i, _)) => idx + next_i,
        None => s.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_unpins_and_repins() {
        let mut view = MessageView::new();
        view.last_max_scroll = 20; // recorded by the renderer

        // Pinned to the bottom; one step up lands on a real line.
        view.scroll_up();
        assert_eq!(view.scroll_offset, 19);
        view.scroll_up();
        assert_eq!(view.scroll_offset, 18);

        // Scrolling back past the bottom re-pins.
        view.scroll_down();
        assert_eq!(view.scroll_offset, 19);
        view.scroll_down();
        assert_eq!(view.scroll_offset, usize::MAX);
    }

    #[test]
    fn test_cursor_respects_utf8_boundaries() {
        let mut view = MessageView::new();
        view.insert_char('é');
        view.insert_char('!');
        assert_eq!(view.input_buffer, "é!");
        view.backspace();
        assert_eq!(view.input_buffer, "é");
        view.backspace();
        assert!(view.input_buffer.is_empty());
        assert_eq!(view.input_cursor, 0);
    }

    #[test]
    fn test_cursor_movement() {
        let mut view = MessageView::new();
        for c in "hi é".chars() {
            view.insert_char(c);
        }
        view.move_cursor_home();
        assert_eq!(view.input_cursor, 0);
        view.move_cursor_right();
        assert_eq!(view.input_cursor, 1);
        view.move_cursor_end();
        assert_eq!(view.input_cursor, view.input_buffer.len());
        view.move_cursor_left();
        view.insert_char('x');
        assert_eq!(view.input_buffer, "hi xé");
    }
}
