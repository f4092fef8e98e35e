use std::cmp::min;

/// What a field accepts. `Digits` rejects any keystroke that would push the
/// numeric value past `max`, which is how the minute editor stays in 0..=59.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputMask {
    Text,
    Digits { max: u32 },
}

#[derive(Clone, Debug)]
pub struct LineEditor {
    pub text: String,
    pub cursor_col: usize,
    mask: InputMask,
}

impl LineEditor {
    pub fn new(mask: InputMask) -> Self {
        Self {
            text: String::new(),
            cursor_col: 0,
            mask,
        }
    }

    pub fn from_text(text: String, mask: InputMask) -> Self {
        let cursor_col = text.chars().count();
        Self {
            text,
            cursor_col,
            mask,
        }
    }

    /// Numeric value of a digits field; empty or unparsable reads as zero.
    pub fn numeric_value(&self) -> u32 {
        crate::domain::parse_numeric_field(&self.text)
    }

    pub fn insert_char(&mut self, ch: char) {
        self.clamp_cursor();
        match self.mask {
            InputMask::Text => {
                let ch = if ch.is_control() { ' ' } else { ch };
                let byte_index = char_to_byte_index(&self.text, self.cursor_col);
                self.text.insert(byte_index, ch);
                self.cursor_col += 1;
            }
            InputMask::Digits { max } => {
                if !ch.is_ascii_digit() {
                    return;
                }
                let mut candidate = self.text.clone();
                let byte_index = char_to_byte_index(&candidate, self.cursor_col);
                candidate.insert(byte_index, ch);
                let Ok(value) = candidate.parse::<u32>() else {
                    return;
                };
                if value > max {
                    return;
                }
                self.text = candidate;
                self.cursor_col += 1;
            }
        }
    }

    pub fn backspace(&mut self) {
        self.clamp_cursor();
        if self.cursor_col == 0 {
            return;
        }
        let remove_col = self.cursor_col - 1;
        let byte_index = char_to_byte_index(&self.text, remove_col);
        self.text.remove(byte_index);
        self.cursor_col -= 1;
    }

    pub fn delete_forward(&mut self) {
        self.clamp_cursor();
        if self.cursor_col >= self.text.chars().count() {
            return;
        }
        let byte_index = char_to_byte_index(&self.text, self.cursor_col);
        self.text.remove(byte_index);
    }

    pub fn move_left(&mut self) {
        self.clamp_cursor();
        self.cursor_col = self.cursor_col.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.clamp_cursor();
        self.cursor_col = (self.cursor_col + 1).min(self.text.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor_col = self.text.chars().count();
    }

    fn clamp_cursor(&mut self) {
        let len = self.text.chars().count();
        self.cursor_col = min(self.cursor_col, len);
    }
}

fn char_to_byte_index(text: &str, char_index: usize) -> usize {
    if char_index == 0 {
        return 0;
    }
    match text.char_indices().nth(char_index) {
        Some((idx, _)) => idx,
        None => text.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(editor: &mut LineEditor, text: &str) {
        for ch in text.chars() {
            editor.insert_char(ch);
        }
    }

    #[test]
    fn text_mask_inserts_and_deletes_on_unicode() {
        let mut editor = LineEditor::new(InputMask::Text);
        type_str(&mut editor, "ab");
        editor.insert_char('λ');
        assert_eq!(editor.text, "abλ");
        assert_eq!(editor.cursor_col, 3);
        editor.backspace();
        assert_eq!(editor.text, "ab");
        assert_eq!(editor.cursor_col, 2);
    }

    #[test]
    fn text_mask_flattens_control_characters() {
        let mut editor = LineEditor::new(InputMask::Text);
        type_str(&mut editor, "a\nb");
        assert_eq!(editor.text, "a b");
    }

    #[test]
    fn digits_mask_rejects_non_digits() {
        let mut editor = LineEditor::new(InputMask::Digits { max: 59 });
        type_str(&mut editor, "4x2");
        assert_eq!(editor.text, "42");
        assert_eq!(editor.numeric_value(), 42);
    }

    #[test]
    fn minute_field_never_exceeds_fifty_nine() {
        let mut editor = LineEditor::from_text("5".to_string(), InputMask::Digits { max: 59 });
        editor.insert_char('9');
        assert_eq!(editor.text, "59");
        editor.insert_char('9');
        assert_eq!(editor.text, "59");
    }

    #[test]
    fn empty_digits_field_reads_as_zero() {
        let mut editor = LineEditor::from_text("7".to_string(), InputMask::Digits { max: 9999 });
        editor.backspace();
        assert_eq!(editor.text, "");
        assert_eq!(editor.numeric_value(), 0);
    }
}
