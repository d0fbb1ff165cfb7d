#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    pub masked: bool,
}

/// A vertical list of single-line text fields with one focused field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub fields: Vec<FormField>,
    pub selected: usize,
}

impl Form {
    pub fn new(labels: &[&'static str]) -> Self {
        Self {
            fields: labels
                .iter()
                .map(|label| FormField {
                    label,
                    value: String::new(),
                    masked: false,
                })
                .collect(),
            selected: 0,
        }
    }

    pub fn masked(mut self, idx: usize) -> Self {
        if let Some(field) = self.fields.get_mut(idx) {
            field.masked = true;
        }
        self
    }

    pub fn handle_char(&mut self, c: char) {
        if let Some(field) = self.fields.get_mut(self.selected) {
            field.value.push(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.selected) {
            field.value.pop();
        }
    }

    pub fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.selected = (self.selected + 1) % self.fields.len();
        }
    }

    pub fn previous_field(&mut self) {
        if !self.fields.is_empty() {
            self.selected = (self.selected + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn value(&self, idx: usize) -> &str {
        self.fields.get(idx).map(|f| f.value.trim()).unwrap_or("")
    }

    pub fn set_value(&mut self, idx: usize, value: impl Into<String>) {
        if let Some(field) = self.fields.get_mut(idx) {
            field.value = value.into();
        }
    }

    pub fn is_filled(&self, indices: &[usize]) -> bool {
        indices.iter().all(|&idx| !self.value(idx).is_empty())
    }

    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.value.clear();
        }
        self.selected = 0;
    }

    pub fn display_value(&self, idx: usize, reveal: bool) -> String {
        match self.fields.get(idx) {
            Some(field) if field.masked && !reveal => "*".repeat(field.value.chars().count()),
            Some(field) => field.value.clone(),
            None => String::new(),
        }
    }

    pub fn lines(&self, reveal: bool) -> Vec<String> {
        self.fields
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                let marker = if idx == self.selected { ">" } else { " " };
                format!("{marker} {:<14} {}", field.label, self.display_value(idx, reveal))
            })
            .collect()
    }
}
