//! Video filters: the editable form on the filters page and the predicate it
//! produces for the videos pane.

use tgload_core::MediaItem;

const MB: u64 = 1024 * 1024;
/// Longest value a field accepts.
const MAX_DIGITS: usize = 5;

/// Predicate applied to the videos pane. The default lets everything through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoFilter {
    pub max_duration_secs: Option<u32>,
    pub min_duration_secs: Option<u32>,
    pub max_size_bytes: Option<u64>,
}

impl VideoFilter {
    pub fn matches(&self, item: &MediaItem) -> bool {
        if self.max_duration_secs.is_some_and(|max| item.duration > max) {
            return false;
        }
        if self.min_duration_secs.is_some_and(|min| item.duration < min) {
            return false;
        }
        if self.max_size_bytes.is_some_and(|max| item.expected_size > max) {
            return false;
        }
        true
    }

    pub fn is_active(&self) -> bool {
        *self != Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    MaxDuration,
    MinDuration,
    MaxSize,
}

impl FilterKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::MaxDuration => "max duration",
            Self::MinDuration => "min duration",
            Self::MaxSize => "max size",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::MaxDuration | Self::MinDuration => "minutes",
            Self::MaxSize => "mb",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterField {
    pub kind: FilterKind,
    pub enabled: bool,
    pub value: String,
}

impl FilterField {
    fn new(kind: FilterKind, value: &str) -> Self {
        Self {
            kind,
            enabled: false,
            value: value.to_string(),
        }
    }

    /// The entered number, if the field is switched on and not empty.
    fn number(&self) -> Option<u64> {
        if !self.enabled {
            return None;
        }
        self.value.parse().ok()
    }
}

/// The filters page state. Edits only take effect through `build`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterForm {
    pub fields: Vec<FilterField>,
}

impl Default for FilterForm {
    fn default() -> Self {
        Self {
            fields: vec![
                FilterField::new(FilterKind::MaxDuration, "15"),
                FilterField::new(FilterKind::MinDuration, "1"),
                FilterField::new(FilterKind::MaxSize, ""),
            ],
        }
    }
}

impl FilterForm {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn toggle(&mut self, index: usize) {
        if let Some(field) = self.fields.get_mut(index) {
            field.enabled = !field.enabled;
        }
    }

    /// Append a digit; ignored past five digits or for non-digits.
    pub fn push_digit(&mut self, index: usize, c: char) {
        let Some(field) = self.fields.get_mut(index) else {
            return;
        };
        if c.is_ascii_digit() && field.value.len() < MAX_DIGITS {
            field.value.push(c);
        }
    }

    pub fn backspace(&mut self, index: usize) {
        if let Some(field) = self.fields.get_mut(index) {
            field.value.pop();
        }
    }

    /// Switch every field off and clear its value.
    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.enabled = false;
            field.value.clear();
        }
    }

    pub fn build(&self) -> VideoFilter {
        let mut filter = VideoFilter::default();
        for field in &self.fields {
            // Zero means "no limit".
            let Some(n) = field.number().filter(|n| *n > 0) else {
                continue;
            };
            match field.kind {
                FilterKind::MaxDuration => filter.max_duration_secs = Some(n as u32 * 60),
                FilterKind::MinDuration => filter.min_duration_secs = Some(n as u32 * 60),
                FilterKind::MaxSize => filter.max_size_bytes = Some(n * MB),
            }
        }
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(duration: u32, size: u64) -> MediaItem {
        MediaItem {
            file_id: 1,
            message_id: 1,
            caption: None,
            duration,
            expected_size: size,
            downloaded_size: 0,
            local_path: None,
            album: None,
            source: None,
            date: None,
        }
    }

    #[test]
    fn disabled_fields_do_not_filter() {
        let form = FilterForm::default();
        let filter = form.build();
        assert!(!filter.is_active());
        assert!(filter.matches(&video(3 * 3600, 10 * 1024 * MB)));
    }

    #[test]
    fn enabled_fields_become_limits() {
        let mut form = FilterForm::default();
        form.toggle(0);
        form.toggle(1);
        form.toggle(2);
        form.push_digit(2, '2');
        form.push_digit(2, '0');
        let filter = form.build();
        assert_eq!(filter.max_duration_secs, Some(15 * 60));
        assert_eq!(filter.min_duration_secs, Some(60));
        assert_eq!(filter.max_size_bytes, Some(20 * MB));

        assert!(filter.matches(&video(60, 20 * MB)));
        assert!(!filter.matches(&video(59, MB)));
        assert!(!filter.matches(&video(15 * 60 + 1, MB)));
        assert!(!filter.matches(&video(120, 20 * MB + 1)));
    }

    #[test]
    fn values_are_capped_at_five_digits() {
        let mut form = FilterForm::default();
        form.reset();
        for c in "1234567x".chars() {
            form.push_digit(2, c);
        }
        assert_eq!(form.fields[2].value, "12345");
        form.backspace(2);
        assert_eq!(form.fields[2].value, "1234");
    }

    #[test]
    fn enabled_empty_or_zero_field_is_ignored() {
        let mut form = FilterForm::default();
        form.reset();
        form.toggle(0);
        form.toggle(2);
        form.push_digit(2, '0');
        assert_eq!(form.build(), VideoFilter::default());
    }

    #[test]
    fn out_of_range_index_is_a_noop() {
        let mut form = FilterForm::default();
        let before = form.clone();
        form.toggle(9);
        form.push_digit(9, '1');
        form.backspace(9);
        assert_eq!(form, before);
    }
}
