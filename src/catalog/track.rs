use serde::Serialize;

#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct Track {
    title: String,
    /// Free-form, scraped pages do not expose it so it is often empty.
    duration: String,
}

impl Track {
    pub fn new(title: impl Into<String>, duration: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            duration: duration.into(),
        }
    }

    /// A track known only by its title.
    pub fn untimed(title: impl Into<String>) -> Self {
        Self::new(title, String::new())
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn duration(&self) -> &str {
        &self.duration
    }
}
