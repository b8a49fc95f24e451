use super::slug::slug;
use serde::Serialize;

/// Artist as reported by a source.
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct Artist {
    name: String,
    description: String,
}

impl Artist {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn slug(&self) -> String {
        slug(&self.name)
    }

    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_derives_from_name() {
        let artist = Artist::new("  Daft Punk ", "French duo");
        assert_eq!(artist.slug(), "daft-punk");
    }

    #[test]
    fn blank_name_is_invalid() {
        assert!(!Artist::new("", "").is_valid());
        assert!(!Artist::new("   ", "has a description").is_valid());
        assert!(Artist::new("X", "").is_valid());
    }

    #[test]
    fn same_slug_means_same_artist() {
        let a = Artist::new("Daft Punk", "");
        let b = Artist::new("daft   punk", "another description");
        assert_eq!(a.slug(), b.slug());
    }
}
