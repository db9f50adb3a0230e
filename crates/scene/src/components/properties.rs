/// Free-form key/value metadata attached to an entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentProperties {
    pub pairs: Vec<(String, String)>,
}

impl ComponentProperties {
    pub const TOOLTIP: &'static str = "tooltip";

    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    pub fn with_tooltip(text: impl Into<String>) -> Self {
        Self::new(vec![(Self::TOOLTIP.to_string(), text.into())])
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn tooltip(&self) -> Option<&str> {
        self.get(Self::TOOLTIP)
    }
}
