/// Whether an entity is drawn. Entities without the component are drawn.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Shown,
    /// Loaded but not handed to the scene yet.
    Hidden,
}

impl Visibility {
    pub fn is_shown(self) -> bool {
        matches!(self, Visibility::Shown)
    }
}

impl From<bool> for Visibility {
    fn from(shown: bool) -> Self {
        if shown { Visibility::Shown } else { Visibility::Hidden }
    }
}
