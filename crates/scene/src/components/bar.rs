/// Per-country bar metadata shown in the hover tooltip.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub country: String,
    /// Population formatted for display.
    pub population_text: String,
}
