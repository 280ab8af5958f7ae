// src/services/response_filter.rs

pub const PLANT_MARKER: &str = "planta";
pub const NOT_A_PLANT_REFUSAL: &str = "No puedo responder sobre esta imagen, ya que no es una planta.";

/// Post-processing step applied to a model reply before it is shown.
pub trait ResponseFilter: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, reply: String) -> String;
}

/// Keeps replies containing `marker` (case-sensitive), replaces the rest
/// with a fixed refusal.
#[derive(Debug, Clone)]
pub struct MarkerFilter {
    marker: String,
    refusal: String,
}

impl MarkerFilter {
    pub fn new(marker: impl Into<String>, refusal: impl Into<String>) -> Self {
        Self { marker: marker.into(), refusal: refusal.into() }
    }

    pub fn plants() -> Self {
        Self::new(PLANT_MARKER, NOT_A_PLANT_REFUSAL)
    }
}

impl ResponseFilter for MarkerFilter {
    fn name(&self) -> &str {
        "marker"
    }

    fn apply(&self, reply: String) -> String {
        if reply.contains(&self.marker) {
            reply
        } else {
            self.refusal.clone()
        }
    }
}
