use std::collections::HashMap;

/// Tracks in-flight data resolutions per module so a client can drop
/// results that arrive after the request was superseded.
///
/// ```
/// use contracts::shared::widgets::GenerationTracker;
///
/// let mut tracker = GenerationTracker::default();
/// let first = tracker.begin("custom_1");
/// let second = tracker.begin("custom_1");
/// assert!(!tracker.is_current("custom_1", first));
/// assert!(tracker.is_current("custom_1", second));
/// ```
#[derive(Debug, Default, Clone)]
pub struct GenerationTracker {
    generations: HashMap<String, u64>,
}

impl GenerationTracker {
    /// Starts a new resolution for `module_id` and returns its generation.
    pub fn begin(&mut self, module_id: &str) -> u64 {
        let generation = self.generations.entry(module_id.to_string()).or_insert(0);
        *generation += 1;
        *generation
    }

    /// Whether a result tagged with `generation` should still be applied.
    pub fn is_current(&self, module_id: &str, generation: u64) -> bool {
        self.generations.get(module_id) == Some(&generation)
    }

    /// Supersedes any pending resolution, e.g. when the widget was removed
    /// or its descriptor changed.
    pub fn invalidate(&mut self, module_id: &str) {
        if let Some(generation) = self.generations.get_mut(module_id) {
            *generation += 1;
        }
    }
}
