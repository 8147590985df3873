/// Store-side configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum number of store calls running concurrently on blocking threads.
    pub blocking_workers: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            blocking_workers: 32,
        }
    }
}
