/// SePay webhook settings.
#[derive(Debug, Clone, Default)]
pub struct SepayConfig {
    /// Expected `Authorization: Apikey …` value. `None` accepts every delivery.
    pub api_key: Option<String>,
}

impl SepayConfig {
    /// Constant-time check of a presented API key.
    pub fn accepts(&self, presented: Option<&str>) -> bool {
        match (&self.api_key, presented) {
            (None, _) => true,
            (Some(expected), Some(given)) => {
                ring::constant_time::verify_slices_are_equal(expected.as_bytes(), given.as_bytes())
                    .is_ok()
            }
            (Some(_), None) => false,
        }
    }
}
