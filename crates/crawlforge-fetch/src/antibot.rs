/// Heuristic anti-bot detector: status-code plus body-pattern based, per
/// spec §4.3 ("HTTP 403/429/503 plus known body patterns").
pub struct AntiBotDetector {
    patterns: Vec<&'static str>,
}

impl Default for AntiBotDetector {
    fn default() -> Self {
        Self {
            patterns: vec!["cf-chl", "Access denied", "captcha", "Please verify you are a human"],
        }
    }
}

impl AntiBotDetector {
    pub fn looks_like_anti_bot(&self, status: u16, body: &str) -> bool {
        if matches!(status, 403 | 429 | 503) {
            return true;
        }
        self.patterns.iter().any(|pattern| body.contains(pattern))
    }
}
