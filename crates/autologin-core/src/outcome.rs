/// Result of inspecting the page after the login form was submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The success indicator was found in the page content
    Success,
    /// The indicator was not found; the run itself still completed normally
    Failure,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Case-insensitive substring test of `indicator` against `page_content`.
///
/// This is a heuristic: the indicator may also appear incidentally, for
/// example inside an error message, and that counts as success.
pub fn classify(page_content: &str, indicator: &str) -> Outcome {
    let content = page_content.to_lowercase();
    let indicator = indicator.to_lowercase();

    tracing::debug!(
        "Classifying {} bytes of page content against indicator '{}'",
        content.len(),
        indicator
    );

    if content.contains(&indicator) {
        Outcome::Success
    } else {
        Outcome::Failure
    }
}
