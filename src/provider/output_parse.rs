/// How an agent's standard output becomes the step response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseRule {
    #[default]
    Trim,
}

impl ResponseRule {
    pub fn extract(self, stdout: &str) -> String {
        match self {
            ResponseRule::Trim => stdout.trim().to_string(),
        }
    }
}
