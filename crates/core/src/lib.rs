pub mod agent;
pub mod content;
pub mod curriculum;
pub mod ledger;
pub mod llm_client;
pub mod messages;
pub mod profile;
pub mod prompts;
pub mod quiz;
pub mod store;
pub mod student;

/// Commands a student can type at any point in the conversation.
///
/// Commands are matched case-insensitively against the whole trimmed message
/// and are checked before the conversation context is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start a quiz for the current module.
    Quiz,
    /// Move on to the next submodule.
    Continue,
    /// Show the points balance.
    Points,
    /// Redeem points for a mentoring session.
    Mentoring,
    /// List the available commands.
    Help,
    /// Show the current module and position.
    Progress,
}

impl Command {
    pub fn parse(body: &str) -> Option<Self> {
        match body.trim().to_lowercase().as_str() {
            "quiz" => Some(Command::Quiz),
            "continuar" | "proximo" | "próximo" | "avançar" | "avancar" | "seguir" => {
                Some(Command::Continue)
            }
            "pontos" => Some(Command::Points),
            "mentoria" => Some(Command::Mentoring),
            "ajuda" | "help" | "comandos" => Some(Command::Help),
            "modulo" | "módulo" => Some(Command::Progress),
            _ => None,
        }
    }
}
