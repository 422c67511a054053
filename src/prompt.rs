//! The fixed marketing prompt and the reasoning-then-answer format around it.

/// A named slot of the prompt with a human-readable description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub prefix: &'static str,
    pub description: &'static str,
}

/// Instruction plus input and output slots. Constant data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub instruction: &'static str,
    pub inputs: Vec<Field>,
    pub output: Field,
}

/// Inputs for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub history: String,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptResponse {
    pub answer: String,
}

/// Text sent to the model: a system part and a user part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

const REASONING_PREFIX: &str = "Reasoning: Let's think step by step in order to";

lazy_static::lazy_static! {
    pub static ref MARKETING_CHATBOT: PromptTemplate = PromptTemplate {
        instruction: "You are a Marketing Chatbot, whose main aim is to answer marketing queries of the user.\n\
            \n\
            You may also be given the history of the prompts and responses, use this history as the context while answering the query.\n\
            \n\
            All your responses should be strictly specific to marketing domain.\n\
            \n\
            If anything not related to marketing is given in the query, you have to politely refuse to answer.",
        inputs: vec![
            Field { name: "history", prefix: "History:", description: "The history of prompts and responses" },
            Field { name: "query", prefix: "Query:", description: "The query of the user." },
        ],
        output: Field { name: "answer", prefix: "Answer:", description: "The answer to the user's query." },
    };
}

impl PromptTemplate {
    pub fn render(&self, request: &PromptRequest) -> RenderedPrompt {
        let mut system = String::from(self.instruction);
        system.push_str("\n\n---\n\nFollow the following format.\n\n");
        for field in &self.inputs {
            system.push_str(&format!("{} {}\n\n", field.prefix, field.description));
        }
        system.push_str(&format!("{} ${{produce the {}}}. We ...\n\n", REASONING_PREFIX, self.output.name));
        system.push_str(&format!("{} {}", self.output.prefix, self.output.description));

        let mut user = String::new();
        for field in &self.inputs {
            let value = match field.name {
                "history" => request.history.as_str(),
                "query" => request.query.as_str(),
                _ => "",
            };
            user.push_str(&format!("{} {}\n\n", field.prefix, value));
        }
        user.push_str(REASONING_PREFIX);

        RenderedPrompt { system, user }
    }

    /// Pulls the output field out of a completion: everything after the first
    /// output prefix that starts a line, trimmed. Later prefixes belong to the
    /// answer. Completions without the prefix are taken whole.
    pub fn extract_answer(&self, completion: &str) -> PromptResponse {
        let prefix = self.output.prefix;
        let start = if completion.starts_with(prefix) {
            Some(prefix.len())
        } else {
            let marker = format!("\n{}", prefix);
            completion.find(&marker).map(|idx| idx + marker.len())
        };
        let answer = start.map_or(completion, |start| &completion[start..]);
        PromptResponse { answer: answer.trim().to_string() }
    }
}
