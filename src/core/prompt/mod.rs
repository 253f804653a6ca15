use sha2::{Digest, Sha256};

pub const PROMPT_VERSION: &str = "prompt_builder.v1";

const GROUNDED_INSTRUCTIONS: &str = r#"Instructions:
- Prefer the reference material when answering.
- When the material contains related information, use it to explain the details.
- When the material does not cover the question, answer from general knowledge."#;

const GENERAL_INSTRUCTIONS: &str = r#"Instructions:
- Answer as fully as you can from your own knowledge.
- Offer related information even if you are not fully certain.
- Even when unsure, point toward a nearby topic rather than giving up."#;

/// Everything a single turn contributes to the prompt.
#[derive(Debug, Clone)]
pub struct PromptContext<'a> {
    pub username: &'a str,
    pub question: &'a str,
    pub recent_history: &'a str,
    pub document_text: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct ComposedPrompt {
    pub prompt: String,
    pub version: String,
    pub fingerprint: String,
}

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    grounded_instructions: String,
    general_instructions: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            grounded_instructions: GROUNDED_INSTRUCTIONS.to_string(),
            general_instructions: GENERAL_INSTRUCTIONS.to_string(),
        }
    }
}

impl PromptBuilder {
    fn canonical_template_bundle(&self) -> String {
        format!(
            "{}\n\n{}",
            self.grounded_instructions.trim(),
            self.general_instructions.trim()
        )
    }

    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_template_bundle().as_bytes());
        hex::encode(hasher.finalize())
    }

    fn name_callout(username: &str) -> String {
        format!(
            "The user's name is {username}. Always address the user as {username} in your reply."
        )
    }

    /// Selects between the two templates by presence of document text.
    /// Inputs are embedded as-is; an empty history renders as an empty
    /// block.
    pub fn build(&self, ctx: &PromptContext<'_>) -> String {
        let mut blocks: Vec<String> = Vec::new();

        blocks.push(format!(
            "Recent conversation (latest messages only):\n{}",
            ctx.recent_history
        ));

        if let Some(document_text) = ctx.document_text {
            blocks.push(format!(
                "Reference material from the document folder:\n{document_text}"
            ));
        }

        blocks.push(Self::name_callout(ctx.username));
        blocks.push(format!("User question:\n{}", ctx.question));

        if ctx.document_text.is_some() {
            blocks.push(self.grounded_instructions.trim().to_string());
        } else {
            blocks.push(self.general_instructions.trim().to_string());
        }

        blocks.join("\n\n")
    }
}

pub fn compose_prompt(ctx: &PromptContext<'_>) -> ComposedPrompt {
    let builder = PromptBuilder::default();
    ComposedPrompt {
        prompt: builder.build(ctx),
        version: PROMPT_VERSION.to_string(),
        fingerprint: builder.fingerprint(),
    }
}
