//! Prompt templates for the council flow

use crate::core::message::ChatMessage;
use crate::council::aggregate::{AggregateRankingEntry, format_aggregate};
use crate::council::label::Label;
use crate::council::mode::CouncilMode;
use crate::council::ranking::{FINAL_RANKING_MARKER, RankingSubmission};
use crate::council::value_objects::{ModelResponse, image_note};

/// Templates for generating prompts at each stage
pub struct CouncilPrompt;

impl CouncilPrompt {
    /// System prompt for Stage 1, if the mode uses one
    pub fn stage1_system(mode: CouncilMode) -> Option<&'static str> {
        match mode {
            CouncilMode::Chat => None,
            CouncilMode::Code => Some(
                r#"You are an expert software engineer participating in a code review council.
Focus on:
- Code correctness and best practices
- Security considerations
- Performance optimization
- Clean, maintainable code
- Clear explanations of your reasoning

Provide your response with code examples when appropriate, using proper markdown code blocks."#,
            ),
            CouncilMode::Image => Some(
                r#"You are a creative AI artist participating in an image generation council.
Focus on:
- Interpreting the user's creative vision
- Generating high-quality, detailed images
- Artistic composition and aesthetics
- Following the prompt instructions precisely

Generate an image based on the user's description."#,
            ),
        }
    }

    /// Messages sent to every council model in Stage 1.
    ///
    /// `search_context` is only used in chat mode.
    pub fn stage1_messages(
        mode: CouncilMode,
        question: &str,
        search_context: Option<&str>,
    ) -> Vec<ChatMessage> {
        let prompt = match mode {
            CouncilMode::Chat => match search_context {
                Some(context) => format!(
                    "The following web search results may be helpful for answering \
                     the question:\n\n{context}\n\n---\n\nQuestion: {question}\n\n\
                     Please provide a comprehensive answer, \
                     using the search results above if relevant."
                ),
                None => question.to_string(),
            },
            CouncilMode::Code => format!("Code Task:\n\n{}", question),
            CouncilMode::Image => format!("Image Generation Request:\n\n{}", question),
        };

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = Self::stage1_system(mode) {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));
        messages
    }

    fn evaluation_context(mode: CouncilMode) -> (&'static str, &'static str) {
        match mode {
            CouncilMode::Chat => (
                "question",
                "
- Accuracy and correctness
- Comprehensiveness and depth
- Clarity of explanation
- Practical usefulness",
            ),
            CouncilMode::Code => (
                "code generation/review task",
                "
- Code correctness and functionality
- Best practices and clean code principles
- Security considerations
- Performance and efficiency
- Clarity of explanations",
            ),
            CouncilMode::Image => (
                "image generation task",
                "
- Quality and accuracy of the generated image
- Adherence to the prompt instructions
- Artistic composition and aesthetics
- Creativity and interpretation",
            ),
        }
    }

    /// Stage 2 prompt: the anonymized bundle plus ranking instructions
    pub fn ranking_prompt(
        mode: CouncilMode,
        question: &str,
        bundle: &[(Label, &ModelResponse)],
    ) -> String {
        let (context, criteria) = Self::evaluation_context(mode);

        let responses = bundle
            .iter()
            .map(|(label, r)| match image_note(&r.images) {
                Some(note) => format!("{}:\n{}\n{}", label, r.response, note),
                None => format!("{}:\n{}", label, r.response),
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            r#"You are evaluating different responses to the following {context}:

Question: {question}

Here are the responses from different models (anonymized):

{responses}

Your task:
1. First, evaluate each response individually based on:{criteria}
2. Then, at the very end of your response, provide a final ranking.

IMPORTANT: Your final ranking MUST be formatted EXACTLY as follows:
- Start with the line "{marker}" (all caps, with colon)
- Then list the responses from best to worst as a numbered list
- Each line should be: number, period, space, then ONLY the response label (e.g., "1. Response A")
- Do not add any other text or explanations in the ranking section

Example of the correct format for your ENTIRE response:

Response A provides good detail on X but misses Y...
Response B is accurate but lacks depth on Z...
Response C offers the most comprehensive answer...

{marker}
1. Response C
2. Response A
3. Response B

Now provide your evaluation and ranking:"#,
            marker = FINAL_RANKING_MARKER,
        )
    }

    /// Stage 3 prompt: de-anonymized answers, peer evaluations and the consensus
    pub fn chairman_prompt(
        mode: CouncilMode,
        question: &str,
        responses: &[ModelResponse],
        rankings: &[RankingSubmission],
        aggregate: &[AggregateRankingEntry],
    ) -> String {
        let answers = responses
            .iter()
            .filter(|r| r.is_success())
            .map(|r| match (mode, image_note(&r.images)) {
                (CouncilMode::Image, Some(note)) => {
                    format!("Model: {}\nDescription: {}\n{}", r.model, r.response, note)
                }
                (CouncilMode::Image, None) => {
                    format!("Model: {}\nDescription: {}", r.model, r.response)
                }
                _ => format!("Model: {}\nResponse: {}", r.model, r.response),
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let evaluations = rankings
            .iter()
            .map(|r| format!("Model: {}\nRanking: {}", r.model, r.ranking))
            .collect::<Vec<_>>()
            .join("\n\n");

        let consensus = format_aggregate(aggregate);

        let (role, task) = match mode {
            CouncilMode::Chat => (
                "You are the Chairman of an LLM Council. Multiple AI models have provided \
                 responses to a user's question, and then ranked each other's responses.",
                "Your task as Chairman is to synthesize all of this information into a single, \
                 comprehensive, accurate answer to the user's original question. Consider:
- The individual responses and their insights
- The peer rankings and what they reveal about response quality
- Any patterns of agreement or disagreement

Provide a clear, well-reasoned final answer that represents the council's collective wisdom:",
            ),
            CouncilMode::Code => (
                "You are the Lead Architect of a Code Council. Multiple expert developers have \
                 provided solutions to a coding task, and then reviewed each other's code.",
                "Your task as Lead Architect is to synthesize all solutions into the BEST \
                 possible implementation. Consider:
- Code correctness from all submissions
- Best practices identified in reviews
- Security and performance optimizations suggested
- The consensus of peer rankings

Provide the definitive solution with clean, well-documented code:",
            ),
            CouncilMode::Image => (
                "You are the Creative Director of an Image Council. Multiple AI artists have \
                 created interpretations of an image request, and then evaluated each \
                 other's work.",
                "Your task as Creative Director is to create the DEFINITIVE image that best \
                 represents the user's vision. Consider:
- The most praised elements from each submission
- The artistic insights from peer evaluations
- The consensus on what works best
- The original user intent

Generate the final, best interpretation of the user's request:",
            ),
        };

        format!(
            r#"{role}

Original Question: {question}

STAGE 1 - Individual Responses:
{answers}

STAGE 2 - Peer Rankings:
{evaluations}

Aggregate Ranking (lower average rank is better):
{consensus}

{task}"#
        )
    }

    /// Prompt asking for a 3-5 word conversation title
    pub fn title_prompt(question: &str) -> String {
        format!(
            "Generate a very short title (3-5 words maximum) that summarizes the following \
             question.\nThe title should be concise and descriptive. \
             Do not use quotes or punctuation in the title.\n\nQuestion: {}\n\nTitle:",
            question
        )
    }
}
