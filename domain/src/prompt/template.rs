//! Prompt templates for the two consensus phases

use crate::consensus::{ConsensusRequest, ModelResponse};

/// Templates for generating prompts at each phase
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for the divergent phase
    pub fn divergent_system() -> &'static str {
        r#"You are a knowledgeable expert answering a question independently.
Other experts are answering the same question; do not try to guess their answers.
Be specific and thorough. Support your points with reasoning and examples where appropriate."#
    }

    /// User prompt for the divergent phase
    pub fn divergent_prompt(request: &ConsensusRequest) -> String {
        let mut prompt = format!(
            "Original question:\n{}\n\nPlease provide:\n1. Your answer to the question\n",
            request.prompt
        );

        let mut item = 2;
        if request.include_reasoning {
            prompt.push_str(&format!(
                "{item}. Your reasoning process, step by step, in a section starting with \"Reasoning:\"\n"
            ));
            item += 1;
        }
        if request.wants_theoretical_framework() {
            prompt.push_str(&format!(
                "{item}. The theoretical framework(s) informing your answer\n"
            ));
            item += 1;
        }
        if request.include_confidence {
            prompt.push_str(&format!(
                "{item}. Your confidence as a decimal between 0.0 and 1.0\n"
            ));
        }

        if request.include_confidence {
            prompt.push_str(
                r#"
IMPORTANT: Put your confidence score in XML tags at the end of your response:
<confidence>0.85</confidence>
Replace 0.85 with your actual confidence (0.0 = no confidence, 1.0 = complete confidence).
"#,
            );
        }

        prompt.push_str(
            r#"
Finish with a two-sentence summary of your answer in XML tags:
<summary>Your summary here.</summary>"#,
        );

        prompt
    }

    /// System prompt for the judge
    pub fn judge_system() -> &'static str {
        r#"You are a synthesis judge evaluating multiple AI responses to reach consensus.
Your task is to:
1. Identify points where the models agree
2. Identify points of disagreement and analyze why they differ
3. Synthesize the best answer from consensus points, merit of conflicting views and complementary insights
4. Assess overall confidence from both model confidence and level of agreement

Be balanced and objective. Give weight to well-reasoned arguments regardless of source."#
    }

    /// User prompt for the judge, embedding every collected response
    pub fn judge_prompt(question: &str, responses: &[ModelResponse]) -> String {
        let mut prompt = format!(
            "Original question:\n{}\n\nResponses from {} models:\n",
            question,
            responses.len()
        );

        for (i, response) in responses.iter().enumerate() {
            prompt.push_str(&format!(
                "\n[Response {} from {}]\nAnswer: {}\n",
                i + 1,
                response.model_name,
                response.answer
            ));
            if response.has_reasoning() {
                prompt.push_str(&format!("Reasoning: {}\n", response.reasoning));
            }
            if response.has_confidence() {
                prompt.push_str(&format!(
                    "Confidence: {:.0}%\n",
                    response.confidence_score * 100.0
                ));
            }
        }

        prompt.push_str(
            r#"
Respond with exactly one <synthesis> element in this format:

<synthesis>
  <synthesized_answer>your synthesized answer</synthesized_answer>
  <reasoning>why you resolved the responses this way</reasoning>
  <summary>two-sentence summary</summary>
  <confidence>0-100</confidence>
  <consensus_level>Strong, Moderate, Weak or Conflicted</consensus_level>
  <agreement_points>
    <point models="model-a,model-b">a point the models agree on</point>
  </agreement_points>
  <disagreements>
    <disagreement theoretical="false">
      <topic>what they disagree about</topic>
      <views>
        <view><model>model-a</model><position>its position</position><reasoning>why</reasoning></view>
      </views>
    </disagreement>
  </disagreements>
</synthesis>

Set theoretical="true" when a disagreement reflects a legitimate theoretical difference.
Leave <agreement_points> or <disagreements> empty when there are none."#,
        );

        prompt
    }
}
