//! Prompt templates for the medical Q&A composer

use crate::history::{ChatMessage, Role};

/// Structured answer template the generative model is asked to fill in
pub const MEDICAL_QA_TEMPLATE: &str = r#"🏥 **Brief Answer:**
{Short summary of the condition or topic — 2–3 clear, concise sentences summarizing what it is and why it's important. Tailor based on user query.}

📋 **Key Points:**

• **Definition & How It Starts:**
  {Explain what it is, how it originates, and basic mechanisms involved. Use layman-friendly terms.}

• **Types or Variants (if applicable):**
  - {Type 1}: {Short description}
  - {Type 2}: {Short description}

• **Symptoms or Signs:**
  - {Symptom 1}
  - {Symptom 2}
  - {Clarify if symptoms are early/late or variable}

• **Risk Factors or Causes:**
  - *Uncontrollable*: {E.g., age, genetics}
  - *Lifestyle-related*: {E.g., diet, smoking, alcohol}

• **Diagnosis & Detection:**
  - {Common tests or procedures}
  - {Any recommended age or risk-based screening}

• **Treatment Options (if applicable):**
  - *Local Treatments*: {e.g., surgery, radiation}
  - *Systemic Treatments*: {e.g., medication, therapy}

⚠️ **Important Notes:**
• {When to see a doctor — red flags, worsening symptoms, family history}
• {Preventive tips or early action recommendations if relevant}

🔍 **Sources:**
{e.g., Mayo Clinic, WHO, CDC, NHS, peer-reviewed studies — keep it short but credible}"#;

/// Build the full prompt: conversation context, the question, a style
/// instruction and the answer template
pub fn build_prompt(question: &str, history: &[ChatMessage], style_instruction: &str) -> String {
    let context = history
        .iter()
        .map(|msg| {
            let speaker = match msg.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            format!("{}: {}", speaker, msg.content)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a medical AI assistant. Consider this conversation context and answer the latest question:\n\n\
         Previous conversation:\n{context}\n\n\
         Latest question: {question}\n\n\
         {style_instruction}\n\n\
         Provide your response in the following format, filling in all sections appropriately:\n\
         {MEDICAL_QA_TEMPLATE}\n\n\
         Remember to:\n\
         - Keep the Brief Answer section concise but informative\n\
         - Use bullet points and lists where appropriate\n\
         - Highlight important warnings or considerations\n\
         - Include relevant medical terms with their explanations\n\
         - Structure the information in an easy-to-read format"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_question_and_context() {
        let history = vec![
            ChatMessage::user("what is diabetes?"),
            ChatMessage::assistant("Diabetes is a metabolic condition."),
        ];
        let prompt = build_prompt("what are the symptoms?", &history, "Be concise.");
        assert!(prompt.contains("Latest question: what are the symptoms?"));
        assert!(prompt.contains("User: what is diabetes?"));
        assert!(prompt.contains("Assistant: Diabetes is a metabolic condition."));
        assert!(prompt.contains("Be concise."));
        assert!(prompt.contains("Brief Answer"));
    }
}
