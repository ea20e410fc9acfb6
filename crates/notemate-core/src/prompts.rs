//! Prompt templates for chat answers and the note pipeline

/// Reply the chat model must give when the context does not cover a question
pub const UNKNOWN_ANSWER: &str = "I don't know based on the available information.";

/// System + user message pair
#[derive(Debug, Clone, PartialEq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Single-turn RAG prompt: recent history, retrieved context, question
pub fn rag_prompt(conversation_history: &str, context: &str, input: &str) -> String {
    format!(
        "You are a student who has carefully read the documents in the knowledge base.\n\
         Their content is provided to you as context.\n\
         Answer the question as if you had studied the material yourself: explain clearly and \
         factually using only the information in the context.\n\
         If the answer is not found in the context or you are unsure, respond exactly with:\n\
         \"{unknown}\"\n\
         Do not make up information or rely on outside knowledge. Keep answers short, clear and \
         to the point.\n\n\
         Conversation history:\n{history}\n\n\
         Relevant context:\n{context}\n\n\
         User query:\n{input}\n\n\
         Answer:",
        unknown = UNKNOWN_ANSWER,
        history = conversation_history,
        context = context,
        input = input,
    )
}

pub fn summary_prompt(chat_history: &str) -> PromptPair {
    PromptPair {
        system: "You are an expert note-taker. Create a well-structured summary from the chat history.\n\n\
                 Format the summary as follows:\n\
                 1. **Title**: A clear, concise title for the topic discussed\n\
                 2. **Main Topic**: Brief description of what was discussed\n\
                 3. **Key Points**: Bullet points of the most important information\n\
                 4. **Details**: Additional relevant details organized logically\n\
                 5. **Conclusion**: Summary or takeaways\n\n\
                 Base the summary only on the chat history. Output only the summary text."
            .to_string(),
        user: format!("Chat History:\n{}\n\nCreate a structured summary:", chat_history),
    }
}

pub fn topic_prompt(summary: &str) -> PromptPair {
    PromptPair {
        system: "Extract the main topic from the summary in 2-4 words.\n\
                 It will be used as a search query for finding a relevant image.\n\
                 Return ONLY the topic keywords, nothing else."
            .to_string(),
        user: format!("Summary:\n{}\n\nExtract main topic:", summary),
    }
}

/// Asks for `{"blocks": [{"block_type", "content"}], "reasoning"}` JSON
pub fn formatter_prompt(topic: &str, summary: &str, image_url: &str, timestamp: &str) -> PromptPair {
    let image = if image_url.is_empty() { "None" } else { image_url };

    PromptPair {
        system: "You format content for Notion pages by structuring it into blocks.\n\n\
                 Block types:\n\
                 - heading_1: main title (the topic)\n\
                 - heading_2: major sections\n\
                 - heading_3: sub-sections\n\
                 - paragraph: regular text, under 2000 characters each\n\
                 - bulleted_list_item: one bullet point\n\
                 - numbered_list_item: one ordered item\n\
                 - quote: key takeaway\n\
                 - divider: separator, content must be an empty string\n\
                 - bookmark: a URL, content is the URL\n\n\
                 Layout: start with a divider, then heading_1 with the topic, then a paragraph with \
                 the timestamp. Split long summaries into sections. End with heading_3 \"Reference \
                 Image\" and a bookmark when an image URL is provided.\n\n\
                 Respond with a single JSON object and nothing else:\n\
                 {\"blocks\": [{\"block_type\": \"...\", \"content\": \"...\"}], \"reasoning\": \"...\"}"
            .to_string(),
        user: format!(
            "Format the following content for a Notion page:\n\n\
             Topic: {}\n\nSummary:\n{}\n\nImage URL: {}\n\nCurrent Timestamp: {}",
            topic, summary, image, timestamp
        ),
    }
}
