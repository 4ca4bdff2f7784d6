//! Fixed instruction templates sent to the language model.

/// Binds `text`.
pub const METADATA: &str = r#"You are a content specialist. Your task is to read the following text and generate a summary and a precise heading:

text: {text}

Provide the result in JSON format ONLY:
"Heading": <heading>,
"Summary": <summary>"#;

/// Binds `context` and `query`.
pub const ANSWER: &str = "Instruction: You are an educational expert. Your task is to provide a clear and a precise answer to the given query strictly based on the provided context only.
- Include relevant explanations, examples, and illustrations/activities from the context to enhance understanding.
- Ensure the response is comprehensive, adhering closely to the context provided.
- Use headings, lists, or steps where they make the answer easier to follow.
- Feel free to add further details only when necessary for clarity.

Context: {context}

Query: {query}

Answer:";

/// Binds `query` and `topics`.
pub const RELEVANCE: &str = r#"Instruction: You are a content specialist. Determine whether any of the words in the provided query has broad or indirect relation to any of the topics in the list below. If the query is directly or indirectly related to any topic, answer "yes". Otherwise, answer "no". Your response should ONLY be "yes" or "no". Do not provide any explanations.

Query: {query}

Topics List: {topics}

Answer: <yes/no>"#;

/// Binds `query`.
pub const GENERIC_REPLY: &str = r#"Instruction: You are a friendly AI assistant designed to respond appropriately based on the nature of the query. Follow these rules:

- If the query is a greeting (e.g., "Hello", "Hi", "Good morning") or a generic query (e.g., "How are you?", "What can you do?", "Tell me a joke"), respond accordingly in a friendly and helpful manner.

- If the query asks for any specific information, respond with "Sorry, the information you're asking for isn't available in the provided documents."

Query: {query}

Answer:"#;
