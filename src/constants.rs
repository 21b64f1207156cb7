pub const MODEL_API_KEY_ENV_NAME: &str = "SMARTSUM_MODEL_API_KEY";

pub const DEFAULT_DB_PATH: &str = "smartsum.db";

/// Sessions not touched for this long are expired on the next read.
pub const SESSION_TTL_HOURS: i64 = 24;

pub const MODEL_TEMPERATURE: f32 = 0.3;

/// Characters per chunk fed to the summary prompt.
pub const CHUNK_SIZE: usize = 1000;
pub const CHUNK_OVERLAP: usize = 100;
/// Only the leading chunks of a document are summarized.
pub const MAX_SUMMARY_CHUNKS: usize = 3;

/// Upper bound on the narration script, about two minutes of speech.
pub const AUDIO_SCRIPT_MAX_WORDS: usize = 200;

pub(crate) const THINK_STRIPPER: &str = r"<think>[\s\S]*</think>\s*";

pub(crate) const SUMMARY_PROMPT_TEMPLATE: &str = r#"
You are a helpful assistant summarizing content for a {role}.
{role_instructions}

Use headings (##) and subheadings (###) to organize the summary. Keep it concise and informative.

Content: {text}

Return the summary in markdown format with appropriate headings."#;

pub(crate) const SLIDES_PROMPT_TEMPLATE: &str = r#"
Transform this content into a professional presentation with 6-7 slides:
{summary}

Rules:
1. Create 6-7 slides covering key aspects
2. Don't copy exact text - rephrase for presentation
3. Include:
   - Title slide with topic
   - Introduction/Overview
   - 3-4 key points (1 slide each)
   - Case study/example (if applicable)
   - Conclusion slide
4. For each slide provide:
   - Slide title
   - 3-5 concise bullet points
   - Suggested visual theme (chart/diagram/image)

Format exactly like this:
Slide 1: [Title] | [Theme]
- Content point 1
- Content point 2

Slide 2: [Title] | [Theme]
- Content point 1
- Content point 2"#;

pub(crate) const QUIZ_PROMPT_TEMPLATE: &str = r#"
Create exactly 3 multiple choice quiz questions based on this text:
{summary}

Format each question exactly like this:
Q) Question text here?
A) Option 1
B) Option 2
C) Option 3
D) Option 4
Answer: X) Correct option letter (A, B, C, or D)
Explanation: Brief explanation of why this is the correct answer

Rules:
1. Each question should test key information from the text
2. Options should be plausible but only one correct answer
3. Questions should cover different aspects of the content
4. Include clear explanations for correct answers"#;

pub(crate) const MINDMAP_PROMPT_TEMPLATE: &str = r#"
Convert this content into a radial mindmap structure:
{summary}

Return in this exact format:
# Central Topic
- Branch 1
- Branch 2
* Sub-branch 2.1
* Sub-branch 2.2
- Branch 3

Rules:
1. Use # for central topic (single word if possible)
2. Use - for main branches (1-2 words)
3. Use * for sub-branches (1-3 words)
4. Create 4-6 main branches
5. Keep sub-branches concise"#;

pub(crate) const AUDIO_PROMPT_TEMPLATE: &str = r#"
Create a concise 2-minute (150-200 word) audio script about this topic:
{summary}

Rules:
1. DON'T read the summary verbatim
2. Create fresh, engaging content that covers:
   - What the topic is about
   - Why it matters
   - Key insights
   - Practical applications
3. Use conversational language
4. Keep sentences short
5. Maximum 200 words

Example format:
"Today we'll explore...
The key thing to understand is... What makes this important is...
You can apply this by...""#;

pub(crate) const CHAT_PROMPT_TEMPLATE: &str = r#"
Summary Context:
{summary}

User Question: {question}

Answer the question based only on the summary above.
If you can't answer, say 'This information is not in the summary'."#;
