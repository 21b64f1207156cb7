use crate::generate_extras::StubLlmProvider;
use smartsum::{
    NodeKind, Role,
    artifact::{
        answer_question, generate_audio_script, generate_mindmap, generate_quiz, generate_slides,
    },
    compose::{compose_deck, compose_mindmap_dot},
    generate::GenerateContext,
    summarize::summarize_text,
};
use spectral::prelude::*;

mod generate_extras;

fn context(model: &StubLlmProvider) -> GenerateContext<'_> {
    GenerateContext {
        model,
        rate_limiter: None,
    }
}

assert_responses![
    filled_think_removed:
        response => "<think>This is inside think tags</think>\n## Photosynthesis\nPlants turn light into sugar.",
        result => "## Photosynthesis\nPlants turn light into sugar.",
    empty_think_removed:
        response => "<think>\n</think>\n## Photosynthesis\nPlants turn light into sugar.",
        result => "## Photosynthesis\nPlants turn light into sugar.",
    surrounding_whitespace_trimmed:
        response => "\n\n  Plants turn light into sugar.  \n",
        result => "Plants turn light into sugar.",
];

#[tokio::test]
async fn quiz_from_model_answer() {
    let model = StubLlmProvider::new(
        "Here is your quiz:\n\
         Q) What color is the sky?\nA) Red\nB) Blue\nC) Green\nD) Yellow\nAnswer: B) Blue\nExplanation: Rayleigh scattering.\n\
         Q) Broken question?\nA) One\nB) Two\nAnswer: A) One\nExplanation: Too few options.\n",
    );
    let questions = generate_quiz(&context(&model), "The sky is blue.")
        .await
        .expect("stub never fails");

    assert_that(&questions).has_length(1);
    assert_that(&questions[0].correct_index).is_equal_to(1);
    assert_that(&questions[0].correct_option()).is_equal_to("Blue");
    assert_that(&model.prompts()[0].contains("The sky is blue.")).is_true();
}

#[tokio::test]
async fn slides_render_to_deck() {
    let model = StubLlmProvider::new(
        "Slide 1: Title: Photosynthesis | Nature\nSlide 2: Inputs | Diagram\n- Sunlight\n- Water\nSlide 3: Outputs\n- Oxygen",
    );
    let slides = generate_slides(&context(&model), "summary")
        .await
        .expect("stub never fails");

    assert_that(&slides).has_length(3);
    assert_that(&slides[0].is_title_slide).is_true();
    assert_that(&slides[2].theme.as_str()).is_equal_to("Default");

    let deck = compose_deck(&slides).expect("non-empty deck");
    assert_that(&deck.contains("1. Sunlight\n2. Oxygen")).is_true();
}

#[tokio::test]
async fn unusable_answers_give_empty_artifacts() {
    let model = StubLlmProvider::new("Sorry, I can't help with that.");

    let slides = generate_slides(&context(&model), "summary")
        .await
        .expect("stub never fails");
    let quiz = generate_quiz(&context(&model), "summary")
        .await
        .expect("stub never fails");
    let map = generate_mindmap(&context(&model), "summary")
        .await
        .expect("stub never fails");

    assert_that(&slides.is_empty()).is_true();
    assert_that(&quiz.is_empty()).is_true();
    assert_that(&map.is_empty()).is_true();
    assert_that(&compose_mindmap_dot(&map).is_err()).is_true();
}

#[tokio::test]
async fn mindmap_from_model_answer() {
    let model = StubLlmProvider::new("# Plant Biology\n- Photosynthesis process\n* Light reactions happen first\n- Respiration");
    let map = generate_mindmap(&context(&model), "summary")
        .await
        .expect("stub never fails");

    assert_that(&map.central.as_ref().map(|node| node.label.as_str())).is_equal_to(Some("Plant"));
    assert_that(&map.nodes).has_length(3);
    assert_that(&map.nodes[1].kind).is_equal_to(NodeKind::SubBranch);
    assert_that(&map.nodes[1].parent_label.as_deref()).is_equal_to(Some("Photosynthesis process"));
    assert_that(&map.edges).has_length(3);
}

#[tokio::test]
async fn audio_script_is_capped() {
    let long_answer = vec!["word"; 250].join(" ");
    let model = StubLlmProvider::new(&long_answer);
    let script = generate_audio_script(&context(&model), "summary")
        .await
        .expect("stub never fails");

    assert_that(&script.split_whitespace().count()).is_equal_to(200);
}

#[tokio::test]
async fn chat_prompt_carries_summary_and_question() {
    let model = StubLlmProvider::new("Chlorophyll.");
    let answer = answer_question(&context(&model), "Leaves hold chlorophyll.", "What is green?")
        .await
        .expect("stub never fails");

    let prompts = model.prompts();
    assert_that(&answer.as_str()).is_equal_to("Chlorophyll.");
    assert_that(&prompts[0].contains("Leaves hold chlorophyll.")).is_true();
    assert_that(&prompts[0].contains("User Question: What is green?")).is_true();
}

#[tokio::test]
async fn long_documents_summarize_leading_chunks_only() {
    let paragraph = "Plants use sunlight to make food. ".repeat(25);
    let text = vec![paragraph.trim(); 8].join("\n\n");
    let model = StubLlmProvider::new("Part \u{2014} \u{201c}done\u{201d}");

    let summary = summarize_text(&context(&model), &text, Role::Kid, None)
        .await
        .expect("stub never fails");

    assert_that(&model.prompts()).has_length(3);
    assert_that(&model.prompts()[0].contains("summarizing content for a kid")).is_true();
    assert_that(&summary.as_str()).is_equal_to("Part - \"done\"\n\nPart - \"done\"\n\nPart - \"done\"");
}

#[tokio::test]
async fn short_documents_need_one_call() {
    let model = StubLlmProvider::new("Short summary");
    let summary = summarize_text(&context(&model), "A tiny text.", Role::Teacher, Some("Summarize: {text}"))
        .await
        .expect("stub never fails");

    assert_that(&model.prompts()).is_equal_to(vec!["Summarize: A tiny text.".to_owned()]);
    assert_that(&summary.as_str()).is_equal_to("Short summary");
}
