//! The fixed Korean templates for each task.

use super::{Prompt, SystemPromptBuilder, Task};

/// Line the model must emit once all recommendations are written.
pub const RECOMMENDATION_SENTINEL: &str = "추천 완료!";

/// Answer the model must give when the rules do not cover the question.
pub const RULE_REFUSAL: &str = "해당 정보는 룰에 명시되어 있지 않습니다.";

const RULE_EXPERT_PREAMBLE: &str = "너는 보드게임 룰 전문 AI야. 반드시 아래 규칙을 따라야 해:";

/// Recommendation: the retrieved descriptions live in the system turn and
/// the model may only pick from them.
pub fn recommendation(context: &str, top_k: usize, query: &str) -> Prompt {
    let examples = (1..=top_k.max(1)).map(|i| format!("게임명{i}: 이유"));
    let system = SystemPromptBuilder::new("너는 보드게임 추천 도우미야. 다음은 추천 가능한 게임 설명들이야:")
        .raw(context)
        .lines(
            [
                "반드시 이 게임 목록 안에서만 추천해. 새로운 게임을 지어내지 마.".to_string(),
                format!("질문에 맞는 게임 {top_k}개를 골라 아래 형식으로 답해:"),
            ]
            .into_iter()
            .chain(examples)
            .chain([
                "각 줄은 '게임명: 추천 이유' 형식으로만 작성하고, 줄바꿈 이외에 아무 포맷도 쓰지 마세요."
                    .to_string(),
                format!(
                    "추천이 모두 끝나면 마지막 줄에 반드시 '{RECOMMENDATION_SENTINEL}' 라고 써주세요. 그 이후에는 아무 것도 쓰지 마세요."
                ),
            ]),
        )
        .build();
    Prompt {
        task: Task::Recommend,
        system,
        user: query.to_string(),
    }
}

/// Rule question: answers restricted to the retrieved chunks.
pub fn rule_question(game: &str, context: &str, question: &str) -> Prompt {
    let system = [
        RULE_EXPERT_PREAMBLE.to_string(),
        "- 사용자의 질문에 대해 아래 룰 설명(context)에 있는 내용만 기반해서 답변해.".to_string(),
        "- 룰 설명에 없는 정보는 절대로 지어내거나 상상하지 마.".to_string(),
        "- 사람 이름, 장소, 시간, 인원수 등을 추측하거나 새로 만들어내지 마.".to_string(),
        format!("- 답할 수 없는 질문이면 '{RULE_REFUSAL}' 라고 말해."),
    ]
    .join("\n");
    let user = SystemPromptBuilder::new(format!("아래는 '{game}' 보드게임의 룰 설명 일부입니다:"))
        .raw(context)
        .raw("이 룰을 바탕으로 다음 질문에 정확하고 구체적으로 답변해줘:")
        .raw(format!("질문: {question}"))
        .build();
    Prompt {
        task: Task::RuleQuestion,
        system,
        user,
    }
}

/// Summary: the whole rule text goes into the user turn verbatim.
pub fn rule_summary(game: &str, rule_text: &str) -> Prompt {
    let system = [
        RULE_EXPERT_PREAMBLE,
        "- 사용자가 선택한 보드게임의 룰 전체를 보고, 그 게임의 룰을 알기 쉽게 설명해줘.",
        "- 핵심 개념, 목표, 진행 방식, 승리 조건을 요약해줘.",
        "- 설명은 간결하고 구조적으로 작성해.",
    ]
    .join("\n");
    let user = format!("게임 이름: {game}\n\n룰 전체:\n{rule_text}\n\n이 게임의 룰을 설명해주세요.");
    Prompt {
        task: Task::Summary,
        system,
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommendation_embeds_context_and_count() {
        let p = recommendation("[카탄]\n교역 게임", 5, "5개 추천해줘");
        assert!(p.system.contains("[카탄]\n교역 게임"));
        assert!(p.system.contains("게임 5개를 골라"));
        assert!(p.system.contains("게임명5: 이유"));
        assert!(!p.system.contains("게임명6"));
        assert!(p.system.contains("'추천 완료!'"));
        assert_eq!(p.user, "5개 추천해줘");
    }

    #[test]
    fn recommendation_context_sits_between_preamble_and_rules() {
        let p = recommendation("CTX", 3, "q");
        let ctx = p.system.find("CTX").unwrap();
        assert!(p.system.find("추천 도우미").unwrap() < ctx);
        assert!(ctx < p.system.find("반드시 이 게임 목록").unwrap());
    }

    #[test]
    fn rule_question_mandates_refusal() {
        let p = rule_question("뱅", "보안관은 정체를 공개한다.", "보안관은 누구야?");
        assert!(p.system.contains(RULE_REFUSAL));
        assert!(p.user.starts_with("아래는 '뱅' 보드게임의 룰 설명 일부입니다:\n\n보안관은"));
        assert!(p.user.ends_with("질문: 보안관은 누구야?"));
        assert_eq!(p.task, Task::RuleQuestion);
    }

    #[test]
    fn summary_carries_full_text_verbatim() {
        let text = "1. 준비\n2. 진행\n\n3. 승리";
        let p = rule_summary("아줄", text);
        assert!(p.user.contains(text));
        assert!(p.user.starts_with("게임 이름: 아줄"));
        assert!(p.system.contains("승리 조건"));
    }
}
