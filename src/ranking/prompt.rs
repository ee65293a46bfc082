//! Ranking prompt construction
//!
//! The prompt embeds the three candidate solutions in the presentation's
//! slot order and pins the judge to a strict two-line output format so the
//! verdict parser has something to hold on to.

use std::fmt::Write;

use crate::exercises::Exercise;

use super::Presentation;

/// Build the ranking prompt for one (exercise, judge) pair
pub fn build_ranking_prompt(exercise: &Exercise, presentation: &Presentation) -> String {
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "You are an expert teacher trainer evaluating and ranking three math \
         solutions, each explaining how to solve the same problem."
    );
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "**Exercise Index:** {}", exercise.index);
    let _ = writeln!(
        prompt,
        "**Progress Level:** {}",
        exercise.progress_level.label()
    );
    let _ = writeln!(prompt);

    for (slot, &language) in presentation.slots().iter().enumerate() {
        let solution = exercise
            .solutions
            .get(&language)
            .map(|s| s.as_str())
            .unwrap_or("");
        let _ = writeln!(prompt, "**Solution {} ({}):**", slot + 1, language);
        let _ = writeln!(prompt, "{}", solution);
        let _ = writeln!(prompt);
    }

    let _ = writeln!(prompt, "**Technical Terms Required for Understanding:**");
    for &language in presentation.slots() {
        let _ = writeln!(
            prompt,
            "- {} (for {})",
            exercise.terms_for(language),
            language
        );
    }
    let _ = writeln!(prompt);

    let _ = writeln!(prompt, "**Evaluation Criteria**:");
    for question in CRITERIA_QUESTIONS {
        let _ = writeln!(prompt, "- {}", question);
    }
    let _ = writeln!(prompt);

    let slots = presentation.slots();
    let _ = writeln!(prompt, "**Ranking Instructions**:");
    let _ = writeln!(
        prompt,
        "- Rank the solutions from **1st (best) to 3rd (worst)**."
    );
    let _ = writeln!(prompt, "- Format your response strictly as follows:");
    let _ = writeln!(
        prompt,
        "**Ranking:** [{}: X, {}: Y, {}: Z]",
        slots[0], slots[1], slots[2]
    );
    let _ = writeln!(prompt, "**Justification:** [Short explanation]");

    prompt
}

const CRITERIA_QUESTIONS: &[&str] = &[
    "Which explanation shows the best problem understanding?",
    "Which explanation is the clearest for students?",
    "Which solution provides the best step-by-step breakdown?",
    "Which one uses the best math terminology?",
    "Which explanation provides the most accurate final answer?",
    "Which one avoids common mistakes and explains them well?",
    "Which explanation is best suited for learning?",
    "Which explanation is most generalizable to similar problems?",
    "Which explanation is the most appropriate for the given progress level?",
    "Which explanation best incorporates and explains the required technical terms?",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercises::{Language, ProgressLevel};
    use indexmap::IndexMap;

    fn sample_exercise() -> Exercise {
        let mut solutions = IndexMap::new();
        solutions.insert(Language::En, "Add the numerators.".to_string());
        solutions.insert(Language::De, "Addiere die Zähler.".to_string());
        solutions.insert(Language::Ar, "اجمع البسوط.".to_string());

        Exercise {
            index: 17,
            topic_area: "Arithmetic".to_string(),
            topic: "Fractions".to_string(),
            progress_level: ProgressLevel::D,
            text: "Add 1/4 and 2/4".to_string(),
            solutions,
            technical_terms: IndexMap::new(),
        }
    }

    #[test]
    fn test_prompt_embeds_solutions_in_slot_order() {
        let exercise = sample_exercise();
        let presentation =
            Presentation::new(vec![Language::De, Language::Ar, Language::En]);

        let prompt = build_ranking_prompt(&exercise, &presentation);

        let de = prompt.find("**Solution 1 (de):**").unwrap();
        let ar = prompt.find("**Solution 2 (ar):**").unwrap();
        let en = prompt.find("**Solution 3 (en):**").unwrap();
        assert!(de < ar && ar < en);
        assert!(prompt.contains("Addiere die Zähler."));
        assert!(prompt.contains("6th grade (11yo)"));
    }

    #[test]
    fn test_prompt_declares_strict_format() {
        let exercise = sample_exercise();
        let presentation =
            Presentation::new(vec![Language::En, Language::De, Language::Ar]);

        let prompt = build_ranking_prompt(&exercise, &presentation);
        assert!(prompt.contains("**Ranking:** [en: X, de: Y, ar: Z]"));
        assert!(prompt.contains("**Justification:**"));
    }

    #[test]
    fn test_missing_terms_fall_back() {
        let exercise = sample_exercise();
        let presentation =
            Presentation::new(vec![Language::En, Language::De, Language::Ar]);
        let prompt = build_ranking_prompt(&exercise, &presentation);
        assert!(prompt.contains("No specific terms (for en)"));
    }
}
