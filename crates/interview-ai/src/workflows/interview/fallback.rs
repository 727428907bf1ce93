//! Canned artifacts substituted when the generator is unavailable or returns
//! malformed output. The candidate is never blocked by a backend outage, so
//! every generator operation has a deterministic local stand-in here.

use std::collections::BTreeMap;

use super::domain::{
    CodingProblem, Difficulty, ExecutionOutcome, Language, Question, QuestionKind,
};
use super::generator::Assessment;

pub fn aptitude_questions() -> Vec<Question> {
    vec![
        Question {
            kind: QuestionKind::Mathematical,
            prompt: "What is 2 + 2?".to_string(),
            options: vec![
                "3".to_string(),
                "4".to_string(),
                "5".to_string(),
                "6".to_string(),
            ],
            correct_answer: "4".to_string(),
        },
        Question {
            kind: QuestionKind::Verbal,
            prompt: "What is the capital of India?".to_string(),
            options: vec![
                "Mumbai".to_string(),
                "Kolkata".to_string(),
                "New Delhi".to_string(),
                "Chennai".to_string(),
            ],
            correct_answer: "New Delhi".to_string(),
        },
    ]
}

pub fn coding_problem() -> CodingProblem {
    let mut starter_code = BTreeMap::new();
    starter_code.insert(
        Language::Python,
        "def solve(s):\n    # Your code here\n    return -1\n\nprint(solve(\"interviewace\"))\n"
            .to_string(),
    );
    starter_code.insert(
        Language::JavaScript,
        "function firstUniqChar(s) {\n  // Your code here\n  return -1;\n}\n\nconsole.log(firstUniqChar(\"interviewace\"));\n"
            .to_string(),
    );
    starter_code.insert(
        Language::Java,
        "class Solution {\n    public int firstUniqChar(String s) {\n        // Your code here\n        return -1;\n    }\n\n    public static void main(String[] args) {\n        System.out.println(new Solution().firstUniqChar(\"interviewace\"));\n    }\n}\n"
            .to_string(),
    );
    starter_code.insert(
        Language::C,
        "#include <stdio.h>\n\nint firstUniqChar(const char *s) {\n    /* Your code here */\n    return -1;\n}\n\nint main(void) {\n    printf(\"%d\\n\", firstUniqChar(\"interviewace\"));\n    return 0;\n}\n"
            .to_string(),
    );
    starter_code.insert(
        Language::Cpp,
        "#include <iostream>\n#include <string>\n\nint firstUniqChar(const std::string &s) {\n    // Your code here\n    return -1;\n}\n\nint main() {\n    std::cout << firstUniqChar(\"interviewace\") << std::endl;\n    return 0;\n}\n"
            .to_string(),
    );

    CodingProblem {
        title: "Find the First Non-Repeating Character".to_string(),
        difficulty: Difficulty::Medium,
        description: "Given a string, find the first non-repeating character in it and return \
                      its index. If it doesn't exist, return -1."
            .to_string(),
        example1: "Input: \"interviewace\"\nOutput: 1 (character 'n' at index 1)".to_string(),
        example2: "Input: \"leetcode\"\nOutput: 0 (character 'l' at index 0)".to_string(),
        starter_code,
        expected_marker: "1".to_string(),
    }
}

pub fn hr_opening_question() -> String {
    "Hello, can you start by telling me a little bit about yourself?".to_string()
}

/// Used when a mid-conversation generator call fails; keeps the round moving
/// instead of aborting the interview.
pub fn hr_recovery_question() -> String {
    "Apologies, I encountered an issue. Let's try another question: can you tell me about a \
     challenging project you worked on?"
        .to_string()
}

pub fn assessment() -> Assessment {
    Assessment::default()
}

pub fn execution_failure() -> ExecutionOutcome {
    ExecutionOutcome::Error("execution service unavailable".to_string())
}
