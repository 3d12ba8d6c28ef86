//! Turn execution results

use serde::{Deserialize, Serialize};

use crate::llm::Usage;

/// How a turn concluded
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnDisposition {
    /// The model's reply passed both guardrail stages
    Answered,

    /// The input stage blocked the user message; the model never ran
    BlockedInput,

    /// The output stage blocked the candidate reply
    BlockedOutput,

    /// The loop hit its iteration bound without a final answer
    GaveUp,
}

/// Result of executing one conversational turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnExecution {
    /// Text delivered to the caller
    pub reply: String,

    /// How the turn concluded
    pub disposition: TurnDisposition,

    /// Model invocations consumed
    pub steps_executed: usize,

    /// Wall-clock duration of the turn in milliseconds
    pub duration_ms: u64,

    /// Accumulated token usage across model invocations
    pub usage: Option<Usage>,
}

impl TurnExecution {
    /// Whether either guardrail stage substituted the reply
    pub fn was_blocked(&self) -> bool {
        matches!(
            self.disposition,
            TurnDisposition::BlockedInput | TurnDisposition::BlockedOutput
        )
    }
}

/// Accumulate usage across the model invocations of a turn
pub(crate) fn add_usage(total: &mut Option<Usage>, step: Option<&Usage>) {
    let Some(step) = step else { return };
    match total {
        Some(total) => {
            total.prompt_tokens += step.prompt_tokens;
            total.completion_tokens += step.completion_tokens;
            total.total_tokens += step.total_tokens;
        }
        None => *total = Some(step.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_dispositions_report_blocked() {
        let execution = TurnExecution {
            reply: "refused".to_string(),
            disposition: TurnDisposition::BlockedInput,
            steps_executed: 0,
            duration_ms: 1,
            usage: None,
        };
        assert!(execution.was_blocked());

        let execution = TurnExecution {
            disposition: TurnDisposition::Answered,
            ..execution
        };
        assert!(!execution.was_blocked());
    }

    #[test]
    fn usage_accumulates_across_steps() {
        let mut total = None;
        add_usage(
            &mut total,
            Some(&Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        );
        add_usage(&mut total, None);
        add_usage(
            &mut total,
            Some(&Usage {
                prompt_tokens: 20,
                completion_tokens: 2,
                total_tokens: 22,
            }),
        );
        let total = total.unwrap();
        assert_eq!(total.prompt_tokens, 30);
        assert_eq!(total.total_tokens, 37);
    }
}
