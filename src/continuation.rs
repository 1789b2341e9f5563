use crate::local_logger::suspend_progress_bar;
use crate::prelude::*;
use console::Term;
use std::fmt;
use std::io::IsTerminal;

/// How a workflow decides whether to go on after a recoverable problem.
pub enum ContinuationPolicy {
    AlwaysProceed,
    AlwaysAbort,
    /// Ask, e.g. a person at a terminal. Receives the question, answers whether to continue.
    Ask(Box<dyn Fn(&str) -> bool>),
}

impl ContinuationPolicy {
    /// `--yes` proceeds unconditionally, an interactive stdin gets a prompt, anything else aborts.
    pub fn from_cli(assume_yes: bool) -> Self {
        if assume_yes {
            ContinuationPolicy::AlwaysProceed
        } else if std::io::stdin().is_terminal() {
            ContinuationPolicy::Ask(Box::new(prompt_on_terminal))
        } else {
            ContinuationPolicy::AlwaysAbort
        }
    }

    pub fn should_continue(&self, question: &str) -> bool {
        let proceed = match self {
            ContinuationPolicy::AlwaysProceed => true,
            ContinuationPolicy::AlwaysAbort => false,
            ContinuationPolicy::Ask(ask) => ask(question),
        };
        debug!("{question} -> {}", if proceed { "continuing" } else { "aborting" });
        proceed
    }
}

impl fmt::Debug for ContinuationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContinuationPolicy::AlwaysProceed => write!(f, "AlwaysProceed"),
            ContinuationPolicy::AlwaysAbort => write!(f, "AlwaysAbort"),
            ContinuationPolicy::Ask(_) => write!(f, "Ask(..)"),
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn prompt_on_terminal(question: &str) -> bool {
    suspend_progress_bar(|| {
        let term = Term::stderr();
        if term.write_str(&format!("{question} [y/N] ")).is_err() {
            return false;
        }
        term.read_line().map(|answer| is_yes(&answer)).unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_fixed_policies() {
        assert!(ContinuationPolicy::AlwaysProceed.should_continue("Go on?"));
        assert!(!ContinuationPolicy::AlwaysAbort.should_continue("Go on?"));
    }

    #[test]
    fn test_ask_policy_receives_question() {
        let asked = Rc::new(RefCell::new(Vec::new()));
        let recorder = asked.clone();
        let policy = ContinuationPolicy::Ask(Box::new(move |question| {
            recorder.borrow_mut().push(question.to_string());
            question.contains("registry")
        }));

        assert!(policy.should_continue("The registry is down. Go on?"));
        assert!(!policy.should_continue("Something else. Go on?"));
        assert_eq!(asked.borrow().len(), 2);
    }

    #[test]
    fn test_assume_yes() {
        assert!(matches!(
            ContinuationPolicy::from_cli(true),
            ContinuationPolicy::AlwaysProceed
        ));
    }

    #[rstest]
    #[case("y\n", true)]
    #[case(" YES ", true)]
    #[case("n", false)]
    #[case("", false)]
    #[case("yep", false)]
    fn test_is_yes(#[case] answer: &str, #[case] expected: bool) {
        assert_eq!(is_yes(answer), expected);
    }
}
